use tracker_core::model::{Project, Track};

use super::{HttpGateway, check, net, wire};
use crate::remote::{GatewayError, ProjectGateway};

#[async_trait::async_trait]
impl ProjectGateway for HttpGateway {
    async fn fetch_projects(&self, track: Track) -> Result<Vec<Project>, GatewayError> {
        let mut url = self.rest_url("projects")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("project_type", &format!("eq.{track}"))
            .append_pair("order", "id.asc");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(net)?;

        let rows: Vec<wire::ProjectRow> = check(response)?.json().await.map_err(net)?;
        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            projects.push(row.into_project()?);
        }
        tracing::debug!(track = %track, count = projects.len(), "fetched project catalog");
        Ok(projects)
    }
}
