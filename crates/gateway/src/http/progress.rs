use tracker_core::model::{NewProgressRecord, ProgressId, ProgressPatch, ProgressRecord, Track, UserId};

use super::{HttpGateway, check, net, wire};
use crate::remote::{GatewayError, ProgressGateway};

#[async_trait::async_trait]
impl ProgressGateway for HttpGateway {
    async fn fetch_progress(
        &self,
        user_id: UserId,
        track: Track,
    ) -> Result<Vec<ProgressRecord>, GatewayError> {
        let mut url = self.rest_url("user_progress")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{user_id}"))
            .append_pair("project_type", &format!("eq.{track}"));

        let response = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(net)?;

        let rows: Vec<wire::ProgressRow> = check(response)?.json().await.map_err(net)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(row.into_record()?);
        }
        tracing::debug!(user = %user_id, track = %track, count = records.len(), "fetched progress rows");
        Ok(records)
    }

    async fn create_progress(
        &self,
        new: NewProgressRecord,
    ) -> Result<ProgressRecord, GatewayError> {
        let url = self.rest_url("user_progress")?;
        let body = wire::progress_insert_body(&new);

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(net)?;

        single_row(check(response)?).await
    }

    async fn update_progress(
        &self,
        id: ProgressId,
        patch: &ProgressPatch,
    ) -> Result<ProgressRecord, GatewayError> {
        let mut url = self.rest_url("user_progress")?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let body = wire::progress_patch_body(patch, self.clock().now());

        let response = self
            .client
            .patch(url)
            .header("apikey", &self.config.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(net)?;

        single_row(check(response)?).await
    }
}

/// Writes ask for `return=representation`; the backend answers with a
/// one-element array holding the stored row.
async fn single_row(response: reqwest::Response) -> Result<ProgressRecord, GatewayError> {
    let rows: Vec<wire::ProgressRow> = response.json().await.map_err(net)?;
    let row = rows.into_iter().next().ok_or(GatewayError::NotFound)?;
    row.into_record()
}
