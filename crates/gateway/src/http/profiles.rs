use serde_json::json;

use tracker_core::model::{UserId, UserProfile};

use super::{HttpGateway, check, net, wire};
use crate::remote::{GatewayError, ProfileGateway};

#[async_trait::async_trait]
impl ProfileGateway for HttpGateway {
    async fn fetch_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, GatewayError> {
        let mut url = self.rest_url("user_profiles")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{user_id}"))
            .append_pair("limit", "1");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(net)?;

        let rows: Vec<wire::ProfileRow> = check(response)?.json().await.map_err(net)?;
        Ok(rows.into_iter().next().map(wire::ProfileRow::into_profile))
    }

    async fn upsert_profile(
        &self,
        user_id: UserId,
        full_name: &str,
        username: &str,
        bio: &str,
    ) -> Result<UserProfile, GatewayError> {
        let mut url = self.rest_url("user_profiles")?;
        url.query_pairs_mut().append_pair("on_conflict", "user_id");
        let body = json!({
            "user_id": user_id.value(),
            "full_name": full_name,
            "username": username,
            "bio": bio,
        });

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .bearer_auth(self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(net)?;

        single_row(check(response)?).await
    }

    async fn update_avatar_url(
        &self,
        user_id: UserId,
        avatar_url: &str,
    ) -> Result<UserProfile, GatewayError> {
        let mut url = self.rest_url("user_profiles")?;
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{user_id}"));

        let response = self
            .client
            .patch(url)
            .header("apikey", &self.config.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer())
            .json(&json!({ "avatar_url": avatar_url }))
            .send()
            .await
            .map_err(net)?;

        single_row(check(response)?).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, GatewayError> {
        let mut url = self.rest_url("user_profiles")?;
        url.query_pairs_mut()
            .append_pair("select", "username")
            .append_pair("username", &format!("eq.{username}"))
            .append_pair("limit", "1");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(net)?;

        let rows: Vec<serde_json::Value> = check(response)?.json().await.map_err(net)?;
        Ok(!rows.is_empty())
    }
}

async fn single_row(response: reqwest::Response) -> Result<UserProfile, GatewayError> {
    let rows: Vec<wire::ProfileRow> = response.json().await.map_err(net)?;
    let row = rows.into_iter().next().ok_or(GatewayError::NotFound)?;
    Ok(row.into_profile())
}
