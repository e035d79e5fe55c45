use tracker_core::model::UserId;

use super::{HttpGateway, check, net, wire};
use crate::remote::{AvatarStore, GatewayError};

#[async_trait::async_trait]
impl AvatarStore for HttpGateway {
    async fn upload(
        &self,
        user_id: UserId,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let path = format!("avatars/{user_id}/avatar.{extension}");
        let url = self.storage_url(&path)?;

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .header("x-upsert", "true")
            .bearer_auth(self.bearer())
            .body(bytes)
            .send()
            .await
            .map_err(net)?;
        check(response)?;

        let public = self
            .config
            .base_url
            .join(&format!("storage/v1/object/public/{path}"))
            .map_err(wire::decode)?;
        tracing::debug!(user = %user_id, "uploaded avatar");
        Ok(public.to_string())
    }

    async fn remove(&self, path: &str) -> Result<(), GatewayError> {
        let url = self.storage_url(path)?;
        let response = self
            .client
            .delete(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(net)?;
        check(response)?;
        Ok(())
    }
}
