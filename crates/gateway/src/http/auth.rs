use serde_json::json;

use tracker_core::model::Session;

use super::{HttpGateway, check, net, wire};
use crate::remote::{AuthGateway, GatewayError, SignUpRequest};

#[async_trait::async_trait]
impl AuthGateway for HttpGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(net)?;

        let token: wire::TokenResponse = check(response)?.json().await.map_err(net)?;
        let session = self.store_session(token)?;
        tracing::info!(user = %session.user_id(), "signed in");
        Ok(session)
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, GatewayError> {
        let url = self.auth_url("signup")?;
        let body = json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "full_name": request.full_name,
                "username": request.username,
            },
        });

        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(net)?;

        let token: wire::TokenResponse = check(response)?.json().await.map_err(net)?;
        let session = self.store_session(token)?;
        tracing::info!(user = %session.user_id(), "signed up");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let url = self.auth_url("logout")?;
        let response = self
            .client
            .post(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(net)?;
        check(response)?;

        self.clear_session();
        tracing::info!("signed out");
        Ok(())
    }

    async fn session(&self) -> Option<Session> {
        self.current_session()
    }
}
