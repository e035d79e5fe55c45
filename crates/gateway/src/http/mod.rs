use std::env;
use std::sync::{Arc, RwLock};

use reqwest::{Client, Response, StatusCode, Url};

use tracker_core::Clock;
use tracker_core::model::Session;

use crate::remote::{
    AuthGateway, AvatarStore, Gateway, GatewayError, ProfileGateway, ProgressGateway,
    ProjectGateway,
};

mod auth;
mod avatars;
mod profiles;
mod progress;
mod projects;
mod wire;

/// Connection settings for the hosted backend.
#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    pub base_url: Url,
    pub api_key: String,
}

impl HttpGatewayConfig {
    /// Parse a base URL and pair it with the anon API key.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Decode` when the URL does not parse.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url).map_err(wire::decode)?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Read `TRACKER_API_URL` and `TRACKER_API_KEY` from the environment.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TRACKER_API_URL").ok()?;
        let api_key = env::var("TRACKER_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Self::new(&base_url, api_key).ok()
    }
}

#[derive(Default)]
struct AuthState {
    access_token: Option<String>,
    session: Option<Session>,
}

/// Gateway implementation speaking the backend's REST dialect.
///
/// Clones share one HTTP client and one auth state, so signing in through
/// any handle authenticates them all.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: HttpGatewayConfig,
    clock: Clock,
    auth: Arc<RwLock<AuthState>>,
}

impl HttpGateway {
    #[must_use]
    pub fn new(config: HttpGatewayConfig, clock: Clock) -> Self {
        Self {
            client: Client::new(),
            config,
            clock,
            auth: Arc::new(RwLock::new(AuthState::default())),
        }
    }

    fn rest_url(&self, table: &str) -> Result<Url, GatewayError> {
        self.config
            .base_url
            .join(&format!("rest/v1/{table}"))
            .map_err(wire::decode)
    }

    fn auth_url(&self, path: &str) -> Result<Url, GatewayError> {
        self.config
            .base_url
            .join(&format!("auth/v1/{path}"))
            .map_err(wire::decode)
    }

    fn storage_url(&self, path: &str) -> Result<Url, GatewayError> {
        self.config
            .base_url
            .join(&format!("storage/v1/object/{path}"))
            .map_err(wire::decode)
    }

    /// The bearer the backend expects: the user's access token once signed
    /// in, the anon key otherwise.
    fn bearer(&self) -> String {
        self.auth
            .read()
            .ok()
            .and_then(|state| state.access_token.clone())
            .unwrap_or_else(|| self.config.api_key.clone())
    }

    fn store_session(&self, token: wire::TokenResponse) -> Result<Session, GatewayError> {
        let session = Session::new(
            tracker_core::model::UserId::new(token.user.id),
            token.user.email,
        );
        let mut state = self
            .auth
            .write()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        state.access_token = Some(token.access_token);
        state.session = Some(session.clone());
        Ok(session)
    }

    fn clear_session(&self) {
        if let Ok(mut state) = self.auth.write() {
            state.access_token = None;
            state.session = None;
        }
    }

    fn current_session(&self) -> Option<Session> {
        self.auth.read().ok().and_then(|state| state.session.clone())
    }

    fn clock(&self) -> Clock {
        self.clock
    }
}

pub(crate) fn net(e: reqwest::Error) -> GatewayError {
    GatewayError::Network(e.to_string())
}

fn status_error(status: StatusCode) -> GatewayError {
    match status.as_u16() {
        401 | 403 => GatewayError::Unauthorized,
        404 => GatewayError::NotFound,
        409 => GatewayError::Conflict,
        code => GatewayError::Http(code),
    }
}

/// Maps non-success statuses onto the gateway taxonomy.
pub(crate) fn check(response: Response) -> Result<Response, GatewayError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response.status()))
    }
}

impl Gateway {
    /// Build a `Gateway` backed by the hosted backend over HTTP.
    #[must_use]
    pub fn http(config: HttpGatewayConfig, clock: Clock) -> Self {
        let inner = HttpGateway::new(config, clock);
        let projects: Arc<dyn ProjectGateway> = Arc::new(inner.clone());
        let progress: Arc<dyn ProgressGateway> = Arc::new(inner.clone());
        let auth: Arc<dyn AuthGateway> = Arc::new(inner.clone());
        let profiles: Arc<dyn ProfileGateway> = Arc::new(inner.clone());
        let avatars: Arc<dyn AvatarStore> = Arc::new(inner);
        Self {
            projects,
            progress,
            auth,
            profiles,
            avatars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpGateway>();
    }

    #[test]
    fn config_rejects_garbage_url() {
        assert!(HttpGatewayConfig::new("not a url", "anon").is_err());
    }

    #[test]
    fn bearer_falls_back_to_anon_key() {
        let config = HttpGatewayConfig::new("https://example.test", "anon-key").unwrap();
        let gateway = HttpGateway::new(config, Clock::default_clock());
        assert_eq!(gateway.bearer(), "anon-key");
    }
}
