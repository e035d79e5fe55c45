use std::sync::Arc;

use gateway::{Gateway, HttpGatewayConfig};
use tracker_core::Clock;
use tracker_core::model::Track;

use crate::auth_service::AuthService;
use crate::profile_service::ProfileService;
use crate::progress_store::ProgressStore;

/// Assembles app-facing services around one gateway.
///
/// The gateway is constructed once at process start and injected here;
/// nothing below this point reaches for ambient globals, so tests swap in
/// the in-memory gateway freely.
#[derive(Clone)]
pub struct AppServices {
    progress_store: Arc<ProgressStore>,
    auth: Arc<AuthService>,
    profiles: Arc<ProfileService>,
}

impl AppServices {
    /// Wire services against an already-built gateway.
    #[must_use]
    pub fn with_gateway(gateway: &Gateway, clock: Clock, track: Track) -> Self {
        let auth = Arc::new(AuthService::new(
            Arc::clone(&gateway.auth),
            Arc::clone(&gateway.profiles),
        ));
        let progress_store = Arc::new(ProgressStore::new(
            clock,
            Arc::clone(&gateway.projects),
            Arc::clone(&gateway.progress),
            auth.subscribe(),
            track,
        ));
        let profiles = Arc::new(ProfileService::new(
            Arc::clone(&gateway.profiles),
            Arc::clone(&gateway.avatars),
        ));

        Self {
            progress_store,
            auth,
            profiles,
        }
    }

    /// Build services backed by the hosted backend over HTTP.
    #[must_use]
    pub fn new_http(config: HttpGatewayConfig, clock: Clock, track: Track) -> Self {
        let gateway = Gateway::http(config, clock);
        Self::with_gateway(&gateway, clock, track)
    }

    /// Build services backed by the in-memory gateway.
    #[must_use]
    pub fn in_memory(clock: Clock, track: Track) -> Self {
        let gateway = Gateway::in_memory(clock);
        Self::with_gateway(&gateway, clock, track)
    }

    #[must_use]
    pub fn progress_store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress_store)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }
}
