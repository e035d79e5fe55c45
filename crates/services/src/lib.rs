#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod profile_service;
pub mod progress_store;

pub use tracker_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, SignUpForm};
pub use error::{AuthError, ProfileServiceError, StoreError, ValidationError};
pub use profile_service::ProfileService;
pub use progress_store::{LoadPhase, ProgressStore, StoreSnapshot, ToggleOutcome};
