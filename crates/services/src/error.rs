//! Shared error types for the services crate.

use thiserror::Error;

use gateway::GatewayError;
use tracker_core::model::ProfileError;

/// Caller-side validation failures, raised before any gateway call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password and confirmation do not match")]
    PasswordMismatch,

    #[error("password must be at least 6 characters")]
    PasswordTooShort,

    #[error("full name cannot be empty")]
    EmptyFullName,

    #[error("username must be at least 3 characters")]
    UsernameTooShort,

    #[error("username is already taken")]
    UsernameTaken,
}

/// Errors emitted by `ProgressStore`.
///
/// `Fetch` and `Update` keep the distinction the callers care about: a
/// failed read leaves prior data visible, a failed write leaves the mirror
/// at its pre-mutation value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("fetch failed: {0}")]
    Fetch(#[source] GatewayError),

    #[error("update failed: {0}")]
    Update(#[source] GatewayError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
