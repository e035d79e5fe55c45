use std::sync::Arc;

use tokio::sync::watch;

use gateway::{AuthGateway, ProfileGateway, SignUpRequest};
use tracker_core::model::Session;

use crate::error::{AuthError, ValidationError};

/// Fields collected by the sign-up form, validated before any gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub username: String,
}

/// Owns the session lifecycle and publishes changes to subscribers.
///
/// Subscribers get session pushes through a watch channel; the progress
/// store reads the current session from its receiver, and the app re-runs
/// its progress fetch whenever the value changes.
#[derive(Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthGateway>,
    profiles: Arc<dyn ProfileGateway>,
    sessions: watch::Sender<Option<Session>>,
}

impl AuthService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthGateway>, profiles: Arc<dyn ProfileGateway>) -> Self {
        let (sessions, _) = watch::channel(None);
        Self {
            auth,
            profiles,
            sessions,
        }
    }

    /// A receiver that yields the current session and every change after it.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sessions.subscribe()
    }

    /// The session as currently published.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.sessions.borrow().clone()
    }

    /// Exchange credentials for a session and publish it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Gateway` when the backend rejects the
    /// credentials or the call fails.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.auth.sign_in(email, password).await?;
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Validate the form, register the account, seed its profile row and
    /// publish the new session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` before any gateway call when the
    /// form is invalid, or `AuthError::Gateway` when registration fails.
    pub async fn sign_up(&self, form: SignUpForm) -> Result<Session, AuthError> {
        validate_sign_up(&form)?;
        if self.profiles.username_exists(&form.username).await? {
            return Err(ValidationError::UsernameTaken.into());
        }

        let session = self
            .auth
            .sign_up(SignUpRequest {
                email: form.email.clone(),
                password: form.password.clone(),
                full_name: form.full_name.clone(),
                username: form.username.clone(),
            })
            .await?;

        self.profiles
            .upsert_profile(session.user_id(), &form.full_name, &form.username, "")
            .await?;

        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Drop the backend session and publish the sign-out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Gateway` when the backend call fails; the local
    /// session is not cleared in that case.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.auth.sign_out().await?;
        self.sessions.send_replace(None);
        Ok(())
    }

    /// Whether a username can still be claimed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for usernames too short to check,
    /// or `AuthError::Gateway` when the existence query fails.
    pub async fn username_available(&self, username: &str) -> Result<bool, AuthError> {
        if username.chars().count() < 3 {
            return Err(ValidationError::UsernameTooShort.into());
        }
        Ok(!self.profiles.username_exists(username).await?)
    }
}

fn validate_sign_up(form: &SignUpForm) -> Result<(), ValidationError> {
    if form.email.trim().is_empty() || !form.email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if form.password.chars().count() < 6 {
        return Err(ValidationError::PasswordTooShort);
    }
    if form.full_name.trim().is_empty() {
        return Err(ValidationError::EmptyFullName);
    }
    if form.username.chars().count() < 3 {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use gateway::InMemoryGateway;
    use tracker_core::time::fixed_clock;

    fn service() -> (InMemoryGateway, AuthService) {
        let gateway = InMemoryGateway::new(fixed_clock());
        let service = AuthService::new(Arc::new(gateway.clone()), Arc::new(gateway.clone()));
        (gateway, service)
    }

    fn form() -> SignUpForm {
        SignUpForm {
            email: "sam@example.test".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            full_name: "Sam Carter".into(),
            username: "sam_dev".into(),
        }
    }

    #[tokio::test]
    async fn sign_up_publishes_session_and_seeds_profile() {
        let (gateway, service) = service();
        let mut rx = service.subscribe();
        assert!(rx.borrow().is_none());

        let session = service.sign_up(form()).await.unwrap();
        assert_eq!(session.email(), "sam@example.test");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().clone(), Some(session.clone()));

        use gateway::ProfileGateway as _;
        let profile = gateway
            .fetch_profile(session.user_id())
            .await
            .unwrap()
            .expect("profile row seeded at sign-up");
        assert_eq!(profile.username(), "sam_dev");
        assert_eq!(profile.full_name(), "Sam Carter");
    }

    #[tokio::test]
    async fn sign_up_rejects_password_mismatch_before_gateway() {
        let (_gateway, service) = service();
        let err = service
            .sign_up(SignUpForm {
                confirm_password: "different".into(),
                ..form()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::PasswordMismatch)
        ));
        assert!(service.current_session().is_none());
    }

    #[tokio::test]
    async fn sign_up_rejects_short_password() {
        let (_gateway, service) = service();
        let err = service
            .sign_up(SignUpForm {
                password: "abc".into(),
                confirm_password: "abc".into(),
                ..form()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::PasswordTooShort)
        ));
    }

    #[tokio::test]
    async fn sign_up_rejects_taken_username() {
        let (gateway, service) = service();
        let other = gateway.register_account("other@example.test", "secret1").unwrap();
        use gateway::ProfileGateway as _;
        gateway
            .upsert_profile(other, "Other", "sam_dev", "")
            .await
            .unwrap();

        let err = service.sign_up(form()).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn sign_in_and_out_round_trip() {
        let (gateway, service) = service();
        gateway.register_account("sam@example.test", "secret1").unwrap();

        let session = service.sign_in("sam@example.test", "secret1").await.unwrap();
        assert_eq!(service.current_session(), Some(session));

        service.sign_out().await.unwrap();
        assert!(service.current_session().is_none());
    }

    #[tokio::test]
    async fn username_available_checks_length_first() {
        let (_gateway, service) = service();
        let err = service.username_available("ab").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::UsernameTooShort)
        ));
        assert!(service.username_available("free_name").await.unwrap());
    }
}
