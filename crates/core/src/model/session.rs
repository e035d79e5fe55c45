use crate::model::ids::UserId;

/// Snapshot of the authenticated user, as reported by the backend.
///
/// Token material stays inside the gateway; the rest of the client only
/// needs the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    email: String,
}

impl Session {
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}
