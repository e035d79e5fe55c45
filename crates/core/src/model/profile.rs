use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ProfileId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("full name cannot be empty")]
    EmptyFullName,

    #[error("username must be at least 3 characters")]
    UsernameTooShort,

    #[error("username may only contain lowercase letters, digits and underscores")]
    InvalidUsername,
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Public profile attached to an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    id: ProfileId,
    user_id: UserId,
    full_name: String,
    username: String,
    avatar_url: String,
    bio: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Rebuilds a profile from backend-persisted fields.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: ProfileId,
        user_id: UserId,
        full_name: String,
        username: String,
        avatar_url: String,
        bio: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            full_name,
            username,
            avatar_url,
            bio,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }

    #[must_use]
    pub fn bio(&self) -> &str {
        &self.bio
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Validated editable fields of a profile.
///
/// Construction is the validation boundary: a `ProfileDraft` that exists is
/// safe to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    full_name: String,
    username: String,
    bio: String,
}

impl ProfileDraft {
    /// Validates the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` when the full name is blank, the username is
    /// shorter than 3 characters, or the username contains characters other
    /// than lowercase letters, digits and underscores.
    pub fn new(
        full_name: impl Into<String>,
        username: impl Into<String>,
        bio: impl Into<String>,
    ) -> Result<Self, ProfileError> {
        let full_name = full_name.into();
        if full_name.trim().is_empty() {
            return Err(ProfileError::EmptyFullName);
        }

        let username = username.into();
        if username.chars().count() < 3 {
            return Err(ProfileError::UsernameTooShort);
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ProfileError::InvalidUsername);
        }

        Ok(Self {
            full_name,
            username,
            bio: bio.into(),
        })
    }

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn bio(&self) -> &str {
        &self.bio
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rejects_blank_name() {
        let err = ProfileDraft::new("  ", "sam_dev", "").unwrap_err();
        assert_eq!(err, ProfileError::EmptyFullName);
    }

    #[test]
    fn draft_rejects_short_username() {
        let err = ProfileDraft::new("Sam", "ab", "").unwrap_err();
        assert_eq!(err, ProfileError::UsernameTooShort);
    }

    #[test]
    fn draft_rejects_uppercase_username() {
        let err = ProfileDraft::new("Sam", "SamDev", "").unwrap_err();
        assert_eq!(err, ProfileError::InvalidUsername);
    }

    #[test]
    fn draft_accepts_valid_fields() {
        let draft = ProfileDraft::new("Sam Carter", "sam_dev42", "learning php").unwrap();
        assert_eq!(draft.username(), "sam_dev42");
        assert_eq!(draft.bio(), "learning php");
    }
}
