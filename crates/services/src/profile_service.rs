use std::sync::Arc;

use gateway::{AvatarStore, ProfileGateway};
use tracker_core::model::{ProfileDraft, UserId, UserProfile};

use crate::error::{ProfileServiceError, ValidationError};

/// Orchestrates profile reads, edits and avatar replacement.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileGateway>,
    avatars: Arc<dyn AvatarStore>,
}

impl ProfileService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileGateway>, avatars: Arc<dyn AvatarStore>) -> Self {
        Self { profiles, avatars }
    }

    /// Fetch the user's profile row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Gateway` if the read fails.
    pub async fn load(&self, user_id: UserId) -> Result<Option<UserProfile>, ProfileServiceError> {
        let profile = self.profiles.fetch_profile(user_id).await?;
        Ok(profile)
    }

    /// Persist edited profile fields.
    ///
    /// Availability is re-checked only when the username actually changed,
    /// so saving other edits never trips over the user's own name.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Validation` when the new username is
    /// taken, or `ProfileServiceError::Gateway` when persistence fails.
    pub async fn update(
        &self,
        user_id: UserId,
        draft: ProfileDraft,
    ) -> Result<UserProfile, ProfileServiceError> {
        let current = self.profiles.fetch_profile(user_id).await?;
        let username_changed = current
            .as_ref()
            .is_none_or(|p| p.username() != draft.username());
        if username_changed && self.profiles.username_exists(draft.username()).await? {
            return Err(ValidationError::UsernameTaken.into());
        }

        let profile = self
            .profiles
            .upsert_profile(user_id, draft.full_name(), draft.username(), draft.bio())
            .await?;
        Ok(profile)
    }

    /// Replace the user's avatar blob and persist its public URL.
    ///
    /// The previous blob is removed best-effort; a failed delete never
    /// blocks the new upload.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Gateway` when the upload or the
    /// profile write fails.
    pub async fn change_avatar(
        &self,
        user_id: UserId,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<UserProfile, ProfileServiceError> {
        if let Some(profile) = self.profiles.fetch_profile(user_id).await?
            && let Some(path) = previous_blob_path(user_id, profile.avatar_url())
            && let Err(e) = self.avatars.remove(&path).await
        {
            tracing::warn!(user = %user_id, err = %e, "stale avatar blob not removed");
        }

        let url = self.avatars.upload(user_id, extension, bytes).await?;
        let profile = self.profiles.update_avatar_url(user_id, &url).await?;
        Ok(profile)
    }
}

fn previous_blob_path(user_id: UserId, avatar_url: &str) -> Option<String> {
    if avatar_url.is_empty() {
        return None;
    }
    let file = avatar_url.rsplit('/').next()?;
    Some(format!("avatars/{user_id}/{file}"))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    use gateway::InMemoryGateway;
    use tracker_core::time::fixed_clock;

    fn service() -> (InMemoryGateway, ProfileService, UserId) {
        let gateway = InMemoryGateway::new(fixed_clock());
        let user_id = gateway.register_account("sam@example.test", "secret1").unwrap();
        let service = ProfileService::new(Arc::new(gateway.clone()), Arc::new(gateway.clone()));
        (gateway, service, user_id)
    }

    #[tokio::test]
    async fn update_creates_profile_when_missing() {
        let (_gateway, service, user_id) = service();
        assert!(service.load(user_id).await.unwrap().is_none());

        let draft = ProfileDraft::new("Sam Carter", "sam_dev", "hello").unwrap();
        let profile = service.update(user_id, draft).await.unwrap();
        assert_eq!(profile.username(), "sam_dev");
        assert_eq!(profile.bio(), "hello");
    }

    #[tokio::test]
    async fn update_keeps_own_username_without_conflict() {
        let (_gateway, service, user_id) = service();
        let draft = ProfileDraft::new("Sam Carter", "sam_dev", "").unwrap();
        service.update(user_id, draft).await.unwrap();

        // same username, new bio: must not be rejected as taken
        let draft = ProfileDraft::new("Sam Carter", "sam_dev", "new bio").unwrap();
        let profile = service.update(user_id, draft).await.unwrap();
        assert_eq!(profile.bio(), "new bio");
    }

    #[tokio::test]
    async fn update_rejects_username_taken_by_someone_else() {
        let (gateway, service, user_id) = service();
        let other = gateway.register_account("other@example.test", "secret1").unwrap();
        use gateway::ProfileGateway as _;
        gateway
            .upsert_profile(other, "Other", "taken_name", "")
            .await
            .unwrap();

        let draft = ProfileDraft::new("Sam Carter", "taken_name", "").unwrap();
        let err = service.update(user_id, draft).await.unwrap_err();
        assert!(matches!(
            err,
            ProfileServiceError::Validation(ValidationError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn change_avatar_persists_public_url() {
        let (_gateway, service, user_id) = service();
        let draft = ProfileDraft::new("Sam Carter", "sam_dev", "").unwrap();
        service.update(user_id, draft).await.unwrap();

        let profile = service
            .change_avatar(user_id, "png", vec![0xde, 0xad])
            .await
            .unwrap();
        assert!(profile.avatar_url().ends_with("avatar.png"));

        // replacing again still yields a usable url
        let profile = service
            .change_avatar(user_id, "jpg", vec![0xbe, 0xef])
            .await
            .unwrap();
        assert!(profile.avatar_url().ends_with("avatar.jpg"));
    }
}
