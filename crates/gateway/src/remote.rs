use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use tracker_core::Clock;
use tracker_core::model::{
    NewProgressRecord, ProgressId, ProgressPatch, ProgressRecord, Project, Session, Track, UserId,
    UserProfile,
};

/// Errors surfaced by gateway adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("not authorized")]
    Unauthorized,

    #[error("conflict")]
    Conflict,

    #[error("backend returned status {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Fields collected at sign-up; profile details ride along so the backend
/// can stash them in the user metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub username: String,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read access to the shared project catalog.
#[async_trait]
pub trait ProjectGateway: Send + Sync {
    /// Fetch every project for a track, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend read fails.
    async fn fetch_projects(&self, track: Track) -> Result<Vec<Project>, GatewayError>;
}

/// Row-level access to one user's progress.
#[async_trait]
pub trait ProgressGateway: Send + Sync {
    /// Fetch all progress rows for a (user, track) pair.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend read fails.
    async fn fetch_progress(
        &self,
        user_id: UserId,
        track: Track,
    ) -> Result<Vec<ProgressRecord>, GatewayError>;

    /// Insert a progress row; the backend assigns id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Conflict` if a row already exists for the
    /// (user, project, track) triple, or other gateway errors.
    async fn create_progress(
        &self,
        new: NewProgressRecord,
    ) -> Result<ProgressRecord, GatewayError>;

    /// Patch an existing row by its own id; the backend refreshes
    /// `updated_at` and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the row is missing, or other
    /// gateway errors.
    async fn update_progress(
        &self,
        id: ProgressId,
        patch: &ProgressPatch,
    ) -> Result<ProgressRecord, GatewayError>;
}

/// Authentication operations and session queries.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Unauthorized` for bad credentials, or other
    /// gateway errors.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError>;

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Conflict` when the email is already
    /// registered, or other gateway errors.
    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, GatewayError>;

    /// Drop the current session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend call fails.
    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// The current session, if any.
    async fn session(&self) -> Option<Session>;
}

/// Access to user profile rows.
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Fetch the profile for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend read fails.
    async fn fetch_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, GatewayError>;

    /// Insert or update the profile row for a user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend write fails.
    async fn upsert_profile(
        &self,
        user_id: UserId,
        full_name: &str,
        username: &str,
        bio: &str,
    ) -> Result<UserProfile, GatewayError>;

    /// Persist a new avatar URL on the profile row.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the user has no profile row.
    async fn update_avatar_url(
        &self,
        user_id: UserId,
        avatar_url: &str,
    ) -> Result<UserProfile, GatewayError>;

    /// Existence query against profile rows, used for availability checks.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend read fails.
    async fn username_exists(&self, username: &str) -> Result<bool, GatewayError>;
}

/// Blob storage for profile avatars.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Upload avatar bytes under a per-user path; returns the public URL.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the upload fails.
    async fn upload(
        &self,
        user_id: UserId,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError>;

    /// Remove a previously uploaded blob by its storage path.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the delete fails.
    async fn remove(&self, path: &str) -> Result<(), GatewayError>;
}

//
// ─── IN-MEMORY GATEWAY ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct MemAccount {
    user_id: UserId,
    email: String,
    password: String,
}

#[derive(Default)]
struct MemState {
    accounts: Vec<MemAccount>,
    session: Option<Session>,
    projects: Vec<Project>,
    progress: Vec<ProgressRecord>,
    profiles: Vec<UserProfile>,
    avatars: HashMap<String, Vec<u8>>,
}

/// Simple in-memory gateway for tests and prototyping.
///
/// Simulates the backend's row semantics: server-assigned ids and
/// timestamps, uniqueness of the (user, project, track) triple, and
/// `updated_at` refresh on writes.
#[derive(Clone)]
pub struct InMemoryGateway {
    clock: Clock,
    state: Arc<Mutex<MemState>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(MemState::default())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemState>, GatewayError> {
        self.state
            .lock()
            .map_err(|e| GatewayError::Network(e.to_string()))
    }

    /// Seed the shared project catalog.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the state lock is poisoned.
    pub fn seed_projects(&self, projects: Vec<Project>) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        state.projects.extend(projects);
        Ok(())
    }

    /// Register an account without signing it in.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Conflict` if the email is already registered.
    pub fn register_account(&self, email: &str, password: &str) -> Result<UserId, GatewayError> {
        let mut state = self.lock()?;
        if state.accounts.iter().any(|a| a.email == email) {
            return Err(GatewayError::Conflict);
        }
        let user_id = UserId::new(Uuid::new_v4());
        state.accounts.push(MemAccount {
            user_id,
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(user_id)
    }
}

#[async_trait]
impl ProjectGateway for InMemoryGateway {
    async fn fetch_projects(&self, track: Track) -> Result<Vec<Project>, GatewayError> {
        let state = self.lock()?;
        let mut projects: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| p.track() == track)
            .cloned()
            .collect();
        projects.sort_by_key(Project::id);
        Ok(projects)
    }
}

#[async_trait]
impl ProgressGateway for InMemoryGateway {
    async fn fetch_progress(
        &self,
        user_id: UserId,
        track: Track,
    ) -> Result<Vec<ProgressRecord>, GatewayError> {
        let state = self.lock()?;
        Ok(state
            .progress
            .iter()
            .filter(|r| r.user_id() == user_id && r.track() == track)
            .cloned()
            .collect())
    }

    async fn create_progress(
        &self,
        new: NewProgressRecord,
    ) -> Result<ProgressRecord, GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let duplicate = state.progress.iter().any(|r| {
            r.user_id() == new.user_id && r.project_id() == new.project_id && r.track() == new.track
        });
        if duplicate {
            return Err(GatewayError::Conflict);
        }
        let record = new.into_record(ProgressId::new(Uuid::new_v4()), now);
        state.progress.push(record.clone());
        Ok(record)
    }

    async fn update_progress(
        &self,
        id: ProgressId,
        patch: &ProgressPatch,
    ) -> Result<ProgressRecord, GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let slot = state
            .progress
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(GatewayError::NotFound)?;
        let updated = patch.apply_to(slot, now);
        *slot = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl AuthGateway for InMemoryGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .cloned()
            .ok_or(GatewayError::Unauthorized)?;
        let session = Session::new(account.user_id, account.email);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<Session, GatewayError> {
        let mut state = self.lock()?;
        if state.accounts.iter().any(|a| a.email == request.email) {
            return Err(GatewayError::Conflict);
        }
        let user_id = UserId::new(Uuid::new_v4());
        state.accounts.push(MemAccount {
            user_id,
            email: request.email.clone(),
            password: request.password.clone(),
        });
        let session = Session::new(user_id, request.email);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        state.session = None;
        Ok(())
    }

    async fn session(&self) -> Option<Session> {
        self.state.lock().ok().and_then(|s| s.session.clone())
    }
}

#[async_trait]
impl ProfileGateway for InMemoryGateway {
    async fn fetch_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, GatewayError> {
        let state = self.lock()?;
        Ok(state
            .profiles
            .iter()
            .find(|p| p.user_id() == user_id)
            .cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: UserId,
        full_name: &str,
        username: &str,
        bio: &str,
    ) -> Result<UserProfile, GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock()?;

        let taken = state
            .profiles
            .iter()
            .any(|p| p.username() == username && p.user_id() != user_id);
        if taken {
            return Err(GatewayError::Conflict);
        }

        if let Some(slot) = state.profiles.iter_mut().find(|p| p.user_id() == user_id) {
            let updated = UserProfile::from_persisted(
                slot.id(),
                user_id,
                full_name.to_string(),
                username.to_string(),
                slot.avatar_url().to_string(),
                bio.to_string(),
                slot.created_at(),
                now,
            );
            *slot = updated.clone();
            return Ok(updated);
        }

        let profile = UserProfile::from_persisted(
            tracker_core::model::ProfileId::new(Uuid::new_v4()),
            user_id,
            full_name.to_string(),
            username.to_string(),
            String::new(),
            bio.to_string(),
            now,
            now,
        );
        state.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_avatar_url(
        &self,
        user_id: UserId,
        avatar_url: &str,
    ) -> Result<UserProfile, GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let slot = state
            .profiles
            .iter_mut()
            .find(|p| p.user_id() == user_id)
            .ok_or(GatewayError::NotFound)?;
        let updated = UserProfile::from_persisted(
            slot.id(),
            user_id,
            slot.full_name().to_string(),
            slot.username().to_string(),
            avatar_url.to_string(),
            slot.bio().to_string(),
            slot.created_at(),
            now,
        );
        *slot = updated.clone();
        Ok(updated)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, GatewayError> {
        let state = self.lock()?;
        Ok(state.profiles.iter().any(|p| p.username() == username))
    }
}

#[async_trait]
impl AvatarStore for InMemoryGateway {
    async fn upload(
        &self,
        user_id: UserId,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let path = format!("avatars/{user_id}/avatar.{extension}");
        let mut state = self.lock()?;
        state.avatars.insert(path.clone(), bytes);
        Ok(format!("memory://{path}"))
    }

    async fn remove(&self, path: &str) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        state.avatars.remove(path);
        Ok(())
    }
}

//
// ─── GATEWAY AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the per-concern gateways behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Gateway {
    pub projects: Arc<dyn ProjectGateway>,
    pub progress: Arc<dyn ProgressGateway>,
    pub auth: Arc<dyn AuthGateway>,
    pub profiles: Arc<dyn ProfileGateway>,
    pub avatars: Arc<dyn AvatarStore>,
}

impl Gateway {
    /// Build a `Gateway` backed by the in-memory implementation.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        let inner = InMemoryGateway::new(clock);
        Self::from_in_memory(inner)
    }

    /// Wrap an existing in-memory gateway, keeping a handle for seeding.
    #[must_use]
    pub fn from_in_memory(inner: InMemoryGateway) -> Self {
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

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::model::{Difficulty, ProgressPatch, ProjectId, Stage};
    use tracker_core::time::{fixed_clock, fixed_now};

    fn build_project(id: u64, track: Track) -> Project {
        Project::new(
            ProjectId::new(id),
            format!("Project {id}"),
            "desc",
            Stage::new(1).unwrap(),
            "Basics",
            Difficulty::Easy,
            track,
            fixed_now(),
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_projects_is_ordered_and_track_scoped() {
        let gateway = InMemoryGateway::new(fixed_clock());
        gateway
            .seed_projects(vec![
                build_project(3, Track::Php),
                build_project(1, Track::Php),
                build_project(2, Track::React),
            ])
            .unwrap();

        let php = gateway.fetch_projects(Track::Php).await.unwrap();
        let ids: Vec<_> = php.iter().map(|p| p.id().value()).collect();
        assert_eq!(ids, vec![1, 3]);

        let react = gateway.fetch_projects(Track::React).await.unwrap();
        assert_eq!(react.len(), 1);
    }

    #[tokio::test]
    async fn create_then_update_progress_round_trips() {
        let gateway = InMemoryGateway::new(fixed_clock());
        let user_id = gateway.register_account("a@b.c", "secret1").unwrap();

        let created = gateway
            .create_progress(NewProgressRecord {
                user_id,
                project_id: ProjectId::new(5),
                track: Track::Php,
                patch: ProgressPatch::new().completion(true, Some(fixed_now())),
            })
            .await
            .unwrap();
        assert!(created.is_completed());

        let updated = gateway
            .update_progress(created.id(), &ProgressPatch::new().notes("took a while"))
            .await
            .unwrap();
        assert_eq!(updated.notes(), "took a while");
        assert!(updated.is_completed());

        let rows = gateway.fetch_progress(user_id, Track::Php).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].notes(), "took a while");
    }

    #[tokio::test]
    async fn duplicate_create_is_a_conflict() {
        let gateway = InMemoryGateway::new(fixed_clock());
        let user_id = gateway.register_account("a@b.c", "secret1").unwrap();
        let new = NewProgressRecord {
            user_id,
            project_id: ProjectId::new(5),
            track: Track::Php,
            patch: ProgressPatch::new(),
        };
        gateway.create_progress(new.clone()).await.unwrap();
        let err = gateway.create_progress(new).await.unwrap_err();
        assert!(matches!(err, GatewayError::Conflict));
    }

    #[tokio::test]
    async fn sign_in_rejects_bad_credentials() {
        let gateway = InMemoryGateway::new(fixed_clock());
        gateway.register_account("a@b.c", "secret1").unwrap();

        let err = gateway.sign_in("a@b.c", "wrong").await.unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized));
        assert!(gateway.session().await.is_none());

        let session = gateway.sign_in("a@b.c", "secret1").await.unwrap();
        assert_eq!(session.email(), "a@b.c");
        assert!(gateway.session().await.is_some());

        gateway.sign_out().await.unwrap();
        assert!(gateway.session().await.is_none());
    }

    #[tokio::test]
    async fn username_exists_sees_other_profiles() {
        let gateway = InMemoryGateway::new(fixed_clock());
        let user_id = gateway.register_account("a@b.c", "secret1").unwrap();
        gateway
            .upsert_profile(user_id, "Sam", "sam_dev", "")
            .await
            .unwrap();

        assert!(gateway.username_exists("sam_dev").await.unwrap());
        assert!(!gateway.username_exists("someone_else").await.unwrap());
    }

    #[tokio::test]
    async fn avatar_upload_updates_profile_url() {
        let gateway = InMemoryGateway::new(fixed_clock());
        let user_id = gateway.register_account("a@b.c", "secret1").unwrap();
        gateway
            .upsert_profile(user_id, "Sam", "sam_dev", "")
            .await
            .unwrap();

        let url = gateway.upload(user_id, "png", vec![1, 2, 3]).await.unwrap();
        let profile = gateway.update_avatar_url(user_id, &url).await.unwrap();
        assert_eq!(profile.avatar_url(), url);
    }
}
