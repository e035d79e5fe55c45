use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use gateway::{ProgressGateway, ProjectGateway};
use tracker_core::Clock;
use tracker_core::model::{
    NewProgressRecord, ProgressPatch, ProgressRecord, Project, ProjectId, Session, Track, UserId,
};

use crate::error::StoreError;

/// Load lifecycle of the mirror for the active track.
///
/// `Ready` is re-entered after every successful mutation. A failed load is
/// terminal for that attempt but does not block further mutations once a
/// `Ready` state has been reached at least once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
}

struct MirrorState {
    track: Track,
    phase: LoadPhase,
    projects: Vec<Project>,
    records: Vec<ProgressRecord>,
}

/// Cloned read-only view of the mirror for the aggregation layer.
///
/// The mirror itself is never handed out: readers work on snapshots and
/// cannot mutate shared state.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub track: Track,
    pub phase: LoadPhase,
    pub projects: Vec<Project>,
    pub records: Vec<ProgressRecord>,
}

/// Result of a completion toggle.
///
/// `newly_completed` is the celebratory signal: it is derived from the
/// record the backend returned, so it can only be true after the write is
/// confirmed.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub record: ProgressRecord,
    pub newly_completed: bool,
}

/// Client-side owner of one user's progress for the active track.
///
/// Holds the authoritative local mirror and serializes mutations against
/// the remote gateway. Mutations touch the mirror only after the round
/// trip resolves; when two writes for the same project race, the last
/// response to arrive wins.
pub struct ProgressStore {
    clock: Clock,
    projects: Arc<dyn ProjectGateway>,
    progress: Arc<dyn ProgressGateway>,
    sessions: watch::Receiver<Option<Session>>,
    state: RwLock<MirrorState>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(
        clock: Clock,
        projects: Arc<dyn ProjectGateway>,
        progress: Arc<dyn ProgressGateway>,
        sessions: watch::Receiver<Option<Session>>,
        track: Track,
    ) -> Self {
        Self {
            clock,
            projects,
            progress,
            sessions,
            state: RwLock::new(MirrorState {
                track,
                phase: LoadPhase::Idle,
                projects: Vec::new(),
                records: Vec::new(),
            }),
        }
    }

    fn current_user(&self) -> Option<UserId> {
        self.sessions.borrow().as_ref().map(Session::user_id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MirrorState> {
        self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MirrorState> {
        self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn track(&self) -> Track {
        self.read().track
    }

    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.read().phase.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.read();
        StoreSnapshot {
            track: state.track,
            phase: state.phase.clone(),
            projects: state.projects.clone(),
            records: state.records.clone(),
        }
    }

    /// The mirror's record for a project, if one exists yet.
    #[must_use]
    pub fn progress_for(&self, project_id: ProjectId) -> Option<ProgressRecord> {
        self.read()
            .records
            .iter()
            .find(|r| r.project_id() == project_id)
            .cloned()
    }

    /// Fetch the project catalog for a track.
    ///
    /// Switching tracks discards the progress mirror. On failure the
    /// previous project list is kept so the caller never renders an empty
    /// catalog over a transient error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Fetch` if the gateway read fails.
    pub async fn load_projects(&self, track: Track) -> Result<(), StoreError> {
        {
            let mut state = self.write();
            if state.track != track {
                state.records.clear();
                state.track = track;
            }
            state.phase = LoadPhase::Loading;
        }

        match self.projects.fetch_projects(track).await {
            Ok(list) => {
                let mut state = self.write();
                tracing::info!(track = %track, count = list.len(), "project catalog loaded");
                state.projects = list;
                state.phase = LoadPhase::Ready;
                Ok(())
            }
            Err(e) => {
                let mut state = self.write();
                tracing::warn!(track = %track, err = %e, "project catalog load failed");
                state.phase = LoadPhase::Error(e.to_string());
                Err(StoreError::Fetch(e))
            }
        }
    }

    /// Fetch the signed-in user's progress rows for a track.
    ///
    /// Resolves to an empty mirror without touching the gateway when no
    /// session is active.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Fetch` if the gateway read fails.
    pub async fn load_progress(&self, track: Track) -> Result<(), StoreError> {
        let Some(user_id) = self.current_user() else {
            let mut state = self.write();
            state.records.clear();
            state.phase = LoadPhase::Ready;
            return Ok(());
        };

        {
            let mut state = self.write();
            state.phase = LoadPhase::Loading;
        }

        match self.progress.fetch_progress(user_id, track).await {
            Ok(records) => {
                let mut state = self.write();
                tracing::info!(track = %track, count = records.len(), "progress mirror loaded");
                state.records = records;
                state.phase = LoadPhase::Ready;
                Ok(())
            }
            Err(e) => {
                let mut state = self.write();
                tracing::warn!(track = %track, err = %e, "progress load failed");
                state.phase = LoadPhase::Error(e.to_string());
                Err(StoreError::Fetch(e))
            }
        }
    }

    /// Load catalog and progress for a track in one go.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError` either load produces.
    pub async fn switch_track(&self, track: Track) -> Result<(), StoreError> {
        self.load_projects(track).await?;
        self.load_progress(track).await
    }

    /// Create or update the signed-in user's progress row for a project.
    ///
    /// Looks the project up in the mirror to decide between create and
    /// update, so at most one row per (user, project, track) ever exists.
    /// The mirror is only touched after the gateway confirms the write; on
    /// failure it is left at its pre-mutation value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without calling the gateway
    /// when signed out, or `StoreError::Update` when the write fails.
    pub async fn upsert_progress(
        &self,
        project_id: ProjectId,
        patch: ProgressPatch,
    ) -> Result<ProgressRecord, StoreError> {
        let user_id = self.current_user().ok_or(StoreError::NotAuthenticated)?;

        let (track, existing) = {
            let state = self.read();
            let existing = state
                .records
                .iter()
                .find(|r| r.project_id() == project_id)
                .cloned();
            (state.track, existing)
        };

        // The lock is released across the round trip: other interactions
        // stay live while this write is in flight.
        let resolved = match existing {
            Some(record) => self
                .progress
                .update_progress(record.id(), &patch)
                .await
                .map_err(StoreError::Update)?,
            None => self
                .progress
                .create_progress(NewProgressRecord {
                    user_id,
                    project_id,
                    track,
                    patch,
                })
                .await
                .map_err(StoreError::Update)?,
        };

        let mut state = self.write();
        if let Some(slot) = state.records.iter_mut().find(|r| r.id() == resolved.id()) {
            *slot = resolved.clone();
        } else {
            state.records.push(resolved.clone());
        }
        state.phase = LoadPhase::Ready;
        tracing::debug!(project = %project_id, "progress row upserted");
        Ok(resolved)
    }

    /// Flip the completion flag for a project.
    ///
    /// Completing stamps `completed_at` with the store clock; un-completing
    /// clears it.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::upsert_progress`].
    pub async fn toggle_completion(
        &self,
        project_id: ProjectId,
    ) -> Result<ToggleOutcome, StoreError> {
        let was_completed = self
            .progress_for(project_id)
            .is_some_and(|r| r.is_completed());

        let patch = if was_completed {
            ProgressPatch::new().completion(false, None)
        } else {
            ProgressPatch::new().completion(true, Some(self.clock.now()))
        };

        let record = self.upsert_progress(project_id, patch).await?;
        let newly_completed = !was_completed && record.is_completed();
        Ok(ToggleOutcome {
            record,
            newly_completed,
        })
    }

    /// Replace the notes on a project's progress row.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::upsert_progress`].
    pub async fn update_notes(
        &self,
        project_id: ProjectId,
        notes: impl Into<String>,
    ) -> Result<ProgressRecord, StoreError> {
        self.upsert_progress(project_id, ProgressPatch::new().notes(notes.into()))
            .await
    }

    /// Replace both share links on a project's progress row.
    ///
    /// Link well-formedness is not checked here.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`Self::upsert_progress`].
    pub async fn update_links(
        &self,
        project_id: ProjectId,
        github_link: impl Into<String>,
        learning_link: impl Into<String>,
    ) -> Result<ProgressRecord, StoreError> {
        self.upsert_progress(
            project_id,
            ProgressPatch::new().links(github_link.into(), learning_link.into()),
        )
        .await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
