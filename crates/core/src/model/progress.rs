use chrono::{DateTime, Utc};

use crate::model::ids::{ProgressId, ProjectId, UserId};
use crate::model::track::Track;

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// One user's progress against one project.
///
/// At most one record exists per (user, project, track) triple. Absence of a
/// record is equivalent to the all-defaults state: not completed, no
/// timestamps, empty notes and links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    id: ProgressId,
    user_id: UserId,
    project_id: ProjectId,
    track: Track,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    notes: String,
    github_link: String,
    learning_link: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Rebuilds a record from backend-persisted fields.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: ProgressId,
        user_id: UserId,
        project_id: ProjectId,
        track: Track,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
        notes: String,
        github_link: String,
        learning_link: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            project_id,
            track,
            is_completed,
            completed_at,
            notes,
            github_link,
            learning_link,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> ProgressId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    #[must_use]
    pub fn track(&self) -> Track {
        self.track
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn github_link(&self) -> &str {
        &self.github_link
    }

    #[must_use]
    pub fn learning_link(&self) -> &str {
        &self.learning_link
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
// ─── PARTIAL UPDATE ────────────────────────────────────────────────────────────
//

/// Closed partial-update over the mutable fields of a [`ProgressRecord`].
///
/// Every mutable field is enumerated here; a field left as `None` is not
/// touched by the update. `completed_at` is doubly optional because the
/// backend column is nullable: the outer `Option` marks the field as present
/// in the update, the inner one carries the nullable value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    is_completed: Option<bool>,
    completed_at: Option<Option<DateTime<Utc>>>,
    notes: Option<String>,
    github_link: Option<String>,
    learning_link: Option<String>,
}

impl ProgressPatch {
    /// An empty patch that touches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn completion(mut self, is_completed: bool, completed_at: Option<DateTime<Utc>>) -> Self {
        self.is_completed = Some(is_completed);
        self.completed_at = Some(completed_at);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn links(
        mut self,
        github_link: impl Into<String>,
        learning_link: impl Into<String>,
    ) -> Self {
        self.github_link = Some(github_link.into());
        self.learning_link = Some(learning_link.into());
        self
    }

    /// Returns true when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_completed.is_none()
            && self.completed_at.is_none()
            && self.notes.is_none()
            && self.github_link.is_none()
            && self.learning_link.is_none()
    }

    #[must_use]
    pub fn is_completed_field(&self) -> Option<bool> {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at_field(&self) -> Option<Option<DateTime<Utc>>> {
        self.completed_at
    }

    #[must_use]
    pub fn notes_field(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    #[must_use]
    pub fn github_link_field(&self) -> Option<&str> {
        self.github_link.as_deref()
    }

    #[must_use]
    pub fn learning_link_field(&self) -> Option<&str> {
        self.learning_link.as_deref()
    }

    /// Applies the patch to an existing record, refreshing `updated_at`.
    ///
    /// Gateways that simulate the backend use this to produce the row the
    /// server would return; the client mirror itself only ever stores rows
    /// exactly as the gateway returned them.
    #[must_use]
    pub fn apply_to(&self, record: &ProgressRecord, updated_at: DateTime<Utc>) -> ProgressRecord {
        let mut next = record.clone();
        if let Some(flag) = self.is_completed {
            next.is_completed = flag;
        }
        if let Some(at) = self.completed_at {
            next.completed_at = at;
        }
        if let Some(notes) = &self.notes {
            next.notes = notes.clone();
        }
        if let Some(link) = &self.github_link {
            next.github_link = link.clone();
        }
        if let Some(link) = &self.learning_link {
            next.learning_link = link.clone();
        }
        next.updated_at = updated_at;
        next
    }
}

//
// ─── CREATE SHAPE ──────────────────────────────────────────────────────────────
//

/// Fields the client supplies when creating a progress row; the backend
/// assigns the id and both timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgressRecord {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub track: Track,
    pub patch: ProgressPatch,
}

impl NewProgressRecord {
    /// Materializes the row the backend would persist for this create.
    #[must_use]
    pub fn into_record(self, id: ProgressId, now: DateTime<Utc>) -> ProgressRecord {
        let defaults = ProgressRecord {
            id,
            user_id: self.user_id,
            project_id: self.project_id,
            track: self.track,
            is_completed: false,
            completed_at: None,
            notes: String::new(),
            github_link: String::new(),
            learning_link: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.patch.apply_to(&defaults, now)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
