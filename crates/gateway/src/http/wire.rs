//! Wire shapes for the hosted backend's REST dialect.
//!
//! Rows deserialize liberally (string enums, defaulted text columns) and
//! convert into domain types through fallible mappers, so a malformed row
//! surfaces as `GatewayError::Decode` instead of a panic.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use tracker_core::model::{
    NewProgressRecord, ProfileId, ProgressId, ProgressPatch, ProgressRecord, Project, ProjectId,
    Stage, Track, UserId, UserProfile,
};

use crate::remote::GatewayError;

pub(crate) fn decode<E: core::fmt::Display>(e: E) -> GatewayError {
    GatewayError::Decode(e.to_string())
}

//
// ─── PROJECT ROWS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectRow {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub stage: u8,
    #[serde(default)]
    pub stage_name: String,
    pub difficulty: String,
    pub project_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    pub fn into_project(self) -> Result<Project, GatewayError> {
        let stage = Stage::new(self.stage).map_err(decode)?;
        let difficulty = self.difficulty.parse().map_err(decode)?;
        let track: Track = self.project_type.parse().map_err(decode)?;
        Project::new(
            ProjectId::new(self.id),
            self.title,
            self.description,
            stage,
            self.stage_name,
            difficulty,
            track,
            self.created_at,
            self.updated_at,
        )
        .map_err(decode)
    }
}

//
// ─── PROGRESS ROWS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: u64,
    pub project_type: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub github_link: String,
    #[serde(default)]
    pub learning_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRow {
    pub fn into_record(self) -> Result<ProgressRecord, GatewayError> {
        let track: Track = self.project_type.parse().map_err(decode)?;
        Ok(ProgressRecord::from_persisted(
            ProgressId::new(self.id),
            UserId::new(self.user_id),
            ProjectId::new(self.project_id),
            track,
            self.is_completed,
            self.completed_at,
            self.notes,
            self.github_link,
            self.learning_link,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Body for a progress insert; only fields named by the patch ride along,
/// the backend fills the rest with column defaults.
pub(crate) fn progress_insert_body(new: &NewProgressRecord) -> Value {
    let mut body = Map::new();
    body.insert("user_id".into(), json!(new.user_id.value()));
    body.insert("project_id".into(), json!(new.project_id.value()));
    body.insert("project_type".into(), json!(new.track.as_str()));
    extend_with_patch(&mut body, &new.patch);
    Value::Object(body)
}

/// Body for a progress update: the patched fields plus the refreshed
/// `updated_at`.
pub(crate) fn progress_patch_body(patch: &ProgressPatch, updated_at: DateTime<Utc>) -> Value {
    let mut body = Map::new();
    extend_with_patch(&mut body, patch);
    body.insert("updated_at".into(), json!(updated_at));
    Value::Object(body)
}

fn extend_with_patch(body: &mut Map<String, Value>, patch: &ProgressPatch) {
    if let Some(flag) = patch.is_completed_field() {
        body.insert("is_completed".into(), json!(flag));
    }
    if let Some(at) = patch.completed_at_field() {
        // explicit null clears the column
        body.insert("completed_at".into(), json!(at));
    }
    if let Some(notes) = patch.notes_field() {
        body.insert("notes".into(), json!(notes));
    }
    if let Some(link) = patch.github_link_field() {
        body.insert("github_link".into(), json!(link));
    }
    if let Some(link) = patch.learning_link_field() {
        body.insert("learning_link".into(), json!(link));
    }
}

//
// ─── PROFILE ROWS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    pub fn into_profile(self) -> UserProfile {
        UserProfile::from_persisted(
            ProfileId::new(self.id),
            UserId::new(self.user_id),
            self.full_name,
            self.username,
            self.avatar_url,
            self.bio,
            self.created_at,
            self.updated_at,
        )
    }
}

//
// ─── AUTH PAYLOADS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::time::fixed_now;

    #[test]
    fn project_row_decodes_backend_payload() {
        let row: ProjectRow = serde_json::from_value(json!({
            "id": 12,
            "title": "Login Form",
            "description": "Sessions and cookies",
            "stage": 2,
            "stage_name": "Forms & State",
            "difficulty": "medium",
            "project_type": "php",
            "created_at": "2024-03-01T13:00:00Z",
            "updated_at": "2024-03-01T13:00:00Z"
        }))
        .unwrap();
        let project = row.into_project().unwrap();
        assert_eq!(project.id(), ProjectId::new(12));
        assert_eq!(project.track(), Track::Php);
        assert_eq!(project.stage().number(), 2);
    }

    #[test]
    fn project_row_rejects_unknown_track() {
        let row: ProjectRow = serde_json::from_value(json!({
            "id": 1,
            "title": "X",
            "stage": 1,
            "difficulty": "easy",
            "project_type": "cobol",
            "created_at": "2024-03-01T13:00:00Z",
            "updated_at": "2024-03-01T13:00:00Z"
        }))
        .unwrap();
        assert!(matches!(
            row.into_project().unwrap_err(),
            GatewayError::Decode(_)
        ));
    }

    #[test]
    fn progress_row_defaults_optional_columns() {
        let row: ProgressRow = serde_json::from_value(json!({
            "id": "7b1c6a34-9a41-4de2-bd9b-5df5eec06535",
            "user_id": "f3a85c52-11de-4a05-9d5a-7b9fbd3be1aa",
            "project_id": 5,
            "project_type": "react",
            "created_at": "2024-03-01T13:00:00Z",
            "updated_at": "2024-03-01T13:00:00Z"
        }))
        .unwrap();
        let record = row.into_record().unwrap();
        assert!(!record.is_completed());
        assert_eq!(record.completed_at(), None);
        assert_eq!(record.notes(), "");
    }

    #[test]
    fn patch_body_sends_explicit_null_for_cleared_timestamp() {
        let patch = ProgressPatch::new().completion(false, None);
        let body = progress_patch_body(&patch, fixed_now());
        let object = body.as_object().unwrap();
        assert_eq!(object["is_completed"], json!(false));
        assert!(object["completed_at"].is_null());
        assert!(object.contains_key("updated_at"));
        assert!(!object.contains_key("notes"));
    }

    #[test]
    fn insert_body_carries_identity_and_patch_fields() {
        let new = NewProgressRecord {
            user_id: UserId::new(Uuid::nil()),
            project_id: ProjectId::new(9),
            track: Track::HtmlCss,
            patch: ProgressPatch::new().notes("n"),
        };
        let body = progress_insert_body(&new);
        let object = body.as_object().unwrap();
        assert_eq!(object["project_id"], json!(9));
        assert_eq!(object["project_type"], json!("html-css"));
        assert_eq!(object["notes"], json!("n"));
        assert!(!object.contains_key("is_completed"));
    }
}
