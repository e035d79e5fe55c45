use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ProjectId;
use crate::model::track::Track;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProjectError {
    #[error("project title cannot be empty")]
    EmptyTitle,

    #[error("stage must be between 1 and 4, got {0}")]
    InvalidStage(u8),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── STAGE ─────────────────────────────────────────────────────────────────────
//

/// Coarse grouping of projects within a track, from 1 (fundamentals) to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Stage(u8);

impl Stage {
    /// All stages in ascending order.
    pub const ALL: [Stage; 4] = [Stage(1), Stage(2), Stage(3), Stage(4)];

    /// Creates a stage from its number.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::InvalidStage` when the number is outside `1..=4`.
    pub fn new(number: u8) -> Result<Self, ProjectError> {
        if (1..=4).contains(&number) {
            Ok(Self(number))
        } else {
            Err(ProjectError::InvalidStage(number))
        }
    }

    /// Returns the stage number.
    #[must_use]
    pub fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Relative difficulty of a single project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Returns the wire literal used by the backend.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ProjectError::UnknownDifficulty(other.to_string())),
        }
    }
}

//
// ─── PROJECT ───────────────────────────────────────────────────────────────────
//

/// A single coding exercise in the shared catalog.
///
/// Projects are seed data owned by the backend; the client fetches them per
/// track and never mutates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    title: String,
    description: String,
    stage: Stage,
    stage_name: String,
    difficulty: Difficulty,
    track: Track,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project from already-validated parts.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::EmptyTitle` when the title is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ProjectId,
        title: impl Into<String>,
        description: impl Into<String>,
        stage: Stage,
        stage_name: impl Into<String>,
        difficulty: Difficulty,
        track: Track,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ProjectError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ProjectError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: description.into(),
            stage,
            stage_name: stage_name.into(),
            difficulty,
            track,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ProjectId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn track(&self) -> Track {
        self.track
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
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
