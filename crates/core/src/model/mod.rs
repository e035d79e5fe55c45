mod ids;
mod profile;
mod progress;
mod project;
mod session;
mod track;

pub use ids::{ParseIdError, ProfileId, ProgressId, ProjectId, UserId};
pub use profile::{ProfileDraft, ProfileError, UserProfile};
pub use progress::{NewProgressRecord, ProgressPatch, ProgressRecord};
pub use project::{Difficulty, Project, ProjectError, Stage};
pub use session::Session;
pub use track::{ParseTrackError, Track};
