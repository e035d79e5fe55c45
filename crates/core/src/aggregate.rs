//! Pure derivations over the project catalog and the progress mirror.
//!
//! Everything here is re-entrant and side-effect free: callers pass
//! snapshots in and get fresh values out, so recomputing on every render
//! is always safe.

use std::collections::HashSet;

use crate::model::{Difficulty, ProgressRecord, Project, ProjectId, Stage};

//
// ─── FILTERING ─────────────────────────────────────────────────────────────────
//

/// Stage criterion: everything, or one exact stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageFilter {
    #[default]
    All,
    Only(Stage),
}

/// Difficulty criterion: everything, or one exact difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(Difficulty),
}

/// Combined filter criteria for the project list.
///
/// All three predicates are ANDed. An empty search term matches every
/// project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectFilter {
    search_term: String,
    stage: StageFilter,
    difficulty: DifficultyFilter,
}

impl ProjectFilter {
    /// The no-op filter that keeps every project.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = StageFilter::Only(stage);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = DifficultyFilter::Only(difficulty);
        self
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub fn stage(&self) -> StageFilter {
        self.stage
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyFilter {
        self.difficulty
    }

    /// Whether the project satisfies all three criteria.
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        let term = self.search_term.to_lowercase();
        let matches_search = term.is_empty()
            || project.title().to_lowercase().contains(&term)
            || project.description().to_lowercase().contains(&term);
        let matches_stage = match self.stage {
            StageFilter::All => true,
            StageFilter::Only(stage) => project.stage() == stage,
        };
        let matches_difficulty = match self.difficulty {
            DifficultyFilter::All => true,
            DifficultyFilter::Only(difficulty) => project.difficulty() == difficulty,
        };
        matches_search && matches_stage && matches_difficulty
    }
}

/// Returns the ordered subsequence of `projects` matching `filter`.
///
/// The filter is stable: input order is preserved and nothing is re-sorted.
#[must_use]
pub fn filter_projects<'a>(projects: &'a [Project], filter: &ProjectFilter) -> Vec<&'a Project> {
    projects.iter().filter(|p| filter.matches(p)).collect()
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// The set of project ids marked completed in the given records.
///
/// Used only for membership tests; order is irrelevant.
#[must_use]
pub fn completed_project_ids(records: &[ProgressRecord]) -> HashSet<ProjectId> {
    records
        .iter()
        .filter(|r| r.is_completed())
        .map(ProgressRecord::project_id)
        .collect()
}

//
// ─── STAGE ROLLUPS ─────────────────────────────────────────────────────────────
//

/// Completion counters for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageCount {
    pub completed: usize,
    pub total: usize,
}

impl StageCount {
    /// Completion percentage, reported as 0 for an empty stage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}

/// Per-stage completion counters; every stage is always present, empty
/// stages with `total == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageProgress {
    counts: [StageCount; Stage::ALL.len()],
}

impl StageProgress {
    #[must_use]
    pub fn get(&self, stage: Stage) -> StageCount {
        self.counts[usize::from(stage.number() - 1)]
    }

    /// Iterates stages in ascending order with their counters.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, StageCount)> + '_ {
        Stage::ALL.into_iter().map(|s| (s, self.get(s)))
    }
}

/// Counts, per stage, how many projects exist and how many of them appear
/// in `completed`.
#[must_use]
pub fn compute_stage_progress(
    projects: &[Project],
    completed: &HashSet<ProjectId>,
) -> StageProgress {
    let mut progress = StageProgress::default();
    for project in projects {
        let slot = &mut progress.counts[usize::from(project.stage().number() - 1)];
        slot.total += 1;
        if completed.contains(&project.id()) {
            slot.completed += 1;
        }
    }
    progress
}

//
// ─── OVERALL ROLLUP ────────────────────────────────────────────────────────────
//

/// Whole-track completion counters for the header tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverallProgress {
    pub completed: usize,
    pub total: usize,
}

impl OverallProgress {
    #[must_use]
    pub fn compute(projects: &[Project], completed: &HashSet<ProjectId>) -> Self {
        let done = projects.iter().filter(|p| completed.contains(&p.id())).count();
        Self {
            completed: done,
            total: projects.len(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }

    /// Completion percentage, reported as 0 for an empty catalog.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.completed * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Track, UserId};
    use crate::time::fixed_now;
    use uuid::Uuid;

    fn project(id: u64, stage: u8, difficulty: Difficulty, title: &str, desc: &str) -> Project {
        Project::new(
            ProjectId::new(id),
            title,
            desc,
            Stage::new(stage).unwrap(),
            format!("Stage {stage}"),
            difficulty,
            Track::Php,
            fixed_now(),
            fixed_now(),
        )
        .unwrap()
    }

    fn completed_record(project_id: u64) -> ProgressRecord {
        ProgressRecord::from_persisted(
            crate::model::ProgressId::new(Uuid::new_v4()),
            UserId::new(Uuid::new_v4()),
            ProjectId::new(project_id),
            Track::Php,
            true,
            Some(fixed_now()),
            String::new(),
            String::new(),
            String::new(),
            fixed_now(),
            fixed_now(),
        )
    }

    fn catalog() -> Vec<Project> {
        vec![
            project(1, 1, Difficulty::Easy, "Hello", "first steps"),
            project(2, 2, Difficulty::Hard, "World", "harder stuff"),
        ]
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let projects = catalog();
        let filter = ProjectFilter::all().with_search("hello");
        let hits = filter_projects(&projects, &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), ProjectId::new(1));

        let filter = ProjectFilter::all().with_search("HARDER");
        let hits = filter_projects(&projects, &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), ProjectId::new(2));
    }

    #[test]
    fn noop_filter_is_identity() {
        let projects = catalog();
        let hits = filter_projects(&projects, &ProjectFilter::all());
        let ids: Vec<_> = hits.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![ProjectId::new(1), ProjectId::new(2)]);
    }

    #[test]
    fn filter_is_idempotent() {
        let projects = catalog();
        let filter = ProjectFilter::all().with_difficulty(Difficulty::Hard);
        let once: Vec<Project> = filter_projects(&projects, &filter)
            .into_iter()
            .cloned()
            .collect();
        let twice = filter_projects(&once, &filter);
        assert_eq!(once.len(), twice.len());
        assert!(once.iter().zip(twice.iter()).all(|(a, b)| a == *b));
    }

    #[test]
    fn predicates_are_anded() {
        let projects = catalog();
        let filter = ProjectFilter::all()
            .with_search("hello")
            .with_stage(Stage::new(2).unwrap());
        assert!(filter_projects(&projects, &filter).is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let projects = vec![
            project(3, 1, Difficulty::Easy, "Gamma", ""),
            project(1, 1, Difficulty::Easy, "Alpha", ""),
            project(2, 1, Difficulty::Easy, "Beta", ""),
        ];
        let hits = filter_projects(&projects, &ProjectFilter::all());
        let ids: Vec<_> = hits.iter().map(|p| p.id().value()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn completed_ids_skip_incomplete_records() {
        let mut records = vec![completed_record(1), completed_record(4)];
        records.push(ProgressRecord::from_persisted(
            crate::model::ProgressId::new(Uuid::new_v4()),
            UserId::new(Uuid::new_v4()),
            ProjectId::new(2),
            Track::Php,
            false,
            None,
            String::new(),
            String::new(),
            String::new(),
            fixed_now(),
            fixed_now(),
        ));

        let ids = completed_project_ids(&records);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&ProjectId::new(1)));
        assert!(ids.contains(&ProjectId::new(4)));
        assert!(!ids.contains(&ProjectId::new(2)));
    }

    #[test]
    fn stage_rollup_counts_match_catalog() {
        // stages [1, 1, 2, 3], completed: one stage-1 project and the stage-2 one
        let projects = vec![
            project(1, 1, Difficulty::Easy, "A", ""),
            project(2, 1, Difficulty::Easy, "B", ""),
            project(3, 2, Difficulty::Medium, "C", ""),
            project(4, 3, Difficulty::Hard, "D", ""),
        ];
        let completed: HashSet<_> = [ProjectId::new(1), ProjectId::new(3)].into_iter().collect();

        let rollup = compute_stage_progress(&projects, &completed);
        assert_eq!(rollup.get(Stage::new(1).unwrap()), StageCount { completed: 1, total: 2 });
        assert_eq!(rollup.get(Stage::new(2).unwrap()), StageCount { completed: 1, total: 1 });
        assert_eq!(rollup.get(Stage::new(3).unwrap()), StageCount { completed: 0, total: 1 });
        assert_eq!(rollup.get(Stage::new(4).unwrap()), StageCount { completed: 0, total: 0 });
    }

    #[test]
    fn completed_never_exceeds_total() {
        let projects = catalog();
        let completed: HashSet<_> = [ProjectId::new(1), ProjectId::new(99)].into_iter().collect();
        let rollup = compute_stage_progress(&projects, &completed);
        for (_, count) in rollup.iter() {
            assert!(count.completed <= count.total);
        }
    }

    #[test]
    fn empty_stage_reports_zero_percent() {
        let rollup = compute_stage_progress(&[], &HashSet::new());
        for (_, count) in rollup.iter() {
            assert_eq!(count.total, 0);
            assert_eq!(count.percent(), 0);
        }
    }

    #[test]
    fn overall_rollup_and_percent() {
        let projects = catalog();
        let completed: HashSet<_> = [ProjectId::new(2)].into_iter().collect();
        let overall = OverallProgress::compute(&projects, &completed);
        assert_eq!(overall.completed, 1);
        assert_eq!(overall.total, 2);
        assert_eq!(overall.remaining(), 1);
        assert_eq!(overall.percent(), 50);

        let empty = OverallProgress::compute(&[], &HashSet::new());
        assert_eq!(empty.percent(), 0);
    }
}
