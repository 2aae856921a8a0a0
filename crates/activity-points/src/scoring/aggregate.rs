use serde::{Deserialize, Serialize};

use crate::activities::StudentId;

use super::capping::{CappedScores, CategoryScore, MatchResult};
use super::diagnostics::ScoringDiagnostic;

/// Everything the dashboard needs for one student, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentScore {
    pub student_id: StudentId,
    pub rules_version: String,
    pub total_score: u32,
    pub categories: Vec<CategoryScore>,
    pub activities: Vec<MatchResult>,
    pub diagnostics: Vec<ScoringDiagnostic>,
}

/// Sum of a student's capped category totals. No further cap is applied here.
pub(crate) fn total_score(scores: &CappedScores, student_id: &StudentId) -> u32 {
    scores
        .for_student(student_id)
        .fold(0u32, |total, category| {
            total.saturating_add(category.capped_points)
        })
}
