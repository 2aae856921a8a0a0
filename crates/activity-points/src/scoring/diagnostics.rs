use serde::{Deserialize, Serialize};

use crate::activities::{ActivityId, ActivityLevel, StudentId};

use super::rules::{CategoryId, SubTypeId};

/// Per-activity data problems. An affected activity is left out of the computation; the
/// rest of the student's activities still score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    #[error("category {category_id} sub-type {sub_id} is not in the active rule table")]
    UnknownRule {
        category_id: CategoryId,
        sub_id: SubTypeId,
    },
    #[error("category {category_id} is scored by level but the activity has none")]
    MissingLevel {
        category_id: CategoryId,
        sub_id: SubTypeId,
    },
    #[error("category {category_id} sub-type {sub_id} expects {expected} level, activity is {found}")]
    LevelMismatch {
        category_id: CategoryId,
        sub_id: SubTypeId,
        expected: ActivityLevel,
        found: ActivityLevel,
    },
    #[error("activity belongs to student {owner_id}")]
    ForeignActivity { owner_id: StudentId },
}

/// An [`IntegrityIssue`] tied to the activity that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringDiagnostic {
    pub activity_id: ActivityId,
    pub student_id: StudentId,
    pub issue: IntegrityIssue,
}

impl ScoringDiagnostic {
    pub fn summary(&self) -> String {
        format!("activity {}: {}", self.activity_id, self.issue)
    }
}
