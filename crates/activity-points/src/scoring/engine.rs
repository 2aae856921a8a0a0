use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activities::{ActivityRecord, StudentId};

use super::aggregate::{total_score, StudentScore};
use super::calculator::{raw_points, ActivityPoints, LevelMismatchPolicy};
use super::capping::{cap_scores, CappedScores, MatchResult};
use super::diagnostics::{IntegrityIssue, ScoringDiagnostic};
use super::matcher::{match_activity, RuleMatch};
use super::rules::{CategoryId, RuleTable, SubTypeId};

/// Stateless scorer that applies one immutable rule table to activity snapshots.
///
/// The engine holds no mutable state, so a single instance can score many students
/// concurrently. One student's activities must be scored in a single call because the
/// caps only make sense over the complete set.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    rules: Arc<RuleTable>,
    level_mismatch: LevelMismatchPolicy,
}

/// Match and raw points for a single unsaved activity, as shown by the upload form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPreview {
    pub category_id: CategoryId,
    pub category_label: String,
    pub sub_id: SubTypeId,
    pub sub_type_label: String,
    pub fallback: bool,
    pub raw_points: u32,
    pub sub_type_max_points: u32,
    pub category_max_points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<IntegrityIssue>,
}

impl ScoringEngine {
    pub fn new(rules: Arc<RuleTable>, level_mismatch: LevelMismatchPolicy) -> Self {
        Self {
            rules,
            level_mismatch,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn level_mismatch_policy(&self) -> LevelMismatchPolicy {
        self.level_mismatch
    }

    pub fn match_activity(&self, activity: &ActivityRecord) -> RuleMatch {
        match_activity(&self.rules, activity)
    }

    pub fn compute_raw_points(
        &self,
        activity: &ActivityRecord,
        category_id: CategoryId,
        sub_id: SubTypeId,
    ) -> Result<ActivityPoints, IntegrityIssue> {
        raw_points(&self.rules, activity, category_id, sub_id, self.level_mismatch)
    }

    /// Match then compute raw points for one activity.
    pub fn score_activity(&self, activity: &ActivityRecord) -> Result<MatchResult, IntegrityIssue> {
        let matched = self.match_activity(activity);
        let points = self.compute_raw_points(activity, matched.category_id, matched.sub_id)?;

        Ok(MatchResult {
            activity_id: activity.id.clone(),
            student_id: activity.owner_id.clone(),
            category_id: points.category_id,
            sub_id: points.sub_id,
            raw_points: points.raw_points,
        })
    }

    pub fn cap_scores(&self, matches: &[MatchResult]) -> CappedScores {
        cap_scores(&self.rules, matches)
    }

    pub fn total_score(&self, scores: &CappedScores, student_id: &StudentId) -> u32 {
        total_score(scores, student_id)
    }

    /// Score a student's full activity history in one pass.
    ///
    /// Activities owned by someone else, or with integrity problems, are excluded and
    /// reported as diagnostics rather than failing the whole computation.
    pub fn score_student(&self, student_id: &StudentId, activities: &[ActivityRecord]) -> StudentScore {
        let mut matches = Vec::with_capacity(activities.len());
        let mut diagnostics = Vec::new();

        for activity in activities {
            let issue = if &activity.owner_id != student_id {
                IntegrityIssue::ForeignActivity {
                    owner_id: activity.owner_id.clone(),
                }
            } else {
                match self.score_activity(activity) {
                    Ok(result) => {
                        matches.push(result);
                        continue;
                    }
                    Err(issue) => issue,
                }
            };

            warn!(
                %student_id,
                activity_id = %activity.id,
                %issue,
                "activity excluded from scoring"
            );
            diagnostics.push(ScoringDiagnostic {
                activity_id: activity.id.clone(),
                student_id: student_id.clone(),
                issue,
            });
        }

        let capped = self.cap_scores(&matches);
        diagnostics.extend(capped.diagnostics.iter().cloned());
        let total_score = self.total_score(&capped, student_id);

        debug!(
            %student_id,
            total_score,
            scored = matches.len(),
            excluded = diagnostics.len(),
            rules_version = self.rules.version(),
            "student score computed"
        );

        StudentScore {
            student_id: student_id.clone(),
            rules_version: self.rules.version().to_string(),
            total_score,
            categories: capped.categories,
            activities: matches,
            diagnostics,
        }
    }

    /// Same matching and point rules as a full scoring pass, for a single activity.
    pub fn preview(&self, activity: &ActivityRecord) -> ActivityPreview {
        let matched = self.match_activity(activity);
        let (points, issue) = match self.compute_raw_points(activity, matched.category_id, matched.sub_id) {
            Ok(points) => (points, None),
            Err(issue) => (
                ActivityPoints {
                    category_id: matched.category_id,
                    sub_id: matched.sub_id,
                    raw_points: 0,
                },
                Some(issue),
            ),
        };

        let (category_label, sub_type_label, sub_type_max_points, category_max_points) = self
            .rules
            .sub_type(points.category_id, points.sub_id)
            .map(|(category, sub)| {
                (
                    category.label.clone(),
                    sub.label.clone(),
                    category.sub_type_cap(sub),
                    category.max_points,
                )
            })
            .unwrap_or_default();

        ActivityPreview {
            category_id: points.category_id,
            category_label,
            sub_id: points.sub_id,
            sub_type_label,
            fallback: matched.fallback,
            raw_points: points.raw_points,
            sub_type_max_points,
            category_max_points,
            issue,
        }
    }
}
