use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activities::{ActivityId, StudentId};

use super::diagnostics::{IntegrityIssue, ScoringDiagnostic};
use super::rules::{CategoryId, RuleTable, SubTypeId};

/// One scored activity. Derived on every pass and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub activity_id: ActivityId,
    pub student_id: StudentId,
    pub category_id: CategoryId,
    pub sub_id: SubTypeId,
    pub raw_points: u32,
}

/// A student's points for one sub-type after the sub-type cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTypeScore {
    pub sub_id: SubTypeId,
    pub label: String,
    pub activity_count: usize,
    pub raw_points: u32,
    pub max_points: u32,
    pub capped_points: u32,
}

/// A student's points for one category: sub-type caps first, then the category cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub student_id: StudentId,
    pub category_id: CategoryId,
    pub label: String,
    /// Sum of the sub-type capped points, before the category cap.
    pub subtotal: u32,
    pub max_points: u32,
    pub capped_points: u32,
    pub sub_types: Vec<SubTypeScore>,
}

/// Output of a capping pass, ordered by student then rule-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedScores {
    pub categories: Vec<CategoryScore>,
    pub diagnostics: Vec<ScoringDiagnostic>,
}

impl CappedScores {
    pub fn for_student<'a>(
        &'a self,
        student_id: &StudentId,
    ) -> impl Iterator<Item = &'a CategoryScore> + 'a {
        let student_id = student_id.clone();
        self.categories
            .iter()
            .filter(move |category| category.student_id == student_id)
    }
}

#[derive(Default)]
struct Accumulator {
    raw_points: u32,
    activity_count: usize,
}

type SubTypeGroups = BTreeMap<usize, Accumulator>;
type CategoryGroups = BTreeMap<usize, SubTypeGroups>;

pub(crate) fn cap_scores(rules: &RuleTable, matches: &[MatchResult]) -> CappedScores {
    let mut diagnostics = Vec::new();
    let mut grouped: BTreeMap<StudentId, CategoryGroups> = BTreeMap::new();

    for result in matches {
        let Some((category_index, sub_index)) = rules.position(result.category_id, result.sub_id)
        else {
            warn!(
                activity_id = %result.activity_id,
                student_id = %result.student_id,
                category_id = %result.category_id,
                sub_id = %result.sub_id,
                "match refers to a rule that is no longer in the table"
            );
            diagnostics.push(ScoringDiagnostic {
                activity_id: result.activity_id.clone(),
                student_id: result.student_id.clone(),
                issue: IntegrityIssue::UnknownRule {
                    category_id: result.category_id,
                    sub_id: result.sub_id,
                },
            });
            continue;
        };

        let accumulator = grouped
            .entry(result.student_id.clone())
            .or_default()
            .entry(category_index)
            .or_default()
            .entry(sub_index)
            .or_default();
        accumulator.raw_points = accumulator.raw_points.saturating_add(result.raw_points);
        accumulator.activity_count += 1;
    }

    let mut categories = Vec::new();
    for (student_id, category_groups) in grouped {
        for (category_index, sub_groups) in category_groups {
            let category = &rules.categories()[category_index];

            let sub_types: Vec<SubTypeScore> = sub_groups
                .into_iter()
                .map(|(sub_index, accumulator)| {
                    let sub = &category.sub_types[sub_index];
                    let max_points = category.sub_type_cap(sub);
                    SubTypeScore {
                        sub_id: sub.sub_id,
                        label: sub.label.clone(),
                        activity_count: accumulator.activity_count,
                        raw_points: accumulator.raw_points,
                        max_points,
                        capped_points: accumulator.raw_points.min(max_points),
                    }
                })
                .collect();

            let subtotal = sub_types
                .iter()
                .fold(0u32, |total, sub| total.saturating_add(sub.capped_points));

            categories.push(CategoryScore {
                student_id: student_id.clone(),
                category_id: category.category_id,
                label: category.label.clone(),
                subtotal,
                max_points: category.max_points,
                capped_points: subtotal.min(category.max_points),
                sub_types,
            });
        }
    }

    CappedScores {
        categories,
        diagnostics,
    }
}
