use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::activities::ActivityRecord;

use super::diagnostics::IntegrityIssue;
use super::rules::{CategoryId, RuleTable, SubTypeId};

/// What to do when a tiered sub-type was selected for a record whose level disagrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelMismatchPolicy {
    /// Exclude the record and log at error level.
    Reject,
    /// Score the record at the category's lowest tier and log a warning.
    LowestTier,
}

impl LevelMismatchPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reject" | "strict" => Some(Self::Reject),
            "lowest_tier" | "lowest" => Some(Self::LowestTier),
            _ => None,
        }
    }
}

/// Raw points awarded to one activity, before any aggregate capping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPoints {
    pub category_id: CategoryId,
    /// Differs from the requested sub-type only when a level mismatch was scored leniently.
    pub sub_id: SubTypeId,
    pub raw_points: u32,
}

pub(crate) fn raw_points(
    rules: &RuleTable,
    activity: &ActivityRecord,
    category_id: CategoryId,
    sub_id: SubTypeId,
    policy: LevelMismatchPolicy,
) -> Result<ActivityPoints, IntegrityIssue> {
    let (category, sub) = rules
        .sub_type(category_id, sub_id)
        .ok_or(IntegrityIssue::UnknownRule {
            category_id,
            sub_id,
        })?;

    let mut scored = sub;
    if let Some(required) = &sub.level {
        match &activity.level {
            None => {
                return Err(IntegrityIssue::MissingLevel {
                    category_id,
                    sub_id,
                });
            }
            Some(actual) if actual.same_as(required) => {}
            Some(actual) => match policy {
                LevelMismatchPolicy::Reject => {
                    error!(
                        activity_id = %activity.id,
                        %category_id,
                        %sub_id,
                        expected = %required,
                        found = %actual,
                        "tiered sub-type selected for a record of another level"
                    );
                    return Err(IntegrityIssue::LevelMismatch {
                        category_id,
                        sub_id,
                        expected: required.clone(),
                        found: actual.clone(),
                    });
                }
                LevelMismatchPolicy::LowestTier => {
                    if let Some(lowest) = category.lowest_tier() {
                        warn!(
                            activity_id = %activity.id,
                            %category_id,
                            %sub_id,
                            expected = %required,
                            found = %actual,
                            lowest_tier = %lowest.sub_id,
                            "level mismatch scored at lowest tier"
                        );
                        scored = lowest;
                    }
                }
            },
        }
    }

    Ok(ActivityPoints {
        category_id,
        sub_id: scored.sub_id,
        raw_points: scored.points_per_unit.min(category.sub_type_cap(scored)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::{ActivityId, ActivityLevel, ActivityType, StudentId};
    use crate::scoring::rules::{MatchPredicate, RuleCategory, RuleTableDocument, SubTypeRule};
    use chrono::NaiveDate;

    fn activity(level: Option<ActivityLevel>) -> ActivityRecord {
        ActivityRecord {
            id: ActivityId("act-7".to_string()),
            owner_id: StudentId("21A91A0507".to_string()),
            event_name: "Chess Tournament".to_string(),
            description: String::new(),
            activity_type: ActivityType::Competition,
            date: NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date"),
            level,
        }
    }

    const SPORTS: CategoryId = CategoryId(13);

    #[test]
    fn awards_per_unit_points() {
        let rules = RuleTable::standard();
        let points = raw_points(
            &rules,
            &activity(Some(ActivityLevel::State)),
            SPORTS,
            SubTypeId(4),
            LevelMismatchPolicy::Reject,
        )
        .expect("state tier scores");
        assert_eq!(points.raw_points, 15);
        assert_eq!(points.sub_id, SubTypeId(4));
    }

    #[test]
    fn missing_level_is_an_integrity_issue() {
        let rules = RuleTable::standard();
        let result = raw_points(
            &rules,
            &activity(None),
            SPORTS,
            SubTypeId(1),
            LevelMismatchPolicy::LowestTier,
        );
        assert_eq!(
            result,
            Err(IntegrityIssue::MissingLevel {
                category_id: SPORTS,
                sub_id: SubTypeId(1),
            })
        );
    }

    #[test]
    fn mismatched_level_is_rejected_under_strict_policy() {
        let rules = RuleTable::standard();
        let result = raw_points(
            &rules,
            &activity(Some(ActivityLevel::College)),
            SPORTS,
            SubTypeId(5),
            LevelMismatchPolicy::Reject,
        );
        assert!(matches!(
            result,
            Err(IntegrityIssue::LevelMismatch {
                expected: ActivityLevel::National,
                found: ActivityLevel::College,
                ..
            })
        ));
    }

    #[test]
    fn mismatched_level_scores_lowest_tier_when_lenient() {
        let rules = RuleTable::standard();
        let points = raw_points(
            &rules,
            &activity(Some(ActivityLevel::College)),
            SPORTS,
            SubTypeId(5),
            LevelMismatchPolicy::LowestTier,
        )
        .expect("lenient policy scores");
        assert_eq!(points.sub_id, SubTypeId(1));
        assert_eq!(points.raw_points, 5);
    }

    #[test]
    fn unknown_rule_is_reported() {
        let rules = RuleTable::standard();
        let result = raw_points(
            &rules,
            &activity(None),
            CategoryId(7),
            SubTypeId(1),
            LevelMismatchPolicy::Reject,
        );
        assert!(matches!(result, Err(IntegrityIssue::UnknownRule { .. })));
    }

    #[test]
    fn single_activity_never_exceeds_sub_type_cap() {
        let rules = RuleTable::from_document(RuleTableDocument {
            version: "cap-test".to_string(),
            fallback_category: CategoryId(1),
            categories: vec![RuleCategory {
                category_id: CategoryId(1),
                label: "Other".to_string(),
                max_points: 8,
                predicate: None,
                sub_types: vec![SubTypeRule {
                    sub_id: SubTypeId(1),
                    label: "Oversized".to_string(),
                    points_per_unit: 50,
                    max_points: Some(4),
                    level: None,
                    predicate: MatchPredicate::default(),
                }],
            }],
        })
        .expect("valid table");

        let points = raw_points(
            &rules,
            &activity(None),
            CategoryId(1),
            SubTypeId(1),
            LevelMismatchPolicy::Reject,
        )
        .expect("scores");
        assert_eq!(points.raw_points, 4);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(LevelMismatchPolicy::parse("Reject"), Some(LevelMismatchPolicy::Reject));
        assert_eq!(
            LevelMismatchPolicy::parse("lowest-tier"),
            Some(LevelMismatchPolicy::LowestTier)
        );
        assert_eq!(LevelMismatchPolicy::parse("maybe"), None);
    }
}
