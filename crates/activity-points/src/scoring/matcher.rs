use serde::{Deserialize, Serialize};

use crate::activities::ActivityRecord;

use super::rules::{CategoryId, RuleCategory, RuleTable, SubTypeId, SubTypeRule};

/// The `(category, sub-type)` pair an activity resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleMatch {
    pub category_id: CategoryId,
    pub sub_id: SubTypeId,
    /// True when no predicate matched and the fallback category was used.
    pub fallback: bool,
}

/// Walk the table in declared order and return the first sub-type whose predicate holds.
///
/// The fallback category is never matched by predicate; it is the answer when nothing
/// else matches, so every record resolves to exactly one pair.
pub(crate) fn match_activity(rules: &RuleTable, activity: &ActivityRecord) -> RuleMatch {
    let text = activity.searchable_text();

    for category in rules.categories() {
        if category.category_id == rules.fallback_id() {
            continue;
        }
        if let Some(predicate) = &category.predicate {
            if !predicate.evaluate(&text, &activity.activity_type) {
                continue;
            }
        }

        if let Some(sub) = category
            .sub_types
            .iter()
            .find(|sub| sub_type_matches(category, sub, &text, activity))
        {
            return RuleMatch {
                category_id: category.category_id,
                sub_id: sub.sub_id,
                fallback: false,
            };
        }
    }

    let fallback = rules.fallback();
    RuleMatch {
        category_id: fallback.category_id,
        sub_id: fallback.sub_types[0].sub_id,
        fallback: true,
    }
}

fn sub_type_matches(
    category: &RuleCategory,
    sub: &SubTypeRule,
    text: &str,
    activity: &ActivityRecord,
) -> bool {
    let predicate_holds = if sub.predicate.is_empty() {
        category.predicate.is_some()
    } else {
        sub.predicate.evaluate(text, &activity.activity_type)
    };
    if !predicate_holds {
        return false;
    }

    // A missing level still selects the first tier so the calculator can report it.
    match (&sub.level, &activity.level) {
        (Some(required), Some(actual)) => required.same_as(actual),
        _ => true,
    }
}
