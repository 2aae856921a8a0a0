use crate::activities::{ActivityLevel, ActivityType};

use super::{CategoryId, MatchPredicate, RuleCategory, RuleTableDocument, SubTypeId, SubTypeRule};

const STANDARD_VERSION: &str = "2025.1";
const OTHER_CATEGORY: CategoryId = CategoryId(99);

const TECHNICAL_TYPES: [ActivityType; 3] = [
    ActivityType::Workshop,
    ActivityType::Conference,
    ActivityType::Competition,
];

fn sub(id: u16, label: &str, points_per_unit: u32, max_points: Option<u32>) -> SubTypeRule {
    SubTypeRule {
        sub_id: SubTypeId(id),
        label: label.to_string(),
        points_per_unit,
        max_points,
        level: None,
        predicate: MatchPredicate::default(),
    }
}

fn tier(id: u16, level: ActivityLevel, points_per_unit: u32, max_points: u32) -> SubTypeRule {
    SubTypeRule {
        level: Some(level.clone()),
        ..sub(id, &format!("{} level", level.label()), points_per_unit, Some(max_points))
    }
}

fn category(id: u16, label: &str, max_points: u32, sub_types: Vec<SubTypeRule>) -> RuleCategory {
    RuleCategory {
        category_id: CategoryId(id),
        label: label.to_string(),
        max_points,
        predicate: None,
        sub_types,
    }
}

pub(super) fn document() -> RuleTableDocument {
    let moocs = category(
        1,
        "MOOCs / SWAYAM / NPTEL / Course",
        40,
        vec![SubTypeRule {
            predicate: MatchPredicate::keywords(&["mooc", "swayam", "nptel"])
                .with_types(&[ActivityType::Course])
                .any(),
            ..sub(1, "Per Course", 20, None)
        }],
    );

    // Organizer is listed first so "organizer and participant" certificates score as organizer.
    let technical = category(
        2,
        "Technical Fest / Conference / Hackathons",
        10,
        vec![
            SubTypeRule {
                predicate: MatchPredicate::keywords(&["organizer", "organiser", "coordinator"])
                    .with_types(&TECHNICAL_TYPES),
                ..sub(1, "Organizer", 5, None)
            },
            SubTypeRule {
                predicate: MatchPredicate::keywords(&["participant", "participated"])
                    .with_types(&TECHNICAL_TYPES),
                ..sub(2, "Participant", 3, Some(6))
            },
        ],
    );

    let rural = category(
        3,
        "Rural Reporting / Haritha Haram / Plantation",
        10,
        vec![
            SubTypeRule {
                predicate: MatchPredicate::keywords(&["rural reporting", "village survey"]),
                ..sub(1, "Rural Reporting", 5, None)
            },
            SubTypeRule {
                predicate: MatchPredicate::keywords(&["haritha haram", "harithaharam", "plantation"]),
                ..sub(2, "Haritha Haram / Plantation", 1, None)
            },
        ],
    );

    let relief = category(
        5,
        "Participation in Relief Camps",
        40,
        vec![SubTypeRule {
            predicate: MatchPredicate::keywords(&["relief camp", "flood relief", "disaster relief"]),
            ..sub(1, "Per Camp", 20, None)
        }],
    );

    let publications = category(
        9,
        "Research Publication",
        20,
        vec![SubTypeRule {
            predicate: MatchPredicate::keywords(&["publication", "published", "journal"]),
            ..sub(1, "Publication", 10, None)
        }],
    );

    let sports = RuleCategory {
        predicate: Some(MatchPredicate::keywords(&[
            "sports",
            "games",
            "tournament",
            "athletics",
            "cricket",
            "football",
            "volleyball",
            "kabaddi",
            "chess",
        ])),
        ..category(
            13,
            "Participation in Sports / Games",
            30,
            vec![
                tier(1, ActivityLevel::College, 5, 10),
                tier(2, ActivityLevel::University, 10, 20),
                tier(3, ActivityLevel::Region, 12, 24),
                tier(4, ActivityLevel::State, 15, 30),
                tier(5, ActivityLevel::National, 20, 30),
            ],
        )
    };

    let cultural = category(
        14,
        "Cultural Program (Dance, Drama, Music etc.)",
        10,
        vec![SubTypeRule {
            predicate: MatchPredicate::keywords(&["cultural", "dance", "drama", "music", "singing"]),
            ..sub(1, "Participation", 5, None)
        }],
    );

    let other = category(OTHER_CATEGORY.0, "Other", 20, vec![sub(1, "General", 10, None)]);

    RuleTableDocument {
        version: STANDARD_VERSION.to_string(),
        fallback_category: OTHER_CATEGORY,
        categories: vec![
            moocs,
            technical,
            rural,
            relief,
            publications,
            sports,
            cultural,
            other,
        ],
    }
}
