use super::common::*;
use crate::activities::{ActivityLevel, ActivityRecord, ActivityType};
use crate::scoring::{CategoryId, IntegrityIssue, LevelMismatchPolicy, SubTypeId};

fn participant_workshop(id: &str) -> ActivityRecord {
    let mut draft = draft("TechFest", ActivityType::Workshop);
    draft.description = "Participant Certificate".to_string();
    record(id, STUDENT, draft)
}

#[test]
fn nptel_course_scores_as_a_mooc() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activities = vec![record(
        "act-1",
        STUDENT,
        draft("NPTEL Deep Learning", ActivityType::Course),
    )];

    let score = engine.score_student(&student(), &activities);

    assert_eq!(score.activities.len(), 1);
    assert_eq!(score.activities[0].category_id, CategoryId(1));
    assert_eq!(score.activities[0].sub_id, SubTypeId(1));
    assert_eq!(score.activities[0].raw_points, 20);
    assert_eq!(score.categories[0].capped_points, 20);
    assert_eq!(score.total_score, 20);
    assert!(score.diagnostics.is_empty());
}

#[test]
fn repeated_participation_is_capped_at_the_sub_type_limit() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activities: Vec<_> = (1..=5)
        .map(|n| participant_workshop(&format!("act-{n}")))
        .collect();

    let score = engine.score_student(&student(), &activities);

    assert!(score
        .activities
        .iter()
        .all(|result| result.category_id == CategoryId(2) && result.sub_id == SubTypeId(2)));
    let category = &score.categories[0];
    assert_eq!(category.sub_types[0].raw_points, 15);
    assert_eq!(category.sub_types[0].capped_points, 6);
    assert_eq!(score.total_score, 6);
}

#[test]
fn category_cap_binds_over_combined_sub_types() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let mut activities: Vec<_> = (1..=3)
        .map(|n| participant_workshop(&format!("act-{n}")))
        .collect();
    activities.push(record(
        "act-4",
        STUDENT,
        draft("Hackathon Organizer", ActivityType::Competition),
    ));

    let score = engine.score_student(&student(), &activities);

    let category = &score.categories[0];
    assert_eq!(category.category_id, CategoryId(2));
    assert_eq!(category.subtotal, 11);
    assert_eq!(category.capped_points, 10);
    assert_eq!(score.total_score, 10);
}

#[test]
fn unmatched_seminar_falls_back_to_other() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activity = record("act-1", STUDENT, draft("AI Seminar", ActivityType::Seminar));

    let matched = engine.match_activity(&activity);
    assert!(matched.fallback);
    assert_eq!(matched.category_id, CategoryId(99));

    let score = engine.score_student(&student(), &[activity]);
    assert_eq!(score.activities[0].raw_points, 10);
    assert_eq!(score.categories[0].max_points, 20);
    assert_eq!(score.total_score, 10);
}

#[test]
fn sports_tier_follows_the_certificate_level() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activities = vec![
        record(
            "act-1",
            STUDENT,
            leveled_draft("Inter-college Chess", ActivityType::Competition, ActivityLevel::State),
        ),
        record(
            "act-2",
            STUDENT,
            leveled_draft("Cricket Tournament", ActivityType::Competition, ActivityLevel::College),
        ),
    ];

    let score = engine.score_student(&student(), &activities);

    let category = &score.categories[0];
    assert_eq!(category.category_id, CategoryId(13));
    assert_eq!(category.sub_types[0].sub_id, SubTypeId(1));
    assert_eq!(category.sub_types[0].capped_points, 5);
    assert_eq!(category.sub_types[1].sub_id, SubTypeId(4));
    assert_eq!(category.sub_types[1].capped_points, 15);
    assert_eq!(score.total_score, 20);
}

#[test]
fn missing_level_excludes_only_that_activity() {
    let engine = engine(LevelMismatchPolicy::LowestTier);
    let activities = vec![
        record("act-1", STUDENT, draft("Football Games", ActivityType::Competition)),
        record("act-2", STUDENT, draft("NPTEL Cloud", ActivityType::Course)),
    ];

    let score = engine.score_student(&student(), &activities);

    assert_eq!(score.total_score, 20);
    assert_eq!(score.diagnostics.len(), 1);
    assert_eq!(score.diagnostics[0].activity_id.0, "act-1");
    assert!(matches!(
        score.diagnostics[0].issue,
        IntegrityIssue::MissingLevel {
            category_id: CategoryId(13),
            ..
        }
    ));
}

#[test]
fn foreign_activities_are_reported_and_not_scored() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activities = vec![
        record("act-1", STUDENT, draft("NPTEL Cloud", ActivityType::Course)),
        record("act-2", OTHER_STUDENT, draft("SWAYAM Python", ActivityType::Course)),
    ];

    let score = engine.score_student(&student(), &activities);

    assert_eq!(score.total_score, 20);
    assert_eq!(
        score.diagnostics[0].issue,
        IntegrityIssue::ForeignActivity {
            owner_id: other_student()
        }
    );
}

#[test]
fn scoring_the_same_snapshot_twice_is_identical() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activities = vec![
        participant_workshop("act-1"),
        record("act-2", STUDENT, draft("Drama Night", ActivityType::Other("Event".into()))),
        record("act-3", STUDENT, draft("NPTEL Cloud", ActivityType::Course)),
        record("act-4", STUDENT, draft("Football", ActivityType::Competition)),
    ];

    let first = engine.score_student(&student(), &activities);
    let second = engine.score_student(&student(), &activities);

    assert_eq!(first, second);
    assert_eq!(first.rules_version, engine.rules().version());
}

#[test]
fn totals_stay_within_every_cap_for_large_histories() {
    let engine = engine(LevelMismatchPolicy::LowestTier);
    let names = [
        ("NPTEL Course", ActivityType::Course, None),
        ("Hackathon Organizer", ActivityType::Competition, None),
        ("Participated in Expo", ActivityType::Conference, None),
        ("Village survey for rural reporting", ActivityType::Other("Service".into()), None),
        ("Flood relief camp volunteer", ActivityType::Other("Service".into()), None),
        ("Journal publication", ActivityType::Other("Research".into()), None),
        ("Kabaddi Games", ActivityType::Competition, Some(ActivityLevel::National)),
        ("Music Festival", ActivityType::Other("Cultural".into()), None),
        ("Guest Lecture", ActivityType::Seminar, None),
    ];
    let activities: Vec<_> = (0..90)
        .map(|n| {
            let (name, activity_type, level) = &names[n % names.len()];
            let mut draft = draft(name, activity_type.clone());
            draft.level = level.clone();
            record(&format!("act-{n:03}"), STUDENT, draft)
        })
        .collect();

    let score = engine.score_student(&student(), &activities);

    for category in &score.categories {
        assert!(category.capped_points <= category.max_points);
        for sub in &category.sub_types {
            assert!(sub.capped_points <= sub.max_points);
        }
    }
    for result in &score.activities {
        let (_, sub) = engine
            .rules()
            .sub_type(result.category_id, result.sub_id)
            .expect("matched rule exists");
        assert!(result.raw_points <= sub.points_per_unit);
    }
    assert!(score.total_score <= engine.rules().max_total());
    assert_eq!(score.total_score, 40 + 10 + 10 + 40 + 20 + 30 + 10 + 20);
}

#[test]
fn preview_matches_full_scoring() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activity = participant_workshop("act-1");

    let preview = engine.preview(&activity);

    assert_eq!(preview.category_id, CategoryId(2));
    assert_eq!(preview.sub_type_label, "Participant");
    assert_eq!(preview.raw_points, 3);
    assert_eq!(preview.sub_type_max_points, 6);
    assert_eq!(preview.category_max_points, 10);
    assert!(!preview.fallback);
    assert!(preview.issue.is_none());
}

#[test]
fn preview_reports_integrity_issues_with_zero_points() {
    let engine = engine(LevelMismatchPolicy::Reject);
    let activity = record("act-1", STUDENT, draft("Chess Games", ActivityType::Competition));

    let preview = engine.preview(&activity);

    assert_eq!(preview.category_id, CategoryId(13));
    assert_eq!(preview.raw_points, 0);
    assert!(matches!(
        preview.issue,
        Some(IntegrityIssue::MissingLevel { .. })
    ));
}
