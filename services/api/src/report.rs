use activity_points::activities::{ActivityCsvImporter, ActivityRecord, StudentId};
use activity_points::error::AppError;
use activity_points::scoring::{LevelMismatchPolicy, RuleTable, ScoringEngine, StudentScore};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Certificate CSV export (Activity ID, Student ID, Event Name, Description, Type, Date, Level)
    #[arg(long)]
    pub(crate) activities: PathBuf,
    /// Only report this student
    #[arg(long)]
    pub(crate) student: Option<String>,
    /// JSON rule table to score with (defaults to the built-in table)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// How to treat a level that disagrees with the matched tier: reject or lowest-tier
    #[arg(long, value_parser = parse_policy)]
    pub(crate) level_mismatch: Option<LevelMismatchPolicy>,
}

#[derive(Args, Debug)]
pub(crate) struct RulesArgs {
    /// JSON rule table to validate (defaults to the built-in table)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Print the validated table as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_policy(raw: &str) -> Result<LevelMismatchPolicy, String> {
    LevelMismatchPolicy::parse(raw)
        .ok_or_else(|| format!("'{raw}' is not a level mismatch policy (reject, lowest-tier)"))
}

fn load_rules(path: Option<PathBuf>) -> Result<RuleTable, AppError> {
    match path {
        Some(path) => RuleTable::from_path(path).map_err(AppError::from),
        None => Ok(RuleTable::standard()),
    }
}

pub(crate) fn run_score_report(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        activities,
        student,
        rules,
        level_mismatch,
    } = args;

    let rules = load_rules(rules)?;
    let records = ActivityCsvImporter::from_path(&activities)?;
    let engine = ScoringEngine::new(
        Arc::new(rules),
        level_mismatch.unwrap_or(LevelMismatchPolicy::Reject),
    );

    let student = student.map(StudentId);
    let scores = score_records(&engine, records, student.as_ref());

    println!(
        "Activity points report ({} rules v{}, max {} points)",
        activities.display(),
        engine.rules().version(),
        engine.rules().max_total()
    );
    if scores.is_empty() {
        println!("No activities found");
        return Ok(());
    }
    for score in &scores {
        render_student_score(score, engine.rules().max_total());
    }

    Ok(())
}

pub(crate) fn run_rules_report(args: RulesArgs) -> Result<(), AppError> {
    let rules = load_rules(args.rules)?;

    if args.json {
        match serde_json::to_string_pretty(&rules.to_document()) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("Rule table JSON unavailable: {}", err),
        }
        return Ok(());
    }

    println!(
        "Rule table v{} | {} categories | max total {} points",
        rules.version(),
        rules.categories().len(),
        rules.max_total()
    );
    for category in rules.categories() {
        let marker = if category.category_id == rules.fallback_id() {
            " (fallback)"
        } else {
            ""
        };
        println!(
            "- [{}] {}{}: cap {}",
            category.category_id, category.label, marker, category.max_points
        );
        for sub in &category.sub_types {
            let level = sub
                .level
                .as_ref()
                .map(|level| format!(" [{}]", level))
                .unwrap_or_default();
            println!(
                "    - [{}] {}{}: {} per activity, cap {}",
                sub.sub_id,
                sub.label,
                level,
                sub.points_per_unit,
                category.sub_type_cap(sub)
            );
        }
    }

    Ok(())
}

/// Score every student in the export, or just `only` when given, in student id order.
pub(crate) fn score_records(
    engine: &ScoringEngine,
    records: Vec<ActivityRecord>,
    only: Option<&StudentId>,
) -> Vec<StudentScore> {
    let mut by_student: BTreeMap<StudentId, Vec<ActivityRecord>> = BTreeMap::new();
    for record in records {
        if only.is_some_and(|wanted| wanted != &record.owner_id) {
            continue;
        }
        by_student
            .entry(record.owner_id.clone())
            .or_default()
            .push(record);
    }

    by_student
        .iter()
        .map(|(student_id, activities)| engine.score_student(student_id, activities))
        .collect()
}

fn render_student_score(score: &StudentScore, max_total: u32) {
    println!(
        "\nStudent {}: {} / {} points",
        score.student_id, score.total_score, max_total
    );
    for category in &score.categories {
        println!(
            "  - [{}] {}: {} / {} (sub-total {})",
            category.category_id,
            category.label,
            category.capped_points,
            category.max_points,
            category.subtotal
        );
        for sub in &category.sub_types {
            println!(
                "      - {}: {} activities, raw {}, capped {} / {}",
                sub.label, sub.activity_count, sub.raw_points, sub.capped_points, sub.max_points
            );
        }
    }
    if !score.diagnostics.is_empty() {
        println!("  Excluded activities:");
        for diagnostic in &score.diagnostics {
            println!("    - {}", diagnostic.summary());
        }
    }
}
