//! Activity-points scoring: rule table, category matcher, point calculator, cap
//! enforcer, and score aggregator.
//!
//! Scores are never stored. Every request recomputes from the student's full activity
//! snapshot so that caps, which are properties of the whole set, stay correct after any
//! edit or rule-table change.

mod aggregate;
mod calculator;
mod capping;
mod diagnostics;
mod engine;
mod matcher;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregate::StudentScore;
pub use calculator::{ActivityPoints, LevelMismatchPolicy};
pub use capping::{CappedScores, CategoryScore, MatchResult, SubTypeScore};
pub use diagnostics::{IntegrityIssue, ScoringDiagnostic};
pub use engine::{ActivityPreview, ScoringEngine};
pub use matcher::RuleMatch;
pub use router::scoring_router;
pub use rules::{
    CategoryId, MatchPredicate, PredicateJoin, RuleCategory, RuleTable, RuleTableDocument,
    RuleTableError, SubTypeId, SubTypeRule,
};
pub use service::{ScoreSink, ScoreSinkError, ScoringService, ScoringServiceError};
