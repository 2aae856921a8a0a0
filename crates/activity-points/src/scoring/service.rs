use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::activities::{
    sort_newest_first, ActivityDraft, ActivityFilter, ActivityId, ActivityRecord,
    ActivityRepository, ActivityValidationError, RepositoryError, StudentId,
};

use super::aggregate::StudentScore;
use super::engine::{ActivityPreview, ScoringEngine};
use super::rules::RuleTable;

/// Outbound hook receiving every recomputed score (dashboard cache, reporting feed).
pub trait ScoreSink: Send + Sync {
    fn on_score_computed(&self, score: &StudentScore) -> Result<(), ScoreSinkError>;
}

/// Score delivery error.
#[derive(Debug, thiserror::Error)]
pub enum ScoreSinkError {
    #[error("score sink unavailable: {0}")]
    Transport(String),
}

/// Service composing the activity repository, the scoring engine, and the score sink.
pub struct ScoringService<R, S> {
    repository: Arc<R>,
    sink: Arc<S>,
    engine: Arc<ScoringEngine>,
}

static ACTIVITY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_activity_id() -> ActivityId {
    let id = ACTIVITY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ActivityId(format!("act-{id:06}"))
}

impl<R, S> ScoringService<R, S>
where
    R: ActivityRepository + 'static,
    S: ScoreSink + 'static,
{
    pub fn new(repository: Arc<R>, sink: Arc<S>, engine: ScoringEngine) -> Self {
        Self {
            repository,
            sink,
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn rules(&self) -> &RuleTable {
        self.engine.rules()
    }

    /// Store a new certificate for `student_id` and refresh that student's score.
    pub fn submit(
        &self,
        student_id: &StudentId,
        draft: ActivityDraft,
    ) -> Result<ActivityRecord, ScoringServiceError> {
        draft.validate()?;
        let record = draft.into_record(next_activity_id(), student_id.clone());
        let stored = self.repository.insert(record)?;

        info!(%student_id, activity_id = %stored.id, "activity submitted");
        self.refresh(student_id);
        Ok(stored)
    }

    /// Replace a certificate the student owns. Someone else's record reads as missing.
    pub fn update(
        &self,
        student_id: &StudentId,
        activity_id: &ActivityId,
        draft: ActivityDraft,
    ) -> Result<ActivityRecord, ScoringServiceError> {
        draft.validate()?;
        self.owned(student_id, activity_id)?;

        let record = draft.into_record(activity_id.clone(), student_id.clone());
        let stored = self.repository.update(record)?;

        info!(%student_id, %activity_id, "activity updated");
        self.refresh(student_id);
        Ok(stored)
    }

    pub fn delete(
        &self,
        student_id: &StudentId,
        activity_id: &ActivityId,
    ) -> Result<(), ScoringServiceError> {
        self.owned(student_id, activity_id)?;
        self.repository.delete(activity_id)?;

        info!(%student_id, %activity_id, "activity deleted");
        self.refresh(student_id);
        Ok(())
    }

    /// The student's certificates, newest first.
    pub fn activities_for(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<ActivityRecord>, ScoringServiceError> {
        let mut records = self.repository.for_student(student_id)?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    pub fn all_activities(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<ActivityRecord>, ScoringServiceError> {
        let records = self.repository.all()?;
        Ok(filter.apply(records))
    }

    /// Recompute from the current snapshot and publish to the sink.
    pub fn score(&self, student_id: &StudentId) -> Result<StudentScore, ScoringServiceError> {
        let activities = self.repository.for_student(student_id)?;
        let score = self.engine.score_student(student_id, &activities);
        self.sink.on_score_computed(&score)?;
        Ok(score)
    }

    /// Match and raw points for an unsaved draft. Nothing is stored or published.
    pub fn preview(&self, draft: ActivityDraft) -> Result<ActivityPreview, ScoringServiceError> {
        draft.validate()?;
        let record = draft.into_record(
            ActivityId("preview".to_string()),
            StudentId("preview".to_string()),
        );
        Ok(self.engine.preview(&record))
    }

    fn owned(
        &self,
        student_id: &StudentId,
        activity_id: &ActivityId,
    ) -> Result<ActivityRecord, ScoringServiceError> {
        let record = self
            .repository
            .fetch(activity_id)?
            .filter(|record| &record.owner_id == student_id)
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    // The write already succeeded; a failed recompute must not undo it.
    fn refresh(&self, student_id: &StudentId) {
        match self.score(student_id) {
            Ok(score) => debug!(
                %student_id,
                total_score = score.total_score,
                "score recomputed after write"
            ),
            Err(error) => warn!(%student_id, %error, "score recompute failed after write"),
        }
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Validation(#[from] ActivityValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Sink(#[from] ScoreSinkError),
}
