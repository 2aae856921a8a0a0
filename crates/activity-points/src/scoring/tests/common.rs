use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::activities::{
    ActivityDraft, ActivityId, ActivityLevel, ActivityRecord, ActivityRepository, ActivityType,
    RepositoryError, StudentId,
};
use crate::scoring::{
    scoring_router, LevelMismatchPolicy, RuleTable, ScoreSink, ScoreSinkError, ScoringEngine,
    ScoringService, StudentScore,
};

pub(super) const STUDENT: &str = "21A91A0501";
pub(super) const OTHER_STUDENT: &str = "21A91A0502";

pub(super) fn student() -> StudentId {
    StudentId(STUDENT.to_string())
}

pub(super) fn other_student() -> StudentId {
    StudentId(OTHER_STUDENT.to_string())
}

pub(super) fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).expect("valid date")
}

pub(super) fn draft(event_name: &str, activity_type: ActivityType) -> ActivityDraft {
    ActivityDraft {
        event_name: event_name.to_string(),
        description: String::new(),
        activity_type,
        date: date(1),
        level: None,
    }
}

pub(super) fn leveled_draft(
    event_name: &str,
    activity_type: ActivityType,
    level: ActivityLevel,
) -> ActivityDraft {
    ActivityDraft {
        level: Some(level),
        ..draft(event_name, activity_type)
    }
}

pub(super) fn record(id: &str, owner: &str, draft: ActivityDraft) -> ActivityRecord {
    draft.into_record(ActivityId(id.to_string()), StudentId(owner.to_string()))
}

pub(super) fn engine(policy: LevelMismatchPolicy) -> ScoringEngine {
    ScoringEngine::new(Arc::new(RuleTable::standard()), policy)
}

pub(super) fn build_service() -> (
    ScoringService<MemoryRepository, MemorySink>,
    Arc<MemoryRepository>,
    Arc<MemorySink>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let sink = Arc::new(MemorySink::default());
    let service = ScoringService::new(
        repository.clone(),
        sink.clone(),
        engine(LevelMismatchPolicy::Reject),
    );
    (service, repository, sink)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ActivityId, ActivityRecord>>>,
}

impl ActivityRepository for MemoryRepository {
    fn insert(&self, record: ActivityRecord) -> Result<ActivityRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ActivityRecord) -> Result<ActivityRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn delete(&self, id: &ActivityId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: &ActivityId) -> Result<Option<ActivityRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_student(&self, owner: &StudentId) -> Result<Vec<ActivityRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.owner_id == owner)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<ActivityRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    scores: Arc<Mutex<Vec<StudentScore>>>,
}

impl MemorySink {
    pub(super) fn scores(&self) -> Vec<StudentScore> {
        self.scores.lock().expect("sink mutex poisoned").clone()
    }
}

impl ScoreSink for MemorySink {
    fn on_score_computed(&self, score: &StudentScore) -> Result<(), ScoreSinkError> {
        self.scores
            .lock()
            .expect("sink mutex poisoned")
            .push(score.clone());
        Ok(())
    }
}

pub(super) struct FailingSink;

impl ScoreSink for FailingSink {
    fn on_score_computed(&self, _score: &StudentScore) -> Result<(), ScoreSinkError> {
        Err(ScoreSinkError::Transport("dashboard offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ActivityRepository for UnavailableRepository {
    fn insert(&self, _record: ActivityRecord) -> Result<ActivityRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ActivityRecord) -> Result<ActivityRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ActivityId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ActivityId) -> Result<Option<ActivityRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_student(&self, _owner: &StudentId) -> Result<Vec<ActivityRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<ActivityRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct ConflictRepository;

impl ActivityRepository for ConflictRepository {
    fn insert(&self, _record: ActivityRecord) -> Result<ActivityRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: ActivityRecord) -> Result<ActivityRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn delete(&self, _id: &ActivityId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &ActivityId) -> Result<Option<ActivityRecord>, RepositoryError> {
        Ok(None)
    }

    fn for_student(&self, _owner: &StudentId) -> Result<Vec<ActivityRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    fn all(&self) -> Result<Vec<ActivityRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: ScoringService<MemoryRepository, MemorySink>,
) -> axum::Router {
    scoring_router(Arc::new(service))
}
