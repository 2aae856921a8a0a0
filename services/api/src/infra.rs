use activity_points::activities::{
    ActivityId, ActivityRecord, ActivityRepository, RepositoryError, StudentId,
};
use activity_points::scoring::{ScoreSink, ScoreSinkError, StudentScore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryActivityRepository {
    records: Arc<Mutex<HashMap<ActivityId, ActivityRecord>>>,
}

impl ActivityRepository for InMemoryActivityRepository {
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
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete(&self, id: &ActivityId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
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

/// Logs each recomputed score. Test builds also keep the latest total per student.
#[derive(Default, Clone)]
pub(crate) struct LoggingScoreSink {
    #[cfg(test)]
    latest: Arc<Mutex<HashMap<StudentId, u32>>>,
}

#[cfg(test)]
impl LoggingScoreSink {
    pub(crate) fn latest(&self, student_id: &StudentId) -> Option<u32> {
        self.latest
            .lock()
            .expect("score sink mutex poisoned")
            .get(student_id)
            .copied()
    }
}

impl ScoreSink for LoggingScoreSink {
    fn on_score_computed(&self, score: &StudentScore) -> Result<(), ScoreSinkError> {
        debug!(
            student_id = %score.student_id,
            total_score = score.total_score,
            categories = score.categories.len(),
            diagnostics = score.diagnostics.len(),
            rules_version = %score.rules_version,
            "score published"
        );
        #[cfg(test)]
        self.latest
            .lock()
            .expect("score sink mutex poisoned")
            .insert(score.student_id.clone(), score.total_score);
        Ok(())
    }
}
