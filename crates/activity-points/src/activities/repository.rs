use super::domain::{ActivityId, ActivityRecord, StudentId};

/// Storage abstraction for certificate records so the scoring service can be exercised in
/// isolation. Implementations must hand out consistent snapshots: a listing never
/// reflects a half-applied write.
pub trait ActivityRepository: Send + Sync {
    fn insert(&self, record: ActivityRecord) -> Result<ActivityRecord, RepositoryError>;
    fn update(&self, record: ActivityRecord) -> Result<ActivityRecord, RepositoryError>;
    fn delete(&self, id: &ActivityId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ActivityId) -> Result<Option<ActivityRecord>, RepositoryError>;
    fn for_student(&self, owner: &StudentId) -> Result<Vec<ActivityRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<ActivityRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
