//! Certificate records owned by the CRUD layer, plus the listing filters and CSV import
//! used by the dashboards and offline reports.

pub mod domain;
mod filter;
mod import;
pub mod repository;

pub use domain::{
    ActivityDraft, ActivityId, ActivityLevel, ActivityRecord, ActivityType,
    ActivityValidationError, StudentId,
};
pub use filter::{sort_newest_first, ActivityFilter};
pub use import::{ActivityCsvImporter, ActivityImportError};
pub use repository::{ActivityRepository, RepositoryError};
