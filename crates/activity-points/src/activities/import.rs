use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{
    parse_date, ActivityDraft, ActivityId, ActivityLevel, ActivityRecord, ActivityType,
    ActivityValidationError, StudentId,
};

#[derive(Debug)]
pub enum ActivityImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidDate {
        row: usize,
        value: String,
    },
    InvalidRecord {
        row: usize,
        source: ActivityValidationError,
    },
}

impl std::fmt::Display for ActivityImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityImportError::Io(err) => write!(f, "failed to read activity export: {}", err),
            ActivityImportError::Csv(err) => write!(f, "invalid activity CSV data: {}", err),
            ActivityImportError::InvalidDate { row, value } => {
                write!(f, "row {}: '{}' is not a valid date", row, value)
            }
            ActivityImportError::InvalidRecord { row, source } => {
                write!(f, "row {}: {}", row, source)
            }
        }
    }
}

impl std::error::Error for ActivityImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActivityImportError::Io(err) => Some(err),
            ActivityImportError::Csv(err) => Some(err),
            ActivityImportError::InvalidDate { .. } => None,
            ActivityImportError::InvalidRecord { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for ActivityImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ActivityImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads certificate records from the dashboard's CSV export.
pub struct ActivityCsvImporter;

impl ActivityCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ActivityRecord>, ActivityImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ActivityRecord>, ActivityImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<ActivityRow>().enumerate() {
            // Header is line 1, so data rows start at 2.
            let line = index + 2;
            let row = row?;
            records.push(row.into_record(line)?);
        }

        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    #[serde(rename = "Activity ID")]
    id: String,
    #[serde(rename = "Student ID")]
    student_id: String,
    #[serde(rename = "Event Name")]
    event_name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Type")]
    activity_type: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Level", default, deserialize_with = "empty_string_as_none")]
    level: Option<String>,
}

impl ActivityRow {
    fn into_record(self, row: usize) -> Result<ActivityRecord, ActivityImportError> {
        let date = parse_date(&self.date).ok_or_else(|| ActivityImportError::InvalidDate {
            row,
            value: self.date.clone(),
        })?;

        let draft = ActivityDraft {
            event_name: self.event_name,
            description: self.description,
            activity_type: ActivityType::parse(&self.activity_type),
            date,
            level: self.level.as_deref().map(ActivityLevel::parse),
        };
        draft
            .validate()
            .map_err(|source| ActivityImportError::InvalidRecord { row, source })?;

        Ok(draft.into_record(ActivityId(self.id), StudentId(self.student_id)))
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
