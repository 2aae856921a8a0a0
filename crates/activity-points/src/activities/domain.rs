use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for stored activity records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityId(pub String);

/// Identifier of the student who submitted a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event type picked when the certificate is uploaded. Unknown types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Workshop,
    Competition,
    Conference,
    Seminar,
    Course,
    Other(String),
}

impl ActivityType {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "workshop" => Self::Workshop,
            "competition" => Self::Competition,
            "conference" => Self::Conference,
            "seminar" => Self::Seminar,
            "course" => Self::Course,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ActivityType::Workshop => "Workshop",
            ActivityType::Competition => "Competition",
            ActivityType::Conference => "Conference",
            ActivityType::Seminar => "Seminar",
            ActivityType::Course => "Course",
            ActivityType::Other(label) => label,
        }
    }

    /// Case-insensitive comparison so `Other("workshop")` and `Workshop` agree.
    pub fn same_as(&self, other: &ActivityType) -> bool {
        self.label().eq_ignore_ascii_case(other.label())
    }
}

impl From<String> for ActivityType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ActivityType> for String {
    fn from(value: ActivityType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Competition level printed on a certificate ("State level", "National", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityLevel {
    College,
    University,
    Region,
    State,
    National,
    Other(String),
}

impl ActivityLevel {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let key = lowered.strip_suffix(" level").unwrap_or(&lowered).trim();
        match key {
            "college" => Self::College,
            "university" => Self::University,
            "region" | "regional" => Self::Region,
            "state" => Self::State,
            "national" => Self::National,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ActivityLevel::College => "College",
            ActivityLevel::University => "University",
            ActivityLevel::Region => "Region",
            ActivityLevel::State => "State",
            ActivityLevel::National => "National",
            ActivityLevel::Other(label) => label,
        }
    }

    pub fn same_as(&self, other: &ActivityLevel) -> bool {
        self.label().eq_ignore_ascii_case(other.label())
    }
}

impl From<String> for ActivityLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ActivityLevel> for String {
    fn from(value: ActivityLevel) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored certificate submission. The scoring engine only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub owner_id: StudentId,
    pub event_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<ActivityLevel>,
}

impl ActivityRecord {
    /// Lowercased `event_name + " " + description`, the text keyword predicates search.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.event_name, self.description).to_lowercase()
    }
}

/// Payload accepted from students when creating or editing a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub event_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub level: Option<ActivityLevel>,
}

impl ActivityDraft {
    pub fn validate(&self) -> Result<(), ActivityValidationError> {
        if self.event_name.trim().is_empty() {
            return Err(ActivityValidationError::MissingEventName);
        }
        if self.activity_type.label().trim().is_empty() {
            return Err(ActivityValidationError::MissingType);
        }
        Ok(())
    }

    pub fn into_record(self, id: ActivityId, owner_id: StudentId) -> ActivityRecord {
        ActivityRecord {
            id,
            owner_id,
            event_name: self.event_name.trim().to_string(),
            description: self.description,
            activity_type: self.activity_type,
            date: self.date,
            level: self.level.filter(|level| !level.label().trim().is_empty()),
        }
    }
}

/// Validation failures for incoming drafts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityValidationError {
    #[error("event name is required")]
    MissingEventName,
    #[error("activity type is required")]
    MissingType,
}

/// Accepts `YYYY-MM-DD` as well as the RFC 3339 timestamps browsers send for date inputs.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}
