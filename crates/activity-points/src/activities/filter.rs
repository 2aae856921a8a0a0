use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{ActivityRecord, ActivityType};

/// Listing filter backing the reviewer dashboard.
///
/// `search` matches the owner id or event name. A `from`/`to` range, when either bound is
/// set, replaces the `year`/`month` filters; both bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default, rename = "type", deserialize_with = "blank_as_none")]
    pub activity_type: Option<ActivityType>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl ActivityFilter {
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        self.matches_type(record) && self.matches_search(record) && self.matches_dates(record)
    }

    /// Retain matching records, newest first.
    pub fn apply(&self, records: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
        let mut filtered: Vec<ActivityRecord> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect();
        sort_newest_first(&mut filtered);
        filtered
    }

    fn matches_type(&self, record: &ActivityRecord) -> bool {
        self.activity_type
            .as_ref()
            .map(|wanted| wanted.same_as(&record.activity_type))
            .unwrap_or(true)
    }

    fn matches_search(&self, record: &ActivityRecord) -> bool {
        let Some(query) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
        else {
            return true;
        };

        let query = query.to_lowercase();
        record.owner_id.0.to_lowercase().contains(&query)
            || record.event_name.to_lowercase().contains(&query)
    }

    fn matches_dates(&self, record: &ActivityRecord) -> bool {
        if self.from.is_some() || self.to.is_some() {
            let after_start = self.from.map(|from| record.date >= from).unwrap_or(true);
            let before_end = self.to.map(|to| record.date <= to).unwrap_or(true);
            return after_start && before_end;
        }

        let year_matches = self
            .year
            .map(|year| record.date.year() == year)
            .unwrap_or(true);
        let month_matches = self
            .month
            .map(|month| record.date.month() == month)
            .unwrap_or(true);
        year_matches && month_matches
    }
}

/// Order listings the way the dashboards show them: newest date first, ties by id.
pub fn sort_newest_first(records: &mut [ActivityRecord]) {
    records.sort_by(|left, right| {
        right
            .date
            .cmp(&left.date)
            .then_with(|| left.id.cmp(&right.id))
    });
}

// An empty query parameter (`?type=`) means "no filter".
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|raw| !raw.trim().is_empty())
        .map(T::from))
}
