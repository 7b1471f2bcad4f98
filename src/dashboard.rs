use crate::model::{Record, Stats, Status};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which statuses a view shows
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    #[serde(alias = "Tümü")]
    All,
    #[serde(untagged)]
    Only(Status),
}

impl StatusFilter {
    pub fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(only) => *only == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = crate::model::UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "All" | "all" | "Tümü" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

/// Status filter plus a free-text search, the way the dashboard narrows its record list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub status: StatusFilter,
    /// Case-insensitive substring matched against location, assignee and description
    #[serde(default)]
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn new(status: StatusFilter, search: Option<String>) -> RecordFilter {
        RecordFilter { status, search }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if !self.status.matches(record.status) {
            return false;
        }
        let needle = match self.search.as_deref().map(str::trim) {
            None | Some("") => return true,
            Some(needle) => needle.to_lowercase(),
        };
        [
            Some(record.location.as_str()),
            Some(record.assignee.as_str()),
            record.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// The matching records, in their original order
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Owned copies of the matching records along with their statistics; what a report of
    /// the current view is generated from
    pub fn view(&self, records: &[Record]) -> (Vec<Record>, Stats) {
        let records: Vec<Record> = self.apply(records).into_iter().cloned().collect();
        let stats = Stats::from_records(&records);
        (records, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;
    use chrono::{TimeZone, Utc};

    fn records() -> Vec<Record> {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        vec![
            Record::new(RecordId(1), "P", "Blok A", "Ali", Status::Open, at),
            Record::new(RecordId(2), "P", "Blok B", "Ayşe", Status::Completed, at)
                .with_description("Cracked TILE near the entrance"),
            Record::new(RecordId(3), "P", "Otopark", "Mehmet", Status::Open, at),
            Record::new(RecordId(4), "P", "Blok A", "Zeynep", Status::Faulty, at),
        ]
    }

    fn ids(records: Vec<&Record>) -> Vec<i64> {
        records.into_iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn no_filter_keeps_everything_in_order() {
        let records = records();
        assert_eq!(ids(RecordFilter::default().apply(&records)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn status_filter() {
        let records = records();
        let filter = RecordFilter::new(StatusFilter::Only(Status::Open), None);
        assert_eq!(ids(filter.apply(&records)), vec![1, 3]);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let records = records();
        let search = |s: &str| RecordFilter::new(StatusFilter::All, Some(s.to_string()));
        assert_eq!(ids(search("blok a").apply(&records)), vec![1, 4]);
        assert_eq!(ids(search("tile").apply(&records)), vec![2]);
        assert_eq!(ids(search("MEHMET").apply(&records)), vec![3]);
        assert_eq!(ids(search("   ").apply(&records)), vec![1, 2, 3, 4]);
        assert!(search("nowhere").apply(&records).is_empty());
    }

    #[test]
    fn views_come_with_matching_stats() {
        let records = records();
        let filter = RecordFilter::new(StatusFilter::All, Some("blok".to_string()));
        let (view, stats) = filter.view(&records);
        assert_eq!(view.len(), 3);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.faulty, 1);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn filters_parse_from_labels() {
        assert_eq!("Tümü".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "Hatalı".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(Status::Faulty)
        );
        assert!("Unknown".parse::<StatusFilter>().is_err());
    }
}
