//! Records as stored by the backend, and the statistics derived from them.

use chrono::{DateTime, Local, TimeZone, Utc};
use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Identifier assigned by the record store. Never reused, even after a delete.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

/// Where a record is in its life. Serialized by English name; the Turkish labels used by
/// the field app are accepted on input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(alias = "Açık")]
    Open,
    #[serde(alias = "Hatalı")]
    Faulty,
    #[serde(alias = "Kapalı")]
    Closed,
    #[serde(alias = "Tamamlandı")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Open, Status::Faulty, Status::Closed, Status::Completed];

    pub fn label(self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::Faulty => "Faulty",
            Status::Closed => "Closed",
            Status::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Open" | "open" | "Açık" => Ok(Status::Open),
            "Faulty" | "faulty" | "Hatalı" => Ok(Status::Faulty),
            "Closed" | "closed" | "Kapalı" => Ok(Status::Closed),
            "Completed" | "completed" | "Tamamlandı" => Ok(Status::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One tracked field item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub project_name: String,
    pub location: String,
    pub assignee: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
    /// Public URL of the photo in the object store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Public URL of the last report published for this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Encoded photo bytes, fetched by the caller before rendering
    #[serde(skip)]
    pub photo: Option<Vec<u8>>,
}

impl Record {
    /// A record with only the required fields set
    pub fn new<P, L, A>(
        id: RecordId,
        project_name: P,
        location: L,
        assignee: A,
        status: Status,
        created_at: DateTime<Utc>,
    ) -> Record
    where
        P: Into<String>,
        L: Into<String>,
        A: Into<String>,
    {
        Record {
            id,
            project_name: project_name.into(),
            location: location.into(),
            assignee: assignee.into(),
            status,
            description: None,
            comment: None,
            qr_payload: None,
            photo_url: None,
            pdf_url: None,
            created_at,
            photo: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_qr<S: Into<String>>(mut self, payload: S) -> Self {
        self.qr_payload = Some(payload.into());
        self
    }

    pub fn with_photo(mut self, bytes: Vec<u8>) -> Self {
        self.photo = Some(bytes);
        self
    }

    /// The creation date as shown in reports, `DD.MM.YYYY`, on the local calendar that
    /// report dates use
    pub fn date_label(&self) -> String {
        self.date_label_in(&Local)
    }

    /// The creation date on the calendar of `tz`
    pub fn date_label_in<Tz: TimeZone>(&self, tz: &Tz) -> String {
        self.created_at
            .with_timezone(tz)
            .date_naive()
            .format("%d.%m.%Y")
            .to_string()
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee = assignee.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(comment) = &patch.comment {
            self.comment = comment.clone();
        }
        if let Some(qr_payload) = &patch.qr_payload {
            self.qr_payload = qr_payload.clone();
        }
        if let Some(photo_url) = &patch.photo_url {
            self.photo_url = photo_url.clone();
        }
        if let Some(pdf_url) = &patch.pdf_url {
            self.pdf_url = pdf_url.clone();
        }
    }
}

/// Insert payload; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub project_name: String,
    pub location: String,
    pub assignee: String,
    pub status: Status,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub qr_payload: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl NewRecord {
    pub fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> Record {
        Record {
            id,
            project_name: self.project_name,
            location: self.location,
            assignee: self.assignee,
            status: self.status,
            description: self.description,
            comment: self.comment,
            qr_payload: self.qr_payload,
            photo_url: self.photo_url,
            pdf_url: None,
            created_at,
            photo: None,
        }
    }
}

/// Partial update. Outer `None` leaves a field alone; for optional fields `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub comment: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub qr_payload: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub pdf_url: Option<Option<String>>,
}

/// A present key, `null` included, becomes `Some`; a missing key falls back to `default`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl RecordPatch {
    pub fn pdf_url<S: Into<String>>(url: S) -> RecordPatch {
        RecordPatch {
            pdf_url: Some(Some(url.into())),
            ..RecordPatch::default()
        }
    }
}

/// Per-status counts plus a total over a set of records. Reports render these as given;
/// only [Stats::from_records] guarantees they add up.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(alias = "acik")]
    pub open: u32,
    #[serde(alias = "hatali")]
    pub faulty: u32,
    #[serde(alias = "kapali")]
    pub closed: u32,
    #[serde(alias = "tamamlandi")]
    pub completed: u32,
    #[serde(alias = "toplam")]
    pub total: u32,
}

impl Stats {
    pub fn from_records<'a, I>(records: I) -> Stats
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut stats = Stats::default();
        for record in records {
            match record.status {
                Status::Open => stats.open += 1,
                Status::Faulty => stats.faulty += 1,
                Status::Closed => stats.closed += 1,
                Status::Completed => stats.completed += 1,
            }
            stats.total += 1;
        }
        stats
    }

    pub fn count(&self, status: Status) -> u32 {
        match status {
            Status::Open => self.open,
            Status::Faulty => self.faulty,
            Status::Closed => self.closed,
            Status::Completed => self.completed,
        }
    }

    /// `total == open + faulty + closed + completed`
    pub fn is_consistent(&self) -> bool {
        let sum = self.open as u64 + self.faulty as u64 + self.closed as u64 + self.completed as u64;
        sum == self.total as u64
    }

    /// Share of completed records in percent, 0 when there are none
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn record(id: i64, status: Status) -> Record {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        Record::new(RecordId(id), "Emek Projesi", "Blok A", "Ali", status, created)
    }

    #[test]
    fn dates_follow_the_calendar_of_the_zone() {
        let late = Utc.with_ymd_and_hms(2025, 3, 7, 23, 30, 0).unwrap();
        let r = Record::new(RecordId(1), "P", "L", "A", Status::Open, late);
        assert_eq!(r.date_label_in(&Utc), "07.03.2025");
        let istanbul = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(r.date_label_in(&istanbul), "08.03.2025");
        assert_eq!(r.date_label(), late.with_timezone(&Local).format("%d.%m.%Y").to_string());
    }

    #[test]
    fn turkish_status_labels_deserialize() {
        let status: Status = serde_json::from_str("\"Tamamlandı\"").unwrap();
        assert_eq!(status, Status::Completed);
        let status: Status = serde_json::from_str("\"Faulty\"").unwrap();
        assert_eq!(status, Status::Faulty);
        assert_eq!(serde_json::to_string(&Status::Open).unwrap(), "\"Open\"");
        assert_eq!("Açık".parse::<Status>().unwrap(), Status::Open);
        assert!("Pending".parse::<Status>().is_err());
    }

    #[test]
    fn stats_count_every_status() {
        let records = vec![
            record(1, Status::Open),
            record(2, Status::Open),
            record(3, Status::Completed),
            record(4, Status::Faulty),
        ];
        let stats = Stats::from_records(&records);
        assert_eq!(
            stats,
            Stats {
                open: 2,
                faulty: 1,
                closed: 0,
                completed: 1,
                total: 4
            }
        );
        assert!(stats.is_consistent());
        assert_eq!(stats.progress(), 25.0);
        assert_eq!(Stats::default().progress(), 0.0);
    }

    #[test]
    fn inconsistent_stats_are_detected() {
        let stats = Stats {
            open: 1,
            total: 3,
            ..Stats::default()
        };
        assert!(!stats.is_consistent());
    }

    #[test]
    fn stats_accept_original_keys() {
        let stats: Stats = serde_json::from_str(
            r#"{"acik":1,"hatali":0,"kapali":0,"tamamlandi":0,"toplam":1}"#,
        )
        .unwrap();
        assert_eq!(stats.open, 1);
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn patches_set_and_clear_fields() {
        let mut r = record(1, Status::Open).with_comment("check again");
        r.apply(&RecordPatch {
            status: Some(Status::Closed),
            comment: Some(None),
            ..RecordPatch::default()
        });
        assert_eq!(r.status, Status::Closed);
        assert_eq!(r.comment, None);

        r.apply(&RecordPatch::pdf_url("https://files/r.pdf"));
        assert_eq!(r.pdf_url.as_deref(), Some("https://files/r.pdf"));
        assert_eq!(r.date_label_in(&Utc), "01.01.2025");
    }

    #[test]
    fn null_clears_and_missing_leaves_alone() {
        let patch: RecordPatch =
            serde_json::from_str(r#"{"comment": null, "status": "Closed"}"#).unwrap();
        assert_eq!(patch.comment, Some(None));
        assert_eq!(patch.description, None);
        assert_eq!(patch.status, Some(Status::Closed));

        let mut r = record(1, Status::Open)
            .with_comment("old")
            .with_description("kept");
        r.apply(&patch);
        assert_eq!(r.comment, None);
        assert_eq!(r.description.as_deref(), Some("kept"));

        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"status":"Closed","comment":null}"#);
    }

    #[test]
    fn photo_bytes_are_not_serialized() {
        let r = record(7, Status::Open).with_photo(vec![1, 2, 3]);
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("photo\""));
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back.photo, None);
        assert_eq!(back.id, RecordId(7));
    }
}
