//! The hosted backend is reached through three small traits: [RecordStore] for the records
//! table, [ObjectStore] for file uploads and [ChangeFeed] for change notifications.
//! [MemoryStore] implements all of them in process; it backs the tests and demos and is a
//! reasonable stand-in wherever there is no backend at all.

use crate::model::{NewRecord, Record, RecordId, RecordPatch};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;

/// Name of the table records live in
pub const RECORDS_TABLE: &str = "records";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("invalid object path {0:?}")]
    InvalidPath(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Which records to select. Results always come newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Only records of this project; all projects when [None]
    pub project_name: Option<String>,
}

impl RecordQuery {
    pub fn all() -> RecordQuery {
        RecordQuery::default()
    }

    pub fn project<S: Into<String>>(name: S) -> RecordQuery {
        RecordQuery {
            project_name: Some(name.into()),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.project_name
            .as_deref()
            .map_or(true, |name| record.project_name == name)
    }
}

pub trait RecordStore {
    /// Records matching `query`, ordered by creation time, newest first
    fn select(&self, query: &RecordQuery) -> Result<Vec<Record>>;

    /// Store a new record, returning it with its assigned id and creation time
    fn insert(&self, record: NewRecord) -> Result<Record>;

    /// Apply a partial update, returning the updated record
    fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<Record>;

    fn delete(&self, id: RecordId) -> Result<()>;
}

pub trait ObjectStore {
    /// Upload `bytes` to `path` within `bucket`, replacing whatever was there, and return
    /// the object's public URL
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], content_type: &str) -> Result<String>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Notification that a table changed. Carries no row data; handlers re-query what they
/// need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
}

pub type ChangeHandler = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

pub trait ChangeFeed {
    /// Call `handler` for every insert, update and delete on `table` until the returned
    /// subscription is cancelled or dropped
    fn subscribe(&self, table: &str, handler: ChangeHandler) -> Subscription;
}

/// A live [ChangeFeed] registration. Cancelling is idempotent: [Subscription::unsubscribe]
/// may be called any number of times, and dropping the subscription cancels it too.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Subscription
    where
        F: FnOnce() + Send + 'static,
    {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Keep a record list current: runs `query` against `store` on every change to the records
/// table and hands the result to `on_records`. Failed queries are logged and skipped.
pub fn watch_records<S, F>(
    feed: &dyn ChangeFeed,
    store: Arc<S>,
    query: RecordQuery,
    on_records: F,
) -> Subscription
where
    S: RecordStore + Send + Sync + 'static,
    F: Fn(Vec<Record>) + Send + Sync + 'static,
{
    feed.subscribe(
        RECORDS_TABLE,
        Box::new(move |event| {
            log::debug!("{:?} on {}, re-fetching records", event.kind, event.table);
            match store.select(&query) {
                Ok(records) => on_records(records),
                Err(e) => log::warn!("could not re-fetch records after a change: {e}"),
            }
        }),
    )
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Default)]
struct State {
    records: BTreeMap<RecordId, Record>,
    last_id: i64,
    objects: HashMap<(String, String), StoredObject>,
    subscribers: BTreeMap<u64, (String, Arc<ChangeHandler>)>,
    next_subscriber: u64,
}

/// In-process backend. Clones share the same data.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    public_base: Arc<str>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("public_base", &self.public_base)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::with_public_base("memory://")
    }

    /// Public URLs of uploaded objects are `{base}{bucket}/{path}`
    pub fn with_public_base<S: AsRef<str>>(base: S) -> MemoryStore {
        MemoryStore {
            state: Arc::new(Mutex::new(State::default())),
            public_base: Arc::from(base.as_ref()),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// The bytes and content type of an uploaded object
    pub fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        let state = self.state().ok()?;
        state
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| (o.bytes.clone(), o.content_type.clone()))
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().map(|s| s.subscribers.len()).unwrap_or_default()
    }

    fn notify(&self, table: &str, kind: ChangeKind) {
        let handlers: Vec<Arc<ChangeHandler>> = match self.state() {
            Ok(state) => state
                .subscribers
                .values()
                .filter(|(t, _)| t == table)
                .map(|(_, handler)| Arc::clone(handler))
                .collect(),
            Err(_) => return,
        };

        // the lock is released here so handlers can query the store
        let event = ChangeEvent {
            table: table.to_string(),
            kind,
        };
        for handler in handlers {
            handler(&event);
        }
    }
}

impl RecordStore for MemoryStore {
    fn select(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let state = self.state()?;
        let mut records: Vec<Record> = state
            .records
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn insert(&self, record: NewRecord) -> Result<Record> {
        let record = {
            let mut state = self.state()?;
            state.last_id += 1;
            let record = record.into_record(RecordId(state.last_id), Utc::now());
            state.records.insert(record.id, record.clone());
            record
        };
        self.notify(RECORDS_TABLE, ChangeKind::Insert);
        Ok(record)
    }

    fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<Record> {
        let record = {
            let mut state = self.state()?;
            let record = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            record.apply(patch);
            record.clone()
        };
        self.notify(RECORDS_TABLE, ChangeKind::Update);
        Ok(record)
    }

    fn delete(&self, id: RecordId) -> Result<()> {
        self.state()?
            .records
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;
        self.notify(RECORDS_TABLE, ChangeKind::Delete);
        Ok(())
    }
}

impl ObjectStore for MemoryStore {
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let invalid = bucket.is_empty()
            || bucket.contains('/')
            || path.is_empty()
            || path.starts_with('/')
            || path.split('/').any(|segment| segment.is_empty() || segment == "..");
        if invalid {
            return Err(StoreError::InvalidPath(format!("{bucket}/{path}")));
        }

        self.state()?.objects.insert(
            (bucket.to_string(), path.to_string()),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(format!("{}{bucket}/{path}", self.public_base))
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self, table: &str, handler: ChangeHandler) -> Subscription {
        let id = match self.state() {
            Ok(mut state) => {
                let id = state.next_subscriber;
                state.next_subscriber += 1;
                state
                    .subscribers
                    .insert(id, (table.to_string(), Arc::new(handler)));
                id
            }
            Err(e) => {
                log::warn!("could not subscribe to {table}: {e}");
                return Subscription { cancel: None };
            }
        };

        let state: Weak<Mutex<State>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                if let Ok(mut state) = state.lock() {
                    state.subscribers.remove(&id);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_record(project: &str, location: &str) -> NewRecord {
        NewRecord {
            project_name: project.to_string(),
            location: location.to_string(),
            assignee: "Ali".to_string(),
            status: Status::Open,
            description: None,
            comment: None,
            qr_payload: None,
            photo_url: None,
        }
    }

    #[test]
    fn ids_increase_and_are_not_reused() {
        let store = MemoryStore::new();
        let a = store.insert(new_record("P", "A")).unwrap();
        let b = store.insert(new_record("P", "B")).unwrap();
        assert!(b.id > a.id);
        store.delete(b.id).unwrap();
        let c = store.insert(new_record("P", "C")).unwrap();
        assert!(c.id > b.id);
    }

    #[test]
    fn select_filters_by_project_newest_first() {
        let store = MemoryStore::new();
        store.insert(new_record("P", "first")).unwrap();
        store.insert(new_record("Q", "other")).unwrap();
        store.insert(new_record("P", "second")).unwrap();

        let records = store.select(&RecordQuery::project("P")).unwrap();
        let locations: Vec<_> = records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["second", "first"]);
        assert_eq!(store.select(&RecordQuery::all()).unwrap().len(), 3);
    }

    #[test]
    fn updates_and_deletes_of_missing_records_fail() {
        let store = MemoryStore::new();
        let patch = RecordPatch::pdf_url("x");
        assert_eq!(
            store.update(RecordId(9), &patch).unwrap_err(),
            StoreError::NotFound(RecordId(9))
        );
        assert!(store.delete(RecordId(9)).is_err());
    }

    #[test]
    fn uploads_return_public_urls() {
        let store = MemoryStore::with_public_base("https://files.example/");
        let url = store
            .upload("bucket", "reports/a.pdf", b"%PDF", "application/pdf")
            .unwrap();
        assert_eq!(url, "https://files.example/bucket/reports/a.pdf");
        let (bytes, content_type) = store.object("bucket", "reports/a.pdf").unwrap();
        assert_eq!(bytes, b"%PDF");
        assert_eq!(content_type, "application/pdf");

        for bad in ["", "/abs.pdf", "reports/../x.pdf", "reports//x.pdf"] {
            assert!(matches!(
                store.upload("bucket", bad, b"", "application/pdf"),
                Err(StoreError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn changes_notify_subscribers_until_unsubscribed() {
        let store = MemoryStore::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut subscription = store.subscribe(
            RECORDS_TABLE,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let _other = store.subscribe("photos", Box::new(|_| panic!("wrong table")));

        let record = store.insert(new_record("P", "A")).unwrap();
        store.update(record.id, &RecordPatch::pdf_url("u")).unwrap();
        store.delete(record.id).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
        store.insert(new_record("P", "B")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn dropping_a_subscription_cancels_it() {
        let store = MemoryStore::new();
        {
            let _subscription = store.subscribe(RECORDS_TABLE, Box::new(|_| {}));
            assert_eq!(store.subscriber_count(), 1);
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn watchers_refetch_on_change() {
        let store = Arc::new(MemoryStore::new());
        let latest = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&latest);
        let _watch = watch_records(
            store.as_ref(),
            Arc::clone(&store),
            RecordQuery::project("P"),
            move |records| {
                *sink.lock().unwrap() = records;
            },
        );

        store.insert(new_record("P", "A")).unwrap();
        store.insert(new_record("Q", "B")).unwrap();
        let records = latest.lock().unwrap().clone();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "A");
    }
}
