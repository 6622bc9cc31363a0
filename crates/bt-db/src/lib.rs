//! Storage layer for the baby tracker.
//!
//! Provides persistence for events using `rusqlite`, plus a [`HistorySource`]
//! that serves 14-day history pages to the paginator.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without a `Mutex`.
//!
//! # Schema
//!
//! A single `events` table. Timestamps are stored as TEXT in RFC 3339 UTC with
//! millisecond precision (e.g. `2025-01-15T10:30:00.000Z`), so lexicographic
//! order matches chronological order and range queries can compare strings.
//! The `data` column holds the type-specific JSON payload.
//!
//! Reading never fails on a bad row: an unparseable `start_time` becomes
//! `None`, an unparseable `end_time` is dropped, a malformed payload decodes to
//! the empty payload, and a row with an unknown `type` is skipped.

use std::path::Path;

use bt_core::history::ensure_paginated;
use bt_core::{
    DayCalendar, EventId, EventPayload, EventType, HistoryChunk, HistoryError, HistorySource,
    RawEvent, ValidationError, page_window, validate_times,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The event violates a model invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A payload could not be encoded for storage.
    #[error("failed to encode event payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// Only one SLEEP event may be ongoing at a time.
    #[error("sleep {id} is still ongoing")]
    SleepAlreadyActive { id: EventId },
    #[error("event {id} not found")]
    NotFound { id: EventId },
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

/// An event ready to be stored. The id is assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub kind: EventType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub data: EventPayload,
}

impl NewEvent {
    /// An event of `kind` at `start_time` with an empty payload.
    pub fn new(kind: EventType, start_time: DateTime<Utc>) -> Self {
        Self {
            kind,
            start_time,
            end_time: None,
            note: None,
            data: EventPayload::empty(kind),
        }
    }
}

/// Changes applied by [`Database::update_event`]. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub start_time: Option<DateTime<Utc>>,
    /// `Some(None)` reopens a SLEEP event.
    pub end_time: Option<Option<DateTime<Utc>>>,
    /// `Some(None)` clears the note.
    pub note: Option<Option<String>>,
    pub data: Option<EventPayload>,
}

/// Outcome of [`Database::toggle_sleep`].
#[derive(Debug, Clone, PartialEq)]
pub enum SleepToggle {
    Started(RawEvent),
    Ended(RawEvent),
}

/// Row count per event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub kind: EventType,
    pub count: usize,
}

const EVENT_COLUMNS: &str = "id, type, start_time, end_time, note, data";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- type: SLEEP, FEED, DIAPER, WEIGHT, MEDICINE or NOTE
            -- end_time: only set for SLEEP; NULL while the session is ongoing
            -- data: JSON payload whose shape depends on type
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                note TEXT,
                data TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_type_start ON events(type, start_time);
            ",
        )?;
        Ok(())
    }

    /// Inserts one event and returns its id.
    pub fn insert_event(&mut self, event: &NewEvent) -> Result<EventId, DbError> {
        let id = insert_row(&self.conn, event)?;
        tracing::debug!(%id, kind = %event.kind, "inserted event");
        Ok(id)
    }

    /// Inserts a batch of events in one transaction.
    ///
    /// Either every event is stored or, on the first invalid one, none are.
    pub fn insert_events(&mut self, events: &[NewEvent]) -> Result<usize, DbError> {
        if events.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        for event in events {
            insert_row(&tx, event)?;
        }
        tx.commit()?;
        tracing::debug!(count = events.len(), "inserted event batch");
        Ok(events.len())
    }

    /// Fetches one event by id.
    pub fn get_event(&self, id: EventId) -> Result<Option<RawEvent>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"),
                [id.get()],
                StoredRow::from_row,
            )
            .optional()?;
        Ok(row.and_then(StoredRow::into_event))
    }

    /// Applies `patch` to a stored event, enforcing the interval invariant.
    pub fn update_event(&mut self, id: EventId, patch: &EventPatch) -> Result<RawEvent, DbError> {
        let mut event = self.get_event(id)?.ok_or(DbError::NotFound { id })?;
        if let Some(start) = patch.start_time {
            event.start_time = Some(start);
        }
        if let Some(end) = patch.end_time {
            event.end_time = end;
        }
        if let Some(note) = &patch.note {
            event.note.clone_from(note);
        }
        if let Some(data) = &patch.data {
            event.data = data.clone();
        }

        let start = event.start_time.ok_or_else(|| ValidationError::InvalidInterval {
            start: "unparseable".to_string(),
            end: event.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        })?;
        validate_times(event.kind, start, event.end_time)?;
        if event.is_ongoing() {
            if let Some(active) = self.active_sleep()?.filter(|a| a.id != id) {
                return Err(DbError::SleepAlreadyActive { id: active.id });
            }
        }

        self.conn.execute(
            "UPDATE events SET start_time = ?, end_time = ?, note = ?, data = ? WHERE id = ?",
            params![
                format_timestamp(start),
                event.end_time.map(format_timestamp),
                event.note,
                event.data.encode()?,
                id.get(),
            ],
        )?;
        tracing::debug!(%id, "updated event");
        Ok(event)
    }

    /// Deletes an event by id.
    pub fn delete_event(&mut self, id: EventId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM events WHERE id = ?", [id.get()])?;
        if deleted == 0 {
            return Err(DbError::NotFound { id });
        }
        tracing::debug!(%id, "deleted event");
        Ok(())
    }

    /// Events of `kind` whose start lies in `[start, end]`, newest first.
    pub fn query_events(
        &self,
        kind: EventType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, DbError> {
        if end < start {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE type = ? AND start_time >= ? AND start_time <= ?
            ORDER BY start_time DESC, id DESC
            "
        ))?;
        let rows = stmt.query_map(
            params![kind.as_str(), format_timestamp(start), format_timestamp(end)],
            StoredRow::from_row,
        )?;
        let mut events = Vec::new();
        for row in rows {
            events.extend(row?.into_event());
        }
        Ok(events)
    }

    /// Every event of `kind`, oldest first.
    pub fn events_of_type(&self, kind: EventType) -> Result<Vec<RawEvent>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE type = ?
            ORDER BY start_time ASC, id ASC
            "
        ))?;
        let rows = stmt.query_map([kind.as_str()], StoredRow::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.extend(row?.into_event());
        }
        Ok(events)
    }

    /// The most recent events, optionally of one type, newest first.
    pub fn recent_events(
        &self,
        kind: Option<EventType>,
        limit: usize,
    ) -> Result<Vec<RawEvent>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE ?1 IS NULL OR type = ?1
            ORDER BY start_time DESC, id DESC
            LIMIT ?2
            "
        ))?;
        let rows = stmt.query_map(
            params![kind.map(EventType::as_str), limit],
            StoredRow::from_row,
        )?;
        let mut events = Vec::new();
        for row in rows {
            events.extend(row?.into_event());
        }
        Ok(events)
    }

    /// The ongoing SLEEP event, if any.
    pub fn active_sleep(&self) -> Result<Option<RawEvent>, DbError> {
        active_sleep_in(&self.conn)
    }

    /// Ends the ongoing sleep at `now`, or starts a new one if none is ongoing.
    pub fn toggle_sleep(&mut self, now: DateTime<Utc>) -> Result<SleepToggle, DbError> {
        if let Some(active) = self.active_sleep()? {
            let ended = self.update_event(
                active.id,
                &EventPatch {
                    end_time: Some(Some(now)),
                    ..EventPatch::default()
                },
            )?;
            return Ok(SleepToggle::Ended(ended));
        }
        let id = self.insert_event(&NewEvent::new(EventType::Sleep, now))?;
        let started = self.get_event(id)?.ok_or(DbError::NotFound { id })?;
        Ok(SleepToggle::Started(started))
    }

    /// Row counts per event type, for every type with at least one row.
    pub fn counts_by_type(&self) -> Result<Vec<TypeCount>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT type, COUNT(*) FROM events GROUP BY type ORDER BY type ASC")?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((kind, count))
        })?;
        let mut counts = Vec::new();
        for row in rows {
            let (kind, count) = row?;
            match kind.parse() {
                Ok(kind) => counts.push(TypeCount {
                    kind,
                    count: usize::try_from(count).unwrap_or(0),
                }),
                Err(err) => tracing::warn!(error = %err, "skipping unknown event type"),
            }
        }
        Ok(counts)
    }
}

fn insert_row(conn: &Connection, event: &NewEvent) -> Result<EventId, DbError> {
    validate_times(event.kind, event.start_time, event.end_time)?;
    if event.kind == EventType::Sleep && event.end_time.is_none() {
        if let Some(active) = active_sleep_in(conn)? {
            return Err(DbError::SleepAlreadyActive { id: active.id });
        }
    }
    conn.execute(
        "
        INSERT INTO events (type, start_time, end_time, note, data, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
        params![
            event.kind.as_str(),
            format_timestamp(event.start_time),
            event.end_time.map(format_timestamp),
            event.note,
            event.data.encode()?,
            format_timestamp(Utc::now()),
        ],
    )?;
    Ok(EventId::new(conn.last_insert_rowid())?)
}

fn active_sleep_in(conn: &Connection) -> Result<Option<RawEvent>, DbError> {
    let row = conn
        .query_row(
            &format!(
                "
                SELECT {EVENT_COLUMNS}
                FROM events
                WHERE type = 'SLEEP' AND end_time IS NULL
                ORDER BY start_time DESC, id DESC
                LIMIT 1
                "
            ),
            [],
            StoredRow::from_row,
        )
        .optional()?;
    Ok(row.and_then(StoredRow::into_event))
}

/// A row as stored, before decoding.
struct StoredRow {
    id: i64,
    kind: String,
    start_time: String,
    end_time: Option<String>,
    note: Option<String>,
    data: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            note: row.get(4)?,
            data: row.get(5)?,
        })
    }

    /// Decodes the row, degrading bad fields instead of failing.
    fn into_event(self) -> Option<RawEvent> {
        let id = match EventId::new(self.id) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = %err, "skipping row with invalid id");
                return None;
            }
        };
        let kind: EventType = match self.kind.parse() {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(%id, error = %err, "skipping row with unknown type");
                return None;
            }
        };
        Some(RawEvent {
            id,
            kind,
            start_time: parse_timestamp(&self.start_time, id),
            end_time: self
                .end_time
                .as_deref()
                .and_then(|raw| parse_timestamp(raw, id)),
            note: self.note.filter(|n| !n.is_empty()),
            data: EventPayload::decode(kind, &self.data),
        })
    }
}

fn parse_timestamp(timestamp: &str, id: EventId) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            tracing::warn!(%id, timestamp, error = %err, "unparseable timestamp");
            None
        }
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serves history pages from the database.
pub struct DatabaseHistory<'a, Tz: TimeZone> {
    db: &'a Database,
    calendar: &'a DayCalendar<Tz>,
    today: NaiveDate,
}

impl<'a, Tz: TimeZone> DatabaseHistory<'a, Tz> {
    /// Pages end at `today`, the current tracking day.
    pub const fn new(db: &'a Database, calendar: &'a DayCalendar<Tz>, today: NaiveDate) -> Self {
        Self {
            db,
            calendar,
            today,
        }
    }
}

impl<Tz: TimeZone> HistorySource for DatabaseHistory<'_, Tz> {
    type Error = DbError;

    fn fetch_chunk(&mut self, kind: EventType, page: u32) -> Result<HistoryChunk, DbError> {
        ensure_paginated(kind)?;
        let window = page_window(self.calendar, self.today, page)?;
        let events = self
            .db
            .query_events(kind, window.query_start, window.query_end)?;
        tracing::debug!(
            %kind,
            page,
            from = %window.first_day,
            to = %window.last_day,
            events = events.len(),
            "fetched history chunk"
        );
        Ok(HistoryChunk { window, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_core::payload::FeedPayload;
    use bt_core::{HistoryState, NightConfig};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn sleep(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> NewEvent {
        NewEvent {
            end_time: end,
            ..NewEvent::new(EventType::Sleep, start)
        }
    }

    fn bottle(start: DateTime<Utc>, amount: f64) -> NewEvent {
        NewEvent {
            data: EventPayload::Feed(FeedPayload {
                feed_type: Some("Bottle".to_string()),
                amount: Some(amount),
                unit: Some("ml".to_string()),
                side: None,
            }),
            ..NewEvent::new(EventType::Feed, start)
        }
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn open_file_database_persists_events() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bt.db");
        let id = {
            let mut db = Database::open(&path).expect("open db");
            db.insert_event(&bottle(at(2025, 3, 1, 9, 0), 120.0))
                .expect("insert")
        };
        let db = Database::open(&path).expect("reopen db");
        let event = db.get_event(id).expect("get").expect("stored event");
        assert_eq!(event.kind, EventType::Feed);
    }

    #[test]
    fn insert_and_get_round_trip() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let new = NewEvent {
            note: Some("big bottle".to_string()),
            ..bottle(at(2025, 3, 1, 9, 0), 150.0)
        };
        let id = db.insert_event(&new).expect("insert");
        let event = db.get_event(id).expect("get").expect("stored event");
        assert_eq!(event.start_time, Some(new.start_time));
        assert_eq!(event.note.as_deref(), Some("big bottle"));
        assert_eq!(event.data, new.data);
        assert!(db.get_event(EventId::new(999).unwrap()).unwrap().is_none());
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let err = db
            .insert_event(&sleep(at(2025, 3, 1, 9, 0), Some(at(2025, 3, 1, 8, 0))))
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn end_time_only_allowed_for_sleep() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let feed = NewEvent {
            end_time: Some(at(2025, 3, 1, 9, 30)),
            ..bottle(at(2025, 3, 1, 9, 0), 100.0)
        };
        assert!(matches!(
            db.insert_event(&feed).unwrap_err(),
            DbError::Validation(ValidationError::UnexpectedEndTime { .. })
        ));
    }

    #[test]
    fn only_one_sleep_may_be_ongoing() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let first = db.insert_event(&sleep(at(2025, 3, 1, 20, 0), None)).unwrap();
        let err = db
            .insert_event(&sleep(at(2025, 3, 1, 21, 0), None))
            .unwrap_err();
        assert!(matches!(err, DbError::SleepAlreadyActive { id } if id == first));
    }

    #[test]
    fn toggle_sleep_starts_then_ends() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let started = match db.toggle_sleep(at(2025, 3, 1, 20, 0)).unwrap() {
            SleepToggle::Started(event) => event,
            other => panic!("expected start, got {other:?}"),
        };
        assert!(started.is_ongoing());
        assert_eq!(db.active_sleep().unwrap().map(|e| e.id), Some(started.id));

        let ended = match db.toggle_sleep(at(2025, 3, 2, 6, 30)).unwrap() {
            SleepToggle::Ended(event) => event,
            other => panic!("expected end, got {other:?}"),
        };
        assert_eq!(ended.id, started.id);
        assert_eq!(ended.duration_minutes(), Some(630));
        assert!(db.active_sleep().unwrap().is_none());
    }

    #[test]
    fn query_is_inclusive_and_newest_first() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_events(&[
            bottle(at(2025, 3, 1, 8, 0), 100.0),
            bottle(at(2025, 3, 1, 12, 0), 110.0),
            bottle(at(2025, 3, 1, 16, 0), 120.0),
            sleep(at(2025, 3, 1, 13, 0), Some(at(2025, 3, 1, 14, 0))),
        ])
        .unwrap();

        let events = db
            .query_events(EventType::Feed, at(2025, 3, 1, 8, 0), at(2025, 3, 1, 12, 0))
            .unwrap();
        let starts: Vec<_> = events.iter().map(|e| e.start_time.unwrap()).collect();
        assert_eq!(starts, vec![at(2025, 3, 1, 12, 0), at(2025, 3, 1, 8, 0)]);
    }

    #[test]
    fn events_of_type_are_oldest_first() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_events(&[
            bottle(at(2025, 3, 2, 8, 0), 100.0),
            sleep(at(2025, 3, 1, 13, 0), Some(at(2025, 3, 1, 14, 0))),
            bottle(at(2024, 12, 1, 8, 0), 90.0),
        ])
        .unwrap();

        let feeds = db.events_of_type(EventType::Feed).unwrap();
        let starts: Vec<_> = feeds.iter().map(|e| e.start_time.unwrap()).collect();
        assert_eq!(starts, vec![at(2024, 12, 1, 8, 0), at(2025, 3, 2, 8, 0)]);
        assert!(db.events_of_type(EventType::Weight).unwrap().is_empty());
    }

    #[test]
    fn batch_insert_is_all_or_nothing() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let err = db.insert_events(&[
            bottle(at(2025, 3, 1, 8, 0), 100.0),
            sleep(at(2025, 3, 1, 9, 0), Some(at(2025, 3, 1, 9, 0))),
        ]);
        assert!(err.is_err());
        assert!(db.recent_events(None, 10).unwrap().is_empty());
    }

    #[test]
    fn update_event_applies_patch_and_validates() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let id = db
            .insert_event(&sleep(at(2025, 3, 1, 13, 0), Some(at(2025, 3, 1, 14, 0))))
            .unwrap();

        let updated = db
            .update_event(
                id,
                &EventPatch {
                    end_time: Some(Some(at(2025, 3, 1, 14, 45))),
                    note: Some(Some("in the pram".to_string())),
                    ..EventPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.duration_minutes(), Some(105));
        assert_eq!(db.get_event(id).unwrap().unwrap(), updated);

        let err = db
            .update_event(
                id,
                &EventPatch {
                    start_time: Some(at(2025, 3, 1, 15, 0)),
                    ..EventPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn delete_missing_event_is_not_found() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let id = db.insert_event(&bottle(at(2025, 3, 1, 8, 0), 90.0)).unwrap();
        db.delete_event(id).unwrap();
        assert!(matches!(
            db.delete_event(id).unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[test]
    fn bad_rows_degrade_instead_of_failing() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.conn
            .execute_batch(
                "
                INSERT INTO events (type, start_time, data, created_at)
                VALUES ('FEED', 'yesterday-ish', '{not json', '2025-03-01T00:00:00.000Z');
                INSERT INTO events (type, start_time, data, created_at)
                VALUES ('FEED', '2025-03-01T09:00:00.000Z', '{\"feedType\": 3}', '2025-03-01T00:00:00.000Z');
                INSERT INTO events (type, start_time, data, created_at)
                VALUES ('BATH', '2025-03-01T10:00:00.000Z', '{}', '2025-03-01T00:00:00.000Z');
                ",
            )
            .unwrap();

        let events = db.recent_events(None, 10).unwrap();
        assert_eq!(events.len(), 2);
        let undated = events.iter().find(|e| e.start_time.is_none()).unwrap();
        assert_eq!(undated.data, EventPayload::empty(EventType::Feed));
        let dated = events.iter().find(|e| e.start_time.is_some()).unwrap();
        assert_eq!(dated.data, EventPayload::empty(EventType::Feed));
    }

    #[test]
    fn counts_by_type_lists_stored_types() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_events(&[
            bottle(at(2025, 3, 1, 8, 0), 100.0),
            bottle(at(2025, 3, 1, 11, 0), 100.0),
            sleep(at(2025, 3, 1, 13, 0), Some(at(2025, 3, 1, 14, 0))),
        ])
        .unwrap();
        let counts = db.counts_by_type().unwrap();
        assert_eq!(
            counts,
            vec![
                TypeCount {
                    kind: EventType::Feed,
                    count: 2
                },
                TypeCount {
                    kind: EventType::Sleep,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn database_history_pages_until_empty() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.insert_events(&[
            sleep(at(2025, 3, 30, 20, 0), Some(at(2025, 3, 31, 6, 0))),
            sleep(at(2025, 3, 17, 20, 0), Some(at(2025, 3, 18, 6, 30))),
            sleep(at(2025, 3, 1, 13, 0), Some(at(2025, 3, 1, 14, 0))),
        ])
        .unwrap();
        let calendar = DayCalendar::seven_am(Utc);
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let mut source = DatabaseHistory::new(&db, &calendar, today);

        let mut state = HistoryState::load(EventType::Sleep, &mut source).unwrap();
        let mut pages = 1;
        while state.load_more(&mut source).unwrap() {
            pages += 1;
        }
        assert_eq!(pages, 3);
        assert_eq!(state.all_events().len(), 3);

        let rows = state.sleep_rows(&calendar, &NightConfig::default(), today, at(2025, 3, 31, 12, 0));
        assert_eq!(rows.len(), 42);
        let night = rows
            .iter()
            .find(|r| r.raw_date == NaiveDate::from_ymd_opt(2025, 3, 17).unwrap())
            .unwrap();
        assert!(night.markers[0].is_night);
    }

    #[test]
    fn database_history_rejects_other_types() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let calendar = DayCalendar::seven_am(Utc);
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let mut source = DatabaseHistory::new(&db, &calendar, today);
        let err = source.fetch_chunk(EventType::Note, 0).unwrap_err();
        assert!(matches!(
            err,
            DbError::History(HistoryError::UnsupportedType { .. })
        ));
    }
}
