//! Chunked history pagination.
//!
//! History is fetched in fixed 14-day pages walking backwards from today.
//! Each page's query is padded by one day on both sides so sessions crossing
//! a page edge arrive whole. Pages are accumulated in order and every derived
//! view is recomputed over the full accumulated set; nothing is patched in
//! incrementally. Loading stops at the first empty page.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::calendar::DayCalendar;
use crate::event::{RawEvent, sort_chronologically};
use crate::event_type::EventType;
use crate::feed::{FeedRow, generate_feed_timeline};
use crate::sleep::{NightConfig, SleepRow, classify_nights, generate_timeline};

/// Tracking days covered by one page.
pub const DAYS_PER_PAGE: u32 = 14;

/// Padding added to both ends of each page query.
const PAGE_PADDING: Days = Days::new(1);

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history is only paginated for SLEEP and FEED, not {kind}")]
    UnsupportedType { kind: EventType },

    #[error("page {page} lies outside the representable calendar")]
    PageOutOfRange { page: u32 },
}

/// The tracking days and query range of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub page: u32,
    /// Oldest tracking day on the page.
    pub first_day: NaiveDate,
    /// Newest tracking day on the page.
    pub last_day: NaiveDate,
    /// Inclusive lower bound on `start_time`, one day before `first_day`'s row.
    pub query_start: DateTime<Utc>,
    /// Inclusive upper bound on `start_time`, one day after `last_day`'s row.
    pub query_end: DateTime<Utc>,
}

/// Computes the window for `page`, where page 0 ends with `today`.
pub fn page_window<Tz: TimeZone>(
    calendar: &DayCalendar<Tz>,
    today: NaiveDate,
    page: u32,
) -> Result<PageWindow, HistoryError> {
    let out_of_range = || HistoryError::PageOutOfRange { page };
    let back = u64::from(page) * u64::from(DAYS_PER_PAGE);
    let last_day = today.checked_sub_days(Days::new(back)).ok_or_else(out_of_range)?;
    let first_day = last_day
        .checked_sub_days(Days::new(u64::from(DAYS_PER_PAGE - 1)))
        .ok_or_else(out_of_range)?;
    let query_start = calendar
        .row_start(first_day)
        .checked_sub_days(PAGE_PADDING)
        .ok_or_else(out_of_range)?;
    let query_end = calendar
        .row_end(last_day)
        .checked_add_days(PAGE_PADDING)
        .ok_or_else(out_of_range)?;
    Ok(PageWindow {
        page,
        first_day,
        last_day,
        query_start,
        query_end,
    })
}

/// Checks that history can be paginated for `kind`.
pub fn ensure_paginated(kind: EventType) -> Result<(), HistoryError> {
    match kind {
        EventType::Sleep | EventType::Feed => Ok(()),
        other => Err(HistoryError::UnsupportedType { kind: other }),
    }
}

/// The raw events returned for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryChunk {
    pub window: PageWindow,
    pub events: Vec<RawEvent>,
}

/// Serves history pages, typically backed by the event store.
pub trait HistorySource {
    type Error: From<HistoryError>;

    /// Fetches the events of `kind` for `page`. The same page always covers
    /// the same window, so calls can be retried freely.
    fn fetch_chunk(&mut self, kind: EventType, page: u32) -> Result<HistoryChunk, Self::Error>;
}

/// Accumulated pages for one event type.
#[derive(Debug, Clone)]
pub struct HistoryState {
    kind: EventType,
    chunks: Vec<HistoryChunk>,
    next_page: u32,
    has_more: bool,
}

impl HistoryState {
    /// Starts from an already fetched page 0.
    pub fn new(kind: EventType, initial: HistoryChunk) -> Result<Self, HistoryError> {
        ensure_paginated(kind)?;
        let mut state = Self {
            kind,
            chunks: Vec::new(),
            next_page: 0,
            has_more: true,
        };
        state.apply(initial);
        Ok(state)
    }

    /// Fetches page 0 from `source` and starts from it.
    pub fn load<S: HistorySource>(kind: EventType, source: &mut S) -> Result<Self, S::Error> {
        ensure_paginated(kind)?;
        let initial = source.fetch_chunk(kind, 0)?;
        Ok(Self::new(kind, initial)?)
    }

    pub const fn kind(&self) -> EventType {
        self.kind
    }

    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    pub const fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn chunks(&self) -> &[HistoryChunk] {
        &self.chunks
    }

    /// Tracking days spanned by the loaded pages.
    pub fn loaded_days(&self) -> u32 {
        u32::try_from(self.chunks.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(DAYS_PER_PAGE)
    }

    /// Records a fetched page. An empty page ends pagination and is not kept.
    ///
    /// Returns whether more pages may follow.
    pub fn apply(&mut self, chunk: HistoryChunk) -> bool {
        if chunk.events.is_empty() {
            tracing::debug!(kind = %self.kind, page = chunk.window.page, "history exhausted");
            self.has_more = false;
            return false;
        }
        tracing::debug!(
            kind = %self.kind,
            page = chunk.window.page,
            events = chunk.events.len(),
            "history page loaded"
        );
        self.next_page = chunk.window.page.saturating_add(1);
        self.chunks.push(chunk);
        true
    }

    /// Fetches and applies the next page. Does nothing once history is exhausted.
    pub fn load_more<S: HistorySource>(&mut self, source: &mut S) -> Result<bool, S::Error> {
        if !self.has_more {
            return Ok(false);
        }
        let chunk = source.fetch_chunk(self.kind, self.next_page)?;
        Ok(self.apply(chunk))
    }

    /// Every loaded event once, in chronological order.
    ///
    /// Padded pages overlap, so events are deduplicated by id.
    pub fn all_events(&self) -> Vec<RawEvent> {
        let mut by_id = BTreeMap::new();
        for event in self.chunks.iter().flat_map(|c| &c.events) {
            by_id.entry(event.id).or_insert_with(|| event.clone());
        }
        let mut events: Vec<RawEvent> = by_id.into_values().collect();
        sort_chronologically(&mut events);
        events
    }

    /// Sleep rows for every loaded day, recomputed from all loaded events.
    pub fn sleep_rows<Tz: TimeZone>(
        &self,
        calendar: &DayCalendar<Tz>,
        config: &NightConfig,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<SleepRow> {
        let events = self.all_events();
        let classification = classify_nights(&events, calendar, config);
        generate_timeline(
            &events,
            &classification.night_event_ids,
            calendar,
            today,
            self.loaded_days(),
            now,
        )
    }

    /// Feed rows for every loaded day, recomputed from all loaded events.
    pub fn feed_rows<Tz: TimeZone>(
        &self,
        calendar: &DayCalendar<Tz>,
        today: NaiveDate,
    ) -> Vec<FeedRow> {
        generate_feed_timeline(&self.all_events(), calendar, today, self.loaded_days())
    }
}
