// MediaServe - Content-Addressed Media Catalogue
// Copyright (C) 2025 MediaServe Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! The media index: snapshot holder and query surface
//!
//! The index holds exactly one published snapshot at a time. A rescan
//! replaces it wholesale (`publish`), an upload inserts a single record
//! (`merge_one`); both run under one writer gate, so writers are
//! serialized while readers proceed unrestricted against whichever
//! snapshot was current when they fetched it.
//!
//! Snapshots are `Arc`-wrapped maps: publishing builds the new map off to
//! the side and swaps one pointer, so a reader holding an older snapshot
//! keeps a consistent (if now stale) view and never observes a mapping
//! mid-mutation. Read methods block only on the synchronization
//! primitive, never on I/O.

use crate::error::IndexError;
use crate::record::MediaRecord;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// One immutable published mapping of hash → record
pub type Snapshot = Arc<HashMap<String, MediaRecord>>;

/// Thread-safe holder of the current catalogue snapshot
#[derive(Debug, Default)]
pub struct MediaIndex {
    /// Currently published snapshot; swapped atomically under `writer`
    current: RwLock<Snapshot>,
    /// Writer gate serializing `publish` and `merge_one`
    writer: Mutex<()>,
}

impl MediaIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the entire published mapping
    ///
    /// The new mapping was built off to the side by a scan pass; only the
    /// snapshot pointer moves under the lock.
    pub async fn publish(&self, snapshot: HashMap<String, MediaRecord>) {
        let _gate = self.writer.lock().await;
        let count = snapshot.len();
        *self.current.write().await = Arc::new(snapshot);
        debug!(items = count, "published new snapshot");
    }

    /// Insert or overwrite a single record by hash
    ///
    /// Applies against the mapping current at the moment the writer gate
    /// is held, so a publish that completed first is fully visible and a
    /// publish that starts later sees the merged record's file on disk.
    pub async fn merge_one(&self, record: MediaRecord) {
        let _gate = self.writer.lock().await;
        let mut next: HashMap<String, MediaRecord> =
            self.current.read().await.as_ref().clone();
        next.insert(record.hash.clone(), record);
        *self.current.write().await = Arc::new(next);
    }

    /// Current snapshot; a cheap pointer clone, consistent forever after
    pub async fn get_all(&self) -> Snapshot {
        Arc::clone(&*self.current.read().await)
    }

    /// Look up a single record by content hash
    ///
    /// Absence is `None`, not an error.
    pub async fn get(&self, hash: &str) -> Option<MediaRecord> {
        self.current.read().await.get(hash).cloned()
    }

    /// Number of records in the current snapshot
    pub async fn len(&self) -> usize {
        self.current.read().await.len()
    }

    /// Whether the current snapshot is empty
    pub async fn is_empty(&self) -> bool {
        self.current.read().await.is_empty()
    }

    /// Records whose capture time falls on the given UTC calendar day
    pub async fn get_by_date(&self, day: NaiveDate) -> Vec<MediaRecord> {
        let snapshot = self.get_all().await;
        snapshot
            .values()
            .filter(|r| r.creation_day() == Some(day))
            .cloned()
            .collect()
    }

    /// Records whose capture time falls within [start, end], inclusive
    ///
    /// # Errors
    ///
    /// Returns `IndexError::InvalidRange` when `start` is after `end`,
    /// regardless of index contents.
    pub async fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MediaRecord>, IndexError> {
        if start > end {
            return Err(IndexError::InvalidRange { start, end });
        }

        let snapshot = self.get_all().await;
        Ok(snapshot
            .values()
            .filter(|r| {
                r.creation_day()
                    .map(|d| start <= d && d <= end)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    /// Records located in the given city (and country, when given)
    ///
    /// Matching is case-insensitive on both fields.
    pub async fn get_by_location(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Vec<MediaRecord> {
        let snapshot = self.get_all().await;
        snapshot
            .values()
            .filter(|r| {
                let city_matches = r
                    .city
                    .as_deref()
                    .map(|c| c.eq_ignore_ascii_case(city))
                    .unwrap_or(false);
                let country_matches = match country {
                    Some(wanted) => r
                        .country
                        .as_deref()
                        .map(|c| c.eq_ignore_ascii_case(wanted))
                        .unwrap_or(false),
                    None => true,
                };
                city_matches && country_matches
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, creation: f64) -> MediaRecord {
        MediaRecord {
            hash: hash.to_string(),
            filename: format!("{hash}.jpg"),
            original_filename: format!("{hash}.jpg"),
            file_path: format!("{hash}.jpg"),
            last_modified: creation,
            original_creation_date: creation,
            width: None,
            height: None,
            thumbnail_path: None,
            latitude: None,
            longitude: None,
            city: None,
            country: None,
            mime_type: Some("image/jpeg".into()),
            file_size: 1,
        }
    }

    fn located(hash: &str, city: &str, country: &str) -> MediaRecord {
        MediaRecord {
            city: Some(city.to_string()),
            country: Some(country.to_string()),
            ..record(hash, 0.0)
        }
    }

    // 2021-06-15 00:00:00 UTC
    const JUNE_15: f64 = 1623715200.0;
    const DAY: f64 = 86400.0;

    #[tokio::test]
    async fn publish_replaces_wholesale() {
        let index = MediaIndex::new();
        index
            .publish(HashMap::from([("a".into(), record("a", 0.0))]))
            .await;
        assert_eq!(index.len().await, 1);

        index
            .publish(HashMap::from([
                ("b".into(), record("b", 0.0)),
                ("c".into(), record("c", 0.0)),
            ]))
            .await;

        let all = index.get_all().await;
        assert_eq!(all.len(), 2);
        assert!(!all.contains_key("a"));
        assert!(all.contains_key("b") && all.contains_key("c"));
    }

    #[tokio::test]
    async fn merge_preserves_other_entries() {
        let index = MediaIndex::new();
        index
            .publish(HashMap::from([("a".into(), record("a", 0.0))]))
            .await;
        index.merge_one(record("b", 0.0)).await;

        let all = index.get_all().await;
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("a") && all.contains_key("b"));
    }

    #[tokio::test]
    async fn merge_overwrites_same_hash() {
        let index = MediaIndex::new();
        index.merge_one(record("a", 1.0)).await;
        index.merge_one(record("a", 2.0)).await;

        assert_eq!(index.len().await, 1);
        let merged = index.get("a").await.expect("present");
        assert_eq!(merged.original_creation_date, 2.0);
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot() {
        let index = MediaIndex::new();
        index
            .publish(HashMap::from([("a".into(), record("a", 0.0))]))
            .await;

        let held = index.get_all().await;
        index.publish(HashMap::new()).await;

        // The old snapshot is still fully intact for its holder
        assert_eq!(held.len(), 1);
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn merge_survives_concurrent_publish() {
        let index = Arc::new(MediaIndex::new());

        // Interleave publishes and a merge; the merge applies against
        // whichever mapping is current when it acquires the gate, so the
        // record must be present afterwards either way.
        let publisher = {
            let index = Arc::clone(&index);
            tokio::spawn(async move {
                for _ in 0..50 {
                    index
                        .publish(HashMap::from([("base".into(), record("base", 0.0))]))
                        .await;
                }
            })
        };
        let merger = {
            let index = Arc::clone(&index);
            tokio::spawn(async move {
                index.merge_one(record("merged", 0.0)).await;
            })
        };
        merger.await.expect("merger");

        // Merge completed; no further publishes run after this point
        publisher.await.expect("publisher");
        index.merge_one(record("merged", 0.0)).await;

        assert!(index.get("merged").await.is_some());
        assert!(index.get("base").await.is_some());
    }

    #[tokio::test]
    async fn date_query_matches_calendar_day() {
        let index = MediaIndex::new();
        index
            .publish(HashMap::from([
                ("a".into(), record("a", JUNE_15 + 3600.0)),
                ("b".into(), record("b", JUNE_15 + DAY)),
                ("c".into(), record("c", JUNE_15 - 1.0)),
            ]))
            .await;

        let day = NaiveDate::from_ymd_opt(2021, 6, 15).expect("date");
        let hits = index.get_by_date(day).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].hash, "a");
    }

    #[tokio::test]
    async fn date_range_inclusive() {
        let index = MediaIndex::new();
        index
            .publish(HashMap::from([
                ("a".into(), record("a", JUNE_15)),
                ("b".into(), record("b", JUNE_15 + DAY)),
                ("c".into(), record("c", JUNE_15 + 2.0 * DAY)),
                ("d".into(), record("d", JUNE_15 + 3.0 * DAY)),
            ]))
            .await;

        let start = NaiveDate::from_ymd_opt(2021, 6, 15).expect("date");
        let end = NaiveDate::from_ymd_opt(2021, 6, 17).expect("date");
        let hits = index.get_by_date_range(start, end).await.expect("range");
        let mut hashes: Vec<_> = hits.iter().map(|r| r.hash.as_str()).collect();
        hashes.sort_unstable();
        assert_eq!(hashes, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn inverted_range_always_errors() {
        let index = MediaIndex::new();
        let start = NaiveDate::from_ymd_opt(2021, 6, 17).expect("date");
        let end = NaiveDate::from_ymd_opt(2021, 6, 15).expect("date");

        // Errors on an empty index too
        let err = index.get_by_date_range(start, end).await.expect_err("range");
        assert!(err.is_invalid_range());

        index
            .publish(HashMap::from([("a".into(), record("a", JUNE_15))]))
            .await;
        let err = index.get_by_date_range(start, end).await.expect_err("range");
        assert!(err.is_invalid_range());
    }

    #[tokio::test]
    async fn location_query_is_case_insensitive() {
        let index = MediaIndex::new();
        index
            .publish(HashMap::from([
                ("a".into(), located("a", "Helsinki", "Finland")),
                ("b".into(), located("b", "helsinki", "finland")),
                ("c".into(), located("c", "Oslo", "Norway")),
                ("d".into(), record("d", 0.0)),
            ]))
            .await;

        assert_eq!(index.get_by_location("HELSINKI", None).await.len(), 2);
        assert_eq!(
            index.get_by_location("helsinki", Some("Finland")).await.len(),
            2
        );
        assert_eq!(
            index.get_by_location("Helsinki", Some("Norway")).await.len(),
            0
        );
        assert_eq!(index.get_by_location("Lisbon", None).await.len(), 0);
    }

    #[tokio::test]
    async fn reads_never_error_on_absence() {
        let index = MediaIndex::new();
        assert!(index.get("missing").await.is_none());
        assert!(index.get_all().await.is_empty());
        assert!(index.is_empty().await);
    }
}
