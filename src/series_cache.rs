//! Lazily fetched, memoized series per study.
//!
//! Each study UID owns one slot. The first expansion initializes it; any
//! expansion that arrives while that fetch is in flight waits on the same
//! slot instead of issuing a second request. A failed fetch leaves the slot
//! empty so a later expansion may retry.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::data_source::DataSource;
use crate::model::Series;
use crate::utils::{parse_study_date, parse_study_time};

type Slot = Arc<OnceCell<Vec<Series>>>;

pub struct SeriesCache {
    source: Arc<dyn DataSource>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl SeriesCache {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the series of a study, fetching them at most once.
    ///
    /// Fetch failures are logged and yield an empty list.
    pub async fn expand(&self, study_instance_uid: &str) -> Vec<Series> {
        let slot = self.slot(study_instance_uid);
        if let Some(series) = slot.get() {
            log::debug!("Series cache hit for study {study_instance_uid}");
            return series.clone();
        }

        let fetched = slot
            .get_or_try_init(|| async {
                log::debug!("Series cache miss for study {study_instance_uid}, fetching");
                self.source
                    .search_series(study_instance_uid)
                    .await
                    .map(sort_by_series_date)
            })
            .await;

        match fetched {
            Ok(series) => series.clone(),
            Err(err) => {
                log::warn!("Unable to load series for study {study_instance_uid}: {err}");
                Vec::new()
            }
        }
    }

    /// Cached series without touching the data source.
    pub fn cached(&self, study_instance_uid: &str) -> Option<Vec<Series>> {
        self.slots
            .lock()
            .get(study_instance_uid)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn is_loaded(&self, study_instance_uid: &str) -> bool {
        self.slots
            .lock()
            .get(study_instance_uid)
            .is_some_and(|slot| slot.initialized())
    }

    /// Study UIDs whose series are in the cache, in no particular order.
    pub fn loaded_studies(&self) -> Vec<String> {
        self.slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(uid, _)| uid.clone())
            .collect()
    }

    /// Forgets every cached study. Fetches still in flight complete into
    /// detached slots and are not observed afterwards.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    fn slot(&self, study_instance_uid: &str) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(study_instance_uid.to_string()).or_default())
    }
}

/// Orders series by series date then time, oldest first. Series without a
/// valid date keep their relative order after the dated ones.
pub fn sort_by_series_date(mut series: Vec<Series>) -> Vec<Series> {
    series.sort_by(|a, b| match (series_key(a), series_key(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    series
}

fn series_key(series: &Series) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let date = series.series_date.as_deref().and_then(parse_study_date)?;
    let time = series.series_time.as_deref().and_then(parse_study_time);
    Some((date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::StudySearch;
    use crate::error::{Result, WorklistError};
    use crate::model::FilterValues;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn search_studies(&self, _filter: &FilterValues) -> Result<StudySearch> {
            Ok(StudySearch::default())
        }

        async fn search_series(&self, study_instance_uid: &str) -> Result<Vec<Series>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if self.failing.load(AtomicOrdering::SeqCst) {
                return Err(WorklistError::data_source("backend offline"));
            }
            Ok(vec![
                dated(&format!("{study_instance_uid}.2"), Some("20240302")),
                dated(&format!("{study_instance_uid}.1"), Some("20240301")),
            ])
        }
    }

    fn dated(uid: &str, date: Option<&str>) -> Series {
        Series {
            series_date: date.map(str::to_string),
            ..Series::new(uid)
        }
    }

    fn cache() -> (Arc<CountingSource>, SeriesCache) {
        let source = Arc::new(CountingSource::default());
        let cache = SeriesCache::new(source.clone());
        (source, cache)
    }

    #[tokio::test]
    async fn second_expansion_is_served_from_cache() {
        let (source, cache) = cache();
        let first = cache.expand("1.2.3").await;
        let second = cache.expand("1.2.3").await;
        assert_eq!(first, second);
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 1);
        assert!(cache.is_loaded("1.2.3"));
    }

    #[tokio::test]
    async fn stored_series_are_date_ordered() {
        let (_source, cache) = cache();
        let series = cache.expand("9").await;
        let uids: Vec<&str> = series.iter().map(|s| s.series_instance_uid.as_str()).collect();
        assert_eq!(uids, ["9.1", "9.2"]);
        assert_eq!(cache.cached("9"), Some(series));
    }

    #[tokio::test]
    async fn concurrent_expansions_share_one_fetch() {
        let (source, cache) = cache();
        let (a, b) = tokio::join!(cache.expand("7"), cache.expand("7"));
        assert_eq!(a, b);
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_studies_fetch_independently() {
        let (source, cache) = cache();
        tokio::join!(cache.expand("a"), cache.expand("b"));
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 2);
        let mut loaded = cache.loaded_studies();
        loaded.sort();
        assert_eq!(loaded, ["a", "b"]);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_no_entry_and_allows_retry() {
        let (source, cache) = cache();
        source.failing.store(true, AtomicOrdering::SeqCst);
        assert!(cache.expand("x").await.is_empty());
        assert!(!cache.is_loaded("x"));
        assert_eq!(cache.cached("x"), None);

        source.failing.store(false, AtomicOrdering::SeqCst);
        assert_eq!(cache.expand("x").await.len(), 2);
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_forces_a_refetch() {
        let (source, cache) = cache();
        cache.expand("s").await;
        cache.clear();
        assert!(!cache.is_loaded("s"));
        cache.expand("s").await;
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn undated_series_follow_dated_ones_in_input_order() {
        let sorted = sort_by_series_date(vec![
            dated("u1", None),
            dated("late", Some("20240102")),
            dated("u2", Some("not a date")),
            dated("early", Some("2024.01.01")),
        ]);
        let uids: Vec<&str> = sorted.iter().map(|s| s.series_instance_uid.as_str()).collect();
        assert_eq!(uids, ["early", "late", "u1", "u2"]);
    }
}
