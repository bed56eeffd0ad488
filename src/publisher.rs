//! Debounced publication of filter state into the navigable location.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::model::FilterValues;
use crate::query_codec;

/// A navigable location: path plus optional search string (with `?`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: Option<String>,
}

impl Location {
    pub fn new(pathname: impl Into<String>, search: &str) -> Self {
        Self {
            pathname: pathname.into(),
            search: (!search.is_empty()).then(|| format!("?{search}")),
        }
    }

    pub fn href(&self) -> String {
        match &self.search {
            Some(search) => format!("{}{search}", self.pathname),
            None => self.pathname.clone(),
        }
    }
}

/// History seam. `replace` swaps the current entry instead of pushing one.
pub trait Navigator: Send + Sync {
    fn replace(&self, location: Location);
}

/// Records every replacement; the last one is the current location.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    replaced: Mutex<Vec<Location>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Location> {
        self.replaced.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<Location> {
        self.replaced.lock().clone()
    }
}

impl Navigator for MemoryNavigator {
    fn replace(&self, location: Location) {
        self.replaced.lock().push(location);
    }
}

/// Publishes the latest filter state once no change has arrived for the
/// quiet interval. Each schedule bumps a generation counter; a timer whose
/// generation is stale when it fires does nothing.
pub struct DebouncedPublisher {
    navigator: Arc<dyn Navigator>,
    pathname: String,
    quiet: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedPublisher {
    pub fn new(navigator: Arc<dyn Navigator>, pathname: impl Into<String>, quiet: Duration) -> Self {
        Self {
            navigator,
            pathname: pathname.into(),
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Outside a tokio runtime the publish is dropped with a warning.
    pub fn schedule(&self, values: &FilterValues) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let location = Location::new(self.pathname.clone(), &query_codec::encode_search(values));
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("No async runtime; location {} not published", location.href());
            if let Some(previous) = self.pending.lock().take() {
                previous.abort();
            }
            return;
        };

        let navigator = Arc::clone(&self.navigator);
        let latest = Arc::clone(&self.generation);
        let quiet = self.quiet;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(quiet).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }
            log::debug!("Publishing worklist location {}", location.href());
            navigator.replace(location);
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drops any pending publish without firing it.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits until the most recently scheduled publish has fired or been
    /// superseded.
    pub async fn settled(&self) {
        let pending = self.pending.lock().take();
        if let Some(handle) = pending {
            // An aborted timer is a superseded publish, not a failure.
            let _ = handle.await;
        }
    }
}

impl Drop for DebouncedPublisher {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(200);

    fn publisher() -> (Arc<MemoryNavigator>, DebouncedPublisher) {
        let navigator = Arc::new(MemoryNavigator::new());
        let publisher = DebouncedPublisher::new(navigator.clone(), "/", QUIET);
        (navigator, publisher)
    }

    fn named(name: &str) -> FilterValues {
        FilterValues {
            patient_name: name.to_string(),
            ..FilterValues::default()
        }
    }

    #[test]
    fn location_without_search_has_no_question_mark() {
        assert_eq!(Location::new("/", "").href(), "/");
        assert_eq!(Location::new("/", "mrn=1").href(), "/?mrn=1");
    }

    #[test]
    fn scheduling_outside_a_runtime_publishes_nothing() {
        let (navigator, publisher) = publisher();
        publisher.schedule(&named("D"));
        assert!(!publisher.is_pending());
        assert!(navigator.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_published_inside_the_quiet_interval() {
        let (navigator, publisher) = publisher();
        publisher.schedule(&named("D"));
        tokio::time::sleep(QUIET / 2).await;
        assert!(navigator.history().is_empty());
        assert!(publisher.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn bursts_publish_only_the_last_state() {
        let (navigator, publisher) = publisher();
        for name in ["D", "Do", "Doe"] {
            publisher.schedule(&named(name));
            tokio::time::sleep(QUIET / 4).await;
        }
        publisher.settled().await;

        let history = navigator.history();
        assert_eq!(history.len(), 1);
        let search = history[0].search.as_deref().unwrap_or_default();
        assert!(search.contains("patientName=Doe"));
        assert!(!search.contains("patientName=Do&"));
    }

    #[tokio::test(start_paused = true)]
    async fn change_after_a_publish_starts_a_new_cycle() {
        let (navigator, publisher) = publisher();
        publisher.schedule(&named("Doe"));
        publisher.settled().await;
        publisher.schedule(&named("Roe"));
        publisher.settled().await;

        let history = navigator.history();
        assert_eq!(history.len(), 2);
        assert!(history[1].href().contains("patientName=Roe"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_the_pending_publish() {
        let (navigator, publisher) = publisher();
        publisher.schedule(&named("Doe"));
        publisher.cancel();
        tokio::time::sleep(QUIET * 2).await;
        assert!(navigator.history().is_empty());
        assert!(!publisher.is_pending());
    }
}
