use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::WorklistConfig;
use crate::data_source::DataSource;
use crate::filter_store::FilterStore;
use crate::message::Message;
use crate::model::{FilterValues, Series, SortDirection, Study, StudyRow};
use crate::modes::{launch_targets, LaunchOptions, Mode, ModeLink};
use crate::pagination::{clamp_total, has_next_page, visible_range};
use crate::publisher::{DebouncedPublisher, Navigator};
use crate::query_codec;
use crate::series_cache::SeriesCache;
use crate::session::{SessionMirror, SessionStorage};
use crate::sort::{can_sort, sort_studies, SortField};

/// Collaborators a worklist is mounted against.
pub struct Environment {
    pub data_source: Arc<dyn DataSource>,
    pub session_storage: Arc<dyn SessionStorage>,
    pub navigator: Arc<dyn Navigator>,
}

/// The study list: filter state, its session mirror and URL publisher, the
/// current study collection, expanded rows and their series.
///
/// Dropping the worklist cancels a pending publish. The session entry
/// outlives it so a later mount in the same tab can restore the filters;
/// the host calls [`WorkList::unload`] when the tab itself goes away.
pub struct WorkList {
    config: WorklistConfig,
    store: FilterStore,
    session: SessionMirror,
    publisher: DebouncedPublisher,
    data_source: Arc<dyn DataSource>,
    series_cache: Arc<SeriesCache>,
    studies: Vec<Study>,
    studies_total: usize,
    is_loading: bool,
    expanded_rows: BTreeSet<usize>,
}

impl WorkList {
    /// Hydrates filter state from the current search string (falling back to
    /// the session mirror) and schedules the first publish. Outside a tokio
    /// runtime nothing is published and rows expand without series.
    pub fn mount(config: WorklistConfig, search: &str, environment: Environment) -> Self {
        let defaults = FilterValues::default();
        let session = SessionMirror::new(environment.session_storage, config.session_key.clone());
        let initial = session.hydrate(query_codec::decode_search(search), &defaults);
        let publisher = DebouncedPublisher::new(
            environment.navigator,
            config.pathname.clone(),
            config.debounce(),
        );
        publisher.schedule(&initial);

        Self {
            store: FilterStore::new(initial, defaults),
            session,
            publisher,
            series_cache: Arc::new(SeriesCache::new(Arc::clone(&environment.data_source))),
            data_source: environment.data_source,
            studies: Vec::new(),
            studies_total: 0,
            is_loading: false,
            expanded_rows: BTreeSet::new(),
            config,
        }
    }

    /// Applies one event. Events that need series data return the handle of
    /// the spawned fetch.
    pub fn update(&mut self, message: Message) -> Option<JoinHandle<()>> {
        match message {
            Message::FilterChanged(values) => {
                self.update_filter_values(values);
                None
            }
            Message::ClearFilters => {
                self.update_filter_values(self.store.defaults().clone());
                None
            }
            Message::ChangePage(page_number) => {
                self.change_page(page_number);
                None
            }
            Message::ChangeResultsPerPage(results_per_page) => {
                self.change_results_per_page(results_per_page);
                None
            }
            Message::ToggleRow(row_key) => self.toggle_row(row_key),
            Message::StudiesRequested => {
                self.is_loading = true;
                None
            }
            Message::StudiesLoaded { studies, total } => {
                self.studies = studies;
                self.studies_total = total;
                self.is_loading = false;
                self.fetch_expanded_series()
            }
        }
    }

    /// Asks the data source for the studies matching the current filters.
    /// Failures are logged and leave the previous collection in place.
    pub async fn refresh_studies(&mut self) -> Option<JoinHandle<()>> {
        self.update(Message::StudiesRequested);
        match self.data_source.search_studies(self.store.values()).await {
            Ok(found) => self.update(Message::StudiesLoaded {
                studies: found.studies,
                total: found.total,
            }),
            Err(err) => {
                log::error!("Unable to load studies: {err}");
                self.is_loading = false;
                None
            }
        }
    }

    pub fn update_filter_values(&mut self, next: FilterValues) {
        let values = self.store.update(next);
        self.session.write(values);
        self.publisher.schedule(values);
        self.expanded_rows.clear();
    }

    pub fn reset(&mut self) {
        self.update(Message::ClearFilters);
    }

    /// Moves to another page. Returns false when an advance would start
    /// beyond the addressable results; such requests change nothing.
    pub fn change_page(&mut self, page_number: u32) -> bool {
        let current = self.store.values();
        let old_page = current.page_number;
        let page_number = page_number.max(1);
        if page_number == old_page {
            return false;
        }
        if page_number > old_page
            && !has_next_page(
                old_page,
                current.results_per_page,
                self.studies_total,
                self.config.studies_limit,
            )
        {
            log::debug!("Refusing to advance past page {old_page}");
            return false;
        }

        let next = current.clone().with_page_number(page_number);
        self.update_filter_values(next);
        true
    }

    pub fn change_results_per_page(&mut self, results_per_page: u32) {
        let next = self
            .store
            .values()
            .clone()
            .with_page_number(1)
            .with_results_per_page(results_per_page.max(1));
        self.update_filter_values(next);
    }

    /// Expands or collapses the row at `row_key` (1-based, in sorted order).
    pub fn toggle_row(&mut self, row_key: usize) -> Option<JoinHandle<()>> {
        if self.expanded_rows.remove(&row_key) {
            return None;
        }

        let study_instance_uid = self
            .sorted_studies()
            .get(row_key.checked_sub(1)?)
            .map(|study| study.study_instance_uid.clone());
        let Some(study_instance_uid) = study_instance_uid else {
            log::debug!("Ignoring toggle of unknown row {row_key}");
            return None;
        };

        self.expanded_rows.insert(row_key);
        if self.series_cache.is_loaded(&study_instance_uid) {
            return None;
        }
        self.spawn_series_fetch(vec![study_instance_uid])
    }

    /// Expanded row keys follow positions, not studies: after the collection
    /// changes, fetch series for whatever study each key now points at.
    /// Keys past the end of the new collection are collapsed.
    fn fetch_expanded_series(&mut self) -> Option<JoinHandle<()>> {
        let len = self.studies.len();
        self.expanded_rows.retain(|row_key| *row_key <= len);
        if self.expanded_rows.is_empty() {
            return None;
        }

        let sorted = self.sorted_studies();
        let missing: Vec<String> = self
            .expanded_rows
            .iter()
            .filter_map(|row_key| sorted.get(row_key - 1))
            .map(|study| study.study_instance_uid.clone())
            .filter(|uid| !self.series_cache.is_loaded(uid))
            .collect();
        if missing.is_empty() {
            return None;
        }
        self.spawn_series_fetch(missing)
    }

    fn spawn_series_fetch(&self, study_instance_uids: Vec<String>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("No async runtime; series for {study_instance_uids:?} not fetched");
            return None;
        };

        let cache = Arc::clone(&self.series_cache);
        Some(runtime.spawn(async move {
            let fetches: Vec<JoinHandle<Vec<Series>>> = study_instance_uids
                .into_iter()
                .map(|uid| {
                    let cache = Arc::clone(&cache);
                    tokio::spawn(async move { cache.expand(&uid).await })
                })
                .collect();
            for fetch in fetches {
                if let Err(err) = fetch.await {
                    log::warn!("Series fetch did not complete: {err}");
                }
            }
        }))
    }

    pub fn filter_values(&self) -> &FilterValues {
        self.store.values()
    }

    /// Filter values as the filter header shows them: with no explicit sort
    /// and sorting available, the implicit study-date ordering is surfaced.
    pub fn display_filter_values(&self) -> FilterValues {
        let mut values = self.store.values().clone();
        if values.sort_by.is_empty() && self.can_sort() {
            values.sort_by = SortField::StudyDate.as_str().to_string();
            values.sort_direction = SortDirection::Ascending;
        }
        values
    }

    pub fn is_filtering(&self) -> bool {
        self.store.is_filtering()
    }

    pub fn can_sort(&self) -> bool {
        can_sort(self.studies_total, self.config.studies_limit)
    }

    /// Study count reported for display and paging.
    pub fn displayed_total(&self) -> usize {
        clamp_total(self.studies_total, self.config.studies_limit)
    }

    pub fn is_querying(&self) -> bool {
        self.is_loading || !self.expanded_rows.is_empty()
    }

    pub fn expanded_rows(&self) -> &BTreeSet<usize> {
        &self.expanded_rows
    }

    pub fn series_cache(&self) -> &Arc<SeriesCache> {
        &self.series_cache
    }

    pub fn upload_enabled(&self) -> bool {
        self.data_source.config().dicom_upload_enabled
    }

    pub fn sorted_studies(&self) -> Vec<&Study> {
        sort_studies(
            &self.studies,
            self.store.values(),
            self.studies_total,
            self.config.studies_limit,
        )
    }

    /// The rows of the current page.
    pub fn visible_rows(&self) -> Vec<StudyRow> {
        let values = self.store.values();
        let sorted = self.sorted_studies();
        let range = visible_range(
            values.page_number,
            values.results_per_page,
            sorted.len(),
            self.config.studies_limit,
        );

        sorted[range.clone()]
            .iter()
            .zip(range.start + 1..)
            .map(|(study, row_key)| {
                let is_expanded = self.expanded_rows.contains(&row_key);
                let series = if is_expanded {
                    self.series_cache
                        .cached(&study.study_instance_uid)
                        .unwrap_or_default()
                } else {
                    Vec::new()
                };
                StudyRow::new(row_key, study, is_expanded, &series)
            })
            .collect()
    }

    /// Viewer links for the study shown at `row_key`.
    pub fn launch_targets(&self, modes: &[Box<dyn Mode>], row_key: usize) -> Vec<ModeLink> {
        let sorted = self.sorted_studies();
        let Some(study) = row_key.checked_sub(1).and_then(|index| sorted.get(index)) else {
            return Vec::new();
        };
        let options = LaunchOptions {
            data_path: &self.config.data_path,
            config_url: self.store.values().config_url.as_deref(),
            group_enabled_first: self.config.group_enabled_modes_first,
        };
        launch_targets(modes, study, options)
    }

    /// Waits for the pending location publish, if any.
    pub async fn settled(&self) {
        self.publisher.settled().await;
    }

    /// Tab teardown: drops the pending publish and the mirrored filter state.
    pub fn unload(&self) {
        self.publisher.cancel();
        self.session.clear();
    }
}

impl Drop for WorkList {
    fn drop(&mut self) {
        self.publisher.cancel();
    }
}
