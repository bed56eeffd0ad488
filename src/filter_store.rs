use crate::model::FilterValues;

/// Holds the current [`FilterValues`] and the defaults they are measured
/// against. All mutation goes through [`FilterStore::update`].
#[derive(Debug, Clone)]
pub struct FilterStore {
    current: FilterValues,
    defaults: FilterValues,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterValues::default(), FilterValues::default())
    }
}

impl FilterStore {
    pub fn new(initial: FilterValues, defaults: FilterValues) -> Self {
        Self {
            current: initial,
            defaults,
        }
    }

    pub fn values(&self) -> &FilterValues {
        &self.current
    }

    pub fn defaults(&self) -> &FilterValues {
        &self.defaults
    }

    /// Replaces the current state.
    ///
    /// A caller that leaves `page_number` untouched is editing a filter, so
    /// paging restarts at 1. Only an explicit page change keeps its page.
    pub fn update(&mut self, mut next: FilterValues) -> &FilterValues {
        if next.page_number == self.current.page_number {
            next.page_number = 1;
        }
        self.current = next;
        &self.current
    }

    pub fn reset(&mut self) -> &FilterValues {
        self.update(self.defaults.clone())
    }

    /// True when the current state differs from the defaults in any field.
    pub fn is_filtering(&self) -> bool {
        self.current != self.defaults
    }
}
