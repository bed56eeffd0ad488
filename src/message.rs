use crate::model::{FilterValues, Study};

/// Events the worklist reacts to, dispatched through `WorkList::update`.
#[derive(Debug, Clone)]
pub enum Message {
    FilterChanged(FilterValues),
    ClearFilters,
    ChangePage(u32),
    ChangeResultsPerPage(u32),
    ToggleRow(usize),
    StudiesRequested,
    StudiesLoaded { studies: Vec<Study>, total: usize },
}
