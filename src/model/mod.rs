pub mod filter_values;
pub mod loader;
pub mod row;
pub mod study;

pub use filter_values::{FilterValues, SortDirection, StudyDateRange};
pub use loader::{DicomCatalog, InstanceRecord};
pub use row::{SeriesRow, StudyRow};
pub use study::{Series, Study};
