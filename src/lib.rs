//! Filter, sort, pagination and session-sync engine behind a DICOM study
//! worklist.

pub mod app;
pub mod config;
pub mod data_source;
pub mod error;
pub mod filter_store;
pub mod message;
pub mod model;
pub mod modes;
pub mod pagination;
pub mod publisher;
pub mod query_codec;
pub mod series_cache;
pub mod session;
pub mod sort;
pub mod utils;

pub use app::{Environment, WorkList};
pub use config::WorklistConfig;
pub use data_source::{DataSource, DataSourceConfig, StudySearch};
pub use error::{Result, WorklistError};
pub use message::Message;
pub use model::{FilterValues, Series, SortDirection, Study, StudyDateRange};
