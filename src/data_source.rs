use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FilterValues, Series, Study};

/// Capabilities a backend advertises to the hosting view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataSourceConfig {
    pub dicom_upload_enabled: bool,
}

/// Studies matching a filter, plus how many exist upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudySearch {
    pub studies: Vec<Study>,
    pub total: usize,
}

/// Backend the worklist reads studies and series from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn search_studies(&self, filter: &FilterValues) -> Result<StudySearch>;

    async fn search_series(&self, study_instance_uid: &str) -> Result<Vec<Series>>;

    fn config(&self) -> DataSourceConfig {
        DataSourceConfig::default()
    }
}
