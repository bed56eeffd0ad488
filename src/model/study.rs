use serde::{Deserialize, Serialize};

/// One exam record as supplied by a data source. Read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub study_instance_uid: String,
    pub patient_name: Option<String>,
    pub mrn: Option<String>,
    pub accession: Option<String>,
    pub description: Option<String>,
    pub modalities: Vec<String>,
    pub instances: Option<u32>,
    /// Raw DICOM date (`YYYYMMDD` or `YYYY.MM.DD`), loosely validated.
    pub date: Option<String>,
    /// Raw DICOM time (`HHmmss.SSS` and shorter).
    pub time: Option<String>,
}

/// A child record of a study, shown when the study row is expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub series_instance_uid: String,
    pub description: Option<String>,
    pub series_number: Option<i32>,
    pub modality: Option<String>,
    pub num_series_instances: Option<u32>,
    pub series_date: Option<String>,
    pub series_time: Option<String>,
}

impl Study {
    pub fn new(study_instance_uid: impl Into<String>) -> Self {
        Self {
            study_instance_uid: study_instance_uid.into(),
            ..Default::default()
        }
    }
}

impl Series {
    pub fn new(series_instance_uid: impl Into<String>) -> Self {
        Self {
            series_instance_uid: series_instance_uid.into(),
            ..Default::default()
        }
    }
}
