use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use dicom::object::{open_file, DefaultDicomObject};
use walkdir::WalkDir;

use super::{FilterValues, Series, Study};
use crate::data_source::{DataSource, DataSourceConfig, StudySearch};
use crate::error::{Result, WorklistError};
use crate::utils::parse_study_date;

/// The attributes of one DICOM instance the worklist cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceRecord {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub accession_number: Option<String>,
    pub study_description: Option<String>,
    pub study_date: Option<String>,
    pub study_time: Option<String>,
    pub study_instance_uid: Option<String>,
    pub series_instance_uid: Option<String>,
    pub series_description: Option<String>,
    pub series_number: Option<String>,
    pub modality: Option<String>,
    pub series_date: Option<String>,
    pub series_time: Option<String>,
}

pub fn load_instance(path: &Path) -> Result<InstanceRecord> {
    log::info!("Loading DICOM file: {}", path.display());
    let object = open_file(path).map_err(|err| WorklistError::Dicom {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    Ok(InstanceRecord {
        patient_name: attribute_text(&object, "PatientName"),
        patient_id: attribute_text(&object, "PatientID"),
        accession_number: attribute_text(&object, "AccessionNumber"),
        study_description: attribute_text(&object, "StudyDescription"),
        study_date: attribute_text(&object, "StudyDate"),
        study_time: attribute_text(&object, "StudyTime"),
        study_instance_uid: attribute_text(&object, "StudyInstanceUID"),
        series_instance_uid: attribute_text(&object, "SeriesInstanceUID"),
        series_description: attribute_text(&object, "SeriesDescription"),
        series_number: attribute_text(&object, "SeriesNumber"),
        modality: attribute_text(&object, "Modality"),
        series_date: attribute_text(&object, "SeriesDate"),
        series_time: attribute_text(&object, "SeriesTime"),
    })
}

fn attribute_text(object: &DefaultDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// In-memory study/series index built from DICOM instances on disk.
#[derive(Debug, Clone, Default)]
pub struct DicomCatalog {
    studies: Vec<Study>,
    series: HashMap<String, Vec<Series>>,
    config: DataSourceConfig,
}

impl DicomCatalog {
    /// Recursively loads every readable DICOM file under `root`. Files that
    /// fail to open are logged and skipped.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )
            .into());
        }

        let mut instances = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Skipping unreadable path: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match load_instance(entry.path()) {
                Ok(instance) => instances.push(instance),
                Err(err) => log::error!("{err}"),
            }
        }

        let catalog = Self::from_instances(instances);
        log::info!(
            "Catalogued {} studies from {}",
            catalog.studies.len(),
            root.display()
        );
        Ok(catalog)
    }

    /// Groups instances into studies and series, in first-seen order.
    pub fn from_instances(instances: impl IntoIterator<Item = InstanceRecord>) -> Self {
        let mut studies: Vec<Study> = Vec::new();
        let mut study_index: HashMap<String, usize> = HashMap::new();
        let mut series: HashMap<String, Vec<Series>> = HashMap::new();

        for instance in instances {
            let Some(study_uid) = instance.study_instance_uid.clone() else {
                log::warn!("Skipping instance without StudyInstanceUID");
                continue;
            };

            let index = *study_index.entry(study_uid.clone()).or_insert_with(|| {
                studies.push(Study {
                    patient_name: instance.patient_name.clone(),
                    mrn: instance.patient_id.clone(),
                    accession: instance.accession_number.clone(),
                    description: instance.study_description.clone(),
                    date: instance.study_date.clone(),
                    time: instance.study_time.clone(),
                    instances: Some(0),
                    ..Study::new(study_uid.clone())
                });
                studies.len() - 1
            });

            let study = &mut studies[index];
            study.instances = Some(study.instances.unwrap_or(0) + 1);
            if let Some(modality) = &instance.modality {
                if !study.modalities.contains(modality) {
                    study.modalities.push(modality.clone());
                }
            }

            let Some(series_uid) = instance.series_instance_uid.clone() else {
                continue;
            };
            let study_series = series.entry(study_uid).or_default();
            match study_series
                .iter_mut()
                .find(|existing| existing.series_instance_uid == series_uid)
            {
                Some(existing) => {
                    existing.num_series_instances =
                        Some(existing.num_series_instances.unwrap_or(0) + 1);
                }
                None => study_series.push(Series {
                    description: instance.series_description.clone(),
                    series_number: instance
                        .series_number
                        .as_deref()
                        .and_then(|number| number.trim().parse().ok()),
                    modality: instance.modality.clone(),
                    num_series_instances: Some(1),
                    series_date: instance.series_date.clone(),
                    series_time: instance.series_time.clone(),
                    ..Series::new(series_uid)
                }),
            }
        }

        Self {
            studies,
            series,
            config: DataSourceConfig::default(),
        }
    }

    pub fn studies(&self) -> &[Study] {
        &self.studies
    }

    pub fn matching(&self, filter: &FilterValues) -> Vec<Study> {
        self.studies
            .iter()
            .filter(|study| study_matches(study, filter))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DataSource for DicomCatalog {
    async fn search_studies(&self, filter: &FilterValues) -> Result<StudySearch> {
        let studies = self.matching(filter);
        let total = studies.len();
        Ok(StudySearch { studies, total })
    }

    async fn search_series(&self, study_instance_uid: &str) -> Result<Vec<Series>> {
        self.series
            .get(study_instance_uid)
            .cloned()
            .ok_or_else(|| WorklistError::StudyNotFound {
                study_instance_uid: study_instance_uid.to_string(),
            })
    }

    fn config(&self) -> DataSourceConfig {
        self.config
    }
}

fn study_matches(study: &Study, filter: &FilterValues) -> bool {
    let contains = |value: &Option<String>, needle: &str| {
        needle.is_empty()
            || value
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
    };

    let modality_ok = filter.modalities.is_empty()
        || filter.modalities.iter().any(|wanted| {
            study
                .modalities
                .iter()
                .any(|modality| modality.eq_ignore_ascii_case(wanted))
        });

    let date_ok = filter.study_date.is_open()
        || study
            .date
            .as_deref()
            .and_then(parse_study_date)
            .is_some_and(|date| filter.study_date.contains(date));

    contains(&study.patient_name, &filter.patient_name)
        && contains(&study.mrn, &filter.mrn)
        && contains(&study.accession, &filter.accession)
        && contains(&study.description, &filter.description)
        && modality_ok
        && date_ok
}
