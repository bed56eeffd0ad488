use super::{Series, Study};
use crate::utils::{format_study_date, format_study_time};

const EMPTY_DESCRIPTION: &str = "(empty)";

/// One rendered line of the study list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyRow {
    /// 1-based position in the sorted collection; the expansion key.
    pub row_key: usize,
    pub study_instance_uid: String,
    pub patient_name: Option<String>,
    pub mrn: Option<String>,
    pub study_date: Option<String>,
    pub study_time: Option<String>,
    pub description: Option<String>,
    pub modalities: Vec<String>,
    pub accession: Option<String>,
    pub instances: u32,
    pub is_expanded: bool,
    pub series: Vec<SeriesRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    pub description: String,
    pub series_number: String,
    pub modality: String,
    pub instances: String,
}

impl StudyRow {
    pub fn new(row_key: usize, study: &Study, is_expanded: bool, series: &[Series]) -> Self {
        Self {
            row_key,
            study_instance_uid: study.study_instance_uid.clone(),
            patient_name: study.patient_name.clone(),
            mrn: study.mrn.clone(),
            study_date: format_study_date(study.date.as_deref()),
            study_time: format_study_time(study.time.as_deref()),
            description: study.description.clone(),
            modalities: study.modalities.clone(),
            accession: study.accession.clone(),
            instances: study.instances.unwrap_or(0),
            is_expanded,
            series: if is_expanded {
                series.iter().map(SeriesRow::from).collect()
            } else {
                Vec::new()
            },
        }
    }
}

impl From<&Series> for SeriesRow {
    fn from(series: &Series) -> Self {
        Self {
            description: series
                .description
                .clone()
                .filter(|description| !description.is_empty())
                .unwrap_or_else(|| EMPTY_DESCRIPTION.to_string()),
            series_number: series
                .series_number
                .map(|number| number.to_string())
                .unwrap_or_default(),
            modality: series.modality.clone().unwrap_or_default(),
            instances: series
                .num_series_instances
                .filter(|count| *count > 0)
                .map(|count| count.to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_cells_fall_back_to_placeholders() {
        let row = SeriesRow::from(&Series::new("1.2"));
        assert_eq!(row.description, "(empty)");
        assert_eq!(row.series_number, "");
        assert_eq!(row.modality, "");
        assert_eq!(row.instances, "");
    }

    #[test]
    fn collapsed_rows_carry_no_series() {
        let study = Study {
            date: Some("20240305".to_string()),
            time: Some("0830".to_string()),
            ..Study::new("9")
        };
        let series = [Series::new("9.1")];
        let collapsed = StudyRow::new(1, &study, false, &series);
        assert!(collapsed.series.is_empty());
        assert_eq!(collapsed.study_date.as_deref(), Some("Mar-05-2024"));
        assert_eq!(collapsed.study_time.as_deref(), Some("08:30 AM"));

        let expanded = StudyRow::new(1, &study, true, &series);
        assert_eq!(expanded.series.len(), 1);
    }
}
