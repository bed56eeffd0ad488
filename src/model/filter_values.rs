use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_NUMBER: u32 = 1;
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 25;
pub const DEFAULT_SORT_BY: &str = "studyDate";

/// Requested sort direction.
///
/// `Descending` is the stored positive baseline: comparator results are used
/// as-is for it and reversed for the other two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
    None,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
            Self::None => "none",
        }
    }

    /// Case-insensitive parse of the three accepted labels.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Descending => ordering,
            Self::Ascending | Self::None => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StudyDateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }

    pub fn is_open(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }
}

/// The canonical filter/sort/page state of the worklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterValues {
    pub patient_name: String,
    pub mrn: String,
    pub study_date: StudyDateRange,
    pub description: String,
    pub modalities: Vec<String>,
    pub accession: String,
    pub page_number: u32,
    pub results_per_page: u32,
    pub sort_by: String,
    pub sort_direction: SortDirection,
    pub datasources: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_url: Option<String>,
}

impl Default for FilterValues {
    fn default() -> Self {
        Self {
            patient_name: String::new(),
            mrn: String::new(),
            study_date: StudyDateRange::default(),
            description: String::new(),
            modalities: Vec::new(),
            accession: String::new(),
            page_number: DEFAULT_PAGE_NUMBER,
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_direction: SortDirection::default(),
            datasources: String::new(),
            config_url: None,
        }
    }
}

impl FilterValues {
    pub fn with_page_number(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }

    pub fn with_results_per_page(mut self, results_per_page: u32) -> Self {
        self.results_per_page = results_per_page;
        self
    }
}
