//! Client-side ordering of the study collection.
//!
//! Sorting only runs while the upstream total stays below the studies
//! limit; past it the collection is shown in source order and paging is
//! left to the server. All orderings are stable.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::model::{FilterValues, SortDirection, Study};
use crate::utils::parse_study_date;

/// Columns a study list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    PatientName,
    Mrn,
    StudyDate,
    Description,
    Modalities,
    Accession,
    Instances,
}

enum FieldValue<'a> {
    Text(Option<Cow<'a, str>>),
    Number(Option<u32>),
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::PatientName,
        SortField::Mrn,
        SortField::StudyDate,
        SortField::Description,
        SortField::Modalities,
        SortField::Accession,
        SortField::Instances,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PatientName => "patientName",
            Self::Mrn => "mrn",
            Self::StudyDate => "studyDate",
            Self::Description => "description",
            Self::Modalities => "modalities",
            Self::Accession => "accession",
            Self::Instances => "instances",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
    }

    fn value(self, study: &Study) -> FieldValue<'_> {
        match self {
            Self::PatientName => text(&study.patient_name),
            Self::Mrn => text(&study.mrn),
            Self::Description => text(&study.description),
            Self::Accession => text(&study.accession),
            Self::StudyDate => text(&study.date),
            Self::Modalities => FieldValue::Text(
                (!study.modalities.is_empty()).then(|| Cow::Owned(study.modalities.join(","))),
            ),
            Self::Instances => FieldValue::Number(study.instances),
        }
    }
}

fn text(value: &Option<String>) -> FieldValue<'_> {
    FieldValue::Text(value.as_deref().map(Cow::Borrowed))
}

/// How a given filter state orders the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPlan {
    /// Too many studies upstream; keep source order.
    Disabled,
    /// No explicit field chosen: by study date under the `ascending` label.
    DefaultDate,
    Field(SortField, SortDirection),
    /// A field name nothing maps to; every pair compares equal.
    Unknown,
}

pub fn can_sort(total: usize, limit: usize) -> bool {
    total < limit
}

pub fn plan(values: &FilterValues, total: usize, limit: usize) -> SortPlan {
    if !can_sort(total, limit) {
        return SortPlan::Disabled;
    }
    if values.sort_by.is_empty() {
        return SortPlan::DefaultDate;
    }
    match SortField::parse(&values.sort_by) {
        Some(field) => SortPlan::Field(field, values.sort_direction),
        None => SortPlan::Unknown,
    }
}

pub fn sort_studies<'a>(
    studies: &'a [Study],
    values: &FilterValues,
    total: usize,
    limit: usize,
) -> Vec<&'a Study> {
    let mut sorted: Vec<&Study> = studies.iter().collect();
    match plan(values, total, limit) {
        SortPlan::Disabled | SortPlan::Unknown => {}
        SortPlan::DefaultDate => sorted.sort_by(|a, b| {
            SortDirection::Ascending.apply(compare_dates(a.date.as_deref(), b.date.as_deref()))
        }),
        SortPlan::Field(field, direction) => {
            sorted.sort_by(|a, b| compare_by_field(field, direction, a, b));
        }
    }
    sorted
}

pub fn compare_by_field(field: SortField, direction: SortDirection, a: &Study, b: &Study) -> Ordering {
    if field == SortField::StudyDate {
        return direction.apply(compare_dates(a.date.as_deref(), b.date.as_deref()));
    }

    match (field.value(a), field.value(b)) {
        (FieldValue::Text(a), FieldValue::Text(b)) => {
            present_first(a.as_deref(), b.as_deref(), |a, b| direction.apply(locale_compare(a, b)))
        }
        (FieldValue::Number(a), FieldValue::Number(b)) => {
            present_first(a, b, |a, b| direction.apply(a.cmp(&b)))
        }
        _ => Ordering::Equal,
    }
}

/// Raw date comparator before the direction is applied: two valid dates in
/// calendar order, a valid date after an invalid one, two invalid dates
/// equal. Under the `ascending` label this puts the newest study first and
/// undated studies last.
pub fn compare_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.and_then(parse_study_date);
    let b = b.and_then(parse_study_date);
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive ordering; among case variants lowercase comes first.
/// Accented letters are not folded and order by code point.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    let case_key = |c: char| (c.is_uppercase(), c);
    folded.then_with(|| a.chars().map(case_key).cmp(b.chars().map(case_key)))
}

// Missing values go last whatever the direction.
fn present_first<T>(a: Option<T>, b: Option<T>, compare: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
