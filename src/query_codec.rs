//! Mapping between URL query parameters and [`FilterValues`].
//!
//! Decoding matches parameter names case-insensitively and never fails:
//! anything absent or unparsable falls back to the supplied defaults.
//! Encoding omits empty strings, empty lists and unset values, and emits
//! keys in sorted order so the resulting search string is stable.

use std::collections::{BTreeMap, HashMap};

use url::form_urlencoded;

use crate::model::{FilterValues, SortDirection, StudyDateRange};
use crate::utils::parse_filter_date;

pub type QueryParams = BTreeMap<String, String>;

const MODALITY_SEPARATOR: char = ',';
const DATE_PARAM_FORMAT: &str = "%Y-%m-%d";

pub fn decode<I, K, V>(params: I) -> FilterValues
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    decode_with_defaults(params, &FilterValues::default())
}

pub fn decode_with_defaults<I, K, V>(params: I, defaults: &FilterValues) -> FilterValues
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    // Later duplicates win, whatever their casing.
    let params: HashMap<String, String> = params
        .into_iter()
        .map(|(key, value)| (key.as_ref().to_lowercase(), value.as_ref().to_string()))
        .collect();
    let text = |name: &str| {
        params
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    };
    let text_or = |name: &str, default: &String| text(name).map_or_else(|| default.clone(), str::to_string);

    FilterValues {
        patient_name: text_or("patientname", &defaults.patient_name),
        mrn: text_or("mrn", &defaults.mrn),
        study_date: StudyDateRange {
            start_date: text("startdate")
                .and_then(parse_filter_date)
                .or(defaults.study_date.start_date),
            end_date: text("enddate")
                .and_then(parse_filter_date)
                .or(defaults.study_date.end_date),
        },
        description: text_or("description", &defaults.description),
        modalities: text("modalities")
            .map(split_modalities)
            .unwrap_or_else(|| defaults.modalities.clone()),
        accession: text_or("accession", &defaults.accession),
        page_number: parse_count(text("pagenumber"), defaults.page_number),
        results_per_page: parse_count(text("resultsperpage"), defaults.results_per_page),
        sort_by: text_or("sortby", &defaults.sort_by),
        sort_direction: text("sortdirection")
            .and_then(SortDirection::parse)
            .unwrap_or(defaults.sort_direction),
        datasources: text_or("datasources", &defaults.datasources),
        config_url: text("configurl")
            .map(str::to_string)
            .or_else(|| defaults.config_url.clone()),
    }
}

pub fn encode(values: &FilterValues) -> QueryParams {
    let mut params = QueryParams::new();
    let mut put = |key: &str, value: String| {
        if !value.is_empty() {
            params.insert(key.to_string(), value);
        }
    };

    put("patientName", values.patient_name.clone());
    put("mrn", values.mrn.clone());
    if let Some(start) = values.study_date.start_date {
        put("startDate", start.format(DATE_PARAM_FORMAT).to_string());
    }
    if let Some(end) = values.study_date.end_date {
        put("endDate", end.format(DATE_PARAM_FORMAT).to_string());
    }
    put("description", values.description.clone());
    put("modalities", values.modalities.join(","));
    put("accession", values.accession.clone());
    if values.page_number > 0 {
        put("pageNumber", values.page_number.to_string());
    }
    if values.results_per_page > 0 {
        put("resultsPerPage", values.results_per_page.to_string());
    }
    put("sortBy", values.sort_by.clone());
    put("sortDirection", values.sort_direction.as_str().to_string());
    put("datasources", values.datasources.clone());
    if let Some(config_url) = &values.config_url {
        put("configUrl", config_url.clone());
    }

    params
}

/// Splits a raw search string (with or without the leading `?`) into pairs.
pub fn parse_search(search: &str) -> Vec<(String, String)> {
    let search = search.strip_prefix('?').unwrap_or(search);
    form_urlencoded::parse(search.as_bytes())
        .into_owned()
        .collect()
}

pub fn to_search(params: &QueryParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

pub fn decode_search(search: &str) -> FilterValues {
    decode(parse_search(search))
}

pub fn encode_search(values: &FilterValues) -> String {
    to_search(&encode(values))
}

fn split_modalities(raw: &str) -> Vec<String> {
    raw.split(MODALITY_SEPARATOR)
        .filter(|modality| !modality.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_count(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(leading_integer)
        .filter(|value| *value >= 1)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(default)
}

/// The integer spelled by the leading digits, after optional whitespace and
/// sign. `"3.7"` and `"3e2"` both read as 3.
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let value: i64 = unsigned[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn decodes_mixed_case_names_and_defaults_the_rest() {
        let values = decode_search("?patientname=Doe&modalities=CT,MR&sortdirection=ascending");
        let expected = FilterValues {
            patient_name: "Doe".to_string(),
            modalities: vec!["CT".to_string(), "MR".to_string()],
            sort_direction: SortDirection::Ascending,
            ..FilterValues::default()
        };
        assert_eq!(values, expected);

        let shouting = decode([("PATIENTNAME", "Roe"), ("ResultsPerPage", "50")]);
        assert_eq!(shouting.patient_name, "Roe");
        assert_eq!(shouting.results_per_page, 50);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let values = decode([("pagenumber", "two"), ("resultsperpage", "0")]);
        assert_eq!(values.page_number, 1);
        assert_eq!(values.results_per_page, 25);

        let values = decode([("pagenumber", "3.7"), ("resultsperpage", "-5")]);
        assert_eq!(values.page_number, 3);
        assert_eq!(values.results_per_page, 25);
    }

    #[test]
    fn counts_read_only_their_leading_digits() {
        let values = decode([("pagenumber", "1e3"), ("resultsperpage", " 50rows")]);
        assert_eq!(values.page_number, 1);
        assert_eq!(values.results_per_page, 50);

        let values = decode([("pagenumber", "99999999999"), ("resultsperpage", "+10")]);
        assert_eq!(values.page_number, 1);
        assert_eq!(values.results_per_page, 10);
    }

    #[test]
    fn caller_defaults_fill_absent_fields() {
        let defaults = FilterValues {
            results_per_page: 50,
            config_url: Some("https://example.org/app.json".to_string()),
            ..FilterValues::default()
        };
        let values = decode_with_defaults([("mrn", "42")], &defaults);
        assert_eq!(values.mrn, "42");
        assert_eq!(values.results_per_page, 50);
        assert_eq!(values.config_url, defaults.config_url);
    }

    #[test]
    fn unknown_sort_direction_means_descending() {
        let values = decode([("sortdirection", "sideways")]);
        assert_eq!(values.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn absent_config_url_stays_unset() {
        assert_eq!(decode_search("").config_url, None);
        assert_eq!(decode_search("configUrl=").config_url, None);
    }

    #[test]
    fn encode_omits_empty_fields() {
        let params = encode(&FilterValues::default());
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["pageNumber", "resultsPerPage", "sortBy", "sortDirection"]
        );
    }

    #[test]
    fn encode_splits_date_range_and_joins_modalities() {
        let values = FilterValues {
            study_date: StudyDateRange {
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                end_date: None,
            },
            modalities: vec!["CT".to_string(), "PT".to_string()],
            ..FilterValues::default()
        };
        let params = encode(&values);
        assert_eq!(params.get("startDate").map(String::as_str), Some("2024-03-01"));
        assert!(!params.contains_key("endDate"));
        assert_eq!(params.get("modalities").map(String::as_str), Some("CT,PT"));
    }

    #[test]
    fn search_string_survives_a_round_trip() {
        let values = FilterValues {
            patient_name: "Doe^Jane & co".to_string(),
            description: "CT HEAD W/O".to_string(),
            modalities: vec!["CT".to_string()],
            page_number: 4,
            config_url: Some("https://example.org/config.json?x=1".to_string()),
            ..FilterValues::default()
        };
        let search = encode_search(&values);
        assert!(search.starts_with("configUrl="));
        assert_eq!(decode_search(&search), values);
    }
}
