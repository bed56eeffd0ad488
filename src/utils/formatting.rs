use super::dates::{parse_study_date, parse_study_time};

const MAX_VALUE_LEN: usize = 120;
const DATE_DISPLAY_FORMAT: &str = "%b-%d-%Y";
const TIME_DISPLAY_FORMAT: &str = "%I:%M %p";

/// Renders a study date as `MMM-DD-YYYY`, or `None` when the raw value is
/// not a strictly valid DICOM date.
pub fn format_study_date(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_study_date)
        .map(|date| date.format(DATE_DISPLAY_FORMAT).to_string())
}

/// Renders a study time as `hh:mm AM`.
pub fn format_study_time(raw: Option<&str>) -> Option<String> {
    raw.and_then(parse_study_time)
        .map(|time| time.format(TIME_DISPLAY_FORMAT).to_string())
}

pub fn truncate_cell(value: &str) -> String {
    if value.chars().count() > MAX_VALUE_LEN {
        let mut truncated = value.chars().take(MAX_VALUE_LEN).collect::<String>();
        truncated.push('…');
        truncated
    } else {
        value.to_string()
    }
}

/// Joins modality codes for mode validity checks; `/` is not a legal
/// separator there, so it becomes the DICOM multi-value backslash.
pub fn modalities_for_mode_check(modalities: &[String]) -> String {
    modalities.join(",").replace('/', "\\")
}
