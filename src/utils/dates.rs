use chrono::{NaiveDate, NaiveTime};

/// Parses a DICOM-style date string, accepting only `YYYYMMDD` or
/// `YYYY.MM.DD`. Anything else, including trailing characters or an
/// impossible calendar date, is rejected.
pub fn parse_study_date(value: &str) -> Option<NaiveDate> {
    if !value.is_ascii() {
        return None;
    }
    let bytes = value.as_bytes();
    let (year, month, day) = match bytes.len() {
        8 => (&value[0..4], &value[4..6], &value[6..8]),
        10 if bytes[4] == b'.' && bytes[7] == b'.' => (&value[0..4], &value[5..7], &value[8..10]),
        _ => return None,
    };

    let year = digits(year)?;
    let month = digits(month)?;
    let day = digits(day)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// Parses a DICOM-style time string (`HH`, `HHmm`, `HHmmss`, optionally
/// followed by a fractional part after `.`).
pub fn parse_study_time(value: &str) -> Option<NaiveTime> {
    if !value.is_ascii() {
        return None;
    }
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    if fraction.is_some() && whole.len() != 6 {
        return None;
    }

    let (hour, minute, second) = match whole.len() {
        2 => (digits(whole)?, 0, 0),
        4 => (digits(&whole[0..2])?, digits(&whole[2..4])?, 0),
        6 => (
            digits(&whole[0..2])?,
            digits(&whole[2..4])?,
            digits(&whole[4..6])?,
        ),
        _ => return None,
    };

    let nanos = match fraction {
        Some(fraction) => fraction_nanos(fraction)?,
        None => 0,
    };

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

/// Parses a filter date bound. Calendar widgets hand back ISO `YYYY-MM-DD`;
/// the DICOM forms are accepted as well so hand-edited URLs still work.
pub fn parse_filter_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .filter(|_| value.len() == 10)
        .or_else(|| parse_study_date(value))
}

fn digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn fraction_nanos(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || fraction.len() > 9 {
        return None;
    }
    let value = digits(fraction)?;
    Some(value * 10u32.pow(9 - fraction.len() as u32))
}
