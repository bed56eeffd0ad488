pub mod dates;
pub mod formatting;

pub use dates::{parse_filter_date, parse_study_date, parse_study_time};
pub use formatting::{format_study_date, format_study_time, modalities_for_mode_check, truncate_cell};
