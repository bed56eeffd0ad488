use chrono::NaiveDate;
use proptest::prelude::*;

use worklist::filter_store::FilterStore;
use worklist::pagination::{page_window, STUDIES_LIMIT};
use worklist::query_codec::{decode, decode_search, encode, encode_search};
use worklist::sort::sort_studies;
use worklist::{FilterValues, SortDirection, Study, StudyDateRange};

fn direction() -> impl Strategy<Value = SortDirection> {
    prop_oneof![
        Just(SortDirection::Ascending),
        Just(SortDirection::Descending),
        Just(SortDirection::None),
    ]
}

fn date() -> impl Strategy<Value = Option<NaiveDate>> {
    // Four-digit years only.
    proptest::option::of((365_000i32..3_650_000).prop_filter_map("out of range", |days| {
        NaiveDate::from_num_days_from_ce_opt(days)
    }))
}

fn optional_text() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "\\PC{1,16}"]
}

prop_compose! {
    fn filter_values()(
        patient_name in optional_text(),
        mrn in optional_text(),
        (start_date, end_date) in (date(), date()),
        description in optional_text(),
        modalities in proptest::collection::vec("[A-Z]{2}|SR/KO", 0..4),
        accession in optional_text(),
        (page_number, results_per_page) in (1u32..10_000, 1u32..500),
        sort_by in "[a-zA-Z]{1,12}",
        sort_direction in direction(),
        datasources in optional_text(),
        config_url in proptest::option::of("https://[a-z]{1,8}\\.org/[a-z]{1,8}\\.json"),
    ) -> FilterValues {
        FilterValues {
            patient_name,
            mrn,
            study_date: StudyDateRange { start_date, end_date },
            description,
            modalities,
            accession,
            page_number,
            results_per_page,
            sort_by,
            sort_direction,
            datasources,
            config_url,
        }
    }
}

proptest! {
    #[test]
    fn decoding_an_encoding_restores_the_state(values in filter_values()) {
        prop_assert_eq!(decode(encode(&values)), values.clone());
        prop_assert_eq!(decode_search(&encode_search(&values)), values);
    }

    #[test]
    fn visible_window_never_passes_the_limit(page in 1u32..u32::MAX, rpp in 1u32..100_000) {
        let window = page_window(page, rpp, STUDIES_LIMIT);
        prop_assert!(window.start < window.end);
        prop_assert!(window.end <= STUDIES_LIMIT);
    }

    #[test]
    fn filter_edits_restart_paging(values in filter_values(), mrn in "[0-9]{1,8}") {
        let mut store = FilterStore::new(values.clone(), FilterValues::default());
        let mut next = values.clone();
        next.mrn = mrn;
        prop_assert_eq!(store.update(next).page_number, 1);

        let explicit = values.page_number.saturating_add(1);
        let moved = store.values().clone().with_page_number(explicit);
        prop_assert_eq!(store.update(moved).page_number, explicit);
    }

    #[test]
    fn undated_studies_keep_their_relative_order(
        dates in proptest::collection::vec(proptest::option::of("2024(0[1-9]|1[0-2])(0[1-9]|1[0-9])|bogus"), 0..40),
        direction in direction(),
    ) {
        let studies: Vec<Study> = dates
            .into_iter()
            .enumerate()
            .map(|(index, date)| Study { date, ..Study::new(index.to_string()) })
            .collect();
        let values = FilterValues { sort_direction: direction, ..FilterValues::default() };
        let sorted = sort_studies(&studies, &values, studies.len(), STUDIES_LIMIT);

        prop_assert_eq!(sorted.len(), studies.len());
        let undated: Vec<usize> = sorted
            .iter()
            .filter(|study| study.date.as_deref().map_or(true, |date| date == "bogus"))
            .map(|study| study.study_instance_uid.parse().unwrap())
            .collect();
        prop_assert!(undated.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
