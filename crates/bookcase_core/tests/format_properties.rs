use bookcase_core::{join_values, split_values, FieldFormatter};
use proptest::prelude::*;

fn clean_entry() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]([A-Za-z0-9 ,]{0,8}[A-Za-z0-9])?"
}

fn assert_clean_commas(out: &str) -> Result<(), TestCaseError> {
    prop_assert!(!out.contains("  "), "double space in `{}`", out);
    prop_assert!(out.trim() == out, "untrimmed `{}`", out);
    for (idx, _) in out.match_indices(',') {
        let rest = &out[idx + 1..];
        prop_assert!(
            rest.starts_with(' ') && !rest.starts_with("  "),
            "bad comma spacing in `{}`",
            out
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn split_recovers_joined_entries(entries in prop::collection::vec(clean_entry(), 1..6)) {
        let joined = join_values(&entries);
        prop_assert_eq!(split_values(&joined), entries);
    }

    #[test]
    fn title_formatting_is_stable(value in "((The|the|A|an) )?[a-zA-Z ,]{0,24}") {
        let f = FieldFormatter::default();
        let once = f.format_title(&value);
        prop_assert_eq!(f.format_title(&once), once.clone());
        assert_clean_commas(&once)?;
    }

    #[test]
    fn single_names_have_clean_spacing(value in "[a-zA-Z ,.]{0,30}") {
        let f = FieldFormatter::default();
        let once = f.format_name(&value, false);
        assert_clean_commas(&once)?;
        prop_assert_eq!(f.format_name(&once, false), once.clone());
    }

    #[test]
    fn name_lists_format_entry_by_entry(
        entries in prop::collection::vec("[A-Z][a-z]{1,6}( [A-Z][a-z]{1,6}){0,2}", 1..4)
    ) {
        let f = FieldFormatter::default();
        let joined = join_values(&entries);
        let expected: Vec<String> = entries
            .iter()
            .map(|entry| f.format_name(entry, false))
            .collect();
        prop_assert_eq!(f.format_name(&joined, true), join_values(&expected));
    }
}
