use kda_keystore::core::range::{parse, IndexSelector};
use kda_keystore::core::errors::WalletError;
use test_case::test_case;

#[test_case("5", IndexSelector::Single(5) ; "single")]
#[test_case("0", IndexSelector::Single(0) ; "zero")]
#[test_case("1-10", IndexSelector::Range { start: 1, end: 10 } ; "hyphen range")]
#[test_case("1,10", IndexSelector::Range { start: 1, end: 10 } ; "comma range")]
#[test_case("10-1", IndexSelector::Range { start: 10, end: 1 } ; "reversed range kept")]
#[test_case(" 3 , 7 ", IndexSelector::Range { start: 3, end: 7 } ; "whitespace around parts")]
#[test_case("1 2", IndexSelector::Single(1) ; "trailing digits ignored")]
fn test_parse_accepts(input: &str, expected: IndexSelector) {
    assert_eq!(parse(input).unwrap(), expected);
}

#[test_case("1-10-3" ; "three parts")]
#[test_case("1-" ; "missing end")]
#[test_case(",4" ; "missing start")]
fn test_parse_range_format_errors(input: &str) {
    assert!(matches!(parse(input), Err(WalletError::InvalidRangeFormat)));
}

#[test_case("a-b" ; "letters in range")]
#[test_case("1;2" ; "semicolon")]
#[test_case("-1x" ; "trailing letter")]
fn test_parse_invalid_characters(input: &str) {
    assert!(matches!(parse(input), Err(WalletError::InvalidRangeInput)));
}

#[test_case("" ; "empty")]
#[test_case("   " ; "blank")]
#[test_case("99999999999" ; "overflows u32")]
fn test_parse_number_format_errors(input: &str) {
    assert!(matches!(parse(input), Err(WalletError::InvalidNumberFormat)));
}

#[test]
fn test_indices_ascending_and_inclusive() {
    let indices: Vec<u32> = parse("2-5").unwrap().indices().collect();
    assert_eq!(indices, vec![2, 3, 4, 5]);
    assert_eq!(parse("7").unwrap().len(), 1);
}

#[test]
fn test_display_round_trips_through_from_str() {
    let selector: IndexSelector = "4-9".parse().unwrap();
    assert_eq!(selector.to_string(), "4-9");
}
