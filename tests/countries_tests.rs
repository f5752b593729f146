use cam_scan_rs::countries::{find_by_code, parse_choice, COUNTRIES};

#[test]
fn choice_must_be_in_range() {
    let n = COUNTRIES.len();
    assert_eq!(parse_choice("1", n).unwrap(), 0);
    assert_eq!(parse_choice(&format!(" {n} \n"), n).unwrap(), n - 1);
    assert!(parse_choice("0", n).is_err());
    assert!(parse_choice(&(n + 1).to_string(), n).is_err());
}

#[test]
fn non_numeric_choice_rejected() {
    let err = parse_choice("japan", 10).unwrap_err();
    assert!(err.to_string().contains("enter a number"));
    assert!(parse_choice("", 10).is_err());
    assert!(parse_choice("-3", 10).is_err());
}

#[test]
fn lookup_by_code_ignores_case() {
    assert_eq!(find_by_code("jp"), Some(("Japan", "JP")));
    assert_eq!(find_by_code(" us "), Some(("United States", "US")));
    assert_eq!(find_by_code("-"), Some(("Extra", "-")));
    assert_eq!(find_by_code("XX"), None);
}
