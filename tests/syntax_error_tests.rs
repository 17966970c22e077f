#![allow(clippy::uninlined_format_args)]

use retro::{Error, Regex};

#[track_caller]
fn test_1_error(pattern: &str, expected_err: Error) {
    let res = Regex::new(pattern);
    assert!(res.is_err(), "Pattern should not have parsed: {}", pattern);

    let err = res.err().unwrap();
    assert_eq!(
        err, expected_err,
        "Unexpected error '{}' for pattern '{}'",
        err, pattern
    );
}

#[test]
fn test_excessive_capture_groups() {
    let mut captures = String::from("s");
    for _ in 0..65536 {
        captures.push_str("(x)");
    }
    test_1_error(captures.as_str(), Error::TooManyCaptureGroups(65535));
}

#[test]
fn test_invalid_repeat() {
    test_1_error("*", Error::InvalidRepeat);
    test_1_error("+", Error::InvalidRepeat);
    test_1_error("?", Error::InvalidRepeat);
    test_1_error("{1,2}", Error::InvalidRepeat);
    test_1_error("{", Error::InvalidRepeat);
    test_1_error("{abc", Error::InvalidRepeat);
    test_1_error("{,}", Error::InvalidRepeat);
    test_1_error("(*)", Error::InvalidRepeat);
    test_1_error("a|*", Error::InvalidRepeat);
    test_1_error("(a|+b)", Error::InvalidRepeat);
}

#[test]
fn test_invalid_capture() {
    test_1_error(")", Error::InvalidCapture);
    test_1_error("a)", Error::InvalidCapture);
    test_1_error("a|b)", Error::InvalidCapture);
    test_1_error("(a", Error::InvalidCapture);
    test_1_error("((a)", Error::InvalidCapture);
    test_1_error("(a|b", Error::InvalidCapture);
    test_1_error("(a))", Error::InvalidCapture);
}

#[test]
fn test_diagnostic_text() {
    assert_eq!(Error::InvalidRepeat.to_string(), "invalid repeat");
    assert_eq!(Error::InvalidCapture.to_string(), "invalid capture");
    assert!(Error::InvalidRepeat.is_syntax_error());
    assert!(Error::InvalidCapture.is_syntax_error());
    assert!(!Error::StepLimitExceeded(1).is_syntax_error());
}

#[test]
fn test_not_syntax_errors() {
    // Quantifiers may stack.
    assert!(Regex::new("a**").is_ok());
    assert!(Regex::new("a+?").is_ok());

    // Malformed counted repeats are literals once anything has been parsed.
    for pattern in ["a{", "a{1", "a{1,", "a{1,2", "a{x,y}", "|{", "({)"] {
        assert!(Regex::new(pattern).is_ok(), "Should have parsed: {}", pattern);
    }

    // Unterminated brackets and trailing escapes contribute nothing.
    assert!(Regex::new("[").is_ok());
    assert!(Regex::new("a[bc").is_ok());
    assert!(Regex::new("\\").is_ok());

    // Empty pieces are fine.
    for pattern in ["", "()", "|", "a||b", "(|)"] {
        assert!(Regex::new(pattern).is_ok(), "Should have parsed: {}", pattern);
    }
}
