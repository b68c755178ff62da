//! Source reference validation tests

use launchpad::deploy::reference::validate;
use launchpad::errors::ValidationError;

#[test]
fn test_full_https_url() {
    let repo = validate("https://github.com/acme/widget").unwrap();
    assert_eq!(repo.owner, "acme");
    assert_eq!(repo.repo, "widget");
    assert_eq!(repo.canonical_url(), "https://github.com/acme/widget");
}

#[test]
fn test_accepted_variants() {
    for input in [
        "http://github.com/acme/widget",
        "github.com/acme/widget",
        "www.github.com/acme/widget",
        "https://www.github.com/acme/widget/",
        "  https://github.com/acme/widget  ",
    ] {
        let repo = validate(input).unwrap_or_else(|e| panic!("{input:?} rejected: {e}"));
        assert_eq!(repo.to_string(), "acme/widget");
    }
}

#[test]
fn test_not_a_url() {
    assert_eq!(
        validate("not-a-url"),
        Err(ValidationError::Invalid("not-a-url".to_string()))
    );
}

#[test]
fn test_empty_input() {
    assert_eq!(validate(""), Err(ValidationError::Empty));
    assert_eq!(validate("   "), Err(ValidationError::Empty));
}

#[test]
fn test_rejected_shapes() {
    for input in [
        "https://gitlab.com/acme/widget",
        "https://github.com/acme",
        "https://github.com/acme/widget/tree/main",
        "ftp://github.com/acme/widget",
    ] {
        assert!(validate(input).is_err(), "{input:?} should be rejected");
    }
}

#[test]
fn test_error_messages() {
    assert_eq!(ValidationError::Empty.to_string(), "Enter a GitHub repository URL");
    assert_eq!(
        ValidationError::Invalid("x".to_string()).to_string(),
        "Enter valid Github Repository URL"
    );
}
