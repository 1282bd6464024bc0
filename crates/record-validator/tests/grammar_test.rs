//! Hostname, email, URL and IP grammars as configured rules.

use nebula_record_validator::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn errors_for(rule: &str, options: Options, value: impl Into<Value>) -> Errors {
    let rules = RuleSet::new()
        .validates(&["field"], &Options::new().nested(rule, options))
        .unwrap();
    let record = MemoryRecord::new().with_attribute("field", value);
    rules.validate(&record).unwrap()
}

// ============================================================================
// HOSTNAME
// ============================================================================

#[rstest]
#[case("example.com", Options::new(), true)]
#[case("-abc.com", Options::new(), false)]
#[case("xn--abc.com", Options::new(), true)]
#[case("1.2.3.4", Options::new(), false)]
#[case("1.2.3.4", Options::new().with("allow_ip", true), true)]
#[case("subdomain1", Options::new(), false)]
#[case("subdomain1", Options::new().with("skip_tld", true), true)]
#[case("*.example.com", Options::new().with("allow_wildcard", true), true)]
fn hostname_cases(#[case] value: &str, #[case] options: Options, #[case] valid: bool) {
    assert_eq!(errors_for("hostname", options, value).is_empty(), valid, "{value}");
}

#[test]
fn hostname_rejects_64_character_labels() {
    let label = "a".repeat(64);
    let errors = errors_for("hostname", Options::new(), format!("{label}.com"));
    assert_eq!(errors.kinds_on("field"), vec![ErrorKind::InvalidHostname]);
}

#[test]
fn hostname_error_carries_value() {
    let errors = errors_for("hostname", Options::new(), "-abc.com");
    assert_eq!(errors.entries()[0].param("value"), Some("-abc.com"));
}

// ============================================================================
// EMAIL
// ============================================================================

#[rstest]
#[case("a.b@sub.example.com", true)]
#[case("a..b@example.com", false)]
#[case("user@exa..mple.com", false)]
#[case("user@localhost", false)]
fn email_cases(#[case] value: &str, #[case] valid: bool) {
    assert_eq!(errors_for("email", Options::new(), value).is_empty(), valid, "{value}");
}

#[test]
fn email_error_kind_and_value() {
    let errors = errors_for("email", Options::new(), "nope");
    let entry = &errors.entries()[0];
    assert_eq!(entry.kind, ErrorKind::InvalidEmail);
    assert_eq!(entry.param("value"), Some("nope"));
}

// ============================================================================
// URL
// ============================================================================

#[rstest]
#[case("http://x.com", Options::new(), true)]
#[case("ftp://x.com", Options::new(), false)]
#[case("ftp://x.com", Options::new().with("scheme", "ftp"), true)]
#[case("https://x.com", Options::new().with("host", "y.com"), false)]
#[case("https://y.com", Options::new().with("host", "y.com"), true)]
#[case("https://y.com:8443", Options::new().with("port", 443), false)]
#[case("https://y.com:443", Options::new().with("port", 443), true)]
#[case("https://y.com", Options::new().with("port", 443), false)]
#[case("http://y.com", Options::new().with("port", 443), false)]
#[case("http://y.com:80/", Options::new().with("port", false), false)]
#[case("http://y.com/", Options::new().with("port", false), true)]
#[case("https://example.com/search?q=a|b", Options::new(), true)]
#[case("http://x.com/a^b", Options::new(), true)]
#[case("https://y.com:8443", Options::new().with("port", vec![Value::from(8443), Value::from(443)]), true)]
#[case("example.com/path", Options::new(), false)]
fn url_cases(#[case] value: &str, #[case] options: Options, #[case] valid: bool) {
    assert_eq!(errors_for("url", options, value).is_empty(), valid, "{value}");
}

#[test]
fn url_allow_list_from_another_attribute() {
    let rules = RuleSet::new()
        .validates(
            &["homepage"],
            &Options::new().nested("url", Options::new().attribute("host", "domain")),
        )
        .unwrap();
    let record = MemoryRecord::new()
        .with_attribute("domain", "example.com")
        .with_attribute("homepage", "https://example.org/");

    let errors = rules.validate(&record).unwrap();
    let entry = &errors.entries()[0];
    assert_eq!(entry.kind, ErrorKind::InvalidUrl);
    assert_eq!(entry.param("host"), Some("example.com"));
}

// ============================================================================
// IPADDR
// ============================================================================

#[rstest]
#[case("10.1.2.3", Options::new(), vec![])]
#[case("10.1.2.3/24", Options::new(), vec![ErrorKind::SingleIpRequired])]
#[case("10.1.2.3/24", Options::new().with("allow_block", true), vec![])]
#[case("10.1.2.3", Options::new().with("within", vec!["10.0.0.0/8"]), vec![])]
#[case("11.1.2.3", Options::new().with("within", vec!["10.0.0.0/8"]), vec![ErrorKind::IpNotAllowed])]
#[case("10.1.2.3", Options::new().with("without", vec!["10.0.0.0/8"]), vec![ErrorKind::IpNotAllowed])]
#[case("11.1.2.3", Options::new().with("without", vec!["10.0.0.0/8"]), vec![])]
#[case(
    "11.0.0.0/8",
    Options::new().with("within", vec!["10.0.0.0/8"]),
    vec![ErrorKind::SingleIpRequired, ErrorKind::IpNotAllowed]
)]
#[case("::1", Options::new().with("within", vec!["10.0.0.0/8"]), vec![ErrorKind::IpNotAllowed])]
#[case("10.0.0.300", Options::new(), vec![ErrorKind::InvalidIp])]
fn ipaddr_cases(#[case] value: &str, #[case] options: Options, #[case] expected: Vec<ErrorKind>) {
    assert_eq!(errors_for("ipaddr", options, value).kinds_on("field"), expected, "{value}");
}

#[test]
fn ipaddr_netmask_blocks() {
    let options = Options::new()
        .with("allow_block", true)
        .with("within", vec!["10.0.0.0/255.0.0.0"]);
    assert!(errors_for("ipaddr", options.clone(), "10.20.0.0/255.255.0.0").is_empty());
    assert!(!errors_for("ipaddr", options, "10.0.0.0/7").is_empty());
}

#[test]
fn ipaddr_rejects_non_strings() {
    let errors = errors_for("ipaddr", Options::new(), 42);
    assert_eq!(errors.kinds_on("field"), vec![ErrorKind::InvalidIp]);
}
