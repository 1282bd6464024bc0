//! Hostname validator.
//!
//! Checks a value is generally formatted as a hostname or domain:
//! - total length at most 255, each label at most 63
//! - characters `[a-zA-Z0-9-]`, plus `_` with `allow_underscore` and `/`
//!   with `allow_slash` (RFC 2317 classless delegation)
//! - labels start and end on an alphanumeric; all-numeric labels are fine
//! - the final label is 2+ letters or a punycode (`xn--`) token, unless
//!   `skip_tld`
//! - label count within `segments` (default `2..=100`, or `1..=100` with
//!   `skip_tld`)
//!
//! Unicode input is converted to its punycode form first.

use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, RecordError, Validate,
    ValidationContext, Value,
};

static LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A([a-zA-Z0-9_]([a-zA-Z0-9_/-]+)?)?[a-zA-Z0-9]\z").expect("valid label pattern")
});

static FINAL_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(xn--[a-zA-Z0-9]{2,}|[a-zA-Z]{2,})\z").expect("valid final label pattern")
});

const MAX_HOSTNAME_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;

/// Converts a unicode hostname to its ASCII (punycode) form, one label at a
/// time, so characters only some grammars allow (`/`, `_`, `*`) survive.
///
/// ASCII labels and labels that cannot be converted are kept unchanged;
/// the grammar rejects the latter.
pub fn to_ascii(value: &str) -> Cow<'_, str> {
    if value.is_ascii() {
        return Cow::Borrowed(value);
    }
    let labels: Vec<Cow<'_, str>> = value.split('.').map(label_to_ascii).collect();
    Cow::Owned(labels.join("."))
}

fn label_to_ascii(label: &str) -> Cow<'_, str> {
    if label.is_ascii() {
        return Cow::Borrowed(label);
    }
    match ::url::Host::parse(label) {
        Ok(::url::Host::Domain(domain)) => Cow::Owned(domain),
        _ => Cow::Borrowed(label),
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Which literal IP addresses a hostname field accepts instead of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowIp {
    #[default]
    Never,
    Any,
    V4,
    V6,
}

impl AllowIp {
    fn from_value(value: Option<&Value>) -> Result<Self, ConfigurationError> {
        match value {
            None | Some(Value::Nil | Value::Bool(false)) => Ok(Self::Never),
            Some(Value::Bool(true)) => Ok(Self::Any),
            Some(Value::Int(4)) => Ok(Self::V4),
            Some(Value::Int(6)) => Ok(Self::V6),
            Some(Value::Str(s)) if s == "4" => Ok(Self::V4),
            Some(Value::Str(s)) if s == "6" => Ok(Self::V6),
            Some(other) => Err(ConfigurationError::invalid_option(
                Hostname::KIND,
                "allow_ip",
                format!("must be true, false, 4 or 6, got `{other}`"),
            )),
        }
    }

    /// Whether `value` is an address literal this setting accepts.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Never => false,
            Self::V4 => value.parse::<Ipv4Addr>().is_ok(),
            Self::V6 => value.parse::<Ipv6Addr>().is_ok(),
            Self::Any => Self::V4.accepts(value) || Self::V6.accepts(value),
        }
    }
}

/// Wildcard first labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wildcard {
    #[default]
    Never,
    /// `*.example.com`
    Single,
    /// `*.example.com` and `**.example.com`
    Multi,
}

impl Wildcard {
    fn from_value(value: Option<&Value>) -> Result<Self, ConfigurationError> {
        match value {
            None | Some(Value::Nil | Value::Bool(false)) => Ok(Self::Never),
            Some(Value::Bool(true)) => Ok(Self::Single),
            Some(Value::Str(s)) if s == "multi" => Ok(Self::Multi),
            Some(other) => Err(ConfigurationError::invalid_option(
                Hostname::KIND,
                "allow_wildcard",
                format!("must be true, false or \"multi\", got `{other}`"),
            )),
        }
    }

    fn accepts(self, label: &str) -> bool {
        match self {
            Self::Never => false,
            Self::Single => label == "*",
            Self::Multi => label == "*" || label == "**",
        }
    }
}

// ============================================================================
// GRAMMAR
// ============================================================================

/// The label grammar shared by [`Hostname`] and the email domain check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameRules {
    pub allow_underscore: bool,
    pub allow_slash: bool,
    pub wildcard: Wildcard,
    pub segments: RangeInclusive<usize>,
    pub skip_tld: bool,
}

impl Default for HostnameRules {
    fn default() -> Self {
        Self {
            allow_underscore: false,
            allow_slash: false,
            wildcard: Wildcard::Never,
            segments: 2..=100,
            skip_tld: false,
        }
    }
}

impl HostnameRules {
    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        let kind = Hostname::KIND;
        let skip_tld = options.flag(kind, "skip_tld")?;
        let segments = match options.literal(kind, "segments")? {
            None | Some(Value::Nil) => {
                if skip_tld {
                    1..=100
                } else {
                    2..=100
                }
            }
            Some(Value::Int(n)) => {
                let n = usize::try_from(*n).map_err(|_| negative_segments())?;
                n..=n
            }
            Some(Value::Range(range)) => {
                let start = usize::try_from(*range.start()).map_err(|_| negative_segments())?;
                let end = usize::try_from(*range.end()).map_err(|_| negative_segments())?;
                start..=end
            }
            Some(other) => {
                return Err(ConfigurationError::invalid_option(
                    kind,
                    "segments",
                    format!("must be an integer or a range, got `{other}`"),
                ));
            }
        };

        Ok(Self {
            allow_underscore: options.flag(kind, "allow_underscore")?,
            allow_slash: options.flag(kind, "allow_slash")?,
            wildcard: Wildcard::from_value(options.literal(kind, "allow_wildcard")?)?,
            segments,
            skip_tld,
        })
    }

    /// Checks an already ASCII-normalized name.
    pub fn is_valid(&self, host: &str) -> bool {
        if host.len() > MAX_HOSTNAME_LEN || host.contains("..") {
            return false;
        }
        if (!self.allow_underscore && host.contains('_')) || (!self.allow_slash && host.contains('/')) {
            return false;
        }

        let labels: Vec<&str> = host.split('.').collect();
        if !self.segments.contains(&labels.len()) {
            return false;
        }

        let last = labels.len() - 1;
        labels.iter().enumerate().all(|(idx, label)| {
            if label.len() > MAX_LABEL_LEN {
                return false;
            }
            if !self.skip_tld && idx == last {
                FINAL_LABEL_REGEX.is_match(label)
            } else if idx == 0 && self.wildcard.accepts(label) {
                true
            } else {
                LABEL_REGEX.is_match(label)
            }
        })
    }
}

fn negative_segments() -> ConfigurationError {
    ConfigurationError::invalid_option(Hostname::KIND, "segments", "must not be negative")
}

// ============================================================================
// HOSTNAME VALIDATOR
// ============================================================================

/// Validates hostnames and domains.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::Options;
/// use nebula_record_validator::validators::Hostname;
///
/// let v = Hostname::from_options(&Options::new()).unwrap();
/// assert!(v.is_valid("example.com"));
/// assert!(!v.is_valid("-abc.com"));
/// assert!(!v.is_valid("1.2.3.4"));
///
/// let v = Hostname::from_options(&Options::new().with("allow_ip", true)).unwrap();
/// assert!(v.is_valid("1.2.3.4"));
/// ```
#[derive(Debug, Clone)]
pub struct Hostname {
    rules: HostnameRules,
    allow_ip: AllowIp,
    common: CommonOptions,
}

impl Hostname {
    pub const KIND: &'static str = "hostname";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            rules: HostnameRules::from_options(options)?,
            allow_ip: AllowIp::from_value(options.literal(Self::KIND, "allow_ip")?)?,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &HostnameRules {
        &self.rules
    }

    pub fn is_valid(&self, value: &str) -> bool {
        self.allow_ip.accepts(value) || self.rules.is_valid(&to_ascii(value))
    }
}

impl Validate for Hostname {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn common(&self) -> &CommonOptions {
        &self.common
    }

    fn validate_each(
        &self,
        cx: &mut ValidationContext<'_>,
        attribute: &str,
        value: &Value,
    ) -> Result<(), RecordError> {
        let value = value.to_string();
        if self.allow_ip.accepts(&value) {
            return Ok(());
        }

        let normalized = to_ascii(&value);
        if !self.rules.is_valid(&normalized) {
            cx.add(
                self.common
                    .entry(attribute, ErrorKind::InvalidHostname)
                    .with_param("value", normalized.into_owned()),
            );
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn hostname(options: Options) -> Hostname {
        Hostname::from_options(&options).unwrap()
    }

    #[rstest]
    #[case("example.com")]
    #[case("a.example.com")]
    #[case("xn--abc.com")]
    #[case("sub.xn--p1ai")]
    #[case("4.3.2.1.in-addr.arpa")]
    #[case("a-b.example.com")]
    fn accepts_plain_hostnames(#[case] host: &str) {
        assert!(hostname(Options::new()).is_valid(host), "{host}");
    }

    #[rstest]
    #[case::leading_hyphen("-abc.com")]
    #[case::trailing_hyphen("abc-.com")]
    #[case::double_dot("a..com")]
    #[case::trailing_dot("example.com.")]
    #[case::numeric_tld("example.123")]
    #[case::single_label("localhost")]
    #[case::underscore("_abc.example.com")]
    #[case::slash("4.0/25.example.com")]
    #[case::empty("")]
    fn rejects_malformed_hostnames(#[case] host: &str) {
        assert!(!hostname(Options::new()).is_valid(host), "{host}");
    }

    #[test]
    fn enforces_label_and_total_length() {
        let v = hostname(Options::new());
        let label63 = "a".repeat(63);
        let label64 = "a".repeat(64);

        assert!(v.is_valid(&format!("{label63}.com")));
        assert!(!v.is_valid(&format!("{label64}.com")));

        let long = format!("{label63}.{label63}.{label63}.{label63}.com");
        assert!(long.len() > 255);
        assert!(!v.is_valid(&long));
    }

    #[test]
    fn allow_ip_families() {
        assert!(hostname(Options::new().with("allow_ip", true)).is_valid("::1"));
        assert!(hostname(Options::new().with("allow_ip", 4)).is_valid("1.2.3.4"));
        assert!(!hostname(Options::new().with("allow_ip", 4)).is_valid("::1"));
        assert!(hostname(Options::new().with("allow_ip", "6")).is_valid("fe80::1"));
        assert!(!hostname(Options::new().with("allow_ip", 6)).is_valid("1.2.3.4"));
    }

    #[test]
    fn optional_characters() {
        assert!(hostname(Options::new().with("allow_underscore", true)).is_valid("_abc.example.com"));
        assert!(hostname(Options::new().with("allow_slash", true)).is_valid("4.0/25.3.2.1.example.com"));
    }

    #[test]
    fn wildcards() {
        let single = hostname(Options::new().with("allow_wildcard", true));
        assert!(single.is_valid("*.example.com"));
        assert!(!single.is_valid("**.example.com"));
        assert!(!single.is_valid("a.*.example.com"));

        let multi = hostname(Options::new().with("allow_wildcard", "multi"));
        assert!(multi.is_valid("**.example.com"));
    }

    #[test]
    fn segments_and_skip_tld() {
        let three = hostname(Options::new().with("segments", 3..=100));
        assert!(three.is_valid("a.example.com"));
        assert!(!three.is_valid("example.com"));

        let exact = hostname(Options::new().with("segments", 2));
        assert!(!exact.is_valid("a.example.com"));

        let skip = hostname(Options::new().with("skip_tld", true));
        assert!(skip.is_valid("subdomain1"));
        assert!(skip.is_valid("a.b1"));
    }

    #[test]
    fn unicode_is_converted_to_punycode() {
        assert_eq!(to_ascii("example.com"), "example.com");
        assert_eq!(to_ascii("bücher.de"), "xn--bcher-kva.de");
        assert!(hostname(Options::new()).is_valid("bücher.de"));
    }

    #[test]
    fn unicode_labels_convert_beside_slash_and_underscore() {
        assert_eq!(to_ascii("4.0/25.bücher.de"), "4.0/25.xn--bcher-kva.de");
        assert_eq!(to_ascii("_dmarc.bücher.de"), "_dmarc.xn--bcher-kva.de");
        assert!(hostname(Options::new().with("allow_slash", true)).is_valid("4.0/25.bücher.de"));
        assert!(hostname(Options::new().with("allow_underscore", true)).is_valid("_dmarc.bücher.de"));
        assert!(!hostname(Options::new()).is_valid("4.0/25.bücher.de"));
    }

    #[test]
    fn rejects_bad_option_values() {
        assert!(Hostname::from_options(&Options::new().with("allow_ip", 5)).is_err());
        assert!(Hostname::from_options(&Options::new().with("allow_wildcard", "all")).is_err());
        assert!(Hostname::from_options(&Options::new().with("segments", -1)).is_err());
    }
}
