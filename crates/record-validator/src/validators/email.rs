//! Email validator.
//!
//! `recipient@domain`, split on the first `@`. The recipient is a
//! dot-separated list of `[a-zA-Z0-9_+-]+` segments (no leading, trailing or
//! doubled dots, at most 255 bytes); the domain follows the hostname label
//! grammar and always needs a TLD.

use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, RecordError, Validate,
    ValidationContext, Value,
};
use crate::validators::hostname::{HostnameRules, to_ascii};

static RECIPIENT_SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A[a-zA-Z0-9_+-]+\z").expect("valid recipient pattern"));

static DOMAIN_RULES: LazyLock<HostnameRules> = LazyLock::new(HostnameRules::default);

const MAX_RECIPIENT_LEN: usize = 255;

fn recipient_is_valid(recipient: &str) -> bool {
    recipient.len() <= MAX_RECIPIENT_LEN
        && !recipient.contains("..")
        && !recipient.starts_with('.')
        && !recipient.ends_with('.')
        && recipient
            .split('.')
            .all(|segment| RECIPIENT_SEGMENT_REGEX.is_match(segment))
}

/// Validates email addresses.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::Options;
/// use nebula_record_validator::validators::Email;
///
/// let v = Email::from_options(&Options::new()).unwrap();
/// assert!(v.is_valid("a.b@sub.example.com"));
/// assert!(!v.is_valid("a..b@example.com"));
/// assert!(!v.is_valid("user@exa..mple.com"));
/// ```
#[derive(Debug, Clone)]
pub struct Email {
    allow_unicode: bool,
    common: CommonOptions,
}

impl Email {
    pub const KIND: &'static str = "email";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            allow_unicode: options.flag(Self::KIND, "allow_unicode")?,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    pub fn is_valid(&self, value: &str) -> bool {
        let Some((recipient, domain)) = value.split_once('@') else {
            return false;
        };
        if !recipient_is_valid(recipient) {
            return false;
        }
        if self.allow_unicode {
            DOMAIN_RULES.is_valid(&to_ascii(domain))
        } else {
            DOMAIN_RULES.is_valid(domain)
        }
    }
}

impl Validate for Email {
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
        if !self.is_valid(&value) {
            cx.add(
                self.common
                    .entry(attribute, ErrorKind::InvalidEmail)
                    .with_param("value", value),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.b@sub.example.com")]
    #[case("first+tag@example.com")]
    #[case("under_score-dash@example.co")]
    #[case("x@xn--bcher-kva.de")]
    fn accepts(#[case] email: &str) {
        let v = Email::from_options(&Options::new()).unwrap();
        assert!(v.is_valid(email), "{email}");
    }

    #[rstest]
    #[case::double_dot_recipient("a..b@example.com")]
    #[case::double_dot_domain("user@exa..mple.com")]
    #[case::leading_dot(".a@example.com")]
    #[case::trailing_dot("a.@example.com")]
    #[case::no_at("example.com")]
    #[case::empty_recipient("@example.com")]
    #[case::bare_domain("user@localhost")]
    #[case::second_at("a@b@example.com")]
    #[case::quote("o'neil@example.com")]
    fn rejects(#[case] email: &str) {
        let v = Email::from_options(&Options::new()).unwrap();
        assert!(!v.is_valid(email), "{email}");
    }

    #[test]
    fn recipient_length_limit() {
        let v = Email::from_options(&Options::new()).unwrap();
        assert!(v.is_valid(&format!("{}@example.com", "a".repeat(255))));
        assert!(!v.is_valid(&format!("{}@example.com", "a".repeat(256))));
    }

    #[test]
    fn unicode_domains_need_opt_in() {
        let strict = Email::from_options(&Options::new()).unwrap();
        let unicode = Email::from_options(&Options::new().with("allow_unicode", true)).unwrap();

        assert!(!strict.is_valid("user@bücher.de"));
        assert!(unicode.is_valid("user@bücher.de"));
    }
}
