//! Error types for validation failures and configuration mistakes
//!
//! Two tiers:
//!
//! - [`ErrorEntry`] / [`Errors`] are *data*: per-record validation failures
//!   accumulated during a pass and rendered by the host.
//! - [`ConfigurationError`] is raised while building validators and is never
//!   recovered from.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use smallvec::SmallVec;

// ============================================================================
// ERROR KIND
// ============================================================================

/// Error-kind token attached to every [`ErrorEntry`].
///
/// Rendering the token into a message is the host's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Presence/existence failure.
    Blank,
    /// Generic failure (grandparent, format).
    Invalid,
    InvalidEmail,
    InvalidHostname,
    InvalidUrl,
    InvalidIp,
    SingleIpRequired,
    IpNotAllowed,
    Before,
    After,
    /// Write-once violation.
    Unchangeable,
    Inclusion,
    TooShort,
    TooLong,
    WrongLength,
}

impl ErrorKind {
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Invalid => "invalid",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidHostname => "invalid_hostname",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidIp => "invalid_ip",
            Self::SingleIpRequired => "single_ip_required",
            Self::IpNotAllowed => "ip_not_allowed",
            Self::Before => "before",
            Self::After => "after",
            Self::Unchangeable => "unchangeable",
            Self::Inclusion => "inclusion",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::WrongLength => "wrong_length",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ============================================================================
// ERROR ENTRY
// ============================================================================

/// Interpolation parameters, stored as ordered key-value pairs
/// (typically 1-4 params).
pub type ErrorParams = SmallVec<[(Cow<'static, str>, String); 4]>;

/// One validation failure: `(attribute, kind, params)`.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{ErrorEntry, ErrorKind};
///
/// let entry = ErrorEntry::new("domain", ErrorKind::InvalidHostname)
///     .with_param("value", "-bad.com");
/// assert_eq!(entry.param("value"), Some("-bad.com"));
/// assert_eq!(entry.to_string(), "domain invalid_hostname");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub attribute: String,
    pub kind: ErrorKind,
    pub params: ErrorParams,

    /// Message override configured on the validator (`message` option).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Key of the map entry whose value failed (hash-values composites).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_key: Option<String>,
}

impl ErrorEntry {
    pub fn new(attribute: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            params: SmallVec::new(),
            message: None,
            element_key: None,
        }
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_param(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_message(mut self, message: Option<&str>) -> Self {
        self.message = message.map(str::to_owned);
        self
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_element_key(mut self, key: impl Into<String>) -> Self {
        self.element_key = Some(key.into());
        self
    }

    /// Looks up a parameter value by key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} {}", self.attribute, message)?,
            None => write!(f, "{} {}", self.attribute, self.kind)?,
        }
        if let Some(key) = &self.element_key {
            write!(f, " (key: {key})")?;
        }
        Ok(())
    }
}

// ============================================================================
// ERROR COLLECTION
// ============================================================================

/// The error collector for one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Errors {
    entries: Vec<ErrorEntry>,
}

impl Errors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorEntry> {
        self.entries.iter()
    }

    /// Entries recorded for one attribute.
    pub fn on<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a ErrorEntry> + 'a {
        self.entries.iter().filter(move |e| e.attribute == attribute)
    }

    /// Error kinds recorded for one attribute, in insertion order.
    #[must_use]
    pub fn kinds_on(&self, attribute: &str) -> Vec<ErrorKind> {
        self.on(attribute).map(|e| e.kind).collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ErrorEntry;
    type IntoIter = std::slice::Iter<'a, ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.entries.len())?;
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, entry)?;
        }
        Ok(())
    }
}

// ============================================================================
// CONFIGURATION ERROR
// ============================================================================

/// Raised while building validators from options. Never recovered.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// A composite was configured without any sub-validator.
    #[error("you need to supply at least one {rule} validation")]
    EmptyComposite { rule: String },

    /// `validates` was called without any rule.
    #[error("you need to supply at least one validation")]
    NoValidations,

    /// `validates` was called without any attribute.
    #[error("you need to supply at least one attribute")]
    NoAttributes,

    #[error("Unknown validator: '{name}'")]
    UnknownValidator { name: String },

    /// `if` / `unless` / `on` given to a composite sub-validator.
    #[error("{rule} does not support conditionals on sub-validators")]
    ConditionalOnSubValidator { rule: String },

    #[error("{validator}: option `{option}` {reason}")]
    InvalidOption {
        validator: String,
        option: String,
        reason: String,
    },

    #[error("{validator}: option `{option}` is required")]
    MissingOption { validator: String, option: String },

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A literal address or CIDR block in `within`/`without` did not parse.
    #[error("unexpected value for `{option}`: {value}")]
    InvalidBlock { option: String, value: String },

    /// A declarative rule document could not be read.
    #[error("malformed rule configuration: {0}")]
    Parse(String),
}

impl ConfigurationError {
    pub fn invalid_option(
        validator: impl Into<String>,
        option: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            validator: validator.into(),
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_option(validator: impl Into<String>, option: impl Into<String>) -> Self {
        Self::MissingOption {
            validator: validator.into(),
            option: option.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
