//! URL validator.
//!
//! The value must parse as an absolute URL whose scheme, host and port fall
//! inside the configured allow-lists. `scheme` defaults to `http`/`https`;
//! `host` and `port` are unconstrained unless given. Each allow-list may be
//! a literal, a reference to another attribute or a computed value.
//!
//! Parsing is IDN-aware (`::url::Url`), and the normalized form is then
//! re-checked against the strict RFC 3986 character set. Ports are matched
//! as written: `http://x.com:80/` has port 80 and `https://x.com/` has none.

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, Record, RecordError, Resolvable, Validate,
    ValidationContext, Value,
};
use crate::validators::hostname::to_ascii;

static STRICT_URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[a-zA-Z][a-zA-Z0-9+.-]*:[a-zA-Z0-9\-._~:/?#\[\]@!$&'()*+,;=%]*\z")
        .expect("valid strict uri pattern")
});

static PERCENT_ESCAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%(?:[0-9a-fA-F]{2})?").expect("valid percent pattern"));

const RFC3986_PUNCTUATION: &[u8] = b"-._~:/?#[]@!$&'()*+,;=%";

// ============================================================================
// ALLOW-LISTS
// ============================================================================

/// A resolved allow-list. `Any` places no constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allowed<T> {
    Any,
    Only(Vec<T>),
}

impl<T: PartialEq> Allowed<T> {
    pub fn permits(&self, candidate: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Only(items) => items.contains(candidate),
        }
    }
}

impl fmt::Display for Allowed<String> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl fmt::Display for Allowed<Option<u16>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Only(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|port| port.map_or_else(|| "none".to_owned(), |p| p.to_string()))
                    .collect();
                f.write_str(&rendered.join(", "))
            }
        }
    }
}

fn string_list(value: &Value, normalize: fn(&str) -> String) -> Result<Allowed<String>, String> {
    match value {
        Value::Nil => Ok(Allowed::Any),
        Value::Str(s) => Ok(Allowed::Only(vec![normalize(s)])),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Str(s) => Ok(normalize(s)),
                other => Err(format!("expected strings, got {}", other.type_name())),
            })
            .collect::<Result<_, _>>()
            .map(Allowed::Only),
        other => Err(format!("expected a string or a list, got {}", other.type_name())),
    }
}

fn scheme_list(value: &Value) -> Result<Allowed<String>, String> {
    string_list(value, str::to_ascii_lowercase)
}

fn host_list(value: &Value) -> Result<Allowed<String>, String> {
    string_list(value, |host| to_ascii(host).to_ascii_lowercase())
}

fn port_entry(value: &Value) -> Result<Option<u16>, String> {
    match value {
        Value::Nil | Value::Bool(false) => Ok(None),
        Value::Int(n) => u16::try_from(*n)
            .map(Some)
            .map_err(|_| format!("port {n} is out of range")),
        other => Err(format!("expected a port number, got {}", other.type_name())),
    }
}

/// `false` alone, or a list holding only nil/`false`, requires the port to
/// be omitted.
fn port_list(value: &Value) -> Result<Allowed<Option<u16>>, String> {
    match value {
        Value::Nil => Ok(Allowed::Any),
        Value::List(items) => items
            .iter()
            .map(port_entry)
            .collect::<Result<_, _>>()
            .map(Allowed::Only),
        other => port_entry(other).map(|port| Allowed::Only(vec![port])),
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// A parsed absolute URL plus the port exactly as the input wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsoluteUrl {
    url: ::url::Url,
    port: Option<u16>,
}

impl AbsoluteUrl {
    pub fn url(&self) -> &::url::Url {
        &self.url
    }

    /// The written port; `None` when the input has none, even where the
    /// scheme has a default.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

/// Parses an absolute URL, rejecting anything the strict grammar would not
/// accept after normalization.
pub fn parse_absolute(value: &str) -> Option<AbsoluteUrl> {
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }
    let url = ::url::Url::parse(value).ok()?;
    let normalized = escape_for_strict(url.as_str());
    let escapes_ok = PERCENT_ESCAPE_REGEX
        .find_iter(&normalized)
        .all(|m| m.as_str().len() == 3);
    if !(STRICT_URI_REGEX.is_match(&normalized) && escapes_ok) {
        return None;
    }
    let port = match url.port() {
        Some(port) => Some(port),
        None if url.has_host() => written_port(value),
        None => None,
    };
    Some(AbsoluteUrl { url, port })
}

/// Percent-encodes printable ASCII the WHATWG serializer leaves raw but
/// RFC 3986 excludes (`|`, `^`, `{`, `}`, ...).
fn escape_for_strict(normalized: &str) -> Cow<'_, str> {
    let needs_escape =
        |b: u8| b.is_ascii_graphic() && !b.is_ascii_alphanumeric() && !RFC3986_PUNCTUATION.contains(&b);
    if !normalized.bytes().any(needs_escape) {
        return Cow::Borrowed(normalized);
    }
    let mut escaped = String::with_capacity(normalized.len() + 8);
    for c in normalized.chars() {
        match u8::try_from(c) {
            Ok(b) if needs_escape(b) => {
                let _ = write!(escaped, "%{b:02X}");
            }
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// The `:digits` after the host in `raw`'s authority. The parsed URL drops a
/// port equal to the scheme default, so it is read from the input text.
fn written_port(raw: &str) -> Option<u16> {
    let (_, rest) = raw.split_once(':')?;
    let rest = rest.trim_start_matches(['/', '\\']);
    let authority = rest.split(['/', '\\', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    let after_host = match host_port.strip_prefix('[') {
        Some(bracketed) => bracketed.split_once(']')?.1,
        None => host_port,
    };
    after_host.split_once(':')?.1.parse().ok()
}

// ============================================================================
// URL VALIDATOR
// ============================================================================

/// Validates absolute URLs against scheme, host and port allow-lists.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{MemoryRecord, Options};
/// use nebula_record_validator::validators::Url;
///
/// let record = MemoryRecord::new();
/// let v = Url::from_options(&Options::new()).unwrap();
/// assert!(v.is_valid(&record, "http://x.com").unwrap());
/// assert!(!v.is_valid(&record, "ftp://x.com").unwrap());
///
/// let v = Url::from_options(&Options::new().with("scheme", "ftp")).unwrap();
/// assert!(v.is_valid(&record, "ftp://x.com").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Url {
    scheme: Resolvable,
    host: Option<Resolvable>,
    port: Option<Resolvable>,
    common: CommonOptions,
}

/// The allow-lists a URL was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAllowLists {
    pub scheme: Allowed<String>,
    pub host: Allowed<String>,
    pub port: Allowed<Option<u16>>,
}

impl ResolvedAllowLists {
    pub fn permit(&self, parsed: &AbsoluteUrl) -> bool {
        let url = parsed.url();
        let host_ok = match url.host_str() {
            Some(host) => self.host.permits(&host.to_ascii_lowercase()),
            None => self.host == Allowed::Any,
        };
        self.scheme.permits(&url.scheme().to_owned()) && host_ok && self.port.permits(&parsed.port())
    }
}

impl Url {
    pub const KIND: &'static str = "url";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        let scheme = options
            .resolvable(Self::KIND, "scheme")?
            .unwrap_or_else(|| Resolvable::Literal(Value::list(["http", "https"])));
        let host = options.resolvable(Self::KIND, "host")?;
        let port = options.resolvable(Self::KIND, "port")?;

        check_literal("scheme", &scheme, scheme_list)?;
        if let Some(host) = &host {
            check_literal("host", host, host_list)?;
        }
        if let Some(port) = &port {
            check_literal("port", port, port_list)?;
        }

        Ok(Self {
            scheme,
            host,
            port,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    /// Resolves the three allow-lists against `record`.
    pub fn allow_lists(&self, record: &dyn Record) -> Result<ResolvedAllowLists, RecordError> {
        let scheme = resolve_with("scheme", Some(&self.scheme), record, scheme_list)?;
        let host = resolve_with("host", self.host.as_ref(), record, host_list)?;
        let port = resolve_with("port", self.port.as_ref(), record, port_list)?;
        Ok(ResolvedAllowLists { scheme, host, port })
    }

    pub fn is_valid(&self, record: &dyn Record, value: &str) -> Result<bool, RecordError> {
        let allowed = self.allow_lists(record)?;
        Ok(parse_absolute(value).is_some_and(|url| allowed.permit(&url)))
    }
}

fn check_literal<T>(
    option: &str,
    resolvable: &Resolvable,
    convert: fn(&Value) -> Result<Allowed<T>, String>,
) -> Result<(), ConfigurationError> {
    match resolvable {
        Resolvable::Literal(value) => convert(value)
            .map(drop)
            .map_err(|reason| ConfigurationError::invalid_option(Url::KIND, option, reason)),
        _ => Ok(()),
    }
}

fn resolve_with<T>(
    option: &str,
    resolvable: Option<&Resolvable>,
    record: &dyn Record,
    convert: fn(&Value) -> Result<Allowed<T>, String>,
) -> Result<Allowed<T>, RecordError> {
    let Some(resolvable) = resolvable else {
        return Ok(Allowed::Any);
    };
    let value = resolvable.resolve(record)?;
    convert(&value).map_err(|reason| RecordError::invalid_reference(option, reason))
}

impl Validate for Url {
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
        let allowed = self.allow_lists(cx.record())?;
        let value = value.to_string();
        if parse_absolute(&value).is_some_and(|url| allowed.permit(&url)) {
            return Ok(());
        }

        let mut entry = self
            .common
            .entry(attribute, ErrorKind::InvalidUrl)
            .with_param("value", value)
            .with_param("scheme", allowed.scheme.to_string());
        if self.host.is_some() {
            entry = entry.with_param("host", allowed.host.to_string());
        }
        if self.port.is_some() {
            entry = entry.with_param("port", allowed.port.to_string());
        }
        cx.add(entry);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
