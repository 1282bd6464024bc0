//! Validator options and the option resolver.
//!
//! Configuration is an immutable mapping of option name → [`OptionValue`].
//! An option value is either a literal, a reference to another attribute
//! of the record being validated, a record-computed function, or a nested
//! mapping (sub-rule options of a composite).
//!
//! Options that may be dynamic are converted once, at configuration time,
//! into a [`Resolvable`]; [`Resolvable::resolve`] is the single code path
//! that turns them into a [`Value`] for the current record.
//!
//! # Declarative form
//!
//! [`Options::from_json`] reads the same structure from JSON. Scalars and
//! arrays are literals, `{"$attribute": "name"}` is an attribute reference,
//! `{"$range": [lo, hi]}` is an inclusive integer range and any other object
//! is a nested mapping.
//!
//! ```
//! use nebula_record_validator::foundation::{OptionValue, Options};
//! use serde_json::json;
//!
//! let options = Options::from_json(&json!({
//!     "allow_ip": 4,
//!     "segments": {"$range": [2, 5]},
//!     "within": {"$attribute": "allowed_blocks"},
//! }))
//! .unwrap();
//!
//! assert!(matches!(options.get("within"), Some(OptionValue::Attribute(name)) if name == "allowed_blocks"));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::foundation::error::ConfigurationError;
use crate::foundation::record::{Record, RecordError};
use crate::foundation::value::Value;

// ============================================================================
// COMPUTED VALUES
// ============================================================================

type ComputeFn = dyn Fn(&dyn Record) -> Result<Value, RecordError> + Send + Sync;

/// A zero-argument function of the record, evaluated at validation time.
#[derive(Clone)]
pub struct Computed {
    label: Cow<'static, str>,
    func: Arc<ComputeFn>,
}

impl Computed {
    /// `label` is what cross-attribute messages show for this value.
    pub fn new<F>(label: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&dyn Record) -> Result<Value, RecordError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn call(&self, record: &dyn Record) -> Result<Value, RecordError> {
        (self.func)(record)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("label", &self.label)
            .field("func", &"<function>")
            .finish()
    }
}

// ============================================================================
// OPTION VALUE
// ============================================================================

/// One configured option value.
#[derive(Debug, Clone)]
pub enum OptionValue {
    Literal(Value),
    /// Name of an accessor on the record being validated.
    Attribute(String),
    Computed(Computed),
    /// Nested option mapping (composite sub-rules).
    Nested(Options),
}

impl OptionValue {
    /// The literal value, if this option is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Converts into a [`Resolvable`]; nested mappings are rejected.
    pub fn to_resolvable(
        &self,
        validator: &str,
        option: &str,
    ) -> Result<Resolvable, ConfigurationError> {
        match self {
            Self::Literal(value) => Ok(Resolvable::Literal(value.clone())),
            Self::Attribute(name) => Ok(Resolvable::Attribute(name.clone())),
            Self::Computed(computed) => Ok(Resolvable::Computed(computed.clone())),
            Self::Nested(_) => Err(ConfigurationError::invalid_option(
                validator,
                option,
                "cannot be a nested mapping",
            )),
        }
    }
}

macro_rules! literal_option_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    Self::Literal(Value::from(value))
                }
            }
        )+
    };
}

literal_option_from!(
    bool,
    i64,
    i32,
    u16,
    f64,
    &str,
    String,
    DateTime<Utc>,
    RangeInclusive<i64>,
    RangeInclusive<i32>,
    Vec<Value>,
    Vec<&str>,
);

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<Computed> for OptionValue {
    fn from(computed: Computed) -> Self {
        Self::Computed(computed)
    }
}

impl From<Options> for OptionValue {
    fn from(options: Options) -> Self {
        Self::Nested(options)
    }
}

// ============================================================================
// RESOLVABLE
// ============================================================================

/// A possibly dynamic option, resolved per record.
#[derive(Debug, Clone)]
pub enum Resolvable {
    Literal(Value),
    Attribute(String),
    Computed(Computed),
}

impl Resolvable {
    /// Resolves against the record being validated.
    ///
    /// A missing accessor or a failing computation is a fault and
    /// propagates to the caller.
    pub fn resolve(&self, record: &dyn Record) -> Result<Value, RecordError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Attribute(name) => record.invoke(name),
            Self::Computed(computed) => computed.call(record),
        }
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Immutable, ordered option mapping.
///
/// Built once when rules are configured; validators read it in their
/// `from_options` constructors and never keep it around.
#[derive(Debug, Clone, Default)]
pub struct Options {
    entries: IndexMap<String, OptionValue>,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option. Literals convert implicitly.
    #[must_use = "builder methods must be chained or built"]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Sets an option to a reference to another attribute.
    #[must_use = "builder methods must be chained or built"]
    pub fn attribute(self, key: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with(key, OptionValue::Attribute(name))
    }

    /// Sets an option to a record-computed value.
    #[must_use = "builder methods must be chained or built"]
    pub fn computed<F>(self, key: impl Into<String>, label: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&dyn Record) -> Result<Value, RecordError> + Send + Sync + 'static,
    {
        self.with(key, Computed::new(label, func))
    }

    /// Sets an option to a nested mapping.
    #[must_use = "builder methods must be chained or built"]
    pub fn nested(self, key: impl Into<String>, options: Options) -> Self {
        self.with(key, options)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether any of `keys` is present.
    #[must_use]
    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.entries.contains_key(*key))
    }

    /// `self` overlaid with `overrides`; entries in `overrides` win.
    #[must_use]
    pub fn merge(&self, overrides: &Options) -> Options {
        let mut entries = self.entries.clone();
        for (key, value) in &overrides.entries {
            entries.insert(key.clone(), value.clone());
        }
        Options { entries }
    }

    /// Copy without the given keys.
    #[must_use]
    pub fn without(&self, keys: &[&str]) -> Options {
        self.filtered(|key| !keys.contains(&key))
    }

    /// Copy with only the given keys.
    #[must_use]
    pub fn only(&self, keys: &[&str]) -> Options {
        self.filtered(|key| keys.contains(&key))
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> Options {
        Options {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| keep(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Typed readers used by validator constructors
    // ------------------------------------------------------------------------

    /// Literal value of an option that does not accept references.
    pub fn literal(&self, validator: &str, key: &str) -> Result<Option<&Value>, ConfigurationError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(OptionValue::Literal(value)) => Ok(Some(value)),
            Some(_) => Err(ConfigurationError::invalid_option(
                validator,
                key,
                "must be a literal value",
            )),
        }
    }

    /// Boolean flag; absent and nil mean `false`. Any other non-boolean
    /// (including the string `"false"`) is rejected.
    pub fn flag(&self, validator: &str, key: &str) -> Result<bool, ConfigurationError> {
        match self.literal(validator, key)? {
            None | Some(Value::Nil) => Ok(false),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(other) => Err(ConfigurationError::invalid_option(
                validator,
                key,
                format!("must be a boolean, got {}", other.type_name()),
            )),
        }
    }

    /// Optional literal string.
    pub fn string(&self, validator: &str, key: &str) -> Result<Option<String>, ConfigurationError> {
        match self.literal(validator, key)? {
            None | Some(Value::Nil) => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ConfigurationError::invalid_option(
                validator,
                key,
                format!("must be a string, got {}", other.type_name()),
            )),
        }
    }

    /// Optional possibly-dynamic option.
    pub fn resolvable(
        &self,
        validator: &str,
        key: &str,
    ) -> Result<Option<Resolvable>, ConfigurationError> {
        self.entries
            .get(key)
            .map(|value| value.to_resolvable(validator, key))
            .transpose()
    }

    // ------------------------------------------------------------------------
    // JSON
    // ------------------------------------------------------------------------

    /// Reads options from a JSON object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ConfigurationError> {
        let serde_json::Value::Object(map) = json else {
            return Err(ConfigurationError::Parse(format!(
                "expected an object of options, got `{json}`"
            )));
        };
        let entries = map
            .iter()
            .map(|(key, value)| Ok((key.clone(), option_from_json(value)?)))
            .collect::<Result<IndexMap<_, _>, ConfigurationError>>()?;
        Ok(Self { entries })
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn option_from_json(json: &serde_json::Value) -> Result<OptionValue, ConfigurationError> {
    let serde_json::Value::Object(map) = json else {
        return Ok(OptionValue::Literal(value_from_json(json)));
    };

    if let Some(name) = map.get("$attribute") {
        return match name {
            serde_json::Value::String(name) => Ok(OptionValue::Attribute(name.clone())),
            other => Err(ConfigurationError::Parse(format!(
                "`$attribute` must name an attribute, got `{other}`"
            ))),
        };
    }

    if let Some(bounds) = map.get("$range") {
        let range = bounds
            .as_array()
            .filter(|b| b.len() == 2)
            .and_then(|b| Some(b[0].as_i64()?..=b[1].as_i64()?))
            .ok_or_else(|| {
                ConfigurationError::Parse(format!("`$range` must be [lo, hi], got `{bounds}`"))
            })?;
        return Ok(OptionValue::Literal(Value::Range(range)));
    }

    Options::from_json(json).map(OptionValue::Nested)
}

/// Plain JSON → [`Value`]; objects become maps.
pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or_default(),
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), value_from_json(v)))
                .collect(),
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================
