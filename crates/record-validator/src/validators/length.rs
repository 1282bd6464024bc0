//! Length validator
//!
//! Length is measured in Unicode scalar values for strings and in elements
//! for lists and maps. Other values are measured through their display form.

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, RecordError, Validate,
    ValidationContext, Value,
};

fn measure(value: &Value) -> usize {
    match value {
        Value::Nil => 0,
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => other.to_string().chars().count(),
    }
}

/// Validates length bounds: `minimum`, `maximum`, `is`, or an `in`/`within`
/// range.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{ErrorKind, Options, Value};
/// use nebula_record_validator::validators::Length;
///
/// let v = Length::from_options(&Options::new().with("in", 2..=4)).unwrap();
/// assert_eq!(v.failure(&Value::from("a")), Some((ErrorKind::TooShort, 2)));
/// assert_eq!(v.failure(&Value::from("abc")), None);
/// ```
#[derive(Debug, Clone)]
pub struct Length {
    minimum: Option<usize>,
    maximum: Option<usize>,
    exact: Option<usize>,
    common: CommonOptions,
}

impl Length {
    pub const KIND: &'static str = "length";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        let bound = |key: &str| -> Result<Option<usize>, ConfigurationError> {
            match options.literal(Self::KIND, key)? {
                None | Some(Value::Nil) => Ok(None),
                Some(Value::Int(n)) => usize::try_from(*n).map(Some).map_err(|_| {
                    ConfigurationError::invalid_option(Self::KIND, key, "must not be negative")
                }),
                Some(other) => Err(ConfigurationError::invalid_option(
                    Self::KIND,
                    key,
                    format!("must be an integer, got {}", other.type_name()),
                )),
            }
        };

        let mut minimum = bound("minimum")?;
        let mut maximum = bound("maximum")?;
        let exact = bound("is")?;

        let range_key = ["in", "within"].into_iter().find(|key| options.contains_key(key));
        if let Some(key) = range_key {
            let Some(Value::Range(range)) = options.literal(Self::KIND, key)? else {
                return Err(ConfigurationError::invalid_option(Self::KIND, key, "must be a range"));
            };
            let to_usize = |n: i64| {
                usize::try_from(n).map_err(|_| {
                    ConfigurationError::invalid_option(Self::KIND, key, "must not be negative")
                })
            };
            minimum = Some(to_usize(*range.start())?);
            maximum = Some(to_usize(*range.end())?);
        }

        if minimum.is_none() && maximum.is_none() && exact.is_none() {
            return Err(ConfigurationError::missing_option(Self::KIND, "minimum"));
        }

        Ok(Self {
            minimum,
            maximum,
            exact,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    /// The first violated bound and its limit.
    pub fn failure(&self, value: &Value) -> Option<(ErrorKind, usize)> {
        let length = measure(value);
        if let Some(exact) = self.exact.filter(|n| length != *n) {
            return Some((ErrorKind::WrongLength, exact));
        }
        if let Some(min) = self.minimum.filter(|n| length < *n) {
            return Some((ErrorKind::TooShort, min));
        }
        if let Some(max) = self.maximum.filter(|n| length > *n) {
            return Some((ErrorKind::TooLong, max));
        }
        None
    }
}

impl Validate for Length {
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
        if let Some((kind, count)) = self.failure(value) {
            cx.add(
                self.common
                    .entry(attribute, kind)
                    .with_param("count", count.to_string()),
            );
        }
        Ok(())
    }
}
