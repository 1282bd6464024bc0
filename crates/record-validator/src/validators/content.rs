//! Content validators
//!
//! - [`Format`]: the value's string form matches (`with`) or does not match
//!   (`without`) a regular expression
//! - [`Inclusion`]: the value is a member of a list or integer range

use regex::Regex;

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, RecordError, Resolvable, Validate,
    ValidationContext, Value,
};

// ============================================================================
// FORMAT VALIDATOR
// ============================================================================

/// Validates a value against a regular expression.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::Options;
/// use nebula_record_validator::validators::Format;
///
/// let v = Format::from_options(&Options::new().with("with", r"\A[a-z]+\z")).unwrap();
/// assert!(v.is_valid("slug"));
/// assert!(!v.is_valid("Slug"));
/// ```
#[derive(Debug, Clone)]
pub struct Format {
    pattern: Regex,
    negate: bool,
    common: CommonOptions,
}

impl Format {
    pub const KIND: &'static str = "format";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        let (source, negate) = match (
            options.string(Self::KIND, "with")?,
            options.string(Self::KIND, "without")?,
        ) {
            (Some(with), None) => (with, false),
            (None, Some(without)) => (without, true),
            (Some(_), Some(_)) => {
                return Err(ConfigurationError::invalid_option(
                    Self::KIND,
                    "with",
                    "cannot be combined with `without`",
                ));
            }
            (None, None) => return Err(ConfigurationError::missing_option(Self::KIND, "with")),
        };
        let pattern = Regex::new(&source).map_err(|source_err| ConfigurationError::InvalidPattern {
            pattern: source.clone(),
            source: source_err,
        })?;

        Ok(Self {
            pattern,
            negate,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    pub fn is_valid(&self, value: &str) -> bool {
        self.pattern.is_match(value) != self.negate
    }
}

impl Validate for Format {
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
        let text = value.to_string();
        if !self.is_valid(&text) {
            cx.add(
                self.common
                    .entry(attribute, ErrorKind::Invalid)
                    .with_param("value", text),
            );
        }
        Ok(())
    }
}

// ============================================================================
// INCLUSION VALIDATOR
// ============================================================================

/// Whether `value` is a member of `set` (a list or an integer range).
fn member_of(value: &Value, set: &Value) -> Result<bool, String> {
    match set {
        Value::List(items) => Ok(items.contains(value)),
        Value::Range(range) => Ok(value.as_i64().is_some_and(|n| range.contains(&n))),
        other => Err(format!("expected a list or a range, got {}", other.type_name())),
    }
}

/// Validates that a value belongs to a list or range.
#[derive(Debug, Clone)]
pub struct Inclusion {
    set: Resolvable,
    common: CommonOptions,
}

impl Inclusion {
    pub const KIND: &'static str = "inclusion";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        let set = match options.resolvable(Self::KIND, "in")? {
            Some(set) => set,
            None => options
                .resolvable(Self::KIND, "within")?
                .ok_or_else(|| ConfigurationError::missing_option(Self::KIND, "in"))?,
        };
        if let Resolvable::Literal(literal) = &set {
            member_of(&Value::Nil, literal)
                .map_err(|reason| ConfigurationError::invalid_option(Self::KIND, "in", reason))?;
        }

        Ok(Self {
            set,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }
}

impl Validate for Inclusion {
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
        let set = self.set.resolve(cx.record())?;
        let included = member_of(value, &set).map_err(|reason| RecordError::invalid_reference("in", reason))?;
        if !included {
            cx.add(
                self.common
                    .entry(attribute, ErrorKind::Inclusion)
                    .with_param("value", value.to_string()),
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
    use crate::foundation::{Errors, MemoryRecord};

    fn kinds(validator: &dyn Validate, record: &MemoryRecord, value: Value) -> Vec<ErrorKind> {
        let mut errors = Errors::new();
        let mut cx = ValidationContext::new(record, &mut errors);
        validator.validate_each(&mut cx, "field", &value).unwrap();
        errors.kinds_on("field")
    }

    #[test]
    fn format_with_and_without() {
        let with = Format::from_options(&Options::new().with("with", r"\A\d+\z")).unwrap();
        let without = Format::from_options(&Options::new().with("without", "admin")).unwrap();

        assert!(with.is_valid("123"));
        assert!(!with.is_valid("12a"));
        assert!(without.is_valid("guest"));
        assert!(!without.is_valid("superadmin"));
    }

    #[test]
    fn format_configuration_errors() {
        assert!(matches!(
            Format::from_options(&Options::new().with("with", "(")),
            Err(ConfigurationError::InvalidPattern { .. })
        ));
        assert!(Format::from_options(&Options::new()).is_err());
        assert!(Format::from_options(&Options::new().with("with", "a").with("without", "b")).is_err());
    }

    #[test]
    fn inclusion_in_list_and_range() {
        let record = MemoryRecord::new();
        let list = Inclusion::from_options(&Options::new().with("in", vec!["red", "green"])).unwrap();
        let range = Inclusion::from_options(&Options::new().with("within", 1..=5)).unwrap();

        assert!(kinds(&list, &record, Value::from("red")).is_empty());
        assert_eq!(kinds(&list, &record, Value::from("blue")), vec![ErrorKind::Inclusion]);
        assert!(kinds(&range, &record, Value::from(5)).is_empty());
        assert_eq!(kinds(&range, &record, Value::from(6)), vec![ErrorKind::Inclusion]);
    }

    #[test]
    fn inclusion_resolves_dynamic_sets() {
        let v = Inclusion::from_options(&Options::new().attribute("in", "choices")).unwrap();
        let record = MemoryRecord::new().with_accessor("choices", vec!["a"]);
        assert!(kinds(&v, &record, Value::from("a")).is_empty());

        let broken = MemoryRecord::new().with_accessor("choices", 3);
        let mut errors = Errors::new();
        let mut cx = ValidationContext::new(&broken, &mut errors);
        assert!(v.validate_each(&mut cx, "field", &Value::from("a")).is_err());
    }

    #[test]
    fn inclusion_rejects_scalar_literal() {
        assert!(Inclusion::from_options(&Options::new().with("in", "abc")).is_err());
    }
}
