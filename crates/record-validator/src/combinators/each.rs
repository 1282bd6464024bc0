//! EACH combinator - applies sub-rules to every element of a container
//!
//! Three element sources:
//! - `array`: list elements (a scalar counts as a one-element list)
//! - `hash_keys`: the keys of a map, in map order
//! - `hash_values`: the values of a map, in map order, with each error
//!   tagged by the key whose value failed
//!
//! By default each sub-rule stops at its first failing element, so a
//! collection yields at most one error per sub-rule. `multiple_errors`
//! (on the composite or on one sub-rule) lifts that limit.

use std::borrow::Cow;

use tracing::trace;

use crate::foundation::{
    CommonOptions, ConfigurationError, Options, RecordError, Validate, ValidationContext, Value,
};
use crate::registry;

// ============================================================================
// ELEMENT SOURCE
// ============================================================================

/// Where a composite takes its elements from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSource {
    Array,
    HashKeys,
    HashValues,
}

impl ElementSource {
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::HashKeys => "hash_keys",
            Self::HashValues => "hash_values",
        }
    }
}

/// One element to validate; `key` is set for hash values.
#[derive(Debug)]
struct Element<'v> {
    key: Option<&'v str>,
    value: Cow<'v, Value>,
}

impl<'v> Element<'v> {
    fn borrowed(value: &'v Value) -> Self {
        Self {
            key: None,
            value: Cow::Borrowed(value),
        }
    }

    fn owned(value: Value) -> Self {
        Self {
            key: None,
            value: Cow::Owned(value),
        }
    }
}

fn elements(source: ElementSource, container: &Value) -> Vec<Element<'_>> {
    match (source, container) {
        (_, Value::Nil) => Vec::new(),
        (ElementSource::Array, Value::List(items)) => items.iter().map(Element::borrowed).collect(),
        (ElementSource::Array, Value::Map(entries)) => entries
            .iter()
            .map(|(k, v)| Element::owned(Value::List(vec![Value::from(k.as_str()), v.clone()])))
            .collect(),
        (ElementSource::Array, Value::Range(range)) => range.clone().map(|n| Element::owned(Value::Int(n))).collect(),
        (ElementSource::Array, scalar) => vec![Element::borrowed(scalar)],
        (ElementSource::HashKeys, Value::Map(entries)) => entries
            .keys()
            .map(|k| Element::owned(Value::from(k.as_str())))
            .collect(),
        (ElementSource::HashValues, Value::Map(entries)) => entries
            .iter()
            .map(|(k, v)| Element {
                key: Some(k.as_str()),
                value: Cow::Borrowed(v),
            })
            .collect(),
        // not a map: nothing to iterate
        (ElementSource::HashKeys | ElementSource::HashValues, _) => Vec::new(),
    }
}

// ============================================================================
// EACH COMBINATOR
// ============================================================================

/// Validates each element of a container against a set of sub-rules.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::combinators::Each;
/// use nebula_record_validator::foundation::{
///     Errors, MemoryRecord, Options, Validate, ValidationContext, Value,
/// };
///
/// let validator = Each::array(
///     &Options::new()
///         .with("hostname", true)
///         .nested("length", Options::new().with("maximum", 11)),
/// )
/// .unwrap();
///
/// let record = MemoryRecord::new();
/// let mut errors = Errors::new();
/// let mut cx = ValidationContext::new(&record, &mut errors);
/// let hosts = Value::list(["example.com", "-bad.com", "also-bad-.com"]);
/// validator.validate_each(&mut cx, "domains", &hosts).unwrap();
///
/// // one error per sub-rule, not one per failing element
/// assert_eq!(errors.len(), 2);
/// ```
#[derive(Debug)]
pub struct Each {
    source: ElementSource,
    validators: Vec<Box<dyn Validate>>,
    common: CommonOptions,
}

impl Each {
    /// Composite over list elements.
    pub fn array(options: &Options) -> Result<Self, ConfigurationError> {
        Self::from_options(ElementSource::Array, options)
    }

    /// Composite over map keys.
    pub fn hash_keys(options: &Options) -> Result<Self, ConfigurationError> {
        Self::from_options(ElementSource::HashKeys, options)
    }

    /// Composite over map values.
    pub fn hash_values(options: &Options) -> Result<Self, ConfigurationError> {
        Self::from_options(ElementSource::HashValues, options)
    }

    /// Builds the sub-rules named in `options` through the registry.
    pub fn from_options(source: ElementSource, options: &Options) -> Result<Self, ConfigurationError> {
        let validators = registry::sub_validators(source.kind(), options)?;
        let common = CommonOptions::from_options(source.kind(), options)?;
        Ok(Self {
            source,
            validators,
            common,
        })
    }

    /// Composite over already-built sub-validators.
    pub fn new(
        source: ElementSource,
        validators: Vec<Box<dyn Validate>>,
        common: CommonOptions,
    ) -> Result<Self, ConfigurationError> {
        if validators.is_empty() {
            return Err(ConfigurationError::EmptyComposite {
                rule: source.kind().to_owned(),
            });
        }
        Ok(Self {
            source,
            validators,
            common,
        })
    }

    #[must_use]
    pub fn source(&self) -> ElementSource {
        self.source
    }

    /// Sub-validators in configuration order.
    #[must_use]
    pub fn validators(&self) -> &[Box<dyn Validate>] {
        &self.validators
    }
}

impl Validate for Each {
    fn kind(&self) -> &'static str {
        self.source.kind()
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
        let elements = elements(self.source, value);

        for validator in &self.validators {
            let error_count = cx.error_count();

            for element in &elements {
                if validator.skips(&element.value) {
                    trace!(attribute, rule = validator.kind(), "skipped nil/blank element");
                    continue;
                }

                match element.key {
                    Some(key) => validator.validate_each(&mut cx.for_element(key), attribute, &element.value)?,
                    None => validator.validate_each(cx, attribute, &element.value)?,
                }

                // one error per sub-rule unless asked for more
                if !validator.common().multiple_errors && cx.error_count() != error_count {
                    trace!(attribute, rule = validator.kind(), "stopping after first failing element");
                    break;
                }
            }
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
    use crate::foundation::{ErrorKind, Errors, MemoryRecord};
    use pretty_assertions::assert_eq;

    fn run(validator: &Each, value: &Value) -> Errors {
        let record = MemoryRecord::new();
        let mut errors = Errors::new();
        let mut cx = ValidationContext::new(&record, &mut errors);
        validator.validate_each(&mut cx, "field", value).unwrap();
        errors
    }

    #[test]
    fn coerces_containers() {
        let map = Value::map([("a", 1), ("b", 2)]);

        assert!(elements(ElementSource::Array, &Value::Nil).is_empty());
        assert_eq!(elements(ElementSource::Array, &Value::from("x")).len(), 1);
        assert_eq!(elements(ElementSource::Array, &Value::from(1..=3)).len(), 3);
        assert_eq!(elements(ElementSource::Array, &map).len(), 2);

        let keys: Vec<Value> = elements(ElementSource::HashKeys, &map)
            .into_iter()
            .map(|e| e.value.into_owned())
            .collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);

        let values = elements(ElementSource::HashValues, &map);
        assert_eq!(values[1].key, Some("b"));
        assert_eq!(*values[1].value, Value::from(2));

        assert!(elements(ElementSource::HashValues, &Value::from("x")).is_empty());
    }

    #[test]
    fn stops_after_first_error_per_sub_rule() {
        let v = Each::array(&Options::new().with("presence", true).with("hostname", true)).unwrap();
        let errors = run(&v, &Value::list(["", "example.com", ""]));

        assert_eq!(
            errors.kinds_on("field"),
            vec![ErrorKind::Blank, ErrorKind::InvalidHostname]
        );
    }

    #[test]
    fn multiple_errors_reports_every_element() {
        let v = Each::array(
            &Options::new()
                .with("multiple_errors", true)
                .with("presence", true),
        )
        .unwrap();
        let errors = run(&v, &Value::list(["", "x", " "]));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn multiple_errors_on_one_sub_rule_only() {
        let v = Each::array(
            &Options::new()
                .nested("presence", Options::new().with("multiple_errors", true))
                .with("hostname", true),
        )
        .unwrap();
        let errors = run(&v, &Value::list(["", ""]));

        assert_eq!(
            errors.kinds_on("field"),
            vec![ErrorKind::Blank, ErrorKind::Blank, ErrorKind::InvalidHostname]
        );
    }

    #[test]
    fn allow_nil_skips_elements_except_for_existence() {
        let presence = Each::array(&Options::new().with("allow_nil", true).with("presence", true)).unwrap();
        let existence = Each::array(&Options::new().with("allow_nil", true).with("existence", true)).unwrap();
        let value = Value::List(vec![Value::Nil, Value::from("x")]);

        assert!(run(&presence, &value).is_empty());
        assert_eq!(run(&existence, &value).kinds_on("field"), vec![ErrorKind::Blank]);
    }

    #[test]
    fn hash_values_tag_errors_with_their_key() {
        let v = Each::hash_values(&Options::new().with("multiple_errors", true).with("presence", true)).unwrap();
        let errors = run(&v, &Value::map([("color", ""), ("size", "L"), ("fit", "")]));

        let keys: Vec<Option<&str>> = errors.iter().map(|e| e.element_key.as_deref()).collect();
        assert_eq!(keys, vec![Some("color"), Some("fit")]);
    }

    #[test]
    fn hash_keys_validate_keys() {
        let v = Each::hash_keys(&Options::new().with("format", r"\A[a-z]+\z")).unwrap();
        assert!(run(&v, &Value::map([("ok", 1)])).is_empty());
        assert_eq!(run(&v, &Value::map([("Bad", 1)])).len(), 1);
    }

    #[test]
    fn empty_composites_are_rejected() {
        assert!(matches!(
            Each::array(&Options::new()),
            Err(ConfigurationError::EmptyComposite { .. })
        ));
        assert!(Each::new(ElementSource::Array, Vec::new(), CommonOptions::default()).is_err());
    }

    #[test]
    fn unknown_sub_rule_is_rejected() {
        assert!(matches!(
            Each::array(&Options::new().with("bogus", true)),
            Err(ConfigurationError::UnknownValidator { .. })
        ));
    }
}
