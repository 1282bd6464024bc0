//! Core traits for the validation system
//!
//! Every rule implements [`Validate`]: it is handed a [`ValidationContext`]
//! (the record under validation plus the error collector), the attribute
//! name and the attribute's current value, and appends zero or more
//! [`ErrorEntry`]s.

use std::fmt;

use crate::foundation::error::{ConfigurationError, ErrorEntry, ErrorKind, Errors};
use crate::foundation::options::Options;
use crate::foundation::record::{Record, RecordError};
use crate::foundation::value::Value;

// ============================================================================
// COMMON OPTIONS
// ============================================================================

/// Options every validator understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonOptions {
    /// Skip nil values.
    pub allow_nil: bool,
    /// Skip blank values.
    pub allow_blank: bool,
    /// Keep going after the first failing element inside a composite.
    pub multiple_errors: bool,
    /// Overrides the rendered message of every emitted error.
    pub message: Option<String>,
}

impl CommonOptions {
    pub fn from_options(validator: &str, options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            allow_nil: options.flag(validator, "allow_nil")?,
            allow_blank: options.flag(validator, "allow_blank")?,
            multiple_errors: options.flag(validator, "multiple_errors")?,
            message: options.string(validator, "message")?,
        })
    }

    /// Starts an error entry carrying the configured message override.
    pub fn entry(&self, attribute: &str, kind: ErrorKind) -> ErrorEntry {
        ErrorEntry::new(attribute, kind).with_message(self.message.as_deref())
    }
}

// ============================================================================
// VALIDATION CONTEXT
// ============================================================================

/// Per-invocation state: the record being validated, the error collector
/// and, inside hash-values composites, the key of the current entry.
///
/// The element key lives only in the child context returned by
/// [`for_element`](Self::for_element) and disappears with it, so nothing
/// outlives one sub-validator call.
pub struct ValidationContext<'a> {
    record: &'a dyn Record,
    errors: &'a mut Errors,
    element_key: Option<&'a str>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(record: &'a dyn Record, errors: &'a mut Errors) -> Self {
        Self {
            record,
            errors,
            element_key: None,
        }
    }

    #[must_use]
    pub fn record(&self) -> &'a dyn Record {
        self.record
    }

    /// Number of errors recorded so far in this pass.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Key of the map entry currently being validated, if any.
    #[must_use]
    pub fn element_key(&self) -> Option<&str> {
        self.element_key
    }

    /// Appends an error, tagging it with the current element key.
    pub fn add(&mut self, entry: ErrorEntry) {
        let entry = match self.element_key {
            Some(key) if entry.element_key.is_none() => entry.with_element_key(key),
            _ => entry,
        };
        self.errors.add(entry);
    }

    /// Child context scoped to one map entry.
    pub fn for_element<'b>(&'b mut self, key: &'b str) -> ValidationContext<'b> {
        ValidationContext {
            record: self.record,
            errors: &mut *self.errors,
            element_key: Some(key),
        }
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("errors", &self.errors.len())
            .field("element_key", &self.element_key)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CORE VALIDATOR TRAIT
// ============================================================================

/// The trait all record validators implement.
///
/// Instances are built once from [`Options`] and shared read-only across
/// validation passes.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{
///     CommonOptions, ErrorKind, Errors, MemoryRecord, RecordError, Validate, ValidationContext,
///     Value,
/// };
///
/// #[derive(Debug, Default)]
/// struct Lowercase {
///     common: CommonOptions,
/// }
///
/// impl Validate for Lowercase {
///     fn kind(&self) -> &'static str {
///         "lowercase"
///     }
///
///     fn common(&self) -> &CommonOptions {
///         &self.common
///     }
///
///     fn validate_each(
///         &self,
///         cx: &mut ValidationContext<'_>,
///         attribute: &str,
///         value: &Value,
///     ) -> Result<(), RecordError> {
///         if value.as_str().is_some_and(|s| s.chars().any(char::is_uppercase)) {
///             cx.add(self.common.entry(attribute, ErrorKind::Invalid));
///         }
///         Ok(())
///     }
/// }
///
/// let record = MemoryRecord::new();
/// let mut errors = Errors::new();
/// let mut cx = ValidationContext::new(&record, &mut errors);
/// Lowercase::default()
///     .validate_each(&mut cx, "slug", &Value::from("Hello"))
///     .unwrap();
/// assert_eq!(errors.len(), 1);
/// ```
pub trait Validate: fmt::Debug + Send + Sync {
    /// Registry token of this validator.
    fn kind(&self) -> &'static str;

    fn common(&self) -> &CommonOptions;

    /// Validates one value of `attribute`, appending failures to `cx`.
    ///
    /// Returns `Err` only for faults (missing accessors, failing computed
    /// options), never for invalid data.
    fn validate_each(
        &self,
        cx: &mut ValidationContext<'_>,
        attribute: &str,
        value: &Value,
    ) -> Result<(), RecordError>;

    /// Validators that must run even when `allow_nil`/`allow_blank` would
    /// skip the value.
    fn always_evaluates(&self) -> bool {
        false
    }

    /// Whether this value is skipped under the validator's own
    /// `allow_nil`/`allow_blank`.
    fn skips(&self, value: &Value) -> bool {
        if self.always_evaluates() {
            return false;
        }
        let common = self.common();
        (common.allow_nil && value.is_nil()) || (common.allow_blank && value.is_blank())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::record::MemoryRecord;

    #[derive(Debug, Default)]
    struct AlwaysFails {
        common: CommonOptions,
        always: bool,
    }

    impl Validate for AlwaysFails {
        fn kind(&self) -> &'static str {
            "always_fails"
        }

        fn common(&self) -> &CommonOptions {
            &self.common
        }

        fn validate_each(
            &self,
            cx: &mut ValidationContext<'_>,
            attribute: &str,
            _value: &Value,
        ) -> Result<(), RecordError> {
            cx.add(self.common.entry(attribute, ErrorKind::Invalid));
            Ok(())
        }

        fn always_evaluates(&self) -> bool {
            self.always
        }
    }

    #[test]
    fn common_options_read_flags_and_message() {
        let options = Options::new()
            .with("allow_nil", true)
            .with("multiple_errors", true)
            .with("message", "is off");
        let common = CommonOptions::from_options("t", &options).unwrap();

        assert!(common.allow_nil);
        assert!(!common.allow_blank);
        assert!(common.multiple_errors);
        assert_eq!(common.message.as_deref(), Some("is off"));
    }

    #[test]
    fn skips_honours_allow_nil_unless_always_evaluating() {
        let mut validator = AlwaysFails {
            common: CommonOptions {
                allow_nil: true,
                ..CommonOptions::default()
            },
            always: false,
        };
        assert!(validator.skips(&Value::Nil));
        assert!(!validator.skips(&Value::from("")));

        validator.always = true;
        assert!(!validator.skips(&Value::Nil));
    }

    #[test]
    fn element_key_is_scoped_to_child_context() {
        let record = MemoryRecord::new();
        let mut errors = Errors::new();
        let mut cx = ValidationContext::new(&record, &mut errors);
        let validator = AlwaysFails::default();
        let key = "color";

        {
            let mut child = cx.for_element(key);
            assert_eq!(child.element_key(), Some(key));
            validator.validate_each(&mut child, "tags", &Value::Nil).unwrap();
        }
        assert!(cx.element_key().is_none());
        validator.validate_each(&mut cx, "tags", &Value::Nil).unwrap();

        assert_eq!(errors.entries()[0].element_key.as_deref(), Some("color"));
        assert_eq!(errors.entries()[1].element_key, None);
    }
}
