//! Presence checks.
//!
//! # Validators
//!
//! - [`Presence`] - the value must not be blank
//! - [`Existence`] - same check, but never skipped by `allow_nil` /
//!   `allow_blank`, so composites can force it per element

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, RecordError, Validate,
    ValidationContext, Value,
};

fn check_present(
    common: &CommonOptions,
    cx: &mut ValidationContext<'_>,
    attribute: &str,
    value: &Value,
) {
    if value.is_blank() {
        cx.add(common.entry(attribute, ErrorKind::Blank));
    }
}

/// Fails on nil, `false`, whitespace-only strings and empty collections.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    common: CommonOptions,
}

impl Presence {
    pub const KIND: &'static str = "presence";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }
}

impl Validate for Presence {
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
        check_present(&self.common, cx, attribute, value);
        Ok(())
    }
}

/// [`Presence`] that ignores `allow_nil` / `allow_blank`.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{Options, Validate, Value};
/// use nebula_record_validator::validators::Existence;
///
/// let v = Existence::from_options(&Options::new().with("allow_nil", true)).unwrap();
/// assert!(!v.skips(&Value::Nil));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Existence {
    common: CommonOptions,
}

impl Existence {
    pub const KIND: &'static str = "existence";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }
}

impl Validate for Existence {
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
        check_present(&self.common, cx, attribute, value);
        Ok(())
    }

    fn always_evaluates(&self) -> bool {
        true
    }
}
