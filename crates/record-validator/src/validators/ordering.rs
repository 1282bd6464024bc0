//! Attribute ordering: `before` and `after`.
//!
//! Compares the value against one or more targets: other attributes,
//! computed values or the `now` marker. Nil on either side skips that
//! comparison; combine with `presence` to require a value.

use std::cmp::Ordering;

use chrono::Utc;

use crate::foundation::{
    CommonOptions, Computed, ConfigurationError, ErrorKind, OptionValue, Options, Record,
    RecordError, Validate, ValidationContext, Value,
};

/// Options naming the comparison targets, in lookup order.
const TARGET_KEYS: [&str; 4] = ["value_of", "values_of", "in", "with"];

const NOW: &str = "now";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

impl Direction {
    fn kind(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    fn error_kind(self) -> ErrorKind {
        match self {
            Self::Before => ErrorKind::Before,
            Self::After => ErrorKind::After,
        }
    }

    fn expected(self) -> Ordering {
        match self {
            Self::Before => Ordering::Less,
            Self::After => Ordering::Greater,
        }
    }
}

/// One comparison target.
#[derive(Debug, Clone)]
pub enum Target {
    Attribute(String),
    Computed(Computed),
    /// Current time, unless the record has its own `now` accessor.
    Now,
}

impl Target {
    fn named(name: &str) -> Self {
        if name == NOW {
            Self::Now
        } else {
            Self::Attribute(name.to_owned())
        }
    }

    fn resolve(&self, record: &dyn Record) -> Result<Value, RecordError> {
        match self {
            Self::Attribute(name) => record.invoke(name),
            Self::Computed(computed) => computed.call(record),
            Self::Now if record.responds_to(NOW) => record.invoke(NOW),
            Self::Now => Ok(Value::Time(Utc::now())),
        }
    }

    fn label(&self, record: &dyn Record) -> String {
        match self {
            Self::Attribute(name) => record.human_attribute_name(name),
            Self::Computed(computed) => computed.label().to_owned(),
            Self::Now => record.human_attribute_name(NOW),
        }
    }
}

fn targets_from(direction: Direction, key: &str, option: &OptionValue) -> Result<Vec<Target>, ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::invalid_option(direction.kind(), key, reason);
    match option {
        OptionValue::Attribute(name) => Ok(vec![Target::Attribute(name.clone())]),
        OptionValue::Computed(computed) => Ok(vec![Target::Computed(computed.clone())]),
        OptionValue::Literal(Value::Str(name)) => Ok(vec![Target::named(name)]),
        OptionValue::Literal(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Value::Str(name) => Ok(Target::named(name)),
                _ => Err(invalid("must list attribute names")),
            })
            .collect(),
        _ => Err(invalid("must name attributes or be computed")),
    }
}

// ============================================================================
// ORDER VALIDATOR
// ============================================================================

/// `before` / `after` validator.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{Errors, MemoryRecord, Options, Validate, ValidationContext, Value};
/// use nebula_record_validator::validators::Order;
///
/// let record = MemoryRecord::new().with_attribute("finish_at", 10);
/// let before = Order::before(&Options::new().with("value_of", "finish_at")).unwrap();
///
/// let mut errors = Errors::new();
/// let mut cx = ValidationContext::new(&record, &mut errors);
/// before.validate_each(&mut cx, "start_at", &Value::from(12)).unwrap();
/// assert_eq!(errors.entries()[0].param("attribute2"), Some("Finish at"));
/// ```
#[derive(Debug, Clone)]
pub struct Order {
    direction: Direction,
    targets: Vec<Target>,
    common: CommonOptions,
}

impl Order {
    pub fn before(options: &Options) -> Result<Self, ConfigurationError> {
        Self::from_options(Direction::Before, options)
    }

    pub fn after(options: &Options) -> Result<Self, ConfigurationError> {
        Self::from_options(Direction::After, options)
    }

    pub fn from_options(direction: Direction, options: &Options) -> Result<Self, ConfigurationError> {
        let (key, option) = TARGET_KEYS
            .iter()
            .find_map(|key| options.get(key).map(|option| (*key, option)))
            .ok_or_else(|| ConfigurationError::missing_option(direction.kind(), "value_of"))?;

        Ok(Self {
            direction,
            targets: targets_from(direction, key, option)?,
            common: CommonOptions::from_options(direction.kind(), options)?,
        })
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}

impl Validate for Order {
    fn kind(&self) -> &'static str {
        self.direction.kind()
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
        if value.is_nil() {
            return Ok(());
        }
        let record = cx.record();
        for target in &self.targets {
            let other = target.resolve(record)?;
            if other.is_nil() {
                continue;
            }
            // incomparable pairs fail as well
            if value.compare(&other) == Some(self.direction.expected()) {
                continue;
            }
            cx.add(
                self.common
                    .entry(attribute, self.direction.error_kind())
                    .with_param("attribute2", target.label(record))
                    .with_param("value", value.to_string())
                    .with_param("compared_to", other.to_string()),
            );
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
