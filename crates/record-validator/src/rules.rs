//! Rule sets - attribute/rule bindings and the validation pass
//!
//! A [`RuleSet`] binds rules to attributes, the way a record model declares
//! `validates :domain, hostname: true, allow_nil: true`. Running it reads each
//! attribute from the record, applies the rule's conditionals and
//! `allow_nil`/`allow_blank`, and collects every failure into one [`Errors`].
//!
//! # Conditionals
//!
//! - `if` / `unless`: an attribute name (or list of names), an attribute
//!   reference, a computed option or a literal; the rule runs when every
//!   `if` resolves truthy and no `unless` does.
//! - `on`: a validation context name (or list). [`RuleSet::validate`] uses
//!   `create` for unpersisted records and `update` for persisted ones.
//!
//! Conditionals are only read here; composites reject them on sub-rules.
//!
//! # Declarative form
//!
//! ```
//! use nebula_record_validator::foundation::MemoryRecord;
//! use nebula_record_validator::rules::RuleSet;
//!
//! let rules = RuleSet::from_json_str(
//!     r#"[
//!         {"attributes": "domain", "hostname": true, "allow_nil": true},
//!         {"attributes": ["tags"], "array": {"length": {"maximum": 8}}}
//!     ]"#,
//! )
//! .unwrap();
//!
//! let record = MemoryRecord::new()
//!     .with_attribute("domain", "-bad.com")
//!     .with_attribute("tags", vec!["ok", "much-too-long"]);
//! let errors = rules.validate(&record).unwrap();
//! assert_eq!(errors.len(), 2);
//! ```

use serde::Deserialize;
use tracing::{debug, trace};

use crate::foundation::{
    ConfigurationError, Errors, OptionValue, Options, Record, RecordError, Resolvable, Validate,
    ValidationContext, Value,
};
use crate::registry::{self, CONDITIONAL_KEYS};

// ============================================================================
// CONDITIONS
// ============================================================================

/// `if` / `unless` / `on` of one rule.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    if_: Vec<Resolvable>,
    unless: Vec<Resolvable>,
    on: Vec<String>,
}

impl Conditions {
    /// Reads the conditional keys of `rule`'s options.
    pub fn from_options(rule: &str, options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            if_: predicates(rule, "if", options.get("if"))?,
            unless: predicates(rule, "unless", options.get("unless"))?,
            on: contexts(rule, options.get("on"))?,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.if_.is_empty() && self.unless.is_empty() && self.on.is_empty()
    }

    /// Whether the rule applies to `record` in validation `context`.
    pub fn permit(&self, record: &dyn Record, context: &str) -> Result<bool, RecordError> {
        if !self.on.is_empty() && !self.on.iter().any(|on| on == context) {
            return Ok(false);
        }
        for condition in &self.if_ {
            if !condition.resolve(record)?.is_truthy() {
                return Ok(false);
            }
        }
        for condition in &self.unless {
            if condition.resolve(record)?.is_truthy() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// A bare string names an attribute; a list of strings names several.
fn predicates(
    rule: &str,
    key: &str,
    value: Option<&OptionValue>,
) -> Result<Vec<Resolvable>, ConfigurationError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    match value {
        OptionValue::Literal(Value::Str(name)) => Ok(vec![Resolvable::Attribute(name.clone())]),
        OptionValue::Literal(Value::List(items)) => items
            .iter()
            .map(|item| match item {
                Value::Str(name) => Ok(Resolvable::Attribute(name.clone())),
                other => Ok(Resolvable::Literal(other.clone())),
            })
            .collect(),
        other => Ok(vec![other.to_resolvable(rule, key)?]),
    }
}

fn contexts(rule: &str, value: Option<&OptionValue>) -> Result<Vec<String>, ConfigurationError> {
    let invalid = || ConfigurationError::invalid_option(rule, "on", "must name a validation context");
    match value {
        None | Some(OptionValue::Literal(Value::Nil)) => Ok(Vec::new()),
        Some(OptionValue::Literal(Value::Str(context))) => Ok(vec![context.clone()]),
        Some(OptionValue::Literal(Value::List(items))) => items
            .iter()
            .map(|item| item.as_str().map(str::to_owned).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

// ============================================================================
// RULE
// ============================================================================

/// One validator bound to one or more attributes.
#[derive(Debug)]
pub struct Rule {
    attributes: Vec<String>,
    validator: Box<dyn Validate>,
    conditions: Conditions,
}

impl Rule {
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    #[must_use]
    pub fn validator(&self) -> &dyn Validate {
        self.validator.as_ref()
    }

    #[must_use]
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }
}

// ============================================================================
// RULE SET
// ============================================================================

/// An ordered list of rules, validated together.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{ErrorKind, MemoryRecord, Options, Value};
/// use nebula_record_validator::rules::RuleSet;
///
/// let rules = RuleSet::new()
///     .validates(&["email"], &Options::new().with("presence", true).with("email", true))
///     .unwrap()
///     .validates(&["finish_at"], &Options::new().with("after", "start_at").with("allow_nil", true))
///     .unwrap();
///
/// let record = MemoryRecord::new()
///     .with_attribute("email", "not-an-email")
///     .with_attribute("finish_at", Value::Nil);
/// let errors = rules.validate(&record).unwrap();
/// assert_eq!(errors.kinds_on("email"), vec![ErrorKind::InvalidEmail]);
/// ```
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one rule per rule token in `options` for every attribute.
    ///
    /// Default keys (`allow_nil`, `if`, `message`, ...) apply to every rule
    /// and are overridden by a rule's own nested options. Rules switched
    /// off with `false` or nil are ignored.
    pub fn validates(mut self, attributes: &[&str], options: &Options) -> Result<Self, ConfigurationError> {
        if attributes.is_empty() {
            return Err(ConfigurationError::NoAttributes);
        }
        let (defaults, rules) = registry::split_rules(options);
        if rules.is_empty() {
            return Err(ConfigurationError::NoValidations);
        }

        for (name, value) in rules {
            let Some(own) = registry::rule_options(value) else {
                trace!(rule = name, "rule switched off");
                continue;
            };
            let options = defaults.merge(&own);
            let conditions = Conditions::from_options(name, &options)?;
            let validator = registry::build(name, &options.without(CONDITIONAL_KEYS))?;

            debug!(rule = name, ?attributes, conditional = !conditions.is_empty(), "configured rule");
            self.rules.push(Rule {
                attributes: attributes.iter().map(|a| (*a).to_owned()).collect(),
                validator,
                conditions,
            });
        }
        Ok(self)
    }

    /// Reads a JSON array of rule documents.
    ///
    /// Each document names its `attributes` (a string or a list) and carries
    /// the same keys [`validates`](Self::validates) accepts.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ConfigurationError> {
        let specs: Vec<RuleSpec> = serde_json::from_value(json.clone())?;
        Self::from_specs(specs)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    fn from_specs(specs: Vec<RuleSpec>) -> Result<Self, ConfigurationError> {
        specs.into_iter().try_fold(Self::new(), |set, spec| {
            let attributes = spec.attributes.into_vec();
            let attributes: Vec<&str> = attributes.iter().map(String::as_str).collect();
            let options = Options::from_json(&serde_json::Value::Object(spec.options))?;
            set.validates(&attributes, &options)
        })
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validates `record` in its default context.
    pub fn validate(&self, record: &dyn Record) -> Result<Errors, RecordError> {
        let context = if record.is_persisted() { "update" } else { "create" };
        self.validate_in(record, context)
    }

    /// Validates `record` in the named context.
    ///
    /// Returns `Err` only for faults (unknown accessors, failing computed
    /// options); invalid data ends up in the returned [`Errors`].
    pub fn validate_in(&self, record: &dyn Record, context: &str) -> Result<Errors, RecordError> {
        let mut errors = Errors::new();

        for rule in &self.rules {
            let kind = rule.validator.kind();
            if !rule.conditions.permit(record, context)? {
                trace!(rule = kind, context, "conditions not met");
                continue;
            }

            for attribute in &rule.attributes {
                let value = record.read(attribute)?;
                if rule.validator.skips(&value) {
                    trace!(rule = kind, attribute = attribute.as_str(), "skipped nil/blank value");
                    continue;
                }
                trace!(rule = kind, attribute = attribute.as_str(), "validating");
                let mut cx = ValidationContext::new(record, &mut errors);
                rule.validator.validate_each(&mut cx, attribute, &value)?;
            }
        }
        Ok(errors)
    }
}

// ============================================================================
// JSON DOCUMENTS
// ============================================================================

#[derive(Debug, Deserialize)]
struct RuleSpec {
    #[serde(alias = "attribute")]
    attributes: OneOrMany,
    #[serde(flatten)]
    options: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
