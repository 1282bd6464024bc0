//! Rule registry
//!
//! Maps rule tokens (`hostname`, `array`, `before`, ...) to typed factory
//! functions. Lookups happen while rules are configured, so an unknown
//! token is a [`ConfigurationError`] at load time, never a failure on some
//! later validation pass.
//!
//! This module also owns the option conventions shared by composites and
//! rule sets: which keys are defaults rather than rule names, which of those
//! are conditionals, and the sub-rule shorthand.

use tracing::debug;

use crate::combinators::Each;
use crate::foundation::{ConfigurationError, OptionValue, Options, Validate, Value};
use crate::validators::{
    Email, Existence, Format, Grandparent, Hostname, Inclusion, Ipaddr, Length, Order, Presence,
    Url, WriteOnce,
};

// ============================================================================
// REGISTRY
// ============================================================================

/// Builds a validator from its options.
pub type Factory = fn(&Options) -> Result<Box<dyn Validate>, ConfigurationError>;

/// Every registered rule token.
pub const NAMES: &[&str] = &[
    "array",
    "hash_keys",
    "hash_values",
    "hostname",
    "email",
    "url",
    "ipaddr",
    "before",
    "after",
    "grandparent",
    "write_once",
    "worm",
    "existence",
    "presence",
    "format",
    "inclusion",
    "length",
];

fn boxed<V: Validate + 'static>(validator: Result<V, ConfigurationError>) -> Result<Box<dyn Validate>, ConfigurationError> {
    validator.map(|v| Box::new(v) as Box<dyn Validate>)
}

/// Factory registered under `name`.
pub fn lookup(name: &str) -> Option<Factory> {
    let factory: Factory = match name {
        "array" => |o| boxed(Each::array(o)),
        "hash_keys" => |o| boxed(Each::hash_keys(o)),
        "hash_values" => |o| boxed(Each::hash_values(o)),
        "hostname" => |o| boxed(Hostname::from_options(o)),
        "email" => |o| boxed(Email::from_options(o)),
        "url" => |o| boxed(Url::from_options(o)),
        "ipaddr" => |o| boxed(Ipaddr::from_options(o)),
        "before" => |o| boxed(Order::before(o)),
        "after" => |o| boxed(Order::after(o)),
        "grandparent" => |o| boxed(Grandparent::from_options(o)),
        "write_once" => |o| boxed(WriteOnce::from_options(o)),
        "worm" => |o| boxed(WriteOnce::named(WriteOnce::WORM, o)),
        "existence" => |o| boxed(Existence::from_options(o)),
        "presence" => |o| boxed(Presence::from_options(o)),
        "format" => |o| boxed(Format::from_options(o)),
        "inclusion" => |o| boxed(Inclusion::from_options(o)),
        "length" => |o| boxed(Length::from_options(o)),
        _ => return None,
    };
    Some(factory)
}

/// Builds the validator registered under `name`.
pub fn build(name: &str, options: &Options) -> Result<Box<dyn Validate>, ConfigurationError> {
    let factory = lookup(name).ok_or_else(|| ConfigurationError::UnknownValidator {
        name: name.to_owned(),
    })?;
    factory(options)
}

// ============================================================================
// OPTION CONVENTIONS
// ============================================================================

/// Keys that configure a rule rather than name one.
pub const DEFAULT_KEYS: &[&str] = &[
    "if",
    "unless",
    "on",
    "allow_nil",
    "allow_blank",
    "multiple_errors",
    "message",
];

/// Default keys that make a rule conditional.
pub const CONDITIONAL_KEYS: &[&str] = &["if", "unless", "on"];

/// Expands sub-rule shorthand into options; `None` means the rule is
/// switched off.
///
/// - `true` → no options
/// - `false` / nil → skipped
/// - a list or a range → `{in: value}`
/// - a nested mapping → itself
/// - anything else → `{with: value}`
pub fn rule_options(value: &OptionValue) -> Option<Options> {
    match value {
        OptionValue::Literal(Value::Bool(true)) => Some(Options::new()),
        OptionValue::Literal(Value::Nil | Value::Bool(false)) => None,
        OptionValue::Literal(Value::List(_) | Value::Range(_)) => Some(Options::new().with("in", value.clone())),
        OptionValue::Nested(options) => Some(options.clone()),
        other => Some(Options::new().with("with", other.clone())),
    }
}

/// Splits an option mapping into shared defaults and named rules.
pub fn split_rules(options: &Options) -> (Options, Vec<(&str, &OptionValue)>) {
    let defaults = options.only(DEFAULT_KEYS);
    let rules = options
        .iter()
        .filter(|(key, _)| !DEFAULT_KEYS.contains(key))
        .collect();
    (defaults, rules)
}

/// Builds the sub-validators of a composite named `rule`.
///
/// Each sub-rule gets the composite's defaults (minus conditionals) with
/// its own options layered on top. Sub-rules may not carry conditionals.
pub fn sub_validators(rule: &str, options: &Options) -> Result<Vec<Box<dyn Validate>>, ConfigurationError> {
    let (defaults, rules) = split_rules(options);
    let inherited = defaults.without(CONDITIONAL_KEYS);

    let mut validators = Vec::with_capacity(rules.len());
    for (name, value) in rules {
        let Some(own) = rule_options(value) else {
            continue;
        };
        if own.contains_any(CONDITIONAL_KEYS) {
            return Err(ConfigurationError::ConditionalOnSubValidator {
                rule: rule.to_owned(),
            });
        }
        validators.push(build(name, &inherited.merge(&own))?);
    }

    if validators.is_empty() {
        return Err(ConfigurationError::EmptyComposite {
            rule: rule.to_owned(),
        });
    }
    debug!(
        rule,
        sub_rules = ?validators.iter().map(|v| v.kind()).collect::<Vec<_>>(),
        "configured composite"
    );
    Ok(validators)
}

// ============================================================================
// TESTS
// ============================================================================
