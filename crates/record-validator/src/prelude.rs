//! Prelude module for convenient imports.
//!
//! `use nebula_record_validator::prelude::*;` brings in the record and
//! option types, the validator trait, every built-in validator and the
//! rule set runner.

// ============================================================================
// FOUNDATION: Values, records, options, errors
// ============================================================================

pub use crate::foundation::{
    CommonOptions, Computed, ConfigurationError, ErrorEntry, ErrorKind, Errors, MemoryRecord,
    OptionValue, Options, Record, RecordError, Resolvable, Validate, ValidationContext, Value,
};

// ============================================================================
// VALIDATORS AND COMBINATORS
// ============================================================================

pub use crate::combinators::{Each, ElementSource};
pub use crate::validators::{
    Email, Existence, Format, Grandparent, Hostname, Inclusion, Ipaddr, Length, Order, Presence,
    Url, WriteOnce,
};

// ============================================================================
// RULES
// ============================================================================

pub use crate::rules::{Conditions, Rule, RuleSet};
