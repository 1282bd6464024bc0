//! The host record capability.
//!
//! Validators never see a concrete model type. They talk to the host object
//! model through [`Record`]: attribute reads, the pre-change snapshot,
//! change tracking, persistence state and generic named-accessor dispatch.
//! Errors are appended to a separate [`Errors`](crate::foundation::Errors)
//! collector threaded through [`ValidationContext`](crate::foundation::ValidationContext).

use indexmap::IndexMap;

use crate::foundation::value::Value;

// ============================================================================
// RECORD ERROR
// ============================================================================

/// A fault raised while reading from a record.
///
/// These indicate schema or configuration bugs, not bad input data, and are
/// propagated to the caller of the validation pass instead of being turned
/// into validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The record has no accessor with this name.
    #[error("undefined accessor `{name}`")]
    UnknownAccessor { name: String },

    /// An accessor was expected to return an associated record.
    #[error("accessor `{accessor}` did not return a record")]
    NotARecord { accessor: String },

    /// A dynamic option resolved to something the validator cannot use.
    #[error("option `{option}` resolved to an unusable value: {reason}")]
    InvalidReference { option: String, reason: String },

    /// A record-computed option failed.
    #[error("computed value failed: {0}")]
    Computation(String),
}

impl RecordError {
    pub fn unknown_accessor(name: impl Into<String>) -> Self {
        Self::UnknownAccessor { name: name.into() }
    }

    pub fn invalid_reference(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// RECORD TRAIT
// ============================================================================

/// Capabilities the validators consume from the host record model.
pub trait Record: Send + Sync {
    /// Reads an attribute for validation.
    fn read(&self, attribute: &str) -> Result<Value, RecordError> {
        self.invoke(attribute)
    }

    /// Reads the value the attribute held when the record was loaded.
    fn read_previous(&self, attribute: &str) -> Result<Value, RecordError>;

    /// Whether the attribute changed since the record was loaded.
    ///
    /// Returns `None` when the attribute is not change-tracked at all.
    fn has_changed(&self, attribute: &str) -> Option<bool>;

    fn is_persisted(&self) -> bool;

    /// Generic named-accessor dispatch.
    fn invoke(&self, accessor: &str) -> Result<Value, RecordError>;

    fn responds_to(&self, accessor: &str) -> bool;

    /// Display label for an attribute, used in cross-attribute messages.
    fn human_attribute_name(&self, attribute: &str) -> String {
        humanize(attribute)
    }
}

/// `finish_at` → `Finish at`, `account_id` → `Account`.
pub fn humanize(name: &str) -> String {
    let base = name.strip_suffix("_id").filter(|b| !b.is_empty()).unwrap_or(name);
    let spaced = base.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// MEMORY RECORD
// ============================================================================

/// An in-memory record with change tracking.
///
/// Attributes are change-tracked against the snapshot taken by
/// [`persist`](MemoryRecord::persist); accessors are plain named values
/// (associations, derived values) without change tracking.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{MemoryRecord, Record};
///
/// let mut user = MemoryRecord::new().with_attribute("token", "abc").persisted();
/// assert_eq!(user.has_changed("token"), Some(false));
///
/// user.set("token", "xyz");
/// assert_eq!(user.has_changed("token"), Some(true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    attributes: IndexMap<String, Value>,
    loaded: IndexMap<String, Value>,
    accessors: IndexMap<String, Value>,
    persisted: bool,
}

impl MemoryRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a change-tracked attribute.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets an accessor that is not change-tracked.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_accessor(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.accessors.insert(name.into(), value.into());
        self
    }

    /// Marks the record as persisted with its current attributes as the
    /// loaded snapshot.
    #[must_use = "builder methods must be chained or built"]
    pub fn persisted(mut self) -> Self {
        self.persist();
        self
    }

    /// Assigns an attribute without touching the loaded snapshot.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Takes a new snapshot and marks the record persisted.
    pub fn persist(&mut self) {
        self.loaded = self.attributes.clone();
        self.persisted = true;
    }
}

impl Record for MemoryRecord {
    fn read_previous(&self, attribute: &str) -> Result<Value, RecordError> {
        if !self.attributes.contains_key(attribute) {
            return Err(RecordError::unknown_accessor(attribute));
        }
        Ok(self.loaded.get(attribute).cloned().unwrap_or_default())
    }

    fn has_changed(&self, attribute: &str) -> Option<bool> {
        let current = self.attributes.get(attribute)?;
        let previous = self.loaded.get(attribute).unwrap_or(&Value::Nil);
        Some(current != previous)
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn invoke(&self, accessor: &str) -> Result<Value, RecordError> {
        self.attributes
            .get(accessor)
            .or_else(|| self.accessors.get(accessor))
            .cloned()
            .ok_or_else(|| RecordError::unknown_accessor(accessor))
    }

    fn responds_to(&self, accessor: &str) -> bool {
        self.attributes.contains_key(accessor) || self.accessors.contains_key(accessor)
    }
}

// ============================================================================
// TESTS
// ============================================================================
