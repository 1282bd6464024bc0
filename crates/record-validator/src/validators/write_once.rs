//! Write-once, read-many.
//!
//! A value may go from nil to set while the record is new, and once more
//! from nil after the first persist. Any change away from a non-nil value on
//! a persisted record is rejected. With `immutable_nil`, every change on a
//! persisted record is rejected, including nil → value.
//!
//! Associations are tracked through their `_id` companion when the
//! attribute itself is not change-tracked.

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, Record, RecordError, Validate,
    ValidationContext, Value,
};

#[derive(Debug, Clone)]
pub struct WriteOnce {
    kind: &'static str,
    immutable_nil: bool,
    common: CommonOptions,
}

impl WriteOnce {
    pub const KIND: &'static str = "write_once";
    /// Registry alias.
    pub const WORM: &'static str = "worm";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        Self::named(Self::KIND, options)
    }

    /// Builds the validator under one of its registry names.
    pub fn named(kind: &'static str, options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            kind,
            immutable_nil: options.flag(kind, "immutable_nil")?,
            common: CommonOptions::from_options(kind, options)?,
        })
    }

    /// The attribute whose change state decides, and whether it changed.
    fn tracked(record: &dyn Record, attribute: &str) -> Option<(String, bool)> {
        if let Some(changed) = record.has_changed(attribute) {
            return Some((attribute.to_owned(), changed));
        }
        let companion = format!("{attribute}_id");
        record
            .has_changed(&companion)
            .map(|changed| (companion, changed))
    }

    pub fn is_valid(&self, record: &dyn Record, attribute: &str) -> Result<bool, RecordError> {
        if !record.is_persisted() {
            return Ok(true);
        }
        let Some((tracked, true)) = Self::tracked(record, attribute) else {
            return Ok(true);
        };
        if self.immutable_nil {
            return Ok(false);
        }
        Ok(record.read_previous(&tracked)?.is_nil())
    }
}

impl Validate for WriteOnce {
    fn kind(&self) -> &'static str {
        self.kind
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
        if !self.is_valid(cx.record(), attribute)? {
            cx.add(self.common.entry(attribute, ErrorKind::Unchangeable));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::MemoryRecord;

    fn write_once(immutable_nil: bool) -> WriteOnce {
        WriteOnce::from_options(&Options::new().with("immutable_nil", immutable_nil)).unwrap()
    }

    #[test]
    fn unpersisted_records_always_pass() {
        let record = MemoryRecord::new().with_attribute("token", "x");
        assert!(write_once(false).is_valid(&record, "token").unwrap());
        assert!(write_once(true).is_valid(&record, "token").unwrap());
    }

    #[test]
    fn changing_a_set_value_fails() {
        let mut record = MemoryRecord::new().with_attribute("token", "x").persisted();
        assert!(write_once(false).is_valid(&record, "token").unwrap());

        record.set("token", "y");
        assert!(!write_once(false).is_valid(&record, "token").unwrap());

        record.set("token", Value::Nil);
        assert!(!write_once(false).is_valid(&record, "token").unwrap());
    }

    #[test]
    fn nil_to_value_after_persist_depends_on_immutable_nil() {
        let mut record = MemoryRecord::new().with_attribute("token", Value::Nil).persisted();
        record.set("token", "x");

        assert!(write_once(false).is_valid(&record, "token").unwrap());
        assert!(!write_once(true).is_valid(&record, "token").unwrap());
    }

    #[test]
    fn associations_track_through_id_companion() {
        let mut record = MemoryRecord::new()
            .with_attribute("user_id", 1)
            .with_accessor("user", "someone")
            .persisted();
        assert!(write_once(false).is_valid(&record, "user").unwrap());

        record.set("user_id", 2);
        assert!(!write_once(false).is_valid(&record, "user").unwrap());
    }

    #[test]
    fn alias_keeps_its_name() {
        let worm = WriteOnce::named(WriteOnce::WORM, &Options::new()).unwrap();
        assert_eq!(worm.kind(), "worm");
    }
}
