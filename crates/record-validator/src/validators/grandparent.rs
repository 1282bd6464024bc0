//! Shared-ancestor check.
//!
//! Ensures an association and one or more sibling associations point at the
//! same parent: `validates user, grandparent: {scope: org, parent: realm}`
//! requires `user.realm == org.realm`. With `allow_nil`, nil siblings pass.

use std::sync::Arc;

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, Record, RecordError, Validate,
    ValidationContext, Value,
};

#[derive(Debug, Clone)]
pub struct Grandparent {
    scope: Vec<String>,
    parent: String,
    common: CommonOptions,
}

impl Grandparent {
    pub const KIND: &'static str = "grandparent";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        let scope = match options.literal(Self::KIND, "scope")? {
            Some(Value::Str(name)) => vec![name.clone()],
            Some(Value::List(items)) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_owned).ok_or_else(|| {
                        ConfigurationError::invalid_option(Self::KIND, "scope", "must list accessor names")
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ConfigurationError::invalid_option(
                    Self::KIND,
                    "scope",
                    "must name one or more accessors",
                ));
            }
            None => return Err(ConfigurationError::missing_option(Self::KIND, "scope")),
        };
        let parent = options
            .string(Self::KIND, "parent")?
            .ok_or_else(|| ConfigurationError::missing_option(Self::KIND, "parent"))?;

        Ok(Self {
            scope,
            parent,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    /// The association behind `attribute`. A foreign key (`account_id`
    /// holding a plain value) reads the `account` accessor, which must exist.
    fn association(record: &dyn Record, attribute: &str, value: &Value) -> Result<Value, RecordError> {
        if value.as_record().is_some() {
            return Ok(value.clone());
        }
        match attribute.strip_suffix("_id") {
            Some(name) if !name.is_empty() => record.invoke(name),
            _ => Ok(value.clone()),
        }
    }

    fn as_record(value: &Value, accessor: &str) -> Result<Arc<dyn Record>, RecordError> {
        value.as_record().cloned().ok_or_else(|| RecordError::NotARecord {
            accessor: accessor.to_owned(),
        })
    }

    /// Whether every sibling in scope shares the association's parent.
    pub fn is_valid(&self, record: &dyn Record, attribute: &str, value: &Value) -> Result<bool, RecordError> {
        let association = Self::association(record, attribute, value)?;
        for scope in &self.scope {
            let cousin = record.invoke(scope)?;
            if cousin.is_nil() {
                if self.common.allow_nil {
                    continue;
                }
                return Ok(false);
            }
            if association.is_nil() {
                return Ok(false);
            }
            let ours = Self::as_record(&association, attribute)?.invoke(&self.parent)?;
            let theirs = Self::as_record(&cousin, scope)?.invoke(&self.parent)?;
            if ours != theirs {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Validate for Grandparent {
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
        if !self.is_valid(cx.record(), attribute, value)? {
            cx.add(self.common.entry(attribute, ErrorKind::Invalid));
        }
        Ok(())
    }
}
