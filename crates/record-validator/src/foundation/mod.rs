//! Core validation types and traits
//!
//! This module contains the building blocks every rule is made of:
//!
//! - **Values**: [`Value`], the dynamic attribute value
//! - **Records**: [`Record`], the host capability the validators read from
//! - **Options**: [`Options`], [`Resolvable`] (the option resolver)
//! - **Errors**: [`ErrorEntry`], [`Errors`], [`ConfigurationError`]
//! - **Traits**: [`Validate`], [`ValidationContext`]

pub mod error;
pub mod options;
pub mod record;
pub mod traits;
pub mod value;

pub use error::{ConfigurationError, ErrorEntry, ErrorKind, ErrorParams, Errors};
pub use options::{Computed, OptionValue, Options, Resolvable, value_from_json};
pub use record::{MemoryRecord, Record, RecordError, humanize};
pub use traits::{CommonOptions, Validate, ValidationContext};
pub use value::Value;
