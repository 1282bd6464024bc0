//! # nebula-record-validator
//!
//! Attribute validation rules for record models: rules are configured once
//! from options, bound to attributes, and run against a record to collect
//! per-attribute errors.
//!
//! ## Quick Start
//!
//! ```
//! use nebula_record_validator::prelude::*;
//!
//! let rules = RuleSet::new()
//!     .validates(&["domain"], &Options::new().with("hostname", true))
//!     .unwrap()
//!     .validates(
//!         &["aliases"],
//!         &Options::new().nested("array", Options::new().with("hostname", true)),
//!     )
//!     .unwrap();
//!
//! let record = MemoryRecord::new()
//!     .with_attribute("domain", "example.com")
//!     .with_attribute("aliases", vec!["www.example.com", "-bad.com"]);
//!
//! let errors = rules.validate(&record).unwrap();
//! assert_eq!(errors.kinds_on("aliases"), vec![ErrorKind::InvalidHostname]);
//! ```
//!
//! ## Built-in Rules
//!
//! - **Composite**: [`array`, `hash_keys`, `hash_values`](combinators::Each)
//! - **Grammar**: [`hostname`](validators::Hostname), [`email`](validators::Email),
//!   [`url`](validators::Url), [`ipaddr`](validators::Ipaddr)
//! - **Relational**: [`before`/`after`](validators::Order),
//!   [`grandparent`](validators::Grandparent), [`write_once`/`worm`](validators::WriteOnce)
//! - **Presence and content**: [`presence`](validators::Presence),
//!   [`existence`](validators::Existence), [`format`](validators::Format),
//!   [`inclusion`](validators::Inclusion), [`length`](validators::Length)
//!
//! Rule tokens resolve through the [`registry`] when rules are configured;
//! a misspelled token is a [`ConfigurationError`](foundation::ConfigurationError)
//! before any record is validated.

pub mod combinators;
pub mod foundation;
pub mod prelude;
pub mod registry;
pub mod rules;
pub mod validators;
