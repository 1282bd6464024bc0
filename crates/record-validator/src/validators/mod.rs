//! Built-in validators
//!
//! # Categories
//!
//! - **Grammar**: hostname, email, URL, IP address / CIDR block
//! - **Relational**: ordering (`before`/`after`), grandparent, write-once
//! - **Presence**: presence, existence
//! - **Content**: format, inclusion, length
//!
//! Every validator is built from [`Options`](crate::foundation::Options)
//! through its `from_options` constructor and implements
//! [`Validate`](crate::foundation::Validate).

// Grammar validators
pub mod email;
pub mod hostname;
pub mod ip_address;
pub mod url;

// Relational validators
pub mod grandparent;
pub mod ordering;
pub mod write_once;

// Presence and content validators
pub mod content;
pub mod length;
pub mod nullable;

pub use content::{Format, Inclusion};
pub use email::Email;
pub use grandparent::Grandparent;
pub use hostname::{AllowIp, Hostname, HostnameRules, Wildcard, to_ascii};
pub use ip_address::{IpBlock, IpFamily, IpParseError, Ipaddr};
pub use length::Length;
pub use nullable::{Existence, Presence};
pub use ordering::{Direction, Order, Target};
pub use url::{AbsoluteUrl, Allowed, ResolvedAllowLists, Url, parse_absolute};
pub use write_once::WriteOnce;
