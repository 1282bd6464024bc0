//! Combinators that compose validators
//!
//! A composite holds sub-validators built through the
//! [`registry`](crate::registry) and runs them over the elements of a
//! container value.

pub mod each;

pub use each::{Each, ElementSource};
