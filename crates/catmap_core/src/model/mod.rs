//! Domain model for category resolution.
//!
//! # Responsibility
//! - Define the taxonomy, rule and resolution records used by the matcher.
//! - Keep rule records typed; untyped documents never reach the cascade.
//!
//! # Invariants
//! - Category ids are unique inside one `TaxonomyMaster`.
//! - A `RuleSnapshot` is read-only once built.

pub mod category;
pub mod resolution;
pub mod rule;
pub mod snapshot;
