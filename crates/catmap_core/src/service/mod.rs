//! Core use-case services.
//!
//! # Responsibility
//! - Combine repository reads into immutable rule snapshots.
//! - Keep the matcher decoupled from storage details.

pub mod rule_store;
