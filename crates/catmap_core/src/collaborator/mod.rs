//! Collaborator contracts consumed by the matcher.
//!
//! The matcher owns no I/O. Classification services, human review and
//! diagnostic sinks are injected as trait objects; errors they return are
//! passed to the caller untouched.

use std::error::Error;

pub mod capability;
pub mod classifier;
pub mod logger;
pub mod manual;

/// Opaque error raised by a collaborator.
pub type CollaboratorError = Box<dyn Error + Send + Sync + 'static>;
