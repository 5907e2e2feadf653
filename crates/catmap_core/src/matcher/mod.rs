//! Category-resolution matcher.
//!
//! # Responsibility
//! - Infer a group key, then narrow to one destination category through
//!   strong overrides, leaf similarity, the single-candidate shortcut, the
//!   manual hook and finally the external classifier.
//!
//! # Invariants
//! - Rule stages are pure functions of the request and the bound snapshot.
//! - Collaborator failures are surfaced, never retried or masked.

use crate::collaborator::CollaboratorError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod engine;
pub mod group_inference;
pub mod keywords;
pub mod leaf_similarity;
pub mod similarity;
pub mod strong_override;

/// Failure raised by a collaborator during `resolve`.
///
/// The collaborator's own error is kept intact as `source()`.
#[derive(Debug)]
pub enum ResolveError {
    ManualResolver(CollaboratorError),
    Classifier(CollaboratorError),
}

impl ResolveError {
    /// The collaborator error, unmodified.
    pub fn collaborator_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        match self {
            Self::ManualResolver(err) | Self::Classifier(err) => err.as_ref(),
        }
    }
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManualResolver(err) => write!(f, "manual resolver failed: {err}"),
            Self::Classifier(err) => write!(f, "external classifier failed: {err}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ManualResolver(err) | Self::Classifier(err) => Some(err.as_ref()),
        }
    }
}
