//! External classification service contract.

use crate::collaborator::CollaboratorError;
use crate::model::category::{CategoryId, TargetCategory};
use std::fmt::{Display, Formatter};

/// Input handed to the external classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierRequest<'a> {
    pub product_name: &'a str,
    pub brand: Option<&'a str>,
    pub extra_text: Option<&'a str>,
    /// Bounded pool to choose from; `None` means the whole taxonomy.
    pub candidates: Option<&'a [TargetCategory]>,
}

/// Best guess returned by the classifier. Accepted as-is by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierVerdict {
    pub category_id: CategoryId,
    pub category_path: Vec<String>,
    pub justification: String,
}

/// Last-resort classifier. May be slow; the matcher imposes no timeout.
pub trait ExternalClassifier: Send + Sync {
    fn classify(&self, request: &ClassifierRequest<'_>) -> Result<ClassifierVerdict, CollaboratorError>;
}

/// Raised by [`UnconfiguredClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierUnavailable {
    pub product_name: String,
    pub candidate_count: Option<usize>,
}

impl Display for ClassifierUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.candidate_count {
            Some(count) => write!(
                f,
                "no external classifier configured; rules were inconclusive for `{}` ({count} candidates)",
                self.product_name
            ),
            None => write!(
                f,
                "no external classifier configured; rules were inconclusive for `{}` (unrestricted search)",
                self.product_name
            ),
        }
    }
}

impl std::error::Error for ClassifierUnavailable {}

/// Classifier for deployments without a classification backend.
///
/// Every call fails, so only rule/manual decisions succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredClassifier;

impl ExternalClassifier for UnconfiguredClassifier {
    fn classify(&self, request: &ClassifierRequest<'_>) -> Result<ClassifierVerdict, CollaboratorError> {
        Err(Box::new(ClassifierUnavailable {
            product_name: request.product_name.to_string(),
            candidate_count: request.candidates.map(<[TargetCategory]>::len),
        }))
    }
}
