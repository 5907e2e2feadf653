//! Human-override hook.

use crate::collaborator::CollaboratorError;
use crate::model::category::TargetCategory;

/// Verdict chosen by a human reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualVerdict {
    pub category: TargetCategory,
    pub reason: Option<String>,
}

impl ManualVerdict {
    pub fn new(category: TargetCategory) -> Self {
        Self {
            category,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Synchronous manual resolver.
///
/// `Ok(None)` defers to the next stage.
pub trait ManualResolver: Send + Sync {
    fn resolve_manually(
        &self,
        product_name: &str,
        source_category_path: &str,
        candidates: &[TargetCategory],
    ) -> Result<Option<ManualVerdict>, CollaboratorError>;
}

impl<F> ManualResolver for F
where
    F: Fn(&str, &str, &[TargetCategory]) -> Result<Option<ManualVerdict>, CollaboratorError>
        + Send
        + Sync,
{
    fn resolve_manually(
        &self,
        product_name: &str,
        source_category_path: &str,
        candidates: &[TargetCategory],
    ) -> Result<Option<ManualVerdict>, CollaboratorError> {
        self(product_name, source_category_path, candidates)
    }
}
