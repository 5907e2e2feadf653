//! Immutable rule snapshot bound to a matcher.
//!
//! A snapshot combines one group's rule documents with the shared taxonomy.
//! Reloads build a new snapshot; existing ones are never edited.

use crate::model::category::{TargetCategory, TaxonomyMaster};
use crate::model::rule::{GroupRule, TargetRuleSet};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    group: String,
    group_rules: Vec<GroupRule>,
    target_rules: TargetRuleSet,
    taxonomy: Arc<TaxonomyMaster>,
}

impl RuleSnapshot {
    pub fn new(
        group: impl Into<String>,
        group_rules: Vec<GroupRule>,
        target_rules: TargetRuleSet,
        taxonomy: Arc<TaxonomyMaster>,
    ) -> Self {
        Self {
            group: group.into(),
            group_rules,
            target_rules,
            taxonomy,
        }
    }

    /// Snapshot with no rules; every resolution escalates to the classifier.
    pub fn empty(group: impl Into<String>, taxonomy: Arc<TaxonomyMaster>) -> Self {
        Self::new(group, Vec::new(), TargetRuleSet::default(), taxonomy)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn group_rules(&self) -> &[GroupRule] {
        &self.group_rules
    }

    pub fn target_rules(&self) -> &TargetRuleSet {
        &self.target_rules
    }

    pub fn taxonomy(&self) -> &TaxonomyMaster {
        &self.taxonomy
    }

    pub fn shared_taxonomy(&self) -> Arc<TaxonomyMaster> {
        Arc::clone(&self.taxonomy)
    }

    /// Taxonomy rows referenced by any strong-override rule.
    ///
    /// Follows override order; ids missing from the taxonomy are skipped.
    pub fn strong_override_candidates(&self) -> Vec<TargetCategory> {
        let mut seen = HashSet::new();
        self.target_rules
            .strong_overrides
            .iter()
            .map(|rule| &rule.target_category_id)
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.taxonomy.get(id).cloned())
            .collect()
    }
}
