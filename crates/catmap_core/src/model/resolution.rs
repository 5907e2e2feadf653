//! Resolution request/result records.
//!
//! # Invariants
//! - A `ResolutionResult` always names its `provenance` and `candidate_count`.
//! - `trail` lists stage records in execution order, deciding stage last.

use crate::model::category::CategoryId;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// One product listing to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub source_domain: String,
    /// Rendered source category path, e.g. `주방용품>냄비`.
    pub source_category_path: String,
    pub product_name: String,
    pub brand: Option<String>,
    pub extra_text: Option<String>,
}

impl ResolutionRequest {
    pub fn new(
        source_domain: impl Into<String>,
        source_category_path: impl Into<String>,
        product_name: impl Into<String>,
    ) -> Self {
        Self {
            source_domain: source_domain.into(),
            source_category_path: source_category_path.into(),
            product_name: product_name.into(),
            brand: None,
            extra_text: None,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_extra_text(mut self, extra_text: impl Into<String>) -> Self {
        self.extra_text = Some(extra_text.into());
        self
    }
}

/// Which stage family produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Rule,
    Manual,
    External,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Manual => "manual",
            Self::External => "external",
        }
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cascade stage identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GroupInference,
    StrongOverride,
    LeafSimilarity,
    SingleCandidate,
    ManualResolver,
    ExternalClassifier,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupInference => "group_inference",
            Self::StrongOverride => "strong_override",
            Self::LeafSimilarity => "leaf_similarity",
            Self::SingleCandidate => "single_candidate",
            Self::ManualResolver => "manual_resolver",
            Self::ExternalClassifier => "external_classifier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageOutcome {
    Decided,
    NoDecision,
    /// Several strong-override rules named different targets.
    Ambiguous {
        conflicting_rule_ids: Vec<String>,
        conflicting_target_ids: Vec<CategoryId>,
    },
    Skipped,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decided => "decided",
            Self::NoDecision => "no_decision",
            Self::Ambiguous { .. } => "ambiguous",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub detail: String,
}

/// Final decision for one request, with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub category_id: CategoryId,
    pub category_path: Vec<String>,
    pub reason: String,
    pub provenance: Provenance,
    pub candidate_count: usize,
    pub matched_group_key: Option<String>,
    pub trail: Vec<StageRecord>,
}

impl ResolutionResult {
    /// Stage that produced the decision.
    pub fn deciding_stage(&self) -> Option<Stage> {
        self.trail
            .iter()
            .rev()
            .find(|record| record.outcome == StageOutcome::Decided)
            .map(|record| record.stage)
    }

    pub fn visited(&self, stage: Stage) -> bool {
        self.trail.iter().any(|record| record.stage == stage)
    }
}
