//! Category-resolution cascade.
//!
//! # Responsibility
//! - Run the staged decision pipeline for one listing against one snapshot.
//! - Record every stage outcome so each result carries full provenance.
//!
//! # Invariants
//! - `resolve` reads the bound snapshot pointer once; a concurrent
//!   `swap_snapshot` never changes the view of an in-flight call.
//! - No internal state is mutated by `resolve`; no retries, no timeouts.
//! - Logger failures never abort a resolution.
//! - Collaborator errors reach the caller unmodified.
//!
//! Stage order:
//!
//! ```text
//! group inference ─┬─ none ─> strong override (global) -> manual -> external (full taxonomy)
//!                  └─ key ──> [no candidate ids] -> external (full taxonomy)
//!                             strong override -> leaf similarity -> single candidate
//!                             -> manual -> external (restricted pool)
//! ```

use crate::collaborator::capability::MatcherCapability;
use crate::collaborator::classifier::{ClassifierRequest, ExternalClassifier};
use crate::collaborator::logger::ResolutionLogger;
use crate::collaborator::manual::ManualResolver;
use crate::config::MatcherConfig;
use crate::matcher::group_inference::{infer_group, GroupMatch};
use crate::matcher::keywords::{DefaultKeywordExtractor, KeywordExtractor};
use crate::matcher::leaf_similarity::match_leaf_similarity;
use crate::matcher::strong_override::{match_strong_override, StrongOverrideOutcome};
use crate::matcher::ResolveError;
use crate::model::category::TargetCategory;
use crate::model::resolution::{
    Provenance, ResolutionRequest, ResolutionResult, Stage, StageOutcome, StageRecord,
};
use crate::model::snapshot::RuleSnapshot;
use crate::repo::rule_repo::RuleRepository;
use crate::service::rule_store::RuleStore;
use log::{debug, info};
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

pub const SINGLE_CANDIDATE_REASON: &str = "single candidate under group";
const MANUAL_DEFAULT_REASON: &str = "manual selection";

/// Stateless decision function bound to one rule snapshot.
pub struct MatcherEngine {
    snapshot: RwLock<Arc<RuleSnapshot>>,
    classifier: Arc<dyn ExternalClassifier>,
    manual_resolver: Option<Arc<dyn ManualResolver>>,
    logger: Option<Arc<dyn ResolutionLogger>>,
    keyword_extractor: Arc<dyn KeywordExtractor>,
    config: MatcherConfig,
}

pub struct MatcherEngineBuilder {
    snapshot: Arc<RuleSnapshot>,
    classifier: Arc<dyn ExternalClassifier>,
    manual_resolver: Option<Arc<dyn ManualResolver>>,
    logger: Option<Arc<dyn ResolutionLogger>>,
    keyword_extractor: Option<Arc<dyn KeywordExtractor>>,
    config: MatcherConfig,
}

impl MatcherEngineBuilder {
    pub fn manual_resolver(mut self, resolver: Arc<dyn ManualResolver>) -> Self {
        self.manual_resolver = Some(resolver);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn ResolutionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn keyword_extractor(mut self, extractor: Arc<dyn KeywordExtractor>) -> Self {
        self.keyword_extractor = Some(extractor);
        self
    }

    pub fn config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> MatcherEngine {
        info!(
            "event=matcher_build module=matcher status=ok group={} manual_resolver={} logger={}",
            self.snapshot.group(),
            self.manual_resolver.is_some(),
            self.logger.is_some()
        );
        MatcherEngine {
            snapshot: RwLock::new(self.snapshot),
            classifier: self.classifier,
            manual_resolver: self.manual_resolver,
            logger: self.logger,
            keyword_extractor: self
                .keyword_extractor
                .unwrap_or_else(|| Arc::new(DefaultKeywordExtractor)),
            config: self.config,
        }
    }
}

impl MatcherEngine {
    pub fn builder(
        snapshot: Arc<RuleSnapshot>,
        classifier: Arc<dyn ExternalClassifier>,
    ) -> MatcherEngineBuilder {
        MatcherEngineBuilder {
            snapshot,
            classifier,
            manual_resolver: None,
            logger: None,
            keyword_extractor: None,
            config: MatcherConfig::default(),
        }
    }

    /// Builder bound to the store's current snapshot for `group`.
    pub fn for_group<R: RuleRepository>(
        store: &RuleStore<R>,
        group: &str,
        classifier: Arc<dyn ExternalClassifier>,
    ) -> MatcherEngineBuilder {
        Self::builder(store.snapshot(group), classifier)
    }

    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        Arc::clone(&*self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn group(&self) -> String {
        self.snapshot().group().to_string()
    }

    /// Binds a new snapshot; returns the previous one.
    pub fn swap_snapshot(&self, next: Arc<RuleSnapshot>) -> Arc<RuleSnapshot> {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        info!(
            "event=snapshot_swap module=matcher status=ok group={} previous_group={}",
            guard.group(),
            previous.group()
        );
        previous
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Optional collaborators registered on this engine.
    pub fn capabilities(&self) -> BTreeSet<MatcherCapability> {
        let mut capabilities = BTreeSet::new();
        if self.manual_resolver.is_some() {
            capabilities.insert(MatcherCapability::ManualResolve);
        }
        if self.logger.is_some() {
            capabilities.insert(MatcherCapability::Log);
        }
        capabilities
    }

    pub fn resolve_listing(
        &self,
        source_domain: &str,
        source_category_path: &str,
        product_name: &str,
        brand: Option<&str>,
        extra_text: Option<&str>,
    ) -> Result<ResolutionResult, ResolveError> {
        let request = ResolutionRequest {
            source_domain: source_domain.to_string(),
            source_category_path: source_category_path.to_string(),
            product_name: product_name.to_string(),
            brand: brand.map(str::to_string),
            extra_text: extra_text.map(str::to_string),
        };
        self.resolve(&request)
    }

    /// Resolves one listing to a destination category.
    ///
    /// # Errors
    /// - `ResolveError::ManualResolver` when the manual hook fails.
    /// - `ResolveError::Classifier` when the external classifier fails.
    pub fn resolve(&self, request: &ResolutionRequest) -> Result<ResolutionResult, ResolveError> {
        let started_at = Instant::now();
        let snapshot = self.snapshot();
        let outcome = Cascade {
            engine: self,
            request,
            trail: Vec::new(),
        }
        .run(&snapshot);

        match &outcome {
            Ok(result) => info!(
                "event=resolve module=matcher status=ok group={} provenance={} category_id={} candidate_count={} matched_group_key={} duration_ms={}",
                snapshot.group(),
                result.provenance,
                result.category_id,
                result.candidate_count,
                result.matched_group_key.as_deref().unwrap_or("-"),
                started_at.elapsed().as_millis()
            ),
            Err(err) => info!(
                "event=resolve module=matcher status=error group={} duration_ms={} error={}",
                snapshot.group(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        outcome
    }

    fn emit(&self, line: &str) {
        debug!("event=resolve_stage module=matcher {line}");
        let Some(logger) = &self.logger else {
            return;
        };
        // Err and panics from the sink are both dropped.
        let _ = catch_unwind(AssertUnwindSafe(|| logger.log_line(line)));
    }
}

/// Per-call cascade state. Lives for one `resolve` call.
struct Cascade<'e> {
    engine: &'e MatcherEngine,
    request: &'e ResolutionRequest,
    trail: Vec<StageRecord>,
}

impl Cascade<'_> {
    fn run(mut self, snapshot: &RuleSnapshot) -> Result<ResolutionResult, ResolveError> {
        let request = self.request;
        let group_match = infer_group(
            snapshot.group_rules(),
            &request.source_domain,
            &request.source_category_path,
            &request.product_name,
        );

        match group_match {
            None => {
                self.record(
                    Stage::GroupInference,
                    StageOutcome::NoDecision,
                    "no source path or keyword match".to_string(),
                );
                self.resolve_ungrouped(snapshot)
            }
            Some(group_match) => {
                let detail = match &group_match {
                    GroupMatch::SourcePath { rule } => {
                        format!("group_key={} via=source_path", rule.group_key)
                    }
                    GroupMatch::Keyword { rule, keyword } => {
                        format!("group_key={} via=keyword keyword={keyword}", rule.group_key)
                    }
                };
                self.record(Stage::GroupInference, StageOutcome::Decided, detail);
                self.resolve_grouped(snapshot, group_match.group_key())
            }
        }
    }

    /// Stage 1: no group key; only global strong overrides can decide.
    fn resolve_ungrouped(mut self, snapshot: &RuleSnapshot) -> Result<ResolutionResult, ResolveError> {
        let candidates = snapshot.strong_override_candidates();

        if let Some(result) = self.try_strong_override(snapshot, &candidates, None) {
            return Ok(result);
        }
        if let Some(result) = self.try_manual(&candidates, None)? {
            return Ok(result);
        }
        self.escalate(snapshot, None, None)
    }

    /// Stage 2: group key found; work inside the group's candidate set.
    fn resolve_grouped(
        mut self,
        snapshot: &RuleSnapshot,
        group_key: &str,
    ) -> Result<ResolutionResult, ResolveError> {
        let candidate_ids = snapshot.target_rules().candidates_for(group_key);
        if candidate_ids.is_empty() {
            self.note_unrestricted(format!("group_key={group_key} has no candidate ids"));
            return self.escalate(snapshot, None, Some(group_key));
        }

        let candidates = snapshot.taxonomy().restrict(candidate_ids.iter());
        if candidates.is_empty() {
            self.note_unrestricted(format!(
                "group_key={group_key} candidate ids missing from taxonomy ({} ids)",
                candidate_ids.len()
            ));
            return self.escalate(snapshot, None, Some(group_key));
        }

        if let Some(result) = self.try_strong_override(snapshot, &candidates, Some(group_key)) {
            return Ok(result);
        }
        if let Some(result) = self.try_leaf_similarity(&candidates, group_key) {
            return Ok(result);
        }
        if let Some(result) = self.try_single_candidate(&candidates, group_key) {
            return Ok(result);
        }
        if let Some(result) = self.try_manual(&candidates, Some(group_key))? {
            return Ok(result);
        }
        self.escalate(snapshot, Some(&candidates), Some(group_key))
    }

    fn try_strong_override(
        &mut self,
        snapshot: &RuleSnapshot,
        candidates: &[TargetCategory],
        group_key: Option<&str>,
    ) -> Option<ResolutionResult> {
        if candidates.is_empty() {
            self.record(
                Stage::StrongOverride,
                StageOutcome::Skipped,
                "no candidates".to_string(),
            );
            return None;
        }

        let outcome = match_strong_override(
            &snapshot.target_rules().strong_overrides,
            candidates,
            &self.request.product_name,
        );
        let reason = outcome.reason();
        match outcome {
            StrongOverrideOutcome::Decided {
                rule,
                keyword,
                category,
            } => {
                self.record(
                    Stage::StrongOverride,
                    StageOutcome::Decided,
                    format!(
                        "rule_id={} keyword={} category_id={}",
                        rule.rule_id, keyword, category.id
                    ),
                );
                Some(self.finish(
                    category,
                    reason.unwrap_or_default(),
                    Provenance::Rule,
                    candidates.len(),
                    group_key,
                ))
            }
            StrongOverrideOutcome::Ambiguous {
                rule_ids,
                target_ids,
            } => {
                let detail = format!(
                    "conflicting rules [{}] -> targets [{}]",
                    rule_ids.join(","),
                    target_ids
                        .iter()
                        .map(|id| id.as_str())
                        .collect::<Vec<_>>()
                        .join(",")
                );
                self.record(
                    Stage::StrongOverride,
                    StageOutcome::Ambiguous {
                        conflicting_rule_ids: rule_ids,
                        conflicting_target_ids: target_ids,
                    },
                    detail,
                );
                None
            }
            StrongOverrideOutcome::NoMatch => {
                self.record(
                    Stage::StrongOverride,
                    StageOutcome::NoDecision,
                    format!("no rule fired over {} candidates", candidates.len()),
                );
                None
            }
        }
    }

    fn try_leaf_similarity(
        &mut self,
        candidates: &[TargetCategory],
        group_key: &str,
    ) -> Option<ResolutionResult> {
        let engine = self.engine;
        let keywords = engine.keyword_extractor.extract(&self.request.product_name);
        let outcome = match_leaf_similarity(&keywords, candidates, &engine.config);
        let detail = format!(
            "best={:.3} second={:.3} margin={:.3} best_category={}",
            outcome.best_score(),
            outcome.second,
            outcome.margin(),
            outcome
                .best
                .as_ref()
                .map_or("-", |best| best.category.id.as_str())
        );

        let Some(winner) = outcome.decided() else {
            self.record(Stage::LeafSimilarity, StageOutcome::NoDecision, detail);
            return None;
        };
        self.record(Stage::LeafSimilarity, StageOutcome::Decided, detail);
        let reason = format!(
            "leaf similarity {:.3} between token '{}' and leaf '{}' (margin {:.3})",
            winner.score,
            winner.token.as_deref().unwrap_or(""),
            winner.category.leaf(),
            outcome.margin()
        );
        Some(self.finish(
            winner.category,
            reason,
            Provenance::Rule,
            candidates.len(),
            Some(group_key),
        ))
    }

    fn try_single_candidate(
        &mut self,
        candidates: &[TargetCategory],
        group_key: &str,
    ) -> Option<ResolutionResult> {
        let [only] = candidates else {
            self.record(
                Stage::SingleCandidate,
                StageOutcome::NoDecision,
                format!("{} candidates remain", candidates.len()),
            );
            return None;
        };
        self.record(
            Stage::SingleCandidate,
            StageOutcome::Decided,
            format!("category_id={}", only.id),
        );
        Some(self.finish(
            only,
            SINGLE_CANDIDATE_REASON.to_string(),
            Provenance::Rule,
            1,
            Some(group_key),
        ))
    }

    fn try_manual(
        &mut self,
        candidates: &[TargetCategory],
        group_key: Option<&str>,
    ) -> Result<Option<ResolutionResult>, ResolveError> {
        let engine = self.engine;
        let Some(resolver) = engine.manual_resolver.as_ref() else {
            self.record(
                Stage::ManualResolver,
                StageOutcome::Skipped,
                "no manual resolver registered".to_string(),
            );
            return Ok(None);
        };
        if candidates.is_empty() {
            self.record(
                Stage::ManualResolver,
                StageOutcome::Skipped,
                "no candidates".to_string(),
            );
            return Ok(None);
        }

        let verdict = resolver
            .resolve_manually(
                &self.request.product_name,
                &self.request.source_category_path,
                candidates,
            )
            .map_err(ResolveError::ManualResolver)?;

        let Some(verdict) = verdict else {
            self.record(
                Stage::ManualResolver,
                StageOutcome::NoDecision,
                "resolver deferred".to_string(),
            );
            return Ok(None);
        };
        self.record(
            Stage::ManualResolver,
            StageOutcome::Decided,
            format!("category_id={}", verdict.category.id),
        );
        let reason = verdict
            .reason
            .clone()
            .unwrap_or_else(|| MANUAL_DEFAULT_REASON.to_string());
        Ok(Some(self.finish(
            &verdict.category,
            reason,
            Provenance::Manual,
            candidates.len(),
            group_key,
        )))
    }

    /// Last resort. `pool = None` searches the whole taxonomy.
    fn escalate(
        mut self,
        snapshot: &RuleSnapshot,
        pool: Option<&[TargetCategory]>,
        group_key: Option<&str>,
    ) -> Result<ResolutionResult, ResolveError> {
        let engine = self.engine;
        let request = self.request;
        let candidate_count = pool.map_or(snapshot.taxonomy().len(), <[TargetCategory]>::len);
        let verdict = engine
            .classifier
            .classify(&ClassifierRequest {
                product_name: &request.product_name,
                brand: request.brand.as_deref(),
                extra_text: request.extra_text.as_deref(),
                candidates: pool,
            })
            .map_err(ResolveError::Classifier)?;

        self.record(
            Stage::ExternalClassifier,
            StageOutcome::Decided,
            format!(
                "category_id={} pool={}",
                verdict.category_id,
                if pool.is_some() { "restricted" } else { "full" }
            ),
        );
        Ok(ResolutionResult {
            category_id: verdict.category_id,
            category_path: verdict.category_path,
            reason: verdict.justification,
            provenance: Provenance::External,
            candidate_count,
            matched_group_key: group_key.map(str::to_string),
            trail: self.trail,
        })
    }

    fn note_unrestricted(&mut self, detail: String) {
        for stage in [
            Stage::StrongOverride,
            Stage::LeafSimilarity,
            Stage::SingleCandidate,
            Stage::ManualResolver,
        ] {
            self.record(stage, StageOutcome::Skipped, detail.clone());
        }
    }

    fn finish(
        &mut self,
        category: &TargetCategory,
        reason: String,
        provenance: Provenance,
        candidate_count: usize,
        group_key: Option<&str>,
    ) -> ResolutionResult {
        ResolutionResult {
            category_id: category.id.clone(),
            category_path: category.path.clone(),
            reason,
            provenance,
            candidate_count,
            matched_group_key: group_key.map(str::to_string),
            trail: std::mem::take(&mut self.trail),
        }
    }

    fn record(&mut self, stage: Stage, outcome: StageOutcome, detail: String) {
        self.engine.emit(&format!(
            "stage={} outcome={} detail=\"{}\"",
            stage.as_str(),
            outcome.as_str(),
            detail
        ));
        self.trail.push(StageRecord {
            stage,
            outcome,
            detail,
        });
    }
}
