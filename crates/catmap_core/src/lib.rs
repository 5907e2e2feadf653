//! Marketplace category mapping core.
//!
//! Maps source product listings onto a destination category taxonomy
//! through a rule cascade with manual and external escalation.

pub mod collaborator;
pub mod config;
pub mod db;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod repo;
pub mod service;

pub use collaborator::capability::MatcherCapability;
pub use collaborator::classifier::{
    ClassifierRequest, ClassifierUnavailable, ClassifierVerdict, ExternalClassifier,
    UnconfiguredClassifier,
};
pub use collaborator::logger::{LogFacadeLogger, ResolutionLogger};
pub use collaborator::manual::{ManualResolver, ManualVerdict};
pub use collaborator::CollaboratorError;
pub use config::{load_config, parse_config, ConfigError, CoreConfig, MatcherConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use matcher::engine::{MatcherEngine, MatcherEngineBuilder};
pub use matcher::ResolveError;
pub use model::category::{CategoryId, TargetCategory, TaxonomyMaster};
pub use model::resolution::{
    Provenance, ResolutionRequest, ResolutionResult, Stage, StageOutcome, StageRecord,
};
pub use model::rule::{GroupRule, StrongOverrideRule, TargetRule, TargetRuleSet};
pub use model::snapshot::RuleSnapshot;
pub use repo::rule_repo::{JsonRuleRepository, RuleRepository};
pub use repo::taxonomy_repo::{
    load_taxonomy, load_taxonomy_from_path, SqliteTaxonomyRepository, TaxonomyRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::rule_store::RuleStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
