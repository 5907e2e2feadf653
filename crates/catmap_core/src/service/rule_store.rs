//! Memoized per-group rule snapshots.
//!
//! # Responsibility
//! - Build one `RuleSnapshot` per group from repository documents and the
//!   shared taxonomy, and hand out shared pointers to it.
//! - Apply invalidation and reloads as pointer swaps.
//!
//! # Invariants
//! - A snapshot handed out is never mutated; reloads replace the cached
//!   pointer only.
//! - Taxonomy replacement drops every cached snapshot so the next request
//!   rebuilds against the new table.
//! - A snapshot built across a `replace_taxonomy` or `invalidate` is never
//!   cached; the build is retried against current state.

use crate::model::category::TaxonomyMaster;
use crate::model::rule::{GroupRule, TargetRuleSet};
use crate::model::snapshot::RuleSnapshot;
use crate::repo::rule_repo::RuleRepository;
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

pub struct RuleStore<R: RuleRepository> {
    repo: R,
    taxonomy: RwLock<Arc<TaxonomyMaster>>,
    snapshots: RwLock<BTreeMap<String, Arc<RuleSnapshot>>>,
    /// Bumped under the `snapshots` write lock whenever cached state is dropped.
    generation: AtomicU64,
}

impl<R: RuleRepository> RuleStore<R> {
    pub fn new(repo: R, taxonomy: TaxonomyMaster) -> Self {
        Self {
            repo,
            taxonomy: RwLock::new(Arc::new(taxonomy)),
            snapshots: RwLock::new(BTreeMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn load_group_rules(&self, group: &str) -> Vec<GroupRule> {
        self.repo.load_group_rules(group.trim())
    }

    pub fn load_target_rules(&self, group: &str) -> TargetRuleSet {
        self.repo.load_target_rules(group.trim())
    }

    pub fn list_available_groups(&self) -> BTreeSet<String> {
        self.repo.list_available_groups()
    }

    /// Current taxonomy pointer.
    pub fn taxonomy(&self) -> Arc<TaxonomyMaster> {
        Arc::clone(&*self.taxonomy.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the cached snapshot for `group`, building it on first use.
    pub fn snapshot(&self, group: &str) -> Arc<RuleSnapshot> {
        let group = group.trim();
        loop {
            let generation = self.generation.load(Ordering::Acquire);
            if let Some(snapshot) = self
                .snapshots
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(group)
            {
                return Arc::clone(snapshot);
            }

            let built = Arc::new(self.build_snapshot(group));
            let mut snapshots = self
                .snapshots
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if self.generation.load(Ordering::Acquire) != generation {
                self.log_stale_build(group);
                continue;
            }
            // A concurrent caller may have inserted first; keep theirs.
            return Arc::clone(snapshots.entry(group.to_string()).or_insert(built));
        }
    }

    /// Rebuilds `group` from storage and swaps the cached pointer.
    ///
    /// Matchers still holding the previous snapshot are unaffected.
    pub fn reload(&self, group: &str) -> Arc<RuleSnapshot> {
        let group = group.trim();
        loop {
            let generation = self.generation.load(Ordering::Acquire);
            let built = Arc::new(self.build_snapshot(group));
            let mut snapshots = self
                .snapshots
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if self.generation.load(Ordering::Acquire) != generation {
                self.log_stale_build(group);
                continue;
            }
            snapshots.insert(group.to_string(), Arc::clone(&built));
            info!("event=rules_reload module=service status=ok group={group}");
            return built;
        }
    }

    /// Drops the cached snapshot; returns whether one was cached.
    pub fn invalidate(&self, group: &str) -> bool {
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        snapshots.remove(group.trim()).is_some()
    }

    /// Swaps in a refreshed taxonomy and clears cached snapshots.
    pub fn replace_taxonomy(&self, taxonomy: TaxonomyMaster) {
        let rows = taxonomy.len();
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *self.taxonomy.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(taxonomy);
        self.generation.fetch_add(1, Ordering::AcqRel);
        snapshots.clear();
        info!("event=taxonomy_swap module=service status=ok rows={rows}");
    }

    pub fn cached_groups(&self) -> Vec<String> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn build_snapshot(&self, group: &str) -> RuleSnapshot {
        let started_at = Instant::now();
        let taxonomy = self.taxonomy();
        let group_rules = self.repo.load_group_rules(group);
        let target_rules = self.repo.load_target_rules(group);
        let snapshot = RuleSnapshot::new(group, group_rules, target_rules, taxonomy);
        info!(
            "event=snapshot_build module=service status=ok group={} group_rules={} target_rules={} strong_overrides={} taxonomy_rows={} duration_ms={}",
            group,
            snapshot.group_rules().len(),
            snapshot.target_rules().targets.len(),
            snapshot.target_rules().strong_overrides.len(),
            snapshot.taxonomy().len(),
            started_at.elapsed().as_millis()
        );
        snapshot
    }

    fn log_stale_build(&self, group: &str) {
        info!("event=snapshot_build module=service status=retry group={group} reason=invalidated_during_build");
    }
}
