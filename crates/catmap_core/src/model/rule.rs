//! Typed rule records parsed from group/target rule documents.
//!
//! # Invariants
//! - Keywords are stored in the same form product names are matched in:
//!   trimmed, lowercased, whitespace runs collapsed. Blank keywords are
//!   dropped at parse time.
//! - Source paths are stored as segment lists and compared segment-wise.
//! - `TargetRuleSet::strong_overrides` keeps document order.

use crate::matcher::keywords::normalize_name;
use crate::model::category::{split_path, CategoryId};
use std::collections::BTreeMap;

/// Keyword/path signals that map a listing onto one group key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    pub group_key: String,
    pub label: String,
    pub keywords_include: Vec<String>,
    pub keywords_exclude: Vec<String>,
    /// Source domain (lowercase) -> exact source category paths.
    pub source_paths: BTreeMap<String, Vec<Vec<String>>>,
}

impl GroupRule {
    pub fn new(group_key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            label: label.into(),
            keywords_include: Vec::new(),
            keywords_exclude: Vec::new(),
            source_paths: BTreeMap::new(),
        }
    }

    pub fn with_include(mut self, keywords: &[&str]) -> Self {
        self.keywords_include = normalize_keywords(keywords.iter().copied());
        self
    }

    pub fn with_exclude(mut self, keywords: &[&str]) -> Self {
        self.keywords_exclude = normalize_keywords(keywords.iter().copied());
        self
    }

    pub fn with_source_path(mut self, source_domain: &str, path: &str) -> Self {
        self.source_paths
            .entry(normalize_source_domain(source_domain))
            .or_default()
            .push(split_path(path));
        self
    }

    /// Paths declared for one source domain.
    pub fn paths_for(&self, source_domain: &str) -> &[Vec<String>] {
        self.source_paths
            .get(normalize_source_domain(source_domain).as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Candidate destination ids for one group key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRule {
    pub group_key: String,
    pub candidate_category_ids: Vec<CategoryId>,
    pub priority: i64,
}

/// Human-authored keyword rule forcing one destination category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongOverrideRule {
    /// `strong_override[<index>]` in document order.
    pub rule_id: String,
    pub keywords: Vec<String>,
    pub target_category_id: CategoryId,
    pub reason: Option<String>,
}

impl StrongOverrideRule {
    pub fn new(index: usize, keywords: &[&str], target: impl Into<CategoryId>) -> Self {
        Self {
            rule_id: strong_override_rule_id(index),
            keywords: normalize_keywords(keywords.iter().copied()),
            target_category_id: target.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Target rules of one group plus the global strong-override list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRuleSet {
    pub targets: BTreeMap<String, TargetRule>,
    pub strong_overrides: Vec<StrongOverrideRule>,
}

impl TargetRuleSet {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.strong_overrides.is_empty()
    }

    /// Candidate ids for `group_key`; empty when the key has no target rule.
    pub fn candidates_for(&self, group_key: &str) -> &[CategoryId] {
        self.targets
            .get(group_key)
            .map(|rule| rule.candidate_category_ids.as_slice())
            .unwrap_or(&[])
    }
}

pub fn strong_override_rule_id(index: usize) -> String {
    format!("strong_override[{index}]")
}

pub fn normalize_source_domain(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalizes like product names and drops blanks, keeping first occurrences.
pub fn normalize_keywords<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let keyword = normalize_name(value);
        if keyword.is_empty() || out.contains(&keyword) {
            continue;
        }
        out.push(keyword);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{normalize_keywords, GroupRule, StrongOverrideRule, TargetRule, TargetRuleSet};
    use crate::model::category::CategoryId;

    #[test]
    fn normalize_keywords_lowercases_and_dedups() {
        assert_eq!(
            normalize_keywords([" Pot ", "pot", "", "  ", "냄비"]),
            vec!["pot", "냄비"]
        );
    }

    #[test]
    fn normalize_keywords_collapses_inner_whitespace() {
        assert_eq!(
            normalize_keywords(["양수  냄비", "양수 냄비", "Stock\tPOT"]),
            vec!["양수 냄비", "stock pot"]
        );
    }

    #[test]
    fn paths_for_is_case_insensitive_on_domain() {
        let rule = GroupRule::new("kitchen", "Kitchen").with_source_path("Costco", "주방용품>냄비");
        assert_eq!(rule.paths_for("COSTCO").len(), 1);
        assert!(rule.paths_for("emart").is_empty());
    }

    #[test]
    fn candidates_for_unknown_group_is_empty() {
        let mut set = TargetRuleSet::default();
        set.targets.insert(
            "kitchen".to_string(),
            TargetRule {
                group_key: "kitchen".to_string(),
                candidate_category_ids: vec![CategoryId::new("1")],
                priority: 0,
            },
        );
        assert_eq!(set.candidates_for("kitchen").len(), 1);
        assert!(set.candidates_for("garden").is_empty());
    }

    #[test]
    fn strong_override_rule_id_follows_index() {
        let rule = StrongOverrideRule::new(3, &["Wok"], "9").with_reason("woks");
        assert_eq!(rule.rule_id, "strong_override[3]");
        assert_eq!(rule.keywords, vec!["wok"]);
        assert_eq!(rule.reason.as_deref(), Some("woks"));
    }
}
