//! Strong-override matching.
//!
//! # Invariants
//! - A rule fires only if its target is in the active candidate set and one of
//!   its keywords is a case-insensitive substring of the product name.
//! - Firing rules naming more than one distinct target never decide.

use crate::matcher::keywords::normalize_name;
use crate::model::category::{CategoryId, TargetCategory};
use crate::model::rule::StrongOverrideRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrongOverrideOutcome<'a> {
    Decided {
        rule: &'a StrongOverrideRule,
        keyword: &'a str,
        category: &'a TargetCategory,
    },
    Ambiguous {
        rule_ids: Vec<String>,
        target_ids: Vec<CategoryId>,
    },
    NoMatch,
}

impl StrongOverrideOutcome<'_> {
    /// Rule-supplied reason, or one citing the triggering keyword.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Decided { rule, keyword, .. } => Some(
                rule.reason
                    .clone()
                    .unwrap_or_else(|| format!("strong override keyword '{keyword}'")),
            ),
            Self::Ambiguous { .. } | Self::NoMatch => None,
        }
    }
}

pub fn match_strong_override<'a>(
    rules: &'a [StrongOverrideRule],
    candidates: &'a [TargetCategory],
    product_name: &str,
) -> StrongOverrideOutcome<'a> {
    let name = normalize_name(product_name);
    if name.is_empty() || candidates.is_empty() {
        return StrongOverrideOutcome::NoMatch;
    }

    let mut firing: Vec<(&'a StrongOverrideRule, &'a str, &'a TargetCategory)> = Vec::new();
    for rule in rules {
        let Some(category) = candidates
            .iter()
            .find(|category| category.id == rule.target_category_id)
        else {
            continue;
        };
        if let Some(keyword) = rule
            .keywords
            .iter()
            .find(|keyword| name.contains(keyword.as_str()))
        {
            firing.push((rule, keyword.as_str(), category));
        }
    }

    let mut target_ids: Vec<CategoryId> = Vec::new();
    for (rule, _, _) in &firing {
        if !target_ids.contains(&rule.target_category_id) {
            target_ids.push(rule.target_category_id.clone());
        }
    }

    match (firing.first(), target_ids.len()) {
        (None, _) => StrongOverrideOutcome::NoMatch,
        (Some(&(rule, keyword, category)), 1) => StrongOverrideOutcome::Decided {
            rule,
            keyword,
            category,
        },
        (Some(_), _) => StrongOverrideOutcome::Ambiguous {
            rule_ids: firing.iter().map(|(rule, _, _)| rule.rule_id.clone()).collect(),
            target_ids,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{match_strong_override, StrongOverrideOutcome};
    use crate::model::category::{CategoryId, TargetCategory};
    use crate::model::rule::StrongOverrideRule;

    fn candidates() -> Vec<TargetCategory> {
        vec![
            TargetCategory::from_path_str("100", "주방용품>냄비>양수냄비"),
            TargetCategory::from_path_str("200", "주방용품>냄비>편수냄비"),
            TargetCategory::from_path_str("300", "주방용품>프라이팬>웍"),
        ]
    }

    #[test]
    fn single_firing_target_decides_with_synthesized_reason() {
        let rules = vec![StrongOverrideRule::new(0, &["WOK"], "300")];
        let candidates = candidates();
        let outcome = match_strong_override(&rules, &candidates, "Large Wok 32cm");
        match &outcome {
            StrongOverrideOutcome::Decided { category, keyword, .. } => {
                assert_eq!(category.id.as_str(), "300");
                assert_eq!(*keyword, "wok");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(outcome.reason().as_deref(), Some("strong override keyword 'wok'"));
    }

    #[test]
    fn multi_space_keyword_fires_on_collapsed_name() {
        let rules = vec![StrongOverrideRule::new(0, &["양수  냄비"], "100")];
        let candidates = candidates();
        let outcome = match_strong_override(&rules, &candidates, "스텐   양수 냄비 24cm");
        assert!(matches!(
            outcome,
            StrongOverrideOutcome::Decided { keyword: "양수 냄비", .. }
        ));
    }

    #[test]
    fn rule_reason_is_preferred() {
        let rules = vec![StrongOverrideRule::new(0, &["양수"], "100").with_reason("two handles")];
        let candidates = candidates();
        let outcome = match_strong_override(&rules, &candidates, "스텐 양수 냄비");
        assert_eq!(outcome.reason().as_deref(), Some("two handles"));
    }

    #[test]
    fn rules_outside_candidate_set_never_fire() {
        let rules = vec![StrongOverrideRule::new(0, &["냄비"], "999")];
        let candidates = candidates();
        assert_eq!(
            match_strong_override(&rules, &candidates, "냄비"),
            StrongOverrideOutcome::NoMatch
        );
    }

    #[test]
    fn same_target_from_several_rules_still_decides() {
        let rules = vec![
            StrongOverrideRule::new(0, &["양수"], "100"),
            StrongOverrideRule::new(1, &["냄비"], "100"),
        ];
        let candidates = candidates();
        let outcome = match_strong_override(&rules, &candidates, "양수 냄비");
        assert!(matches!(outcome, StrongOverrideOutcome::Decided { .. }));
    }

    #[test]
    fn conflicting_targets_are_ambiguous() {
        let rules = vec![
            StrongOverrideRule::new(0, &["양수"], "100"),
            StrongOverrideRule::new(1, &["편수"], "200"),
        ];
        let candidates = candidates();
        let outcome = match_strong_override(&rules, &candidates, "양수 편수 겸용 냄비");
        assert_eq!(
            outcome,
            StrongOverrideOutcome::Ambiguous {
                rule_ids: vec![
                    "strong_override[0]".to_string(),
                    "strong_override[1]".to_string()
                ],
                target_ids: vec![CategoryId::new("100"), CategoryId::new("200")],
            }
        );
        assert!(outcome.reason().is_none());
    }
}
