//! Group key inference (cascade stage 0).
//!
//! # Invariants
//! - An exact source-path match on any rule beats every keyword match.
//! - Keyword inference is first-match in snapshot order; there is no scoring.

use crate::matcher::keywords::normalize_name;
use crate::model::category::split_path;
use crate::model::rule::GroupRule;

/// How the group key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMatch<'a> {
    SourcePath { rule: &'a GroupRule },
    Keyword { rule: &'a GroupRule, keyword: &'a str },
}

impl<'a> GroupMatch<'a> {
    pub fn rule(&self) -> &'a GroupRule {
        match self {
            Self::SourcePath { rule } | Self::Keyword { rule, .. } => rule,
        }
    }

    pub fn group_key(&self) -> &'a str {
        &self.rule().group_key
    }
}

pub fn infer_group<'a>(
    rules: &'a [GroupRule],
    source_domain: &str,
    source_category_path: &str,
    product_name: &str,
) -> Option<GroupMatch<'a>> {
    match_by_source_path(rules, source_domain, source_category_path)
        .or_else(|| match_by_keyword(rules, product_name))
}

fn match_by_source_path<'a>(
    rules: &'a [GroupRule],
    source_domain: &str,
    source_category_path: &str,
) -> Option<GroupMatch<'a>> {
    let requested = split_path(source_category_path);
    if requested.is_empty() {
        return None;
    }
    rules
        .iter()
        .find(|rule| rule.paths_for(source_domain).contains(&requested))
        .map(|rule| GroupMatch::SourcePath { rule })
}

fn match_by_keyword<'a>(rules: &'a [GroupRule], product_name: &str) -> Option<GroupMatch<'a>> {
    let name = normalize_name(product_name);
    if name.is_empty() {
        return None;
    }
    rules.iter().find_map(|rule| {
        let keyword = rule
            .keywords_include
            .iter()
            .find(|keyword| name.contains(keyword.as_str()))?;
        if rule
            .keywords_exclude
            .iter()
            .any(|excluded| name.contains(excluded.as_str()))
        {
            return None;
        }
        Some(GroupMatch::Keyword {
            rule,
            keyword: keyword.as_str(),
        })
    })
}
