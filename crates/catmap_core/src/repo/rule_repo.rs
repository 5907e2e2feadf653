//! Per-group rule documents stored as JSON files.
//!
//! # Responsibility
//! - Read `group_rules.json` and `target_rules.json` for one group.
//! - Parse loosely-typed documents into typed rule records.
//! - List groups that have at least one document.
//!
//! # Invariants
//! - Loads never fail: a missing or corrupt document yields an empty result.
//! - One malformed entry is skipped with a warning; its siblings still load.
//! - Document key order is preserved and becomes snapshot order.
//!
//! Layout:
//!
//! ```text
//! <rules_dir>/<group>/group_rules.json
//! <rules_dir>/<group>/target_rules.json
//! ```

use crate::model::category::{split_path, CategoryId};
use crate::model::rule::{
    normalize_keywords, normalize_source_domain, strong_override_rule_id, GroupRule,
    StrongOverrideRule, TargetRule, TargetRuleSet,
};
use crate::repo::{RepoError, RepoResult};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const GROUP_RULES_FILE: &str = "group_rules.json";
pub const TARGET_RULES_FILE: &str = "target_rules.json";
/// Reserved target-document key holding the global strong-override list.
pub const STRONG_OVERRIDE_KEY: &str = "__strong_override__";

const SOURCE_PATHS_PREFIX: &str = "source_";
const SOURCE_PATHS_SUFFIX: &str = "_paths";

/// Read contract for per-group rule storage.
pub trait RuleRepository: Send + Sync {
    fn load_group_rules(&self, group: &str) -> Vec<GroupRule>;
    fn load_target_rules(&self, group: &str) -> TargetRuleSet;
    fn list_available_groups(&self) -> BTreeSet<String>;
}

/// Directory-of-JSON rule repository.
#[derive(Debug, Clone)]
pub struct JsonRuleRepository {
    root: PathBuf,
}

impl JsonRuleRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, group: &str, file_name: &str) -> RepoResult<PathBuf> {
        let group = group.trim();
        if !is_valid_group_name(group) {
            return Err(RepoError::InvalidGroupName(group.to_string()));
        }
        Ok(self.root.join(group).join(file_name))
    }

    /// Reads one document as a JSON object; `None` when the file is absent.
    fn read_document(&self, group: &str, file_name: &str) -> RepoResult<Option<Map<String, Value>>> {
        let path = self.document_path(group, file_name)?;
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(RepoError::InvalidData(format!(
                "{} must hold a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn read_or_degrade(&self, group: &str, file_name: &str) -> Option<Map<String, Value>> {
        match self.read_document(group, file_name) {
            Ok(Some(document)) => Some(document),
            Ok(None) => {
                debug!(
                    "event=rules_load module=repo status=missing group={} file={}",
                    group.trim(),
                    file_name
                );
                None
            }
            Err(err) => {
                warn!(
                    "event=rules_load module=repo status=degraded group={} file={} error={}",
                    group.trim(),
                    file_name,
                    err
                );
                None
            }
        }
    }
}

impl RuleRepository for JsonRuleRepository {
    fn load_group_rules(&self, group: &str) -> Vec<GroupRule> {
        self.read_or_degrade(group, GROUP_RULES_FILE)
            .map(|document| parse_group_rules(group, document))
            .unwrap_or_default()
    }

    fn load_target_rules(&self, group: &str) -> TargetRuleSet {
        self.read_or_degrade(group, TARGET_RULES_FILE)
            .map(|document| parse_target_rules(group, document))
            .unwrap_or_default()
    }

    fn list_available_groups(&self) -> BTreeSet<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=rules_list module=repo status=degraded root={} error={}",
                    self.root.display(),
                    err
                );
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| is_valid_group_name(name))
            .filter(|name| {
                let dir = self.root.join(name);
                dir.join(GROUP_RULES_FILE).is_file() || dir.join(TARGET_RULES_FILE).is_file()
            })
            .collect()
    }
}

/// Group names double as directory names: `[a-z0-9_-]+`.
pub fn is_valid_group_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[derive(Debug, Deserialize)]
struct RawGroupRule {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    keywords_include: Vec<String>,
    #[serde(default)]
    keywords_exclude: Vec<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPath {
    Rendered(String),
    Segments(Vec<String>),
}

impl RawPath {
    fn into_segments(self) -> Vec<String> {
        match self {
            Self::Rendered(text) => split_path(&text),
            Self::Segments(segments) => segments
                .iter()
                .map(|segment| segment.trim())
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

impl RawId {
    fn into_category_id(self) -> CategoryId {
        match self {
            Self::Text(text) => CategoryId::new(text),
            Self::Integer(value) => CategoryId::new(value.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTargetRule {
    candidate_category_ids: Vec<RawId>,
    #[serde(default)]
    priority: i64,
}

#[derive(Debug, Deserialize)]
struct RawStrongOverride {
    keywords: Vec<String>,
    target_category_id: RawId,
    #[serde(default)]
    reason: Option<String>,
}

fn parse_group_rules(group: &str, document: Map<String, Value>) -> Vec<GroupRule> {
    let mut rules = Vec::with_capacity(document.len());
    for (key, value) in document {
        match parse_group_rule(&key, value) {
            Ok(rule) => rules.push(rule),
            Err(message) => warn!(
                "event=rule_skipped module=repo status=warn group={} kind=group_rule key={} reason={}",
                group.trim(),
                key,
                message
            ),
        }
    }
    rules
}

fn parse_group_rule(key: &str, value: Value) -> Result<GroupRule, String> {
    let group_key = key.trim();
    if group_key.is_empty() {
        return Err("empty group key".to_string());
    }
    let raw: RawGroupRule = serde_json::from_value(value).map_err(|err| err.to_string())?;

    let mut source_paths: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
    for (field, paths_value) in raw.rest {
        let Some(domain) = field
            .strip_prefix(SOURCE_PATHS_PREFIX)
            .and_then(|rest| rest.strip_suffix(SOURCE_PATHS_SUFFIX))
        else {
            continue;
        };
        let domain = normalize_source_domain(domain);
        if domain.is_empty() {
            return Err(format!("field `{field}` names no source domain"));
        }
        let paths: Vec<RawPath> = serde_json::from_value(paths_value)
            .map_err(|err| format!("field `{field}`: {err}"))?;
        let entry = source_paths.entry(domain).or_default();
        entry.extend(
            paths
                .into_iter()
                .map(RawPath::into_segments)
                .filter(|segments| !segments.is_empty()),
        );
    }

    Ok(GroupRule {
        group_key: group_key.to_string(),
        label: raw
            .label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| group_key.to_string()),
        keywords_include: normalize_keywords(raw.keywords_include.iter().map(String::as_str)),
        keywords_exclude: normalize_keywords(raw.keywords_exclude.iter().map(String::as_str)),
        source_paths,
    })
}

fn parse_target_rules(group: &str, document: Map<String, Value>) -> TargetRuleSet {
    let mut set = TargetRuleSet::default();
    for (key, value) in document {
        if key == STRONG_OVERRIDE_KEY {
            set.strong_overrides = parse_strong_overrides(group, value);
            continue;
        }
        match parse_target_rule(&key, value) {
            Ok(rule) => {
                set.targets.insert(rule.group_key.clone(), rule);
            }
            Err(message) => warn!(
                "event=rule_skipped module=repo status=warn group={} kind=target_rule key={} reason={}",
                group.trim(),
                key,
                message
            ),
        }
    }
    set
}

fn parse_target_rule(key: &str, value: Value) -> Result<TargetRule, String> {
    let group_key = key.trim();
    if group_key.is_empty() {
        return Err("empty group key".to_string());
    }
    let raw: RawTargetRule = serde_json::from_value(value).map_err(|err| err.to_string())?;
    let mut candidate_category_ids: Vec<CategoryId> = Vec::new();
    for id in raw.candidate_category_ids.into_iter().map(RawId::into_category_id) {
        if !id.as_str().is_empty() && !candidate_category_ids.contains(&id) {
            candidate_category_ids.push(id);
        }
    }
    Ok(TargetRule {
        group_key: group_key.to_string(),
        candidate_category_ids,
        priority: raw.priority,
    })
}

fn parse_strong_overrides(group: &str, value: Value) -> Vec<StrongOverrideRule> {
    let Value::Array(entries) = value else {
        warn!(
            "event=rule_skipped module=repo status=warn group={} kind=strong_override reason=expected_array found={}",
            group.trim(),
            json_kind(&value)
        );
        return Vec::new();
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match parse_strong_override(index, entry) {
            Ok(rule) => rules.push(rule),
            Err(message) => warn!(
                "event=rule_skipped module=repo status=warn group={} kind=strong_override rule_id={} reason={}",
                group.trim(),
                strong_override_rule_id(index),
                message
            ),
        }
    }
    rules
}

fn parse_strong_override(index: usize, value: Value) -> Result<StrongOverrideRule, String> {
    let raw: RawStrongOverride = serde_json::from_value(value).map_err(|err| err.to_string())?;
    let keywords = normalize_keywords(raw.keywords.iter().map(String::as_str));
    if keywords.is_empty() {
        return Err("no usable keywords".to_string());
    }
    let target_category_id = raw.target_category_id.into_category_id();
    if target_category_id.as_str().is_empty() {
        return Err("empty target_category_id".to_string());
    }
    Ok(StrongOverrideRule {
        rule_id: strong_override_rule_id(index),
        keywords,
        target_category_id,
        reason: raw
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty()),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
