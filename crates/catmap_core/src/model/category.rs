//! Destination taxonomy model.
//!
//! # Responsibility
//! - Define the canonical destination category record.
//! - Provide an ordered, id-indexed taxonomy table.
//!
//! # Invariants
//! - `CategoryId` values are unique inside one `TaxonomyMaster`.
//! - Table order is the order rows were supplied in; lookups never reorder it.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

/// Separator used when a category path is rendered as one string.
pub const PATH_SEPARATOR: char = '>';

/// Stable identifier of a destination category. Always trimmed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CategoryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One node of the destination taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCategory {
    pub id: CategoryId,
    /// Ancestor labels from root to leaf.
    pub path: Vec<String>,
}

impl TargetCategory {
    pub fn new(id: impl Into<CategoryId>, path: Vec<String>) -> Self {
        Self {
            id: id.into(),
            path,
        }
    }

    /// Builds a category from a `A>B>C` rendered path.
    pub fn from_path_str(id: impl Into<CategoryId>, path: &str) -> Self {
        Self::new(id, split_path(path))
    }

    /// Most specific path segment, or `""` for an empty path.
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    pub fn path_string(&self) -> String {
        join_path(&self.path)
    }
}

/// Splits a rendered path on `>` and drops blank segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_path(segments: &[String]) -> String {
    segments.join(&PATH_SEPARATOR.to_string())
}

/// Immutable destination taxonomy table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyMaster {
    categories: Vec<TargetCategory>,
    index: HashMap<CategoryId, usize>,
}

impl TaxonomyMaster {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a taxonomy from rows in their supplied order.
    ///
    /// Duplicate ids keep the first row; later rows are dropped with a warning.
    pub fn from_categories(rows: impl IntoIterator<Item = TargetCategory>) -> Self {
        let mut categories = Vec::new();
        let mut index = HashMap::new();
        for row in rows {
            if row.id.as_str().is_empty() {
                warn!("event=taxonomy_row_skipped module=model status=warn reason=empty_id");
                continue;
            }
            if index.contains_key(&row.id) {
                warn!(
                    "event=taxonomy_row_skipped module=model status=warn reason=duplicate_id category_id={}",
                    row.id
                );
                continue;
            }
            index.insert(row.id.clone(), categories.len());
            categories.push(row);
        }
        Self { categories, index }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: &CategoryId) -> Option<&TargetCategory> {
        self.index.get(id).map(|&position| &self.categories[position])
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.index.contains_key(id)
    }

    pub fn categories(&self) -> &[TargetCategory] {
        &self.categories
    }

    /// Returns rows for `ids` in the order of `ids`.
    ///
    /// Unknown and repeated ids are skipped.
    pub fn restrict<'a>(&self, ids: impl IntoIterator<Item = &'a CategoryId>) -> Vec<TargetCategory> {
        let mut seen = HashSet::new();
        ids.into_iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{split_path, CategoryId, TargetCategory, TaxonomyMaster};

    fn category(id: &str, path: &str) -> TargetCategory {
        TargetCategory::from_path_str(id, path)
    }

    #[test]
    fn deserialized_ids_are_trimmed_like_constructed_ones() {
        let id: CategoryId = serde_json::from_str(r#"" 50001 ""#).expect("valid id");
        assert_eq!(id, CategoryId::new("50001"));

        let parsed: TargetCategory =
            serde_json::from_str(r#"{ "id": "  7 ", "path": ["A", "B"] }"#).expect("valid row");
        assert_eq!(parsed.id.as_str(), "7");
        assert_eq!(
            serde_json::to_string(&parsed.id).expect("serialize id"),
            r#""7""#
        );
    }

    #[test]
    fn split_path_trims_segments_and_drops_blanks() {
        assert_eq!(
            split_path(" 주방용품 > 냄비 >> 양수냄비 "),
            vec!["주방용품", "냄비", "양수냄비"]
        );
        assert!(split_path("   ").is_empty());
    }

    #[test]
    fn leaf_is_last_segment() {
        let row = category("100", "주방용품>냄비>양수냄비");
        assert_eq!(row.leaf(), "양수냄비");
        assert_eq!(row.path_string(), "주방용품>냄비>양수냄비");
        assert_eq!(TargetCategory::new("1", vec![]).leaf(), "");
    }

    #[test]
    fn duplicate_ids_keep_first_row() {
        let taxonomy = TaxonomyMaster::from_categories(vec![
            category("1", "A>B"),
            category("1", "A>C"),
            category("2", "A>D"),
        ]);
        assert_eq!(taxonomy.len(), 2);
        assert_eq!(taxonomy.get(&CategoryId::new("1")).unwrap().leaf(), "B");
    }

    #[test]
    fn restrict_preserves_requested_order_and_skips_unknown() {
        let taxonomy = TaxonomyMaster::from_categories(vec![
            category("1", "A>B"),
            category("2", "A>C"),
            category("3", "A>D"),
        ]);
        let ids = [
            CategoryId::new("3"),
            CategoryId::new("missing"),
            CategoryId::new("1"),
            CategoryId::new("3"),
        ];
        let rows = taxonomy.restrict(ids.iter());
        let got: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(got, vec!["3", "1"]);
    }
}
