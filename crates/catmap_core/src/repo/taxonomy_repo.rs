//! Taxonomy master contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read destination categories in stable order.
//! - Replace the full table on external refresh.
//!
//! # Invariants
//! - Rows come back ordered by `ordinal ASC, category_id ASC`.
//! - `replace_all` is atomic: readers see the old or the new table, never a mix.

use crate::db::open_db_read_only;
use crate::model::category::{split_path, TargetCategory, TaxonomyMaster};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::Instant;

const CATEGORY_SELECT_SQL: &str = "SELECT
    category_id,
    category_path
FROM taxonomy_categories
ORDER BY ordinal ASC, category_id ASC";

/// Repository interface for taxonomy master rows.
pub trait TaxonomyRepository {
    fn list_categories(&self) -> RepoResult<Vec<TargetCategory>>;
    /// Replaces every row; returns the number of rows written.
    fn replace_all(&self, categories: &[TargetCategory]) -> RepoResult<usize>;
}

/// SQLite-backed taxonomy repository.
pub struct SqliteTaxonomyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaxonomyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaxonomyRepository for SqliteTaxonomyRepository<'_> {
    fn list_categories(&self) -> RepoResult<Vec<TargetCategory>> {
        let mut stmt = self.conn.prepare(CATEGORY_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn replace_all(&self, categories: &[TargetCategory]) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM taxonomy_categories;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO taxonomy_categories (category_id, category_path, ordinal)
                 VALUES (?1, ?2, ?3);",
            )?;
            for (ordinal, category) in categories.iter().enumerate() {
                if category.id.as_str().is_empty() {
                    return Err(RepoError::InvalidData(format!(
                        "empty category id at row {ordinal}"
                    )));
                }
                insert.execute(params![
                    category.id.as_str(),
                    category.path_string(),
                    ordinal as i64,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=taxonomy_replace module=repo status=ok rows={}",
            categories.len()
        );
        Ok(categories.len())
    }
}

/// Builds a taxonomy from any repository, degrading to empty on failure.
pub fn load_taxonomy(repo: &impl TaxonomyRepository) -> TaxonomyMaster {
    let started_at = Instant::now();
    match repo.list_categories() {
        Ok(rows) => {
            let taxonomy = TaxonomyMaster::from_categories(rows);
            info!(
                "event=taxonomy_load module=repo status=ok rows={} duration_ms={}",
                taxonomy.len(),
                started_at.elapsed().as_millis()
            );
            taxonomy
        }
        Err(err) => {
            warn!(
                "event=taxonomy_load module=repo status=degraded error_code=taxonomy_read_failed error={}",
                err
            );
            TaxonomyMaster::empty()
        }
    }
}

/// Opens the taxonomy database read-only and loads it.
///
/// Missing files, schema mismatches and corrupt rows all yield an empty
/// taxonomy.
pub fn load_taxonomy_from_path(path: impl AsRef<Path>) -> TaxonomyMaster {
    let path = path.as_ref();
    if !path.is_file() {
        warn!(
            "event=taxonomy_load module=repo status=degraded error_code=taxonomy_missing path={}",
            path.display()
        );
        return TaxonomyMaster::empty();
    }
    match open_db_read_only(path) {
        Ok(conn) => load_taxonomy(&SqliteTaxonomyRepository::new(&conn)),
        Err(err) => {
            warn!(
                "event=taxonomy_load module=repo status=degraded error_code=taxonomy_open_failed error={}",
                err
            );
            TaxonomyMaster::empty()
        }
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<TargetCategory> {
    let id: String = row.get("category_id")?;
    let path_text: String = row.get("category_path")?;
    let path = split_path(&path_text);
    if path.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty category_path for category `{id}`"
        )));
    }
    Ok(TargetCategory::new(id, path))
}

#[cfg(test)]
mod tests {
    use super::{load_taxonomy, SqliteTaxonomyRepository, TaxonomyRepository};
    use crate::db::open_db_in_memory;
    use crate::model::category::TargetCategory;

    #[test]
    fn replace_all_then_list_keeps_supplied_order() {
        let conn = open_db_in_memory().expect("in-memory db");
        let repo = SqliteTaxonomyRepository::new(&conn);
        let written = repo
            .replace_all(&[
                TargetCategory::from_path_str("200", "주방용품>냄비>양수냄비"),
                TargetCategory::from_path_str("100", "주방용품>냄비>편수냄비"),
            ])
            .expect("replace should succeed");
        assert_eq!(written, 2);

        let rows = repo.list_categories().expect("list should succeed");
        assert_eq!(rows[0].id.as_str(), "200");
        assert_eq!(rows[1].leaf(), "편수냄비");
    }

    #[test]
    fn replace_all_drops_previous_rows() {
        let conn = open_db_in_memory().expect("in-memory db");
        let repo = SqliteTaxonomyRepository::new(&conn);
        repo.replace_all(&[TargetCategory::from_path_str("1", "A>B")])
            .expect("first replace");
        repo.replace_all(&[TargetCategory::from_path_str("2", "A>C")])
            .expect("second replace");

        let taxonomy = load_taxonomy(&repo);
        assert_eq!(taxonomy.len(), 1);
        assert_eq!(taxonomy.categories()[0].id.as_str(), "2");
    }

    #[test]
    fn corrupt_row_degrades_to_empty_taxonomy() {
        let conn = open_db_in_memory().expect("in-memory db");
        conn.execute(
            "INSERT INTO taxonomy_categories (category_id, category_path) VALUES ('1', '  ');",
            [],
        )
        .expect("raw insert");
        let taxonomy = load_taxonomy(&SqliteTaxonomyRepository::new(&conn));
        assert!(taxonomy.is_empty());
    }
}
