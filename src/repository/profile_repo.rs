// ==========================================
// Cut-List Import Pipeline - profile repository
// ==========================================
// Profiles are shared reference data keyed by number, with a unique
// article_number alongside. The batch fetch keeps the writer at O(k):
// one IN-list query per file instead of one lookup per row.
// ==========================================

use crate::domain::Profile;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Row, ToSql, Transaction};

pub struct ProfileRepository;

fn map_profile(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get("id")?,
        number: row.get("number")?,
        name: row.get("name")?,
        article_number: row.get("article_number")?,
    })
}

fn placeholders(offset: usize, count: usize) -> String {
    (offset..offset + count)
        .map(|i| format!("?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProfileRepository {
    /// Fetch every profile matching any of the given profile numbers OR
    /// article numbers in a single query.
    pub fn fetch_batch_tx(
        tx: &Transaction,
        numbers: &[&str],
        article_numbers: &[&str],
    ) -> RepositoryResult<Vec<Profile>> {
        // "IN ()" is a syntax error in SQLite; build only the clauses
        // that have values
        let mut clauses = Vec::new();
        if !numbers.is_empty() {
            clauses.push(format!("number IN ({})", placeholders(0, numbers.len())));
        }
        if !article_numbers.is_empty() {
            clauses.push(format!(
                "article_number IN ({})",
                placeholders(numbers.len(), article_numbers.len())
            ));
        }
        if clauses.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT * FROM profiles WHERE {}", clauses.join(" OR "));
        let mut stmt = tx.prepare(&sql)?;
        let args: Vec<&dyn ToSql> = numbers
            .iter()
            .chain(article_numbers.iter())
            .map(|s| s as &dyn ToSql)
            .collect();
        let profiles = stmt
            .query_map(args.as_slice(), map_profile)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    /// Create a profile unless one with this number already exists.
    /// INSERT OR IGNORE makes a concurrent create by another import a
    /// success, not a constraint error. Returns the profile's id.
    pub fn insert_if_absent_tx(
        tx: &Transaction,
        number: &str,
        name: &str,
        article_number: &str,
    ) -> RepositoryResult<i64> {
        tx.execute(
            "INSERT OR IGNORE INTO profiles (number, name, article_number) VALUES (?1, ?2, ?3)",
            params![number, name, article_number],
        )?;
        let id = tx.query_row(
            "SELECT id FROM profiles WHERE number = ?1",
            params![number],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Fill in a missing article_number on an existing profile. Never
    /// overwrites a value that is already set.
    pub fn backfill_article_number_tx(
        tx: &Transaction,
        profile_id: i64,
        article_number: &str,
    ) -> RepositoryResult<bool> {
        let changed = tx.execute(
            "UPDATE profiles SET article_number = ?2 WHERE id = ?1 AND article_number IS NULL",
            params![profile_id, article_number],
        )?;
        Ok(changed > 0)
    }
}
