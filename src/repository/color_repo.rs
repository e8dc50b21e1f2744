// ==========================================
// Cut-List Import Pipeline - color repository
// ==========================================
// Colors are curated reference data. Imports only read them; a row
// referencing an unknown color code is skipped upstream, never causes
// a color to be created.
// ==========================================

use crate::domain::Color;
use crate::repository::error::RepositoryResult;
use rusqlite::{Row, ToSql, Transaction};

pub struct ColorRepository;

fn map_color(row: &Row) -> rusqlite::Result<Color> {
    Ok(Color {
        id: row.get("id")?,
        code: row.get("code")?,
        name: row.get("name")?,
    })
}

impl ColorRepository {
    /// Fetch every color matching one of the given codes in one query.
    pub fn fetch_by_codes_tx(tx: &Transaction, codes: &[&str]) -> RepositoryResult<Vec<Color>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=codes.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT * FROM colors WHERE code IN ({placeholders})");
        let mut stmt = tx.prepare(&sql)?;
        let args: Vec<&dyn ToSql> = codes.iter().map(|s| s as &dyn ToSql).collect();
        let colors = stmt
            .query_map(args.as_slice(), map_color)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(colors)
    }
}
