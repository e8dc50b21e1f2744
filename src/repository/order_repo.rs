// ==========================================
// Cut-List Import Pipeline - order repository
// ==========================================
// Orders plus their owned requirement / finished-unit rows. All write
// paths are `*_tx` statics so the import writer can compose them into
// one transaction; the struct itself only offers read access.
// ==========================================

use crate::domain::{Order, ParsedDocument, ParsedUnit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex};

pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

fn map_order(row: &Row) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get("id")?,
        order_number: row.get("order_number")?,
        client: row.get("client")?,
        project: row.get("project")?,
        system: row.get("system")?,
        deadline: row.get("deadline")?,
        pvc_delivery_date: row.get("pvc_delivery_date")?,
        total_units: row.get("total_units")?,
        total_subunits: row.get("total_subunits")?,
        total_glass_panes: row.get("total_glass_panes")?,
        value_eur: row.get("value_eur")?,
        value_pln: row.get("value_pln")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl OrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn find_by_number(&self, order_number: &str) -> RepositoryResult<Option<Order>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let order = conn
            .query_row(
                "SELECT * FROM orders WHERE order_number = ?1",
                params![order_number],
                map_order,
            )
            .optional()?;
        Ok(order)
    }

    // ==========================================
    // transactional building blocks
    // ==========================================

    pub fn find_by_number_tx(
        tx: &Transaction,
        order_number: &str,
    ) -> RepositoryResult<Option<Order>> {
        let order = tx
            .query_row(
                "SELECT * FROM orders WHERE order_number = ?1",
                params![order_number],
                map_order,
            )
            .optional()?;
        Ok(order)
    }

    /// Insert a fresh order from a parsed document. Header fields map
    /// straight through; a missing value stays NULL.
    pub fn create_tx(
        tx: &Transaction,
        order_number: &str,
        doc: &ParsedDocument,
        value_eur: Option<f64>,
        value_pln: Option<f64>,
    ) -> RepositoryResult<i64> {
        let now = Utc::now();
        tx.execute(
            r#"
            INSERT INTO orders (
                order_number, client, project, system, deadline,
                pvc_delivery_date, total_units, total_subunits,
                total_glass_panes, value_eur, value_pln,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                order_number,
                doc.client,
                doc.project,
                doc.system,
                doc.deadline,
                doc.pvc_delivery_date,
                doc.totals.units,
                doc.totals.subunits,
                doc.totals.glass_panes,
                value_eur,
                value_pln,
                now,
                now,
            ],
        )?;
        Ok(tx.last_insert_rowid())
    }

    /// Re-apply the header fields of a document onto an existing order.
    /// A field the file does not carry becomes NULL: the file is the
    /// source of truth for these columns.
    pub fn update_scalars_tx(
        tx: &Transaction,
        order_id: i64,
        doc: &ParsedDocument,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            UPDATE orders SET
                client = ?2, project = ?3, system = ?4, deadline = ?5,
                pvc_delivery_date = ?6, total_units = ?7,
                total_subunits = ?8, total_glass_panes = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                order_id,
                doc.client,
                doc.project,
                doc.system,
                doc.deadline,
                doc.pvc_delivery_date,
                doc.totals.units,
                doc.totals.subunits,
                doc.totals.glass_panes,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// Delete requirement and finished-unit rows, keep the order row.
    /// Overwrite mode calls this before re-applying the document.
    pub fn delete_children_tx(tx: &Transaction, order_id: i64) -> RepositoryResult<()> {
        tx.execute(
            "DELETE FROM order_requirements WHERE order_id = ?1",
            params![order_id],
        )?;
        tx.execute(
            "DELETE FROM finished_units WHERE order_id = ?1",
            params![order_id],
        )?;
        Ok(())
    }

    /// Delete every variant of a base order except `keep`. Used when a
    /// replace resolution supersedes older suffixed imports.
    pub fn delete_sibling_variants_tx(
        tx: &Transaction,
        base: &str,
        keep: &str,
    ) -> RepositoryResult<usize> {
        let deleted = tx.execute(
            "DELETE FROM orders WHERE order_number LIKE ?1 || '-%' AND order_number != ?2",
            params![base, keep],
        )?;
        Ok(deleted)
    }

    /// Insert or update one material requirement. Uniqueness is on
    /// (order, profile, color); a re-import in add_new mode replaces
    /// the quantity instead of stacking a duplicate row.
    pub fn upsert_requirement_tx(
        tx: &Transaction,
        order_id: i64,
        profile_id: i64,
        color_id: i64,
        beams_count: u32,
        meters: f64,
        rest_mm: u32,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO order_requirements (
                order_id, profile_id, color_id, beams_count, meters, rest_mm
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(order_id, profile_id, color_id) DO UPDATE SET
                beams_count = excluded.beams_count,
                meters = excluded.meters,
                rest_mm = excluded.rest_mm
            "#,
            params![order_id, profile_id, color_id, beams_count, meters, rest_mm],
        )?;
        Ok(())
    }

    pub fn insert_unit_tx(
        tx: &Transaction,
        order_id: i64,
        unit: &ParsedUnit,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO finished_units (
                order_id, position, width_mm, height_mm,
                profile_type, quantity, reference
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                order_id,
                unit.position,
                unit.width_mm,
                unit.height_mm,
                unit.profile_type,
                unit.quantity,
                unit.reference,
            ],
        )?;
        Ok(())
    }

    pub fn requirement_count_tx(tx: &Transaction, order_id: i64) -> RepositoryResult<u32> {
        let n = tx.query_row(
            "SELECT COUNT(*) FROM order_requirements WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn unit_count_tx(tx: &Transaction, order_id: i64) -> RepositoryResult<u32> {
        let n = tx.query_row(
            "SELECT COUNT(*) FROM finished_units WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::DocumentTotals;

    fn test_doc(order_number: &str) -> ParsedDocument {
        ParsedDocument {
            order_number: order_number.to_string(),
            client: Some("Kowalski".to_string()),
            project: None,
            system: Some("Salamander 82".to_string()),
            deadline: None,
            pvc_delivery_date: None,
            requirements: vec![],
            finished_units: vec![],
            totals: DocumentTotals {
                units: 3,
                subunits: 5,
                glass_panes: 7,
            },
            row_issues: vec![],
        }
    }

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_find() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        let id = OrderRepository::create_tx(&tx, "53526", &test_doc("53526"), Some(100.0), None)
            .unwrap();
        tx.commit().unwrap();

        let repo = OrderRepository::new(Arc::new(Mutex::new(conn)));
        let order = repo.find_by_number("53526").unwrap().unwrap();
        assert_eq!(order.id, id);
        assert_eq!(order.client.as_deref(), Some("Kowalski"));
        assert_eq!(order.total_units, Some(3));
        assert_eq!(order.value_eur, Some(100.0));
        assert!(repo.find_by_number("99999").unwrap().is_none());
    }

    #[test]
    fn test_update_scalars_nulls_missing_fields() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        let id = OrderRepository::create_tx(&tx, "53526", &test_doc("53526"), None, None).unwrap();

        let mut updated = test_doc("53526");
        updated.client = None;
        updated.project = Some("Osiedle".to_string());
        OrderRepository::update_scalars_tx(&tx, id, &updated).unwrap();

        let order = OrderRepository::find_by_number_tx(&tx, "53526")
            .unwrap()
            .unwrap();
        assert_eq!(order.client, None);
        assert_eq!(order.project.as_deref(), Some("Osiedle"));
        tx.commit().unwrap();
    }

    #[test]
    fn test_requirement_upsert_replaces_quantity() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        let order_id =
            OrderRepository::create_tx(&tx, "53526", &test_doc("53526"), None, None).unwrap();
        tx.execute(
            "INSERT INTO profiles (number, name) VALUES ('9016', 'Profil 9016')",
            [],
        )
        .unwrap();
        tx.execute("INSERT INTO colors (code, name) VALUES ('050', 'Bia\u{142}y')", [])
            .unwrap();

        OrderRepository::upsert_requirement_tx(&tx, order_id, 1, 1, 10, 0.0, 0).unwrap();
        OrderRepository::upsert_requirement_tx(&tx, order_id, 1, 1, 9, 5.0, 1500).unwrap();

        assert_eq!(OrderRepository::requirement_count_tx(&tx, order_id).unwrap(), 1);
        let (beams, meters): (u32, f64) = tx
            .query_row(
                "SELECT beams_count, meters FROM order_requirements WHERE order_id = ?1",
                params![order_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(beams, 9);
        assert_eq!(meters, 5.0);
        tx.commit().unwrap();
    }

    #[test]
    fn test_delete_sibling_variants_keeps_base_and_target() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        for number in ["53526", "53526-a", "53526-b", "535267"] {
            OrderRepository::create_tx(&tx, number, &test_doc(number), None, None).unwrap();
        }

        let deleted = OrderRepository::delete_sibling_variants_tx(&tx, "53526", "53526-b").unwrap();
        assert_eq!(deleted, 1);

        assert!(OrderRepository::find_by_number_tx(&tx, "53526").unwrap().is_some());
        assert!(OrderRepository::find_by_number_tx(&tx, "53526-b").unwrap().is_some());
        // a longer base must never match as a variant
        assert!(OrderRepository::find_by_number_tx(&tx, "535267").unwrap().is_some());
        assert!(OrderRepository::find_by_number_tx(&tx, "53526-a").unwrap().is_none());
        tx.commit().unwrap();
    }
}
