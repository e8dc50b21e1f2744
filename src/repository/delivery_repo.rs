// ==========================================
// Cut-List Import Pipeline - delivery repository
// ==========================================
// A delivery is one dated batch (date + roman delivery number). Folder
// imports attach every imported order to the delivery the folder date
// names; an order already sitting in a different delivery is skipped
// upstream rather than moved.
// ==========================================

use crate::domain::Delivery;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct DeliveryRepository {
    conn: Arc<Mutex<Connection>>,
}

fn map_delivery(row: &Row) -> rusqlite::Result<Delivery> {
    Ok(Delivery {
        id: row.get("id")?,
        delivery_date: row.get("delivery_date")?,
        delivery_number: row.get("delivery_number")?,
    })
}

impl DeliveryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Returns the delivery plus whether this call created it.
    pub fn find_or_create(
        &self,
        delivery_date: NaiveDate,
        delivery_number: &str,
    ) -> RepositoryResult<(Delivery, bool)> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO deliveries (delivery_date, delivery_number, created_at)
             VALUES (?1, ?2, ?3)",
            params![delivery_date, delivery_number, chrono::Utc::now()],
        )?;
        let delivery = conn.query_row(
            "SELECT * FROM deliveries WHERE delivery_date = ?1 AND delivery_number = ?2",
            params![delivery_date, delivery_number],
            map_delivery,
        )?;
        Ok((delivery, inserted > 0))
    }

    /// If the order belongs to a delivery OTHER than `delivery_id`,
    /// return that delivery's id.
    pub fn order_in_other_delivery(
        &self,
        order_id: i64,
        delivery_id: i64,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.lock()?;
        let other = conn
            .query_row(
                "SELECT delivery_id FROM delivery_orders WHERE order_id = ?1 AND delivery_id != ?2",
                params![order_id, delivery_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(other)
    }

    /// Attach an order at the end of a delivery. Re-attaching to the
    /// same delivery is a no-op that keeps the original position.
    pub fn add_order(&self, delivery_id: i64, order_id: i64) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR IGNORE INTO delivery_orders (delivery_id, order_id, position)
            VALUES (
                ?1, ?2,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM delivery_orders WHERE delivery_id = ?1)
            )
            "#,
            params![delivery_id, order_id],
        )?;
        Ok(())
    }

    pub fn order_count(&self, delivery_id: i64) -> RepositoryResult<u32> {
        let conn = self.lock()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM delivery_orders WHERE delivery_id = ?1",
            params![delivery_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
