// ==========================================
// Cut-List Import Pipeline - pending order prices
// ==========================================
// Supplier price lists often arrive before the cut-list files. The
// prices wait here and are applied exactly once when the order is
// first created: exact order-number match first, then the newest
// pending price whose number shares the base prefix.
// ==========================================

use crate::domain::PendingOrderPrice;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension, Row, Transaction};

pub struct PendingPriceRepository;

fn map_price(row: &Row) -> rusqlite::Result<PendingOrderPrice> {
    Ok(PendingOrderPrice {
        id: row.get("id")?,
        order_number: row.get("order_number")?,
        currency: row.get("currency")?,
        value_netto: row.get("value_netto")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
    })
}

impl PendingPriceRepository {
    /// Find the pending price for a new order: exact match on the full
    /// number wins, otherwise the most recent pending entry for the
    /// same base (base itself or any of its variants).
    pub fn find_pending_tx(
        tx: &Transaction,
        full_number: &str,
        base: &str,
    ) -> RepositoryResult<Option<PendingOrderPrice>> {
        let exact = tx
            .query_row(
                r#"
                SELECT * FROM pending_order_prices
                WHERE order_number = ?1 AND status = 'pending'
                ORDER BY created_at DESC LIMIT 1
                "#,
                params![full_number],
                map_price,
            )
            .optional()?;
        if exact.is_some() {
            return Ok(exact);
        }

        let by_base = tx
            .query_row(
                r#"
                SELECT * FROM pending_order_prices
                WHERE (order_number = ?1 OR order_number LIKE ?1 || '-%')
                  AND status = 'pending'
                ORDER BY created_at DESC LIMIT 1
                "#,
                params![base],
                map_price,
            )
            .optional()?;
        Ok(by_base)
    }

    /// Consume a pending price: it can never be applied twice.
    pub fn mark_applied_tx(
        tx: &Transaction,
        price_id: i64,
        order_id: i64,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            UPDATE pending_order_prices
            SET status = 'applied', applied_at = ?2, applied_to_order_id = ?3
            WHERE id = ?1
            "#,
            params![price_id, chrono::Utc::now(), order_id],
        )?;
        Ok(())
    }
}
