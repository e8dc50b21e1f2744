// ==========================================
// Cut-List Import Pipeline - transactional import writer
// ==========================================
// Applies one ParsedDocument to the database in exactly one
// transaction. Reference-data resolution is O(k) per file: one batch
// fetch of profiles, one of colors, HashMap lookups per row. Hooks to
// the supplier-delivery linker run outside the transaction and are
// best-effort only.
// ==========================================

use crate::domain::{ImportMode, OrderNumberIdentity, ParsedDocument, RowIssue};
use crate::engine::conflict::ImportDirective;
use crate::engine::error::ImportResult;
use crate::parser::parse_order_number;
use crate::repository::{
    ColorRepository, OrderRepository, PendingPriceRepository, ProfileRepository, RepositoryError,
};
use async_trait::async_trait;
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ==========================================
// DeliveryLinkHooks - supplier-delivery integration seam
// ==========================================
// The supplier-delivery module owns price linking. At order creation
// the writer asks it for an already-linked amount; after a commit it
// lets it re-match open deliveries. Neither call may fail an import.
#[async_trait]
pub trait DeliveryLinkHooks: Send + Sync {
    /// Linked order value as (EUR, PLN), if the supplier module
    /// already knows this order number.
    async fn linked_delivery_amount(
        &self,
        order_number: &str,
    ) -> Option<(Option<f64>, Option<f64>)>;

    /// Post-commit: re-match supplier deliveries that failed to match
    /// before this order existed.
    async fn rematch_unmatched_deliveries(
        &self,
        order_id: i64,
        order_number: &str,
    ) -> anyhow::Result<()>;

    /// Post-commit: link deliveries already waiting on this order.
    async fn link_waiting_deliveries(
        &self,
        order_id: i64,
        order_number: &str,
    ) -> anyhow::Result<()>;
}

/// Default wiring when the supplier-delivery module is absent.
pub struct NoopDeliveryLinkHooks;

#[async_trait]
impl DeliveryLinkHooks for NoopDeliveryLinkHooks {
    async fn linked_delivery_amount(
        &self,
        _order_number: &str,
    ) -> Option<(Option<f64>, Option<f64>)> {
        None
    }

    async fn rematch_unmatched_deliveries(
        &self,
        _order_id: i64,
        _order_number: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn link_waiting_deliveries(
        &self,
        _order_id: i64,
        _order_number: &str,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What one successful write produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub order_id: i64,
    pub order_number: String,
    pub created: bool,
    pub requirement_count: u32,
    pub unit_count: u32,
    /// Rows skipped during persistence (unknown color codes).
    pub skipped_rows: Vec<RowIssue>,
}

pub struct ImportWriter {
    conn: Arc<Mutex<Connection>>,
    hooks: Arc<dyn DeliveryLinkHooks>,
}

impl ImportWriter {
    pub fn new(conn: Arc<Mutex<Connection>>, hooks: Arc<dyn DeliveryLinkHooks>) -> Self {
        Self { conn, hooks }
    }

    /// Apply a parsed document under a resolved directive. The whole
    /// write is one transaction; the post-commit hook cannot undo it.
    pub async fn apply(
        &self,
        doc: &ParsedDocument,
        directive: &ImportDirective,
    ) -> ImportResult<WriteOutcome> {
        let identity = parse_order_number(&directive.target_order_number)?;

        // hook lookups happen before the connection lock is taken:
        // the mutex must not be held across an await point
        let linked_value = self
            .hooks
            .linked_delivery_amount(&directive.target_order_number)
            .await;

        let outcome = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            let tx = conn
                .transaction()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

            let outcome = write_document_tx(&tx, doc, directive, &identity, linked_value)?;

            tx.commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            outcome
        };

        tracing::info!(
            order_number = %outcome.order_number,
            order_id = outcome.order_id,
            created = outcome.created,
            requirements = outcome.requirement_count,
            units = outcome.unit_count,
            skipped = outcome.skipped_rows.len(),
            "import committed"
        );

        // best-effort: a failed auto-link never fails the import
        if let Err(e) = self
            .hooks
            .rematch_unmatched_deliveries(outcome.order_id, &outcome.order_number)
            .await
        {
            tracing::warn!(
                order_number = %outcome.order_number,
                error = %e,
                "post-import delivery rematch failed"
            );
        }
        if let Err(e) = self
            .hooks
            .link_waiting_deliveries(outcome.order_id, &outcome.order_number)
            .await
        {
            tracing::warn!(
                order_number = %outcome.order_number,
                error = %e,
                "post-import delivery auto-link failed"
            );
        }

        Ok(outcome)
    }
}

fn write_document_tx(
    tx: &Transaction,
    doc: &ParsedDocument,
    directive: &ImportDirective,
    identity: &OrderNumberIdentity,
    linked_value: Option<(Option<f64>, Option<f64>)>,
) -> ImportResult<WriteOutcome> {
    if let Some(base) = &directive.delete_siblings_of_base {
        let deleted =
            OrderRepository::delete_sibling_variants_tx(tx, base, &directive.target_order_number)?;
        if deleted > 0 {
            tracing::info!(base = %base, deleted, "superseded variant orders deleted");
        }
    }

    let existing = OrderRepository::find_by_number_tx(tx, &directive.target_order_number)?;

    let (order_id, created) = match existing {
        Some(order) => {
            if directive.mode == ImportMode::Overwrite {
                OrderRepository::delete_children_tx(tx, order.id)?;
            }
            OrderRepository::update_scalars_tx(tx, order.id, doc)?;
            (order.id, false)
        }
        None => {
            // value priority: supplier-linked amount, then a waiting
            // pending price (consumed in the same transaction)
            let mut value = linked_value.unwrap_or((None, None));
            let mut pending_price_id = None;
            if linked_value.is_none() {
                if let Some(price) = PendingPriceRepository::find_pending_tx(
                    tx,
                    &directive.target_order_number,
                    &identity.base,
                )? {
                    value = if price.currency.eq_ignore_ascii_case("PLN") {
                        (None, Some(price.value_netto))
                    } else {
                        (Some(price.value_netto), None)
                    };
                    pending_price_id = Some(price.id);
                }
            }

            let id = OrderRepository::create_tx(
                tx,
                &directive.target_order_number,
                doc,
                value.0,
                value.1,
            )?;
            if let Some(price_id) = pending_price_id {
                PendingPriceRepository::mark_applied_tx(tx, price_id, id)?;
            }
            (id, true)
        }
    };

    let (requirement_count, unit_count, skipped_rows) = write_children_tx(tx, order_id, doc)?;

    Ok(WriteOutcome {
        order_id,
        order_number: directive.target_order_number.clone(),
        created,
        requirement_count,
        unit_count,
        skipped_rows,
    })
}

// ==========================================
// child rows: requirements (upsert) + finished units (insert)
// ==========================================
fn write_children_tx(
    tx: &Transaction,
    order_id: i64,
    doc: &ParsedDocument,
) -> ImportResult<(u32, u32, Vec<RowIssue>)> {
    let skipped = resolve_and_upsert_requirements_tx(tx, order_id, doc)?;

    for unit in &doc.finished_units {
        OrderRepository::insert_unit_tx(tx, order_id, unit)?;
    }

    let requirement_count = OrderRepository::requirement_count_tx(tx, order_id)?;
    let unit_count = OrderRepository::unit_count_tx(tx, order_id)?;
    Ok((requirement_count, unit_count, skipped))
}

/// Resolve every requirement row against reference data with two batch
/// queries, then upsert. Unknown profiles are created on the fly;
/// unknown colors skip the row with a warning.
fn resolve_and_upsert_requirements_tx(
    tx: &Transaction,
    order_id: i64,
    doc: &ParsedDocument,
) -> ImportResult<Vec<RowIssue>> {
    let numbers: Vec<&str> = doc
        .requirements
        .iter()
        .map(|r| r.profile_number.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let articles: Vec<&str> = doc
        .requirements
        .iter()
        .map(|r| r.article_number.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let codes: Vec<&str> = doc
        .requirements
        .iter()
        .map(|r| r.color_code.as_str())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let profiles = ProfileRepository::fetch_batch_tx(tx, &numbers, &articles)?;
    let colors = ColorRepository::fetch_by_codes_tx(tx, &codes)?;

    let mut by_number: HashMap<String, i64> = HashMap::new();
    let mut by_article: HashMap<String, i64> = HashMap::new();
    let mut article_missing: HashSet<i64> = HashSet::new();
    for p in &profiles {
        by_number.insert(p.number.clone(), p.id);
        match &p.article_number {
            Some(a) => {
                by_article.insert(a.clone(), p.id);
            }
            None => {
                article_missing.insert(p.id);
            }
        }
    }
    let color_by_code: HashMap<&str, i64> = colors.iter().map(|c| (c.code.as_str(), c.id)).collect();

    let mut skipped = Vec::new();
    for (idx, req) in doc.requirements.iter().enumerate() {
        let profile_id = match by_number
            .get(&req.profile_number)
            .or_else(|| by_article.get(&req.article_number))
        {
            Some(&id) => {
                if article_missing.remove(&id) {
                    ProfileRepository::backfill_article_number_tx(tx, id, &req.article_number)?;
                }
                id
            }
            None => {
                let name = format!("Profil {}", req.profile_number);
                let id = ProfileRepository::insert_if_absent_tx(
                    tx,
                    &req.profile_number,
                    &name,
                    &req.article_number,
                )?;
                by_number.insert(req.profile_number.clone(), id);
                id
            }
        };

        let Some(&color_id) = color_by_code.get(req.color_code.as_str()) else {
            tracing::warn!(
                order_id,
                color_code = %req.color_code,
                article = %req.article_number,
                "unknown color code, requirement skipped"
            );
            skipped.push(RowIssue {
                row: idx + 1,
                field: Some("color_code".to_string()),
                reason: format!("unknown color code {}", req.color_code),
            });
            continue;
        };

        OrderRepository::upsert_requirement_tx(
            tx,
            order_id,
            profile_id,
            color_id,
            req.calculated_beams,
            req.calculated_meters,
            req.raw_remainder_mm,
        )?;
    }

    Ok(skipped)
}
