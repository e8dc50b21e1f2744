// ==========================================
// Cut-List Import Pipeline - persisted entities
// ==========================================
// Columns align with db::init_schema. The import layer writes these;
// downstream consumers (warehouse ledger, packing) only read them.
// ==========================================

use crate::domain::types::FileImportStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Order - one production order
// ==========================================
// Identified by the unique order_number (base or base-suffix form).
// Owns its requirement and finished-unit rows exclusively; deleting the
// order cascades at the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,

    // ===== scalar fields from the file header =====
    pub client: Option<String>,
    pub project: Option<String>,
    pub system: Option<String>,
    pub deadline: Option<String>,
    pub pvc_delivery_date: Option<String>,

    // ===== totals from the summary lines =====
    pub total_units: Option<u32>,
    pub total_subunits: Option<u32>,
    pub total_glass_panes: Option<u32>,

    // ===== order value (pending price / linked supplier delivery) =====
    pub value_eur: Option<f64>,
    pub value_pln: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Material requirement of an order: (profile, color) quantity in beams
/// plus a partial-beam length. Unique per (order, profile, color).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequirement {
    pub id: i64,
    pub order_id: i64,
    pub profile_id: i64,
    pub color_id: i64,
    pub beams_count: u32,
    pub meters: f64,
    pub rest_mm: u32,
}

/// One physical finished unit (window/door) of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedUnit {
    pub id: i64,
    pub order_id: i64,
    pub position: u32,
    pub width_mm: u32,
    pub height_mm: u32,
    pub profile_type: String,
    pub quantity: u32,
    pub reference: String,
}

// ==========================================
// Profile / Color - shared reference data
// ==========================================
// Looked up by natural key; profiles may be created on demand by the
// writer and get their article_number backfilled, never destructively
// updated otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub number: String,
    pub name: String,
    pub article_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub id: i64,
    pub code: String,
    pub name: String,
}

// ==========================================
// FileImport - per-file tracking record
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileImport {
    pub id: i64,
    pub filename: String,
    pub filepath: String,
    pub file_type: String,
    pub status: FileImportStatus,
    /// JSON blob with the write outcome (order id, counts, resolution).
    pub metadata: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

// ==========================================
// FolderLock - advisory folder-import lock
// ==========================================
// Uniqueness on folder_path enforces mutual exclusion; expires_at makes
// the TTL explicit so a crashed holder cannot wedge a folder forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderLock {
    pub id: i64,
    pub folder_path: String,
    pub holder: String,
    pub holder_token: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Price captured before the order existed, applied once on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrderPrice {
    pub id: i64,
    pub order_number: String,
    pub currency: String,
    pub value_netto: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// Delivery - one dated bulk-import batch
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub delivery_date: NaiveDate,
    pub delivery_number: String,
}
