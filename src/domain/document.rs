// ==========================================
// Cut-List Import Pipeline - parsed document model
// ==========================================
// Output of the section parser. Immutable after parse; the import
// writer only reads it.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ParsedRequirement - one material row of the requirements section
// ==========================================
// calculated_beams / calculated_meters are a pure function of
// (raw_beam_count, raw_remainder_mm) - no external state involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRequirement {
    pub profile_number: String,
    pub article_number: String,
    pub color_code: String,
    pub raw_beam_count: u32,
    pub raw_remainder_mm: u32,
    pub calculated_beams: u32,
    pub calculated_meters: f64,
}

// ==========================================
// ParsedUnit - one finished window/door item
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUnit {
    pub position: u32,
    pub width_mm: u32,
    pub height_mm: u32,
    pub profile_type: String,
    pub quantity: u32,
    pub reference: String,
}

/// Summary counters extracted from the file's total lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub units: u32,
    pub subunits: u32,
    pub glass_panes: u32,
}

// ==========================================
// RowIssue - per-row validation failure (data, not an error)
// ==========================================
// Collected during parse / persistence resolution; the affected row is
// skipped and the file import still succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,
    pub field: Option<String>,
    pub reason: String,
}

/// Aggregate over the row issues of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub success_rows: usize,
    pub failed_rows: usize,
}

// ==========================================
// ParsedDocument - structured view of one cut-list export file
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub order_number: String,
    pub client: Option<String>,
    pub project: Option<String>,
    pub system: Option<String>,
    pub deadline: Option<String>,
    pub pvc_delivery_date: Option<String>,
    pub requirements: Vec<ParsedRequirement>,
    pub finished_units: Vec<ParsedUnit>,
    pub totals: DocumentTotals,
    pub row_issues: Vec<RowIssue>,
}

impl ParsedDocument {
    pub fn validation_summary(&self) -> ValidationSummary {
        let failed = self.row_issues.len();
        let success = self.requirements.len();
        ValidationSummary {
            total_rows: success + failed,
            success_rows: success,
            failed_rows: failed,
        }
    }
}
