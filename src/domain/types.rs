// ==========================================
// Cut-List Import Pipeline - shared types
// ==========================================
// String-backed enums stored verbatim in SQLite columns.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImportMode - write semantics for an existing target order
// ==========================================
// overwrite: delete existing requirement/unit rows, then re-apply
// add_new:   merge incrementally (requirement upsert, units appended)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    Overwrite,
    AddNew,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Overwrite => "overwrite",
            ImportMode::AddNew => "add_new",
        }
    }
}

// ==========================================
// FileImportStatus - tracking-record lifecycle
// ==========================================
// pending -> processing -> {completed | error | rejected}
// Terminal states are never re-entered; a re-import is a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileImportStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Rejected,
}

impl FileImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileImportStatus::Pending => "pending",
            FileImportStatus::Processing => "processing",
            FileImportStatus::Completed => "completed",
            FileImportStatus::Error => "error",
            FileImportStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> FileImportStatus {
        match raw {
            "pending" => FileImportStatus::Pending,
            "processing" => FileImportStatus::Processing,
            "completed" => FileImportStatus::Completed,
            "rejected" => FileImportStatus::Rejected,
            _ => FileImportStatus::Error,
        }
    }
}

// ==========================================
// OrderNumberIdentity - base number + optional variant suffix
// ==========================================
// Invariant: `base + ("-" + suffix)` reproduces the original input
// (a trailing bare dash normalizes to the base with no suffix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNumberIdentity {
    pub base: String,
    pub suffix: Option<String>,
}

impl OrderNumberIdentity {
    /// Effective order number for the identity (base or base-suffix).
    pub fn full(&self) -> String {
        match &self.suffix {
            Some(s) => format!("{}-{}", self.base, s),
            None => self.base.clone(),
        }
    }

    pub fn has_suffix(&self) -> bool {
        self.suffix.is_some()
    }
}

// ==========================================
// ResolutionAction - variant-conflict decisions
// ==========================================
// Closed union consumed by a single exhaustive resolver:
// - Replace: import over the BASE order (overwrite); optionally delete
//   superseded sibling variants
// - AddVariant: keep the base, import under the full suffixed number
// - Cancel: no write, mark the pending file import rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionAction {
    Replace { delete_older: bool },
    AddVariant,
    Cancel,
}
