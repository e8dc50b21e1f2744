// ==========================================
// Cut-List Import Pipeline - domain layer
// ==========================================
// Entities and value types. No I/O, no persistence logic.
// ==========================================

pub mod document;
pub mod order;
pub mod types;

pub use document::{
    DocumentTotals, ParsedDocument, ParsedRequirement, ParsedUnit, RowIssue, ValidationSummary,
};
pub use order::{
    Color, Delivery, FileImport, FinishedUnit, FolderLock, Order, OrderRequirement,
    PendingOrderPrice, Profile,
};
pub use types::{FileImportStatus, ImportMode, OrderNumberIdentity, ResolutionAction};
