// ==========================================
// Cut-List Import Pipeline - import engine
// ==========================================
// Transactional writer, conflict resolution and the folder
// orchestrator on top of the parser and repository layers.
// ==========================================

pub mod conflict;
pub mod error;
pub mod fs;
pub mod import_writer;
pub mod orchestrator;

pub use conflict::{detect_conflict, resolve, ConflictCheck, ImportDirective, Resolution};
pub use error::{ImportError, ImportResult};
pub use import_writer::{DeliveryLinkHooks, ImportWriter, NoopDeliveryLinkHooks, WriteOutcome};
pub use orchestrator::{
    DeliverySummary, FileImportOutcome, FileOutcomeStatus, FolderImportOrchestrator,
    FolderImportOutcome, ImportSummary,
};
