// ==========================================
// Cut-List Import Pipeline
// ==========================================
// Batch import of PVC cut-list export files ("uzyte bele") into the
// production order database: encoding-tolerant parsing, beam/meter
// conversion, transactional persistence, variant-conflict resolution
// and locked folder imports.
// ==========================================

pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod logging;
pub mod parser;
pub mod repository;

pub const APP_NAME: &str = "cutlist-import";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
