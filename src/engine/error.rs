// ==========================================
// Cut-List Import Pipeline - import engine errors
// ==========================================

use crate::parser::ParseError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    // ===== folder pre-flight =====
    #[error("path rejected: {0}")]
    PathValidation(String),

    #[error("folder name carries no DD.MM.YYYY date: {0}")]
    MissingFolderDate(String),

    #[error("folder is being imported by {holder}")]
    LockContention { holder: String },

    // ===== per-file =====
    #[error("order {order_number} conflicts with existing base order {base} (id {base_order_id})")]
    ConflictRequiresResolution {
        order_number: String,
        base: String,
        base_order_id: i64,
    },

    #[error("cannot read {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ImportResult<T> = Result<T, ImportError>;
