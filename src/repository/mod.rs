// ==========================================
// Cut-List Import Pipeline - persistence layer
// ==========================================
// rusqlite repositories over the shared connection. Write paths are
// exposed as `*_tx` statics so the import writer composes them inside
// a single transaction.
// ==========================================

pub mod color_repo;
pub mod delivery_repo;
pub mod error;
pub mod file_import_repo;
pub mod lock_repo;
pub mod order_repo;
pub mod pending_price_repo;
pub mod profile_repo;

pub use color_repo::ColorRepository;
pub use delivery_repo::DeliveryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use file_import_repo::FileImportRepository;
pub use lock_repo::LockRepository;
pub use order_repo::OrderRepository;
pub use pending_price_repo::PendingPriceRepository;
pub use profile_repo::ProfileRepository;
