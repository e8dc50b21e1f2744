// ==========================================
// Cut-List Import Pipeline - variant conflict resolution
// ==========================================
// A suffixed order number ("53526-a") conflicts when a distinct BASE
// order ("53526") already exists: the file may be a correction meant
// to replace the base, or a genuine additional variant. Detection is
// automatic; the decision comes from the operator as a
// ResolutionAction and is applied by one exhaustive resolver.
// ==========================================

use crate::domain::{ImportMode, OrderNumberIdentity, ResolutionAction};
use crate::engine::error::{ImportError, ImportResult};
use crate::repository::{OrderRepository, RepositoryResult};

/// Outcome of conflict detection for one parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCheck {
    pub has_conflict: bool,
    pub base_order_id: Option<i64>,
}

/// Fully resolved write instruction for the import writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    pub target_order_number: String,
    pub mode: ImportMode,
    /// When set, variants of this base (other than the target) are
    /// deleted in the same transaction as the write.
    pub delete_siblings_of_base: Option<String>,
}

/// Resolver output: either a concrete write, or no write at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Proceed(ImportDirective),
    Cancelled,
}

/// Check whether an identity collides with an existing base order.
/// Only suffixed numbers can conflict; a bare base never does.
pub fn detect_conflict(
    orders: &OrderRepository,
    identity: &OrderNumberIdentity,
) -> RepositoryResult<ConflictCheck> {
    if !identity.has_suffix() {
        return Ok(ConflictCheck {
            has_conflict: false,
            base_order_id: None,
        });
    }
    let base_order = orders.find_by_number(&identity.base)?;
    Ok(ConflictCheck {
        has_conflict: base_order.is_some(),
        base_order_id: base_order.map(|o| o.id),
    })
}

/// Turn a detected conflict plus an operator decision into a write
/// directive. Without a conflict the directive is a plain write under
/// the full number; with one, a decision is mandatory.
pub fn resolve(
    identity: &OrderNumberIdentity,
    check: &ConflictCheck,
    mode: ImportMode,
    action: Option<ResolutionAction>,
) -> ImportResult<Resolution> {
    if !check.has_conflict {
        return Ok(Resolution::Proceed(ImportDirective {
            target_order_number: identity.full(),
            mode,
            delete_siblings_of_base: None,
        }));
    }

    let base_order_id = check.base_order_id.unwrap_or_default();
    let action = action.ok_or_else(|| ImportError::ConflictRequiresResolution {
        order_number: identity.full(),
        base: identity.base.clone(),
        base_order_id,
    })?;

    match action {
        ResolutionAction::Replace { delete_older } => Ok(Resolution::Proceed(ImportDirective {
            // the correction lands on the base order, overwriting it
            target_order_number: identity.base.clone(),
            mode: ImportMode::Overwrite,
            delete_siblings_of_base: delete_older.then(|| identity.base.clone()),
        })),
        ResolutionAction::AddVariant => Ok(Resolution::Proceed(ImportDirective {
            target_order_number: identity.full(),
            mode,
            delete_siblings_of_base: None,
        })),
        ResolutionAction::Cancel => Ok(Resolution::Cancelled),
    }
}
