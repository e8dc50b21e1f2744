// ==========================================
// Cut-List Import Pipeline - folder import orchestrator
// ==========================================
// Drives one folder end to end:
//   validate path -> folder date (mandatory) -> acquire lock ->
//   find-or-create delivery -> process files sequentially ->
//   archive -> release lock (always)
// One failing file never stops the rest; only the pre-flight steps
// fail the whole run.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{ImportMode, ResolutionAction, RowIssue, ValidationSummary};
use crate::engine::conflict::{detect_conflict, resolve, Resolution};
use crate::engine::error::{ImportError, ImportResult};
use crate::engine::fs;
use crate::engine::import_writer::{DeliveryLinkHooks, ImportWriter};
use crate::parser::{parse_cut_list_bytes, parse_order_number};
use crate::repository::{
    DeliveryRepository, FileImportRepository, LockRepository, OrderRepository, RepositoryError,
};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Terminal state of one file within a folder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcomeStatus {
    Completed,
    Skipped,
    Rejected,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImportOutcome {
    pub filename: String,
    pub status: FileOutcomeStatus,
    pub order_number: Option<String>,
    pub order_id: Option<i64>,
    pub message: Option<String>,
    pub validation: Option<ValidationSummary>,
    /// Per-row failures: parser issues plus rows the writer skipped.
    pub validation_errors: Vec<RowIssue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySummary {
    pub id: i64,
    pub date: String,
    pub number: String,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_files: usize,
    pub success_count: usize,
    pub skipped_count: usize,
    pub rejected_count: usize,
    pub fail_count: usize,
    pub files_with_validation_errors: usize,
    pub total_validation_errors: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderImportOutcome {
    pub folder: String,
    pub delivery: DeliverySummary,
    pub summary: ImportSummary,
    pub results: Vec<FileImportOutcome>,
    pub archived_path: Option<String>,
}

pub struct FolderImportOrchestrator {
    config: ImportConfig,
    writer: ImportWriter,
    orders: OrderRepository,
    deliveries: DeliveryRepository,
    file_imports: FileImportRepository,
    locks: LockRepository,
}

impl FolderImportOrchestrator {
    pub fn new(
        config: ImportConfig,
        conn: Arc<Mutex<Connection>>,
        hooks: Arc<dyn DeliveryLinkHooks>,
    ) -> Self {
        Self {
            config,
            writer: ImportWriter::new(conn.clone(), hooks),
            orders: OrderRepository::new(conn.clone()),
            deliveries: DeliveryRepository::new(conn.clone()),
            file_imports: FileImportRepository::new(conn.clone()),
            locks: LockRepository::new(conn),
        }
    }

    /// Import every cut-list file of one dated folder into the named
    /// delivery (roman numeral: I, II, III). `resolutions` supplies
    /// per-filename conflict decisions collected up front.
    pub async fn import_folder(
        &self,
        folder: &Path,
        delivery_number: &str,
        mode: ImportMode,
        resolutions: &HashMap<String, ResolutionAction>,
    ) -> ImportResult<FolderImportOutcome> {
        // ===== pre-flight: path, date, lock =====
        let folder = fs::validate_path_within_base(&self.config.imports_base_path, folder)?;
        let delivery_date = fs::extract_folder_date(&folder)?;

        self.locks.cleanup_expired()?;
        let folder_key = folder.display().to_string();
        let lock = self
            .locks
            .acquire(&folder_key, &self.config.holder, self.config.lock_ttl())
            .map_err(|e| match e {
                RepositoryError::FolderLockHeld { holder } => ImportError::LockContention { holder },
                other => ImportError::Repository(other),
            })?;

        tracing::info!(
            folder = %folder.display(),
            delivery_number,
            date = %delivery_date,
            "folder import started"
        );

        let result = self
            .run_locked(&folder, delivery_date, delivery_number, mode, resolutions)
            .await;

        // the lock is dropped no matter how the run ended
        if let Err(e) = self.locks.release(&folder_key, &lock.holder_token) {
            tracing::error!(folder = %folder.display(), error = %e, "lock release failed");
        }

        result
    }

    async fn run_locked(
        &self,
        folder: &Path,
        delivery_date: chrono::NaiveDate,
        delivery_number: &str,
        mode: ImportMode,
        resolutions: &HashMap<String, ResolutionAction>,
    ) -> ImportResult<FolderImportOutcome> {
        let (delivery, delivery_created) =
            self.deliveries.find_or_create(delivery_date, delivery_number)?;

        let files = fs::find_cut_list_files(folder, self.config.max_scan_depth);
        let mut results = Vec::with_capacity(files.len());

        for path in &files {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            // bulk imports never stop to ask: an unresolved variant
            // conflict defaults to keeping both orders
            let resolution = resolutions
                .get(&filename)
                .copied()
                .or(Some(ResolutionAction::AddVariant));

            let result = self
                .import_file(path, delivery.id, mode, resolution)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(file = %filename, error = %e, "file import failed");
                    FileImportOutcome {
                        filename: filename.clone(),
                        status: FileOutcomeStatus::Error,
                        order_number: None,
                        order_id: None,
                        message: Some(e.to_string()),
                        validation: None,
                        validation_errors: Vec::new(),
                    }
                });
            results.push(result);
        }

        let summary = summarize(&results);

        // archive once anything was taken care of; a folder of pure
        // failures stays in place for another attempt
        let archived_path = if summary.success_count + summary.skipped_count > 0 {
            match fs::archive_folder(folder) {
                Ok(target) => Some(target.display().to_string()),
                Err(e) => {
                    tracing::warn!(folder = %folder.display(), error = %e, "archiving failed");
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            folder = %folder.display(),
            success = summary.success_count,
            skipped = summary.skipped_count,
            rejected = summary.rejected_count,
            failed = summary.fail_count,
            "folder import finished"
        );

        Ok(FolderImportOutcome {
            folder: folder.display().to_string(),
            delivery: DeliverySummary {
                id: delivery.id,
                date: delivery_date.to_string(),
                number: delivery_number.to_string(),
                created: delivery_created,
            },
            summary,
            results,
            archived_path,
        })
    }

    /// Process a single file: track it, parse it, resolve conflicts,
    /// write it, attach the order to the delivery.
    pub async fn import_file(
        &self,
        path: &Path,
        delivery_id: i64,
        mode: ImportMode,
        resolution: Option<ResolutionAction>,
    ) -> ImportResult<FileImportOutcome> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let uploaded = fs::copy_to_uploads(&self.config.uploads_path, path)?;
        let record_id = self.file_imports.create(
            &filename,
            &uploaded.display().to_string(),
            "cut_list",
        )?;
        self.file_imports.mark_processing(record_id)?;

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let message = format!("cannot read {}: {e}", path.display());
                self.file_imports.mark_error(record_id, &message)?;
                return Ok(FileImportOutcome {
                    filename,
                    status: FileOutcomeStatus::Error,
                    order_number: None,
                    order_id: None,
                    message: Some(message),
                    validation: None,
                    validation_errors: Vec::new(),
                });
            }
        };

        let (doc, encoding) = match parse_cut_list_bytes(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.file_imports.mark_error(record_id, &e.to_string())?;
                return Ok(FileImportOutcome {
                    filename,
                    status: FileOutcomeStatus::Error,
                    order_number: None,
                    order_id: None,
                    message: Some(e.to_string()),
                    validation: None,
                    validation_errors: Vec::new(),
                });
            }
        };
        tracing::debug!(file = %filename, encoding = encoding.as_str(), order = %doc.order_number, "file parsed");

        // ===== conflict handling =====
        let identity = parse_order_number(&doc.order_number)?;
        let check = detect_conflict(&self.orders, &identity)?;
        let directive = match resolve(&identity, &check, mode, resolution) {
            Ok(Resolution::Proceed(directive)) => directive,
            Ok(Resolution::Cancelled) => {
                self.file_imports
                    .mark_rejected(record_id, "import cancelled by operator")?;
                return Ok(FileImportOutcome {
                    filename,
                    status: FileOutcomeStatus::Rejected,
                    order_number: Some(doc.order_number.clone()),
                    order_id: None,
                    message: Some("cancelled".to_string()),
                    validation: None,
                    validation_errors: Vec::new(),
                });
            }
            Err(e) => {
                self.file_imports.mark_error(record_id, &e.to_string())?;
                return Ok(FileImportOutcome {
                    filename,
                    status: FileOutcomeStatus::Error,
                    order_number: Some(doc.order_number.clone()),
                    order_id: None,
                    message: Some(e.to_string()),
                    validation: None,
                    validation_errors: Vec::new(),
                });
            }
        };

        // ===== skip orders already placed in another delivery =====
        if let Some(existing) = self.orders.find_by_number(&directive.target_order_number)? {
            if let Some(other) = self
                .deliveries
                .order_in_other_delivery(existing.id, delivery_id)?
            {
                let message = format!(
                    "order {} already belongs to delivery {}",
                    directive.target_order_number, other
                );
                tracing::info!(file = %filename, %message, "file skipped");
                self.file_imports.mark_rejected(record_id, &message)?;
                return Ok(FileImportOutcome {
                    filename,
                    status: FileOutcomeStatus::Skipped,
                    order_number: Some(directive.target_order_number),
                    order_id: Some(existing.id),
                    message: Some(message),
                    validation: None,
                    validation_errors: Vec::new(),
                });
            }
        }

        // ===== write + attach =====
        let outcome = match self.writer.apply(&doc, &directive).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.file_imports.mark_error(record_id, &e.to_string())?;
                return Ok(FileImportOutcome {
                    filename,
                    status: FileOutcomeStatus::Error,
                    order_number: Some(directive.target_order_number),
                    order_id: None,
                    message: Some(e.to_string()),
                    validation: None,
                    validation_errors: Vec::new(),
                });
            }
        };

        // a failed attach or status update still leaves the tracking
        // record in a terminal state
        let attached = self
            .deliveries
            .add_order(delivery_id, outcome.order_id)
            .and_then(|()| {
                let metadata = serde_json::to_string(&outcome).unwrap_or_default();
                self.file_imports.mark_completed(record_id, &metadata)
            });
        if let Err(e) = attached {
            tracing::error!(file = %filename, error = %e, "post-write bookkeeping failed");
            self.file_imports.mark_error(record_id, &e.to_string())?;
            return Ok(FileImportOutcome {
                filename,
                status: FileOutcomeStatus::Error,
                order_number: Some(outcome.order_number.clone()),
                order_id: Some(outcome.order_id),
                message: Some(e.to_string()),
                validation: None,
                validation_errors: Vec::new(),
            });
        }

        // rows the writer skipped (unknown colors) were parsed fine;
        // move them from success to failed, the total is unchanged
        let mut validation = doc.validation_summary();
        validation.failed_rows += outcome.skipped_rows.len();
        validation.success_rows = validation.success_rows.saturating_sub(outcome.skipped_rows.len());

        let mut validation_errors = doc.row_issues.clone();
        validation_errors.extend(outcome.skipped_rows.iter().cloned());

        Ok(FileImportOutcome {
            filename,
            status: FileOutcomeStatus::Completed,
            order_number: Some(outcome.order_number.clone()),
            order_id: Some(outcome.order_id),
            message: None,
            validation: Some(validation),
            validation_errors,
        })
    }
}

fn summarize(results: &[FileImportOutcome]) -> ImportSummary {
    let count =
        |status: FileOutcomeStatus| results.iter().filter(|r| r.status == status).count();
    let with_issues = results
        .iter()
        .filter_map(|r| r.validation)
        .filter(|v| v.failed_rows > 0);
    ImportSummary {
        total_files: results.len(),
        success_count: count(FileOutcomeStatus::Completed),
        skipped_count: count(FileOutcomeStatus::Skipped),
        rejected_count: count(FileOutcomeStatus::Rejected),
        fail_count: count(FileOutcomeStatus::Error),
        files_with_validation_errors: with_issues.clone().count(),
        total_validation_errors: with_issues.map(|v| v.failed_rows).sum(),
    }
}
