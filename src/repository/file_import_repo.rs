// ==========================================
// Cut-List Import Pipeline - file import tracking
// ==========================================
// One row per processed file: pending -> processing -> terminal.
// The metadata column carries the JSON write outcome for completed
// imports and stays NULL otherwise.
// ==========================================

use crate::domain::{FileImport, FileImportStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct FileImportRepository {
    conn: Arc<Mutex<Connection>>,
}

fn map_file_import(row: &Row) -> rusqlite::Result<FileImport> {
    let status: String = row.get("status")?;
    Ok(FileImport {
        id: row.get("id")?,
        filename: row.get("filename")?,
        filepath: row.get("filepath")?,
        file_type: row.get("file_type")?,
        status: FileImportStatus::parse(&status),
        metadata: row.get("metadata")?,
        error_message: row.get("error_message")?,
        created_at: row.get("created_at")?,
        processed_at: row.get("processed_at")?,
    })
}

impl FileImportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, filename: &str, filepath: &str, file_type: &str) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO file_imports (filename, filepath, file_type, status, created_at)
            VALUES (?1, ?2, ?3, 'pending', ?4)
            "#,
            params![filename, filepath, file_type, Utc::now()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn mark_processing(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE file_imports SET status = 'processing' WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn mark_completed(&self, id: i64, metadata: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            UPDATE file_imports
            SET status = 'completed', metadata = ?2, processed_at = ?3
            WHERE id = ?1
            "#,
            params![id, metadata, Utc::now()],
        )?;
        Ok(())
    }

    pub fn mark_error(&self, id: i64, message: &str) -> RepositoryResult<()> {
        self.finish_with(id, FileImportStatus::Error, message)
    }

    pub fn mark_rejected(&self, id: i64, message: &str) -> RepositoryResult<()> {
        self.finish_with(id, FileImportStatus::Rejected, message)
    }

    fn finish_with(
        &self,
        id: i64,
        status: FileImportStatus,
        message: &str,
    ) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            UPDATE file_imports
            SET status = ?2, error_message = ?3, processed_at = ?4
            WHERE id = ?1
            "#,
            params![id, status.as_str(), message, Utc::now()],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<FileImport>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT * FROM file_imports WHERE id = ?1",
                params![id],
                map_file_import,
            )
            .optional()?;
        Ok(record)
    }
}
