// ==========================================
// Cut-List Import Pipeline - folder import locks
// ==========================================
// Advisory locks preventing two concurrent imports of one folder. The
// UNIQUE(folder_path) constraint is the actual mutual exclusion; the
// TTL makes a crashed holder recoverable. release() requires the
// holder token, force_release() is the operator override.
// ==========================================

use crate::domain::FolderLock;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct LockRepository {
    conn: Arc<Mutex<Connection>>,
}

fn map_lock(row: &Row) -> rusqlite::Result<FolderLock> {
    Ok(FolderLock {
        id: row.get("id")?,
        folder_path: row.get("folder_path")?,
        holder: row.get("holder")?,
        holder_token: row.get("holder_token")?,
        acquired_at: row.get("acquired_at")?,
        expires_at: row.get("expires_at")?,
    })
}

/// One canonical spelling per folder so "/a/b" and "/a/b/" contend for
/// the same lock row.
fn normalize_path(folder_path: &str) -> String {
    let trimmed = folder_path.trim().trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl LockRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Take the lock for a folder, or fail with the current holder's
    /// name. An expired lock is taken over in place.
    pub fn acquire(
        &self,
        folder_path: &str,
        holder: &str,
        ttl: Duration,
    ) -> RepositoryResult<FolderLock> {
        let path = normalize_path(folder_path);
        let now = Utc::now();
        let token = Uuid::new_v4().to_string();
        let conn = self.lock()?;

        let existing: Option<(i64, String, DateTime<Utc>)> = conn
            .query_row(
                "SELECT id, holder, expires_at FROM import_locks WHERE folder_path = ?1",
                params![path],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match existing {
            Some((_, current_holder, expires_at)) if expires_at > now => {
                return Err(RepositoryError::FolderLockHeld {
                    holder: current_holder,
                });
            }
            Some((id, current_holder, _)) => {
                tracing::warn!(
                    folder = %path,
                    previous_holder = %current_holder,
                    "taking over expired folder lock"
                );
                conn.execute(
                    r#"
                    UPDATE import_locks
                    SET holder = ?2, holder_token = ?3, acquired_at = ?4, expires_at = ?5
                    WHERE id = ?1
                    "#,
                    params![id, holder, token, now, now + ttl],
                )?;
            }
            None => {
                let inserted = conn.execute(
                    r#"
                    INSERT OR IGNORE INTO import_locks
                        (folder_path, holder, holder_token, acquired_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![path, holder, token, now, now + ttl],
                )?;
                if inserted == 0 {
                    // lost the race to another process between check and insert
                    let current_holder: String = conn.query_row(
                        "SELECT holder FROM import_locks WHERE folder_path = ?1",
                        params![path],
                        |row| row.get(0),
                    )?;
                    return Err(RepositoryError::FolderLockHeld {
                        holder: current_holder,
                    });
                }
            }
        }

        let acquired = conn.query_row(
            "SELECT * FROM import_locks WHERE folder_path = ?1",
            params![path],
            map_lock,
        )?;
        Ok(acquired)
    }

    /// Release with the token handed out at acquisition. A stale token
    /// (lock expired and taken over) releases nothing, by design.
    pub fn release(&self, folder_path: &str, holder_token: &str) -> RepositoryResult<bool> {
        let path = normalize_path(folder_path);
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM import_locks WHERE folder_path = ?1 AND holder_token = ?2",
            params![path, holder_token],
        )?;
        Ok(deleted > 0)
    }

    /// Operator override: drop the lock regardless of holder.
    pub fn force_release(&self, folder_path: &str) -> RepositoryResult<bool> {
        let path = normalize_path(folder_path);
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM import_locks WHERE folder_path = ?1",
            params![path],
        )?;
        if deleted > 0 {
            tracing::warn!(folder = %path, "folder lock force-released");
        }
        Ok(deleted > 0)
    }

    pub fn cleanup_expired(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM import_locks WHERE expires_at <= ?1",
            params![Utc::now()],
        )?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> LockRepository {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        LockRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_second_acquire_fails_with_holder() {
        let repo = setup();
        repo.acquire("/imports/Dostawy 01.12.2025", "worker-a", Duration::minutes(10))
            .unwrap();

        let err = repo
            .acquire("/imports/Dostawy 01.12.2025", "worker-b", Duration::minutes(10))
            .unwrap_err();
        match err {
            RepositoryError::FolderLockHeld { holder } => assert_eq!(holder, "worker-a"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_path_normalization_contends_same_lock() {
        let repo = setup();
        repo.acquire("/imports/folder/", "worker-a", Duration::minutes(10))
            .unwrap();
        assert!(repo
            .acquire("/imports/folder", "worker-b", Duration::minutes(10))
            .is_err());
    }

    #[test]
    fn test_release_requires_matching_token() {
        let repo = setup();
        let lock = repo
            .acquire("/imports/folder", "worker-a", Duration::minutes(10))
            .unwrap();

        assert!(!repo.release("/imports/folder", "wrong-token").unwrap());
        assert!(repo.release("/imports/folder", &lock.holder_token).unwrap());

        // lock is gone, a new acquire succeeds
        repo.acquire("/imports/folder", "worker-b", Duration::minutes(10))
            .unwrap();
    }

    #[test]
    fn test_expired_lock_is_taken_over() {
        let repo = setup();
        repo.acquire("/imports/folder", "worker-a", Duration::minutes(-1))
            .unwrap();

        let lock = repo
            .acquire("/imports/folder", "worker-b", Duration::minutes(10))
            .unwrap();
        assert_eq!(lock.holder, "worker-b");
    }

    #[test]
    fn test_force_release_and_cleanup() {
        let repo = setup();
        repo.acquire("/imports/a", "worker-a", Duration::minutes(10))
            .unwrap();
        repo.acquire("/imports/b", "worker-a", Duration::minutes(-5))
            .unwrap();

        assert!(repo.force_release("/imports/a").unwrap());
        assert!(!repo.force_release("/imports/a").unwrap());
        assert_eq!(repo.cleanup_expired().unwrap(), 1);
    }
}
