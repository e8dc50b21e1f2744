// ==========================================
// Cut-List Import Pipeline - folder lock contention
// ==========================================

use chrono::Duration;
use cutlist_import::config::ImportConfig;
use cutlist_import::db;
use cutlist_import::domain::ImportMode;
use cutlist_import::engine::{FolderImportOrchestrator, ImportError, NoopDeliveryLinkHooks};
use cutlist_import::logging;
use cutlist_import::repository::LockRepository;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn setup(tmp: &TempDir) -> (ImportConfig, Arc<Mutex<Connection>>) {
    logging::init_test();
    let db_path = tmp.path().join("cutlist.db");
    let conn = db::open_sqlite_connection(db_path.to_str().unwrap()).unwrap();
    db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO colors (code, name) VALUES ('050', 'Biały')", [])
        .unwrap();

    let config = ImportConfig {
        db_path: db_path.display().to_string(),
        imports_base_path: tmp.path().join("imports"),
        uploads_path: tmp.path().join("uploads"),
        max_scan_depth: 3,
        lock_ttl_minutes: 10,
        holder: "test-runner".to_string(),
    };
    fs::create_dir_all(&config.imports_base_path).unwrap();
    (config, Arc::new(Mutex::new(conn)))
}

#[tokio::test]
async fn test_locked_folder_is_refused_with_holder_name() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    let folder = config.imports_base_path.join("Dostawy 01.12.2025");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("uzyte_53526.csv"), b"53526;19016050;10;0\n").unwrap();

    // another process already holds the folder
    let locks = LockRepository::new(conn.clone());
    let foreign = locks
        .acquire(
            &folder.canonicalize().unwrap().display().to_string(),
            "other-process",
            Duration::minutes(10),
        )
        .unwrap();

    let orchestrator =
        FolderImportOrchestrator::new(config.clone(), conn.clone(), Arc::new(NoopDeliveryLinkHooks));
    let err = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap_err();
    match err {
        ImportError::LockContention { holder } => assert_eq!(holder, "other-process"),
        other => panic!("unexpected error: {other:?}"),
    }

    // nothing happened under contention
    {
        let conn = conn.lock().unwrap();
        let imports: i64 = conn
            .query_row("SELECT COUNT(*) FROM file_imports", [], |r| r.get(0))
            .unwrap();
        assert_eq!(imports, 0);
    }
    assert!(folder.exists());

    // once the foreign holder releases, the import goes through and
    // cleans up its own lock
    locks
        .release(
            &folder.canonicalize().unwrap().display().to_string(),
            &foreign.holder_token,
        )
        .unwrap();
    let outcome = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();
    assert_eq!(outcome.summary.success_count, 1);

    let conn = conn.lock().unwrap();
    let locks_left: i64 = conn
        .query_row("SELECT COUNT(*) FROM import_locks", [], |r| r.get(0))
        .unwrap();
    assert_eq!(locks_left, 0);
}

#[tokio::test]
async fn test_expired_foreign_lock_is_taken_over() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    let folder = config.imports_base_path.join("Dostawy 02.12.2025");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("uzyte_53527.csv"), b"53527;19016050;3;0\n").unwrap();

    // a crashed process left an expired lock behind
    let locks = LockRepository::new(conn.clone());
    locks
        .acquire(
            &folder.canonicalize().unwrap().display().to_string(),
            "crashed-process",
            Duration::minutes(-5),
        )
        .unwrap();

    let orchestrator =
        FolderImportOrchestrator::new(config, conn.clone(), Arc::new(NoopDeliveryLinkHooks));
    let outcome = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();
    assert_eq!(outcome.summary.success_count, 1);
}
