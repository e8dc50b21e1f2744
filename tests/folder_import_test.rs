// ==========================================
// Cut-List Import Pipeline - folder import end-to-end
// ==========================================

use cutlist_import::config::ImportConfig;
use cutlist_import::db;
use cutlist_import::domain::ImportMode;
use cutlist_import::engine::{
    FileOutcomeStatus, FolderImportOrchestrator, NoopDeliveryLinkHooks,
};
use cutlist_import::logging;
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
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

fn write_cut_list(folder: &PathBuf, filename: &str, content: &str) {
    fs::create_dir_all(folder).unwrap();
    fs::write(folder.join(filename), content.as_bytes()).unwrap();
}

const GOOD_FILE: &str = "\
Klient: Kowalski Jan
System: Salamander 82
53526;19016050;10;1500
53526;17038050;4;0
53526;12345050;2;999
53526;19016051;abc;0
Lista okien
1;1200;1400;Okno R;2;BUD/01
Łączna liczba okien: 1
";

#[tokio::test]
async fn test_full_folder_import() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    let folder = config.imports_base_path.join("Dostawy 01.12.2025");
    write_cut_list(&folder, "uzyte_bele_53526.csv", GOOD_FILE);

    let orchestrator =
        FolderImportOrchestrator::new(config.clone(), conn.clone(), Arc::new(NoopDeliveryLinkHooks));
    let outcome = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert_eq!(outcome.summary.success_count, 1);
    assert_eq!(outcome.summary.fail_count, 0);
    assert_eq!(outcome.summary.files_with_validation_errors, 1);
    assert_eq!(outcome.summary.total_validation_errors, 1);
    assert!(outcome.delivery.created);
    assert_eq!(outcome.delivery.date, "2025-12-01");
    assert_eq!(outcome.delivery.number, "I");

    let file = &outcome.results[0];
    assert_eq!(file.status, FileOutcomeStatus::Completed);
    assert_eq!(file.order_number.as_deref(), Some("53526"));
    let validation = file.validation.unwrap();
    assert_eq!(validation.total_rows, 4);
    assert_eq!(validation.success_rows, 3);
    assert_eq!(validation.failed_rows, 1);
    assert_eq!(file.validation_errors.len(), 1);
    assert_eq!(file.validation_errors[0].field.as_deref(), Some("beam_count"));

    // folder archived, lock released, audit copy made
    assert!(!folder.exists());
    assert!(outcome.archived_path.is_some());
    {
        let conn = conn.lock().unwrap();
        let locks: i64 = conn
            .query_row("SELECT COUNT(*) FROM import_locks", [], |r| r.get(0))
            .unwrap();
        assert_eq!(locks, 0);

        let requirements: i64 = conn
            .query_row("SELECT COUNT(*) FROM order_requirements", [], |r| r.get(0))
            .unwrap();
        assert_eq!(requirements, 3);
        let units: i64 = conn
            .query_row("SELECT COUNT(*) FROM finished_units", [], |r| r.get(0))
            .unwrap();
        assert_eq!(units, 1);

        let (date, count): (String, i64) = conn
            .query_row(
                "SELECT d.delivery_date, COUNT(o.id)
                 FROM deliveries d JOIN delivery_orders o ON o.delivery_id = d.id
                 GROUP BY d.id",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(date, "2025-12-01");
        assert_eq!(count, 1);

        let status: String = conn
            .query_row("SELECT status FROM file_imports", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "completed");
    }
    assert!(config.uploads_path.read_dir().unwrap().next().is_some());
}

#[tokio::test]
async fn test_unknown_color_rows_surface_in_validation_errors() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    let folder = config.imports_base_path.join("Dostawy 03.12.2025");
    write_cut_list(
        &folder,
        "uzyte_53530.csv",
        "53530;19016050;10;1500\n53530;12345999;2;0\n",
    );

    let orchestrator =
        FolderImportOrchestrator::new(config, conn, Arc::new(NoopDeliveryLinkHooks));
    let outcome = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(outcome.summary.success_count, 1);
    let file = &outcome.results[0];
    assert_eq!(file.status, FileOutcomeStatus::Completed);

    // the row was parsed fine but no color '999' exists: the writer
    // skipped it and the caller sees why
    assert_eq!(file.validation_errors.len(), 1);
    assert_eq!(file.validation_errors[0].field.as_deref(), Some("color_code"));
    let validation = file.validation.unwrap();
    assert_eq!(validation.total_rows, 2);
    assert_eq!(validation.success_rows, 1);
    assert_eq!(validation.failed_rows, 1);
}

#[tokio::test]
async fn test_unparseable_file_leaves_folder_in_place() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    let folder = config.imports_base_path.join("Dostawy 02.12.2025");
    write_cut_list(&folder, "uzyte_broken.csv", "Klient: Nowak\nno data here\n");

    let orchestrator =
        FolderImportOrchestrator::new(config, conn.clone(), Arc::new(NoopDeliveryLinkHooks));
    let outcome = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(outcome.summary.success_count, 0);
    assert_eq!(outcome.summary.fail_count, 1);
    assert!(outcome.archived_path.is_none());
    assert!(folder.exists());

    let conn = conn.lock().unwrap();
    let status: String = conn
        .query_row("SELECT status FROM file_imports", [], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "error");
}

#[tokio::test]
async fn test_folder_without_date_fails_before_any_work() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    let folder = config.imports_base_path.join("Dostawy grudzien");
    write_cut_list(&folder, "uzyte_53526.csv", GOOD_FILE);

    let orchestrator =
        FolderImportOrchestrator::new(config, conn.clone(), Arc::new(NoopDeliveryLinkHooks));
    let err = orchestrator
        .import_folder(&folder, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("DD.MM.YYYY"));

    // no file was touched
    let conn = conn.lock().unwrap();
    let imports: i64 = conn
        .query_row("SELECT COUNT(*) FROM file_imports", [], |r| r.get(0))
        .unwrap();
    assert_eq!(imports, 0);
    assert!(folder.exists());
}

#[tokio::test]
async fn test_order_already_in_another_delivery_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let (config, conn) = setup(&tmp);

    // first import puts 53526 into delivery I of 01.12
    let first = config.imports_base_path.join("Dostawy 01.12.2025");
    write_cut_list(&first, "uzyte_53526.csv", GOOD_FILE);
    let orchestrator = FolderImportOrchestrator::new(
        config.clone(),
        conn.clone(),
        Arc::new(NoopDeliveryLinkHooks),
    );
    orchestrator
        .import_folder(&first, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();

    // same order arrives again in a different dated folder
    let second = config.imports_base_path.join("Dostawy 05.12.2025");
    write_cut_list(&second, "uzyte_53526.csv", GOOD_FILE);
    let outcome = orchestrator
        .import_folder(&second, "I", ImportMode::Overwrite, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(outcome.summary.success_count, 0);
    assert_eq!(outcome.summary.skipped_count, 1);
    assert_eq!(outcome.results[0].status, FileOutcomeStatus::Skipped);
    // skipped still counts as handled: the folder is archived
    assert!(outcome.archived_path.is_some());
}
