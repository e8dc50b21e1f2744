// ==========================================
// Cut-List Import Pipeline - CLI entry point
// ==========================================
// Usage:
//   cutlist-import <folder> [delivery_number] [overwrite|add_new]
//
// Folder must live under CUTLIST_IMPORTS_PATH and carry a DD.MM.YYYY
// date in its name, e.g. "Dostawy 01.12.2025".
// ==========================================

use anyhow::{bail, Context};
use cutlist_import::config::ImportConfig;
use cutlist_import::db;
use cutlist_import::domain::ImportMode;
use cutlist_import::engine::{FolderImportOrchestrator, NoopDeliveryLinkHooks};
use cutlist_import::logging;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = ImportConfig::from_env();

    let mut args = std::env::args().skip(1);
    let Some(folder) = args.next() else {
        bail!("usage: {} <folder> [delivery_number] [overwrite|add_new]", cutlist_import::APP_NAME);
    };
    let delivery_number = args.next().unwrap_or_else(|| "I".to_string());
    let mode = match args.next().as_deref() {
        None | Some("add_new") => ImportMode::AddNew,
        Some("overwrite") => ImportMode::Overwrite,
        Some(other) => bail!("unknown import mode: {other}"),
    };

    tracing::info!(
        version = cutlist_import::VERSION,
        db = %config.db_path,
        folder = %folder,
        "starting folder import"
    );

    let mut conn = db::open_sqlite_connection(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;
    db::init_schema(&mut conn).context("initializing schema")?;

    let orchestrator = FolderImportOrchestrator::new(
        config,
        Arc::new(Mutex::new(conn)),
        Arc::new(NoopDeliveryLinkHooks),
    );

    let outcome = orchestrator
        .import_folder(
            &PathBuf::from(&folder),
            &delivery_number,
            mode,
            &HashMap::new(),
        )
        .await
        .with_context(|| format!("importing folder {folder}"))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.summary.fail_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
