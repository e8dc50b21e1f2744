// ==========================================
// Cut-List Import Pipeline - SQLite setup
// ==========================================
// Goal:
// - one place for Connection::open PRAGMA behavior so every module
//   gets foreign keys and the same busy_timeout
// - schema creation for fresh databases and tests
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (milliseconds). Import transactions on large
/// files can hold the write lock for a while; readers wait instead of
/// failing with SQLITE_BUSY.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 30_000;

/// Apply the unified PRAGMA set to a connection.
///
/// foreign_keys and busy_timeout are per-connection settings and must be
/// re-applied on every open.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create all tables used by the import pipeline (idempotent).
///
/// Requirement and finished-unit rows are owned exclusively by their
/// order: deleting the order cascades.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_number TEXT NOT NULL UNIQUE,
            client TEXT,
            project TEXT,
            system TEXT,
            deadline TEXT,
            pvc_delivery_date TEXT,
            total_units INTEGER,
            total_subunits INTEGER,
            total_glass_panes INTEGER,
            value_eur REAL,
            value_pln REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            article_number TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS colors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS order_requirements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            profile_id INTEGER NOT NULL REFERENCES profiles(id),
            color_id INTEGER NOT NULL REFERENCES colors(id),
            beams_count INTEGER NOT NULL,
            meters REAL NOT NULL,
            rest_mm INTEGER NOT NULL,
            UNIQUE(order_id, profile_id, color_id)
        );

        CREATE TABLE IF NOT EXISTS finished_units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            width_mm INTEGER NOT NULL,
            height_mm INTEGER NOT NULL,
            profile_type TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            reference TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS file_imports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            filepath TEXT NOT NULL,
            file_type TEXT NOT NULL,
            status TEXT NOT NULL,
            metadata TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL,
            processed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS import_locks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            folder_path TEXT NOT NULL UNIQUE,
            holder TEXT NOT NULL,
            holder_token TEXT NOT NULL,
            acquired_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pending_order_prices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_number TEXT NOT NULL,
            currency TEXT NOT NULL,
            value_netto REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            applied_at TEXT,
            applied_to_order_id INTEGER REFERENCES orders(id)
        );

        CREATE TABLE IF NOT EXISTS deliveries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            delivery_date TEXT NOT NULL,
            delivery_number TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(delivery_date, delivery_number)
        );

        CREATE TABLE IF NOT EXISTS delivery_orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            delivery_id INTEGER NOT NULL REFERENCES deliveries(id) ON DELETE CASCADE,
            order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            UNIQUE(delivery_id, order_id)
        );
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='orders'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_order_delete_cascades_to_children() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO orders (order_number, created_at, updated_at) VALUES ('53526', '2025-01-01', '2025-01-01')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO finished_units (order_id, position, width_mm, height_mm, profile_type, quantity, reference)
             VALUES (1, 1, 800, 1200, 'LivIng', 1, 'A1')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM orders WHERE id = 1", []).unwrap();
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM finished_units", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }
}
