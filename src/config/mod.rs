// ==========================================
// Cut-List Import Pipeline - runtime configuration
// ==========================================
// Environment-driven, with working defaults for a single-machine
// deployment. CUTLIST_* variables override field by field.
// ==========================================

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Database file path.
    pub db_path: String,
    /// Root under which import folders must live.
    pub imports_base_path: PathBuf,
    /// Where processed files are copied for audit.
    pub uploads_path: PathBuf,
    /// Folder scan depth for cut-list discovery.
    pub max_scan_depth: usize,
    /// Folder-lock time-to-live in minutes.
    pub lock_ttl_minutes: i64,
    /// Lock holder label, visible in contention errors.
    pub holder: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            db_path: "cutlist.db".to_string(),
            imports_base_path: PathBuf::from("imports"),
            uploads_path: PathBuf::from("uploads"),
            max_scan_depth: 3,
            lock_ttl_minutes: 30,
            holder: default_holder(),
        }
    }
}

fn default_holder() -> String {
    format!("cutlist-import:{}", std::process::id())
}

impl ImportConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env_or("CUTLIST_DB_PATH", defaults.db_path),
            imports_base_path: PathBuf::from(env_or(
                "CUTLIST_IMPORTS_PATH",
                defaults.imports_base_path.display().to_string(),
            )),
            uploads_path: PathBuf::from(env_or(
                "CUTLIST_UPLOADS_PATH",
                defaults.uploads_path.display().to_string(),
            )),
            max_scan_depth: std::env::var("CUTLIST_SCAN_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_scan_depth),
            lock_ttl_minutes: std::env::var("CUTLIST_LOCK_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lock_ttl_minutes),
            holder: env_or("CUTLIST_HOLDER", defaults.holder),
        }
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::minutes(self.lock_ttl_minutes)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = ImportConfig::default();
        assert_eq!(cfg.max_scan_depth, 3);
        assert_eq!(cfg.lock_ttl(), Duration::minutes(30));
        assert!(cfg.holder.starts_with("cutlist-import:"));
    }
}
