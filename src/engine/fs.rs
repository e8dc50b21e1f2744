// ==========================================
// Cut-List Import Pipeline - import filesystem helpers
// ==========================================
// Folder validation, cut-list discovery, upload copies and archiving.
// Every path handed in from outside is pinned under the configured
// base directory before anything touches the disk.
// ==========================================

use crate::engine::error::{ImportError, ImportResult};
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;
use walkdir::WalkDir;

/// Filename fragments that mark a file as a cut-list export.
pub const CUT_LIST_MARKERS: [&str; 2] = ["uzyte", "bele"];

/// Resolve a candidate folder and verify it stays inside the base
/// directory. Symlinks and `..` segments are flattened by
/// canonicalization first.
pub fn validate_path_within_base(base: &Path, candidate: &Path) -> ImportResult<PathBuf> {
    let base = base
        .canonicalize()
        .map_err(|e| ImportError::PathValidation(format!("base {}: {e}", base.display())))?;
    let resolved = candidate
        .canonicalize()
        .map_err(|e| ImportError::PathValidation(format!("{}: {e}", candidate.display())))?;

    if !resolved.starts_with(&base) {
        return Err(ImportError::PathValidation(format!(
            "{} escapes the import base directory",
            candidate.display()
        )));
    }
    if !resolved.is_dir() {
        return Err(ImportError::PathValidation(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }
    Ok(resolved)
}

fn folder_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})").unwrap())
}

/// Extract the mandatory DD.MM.YYYY date from a folder name, e.g.
/// "Dostawy 01.12.2025". Impossible dates (32.13.2025) are rejected.
pub fn extract_folder_date(folder: &Path) -> ImportResult<NaiveDate> {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let caps = folder_date_re()
        .captures(&name)
        .ok_or_else(|| ImportError::MissingFolderDate(name.clone()))?;

    let day: u32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    let year: i32 = caps[3].parse().unwrap_or(0);
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ImportError::MissingFolderDate(name.clone()))
}

/// Walk a folder (bounded depth) and collect cut-list files: .csv
/// whose name contains one of the markers. Sorted for a deterministic
/// processing order.
pub fn find_cut_list_files(folder: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            name.ends_with(".csv") && CUT_LIST_MARKERS.iter().any(|m| name.contains(m))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Copy a source file into the uploads directory under a
/// collision-free name. The original stays in place for archiving.
pub fn copy_to_uploads(uploads_dir: &Path, source: &Path) -> ImportResult<PathBuf> {
    std::fs::create_dir_all(uploads_dir)?;
    let filename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cut_list.csv".to_string());
    let target = uploads_dir.join(format!("{}_{}", Uuid::new_v4(), filename));
    std::fs::copy(source, &target).map_err(|e| ImportError::FileRead {
        path: source.display().to_string(),
        source: e,
    })?;
    Ok(target)
}

/// Move a processed folder into a sibling "archiwum/" directory. A
/// name collision gets a timestamp suffix instead of failing.
pub fn archive_folder(folder: &Path) -> ImportResult<PathBuf> {
    let parent = folder.parent().ok_or_else(|| {
        ImportError::PathValidation(format!("{} has no parent", folder.display()))
    })?;
    let archive_dir = parent.join("archiwum");
    std::fs::create_dir_all(&archive_dir)?;

    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import".to_string());

    let mut target = archive_dir.join(&name);
    if target.exists() {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        target = archive_dir.join(format!("{name}_{stamp}"));
    }

    std::fs::rename(folder, &target)?;
    tracing::info!(from = %folder.display(), to = %target.display(), "folder archived");
    Ok(target)
}
