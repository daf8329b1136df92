//! Batch driver: discover documents, extract each one, commit per file.

use super::error::EtlError;
use crate::warehouse::Storage;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Outcome of a completed batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files_found: usize,
    pub files_processed: usize,
}

/// Recursively list every `.json` file under `root`, in traversal order.
pub fn discover_json_files(root: &Path) -> Result<Vec<PathBuf>, EtlError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| EtlError::Discovery {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("json")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Run `extract` on every `.json` file under `root`, one transaction per file.
///
/// Stops at the first failure: the failing file's writes are rolled back,
/// earlier files stay committed and later files are never touched.
pub fn run_batch<S, F>(storage: &S, root: &Path, mut extract: F) -> Result<BatchReport, EtlError>
where
    S: Storage + ?Sized,
    F: FnMut(&S, &Path) -> Result<(), EtlError>,
{
    let files = discover_json_files(root)?;
    let total = files.len();
    info!("{} files found in {}", total, root.display());

    let mut report = BatchReport {
        files_found: total,
        files_processed: 0,
    };

    for (index, path) in files.iter().enumerate() {
        storage.begin()?;
        if let Err(e) = extract(storage, path) {
            error!("Failed to process {}: {}", path.display(), e);
            if let Err(rollback_err) = storage.rollback() {
                warn!(
                    "Rollback after failing {} also failed: {}",
                    path.display(),
                    rollback_err
                );
            }
            return Err(e);
        }
        storage.commit()?;

        report.files_processed += 1;
        info!("{}/{} files processed.", index + 1, total);
    }
    Ok(report)
}
