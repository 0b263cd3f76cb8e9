//! Removal of bundles left behind by earlier runs
//!
//! Xcode copies the contents of the target folder into the product, so the
//! staged `.app` and relocated `.app.dSYM` bundles of previous runs end up
//! nested inside it. The sweep deletes those immediate subdirectories and
//! nothing else.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, Stage};
use crate::fsops;
use crate::layout::{APP_SUFFIX, APP_SYMBOLS_SUFFIX};

/// What a sweep removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub removed: Vec<String>,
    /// Entries that matched but could not be removed
    pub failed: Vec<String>,
}

/// Remove every `.app` / `.app.dSYM` subdirectory of `dir`.
pub fn sweep(dir: &Path, diagnostics: &mut Diagnostics) -> SweepReport {
    let mut report = SweepReport::default();

    let entries = match fsops::scan_dir(dir).into_result() {
        Ok(entries) => entries,
        Err(e) => {
            diagnostics.warn(
                Stage::Sweep,
                format!("Unable to read {}: {}", dir.display(), e),
            );
            return report;
        }
    };

    for entry in entries
        .into_iter()
        .filter(|e| e.is_dir && (e.has_suffix(APP_SUFFIX) || e.has_suffix(APP_SYMBOLS_SUFFIX)))
    {
        match fsops::remove_tree(&dir.join(&entry.name)) {
            Ok(()) => {
                tracing::debug!(entry = %entry.name, "removed");
                report.removed.push(entry.name);
            }
            Err(e) => {
                tracing::debug!(entry = %entry.name, error = %e, "removal failed");
                report.failed.push(entry.name);
            }
        }
    }

    report
}
