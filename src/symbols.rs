//! Debug symbol bundle lookup
//!
//! Symbol bundles are optional, so nothing here is fatal: a missing,
//! unreadable or ambiguous staging directory produces a warning and no
//! result.

use std::fs;
use std::io;
use std::path::Path;

use crate::diagnostics::{Diagnostics, Stage};
use crate::fsops;
use crate::layout::SYMBOLS_SUFFIX;

/// Name of the single `.dSYM` bundle directory in `dir`, if there is
/// exactly one. Plain files carrying the suffix are not bundles.
pub fn locate_symbols(dir: &Path, diagnostics: &mut Diagnostics) -> Option<String> {
    match fs::metadata(dir) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            diagnostics.warn(
                Stage::Symbols,
                format!("Unable to find dSYM directory {}", dir.display()),
            );
            return None;
        }
        Err(e) => {
            diagnostics.warn(
                Stage::Symbols,
                format!("Failed to read dSYM directory {}: {}", dir.display(), e),
            );
            return None;
        }
    }

    let scan = fsops::scan_dir(dir);
    if let Some(err) = &scan.error {
        diagnostics.warn(
            Stage::Symbols,
            format!("Failed to read dSYM directory {}: {}", dir.display(), err),
        );
    }

    let mut found: Vec<String> = scan
        .entries
        .into_iter()
        .filter(|e| e.is_dir && e.has_suffix(SYMBOLS_SUFFIX))
        .map(|e| e.name)
        .collect();

    match found.len() {
        0 => None,
        1 => found.pop(),
        n => {
            diagnostics.warn(
                Stage::Symbols,
                format!(
                    "Found {} dSYM bundles in {}, delete useless files, ignoring this step",
                    n,
                    dir.display()
                ),
            );
            None
        }
    }
}
