//! Archive extraction
//!
//! An `.ipa` is a zip whose only top-level entry is `Payload/`, holding a
//! single `.app` bundle. The archive is expanded next to itself, the bundle
//! is moved up into the staging directory and the leftovers are cleaned up
//! according to the [`CleanupPolicy`].

use std::fs;
use std::io;
use std::path::Path;

use repack_tools::{ToolPaths, ToolRunner};

use crate::config::CleanupPolicy;
use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{RepackError, RepackResult};
use crate::fsops;
use crate::layout::{APP_SUFFIX, PAYLOAD_DIR};

pub struct ArchiveExtractor<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    cleanup: CleanupPolicy,
}

impl<'a> ArchiveExtractor<'a> {
    pub fn new(
        runner: &'a dyn ToolRunner,
        tools: &'a ToolPaths,
        cleanup: CleanupPolicy,
    ) -> Self {
        Self {
            runner,
            tools,
            cleanup,
        }
    }

    /// Extract `archive` in place and return the name of the bundle now in
    /// its parent directory.
    pub fn extract(
        &self,
        archive: &Path,
        diagnostics: &mut Diagnostics,
    ) -> RepackResult<String> {
        let parent = archive.parent().unwrap_or_else(|| Path::new("."));

        self.runner
            .run(&self.tools.unzip_overwrite(archive, parent))
            .map_err(|source| RepackError::Extraction {
                archive: archive.to_path_buf(),
                source,
            })?;

        let payload = parent.join(PAYLOAD_DIR);
        match fs::metadata(&payload) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(RepackError::PayloadNotDirectory(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RepackError::MissingPayload(parent.to_path_buf()));
            }
            Err(source) => {
                return Err(RepackError::PayloadInaccessible {
                    path: payload,
                    source,
                });
            }
        }

        let entries = fsops::scan_dir(&payload)
            .into_result()
            .map_err(|source| RepackError::PayloadInaccessible {
                path: payload.clone(),
                source,
            })?;
        let bundles: Vec<_> = entries
            .into_iter()
            .filter(|e| e.is_dir && e.has_suffix(APP_SUFFIX))
            .collect();

        let bundle_name = match bundles.as_slice() {
            [only] => only.name.clone(),
            [] => return Err(RepackError::EmptyPayload(payload)),
            _ => {
                return Err(RepackError::AmbiguousPayload {
                    path: payload,
                    count: bundles.len(),
                })
            }
        };

        let from = payload.join(&bundle_name);
        let to = parent.join(&bundle_name);
        fsops::move_tree(&from, &to).map_err(|source| RepackError::Relocate {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        tracing::debug!(
            bundle = %bundle_name,
            dest = %to.display(),
            "bundle moved out of payload"
        );

        self.clean_up(archive, &payload, diagnostics);

        Ok(bundle_name)
    }

    fn clean_up(&self, archive: &Path, payload: &Path, diagnostics: &mut Diagnostics) {
        if !self.cleanup.removes_payload() {
            return;
        }

        if self.cleanup.removes_archive() {
            if let Err(e) = fsops::remove_tree(archive) {
                diagnostics.warn(
                    Stage::Extract,
                    format!("Failed to delete {}: {}", archive.display(), e),
                );
            }
        }

        if let Err(e) = fsops::remove_tree(payload) {
            diagnostics.warn(
                Stage::Extract,
                format!("Failed to delete {}: {}", payload.display(), e),
            );
        }
    }
}
