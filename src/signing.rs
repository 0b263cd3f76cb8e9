//! Re-signing of the built product
//!
//! The bundle signature is mandatory; an unsigned app cannot be installed.
//! Nested frameworks are signed one by one in deep mode and a failure on one
//! of them only warns.

use std::fs;
use std::io;
use std::path::Path;

use repack_tools::{ToolPaths, ToolRunner};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, Stage};
use crate::error::{RepackError, RepackResult};
use crate::fsops;
use crate::layout::{ProjectLayout, FRAMEWORKS_DIR, PLUGINS_DIR};

/// Outcome of a signing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningReport {
    pub plugins_removed: bool,
    /// Framework directory names signed successfully, in order
    pub frameworks_signed: Vec<String>,
    pub frameworks_failed: Vec<String>,
    /// Library copied into Frameworks before signing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dylib_staged: Option<String>,
}

pub struct CodeSigner<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    identity: &'a str,
}

impl<'a> CodeSigner<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolPaths, identity: &'a str) -> Self {
        Self {
            runner,
            tools,
            identity,
        }
    }

    pub fn sign(
        &self,
        bundle: &Path,
        diagnostics: &mut Diagnostics,
    ) -> RepackResult<SigningReport> {
        let mut report = SigningReport::default();

        let plugins = bundle.join(PLUGINS_DIR);
        if plugins.exists() {
            match fsops::remove_tree(&plugins) {
                Ok(()) => report.plugins_removed = true,
                Err(e) => tracing::debug!(error = %e, "could not remove PlugIns"),
            }
        }

        self.runner
            .run(&self.tools.codesign(self.identity, bundle, false))
            .map_err(|source| RepackError::Signing {
                path: bundle.to_path_buf(),
                source,
            })?;
        tracing::info!(bundle = %bundle.display(), "bundle signed");

        let frameworks = bundle.join(FRAMEWORKS_DIR);
        match fs::metadata(&frameworks) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(report),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(source) => {
                return Err(RepackError::FrameworksUnreadable {
                    path: frameworks,
                    source,
                })
            }
        }

        let entries = fsops::scan_dir(&frameworks)
            .into_result()
            .map_err(|source| RepackError::FrameworksUnreadable {
                path: frameworks.clone(),
                source,
            })?;

        for entry in entries.into_iter().filter(|e| e.is_dir) {
            let path = frameworks.join(&entry.name);
            match self.runner.run(&self.tools.codesign(self.identity, &path, true)) {
                Ok(_) => report.frameworks_signed.push(entry.name),
                Err(e) => {
                    diagnostics.warn(
                        Stage::Sign,
                        format!("Failed to sign {}: {}", path.display(), e),
                    );
                    report.frameworks_failed.push(entry.name);
                }
            }
        }

        Ok(report)
    }
}

/// Copy the built injection library into the product's Frameworks if it is
/// not there yet. Returns the library name when a copy was made.
pub fn stage_dylib(layout: &ProjectLayout, diagnostics: &mut Diagnostics) -> Option<String> {
    let frameworks = layout.build_app().join(FRAMEWORKS_DIR);
    let name = layout.dylib_name();
    let dest = frameworks.join(&name);

    if dest.exists() {
        return None;
    }

    let source = layout.built_dylib();
    let result = fs::create_dir_all(&frameworks).and_then(|()| {
        if source.exists() {
            fsops::copy_file(&source, &dest)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", source.display()),
            ))
        }
    });

    match result {
        Ok(()) => {
            tracing::debug!(dylib = %name, "staged into Frameworks");
            Some(name)
        }
        Err(e) => {
            diagnostics.warn(
                Stage::Sign,
                format!("Failed to copy {} into {}: {}", name, frameworks.display(), e),
            );
            None
        }
    }
}
