//! Artifact resolution
//!
//! The staging directory holds the application the user wants to run, either
//! as an `.app` bundle or as an `.ipa` archive. Resolution picks exactly one
//! and, for an archive, extracts it so that a bundle sits in the staging
//! directory afterwards.

pub mod extract;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use repack_tools::{ToolPaths, ToolRunner};
use serde::{Deserialize, Serialize};

use crate::config::CleanupPolicy;
use crate::diagnostics::Diagnostics;
use crate::error::{RepackError, RepackResult};
use crate::fsops::{self, Entry};
use crate::layout::{APP_SUFFIX, ARCHIVE_SUFFIX};

pub use extract::ArchiveExtractor;

/// Where a resolved bundle came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactSource {
    /// An `.app` placed directly in the staging directory
    Bundle,
    /// Extracted from this archive
    Archive { archive: String },
}

/// The single bundle a run repackages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// Bundle directory name inside the staging directory
    pub bundle_name: String,
    pub source: ArtifactSource,
}

impl ResolvedArtifact {
    pub fn path_in(&self, staging_dir: &Path) -> PathBuf {
        staging_dir.join(&self.bundle_name)
    }

    pub fn from_archive(&self) -> bool {
        matches!(self.source, ArtifactSource::Archive { .. })
    }
}

/// Outcome of inspecting the staging directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Bundle(String),
    Archive(String),
}

/// Pick the candidate from a staging directory listing.
///
/// Ambiguity is checked first; a lone bundle wins over a lone archive.
pub fn select(entries: &[Entry], staging_dir: &Path) -> RepackResult<Selection> {
    let mut apps = 0;
    let mut archives = 0;
    let mut last_app = None;
    let mut last_archive = None;

    for entry in entries {
        if entry.is_dir && entry.has_suffix(APP_SUFFIX) {
            apps += 1;
            last_app = Some(entry.name.clone());
        } else if !entry.is_dir && entry.has_suffix(ARCHIVE_SUFFIX) {
            archives += 1;
            last_archive = Some(entry.name.clone());
        }
    }

    if apps > 1 || archives > 1 {
        return Err(RepackError::AmbiguousArtifacts { apps, archives });
    }

    match (last_app, last_archive) {
        (Some(app), _) => Ok(Selection::Bundle(app)),
        (None, Some(archive)) => Ok(Selection::Archive(archive)),
        (None, None) => Err(RepackError::NoArtifact(staging_dir.to_path_buf())),
    }
}

/// Resolves the staging directory to a single bundle.
pub struct ArtifactResolver<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    cleanup: CleanupPolicy,
}

impl<'a> ArtifactResolver<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolPaths, cleanup: CleanupPolicy) -> Self {
        Self {
            runner,
            tools,
            cleanup,
        }
    }

    pub fn resolve(
        &self,
        staging_dir: &Path,
        diagnostics: &mut Diagnostics,
    ) -> RepackResult<ResolvedArtifact> {
        match fs::metadata(staging_dir) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RepackError::StagingMissing(staging_dir.to_path_buf()));
            }
            Err(source) => {
                return Err(RepackError::StagingUnreadable {
                    path: staging_dir.to_path_buf(),
                    source,
                });
            }
        }

        let entries = fsops::scan_dir(staging_dir)
            .into_result()
            .map_err(|source| RepackError::StagingUnreadable {
                path: staging_dir.to_path_buf(),
                source,
            })?;

        match select(&entries, staging_dir)? {
            Selection::Bundle(bundle_name) => {
                tracing::info!(bundle = %bundle_name, "using bundle from staging directory");
                Ok(ResolvedArtifact {
                    bundle_name,
                    source: ArtifactSource::Bundle,
                })
            }
            Selection::Archive(archive) => {
                tracing::info!(%archive, "extracting archive");
                let extractor = ArchiveExtractor::new(self.runner, self.tools, self.cleanup);
                let bundle_name = extractor.extract(&staging_dir.join(&archive), diagnostics)?;
                Ok(ResolvedArtifact {
                    bundle_name,
                    source: ArtifactSource::Archive { archive },
                })
            }
        }
    }
}
