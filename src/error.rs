//! Failure taxonomy and stable exit codes
//!
//! Components never terminate the process. They return a [`RepackError`];
//! `main` prints it and exits with the code of its [`FailureKind`].
//! Conditions that only degrade the result are warnings instead (see
//! [`crate::diagnostics`]).

use std::io;
use std::path::PathBuf;

use repack_tools::ToolError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Failure kind - categorizes the cause of a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Build environment or config file problem
    Config,
    /// Staging directory missing, unreadable, empty or ambiguous
    Layout,
    /// Extracted archive does not have the expected payload structure
    ArchiveFormat,
    /// Extraction tool failed or the extracted bundle could not be relocated
    Extraction,
    /// The bundle itself could not be signed
    Signing,
}

impl FailureKind {
    /// Stable process exit code for this kind
    pub fn exit_code(&self) -> i32 {
        match self {
            FailureKind::Config => 1,
            FailureKind::Layout => 10,
            FailureKind::ArchiveFormat => 11,
            FailureKind::Extraction => 12,
            FailureKind::Signing => 20,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FailureKind::Config => "Configuration error",
            FailureKind::Layout => "Invalid staging layout",
            FailureKind::ArchiveFormat => "Illegal archive format",
            FailureKind::Extraction => "Archive extraction failed",
            FailureKind::Signing => "Code signing failed",
        }
    }
}

/// Fatal repackaging errors
#[derive(Debug, Error)]
pub enum RepackError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "Unable to find target directory {}. Do not delete the folder generated by the template.",
        .0.display()
    )]
    StagingMissing(PathBuf),

    #[error(
        "The TargetApp directory {} cannot be read ({source}). Make sure TargetApp exists in the Xcode target name directory.",
        path.display()
    )]
    StagingUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Multiple executables found ({apps} .app, {archives} .ipa), you should only keep one"
    )]
    AmbiguousArtifacts { apps: usize, archives: usize },

    #[error(
        "Nothing to repackage in {}. You should drag the application you want to execute into the TargetApp directory",
        .0.display()
    )]
    NoArtifact(PathBuf),

    #[error(
        "Failed to decompress {} ({source}). Manually unzip the ipa, drag and drop the AppName.app into the TargetApp directory and try again",
        archive.display()
    )]
    Extraction {
        archive: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("Payload directory does not exist in {}. ipa format is illegal", .0.display())]
    MissingPayload(PathBuf),

    #[error("Unable to inspect {}: {source}", path.display())]
    PayloadInaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "{} is not a directory. The structure after decompressing the ipa is illegal. Do not place useless files in the TargetApp directory.",
        .0.display()
    )]
    PayloadNotDirectory(PathBuf),

    #[error(
        "The structure after decompressing the ipa is illegal: no .app bundle in {}",
        .0.display()
    )]
    EmptyPayload(PathBuf),

    #[error(
        "The structure after decompressing the ipa is illegal: {} contains {count} .app bundles",
        path.display()
    )]
    AmbiguousPayload { path: PathBuf, count: usize },

    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to sign {}: {source}", path.display())]
    Signing {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("Failed to open Frameworks directory {}: {source}", path.display())]
    FrameworksUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RepackError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RepackError::Config(_) => FailureKind::Config,
            RepackError::StagingMissing(_)
            | RepackError::StagingUnreadable { .. }
            | RepackError::AmbiguousArtifacts { .. }
            | RepackError::NoArtifact(_) => FailureKind::Layout,
            RepackError::MissingPayload(_)
            | RepackError::PayloadInaccessible { .. }
            | RepackError::PayloadNotDirectory(_)
            | RepackError::EmptyPayload(_)
            | RepackError::AmbiguousPayload { .. } => FailureKind::ArchiveFormat,
            RepackError::Extraction { .. } | RepackError::Relocate { .. } => {
                FailureKind::Extraction
            }
            RepackError::Signing { .. } | RepackError::FrameworksUnreadable { .. } => {
                FailureKind::Signing
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

/// Result type for repackaging operations
pub type RepackResult<T> = Result<T, RepackError>;
