//! Xcode repack - build-phase repackaging of prebuilt apps
//!
//! This crate replaces the product of an Xcode target with a user-supplied
//! `.app` or `.ipa`, reconciles its Info.plist with the project, injects the
//! target's dylib and re-signs the result.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fsops;
pub mod layout;
pub mod pipeline;
pub mod plist;
pub mod resolve;
pub mod signing;
pub mod sweep;
pub mod symbols;

pub use config::{Action, BuildEnvironment, CliOverrides, Mode, RepackConfig};
pub use diagnostics::{Diagnostics, Stage, Warning};
pub use error::{FailureKind, RepackError, RepackResult};
pub use layout::ProjectLayout;
pub use pipeline::{Pipeline, RunReport};
pub use resolve::{ArtifactResolver, ResolvedArtifact};
