//! Command-line surface
//!
//! Existing build phases call the tool with Go-style single-dash flags
//! (`-mode-lite`, `-codesign`). Those are rewritten to their `--` form
//! before clap sees them.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{Action, CliOverrides, InfoOverrides};

/// Long flags that historically were passed with a single dash
const LEGACY_FLAGS: &[&str] = &[
    "mode-lite",
    "mode-general",
    "codesign",
    "del-useless-files",
    "skip-delete-ipa",
    "skip-delete-all-target",
];

#[derive(Debug, Parser)]
#[command(name = "xcode-repack")]
#[command(about = "Repackage a staged .app or .ipa into the current Xcode build product", version)]
pub struct Cli {
    /// Skip dylib injection and staging (required selection mode)
    #[arg(long)]
    pub mode_lite: bool,

    /// Inject the target dylib (required selection mode)
    #[arg(long)]
    pub mode_general: bool,

    /// Re-sign the build product and its frameworks, then exit
    #[arg(long)]
    pub codesign: bool,

    /// Delete TargetApp and dSYM bundles repeatedly packaged into the product, then exit
    #[arg(long)]
    pub del_useless_files: bool,

    /// Skip deleting the ipa in the TargetApp directory
    #[arg(long)]
    pub skip_delete_ipa: bool,

    /// Skip deleting all temporarily generated files in the TargetApp directory
    #[arg(long)]
    pub skip_delete_all_target: bool,

    /// Path to config file (default: <SRCROOT>/<TARGET>/repack.toml)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Override CFBundleDisplayName
    #[arg(long)]
    pub display_name: Option<String>,

    /// Override CFBundleVersion
    #[arg(long)]
    pub bundle_version: Option<String>,

    /// Override CFBundleShortVersionString
    #[arg(long)]
    pub short_version: Option<String>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Cleanup mode takes precedence over signing mode.
    pub fn action(&self) -> Action {
        if self.del_useless_files {
            Action::Sweep
        } else if self.codesign {
            Action::Sign
        } else {
            Action::Repackage
        }
    }

    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            mode_lite: self.mode_lite,
            mode_general: self.mode_general,
            keep_archive: self.skip_delete_ipa,
            skip_all_cleanup: self.skip_delete_all_target,
            info: InfoOverrides {
                display_name: self.display_name.clone(),
                bundle_version: self.bundle_version.clone(),
                short_version: self.short_version.clone(),
            },
            config_file: self.config.clone(),
        }
    }
}

/// Rewrite `-<legacy>` arguments to `--<legacy>`. Everything else is kept.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let legacy = arg
                .to_str()
                .and_then(|s| s.strip_prefix('-'))
                .filter(|name| LEGACY_FLAGS.contains(name));
            match legacy {
                Some(name) => OsString::from(format!("--{}", name)),
                None => arg,
            }
        })
        .collect()
}
