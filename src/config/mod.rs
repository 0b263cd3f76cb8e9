//! Configuration merge system
//!
//! Builds the immutable [`RepackConfig`] every component receives, from three
//! layers in precedence order:
//! 1. Xcode build settings (environment)
//! 2. Optional `repack.toml` (`--config`, or `<root>/<target>/repack.toml`)
//! 3. CLI flags

mod environment;
mod file;

use std::io;
use std::path::PathBuf;

use repack_tools::ToolPaths;
use serde::{Deserialize, Serialize};

use crate::layout::ProjectLayout;
use crate::plist::{BUNDLE_VERSION_KEY, DISPLAY_NAME_KEY, SHORT_VERSION_KEY};

pub use environment::{
    BuildEnvironment, BUILT_PRODUCTS_DIR, EXPANDED_CODE_SIGN_IDENTITY, PRODUCT_BUNDLE_IDENTIFIER,
    SRCROOT, TARGET_NAME,
};
pub use file::{FileCleanup, FileConfig};

/// Whether the injected dylib is part of this build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Inject and stage `lib<target>Dylib.dylib`
    #[default]
    General,
    /// Skip dylib injection and staging
    Lite,
}

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Full pipeline: resolve, install, reconcile metadata, inject, symbols
    Repackage,
    /// Remove bundles nested into the product by earlier runs
    Sweep,
    /// Re-sign the built product and its frameworks
    Sign,
}

/// What to delete after extracting an archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPolicy {
    pub keep_archive: bool,
    pub skip_all: bool,
}

impl CleanupPolicy {
    pub fn removes_archive(&self) -> bool {
        !self.skip_all && !self.keep_archive
    }

    pub fn removes_payload(&self) -> bool {
        !self.skip_all
    }
}

/// Optional Info.plist values written over the resolved app's
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InfoOverrides {
    pub display_name: Option<String>,
    pub bundle_version: Option<String>,
    pub short_version: Option<String>,
}

impl InfoOverrides {
    /// Values from `other` win where set.
    pub fn overlay(self, other: InfoOverrides) -> InfoOverrides {
        InfoOverrides {
            display_name: other.display_name.or(self.display_name),
            bundle_version: other.bundle_version.or(self.bundle_version),
            short_version: other.short_version.or(self.short_version),
        }
    }

    /// `(plist key, value)` pairs to apply, in a fixed order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            (DISPLAY_NAME_KEY, self.display_name.as_deref()),
            (BUNDLE_VERSION_KEY, self.bundle_version.as_deref()),
            (SHORT_VERSION_KEY, self.short_version.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Settings passed on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub mode_lite: bool,
    pub mode_general: bool,
    pub keep_archive: bool,
    pub skip_all_cleanup: bool,
    pub info: InfoOverrides,
    /// Explicit config file; must exist
    pub config_file: Option<PathBuf>,
}

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Environment,
    File,
    Cli,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Errors that can occur while assembling the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Build setting {0} is not set. Run this tool from an Xcode build phase.")]
    MissingVariable(&'static str),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Merged, read-only configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepackConfig {
    pub layout: ProjectLayout,
    pub bundle_identifier: String,
    pub signing_identity: String,
    pub mode: Mode,
    pub cleanup: CleanupPolicy,
    pub info: InfoOverrides,
    pub tools: ToolPaths,
    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl RepackConfig {
    /// Defaults for a layout, with no identity or bundle identifier.
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            bundle_identifier: String::new(),
            signing_identity: String::new(),
            mode: Mode::default(),
            cleanup: CleanupPolicy::default(),
            info: InfoOverrides::default(),
            tools: ToolPaths::default(),
            sources: Vec::new(),
        }
    }

    /// Merge all layers for `action`, validating the settings it needs.
    pub fn resolve(
        env: &BuildEnvironment,
        action: Action,
        cli: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let built_products_dir = env
            .built_products_dir
            .clone()
            .ok_or(ConfigError::MissingVariable(BUILT_PRODUCTS_DIR))?;
        let target_name = env
            .target_name
            .clone()
            .ok_or(ConfigError::MissingVariable(TARGET_NAME))?;

        if action == Action::Repackage {
            if env.source_root.is_none() {
                return Err(ConfigError::MissingVariable(SRCROOT));
            }
            if env.bundle_identifier.is_none() {
                return Err(ConfigError::MissingVariable(PRODUCT_BUNDLE_IDENTIFIER));
            }
        }
        if action == Action::Sign && env.signing_identity.is_none() {
            return Err(ConfigError::MissingVariable(EXPANDED_CODE_SIGN_IDENTITY));
        }

        let layout = ProjectLayout::new(
            built_products_dir,
            target_name,
            env.source_root.clone().unwrap_or_default(),
        );

        let mut config = RepackConfig::new(layout);
        config.bundle_identifier = env.bundle_identifier.clone().unwrap_or_default();
        config.signing_identity = env.signing_identity.clone().unwrap_or_default();
        config.sources.push(ConfigSource {
            origin: ConfigOrigin::Environment,
            path: None,
        });

        // Layer 2: config file
        let file = match &cli.config_file {
            Some(path) => Some((path.clone(), FileConfig::load(path)?)),
            None if env.source_root.is_some() => {
                let path = config.layout.config_file();
                FileConfig::load_optional(&path)?.map(|f| (path, f))
            }
            None => None,
        };
        if let Some((path, file)) = file {
            config.apply_file(file);
            config.sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path),
            });
        }

        // Layer 3: CLI flags
        config.apply_cli(cli);
        config.sources.push(ConfigSource {
            origin: ConfigOrigin::Cli,
            path: None,
        });

        tracing::debug!(
            target = %config.layout.target_name(),
            mode = ?config.mode,
            cleanup = ?config.cleanup,
            "configuration resolved"
        );

        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(mode) = file.mode {
            self.mode = mode;
        }
        self.tools = file.tools;
        self.cleanup = CleanupPolicy {
            keep_archive: file.cleanup.keep_archive,
            skip_all: file.cleanup.skip_all,
        };
        self.info = std::mem::take(&mut self.info).overlay(file.info);
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        // Lite wins when both mode flags are given
        if cli.mode_lite {
            self.mode = Mode::Lite;
        } else if cli.mode_general {
            self.mode = Mode::General;
        }
        self.cleanup.keep_archive |= cli.keep_archive;
        self.cleanup.skip_all |= cli.skip_all_cleanup;
        self.info = std::mem::take(&mut self.info).overlay(cli.info.clone());
    }
}
