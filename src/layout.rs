//! Filesystem layout of a repackaging target
//!
//! Every path the pipeline reads or writes is derived here from three inputs
//! of the build environment: the build products directory, the target name
//! and the source root.
//!
//! ```text
//! <root>/<target>/TargetApp/          staging: one .app or one .ipa
//! <root>/<target>/dSYM/               optional symbol bundle staging
//! <root>/<target>/Info.plist          project property list
//! <build>/<target>.app                build output bundle
//! <build>/<target>.app.dSYM           relocated symbol bundle
//! ```

use std::path::{Path, PathBuf};

/// Suffix of an application bundle directory
pub const APP_SUFFIX: &str = ".app";

/// Suffix of an application archive
pub const ARCHIVE_SUFFIX: &str = ".ipa";

/// Suffix of a debug symbol bundle
pub const SYMBOLS_SUFFIX: &str = ".dSYM";

/// Suffix of a symbol bundle relocated next to a built app
pub const APP_SYMBOLS_SUFFIX: &str = ".app.dSYM";

/// Top-level container directory inside an archive
pub const PAYLOAD_DIR: &str = "Payload";

pub const FRAMEWORKS_DIR: &str = "Frameworks";

pub const PLUGINS_DIR: &str = "PlugIns";

pub const INFO_PLIST: &str = "Info.plist";

const STAGING_DIR: &str = "TargetApp";
const SYMBOLS_STAGING_DIR: &str = "dSYM";

/// Resolved paths for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    built_products_dir: PathBuf,
    target_name: String,
    source_root: PathBuf,
}

impl ProjectLayout {
    pub fn new(
        built_products_dir: impl Into<PathBuf>,
        target_name: impl Into<String>,
        source_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            built_products_dir: built_products_dir.into(),
            target_name: target_name.into(),
            source_root: source_root.into(),
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn built_products_dir(&self) -> &Path {
        &self.built_products_dir
    }

    /// `<root>/<target>`
    pub fn target_dir(&self) -> PathBuf {
        self.source_root.join(&self.target_name)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.target_dir().join(STAGING_DIR)
    }

    pub fn symbols_staging_dir(&self) -> PathBuf {
        self.target_dir().join(SYMBOLS_STAGING_DIR)
    }

    pub fn project_info_plist(&self) -> PathBuf {
        self.target_dir().join(INFO_PLIST)
    }

    /// Default location of the optional `repack.toml`
    pub fn config_file(&self) -> PathBuf {
        self.target_dir().join("repack.toml")
    }

    /// `<build>/<target>.app`
    pub fn build_app(&self) -> PathBuf {
        self.built_products_dir
            .join(format!("{}{}", self.target_name, APP_SUFFIX))
    }

    /// `<build>/<target>.app.dSYM`
    pub fn build_symbols(&self) -> PathBuf {
        self.built_products_dir
            .join(format!("{}{}", self.target_name, APP_SYMBOLS_SUFFIX))
    }

    /// `lib<target>Dylib.dylib`
    pub fn dylib_name(&self) -> String {
        format!("lib{}Dylib.dylib", self.target_name)
    }

    /// Install path written into the main executable's load commands.
    pub fn dylib_load_path(&self) -> String {
        format!("@rpath/{}", self.dylib_name())
    }

    /// Where the build places the injected library before it is bundled.
    pub fn built_dylib(&self) -> PathBuf {
        self.built_products_dir.join(self.dylib_name())
    }
}
