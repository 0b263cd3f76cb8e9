//! Optional `repack.toml` (layer 2)
//!
//! ```toml
//! mode = "lite"
//!
//! [tools]
//! optool = "/usr/local/bin/optool"
//!
//! [cleanup]
//! keep_archive = true
//!
//! [info]
//! display_name = "Demo (debug)"
//! ```

use std::fs;
use std::io;
use std::path::Path;

use repack_tools::ToolPaths;
use serde::Deserialize;

use super::{ConfigError, InfoOverrides, Mode};

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<Mode>,
    pub tools: ToolPaths,
    pub cleanup: FileCleanup,
    pub info: InfoOverrides,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileCleanup {
    /// Keep the .ipa after extracting it
    pub keep_archive: bool,
    /// Leave the archive and its Payload directory in place
    pub skip_all: bool,
}

impl FileConfig {
    /// Load a file that must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ConfigError::NotFound(path.to_path_buf()))
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load a file if present.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
