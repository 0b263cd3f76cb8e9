//! Locations and calling conventions of the delegated Apple tools

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Invocation;

/// Paths of the external tools the pipeline shells out to.
///
/// Every field defaults to the stock macOS / AppleDebugger install location
/// so a config file only needs to name the tools it relocates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Archive extractor (Info-ZIP `unzip`)
    pub unzip: PathBuf,

    /// Code signing tool
    pub codesign: PathBuf,

    /// Property list editor
    pub plist_buddy: PathBuf,

    /// Mach-O load command injector
    pub optool: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            unzip: PathBuf::from("/usr/bin/unzip"),
            codesign: PathBuf::from("/usr/bin/codesign"),
            plist_buddy: PathBuf::from("/usr/libexec/PlistBuddy"),
            optool: PathBuf::from("/opt/AppleDebugger/bin/optool"),
        }
    }
}

impl ToolPaths {
    /// `unzip -o <archive> -d <dest>`: extract, overwriting existing files.
    pub fn unzip_overwrite(&self, archive: &Path, dest: &Path) -> Invocation {
        Invocation::new(&self.unzip)
            .arg("-o")
            .arg_path(archive)
            .arg("-d")
            .arg_path(dest)
    }

    /// `codesign -f -s <identity> [--deep] <target>`
    pub fn codesign(&self, identity: &str, target: &Path, deep: bool) -> Invocation {
        let inv = Invocation::new(&self.codesign).args(["-f", "-s", identity]);
        let inv = if deep { inv.arg("--deep") } else { inv };
        inv.arg_path(target)
    }

    /// `PlistBuddy -c <command> <file>`
    pub fn plist(&self, command: &str, file: &Path) -> Invocation {
        Invocation::new(&self.plist_buddy)
            .arg("-c")
            .arg(command)
            .arg_path(file)
    }

    /// `optool install -p <load_path> -t <target>`
    pub fn optool_install(&self, load_path: &str, target: &Path) -> Invocation {
        Invocation::new(&self.optool)
            .args(["install", "-p", load_path, "-t"])
            .arg_path(target)
    }
}
