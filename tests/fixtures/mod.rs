//! Test fixtures for pipeline integration tests
//!
//! This module provides:
//! - A throwaway Xcode project tree (`FakeProject`)
//! - A PlistBuddy stand-in working on `key=value` text plists
//! - An unzip stand-in that materializes a fixed archive layout

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use repack_tools::mock::ScriptedRunner;
use repack_tools::{Invocation, ToolOutput};
use tempfile::TempDir;
use xcode_repack::{ProjectLayout, RepackConfig};

pub const TARGET: &str = "Demo";
pub const BUNDLE_ID: &str = "com.example.demo";
pub const IDENTITY: &str = "Apple Development: Demo (A1B2C3)";

/// A project rooted in a temporary directory.
pub struct FakeProject {
    pub dir: TempDir,
    pub layout: ProjectLayout,
}

impl FakeProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let layout = ProjectLayout::new(dir.path().join("build"), TARGET, dir.path().join("src"));
        fs::create_dir_all(layout.built_products_dir()).expect("build dir");
        fs::create_dir_all(layout.staging_dir()).expect("staging dir");
        fs::create_dir_all(layout.symbols_staging_dir()).expect("dSYM dir");
        Self { dir, layout }
    }

    pub fn config(&self) -> RepackConfig {
        let mut config = RepackConfig::new(self.layout.clone());
        config.bundle_identifier = BUNDLE_ID.to_string();
        config.signing_identity = IDENTITY.to_string();
        config
    }

    pub fn staging(&self) -> PathBuf {
        self.layout.staging_dir()
    }

    /// Place `<name>` in TargetApp with an Info.plist naming `executable`.
    pub fn stage_app(&self, name: &str, executable: &str) -> PathBuf {
        let app = self.staging().join(name);
        write_bundle(&app, executable, "com.vendor.original");
        app
    }

    /// Place an archive file in TargetApp. Its contents come from `fake_unzip`.
    pub fn stage_archive(&self, name: &str) -> PathBuf {
        let path = self.staging().join(name);
        fs::write(&path, "PK").expect("archive");
        path
    }

    pub fn write_project_plist(&self, entries: &[(&str, &str)]) {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        write_plist(&self.layout.project_info_plist(), &map);
    }

    pub fn project_plist(&self) -> BTreeMap<String, String> {
        read_plist(&self.layout.project_info_plist()).unwrap_or_default()
    }

    pub fn installed_plist(&self) -> BTreeMap<String, String> {
        read_plist(&self.layout.build_app().join("Info.plist")).unwrap_or_default()
    }

    pub fn stage_symbols(&self, name: &str) -> PathBuf {
        let path = self.layout.symbols_staging_dir().join(name);
        fs::create_dir_all(path.join("Contents/Resources/DWARF")).expect("dSYM");
        fs::write(path.join("Contents/Info.plist"), name).expect("dSYM plist");
        path
    }
}

/// Create a bundle directory with an Info.plist and executable.
pub fn write_bundle(app: &Path, executable: &str, identifier: &str) {
    fs::create_dir_all(app).expect("bundle dir");
    let map = [
        ("CFBundleExecutable", executable),
        ("CFBundleIdentifier", identifier),
        ("UISupportedDevices", "iPhone10,3"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    write_plist(&app.join("Info.plist"), &map);
    fs::write(app.join(executable), "MACHO").expect("executable");
}

pub fn read_plist(path: &Path) -> Option<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path).ok()?;
    Some(
        contents
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

pub fn write_plist(path: &Path, map: &BTreeMap<String, String>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("plist dir");
    }
    let contents: String = map.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect();
    fs::write(path, contents).expect("plist");
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\""),
        None => value.to_string(),
    }
}

fn missing(command: &str, key: &str) -> ToolOutput {
    ToolOutput::failure(1, format!("{}: Entry, \":{}\", Does Not Exist", command, key))
}

/// Emulates `PlistBuddy -c <command> <file>` on text plists.
pub fn fake_plist_buddy(inv: &Invocation) -> ToolOutput {
    let argv = inv.argv();
    let (command, file) = match argv.as_slice() {
        [flag, command, file] if flag == "-c" => (command.clone(), PathBuf::from(file)),
        _ => return ToolOutput::failure(1, "usage"),
    };
    let Some(mut plist) = read_plist(&file) else {
        return ToolOutput::failure(1, "File Doesn't Exist, Will Create");
    };

    let (verb, rest) = command.split_once(' ').unwrap_or((command.as_str(), ""));
    match verb {
        "Print" => match plist.get(rest) {
            Some(value) => ToolOutput::success(format!("{}\n", value)),
            None => missing("Print", rest),
        },
        "Set" => {
            let rest = rest.trim_start_matches(':');
            let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
            if !plist.contains_key(key) {
                return missing("Set", key);
            }
            plist.insert(key.to_string(), unquote(value));
            write_plist(&file, &plist);
            ToolOutput::success("")
        }
        "Add" => {
            let rest = rest.trim_start_matches(':');
            let (key, typed) = rest.split_once(' ').unwrap_or((rest, ""));
            let value = typed.strip_prefix("string ").unwrap_or(typed);
            if plist.contains_key(key) {
                return ToolOutput::failure(1, format!("Add: \":{}\" Entry Already Exists", key));
            }
            plist.insert(key.to_string(), unquote(value));
            write_plist(&file, &plist);
            ToolOutput::success("")
        }
        "Delete" => {
            let key = rest.trim_start_matches(':');
            if plist.remove(key).is_none() {
                return missing("Delete", key);
            }
            write_plist(&file, &plist);
            ToolOutput::success("")
        }
        _ => ToolOutput::failure(1, "Unrecognized Command"),
    }
}

/// An unzip stand-in that creates `entries` under the `-d` directory.
///
/// A path ending in `/` is a directory; otherwise the second element is
/// written as the file's contents.
pub fn fake_unzip(
    entries: &[(&str, &str)],
) -> impl Fn(&Invocation) -> ToolOutput + Send + Sync + 'static {
    let entries: Vec<(String, String)> = entries
        .iter()
        .map(|(p, c)| (p.to_string(), c.to_string()))
        .collect();

    move |inv: &Invocation| {
        let argv = inv.argv();
        let Some(dest) = argv
            .iter()
            .position(|a| a == "-d")
            .and_then(|i| argv.get(i + 1))
        else {
            return ToolOutput::failure(10, "missing -d");
        };
        let dest = PathBuf::from(dest);

        for (path, contents) in &entries {
            let target = dest.join(path.trim_end_matches('/'));
            if path.ends_with('/') {
                fs::create_dir_all(&target).expect("unzip dir");
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).expect("unzip parent");
                }
                fs::write(&target, contents).expect("unzip file");
            }
        }
        ToolOutput::success(format!("Archive:  {}\n", argv.get(1).cloned().unwrap_or_default()))
    }
}

/// Entries of a well-formed archive holding `<app>` with `executable`.
pub fn archive_entries(app: &str, executable: &str) -> Vec<(String, String)> {
    vec![
        (
            format!("Payload/{}/Info.plist", app),
            format!(
                "CFBundleExecutable={}\nCFBundleIdentifier=com.vendor.original\n",
                executable
            ),
        ),
        (format!("Payload/{}/{}", app, executable), "MACHO".to_string()),
        (format!("Payload/{}/Frameworks/", app), String::new()),
    ]
}

/// Borrow owned entries for `fake_unzip`.
pub fn as_refs(entries: &[(String, String)]) -> Vec<(&str, &str)> {
    entries.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect()
}

/// A runner whose PlistBuddy edits text plists and every other tool succeeds.
pub fn runner() -> ScriptedRunner {
    ScriptedRunner::new().on("PlistBuddy", fake_plist_buddy)
}
