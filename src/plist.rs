//! Property list access through PlistBuddy
//!
//! The files are never parsed here. Reads use the editor's `Print` output,
//! writes use `Set`, `Add` and `Delete` commands.

use std::path::Path;

use repack_tools::{ToolError, ToolPaths, ToolRunner};

pub const EXECUTABLE_KEY: &str = "CFBundleExecutable";
pub const IDENTIFIER_KEY: &str = "CFBundleIdentifier";
pub const SUPPORTED_DEVICES_KEY: &str = "UISupportedDevices";
pub const DISPLAY_NAME_KEY: &str = "CFBundleDisplayName";
pub const BUNDLE_VERSION_KEY: &str = "CFBundleVersion";
pub const SHORT_VERSION_KEY: &str = "CFBundleShortVersionString";

/// Runs PlistBuddy commands against Info.plist files.
pub struct PlistEditor<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
}

impl<'a> PlistEditor<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// Value of `key`, trimmed.
    pub fn print(&self, file: &Path, key: &str) -> Result<String, ToolError> {
        let output = self
            .runner
            .run(&self.tools.plist(&format!("Print {}", key), file))?;
        Ok(output.stdout_trimmed().to_string())
    }

    pub fn set(&self, file: &Path, key: &str, value: &str) -> Result<(), ToolError> {
        self.command(file, &format!("Set :{} {}", key, quote(value)))
    }

    /// Set a string value, adding the key when it does not exist yet.
    pub fn set_or_add(&self, file: &Path, key: &str, value: &str) -> Result<(), ToolError> {
        match self.set(file, key, value) {
            Ok(()) => Ok(()),
            Err(ToolError::Failed { .. }) => {
                self.command(file, &format!("Add :{} string {}", key, quote(value)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn delete(&self, file: &Path, key: &str) -> Result<(), ToolError> {
        self.command(file, &format!("Delete {}", key))
    }

    fn command(&self, file: &Path, command: &str) -> Result<(), ToolError> {
        self.runner.run(&self.tools.plist(command, file)).map(|_| ())
    }
}

// PlistBuddy splits its command on whitespace unless the value is quoted
fn quote(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
