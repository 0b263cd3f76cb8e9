//! Non-fatal warnings
//!
//! Best-effort steps report what went wrong here and carry on. Each warning
//! is echoed to stderr as `Warn: <message>` the moment it happens (Xcode
//! shows build phase output in order) and kept for the run report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline stage a warning came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Metadata,
    Install,
    Inject,
    Symbols,
    Sign,
    Sweep,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Metadata => "metadata",
            Stage::Install => "install",
            Stage::Inject => "inject",
            Stage::Symbols => "symbols",
            Stage::Sign => "sign",
            Stage::Sweep => "sweep",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

/// Collects warnings for one run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    silent: bool,
}

impl Diagnostics {
    /// A sink that echoes every warning to stderr.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that only records (tests).
    pub fn silent() -> Self {
        Self {
            warnings: Vec::new(),
            silent: true,
        }
    }

    pub fn warn(&mut self, stage: Stage, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%stage, "{}", message);
        if !self.silent {
            eprintln!("Warn: {}", message);
        }
        self.warnings.push(Warning { stage, message });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Warnings raised by one stage.
    pub fn from_stage(&self, stage: Stage) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.stage == stage)
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut d = Diagnostics::silent();
        d.warn(Stage::Symbols, "Unable to find dSYM directory");
        d.warn(Stage::Sign, "Failed to sign F1.framework");

        assert_eq!(d.warnings().len(), 2);
        assert_eq!(d.warnings()[0].stage, Stage::Symbols);
        assert_eq!(d.from_stage(Stage::Sign).count(), 1);
        assert!(d.from_stage(Stage::Inject).next().is_none());
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Metadata).unwrap(), "\"metadata\"");
        assert_eq!(Stage::Sweep.to_string(), "sweep");
    }
}
