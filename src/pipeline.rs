//! Repackaging orchestration
//!
//! One [`Pipeline::execute`] call performs one [`Action`]:
//! - `Sweep`: remove nested bundles from the build output and stop
//! - `Sign`: stage the injected dylib, re-sign the build output and stop
//! - `Repackage`: resolve the staged artifact, install it as the build
//!   output, reconcile its Info.plist, inject the dylib and relocate symbols
//!
//! Resolution and extraction failures abort the run. Every later repackaging
//! step is best-effort and reports problems as warnings.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use repack_tools::ToolRunner;
use serde::{Deserialize, Serialize};

use crate::config::{Action, ConfigSource, Mode, RepackConfig};
use crate::diagnostics::{Diagnostics, Stage, Warning};
use crate::error::RepackResult;
use crate::fsops;
use crate::layout::INFO_PLIST;
use crate::plist::{PlistEditor, EXECUTABLE_KEY, IDENTIFIER_KEY, SUPPORTED_DEVICES_KEY};
use crate::resolve::{ArtifactResolver, ResolvedArtifact};
use crate::signing::{stage_dylib, CodeSigner, SigningReport};
use crate::sweep::{sweep, SweepReport};
use crate::symbols::locate_symbols;

/// Record of one run, written by `--report`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub action: Action,
    pub target: String,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Layers the configuration was resolved from, in application order
    #[serde(default)]
    pub config_sources: Vec<ConfigSource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ResolvedArtifact>,

    /// Project Info.plist replaced by the artifact's
    #[serde(default)]
    pub plist_replaced: bool,

    /// Load path installed into the main executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected: Option<String>,

    /// Symbol bundle copied next to the build output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing: Option<SigningReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepReport>,

    #[serde(default)]
    pub warnings: Vec<Warning>,
}

impl RunReport {
    fn start(action: Action, config: &RepackConfig) -> Self {
        let now = Utc::now();
        Self {
            action,
            target: config.layout.target_name().to_string(),
            mode: config.mode,
            started_at: now,
            finished_at: now,
            config_sources: config.sources.clone(),
            artifact: None,
            plist_replaced: false,
            injected: None,
            symbols: None,
            signing: None,
            sweep: None,
            warnings: Vec::new(),
        }
    }

    fn finish(mut self, diagnostics: &Diagnostics) -> Self {
        self.finished_at = Utc::now();
        self.warnings = diagnostics.warnings().to_vec();
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }
}

/// Drives one invocation against an immutable configuration.
pub struct Pipeline<'a> {
    config: &'a RepackConfig,
    runner: &'a dyn ToolRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a RepackConfig, runner: &'a dyn ToolRunner) -> Self {
        Self { config, runner }
    }

    pub fn execute(
        &self,
        action: Action,
        diagnostics: &mut Diagnostics,
    ) -> RepackResult<RunReport> {
        let mut report = RunReport::start(action, self.config);
        tracing::info!(?action, target = %report.target, "starting");

        match action {
            Action::Sweep => {
                report.sweep = Some(sweep(&self.config.layout.build_app(), diagnostics));
            }
            Action::Sign => {
                report.signing = Some(self.sign(diagnostics)?);
            }
            Action::Repackage => {
                self.repackage(&mut report, diagnostics)?;
            }
        }

        let report = report.finish(diagnostics);
        tracing::info!(warnings = report.warnings.len(), "finished");
        Ok(report)
    }

    fn sign(&self, diagnostics: &mut Diagnostics) -> RepackResult<SigningReport> {
        let layout = &self.config.layout;
        let staged = match self.config.mode {
            Mode::General => stage_dylib(layout, diagnostics),
            Mode::Lite => None,
        };

        let signer = CodeSigner::new(
            self.runner,
            &self.config.tools,
            &self.config.signing_identity,
        );
        let mut signing = signer.sign(&layout.build_app(), diagnostics)?;
        signing.dylib_staged = staged;
        Ok(signing)
    }

    fn repackage(
        &self,
        report: &mut RunReport,
        diagnostics: &mut Diagnostics,
    ) -> RepackResult<()> {
        let layout = &self.config.layout;
        let plist = PlistEditor::new(self.runner, &self.config.tools);
        let staging_dir = layout.staging_dir();
        let project_plist = layout.project_info_plist();
        let build_app = layout.build_app();

        let resolver =
            ArtifactResolver::new(self.runner, &self.config.tools, self.config.cleanup);
        let artifact = resolver.resolve(&staging_dir, diagnostics)?;
        let bundle = artifact.path_in(&staging_dir);
        let bundle_plist = bundle.join(INFO_PLIST);
        report.artifact = Some(artifact);

        let project_executable = match plist.print(&project_plist, EXECUTABLE_KEY) {
            Ok(name) => name,
            Err(e) => {
                diagnostics.warn(
                    Stage::Metadata,
                    format!(
                        "Failed to read {} from {}: {}",
                        EXECUTABLE_KEY,
                        project_plist.display(),
                        e
                    ),
                );
                String::new()
            }
        };

        if let Err(e) = fsops::remove_tree(&build_app) {
            diagnostics.warn(
                Stage::Install,
                format!("Failed to remove {}: {}", build_app.display(), e),
            );
        }
        match fsops::copy_tree(&bundle, &build_app) {
            Ok(files) => tracing::info!(files, dest = %build_app.display(), "bundle installed"),
            Err(e) => diagnostics.warn(
                Stage::Install,
                format!(
                    "Failed to copy {} to {}: {}",
                    bundle.display(),
                    build_app.display(),
                    e
                ),
            ),
        }

        let executable = match plist.print(&bundle_plist, EXECUTABLE_KEY) {
            Ok(name) => name,
            Err(e) => {
                diagnostics.warn(
                    Stage::Metadata,
                    format!(
                        "Failed to read {} from {}: {}",
                        EXECUTABLE_KEY,
                        bundle_plist.display(),
                        e
                    ),
                );
                String::new()
            }
        };
        check_bundle_structure(&build_app, &executable, diagnostics);

        if project_executable != executable {
            tracing::info!(
                project = %project_executable,
                artifact = %executable,
                "executable differs, replacing project Info.plist"
            );
            match fsops::copy_file(&bundle_plist, &project_plist) {
                Ok(()) => report.plist_replaced = true,
                Err(e) => diagnostics.warn(
                    Stage::Metadata,
                    format!("Failed to replace {}: {}", project_plist.display(), e),
                ),
            }
        }

        self.reconcile_metadata(&plist, &project_plist, diagnostics);
        let installed_plist = build_app.join(INFO_PLIST);
        if let Err(e) = fsops::copy_file(&project_plist, &installed_plist) {
            diagnostics.warn(
                Stage::Metadata,
                format!(
                    "Failed to copy {} to {}: {}",
                    project_plist.display(),
                    installed_plist.display(),
                    e
                ),
            );
        }

        if self.config.mode == Mode::General {
            report.injected = self.inject(&build_app, &executable, diagnostics);
        }

        report.symbols = self.relocate_symbols(diagnostics);
        Ok(())
    }

    fn reconcile_metadata(
        &self,
        plist: &PlistEditor<'_>,
        file: &Path,
        diagnostics: &mut Diagnostics,
    ) {
        if let Err(e) = plist.set(file, IDENTIFIER_KEY, &self.config.bundle_identifier) {
            diagnostics.warn(
                Stage::Metadata,
                format!("Failed to set {}: {}", IDENTIFIER_KEY, e),
            );
        }

        // Usually absent
        if let Err(e) = plist.delete(file, SUPPORTED_DEVICES_KEY) {
            tracing::debug!(error = %e, "no {} to delete", SUPPORTED_DEVICES_KEY);
        }

        for (key, value) in self.config.info.entries() {
            if let Err(e) = plist.set_or_add(file, key, value) {
                diagnostics.warn(Stage::Metadata, format!("Failed to set {}: {}", key, e));
            }
        }
    }

    fn inject(
        &self,
        build_app: &Path,
        executable: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        if executable.is_empty() {
            diagnostics.warn(
                Stage::Inject,
                "Executable name unknown, skipping dylib injection",
            );
            return None;
        }

        let load_path = self.config.layout.dylib_load_path();
        let target = build_app.join(executable);
        match self
            .runner
            .run(&self.config.tools.optool_install(&load_path, &target))
        {
            Ok(_) => {
                tracing::info!(%load_path, "dylib load command installed");
                Some(load_path)
            }
            Err(e) => {
                diagnostics.warn(
                    Stage::Inject,
                    format!("Failed to inject {} into {}: {}", load_path, target.display(), e),
                );
                None
            }
        }
    }

    fn relocate_symbols(&self, diagnostics: &mut Diagnostics) -> Option<String> {
        let layout = &self.config.layout;
        let staging = layout.symbols_staging_dir();
        let name = locate_symbols(&staging, diagnostics)?;
        let dest = layout.build_symbols();

        if let Err(e) = fsops::remove_tree(&dest) {
            diagnostics.warn(
                Stage::Symbols,
                format!("Failed to remove {}: {}", dest.display(), e),
            );
        }
        match fsops::copy_tree(&staging.join(&name), &dest) {
            Ok(_) => Some(name),
            Err(e) => {
                diagnostics.warn(
                    Stage::Symbols,
                    format!("Failed to copy {} to {}: {}", name, dest.display(), e),
                );
                None
            }
        }
    }
}

/// Warn when the installed bundle lacks its Info.plist or main executable.
fn check_bundle_structure(bundle: &Path, executable: &str, diagnostics: &mut Diagnostics) {
    if !bundle.join(INFO_PLIST).is_file() {
        diagnostics.warn(
            Stage::Install,
            format!("App structure error: missing {} in {}", INFO_PLIST, bundle.display()),
        );
    }
    if !executable.is_empty() && !bundle.join(executable).exists() {
        diagnostics.warn(
            Stage::Install,
            format!(
                "App structure error: missing executable {} in {}",
                executable,
                bundle.display()
            ),
        );
    }
}
