// Install orchestration: version-gated fetch → extract → provision
//
// Steps run strictly in sequence; each one's effects are durable on disk
// before the next starts. A failing step aborts the rest and is reported
// by name, never as a generic install failure.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::ToolchainConfig;
use crate::error::{InstallError, PyliftError, Result};
use crate::extract::{read_version_marker, ArchiveExtractor};
use crate::fetch::{ArchiveFetcher, ProgressObserver};
use crate::pathstyle::PathStyleDetector;
use crate::platform::{platform_kind, PlatformKind};
use crate::resolver::{PathResolver, ResolvedPaths};
use crate::venv::{interpreter_version, VenvProvisioner};

/// Outcome of an [`ToolchainInstaller::ensure_installed`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Version marker matched and the environment is intact; no-op.
    UpToDate { version: String },
    /// A full fetch → extract → provision cycle ran.
    Installed { version: String },
}

/// Snapshot of the on-disk install state, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainStatus {
    pub configured_version: String,
    pub installed_version: Option<String>,
    pub environment_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<PathBuf>,
}

/// Owns the full provisioning pipeline and the path-resolution surface
/// consumed by downstream launchers.
pub struct ToolchainInstaller {
    config: ToolchainConfig,
    platform: PlatformKind,
    resolver: PathResolver,
    detector: PathStyleDetector,
    fetcher: ArchiveFetcher,
    extractor: ArchiveExtractor,
    provisioner: VenvProvisioner,
}

impl ToolchainInstaller {
    pub fn new(config: ToolchainConfig) -> Result<Self> {
        Self::with_platform(config, platform_kind())
    }

    pub fn with_platform(config: ToolchainConfig, platform: PlatformKind) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: PathResolver::with_platform(config.clone(), platform),
            detector: PathStyleDetector::new(),
            fetcher: ArchiveFetcher::new()?,
            extractor: ArchiveExtractor::new(),
            provisioner: VenvProvisioner::with_platform(platform),
            platform,
            config,
        })
    }

    pub fn resolve_interpreter_path(&self) -> Result<PathBuf> {
        self.resolver.interpreter_path()
    }

    pub fn resolve_tool_path(&self) -> Result<Option<PathBuf>> {
        self.resolver.tool_path()
    }

    pub fn resolve_script_path(&self) -> Result<Option<PathBuf>> {
        self.resolver.script_path()
    }

    /// All launch paths, translated for the interpreter's path style.
    pub async fn resolve(&self) -> Result<ResolvedPaths> {
        self.resolver.resolve(&self.detector).await
    }

    /// All launch paths in native form, skipping the interpreter probe.
    pub fn resolve_native_paths(&self) -> Result<ResolvedPaths> {
        self.resolver.native_paths()
    }

    /// Runs the fetch → extract → provision pipeline unless the version
    /// marker already matches and the managed environment is intact.
    pub async fn ensure_installed(
        &self,
        force: bool,
        progress: &dyn ProgressObserver,
    ) -> Result<InstallOutcome> {
        let version = self.config.version.clone();
        if !force && self.is_installed() {
            info!(version, "Toolchain already installed, nothing to do");
            return Ok(InstallOutcome::UpToDate { version });
        }

        let url = self.config.resolved_archive_url();
        let archive = self.config.archive_path();
        let install_dir = self.config.install_dir();
        info!(version, url, "Installing toolchain");

        self.fetcher
            .fetch(&url, &archive, progress)
            .await
            .map_err(|e| step_failed("fetch", e))?;

        self.extractor
            .extract(&archive, &install_dir, &version)
            .await
            .map_err(|e| step_failed("extract", e))?;

        let base_interpreter = self
            .resolver
            .base_interpreter()
            .map_err(|e| step_failed("provision", e))?;
        self.provisioner
            .provision(&base_interpreter, &install_dir)
            .await
            .map_err(|e| step_failed("provision", e))?;

        Ok(InstallOutcome::Installed { version })
    }

    /// True when the marker matches the configured tag and the managed
    /// environment still has its interpreter.
    pub fn is_installed(&self) -> bool {
        read_version_marker(&self.config.install_dir())
            .is_some_and(|installed| installed == self.config.version)
            && self.venv_python_path().exists()
    }

    pub fn installed_version(&self) -> Option<String> {
        read_version_marker(&self.config.install_dir())
    }

    pub async fn status(&self) -> ToolchainStatus {
        let interpreter = self.resolver.interpreter_path().ok();
        let interpreter_version = match &interpreter {
            Some(path) if path.exists() => interpreter_version(path).await.ok(),
            _ => None,
        };
        ToolchainStatus {
            configured_version: self.config.version.clone(),
            installed_version: self.installed_version(),
            environment_ready: self.is_installed(),
            interpreter,
            interpreter_version,
            tool: self.resolver.tool_path().ok().flatten(),
        }
    }

    fn venv_python_path(&self) -> PathBuf {
        self.config
            .venv_dir()
            .join(self.platform.venv_bin_dir())
            .join(format!("python{}", self.platform.exe_suffix()))
    }
}

fn step_failed(step: &str, error: PyliftError) -> PyliftError {
    InstallError::StepFailed {
        step: step.to_string(),
        source: Box::new(error),
    }
    .into()
}
