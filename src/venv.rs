// Managed virtual environment lifecycle
//
// The environment is owned wholesale: it is deleted and recreated on
// every install, never patched in place.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{InstallError, Result};
use crate::pathstyle::PROBE_TIMEOUT;
use crate::platform::{platform_kind, PlatformKind};
use crate::process::{ProcessConfig, ProcessRunner};

/// Pinned dependency manifest shipped inside the toolchain archive.
pub const DEPENDENCY_MANIFEST: &str = "requirements.txt";

const VERSION_PROBE: &str = "import sys; print('.'.join(map(str, sys.version_info[:3])))";

/// Asks an interpreter for its own version, e.g. `3.12.1`.
pub async fn interpreter_version(interpreter: &Path) -> Result<String> {
    let output = ProcessRunner::new()
        .run(
            ProcessConfig::new(interpreter)
                .with_args(vec!["-c", VERSION_PROBE])
                .with_timeout(PROBE_TIMEOUT),
        )
        .await?;
    Ok(output.stdout.trim().to_string())
}

pub struct VenvProvisioner {
    runner: ProcessRunner,
    platform: PlatformKind,
}

impl Default for VenvProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl VenvProvisioner {
    pub fn new() -> Self {
        Self::with_platform(platform_kind())
    }

    pub fn with_platform(platform: PlatformKind) -> Self {
        Self {
            runner: ProcessRunner::new(),
            platform,
        }
    }

    /// Recreates `{install_dir}/venv` from scratch with `interpreter` and
    /// installs the pinned manifest into it. Returns the environment's
    /// own interpreter. Each step must succeed before the next runs.
    pub async fn provision(&self, interpreter: &Path, install_dir: &Path) -> Result<PathBuf> {
        let manifest = install_dir.join(DEPENDENCY_MANIFEST);
        if !manifest.exists() {
            // Extraction always produces the manifest; absence means the
            // install is corrupt or partial.
            return Err(InstallError::ManifestMissing { path: manifest }.into());
        }

        let venv_dir = install_dir.join("venv");
        if venv_dir.exists() {
            debug!(venv = %venv_dir.display(), "Removing stale managed environment");
            tokio::fs::remove_dir_all(&venv_dir).await?;
        }

        let venv_arg = venv_dir.to_string_lossy().into_owned();
        self.runner
            .run(ProcessConfig::new(interpreter).with_args(vec![
                "-m".to_string(),
                "venv".to_string(),
                venv_arg,
            ]))
            .await?;

        let venv_python = venv_dir
            .join(self.platform.venv_bin_dir())
            .join(format!("python{}", self.platform.exe_suffix()));
        if !venv_python.exists() {
            return Err(InstallError::InterpreterMissing { path: venv_python }.into());
        }

        if let Ok(version) = interpreter_version(&venv_python).await {
            debug!(version, "Managed environment interpreter ready");
        }

        let manifest_arg = manifest.to_string_lossy().into_owned();
        self.runner
            .run(ProcessConfig::new(&venv_python).with_args(vec![
                "-m".to_string(),
                "pip".to_string(),
                "install".to_string(),
                "-r".to_string(),
                manifest_arg,
            ]))
            .await?;

        info!(venv = %venv_dir.display(), "Managed environment provisioned");
        Ok(venv_python)
    }
}
