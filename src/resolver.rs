// Filesystem location strategies for the interpreter, the formatting tool,
// and the language-server entry script.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::ToolchainConfig;
use crate::error::{InstallError, Result};
use crate::pathstyle::{translate_to_emulation, PathStyleDetector};
use crate::platform::{platform_kind, PlatformKind};

/// Interpreter names probed on the system search path, preferred first.
const INTERPRETER_NAMES: [&str; 2] = ["python3", "python"];

/// Output contract for the downstream launcher.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPaths {
    pub interpreter: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,
}

impl ResolvedPaths {
    /// Rewrites every path into POSIX-emulation form, regardless of what
    /// an interpreter probe would report.
    pub fn into_emulation(self) -> Result<Self> {
        Ok(Self {
            interpreter: emulation_path(&self.interpreter)?,
            tool: self.tool.as_deref().map(emulation_path).transpose()?,
            script: self.script.as_deref().map(emulation_path).transpose()?,
        })
    }
}

/// Computes launch paths under the configured resolution strategies:
/// system-global, managed-venv, or bundled.
pub struct PathResolver {
    config: ToolchainConfig,
    platform: PlatformKind,
}

impl PathResolver {
    pub fn new(config: ToolchainConfig) -> Self {
        Self::with_platform(config, platform_kind())
    }

    pub fn with_platform(config: ToolchainConfig, platform: PlatformKind) -> Self {
        Self { config, platform }
    }

    /// Interpreter location under the configured strategy. Managed paths
    /// are computed, not existence-checked: the installer needs the target
    /// path before the environment exists.
    pub fn interpreter_path(&self) -> Result<PathBuf> {
        if self.config.use_system_interpreter {
            self.base_interpreter()
        } else {
            Ok(self.managed_binary("python"))
        }
    }

    /// The interpreter used to create managed environments: the explicitly
    /// configured one, or the first hit on the system search path,
    /// resolved to its real location rather than a symlink.
    pub fn base_interpreter(&self) -> Result<PathBuf> {
        if let Some(configured) = &self.config.interpreter {
            return Ok(configured.canonicalize()?);
        }
        for name in INTERPRETER_NAMES {
            if let Ok(found) = which::which(name) {
                debug!(name, path = %found.display(), "Located system interpreter");
                return Ok(found.canonicalize()?);
            }
        }
        Err(InstallError::InterpreterNotFound {
            names: INTERPRETER_NAMES.iter().map(ToString::to_string).collect(),
        }
        .into())
    }

    /// Formatter executable, or None when the managed environment was
    /// never provisioned. A missing environment must not fabricate a path.
    pub fn tool_path(&self) -> Result<Option<PathBuf>> {
        if self.config.use_system_interpreter {
            match which::which(&self.config.tool_name) {
                Ok(found) => Ok(Some(found.canonicalize()?)),
                Err(_) => Ok(None),
            }
        } else {
            let path = self.managed_binary(&self.config.tool_name);
            if path.exists() {
                Ok(Some(path))
            } else {
                Ok(None)
            }
        }
    }

    /// Language-server entry script. Bundled mode trusts the extension's
    /// own tree; storage-root mode is existence-checked.
    pub fn script_path(&self) -> Result<Option<PathBuf>> {
        let base = if self.config.use_bundled {
            match &self.config.extension_root {
                Some(root) => root.clone(),
                None => return Ok(None),
            }
        } else {
            self.config.script_install_dir()
        };
        let script = base
            .join("bundled")
            .join("tool")
            .join(&self.config.server_script);
        if self.config.use_bundled || script.exists() {
            Ok(Some(script))
        } else {
            Ok(None)
        }
    }

    /// All three launch paths in native form, without probing the
    /// interpreter's path style.
    pub fn native_paths(&self) -> Result<ResolvedPaths> {
        Ok(ResolvedPaths {
            interpreter: self.interpreter_path()?,
            tool: self.tool_path()?,
            script: self.script_path()?,
        })
    }

    /// Resolves all three paths and, when the interpreter turns out to be
    /// a POSIX-emulation build, rewrites every path into the form that
    /// interpreter accepts. Native interpreters get ordinary absolute
    /// paths. Detection only makes sense on Windows hosts; elsewhere the
    /// probe is skipped entirely.
    pub async fn resolve(&self, detector: &PathStyleDetector) -> Result<ResolvedPaths> {
        let paths = self.native_paths()?;

        let emulation = if self.platform.windows_host() {
            detector.is_posix_emulation(&paths.interpreter).await?
        } else {
            false
        };

        if emulation {
            paths.into_emulation()
        } else {
            Ok(paths)
        }
    }

    fn managed_binary(&self, name: &str) -> PathBuf {
        self.config
            .venv_dir()
            .join(self.platform.venv_bin_dir())
            .join(format!("{name}{}", self.platform.exe_suffix()))
    }
}

fn emulation_path(path: &Path) -> Result<PathBuf> {
    translate_to_emulation(&path.to_string_lossy()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(storage_root: &str) -> ToolchainConfig {
        ToolchainConfig {
            version: "1.0.0".to_string(),
            storage_root: PathBuf::from(storage_root),
            ..ToolchainConfig::default()
        }
    }

    #[test]
    fn test_managed_interpreter_layout_native_windows() {
        let resolver = PathResolver::with_platform(config("/data"), PlatformKind::WindowsNative);
        assert_eq!(
            resolver.interpreter_path().unwrap(),
            PathBuf::from("/data/autopep8/venv/Scripts/python.exe")
        );
    }

    #[test]
    fn test_managed_interpreter_layout_posix_emulation() {
        // MSYS2/Cygwin environments lay the venv out POSIX-style even
        // though the host is Windows.
        let resolver =
            PathResolver::with_platform(config("/data"), PlatformKind::WindowsPosixEmulation);
        assert_eq!(
            resolver.interpreter_path().unwrap(),
            PathBuf::from("/data/autopep8/venv/bin/python")
        );
    }

    #[test]
    fn test_managed_interpreter_layout_posix() {
        let resolver = PathResolver::with_platform(config("/data"), PlatformKind::Posix);
        assert_eq!(
            resolver.interpreter_path().unwrap(),
            PathBuf::from("/data/autopep8/venv/bin/python")
        );
    }

    #[test]
    fn test_script_path_uses_only_lsp_variant() {
        let mut cfg = config("/data");
        cfg.only_lsp = true;
        let resolver = PathResolver::with_platform(cfg, PlatformKind::Posix);
        // Never provisioned, so the existence check reports absent.
        assert_eq!(resolver.script_path().unwrap(), None);
    }

    #[test]
    fn test_bundled_script_path_is_trusted() {
        let mut cfg = config("/data");
        cfg.use_bundled = true;
        cfg.extension_root = Some(PathBuf::from("/ext/pylift-extension"));
        let resolver = PathResolver::with_platform(cfg, PlatformKind::Posix);
        assert_eq!(
            resolver.script_path().unwrap(),
            Some(PathBuf::from(
                "/ext/pylift-extension/bundled/tool/lsp_server.py"
            ))
        );
    }
}
