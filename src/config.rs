// Configuration handling for pylift
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Default archive location, versioned by tag.
const ARCHIVE_URL_TEMPLATE: &str = "https://downloads.pylift.dev/toolchain/{version}.zip";

/// Describes one provisioned toolchain: where it is stored, which version
/// is wanted, and which resolution strategies apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Name of the formatting tool; also the install directory name.
    pub tool_name: String,

    /// Version tag of the bundled toolchain archive.
    pub version: String,

    /// HTTPS URL of the versioned archive. `{version}` is substituted.
    pub archive_url: String,

    /// Directory owning all installs, archives, and managed environments.
    pub storage_root: PathBuf,

    /// Language-server entry script, relative to the `bundled/tool` tree.
    pub server_script: String,

    /// Resolve the interpreter and tool from the system search path
    /// instead of the managed environment.
    pub use_system_interpreter: bool,

    /// Resolve the server script from the extension's own install tree
    /// instead of the storage root.
    pub use_bundled: bool,

    /// Script tree lives under `{tool_name}.only_lsp` instead of
    /// `{tool_name}` (server-only distribution variant).
    pub only_lsp: bool,

    /// Extension install directory; required when `use_bundled` is set.
    pub extension_root: Option<PathBuf>,

    /// Explicitly configured interpreter. Overrides search-path discovery
    /// and is the interpreter used to create managed environments.
    pub interpreter: Option<PathBuf>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            tool_name: "autopep8".to_string(),
            version: String::new(),
            archive_url: ARCHIVE_URL_TEMPLATE.to_string(),
            storage_root: default_storage_root(),
            server_script: "lsp_server.py".to_string(),
            use_system_interpreter: false,
            use_bundled: false,
            only_lsp: false,
            extension_root: None,
            interpreter: None,
        }
    }
}

fn default_storage_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pylift")
}

impl ToolchainConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::InvalidYaml {
                message: e.to_string(),
                file_path: Some(path.to_path_buf()),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool_name.is_empty()
            || self.tool_name.contains(['/', '\\'])
            || self.tool_name.starts_with('.')
        {
            return Err(ConfigError::InvalidValue {
                field: "tool_name".to_string(),
                value: self.tool_name.clone(),
                message: "must be a plain directory name".to_string(),
            }
            .into());
        }
        if self.version.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "version".to_string(),
                value: self.version.clone(),
                message: "a toolchain version tag is required".to_string(),
            }
            .into());
        }
        let resolved = self.resolved_archive_url();
        let parsed = url::Url::parse(&resolved).map_err(|e| ConfigError::InvalidValue {
            field: "archive_url".to_string(),
            value: resolved.clone(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "archive_url".to_string(),
                value: resolved,
                message: "only http(s) archive URLs are supported".to_string(),
            }
            .into());
        }
        if self.use_bundled && self.extension_root.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "extension_root".to_string(),
                value: String::new(),
                message: "required when use_bundled is set".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Archive URL with the version tag substituted.
    pub fn resolved_archive_url(&self) -> String {
        self.archive_url.replace("{version}", &self.version)
    }

    /// `{storage_root}/{tool_name}.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.storage_root.join(format!("{}.zip", self.tool_name))
    }

    /// `{storage_root}/{tool_name}`
    pub fn install_dir(&self) -> PathBuf {
        self.storage_root.join(&self.tool_name)
    }

    /// Directory holding the bundled script tree. The server-only variant
    /// ships under a suffixed name.
    pub fn script_install_dir(&self) -> PathBuf {
        if self.only_lsp {
            self.storage_root.join(format!("{}.only_lsp", self.tool_name))
        } else {
            self.install_dir()
        }
    }

    /// `{install_dir}/venv`
    pub fn venv_dir(&self) -> PathBuf {
        self.install_dir().join("venv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ToolchainConfig {
        ToolchainConfig {
            version: "1.2.3".to_string(),
            ..ToolchainConfig::default()
        }
    }

    #[test]
    fn test_default_config_needs_a_version() {
        assert!(ToolchainConfig::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_version_substitution_in_archive_url() {
        let config = valid_config();
        assert_eq!(
            config.resolved_archive_url(),
            "https://downloads.pylift.dev/toolchain/1.2.3.zip"
        );
    }

    #[test]
    fn test_storage_layout_paths() {
        let mut config = valid_config();
        config.storage_root = PathBuf::from("/data");
        assert_eq!(config.archive_path(), PathBuf::from("/data/autopep8.zip"));
        assert_eq!(config.install_dir(), PathBuf::from("/data/autopep8"));
        assert_eq!(config.venv_dir(), PathBuf::from("/data/autopep8/venv"));
        assert_eq!(config.script_install_dir(), PathBuf::from("/data/autopep8"));

        config.only_lsp = true;
        assert_eq!(
            config.script_install_dir(),
            PathBuf::from("/data/autopep8.only_lsp")
        );
    }

    #[test]
    fn test_rejects_path_like_tool_names() {
        let mut config = valid_config();
        config.tool_name = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_archive_url() {
        let mut config = valid_config();
        config.archive_url = "ftp://host/archive.zip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bundled_mode_requires_extension_root() {
        let mut config = valid_config();
        config.use_bundled = true;
        assert!(config.validate().is_err());
        config.extension_root = Some(PathBuf::from("/ext"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = "tool_name: black\nversion: 24.1.0\nstorage_root: /data\n";
        let config: ToolchainConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tool_name, "black");
        assert_eq!(config.version, "24.1.0");
        assert_eq!(config.storage_root, PathBuf::from("/data"));
        // Unspecified fields keep their defaults.
        assert_eq!(config.server_script, "lsp_server.py");
        assert!(!config.use_system_interpreter);
    }
}
