// pylift - Library module
//
// Provisions a bundled Python tooling runtime (interpreter, formatter,
// language-server script) and resolves the filesystem paths a downstream
// launcher needs, across native Windows, POSIX, and
// POSIX-emulation-on-Windows hosts.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod installer;
pub mod logging;
pub mod pathstyle;
pub mod platform;
pub mod process;
pub mod resolver;
pub mod venv;

// Re-export main types for easier access
pub use config::ToolchainConfig;
pub use error::{
    exit_codes, ConfigError, DetectionError, DownloadError, InstallError, PathError, ProcessError,
    PyliftError, Result,
};
pub use extract::{read_version_marker, write_version_marker, ArchiveExtractor, VERSION_MARKER};
pub use fetch::{ArchiveFetcher, NullProgress, ProgressObserver};
pub use installer::{InstallOutcome, ToolchainInstaller, ToolchainStatus};
pub use logging::{ColorConfig, LogConfig, LogFormat};
pub use pathstyle::{translate_to_emulation, PathStyleDetector, PROBE_TIMEOUT};
pub use platform::{platform_kind, PlatformKind};
pub use process::{ProcessConfig, ProcessOutput, ProcessRunner};
pub use resolver::{PathResolver, ResolvedPaths};
pub use venv::{interpreter_version, VenvProvisioner, DEPENDENCY_MANIFEST};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_constant() {
        assert_eq!(NAME, "pylift");
    }

    #[test]
    fn test_description_mentions_the_runtime() {
        assert!(DESCRIPTION.contains("Python"));
    }
}
