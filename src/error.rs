// Error handling framework for pylift
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PyliftError>;

/// Main error type for pylift with a structured error hierarchy
#[derive(Debug, Error)]
pub enum PyliftError {
    #[error("Process execution failed: {0}")]
    Process(#[from] Box<ProcessError>),

    #[error("Download failed: {0}")]
    Download(#[from] Box<DownloadError>),

    #[error("Interpreter detection failed: {0}")]
    Detection(#[from] Box<DetectionError>),

    #[error("Path handling failed: {0}")]
    Path(#[from] Box<PathError>),

    #[error("Install failed: {0}")]
    Install(#[from] Box<InstallError>),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Subprocess failures with the command context needed for diagnostics
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Process spawn failed: {command}")]
    SpawnFailed { command: String, error: String },

    #[error("Command failed with exit code {exit_code:?}: {command}")]
    ExecutionFailed {
        command: String,
        args: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Process timeout after {duration:?}: {command}")]
    Timeout { command: String, duration: Duration },

    #[error("Output capture failed for {command}: {message}")]
    OutputCaptureFailed { command: String, message: String },
}

/// Toolchain archive download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP client setup failed: {error}")]
    Client { error: String },

    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request to {url} failed: {error}")]
    Transport { url: String, error: String },

    #[error("Transfer from {url} interrupted: {error}")]
    Interrupted { url: String, error: String },
}

/// Interpreter path-style probe errors.
///
/// Clone is required so every waiter on a shared single-flight probe can
/// observe the same failure.
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("Cannot resolve interpreter path {interpreter}: {error}")]
    Resolve { interpreter: PathBuf, error: String },

    #[error("Probe of {interpreter} failed: {error}")]
    ProbeFailed { interpreter: PathBuf, error: String },

    #[error("Probe of {interpreter} timed out after {duration:?}")]
    Timeout {
        interpreter: PathBuf,
        duration: Duration,
    },

    #[error("Probe of {interpreter} printed unexpected output: {output:?}")]
    UnexpectedOutput { interpreter: PathBuf, output: String },
}

/// Path translation errors
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Unrecognized path form: {path:?}")]
    UnrecognizedForm { path: String },
}

/// Install pipeline errors
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Dependency manifest missing: {path} (reinstall required)")]
    ManifestMissing { path: PathBuf },

    #[error("Archive {archive} does not contain exactly one top-level directory: {top_level:?}")]
    MalformedArchive {
        archive: PathBuf,
        top_level: Vec<String>,
    },

    #[error("Cannot read archive {archive}: {error}")]
    ArchiveRead { archive: PathBuf, error: String },

    #[error("No usable Python interpreter found (tried {names:?})")]
    InterpreterNotFound { names: Vec<String> },

    #[error("Managed environment at {path} has no interpreter")]
    InterpreterMissing { path: PathBuf },

    #[error("Install step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<PyliftError>,
    },
}

/// Configuration errors with file context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid YAML syntax: {message}")]
    InvalidYaml {
        message: String,
        file_path: Option<PathBuf>,
    },

    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

/// Exit codes surfaced by the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const PROCESS_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const DETECTION_ERROR: i32 = 5;
    pub const PATH_ERROR: i32 = 6;
    pub const INSTALL_ERROR: i32 = 7;
    pub const TIMEOUT_ERROR: i32 = 8;
}

impl PyliftError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PyliftError::Config(_) => exit_codes::CONFIG_ERROR,
            PyliftError::Process(process_err) => match process_err.as_ref() {
                ProcessError::Timeout { .. } => exit_codes::TIMEOUT_ERROR,
                _ => exit_codes::PROCESS_ERROR,
            },
            PyliftError::Download(_) => exit_codes::DOWNLOAD_ERROR,
            PyliftError::Detection(detection_err) => match detection_err.as_ref() {
                DetectionError::Timeout { .. } => exit_codes::TIMEOUT_ERROR,
                _ => exit_codes::DETECTION_ERROR,
            },
            PyliftError::Path(_) => exit_codes::PATH_ERROR,
            PyliftError::Install(_) => exit_codes::INSTALL_ERROR,
            PyliftError::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<ProcessError> for PyliftError {
    fn from(error: ProcessError) -> Self {
        PyliftError::Process(Box::new(error))
    }
}

impl From<DownloadError> for PyliftError {
    fn from(error: DownloadError) -> Self {
        PyliftError::Download(Box::new(error))
    }
}

impl From<DetectionError> for PyliftError {
    fn from(error: DetectionError) -> Self {
        PyliftError::Detection(Box::new(error))
    }
}

impl From<PathError> for PyliftError {
    fn from(error: PathError) -> Self {
        PyliftError::Path(Box::new(error))
    }
}

impl From<InstallError> for PyliftError {
    fn from(error: InstallError) -> Self {
        PyliftError::Install(Box::new(error))
    }
}

impl From<ConfigError> for PyliftError {
    fn from(error: ConfigError) -> Self {
        PyliftError::Config(Box::new(error))
    }
}

impl From<serde_yaml::Error> for Box<ConfigError> {
    fn from(error: serde_yaml::Error) -> Self {
        Box::new(ConfigError::InvalidYaml {
            message: error.to_string(),
            file_path: None,
        })
    }
}
