// CLI interface for pylift using clap
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::ToolchainConfig;
use crate::error::{exit_codes, Result};
use crate::fetch::ProgressObserver;
use crate::installer::{InstallOutcome, ToolchainInstaller};
use crate::logging::{init_logging, LogConfig};
use crate::pathstyle::translate_to_emulation;

#[derive(Parser)]
#[command(
    name = "pylift",
    about = "pylift - Provisions a bundled Python tooling runtime and resolves launch paths",
    version = crate::VERSION,
    long_about = "pylift downloads a versioned Python toolchain archive, provisions an \
isolated environment for it, and resolves the interpreter, formatter, and \
language-server paths a downstream launcher needs - including MSYS2/Cygwin \
path translation on Windows hosts."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "pylift.yaml")]
    pub config: PathBuf,

    /// Control color output (auto, always, never)
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, unpack, and provision the configured toolchain
    Install {
        /// Reinstall even when the installed version already matches
        #[arg(short, long)]
        force: bool,
    },

    /// Print the resolved launch paths as JSON
    Resolve {
        /// Emit POSIX-emulation paths without probing the interpreter
        #[arg(long)]
        emulation: bool,
    },

    /// Translate a native path into POSIX-emulation form
    Translate {
        /// Path in native or emulation form
        path: String,
    },

    /// Show the configured and installed toolchain state
    Status {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Cli {
    pub fn run(self) -> Result<i32> {
        init_logging(LogConfig::from_cli(
            self.verbose,
            self.quiet,
            self.color.clone(),
        ))?;

        match &self.command {
            Commands::Completions { shell } => {
                let mut cmd = Cli::command();
                generate(*shell, &mut cmd, "pylift", &mut std::io::stdout());
                Ok(exit_codes::SUCCESS)
            }

            Commands::Translate { path } => {
                println!("{}", translate_to_emulation(path)?);
                Ok(exit_codes::SUCCESS)
            }

            Commands::Install { force } => {
                let installer = self.installer()?;
                let progress = LogProgress::default();
                let outcome = runtime()?.block_on(installer.ensure_installed(*force, &progress))?;
                match outcome {
                    InstallOutcome::UpToDate { version } => {
                        println!("Toolchain {version} already installed");
                    }
                    InstallOutcome::Installed { version } => {
                        println!("Toolchain {version} installed");
                    }
                }
                Ok(exit_codes::SUCCESS)
            }

            Commands::Resolve { emulation } => {
                let installer = self.installer()?;
                let paths = if *emulation {
                    installer.resolve_native_paths()?.into_emulation()?
                } else {
                    runtime()?.block_on(installer.resolve())?
                };
                println!("{}", to_json(&paths)?);
                Ok(exit_codes::SUCCESS)
            }

            Commands::Status { json } => {
                let installer = self.installer()?;
                let status = runtime()?.block_on(installer.status());
                if *json {
                    println!("{}", to_json(&status)?);
                } else {
                    println!("configured version: {}", status.configured_version);
                    println!(
                        "installed version:  {}",
                        status.installed_version.as_deref().unwrap_or("(none)")
                    );
                    println!(
                        "environment:        {}",
                        if status.environment_ready {
                            "ready"
                        } else {
                            "not provisioned"
                        }
                    );
                    if let Some(interpreter) = &status.interpreter {
                        println!("interpreter:        {}", interpreter.display());
                    }
                    if let Some(version) = &status.interpreter_version {
                        println!("python version:     {version}");
                    }
                    if let Some(tool) = &status.tool {
                        println!("tool:               {}", tool.display());
                    }
                }
                Ok(exit_codes::SUCCESS)
            }
        }
    }

    fn installer(&self) -> Result<ToolchainInstaller> {
        ToolchainInstaller::new(ToolchainConfig::from_file(&self.config)?)
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| std::io::Error::other(e).into())
}

/// Logs download progress once per decile instead of once per chunk.
#[derive(Default)]
struct LogProgress {
    last_decile: AtomicU64,
}

impl ProgressObserver for LogProgress {
    fn on_progress(&self, fraction: f64) {
        let decile = (fraction.clamp(0.0, 1.0) * 10.0) as u64;
        if self.last_decile.swap(decile, Ordering::Relaxed) != decile {
            tracing::info!("Downloaded {}%", decile * 10);
        }
    }
}
