use crate::cli::Cli;
use crate::core::allocator::AllocatorKind;
use crate::session;
use crate::utils::SizeMode;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub session_config: SessionConfig,
    pub input_config: InputConfig,
    pub log_level: Option<log::LevelFilter>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Config {
            session_config: SessionConfig::from_cli(cli),
            input_config: InputConfig::from_cli(cli)?,
            log_level: match cli.verbose {
                0 => None,
                1 => Some(log::LevelFilter::Debug),
                _ => Some(log::LevelFilter::Trace),
            },
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub allocator: AllocatorKind,
    pub size_mode: SizeMode,
}

impl SessionConfig {
    fn from_cli(cli: &Cli) -> Self {
        SessionConfig {
            allocator: cli.allocator,
            size_mode: if cli.strict_sizes {
                SizeMode::Checked
            } else {
                SizeMode::Wrapping
            },
        }
    }
}

/// Where commands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputConfig {
    Commands(Vec<Vec<String>>),
    /// `None` reads stdin.
    Script(Option<PathBuf>),
}

impl InputConfig {
    fn from_cli(cli: &Cli) -> Result<Self> {
        if let Some(script) = &cli.script {
            if script.as_os_str() == "-" {
                return Ok(InputConfig::Script(None));
            }
            anyhow::ensure!(
                script.is_file(),
                "Script does not exist: {}",
                script.display()
            );
            return Ok(InputConfig::Script(Some(script.clone())));
        }

        let commands = session::split_commands(&cli.command);
        anyhow::ensure!(
            !commands.is_empty(),
            "No command given, try 'imgalloc help'"
        );
        Ok(InputConfig::Commands(commands))
    }

    /// Read the commands to run, loading the script if there is one.
    pub fn load(&self) -> Result<Vec<Vec<String>>> {
        match self {
            InputConfig::Commands(commands) => Ok(commands.clone()),
            InputConfig::Script(None) => {
                session::parse_script(io::stdin().lock()).context("Failed to read commands from stdin")
            }
            InputConfig::Script(Some(path)) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open script {}", path.display()))?;
                session::parse_script(BufReader::new(file))
                    .with_context(|| format!("Failed to read script {}", path.display()))
            }
        }
    }
}
