//! Command line arguments
//!
//! Global options apply to every subcommand and override the configuration file.

use clap::{ArgAction, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "bundlehost")]
#[command(about = "Load plugin bundles and route host events to them")]
#[command(version, long_version = crate::core::version::long_version())]
pub struct Args {
    /// Configuration file path
    #[arg(long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Directory scanned for bundles
    #[arg(long = "bundle-dir", value_name = "DIR", global = true)]
    pub bundle_dir: Option<PathBuf>,

    /// Log level
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error", "off"]
    )]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        global = true,
        value_parser = ["text", "ext", "json"]
    )]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", conflicts_with = "color", global = true)]
    pub no_color: bool,

    /// More output (repeat for more)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less output (repeat for less)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load every bundle and list bundles and plugins
    List {
        /// Also instantiate process-wide plugins
        #[arg(long)]
        discover: bool,
        /// Only list plugins with this name
        #[arg(long, value_name = "NAME")]
        plugin: Option<String>,
    },
    /// Load one bundle and print its descriptor
    Inspect {
        /// Path to the bundle's shared library
        #[arg(value_name = "BUNDLE")]
        bundle: PathBuf,
    },
    /// Load bundles and keep them running until interrupted
    Run {
        /// Instantiate process-wide plugins (same as auto-discover in the config file)
        #[arg(long)]
        discover: bool,
    },
}

impl Args {
    /// Net verbosity: positive for `-v`, negative for `-q`
    pub fn verbosity(&self) -> i8 {
        let net = self.verbose as i16 - self.quiet as i16;
        net.clamp(i8::MIN as i16, i8::MAX as i16) as i8
    }

    /// Colour decision: explicit flags first, then NO_COLOR and TTY detection
    pub fn use_color(&self) -> bool {
        if self.color {
            return true;
        }
        if self.no_color || std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stdout().is_terminal()
    }

    /// Log file override; `Some(None)` when file logging was disabled with 'none'
    pub fn log_file_override(&self) -> Option<Option<PathBuf>> {
        self.log_file.as_ref().map(|path| {
            if path.as_os_str().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(path.clone())
            }
        })
    }
}
