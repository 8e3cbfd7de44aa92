use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show per-file details and suggestions
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default `tracing` filter directive for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Report format for `check`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Packet section selectable with `show --section`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Who,
    What,
    WhereWhen,
    How,
    Why,
    Citations,
}

impl Section {
    /// Element name of the section
    pub fn tag(&self) -> &'static str {
        match self {
            Section::Who => "Who",
            Section::What => "What",
            Section::WhereWhen => "WhereWhen",
            Section::How => "How",
            Section::Why => "Why",
            Section::Citations => "Citations",
        }
    }
}

/// Author, inspect and validate VOEvent v2.0 packets
#[derive(Parser, Debug, Clone)]
#[command(name = "voevent-author")]
#[command(about = "Author, inspect and schema-validate VOEvent v2.0 packets")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Validate against this XSD instead of the embedded VOEvent v2.0 schema
    #[arg(long = "schema", global = true, value_name = "XSD")]
    pub schema: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build the Gaia14adi example packet, validate it and write it out
    Demo(DemoArgs),
    /// Validate VOEvent files or directories
    Check(CheckArgs),
    /// Parse a packet and print it, or one of its sections
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Where to write the packet
    #[arg(short = 'o', long = "output", default_value = "gaia.xml")]
    pub output: PathBuf,

    /// Write without indentation
    #[arg(long = "compact")]
    pub compact: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Files or directories to validate
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// File extensions to process (comma-separated)
    #[arg(short = 'e', long = "extensions", help = "File extensions to process (e.g., 'xml,voe')")]
    pub extensions: Option<String>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Number of concurrent validation threads
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Stop at the first file that fails
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Report format
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,
}

impl CheckArgs {
    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Packet to display
    pub file: PathBuf,

    /// Only print this section
    #[arg(long = "section", value_enum)]
    pub section: Option<Section>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }
}
