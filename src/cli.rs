//! CLI - Command Line Interface for aniwatch
//!
//! Every action is scriptable and all output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Find the MAL id
//! aniwatch search "frieren" --json
//! aniwatch search "frieren" --resolve
//!
//! # How many episodes are out?
//! aniwatch episodes 52991
//! aniwatch episodes 52991 21 5114 --json
//!
//! # Which episodes do streaming sites link?
//! aniwatch available 52991
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::AiringState;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Nothing found
    NoResults = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// aniwatch - find out how many episodes of an anime are actually out
#[derive(Parser, Debug)]
#[command(
    name = "aniwatch",
    version,
    about = "Resolve available anime episodes across Jikan, AniList, Kitsu and MAL-Sync",
    long_about = "Searches MyAnimeList through Jikan and works out how many episodes \
                  of a show are available right now, reconciling sources that \
                  disagree about airing shows.",
    after_help = "EXAMPLES:\n\
                  aniwatch search \"frieren\"          Find MAL ids\n\
                  aniwatch search \"frieren\" -r       Find and resolve episodes\n\
                  aniwatch episodes 52991            Resolve available episodes\n\
                  aniwatch episodes 21 52991 -j      Several shows, JSON output\n\
                  aniwatch available 52991           Episodes linked on MAL-Sync"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default log filter for the verbosity flags
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "aniwatch=error",
            0 => "aniwatch=warn",
            1 => "aniwatch=debug",
            _ => "aniwatch=trace",
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search TV anime on MyAnimeList (via Jikan)
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Resolve how many episodes are available now
    #[command(visible_alias = "ep")]
    Episodes(EpisodesCmd),

    /// List episode numbers linked on streaming sites (MAL-Sync)
    #[command(visible_alias = "av")]
    Available(AvailableCmd),

    /// Show the effective override table
    Overrides(OverridesCmd),
}

// =============================================================================
// Search Command
// =============================================================================

/// Search anime by title
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search query (title, keywords)
    #[arg(required = true)]
    pub query: String,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "10")]
    pub limit: usize,

    /// Also resolve available episodes for every result
    #[arg(long, short = 'r')]
    pub resolve: bool,
}

// =============================================================================
// Episodes Command
// =============================================================================

/// Resolve available episodes for one or more MAL ids
#[derive(Args, Debug)]
pub struct EpisodesCmd {
    /// MyAnimeList ids
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<u64>,

    /// Title used by backup sources when id lookups fail (single id only)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Airing status, if already known
    #[arg(long, short = 's', value_enum)]
    pub status: Option<StatusArg>,

    /// Planned total episodes, if already known
    #[arg(long, short = 'p')]
    pub planned: Option<u32>,

    /// Shows resolved in parallel (default from config)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Airing status hint
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    /// Still releasing episodes
    Airing,
    /// Finished airing
    Completed,
    /// Not known
    Unknown,
}

impl From<StatusArg> for AiringState {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Airing => AiringState::CurrentlyAiring,
            StatusArg::Completed => AiringState::Completed,
            StatusArg::Unknown => AiringState::Unknown,
        }
    }
}

// =============================================================================
// Available Command
// =============================================================================

/// List available episode numbers for a MAL id
#[derive(Args, Debug)]
pub struct AvailableCmd {
    /// MyAnimeList id
    #[arg(required = true)]
    pub id: u64,
}

// =============================================================================
// Overrides Command
// =============================================================================

#[derive(Args, Debug)]
pub struct OverridesCmd {}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data: JSON envelope, or the human-readable lines
    pub fn print<T: Serialize>(&self, data: T, human: impl FnOnce() -> Vec<String>) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for line in human() {
                println!("{}", line);
            }
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
