use std::path::PathBuf;

use altoro_core::Part;
use altoro_infra::LogOptions;
use clap::{ArgAction, Parser, Subcommand};

/// Altoro Mutual scraping and API reconciliation
#[derive(Debug, Parser)]
#[command(name = "altoro")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (TOML or JSON). Searched for in the working directory when
    /// omitted.
    #[arg(long, short = 'c', env = "ALTORO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// More output: -v info, -vv debug, -vvv trace. RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run every part in order (default)
    RunAll,
    /// Part 1: login retries and the negative login check
    Login,
    /// Part 2: account summary and activity
    Accounts,
    /// Part 3: filtered transactions and high-value credits
    Transactions,
    /// Part 4: fund transfer with balance verification
    Transfer,
    /// Part 5: product catalogue
    Products,
    /// Part 6: API validation against the web sheets
    ApiValidate,
}

impl Command {
    /// The single part to run, or `None` for the whole pipeline.
    pub fn part(self) -> Option<Part> {
        match self {
            Self::RunAll => None,
            Self::Login => Some(Part::Login),
            Self::Accounts => Some(Part::Accounts),
            Self::Transactions => Some(Part::Transactions),
            Self::Transfer => Some(Part::Transfer),
            Self::Products => Some(Part::Products),
            Self::ApiValidate => Some(Part::ApiValidation),
        }
    }
}

impl Cli {
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::RunAll)
    }

    pub fn log_options(&self, log_dir: Option<PathBuf>) -> LogOptions {
        LogOptions { verbosity: self.verbose, json: self.json_logs, log_dir }
    }
}
