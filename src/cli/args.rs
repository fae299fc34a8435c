//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::KeyPolicy;

/// Decision-tree profile resolver: map measured device evidence to profile ids
#[derive(Parser, Debug)]
#[command(name = "proftree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (overrides global config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by commands that evaluate evidence.
#[derive(clap::Args, Debug, Default)]
pub struct MatchArgs {
    /// Compare literal values case-insensitively
    #[arg(long)]
    pub ignore_case: bool,

    /// Evidence key for nodes that do not name one
    #[arg(long, value_enum)]
    pub key_policy: Option<KeyPolicyArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPolicyArg {
    /// Use the nearest ancestor's key
    Inherit,
    /// Skip nodes without their own key
    Explicit,
}

impl From<KeyPolicyArg> for KeyPolicy {
    fn from(arg: KeyPolicyArg) -> Self {
        match arg {
            KeyPolicyArg::Inherit => KeyPolicy::Inherit,
            KeyPolicyArg::Explicit => KeyPolicy::Explicit,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve evidence to a profile id
    Resolve {
        /// Tree data file (default: data_file from config)
        #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
        data: Option<PathBuf>,

        /// Evidence value, repeatable
        #[arg(short, long = "evidence", value_name = "KEY=VALUE")]
        evidence: Vec<String>,

        /// JSON object with evidence values; -e pairs take precedence
        #[arg(long, value_hint = ValueHint::FilePath)]
        evidence_json: Option<PathBuf>,

        /// Print the followed path node by node
        #[arg(long)]
        trace: bool,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Resolve a JSON array of evidence objects
    Batch {
        /// Tree data file (default: data_file from config)
        #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
        data: Option<PathBuf>,

        /// JSON file holding an array of evidence objects
        #[arg(value_hint = ValueHint::FilePath)]
        records: PathBuf,

        /// Print resolutions as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Show tree metadata and statistics
    Info {
        /// Tree data file (default: data_file from config)
        #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
        data: Option<PathBuf>,
    },

    /// Show the tree structure
    Show {
        /// Tree data file (default: data_file from config)
        #[arg(short = 'f', long, value_hint = ValueHint::FilePath)]
        data: Option<PathBuf>,
    },

    /// Check that a tree data file decodes
    Validate {
        /// Tree data file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a template config file
    Template,
    /// Show the global config file location
    Path,
}
