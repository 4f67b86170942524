//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Builds a company forest from flat records and aggregates travel cost over every subtree
#[derive(Parser, Debug)]
#[command(name = "costtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Raise log level (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding the local .costtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The two input documents every forest is built from.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// JSON array of travels (companyId, price)
    #[arg(long, env = "COSTTREE_TRAVELS", value_hint = ValueHint::FilePath)]
    pub travels: PathBuf,

    /// JSON array of companies (id, createdAt, name, parentId)
    #[arg(long, env = "COSTTREE_COMPANIES", value_hint = ValueHint::FilePath)]
    pub companies: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the company tree and write it as JSON
    Build {
        #[command(flatten)]
        input: InputArgs,
        /// Output file (overrides config)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Write compact JSON
        #[arg(long)]
        compact: bool,
        /// Fail on travels of unknown companies
        #[arg(long)]
        strict: bool,
    },

    /// Show the company forest with costs
    Tree {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the effective cost of one company
    Cost {
        #[command(flatten)]
        input: InputArgs,
        /// Company id
        id: String,
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
    /// Print effective settings as TOML
    Show,
    /// Print config file locations
    Path,
    /// Print a commented template
    Template,
}
