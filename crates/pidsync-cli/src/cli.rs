use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pidsync",
    about = "Inspect configuration identities, merges and record diffs offline",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive the configuration identity of a resource path
    Identify(IdentifyArgs),
    /// Recover factory PID and name from a legacy identifier
    DecodeAlias(DecodeAliasArgs),
    /// Compute the dictionary an install would write
    Merge(MergeArgs),
    /// Show property changes between two records
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct IdentifyArgs {
    /// Resource URL or file path
    pub path: String,
    /// Recognize the legacy record-file extensions
    #[arg(long)]
    pub legacy_extensions: bool,
}

#[derive(Args)]
pub struct DecodeAliasArgs {
    /// The legacy group identifier
    pub old_id: String,
    /// The generated alias recorded with the group
    #[arg(long)]
    pub alias: Option<String>,
}

#[derive(Args)]
pub struct MergeArgs {
    /// JSON records as `[SCHEME=]FILE`, primary first; scheme defaults to `default`
    #[arg(required = true)]
    pub inputs: Vec<String>,
    /// Comma-separated merge schemes
    #[arg(long, conflicts_with = "config")]
    pub schemes: Option<String>,
    /// Installer configuration (TOML) supplying the merge schemes
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Current record (JSON)
    pub old: PathBuf,
    /// Proposed record (JSON)
    pub new: PathBuf,
}
