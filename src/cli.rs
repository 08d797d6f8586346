// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfnbot")]
#[command(about = "Deploy and delete ordered sets of CloudFormation stacks")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub debug: bool,

    /// Only print the final result
    #[arg(long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update a set of stacks as defined in the spec file
    Deploy(SpecArgs),

    /// Delete a set of stacks as defined in the spec file
    Delete(SpecArgs),

    /// Show the remote status and outputs of each stack
    Status(SpecArgs),
}

#[derive(Args)]
pub struct SpecArgs {
    /// Spec file (defaults to cfnbot.yml in the current directory)
    pub specfile: Option<PathBuf>,

    /// Use a stackset other than "Default"
    #[arg(short = 's', long = "stackset")]
    pub stackset: Option<String>,

    /// Credential profile, overriding the spec file
    #[arg(long)]
    pub profile: Option<String>,

    /// Region, overriding the spec file
    #[arg(long)]
    pub region: Option<String>,
}
