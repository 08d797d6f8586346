// ABOUTME: Entry point for the cfnbot CLI application.
// ABOUTME: Parses arguments, loads the spec file, and dispatches to group operations.

mod cli;

use cfnbot::deploy::StackGroup;
use cfnbot::error::Result;
use cfnbot::gateway::AwsProvider;
use cfnbot::output::{Output, OutputMode};
use cfnbot::spec::SpecFile;
use clap::Parser;
use cli::{Cli, Commands, SpecArgs};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// The AWS SDK logs every request at debug; keep it quiet unless it warns.
const SDK_DIRECTIVES: &str = "aws_config=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,\
aws_sdk_cloudformation=warn,aws_sdk_s3=warn,hyper=warn,hyper_util=warn";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new(format!("debug,{SDK_DIRECTIVES}"))
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    match run(cli.command, &mut output).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, output: &mut Output) -> Result<i32> {
    match command {
        Commands::Deploy(args) => {
            let (mut group, provider) = connect(args).await?;
            output.progress(&format!(
                "Deploying {} stack(s) from {}",
                group.len(),
                group.name()
            ));
            output.start_timer();

            let summary = group.deploy(&provider, &*output).await;
            output.summary(&summary);
            Ok(summary.exit_code())
        }
        Commands::Delete(args) => {
            let (mut group, provider) = connect(args).await?;
            output.progress(&format!(
                "Deleting {} stack(s) from {}",
                group.len(),
                group.name()
            ));
            output.start_timer();

            let summary = group.delete(&provider, &*output).await;
            output.summary(&summary);
            Ok(summary.exit_code())
        }
        Commands::Status(args) => {
            let (mut group, provider) = connect(args).await?;
            let mut failed = false;

            for stack in group.stacks_mut() {
                match stack.refresh(&provider).await {
                    Ok(exists) => output.stack_status(
                        stack.name(),
                        exists,
                        stack.cached_status(),
                        stack.cached_outputs(),
                    ),
                    Err(e) => {
                        output.error(&format!("{}: {e}", stack.name()));
                        failed = true;
                    }
                }
            }

            Ok(if failed { 1 } else { 0 })
        }
    }
}

/// Load the spec, select the group, apply CLI overrides, and connect to AWS.
async fn connect(args: SpecArgs) -> Result<(StackGroup, AwsProvider)> {
    let spec = load_spec(args.specfile.as_deref())?;
    let mut definition = spec.group(args.stackset.as_deref())?;

    if args.profile.is_some() {
        definition.credential_profile = args.profile;
    }
    if args.region.is_some() {
        definition.region = args.region;
    }

    let group = definition.into_group()?;
    tracing::debug!("spec file parsed, {} stacks in {}", group.len(), group.name());

    let provider = AwsProvider::connect(group.profile(), group.region(), *group.wait_policy()).await;
    Ok((group, provider))
}

fn load_spec(path: Option<&Path>) -> Result<SpecFile> {
    match path {
        Some(path) => SpecFile::load(path),
        None => SpecFile::discover(&env::current_dir()?),
    }
}
