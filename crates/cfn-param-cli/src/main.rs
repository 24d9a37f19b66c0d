mod output;
mod signal;

use std::time::Duration;

use cfn_param_core::aws::CloudFormation;
use cfn_param_core::kv::{self, Overrides};
use cfn_param_core::{run, Mode, Outcome, RunRequest, Settings, UpdateError};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "update-cloudformation-stack",
    about = "Updates a CloudFormation stack by updating some of its parameters \
             while preserving all other settings",
    version
)]
struct Cli {
    /// Name of the CloudFormation stack to update
    #[arg(long, env = "INPUT_STACK")]
    stack: Option<String>,

    /// Single parameter to set (use with --value); skips the update when it
    /// already holds that value
    #[arg(long, requires = "value", conflicts_with = "parameters")]
    key: Option<String>,

    /// New value for --key
    #[arg(long, requires = "key")]
    value: Option<String>,

    /// Parameters to set. Under GitHub Actions, defaults to the lines of
    /// INPUT_PARAMETERS
    #[arg(value_name = "KEY=VALUE")]
    parameters: Vec<String>,

    /// Show the parameters UpdateStack would be called with, without calling it
    #[arg(long)]
    dry_run: bool,

    /// Print the dry-run plan as JSON
    #[arg(long, short = 'j', requires = "dry_run")]
    json: bool,

    /// Stop waiting for the update after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    #[arg(
        long,
        hide = true,
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    poll_interval: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings =
        Settings::from_env().with_poll_interval(Duration::from_secs(cli.poll_interval));
    output::init_tracing(&settings);

    if let Err(e) = execute(cli, &settings).await {
        match e.downcast_ref::<UpdateError>() {
            Some(benign) if benign.is_benign() => output::warning(&settings, benign),
            _ => {
                output::error(&settings, format!("{e:#}"));
                std::process::exit(1);
            }
        }
    }
}

async fn execute(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let stack = cli.stack.clone().unwrap_or_default();
    run::require_stack_name(&stack)?;
    let (overrides, mode) = overrides(&cli, settings)?;
    let request = RunRequest::new(stack, overrides, mode)?.dry_run(cli.dry_run);

    let api = CloudFormation::from_env().await;
    let cancel = signal::cancellation(cli.timeout.map(Duration::from_secs));

    match run(&api, &request, settings, cancel).await? {
        Outcome::Planned(plan) => output::print_plan(request.stack_name(), &plan, cli.json)?,
        Outcome::Updated => info!("stack {} updated", request.stack_name()),
    }
    Ok(())
}

fn overrides(cli: &Cli, settings: &Settings) -> anyhow::Result<(Overrides, Mode)> {
    if let (Some(key), Some(value)) = (&cli.key, &cli.value) {
        return Ok((kv::single(key, value)?, Mode::Single));
    }
    let overrides = if cli.parameters.is_empty() && settings.github_actions {
        let input = std::env::var("INPUT_PARAMETERS").unwrap_or_default();
        kv::parse_lines(input.split('\n'))?
    } else {
        kv::parse_lines(&cli.parameters)?
    };
    Ok((overrides, Mode::Multiple))
}
