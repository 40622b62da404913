//! Binary entry point for the `nscale-wait` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use nscale_reconcile::reconcile::strip_snapshot_tags;
use nscale_reconcile::{
    CancelToken, ClientError, ConfigError, CreateReconciler, DeleteReconciler, NscaleClient,
    NscaleConfig, OperationTag, PollSettings, ReadOutcome, ReconcileError, ResourceKind,
    ResourceReader, ResourceSnapshot, ResourceTarget, UpdateReconciler, bind, cancellation,
};

mod cli;

use cli::{Cli, KindArg, PollArgs, TargetArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("{0}")]
    Reconcile(#[from] ReconcileError),
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("nscale_reconcile=info,nscale_wait=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let (handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling wait");
            handle.cancel();
        }
    });

    match cli {
        Cli::Create(command) => {
            let (client, settings) = connect(&command.poll)?;
            let target = resource_target(&command.target);
            let snapshot = CreateReconciler::new(target.kind, settings)
                .wait(&target.id, &cancel, bind(&client, &target))
                .await?;
            write_snapshot(snapshot)
        }
        Cli::Update(command) => {
            let (client, settings) = connect(&command.poll)?;
            let target = resource_target(&command.target);
            let tag = OperationTag::new(command.operation_tag);
            let snapshot = UpdateReconciler::new(target.kind, settings)
                .wait(&target.id, &tag, &cancel, bind(&client, &target))
                .await?;
            write_snapshot(snapshot)
        }
        Cli::Delete(command) => {
            let (client, settings) = connect(&command.poll)?;
            let target = resource_target(&command.target);
            DeleteReconciler::new(target.kind, settings)
                .wait(&target.id, &cancel, bind(&client, &target))
                .await?;
            Ok(())
        }
        Cli::Read(args) => read(&args, &cancel).await,
    }
}

async fn read(args: &TargetArgs, cancel: &CancelToken) -> Result<(), CliError> {
    let (client, _) = connect(&PollArgs {
        poll_interval_secs: None,
        timeout_secs: None,
    })?;
    let target = resource_target(args);
    if cancel.is_cancelled() {
        warn!(kind = %target.kind, id = %target.id, "read skipped after interrupt");
        return Ok(());
    }
    match ResourceReader::new(target.kind)
        .read(&target.id, bind(&client, &target))
        .await?
    {
        ReadOutcome::Found(snapshot) => write_snapshot(snapshot),
        ReadOutcome::Removed => Ok(()),
    }
}

fn connect(poll: &PollArgs) -> Result<(NscaleClient, PollSettings), CliError> {
    let mut config = NscaleConfig::load_without_cli_args()?;
    if let Some(interval) = poll.poll_interval_secs {
        config.poll_interval_secs = interval;
    }
    if let Some(timeout) = poll.timeout_secs {
        config.wait_timeout_secs = timeout;
    }
    let settings = config.poll_settings()?;
    let client = NscaleClient::new(&config)?;
    Ok((client, settings))
}

fn resource_target(args: &TargetArgs) -> ResourceTarget {
    let kind = match args.kind {
        KindArg::Instance => ResourceKind::Instance,
        KindArg::ComputeCluster => ResourceKind::ComputeCluster,
        KindArg::Network => ResourceKind::Network,
        KindArg::SecurityGroup => ResourceKind::SecurityGroup,
        KindArg::FileStorage => ResourceKind::FileStorage,
    };
    ResourceTarget::new(kind, args.id.as_str())
}

fn write_snapshot(snapshot: ResourceSnapshot) -> Result<(), CliError> {
    let visible = strip_snapshot_tags(snapshot);
    let rendered = serde_json::to_string_pretty(&visible.body)
        .map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(io::stdout(), "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
