//! CLI entrypoint for agent-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use relay_application::{
    AvailabilityCache, Clock, DelegateTaskUseCase, DelegationError, DelegationLogger,
    DelegationProgress, LocalHeadlessSessionManager, LocalInteractiveSessionManager, ModeDetector,
    NoDelegationLogger, NoProgress, PlanApprovalPort, RemoteSessionManager, SessionContext,
    TokioClock,
};
use relay_domain::{CapabilityRegistry, DelegationOutcome, SelectionPolicy, SessionState};
use relay_infrastructure::{
    CommandLocalBackend, ConfigLoader, EnvironmentProbe, FileConfig, GitWorkspace,
    JsonlDelegationLogger, connect_remote,
};
use relay_presentation::{
    Cli, Command, ConsoleFormatter, DelegateArgs, InteractivePlanApproval, JsonFormatter,
    OutputFormat, OutputFormatter, ProgressReporter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const EXIT_FAILURE: u8 = 1;
const EXIT_SETUP_REQUIRED: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        for source in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", source);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };
    config.validate().context("invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, config.logging.log_dir.as_deref());
    info!("Starting agent-relay");

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let formatter: Box<dyn OutputFormatter> = match cli.output {
        OutputFormat::Text => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    };

    let delegate_args = match &command {
        Command::Delegate(args) => Some(args),
        _ => None,
    };
    let show_progress = !cli.quiet && delegate_args.is_some();

    // Ctrl-C cancels the in-flight delegation instead of killing the process.
    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let use_case = build_use_case(&config, delegate_args, show_progress)?.with_cancellation(token);

    let exit = match command {
        Command::Delegate(args) => {
            let dir = std::path::absolute(&args.dir)
                .with_context(|| format!("invalid directory {}", args.dir.display()))?;
            let request = args.to_request(dir);
            match use_case.delegate(request).await {
                Ok(outcome) => {
                    println!("{}", formatter.format_outcome(&outcome));
                    outcome_exit_code(&outcome)
                }
                Err(e) => report_error(formatter.as_ref(), &e),
            }
        }
        Command::Status { reference } => match use_case.get_status(&reference).await {
            Ok(snapshot) => {
                println!("{}", formatter.format_snapshot(&snapshot));
                ExitCode::SUCCESS
            }
            Err(e) => report_error(formatter.as_ref(), &e),
        },
        Command::Approve { reference } => match use_case.approve(&reference).await {
            Ok(()) => {
                println!("Plan approved for {}", reference);
                ExitCode::SUCCESS
            }
            Err(e) => report_error(formatter.as_ref(), &e),
        },
        Command::Cancel { reference } => match use_case.cancel(&reference).await {
            Ok(()) => {
                println!("Cancellation requested for {}", reference);
                ExitCode::SUCCESS
            }
            Err(e) => report_error(formatter.as_ref(), &e),
        },
        Command::Agents => {
            let report = use_case.availability().await;
            println!(
                "{}",
                formatter.format_agents(use_case.policy().registry(), &report)
            );
            ExitCode::SUCCESS
        }
    };

    Ok(exit)
}

/// Wire adapters into the delegation use case.
fn build_use_case(
    config: &FileConfig,
    delegate_args: Option<&DelegateArgs>,
    show_progress: bool,
) -> Result<DelegateTaskUseCase> {
    let mut params = config.delegation_params();
    if let Some(args) = delegate_args {
        if let Some(timeout) = args.timeout() {
            params = params.with_timeout(timeout);
        }
        if args.auto_approve {
            params = params.with_auto_approve(true);
        }
    }

    let policy =
        SelectionPolicy::new(CapabilityRegistry::default()).with_priority(config.priority()?);

    let clock: Arc<dyn Clock> = Arc::new(TokioClock);
    let probe = Arc::new(EnvironmentProbe::new(
        config.remote.clone(),
        config.local.binary.clone(),
        Duration::from_secs(config.local.probe_timeout_seconds),
    ));
    let cache = Arc::new(AvailabilityCache::new(
        ModeDetector::new(probe.clone()),
        clock.clone(),
        params.probe_ttl,
    ));

    let progress: Arc<dyn DelegationProgress> = if show_progress {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(NoProgress)
    };
    let ctx = SessionContext::new(clock, params).with_progress(progress);

    let workspace = Arc::new(GitWorkspace::new());
    let local = Arc::new(CommandLocalBackend::new(config.local.binary.clone()));
    let approval: Arc<dyn PlanApprovalPort> = Arc::new(InteractivePlanApproval::new());

    let remote_manager = RemoteSessionManager::new(
        connect_remote(&config.remote),
        workspace.clone(),
        approval,
        ctx.clone(),
    );
    let headless_manager = LocalHeadlessSessionManager::new(local.clone(), workspace, ctx.clone());
    let interactive_manager = LocalInteractiveSessionManager::new(local, ctx.clone());

    Ok(
        DelegateTaskUseCase::new(policy, ModeDetector::new(probe), cache, ctx)
            .with_manager(Arc::new(remote_manager))
            .with_manager(Arc::new(headless_manager))
            .with_manager(Arc::new(interactive_manager))
            .with_setup_hints(config.setup_hints())
            .with_logger(delegation_logger(config)),
    )
}

fn delegation_logger(config: &FileConfig) -> Arc<dyn DelegationLogger> {
    let path = config
        .logging
        .delegation_log
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| dirs::data_local_dir().map(|d| d.join("agent-relay").join("delegations.jsonl")));

    match path.and_then(|p| JsonlDelegationLogger::open(p)) {
        Some(logger) => {
            info!(path = %logger.path().display(), "Writing delegation log");
            Arc::new(logger)
        }
        None => Arc::new(NoDelegationLogger),
    }
}

/// Install the tracing subscriber: stderr by verbosity, plus a daily file when configured.
fn init_logging(verbose: u8, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agent-relay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn outcome_exit_code(outcome: &DelegationOutcome) -> ExitCode {
    match outcome {
        DelegationOutcome::SetupRequired { .. } => ExitCode::from(EXIT_SETUP_REQUIRED),
        DelegationOutcome::Executed { result }
            if result.success || result.state == SessionState::AwaitingApproval =>
        {
            ExitCode::SUCCESS
        }
        DelegationOutcome::Executed { result } => match DelegationError::from_result(result) {
            Some(e) if e.is_cancelled() => ExitCode::from(EXIT_CANCELLED),
            _ => ExitCode::from(EXIT_FAILURE),
        },
    }
}

fn report_error(formatter: &dyn OutputFormatter, error: &DelegationError) -> ExitCode {
    eprintln!("{}", formatter.format_error(error));
    if error.is_cancelled() {
        ExitCode::from(EXIT_CANCELLED)
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}
