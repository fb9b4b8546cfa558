//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use relay_domain::{ExecutionMode, SessionRef, TaskComplexity, TaskRequest, estimate_task};
use std::path::PathBuf;
use std::time::Duration;

/// Output format for delegation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for agent-relay
#[derive(Parser, Debug)]
#[command(name = "agent-relay")]
#[command(author, version, about = "Route coding tasks to the best available agent backend")]
#[command(long_about = r#"
agent-relay hands a coding task to an external coding agent and waits for it.

Backends are tried in priority order:
1. Remote API       Asynchronous sessions with plan approval (needs an API key)
2. Local headless   The local CLI, driven without a terminal
3. Local interactive  The local CLI, handed to you in this terminal (only when forced)

When nothing is usable, a setup guide explains what to install or configure.

Configuration files are loaded from (in priority order):
1. RELAY_* environment variables (RELAY_POLLING__TIMEOUT_SECONDS=600)
2. --config <path>     Explicit config file
3. ./relay.toml        Project-level config
4. ~/.config/agent-relay/config.toml   Global config

Example:
  agent-relay delegate "Fix the flaky retry test in src/net"
  agent-relay delegate --mode api --approval "Migrate the storage layer to sqlx"
  agent-relay status remote_api:8812345
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delegate a task to the best available backend
    Delegate(DelegateArgs),

    /// Show the state of a session (`<backend>:<id>`)
    Status {
        #[arg(value_name = "SESSION")]
        reference: SessionRef,
    },

    /// Approve the plan of a session waiting for approval
    Approve {
        #[arg(value_name = "SESSION")]
        reference: SessionRef,
    },

    /// Cancel a running session
    Cancel {
        #[arg(value_name = "SESSION")]
        reference: SessionRef,
    },

    /// List backends, their capabilities and current availability
    Agents,
}

#[derive(Args, Debug, Clone)]
pub struct DelegateArgs {
    /// The task description
    #[arg(required = true, num_args = 1.., value_name = "PROMPT")]
    pub prompt: Vec<String>,

    /// Working directory the task applies to
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Backend selection: auto, api, cli_headless, cli_interactive
    #[arg(short, long, default_value = "auto")]
    pub mode: ExecutionMode,

    /// Override the estimated complexity (trivial .. epic)
    #[arg(long)]
    pub complexity: Option<TaskComplexity>,

    /// Require a reviewed plan before the backend changes anything
    #[arg(long)]
    pub approval: bool,

    /// Approve generated plans without asking
    #[arg(short = 'y', long)]
    pub auto_approve: bool,

    /// Override the estimated context size (source lines)
    #[arg(long, value_name = "LINES")]
    pub context_size: Option<u64>,

    /// Starting branch for remote sessions
    #[arg(long)]
    pub branch: Option<String>,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Return as soon as the session exists
    #[arg(long)]
    pub detached: bool,
}

impl DelegateArgs {
    pub fn prompt(&self) -> String {
        self.prompt.join(" ")
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Build the request, estimating whatever was not given explicitly.
    pub fn to_request(&self, working_dir: PathBuf) -> TaskRequest {
        let prompt = self.prompt();
        let estimate = estimate_task(&prompt);

        let mut request = TaskRequest::new(prompt, working_dir)
            .with_mode(self.mode)
            .with_plan_approval(self.approval)
            .with_complexity(self.complexity.unwrap_or(estimate.complexity))
            .with_context_size(self.context_size.unwrap_or(estimate.estimated_context_size));
        if let Some(branch) = &self.branch {
            request = request.with_branch(branch);
        }
        if self.detached {
            request = request.detached();
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::BackendKind;

    fn delegate(args: &[&str]) -> DelegateArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Some(Command::Delegate(args)) => args,
            other => panic!("expected delegate, got {:?}", other),
        }
    }

    #[test]
    fn test_delegate_defaults() {
        let args = delegate(&["agent-relay", "delegate", "fix", "the", "typo"]);
        assert_eq!(args.prompt(), "fix the typo");
        assert_eq!(args.mode, ExecutionMode::Auto);
        assert!(!args.detached);

        let request = args.to_request(PathBuf::from("/work/api"));
        assert_eq!(request.prompt, "fix the typo");
        assert!(!request.needs_plan_approval);
        assert_eq!(request.branch, "main");
    }

    #[test]
    fn test_delegate_overrides() {
        let args = delegate(&[
            "agent-relay",
            "delegate",
            "--mode",
            "cli-headless",
            "--complexity",
            "epic",
            "--context-size",
            "90000",
            "--branch",
            "develop",
            "--timeout",
            "120",
            "--detached",
            "migrate the storage layer",
        ]);
        assert_eq!(args.mode.forced_backend(), Some(BackendKind::LocalHeadless));
        assert_eq!(args.timeout(), Some(Duration::from_secs(120)));

        let request = args.to_request(PathBuf::from("/work/api"));
        assert_eq!(request.complexity, TaskComplexity::Epic);
        assert_eq!(request.estimated_context_size, 90_000);
        assert_eq!(request.branch, "develop");
        assert!(request.detached);
    }

    #[test]
    fn test_session_reference_argument() {
        let cli = Cli::try_parse_from(["agent-relay", "-o", "json", "status", "remote_api:8812345"])
            .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Some(Command::Status { reference }) => {
                assert_eq!(reference.backend, BackendKind::RemoteApi);
                assert_eq!(reference.id, "8812345");
            }
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["agent-relay", "delegate", "--mode", "cloud", "x"]).is_err());
    }

    #[test]
    fn test_prompt_required() {
        assert!(Cli::try_parse_from(["agent-relay", "delegate"]).is_err());
    }
}
