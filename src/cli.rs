//! Command-line interface for ops-launcher.
//!
//! Parses arguments using clap. With no subcommand the interactive menu runs;
//! every other subcommand maps onto one registry action via
//! [`Command::invocation`].

use crate::action::{ActionArgs, ActionId};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for ops.
///
/// # Examples
///
/// ```bash
/// # Interactive menu
/// ops
///
/// # Follow a container's logs on a host that exists in two clients
/// ops docker logs acme:web api --follow
///
/// # Restart a compose project in a non-default directory
/// ops compose restart web --project-dir /srv/app
/// ```
#[derive(Parser, Debug)]
#[command(name = "ops")]
#[command(version)]
#[command(about = "Launch SSH, Docker and Compose operations on inventory hosts")]
#[command(long_about = "ops resolves a host from a client-grouped YAML inventory and runs\n\
    SSH, Docker or Compose operations on it through your local ssh client.\n\n\
    Run without a subcommand for the interactive menu.")]
pub struct Cli {
    /// Inventory file (default: ~/.config/ops-launcher/hosts.yaml).
    #[arg(short, long, global = true, env = "OPS_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List clients and hosts.
    Ls {
        /// Only show hosts whose name, address, client or tags contain this text.
        filter: Option<String>,
        /// Print hosts as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Open an SSH session.
    Ssh(HostArg),

    /// Show uptime, disk, memory and load.
    Health(HostArg),

    /// Docker commands on a remote host.
    #[command(subcommand)]
    Docker(DockerCommand),

    /// Docker Compose commands on a remote host.
    #[command(subcommand)]
    Compose(ComposeCommand),

    /// Run any registered action by name, e.g. `nginx-status` or `redis-info`.
    Run {
        /// Action name (see the menu or README for the list).
        #[arg(value_parser = parse_action)]
        action: ActionId,
        /// Host name or client:host.
        host: String,
        /// Container name, for `docker-logs`.
        #[arg(long)]
        container: Option<String>,
        /// Keep streaming logs.
        #[arg(short, long)]
        follow: bool,
        /// Remote compose project directory.
        #[arg(short = 'd', long, value_name = "PATH")]
        project_dir: Option<String>,
    },

    /// Show the active inventory path and validate it.
    Config,
}

fn parse_action(s: &str) -> Result<ActionId, String> {
    s.parse::<ActionId>().map_err(|e| e.to_string())
}

/// A host token, `name` or `client:name`.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct HostArg {
    /// Host name or client:host.
    pub host: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DockerCommand {
    /// List running containers.
    Ps(HostArg),

    /// Show logs of a container.
    Logs {
        /// Host name or client:host.
        host: String,
        /// Container name.
        container: Option<String>,
        /// Keep streaming new log lines.
        #[arg(short, long)]
        follow: bool,
    },

    /// Show container resource usage.
    Stats(HostArg),
}

/// Host plus optional project directory shared by compose subcommands.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ComposeArgs {
    /// Host name or client:host.
    pub host: String,
    /// Remote compose project directory (default: the host's compose_path).
    #[arg(short = 'd', long, value_name = "PATH")]
    pub project_dir: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ComposeCommand {
    /// Show service status.
    Ps(ComposeArgs),
    /// Start services detached.
    Up(ComposeArgs),
    /// Stop and remove services (asks for confirmation).
    Down(ComposeArgs),
    /// Restart services (asks for confirmation).
    Restart(ComposeArgs),
    /// Follow service logs.
    Logs(ComposeArgs),
}

/// An action to run against one host token.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub action: ActionId,
    pub host: String,
    pub args: ActionArgs,
}

impl Command {
    /// The registry action this subcommand runs, if it runs one.
    ///
    /// Returns `None` for `ls` and `config`.
    pub fn invocation(&self) -> Option<Invocation> {
        let simple = |action, host: &HostArg| Invocation {
            action,
            host: host.host.clone(),
            args: ActionArgs::default(),
        };

        let invocation = match self {
            Command::Ls { .. } | Command::Config => return None,
            Command::Run {
                action,
                host,
                container,
                follow,
                project_dir,
            } => Invocation {
                action: *action,
                host: host.clone(),
                args: ActionArgs {
                    container: container.clone(),
                    follow: *follow,
                    project_dir: project_dir.clone(),
                },
            },
            Command::Ssh(h) => simple(ActionId::Ssh, h),
            Command::Health(h) => simple(ActionId::Health, h),
            Command::Docker(DockerCommand::Ps(h)) => simple(ActionId::DockerPs, h),
            Command::Docker(DockerCommand::Stats(h)) => simple(ActionId::DockerStats, h),
            Command::Docker(DockerCommand::Logs {
                host,
                container,
                follow,
            }) => Invocation {
                action: ActionId::DockerLogs,
                host: host.clone(),
                args: ActionArgs {
                    container: container.clone(),
                    follow: *follow,
                    project_dir: None,
                },
            },
            Command::Compose(cmd) => {
                let (action, c) = match cmd {
                    ComposeCommand::Ps(c) => (ActionId::ComposePs, c),
                    ComposeCommand::Up(c) => (ActionId::ComposeUp, c),
                    ComposeCommand::Down(c) => (ActionId::ComposeDown, c),
                    ComposeCommand::Restart(c) => (ActionId::ComposeRestart, c),
                    ComposeCommand::Logs(c) => (ActionId::ComposeLogs, c),
                };
                Invocation {
                    action,
                    host: c.host.clone(),
                    args: ActionArgs {
                        project_dir: c.project_dir.clone(),
                        ..Default::default()
                    },
                }
            }
        };

        Some(invocation)
    }
}
