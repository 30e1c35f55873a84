//! Action registry and command builder.
//!
//! The set of actions is fixed: each [`ActionId`] has one static
//! [`ActionDescriptor`] holding its required tag, destructive flag and a pure
//! builder function. [`build`] looks an action up, re-checks tag gating (the
//! non-interactive CLI never goes through the menu's filtering) and returns the
//! finished argument vector together with the flags the caller needs to decide
//! on confirmation and terminal handling.
//!
//! | id                | tag      | destructive | remote command                      |
//! |-------------------|----------|-------------|-------------------------------------|
//! | `ssh`             |          |             | interactive login                   |
//! | `health`          |          |             | uptime, disk, memory, load          |
//! | `docker-ps`       | `docker` |             | `docker ps`                         |
//! | `docker-logs`     | `docker` |             | `docker logs --tail 100 [-f] NAME`  |
//! | `docker-stats`    | `docker` |             | `docker stats --no-stream`          |
//! | `compose-ps`      | `docker` |             | `docker compose ps`                 |
//! | `compose-up`      | `docker` |             | `docker compose up -d`              |
//! | `compose-down`    | `docker` | yes         | `docker compose down`               |
//! | `compose-restart` | `docker` | yes         | `docker compose restart`            |
//! | `compose-logs`    | `docker` |             | `docker compose logs --tail 100 -f` |
//! | `nginx-status`    | `nginx`  |             | `nginx -t`, stub_status             |
//! | `nginx-reload`    | `nginx`  | yes         | `nginx -s reload`                   |
//! | `postgres-status` | `postgres` |           | connections by state, DB sizes      |
//! | `redis-info`      | `redis`  |             | server, memory and client info      |
//! | `celery-inspect`  | `celery` |             | `celery inspect active` in `worker` |
//! | `traefik-status`  | `traefik` |            | routers from the Traefik API        |

use crate::config::{Host, SshDefaults};
use crate::error::{OpsError, Result};
use crate::ssh::{self, RemoteCommand};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Tag that unlocks every Docker and Compose action.
pub const DOCKER_TAG: &str = "docker";
pub const NGINX_TAG: &str = "nginx";
pub const POSTGRES_TAG: &str = "postgres";
pub const REDIS_TAG: &str = "redis";
pub const CELERY_TAG: &str = "celery";
pub const TRAEFIK_TAG: &str = "traefik";

/// Lines of history fetched by the log actions.
const LOG_TAIL: &str = "100";

/// Identifier of a built-in action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    Ssh,
    Health,
    DockerPs,
    DockerLogs,
    DockerStats,
    ComposePs,
    ComposeUp,
    ComposeDown,
    ComposeRestart,
    ComposeLogs,
    NginxStatus,
    NginxReload,
    PostgresStatus,
    RedisInfo,
    CeleryInspect,
    TraefikStatus,
}

impl ActionId {
    /// Every action, in menu order.
    pub const ALL: [ActionId; 16] = [
        ActionId::Ssh,
        ActionId::Health,
        ActionId::DockerPs,
        ActionId::DockerLogs,
        ActionId::DockerStats,
        ActionId::ComposePs,
        ActionId::ComposeUp,
        ActionId::ComposeDown,
        ActionId::ComposeRestart,
        ActionId::ComposeLogs,
        ActionId::NginxStatus,
        ActionId::NginxReload,
        ActionId::PostgresStatus,
        ActionId::RedisInfo,
        ActionId::CeleryInspect,
        ActionId::TraefikStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::Ssh => "ssh",
            ActionId::Health => "health",
            ActionId::DockerPs => "docker-ps",
            ActionId::DockerLogs => "docker-logs",
            ActionId::DockerStats => "docker-stats",
            ActionId::ComposePs => "compose-ps",
            ActionId::ComposeUp => "compose-up",
            ActionId::ComposeDown => "compose-down",
            ActionId::ComposeRestart => "compose-restart",
            ActionId::ComposeLogs => "compose-logs",
            ActionId::NginxStatus => "nginx-status",
            ActionId::NginxReload => "nginx-reload",
            ActionId::PostgresStatus => "postgres-status",
            ActionId::RedisInfo => "redis-info",
            ActionId::CeleryInspect => "celery-inspect",
            ActionId::TraefikStatus => "traefik-status",
        }
    }

    /// The static descriptor for this action.
    pub fn descriptor(self) -> &'static ActionDescriptor {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = OpsError;

    /// Accepts `docker-ps` as well as `docker_ps`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.replace('_', "-");
        ActionId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| OpsError::UnknownAction(s.to_string()))
    }
}

/// Optional inputs some actions take.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArgs {
    /// Container name for `docker-logs`.
    pub container: Option<String>,
    /// Keep streaming logs instead of printing the tail and exiting.
    pub follow: bool,
    /// Remote compose project directory. Falls back to the host's `compose_path`.
    pub project_dir: Option<String>,
}

/// Builds the full local argument vector for one action.
pub type BuildFn = fn(&Host, &SshDefaults, &ActionArgs) -> Result<Vec<String>>;

/// Static description of an action.
pub struct ActionDescriptor {
    pub id: ActionId,
    /// Menu label.
    pub label: &'static str,
    pub description: &'static str,
    /// Tag a host must carry for the action to be offered or built.
    pub required_tag: Option<&'static str>,
    /// Needs an explicit yes before running.
    pub destructive: bool,
    build: BuildFn,
}

impl ActionDescriptor {
    /// Whether the host carries the tag this action requires.
    pub fn is_available_for(&self, host: &Host) -> bool {
        self.required_tag.is_none_or(|tag| host.has_tag(tag))
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("id", &self.id)
            .field("required_tag", &self.required_tag)
            .field("destructive", &self.destructive)
            .finish_non_exhaustive()
    }
}

/// Indexed by `ActionId as usize`.
static REGISTRY: [ActionDescriptor; 16] = [
    ActionDescriptor {
        id: ActionId::Ssh,
        label: "SSH Connect",
        description: "Open an interactive SSH session.",
        required_tag: None,
        destructive: false,
        build: build_ssh,
    },
    ActionDescriptor {
        id: ActionId::Health,
        label: "Health Check",
        description: "Show uptime, disk, memory and load.",
        required_tag: None,
        destructive: false,
        build: build_health,
    },
    ActionDescriptor {
        id: ActionId::DockerPs,
        label: "Docker PS",
        description: "List running containers.",
        required_tag: Some(DOCKER_TAG),
        destructive: false,
        build: build_docker_ps,
    },
    ActionDescriptor {
        id: ActionId::DockerLogs,
        label: "Docker Logs",
        description: "Tail logs of a container.",
        required_tag: Some(DOCKER_TAG),
        destructive: false,
        build: build_docker_logs,
    },
    ActionDescriptor {
        id: ActionId::DockerStats,
        label: "Docker Stats",
        description: "Show container resource usage.",
        required_tag: Some(DOCKER_TAG),
        destructive: false,
        build: build_docker_stats,
    },
    ActionDescriptor {
        id: ActionId::ComposePs,
        label: "Compose PS",
        description: "Show compose service status.",
        required_tag: Some(DOCKER_TAG),
        destructive: false,
        build: build_compose_ps,
    },
    ActionDescriptor {
        id: ActionId::ComposeUp,
        label: "Compose Up",
        description: "Start compose services (detached).",
        required_tag: Some(DOCKER_TAG),
        destructive: false,
        build: build_compose_up,
    },
    ActionDescriptor {
        id: ActionId::ComposeDown,
        label: "Compose Down",
        description: "Stop and remove compose services.",
        required_tag: Some(DOCKER_TAG),
        destructive: true,
        build: build_compose_down,
    },
    ActionDescriptor {
        id: ActionId::ComposeRestart,
        label: "Compose Restart",
        description: "Restart compose services.",
        required_tag: Some(DOCKER_TAG),
        destructive: true,
        build: build_compose_restart,
    },
    ActionDescriptor {
        id: ActionId::ComposeLogs,
        label: "Compose Logs",
        description: "Follow compose logs.",
        required_tag: Some(DOCKER_TAG),
        destructive: false,
        build: build_compose_logs,
    },
    ActionDescriptor {
        id: ActionId::NginxStatus,
        label: "Nginx Status",
        description: "Test nginx configuration and show active connections.",
        required_tag: Some(NGINX_TAG),
        destructive: false,
        build: build_nginx_status,
    },
    ActionDescriptor {
        id: ActionId::NginxReload,
        label: "Nginx Reload",
        description: "Reload nginx configuration.",
        required_tag: Some(NGINX_TAG),
        destructive: true,
        build: build_nginx_reload,
    },
    ActionDescriptor {
        id: ActionId::PostgresStatus,
        label: "PostgreSQL Status",
        description: "Show PostgreSQL connections and database sizes.",
        required_tag: Some(POSTGRES_TAG),
        destructive: false,
        build: build_postgres_status,
    },
    ActionDescriptor {
        id: ActionId::RedisInfo,
        label: "Redis Info",
        description: "Show Redis server, memory and client info.",
        required_tag: Some(REDIS_TAG),
        destructive: false,
        build: build_redis_info,
    },
    ActionDescriptor {
        id: ActionId::CeleryInspect,
        label: "Celery Inspect",
        description: "Show active tasks of the compose `worker` service.",
        required_tag: Some(CELERY_TAG),
        destructive: false,
        build: build_celery_inspect,
    },
    ActionDescriptor {
        id: ActionId::TraefikStatus,
        label: "Traefik Status",
        description: "Show routers from the Traefik API.",
        required_tag: Some(TRAEFIK_TAG),
        destructive: false,
        build: build_traefik_status,
    },
];

/// All registered actions, in menu order.
pub fn registry() -> &'static [ActionDescriptor] {
    &REGISTRY
}

/// Actions whose tag requirement the host satisfies.
pub fn available_for(host: &Host) -> Vec<&'static ActionDescriptor> {
    REGISTRY.iter().filter(|a| a.is_available_for(host)).collect()
}

/// A ready-to-run command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltCommand {
    pub action: ActionId,
    /// Program followed by its arguments. Never passed through a local shell.
    pub argv: Vec<String>,
    pub destructive: bool,
}

impl BuiltCommand {
    /// Shell-quoted rendering of `argv` for display.
    pub fn preview(&self) -> String {
        shell_words::join(&self.argv)
    }
}

/// Build the command for an action given by name.
///
/// # Errors
///
/// - [`OpsError::UnknownAction`] if `action` is not registered
/// - [`OpsError::ActionNotAvailable`] if the host lacks the required tag
/// - [`OpsError::MissingArgument`] if a required argument is absent
pub fn build(
    host: &Host,
    defaults: &SshDefaults,
    action: &str,
    args: &ActionArgs,
) -> Result<BuiltCommand> {
    build_action(host, defaults, action.parse()?, args)
}

/// Build the command for a known action.
pub fn build_action(
    host: &Host,
    defaults: &SshDefaults,
    id: ActionId,
    args: &ActionArgs,
) -> Result<BuiltCommand> {
    let descriptor = id.descriptor();

    if let Some(tag) = descriptor.required_tag {
        if !host.has_tag(tag) {
            return Err(OpsError::ActionNotAvailable {
                action: id.to_string(),
                host: host.qualified_name(),
                tag: tag.to_string(),
            });
        }
    }

    let argv = (descriptor.build)(host, defaults, args)?;
    debug!(action = %id, host = %host.qualified_name(), ?argv, "built command");

    Ok(BuiltCommand {
        action: id,
        argv,
        destructive: descriptor.destructive,
    })
}

fn build_ssh(host: &Host, defaults: &SshDefaults, _args: &ActionArgs) -> Result<Vec<String>> {
    Ok(ssh::build_ssh_command(host, defaults))
}

/// `echo '=== TITLE ==='`
fn section(title: &str) -> RemoteCommand {
    RemoteCommand::new("echo").value(&format!("=== {title} ==="))
}

fn build_health(host: &Host, defaults: &SshDefaults, _args: &ActionArgs) -> Result<Vec<String>> {
    let remote = section("Uptime")
        .and_then(RemoteCommand::new("uptime"))
        .and_then(section("Disk"))
        .and_then(RemoteCommand::new("df").args(&["-h"]))
        .and_then(section("Memory"))
        .and_then(RemoteCommand::new("free").args(&["-m"]))
        .and_then(section("Load"))
        .and_then(RemoteCommand::new("cat").args(&["/proc/loadavg"]));
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

/// `docker <args>`, run as the host's docker user when it has one.
fn docker(host: &Host, args: &[&str]) -> RemoteCommand {
    RemoteCommand::new("docker")
        .args(args)
        .run_as(host.docker_user.as_deref())
}

/// `docker ps` listing only container names, for choosing a `docker-logs` target.
pub fn build_container_listing(host: &Host, defaults: &SshDefaults) -> Vec<String> {
    let remote = docker(host, &["ps", "--format"]).value("{{.Names}}");
    ssh::build_remote_command(host, defaults, remote, false)
}

/// `docker compose ps --services` in the host's compose project, tried before
/// [`build_container_listing`].
pub fn build_service_listing(host: &Host, defaults: &SshDefaults) -> Vec<String> {
    let remote = compose(host, &ActionArgs::default(), &["ps", "--services"]);
    ssh::build_remote_command(host, defaults, remote, false)
}

fn build_docker_ps(host: &Host, defaults: &SshDefaults, _args: &ActionArgs) -> Result<Vec<String>> {
    let remote = docker(host, &["ps", "--format"])
        .value("table {{.Names}}\\t{{.Status}}\\t{{.Ports}}");
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_docker_stats(
    host: &Host,
    defaults: &SshDefaults,
    _args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = docker(host, &["stats", "--no-stream", "--format"])
        .value("table {{.Name}}\\t{{.CPUPerc}}\\t{{.MemUsage}}");
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_docker_logs(host: &Host, defaults: &SshDefaults, args: &ActionArgs) -> Result<Vec<String>> {
    let container = args
        .container
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| OpsError::MissingArgument {
            action: ActionId::DockerLogs.to_string(),
            what: "a container name".into(),
        })?;

    let mut remote = docker(host, &["logs", "--tail", LOG_TAIL]);
    if args.follow {
        remote = remote.args(&["-f"]);
    }
    let remote = remote.value(container);
    Ok(ssh::build_remote_command(host, defaults, remote, args.follow))
}

/// `docker compose [--project-directory DIR] <sub...>`
fn compose(host: &Host, args: &ActionArgs, sub: &[&str]) -> RemoteCommand {
    let mut remote = docker(host, &["compose"]);
    if let Some(dir) = args.project_dir.as_deref().or(host.compose_path.as_deref()) {
        remote = remote.args(&["--project-directory"]).value(dir);
    }
    remote.args(sub)
}

fn build_compose_ps(host: &Host, defaults: &SshDefaults, args: &ActionArgs) -> Result<Vec<String>> {
    let remote = compose(host, args, &["ps"]);
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_compose_up(host: &Host, defaults: &SshDefaults, args: &ActionArgs) -> Result<Vec<String>> {
    let remote = compose(host, args, &["up", "-d"]);
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_compose_down(
    host: &Host,
    defaults: &SshDefaults,
    args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = compose(host, args, &["down"]);
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_compose_restart(
    host: &Host,
    defaults: &SshDefaults,
    args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = compose(host, args, &["restart"]);
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_compose_logs(
    host: &Host,
    defaults: &SshDefaults,
    args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = compose(host, args, &["logs", "--tail", LOG_TAIL, "-f"]);
    Ok(ssh::build_remote_command(host, defaults, remote, true))
}

fn build_nginx_status(
    host: &Host,
    defaults: &SshDefaults,
    _args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = section("Nginx Config")
        .and_then(RemoteCommand::new("sudo").args(&["nginx", "-t", "2>&1"]))
        .and_then(section("Active Connections"))
        .and_then(RemoteCommand::new("curl").args(&[
            "-s",
            "http://localhost/nginx_status",
            "2>/dev/null",
        ]))
        .or_else(RemoteCommand::new("echo").value("stub_status not enabled"));
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_nginx_reload(
    host: &Host,
    defaults: &SshDefaults,
    _args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = RemoteCommand::new("sudo").args(&["nginx", "-s", "reload"]);
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

const PG_CONNECTIONS: &str = "SELECT state, count(*) FROM pg_stat_activity GROUP BY state;";
const PG_SIZES: &str = "SELECT datname, pg_size_pretty(pg_database_size(datname)) \
     FROM pg_database ORDER BY pg_database_size(datname) DESC;";

fn build_postgres_status(
    host: &Host,
    defaults: &SshDefaults,
    _args: &ActionArgs,
) -> Result<Vec<String>> {
    let psql = |sql: &str| {
        RemoteCommand::new("psql")
            .args(&["-c"])
            .value(sql)
            .args(&["2>/dev/null"])
            .run_as(Some("postgres"))
    };
    let remote = section("PostgreSQL Connections")
        .and_then(psql(PG_CONNECTIONS))
        .and_then(section("Database Sizes"))
        .and_then(psql(PG_SIZES));
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_redis_info(host: &Host, defaults: &SshDefaults, _args: &ActionArgs) -> Result<Vec<String>> {
    let info = |part: &str, lines: &str| {
        RemoteCommand::new("redis-cli")
            .args(&["info", part, "2>/dev/null"])
            .pipe(RemoteCommand::new("head").args(&["-n", lines]))
    };
    let remote = section("Redis Info")
        .and_then(info("server", "15"))
        .and_then(section("Memory"))
        .and_then(info("memory", "10"))
        .and_then(section("Clients"))
        .and_then(info("clients", "5"));
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

/// Runs inside the compose project's `worker` service, so it honours
/// `--project-dir` and `compose_path` like the compose actions.
fn build_celery_inspect(
    host: &Host,
    defaults: &SshDefaults,
    args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = compose(
        host,
        args,
        &["exec", "-T", "worker", "celery", "-A", "config", "inspect", "active"],
    )
    .args(&["2>/dev/null"])
    .or_else(RemoteCommand::new("echo").value("Celery inspect not available"));
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

fn build_traefik_status(
    host: &Host,
    defaults: &SshDefaults,
    _args: &ActionArgs,
) -> Result<Vec<String>> {
    let remote = section("Traefik Routers")
        .and_then(RemoteCommand::new("curl").args(&[
            "-s",
            "http://localhost:8080/api/http/routers",
            "2>/dev/null",
        ]))
        .pipe(RemoteCommand::new("python3").args(&["-m", "json.tool", "2>/dev/null"]))
        .or_else(RemoteCommand::new("echo").value("Traefik API not available"));
    Ok(ssh::build_remote_command(host, defaults, remote, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(tags: &[&str]) -> Host {
        Host {
            name: "prod".into(),
            host: "prod.acme.io".into(),
            user: "ubuntu".into(),
            port: 2222,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ssh_alias: None,
            docker_user: None,
            compose_path: None,
            client: "acme".into(),
        }
    }

    fn defaults() -> SshDefaults {
        SshDefaults::default()
    }

    /// Tokens after the `-- DESTINATION` pair.
    fn remote_part(cmd: &BuiltCommand) -> Vec<&str> {
        let sep = cmd.argv.iter().position(|a| a == "--").unwrap();
        cmd.argv[sep + 2..].iter().map(String::as_str).collect()
    }

    #[test]
    fn test_registry_is_indexed_by_id() {
        for (i, id) in ActionId::ALL.iter().enumerate() {
            assert_eq!(registry()[i].id, *id);
            assert_eq!(id.descriptor().id, *id);
        }
    }

    #[test]
    fn test_parse_action_ids() {
        assert_eq!("docker-ps".parse::<ActionId>().unwrap(), ActionId::DockerPs);
        assert_eq!("compose_down".parse::<ActionId>().unwrap(), ActionId::ComposeDown);
        assert!(matches!(
            "reboot".parse::<ActionId>(),
            Err(OpsError::UnknownAction(a)) if a == "reboot"
        ));
    }

    #[test]
    fn test_unknown_action() {
        let err = build(&host(&[]), &defaults(), "nope", &ActionArgs::default()).unwrap_err();
        assert!(matches!(err, OpsError::UnknownAction(_)));
    }

    #[test]
    fn test_docker_ps_requires_docker_tag() {
        let err = build(&host(&["prod"]), &defaults(), "docker-ps", &ActionArgs::default())
            .unwrap_err();
        match err {
            OpsError::ActionNotAvailable { action, host, tag } => {
                assert_eq!(action, "docker-ps");
                assert_eq!(host, "acme:prod");
                assert_eq!(tag, "docker");
            }
            other => panic!("expected ActionNotAvailable, got {:?}", other),
        }

        let cmd = build(&host(&["docker"]), &defaults(), "docker-ps", &ActionArgs::default())
            .unwrap();
        assert_eq!(remote_part(&cmd)[..2], ["docker", "ps"]);
    }

    #[test]
    fn test_every_gated_action_refused_without_tag() {
        let h = host(&[]);
        let args = ActionArgs {
            container: Some("web".into()),
            ..Default::default()
        };
        for descriptor in registry() {
            let result = build_action(&h, &defaults(), descriptor.id, &args);
            assert_eq!(descriptor.required_tag.is_some(), result.is_err(), "{}", descriptor.id);
        }
    }

    #[test]
    fn test_available_for() {
        let plain: Vec<ActionId> = available_for(&host(&[])).iter().map(|a| a.id).collect();
        assert_eq!(plain, vec![ActionId::Ssh, ActionId::Health]);

        let docker = available_for(&host(&["docker"]));
        assert_eq!(docker.len(), 10);
        assert!(docker.iter().all(|a| a.required_tag != Some(NGINX_TAG)));

        let nginx: Vec<ActionId> = available_for(&host(&["nginx"])).iter().map(|a| a.id).collect();
        assert_eq!(
            nginx,
            vec![ActionId::Ssh, ActionId::Health, ActionId::NginxStatus, ActionId::NginxReload]
        );

        let all = ["docker", "nginx", "postgres", "redis", "celery", "traefik"];
        assert_eq!(available_for(&host(&all)).len(), ActionId::ALL.len());
    }

    #[test]
    fn test_destructive_flags() {
        assert!(ActionId::ComposeDown.descriptor().destructive);
        assert!(ActionId::ComposeRestart.descriptor().destructive);
        assert!(!ActionId::ComposePs.descriptor().destructive);
        assert!(!ActionId::DockerPs.descriptor().destructive);
        assert!(ActionId::NginxReload.descriptor().destructive);
        assert!(!ActionId::NginxStatus.descriptor().destructive);

        let destructive: Vec<ActionId> =
            registry().iter().filter(|a| a.destructive).map(|a| a.id).collect();
        assert_eq!(
            destructive,
            vec![ActionId::ComposeDown, ActionId::ComposeRestart, ActionId::NginxReload]
        );

        let cmd = build(&host(&["docker"]), &defaults(), "compose-down", &ActionArgs::default())
            .unwrap();
        assert!(cmd.destructive);
    }

    #[test]
    fn test_address_target_and_port() {
        let cmd = build(&host(&[]), &defaults(), "health", &ActionArgs::default()).unwrap();
        let sep = cmd.argv.iter().position(|a| a == "--").unwrap();
        assert_eq!(cmd.argv[sep + 1], "ubuntu@prod.acme.io");
        assert!(cmd.argv.windows(2).any(|w| w == ["-p", "2222"]));
        assert_eq!(cmd.argv[1..3], ["-o", "ConnectTimeout=10"]);
    }

    #[test]
    fn test_alias_target() {
        let mut h = host(&["docker"]);
        h.ssh_alias = Some("myserver".into());
        let cmd = build(&h, &defaults(), "docker-ps", &ActionArgs::default()).unwrap();
        let sep = cmd.argv.iter().position(|a| a == "--").unwrap();
        assert_eq!(cmd.argv[sep + 1], "myserver");
        assert!(!cmd.argv[..sep].iter().any(|a| a == "-p" || a.contains('@')));
    }

    #[test]
    fn test_docker_user_wraps_docker_actions_only() {
        let mut h = host(&["docker"]);
        h.docker_user = Some("app".into());

        let ps = build(&h, &defaults(), "compose-ps", &ActionArgs::default()).unwrap();
        assert_eq!(remote_part(&ps), ["sudo", "-u", "app", "docker", "compose", "ps"]);

        let health = build(&h, &defaults(), "health", &ActionArgs::default()).unwrap();
        assert!(!remote_part(&health).contains(&"sudo"));
    }

    #[test]
    fn test_docker_logs() {
        let h = host(&["docker"]);
        let err = build(&h, &defaults(), "docker-logs", &ActionArgs::default()).unwrap_err();
        assert!(matches!(err, OpsError::MissingArgument { .. }));

        let args = ActionArgs {
            container: Some("api".into()),
            follow: true,
            project_dir: None,
        };
        let cmd = build(&h, &defaults(), "docker-logs", &args).unwrap();
        assert_eq!(remote_part(&cmd), ["docker", "logs", "--tail", "100", "-f", "api"]);
        assert!(cmd.argv.contains(&"-t".to_string()));
    }

    #[test]
    fn test_compose_project_directory() {
        let mut h = host(&["docker"]);
        h.compose_path = Some("/srv/app".into());

        let cmd = build(&h, &defaults(), "compose-up", &ActionArgs::default()).unwrap();
        assert_eq!(
            remote_part(&cmd),
            ["docker", "compose", "--project-directory", "/srv/app", "up", "-d"]
        );

        let args = ActionArgs {
            project_dir: Some("/opt/other stack".into()),
            ..Default::default()
        };
        let cmd = build(&h, &defaults(), "compose-restart", &args).unwrap();
        assert_eq!(
            remote_part(&cmd),
            ["docker", "compose", "--project-directory", "'/opt/other stack'", "restart"]
        );
    }

    #[test]
    fn test_injection_safe_host_fields() {
        let mut h = host(&["docker"]);
        h.user = "a;rm -rf /".into();
        let cmd = build(&h, &defaults(), "docker-ps", &ActionArgs::default()).unwrap();
        assert!(cmd.argv.contains(&"a;rm -rf /@prod.acme.io".to_string()));
        assert!(!cmd.argv.iter().any(|a| a == "rm" || a == "-rf"));
    }

    #[test]
    fn test_health_bundle() {
        let cmd = build(&host(&[]), &defaults(), "health", &ActionArgs::default()).unwrap();
        let remote = remote_part(&cmd);
        for program in ["uptime", "df", "free", "/proc/loadavg"] {
            assert!(remote.contains(&program), "missing {program}");
        }
    }

    #[test]
    fn test_container_listing() {
        let mut h = host(&["docker"]);
        h.docker_user = Some("app".into());
        let argv = build_container_listing(&h, &defaults());
        let sep = argv.iter().position(|a| a == "--").unwrap();
        assert_eq!(
            argv[sep + 2..sep + 8],
            ["sudo", "-u", "app", "docker", "ps", "--format"]
        );
        assert!(argv.last().unwrap().contains("{{.Names}}"));
    }

    #[test]
    fn test_service_listing_uses_compose_project() {
        let mut h = host(&["docker"]);
        h.docker_user = Some("app".into());
        h.compose_path = Some("/srv/app".into());
        let argv = build_service_listing(&h, &defaults());
        let sep = argv.iter().position(|a| a == "--").unwrap();
        assert_eq!(
            argv[sep + 2..],
            [
                "sudo",
                "-u",
                "app",
                "docker",
                "compose",
                "--project-directory",
                "/srv/app",
                "ps",
                "--services"
            ]
        );

        let bare = build_service_listing(&host(&["docker"]), &defaults());
        assert!(bare.ends_with(&["docker".to_string(), "compose".into(), "ps".into(), "--services".into()]));
    }

    #[test]
    fn test_nginx_reload() {
        let cmd = build(&host(&["nginx"]), &defaults(), "nginx-reload", &ActionArgs::default())
            .unwrap();
        assert!(cmd.destructive);
        assert_eq!(remote_part(&cmd), ["sudo", "nginx", "-s", "reload"]);
    }

    #[test]
    fn test_postgres_queries_run_as_postgres() {
        let cmd = build(&host(&["postgres"]), &defaults(), "postgres-status", &ActionArgs::default())
            .unwrap();
        let remote = remote_part(&cmd);
        let psql_runs = remote
            .windows(4)
            .filter(|w| *w == ["sudo", "-u", "postgres", "psql"])
            .count();
        assert_eq!(psql_runs, 2);
        assert!(remote.iter().any(|t| t.starts_with('\'') && t.contains("pg_stat_activity")));
    }

    #[test]
    fn test_redis_and_traefik_use_shell_operators() {
        let redis = build(&host(&["redis"]), &defaults(), "redis-info", &ActionArgs::default())
            .unwrap();
        assert_eq!(remote_part(&redis).iter().filter(|t| **t == "|").count(), 3);

        let traefik =
            build(&host(&["traefik"]), &defaults(), "traefik-status", &ActionArgs::default())
                .unwrap();
        let remote = remote_part(&traefik);
        assert!(remote.contains(&"http://localhost:8080/api/http/routers"));
        assert!(remote.contains(&"||"));
    }

    #[test]
    fn test_celery_inspect_in_compose_project() {
        let mut h = host(&["celery"]);
        h.compose_path = Some("/srv/app".into());
        let cmd = build(&h, &defaults(), "celery-inspect", &ActionArgs::default()).unwrap();
        assert_eq!(
            remote_part(&cmd)[..8],
            ["docker", "compose", "--project-directory", "/srv/app", "exec", "-T", "worker", "celery"]
        );
    }

    #[test]
    fn test_dash_prefixed_host_fields_never_become_options() {
        let d = defaults();
        let mut by_user = host(&["docker"]);
        by_user.user = "-oProxyCommand=touch /tmp/owned #".into();
        let mut by_alias = host(&["docker"]);
        by_alias.ssh_alias = Some("-oProxyCommand=touch /tmp/owned".into());

        for h in [&by_user, &by_alias] {
            for action in ["ssh", "docker-ps"] {
                let cmd = build(h, &d, action, &ActionArgs::default()).unwrap();
                let sep = cmd.argv.iter().position(|a| a == "--").unwrap();
                let options = &cmd.argv[1..sep];
                let from_defaults = options
                    .iter()
                    .filter(|a| a.starts_with("-o"))
                    .count();
                assert_eq!(from_defaults, 1, "{action}: {:?}", cmd.argv);
                assert_eq!(options[..2], d.options[..]);
                assert!(cmd.argv[sep + 1].starts_with("-oProxyCommand"));
            }
        }
    }

    #[test]
    fn test_preview_quotes_arguments() {
        let cmd = BuiltCommand {
            action: ActionId::Ssh,
            argv: vec!["ssh".into(), "-p".into(), "22".into(), "a b@h".into()],
            destructive: false,
        };
        assert_eq!(cmd.preview(), "ssh -p 22 'a b@h'");
    }
}
