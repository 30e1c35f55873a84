//! SSH argument vector construction.
//!
//! Every command ops-launcher runs goes through the local `ssh` client. This
//! module turns a [`Host`] plus the inventory's SSH defaults into a discrete
//! argument vector, so no local shell ever sees host-controlled strings.
//!
//! `ssh` joins everything after the destination into one string for the
//! remote shell, so remote commands are assembled with [`RemoteCommand`],
//! which keeps fixed template words as-is and shell-quotes anything that came
//! from the inventory or the user.

use crate::config::{Host, SshDefaults};

/// The local SSH client binary.
pub const SSH_PROGRAM: &str = "ssh";

/// Where to connect: either an `~/.ssh/config` alias or explicit user, host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshTarget {
    Alias(String),
    Address {
        user: String,
        host: String,
        port: u16,
    },
}

impl SshTarget {
    /// Compute the target for a host. An alias overrules user, host and port.
    pub fn for_host(host: &Host) -> Self {
        match &host.ssh_alias {
            Some(alias) => SshTarget::Alias(alias.clone()),
            None => SshTarget::Address {
                user: host.user.clone(),
                host: host.host.clone(),
                port: host.port,
            },
        }
    }

    /// Append `[-p PORT] -- DESTINATION` to an argument vector.
    ///
    /// `--` ends option parsing, so a destination starting with `-` can never
    /// be read as an ssh option, and neither can any remote word after it.
    fn push_args(&self, argv: &mut Vec<String>) {
        match self {
            SshTarget::Alias(alias) => {
                argv.push("--".into());
                argv.push(alias.clone());
            }
            SshTarget::Address { user, host, port } => {
                argv.push("-p".into());
                argv.push(port.to_string());
                argv.push("--".into());
                argv.push(format!("{user}@{host}"));
            }
        }
    }
}

/// A command line to be run by the remote shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteCommand {
    tokens: Vec<String>,
}

impl RemoteCommand {
    /// Start a command with a fixed program name.
    pub fn new(program: &str) -> Self {
        Self {
            tokens: vec![program.to_string()],
        }
    }

    /// Append fixed template words verbatim.
    pub fn args(mut self, words: &[&str]) -> Self {
        self.tokens.extend(words.iter().map(|w| w.to_string()));
        self
    }

    /// Append an untrusted value, quoted for the remote shell.
    pub fn value(mut self, value: &str) -> Self {
        self.tokens.push(shell_words::quote(value).into_owned());
        self
    }

    /// Chain another command with `&&`.
    pub fn and_then(mut self, next: RemoteCommand) -> Self {
        self.tokens.push("&&".into());
        self.tokens.extend(next.tokens);
        self
    }

    /// Fall back to another command with `||`.
    pub fn or_else(mut self, fallback: RemoteCommand) -> Self {
        self.tokens.push("||".into());
        self.tokens.extend(fallback.tokens);
        self
    }

    /// Pipe stdout into another command.
    pub fn pipe(mut self, next: RemoteCommand) -> Self {
        self.tokens.push("|".into());
        self.tokens.extend(next.tokens);
        self
    }

    /// Run as another remote user via `sudo -u`, when one is given.
    pub fn run_as(self, user: Option<&str>) -> Self {
        match user {
            Some(user) => {
                let mut wrapped = RemoteCommand::new("sudo").args(&["-u"]).value(user);
                wrapped.tokens.extend(self.tokens);
                wrapped
            }
            None => self,
        }
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}

fn base_argv(defaults: &SshDefaults) -> Vec<String> {
    let mut argv = Vec::with_capacity(defaults.options.len() + 8);
    argv.push(SSH_PROGRAM.to_string());
    argv.extend(defaults.options.iter().cloned());
    argv
}

/// Build an interactive login: `ssh <options...> [-p PORT] -- <target>`.
pub fn build_ssh_command(host: &Host, defaults: &SshDefaults) -> Vec<String> {
    let mut argv = base_argv(defaults);
    SshTarget::for_host(host).push_args(&mut argv);
    argv
}

/// Build `ssh <options...> [-t] [-p PORT] -- <target> <remote tokens...>`.
///
/// `allocate_tty` adds `-t`, needed when the remote command streams until
/// interrupted (e.g. `logs -f`) so that Ctrl-C reaches it.
pub fn build_remote_command(
    host: &Host,
    defaults: &SshDefaults,
    remote: RemoteCommand,
    allocate_tty: bool,
) -> Vec<String> {
    let mut argv = base_argv(defaults);
    if allocate_tty {
        argv.push("-t".into());
    }
    SshTarget::for_host(host).push_args(&mut argv);
    argv.extend(remote.into_tokens());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(user: &str, port: u16, alias: Option<&str>) -> Host {
        Host {
            name: "web".into(),
            host: "prod.acme.io".into(),
            user: user.into(),
            port,
            tags: vec![],
            ssh_alias: alias.map(str::to_string),
            docker_user: None,
            compose_path: None,
            client: "acme".into(),
        }
    }

    #[test]
    fn test_address_target() {
        let argv = build_ssh_command(&host("ubuntu", 2222, None), &SshDefaults::default());
        assert_eq!(
            argv,
            vec!["ssh", "-o", "ConnectTimeout=10", "-p", "2222", "--", "ubuntu@prod.acme.io"]
        );
    }

    #[test]
    fn test_alias_target_has_no_port() {
        let argv = build_ssh_command(&host("ubuntu", 2222, Some("myserver")), &SshDefaults::default());
        assert_eq!(argv.last().map(String::as_str), Some("myserver"));
        assert!(!argv.iter().any(|a| a == "-p"));
        assert!(!argv.iter().any(|a| a.contains('@')));
    }

    #[test]
    fn test_remote_command_layout() {
        let remote = RemoteCommand::new("docker").args(&["ps"]);
        let argv = build_remote_command(&host("root", 22, None), &SshDefaults { options: vec![] }, remote, true);
        assert_eq!(
            argv,
            vec!["ssh", "-t", "-p", "22", "--", "root@prod.acme.io", "docker", "ps"]
        );
    }

    #[test]
    fn test_run_as_wraps_with_sudo() {
        let cmd = RemoteCommand::new("docker").args(&["ps"]).run_as(Some("app"));
        assert_eq!(cmd.into_tokens(), ["sudo", "-u", "app", "docker", "ps"]);
        let plain = RemoteCommand::new("docker").args(&["ps"]).run_as(None);
        assert_eq!(plain.into_tokens(), ["docker", "ps"]);
    }

    #[test]
    fn test_operators_join_commands() {
        let cmd = RemoteCommand::new("redis-cli")
            .args(&["info"])
            .pipe(RemoteCommand::new("head").args(&["-5"]))
            .or_else(RemoteCommand::new("echo").value("no redis"));
        assert_eq!(
            cmd.into_tokens(),
            ["redis-cli", "info", "|", "head", "-5", "||", "echo", "'no redis'"]
        );
    }

    #[test]
    fn test_values_are_quoted_for_remote_shell() {
        let cmd = RemoteCommand::new("docker").args(&["logs"]).value("web; rm -rf /");
        assert_eq!(cmd.into_tokens(), ["docker", "logs", "'web; rm -rf /'"]);
    }

    #[test]
    fn test_metacharacters_in_user_stay_one_token() {
        let argv = build_ssh_command(&host("a;rm -rf /", 22, None), &SshDefaults::default());
        assert_eq!(argv.last().map(String::as_str), Some("a;rm -rf /@prod.acme.io"));
        assert_eq!(argv.len(), 7);
    }

    #[test]
    fn test_dash_destination_follows_option_terminator() {
        let defaults = SshDefaults::default();
        for h in [
            host("-oProxyCommand=touch /tmp/x", 22, None),
            host("root", 22, Some("-oProxyCommand=touch /tmp/x")),
        ] {
            let argv = build_ssh_command(&h, &defaults);
            let sep = argv.iter().position(|a| a == "--").unwrap();
            assert_eq!(sep, argv.len() - 2);
            assert!(argv[sep + 1].starts_with("-oProxyCommand"));
        }
    }
}
