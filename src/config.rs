//! Inventory types for ops-launcher.
//!
//! This module defines the typed host inventory and turns a YAML document into
//! it. Validation walks the whole document and collects every field-level
//! problem into a single [`ConfigError`], so a broken inventory is reported in
//! one pass and never partially applied.
//!
//! # Config Format
//!
//! ```yaml
//! version: 1
//! defaults:
//!   ssh_options: ["-o", "ConnectTimeout=10"]
//! clients:
//!   acme:
//!     description: "Acme Corp"
//!     hosts:
//!       - name: prod
//!         host: prod.acme.io
//!         user: deploy
//!         port: 2222
//!         tags: [docker, prod]
//!         docker_user: app
//!       - name: bastion
//!         host: 10.0.0.1
//!         ssh_alias: acme-bastion
//! ```

use crate::error::{ConfigError, ConfigIssue, OpsError};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// The only inventory format version this build understands.
pub const SUPPORTED_VERSION: u64 = 1;

/// Login user when a host does not name one.
pub const DEFAULT_USER: &str = "root";

/// SSH port when a host does not name one.
pub const DEFAULT_PORT: u16 = 22;

/// A single managed host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    /// Short name, unique within its client.
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Labels gating which actions apply to this host. Deduplicated, document order.
    pub tags: Vec<String>,
    /// `~/.ssh/config` alias. When set it replaces user, host and port for connecting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_alias: Option<String>,
    /// Remote account that Docker and Compose commands run as via `sudo -u`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_user: Option<String>,
    /// Remote compose project directory used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose_path: Option<String>,
    /// Key of the owning client.
    pub client: String,
}

impl Host {
    /// The `client:name` form that always resolves to exactly this host.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.client, self.name)
    }

    /// Whether the host carries `tag` (exact, case-sensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Destination shown to the user: the alias, or `user@host`.
    pub fn ssh_target(&self) -> String {
        match &self.ssh_alias {
            Some(alias) => alias.clone(),
            None => format!("{}@{}", self.user, self.host),
        }
    }
}

/// A named group of hosts, such as a customer or an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub key: String,
    pub description: String,
    pub hosts: Vec<Host>,
}

impl Client {
    /// Look up a host of this client by exact name.
    pub fn get_host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }
}

/// SSH options passed to every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshDefaults {
    pub options: Vec<String>,
}

impl Default for SshDefaults {
    fn default() -> Self {
        Self {
            options: vec!["-o".into(), "ConnectTimeout=10".into()],
        }
    }
}

/// The validated host inventory. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub version: u64,
    pub defaults: SshDefaults,
    /// Clients in document order.
    pub clients: Vec<Client>,
}

impl Inventory {
    /// Parse and validate an inventory from YAML text.
    ///
    /// # Errors
    ///
    /// - [`OpsError::Parse`] if the text is not valid YAML
    /// - [`OpsError::Config`] listing every validation problem
    pub fn from_yaml(yaml: &str) -> Result<Self, OpsError> {
        let raw: Value = serde_yaml::from_str(yaml)?;
        Ok(Self::from_value(&raw)?)
    }

    /// Validate an already-parsed YAML document.
    pub fn from_value(raw: &Value) -> Result<Self, ConfigError> {
        let mut issues = Vec::new();

        let Some(root) = raw.as_mapping() else {
            issues.push(ConfigIssue::new("<root>", "must be a mapping"));
            return Err(ConfigError { issues });
        };

        let version = match root.get("version") {
            None => SUPPORTED_VERSION,
            Some(v) => match v.as_u64() {
                Some(SUPPORTED_VERSION) => SUPPORTED_VERSION,
                Some(other) => {
                    issues.push(ConfigIssue::new(
                        "version",
                        format!("unsupported version {other}, expected {SUPPORTED_VERSION}"),
                    ));
                    other
                }
                None => {
                    issues.push(ConfigIssue::new("version", "must be an integer"));
                    SUPPORTED_VERSION
                }
            },
        };

        let defaults = parse_defaults(root.get("defaults"), &mut issues);

        let clients = match root.get("clients") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(map)) => parse_clients(map, &mut issues),
            Some(_) => {
                issues.push(ConfigIssue::new(
                    "clients",
                    "must be a mapping of client key to {description, hosts}",
                ));
                Vec::new()
            }
        };

        if !issues.is_empty() {
            return Err(ConfigError { issues });
        }

        debug!(clients = clients.len(), "inventory validated");
        Ok(Inventory {
            version,
            defaults,
            clients,
        })
    }

    /// Look up a client by key.
    pub fn get_client(&self, key: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.key == key)
    }

    /// All hosts, client by client, in document order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.clients.iter().flat_map(|c| c.hosts.iter())
    }

    pub fn host_count(&self) -> usize {
        self.clients.iter().map(|c| c.hosts.len()).sum()
    }
}

fn parse_defaults(value: Option<&Value>, issues: &mut Vec<ConfigIssue>) -> SshDefaults {
    let map = match value {
        None | Some(Value::Null) => return SshDefaults::default(),
        Some(Value::Mapping(map)) => map,
        Some(_) => {
            issues.push(ConfigIssue::new("defaults", "must be a mapping"));
            return SshDefaults::default();
        }
    };

    match map.get("ssh_options") {
        None | Some(Value::Null) => SshDefaults::default(),
        Some(v) => match string_list(v) {
            Some(options) => SshDefaults { options },
            None => {
                issues.push(ConfigIssue::new(
                    "defaults.ssh_options",
                    "must be a list of strings",
                ));
                SshDefaults::default()
            }
        },
    }
}

fn parse_clients(map: &Mapping, issues: &mut Vec<ConfigIssue>) -> Vec<Client> {
    let mut clients = Vec::with_capacity(map.len());

    for (key, value) in map {
        let Some(key) = key.as_str() else {
            issues.push(ConfigIssue::new(
                format!("clients.{}", scalar_repr(key)),
                "client key must be a string",
            ));
            continue;
        };
        let path = format!("clients.{key}");

        if key.is_empty() || key.contains(':') {
            issues.push(ConfigIssue::new(
                &path,
                "client key must be non-empty and must not contain ':'",
            ));
        }

        let body = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(m) => m.clone(),
            _ => {
                issues.push(ConfigIssue::new(&path, "must be a mapping"));
                continue;
            }
        };

        let description = match body.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                issues.push(ConfigIssue::new(
                    format!("{path}.description"),
                    "must be a string",
                ));
                String::new()
            }
        };

        let hosts = match body.get("hosts") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(entries)) => parse_hosts(key, &path, entries, issues),
            Some(_) => {
                issues.push(ConfigIssue::new(format!("{path}.hosts"), "must be a list"));
                Vec::new()
            }
        };

        clients.push(Client {
            key: key.to_string(),
            description,
            hosts,
        });
    }

    clients
}

fn parse_hosts(
    client: &str,
    client_path: &str,
    entries: &[Value],
    issues: &mut Vec<ConfigIssue>,
) -> Vec<Host> {
    let mut hosts: Vec<Host> = Vec::with_capacity(entries.len());
    // Names seen so far, including entries that failed validation.
    let mut seen = std::collections::HashSet::new();

    for (i, entry) in entries.iter().enumerate() {
        let path = format!("{client_path}.hosts[{i}]");
        let Some(map) = entry.as_mapping() else {
            issues.push(ConfigIssue::new(&path, "host entry must be a mapping"));
            continue;
        };

        let mut duplicate = false;
        if let Some(name) = map.get("name").and_then(Value::as_str) {
            if !seen.insert(name) {
                issues.push(ConfigIssue::new(
                    format!("{path}.name"),
                    format!("duplicate host name '{name}' in client '{client}'"),
                ));
                duplicate = true;
            }
        }

        if let Some(host) = parse_host(client, &path, map, issues) {
            if !duplicate {
                hosts.push(host);
            }
        }
    }

    hosts
}

/// Parse one host entry. Returns `None` if any of its fields were invalid.
fn parse_host(
    client: &str,
    path: &str,
    map: &Mapping,
    issues: &mut Vec<ConfigIssue>,
) -> Option<Host> {
    let before = issues.len();

    let name = required_string(map, "name", path, issues);
    let host = required_string(map, "host", path, issues);
    let user = optional_string(map, "user", path, issues).unwrap_or_else(|| DEFAULT_USER.into());

    let port = match map.get("port") {
        None | Some(Value::Null) => DEFAULT_PORT,
        Some(v) => match v.as_u64().and_then(|p| u16::try_from(p).ok()) {
            Some(p) if p > 0 => p,
            _ => {
                issues.push(ConfigIssue::new(
                    format!("{path}.port"),
                    format!("must be an integer between 1 and 65535, got {}", scalar_repr(v)),
                ));
                DEFAULT_PORT
            }
        },
    };

    let tags = match map.get("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => match string_list(v) {
            Some(mut tags) => {
                let mut seen = std::collections::HashSet::new();
                tags.retain(|t| seen.insert(t.clone()));
                tags
            }
            None => {
                issues.push(ConfigIssue::new(
                    format!("{path}.tags"),
                    "must be a list of strings",
                ));
                Vec::new()
            }
        },
    };

    let ssh_alias = optional_string(map, "ssh_alias", path, issues);
    let docker_user = optional_string(map, "docker_user", path, issues);
    let compose_path = optional_string(map, "compose_path", path, issues);

    // These end up as ssh or sudo arguments.
    for (field, value) in [
        ("user", Some(&user)),
        ("host", host.as_ref()),
        ("ssh_alias", ssh_alias.as_ref()),
        ("docker_user", docker_user.as_ref()),
    ] {
        if value.is_some_and(|v| v.starts_with('-')) {
            issues.push(ConfigIssue::new(
                format!("{path}.{field}"),
                "must not start with '-'",
            ));
        }
    }

    if issues.len() > before {
        return None;
    }

    Some(Host {
        name: name?,
        host: host?,
        user,
        port,
        tags,
        ssh_alias,
        docker_user,
        compose_path,
        client: client.to_string(),
    })
}

fn required_string(
    map: &Mapping,
    field: &str,
    path: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => {
            issues.push(ConfigIssue::new(
                format!("{path}.{field}"),
                "missing required field",
            ));
            None
        }
        Some(_) => optional_string(map, field, path, issues),
    }
}

fn optional_string(
    map: &Mapping,
    field: &str,
    path: &str,
    issues: &mut Vec<ConfigIssue>,
) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(_) => {
            issues.push(ConfigIssue::new(
                format!("{path}.{field}"),
                "must be a non-empty string",
            ));
            None
        }
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_sequence()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn scalar_repr(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".into(),
        _ => "<non-scalar>".into(),
    }
}
