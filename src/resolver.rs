//! Host token resolution.
//!
//! Turns a user-supplied token into exactly one [`Host`], or explains why it
//! cannot. Matching is exact and case-sensitive; fuzzy filtering belongs to
//! the interactive menu and to [`search`].
//!
//! # Token Syntax
//!
//! - `name` - A host name that must be unique across all clients
//! - `client:name` - A host name within one client
//!
//! # Example
//!
//! ```yaml
//! clients:
//!   acme:
//!     hosts: [{ name: web, host: web.acme.io }]
//!   globex:
//!     hosts: [{ name: web, host: web.globex.io }]
//! ```
//!
//! Here `web` is ambiguous, while `acme:web` and `globex:web` each resolve.

use crate::config::{Host, Inventory};
use crate::error::{OpsError, Result};
use tracing::debug;

/// A parsed host token.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRef<'a> {
    /// Bare host name, searched across every client.
    Bare(&'a str),
    /// `client:name`
    Qualified {
        /// The client key.
        client: &'a str,
        /// The host name within the client.
        name: &'a str,
    },
}

/// Parse a token into a [`HostRef`].
///
/// The token is split on the first `:`, so client keys can never contain one.
pub fn parse_ref(token: &str) -> HostRef<'_> {
    match token.split_once(':') {
        Some((client, name)) => HostRef::Qualified { client, name },
        None => HostRef::Bare(token),
    }
}

/// Resolve a host token against the inventory.
///
/// # Errors
///
/// - [`OpsError::UnknownClient`] if a qualified token names a missing client
/// - [`OpsError::UnknownHost`] if no host matches
/// - [`OpsError::AmbiguousHost`] if a bare name exists under several clients
pub fn resolve<'a>(inventory: &'a Inventory, token: &str) -> Result<&'a Host> {
    let host = match parse_ref(token) {
        HostRef::Qualified { client, name } => {
            let client = inventory
                .get_client(client)
                .ok_or_else(|| OpsError::UnknownClient(client.to_string()))?;
            client
                .get_host(name)
                .ok_or_else(|| OpsError::UnknownHost(token.to_string()))?
        }
        HostRef::Bare(name) => {
            let matches: Vec<&Host> = inventory.hosts().filter(|h| h.name == name).collect();
            match matches.as_slice() {
                [] => return Err(OpsError::UnknownHost(name.to_string())),
                [host] => *host,
                _ => {
                    return Err(OpsError::AmbiguousHost {
                        name: name.to_string(),
                        candidates: matches.iter().map(|h| h.qualified_name()).collect(),
                    });
                }
            }
        }
    };

    debug!(token, resolved = %host.qualified_name(), "resolved host");
    Ok(host)
}

/// Case-insensitive substring search over host name, address, client and tags.
///
/// Used for listing, never for resolution.
pub fn search<'a>(inventory: &'a Inventory, query: &str) -> Vec<&'a Host> {
    let q = query.to_lowercase();
    inventory
        .hosts()
        .filter(|h| {
            let haystack = format!("{} {} {} {}", h.name, h.host, h.client, h.tags.join(" "));
            haystack.to_lowercase().contains(&q)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::from_yaml(
            r#"
clients:
  a:
    hosts:
      - { name: x, host: x.a.io }
      - { name: only-a, host: only.a.io, tags: [django] }
  b:
    hosts:
      - { name: x, host: x.b.io }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_ref() {
        assert_eq!(parse_ref("web"), HostRef::Bare("web"));
        assert_eq!(
            parse_ref("acme:web"),
            HostRef::Qualified {
                client: "acme",
                name: "web"
            }
        );
        assert_eq!(
            parse_ref("acme:web:1"),
            HostRef::Qualified {
                client: "acme",
                name: "web:1"
            }
        );
    }

    #[test]
    fn test_resolve_unique_bare_name() {
        let inv = inventory();
        let host = resolve(&inv, "only-a").unwrap();
        assert_eq!(host.host, "only.a.io");
    }

    #[test]
    fn test_resolve_ambiguous_lists_qualified_forms() {
        let inv = inventory();
        match resolve(&inv, "x") {
            Err(OpsError::AmbiguousHost { name, candidates }) => {
                assert_eq!(name, "x");
                assert_eq!(candidates, vec!["a:x", "b:x"]);
            }
            other => panic!("expected AmbiguousHost, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_qualified() {
        let inv = inventory();
        let host = resolve(&inv, "a:x").unwrap();
        assert_eq!(host.client, "a");
        assert_eq!(host.host, "x.a.io");
    }

    #[test]
    fn test_unknown_client_does_not_fall_back() {
        let inv = inventory();
        assert!(matches!(
            resolve(&inv, "nope:x"),
            Err(OpsError::UnknownClient(c)) if c == "nope"
        ));
    }

    #[test]
    fn test_unknown_host() {
        let inv = inventory();
        assert!(matches!(resolve(&inv, "zzz"), Err(OpsError::UnknownHost(_))));
        assert!(matches!(resolve(&inv, "b:only-a"), Err(OpsError::UnknownHost(_))));
    }

    #[test]
    fn test_resolution_is_case_sensitive() {
        let inv = inventory();
        assert!(matches!(resolve(&inv, "ONLY-A"), Err(OpsError::UnknownHost(_))));
    }

    #[test]
    fn test_search() {
        let inv = inventory();
        assert_eq!(search(&inv, "DJANGO").len(), 1);
        assert_eq!(search(&inv, "x.").len(), 2);
        assert_eq!(search(&inv, "b").len(), 1);
        assert!(search(&inv, "zzzz").is_empty());
    }
}
