//! # ops-launcher
//!
//! A launcher for SSH, Docker and Compose operations across a fleet of hosts
//! grouped by client.
//!
//! Hosts are declared once in a YAML inventory. The `ops` binary resolves a
//! short host name to exactly one host, builds the command line for the chosen
//! action and runs it through the local `ssh` client, either from an
//! interactive menu or from direct subcommands.
//!
//! ## Features
//!
//! - **Clients**: Named host groups; `client:host` disambiguates duplicate names
//! - **Tag gating**: Docker, Compose, nginx, Postgres, Redis, Celery and Traefik actions only exist for hosts with the matching tag
//! - **Safe command lines**: Commands are argument vectors, never local shell strings
//! - **Confirmation**: Destructive actions ask before running
//!
//! ## Quick Example
//!
//! ```yaml
//! # ~/.config/ops-launcher/hosts.yaml
//! version: 1
//! defaults:
//!   ssh_options: ["-o", "ConnectTimeout=10"]
//! clients:
//!   acme:
//!     description: Acme Corp
//!     hosts:
//!       - name: web
//!         host: web.acme.io
//!         user: deploy
//!         tags: [docker, prod]
//! ```
//!
//! ```bash
//! ops docker ps web
//! ops compose restart acme:web --project-dir /srv/app
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into these modules:
//!
//! - [`config`]: Inventory types and validation
//! - [`loader`]: Inventory file discovery and loading
//! - [`resolver`]: Host token resolution (`name`, `client:name`)
//! - [`action`]: Action registry and command builder
//! - [`ssh`]: SSH argument vector construction
//! - [`executor`]: Preview, confirmation and child process execution
//! - [`history`]: Recently used hosts
//! - [`menu`]: Interactive menu
//! - [`cli`]: Command-line argument parsing with clap
//! - [`error`]: Error types

pub mod action;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod loader;
pub mod menu;
pub mod resolver;
pub mod ssh;

pub use action::{ActionArgs, ActionId, BuiltCommand};
pub use config::{Client, Host, Inventory, SshDefaults};
pub use error::{ConfigError, ConfigIssue, OpsError, Result};
