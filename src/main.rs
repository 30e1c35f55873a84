//! ops CLI entry point.
//!
//! With no subcommand this starts the interactive menu; otherwise it resolves
//! the host, builds the action's command and runs it, exiting with the child's
//! own status.

use clap::Parser;
use dialoguer::console::style;
use ops_launcher::cli::{Cli, Command};
use ops_launcher::config::Host;
use ops_launcher::error::{Result, exit_code};
use ops_launcher::executor::{self, TerminalPrompter};
use ops_launcher::history::{self, RecentHosts};
use ops_launcher::{action, loader, menu, resolver};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application logic. Returns the process exit code.
fn run(cli: Cli) -> Result<i32> {
    let config_path = loader::resolve_config_path(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        let inventory = loader::load_inventory(&config_path)?;
        let mut recent = RecentHosts::load(loader::config_dir()?.join(history::HISTORY_FILE));
        menu::run(&inventory, &mut recent, &config_path)?;
        return Ok(exit_code::SUCCESS);
    };

    match &command {
        Command::Config => return Ok(print_config_status(&config_path)),
        Command::Ls { filter, json } => {
            let inventory = loader::load_inventory(&config_path)?;
            let hosts: Vec<&Host> = match filter.as_deref() {
                Some(query) => resolver::search(&inventory, query),
                None => inventory.hosts().collect(),
            };
            if *json {
                println!("{}", serde_json::to_string_pretty(&hosts)?);
            } else {
                print_hosts(&hosts, filter.as_deref());
            }
            return Ok(exit_code::SUCCESS);
        }
        _ => {}
    }

    let Some(invocation) = command.invocation() else {
        return Ok(exit_code::SUCCESS);
    };

    let inventory = loader::load_inventory(&config_path)?;
    let host = resolver::resolve(&inventory, &invocation.host)?;
    let cmd = action::build_action(host, &inventory.defaults, invocation.action, &invocation.args)?;

    let outcome = executor::launch(&cmd, &host.qualified_name(), &TerminalPrompter)?;
    Ok(outcome.exit_code())
}

/// `ops config`: show where the inventory comes from and validate it.
fn print_config_status(path: &Path) -> i32 {
    println!("{} {}", style("Config path:").bold(), path.display());
    match std::env::var(loader::ENV_CONFIG_VAR) {
        Ok(value) => println!("{} {}={}", style("Env var:    ").bold(), loader::ENV_CONFIG_VAR, value),
        Err(_) => println!("{} {}", style("Env var:    ").bold(), style("not set").dim()),
    }

    match loader::validate(path) {
        Ok(summary) => {
            println!("{} {}", style("✓").green(), summary);
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            e.exit_code()
        }
    }
}

/// `ops ls`: one row per host, grouped by client.
fn print_hosts(hosts: &[&Host], filter: Option<&str>) {
    if hosts.is_empty() {
        match filter {
            Some(query) => println!("No hosts matching '{}'.", query),
            None => println!("No hosts configured."),
        }
        return;
    }

    let rows: Vec<[String; 5]> = hosts
        .iter()
        .map(|h| {
            [
                h.client.clone(),
                h.name.clone(),
                h.ssh_target(),
                h.port.to_string(),
                if h.tags.is_empty() {
                    "-".to_string()
                } else {
                    h.tags.join(", ")
                },
            ]
        })
        .collect();

    let header = ["CLIENT", "HOST", "SSH TARGET", "PORT", "TAGS"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 5]| -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", style(format_row(header)).bold());
    let mut previous_client: Option<&str> = None;
    for row in &rows {
        let same_client = previous_client == Some(row[0].as_str());
        let client_cell = if same_client { "" } else { row[0].as_str() };
        println!(
            "{}",
            format_row([client_cell, &row[1], &row[2], &row[3], &row[4]])
        );
        previous_client = Some(row[0].as_str());
    }
}
