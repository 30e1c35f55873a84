//! Interactive menu.
//!
//! Guided flow: client (or a recent host) → host → action → run → back to the
//! action menu for the same host. Every list is a dialoguer fuzzy select, so
//! typing filters it; Esc goes back one level and quits at the top.
//!
//! Menus only offer actions the host's tags allow, but the chosen action still
//! goes through [`action::build_action`], which enforces the same gating.

use crate::action::{self, ActionArgs, ActionDescriptor, ActionId};
use crate::config::{Client, Host, Inventory};
use crate::error::Result;
use crate::executor::{self, Outcome, TerminalPrompter};
use crate::history::RecentHosts;
use crate::resolver;
use dialoguer::console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{FuzzySelect, Input};
use std::path::Path;
use tracing::debug;

/// Top-level menu entry.
enum Entry<'a> {
    Recent(&'a Host),
    Client(&'a Client),
}

/// Interactive session state.
pub struct Menu<'a> {
    inventory: &'a Inventory,
    history: &'a mut RecentHosts,
    prompter: TerminalPrompter,
    theme: ColorfulTheme,
}

impl<'a> Menu<'a> {
    pub fn new(inventory: &'a Inventory, history: &'a mut RecentHosts) -> Self {
        Self {
            inventory,
            history,
            prompter: TerminalPrompter,
            theme: ColorfulTheme::default(),
        }
    }

    /// Run until the user quits.
    pub fn run(&mut self, config_path: &Path) -> Result<()> {
        print_welcome(config_path, self.inventory);

        loop {
            let Some(entry) = self.select_entry()? else {
                println!("{}", style("Goodbye!").yellow());
                return Ok(());
            };

            match entry {
                Entry::Recent(host) => self.host_loop(host)?,
                Entry::Client(client) => {
                    while let Some(host) = self.select_host(client)? {
                        self.host_loop(host)?;
                    }
                }
            }
        }
    }

    fn select_entry(&self) -> Result<Option<Entry<'a>>> {
        let inventory = self.inventory;
        let mut entries = Vec::new();
        let mut labels = Vec::new();

        for token in self.history.entries() {
            // Hosts removed from the inventory since they were used are skipped.
            if let Ok(host) = resolver::resolve(inventory, token) {
                labels.push(format!("★ {}", host_label(host, true)));
                entries.push(Entry::Recent(host));
            }
        }
        for client in &inventory.clients {
            labels.push(client_label(client));
            entries.push(Entry::Client(client));
        }

        let choice = FuzzySelect::with_theme(&self.theme)
            .with_prompt("Select client or recent host (Esc to quit)")
            .items(&labels)
            .default(0)
            .interact_opt()?;

        Ok(choice.and_then(|i| entries.into_iter().nth(i)))
    }

    fn select_host(&self, client: &'a Client) -> Result<Option<&'a Host>> {
        if client.hosts.is_empty() {
            println!("{}", style(format!("Client '{}' has no hosts.", client.key)).red());
            return Ok(None);
        }

        let labels: Vec<String> = client.hosts.iter().map(|h| host_label(h, false)).collect();
        let choice = FuzzySelect::with_theme(&self.theme)
            .with_prompt(format!("Host in {} (Esc to go back)", client.key))
            .items(&labels)
            .default(0)
            .interact_opt()?;

        Ok(choice.and_then(|i| client.hosts.get(i)))
    }

    /// Show the action menu for one host until the user goes back.
    fn host_loop(&mut self, host: &Host) -> Result<()> {
        let actions = action::available_for(host);

        loop {
            let labels: Vec<String> = actions.iter().map(|a| action_label(a)).collect();
            let choice = FuzzySelect::with_theme(&self.theme)
                .with_prompt(format!("Action on {} (Esc to go back)", host.qualified_name()))
                .items(&labels)
                .default(0)
                .interact_opt()?;

            let Some(descriptor) = choice.and_then(|i| actions.get(i)) else {
                return Ok(());
            };
            self.run_action(host, descriptor)?;
        }
    }

    fn run_action(&mut self, host: &Host, descriptor: &ActionDescriptor) -> Result<()> {
        let mut args = ActionArgs::default();

        if descriptor.id == ActionId::DockerLogs {
            match self.pick_container(host)? {
                Some(container) => {
                    args.container = Some(container);
                    args.follow = true;
                }
                None => {
                    println!("{}", style("No container selected, cancelled.").dim());
                    return Ok(());
                }
            }
        }

        let cmd = match action::build_action(host, &self.inventory.defaults, descriptor.id, &args) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{} {}", style("Error:").red().bold(), e);
                return Ok(());
            }
        };

        let qualified = host.qualified_name();
        self.history.record(&qualified);

        match executor::launch(&cmd, &qualified, &self.prompter)? {
            Outcome::Cancelled => println!("{}", style("Cancelled.").dim()),
            Outcome::Exited(0) => {
                println!("{} {} completed.", style("✓").green().bold(), descriptor.label);
            }
            Outcome::Exited(code) => {
                eprintln!(
                    "{} {} exited with code {}.",
                    style("✗").red().bold(),
                    descriptor.label,
                    code
                );
            }
        }
        Ok(())
    }

    /// Let the user choose a compose service or running container.
    ///
    /// Compose services in the host's project are listed first, running
    /// container names otherwise. Falls back to typing a name when discovery
    /// finds nothing.
    fn pick_container(&self, host: &Host) -> Result<Option<String>> {
        let defaults = &self.inventory.defaults;

        println!("{}", style("  Discovering compose services...").dim());
        let mut names = discover(&action::build_service_listing(host, defaults));
        if names.is_empty() {
            println!("{}", style("  Discovering running containers...").dim());
            names = discover(&action::build_container_listing(host, defaults));
        }

        if names.is_empty() {
            let manual: String = Input::with_theme(&self.theme)
                .with_prompt("No services or containers found. Container name (empty to cancel)")
                .allow_empty(true)
                .interact_text()?;
            let manual = manual.trim().to_string();
            return Ok((!manual.is_empty()).then_some(manual));
        }

        let choice = FuzzySelect::with_theme(&self.theme)
            .with_prompt("Service / container (Esc to cancel)")
            .items(&names)
            .default(0)
            .interact_opt()?;
        Ok(choice.and_then(|i| names.get(i).cloned()))
    }
}

/// Run a listing command and collect its non-empty output lines.
///
/// Any failure just yields an empty list.
fn discover(argv: &[String]) -> Vec<String> {
    match executor::capture(argv) {
        Ok((0, out)) => parse_listing(&out),
        Ok((code, _)) => {
            debug!(code, "discovery failed");
            Vec::new()
        }
        Err(e) => {
            debug!(error = %e, "discovery failed");
            Vec::new()
        }
    }
}

fn parse_listing(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run the interactive menu, saving history on the way out.
pub fn run(inventory: &Inventory, history: &mut RecentHosts, config_path: &Path) -> Result<()> {
    let result = Menu::new(inventory, history).run(config_path);
    if let Err(e) = history.save() {
        tracing::warn!(error = %e, "could not save recent hosts");
    }
    result
}

fn print_welcome(config_path: &Path, inventory: &Inventory) {
    println!("{}", style("⚡ Ops Launcher").magenta().bold());
    println!("  {} {}", style("Config: ").bold(), config_path.display());
    println!("  {} {}", style("Clients:").bold(), inventory.clients.len());
    println!("  {} {}", style("Hosts:  ").bold(), inventory.host_count());
    println!("  {}\n", style("Type to filter, Enter to select, Esc to go back.").dim());
}

fn client_label(client: &Client) -> String {
    let mut label = format!("{}  ({} hosts)", client.key, client.hosts.len());
    if !client.description.is_empty() {
        label.push_str(" - ");
        label.push_str(&client.description);
    }
    label
}

fn host_label(host: &Host, qualified: bool) -> String {
    let name = if qualified {
        host.qualified_name()
    } else {
        host.name.clone()
    };
    let tags = if host.tags.is_empty() {
        "no tags".to_string()
    } else {
        host.tags.join(", ")
    };
    format!("{}  {}  [{}]", name, host.ssh_target(), tags)
}

fn action_label(action: &ActionDescriptor) -> String {
    let mark = if action.destructive { " ⚠" } else { "" };
    format!("{}{}  - {}", action.label, mark, action.description)
}
