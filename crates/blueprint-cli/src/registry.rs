//! Console command registry
//!
//! Built once at startup from an ordered list of providers and passed by
//! reference to whatever needs the command list (dispatch, help).

use std::collections::BTreeMap;

use blueprint_core::{BlueprintError, Result};

/// What the console does when a command resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleAction {
    Help,
    Generate,
    Status,
    Wait,
    Cancel,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    pub usage: &'static str,
    pub action: ConsoleAction,
}

/// A module contributing console commands
pub trait CommandProvider {
    fn commands(&self) -> Vec<CommandSpec>;
}

/// Which command survives when two providers register the same name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    FirstWins,
    LastWins,
}

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandSpec>,
    aliases: BTreeMap<&'static str, &'static str>,
    duplicates: Vec<&'static str>,
}

impl CommandRegistry {
    /// Register the commands of `providers` in order
    ///
    /// Aliases are derived from the surviving specs; an alias that shadows a
    /// command name or an earlier alias is dropped.
    pub fn build(providers: &[&dyn CommandProvider], policy: DuplicatePolicy) -> Self {
        let mut commands: BTreeMap<&'static str, CommandSpec> = BTreeMap::new();
        let mut duplicates = Vec::new();

        for spec in providers.iter().flat_map(|provider| provider.commands()) {
            if commands.contains_key(spec.name) {
                duplicates.push(spec.name);
                if policy == DuplicatePolicy::FirstWins {
                    continue;
                }
            }
            commands.insert(spec.name, spec);
        }

        let mut aliases = BTreeMap::new();
        for spec in commands.values() {
            for alias in spec.aliases {
                if commands.contains_key(alias) || aliases.contains_key(alias) {
                    continue;
                }
                aliases.insert(*alias, spec.name);
            }
        }

        let registry = Self {
            commands,
            aliases,
            duplicates,
        };
        if !registry.duplicates().is_empty() {
            tracing::warn!(
                component = module_path!(),
                op = "build_registry",
                duplicates = ?registry.duplicates(),
                policy = ?policy,
                "duplicate console commands"
            );
        }
        registry
    }

    /// Look up a command by name or alias, case-insensitively
    ///
    /// # Errors
    ///
    /// `UnknownCommand` when nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&CommandSpec> {
        let lowered = name.trim().to_lowercase();
        let canonical = self
            .aliases
            .get(lowered.as_str())
            .copied()
            .unwrap_or(lowered.as_str());

        self.commands
            .get(canonical)
            .ok_or_else(|| BlueprintError::UnknownCommand {
                name: name.trim().to_string(),
            })
    }

    /// Commands in name order
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Names registered more than once, in registration order
    pub fn duplicates(&self) -> &[&'static str] {
        &self.duplicates
    }
}

/// Session commands every console has
pub struct SessionCommands;

impl CommandProvider for SessionCommands {
    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec {
                name: "help",
                aliases: &["?", "h"],
                summary: "Show available commands",
                usage: "help [command]",
                action: ConsoleAction::Help,
            },
            CommandSpec {
                name: "exit",
                aliases: &["quit", "q"],
                summary: "Leave the console",
                usage: "exit",
                action: ConsoleAction::Exit,
            },
        ]
    }
}

/// Blueprint generation commands
pub struct BlueprintCommands;

impl CommandProvider for BlueprintCommands {
    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec {
                name: "blueprint",
                aliases: &["bp", "generate"],
                summary: "Generate the engagement blueprint",
                usage: "blueprint <engagement-id> [--tone <tone>] [--win <text>]... [--risk <text>]... [--roadmap <text>]...",
                action: ConsoleAction::Generate,
            },
            CommandSpec {
                name: "status",
                aliases: &["st"],
                summary: "Show the current generation status",
                usage: "status",
                action: ConsoleAction::Status,
            },
            CommandSpec {
                name: "wait",
                aliases: &[],
                summary: "Follow the current generation until it finishes",
                usage: "wait",
                action: ConsoleAction::Wait,
            },
            CommandSpec {
                name: "cancel",
                aliases: &["stop"],
                summary: "Stop watching the current generation",
                usage: "cancel",
                action: ConsoleAction::Cancel,
            },
        ]
    }
}

/// Registry of the stock console
pub fn default_registry() -> CommandRegistry {
    CommandRegistry::build(
        &[&SessionCommands, &BlueprintCommands],
        DuplicatePolicy::default(),
    )
}

/// Help text for the whole registry, or for one command
///
/// # Errors
///
/// `UnknownCommand` when `topic` does not resolve.
pub fn render_help(registry: &CommandRegistry, topic: Option<&str>) -> Result<String> {
    if let Some(topic) = topic {
        let spec = registry.resolve(topic)?;
        let mut out = format!("{}\n  {}\n  Usage: {}\n", spec.name, spec.summary, spec.usage);
        if !spec.aliases.is_empty() {
            out.push_str(&format!("  Aliases: {}\n", spec.aliases.join(", ")));
        }
        return Ok(out);
    }

    let width = registry.iter().map(|spec| spec.name.len()).max().unwrap_or(0);
    let mut out = String::from("Available commands:\n");
    for spec in registry.iter() {
        out.push_str(&format!("  {:width$}  {}\n", spec.name, spec.summary, width = width));
    }
    out.push_str("Type 'help <command>' for usage.\n");
    Ok(out)
}
