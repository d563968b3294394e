//! Command registry for the operator console
//!
//! Commands are short prefixes (`e`, `i=2`, `turn mode 1`); the registry
//! matches the longest prefix followed by `=`, a space or the end of input.

pub mod bench;
pub mod catalog;
pub mod general;
pub mod playback;

use crate::controller::Controller;
use crate::hardware::SimulatedGpio;
use std::str::FromStr;
use std::sync::Arc;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, keep reading
    Success,
    /// Command executed, show this message
    Message(String),
    /// Shut everything down
    Exit,
    /// Close the console, keep the controller running
    Detach,
    /// No command with this prefix
    NotACommand,
    /// Error occurred
    Error(String),
}

/// Context passed to command handlers
pub struct CommandContext {
    pub controller: Arc<Controller>,
    /// Simulated knobs, when the panel is not real hardware
    pub gpio: Option<Arc<SimulatedGpio>>,
}

impl CommandContext {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            gpio: None,
        }
    }

    pub fn with_gpio(controller: Arc<Controller>, gpio: Arc<SimulatedGpio>) -> Self {
        Self {
            controller,
            gpio: Some(gpio),
        }
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            let Some(rest) = input.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let args = if rest.is_empty() {
                ""
            } else if let Some(args) = rest.strip_prefix(['=', ' ']) {
                args.trim()
            } else {
                continue;
            };
            return handler(args, ctx);
        }
        CommandResult::NotACommand
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a required numeric argument, with a usage error naming the command
pub(crate) fn parse_arg<T: FromStr>(args: &str, usage: &str) -> Result<T, CommandResult> {
    if args.is_empty() {
        return Err(CommandResult::Error(format!("Usage: {}", usage)));
    }
    args.parse::<T>()
        .map_err(|_| CommandResult::Error(format!("Invalid value '{}'. Usage: {}", args, usage)))
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // General
    registry.register("h", general::cmd_help);
    registry.register("e", general::cmd_status);
    registry.register("l", general::cmd_log_level);
    registry.register("r", general::cmd_detach);
    registry.register("x", general::cmd_exit);

    // Catalog and transport
    registry.register("m", catalog::cmd_catalog_status);
    registry.register("i", catalog::cmd_track_info);
    registry.register("d", catalog::cmd_track_details);

    // Playback and striking
    registry.register("w", playback::cmd_welcome);
    registry.register("n", playback::cmd_note);
    registry.register("c", playback::cmd_chord);
    registry.register("t", playback::cmd_tempo);
    registry.register("o", playback::cmd_play_file_tempo);
    registry.register("p", playback::cmd_play_current_tempo);
    registry.register("s", playback::cmd_stop);
    registry.register("q", playback::cmd_quiet);
    registry.register("f", playback::cmd_full);
    registry.register("g", playback::cmd_note_length);

    // Simulated knobs
    registry.register("turn", bench::cmd_turn);
    registry.register("click", bench::cmd_click);

    registry
}


#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: &str, _ctx: &mut CommandContext) -> CommandResult {
        CommandResult::Message(args.to_string())
    }

    fn exit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
        CommandResult::Exit
    }

    #[test]
    fn test_prefix_needs_separator() {
        let mut registry = CommandRegistry::new();
        registry.register("t", echo);
        registry.register("turn", exit);
        let mut ctx = testing::rig().ctx;

        assert_eq!(
            registry.execute("t=90", &mut ctx),
            CommandResult::Message("90".to_string())
        );
        assert_eq!(
            registry.execute("t 90", &mut ctx),
            CommandResult::Message("90".to_string())
        );
        assert_eq!(registry.execute("turn mode 1", &mut ctx), CommandResult::Exit);
        assert_eq!(registry.execute("tx", &mut ctx), CommandResult::NotACommand);
        assert_eq!(registry.execute("z", &mut ctx), CommandResult::NotACommand);
    }

    #[test]
    fn test_longest_prefix_listed_first() {
        let registry = create_registry();
        let commands = registry.list_commands();
        assert_eq!(commands[0], "click");
        assert!(commands.contains(&"x"));
    }

    #[test]
    fn test_parse_arg_errors() {
        assert_eq!(parse_arg::<u8>("60", "n=60"), Ok(60));
        assert_eq!(
            parse_arg::<u8>("", "n=60"),
            Err(CommandResult::Error("Usage: n=60".to_string()))
        );
        assert!(parse_arg::<u8>("600", "n=60").is_err());
    }
}
