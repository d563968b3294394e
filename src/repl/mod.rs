//! Operator console
//!
//! Lines are read on a separate thread with rustyline and handed over a
//! channel, so the controller threads keep running while the prompt waits.

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use anyhow::Result;
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::thread;

/// Types of events the console loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// How the console was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// `x`, Ctrl-C or end of input: shut the whole system down
    Shutdown,
    /// `r`: keep playing from the knobs alone
    Operational,
}

/// Run one console line; `Some` when the console should close
fn handle_line(
    registry: &CommandRegistry,
    ctx: &mut CommandContext,
    line: &str,
) -> Option<ConsoleExit> {
    match registry.execute(line, ctx) {
        CommandResult::Success => None,
        CommandResult::Message(msg) => {
            println!("{}", msg);
            None
        }
        CommandResult::Exit => {
            println!("{}", "***** EXITING GRACEFULLY *****".bright_cyan());
            Some(ConsoleExit::Shutdown)
        }
        CommandResult::Detach => {
            println!(
                "{}",
                "***** GOING TO OPERATIONAL MODE *****".bright_cyan()
            );
            Some(ConsoleExit::Operational)
        }
        CommandResult::Error(e) => {
            println!("{} {}", "Error:".bright_red().bold(), e.red());
            None
        }
        CommandResult::NotACommand => {
            println!(
                "{} {} {}",
                "Error:".bright_red().bold(),
                format!("unknown command '{}'.", line).red(),
                "Type 'h' for help.".dimmed()
            );
            None
        }
    }
}

pub struct Repl {
    editor: Option<DefaultEditor>,
    registry: CommandRegistry,
    ctx: CommandContext,
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
}

impl Repl {
    pub fn new(ctx: CommandContext) -> RustylineResult<Self> {
        let editor = DefaultEditor::new()?;
        let (tx_input, rx_input) = unbounded();
        Ok(Repl {
            editor: Some(editor),
            registry: create_registry(),
            ctx,
            tx_input,
            rx_input,
        })
    }

    pub fn run(&mut self) -> Result<ConsoleExit> {
        if let CommandResult::Message(help) = self.registry.execute("h", &mut self.ctx) {
            println!("{}", help);
        }

        let Some(mut editor) = self.editor.take() else {
            anyhow::bail!("console already ran");
        };
        let tx_input = self.tx_input.clone();

        thread::Builder::new()
            .name("console".into())
            .spawn(move || loop {
                let prompt = format!("{} ", "xylo>".bright_magenta().bold());
                match editor.readline(&prompt) {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if !line.is_empty() {
                            let _ = editor.add_history_entry(&line);
                        }
                        if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx_input.send(ReplEvent::Input(Err(err)));
                        break;
                    }
                }
            })?;

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if line.is_empty() {
                            continue;
                        }
                        if let Some(exit) = handle_line(&self.registry, &mut self.ctx, &line) {
                            return Ok(exit);
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{}", "Goodbye!".bright_cyan());
                        return Ok(ConsoleExit::Shutdown);
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        return Ok(ConsoleExit::Shutdown);
                    }
                    // reader thread gone
                    Err(_) => return Ok(ConsoleExit::Shutdown),
                },
            }
        }
    }
}
