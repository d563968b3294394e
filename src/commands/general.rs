//! General console commands (help, status, log level, leaving)

use crate::commands::{parse_arg, CommandContext, CommandResult};
use crate::logger;
use colored::*;

/// Handle `h`
pub fn cmd_help(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let note_length_ms = ctx.controller.xylophone().note_length().as_millis();
    CommandResult::Message(help_text(note_length_ms, ctx.gpio.is_some()))
}

/// Handle `e`
pub fn cmd_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(ctx.controller.status().to_string())
}

/// Handle `l=N`
pub fn cmd_log_level(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let level = match parse_arg::<u8>(args, "l=0..4") {
        Ok(level) => level,
        Err(e) => return e,
    };
    if logger::set_level(level) {
        CommandResult::Message(format!("Log level set to {}", level))
    } else {
        CommandResult::Error("Invalid log level".to_string())
    }
}

/// Handle `r`
pub fn cmd_detach(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Detach
}

/// Handle `x`
pub fn cmd_exit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

fn line(command: &str, what: &str) -> String {
    format!("  {:<40}: {}\n", what, command.cyan())
}

fn help_text(note_length_ms: u128, bench: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Status".green()));
    out.push_str(&line("e", "Print controller status"));
    out.push_str(&line("m", "Print MIDI reader status"));
    out.push_str(&line("i=2", "Print MIDI file info by index"));
    out.push_str(&line("d=3", "Print MIDI file details by index"));

    out.push_str(&format!("\n{}\n", "Striking".green()));
    out.push_str(&line("w", "Play welcome sound"));
    out.push_str(&line("n=60", "Play a single note"));
    out.push_str(&line("c=[60, 62]", "Play a chord, i.e. several notes"));

    out.push_str(&format!("\n{}\n", "Playing files".green()));
    out.push_str(&line("t=90", "Change file playing tempo"));
    out.push_str(&line("o=2", "Start playing file, use file tempo"));
    out.push_str(&line("p=3", "Start playing file, use playing tempo"));
    out.push_str(&line("s", "Stop playing file (interrupt)"));

    out.push_str(&format!("\n{}\n", "Output".green()));
    out.push_str(&line("q", "Enter quiet mode (don't trigger notes)"));
    out.push_str(&line("f", "Enter full mode (trigger notes)"));
    out.push_str(&line(
        "g=20",
        &format!("Change note length in ms (current: {})", note_length_ms),
    ));
    out.push_str(&line(
        "l=0..4",
        "Log level: off, error, warning, info, debug",
    ));

    if bench {
        out.push_str(&format!("\n{}\n", "Simulated knobs".green()));
        out.push_str(&line("turn <mode|track|tempo> <steps>", "Turn a knob"));
        out.push_str(&line("click <mode|track|tempo>", "Press and release a knob"));
    }

    out.push('\n');
    out.push_str(&line("r", "Go to operational mode (close console)"));
    out.push_str(&line("x", "Exit with no error"));
    out.push_str(&line("h", "Display this help"));
    out
}
