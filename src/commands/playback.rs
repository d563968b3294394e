//! Playback and striking commands

use crate::commands::{parse_arg, CommandContext, CommandResult};
use colored::*;
use std::time::Duration;
use xylo_core::types::note_name;

/// Handle `w`
pub fn cmd_welcome(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.controller.play_welcome_sound();
    CommandResult::Success
}

/// Handle `n=P`
pub fn cmd_note(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let note = match parse_arg::<u8>(args, "n=<midi note>") {
        Ok(note) => note,
        Err(e) => return e,
    };
    match ctx.controller.play_note_from_console(note) {
        Ok(()) => CommandResult::Message(format!("Played {}", note_name(note).cyan())),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `c=[P, ...]`
pub fn cmd_chord(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let notes: Vec<u8> = match serde_json::from_str(args) {
        Ok(notes) => notes,
        Err(e) => {
            return CommandResult::Error(format!(
                "Invalid chord '{}' ({}). Usage: c=[60, 62]",
                args, e
            ))
        }
    };
    match ctx.controller.play_notes_from_console(&notes) {
        Ok(played) => {
            let names: Vec<String> = played.iter().map(|&n| note_name(n)).collect();
            CommandResult::Message(format!("Played {}", names.join(" ").cyan()))
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `t=BPM`
pub fn cmd_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    match parse_arg::<u32>(args, "t=<bpm>") {
        Ok(bpm) if bpm > 0 => {
            ctx.controller.set_tempo_from_console(bpm);
            CommandResult::Message(
                format!("Tempo set to {} BPM", bpm)
                    .bright_green()
                    .to_string(),
            )
        }
        Ok(_) => CommandResult::Error("Tempo must be above 0 BPM".to_string()),
        Err(e) => e,
    }
}

fn play_track(args: &str, ctx: &mut CommandContext, use_file_tempo: bool) -> CommandResult {
    let usage = if use_file_tempo { "o=<track index>" } else { "p=<track index>" };
    let index = match parse_arg::<usize>(args, usage) {
        Ok(index) => index,
        Err(e) => return e,
    };
    match ctx.controller.play_track_from_console(index, use_file_tempo) {
        Ok(()) => CommandResult::Success,
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `o=N`
pub fn cmd_play_file_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    play_track(args, ctx, true)
}

/// Handle `p=N`
pub fn cmd_play_current_tempo(args: &str, ctx: &mut CommandContext) -> CommandResult {
    play_track(args, ctx, false)
}

/// Handle `s`
pub fn cmd_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    if ctx.controller.stop_track() {
        CommandResult::Success
    } else {
        CommandResult::Message("Nothing is playing".yellow().to_string())
    }
}

/// Handle `q`
pub fn cmd_quiet(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.controller.xylophone().set_quiet(true);
    CommandResult::Message("Quiet mode: notes are not triggered".to_string())
}

/// Handle `f`
pub fn cmd_full(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.controller.xylophone().set_quiet(false);
    CommandResult::Message("Full mode: notes are triggered".to_string())
}

/// Handle `g=MS`
pub fn cmd_note_length(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let ms = match parse_arg::<u64>(args, "g=<ms>") {
        Ok(ms) => ms,
        Err(e) => return e,
    };
    ctx.controller
        .xylophone()
        .set_note_length(Duration::from_millis(ms));
    CommandResult::Message(format!("Changing note length to {} ms", ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::controller::{Mode, RunState};

    #[test]
    fn test_chord_parses_json_and_truncates() {
        colored::control::set_override(false);
        let mut rig = testing::rig();
        assert_eq!(
            cmd_chord("[64, 60, 67]", &mut rig.ctx),
            CommandResult::Message("Played C4 E4".to_string())
        );
        let high = rig.writes.try_recv().unwrap();
        assert_eq!(high.pins, vec![0, 4]);

        assert!(matches!(
            cmd_chord("60, 62", &mut rig.ctx),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_note_out_of_range() {
        let mut rig = testing::rig();
        assert!(matches!(cmd_note("59", &mut rig.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_note("61", &mut rig.ctx), CommandResult::Message(_)));
    }

    #[test]
    fn test_play_and_stop_from_console() {
        colored::control::set_override(false);
        let mut rig = testing::rig();
        assert_eq!(
            cmd_tempo("96", &mut rig.ctx),
            CommandResult::Message("Tempo set to 96 BPM".to_string())
        );
        assert_eq!(cmd_play_current_tempo("1", &mut rig.ctx), CommandResult::Success);

        let controller = rig.ctx.controller.clone();
        let state = controller.state();
        assert_eq!(state.mode(), Mode::PlayOneTrack);
        assert_eq!(state.track_index(), 1);
        assert_eq!(state.track_tempo(), 120);
        assert_eq!(state.play_tempo(), 96);

        assert_eq!(cmd_stop("", &mut rig.ctx), CommandResult::Success);
        assert_eq!(state.run_state(), Ok(RunState::StoppingTrack));
        assert!(matches!(
            cmd_play_file_tempo("2", &mut rig.ctx),
            CommandResult::Error(_)
        ));
    }

    #[test]
    fn test_quiet_and_note_length() {
        let mut rig = testing::rig();
        cmd_quiet("", &mut rig.ctx);
        cmd_note_length("40", &mut rig.ctx);
        cmd_note("60", &mut rig.ctx);

        assert!(rig.writes.try_recv().is_err());
        assert_eq!(rig.sleeper.sleeps(), vec![Duration::from_millis(40)]);

        cmd_full("", &mut rig.ctx);
        assert!(!rig.ctx.controller.xylophone().is_quiet());
    }
}
