//! Catalog and transport inspection commands (`m`, `i=N`, `d=N`)

use crate::commands::{parse_arg, CommandContext, CommandResult};
use xylo_core::types::format_minutes_seconds;

/// Handle `m`
pub fn cmd_catalog_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let catalog = ctx.controller.catalog();
    let cursor = ctx.controller.transport_cursor();

    let mut out = format!("Files count : {}\n", catalog.count());
    match cursor {
        Some(cursor) => {
            out.push_str(&format!("Play index  : {}\n", cursor.track_index));
            out.push_str(&format!("Event index : {}\n", cursor.event_index));
        }
        None => {
            out.push_str("Play index  : -\n");
            out.push_str("Event index : -\n");
        }
    }
    out.push_str("Files:");
    for (i, track) in catalog.iter().enumerate() {
        out.push_str(&format!(
            "\n  #{}: {} - {} - {}",
            i,
            track.name,
            format_minutes_seconds(track.length_seconds),
            track.tempo_bpm
        ));
    }
    CommandResult::Message(out)
}

/// Handle `i=N`
pub fn cmd_track_info(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let index = match parse_arg::<usize>(args, "i=<track index>") {
        Ok(index) => index,
        Err(e) => return e,
    };
    match ctx.controller.catalog().get(index) {
        Some(track) => CommandResult::Message(format!(
            "File #{}: {}\n  Tempo  : {}\n  Length : {}\n  Events : {}",
            index,
            track.name,
            track.tempo_bpm,
            format_minutes_seconds(track.length_seconds),
            track.event_count()
        )),
        None => CommandResult::Error(format!("Out of range file index: {}", index)),
    }
}

/// Handle `d=N`: every compiled event of a track
pub fn cmd_track_details(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let index = match parse_arg::<usize>(args, "d=<track index>") {
        Ok(index) => index,
        Err(e) => return e,
    };
    let Some(track) = ctx.controller.catalog().get(index) else {
        return CommandResult::Error(format!("Out of range file index: {}", index));
    };

    let mut out = format!("File #{}: {}", index, track.name);
    for (i, event) in track.events.iter().enumerate() {
        out.push_str(&format!("\n  {:>5}: {}", i, event));
    }
    CommandResult::Message(out)
}
