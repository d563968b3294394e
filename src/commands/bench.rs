//! Bench commands driving the simulated knobs
//!
//! Turning or clicking only changes pin levels; the controller's input loop
//! picks the change up on its next poll like it would from real encoders.

use crate::commands::{CommandContext, CommandResult};
use crate::controller::Knob;
use crate::hardware::SimulatedGpio;
use std::sync::Arc;

fn bench_gpio(ctx: &CommandContext) -> Result<Arc<SimulatedGpio>, CommandResult> {
    ctx.gpio
        .clone()
        .ok_or_else(|| CommandResult::Error("Knobs are not simulated".to_string()))
}

fn knob(name: &str) -> Result<Knob, CommandResult> {
    Knob::parse(name).ok_or_else(|| {
        CommandResult::Error(format!(
            "Unknown knob '{}'. Use mode, track or tempo",
            name
        ))
    })
}

/// Handle `turn <knob> <steps>`
pub fn cmd_turn(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let mut parts = args.split_whitespace();
    let (Some(name), Some(steps), None) = (parts.next(), parts.next(), parts.next()) else {
        return CommandResult::Error("Usage: turn <mode|track|tempo> <steps>".to_string());
    };
    let Ok(steps) = steps.parse::<i32>() else {
        return CommandResult::Error(format!("Invalid steps '{}'", steps));
    };
    let (gpio, knob) = match (bench_gpio(ctx), knob(name)) {
        (Ok(gpio), Ok(knob)) => (gpio, knob),
        (Err(e), _) | (_, Err(e)) => return e,
    };

    let pins = knob.pins();
    gpio.turn(pins.pin_1, pins.pin_2, steps);
    CommandResult::Success
}

/// Handle `click <knob>`
pub fn cmd_click(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let (gpio, knob) = match (bench_gpio(ctx), knob(args)) {
        (Ok(gpio), Ok(knob)) => (gpio, knob),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    let Some(press) = knob.pins().press else {
        return CommandResult::Error(format!("{:?} knob has no press pin", knob));
    };

    gpio.press(press);
    // the input loop must see the knob held before the release
    ctx.controller.poll_inputs();
    gpio.release(press);
    ctx.controller.poll_inputs();
    CommandResult::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::controller::{Mode, RunState};

    #[test]
    fn test_turn_and_click_start_play_all() {
        let mut rig = testing::rig();
        assert_eq!(cmd_turn("mode 2", &mut rig.ctx), CommandResult::Success);
        assert_eq!(cmd_click("mode", &mut rig.ctx), CommandResult::Success);

        let state = rig.ctx.controller.state();
        assert_eq!(state.mode(), Mode::PlayAllTracks);
        assert_eq!(state.run_state(), Ok(RunState::PlayingTrack));
    }

    #[test]
    fn test_bad_arguments() {
        let mut rig = testing::rig();
        assert!(matches!(cmd_turn("mode", &mut rig.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_turn("volume 1", &mut rig.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_turn("tempo two", &mut rig.ctx), CommandResult::Error(_)));
        assert!(matches!(cmd_click("", &mut rig.ctx), CommandResult::Error(_)));

        rig.ctx.gpio = None;
        assert_eq!(
            cmd_click("mode", &mut rig.ctx),
            CommandResult::Error("Knobs are not simulated".to_string())
        );
    }
}
