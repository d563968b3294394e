use anyhow::{bail, Context, Result};
use colored::*;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use xylo::actuator::{Xylophone, XylophoneConfig};
use xylo::commands::CommandContext;
use xylo::config::{SetupConfig, DEFAULT_SETUP_FILE};
use xylo::controller::{Controller, ControllerConfig, Knobs};
use xylo::display::PanelDisplay;
use xylo::hardware::{MidiMirrorHandle, OutputBank, SimulatedBank, SimulatedGpio};
use xylo::logger;
use xylo::repl::{ConsoleExit, Repl};
use xylo::timing::{Sleeper, ThreadSleeper};
use xylo_core::TrackCatalog;

const BANNER: &str = r#"
    |\
 |--|/------------------|\-------------------- - /|--
 |--|---4---------------|\\------------------|/--_|--
 |-/|.-------|~~~~|----_|-\|-----|~~~~|------|--(_)--
 |(-|-)-4---_|---_|---(_)--|----_|---_|----(_)-------
 |-`|'-----(_)--(_)-------_|---(_)--(_)--------------
   \|                    (_)
"#;

fn build_banks(setup: &SetupConfig) -> Result<(Box<dyn OutputBank>, Box<dyn OutputBank>)> {
    let Some(port) = &setup.midi_mirror_port else {
        return Ok((
            Box::new(SimulatedBank::new("low", setup.bank_size)),
            Box::new(SimulatedBank::new("high", setup.bank_size)),
        ));
    };

    let handle = match MidiMirrorHandle::connect(port) {
        Ok(handle) => handle,
        Err(e) => {
            if let Ok(ports) = MidiMirrorHandle::list_ports() {
                warn!("Available MIDI output ports: {:?}", ports);
            }
            return Err(e).with_context(|| format!("cannot mirror to MIDI port '{}'", port));
        }
    };
    info!("Mirroring strikes to MIDI port {}", handle.port_name());

    let low = setup.xylophone_lowest_note;
    let high = low.saturating_add(setup.bank_size);
    Ok((
        Box::new(handle.bank(low, setup.bank_size)),
        Box::new(handle.bank(high, setup.bank_size)),
    ))
}

fn run() -> Result<()> {
    let setup_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETUP_FILE));
    let setup = SetupConfig::load(&setup_path)?;

    logger::init(setup.log_level);

    if setup.console_enabled() {
        println!("{}", "***** STARTING MY SELF PLAYING XYLOPHONE CONTROL *****".bright_cyan().bold());
        println!("{}", BANNER.bright_yellow());
        println!("{}", "********   CURRENTLY RUNNING IN CONSOLE MODE   *******".bright_cyan());
    } else {
        println!("{}", "******** CURRENTLY RUNNING IN OPERATIONAL MODE *******".bright_cyan());
    }

    info!("Setting up MIDI files");
    let catalog = Arc::new(TrackCatalog::scan(&setup.midi_music_dir)?);
    if catalog.is_empty() {
        bail!(
            "no playable MIDI file found in {}",
            setup.midi_music_dir.display()
        );
    }

    info!("Setting up xylophone");
    let sleeper: Arc<dyn Sleeper> = Arc::new(ThreadSleeper);
    let (bank_low, bank_high) = build_banks(&setup)?;
    let xylophone = Arc::new(Xylophone::new(
        XylophoneConfig {
            lowest_note: setup.xylophone_lowest_note,
            notes_count: setup.xylophone_notes_count,
            max_simultaneous: setup.xylophone_max_sim_notes,
            bank_size: setup.bank_size,
            note_length: setup.note_length(),
        },
        bank_low,
        bank_high,
        sleeper.clone(),
    ));

    info!("Setting up knobs and display");
    let gpio = Arc::new(SimulatedGpio::new());
    let knobs = Knobs::new(gpio.clone(), catalog.count())?;
    let display = Box::new(PanelDisplay::new(&catalog));

    let controller = Arc::new(Controller::new(
        catalog,
        xylophone.clone(),
        knobs,
        display,
        sleeper,
        ControllerConfig {
            poll_interval: setup.poll_interval(),
            inter_track_pause: setup.inter_track_pause(),
        },
    )?);

    let threads = controller.spawn();

    info!("Playing welcome sound");
    controller.play_welcome_sound();

    let exit = if setup.console_enabled() {
        info!("Starting console");
        let mut repl = Repl::new(CommandContext::with_gpio(controller.clone(), gpio))?;
        repl.run()?
    } else {
        ConsoleExit::Operational
    };

    match exit {
        ConsoleExit::Shutdown => threads.shutdown(),
        ConsoleExit::Operational => threads.join(),
    }
    xylophone.shutdown();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(2);
    }
}
