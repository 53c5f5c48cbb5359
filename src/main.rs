/// Entry point: wires the terminal, the input sources and the engine
/// together, then runs the host loop until the player quits.

mod config;
mod domain;
mod sim;
mod ui;

use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{Context, Result};

use config::GameConfig;
use domain::state::Mode;
use sim::driver::LoopDriver;
use sim::event::EngineEvent;
use sim::save;
use sim::session::Session;
use ui::gamepad::GamepadSource;
use ui::input::{InputState, UiAction};
use ui::renderer::TermRenderer;
use ui::sound::SoundEngine;

const INPUT_POLL: Duration = Duration::from_millis(15);

fn main() -> Result<()> {
    let cfg = GameConfig::load();
    let (session, events) = Session::new(cfg.tuning);

    let (w, h) = TermRenderer::surface_size();
    session
        .set_surface_size(w, h)
        .context("unusable terminal size")?;

    // Resume an interrupted session if a record exists. A malformed
    // record is rejected; the session stays READY.
    if save::has_save() {
        match save::read_save() {
            Ok(record) => session.restore(&record),
            Err(e) => eprintln!("Ignoring unreadable save: {e}"),
        }
    }

    let mut renderer = TermRenderer::new(&cfg.display);
    renderer.init().context("terminal init")?;

    let sound = SoundEngine::new();
    let gamepad = GamepadSource::spawn(session.clone());
    let driver = LoopDriver::spawn(session.clone(), Box::new(renderer));

    let result = host_loop(&session, &events, sound.as_ref(), &cfg);

    // Quiesce the loop before the state is touched externally or the
    // terminal goes away under the renderer.
    driver.shutdown();
    gamepad.shutdown();

    let record = session.snapshot();
    if should_persist(session.mode()) {
        if let Err(e) = save::write_save(&record) {
            eprintln!("Could not write save: {e}");
        }
    } else {
        // A finished playthrough has nothing to resume; make sure no
        // stale record survives the exit.
        save::delete_save();
    }
    session.stop(None);

    if let Err(e) = TermRenderer::restore_terminal() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    println!();
    println!(
        "Thanks for playing Skybreak! Captives freed: {} (level {})",
        record.freed, record.game_level
    );
    result
}

/// Whether the session is worth writing to disk on exit. A finished
/// game would only restore into its own summary screen.
fn should_persist(mode: Mode) -> bool {
    mode != Mode::GameFinished
}

fn host_loop(
    session: &Session,
    events: &Receiver<EngineEvent>,
    sound: Option<&SoundEngine>,
    cfg: &GameConfig,
) -> Result<()> {
    let mut input = InputState::new(cfg.display.key_tilt);
    let mut last_sample = 0.0f32;

    loop {
        for action in input.poll(INPUT_POLL).context("terminal input")? {
            match action {
                UiAction::Quit => return Ok(()),
                UiAction::Game(cmd) => {
                    session.handle_command(cmd);
                }
                UiAction::FocusLost => session.pause(),
                UiAction::Resize(w, h) => {
                    // Absurd sizes are rejected; keep the old surface.
                    let _ = session.set_surface_size(w, h);
                }
                UiAction::Save => {
                    let _ = save::write_save(&session.snapshot());
                }
                UiAction::Load => {
                    if let Ok(record) = save::read_save() {
                        session.restore(&record);
                    }
                }
                UiAction::SetDifficulty(d) => session.set_difficulty(d),
            }
        }

        // Write steering only on change, so an idle keyboard never
        // stomps samples coming from the gamepad thread.
        let sample = input.steering_sample();
        if sample != last_sample {
            session.steering().set(sample);
            last_sample = sample;
        }

        for event in events.try_iter() {
            match event {
                EngineEvent::Landed { caught } => {
                    if let Some(s) = sound {
                        if caught {
                            s.play_caught();
                        } else {
                            s.play_freed();
                        }
                    }
                }
                EngineEvent::ShowSummary => {
                    let finished = session.mode() == Mode::GameFinished;
                    if finished {
                        // A completed playthrough has nothing to resume.
                        save::delete_save();
                    }
                    if let Some(s) = sound {
                        if finished {
                            s.play_finished();
                        } else {
                            s.play_over();
                        }
                    }
                }
                // The status line is mirrored into SessionState and
                // drawn by the renderer from there.
                EngineEvent::Status { .. } => {}
                // Frame lost; the next iteration redraws.
                EngineEvent::FrameFault { .. } => {}
            }
        }
    }
}
