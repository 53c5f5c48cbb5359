/// Keyboard input: terminal events → engine commands + steering.
///
/// Two kinds of input come off the keyboard:
///   - discrete actions (drop, pause, save, load, quit, difficulty)
///   - continuous steering, from held Left/Right keys
///
/// Held keys are tracked by the timestamp of their last Press/Repeat
/// event and expire after a short timeout, since most terminals never
/// report Release. While a steering key is held the sample sits at
/// ±tilt, standing in for the original tilt sensor; when it expires
/// the sample returns to zero.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::domain::state::Difficulty;
use crate::sim::session::Command;

/// After this long without a Press/Repeat event, a key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Host-level actions decoded from the keyboard.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum UiAction {
    Quit,
    Save,
    Load,
    SetDifficulty(Difficulty),
    Game(Command),
    FocusLost,
    Resize(i32, i32),
}

pub struct InputState {
    held: HashMap<KeyCode, Instant>,
    tilt: f32,
}

impl InputState {
    pub fn new(tilt: f32) -> Self {
        InputState { held: HashMap::with_capacity(4), tilt }
    }

    /// Wait up to `timeout` for input, then drain everything pending.
    pub fn poll(&mut self, timeout: Duration) -> io::Result<Vec<UiAction>> {
        let mut actions = Vec::new();
        if !event::poll(timeout)? {
            return Ok(actions);
        }
        loop {
            self.decode(event::read()?, &mut actions);
            if !event::poll(Duration::ZERO)? {
                return Ok(actions);
            }
        }
    }

    fn decode(&mut self, ev: Event, actions: &mut Vec<UiAction>) {
        match ev {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    self.held.remove(&key.code);
                    return;
                }
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    actions.push(UiAction::Quit);
                    return;
                }
                match key.code {
                    KeyCode::Esc => actions.push(UiAction::Quit),

                    KeyCode::Up => actions.push(UiAction::Game(Command::Up)),
                    KeyCode::Down | KeyCode::Char('s') => {
                        actions.push(UiAction::Game(Command::Down))
                    }
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        actions.push(UiAction::Game(Command::Select))
                    }

                    // steering keys: held, not discrete
                    KeyCode::Left | KeyCode::Char('a') => {
                        self.held.insert(KeyCode::Left, Instant::now());
                    }
                    KeyCode::Right | KeyCode::Char('d') => {
                        self.held.insert(KeyCode::Right, Instant::now());
                    }

                    KeyCode::Char('1') => {
                        actions.push(UiAction::SetDifficulty(Difficulty::Easy))
                    }
                    KeyCode::Char('2') => {
                        actions.push(UiAction::SetDifficulty(Difficulty::Medium))
                    }
                    KeyCode::Char('3') => {
                        actions.push(UiAction::SetDifficulty(Difficulty::Hard))
                    }

                    KeyCode::F(5) => actions.push(UiAction::Save),
                    KeyCode::F(9) => actions.push(UiAction::Load),
                    _ => {}
                }
            }
            Event::FocusLost => actions.push(UiAction::FocusLost),
            Event::Resize(w, h) => actions.push(UiAction::Resize(w as i32, h as i32)),
            _ => {}
        }
    }

    /// Current steering sample from held keys: ±tilt, or 0 when no
    /// steering key is live.
    pub fn steering_sample(&mut self) -> f32 {
        let now = Instant::now();
        self.held
            .retain(|_, last| now.duration_since(*last) < HOLD_TIMEOUT);
        let left = self.held.contains_key(&KeyCode::Left);
        let right = self.held.contains_key(&KeyCode::Right);
        match (left, right) {
            (true, false) => -self.tilt,
            (false, true) => self.tilt,
            _ => 0.0,
        }
    }
}
