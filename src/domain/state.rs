/// Session state: the complete snapshot of one play session.
///
/// Coordinates are world coordinates with (0, 0) at the LOWER left;
/// `x`/`y` track the diver's center. The renderer converts to screen
/// (top-left) coordinates when it draws.
///
/// All mutation happens under the session lock except `steering`, which
/// lives in its own lock-free cell (see `Steering`) because the input
/// side writes it from another thread at its own cadence.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Game mode. Exactly one holds at any time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Ready,
    Running,
    Paused,
    Lose,
    Win,
    GameOver,
    GameFinished,
    Stopped,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Difficulty> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Axis-aligned rectangle in screen coordinates (top-left origin),
/// half-open on the right/bottom edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Rect { left, top, right, bottom }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Physics tuning, loaded from config.toml at startup.
#[derive(Clone, Copy, Debug)]
pub struct Tuning {
    /// Downward acceleration, world units per second squared.
    pub gravity: f64,
    /// Base descent speed before difficulty/level scaling.
    pub base_speed: i32,
    /// Clock head start on run start / unpause, milliseconds.
    pub start_grace_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning { gravity: 35.0, base_speed: 30, start_grace_ms: 100 }
    }
}

#[derive(Clone, Debug)]
pub struct SessionState {
    pub mode: Mode,
    pub difficulty: Difficulty,

    /// Diver center, world coordinates.
    pub x: f64,
    pub y: f64,
    /// Velocity.
    pub dx: f64,
    pub dy: f64,

    /// Current level, 1..=5.
    pub game_level: u32,
    /// Captives freed so far this playthrough.
    pub freed: u32,
    /// Times the diver has been caught in the net (3 = game over).
    pub caught: u32,
    /// Landings still needed to clear the current level.
    pub remaining_in_level: u32,
    /// Full quota for the current level; equal to `remaining_in_level`
    /// only at a fresh level start (the recompute trigger).
    pub level_quota: u32,

    /// Net geometry, screen X of the left edge and width in cells.
    pub goal_x: i32,
    pub goal_width: i32,
    /// Descent speed the net was placed for (persisted with the record).
    pub goal_speed: i32,

    pub canvas_width: i32,
    pub canvas_height: i32,
    pub sprite_width: i32,
    pub sprite_height: i32,

    /// Last physics clock reading. May sit in the future right after a
    /// run start or unpause; `advance` no-ops until the clock catches up.
    pub last_tick: Instant,

    /// User-facing status line, set on every mode transition.
    pub status_text: String,
    pub status_visible: bool,

    pub tuning: Tuning,
}

impl SessionState {
    pub fn new(tuning: Tuning) -> Self {
        // Sprite dimensions are cell counts in the terminal rendition.
        let sprite_width = 3;
        let sprite_height = 2;
        SessionState {
            mode: Mode::Ready,
            difficulty: Difficulty::Medium,
            // initial show-up position, not yet playing
            x: sprite_width as f64,
            y: sprite_height as f64 * 2.0,
            dx: 0.0,
            dy: 0.0,
            game_level: 1,
            freed: 0,
            caught: 0,
            remaining_in_level: 0,
            level_quota: 0,
            goal_x: 0,
            goal_width: 0,
            goal_speed: 0,
            canvas_width: 1,
            canvas_height: 1,
            sprite_width,
            sprite_height,
            last_tick: Instant::now(),
            status_text: String::new(),
            status_visible: false,
            tuning,
        }
    }

    /// Diver bounding box in screen coordinates.
    pub fn diver_rect(&self) -> Rect {
        let left = self.x as i32 - self.sprite_width / 2;
        let top = self.canvas_height - (self.y as i32 + self.sprite_height / 2);
        Rect::new(left, top, left + self.sprite_width, top + self.sprite_height)
    }

    /// Net bounding box: a fixed band at the bottom of the canvas.
    pub fn net_rect(&self) -> Rect {
        Rect::new(
            self.goal_x,
            self.canvas_height - crate::domain::rules::NET_HEIGHT,
            self.goal_x + self.goal_width,
            self.canvas_height,
        )
    }
}

/// The steering signal: latest control sample nudging horizontal motion.
///
/// A single f32 stored as raw bits in an `AtomicU32`. The input thread
/// stores, the physics tick loads; last writer wins, no lock involved.
/// A torn read cannot happen (the whole float is one 32-bit store).
#[derive(Debug, Default)]
pub struct Steering(AtomicU32);

impl Steering {
    pub fn new() -> Self {
        Steering(AtomicU32::new(0f32.to_bits()))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Discrete steering nudge from the key-based control scheme:
    /// left/right keys swing the sample hard the way the original
    /// orientation-sensor values would.
    pub fn nudge(&self, offset: f32) {
        self.set(9.0 * (self.get() + offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        let c = Rect::new(10, 0, 20, 10); // touching edge only
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn steering_last_writer_wins() {
        let s = Steering::new();
        s.set(4.5);
        s.set(-12.25);
        assert_eq!(s.get(), -12.25);
    }

    #[test]
    fn steering_nudge_formula() {
        let s = Steering::new();
        s.nudge(30.0); // right: 9 * (0 + 30)
        assert_eq!(s.get(), 270.0);
        let s = Steering::new();
        s.nudge(-30.0); // left: 9 * (0 - 30)
        assert_eq!(s.get(), -270.0);
    }
}
