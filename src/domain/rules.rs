/// Game rules: difficulty/level policy tables and landing evaluation.
///
/// ## Policy (pure, queried once per run start)
///
/// Difficulty scales the starting point:
///   - EASY:   descent speed ×3/4, net width ×4/3
///   - MEDIUM: unchanged
///   - HARD:   descent speed ×4/3, net width ×3/4
///
/// Level then multiplies the descent speed through a lookup table and
/// sets the captive quota. The multipliers are negative: velocity in
/// world coordinates points down. Levels outside 1..=5 are clamped.
///
/// ## Landing
///
/// A landing happens when the diver's center crosses the ground
/// threshold. The diver's box is tested against the net band at the
/// bottom of the canvas:
///   - overlap    → caught (LOSE, third catch escalates to GAME OVER)
///   - no overlap → captive freed (WIN, quota exhaustion advances the
///                  level or finishes the game at level 5)
///
/// This is the only code that mutates `caught`, `freed` and
/// `game_level`.

use rand::Rng;

use super::state::{Difficulty, Mode, SessionState};

/// Height of the net band above the ground, in cells.
pub const NET_HEIGHT: i32 = 2;
/// How high the landing pad sits above the canvas bottom.
pub const NET_PAD_HEIGHT: f64 = 2.0;
/// Padding subtracted so the diver visually settles onto the pad.
pub const NET_BOTTOM_PADDING: f64 = 2.0;
/// Net width as a multiple of the diver sprite width, before the
/// difficulty adjustment.
pub const NET_WIDTH_FACTOR: i32 = 1;

/// Descent-speed multiplier per level (index 0 = level 1). Negative:
/// the diver falls.
const LEVEL_SPEED_MULTIPLIER: [i32; 5] = [-1, -3, -6, -9, -12];

/// Captives to free per level (index 0 = level 1).
const LEVEL_QUOTA: [u32; 5] = [50, 100, 150, 200, 250];

fn clamp_level(level: u32) -> usize {
    level.clamp(1, 5) as usize - 1
}

/// Base descent speed for a difficulty, before level scaling.
pub fn initial_speed(difficulty: Difficulty, base_speed: i32) -> i32 {
    match difficulty {
        Difficulty::Easy => base_speed * 3 / 4,
        Difficulty::Medium => base_speed,
        Difficulty::Hard => base_speed * 4 / 3,
    }
}

/// Net width for a difficulty, derived from the diver sprite width.
pub fn goal_width(difficulty: Difficulty, sprite_width: i32) -> i32 {
    let base = sprite_width * NET_WIDTH_FACTOR;
    match difficulty {
        Difficulty::Easy => base * 4 / 3,
        Difficulty::Medium => base,
        Difficulty::Hard => base * 3 / 4,
    }
}

/// Descent speed for a level: `base_speed` times the level multiplier.
pub fn speed_for_level(level: u32, base_speed: i32) -> i32 {
    base_speed * LEVEL_SPEED_MULTIPLIER[clamp_level(level)]
}

/// How many captives must be freed to clear the level.
pub fn quota_for_level(level: u32) -> u32 {
    LEVEL_QUOTA[clamp_level(level)]
}

/// Pick a net X position: uniform over the canvas, rejected until it
/// is at least canvas_height/6 away from the diver's current left
/// edge, so the first moments of a run are never an instant catch.
pub fn place_net<R: Rng + ?Sized>(rng: &mut R, state: &SessionState) -> i32 {
    let span = (state.canvas_width - state.goal_width).max(1);
    let diver_left = state.x - state.sprite_width as f64 / 2.0;
    // On a canvas too narrow to satisfy the distance rule, give up
    // after a bounded number of draws and take whatever came last.
    let mut x = 0;
    for _ in 0..100 {
        x = rng.random_range(0..span);
        if ((x as f64) - diver_left).abs() > state.canvas_height as f64 / 6.0 {
            break;
        }
    }
    x
}

/// World-coordinate y at which the diver counts as landed.
pub fn landing_threshold(state: &SessionState) -> f64 {
    NET_PAD_HEIGHT + state.sprite_height as f64 / 2.0 - NET_BOTTOM_PADDING
}

/// Evaluate a potential landing after a physics step.
///
/// Returns `None` while the diver is still above the threshold.
/// On a landing: clamps `y`, applies the counter mutations and returns
/// the outcome mode for the state machine to enter.
pub fn evaluate_landing(state: &mut SessionState) -> Option<Mode> {
    let threshold = landing_threshold(state);
    if state.y > threshold {
        return None;
    }
    state.y = threshold;

    if state.diver_rect().intersects(&state.net_rect()) {
        // Caught in the net.
        state.caught += 1;
        if state.caught >= 3 {
            return Some(Mode::GameOver);
        }
        return Some(Mode::Lose);
    }

    // Clear of the net: one more captive out.
    state.freed += 1;
    state.remaining_in_level = state.remaining_in_level.saturating_sub(1);
    if state.remaining_in_level == 0 {
        if state.game_level < 5 {
            state.game_level += 1;
            // Zeroing both trackers arms the quota recompute at the
            // next run start.
            state.level_quota = 0;
        } else {
            state.game_level = 1;
            state.freed = 0;
            state.level_quota = 0;
            return Some(Mode::GameFinished);
        }
    }
    Some(Mode::Win)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Tuning;

    fn landed_state() -> SessionState {
        let mut s = SessionState::new(Tuning::default());
        s.canvas_width = 80;
        s.canvas_height = 24;
        s.goal_width = 3;
        s.goal_x = 40;
        s.game_level = 1;
        s.level_quota = 50;
        s.remaining_in_level = 50;
        s.y = landing_threshold(&s) - 0.5; // below threshold
        s
    }

    // ── Policy tables ──

    #[test]
    fn initial_speed_per_difficulty() {
        assert_eq!(initial_speed(Difficulty::Easy, 30), 22);
        assert_eq!(initial_speed(Difficulty::Medium, 30), 30);
        assert_eq!(initial_speed(Difficulty::Hard, 30), 40);
    }

    #[test]
    fn goal_width_per_difficulty() {
        assert_eq!(goal_width(Difficulty::Easy, 3), 4);
        assert_eq!(goal_width(Difficulty::Medium, 3), 3);
        assert_eq!(goal_width(Difficulty::Hard, 3), 2);
    }

    #[test]
    fn speed_table_exact() {
        assert_eq!(speed_for_level(1, 30), -30);
        assert_eq!(speed_for_level(2, 30), -90);
        assert_eq!(speed_for_level(3, 30), -180);
        assert_eq!(speed_for_level(4, 30), -270);
        assert_eq!(speed_for_level(5, 30), -360);
    }

    #[test]
    fn quota_table_exact() {
        assert_eq!(quota_for_level(1), 50);
        assert_eq!(quota_for_level(2), 100);
        assert_eq!(quota_for_level(3), 150);
        assert_eq!(quota_for_level(4), 200);
        assert_eq!(quota_for_level(5), 250);
    }

    #[test]
    fn out_of_range_levels_clamp() {
        assert_eq!(speed_for_level(0, 30), -30);
        assert_eq!(speed_for_level(9, 30), -360);
        assert_eq!(quota_for_level(0), 50);
        assert_eq!(quota_for_level(9), 250);
    }

    // ── Landing evaluation ──

    #[test]
    fn above_threshold_no_landing() {
        let mut s = landed_state();
        s.y = 10.0;
        assert_eq!(evaluate_landing(&mut s), None);
        assert_eq!(s.freed, 0);
        assert_eq!(s.caught, 0);
    }

    #[test]
    fn landing_clamps_y() {
        let mut s = landed_state();
        s.x = 10.0; // far from the net at 40
        evaluate_landing(&mut s);
        assert_eq!(s.y, landing_threshold(&s));
    }

    #[test]
    fn overlap_means_caught() {
        let mut s = landed_state();
        s.x = 41.0; // inside the net band [40, 43)
        assert_eq!(evaluate_landing(&mut s), Some(Mode::Lose));
        assert_eq!(s.caught, 1);
        assert_eq!(s.freed, 0);
    }

    #[test]
    fn third_catch_is_game_over() {
        let mut s = landed_state();
        s.x = 41.0;
        assert_eq!(evaluate_landing(&mut s), Some(Mode::Lose));
        s.y = landing_threshold(&s) - 0.5;
        assert_eq!(evaluate_landing(&mut s), Some(Mode::Lose));
        s.y = landing_threshold(&s) - 0.5;
        assert_eq!(evaluate_landing(&mut s), Some(Mode::GameOver));
        assert_eq!(s.caught, 3);
    }

    #[test]
    fn miss_means_freed() {
        let mut s = landed_state();
        s.x = 10.0;
        assert_eq!(evaluate_landing(&mut s), Some(Mode::Win));
        assert_eq!(s.freed, 1);
        assert_eq!(s.remaining_in_level, 49);
    }

    #[test]
    fn quota_exhaustion_advances_level() {
        let mut s = landed_state();
        s.x = 10.0;
        s.game_level = 4;
        s.level_quota = 200;
        s.remaining_in_level = 1;
        assert_eq!(evaluate_landing(&mut s), Some(Mode::Win));
        assert_eq!(s.game_level, 5);
        // trackers zeroed: next run start recomputes the level-5 quota
        assert_eq!(s.remaining_in_level, 0);
        assert_eq!(s.level_quota, 0);
    }

    #[test]
    fn level_five_quota_finishes_the_game() {
        let mut s = landed_state();
        s.x = 10.0;
        s.game_level = 5;
        s.level_quota = 250;
        s.remaining_in_level = 1;
        s.freed = 999;
        assert_eq!(evaluate_landing(&mut s), Some(Mode::GameFinished));
        assert_eq!(s.game_level, 1);
        assert_eq!(s.freed, 0);
    }
}
