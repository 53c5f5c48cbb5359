/// Freefall integrator — single source of truth for motion.
///
/// Advances the diver based on the passage of real time:
///   - constant downward acceleration on `dy`
///   - zero horizontal acceleration, but the steering sample adds a
///     flat `steering / 3` offset to `x` every tick
///   - position integrated with the trapezoid rule (average of old and
///     new velocity over the elapsed interval)
///
/// The steering offset is intentionally NOT scaled by elapsed time. It
/// is an impulse-per-frame term and the game's handling is tuned around
/// it; scaling it would change how the diver steers.
///
/// Does nothing unless time has actually passed since `last_tick` —
/// run start and unpause park the clock slightly ahead to give the
/// player a grace interval before the fall resumes, and a same-instant
/// call must not sneak the steering impulse in.

use std::time::Instant;

use super::state::SessionState;

/// Advance the session by the real time elapsed since the last tick.
/// Always succeeds; the only side effects are on position, velocity
/// and `last_tick`.
pub fn advance(state: &mut SessionState, now: Instant, steering: f32) {
    if state.last_tick >= now {
        return;
    }

    let elapsed = now.duration_since(state.last_tick).as_secs_f64();

    // Accelerations: none for x, gravity for y.
    let ddy = -state.tuning.gravity * elapsed;

    // Softens the raw steering sample so control is not twitchy.
    let steer = steering as f64 / 3.0;

    let dx_old = state.dx;
    let dy_old = state.dy;

    // Velocity at the end of the interval.
    state.dy += ddy;

    // Position from average velocity over the interval, plus the
    // per-tick steering impulse.
    state.x += elapsed * (state.dx + dx_old) / 2.0 + steer;
    state.y += elapsed * (state.dy + dy_old) / 2.0;

    state.last_tick = now;
}
