/// The session: game state machine and the command surface exposed to
/// the host (keyboard loop, gamepad thread, loop driver).
///
/// ## Locking
///
/// One mutex guards the whole `SessionState`. Every command, the
/// per-tick integrate+evaluate+render, and save/restore all run under
/// it. The steering sample is the single exception: it lives in a
/// lock-free atomic cell written by the input side (see
/// `domain::state::Steering`).
///
/// ## Mode transitions
///
/// Each transition goes through `set_state`, the only place status
/// text is derived. Entering RUNNING hides the status line; every
/// other mode produces a visible one. GAME OVER and GAME FINISHED
/// additionally fire the end-of-session summary event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::domain::physics;
use crate::domain::rules;
use crate::domain::state::{Difficulty, Mode, SessionState, Steering, Tuning};
use super::driver::RenderSink;
use super::error::EngineError;
use super::event::EngineEvent;
use super::save::{self, SaveRecord};

/// Discrete directional command, the key-based control scheme.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Up,
    Down,
    Left,
    Right,
    Select,
}

impl Command {
    /// Up, Down and Select all work as the "drop" key.
    fn is_start_key(self) -> bool {
        matches!(self, Command::Up | Command::Down | Command::Select)
    }
}

struct Shared {
    state: Mutex<SessionState>,
    steering: Steering,
    /// Loop-driver run flag. Observed at the top of every iteration.
    run: AtomicBool,
}

#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
    events: Sender<EngineEvent>,
}

impl Session {
    pub fn new(tuning: Tuning) -> (Session, Receiver<EngineEvent>) {
        let (events, rx) = mpsc::channel();
        let mut state = SessionState::new(tuning);
        state.status_text = status_line(Mode::Ready).to_string();
        state.status_visible = true;
        let session = Session {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                steering: Steering::new(),
                run: AtomicBool::new(false),
            }),
            events,
        };
        (session, rx)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.shared.state.lock().expect("session lock poisoned")
    }

    pub fn steering(&self) -> &Steering {
        &self.shared.steering
    }

    pub fn mode(&self) -> Mode {
        self.lock().mode
    }

    /// Is the loop driver's run flag set?
    pub fn is_active(&self) -> bool {
        self.shared.run.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.shared.run.store(active, Ordering::SeqCst);
    }

    // ── Commands ──

    /// Start a run. Valid from READY, LOSE, WIN and the re-enterable
    /// end states (GAME OVER, GAME FINISHED, STOPPED); ignored while
    /// RUNNING or PAUSED.
    pub fn start(&self) {
        let mut st = self.lock();
        if matches!(st.mode, Mode::Running | Mode::Paused) {
            return;
        }
        self.do_start(&mut st);
    }

    /// Pause the physics update. Only meaningful while RUNNING.
    pub fn pause(&self) {
        let mut st = self.lock();
        if st.mode == Mode::Running {
            self.set_state(&mut st, Mode::Paused, None);
        }
    }

    /// Resume from a pause, giving the clock a fresh head start.
    pub fn resume(&self) {
        let mut st = self.lock();
        if st.mode == Mode::Paused {
            self.do_resume(&mut st);
        }
    }

    /// Stop the session from any state. Resets playthrough counters.
    pub fn stop(&self, reason: Option<&str>) {
        let mut st = self.lock();
        self.set_state(&mut st, Mode::Stopped, reason);
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        self.lock().difficulty = difficulty;
    }

    /// Update canvas dimensions. Degenerate sizes are rejected before
    /// they can reach net placement.
    pub fn set_surface_size(&self, width: i32, height: i32) -> Result<(), EngineError> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::Geometry { width, height });
        }
        let mut st = self.lock();
        st.canvas_width = width;
        st.canvas_height = height;
        Ok(())
    }

    /// Capture the resumable state.
    pub fn snapshot(&self) -> SaveRecord {
        save::capture(&self.lock())
    }

    /// Reconstruct from a record. Always lands in PAUSED.
    pub fn restore(&self, record: &SaveRecord) {
        let mut st = self.lock();
        self.set_state(&mut st, Mode::Paused, None);
        save::apply(&mut st, record);
    }

    /// Map a discrete directional command onto the session. Returns
    /// whether the command was consumed.
    pub fn handle_command(&self, cmd: Command) -> bool {
        let mut st = self.lock();
        match st.mode {
            Mode::Ready
            | Mode::Lose
            | Mode::Win
            | Mode::GameOver
            | Mode::GameFinished
            | Mode::Stopped
                if cmd.is_start_key() =>
            {
                self.do_start(&mut st);
                true
            }
            Mode::Paused if cmd.is_start_key() => {
                self.do_resume(&mut st);
                true
            }
            Mode::Running => match cmd {
                Command::Select => true,
                Command::Left => {
                    self.shared.steering.nudge(-30.0);
                    true
                }
                Command::Right => {
                    self.shared.steering.nudge(30.0);
                    true
                }
                Command::Up => {
                    self.set_state(&mut st, Mode::Paused, None);
                    true
                }
                Command::Down => false,
            },
            _ => false,
        }
    }

    // ── Tick (called by the loop driver) ──

    /// One loop iteration: integrate + evaluate when RUNNING, then
    /// render the current frame. A render failure loses the frame but
    /// never changes mode.
    pub(crate) fn tick(&self, now: Instant, sink: &mut dyn RenderSink) {
        let mut st = self.lock();

        if st.mode == Mode::Running {
            physics::advance(&mut st, now, self.shared.steering.get());
            if let Some(outcome) = rules::evaluate_landing(&mut st) {
                let caught = matches!(outcome, Mode::Lose | Mode::GameOver);
                self.set_state(&mut st, outcome, None);
                let _ = self.events.send(EngineEvent::Landed { caught });
            }
        }

        if let Err(e) = sink.render(&st) {
            let _ = self
                .events
                .send(EngineEvent::FrameFault { detail: e.to_string() });
        }
    }

    // ── Internals ──

    /// Run setup: difficulty and level policy, fresh net placement,
    /// diver recentered at the top, clock parked slightly ahead.
    fn do_start(&self, st: &mut SessionState) {
        // A fresh start after GAME OVER begins a clean playthrough.
        if st.mode == Mode::GameOver {
            st.caught = 0;
        }

        st.goal_width = rules::goal_width(st.difficulty, st.sprite_width);
        let speed_init = rules::initial_speed(st.difficulty, st.tuning.base_speed);
        let speed = rules::speed_for_level(st.game_level, speed_init);

        // Quota trackers are equal exactly at a fresh level start;
        // that is the recompute trigger.
        if st.remaining_in_level == st.level_quota {
            st.level_quota = rules::quota_for_level(st.game_level);
            st.remaining_in_level = st.level_quota;
        }

        st.x = st.canvas_width as f64 / 2.0;
        st.y = st.canvas_height as f64 - st.sprite_height as f64 / 2.0;
        st.dx = 0.0;
        st.dy = speed as f64;
        st.goal_speed = speed;

        st.goal_x = rules::place_net(&mut rand::rng(), st);

        st.last_tick = Instant::now() + Duration::from_millis(st.tuning.start_grace_ms);
        self.set_state(st, Mode::Running, None);
    }

    fn do_resume(&self, st: &mut SessionState) {
        // Move the clock up past the pause gap.
        st.last_tick = Instant::now() + Duration::from_millis(st.tuning.start_grace_ms);
        self.set_state(st, Mode::Running, None);
    }

    /// The single place mode changes and status text is derived.
    fn set_state(&self, st: &mut SessionState, mode: Mode, message: Option<&str>) {
        st.mode = mode;

        if mode == Mode::Running {
            st.status_text.clear();
            st.status_visible = false;
            let _ = self.events.send(EngineEvent::Status {
                text: String::new(),
                visible: false,
            });
            return;
        }

        let base = status_line(mode);

        if mode == Mode::Stopped {
            st.freed = 0;
            st.caught = 0;
            st.game_level = 1;
        }

        let text = match message {
            Some(extra) => format!("{}\n{}", extra, base),
            None => base.to_string(),
        };
        st.status_text = text.clone();
        st.status_visible = true;
        let _ = self.events.send(EngineEvent::Status { text, visible: true });

        if matches!(mode, Mode::GameOver | Mode::GameFinished) {
            let _ = self.events.send(EngineEvent::ShowSummary);
        }
    }
}

/// Base status line per mode. RUNNING has none (the line is hidden).
fn status_line(mode: Mode) -> &'static str {
    match mode {
        Mode::Ready => "Ready — press Up, Down or Enter to drop",
        Mode::Paused => "Paused — press Up, Down or Enter to resume",
        Mode::Lose => "Caught in the net! Press a drop key to go again",
        Mode::Win => "Clean landing — captive freed! Press a drop key",
        Mode::GameOver => "GAME OVER — the guards caught you three times",
        Mode::GameFinished => "Every captive is free. Game finished!",
        Mode::Stopped => "Session stopped",
        Mode::Running => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::landing_threshold;

    struct NullSink;
    impl RenderSink for NullSink {
        fn render(&mut self, _state: &SessionState) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn session() -> (Session, Receiver<EngineEvent>) {
        let (s, rx) = Session::new(Tuning::default());
        s.set_surface_size(80, 24).unwrap();
        (s, rx)
    }

    fn drain(rx: &Receiver<EngineEvent>) -> Vec<EngineEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn start_sets_up_the_run() {
        let (s, rx) = session();
        s.start();
        let st = s.lock();
        assert_eq!(st.mode, Mode::Running);
        assert_eq!(st.level_quota, 50);
        assert_eq!(st.remaining_in_level, 50);
        assert_eq!(st.dy, -30.0); // medium, level 1
        assert_eq!(st.goal_speed, -30);
        assert_eq!(st.goal_width, 3);
        assert!(st.goal_x >= 0 && st.goal_x <= 80 - st.goal_width);
        assert!(!st.status_visible);
        assert!(st.last_tick > Instant::now()); // grace head start
        drop(st);
        assert!(drain(&rx)
            .iter()
            .any(|e| matches!(e, EngineEvent::Status { visible: false, .. })));
    }

    #[test]
    fn start_mid_level_keeps_partial_progress() {
        let (s, _rx) = session();
        s.start();
        {
            let mut st = s.lock();
            st.freed = 1;
            st.remaining_in_level = 49; // one captive already freed
            s.set_state(&mut st, Mode::Win, None);
        }
        s.start();
        let st = s.lock();
        assert_eq!(st.level_quota, 50);
        assert_eq!(st.remaining_in_level, 49);
    }

    #[test]
    fn start_after_level_advance_recomputes_quota() {
        let (s, _rx) = session();
        s.start();
        {
            // Level advance leaves both trackers at zero; the next
            // start sees them equal and pulls the new level's quota.
            let mut st = s.lock();
            st.game_level = 2;
            st.remaining_in_level = 0;
            st.level_quota = 0;
            s.set_state(&mut st, Mode::Win, None);
        }
        s.start();
        let st = s.lock();
        assert_eq!(st.level_quota, 100);
        assert_eq!(st.remaining_in_level, 100);
    }

    #[test]
    fn start_is_ignored_while_running_or_paused() {
        let (s, _rx) = session();
        s.start();
        let dy = s.lock().dy;
        s.start();
        assert_eq!(s.lock().dy, dy);
        s.pause();
        s.start();
        assert_eq!(s.lock().mode, Mode::Paused);
    }

    #[test]
    fn pause_only_from_running_and_idempotent() {
        let (s, _rx) = session();
        s.pause();
        assert_eq!(s.lock().mode, Mode::Ready);

        s.start();
        s.pause();
        assert_eq!(s.lock().mode, Mode::Paused);

        let before = s.lock().status_text.clone();
        s.pause();
        let st = s.lock();
        assert_eq!(st.mode, Mode::Paused);
        assert_eq!(st.status_text, before);
    }

    #[test]
    fn resume_rebases_the_clock() {
        let (s, _rx) = session();
        s.start();
        s.pause();
        s.resume();
        let st = s.lock();
        assert_eq!(st.mode, Mode::Running);
        assert!(st.last_tick > Instant::now());
    }

    #[test]
    fn stop_resets_playthrough_counters() {
        let (s, rx) = session();
        s.start();
        {
            let mut st = s.lock();
            st.freed = 42;
            st.caught = 2;
            st.game_level = 3;
        }
        drain(&rx);
        s.stop(Some("host shutdown"));
        let st = s.lock();
        assert_eq!(st.mode, Mode::Stopped);
        assert_eq!(st.freed, 0);
        assert_eq!(st.caught, 0);
        assert_eq!(st.game_level, 1);
        assert!(st.status_visible);
        assert!(st.status_text.starts_with("host shutdown\n"));
    }

    #[test]
    fn degenerate_surface_is_rejected() {
        let (s, _rx) = session();
        assert!(matches!(
            s.set_surface_size(0, 24),
            Err(EngineError::Geometry { .. })
        ));
        assert!(matches!(
            s.set_surface_size(80, -3),
            Err(EngineError::Geometry { .. })
        ));
        // previous size untouched
        assert_eq!(s.lock().canvas_width, 80);
    }

    #[test]
    fn restore_forces_paused() {
        let (s, _rx) = session();
        s.start();
        {
            let mut st = s.lock();
            st.freed = 12;
            st.caught = 1;
            st.game_level = 2;
        }
        let record = s.snapshot();

        let (fresh, _rx2) = Session::new(Tuning::default());
        fresh.restore(&record);
        let st = fresh.lock();
        assert_eq!(st.mode, Mode::Paused);
        assert_eq!(st.freed, 12);
        assert_eq!(st.caught, 1);
        assert_eq!(st.game_level, 2);
    }

    #[test]
    fn drop_keys_start_and_resume() {
        let (s, _rx) = session();
        assert!(s.handle_command(Command::Down));
        assert_eq!(s.lock().mode, Mode::Running);

        assert!(s.handle_command(Command::Up)); // pause while running
        assert_eq!(s.lock().mode, Mode::Paused);

        assert!(s.handle_command(Command::Select));
        assert_eq!(s.lock().mode, Mode::Running);
    }

    #[test]
    fn steering_keys_nudge_while_running() {
        let (s, _rx) = session();
        assert!(!s.handle_command(Command::Left)); // not running yet
        s.start();
        assert!(s.handle_command(Command::Right));
        assert_eq!(s.steering().get(), 270.0);
        assert!(s.handle_command(Command::Left));
        assert_eq!(s.steering().get(), 9.0 * (270.0 - 30.0));
    }

    #[test]
    fn restart_after_game_over_clears_caught() {
        let (s, _rx) = session();
        s.start();
        {
            let mut st = s.lock();
            st.caught = 3;
        }
        {
            let mut st = s.lock();
            s.set_state(&mut st, Mode::GameOver, None);
        }
        assert!(s.handle_command(Command::Up));
        let st = s.lock();
        assert_eq!(st.mode, Mode::Running);
        assert_eq!(st.caught, 0);
    }

    #[test]
    fn tick_lands_and_transitions() {
        let (s, rx) = session();
        s.start();
        {
            let mut st = s.lock();
            // park the diver just above the ground, clear of the net,
            // with the clock already due
            st.goal_x = 60;
            st.x = 10.0;
            st.y = landing_threshold(&st) + 0.01;
            st.dy = -30.0;
            st.last_tick = Instant::now() - Duration::from_millis(50);
        }
        drain(&rx);
        s.tick(Instant::now(), &mut NullSink);
        let st = s.lock();
        assert_eq!(st.mode, Mode::Win);
        assert_eq!(st.freed, 1);
        assert!(st.status_visible);
        drop(st);
        let events = drain(&rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::Landed { caught: false })));
    }

    #[test]
    fn tick_does_not_integrate_when_paused() {
        let (s, _rx) = session();
        s.start();
        s.pause();
        {
            let mut st = s.lock();
            st.last_tick = Instant::now() - Duration::from_secs(1);
        }
        let y = s.lock().y;
        s.tick(Instant::now(), &mut NullSink);
        assert_eq!(s.lock().y, y);
    }

    #[test]
    fn game_over_fires_summary() {
        let (s, rx) = session();
        s.start();
        {
            let mut st = s.lock();
            st.caught = 2;
            st.goal_x = 30;
            st.goal_width = 20;
            st.x = 40.0; // right onto the net
            st.y = landing_threshold(&st) + 0.01;
            st.last_tick = Instant::now() - Duration::from_millis(50);
        }
        drain(&rx);
        s.tick(Instant::now(), &mut NullSink);
        assert_eq!(s.lock().mode, Mode::GameOver);
        let events = drain(&rx);
        assert!(events.iter().any(|e| *e == EngineEvent::ShowSummary));
    }
}
