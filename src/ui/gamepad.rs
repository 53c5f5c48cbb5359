/// Gamepad input source using gilrs.
///
/// Runs on its own thread and writes the left-stick X axis straight
/// into the steering cell at its own cadence — the analog stand-in
/// for the original tilt sensor, deliberately outside the session
/// lock. D-pad and face buttons go through the same directional
/// command path as the keyboard.
///
/// Compile without the "gamepad" feature to get the no-op stub.

#[cfg(feature = "gamepad")]
mod inner {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    use gilrs::{Axis, Button, EventType, Gilrs};

    use crate::sim::session::{Command, Session};

    const STICK_DEADZONE: f32 = 0.25;
    /// Full stick deflection maps to this steering magnitude.
    const AXIS_SCALE: f32 = 9.0;
    const POLL_SLEEP: Duration = Duration::from_millis(8);

    pub struct GamepadSource {
        stop: Arc<AtomicBool>,
        handle: Option<JoinHandle<()>>,
    }

    impl GamepadSource {
        pub fn spawn(session: Session) -> GamepadSource {
            let stop = Arc::new(AtomicBool::new(false));
            let stop_worker = stop.clone();
            let handle = thread::Builder::new()
                .name("skybreak-gamepad".into())
                .spawn(move || run(session, stop_worker))
                .ok();
            GamepadSource { stop, handle }
        }

        pub fn shutdown(mut self) {
            self.stop.store(true, Ordering::SeqCst);
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn run(session: Session, stop: Arc<AtomicBool>) {
        // Created on this thread; silently absent when no backend.
        let Ok(mut gilrs) = Gilrs::new() else { return };

        while !stop.load(Ordering::SeqCst) {
            while let Some(ev) = gilrs.next_event() {
                match ev.event {
                    EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                        let value = if value.abs() < STICK_DEADZONE { 0.0 } else { value };
                        session.steering().set(value * AXIS_SCALE);
                    }
                    EventType::ButtonPressed(button, _) => {
                        if let Some(cmd) = map_button(button) {
                            session.handle_command(cmd);
                        }
                    }
                    _ => {}
                }
            }
            thread::sleep(POLL_SLEEP);
        }
    }

    fn map_button(button: Button) -> Option<Command> {
        match button {
            Button::DPadUp => Some(Command::Up),
            Button::DPadDown | Button::South | Button::Start => Some(Command::Down),
            Button::DPadLeft => Some(Command::Left),
            Button::DPadRight => Some(Command::Right),
            _ => None,
        }
    }
}

#[cfg(not(feature = "gamepad"))]
mod inner {
    use crate::sim::session::Session;

    pub struct GamepadSource;

    impl GamepadSource {
        pub fn spawn(_session: Session) -> GamepadSource {
            GamepadSource
        }

        pub fn shutdown(self) {}
    }
}

pub use inner::GamepadSource;
