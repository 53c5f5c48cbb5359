/// Loop driver: the worker that owns the tick cadence.
///
/// While the run flag is set, each iteration locks the session, runs
/// physics + landing evaluation when the game is RUNNING, and always
/// renders the current frame. There is no artificial delay in the
/// loop itself; pacing comes from the render sink's own blocking
/// behavior (the terminal renderer sleeps out the remainder of its
/// frame budget).
///
/// Shutdown contract: `shutdown()` clears the run flag and joins the
/// worker, so the in-flight iteration has finished — and the sink
/// will never be touched again — by the time it returns. The host
/// must shut the driver down before tearing down the terminal.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::domain::state::SessionState;
use super::session::Session;

/// Render target consumed once per tick with read access to the
/// session state. Must not mutate game state; a returned error loses
/// that frame only.
pub trait RenderSink: Send {
    fn render(&mut self, state: &SessionState) -> std::io::Result<()>;
}

pub struct LoopDriver {
    session: Session,
    handle: Option<JoinHandle<()>>,
}

impl LoopDriver {
    /// Spawn the worker and start ticking immediately.
    pub fn spawn(session: Session, mut sink: Box<dyn RenderSink>) -> LoopDriver {
        session.set_active(true);
        let worker = session.clone();
        let handle = thread::Builder::new()
            .name("skybreak-loop".into())
            .spawn(move || {
                while worker.is_active() {
                    worker.tick(Instant::now(), sink.as_mut());
                }
            })
            .expect("failed to spawn loop driver thread");
        LoopDriver {
            session,
            handle: Some(handle),
        }
    }

    /// Clear the run flag and wait for the last iteration to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.session.set_active(false);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LoopDriver {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}
