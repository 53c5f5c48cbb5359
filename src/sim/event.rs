/// Events emitted by the engine for the presentation layer.
/// Sent over an mpsc channel so the engine never touches UI objects
/// it does not own.

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Status line changed on a mode transition. `visible = false`
    /// means the line should be hidden (entering RUNNING).
    Status { text: String, visible: bool },
    /// A landing was evaluated. `caught` distinguishes net hits from
    /// clean drops, for sound cues.
    Landed { caught: bool },
    /// Session reached GAME OVER or GAME FINISHED: show the
    /// end-of-session summary.
    ShowSummary,
    /// A frame failed to render. The frame is lost; the session mode
    /// is unaffected.
    FrameFault { detail: String },
}
