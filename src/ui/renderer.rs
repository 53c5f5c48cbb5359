/// Presentation layer: row-diffing terminal renderer.
///
/// Implements the loop driver's `RenderSink`. Each frame is composed
/// as plain text rows off-screen, then only rows that changed since
/// the previous frame are emitted (batched with `queue!`, one flush).
/// After flushing, the renderer sleeps out the remainder of its frame
/// budget — that sleep is what paces the loop driver, which itself
/// runs without delay.
///
/// Screen layout (canvas coordinates, top-left origin):
///   - HUD counters in the top-left corner
///   - status text centered when visible
///   - net band on the bottom rows
///   - the diver sprite wherever physics put it
///   - summary panel over everything on GAME OVER / GAME FINISHED

use std::io::{self, BufWriter, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};

use crate::config::DisplayConfig;
use crate::domain::rules::NET_HEIGHT;
use crate::domain::state::{Mode, SessionState};
use crate::sim::driver::RenderSink;

const SPRITE_ALIVE: [&str; 2] = [" o ", "/|\\"];
const SPRITE_CAUGHT: [&str; 2] = [" x ", "/|\\"];

pub struct TermRenderer {
    writer: BufWriter<Stdout>,
    frame_budget: Duration,
    last_frame: Instant,
    prev_rows: Vec<String>,
    prev_size: (usize, usize),
}

impl TermRenderer {
    pub fn new(display: &DisplayConfig) -> Self {
        TermRenderer {
            writer: BufWriter::new(io::stdout()),
            frame_budget: Duration::from_millis(display.frame_ms),
            last_frame: Instant::now(),
            prev_rows: Vec::new(),
            prev_size: (0, 0),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        )
    }

    /// Undo `init`. Associated function: by teardown time the
    /// renderer instance has already been consumed by the loop driver.
    pub fn restore_terminal() -> io::Result<()> {
        execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Current terminal size, for the initial surface dimensions.
    pub fn surface_size() -> (i32, i32) {
        let (w, h) = terminal::size().unwrap_or((80, 24));
        (w as i32, h as i32)
    }

    // ── Frame composition ──

    fn compose(&self, st: &SessionState) -> Vec<String> {
        let w = st.canvas_width.max(1) as usize;
        let h = st.canvas_height.max(1) as usize;
        let mut grid = vec![vec![' '; w]; h];

        // Net band on the bottom rows
        for band_row in 0..NET_HEIGHT.min(st.canvas_height) as usize {
            let y = h - 1 - band_row;
            for x in st.goal_x..(st.goal_x + st.goal_width).min(st.canvas_width) {
                if x >= 0 {
                    grid[y][x as usize] = '█';
                }
            }
        }

        // Diver sprite
        let sprite = if matches!(st.mode, Mode::Lose | Mode::GameOver) {
            SPRITE_CAUGHT
        } else {
            SPRITE_ALIVE
        };
        let rect = st.diver_rect();
        for (row, line) in sprite.iter().enumerate() {
            let y = rect.top + row as i32;
            if y < 0 || y >= st.canvas_height {
                continue;
            }
            for (col, ch) in line.chars().enumerate() {
                let x = rect.left + col as i32;
                if ch != ' ' && x >= 0 && x < st.canvas_width {
                    grid[y as usize][x as usize] = ch;
                }
            }
        }

        let mut rows: Vec<String> = grid.into_iter().map(|r| r.into_iter().collect()).collect();

        // HUD, same counters and order as the in-game scoreboard
        put(&mut rows, 1, 1, &format!("Freed: {}", st.freed));
        put(&mut rows, 1, 2, &format!("Remaining: {}", st.remaining_in_level));
        put(&mut rows, 1, 3, &format!("Level: {}", st.game_level));
        put(&mut rows, 1, 4, &format!("Caught: {}", st.caught));

        // Status text, centered
        if st.status_visible {
            let lines: Vec<&str> = st.status_text.lines().collect();
            let start = (h / 2).saturating_sub(lines.len() / 2);
            for (i, line) in lines.iter().enumerate() {
                let x = (w.saturating_sub(line.chars().count())) / 2;
                put(&mut rows, x, start + i, line);
            }
        }

        // End-of-session summary panel
        if matches!(st.mode, Mode::GameOver | Mode::GameFinished) {
            let heading = if st.mode == Mode::GameFinished {
                "MISSION COMPLETE"
            } else {
                "CAPTURED"
            };
            let body = [
                heading.to_string(),
                String::new(),
                format!("Captives freed: {}", st.freed),
                format!("Times caught:   {}", st.caught),
                String::new(),
                "Drop key: play again   Esc: quit".to_string(),
            ];
            let start = (h / 2).saturating_sub(body.len() / 2) + 3;
            for (i, line) in body.iter().enumerate() {
                let x = (w.saturating_sub(line.chars().count())) / 2;
                put(&mut rows, x, start + i, line);
            }
        }

        rows
    }
}

/// Overlay `text` at (x, y), clipped to the row width.
fn put(rows: &mut [String], x: usize, y: usize, text: &str) {
    let Some(row) = rows.get_mut(y) else { return };
    let width = row.chars().count();
    if x >= width {
        return;
    }
    let chars: Vec<char> = row.chars().collect();
    let mut out: String = chars[..x].iter().collect();
    let mut used = x;
    for ch in text.chars() {
        if used >= width {
            break;
        }
        out.push(ch);
        used += 1;
    }
    out.extend(chars[used..].iter());
    *row = out;
}

impl RenderSink for TermRenderer {
    fn render(&mut self, st: &SessionState) -> io::Result<()> {
        let rows = self.compose(st);
        let size = (st.canvas_width as usize, st.canvas_height as usize);

        if size != self.prev_size {
            // Surface changed: full repaint
            queue!(self.writer, Clear(ClearType::All))?;
            self.prev_rows.clear();
            self.prev_size = size;
        }

        for (y, row) in rows.iter().enumerate() {
            if self.prev_rows.get(y) != Some(row) {
                queue!(self.writer, MoveTo(0, y as u16), Print(row))?;
            }
        }
        self.writer.flush()?;
        self.prev_rows = rows;

        // Sleep out the frame budget — this paces the whole loop.
        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
        self.last_frame = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::Tuning;

    fn frame(st: &SessionState) -> Vec<String> {
        let renderer = TermRenderer::new(&DisplayConfig { frame_ms: 33, key_tilt: 3.0 });
        renderer.compose(st)
    }

    fn state() -> SessionState {
        let mut st = SessionState::new(Tuning::default());
        st.canvas_width = 40;
        st.canvas_height = 12;
        st.goal_x = 20;
        st.goal_width = 3;
        st
    }

    fn span(rows: &[String], y: usize, x: std::ops::Range<usize>) -> String {
        rows[y].chars().skip(x.start).take(x.end - x.start).collect()
    }

    #[test]
    fn net_band_is_drawn_on_the_bottom_rows() {
        let rows = frame(&state());
        assert_eq!(span(&rows, 11, 20..23), "███");
        assert_eq!(span(&rows, 10, 20..23), "███");
        assert_eq!(span(&rows, 9, 20..23), "   ");
    }

    #[test]
    fn hud_shows_the_counters() {
        let mut st = state();
        st.freed = 5;
        st.caught = 2;
        st.game_level = 3;
        st.remaining_in_level = 145;
        let rows = frame(&st);
        assert!(rows[1].contains("Freed: 5"));
        assert!(rows[2].contains("Remaining: 145"));
        assert!(rows[3].contains("Level: 3"));
        assert!(rows[4].contains("Caught: 2"));
    }

    #[test]
    fn status_text_appears_when_visible() {
        let mut st = state();
        st.status_text = "Paused".to_string();
        st.status_visible = true;
        let rows = frame(&st);
        assert!(rows.iter().any(|r| r.contains("Paused")));
    }

    #[test]
    fn summary_panel_on_game_finished() {
        let mut st = state();
        st.mode = Mode::GameFinished;
        st.status_visible = false;
        let rows = frame(&st);
        assert!(rows.iter().any(|r| r.contains("MISSION COMPLETE")));
    }

    #[test]
    fn overlay_clips_at_the_right_edge() {
        let mut rows = vec!["          ".to_string()];
        put(&mut rows, 6, 0, "overflowing");
        assert_eq!(rows[0], "      over");
        assert_eq!(rows[0].chars().count(), 10);
    }
}
