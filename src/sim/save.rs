/// Save and restore of an interrupted session.
///
/// ## Record contents
///
/// The minimal state needed to resume: difficulty, diver position and
/// velocity, sprite dimensions, net geometry and speed, captives
/// freed, times caught, game level. Level-quota progress is NOT
/// persisted; the next run start recomputes it from the level table.
/// Restoring always lands the session in PAUSED.
///
/// ## File format
///
/// Key-value lines (`key=value`), one field per line, written to
/// `session.dat` next to the executable (or under
/// `~/.local/share/skybreak` for system installs). Parsing is strict:
/// a missing or unparseable field makes the whole record invalid.

use std::path::PathBuf;

use crate::domain::state::{Difficulty, SessionState};
use super::error::EngineError;

const SAVE_FILE: &str = "session.dat";

/// A persisted session record.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveRecord {
    pub difficulty: Difficulty,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub sprite_width: i32,
    pub sprite_height: i32,
    pub goal_x: i32,
    pub goal_width: i32,
    pub goal_speed: i32,
    pub freed: u32,
    pub caught: u32,
    pub game_level: u32,
}

// ══════════════════════════════════════════════════════════════
// Capture / apply (SessionState ↔ SaveRecord)
// ══════════════════════════════════════════════════════════════

/// Capture a record from the current session state.
pub fn capture(state: &SessionState) -> SaveRecord {
    SaveRecord {
        difficulty: state.difficulty,
        x: state.x,
        y: state.y,
        dx: state.dx,
        dy: state.dy,
        sprite_width: state.sprite_width,
        sprite_height: state.sprite_height,
        goal_x: state.goal_x,
        goal_width: state.goal_width,
        goal_speed: state.goal_speed,
        freed: state.freed,
        caught: state.caught,
        game_level: state.game_level,
    }
}

/// Apply a record onto a session state. Does not touch `mode`; the
/// caller transitions to PAUSED (always) after applying.
pub fn apply(state: &mut SessionState, record: &SaveRecord) {
    state.difficulty = record.difficulty;
    state.x = record.x;
    state.y = record.y;
    state.dx = record.dx;
    state.dy = record.dy;
    state.sprite_width = record.sprite_width;
    state.sprite_height = record.sprite_height;
    state.goal_x = record.goal_x;
    state.goal_width = record.goal_width;
    state.goal_speed = record.goal_speed;
    state.freed = record.freed;
    state.caught = record.caught;
    state.game_level = record.game_level;
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Exe directory (local/portable installs), if writable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_skybreak");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/skybreak");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn save_path() -> PathBuf {
    save_dir().join(SAVE_FILE)
}

// ══════════════════════════════════════════════════════════════
// File operations
// ══════════════════════════════════════════════════════════════

pub fn write_save(record: &SaveRecord) -> Result<(), EngineError> {
    std::fs::write(save_path(), serialize(record))?;
    Ok(())
}

pub fn read_save() -> Result<SaveRecord, EngineError> {
    let content = std::fs::read_to_string(save_path())?;
    parse(&content)
}

pub fn has_save() -> bool {
    save_path().exists()
}

pub fn delete_save() {
    let _ = std::fs::remove_file(save_path());
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

pub fn serialize(r: &SaveRecord) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(&format!("difficulty={}\n", r.difficulty.as_str()));
    out.push_str(&format!("x={}\n", r.x));
    out.push_str(&format!("y={}\n", r.y));
    out.push_str(&format!("dx={}\n", r.dx));
    out.push_str(&format!("dy={}\n", r.dy));
    out.push_str(&format!("sprite_w={}\n", r.sprite_width));
    out.push_str(&format!("sprite_h={}\n", r.sprite_height));
    out.push_str(&format!("goal_x={}\n", r.goal_x));
    out.push_str(&format!("goal_width={}\n", r.goal_width));
    out.push_str(&format!("goal_speed={}\n", r.goal_speed));
    out.push_str(&format!("freed={}\n", r.freed));
    out.push_str(&format!("caught={}\n", r.caught));
    out.push_str(&format!("level={}\n", r.game_level));
    out
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

fn field<T: std::str::FromStr>(
    value: Option<&str>,
    key: &str,
) -> Result<T, EngineError> {
    let raw = value.ok_or_else(|| EngineError::Data(format!("missing field '{}'", key)))?;
    raw.trim()
        .parse()
        .map_err(|_| EngineError::Data(format!("bad value for '{}': {:?}", key, raw)))
}

pub fn parse(content: &str) -> Result<SaveRecord, EngineError> {
    let mut fields = std::collections::HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                fields.insert(key.trim().to_string(), value.to_string());
            }
            None => return Err(EngineError::Data(format!("not a key=value line: {:?}", line))),
        }
    }

    let get = |key: &str| fields.get(key).map(|s| s.as_str());

    let difficulty_raw =
        get("difficulty").ok_or_else(|| EngineError::Data("missing field 'difficulty'".into()))?;
    let difficulty = Difficulty::parse(difficulty_raw.trim())
        .ok_or_else(|| EngineError::Data(format!("unknown difficulty {:?}", difficulty_raw)))?;

    Ok(SaveRecord {
        difficulty,
        x: field(get("x"), "x")?,
        y: field(get("y"), "y")?,
        dx: field(get("dx"), "dx")?,
        dy: field(get("dy"), "dy")?,
        sprite_width: field(get("sprite_w"), "sprite_w")?,
        sprite_height: field(get("sprite_h"), "sprite_h")?,
        goal_x: field(get("goal_x"), "goal_x")?,
        goal_width: field(get("goal_width"), "goal_width")?,
        goal_speed: field(get("goal_speed"), "goal_speed")?,
        freed: field(get("freed"), "freed")?,
        caught: field(get("caught"), "caught")?,
        game_level: field(get("level"), "level")?,
    })
}
