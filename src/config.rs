/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::state::Tuning;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub display: DisplayConfig,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    /// Frame budget for the renderer, milliseconds. The render sink
    /// sleeps out the remainder, which is what paces the loop driver.
    pub frame_ms: u64,
    /// Steering magnitude written while a steering key is held.
    pub key_tilt: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    display: TomlDisplay,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_base_speed")]
    base_speed: i32,
    #[serde(default = "default_start_grace")]
    start_grace_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_key_tilt")]
    key_tilt: f32,
}

// ── Defaults ──

fn default_gravity() -> f64 { 35.0 }
fn default_base_speed() -> i32 { 30 }
fn default_start_grace() -> u64 { 100 }
fn default_frame_ms() -> u64 { 33 }
fn default_key_tilt() -> f32 { 3.0 }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            base_speed: default_base_speed(),
            start_grace_ms: default_start_grace(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            frame_ms: default_frame_ms(),
            key_tilt: default_key_tilt(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        GameConfig {
            tuning: Tuning {
                gravity: toml_cfg.physics.gravity,
                base_speed: toml_cfg.physics.base_speed,
                start_grace_ms: toml_cfg.physics.start_grace_ms,
            },
            display: DisplayConfig {
                frame_ms: toml_cfg.display.frame_ms.max(1),
                key_tilt: toml_cfg.display.key_tilt,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.physics.gravity, 35.0);
        assert_eq!(cfg.physics.base_speed, 30);
        assert_eq!(cfg.display.frame_ms, 33);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str("[physics]\ngravity = 50.0\n").unwrap();
        assert_eq!(cfg.physics.gravity, 50.0);
        assert_eq!(cfg.physics.base_speed, 30);
    }
}
