/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete. Problems are
/// collected in `warnings` and logged once the subscriber is up, since the
/// log file location itself comes from here.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub player: PlayerConfig,
    pub world_file: PathBuf,
    pub seed: Option<u64>,
    pub log_file: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub fps: u32,             // 0 = unlimited
    pub max_delta_ms: u64,    // 0 = no clamp
    pub clean_period_ms: u64,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub lives: i32,
    pub health: i32,
    pub respawn_invincibility_ms: f64,
    pub hit_invincibility_ms: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            lives: default_lives(),
            health: default_health(),
            respawn_invincibility_ms: default_respawn_invincibility() as f64,
            hit_invincibility_ms: default_hit_invincibility() as f64,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_fps")]
    fps: u32,
    #[serde(default = "default_max_delta")]
    max_delta_ms: u64,
    #[serde(default = "default_clean_period")]
    clean_period_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_lives")]
    lives: i32,
    #[serde(default = "default_health")]
    health: i32,
    #[serde(default = "default_respawn_invincibility")]
    respawn_invincibility_ms: u64,
    #[serde(default = "default_hit_invincibility")]
    hit_invincibility_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_world_file")]
    world_file: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_fps() -> u32 { 30 }
fn default_max_delta() -> u64 { 41 }       // 1000 / 24
fn default_clean_period() -> u64 { 10_000 }
fn default_lives() -> i32 { 3 }
fn default_health() -> i32 { 100 }
fn default_respawn_invincibility() -> u64 { 2000 }
fn default_hit_invincibility() -> u64 { 1000 }
fn default_world_file() -> String { "world.txt".into() }
fn default_log_file() -> String { "caverunner.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            fps: default_fps(),
            max_delta_ms: default_max_delta(),
            clean_period_ms: default_clean_period(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            lives: default_lives(),
            health: default_health(),
            respawn_invincibility_ms: default_respawn_invincibility(),
            hit_invincibility_ms: default_hit_invincibility(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            world_file: default_world_file(),
            seed: None,
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs);
        warnings.append(&mut cfg.warnings);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse a config document directly (no file search).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let parsed = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(parsed, &[]))
    }

    fn from_toml(t: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let mut warnings = Vec::new();
        let mut player = t.player;
        if player.lives < 1 {
            warnings.push(format!("player.lives = {} is invalid, using {}", player.lives, default_lives()));
            player.lives = default_lives();
        }
        if player.health < 1 {
            warnings.push(format!("player.health = {} is invalid, using {}", player.health, default_health()));
            player.health = default_health();
        }

        GameConfig {
            timing: TimingConfig {
                fps: t.timing.fps,
                max_delta_ms: t.timing.max_delta_ms,
                clean_period_ms: t.timing.clean_period_ms,
            },
            player: PlayerConfig {
                lives: player.lives,
                health: player.health,
                respawn_invincibility_ms: player.respawn_invincibility_ms as f64,
                hit_invincibility_ms: player.hit_invincibility_ms as f64,
            },
            world_file: resolve(&t.general.world_file, search_dirs),
            seed: t.general.seed,
            log_file: PathBuf::from(&t.general.log_file),
            warnings,
        }
    }
}

/// Absolute paths as given; relative ones are looked up in the search dirs,
/// falling back to CWD-relative.
fn resolve(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .unwrap_or(path)
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

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("{}: parse error, using defaults: {e}", path.display()));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}
