/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Missing file or missing keys fall back to defaults; a broken file is
/// reported as a `ConfigError` and the caller decides what to do with it.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ── Errors ──

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub dungeon: DungeonConfig,
    pub combat: CombatConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

/// Level generation parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct DungeonConfig {
    pub width: usize,
    pub height: usize,
    pub wall_density: f64,
    pub enemy_count: usize,
    pub treasure_count: usize,
    pub trap_count: usize,
    /// Enemies spawn strictly farther than this (Manhattan) from the player.
    pub enemy_spawn_distance: i32,
    /// Random tries per entity before falling back to a scan.
    pub placement_attempts: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CombatConfig {
    pub max_health: i32,
    pub trap_damage: i32,
    pub collision_damage: i32,   // player walks into an enemy
    pub enemy_attack_damage: i32, // enemy strikes from an adjacent cell
    pub enemy_health: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub frame_ms: u64,
    /// Frames between enemy turns.
    pub enemy_turn_interval: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub restart: Vec<String>,
    pub quit: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    dungeon: TomlDungeon,
    #[serde(default)]
    combat: TomlCombat,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlDungeon {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
    #[serde(default = "default_wall_density")]
    wall_density: f64,
    #[serde(default = "default_enemy_count")]
    enemy_count: usize,
    #[serde(default = "default_treasure_count")]
    treasure_count: usize,
    #[serde(default = "default_trap_count")]
    trap_count: usize,
    #[serde(default = "default_enemy_spawn_distance")]
    enemy_spawn_distance: i32,
    #[serde(default = "default_placement_attempts")]
    placement_attempts: u32,
}

#[derive(Deserialize, Debug)]
struct TomlCombat {
    #[serde(default = "default_max_health")]
    max_health: i32,
    #[serde(default = "default_trap_damage")]
    trap_damage: i32,
    #[serde(default = "default_collision_damage")]
    collision_damage: i32,
    #[serde(default = "default_enemy_attack_damage")]
    enemy_attack_damage: i32,
    #[serde(default = "default_enemy_health")]
    enemy_health: i32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_enemy_turn_interval")]
    enemy_turn_interval: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_width() -> usize { 20 }
fn default_height() -> usize { 15 }
fn default_wall_density() -> f64 { 0.1 }
fn default_enemy_count() -> usize { 5 }
fn default_treasure_count() -> usize { 10 }
fn default_trap_count() -> usize { 8 }
fn default_enemy_spawn_distance() -> i32 { 5 }
fn default_placement_attempts() -> u32 { 1000 }

fn default_max_health() -> i32 { 100 }
fn default_trap_damage() -> i32 { 10 }
fn default_collision_damage() -> i32 { 20 }
fn default_enemy_attack_damage() -> i32 { 10 }
fn default_enemy_health() -> i32 { 50 }

fn default_frame_ms() -> u64 { 16 }          // ~60 fps
fn default_enemy_turn_interval() -> u32 { 15 } // 4 enemy turns per second at 60 fps

fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }
fn default_pad_pause() -> Vec<String> { vec!["North".into()] }

impl Default for TomlDungeon {
    fn default() -> Self {
        TomlDungeon {
            width: default_width(),
            height: default_height(),
            wall_density: default_wall_density(),
            enemy_count: default_enemy_count(),
            treasure_count: default_treasure_count(),
            trap_count: default_trap_count(),
            enemy_spawn_distance: default_enemy_spawn_distance(),
            placement_attempts: default_placement_attempts(),
        }
    }
}

impl Default for TomlCombat {
    fn default() -> Self {
        TomlCombat {
            max_health: default_max_health(),
            trap_damage: default_trap_damage(),
            collision_damage: default_collision_damage(),
            enemy_attack_damage: default_enemy_attack_damage(),
            enemy_health: default_enemy_health(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            enemy_turn_interval: default_enemy_turn_interval(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            restart: default_pad_restart(),
            quit: default_pad_quit(),
            pause: default_pad_pause(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            dungeon: DungeonConfig {
                width: t.dungeon.width,
                height: t.dungeon.height,
                wall_density: t.dungeon.wall_density,
                enemy_count: t.dungeon.enemy_count,
                treasure_count: t.dungeon.treasure_count,
                trap_count: t.dungeon.trap_count,
                enemy_spawn_distance: t.dungeon.enemy_spawn_distance,
                placement_attempts: t.dungeon.placement_attempts,
            },
            combat: CombatConfig {
                max_health: t.combat.max_health,
                trap_damage: t.combat.trap_damage,
                collision_damage: t.combat.collision_damage,
                enemy_attack_damage: t.combat.enemy_attack_damage,
                enemy_health: t.combat.enemy_health,
            },
            timing: TimingConfig {
                frame_ms: t.timing.frame_ms,
                enemy_turn_interval: t.timing.enemy_turn_interval,
            },
            gamepad: GamepadConfig {
                restart: t.gamepad.restart,
                quit: t.gamepad.quit,
                pause: t.gamepad.pause,
            },
            seed: t.general.seed,
            log_file: t.general.log_file.filter(|s| !s.is_empty()).map(PathBuf::from),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

impl Default for DungeonConfig {
    fn default() -> Self {
        GameConfig::default().dungeon
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        GameConfig::default().combat
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// No file anywhere = defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match find_config_file(&candidate_dirs()) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig::from(parsed);
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.dungeon;
        if d.width < 5 || d.height < 5 {
            return Err(ConfigError::Invalid(format!(
                "dungeon must be at least 5x5, got {}x{}", d.width, d.height
            )));
        }
        if !(0.0..1.0).contains(&d.wall_density) {
            return Err(ConfigError::Invalid(format!(
                "wall_density must be in [0, 1), got {}", d.wall_density
            )));
        }
        let c = &self.combat;
        if c.max_health < 1 {
            return Err(ConfigError::Invalid("max_health must be at least 1".into()));
        }
        for (name, value) in [
            ("trap_damage", c.trap_damage),
            ("collision_damage", c.collision_damage),
            ("enemy_attack_damage", c.enemy_attack_damage),
        ] {
            if value < 0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }
        if self.timing.enemy_turn_interval == 0 {
            return Err(ConfigError::Invalid("enemy_turn_interval must be at least 1".into()));
        }
        if self.timing.frame_ms == 0 {
            return Err(ConfigError::Invalid("frame_ms must be at least 1".into()));
        }
        Ok(())
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

fn find_config_file(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter()
        .map(|d| d.join("config.toml"))
        .find(|p| p.is_file())
}
