use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::Command;
use crate::engine::scene::RenderPolicy;
use crate::engine::state::Tuning;
use crate::renderer::CellSize;

const MAX_FIGURE_SIZE: f32 = 2000.0;
const MAX_RATE: f32 = 10_000.0;
const MAX_STROKE_WIDTH: f32 = 200.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub key_bindings: KeyBindings,
    pub keywords: Keywords,
    pub tuning: Tuning,
    pub render: RenderPolicy,
    pub raster: CellSize,
    pub host: HostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_jump_keys")]
    pub jump: Vec<String>,
    #[serde(default = "default_shoot_keys")]
    pub shoot: Vec<String>,
    #[serde(default = "default_explode_keys")]
    pub explode: Vec<String>,
    #[serde(default = "default_say_keys")]
    pub say: Vec<String>,
    #[serde(default = "default_quit_keys")]
    pub quit: Vec<String>,
}

fn default_jump_keys() -> Vec<String> { vec!["j".into(), "Up".into()] }
fn default_shoot_keys() -> Vec<String> { vec!["s".into()] }
fn default_explode_keys() -> Vec<String> { vec!["e".into()] }
fn default_say_keys() -> Vec<String> { vec![":".into()] }
fn default_quit_keys() -> Vec<String> { vec!["q".into(), "Esc".into()] }

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            jump: default_jump_keys(),
            shoot: default_shoot_keys(),
            explode: default_explode_keys(),
            say: default_say_keys(),
            quit: default_quit_keys(),
        }
    }
}

impl KeyBindings {
    pub fn command_for(&self, event: &KeyEvent) -> Option<Command> {
        let hit = |bindings: &[String]| bindings.iter().any(|b| matches_binding(b, event));
        if hit(&self.jump) {
            Some(Command::Jump)
        } else if hit(&self.shoot) {
            Some(Command::Shoot)
        } else if hit(&self.explode) {
            Some(Command::Explode)
        } else {
            None
        }
    }

    pub fn is_say(&self, event: &KeyEvent) -> bool {
        self.say.iter().any(|b| matches_binding(b, event))
    }

    pub fn is_quit(&self, event: &KeyEvent) -> bool {
        self.quit.iter().any(|b| matches_binding(b, event))
    }
}

/// Words that trigger each command when found in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keywords {
    #[serde(default = "default_jump_words")]
    pub jump: Vec<String>,
    #[serde(default = "default_shoot_words")]
    pub shoot: Vec<String>,
    #[serde(default = "default_explode_words")]
    pub explode: Vec<String>,
}

fn default_jump_words() -> Vec<String> { vec!["hop".into(), "saute".into(), "jump".into()] }
fn default_shoot_words() -> Vec<String> { vec!["paf".into(), "pan".into(), "shoot".into()] }
fn default_explode_words() -> Vec<String> { vec!["boum".into(), "boom".into(), "explode".into()] }

impl Default for Keywords {
    fn default() -> Self {
        Keywords {
            jump: default_jump_words(),
            shoot: default_shoot_words(),
            explode: default_explode_words(),
        }
    }
}

impl Keywords {
    pub fn for_command(&self, command: Command) -> &[String] {
        match command {
            Command::Jump => &self.jump,
            Command::Shoot => &self.shoot,
            Command::Explode => &self.explode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Target interval between ticks.
    pub tick_ms: u64,
    /// Upper bound for a measured frame delta, in seconds. Keeps the
    /// character from teleporting after the terminal stalls.
    pub max_dt: f32,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            tick_ms: 16,
            max_dt: 0.1,
        }
    }
}

impl Config {
    /// Load the user config, falling back to defaults when it is missing or
    /// broken.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = ?e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tuning;
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !positive(t.gravity) {
            return invalid("tuning.gravity must be positive");
        }
        if !positive(-t.jump_velocity) {
            return invalid("tuning.jump_velocity must be negative (upwards)");
        }
        for command in Command::ALL {
            let (duration, scale) = t.profile(command);
            if !positive(duration) || !positive(scale) {
                return Err(ConfigError::Invalid(format!(
                    "tuning for {command:?} needs a positive duration and scale"
                )));
            }
        }
        if !within(t.figure_size, MAX_FIGURE_SIZE) || t.figure_size <= 0.0 {
            return invalid("tuning.figure_size must be positive and at most 2000");
        }
        for (name, value) in [
            ("tuning.patrol_speed", t.patrol_speed),
            ("tuning.patrol_margin", t.patrol_margin),
            ("tuning.clock_rate", t.clock_rate),
            ("tuning.walk_rate", t.walk_rate),
        ] {
            if !within(value, MAX_RATE) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0 and {MAX_RATE}"
                )));
            }
        }
        for (name, value) in [
            ("render.stroke_width", self.render.stroke_width),
            ("render.separator_width", self.render.separator_width),
        ] {
            if !within(value, MAX_STROKE_WIDTH) || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive and at most {MAX_STROKE_WIDTH}"
                )));
            }
        }
        let h = self.render.horizon_fraction;
        if !positive(h) || h >= 1.0 {
            return invalid("render.horizon_fraction must be between 0 and 1");
        }
        if !positive(self.raster.width_px) || !positive(self.raster.height_px) {
            return invalid("raster cell size must be positive");
        }
        if self.host.tick_ms == 0 {
            return invalid("host.tick_ms must be at least 1");
        }
        if !positive(self.host.max_dt) {
            return invalid("host.max_dt must be positive");
        }
        Ok(())
    }

    /// Title line listing the first keyword of every command.
    pub fn title(&self) -> String {
        let words: Vec<&str> = Command::ALL
            .iter()
            .filter_map(|c| self.keywords.for_command(*c).first())
            .map(String::as_str)
            .collect();
        format!("StickWar - say: {}", words.join(", "))
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("STICKWAR_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("stickwar");
        path.push("config.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Alt-") {
        if !event.modifiers.contains(KeyModifiers::ALT) {
            return false;
        }
        return single_char(rest).is_some_and(|c| event.code == KeyCode::Char(c));
    }

    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return single_char(rest).is_some_and(|c| event.code == KeyCode::Char(c));
    }

    // Plain bindings must not fire on Ctrl/Alt chords.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    match binding {
        "Right" => event.code == KeyCode::Right,
        "Left" => event.code == KeyCode::Left,
        "Up" => event.code == KeyCode::Up,
        "Down" => event.code == KeyCode::Down,
        "Enter" => event.code == KeyCode::Enter,
        "Esc" => event.code == KeyCode::Esc,
        "Space" => event.code == KeyCode::Char(' '),
        "Tab" => event.code == KeyCode::Tab,
        s => {
            if let Some(n) = s.strip_prefix('F').and_then(|rest| rest.parse::<u8>().ok()) {
                return event.code == KeyCode::F(n);
            }
            single_char(s).is_some_and(|c| event.code == KeyCode::Char(c))
        }
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Finite and in `0..=max`.
fn within(v: f32, max: f32) -> bool {
    v.is_finite() && (0.0..=max).contains(&v)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::ColorPolicy;
    use crate::types::Color;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn default_bindings_map_to_commands() {
        let kb = KeyBindings::default();
        assert_eq!(kb.command_for(&key(KeyCode::Char('j'))), Some(Command::Jump));
        assert_eq!(kb.command_for(&key(KeyCode::Up)), Some(Command::Jump));
        assert_eq!(kb.command_for(&key(KeyCode::Char('s'))), Some(Command::Shoot));
        assert_eq!(kb.command_for(&key(KeyCode::Char('e'))), Some(Command::Explode));
        assert_eq!(kb.command_for(&key(KeyCode::Char('x'))), None);
        assert!(kb.is_quit(&key(KeyCode::Esc)));
        assert!(kb.is_say(&key(KeyCode::Char(':'))));
    }

    #[test]
    fn plain_binding_ignores_chords() {
        let alt_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::ALT);
        assert!(!matches_binding("s", &alt_s));
        assert!(matches_binding("Alt-s", &alt_s));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches_binding("Ctrl-c", &ctrl_c));
        assert!(!matches_binding("Ctrl-cc", &ctrl_c));
        assert!(matches_binding("F5", &key(KeyCode::F(5))));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let json = r#"{
            "tuning": { "gravity": 1200.0 },
            "render": { "color": { "rule": "fixed", "color": "red" } },
            "keywords": { "jump": ["springen"] }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.tuning.gravity, 1200.0);
        assert_eq!(config.tuning.jump_velocity, -600.0);
        assert_eq!(
            config.render.color,
            ColorPolicy::Fixed {
                color: Color::Named(crate::types::NamedColor::Red)
            }
        );
        assert_eq!(config.render.horizon_fraction, 0.5);
        assert_eq!(config.keywords.jump, vec!["springen".to_string()]);
        assert_eq!(config.keywords.shoot, default_shoot_words());
        assert_eq!(config.host.tick_ms, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_physics() {
        let mut config = Config::default();
        config.tuning.jump_velocity = 100.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.tuning.shoot_duration = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.render.horizon_fraction = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.host.tick_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validation_rejects_oversized_or_non_finite_geometry() {
        let mut config = Config::default();
        config.tuning.figure_size = 1e30;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.tuning.clock_rate = f32::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.tuning.walk_rate = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.render.stroke_width = 1e9;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.tuning.patrol_speed = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_path_reports_typed_errors() {
        let dir = std::env::temp_dir().join(format!("stickwar-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.json");
        assert!(matches!(
            Config::from_path(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Config::from_path(&broken),
            Err(ConfigError::Parse { .. })
        ));

        let good = dir.join("good.json");
        std::fs::write(&good, r#"{"host": {"tick_ms": 33}}"#).unwrap();
        assert_eq!(Config::from_path(&good).unwrap().host.tick_ms, 33);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn title_lists_first_keywords() {
        assert_eq!(Config::default().title(), "StickWar - say: hop, paf, boum");
    }
}
