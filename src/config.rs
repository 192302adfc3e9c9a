use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "FudgeJudge";

const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are the 'Fudge Judge', a character from a viral video. \
You are confused, slightly nonsensical, and you mix up modern slang with official-sounding language. \
You sometimes ask 'Are you a doctor?' or talk about fudge, calling the judge, or sliding in DMs. \
Keep your responses very short, quirky, and in character.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Wait between pausing a running output and repositioning it
    pub reseek_delay_ms: u64,

    /// Interval of position updates while a clip plays
    pub tick_interval_ms: u64,

    /// Output volume (0.0 - 1.0)
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            reseek_delay_ms: 50,
            tick_interval_ms: 50,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of one round in seconds
    pub duration_secs: f64,

    /// Average number of items spawned per second
    pub drops_per_second: f64,

    /// Share of spawned items that are fudge (the rest are gavels)
    pub fudge_ratio: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            drops_per_second: 3.0,
            fudge_ratio: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,

    /// Base URL of the generative language API
    pub endpoint: String,

    /// Environment variable holding the API key; the key itself is never stored
    pub api_key_env: String,

    pub system_instruction: String,

    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub game: GameConfig,
    pub chat: ChatConfig,

    /// Interval of game frames
    pub frame_interval_ms: u64,

    /// Recording to load at startup
    pub audio_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            game: GameConfig::default(),
            chat: ChatConfig::default(),
            frame_interval_ms: 33,
            audio_file: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the platform config directory.
    /// Creates a default config if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let config = if path.exists() {
            let config = Self::load_from(&path)?;
            tracing::info!("Loaded config from: {}", path.display());
            config
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            tracing::info!("Created default config at: {}", path.display());
            config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::LoadFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::SaveFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))
    }

    /// `<config_dir>/FudgeJudge`
    pub fn app_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    /// Reject values the app cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.reseek_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "audio.reseek_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.audio.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "audio.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::Invalid(format!(
                "audio.volume must be between 0 and 1, got {}",
                self.audio.volume
            )));
        }
        if !(self.game.duration_secs > 0.0 && self.game.duration_secs.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "game.duration_secs must be positive, got {}",
                self.game.duration_secs
            )));
        }
        if !(self.game.drops_per_second > 0.0 && self.game.drops_per_second <= 60.0) {
            return Err(ConfigError::Invalid(format!(
                "game.drops_per_second must be in (0, 60], got {}",
                self.game.drops_per_second
            )));
        }
        if !(0.0..=1.0).contains(&self.game.fudge_ratio) {
            return Err(ConfigError::Invalid(format!(
                "game.fudge_ratio must be between 0 and 1, got {}",
                self.game.fudge_ratio
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.chat.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "chat.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reseek_delay(&self) -> Duration {
        Duration::from_millis(self.audio.reseek_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.audio.tick_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
