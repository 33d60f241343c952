use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::cue::{Cue, CueMap};

pub const ROUND_SECONDS: RangeInclusive<u32> = 5..=1800;
pub const REST_SECONDS: RangeInclusive<u32> = 5..=600;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("round count must be at least 1")]
    NoRounds,

    #[error("round length {0}s is outside 0:05..=30:00")]
    RoundSeconds(u32),

    #[error("rest length {0}s is outside 0:05..=10:00")]
    RestSeconds(u32),

    #[error("invalid duration '{0}', expected M:SS or seconds")]
    InvalidClock(String),
}

/// The three numbers that shape a session.
///
/// Fields are only reachable through validating setters, so a value of this
/// type is always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    total_rounds: u32,
    round_seconds: u32,
    rest_seconds: u32,
}

impl TimerConfig {
    pub fn new(total_rounds: u32, round_seconds: u32, rest_seconds: u32) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.set_total_rounds(total_rounds)?;
        cfg.set_round_seconds(round_seconds)?;
        cfg.set_rest_seconds(rest_seconds)?;
        Ok(cfg)
    }

    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    pub fn round_seconds(&self) -> u32 {
        self.round_seconds
    }

    pub fn rest_seconds(&self) -> u32 {
        self.rest_seconds
    }

    pub fn set_total_rounds(&mut self, rounds: u32) -> Result<(), ConfigError> {
        if rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        self.total_rounds = rounds;
        Ok(())
    }

    pub fn set_round_seconds(&mut self, secs: u32) -> Result<(), ConfigError> {
        if !ROUND_SECONDS.contains(&secs) {
            return Err(ConfigError::RoundSeconds(secs));
        }
        self.round_seconds = secs;
        Ok(())
    }

    pub fn set_rest_seconds(&mut self, secs: u32) -> Result<(), ConfigError> {
        if !REST_SECONDS.contains(&secs) {
            return Err(ConfigError::RestSeconds(secs));
        }
        self.rest_seconds = secs;
        Ok(())
    }

    /// Wall time of a full session: every round plus the rests between them.
    pub fn total_seconds(&self) -> u64 {
        let rounds = u64::from(self.total_rounds);
        u64::from(self.round_seconds) * rounds + u64::from(self.rest_seconds) * (rounds - 1)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            total_rounds: 12,
            round_seconds: 180,
            rest_seconds: 60,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
pub enum Preset {
    Amateur,
    Professional,
    #[strum(serialize = "Title Fight")]
    TitleFight,
    #[strum(serialize = "Quick Workout")]
    QuickWorkout,
    #[strum(serialize = "Ultra Quick")]
    UltraQuick,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Amateur,
        Preset::Professional,
        Preset::TitleFight,
        Preset::QuickWorkout,
        Preset::UltraQuick,
    ];

    pub fn timer_config(self) -> TimerConfig {
        let (total_rounds, round_seconds, rest_seconds) = match self {
            Preset::Amateur => (3, 120, 60),
            Preset::Professional | Preset::TitleFight => (12, 180, 60),
            Preset::QuickWorkout => (6, 120, 30),
            Preset::UltraQuick => (3, 10, 5),
        };
        TimerConfig {
            total_rounds,
            round_seconds,
            rest_seconds,
        }
    }
}

/// Parse `M:SS` (or bare seconds) into seconds.
pub fn parse_clock(s: &str) -> Result<u32, ConfigError> {
    let invalid = || ConfigError::InvalidClock(s.to_string());
    let s = s.trim();

    match s.split_once(':') {
        Some((mins, secs)) => {
            let mins: u32 = if mins.is_empty() {
                0
            } else {
                mins.parse().map_err(|_| invalid())?
            };
            let secs: u32 = if secs.is_empty() {
                0
            } else {
                secs.parse().map_err(|_| invalid())?
            };
            if secs >= 60 {
                return Err(invalid());
            }
            mins.checked_mul(60)
                .and_then(|m| m.checked_add(secs))
                .ok_or_else(invalid)
        }
        None => s.parse().map_err(|_| invalid()),
    }
}

/// Format seconds as `M:SS`
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Settings persisted between runs. Timer state itself is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub total_rounds: u32,
    pub round_seconds: u32,
    pub rest_seconds: u32,
    pub volume: u8,
    pub start_sound: Option<PathBuf>,
    pub bell_sound: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let timer = TimerConfig::default();
        Self {
            total_rounds: timer.total_rounds,
            round_seconds: timer.round_seconds,
            rest_seconds: timer.rest_seconds,
            volume: 80,
            start_sound: None,
            bell_sound: None,
        }
    }
}

impl Settings {
    /// Validated timer configuration, or the default when the stored numbers
    /// are out of range.
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::new(self.total_rounds, self.round_seconds, self.rest_seconds).unwrap_or_else(|e| {
            warn!(error = %e, "stored timer settings rejected, using defaults");
            TimerConfig::default()
        })
    }

    pub fn set_timer_config(&mut self, timer: TimerConfig) {
        self.total_rounds = timer.total_rounds;
        self.round_seconds = timer.round_seconds;
        self.rest_seconds = timer.rest_seconds;
    }

    /// Custom sounds that still validate. Bad entries are logged and skipped
    /// so the built-in tone plays instead.
    pub fn cue_map(&self) -> CueMap {
        let mut cues = CueMap::new();
        for (cue, path) in [(Cue::Start, &self.start_sound), (Cue::Bell, &self.bell_sound)] {
            if let Some(path) = path {
                if let Err(e) = cues.set(cue, path) {
                    warn!(%cue, error = %e, "ignoring custom sound");
                }
            }
        }
        cues
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "ringside") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("ringside_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => return settings,
                Err(e) => warn!(path = ?self.path, error = %e, "unreadable settings, using defaults"),
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}
