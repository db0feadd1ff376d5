use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::platform;
use crate::api::{DEFAULT_MAX_RESULTS, MAX_RESULTS_CEILING};
use crate::error::ConfigError;
use crate::event::{GracePeriod, DEFAULT_GRACE_HOURS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Which channel to show, and the credential used to ask about it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub channel_id: String,
    /// `@handle` without the `@`; only used to build the channel's live URL.
    #[serde(default)]
    pub handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// "modal" or "newtab".
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Empty means the local zone.
    #[serde(default)]
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Hours past its scheduled start an unstarted stream is still listed.
    #[serde(default = "default_grace_hours")]
    pub grace_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            mode: default_mode(),
            time_zone: String::new(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            grace_hours: default_grace_hours(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
        }
    }
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_mode() -> String {
    "modal".to_string()
}

fn default_grace_hours() -> f64 {
    DEFAULT_GRACE_HOURS
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    platform::cache_dir()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Validate into the settings a widget instance runs with.
    pub fn widget_config(&self) -> Result<WidgetConfig, ConfigError> {
        let api_key = self.channel.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        let channel_id = self.channel.channel_id.trim();
        if channel_id.is_empty() {
            return Err(ConfigError::MissingChannelId);
        }

        let handle = self.channel.handle.trim().trim_start_matches('@');

        Ok(WidgetConfig {
            api_key: api_key.to_string(),
            channel_id: channel_id.to_string(),
            handle: (!handle.is_empty()).then(|| handle.to_string()),
            max_results: self.display.max_results.clamp(1, MAX_RESULTS_CEILING),
            display_mode: self.display.mode.parse()?,
            time_zone: self.display.time_zone.parse()?,
            grace: GracePeriod::from_hours(self.schedule.grace_hours)?,
        })
    }
}

/// How a selected event is played back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Embedded player over the page.
    #[default]
    Modal,
    /// Canonical watch page in a new browser context.
    NewTab,
}

impl FromStr for DisplayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "modal" => Ok(Self::Modal),
            "newtab" | "new-tab" => Ok(Self::NewTab),
            _ => Err(ConfigError::InvalidDisplayMode(s.to_string())),
        }
    }
}

/// Zone used when formatting times for display. Never affects filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneOverride {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl FromStr for TimeZoneOverride {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        if t.eq_ignore_ascii_case("utc") || t.eq_ignore_ascii_case("z") {
            return Ok(Self::Utc);
        }
        parse_offset(t)
            .map(Self::Fixed)
            .ok_or_else(|| ConfigError::InvalidTimeZone(s.to_string()))
    }
}

/// `+09:00`, `-0530`, `+02`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Validated, immutable settings for one widget instance.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub api_key: String,
    pub channel_id: String,
    pub handle: Option<String>,
    pub max_results: u32,
    pub display_mode: DisplayMode,
    pub time_zone: TimeZoneOverride,
    pub grace: GracePeriod,
}
