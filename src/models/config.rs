//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use super::MessageTemplates;
use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Channels whose subscriber counts are tracked
    #[serde(default)]
    pub channels: Vec<TrackedSpec>,

    /// Playlists whose videos are tracked
    #[serde(default)]
    pub playlists: Vec<TrackedSpec>,

    /// Subscriber milestones, in notification order
    #[serde(default)]
    pub subscriber_thresholds: Vec<u64>,

    /// View-count milestones, in notification order
    #[serde(default)]
    pub view_thresholds: Vec<u64>,

    /// Log level (`debug`, `info`, `warn`, `error`)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Video platform API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Notification sink settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Polling cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Notification text templates
    #[serde(default)]
    pub messages: MessageTemplates,
}

impl Config {
    /// Load configuration from a `.json` or TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Threshold lists applied to every channel and video.
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            subscribers: self.subscriber_thresholds.clone(),
            views: self.view_thresholds.clone(),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if !(1..=50).contains(&self.api.page_size) {
            return Err(AppError::validation("api.page_size must be within 1..=50"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.notify.social.max_chars == 0 {
            return Err(AppError::validation("notify.social.max_chars must be > 0"));
        }
        if let Some(spec) = self
            .channels
            .iter()
            .chain(&self.playlists)
            .find(|spec| spec.id.trim().is_empty())
        {
            return Err(AppError::validation(format!(
                "tracked entry '{}' has an empty id",
                spec.desc
            )));
        }

        Url::parse(&self.api.base_url)?;
        Url::parse(&self.notify.social.endpoint)?;
        if let Some(webhook) = &self.notify.discord_webhook_url {
            Url::parse(webhook)?;
        }
        Ok(())
    }
}

/// A channel or playlist to fetch every cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedSpec {
    /// Channel or playlist ID
    pub id: String,

    /// Human-readable label used in notifications
    #[serde(default)]
    pub desc: String,

    /// Also post this entity's events to the secondary sink
    #[serde(default)]
    pub twitter_enabled: bool,
}

/// Milestone thresholds shared by all channels / all videos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub subscribers: Vec<u64>,
    pub views: Vec<u64>,
}

/// Video platform API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Data API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// API key sent as the `key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay after each metric request in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Playlist items requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            api_key: None,
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            page_size: defaults::page_size(),
        }
    }
}

/// Notification sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Primary sink: Discord webhook URL (unset disables it)
    #[serde(default)]
    pub discord_webhook_url: Option<String>,

    /// Delay after each sink call in milliseconds
    #[serde(default = "defaults::dispatch_delay")]
    pub dispatch_delay_ms: u64,

    /// Secondary sink: social post API
    #[serde(default)]
    pub social: SocialConfig,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            discord_webhook_url: None,
            dispatch_delay_ms: defaults::dispatch_delay(),
            social: SocialConfig::default(),
        }
    }
}

/// Social post API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Post creation endpoint
    #[serde(default = "defaults::social_endpoint")]
    pub endpoint: String,

    /// Bearer token (unset disables the secondary sink)
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Maximum post length in characters
    #[serde(default = "defaults::max_chars")]
    pub max_chars: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::social_endpoint(),
            bearer_token: None,
            max_chars: defaults::max_chars(),
        }
    }
}

/// Polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Run on multiples of the interval (e.g. top of the hour)
    #[serde(default = "defaults::align")]
    pub align_to_interval: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            align_to_interval: defaults::align(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Persisted snapshot JSON
    #[serde(default = "defaults::snapshot_file")]
    pub snapshot_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshot_file: defaults::snapshot_file(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "https://www.googleapis.com/youtube/v3".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; tubewatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn page_size() -> u32 {
        50
    }

    // Notify defaults
    pub fn dispatch_delay() -> u64 {
        1000
    }
    pub fn social_endpoint() -> String {
        "https://api.twitter.com/2/tweets".into()
    }
    pub fn max_chars() -> usize {
        280
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        3600
    }
    pub fn align() -> bool {
        true
    }

    // Path defaults
    pub fn snapshot_file() -> String {
        "data/data.json".into()
    }
}
