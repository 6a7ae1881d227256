//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default base URL for the Meetup API.
fn default_meetup_api_base() -> String {
    "https://api.meetup.com".to_string()
}

/// Default path of the persisted bot state document.
fn default_state_path() -> String {
    "./data/state.json".to_string()
}

/// Default RSVP poll interval, in seconds.
fn default_poll_interval_secs() -> u64 {
    60
}

/// Default new-event discovery interval, in seconds.
fn default_discovery_interval_secs() -> u64 {
    300
}

/// Default startup grace period before RSVP announcements begin, in seconds.
fn default_warm_up_secs() -> u64 {
    60
}

/// Default port for the liveness endpoint.
fn default_health_port() -> u16 {
    8080
}

/// Default number of upcoming events fetched per group.
fn default_upcoming_page_size() -> u32 {
    10
}

/// Configuration for the rsvp-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Shared, clonable configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Configuration values for the rsvp-bot application.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Channel that receives event announcements and status messages (`RSVP_CHANNEL_ID`).
    pub rsvp_channel_id: String,
    /// Meetup API key (`MEETUP_API_KEY`).
    pub meetup_api_key: String,
    /// Meetup API base URL (`MEETUP_API_BASE`).
    #[serde(default = "default_meetup_api_base")]
    pub meetup_api_base: String,
    /// Path of the persisted state document (`STATE_PATH`).
    #[serde(default = "default_state_path")]
    pub state_path: String,
    /// RSVP poll interval in seconds (`POLL_INTERVAL_SECS`).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// New-event discovery interval in seconds (`DISCOVERY_INTERVAL_SECS`).
    /// Discovery is expected to run on a slower cadence than the RSVP poll.
    #[serde(default = "default_discovery_interval_secs")]
    pub discovery_interval_secs: u64,
    /// Grace period after startup during which pre-existing RSVPs are absorbed
    /// without individual announcements (`WARM_UP_SECS`).
    #[serde(default = "default_warm_up_secs")]
    pub warm_up_secs: u64,
    /// Port for the liveness endpoint (`HEALTH_PORT`).
    #[serde(default = "default_health_port")]
    pub health_port: u16,
    /// Number of upcoming events fetched per group (`UPCOMING_PAGE_SIZE`).
    #[serde(default = "default_upcoming_page_size")]
    pub upcoming_page_size: u32,
}

impl Config {
    /// Load configuration from an optional explicit file path, falling back to
    /// `.hidden/config.toml` if present, with environment variable overrides.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("RSVP_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("Poll interval must be at least one second."));
        }

        if result.discovery_interval_secs < result.poll_interval_secs {
            return Err(anyhow::anyhow!("Discovery interval must not be shorter than the poll interval."));
        }

        if result.upcoming_page_size < 1 || result.upcoming_page_size > 200 {
            return Err(anyhow::anyhow!("Upcoming page size must be between 1 and 200."));
        }

        Ok(result)
    }
}
