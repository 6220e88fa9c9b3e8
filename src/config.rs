//! Application-level configuration loading: campaign defaults, tick length and
//! the product catalogue seeded into an empty store.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LED_CAMPAIGN_CONFIG_PATH";
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    defaults: CampaignDefaults,
    tick_interval: Duration,
    seed_products: Vec<SeedProduct>,
}

/// Values used for a fresh campaign record and as fallbacks for zero durations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CampaignDefaults {
    /// Teaser countdown length in seconds.
    pub countdown_seconds: u32,
    /// Reel spin length in seconds.
    pub active_duration: u32,
    /// How long the winner screen stays up, in seconds.
    pub winner_duration: u32,
    /// Banner shown on a fresh record.
    pub banner_text: String,
    /// Scrolling text shown on a fresh record.
    pub marquee_text: String,
    /// Marquee speed keyword understood by the displays.
    pub marquee_speed: String,
}

impl Default for CampaignDefaults {
    fn default() -> Self {
        Self {
            countdown_seconds: 10,
            active_duration: 30,
            winner_duration: 15,
            banner_text: "#RueNights".into(),
            marquee_text: String::new(),
            marquee_speed: "normal".into(),
        }
    }
}

impl CampaignDefaults {
    /// Replace a zero duration with its configured fallback.
    pub fn or_default_countdown(&self, seconds: u32) -> u32 {
        non_zero_or(seconds, self.countdown_seconds)
    }

    /// Replace a zero duration with its configured fallback.
    pub fn or_default_active(&self, seconds: u32) -> u32 {
        non_zero_or(seconds, self.active_duration)
    }

    /// Replace a zero duration with its configured fallback.
    pub fn or_default_winner(&self, seconds: u32) -> u32 {
        non_zero_or(seconds, self.winner_duration)
    }
}

fn non_zero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 { fallback.max(1) } else { value }
}

/// Product inserted into an empty store at boot.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    /// Display name.
    pub name: String,
    /// Image URL or glyph.
    #[serde(default)]
    pub icon_url: String,
    /// Price before any slot discount.
    pub base_price: f64,
    /// Grouping used for catalogue ordering.
    #[serde(default)]
    pub category: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        seed_products = app_config.seed_products.len(),
                        "loaded campaign config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Campaign defaults applied to new records and zero durations.
    pub fn defaults(&self) -> &CampaignDefaults {
        &self.defaults
    }

    /// Length of one timer tick (one "second" of campaign time).
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Products to insert when the store has none.
    pub fn seed_products(&self) -> &[SeedProduct] {
        &self.seed_products
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: CampaignDefaults::default(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            seed_products: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    defaults: CampaignDefaults,
    #[serde(default)]
    tick_interval_ms: Option<u64>,
    #[serde(default)]
    seed_products: Vec<SeedProduct>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let tick_ms = value
            .tick_interval_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TICK_INTERVAL_MS);
        Self {
            defaults: value.defaults,
            tick_interval: Duration::from_millis(tick_ms),
            seed_products: value.seed_products,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        let defaults = CampaignDefaults::default();
        assert_eq!(defaults.or_default_countdown(0), 10);
        assert_eq!(defaults.or_default_active(0), 30);
        assert_eq!(defaults.or_default_winner(0), 15);
        assert_eq!(defaults.or_default_countdown(4), 4);
    }

    #[test]
    fn raw_config_fills_missing_sections() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"defaults":{"countdown_seconds":5},"tick_interval_ms":0}"#)
                .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.defaults().countdown_seconds, 5);
        assert_eq!(config.defaults().active_duration, 30);
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.seed_products().is_empty());
    }
}
