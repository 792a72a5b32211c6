//! [`Settings`]: every operator-tunable knob named in the distilled spec's
//! configuration table, plus the ambient knobs the expanded spec adds for
//! the enricher worker pool and subscriber hub.

use super::validation::{require_fraction, require_in_range_usize, require_positive};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Idle timeout for camp-family sessions, in minutes.
    #[serde(default = "default_camp_timeout_min")]
    pub camp_timeout_min: u64,

    /// Idle timeout for non-camp sessions, in minutes.
    #[serde(default = "default_roam_timeout_min")]
    pub roam_timeout_min: u64,

    /// Minutes of idleness before probability begins to decay.
    #[serde(default = "default_decay_start_min")]
    pub decay_start_min: f64,

    /// Linear decay fraction applied per minute past `decay_start_min`.
    #[serde(default = "default_decay_rate_per_min")]
    pub decay_rate_per_min: f64,

    /// Expiry/archive scan cadence, in milliseconds.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Number of concurrent enrichment workers (nominal 4-16).
    #[serde(default = "default_enrich_workers")]
    pub enrich_workers: usize,

    /// Per-call timeout for a single enrichment round-trip, in milliseconds.
    #[serde(default = "default_enrich_timeout_ms")]
    pub enrich_timeout_ms: u64,

    /// Bounded outbound queue depth per subscriber (latest-wins on overflow).
    #[serde(default = "default_subscriber_queue_depth")]
    pub subscriber_queue_depth: usize,

    /// Subscriber liveness ping interval, in seconds.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Long-poll request timeout against the upstream feed, in seconds.
    #[serde(default = "default_feed_poll_timeout_secs")]
    pub feed_poll_timeout_secs: u64,

    /// Ceiling on the feed reconnect backoff, in seconds.
    #[serde(default = "default_feed_backoff_ceiling_secs")]
    pub feed_backoff_ceiling_secs: u64,

    /// Upstream killmail feed URL.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Postgres DSN for the durable archive.
    #[serde(default)]
    pub archive_dsn: String,

    /// HTTP/WebSocket bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_camp_timeout_min() -> u64 {
    40
}
fn default_roam_timeout_min() -> u64 {
    25
}
fn default_decay_start_min() -> f64 {
    5.0
}
fn default_decay_rate_per_min() -> f64 {
    0.10
}
fn default_update_interval_ms() -> u64 {
    30_000
}
fn default_enrich_workers() -> usize {
    8
}
fn default_enrich_timeout_ms() -> u64 {
    2_000
}
fn default_subscriber_queue_depth() -> usize {
    4
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_feed_poll_timeout_secs() -> u64 {
    10
}
fn default_feed_backoff_ceiling_secs() -> u64 {
    60
}
fn default_feed_url() -> String {
    "https://zkillboard.com/api/feed".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camp_timeout_min: default_camp_timeout_min(),
            roam_timeout_min: default_roam_timeout_min(),
            decay_start_min: default_decay_start_min(),
            decay_rate_per_min: default_decay_rate_per_min(),
            update_interval_ms: default_update_interval_ms(),
            enrich_workers: default_enrich_workers(),
            enrich_timeout_ms: default_enrich_timeout_ms(),
            subscriber_queue_depth: default_subscriber_queue_depth(),
            ping_interval_secs: default_ping_interval_secs(),
            feed_poll_timeout_secs: default_feed_poll_timeout_secs(),
            feed_backoff_ceiling_secs: default_feed_backoff_ceiling_secs(),
            feed_url: default_feed_url(),
            archive_dsn: String::new(),
            port: default_port(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(path, e) => write!(f, "settings I/O error ({}): {}", path.display(), e),
            SettingsError::Parse(path, e) => write!(f, "settings parse error ({}): {}", path.display(), e),
            SettingsError::Validation(errors) => {
                writeln!(f, "settings validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Settings {
    /// Loads settings using the standard search order documented on the
    /// module, then overlays the three endpoint env vars.
    pub fn load() -> Self {
        let mut settings = if let Ok(path) = std::env::var("GATEWATCH_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(settings) => {
                        info!(path = %path.display(), "loaded settings from GATEWATCH_CONFIG");
                        settings
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to load GATEWATCH_CONFIG, falling back");
                        Self::load_local_or_default()
                    }
                }
            } else {
                warn!(path = %path.display(), "GATEWATCH_CONFIG points to a non-existent file, falling back");
                Self::load_local_or_default()
            }
        } else {
            Self::load_local_or_default()
        };

        if let Ok(url) = std::env::var("FEED_URL") {
            settings.feed_url = url;
        }
        if let Ok(dsn) = std::env::var("ARCHIVE_DSN") {
            settings.archive_dsn = dsn;
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => settings.port = port,
                Err(e) => warn!(value = %port, error = %e, "ignoring invalid PORT env var"),
            }
        }

        settings
    }

    fn load_local_or_default() -> Self {
        let local = PathBuf::from("gatewatch.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(settings) => {
                    info!("loaded settings from ./gatewatch.toml");
                    return settings;
                }
                Err(e) => warn!(error = %e, "failed to load ./gatewatch.toml, using defaults"),
            }
        }
        info!("no gatewatch.toml found, using built-in defaults");
        Self::default()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SettingsError::Io(path.to_path_buf(), e))?;
        let settings: Self = toml::from_str(&contents).map_err(|e| SettingsError::Parse(path.to_path_buf(), e))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = Vec::new();

        require_positive(&mut errors, "camp_timeout_min", self.camp_timeout_min as f64);
        require_positive(&mut errors, "roam_timeout_min", self.roam_timeout_min as f64);
        require_positive(&mut errors, "decay_start_min", self.decay_start_min);
        require_fraction(&mut errors, "decay_rate_per_min", self.decay_rate_per_min);
        require_positive(&mut errors, "update_interval_ms", self.update_interval_ms as f64);
        require_in_range_usize(&mut errors, "enrich_workers", self.enrich_workers, 1, 64);
        require_positive(&mut errors, "enrich_timeout_ms", self.enrich_timeout_ms as f64);
        require_in_range_usize(&mut errors, "subscriber_queue_depth", self.subscriber_queue_depth, 1, 1024);
        require_positive(&mut errors, "ping_interval_secs", self.ping_interval_secs as f64);
        require_positive(&mut errors, "feed_poll_timeout_secs", self.feed_poll_timeout_secs as f64);
        require_positive(&mut errors, "feed_backoff_ceiling_secs", self.feed_backoff_ceiling_secs as f64);
        if self.feed_url.is_empty() {
            errors.push("feed_url must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let settings: Settings = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(settings.camp_timeout_min, 40);
        assert_eq!(settings.decay_rate_per_min, 0.10);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let toml_str = "camp_timeout_min = 60\n";
        let settings: Settings = toml::from_str(toml_str).expect("partial TOML should parse");
        assert_eq!(settings.camp_timeout_min, 60);
        assert_eq!(settings.roam_timeout_min, 25);
    }

    #[test]
    fn validation_rejects_out_of_range_decay_rate() {
        let mut settings = Settings::default();
        settings.decay_rate_per_min = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_enrich_workers() {
        let mut settings = Settings::default();
        settings.enrich_workers = 0;
        assert!(settings.validate().is_err());
    }
}
