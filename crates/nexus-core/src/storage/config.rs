//! TOML-based application configuration.
//!
//! Stores the tunables the session engine reads:
//! - Actuator address and request timeout
//! - Video start rules and the video pool
//! - Head-tracking threshold bounds and the mistress-control dial
//! - Session mode flags (strict, hardcore, lockout to 07:00)
//! - External bridge endpoint
//!
//! Configuration is stored at `~/.config/nexus/config.toml`. The engine never
//! writes it; edits come from the settings surface (`nexus config set`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::session::{Bound, ThresholdBounds};

pub const DEFAULT_ESP32_URL: &str = "http://192.168.1.50";

/// When the per-session video should be told to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStartMode {
    /// On the first status poll of the session.
    Immediate,
    /// As soon as the main phase begins.
    #[default]
    MainPhase,
    /// A configured number of minutes into the main phase.
    Delayed,
}

/// How the front end should present the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoDisplayMode {
    Fullscreen,
    Popup,
    #[default]
    Auto,
}

/// Actuator (lock box) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_esp32_url")]
    pub esp32_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Video configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub start_mode: VideoStartMode,
    /// Minutes into the main phase, used by [`VideoStartMode::Delayed`].
    #[serde(default)]
    pub start_after_min: u64,
    #[serde(default)]
    pub display_mode: VideoDisplayMode,
    #[serde(default = "default_true")]
    pub autopause_enabled: bool,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Head-tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadConfig {
    #[serde(default = "default_true")]
    pub tracking_enabled: bool,
    /// Randomize and tighten thresholds instead of using bound midpoints.
    #[serde(default = "default_true")]
    pub mistress_control: bool,
    #[serde(default = "default_min_down_deg")]
    pub min_down_deg: u32,
    #[serde(default = "default_max_down_deg")]
    pub max_down_deg: u32,
    #[serde(default = "default_min_away_deg")]
    pub min_away_deg: u32,
    #[serde(default = "default_max_away_deg")]
    pub max_away_deg: u32,
    #[serde(default = "default_min_still_sec")]
    pub min_still_sec: u32,
    #[serde(default = "default_max_still_sec")]
    pub max_still_sec: u32,
    #[serde(default = "default_min_debounce_ms")]
    pub min_debounce_ms: u32,
    #[serde(default = "default_max_debounce_ms")]
    pub max_debounce_ms: u32,
}

/// Session behaviour flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Disables abort.
    #[serde(default)]
    pub strict_mode: bool,
    /// Disables abort and amplifies every punishment.
    #[serde(default)]
    pub hardcore_mode: bool,
    /// Hold the session in lockout until the next 07:00 after the timed
    /// phases run out.
    #[serde(default)]
    pub lock_to_7am: bool,
}

/// External bridge (generic automation webhook).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/nexus/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub head: HeadConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

// Default functions
fn default_esp32_url() -> String {
    DEFAULT_ESP32_URL.into()
}
fn default_timeout_secs() -> u64 {
    3
}
fn default_true() -> bool {
    true
}
fn default_min_down_deg() -> u32 {
    20
}
fn default_max_down_deg() -> u32 {
    45
}
fn default_min_away_deg() -> u32 {
    25
}
fn default_max_away_deg() -> u32 {
    60
}
fn default_min_still_sec() -> u32 {
    5
}
fn default_max_still_sec() -> u32 {
    20
}
fn default_min_debounce_ms() -> u32 {
    3000
}
fn default_max_debounce_ms() -> u32 {
    7000
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            esp32_url: default_esp32_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_mode: VideoStartMode::MainPhase,
            start_after_min: 0,
            display_mode: VideoDisplayMode::Auto,
            autopause_enabled: true,
            urls: Vec::new(),
        }
    }
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            mistress_control: true,
            min_down_deg: default_min_down_deg(),
            max_down_deg: default_max_down_deg(),
            min_away_deg: default_min_away_deg(),
            max_away_deg: default_max_away_deg(),
            min_still_sec: default_min_still_sec(),
            max_still_sec: default_max_still_sec(),
            min_debounce_ms: default_min_debounce_ms(),
            max_debounce_ms: default_max_debounce_ms(),
        }
    }
}

impl HeadConfig {
    /// Raw user bounds, unhealed. The threshold generator fixes `max < min`.
    pub fn bounds(&self) -> ThresholdBounds {
        ThresholdBounds {
            down_deg: Bound::new(self.min_down_deg, self.max_down_deg),
            away_deg: Bound::new(self.min_away_deg, self.max_away_deg),
            still_sec: Bound::new(self.min_still_sec, self.max_still_sec),
            debounce_ms: Bound::new(self.min_debounce_ms, self.max_debounce_ms),
        }
    }

    /// Clamp every bound into the range the tracking front end can honour.
    fn clamp_to_device_ranges(&mut self) {
        self.min_down_deg = self.min_down_deg.clamp(5, 80);
        self.max_down_deg = self.max_down_deg.clamp(5, 80);
        self.min_away_deg = self.min_away_deg.clamp(5, 90);
        self.max_away_deg = self.max_away_deg.clamp(5, 90);
        self.min_still_sec = self.min_still_sec.clamp(1, 60);
        self.max_still_sec = self.max_still_sec.clamp(1, 120);
        self.min_debounce_ms = self.min_debounce_ms.clamp(500, 20_000);
        self.max_debounce_ms = self.max_debounce_ms.clamp(500, 30_000);
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .trim()
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.trim().into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Location of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unavailable or the default
    /// config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`. A missing file is replaced by defaults on disk; an
    /// unparsable file is left alone and defaults are used in memory.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(mut cfg) => {
                    cfg.normalize();
                    Ok(cfg)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "unparsable config, using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key (e.g. `head.min_down_deg`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key, then re-normalize.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// key's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.normalize();
        Ok(())
    }

    /// [`Config::apply`] followed by a save to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Bring user-edited values back into sane ranges.
    pub fn normalize(&mut self) {
        self.head.clamp_to_device_ranges();
        self.device.esp32_url = self.device.esp32_url.trim().to_string();
        self.bridge.url = self.bridge.url.trim().to_string();
        self.video.urls.retain(|u| !u.trim().is_empty());
    }

    /// Abort is refused while either of these is on.
    pub fn abort_disabled(&self) -> bool {
        self.session.strict_mode || self.session.hardcore_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.device.esp32_url, DEFAULT_ESP32_URL);
        assert_eq!(parsed.head.max_debounce_ms, 7000);
        assert_eq!(parsed.video.start_mode, VideoStartMode::MainPhase);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            "[session]\nhardcore_mode = true\n\n[video]\nstart_mode = \"delayed\"\n",
        )
        .unwrap();
        assert!(parsed.session.hardcore_mode);
        assert!(!parsed.session.strict_mode);
        assert_eq!(parsed.video.start_mode, VideoStartMode::Delayed);
        assert!(parsed.video.enabled);
        assert_eq!(parsed.head.min_away_deg, 25);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("head.min_down_deg").as_deref(), Some("20"));
        assert_eq!(cfg.get("video.start_mode").as_deref(), Some("main_phase"));
        assert_eq!(cfg.get("session.lock_to_7am").as_deref(), Some("false"));
        assert!(cfg.get("head.missing_key").is_none());
    }

    #[test]
    fn apply_updates_bool_number_and_enum() {
        let mut cfg = Config::default();
        cfg.apply("session.strict_mode", "true").unwrap();
        cfg.apply("video.start_after_min", "15").unwrap();
        cfg.apply("video.start_mode", "immediate").unwrap();
        assert!(cfg.session.strict_mode);
        assert_eq!(cfg.video.start_after_min, 15);
        assert_eq!(cfg.video.start_mode, VideoStartMode::Immediate);
    }

    #[test]
    fn apply_parses_url_list() {
        let mut cfg = Config::default();
        cfg.apply("video.urls", r#"["https://a.example/1", "  "]"#)
            .unwrap();
        assert_eq!(cfg.video.urls, vec!["https://a.example/1".to_string()]);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("head.nonexistent", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.hardcore_mode", "maybe").is_err());
        assert!(cfg.apply("head.min_down_deg", "steep").is_err());
        assert!(cfg.apply("video.start_mode", "sometimes").is_err());
        assert!(!cfg.session.hardcore_mode);
    }

    #[test]
    fn head_bounds_are_clamped_to_device_ranges() {
        let mut cfg = Config::default();
        cfg.apply("head.min_down_deg", "1").unwrap();
        cfg.apply("head.max_away_deg", "400").unwrap();
        cfg.apply("head.max_debounce_ms", "100").unwrap();
        assert_eq!(cfg.head.min_down_deg, 5);
        assert_eq!(cfg.head.max_away_deg, 90);
        assert_eq!(cfg.head.max_debounce_ms, 500);
    }

    #[test]
    fn inverted_bounds_survive_normalize() {
        let mut cfg = Config::default();
        cfg.apply("head.min_still_sec", "30").unwrap();
        cfg.apply("head.max_still_sec", "10").unwrap();
        let bounds = cfg.head.bounds();
        assert_eq!(bounds.still_sec, Bound::new(30, 10));
    }

    #[test]
    fn abort_disabled_by_either_flag() {
        let mut cfg = Config::default();
        assert!(!cfg.abort_disabled());
        cfg.session.strict_mode = true;
        assert!(cfg.abort_disabled());
        cfg.session.strict_mode = false;
        cfg.session.hardcore_mode = true;
        assert!(cfg.abort_disabled());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.head.max_still_sec, 20);
    }

    #[test]
    fn load_from_garbage_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert!(cfg.head.tracking_enabled);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "this is = = not toml"
        );
    }

    #[test]
    fn save_then_load_preserves_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.apply("device.esp32_url", "http://10.0.0.9/").unwrap();
        cfg.apply("session.lock_to_7am", "true").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.device.esp32_url, "http://10.0.0.9/");
        assert!(loaded.session.lock_to_7am);
    }
}
