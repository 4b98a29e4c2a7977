//! Settings file
//!
//! Every field has a default, so an empty or partial TOML file is valid.
//! Command-line flags are applied on top by the binary.

use std::{path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;

use crate::{
    domain::{ChatRole, GuessSettings, Platform},
    infrastructure::HttpEndpoint,
    usecase::{ChatSettings, MonitorSettings},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub relay: RelaySettings,
    pub playback: PlaybackSettings,
    pub youtube: EndpointSettings,
    pub cider: EndpointSettings,
    pub monitor: MonitorFileSettings,
    pub guess: GuessFileSettings,
    pub chat: ChatFileSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Self = toml::from_str(content)?;
        if settings.youtube.base_url.is_empty() {
            settings.youtube.base_url = DEFAULT_YOUTUBE_URL.to_string();
        }
        if settings.cider.base_url.is_empty() {
            settings.cider.base_url = DEFAULT_CIDER_URL.to_string();
        }
        Ok(settings)
    }

    pub fn youtube_endpoint(&self) -> HttpEndpoint {
        HttpEndpoint::new(self.youtube.base_url.clone(), self.youtube.token.clone())
    }

    pub fn cider_endpoint(&self) -> HttpEndpoint {
        HttpEndpoint::new(self.cider.base_url.clone(), self.cider.token.clone())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            auto_queue_threshold_ms: self.monitor.auto_queue_threshold_ms,
            reveal_grace: Duration::from_millis(self.monitor.reveal_grace_ms),
            guess: GuessSettings {
                enabled: self.guess.enabled,
                hide_threshold_ms: self.guess.hide_threshold_ms,
                window_ms: self.guess.window_ms,
            },
        }
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            prefix: self.chat.prefix.clone(),
            song_request_role: self.chat.song_request_role,
            remove_role: self.chat.remove_role,
            skip_role: self.chat.skip_role,
            max_requests_per_user: self.chat.max_requests_per_user,
        }
    }
}

const DEFAULT_YOUTUBE_URL: &str = "http://127.0.0.1:9863";
const DEFAULT_CIDER_URL: &str = "http://127.0.0.1:10767";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub host: String,
    pub port: u16,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub platform: Platform,
    /// relay reply timeout
    pub request_timeout_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            platform: Platform::spotify_bridge(),
            request_timeout_ms: 1_500,
        }
    }
}

impl PlaybackSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    pub base_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorFileSettings {
    pub auto_queue_threshold_ms: u64,
    pub reveal_grace_ms: u64,
}

impl Default for MonitorFileSettings {
    fn default() -> Self {
        let defaults = MonitorSettings::default();
        Self {
            auto_queue_threshold_ms: defaults.auto_queue_threshold_ms,
            reveal_grace_ms: defaults.reveal_grace.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GuessFileSettings {
    pub enabled: bool,
    pub hide_threshold_ms: u64,
    pub window_ms: u64,
}

impl Default for GuessFileSettings {
    fn default() -> Self {
        let defaults = GuessSettings::default();
        Self {
            enabled: defaults.enabled,
            hide_threshold_ms: defaults.hide_threshold_ms,
            window_ms: defaults.window_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatFileSettings {
    pub prefix: String,
    pub song_request_role: ChatRole,
    pub remove_role: ChatRole,
    pub skip_role: ChatRole,
    pub max_requests_per_user: usize,
}

impl Default for ChatFileSettings {
    fn default() -> Self {
        let defaults = ChatSettings::default();
        Self {
            prefix: defaults.prefix,
            song_request_role: defaults.song_request_role,
            remove_role: defaults.remove_role,
            skip_role: defaults.skip_role,
            max_requests_per_user: defaults.max_requests_per_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        // テスト項目: 空の設定ファイルでは既定値が使われる
        // given (前提条件):
        let content = "";

        // when (操作):
        let settings = Settings::from_toml(content).unwrap();

        // then (期待する結果):
        assert_eq!(settings.relay.port, 8080);
        assert_eq!(settings.playback.platform, Platform::spotify_bridge());
        assert_eq!(settings.playback.request_timeout_ms, 1_500);
        assert_eq!(settings.youtube.base_url, "http://127.0.0.1:9863");
        assert_eq!(settings.cider.base_url, "http://127.0.0.1:10767");
        assert_eq!(settings.monitor_settings(), MonitorSettings::default());
        assert_eq!(settings.chat_settings(), ChatSettings::default());
    }

    #[test]
    fn test_partial_file_overrides_only_given_fields() {
        // テスト項目: 書かれた項目だけが上書きされる
        // given (前提条件):
        let content = r#"
            [playback]
            platform = "cider"

            [cider]
            token = "secret"

            [guess]
            enabled = true

            [chat]
            song_request_role = "subscriber"
            max_requests_per_user = 2
        "#;

        // when (操作):
        let settings = Settings::from_toml(content).unwrap();

        // then (期待する結果):
        assert_eq!(settings.playback.platform, Platform::Cider);
        assert_eq!(settings.cider_endpoint().token.as_deref(), Some("secret"));
        assert!(settings.monitor_settings().guess.enabled);
        assert_eq!(settings.monitor_settings().guess.window_ms, 30_000);
        assert_eq!(settings.chat.song_request_role, ChatRole::Subscriber);
        assert_eq!(settings.chat.max_requests_per_user, 2);
        assert_eq!(settings.chat.prefix, "!");
    }

    #[test]
    fn test_invalid_platform_is_rejected() {
        // テスト項目: 不正なプラットフォーム名は読み込みエラー
        // given (前提条件):
        let content = "[playback]\nplatform = \"unknown\"\n";

        // when (操作):
        let result = Settings::from_toml(content);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        // テスト項目: 存在しないファイルは ConfigError::Read
        // given (前提条件):
        let path = Path::new("/nonexistent/encore/settings.toml");

        // when (操作):
        let result = Settings::load(path);

        // then (期待する結果):
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
