//! # Configuration Management
//!
//! This module handles loading and managing application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Deployment variables (`HOST`, `PORT`, `GOOGLE_API_KEY`)
//! 2. Environment variables (`APP_SERVER__PORT`, `APP_AUDIO__WINDOW_DURATION_MS`, ...)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! ## Nesting separator:
//! Section and key are separated by a double underscore so that keys which
//! contain underscores themselves (`window_duration_ms`) survive the mapping.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main application configuration that contains all settings.
///
/// ## Why separate config structs:
/// Breaking configuration into logical groups (server, models, audio, interview)
/// keeps each concern readable and lets `PUT /api/v1/config` update them piecemeal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub services: ServicesConfig,
    pub performance: PerformanceConfig,
    pub audio: AudioSettings,
    pub interview: InterviewSettings,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any IP address (production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which external models the collaborators talk to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Gemini model used for questions, scoring and code evaluation
    pub llm_model: String,
    /// BCP-47 language code passed to speech recognition ("en-US")
    pub speech_language: String,
    /// How many ranked alternatives to request per window
    pub max_alternatives: u32,
}

/// Endpoints and credentials of the external APIs.
///
/// An empty `google_api_key` means "not configured": the service still starts,
/// but every transcription and LLM call fails with a descriptive error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub google_api_key: String,
    pub speech_endpoint: String,
    pub llm_endpoint: String,
    pub request_timeout_secs: u64,
}

/// Performance tuning configuration.
///
/// ## Tuning guidelines:
/// - Higher concurrent sessions: More candidates at once, more outbound API traffic
/// - More in-flight windows: Faster transcription of long answers, more parallel API calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub max_concurrent_sessions: usize,
    pub max_in_flight_windows: usize,
}

/// Expected audio format and transcription window sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub channels: u8,
    pub bit_depth: u8,
    /// Length of one transcription window (5 seconds)
    pub window_duration_ms: u32,
    /// Extra audio re-read by the next window (0.5 seconds)
    pub overlap_duration_ms: u32,
}

/// Interview coordination and connection liveness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSettings {
    /// Delay between requesting a stop and clearing the stop signal again
    pub stop_grace_ms: u64,
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            models: ModelsConfig {
                llm_model: "gemini-1.5-flash".to_string(),
                speech_language: "en-US".to_string(),
                max_alternatives: 1,
            },
            services: ServicesConfig {
                google_api_key: String::new(),
                speech_endpoint: "https://speech.googleapis.com".to_string(),
                llm_endpoint: "https://generativelanguage.googleapis.com".to_string(),
                request_timeout_secs: 30,
            },
            performance: PerformanceConfig {
                max_concurrent_sessions: 10,
                max_in_flight_windows: 4,
            },
            audio: AudioSettings {
                sample_rate: 16000,
                channels: 1,
                bit_depth: 16,
                window_duration_ms: 5000,
                overlap_duration_ms: 500,
            },
            interview: InterviewSettings {
                stop_grace_ms: 100,
                heartbeat_interval_secs: 30,
                client_timeout_secs: 60,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__HOST=0.0.0.0`: Override server host
    /// - `APP_PERFORMANCE__MAX_IN_FLIGHT_WINDOWS=8`: Override window concurrency
    /// - `HOST=0.0.0.0` / `PORT=3000`: Special cases for deployment platforms
    /// - `GOOGLE_API_KEY=...`: Credentials for speech recognition and Gemini
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(key) = env::var("GOOGLE_API_KEY") {
            settings = settings.set_override("services.google_api_key", key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port and session limits are non-zero
    /// - Only 16-bit PCM is accepted (the recognizer is configured for LINEAR16)
    /// - The overlap is strictly shorter than the window, otherwise the
    ///   cursor would never move past re-read audio
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.performance.max_concurrent_sessions == 0 {
            return Err(anyhow::anyhow!("Max concurrent sessions must be greater than 0"));
        }

        if self.performance.max_in_flight_windows == 0 {
            return Err(anyhow::anyhow!("Max in-flight windows must be greater than 0"));
        }

        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(anyhow::anyhow!("Audio sample rate and channel count must be greater than 0"));
        }

        if self.audio.bit_depth != 16 {
            return Err(anyhow::anyhow!(
                "Unsupported bit depth {}: only 16-bit PCM is accepted",
                self.audio.bit_depth
            ));
        }

        if self.audio.window_duration_ms == 0 {
            return Err(anyhow::anyhow!("Transcription window must be longer than 0ms"));
        }

        if self.audio.overlap_duration_ms >= self.audio.window_duration_ms {
            return Err(anyhow::anyhow!(
                "Overlap ({}ms) must be shorter than the window ({}ms)",
                self.audio.overlap_duration_ms,
                self.audio.window_duration_ms
            ));
        }

        Ok(())
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.interview.stop_grace_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.services.request_timeout_secs)
    }

    /// Update configuration from a JSON string (used for runtime config updates).
    ///
    /// ## Partial updates:
    /// Only the fields present in the JSON are changed. For example,
    /// `{"interview": {"stop_grace_ms": 250}}` changes only the grace delay.
    /// Server host/port and credentials cannot be changed here.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial_config: serde_json::Value = serde_json::from_str(json_str)?;

        if let Some(models) = partial_config.get("models") {
            if let Some(model) = models.get("llm_model").and_then(|v| v.as_str()) {
                self.models.llm_model = model.to_string();
            }
            if let Some(language) = models.get("speech_language").and_then(|v| v.as_str()) {
                self.models.speech_language = language.to_string();
            }
            if let Some(alternatives) = models.get("max_alternatives").and_then(|v| v.as_u64()) {
                self.models.max_alternatives = alternatives as u32;
            }
        }

        if let Some(performance) = partial_config.get("performance") {
            if let Some(sessions) = performance.get("max_concurrent_sessions").and_then(|v| v.as_u64()) {
                self.performance.max_concurrent_sessions = sessions as usize;
            }
            if let Some(windows) = performance.get("max_in_flight_windows").and_then(|v| v.as_u64()) {
                self.performance.max_in_flight_windows = windows as usize;
            }
        }

        if let Some(audio) = partial_config.get("audio") {
            if let Some(window) = audio.get("window_duration_ms").and_then(|v| v.as_u64()) {
                self.audio.window_duration_ms = window as u32;
            }
            if let Some(overlap) = audio.get("overlap_duration_ms").and_then(|v| v.as_u64()) {
                self.audio.overlap_duration_ms = overlap as u32;
            }
        }

        if let Some(interview) = partial_config.get("interview") {
            if let Some(grace) = interview.get("stop_grace_ms").and_then(|v| v.as_u64()) {
                self.interview.stop_grace_ms = grace;
            }
        }

        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.audio.window_duration_ms, 5000);
        assert_eq!(config.audio.overlap_duration_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.overlap_duration_ms = config.audio.window_duration_ms;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.bit_depth = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_update() {
        let mut config = AppConfig::default();
        let json = r#"{"interview": {"stop_grace_ms": 250}, "performance": {"max_in_flight_windows": 2}}"#;
        assert!(config.update_from_json(json).is_ok());
        assert_eq!(config.interview.stop_grace_ms, 250);
        assert_eq!(config.performance.max_in_flight_windows, 2);
        // Untouched sections keep their values
        assert_eq!(config.audio.window_duration_ms, 5000);
    }

    #[test]
    fn test_config_update_rejects_invalid_result() {
        let mut config = AppConfig::default();
        let json = r#"{"audio": {"overlap_duration_ms": 9000}}"#;
        assert!(config.update_from_json(json).is_err());
    }
}
