//! # Application State Management
//!
//! Shared state handed to every HTTP handler and every WebSocket connection.
//! Interview state is *not* here: each connection owns its own
//! [`InterviewSession`](crate::interview::session::InterviewSession), so
//! nothing about one candidate is visible to another.
//!
//! ## What lives here:
//! - **config**: the live configuration, replaceable through `PUT /api/v1/config`
//! - **metrics**: process-wide counters for `/api/v1/metrics`
//! - **services**: the external collaborators shared by all connections
//!
//! ### Arc<RwLock<T>> Pattern
//! Many readers (handlers, new connections) and rare writers (config updates,
//! counters). Lock sections are a few statements long and never span an
//! `.await`, so the std locks are enough. A poisoned lock still holds valid
//! counters, so it is recovered rather than propagated.

use crate::audio::buffer::{AudioFormat, WindowLayout};
use crate::audio::processor::AudioProcessor;
use crate::config::AppConfig;
use crate::services::Services;
use crate::transcription::ChunkedTranscriber;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub metrics: Arc<RwLock<AppMetrics>>,
    pub services: Services,
    pub start_time: Instant,
}

/// Process-wide counters.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// HTTP requests served (including WebSocket upgrades)
    pub request_count: u64,
    /// HTTP responses with a 4xx/5xx status
    pub error_count: u64,
    /// WebSocket connections currently open
    pub active_sessions: u32,
    /// WebSocket connections accepted since startup
    pub connections_total: u64,
    pub interviews_started: u64,
    /// Keyed by route pattern, e.g. `GET /api/v1/config`
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
    /// Keyed by inbound WebSocket message type, e.g. `audio`
    pub message_metrics: HashMap<String, EndpointMetric>,
}

#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    pub fn new(config: AppConfig, services: Services) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            services,
            start_time: Instant::now(),
        }
    }

    fn read_metrics(&self) -> RwLockReadGuard<'_, AppMetrics> {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_metrics(&self) -> RwLockWriteGuard<'_, AppMetrics> {
        self.metrics.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the configuration if it validates. Running connections keep
    /// the settings they were opened with.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        new_config.validate().map_err(|e| e.to_string())?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = new_config;
        Ok(())
    }

    /// Transcriber built from the current audio and performance settings.
    pub fn transcriber(&self) -> ChunkedTranscriber {
        let config = self.get_config();
        ChunkedTranscriber::new(
            self.services.speech.clone(),
            WindowLayout::from_config(&config.audio),
            config.performance.max_in_flight_windows,
        )
    }

    pub fn audio_processor(&self) -> AudioProcessor {
        AudioProcessor::new(AudioFormat::from_config(&self.get_config().audio))
    }

    pub fn increment_request_count(&self) {
        self.write_metrics().request_count += 1;
    }

    pub fn increment_error_count(&self) {
        self.write_metrics().error_count += 1;
    }

    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.write_metrics();
        metrics
            .endpoint_metrics
            .entry(endpoint.to_string())
            .or_default()
            .record(duration_ms, is_error);
    }

    /// Count one handled WebSocket message by its `type`.
    pub fn record_message(&self, kind: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.write_metrics();
        metrics
            .message_metrics
            .entry(kind.to_string())
            .or_default()
            .record(duration_ms, is_error);
    }

    /// Reserve a connection slot. Returns `false` when `limit` sessions are
    /// already open; check and increment happen under one lock.
    pub fn try_open_session(&self, limit: usize) -> bool {
        let mut metrics = self.write_metrics();
        if metrics.active_sessions as usize >= limit {
            return false;
        }
        metrics.active_sessions += 1;
        metrics.connections_total += 1;
        true
    }

    pub fn close_session(&self) {
        let mut metrics = self.write_metrics();
        metrics.active_sessions = metrics.active_sessions.saturating_sub(1);
    }

    pub fn record_interview_started(&self) {
        self.write_metrics().interviews_started += 1;
    }

    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.read_metrics().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    fn record(&mut self, duration_ms: u64, is_error: bool) {
        self.request_count += 1;
        self.total_duration_ms += duration_ms;
        if is_error {
            self.error_count += 1;
        }
    }

    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
