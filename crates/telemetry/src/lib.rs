//! Logging and metrics for RoadLink
//!
//! - Structured logging with tracing, filtered by `RUST_LOG` or the configured level
//! - A process-wide metrics registry (counters, gauges, histograms) with JSON export
//! - Helpers that count diffs and messages flowing out of a session

use once_cell::sync::Lazy;
use roadlink_core::config::TelemetrySettings;
use roadlink_core::feed::Diff;
use roadlink_core::router::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Metric names recorded by [`observe_diff`], [`observe_message`] and the binary.
pub mod names {
    pub const DIFFS_EMITTED: &str = "feed.diffs_emitted";
    pub const PEERS_ADDED: &str = "feed.peers_added";
    pub const PEERS_UPDATED: &str = "feed.peers_updated";
    pub const PEERS_REMOVED: &str = "feed.peers_removed";
    pub const PEERS_VISIBLE: &str = "feed.peers_visible";
    pub const PEERS_TRACKED: &str = "registry.peers_tracked";
    pub const MESSAGES_LOCAL: &str = "router.messages_local";
    pub const MESSAGES_REMOTE: &str = "router.messages_remote";
    pub const REPLIES_DROPPED: &str = "router.replies_dropped";
    pub const REMOTE_DISTANCE_M: &str = "router.remote_distance_m";
    pub const TICK_MS: &str = "sim.tick_ms";
}

/// Global metrics registry
static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with defaults
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize with custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", config.log_level, e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        tracing::subscriber::set_global_default(
            registry.with(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr),
            ),
        )
    } else {
        tracing::subscriber::set_global_default(
            registry.with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_writer(std::io::stderr)
                    .compact(),
            ),
        )
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// Emit JSON lines instead of the compact format
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_target: false,
            show_thread_ids: false,
            json: false,
        }
    }
}

impl From<&TelemetrySettings> for TelemetryConfig {
    fn from(settings: &TelemetrySettings) -> Self {
        Self {
            log_level: settings.log_level.clone(),
            ..Self::default()
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Metrics registry for collecting and exporting metrics
#[derive(Debug)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    gauges: RwLock<HashMap<String, AtomicU64>>,
    histograms: RwLock<HashMap<String, Vec<f64>>>,
    start_time: Instant,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Increment a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Increment a counter by a specific amount
    pub fn increment_by(&self, name: &str, value: u64) {
        {
            let counters = read(&self.counters);
            if let Some(counter) = counters.get(name) {
                counter.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }
        write(&self.counters)
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Current counter value, zero if never incremented
    pub fn counter(&self, name: &str) -> u64 {
        read(&self.counters)
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Set a gauge value
    pub fn gauge(&self, name: &str, value: u64) {
        write(&self.gauges)
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(value, Ordering::Relaxed);
    }

    /// Current gauge value
    pub fn gauge_value(&self, name: &str) -> Option<u64> {
        read(&self.gauges).get(name).map(|g| g.load(Ordering::Relaxed))
    }

    /// Record a histogram value
    pub fn histogram(&self, name: &str, value: f64) {
        write(&self.histograms)
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    /// Summary of a histogram
    pub fn histogram_stats(&self, name: &str) -> Option<HistogramStats> {
        read(&self.histograms)
            .get(name)
            .map(|values| HistogramStats::from_values(values))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let counter_values: HashMap<String, u64> = read(&self.counters)
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();

        let gauge_values: HashMap<String, u64> = read(&self.gauges)
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();

        let histogram_stats: HashMap<String, HistogramStats> = read(&self.histograms)
            .iter()
            .map(|(k, v)| (k.clone(), HistogramStats::from_values(v)))
            .collect();

        serde_json::json!({
            "session_id": session_id(),
            "uptime_secs": self.uptime_secs(),
            "counters": counter_values,
            "gauges": gauge_values,
            "histograms": histogram_stats,
        })
    }
}

/// Histogram statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl HistogramStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Get the global metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

/// Count one emitted diff and its peers into `registry`.
pub fn observe_diff(registry: &MetricsRegistry, diff: &Diff) {
    registry.increment(names::DIFFS_EMITTED);
    registry.increment_by(names::PEERS_ADDED, diff.added.len() as u64);
    registry.increment_by(names::PEERS_UPDATED, diff.updated.len() as u64);
    registry.increment_by(names::PEERS_REMOVED, diff.removed.len() as u64);
}

/// Count one accepted message into `registry`.
pub fn observe_message(registry: &MetricsRegistry, message: &Message) {
    if message.is_local {
        registry.increment(names::MESSAGES_LOCAL);
    } else {
        registry.increment(names::MESSAGES_REMOTE);
        registry.histogram(names::REMOTE_DISTANCE_M, message.distance_meters);
    }
}

/// Records elapsed milliseconds into a histogram when stopped or dropped.
#[derive(Debug)]
pub struct Timer {
    name: String,
    start: Instant,
    recorded: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        let duration = self.record();
        tracing::debug!(
            metric = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Timer completed"
        );
        duration
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            metrics().histogram(&self.name, duration.as_secs_f64() * 1000.0);
            self.recorded = true;
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}
