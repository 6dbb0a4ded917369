//! Thread-safe metrics collection system
//!
//! Atomic counters for the chat and course-query handlers plus
//! mutex-protected per-agent and per-path statistics.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MAX_SAMPLES: usize = 1000;

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    // Chat handler
    chat_requests: AtomicU64,
    chat_succeeded: AtomicU64,
    chat_failed: AtomicU64,
    off_topic_rejections: AtomicU64,
    validation_failures: AtomicU64,
    fallback_responses: AtomicU64,
    partial_responses: AtomicU64,
    chat_times: Mutex<Vec<u64>>, // milliseconds

    // Per-agent invocation statistics
    agent_stats: Mutex<HashMap<String, InvocationStats>>,

    // Course query handler
    course_queries: AtomicU64,
    course_query_failures: AtomicU64,
    store_connection_failures: AtomicU64,
    path_stats: Mutex<HashMap<String, InvocationStats>>,

    // Lifecycle
    uptime_start: AtomicU64,
    health_status: AtomicBool,
    last_health_check: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let now = current_timestamp();

        Self {
            chat_requests: AtomicU64::new(0),
            chat_succeeded: AtomicU64::new(0),
            chat_failed: AtomicU64::new(0),
            off_topic_rejections: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            fallback_responses: AtomicU64::new(0),
            partial_responses: AtomicU64::new(0),
            chat_times: Mutex::new(Vec::new()),
            agent_stats: Mutex::new(HashMap::new()),
            course_queries: AtomicU64::new(0),
            course_query_failures: AtomicU64::new(0),
            store_connection_failures: AtomicU64::new(0),
            path_stats: Mutex::new(HashMap::new()),
            uptime_start: AtomicU64::new(now),
            health_status: AtomicBool::new(true),
            last_health_check: AtomicU64::new(now),
        }
    }

    // Chat metrics
    pub fn chat_request_received(&self) {
        self.chat_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn chat_completed(&self, duration: Duration) {
        self.chat_succeeded.fetch_add(1, Ordering::Relaxed);
        push_sample(&self.chat_times, duration);
    }

    /// Unhandled failure converted to the generic error envelope
    pub fn chat_failed(&self) {
        self.chat_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn off_topic_rejected(&self) {
        self.off_topic_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_failed(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fallback_returned(&self) {
        self.fallback_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn partial_returned(&self) {
        self.partial_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn agent_invoked(&self, agent_name: &str, duration: Duration, success: bool) {
        if let Ok(mut stats) = self.agent_stats.lock() {
            record_invocation(&mut stats, agent_name, duration, success);
        }
    }

    // Course query metrics
    pub fn course_query(&self, api_path: &str, duration: Duration, success: bool) {
        self.course_queries.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.course_query_failures.fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut stats) = self.path_stats.lock() {
            record_invocation(&mut stats, api_path, duration, success);
        }
    }

    pub fn store_connection_failed(&self) {
        self.store_connection_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    // Health status metrics
    pub fn update_health_status(&self, healthy: bool) {
        self.health_status.store(healthy, Ordering::Relaxed);
        self.last_health_check
            .store(current_timestamp(), Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        current_timestamp().saturating_sub(self.uptime_start.load(Ordering::Relaxed))
    }

    /// Chat latency statistics: (avg, p50, p95, p99)
    fn chat_time_statistics(&self) -> (f64, f64, f64, f64) {
        let Ok(times) = self.chat_times.lock() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        if times.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        let mut sorted_times = times.clone();
        sorted_times.sort_unstable();

        let avg = sorted_times.iter().sum::<u64>() as f64 / sorted_times.len() as f64;
        (
            avg,
            percentile(&sorted_times, 50.0),
            percentile(&sorted_times, 95.0),
            percentile(&sorted_times, 99.0),
        )
    }

    /// Get complete metrics snapshot
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let now = current_timestamp();
        let (avg_response_time_ms, p50, p95, p99) = self.chat_time_statistics();

        MetricsSnapshot {
            chat: ChatMetrics {
                requests: self.chat_requests.load(Ordering::Relaxed),
                succeeded: self.chat_succeeded.load(Ordering::Relaxed),
                failed: self.chat_failed.load(Ordering::Relaxed),
                off_topic_rejections: self.off_topic_rejections.load(Ordering::Relaxed),
                validation_failures: self.validation_failures.load(Ordering::Relaxed),
                fallback_responses: self.fallback_responses.load(Ordering::Relaxed),
                partial_responses: self.partial_responses.load(Ordering::Relaxed),
                avg_response_time_ms,
                response_time_p50_ms: p50,
                response_time_p95_ms: p95,
                response_time_p99_ms: p99,
                agents: snapshot_stats(&self.agent_stats),
            },
            courses: CourseMetrics {
                queries: self.course_queries.load(Ordering::Relaxed),
                failures: self.course_query_failures.load(Ordering::Relaxed),
                connection_failures: self.store_connection_failures.load(Ordering::Relaxed),
                paths: snapshot_stats(&self.path_stats),
            },
            lifecycle: LifecycleMetrics {
                uptime_seconds: now.saturating_sub(self.uptime_start.load(Ordering::Relaxed)),
                healthy: self.health_status.load(Ordering::Relaxed),
                last_health_check: self.last_health_check.load(Ordering::Relaxed),
            },
            timestamp: now,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

// Internal statistics (with timing data)
#[derive(Debug, Default)]
struct InvocationStats {
    invocations: u64,
    failures: u64,
    times: Vec<u64>, // milliseconds
    last_invocation: u64,
}

fn record_invocation(
    stats: &mut HashMap<String, InvocationStats>,
    name: &str,
    duration: Duration,
    success: bool,
) {
    let entry = stats.entry(name.to_string()).or_default();
    entry.invocations += 1;
    entry.last_invocation = current_timestamp();
    entry.times.push(duration.as_millis() as u64);
    if entry.times.len() > MAX_SAMPLES {
        entry.times.remove(0);
    }
    if !success {
        entry.failures += 1;
    }
}

fn snapshot_stats(
    stats: &Mutex<HashMap<String, InvocationStats>>,
) -> HashMap<String, InvocationStatsSnapshot> {
    let Ok(stats) = stats.lock() else {
        return HashMap::new();
    };

    stats
        .iter()
        .map(|(name, stats)| {
            let avg_time_ms = if stats.times.is_empty() {
                0.0
            } else {
                stats.times.iter().sum::<u64>() as f64 / stats.times.len() as f64
            };
            let success_rate = if stats.invocations == 0 {
                0.0
            } else {
                (stats.invocations - stats.failures) as f64 / stats.invocations as f64
            };

            (
                name.clone(),
                InvocationStatsSnapshot {
                    invocations: stats.invocations,
                    failures: stats.failures,
                    avg_time_ms,
                    last_invocation: stats.last_invocation,
                    success_rate,
                },
            )
        })
        .collect()
}

fn push_sample(samples: &Mutex<Vec<u64>>, duration: Duration) {
    if let Ok(mut times) = samples.lock() {
        times.push(duration.as_millis() as u64);

        // Limit to last MAX_SAMPLES measurements
        if times.len() > MAX_SAMPLES {
            times.remove(0);
        }
    }
}

// Public metrics structures
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub chat: ChatMetrics,
    pub courses: CourseMetrics,
    pub lifecycle: LifecycleMetrics,
    pub timestamp: u64,
}

#[derive(Debug, Serialize)]
pub struct ChatMetrics {
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub off_topic_rejections: u64,
    pub validation_failures: u64,
    pub fallback_responses: u64,
    pub partial_responses: u64,
    pub avg_response_time_ms: f64,
    pub response_time_p50_ms: f64,
    pub response_time_p95_ms: f64,
    pub response_time_p99_ms: f64,
    pub agents: HashMap<String, InvocationStatsSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct CourseMetrics {
    pub queries: u64,
    pub failures: u64,
    pub connection_failures: u64,
    pub paths: HashMap<String, InvocationStatsSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct InvocationStatsSnapshot {
    pub invocations: u64,
    pub failures: u64,
    pub avg_time_ms: f64,
    pub last_invocation: u64,
    pub success_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct LifecycleMetrics {
    pub uptime_seconds: u64,
    pub healthy: bool,
    pub last_health_check: u64,
}

// Helper functions
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn percentile(sorted_data: &[u64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let len = sorted_data.len();
    let index = (percentile / 100.0) * (len - 1) as f64;

    if index.fract() == 0.0 {
        sorted_data[index as usize] as f64
    } else {
        let lower_value = sorted_data[index.floor() as usize] as f64;
        let upper_value = sorted_data[index.ceil() as usize] as f64;

        lower_value + (upper_value - lower_value) * index.fract()
    }
}
