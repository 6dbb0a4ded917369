//! Health check endpoints for container orchestration
//!
//! Provides warp filters for `/health`, `/metrics`, `/ready`, `/live` and `/`.
//! The worker server mounts them next to the handler routes.

use crate::observability::metrics::{metrics, MetricsSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use warp::http::StatusCode;
use warp::Filter;

/// Minimum samples before failure ratios count against health
const MIN_SAMPLES: u64 = 10;
/// Failure ratio above which a dependency is reported degraded
const MAX_FAILURE_RATIO: f64 = 0.5;

/// Health state shared by the operational endpoints
pub struct HealthService {
    service_name: String,
    ready: AtomicBool,
}

impl HealthService {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ready: AtomicBool::new(false),
        }
    }

    /// Mark the worker as able to take traffic
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Operational routes
    pub fn routes(
        self: Arc<Self>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let health_service = self.clone();
        let ready_service = self;

        // GET /health - overall status with individual checks
        let health_route = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and_then(move || {
                let service = health_service.clone();
                async move {
                    let status = service.get_health_status().await;
                    let code = if status.status == "healthy" {
                        StatusCode::OK
                    } else {
                        StatusCode::SERVICE_UNAVAILABLE
                    };
                    Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&status), code))
                }
            });

        // GET /metrics - complete metrics export
        let metrics_route = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| warp::reply::json(&metrics().get_metrics()));

        // GET /ready - readiness probe
        let ready_route = warp::path("ready")
            .and(warp::path::end())
            .and(warp::get())
            .map(move || {
                let ready = ready_service.is_ready();
                let response = ReadinessResponse {
                    ready,
                    timestamp: current_timestamp(),
                };
                let code = if ready {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                warp::reply::with_status(warp::reply::json(&response), code)
            });

        // GET /live - liveness probe
        let live_route = warp::path("live")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| {
                warp::reply::json(&LivenessResponse {
                    alive: true,
                    timestamp: current_timestamp(),
                })
            });

        // GET / - endpoint listing
        let root_route = warp::path::end()
            .and(warp::get())
            .map(|| warp::reply::json(&ApiDocumentationResponse::new()));

        health_route
            .or(metrics_route)
            .or(ready_route)
            .or(live_route)
            .or(root_route)
    }

    async fn get_health_status(&self) -> HealthStatus {
        let now = current_timestamp();
        let snapshot = metrics().get_metrics();

        let mut checks = HashMap::new();
        checks.insert("readiness".to_string(), self.check_readiness(now));
        checks.insert("agent_runtime".to_string(), check_agent_runtime(&snapshot, now));
        checks.insert("course_store".to_string(), check_course_store(&snapshot, now));

        let overall_healthy = checks.values().all(|check| check.status == "healthy");
        metrics().update_health_status(overall_healthy);

        HealthStatus {
            status: if overall_healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: now,
            service: self.service_name.clone(),
            uptime_seconds: snapshot.lifecycle.uptime_seconds,
            checks,
        }
    }

    fn check_readiness(&self, now: u64) -> HealthCheck {
        if self.is_ready() {
            HealthCheck::healthy("Handlers initialized", now)
        } else {
            HealthCheck::unhealthy("Handlers not initialized yet", now)
        }
    }
}

/// Degraded when most recent agent invocations fell back
fn check_agent_runtime(snapshot: &MetricsSnapshot, now: u64) -> HealthCheck {
    let (invocations, failures) = snapshot
        .chat
        .agents
        .values()
        .fold((0, 0), |(i, f), s| (i + s.invocations, f + s.failures));

    ratio_check(invocations, failures, "agent invocations", now)
}

/// Degraded when most course queries failed
fn check_course_store(snapshot: &MetricsSnapshot, now: u64) -> HealthCheck {
    ratio_check(
        snapshot.courses.queries,
        snapshot.courses.failures,
        "course queries",
        now,
    )
}

fn ratio_check(total: u64, failures: u64, what: &str, now: u64) -> HealthCheck {
    if total < MIN_SAMPLES {
        return HealthCheck::healthy(&format!("{total} {what} recorded"), now);
    }

    let ratio = failures as f64 / total as f64;
    if ratio > MAX_FAILURE_RATIO {
        HealthCheck {
            status: "degraded".to_string(),
            message: Some(format!("{failures} of {total} {what} failed")),
            last_check: now,
        }
    } else {
        HealthCheck::healthy(&format!("{failures} of {total} {what} failed"), now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: Option<String>,
    pub last_check: u64,
}

impl HealthCheck {
    pub fn healthy(message: &str, now: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            message: Some(message.to_string()),
            last_check: now,
        }
    }

    pub fn unhealthy(message: &str, now: u64) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: Some(message.to_string()),
            last_check: now,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: String,
    timestamp: u64,
    service: String,
    uptime_seconds: u64,
    checks: HashMap<String, HealthCheck>,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ApiDocumentationResponse {
    endpoints: HashMap<String, String>,
}

impl ApiDocumentationResponse {
    fn new() -> Self {
        let endpoints = [
            ("/chat", "POST chat prompts to the upskill coach (OPTIONS for CORS preflight)"),
            ("/actions", "POST course action-group invocations"),
            ("/health", "Overall health status with detailed checks"),
            ("/metrics", "Request counters and latency statistics"),
            ("/ready", "Readiness probe"),
            ("/live", "Liveness probe"),
        ]
        .into_iter()
        .map(|(path, description)| (path.to_string(), description.to_string()))
        .collect();

        Self { endpoints }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::MetricsCollector;
    use std::time::Duration;

    #[test]
    fn test_readiness_flag() {
        let service = HealthService::new("upskill-coach");
        assert!(!service.is_ready());
        assert_eq!(service.check_readiness(0).status, "unhealthy");

        service.set_ready(true);
        assert!(service.is_ready());
        assert_eq!(service.check_readiness(0).status, "healthy");
    }

    #[test]
    fn test_ratio_check_needs_samples() {
        assert_eq!(ratio_check(3, 3, "agent invocations", 0).status, "healthy");
        assert_eq!(ratio_check(10, 6, "agent invocations", 0).status, "degraded");
        assert_eq!(ratio_check(10, 5, "agent invocations", 0).status, "healthy");
    }

    #[test]
    fn test_agent_runtime_check_sums_agents() {
        let collector = MetricsCollector::new();
        for _ in 0..6 {
            collector.agent_invoked("CourseAgent", Duration::ZERO, false);
        }
        for _ in 0..4 {
            collector.agent_invoked("myagent-invoke-llm", Duration::ZERO, true);
        }

        let check = check_agent_runtime(&collector.get_metrics(), 0);
        assert_eq!(check.status, "degraded");
        assert_eq!(
            check.message.as_deref(),
            Some("6 of 10 agent invocations failed")
        );
    }

    #[tokio::test]
    async fn test_live_and_ready_routes() {
        let service = Arc::new(HealthService::new("upskill-coach"));
        let routes = service.clone().routes();

        let live = warp::test::request().path("/live").reply(&routes).await;
        assert_eq!(live.status(), 200);

        let ready = warp::test::request().path("/ready").reply(&routes).await;
        assert_eq!(ready.status(), 503);

        service.set_ready(true);
        let ready = warp::test::request().path("/ready").reply(&routes).await;
        assert_eq!(ready.status(), 200);
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let routes = Arc::new(HealthService::new("upskill-coach")).routes();
        let response = warp::test::request().path("/").reply(&routes).await;

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["endpoints"]["/chat"].is_string());
        assert!(body["endpoints"]["/metrics"].is_string());
    }
}
