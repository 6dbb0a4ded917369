//! Long-lived HTTP worker
//!
//! Hosts both handlers behind warp. Raw HTTP requests are turned into the
//! same event documents the handlers accept from any other invoker.

use crate::chat::{AgentRouter, HttpResponse};
use crate::courses::CourseQueryService;
use crate::error::{CoachError, CoachResult};
use crate::observability::HealthService;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use warp::http::{Method, StatusCode};
use warp::hyper::body::Bytes;
use warp::Filter;

/// Worker hosting the chat and course-query handlers
#[derive(Clone)]
pub struct WorkerServer {
    chat: Arc<AgentRouter>,
    courses: Arc<CourseQueryService>,
    health: Arc<HealthService>,
}

impl WorkerServer {
    pub fn new(chat: AgentRouter, courses: CourseQueryService, health: Arc<HealthService>) -> Self {
        Self {
            chat: Arc::new(chat),
            courses: Arc::new(courses),
            health,
        }
    }

    /// All routes: `/chat`, `/actions` and the operational endpoints
    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let chat = self.chat.clone();
        let courses = self.courses.clone();

        // POST|OPTIONS /chat - proxy-style event into the chat handler
        let chat_route = warp::path("chat")
            .and(warp::path::end())
            .and(warp::post().or(warp::options()).unify())
            .and(warp::method())
            .and(warp::body::bytes())
            .and_then(move |method: Method, body: Bytes| {
                let chat = chat.clone();
                async move {
                    let event = proxy_event(&method, &body);
                    let response = chat.handle(&event).await;
                    Ok::<_, Infallible>(into_reply(response))
                }
            });

        // POST /actions - action-group invocation into the course service
        let actions_route = warp::path("actions")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::bytes())
            .and_then(move |body: Bytes| {
                let courses = courses.clone();
                async move {
                    // Undecodable bodies still get an envelope from the handler
                    let event: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    let response = courses.handle(&event).await;
                    Ok::<_, Infallible>(warp::reply::json(&response))
                }
            });

        chat_route
            .or(actions_route)
            .or(self.health.clone().routes())
            .with(warp::trace::request())
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, port: u16, shutdown: F) -> CoachResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map_err(|e| CoachError::internal(format!("Failed to bind {addr}: {e}")))?;

        self.health.set_ready(true);
        info!("Worker listening on {}", bound);
        server.await;
        self.health.set_ready(false);
        info!("Worker stopped");

        Ok(())
    }
}

/// Build an API-gateway style event from a raw HTTP request
pub fn proxy_event(method: &Method, body: &[u8]) -> Value {
    json!({
        "httpMethod": method.as_str(),
        "body": String::from_utf8_lossy(body),
    })
}

/// Convert a proxy-style response into a warp reply
pub fn into_reply(response: HttpResponse) -> warp::reply::Response {
    let mut builder = warp::http::Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    match builder.body(response.body.into()) {
        Ok(reply) => reply,
        Err(e) => {
            error!("Failed to build HTTP response: {}", e);
            let mut reply = warp::reply::Response::new("{}".into());
            *reply.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            reply
        }
    }
}
