//! HTTP diagnostics endpoint.
//!
//! `GET /debug/pprof/` answers with a JSON snapshot of the client's call
//! counters; every other path is a 404.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::client::{ClientStats, StatsSnapshot};

pub const PPROF_PATH: &str = "/debug/pprof/";

pub struct DiagnosticsState {
    app_name: String,
    started: Instant,
    stats: Arc<ClientStats>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    app_name: &'a str,
    version: &'static str,
    uptime_secs: u64,
    #[serde(flatten)]
    stats: StatsSnapshot,
}

impl DiagnosticsState {
    pub fn new(app_name: &str, stats: Arc<ClientStats>) -> Self {
        Self {
            app_name: app_name.to_string(),
            started: Instant::now(),
            stats,
        }
    }
}

pub fn handle(req: &Request<Body>, state: &DiagnosticsState) -> Response<Body> {
    if req.method() != Method::GET || req.uri().path() != PPROF_PATH {
        return response_with_status(StatusCode::NOT_FOUND, "not found");
    }

    let report = Report {
        app_name: &state.app_name,
        version: crate::VERSION,
        uptime_secs: state.started.elapsed().as_secs(),
        stats: state.stats.snapshot(),
    };
    match serde_json::to_vec(&report) {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| Response::new(Body::empty())),
        Err(e) => response_with_status(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Binds the endpoint and serves it on a background task.
pub fn spawn(
    addr: SocketAddr,
    state: Arc<DiagnosticsState>,
) -> Result<(SocketAddr, JoinHandle<()>), hyper::Error> {
    let make_svc = make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(handle(&req, &state)) }
            }))
        }
    });

    let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();
    tracing::info!(addr = %local_addr, path = PPROF_PATH, "diagnostics endpoint listening");

    let handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "diagnostics endpoint stopped");
        }
    });
    Ok((local_addr, handle))
}

/// Like [`spawn`], but a bind failure is logged and the process goes on
/// without the endpoint.
pub fn start(addr: SocketAddr, state: Arc<DiagnosticsState>) -> Option<JoinHandle<()>> {
    match spawn(addr, state) {
        Ok((_, handle)) => Some(handle),
        Err(e) => {
            tracing::error!(%addr, error = %e, "diagnostics endpoint unavailable");
            None
        }
    }
}

fn response_with_status(status: StatusCode, msg: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(msg.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from(msg.to_string())))
}
