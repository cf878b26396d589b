//! RPC client: resolve, select, encode, send, decode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::header::CONTENT_TYPE;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::codec::{self, Codec, Payload, CODEC_HEADER};
use crate::context::SelectionContext;
use crate::error::{ClientError, Result};
use crate::registry::Registry;
use crate::rng::RandomSource;
use crate::strategies::{SelectionStrategy, StrategyKind};

/// Client-side call settings, the `[client]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default)]
    pub strategy: StrategyKind,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            strategy: StrategyKind::default(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    3000
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

/// Call counters shared with the diagnostics endpoint.
#[derive(Debug, Default)]
pub struct ClientStats {
    calls: AtomicU64,
    failures: AtomicU64,
    per_instance_selections: Mutex<HashMap<String, u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub failures: u64,
    pub per_instance_selections: HashMap<String, u64>,
}

impl ClientStats {
    fn record_selection(&self, address: &str) {
        let mut map = self.per_instance_selections.lock();
        *map.entry(address.to_string()).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            per_instance_selections: self.per_instance_selections.lock().clone(),
        }
    }
}

#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

struct InFlightGuard<'a>(&'a InFlight);

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a InFlight) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

pub struct RpcClient {
    http: Client<HttpConnector, Body>,
    registry: Arc<dyn Registry>,
    strategy: Arc<dyn SelectionStrategy>,
    request_timeout: Duration,
    stats: Arc<ClientStats>,
    closed: AtomicBool,
    in_flight: InFlight,
}

impl RpcClient {
    /// Builds a client around an explicit selection hook.
    pub fn new(
        config: &ClientConfig,
        registry: Arc<dyn Registry>,
        strategy: Arc<dyn SelectionStrategy>,
    ) -> Result<Self> {
        if config.request_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if config.connect_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "connect_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(config.connect_timeout_ms)));
        connector.set_nodelay(true);

        let http = Client::builder()
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build(connector);

        tracing::debug!(strategy = strategy.name(), "rpc client created");

        Ok(Self {
            http,
            registry,
            strategy,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            stats: Arc::new(ClientStats::default()),
            closed: AtomicBool::new(false),
            in_flight: InFlight::default(),
        })
    }

    /// Builds a client with the strategy named in `config`.
    pub fn from_config(
        config: &ClientConfig,
        registry: Arc<dyn Registry>,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        let strategy = config.strategy.build(rng);
        Self::new(config, registry, strategy)
    }

    pub fn stats(&self) -> Arc<ClientStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Calls `service`/`version`.`method` on the instance the strategy picks.
    pub async fn call<Req, Rsp>(
        &self,
        ctx: &SelectionContext,
        codec: Codec,
        service: &str,
        version: &str,
        method: &str,
        req: &Req,
    ) -> Result<Rsp>
    where
        Req: Payload,
        Rsp: Payload,
    {
        // Entered before the closed check so close() never misses this call.
        let _guard = InFlightGuard::enter(&self.in_flight);
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        self.stats.calls.fetch_add(1, Ordering::Relaxed);

        let result = self.dispatch(ctx, codec, service, version, method, req).await;
        if result.is_err() {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    async fn dispatch<Req, Rsp>(
        &self,
        ctx: &SelectionContext,
        codec: Codec,
        service: &str,
        version: &str,
        method: &str,
        req: &Req,
    ) -> Result<Rsp>
    where
        Req: Payload,
        Rsp: Payload,
    {
        let candidates = self.registry.resolve(service, version)?;
        let instance = self
            .strategy
            .select(ctx, &candidates)
            .map_err(|source| ClientError::Select {
                service: service.to_string(),
                source,
            })?;
        self.stats.record_selection(&instance.address);
        if let Some(snapshot) = self.strategy.debug_snapshot() {
            tracing::trace!(strategy = self.strategy.name(), %snapshot, "strategy state");
        }

        let body = codec::encode(codec, req)?;
        let uri = format!("http://{}/{}/{}/{}", instance.address, service, version, method);
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, codec.content_type())
            .header(CODEC_HEADER, codec.name())
            .body(Body::from(body))?;

        tracing::debug!(
            address = %instance.address,
            service,
            method,
            %codec,
            seq = ?ctx.seq(),
            "sending request"
        );

        let exchange = async {
            let response = self.http.request(request).await?;
            let status = response.status();
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, ClientError>((status, bytes))
        };

        let (status, bytes) = tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| ClientError::Timeout {
                address: instance.address.clone(),
                timeout_ms: self.request_timeout.as_millis() as u64,
            })??;

        if !status.is_success() {
            return Err(ClientError::Remote {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        codec::decode(codec, &bytes)
    }

    /// Stops accepting calls and waits for in-flight calls to finish.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        loop {
            // Created before the count check so a concurrent drop cannot be missed.
            let idle = self.in_flight.idle.notified();
            if self.in_flight.count.load(Ordering::SeqCst) == 0 {
                break;
            }
            idle.await;
        }
        tracing::info!("rpc client closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{AddReq, AddRsp};
    use crate::error::SelectError;
    use crate::registry::StaticRegistry;
    use crate::rng::TimeSeededRandom;

    fn client(registry: StaticRegistry) -> RpcClient {
        RpcClient::from_config(
            &ClientConfig::default(),
            Arc::new(registry),
            Arc::new(TimeSeededRandom::new()),
        )
        .unwrap()
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = ClientConfig {
            request_timeout_ms: 0,
            ..ClientConfig::default()
        };
        let result = RpcClient::from_config(
            &config,
            Arc::new(StaticRegistry::new()),
            Arc::new(TimeSeededRandom::new()),
        );
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn empty_registry_fails_selection() {
        let client = client(StaticRegistry::new());
        let result: Result<AddRsp> = client
            .call(
                &SelectionContext::with_seq(7),
                Codec::Json,
                "TestService",
                "v1.0",
                "Add",
                &AddReq { a: 1, b: 2 },
            )
            .await;

        assert!(matches!(
            result,
            Err(ClientError::Select {
                source: SelectError::EmptyCandidateSet,
                ..
            })
        ));
        let stats = client.stats().snapshot();
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.failures, 1);
        assert!(stats.per_instance_selections.is_empty());
    }

    #[tokio::test]
    async fn closed_client_refuses_calls() {
        let client = client(StaticRegistry::new());
        client.close().await;
        assert!(client.is_closed());

        let result: Result<AddRsp> = client
            .call(
                &SelectionContext::random(),
                Codec::Protobuf,
                "TestService",
                "v1.0",
                "Add",
                &AddReq { a: 1, b: 2 },
            )
            .await;
        assert!(matches!(result, Err(ClientError::Closed)));
        assert_eq!(client.stats().snapshot().calls, 0);
    }
}
