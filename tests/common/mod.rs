#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, StatusCode};
use micro_echo_client::codec::{self, Codec, CODEC_HEADER};
use micro_echo_client::demo::{AddReq, AddRsp, TestReq, TestRsp};

/// In-process TestService backend.
pub struct TestServer {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn spawn_test_server() -> TestServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let make_svc = make_service_fn(move |_conn| {
        let counter = Arc::clone(&counter);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(handle(req).await)
                }
            }))
        }
    });

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = hyper::Server::bind(&addr).serve(make_svc);
    let addr = server.local_addr();
    tokio::spawn(server);
    TestServer { addr, hits }
}

async fn handle(req: Request<Body>) -> Response<Body> {
    let codec: Codec = req
        .headers()
        .get(CODEC_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(Codec::Json);
    let path = req.uri().path().to_string();
    let body = hyper::body::to_bytes(req.into_body()).await.unwrap();

    let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    if parts.len() != 3 || parts[0] != "TestService" || parts[1] != "v1.0" {
        return status(StatusCode::NOT_FOUND, "no such service");
    }

    match parts[2] {
        "Test" => {
            let req: TestReq = codec::decode(codec, &body).unwrap();
            let rsp = TestRsp {
                a: req.a,
                b: req.b,
                c: req.c,
            };
            ok(codec::encode(codec, &rsp).unwrap())
        }
        "Add" => {
            let req: AddReq = codec::decode(codec, &body).unwrap();
            ok(codec::encode(codec, &AddRsp { sum: req.a + req.b }).unwrap())
        }
        "Err" => status(StatusCode::INTERNAL_SERVER_ERROR, "this is a error test"),
        "Slow" => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            ok(codec::encode(codec, &AddRsp { sum: 0 }).unwrap())
        }
        _ => status(StatusCode::NOT_FOUND, "no such method"),
    }
}

fn ok(body: Vec<u8>) -> Response<Body> {
    Response::new(Body::from(body))
}

fn status(code: StatusCode, msg: &str) -> Response<Body> {
    Response::builder()
        .status(code)
        .body(Body::from(msg.to_string()))
        .unwrap()
}
