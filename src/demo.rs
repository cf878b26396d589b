//! TestService messages and the demo calls issued at startup.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::client::RpcClient;
use crate::codec::{Codec, Payload};
use crate::context::CallSequence;

pub struct TestService;

impl TestService {
    pub const SERVICE: &'static str = "TestService";
    pub const VERSION: &'static str = "v1.0";
}

#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct TestReq {
    #[prost(string, tag = "1")]
    pub a: String,
    #[prost(string, tag = "2")]
    pub b: String,
    #[prost(string, tag = "3")]
    pub c: String,
}

#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct TestRsp {
    #[prost(string, tag = "1")]
    pub a: String,
    #[prost(string, tag = "2")]
    pub b: String,
    #[prost(string, tag = "3")]
    pub c: String,
}

#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct AddReq {
    #[prost(int32, tag = "1")]
    pub a: i32,
    #[prost(int32, tag = "2")]
    pub b: i32,
}

#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct AddRsp {
    #[prost(int32, tag = "1")]
    pub sum: i32,
}

#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct ErrReq {
    #[prost(int32, tag = "1")]
    pub a: i32,
}

#[derive(Clone, PartialEq, Eq, prost::Message, Serialize, Deserialize)]
pub struct ErrRsp {
    #[prost(int32, tag = "1")]
    pub a: i32,
}

/// Outcome counts of a demo run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DemoReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl DemoReport {
    fn record(&mut self, ok: bool) {
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Runs Test, Add and Err against TestService with JSON, then protobuf.
///
/// Every call gets its own sequence from `seq`. A failed call is logged and
/// the run moves on to the next one.
pub async fn run(client: &RpcClient, seq: &CallSequence, rounds: usize) -> DemoReport {
    let mut report = DemoReport::default();
    for _ in 0..rounds {
        for codec in [Codec::Json, Codec::Protobuf] {
            tracing::debug!(%codec, "start demo calls");
            run_codec(client, seq, codec, &mut report).await;
        }
    }
    report
}

async fn run_codec(client: &RpcClient, seq: &CallSequence, codec: Codec, report: &mut DemoReport) {
    let test_req = TestReq {
        a: "aaa".to_string(),
        b: "bbb".to_string(),
        c: "ccc".to_string(),
    };
    let ok = call_logged::<_, TestRsp>(client, seq, codec, "Test", &test_req).await;
    report.record(ok);

    let add_req = AddReq { a: 1, b: 10 };
    let ok = call_logged::<_, AddRsp>(client, seq, codec, "Add", &add_req).await;
    report.record(ok);

    // The server is expected to reject this one.
    let err_req = ErrReq { a: 1 };
    let ok = call_logged::<_, ErrRsp>(client, seq, codec, "Err", &err_req).await;
    report.record(ok);
}

async fn call_logged<Req, Rsp>(
    client: &RpcClient,
    seq: &CallSequence,
    codec: Codec,
    method: &str,
    req: &Req,
) -> bool
where
    Req: Payload,
    Rsp: Payload + Debug,
{
    let ctx = seq.next_context();
    let result: crate::error::Result<Rsp> = client
        .call(&ctx, codec, TestService::SERVICE, TestService::VERSION, method, req)
        .await;

    match result {
        Ok(rsp) => {
            tracing::info!(
                service = TestService::SERVICE,
                method,
                %codec,
                request = ?req,
                response = ?rsp,
                "call succeeded"
            );
            true
        }
        Err(e) => {
            tracing::error!(
                service = TestService::SERVICE,
                method,
                %codec,
                request = ?req,
                error = %e,
                "call failed"
            );
            false
        }
    }
}
