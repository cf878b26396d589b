pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod demo;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod rng;
pub mod strategies;

pub use client::RpcClient;
pub use codec::Codec;
pub use context::{CallSequence, SelectionContext};
pub use error::{ClientError, SelectError};
pub use registry::{Registry, ServiceInstance, StaticRegistry};
pub use strategies::strategy::SelectionStrategy;

/// Crate version reported in logs and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
