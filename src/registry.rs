//! Service registry: resolves a logical service name to its instances.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// One resolved backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub service: String,
    pub version: String,
    /// `host:port` the transport dials.
    pub address: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ServiceInstance {
    pub fn new(service: &str, version: &str, address: &str) -> Self {
        Self {
            service: service.to_string(),
            version: version.to_string(),
            address: address.to_string(),
            metadata: HashMap::new(),
        }
    }
}

/// Registry lookup used by the client once per call.
pub trait Registry: Send + Sync {
    fn resolve(&self, service: &str, version: &str) -> Result<Vec<ServiceInstance>>;
}

/// Registry entries as they appear in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

type ServiceKey = (String, String);

/// In-memory registry whose instance lists can be replaced at runtime.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    services: RwLock<HashMap<ServiceKey, Vec<ServiceInstance>>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        let registry = Self::new();
        for entry in &config.services {
            registry.update(&entry.name, &entry.version, &entry.addresses);
        }
        registry
    }

    /// Replaces the instance list of `service`/`version`.
    pub fn update<S: AsRef<str>>(&self, service: &str, version: &str, addresses: &[S]) {
        let instances: Vec<ServiceInstance> = addresses
            .iter()
            .map(|addr| ServiceInstance::new(service, version, addr.as_ref()))
            .collect();
        tracing::debug!(service, version, count = instances.len(), "registry updated");
        self.services
            .write()
            .insert((service.to_string(), version.to_string()), instances);
    }

    pub fn remove(&self, service: &str, version: &str) -> bool {
        self.services
            .write()
            .remove(&(service.to_string(), version.to_string()))
            .is_some()
    }
}

impl Registry for StaticRegistry {
    fn resolve(&self, service: &str, version: &str) -> Result<Vec<ServiceInstance>> {
        if service.is_empty() {
            return Err(ClientError::Registry {
                service: service.to_string(),
                message: "empty service name".to_string(),
            });
        }
        let services = self.services.read();
        Ok(services
            .get(&(service.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
