//! Node configuration loaded from `SM_*` environment variables.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sm_01_shard_store::{ShardId, ShardStoreConfig, StoreConfigError};
use sm_02_dispatch::{DispatchConfig, DispatchConfigError, ShardDescriptor};
use sm_03_api_gateway::{ConfigError as GatewayConfigError, GatewayConfig};
use thiserror::Error;

/// Default listen port for shard nodes.
pub const DEFAULT_SHARD_PORT: u16 = 5001;

/// What this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Load balancer in front of remote shard nodes.
    Balancer,
    /// A single shard node.
    Shard,
    /// Balancer with every shard hosted in-process.
    Standalone,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Balancer => "balancer",
            NodeRole::Shard => "shard",
            NodeRole::Standalone => "standalone",
        }
    }
}

impl FromStr for NodeRole {
    type Err = NodeConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balancer" | "lb" => Ok(NodeRole::Balancer),
            "shard" => Ok(NodeRole::Shard),
            "standalone" | "all" => Ok(NodeRole::Standalone),
            other => Err(NodeConfigError::invalid("SM_ROLE", other, "unknown role")),
        }
    }
}

/// Full configuration of one node process.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub role: NodeRole,
    /// Balancer HTTP surface. Its `http` section is also the shard listen address.
    pub gateway: GatewayConfig,
    /// Shard list for the balancer roles.
    pub dispatch: DispatchConfig,
    /// Store settings for the shard role; the template for standalone shards.
    pub store: ShardStoreConfig,
    /// Registered `(username, secret)` pairs.
    pub users: Vec<(String, String)>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::Balancer,
            gateway: GatewayConfig::default(),
            dispatch: DispatchConfig::default(),
            store: ShardStoreConfig::default(),
            users: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, NodeConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, NodeConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, NodeConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(role) = lookup("SM_ROLE") {
            config.role = role.parse()?;
        }
        if config.role == NodeRole::Shard {
            config.gateway.http.port = DEFAULT_SHARD_PORT;
        }

        if let Some(host) = lookup("SM_HTTP_HOST") {
            config.gateway.http.host = parse_var::<IpAddr>("SM_HTTP_HOST", &host)?;
        }
        if let Some(port) = lookup("SM_HTTP_PORT") {
            config.gateway.http.port = parse_var("SM_HTTP_PORT", &port)?;
        }
        if let Some(ms) = lookup("SM_REQUEST_TIMEOUT_MS") {
            config.gateway.timeouts.request =
                Duration::from_millis(parse_var("SM_REQUEST_TIMEOUT_MS", &ms)?);
        }

        if let Some(shards) = lookup("SM_SHARDS") {
            config.dispatch.shards = parse_shards(&shards)?;
        }
        if let Some(ms) = lookup("SM_SHARD_TIMEOUT_MS") {
            config.dispatch.shard_timeout_ms = parse_var("SM_SHARD_TIMEOUT_MS", &ms)?;
        }
        if let Some(users) = lookup("SM_USERS") {
            config.users = parse_users(&users)?;
        }

        if let Some(id) = lookup("SM_SHARD_ID") {
            config.store.shard_id = ShardId::new(id.trim());
        }
        if let Some(backend) = lookup("SM_BACKEND") {
            config.store.backend = backend.parse()?;
        }
        if let Some(dir) = lookup("SM_DATA_DIR") {
            config.store.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("SM_FAULT_INJECTION") {
            config.store.fault_injection = parse_flag(&flag);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the sections the configured role uses.
    pub fn validate(&self) -> Result<(), NodeConfigError> {
        match self.role {
            NodeRole::Shard => self.store.validate()?,
            NodeRole::Balancer => {
                self.gateway.validate()?;
                self.dispatch.validate()?;
            }
            NodeRole::Standalone => {
                self.gateway.validate()?;
                if self.dispatch.shards.is_empty() {
                    return Err(DispatchConfigError::NoShards.into());
                }
                if self.dispatch.shard_timeout_ms == 0 {
                    return Err(DispatchConfigError::ZeroTimeout.into());
                }
                for store in self.standalone_stores() {
                    store.validate()?;
                }
            }
        }
        Ok(())
    }

    /// Listen address for this node.
    pub fn listen_addr(&self) -> SocketAddr {
        self.gateway.http_addr()
    }

    /// One store configuration per configured shard, sharing the data directory.
    pub fn standalone_stores(&self) -> Vec<ShardStoreConfig> {
        self.dispatch
            .shards
            .iter()
            .map(|shard| ShardStoreConfig {
                shard_id: shard.id.clone(),
                ..self.store.clone()
            })
            .collect()
    }
}

/// Configuration errors, naming the offending variable where there is one.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("{var}={value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchConfigError),

    #[error(transparent)]
    Store(#[from] StoreConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayConfigError),
}

impl NodeConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        NodeConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, NodeConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| NodeConfigError::invalid(var, value, e.to_string()))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// `S1=http://host:5001,S2=http://host:5002`. Standalone nodes may omit the
/// endpoints: `S1,S2,S3`.
fn parse_shards(value: &str) -> Result<Vec<ShardDescriptor>, NodeConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, endpoint) = entry.split_once('=').unwrap_or((entry, ""));
            let id = id.trim();
            if id.is_empty() {
                return Err(NodeConfigError::invalid("SM_SHARDS", entry, "empty shard id"));
            }
            Ok(ShardDescriptor::new(id, endpoint.trim()))
        })
        .collect()
}

/// `alice:secret,bob:secret`
fn parse_users(value: &str) -> Result<Vec<(String, String)>, NodeConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((user, secret)) if !user.trim().is_empty() => {
                Ok((user.trim().to_string(), secret.to_string()))
            }
            _ => Err(NodeConfigError::invalid(
                "SM_USERS",
                entry,
                "expected username:secret",
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_01_shard_store::StorageBackend;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_to_balancer_on_5000() {
        let config = NodeConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.role, NodeRole::Balancer);
        assert_eq!(config.listen_addr().port(), 5000);
        assert_eq!(config.dispatch.shards.len(), 3);
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_shard_role() {
        let config = NodeConfig::from_vars(&vars(&[
            ("SM_ROLE", "shard"),
            ("SM_SHARD_ID", "S2"),
            ("SM_BACKEND", "sqlite"),
            ("SM_DATA_DIR", "/tmp/sm"),
            ("SM_FAULT_INJECTION", "true"),
        ]))
        .unwrap();

        assert_eq!(config.role, NodeRole::Shard);
        assert_eq!(config.listen_addr().port(), DEFAULT_SHARD_PORT);
        assert_eq!(config.store.shard_id, ShardId::new("S2"));
        assert_eq!(config.store.backend, StorageBackend::Sqlite);
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/sm"));
        assert!(config.store.fault_injection);
    }

    #[test]
    fn test_shard_list_and_users() {
        let config = NodeConfig::from_vars(&vars(&[
            ("SM_SHARDS", "A=http://10.0.0.1:7000, B=http://10.0.0.2:7000"),
            ("SM_SHARD_TIMEOUT_MS", "250"),
            ("SM_USERS", "alice:pw1,bob:pw2"),
        ]))
        .unwrap();

        assert_eq!(
            config.dispatch.shards,
            vec![
                ShardDescriptor::new("A", "http://10.0.0.1:7000"),
                ShardDescriptor::new("B", "http://10.0.0.2:7000"),
            ]
        );
        assert_eq!(config.dispatch.shard_timeout(), Duration::from_millis(250));
        assert_eq!(config.users[1], ("bob".to_string(), "pw2".to_string()));
    }

    #[test]
    fn test_balancer_requires_endpoints() {
        let err = NodeConfig::from_vars(&vars(&[("SM_SHARDS", "S1,S2")])).unwrap_err();
        assert!(matches!(
            err,
            NodeConfigError::Dispatch(DispatchConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_standalone_accepts_bare_ids() {
        let config = NodeConfig::from_vars(&vars(&[
            ("SM_ROLE", "standalone"),
            ("SM_SHARDS", "S1,S2"),
            ("SM_BACKEND", "memory"),
        ]))
        .unwrap();

        let stores = config.standalone_stores();
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[1].shard_id, ShardId::new("S2"));
        assert_eq!(stores[1].backend, StorageBackend::Memory);
    }

    #[test]
    fn test_bad_values_name_the_variable() {
        let err = NodeConfig::from_vars(&vars(&[("SM_HTTP_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().starts_with("SM_HTTP_PORT="));

        let err = NodeConfig::from_vars(&vars(&[("SM_ROLE", "replica")])).unwrap_err();
        assert!(matches!(err, NodeConfigError::InvalidValue { var: "SM_ROLE", .. }));

        let err = NodeConfig::from_vars(&vars(&[("SM_USERS", "alice")])).unwrap_err();
        assert!(matches!(err, NodeConfigError::InvalidValue { var: "SM_USERS", .. }));
    }

    #[test]
    fn test_unknown_backend() {
        let err = NodeConfig::from_vars(&vars(&[("SM_ROLE", "shard"), ("SM_BACKEND", "mongo")]))
            .unwrap_err();
        assert!(matches!(
            err,
            NodeConfigError::Store(StoreConfigError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let err = NodeConfig::from_vars(&vars(&[("SM_REQUEST_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(matches!(err, NodeConfigError::Gateway(_)));
    }
}
