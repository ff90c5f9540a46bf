//! # Connection Configuration
//!
//! Settings consumed by [`crate::client::Client::connect_with`] and
//! marshalled across the FFI boundary by the connection-config marshalling
//! unit. Loading these from files or the CLI is a caller concern; this
//! module only defines the typed objects and their defaults.

use std::time::Duration;

use crate::error::{Error, Result};

/// Address of one seed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    /// Hostname or IP address (e.g. "127.0.0.1")
    pub host: String,
    /// TCP port the node listens on (e.g. 7379)
    pub port: u16,
}

impl NodeAddress {
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// TLS behavior for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS with certificate verification
    Secure,
    /// TLS without certificate verification (development setups)
    Insecure,
}

/// Which nodes read commands may be served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFrom {
    /// Always read from the primary (strongest consistency)
    Primary,
    /// Prefer replicas, falling back to the primary
    PreferReplica,
    /// Prefer replicas in the given availability zone
    AzAffinity(String),
    /// Prefer replicas and the primary in the given availability zone
    AzAffinityReplicasAndPrimary(String),
}

impl ReadFrom {
    pub(crate) fn strategy_tag(&self) -> u32 {
        match self {
            ReadFrom::Primary => 0,
            ReadFrom::PreferReplica => 1,
            ReadFrom::AzAffinity(_) => 2,
            ReadFrom::AzAffinityReplicasAndPrimary(_) => 3,
        }
    }

    pub(crate) fn az(&self) -> Option<&str> {
        match self {
            ReadFrom::AzAffinity(az) | ReadFrom::AzAffinityReplicasAndPrimary(az) => Some(az),
            _ => None,
        }
    }
}

/// Reconnection backoff: delays grow as `factor * exponent_base ^ attempt`
/// up to `number_of_retries` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStrategy {
    pub number_of_retries: u32,
    pub factor: u32,
    pub exponent_base: u32,
}

/// Server credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    /// None means the default user
    pub username: Option<String>,
    pub password: String,
}

/// Wire protocol generation to negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Older protocol: pair-shaped replies arrive as flat sequences
    Resp2,
    /// Newer protocol: pair-shaped replies arrive as genuine mappings
    Resp3,
}

impl ProtocolVersion {
    pub(crate) fn tag(self) -> u32 {
        match self {
            ProtocolVersion::Resp2 => 2,
            ProtocolVersion::Resp3 => 3,
        }
    }
}

/// Channels to subscribe to on connect. Names are byte strings; pattern
/// entries use server-side glob matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubSubSubscriptions {
    pub channels: Vec<Vec<u8>>,
    pub patterns: Vec<Vec<u8>>,
    pub sharded_channels: Vec<Vec<u8>>,
}

impl PubSubSubscriptions {
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.patterns.is_empty() && self.sharded_channels.is_empty()
    }
}

/// Main configuration for a NovaKV client connection.
///
/// All optional settings fall back to the core's own defaults when absent.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Seed node addresses; at least one is required
    pub addresses: Vec<NodeAddress>,

    /// Whether the deployment is a cluster
    pub cluster_mode: bool,

    /// TLS mode; None disables TLS
    pub tls: Option<TlsMode>,

    /// Per-request timeout
    pub request_timeout: Option<Duration>,

    /// Timeout for establishing the connection
    pub connection_timeout: Option<Duration>,

    /// Read routing preference
    pub read_from: Option<ReadFrom>,

    /// Reconnection backoff parameters
    pub retry_strategy: Option<RetryStrategy>,

    /// Server credentials
    pub authentication: Option<Authentication>,

    /// Logical database to select on connect
    pub database_id: u32,

    /// Protocol generation; None lets the core negotiate
    pub protocol: Option<ProtocolVersion>,

    /// Connection name reported to the server
    pub client_name: Option<String>,

    /// Defer the actual connection until the first command
    pub lazy_connect: bool,

    /// Subscriptions to establish on connect
    pub pubsub: Option<PubSubSubscriptions>,

    /// Additional trusted root certificates (DER blobs) for TLS
    pub root_certs: Vec<Vec<u8>>,
}

impl ConnectionConfig {
    /// Start a configuration from seed addresses.
    pub fn new(addresses: Vec<NodeAddress>) -> Self {
        Self {
            addresses,
            ..Self::default()
        }
    }

    pub fn with_cluster_mode(mut self, enabled: bool) -> Self {
        self.cluster_mode = enabled;
        self
    }

    pub fn with_tls(mut self, mode: TlsMode) -> Self {
        self.tls = Some(mode);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    pub fn with_read_from(mut self, read_from: ReadFrom) -> Self {
        self.read_from = Some(read_from);
        self
    }

    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    pub fn with_authentication(mut self, auth: Authentication) -> Self {
        self.authentication = Some(auth);
        self
    }

    pub fn with_database_id(mut self, id: u32) -> Self {
        self.database_id = id;
        self
    }

    pub fn with_protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn with_client_name<S: Into<String>>(mut self, name: S) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_lazy_connect(mut self, lazy: bool) -> Self {
        self.lazy_connect = lazy;
        self
    }

    pub fn with_pubsub(mut self, subscriptions: PubSubSubscriptions) -> Self {
        self.pubsub = Some(subscriptions);
        self
    }

    pub fn with_root_certs(mut self, certs: Vec<Vec<u8>>) -> Self {
        self.root_certs = certs;
        self
    }

    /// Check the parts the binding itself can validate before marshalling.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            return Err(Error::invalid_parameter(
                "at least one seed address is required",
            ));
        }
        if self.root_certs.iter().any(|cert| cert.is_empty()) {
            return Err(Error::invalid_parameter("empty root certificate blob"));
        }
        Ok(())
    }

    /// Clamp a duration to the u32 milliseconds field the layout carries.
    pub(crate) fn timeout_ms(timeout: Duration) -> u32 {
        u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
    }
}
