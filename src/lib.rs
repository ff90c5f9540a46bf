//! NovaKV Rust Client Library
//!
//! This library is the Rust binding for NovaKV, a key-value store whose
//! protocol logic lives in the native `novakv_core` library. The binding
//! owns the traffic across that boundary: it encodes typed operations into
//! opcode-plus-byte-string commands, marshals them into the fixed C layouts
//! the core parses (with deterministic release of every allocation), and
//! decodes the core's dynamically-typed replies back into strongly-typed
//! results, including dual-shape replies and per-node cluster aggregation.
//!
//! # Features
//!
//! - **Typed command builders**: validated arguments in, exact wire tokens
//!   and a matching response converter out
//! - **Batches**: pipelines and transactions in one foreign call
//! - **Cluster routing**: route commands by slot, key, or address, with
//!   single-value or per-node results decided by the route
//! - **Pub/Sub delivery**: push notifications routed back through a
//!   non-owning client registry, off the core's callback threads
//! - **Swappable core**: the native entry points travel as a function
//!   table, so embedders and tests can supply their own core
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use novakv_client::{builders, Client, ConnectionConfig, NodeAddress, Result};
//!
//! # async fn run(api: novakv_client::NativeApi) -> Result<()> {
//! let config = ConnectionConfig::new(vec![NodeAddress::new("127.0.0.1", 7379)]);
//! let client = Client::connect_with(api, config, None).await?;
//!
//! client.set("hello", "world").await?;
//! let value = client.get("hello").await?;
//! println!("Value: {value:?}");
//!
//! let removed = client.exec(builders::del(&["hello"])?).await?;
//! println!("Removed: {removed}");
//! # Ok(())
//! # }
//! ```

pub mod error;

pub mod batch;
pub mod builders;
pub mod command;
pub mod config;
pub mod convert;
pub mod ffi;
pub mod push;
pub mod registry;
pub mod route;
pub mod value;

mod client;

// Re-export main types
pub use batch::{Batch, BatchOptions};
pub use client::Client;
pub use command::{Command, Prepared, RequestType};
pub use config::{
    Authentication, ConnectionConfig, NodeAddress, ProtocolVersion, PubSubSubscriptions, ReadFrom,
    RetryStrategy, TlsMode,
};
pub use error::{Error, Result};
pub use ffi::layout::{ErrorKind, PushKind};
pub use ffi::NativeApi;
pub use push::{MessageHandler, PushMessage};
pub use registry::ClientRegistry;
pub use route::{ClusterValue, Route, SlotType};
pub use value::Value;
