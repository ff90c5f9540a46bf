//! # Client Registry
//!
//! Maps the opaque native client handle back to the owning client object so
//! asynchronous push notifications can find their way into Rust. Entries
//! are non-owning: the registry must never be the reason a client outlives
//! its intended lifetime, so it stores [`Weak`] references and evicts stale
//! entries on lookup and during periodic sweeps.
//!
//! The registry is an ordinary struct with explicit operations; the
//! process-wide instance the push callback consults lives behind
//! [`ClientRegistry::global`], because the callback carries nothing but the
//! handle. Tests construct their own instances.

use std::collections::HashMap;
use std::sync::{Mutex, Weak};

use log::debug;
use once_cell::sync::Lazy;

use crate::client::ClientInner;
use crate::error::{Error, Result};

static GLOBAL: Lazy<ClientRegistry> = Lazy::new(ClientRegistry::new);

/// Internally-synchronized handle-to-client lookup table.
#[derive(Default)]
pub struct ClientRegistry {
    entries: Mutex<HashMap<u64, Weak<ClientInner>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry the push callback resolves against.
    pub fn global() -> &'static ClientRegistry {
        &GLOBAL
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Weak<ClientInner>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a non-owning reference for `handle`. The zero handle is the
    /// core's "no client" sentinel and is rejected.
    pub fn register(&self, handle: u64, client: &std::sync::Arc<ClientInner>) -> Result<()> {
        if handle == 0 {
            return Err(Error::invalid_parameter("client handle must be non-zero"));
        }
        self.entries().insert(handle, std::sync::Arc::downgrade(client));
        Ok(())
    }

    /// Resolve a handle to a live client. An entry whose client has been
    /// released is evicted as a side effect and reported as not found.
    pub fn resolve(&self, handle: u64) -> Option<std::sync::Arc<ClientInner>> {
        let mut entries = self.entries();
        match entries.get(&handle).map(Weak::upgrade) {
            Some(Some(client)) => Some(client),
            Some(None) => {
                debug!("evicting stale registry entry for client handle {handle}");
                entries.remove(&handle);
                None
            }
            None => None,
        }
    }

    /// Remove a handle; returns whether an entry was present. Idempotent.
    pub fn unregister(&self, handle: u64) -> bool {
        self.entries().remove(&handle).is_some()
    }

    /// Evict every expired entry; returns the number evicted.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!("registry sweep evicted {evicted} stale entries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every entry. Test teardown only.
    pub fn clear(&self) {
        self.entries().clear();
    }
}
