//! # NovaKV Client
//!
//! The public API surface: connect to a deployment through the native
//! core, execute typed commands and batches, receive pub/sub messages,
//! close. Command execution is fully asynchronous: the dispatch entry
//! point returns immediately and the core completes the call later through
//! the result/error callbacks, keyed by a call index this module hands out.
//!
//! Like the push bridge, the result and error callbacks run on the core's
//! own threads: they copy what they need, free the core-owned reply, wake
//! the waiting future, and return. Both are wrapped in `catch_unwind`
//! because nothing may ever unwind across the foreign boundary.

use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::batch::{Batch, BatchOptions};
use crate::builders;
use crate::command::{Command, Prepared};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::ffi::layout::{ErrorKind, WireReply};
use crate::ffi::marshal::{
    BatchBuffer, BatchOptionsBuffer, CommandBuffer, ConfigBuffer, RouteBuffer, ScriptArgsBuffer,
};
use crate::ffi::native::{NativeApi, PushCallback};
use crate::push::{push_bridge, MessageHandler};
use crate::registry::ClientRegistry;
use crate::route::{self, ClusterValue, Route};
use crate::value::Value;

/// How often the background sweep evicts expired registry entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Pending calls
// ---------------------------------------------------------------------------

struct Pending {
    tx: oneshot::Sender<Result<Value>>,
    free_reply: unsafe extern "C" fn(*mut WireReply),
}

/// In-flight calls awaiting their result callback, keyed by call index.
struct PendingCalls {
    next: AtomicU64,
    entries: Mutex<HashMap<u64, Pending>>,
}

static PENDING: Lazy<PendingCalls> = Lazy::new(|| PendingCalls {
    next: AtomicU64::new(1),
    entries: Mutex::new(HashMap::new()),
});

impl PendingCalls {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Pending>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn register(
        &self,
        free_reply: unsafe extern "C" fn(*mut WireReply),
    ) -> (u64, oneshot::Receiver<Result<Value>>) {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.entries().insert(index, Pending { tx, free_reply });
        (index, rx)
    }

    fn take(&self, index: u64) -> Option<Pending> {
        self.entries().remove(&index)
    }

    /// Forget a call that never reached the core (marshalling failed).
    fn discard(&self, index: u64) {
        self.entries().remove(&index);
    }
}

// ---------------------------------------------------------------------------
// Result/error callbacks
// ---------------------------------------------------------------------------

/// Result callback handed to the native core at client creation.
///
/// # Safety
/// `reply` must be null or point to a well-formed reply tree owned by the
/// core; the matching free entry point is invoked here exactly once.
pub(crate) unsafe extern "C" fn result_bridge(call_index: u64, reply: *const WireReply) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        unsafe { deliver_result(call_index, reply) };
    }));
    if outcome.is_err() {
        error!("result callback panicked for call {call_index}");
    }
}

/// # Safety
/// See [`result_bridge`].
unsafe fn deliver_result(call_index: u64, reply: *const WireReply) {
    let Some(pending) = PENDING.take(call_index) else {
        // Without the pending entry there is no free function to use; this
        // only happens when the core breaks its exactly-once contract.
        error!("result callback for unknown call index {call_index}; reply leaked");
        return;
    };

    let value = if reply.is_null() {
        Ok(Value::Nil)
    } else {
        let decoded = unsafe { Value::decode(&*reply) };
        // Exactly one free per received payload, decode failure included.
        unsafe { (pending.free_reply)(reply as *mut WireReply) };
        decoded
    };

    if pending.tx.send(value).is_err() {
        debug!("result for call {call_index} arrived after the caller went away");
    }
}

/// Error callback handed to the native core at client creation.
///
/// # Safety
/// `message` must be null or a valid C string owned by the core for the
/// duration of the call.
pub(crate) unsafe extern "C" fn error_bridge(call_index: u64, message: *const c_char, kind: u32) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        unsafe { deliver_error(call_index, message, kind) };
    }));
    if outcome.is_err() {
        error!("error callback panicked for call {call_index}");
    }
}

/// # Safety
/// See [`error_bridge`].
unsafe fn deliver_error(call_index: u64, message: *const c_char, kind: u32) {
    let Some(pending) = PENDING.take(call_index) else {
        warn!("error callback for unknown call index {call_index}");
        return;
    };
    let text = if message.is_null() {
        "unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned()
    };
    if pending
        .tx
        .send(Err(Error::server(ErrorKind::from(kind), text)))
        .is_err()
    {
        debug!("error for call {call_index} arrived after the caller went away");
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Shared client state. The registry holds this behind a [`std::sync::Weak`],
/// so the registry never extends the client's lifetime.
pub(crate) struct ClientInner {
    handle: u64,
    api: NativeApi,
    runtime: Handle,
    handler: Option<MessageHandler>,
    closed: AtomicBool,
}

impl ClientInner {
    pub(crate) fn message_handler(&self) -> Option<MessageHandler> {
        self.handler.clone()
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    fn close_native(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            ClientRegistry::global().unregister(self.handle);
            unsafe { (self.api.close_client)(self.handle) };
            info!("closed client with native handle {}", self.handle);
        }
    }

    #[cfg(test)]
    pub(crate) fn stub(api: NativeApi, handle: u64) -> Arc<ClientInner> {
        Arc::new(ClientInner {
            handle,
            api,
            runtime: Handle::current(),
            handler: None,
            closed: AtomicBool::new(false),
        })
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.close_native();
    }
}

/// Asynchronous NovaKV client backed by the native core.
///
/// # Example
///
/// ```rust,no_run
/// use novakv_client::{Client, ConnectionConfig, NodeAddress};
/// # async fn run(api: novakv_client::NativeApi) -> novakv_client::Result<()> {
/// let config = ConnectionConfig::new(vec![NodeAddress::new("127.0.0.1", 7379)]);
/// let client = Client::connect_with(api, config, None).await?;
///
/// client.set("hello", "world").await?;
/// let value = client.get("hello").await?;
/// assert_eq!(value.as_deref(), Some("world"));
/// # Ok(())
/// # }
/// ```
pub struct Client {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("handle", &self.inner.handle)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connect through the given native entry-point table.
    ///
    /// `handler` receives pub/sub messages; it runs on the tokio runtime,
    /// never on the core's callback thread. A push callback is registered
    /// with the core only when a handler or subscriptions are configured.
    pub async fn connect_with(
        api: NativeApi,
        config: ConnectionConfig,
        handler: Option<MessageHandler>,
    ) -> Result<Client> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::connection("a tokio runtime is required to connect"))?;

        let wants_push = handler.is_some()
            || config.pubsub.as_ref().is_some_and(|p| !p.is_empty());
        let push_cb: Option<PushCallback> = if wants_push { Some(push_bridge) } else { None };

        let (token, rx) = PENDING.register(api.free_reply);
        let issue = move || -> Result<()> {
            let mut config_buf = ConfigBuffer::new(config, token)?;
            let config_ptr = config_buf.as_ptr()?;
            debug!("requesting connection establishment (token {token})");
            unsafe { (api.create_client)(config_ptr, result_bridge, error_bridge, push_cb) };
            // The core copied the config synchronously; the buffer releases
            // here, before the asynchronous establishment completes.
            Ok(())
        };
        if let Err(err) = issue() {
            PENDING.discard(token);
            return Err(err);
        }

        let value = rx
            .await
            .map_err(|_| Error::connection("connection callback never fired"))??;
        let handle = match value {
            Value::Int(handle) if handle > 0 => handle as u64,
            other => {
                return Err(Error::unexpected_return_type(
                    "client handle",
                    other.kind_name(),
                ))
            }
        };

        let inner = Arc::new(ClientInner {
            handle,
            api,
            runtime: runtime.clone(),
            handler,
            closed: AtomicBool::new(false),
        });
        ClientRegistry::global().register(handle, &inner)?;
        spawn_registry_sweeper(&runtime);

        info!("connected client with native handle {handle}");
        Ok(Client { inner })
    }

    /// Connect through the linked `novakv_core` library.
    #[cfg(feature = "native")]
    pub async fn connect(
        config: ConnectionConfig,
        handler: Option<MessageHandler>,
    ) -> Result<Client> {
        Self::connect_with(NativeApi::native(), config, handler).await
    }

    /// The opaque native handle identifying this client.
    pub fn handle(&self) -> u64 {
        self.inner.handle
    }

    /// Execute a built command and convert its reply.
    pub async fn exec<T>(&self, prepared: Prepared<T>) -> Result<T> {
        let Prepared { command, responder } = prepared;
        let value = self.dispatch(command, None).await?;
        responder.apply(value)
    }

    /// Execute a built command with an explicit route. For commands whose
    /// routed reply is a per-node mapping; the route alone decides whether
    /// the result is unwrapped or kept per-address.
    pub async fn exec_routed<T>(
        &self,
        prepared: Prepared<T>,
        route: Route,
    ) -> Result<ClusterValue<T>> {
        let Prepared { command, responder } = prepared;
        let value = self.dispatch(command, Some(&route)).await?;
        route::aggregate(&route, value, &responder)
    }

    /// Execute a batch; the reply is one raw [`Value`] per queued command,
    /// in queue order. With `raise_on_error` unset, per-command failures
    /// stay embedded as [`Value::ServerError`] entries.
    pub async fn exec_batch(
        &self,
        batch: Batch,
        raise_on_error: bool,
        options: Option<BatchOptions>,
    ) -> Result<Vec<Value>> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Err(Error::invalid_parameter("batch contains no commands"));
        }
        let count = batch.len();

        let inner = self.inner.clone();
        let (index, rx) = PENDING.register(inner.api.free_reply);
        let issue = move || -> Result<()> {
            let mut batch_buf = BatchBuffer::new(batch)?;
            let batch_ptr = batch_buf.as_ptr()?;
            let mut options_buf = options.map(BatchOptionsBuffer::new);
            let options_ptr = match options_buf.as_mut() {
                Some(buf) => buf.as_ptr()?,
                None => std::ptr::null(),
            };
            debug!("dispatching batch of {count} commands as call {index}");
            unsafe {
                (inner.api.dispatch_batch)(
                    inner.handle,
                    index,
                    batch_ptr,
                    raise_on_error,
                    options_ptr,
                )
            };
            Ok(())
        };
        if let Err(err) = issue() {
            PENDING.discard(index);
            return Err(err);
        }

        match await_reply(rx).await? {
            Value::Array(items) => Ok(items),
            Value::ServerError(message) => Err(Error::server(ErrorKind::Unspecified, message)),
            other => Err(Error::unexpected_return_type(
                "array of batch replies",
                other.kind_name(),
            )),
        }
    }

    /// Replace the connection password; None clears it. With
    /// `immediate_auth` the live connection re-authenticates instead of
    /// waiting for the next reconnect.
    pub async fn update_connection_password(
        &self,
        password: Option<&str>,
        immediate_auth: bool,
    ) -> Result<()> {
        self.ensure_open()?;

        let inner = self.inner.clone();
        let password = match password {
            Some(text) => Some(
                CString::new(text)
                    .map_err(|_| Error::invalid_parameter("password contains a NUL byte"))?,
            ),
            None => None,
        };

        let (index, rx) = PENDING.register(inner.api.free_reply);
        {
            let password_ptr = password
                .as_ref()
                .map(|c| c.as_ptr())
                .unwrap_or(std::ptr::null());
            debug!("dispatching password update as call {index}");
            unsafe {
                (inner.api.update_connection_password)(
                    inner.handle,
                    index,
                    password_ptr,
                    immediate_auth,
                )
            };
            // The core copied the string synchronously; drop it now.
        }
        drop(password);

        match await_reply(rx).await? {
            Value::Okay | Value::Nil => Ok(()),
            Value::ServerError(message) => Err(Error::server(ErrorKind::Unspecified, message)),
            other => Err(Error::unexpected_return_type("ok", other.kind_name())),
        }
    }

    /// Invoke a cached server-side script by hash. The reply shape depends
    /// on the script, so the raw [`Value`] is returned.
    pub async fn invoke_script(
        &self,
        hash: &str,
        keys: &[&[u8]],
        args: &[&[u8]],
    ) -> Result<Value> {
        self.ensure_open()?;
        if hash.is_empty() {
            return Err(Error::invalid_parameter("script hash cannot be empty"));
        }

        let inner = self.inner.clone();
        let keys: Vec<Vec<u8>> = keys.iter().map(|k| k.to_vec()).collect();
        let args: Vec<Vec<u8>> = args.iter().map(|a| a.to_vec()).collect();
        let hash = hash.to_string();

        let (index, rx) = PENDING.register(inner.api.free_reply);
        let issue = move || -> Result<()> {
            let mut buf = ScriptArgsBuffer::new(&hash, keys, args);
            let parts = buf.as_parts()?;
            debug!("dispatching script invocation as call {index}");
            unsafe {
                (inner.api.invoke_script)(
                    inner.handle,
                    index,
                    parts.hash,
                    parts.key_count,
                    parts.key_ptrs,
                    parts.key_lens,
                    parts.arg_count,
                    parts.arg_ptrs,
                    parts.arg_lens,
                )
            };
            Ok(())
        };
        if let Err(err) = issue() {
            PENDING.discard(index);
            return Err(err);
        }

        match await_reply(rx).await? {
            Value::ServerError(message) => Err(Error::server(ErrorKind::Unspecified, message)),
            value => Ok(value),
        }
    }

    /// Get a value by key.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.exec(builders::get(key)?).await
    }

    /// Set a key-value pair.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.exec(builders::set(key, value)?).await
    }

    /// Delete keys; returns how many existed.
    pub async fn del(&self, keys: &[&str]) -> Result<i64> {
        self.exec(builders::del(keys)?).await
    }

    /// Tear down the native connection and remove the registry entry.
    /// Idempotent; in-flight deliveries that lose the race are dropped by
    /// the push bridge.
    pub fn close(&self) {
        self.inner.close_native();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::ClientClosed);
        }
        Ok(())
    }

    async fn dispatch(&self, command: Command, route: Option<&Route>) -> Result<Value> {
        self.ensure_open()?;
        let name = command.request().command_name();

        let inner = self.inner.clone();
        let (index, rx) = PENDING.register(inner.api.free_reply);
        let route = route.cloned();
        let issue = move || -> Result<()> {
            let mut cmd_buf = CommandBuffer::new(command)?;
            let cmd_ptr = cmd_buf.as_ptr()?;
            let mut route_buf = route.map(RouteBuffer::new);
            let route_ptr = match route_buf.as_mut() {
                Some(buf) => buf.as_ptr()?,
                None => std::ptr::null(),
            };
            debug!("dispatching {name} as call {index}");
            unsafe { (inner.api.dispatch_command)(inner.handle, index, cmd_ptr, route_ptr) };
            Ok(())
            // Both buffers release here, after the core's synchronous copy,
            // whether or not the call succeeded.
        };
        if let Err(err) = issue() {
            PENDING.discard(index);
            return Err(err);
        }

        await_reply(rx).await
    }
}

async fn await_reply(rx: oneshot::Receiver<Result<Value>>) -> Result<Value> {
    match rx.await {
        Ok(result) => result,
        Err(_) => Err(Error::connection("result callback never fired")),
    }
}

/// One background task per process evicts expired registry entries.
fn spawn_registry_sweeper(runtime: &Handle) {
    static SWEEPER: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    SWEEPER.get_or_init(|| {
        runtime.spawn(async {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                ClientRegistry::global().sweep();
            }
        });
    });
}
