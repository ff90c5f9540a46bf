//! # Memory-Owning Marshalling Units
//!
//! Each unit here owns the foreign-memory rendition of one managed request
//! structure. Construction never allocates; the first `as_ptr()` call runs
//! the allocate-and-copy step and memoizes the result; `release()` (also run
//! by `Drop`) frees every allocation the copy step made and is a safe no-op
//! when allocation never happened. The native core reads the layouts
//! synchronously during the dispatch call and never retains the pointers, so
//! a unit is released as soon as the call returns, on every exit path.
//!
//! Allocations go through the leak/reclaim helpers at the bottom of the
//! file, which maintain a process-wide live-allocation counter
//! ([`outstanding_allocations`]) and per-unit counts used by the leak tests.
//! Release works off the counts a unit actually recorded, so a unit that
//! failed halfway through its copy step is still fully disposable.
//!
//! Units hold raw pointers and are deliberately not `Send`: each one is
//! owned by the call that created it and dies on that call's completion
//! path.

use std::ffi::{c_char, CString};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::batch::{Batch, BatchOptions};
use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::ffi::layout::{
    AddressLayout, AuthLayout, BatchLayout, BatchOptionsLayout, CmdLayout, ConnectionConfigLayout,
    PubSubConfigLayout, ReadFromLayout, RetryStrategyLayout, RouteLayout, RouteType, SlotTypeTag,
};
use crate::route::{Route, SlotType};

/// Live native allocations made by this module (leak/reclaim pairs).
static LIVE_ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

/// Number of currently outstanding native allocations. Diagnostic surface
/// for leak tests; a quiescent process reads zero.
pub fn outstanding_allocations() -> usize {
    LIVE_ALLOCATIONS.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Command unit
// ---------------------------------------------------------------------------

/// Foreign-memory owner for one [`Command`].
pub struct CommandBuffer {
    command: Command,
    raw: Option<RawCommand>,
    released: bool,
}

impl CommandBuffer {
    /// Wrap a command. Rejects the `Invalid` opcode sentinel; nothing is
    /// allocated yet.
    pub fn new(command: Command) -> Result<Self> {
        if command.request() == crate::command::RequestType::Invalid {
            return Err(Error::invalid_parameter(
                "cannot dispatch the invalid opcode sentinel",
            ));
        }
        Ok(Self {
            command,
            raw: None,
            released: false,
        })
    }

    /// Allocate-and-copy on first use, memoized afterwards. Returns the
    /// address of the fixed layout the native core parses.
    pub fn as_ptr(&mut self) -> Result<*const CmdLayout> {
        if self.released {
            return Err(Error::marshal("command buffer already released"));
        }
        if self.raw.is_none() {
            self.raw = Some(RawCommand::materialize(&self.command));
        }
        Ok(self.raw.as_ref().map(|raw| raw.layout as *const CmdLayout).unwrap_or(std::ptr::null()))
    }

    /// Free every allocation made by the copy step. Idempotent; a no-op if
    /// `as_ptr` was never called.
    pub fn release(&mut self) {
        self.released = true;
        if let Some(raw) = self.raw.take() {
            unsafe { raw.dispose() };
        }
    }

    /// Native allocations currently held by this unit.
    pub fn live_allocations(&self) -> usize {
        self.raw.as_ref().map_or(0, RawCommand::count_live)
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

struct RawCommand {
    layout: *mut CmdLayout,
    arg_ptrs: RawParts<*const u8>,
    arg_lens: RawParts<usize>,
    arg_bufs: Vec<RawParts<u8>>,
}

impl RawCommand {
    fn materialize(command: &Command) -> Self {
        let args = command.arg_slices();
        let mut arg_bufs = Vec::with_capacity(args.len());
        for arg in args {
            arg_bufs.push(leak_bytes(arg));
        }

        let (arg_ptrs, arg_lens) = if args.is_empty() {
            (RawParts::null(), RawParts::null())
        } else {
            (
                leak_vec(arg_bufs.iter().map(|b| b.ptr as *const u8).collect()),
                leak_vec(arg_bufs.iter().map(|b| b.len).collect()),
            )
        };

        let layout = leak_box(CmdLayout {
            request_type: command.request() as u32,
            arg_count: args.len(),
            args: arg_ptrs.ptr as *const *const u8,
            arg_lengths: arg_lens.ptr as *const usize,
        });

        Self {
            layout,
            arg_ptrs,
            arg_lens,
            arg_bufs,
        }
    }

    fn count_live(&self) -> usize {
        let mut live = 1; // the layout itself
        live += usize::from(!self.arg_ptrs.is_null());
        live += usize::from(!self.arg_lens.is_null());
        live += self.arg_bufs.iter().filter(|b| !b.is_null()).count();
        live
    }

    /// # Safety
    /// Must run exactly once, after the native core has stopped reading the
    /// layout.
    unsafe fn dispose(mut self) {
        // Free by the recorded counts, not the expected ones, so a
        // partially-populated unit still releases cleanly.
        for buf in self.arg_bufs.drain(..) {
            unsafe { reclaim_vec(buf) };
        }
        unsafe {
            reclaim_vec(self.arg_ptrs.take());
            reclaim_vec(self.arg_lens.take());
            reclaim_box(self.layout);
        }
    }
}

// ---------------------------------------------------------------------------
// Batch unit
// ---------------------------------------------------------------------------

/// Foreign-memory owner for a [`Batch`]: marshals each contained command
/// and pins the array of their layout addresses.
pub struct BatchBuffer {
    children: Vec<CommandBuffer>,
    is_atomic: bool,
    raw: Option<RawBatch>,
    released: bool,
}

impl BatchBuffer {
    pub fn new(batch: Batch) -> Result<Self> {
        let is_atomic = batch.is_atomic();
        let children = batch
            .into_commands()
            .into_iter()
            .map(CommandBuffer::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            children,
            is_atomic,
            raw: None,
            released: false,
        })
    }

    pub fn as_ptr(&mut self) -> Result<*const BatchLayout> {
        if self.released {
            return Err(Error::marshal("batch buffer already released"));
        }
        if self.raw.is_none() {
            let mut cmd_ptrs = Vec::with_capacity(self.children.len());
            for child in &mut self.children {
                cmd_ptrs.push(child.as_ptr()?);
            }
            let cmd_ptrs = leak_vec(cmd_ptrs);
            let layout = leak_box(BatchLayout {
                cmd_count: self.children.len(),
                cmds: cmd_ptrs.ptr as *const *const CmdLayout,
                is_atomic: self.is_atomic,
            });
            self.raw = Some(RawBatch { layout, cmd_ptrs });
        }
        Ok(self.raw.as_ref().map(|raw| raw.layout as *const BatchLayout).unwrap_or(std::ptr::null()))
    }

    /// Recursively dispose every contained command unit, then free the
    /// batch's own array and layout. Idempotent.
    pub fn release(&mut self) {
        self.released = true;
        for child in &mut self.children {
            child.release();
        }
        if let Some(raw) = self.raw.take() {
            unsafe {
                reclaim_vec(raw.cmd_ptrs);
                reclaim_box(raw.layout);
            }
        }
    }

    pub fn live_allocations(&self) -> usize {
        let own = self.raw.as_ref().map_or(0, |raw| {
            1 + usize::from(!raw.cmd_ptrs.is_null())
        });
        own + self
            .children
            .iter()
            .map(CommandBuffer::live_allocations)
            .sum::<usize>()
    }
}

impl Drop for BatchBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

struct RawBatch {
    layout: *mut BatchLayout,
    cmd_ptrs: RawParts<*const CmdLayout>,
}

// ---------------------------------------------------------------------------
// Route unit
// ---------------------------------------------------------------------------

/// Foreign-memory owner for a [`Route`].
pub struct RouteBuffer {
    route: Route,
    raw: Option<RawRoute>,
    released: bool,
}

impl RouteBuffer {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            raw: None,
            released: false,
        }
    }

    pub fn as_ptr(&mut self) -> Result<*const RouteLayout> {
        if self.released {
            return Err(Error::marshal("route buffer already released"));
        }
        if self.raw.is_none() {
            self.raw = Some(RawRoute::materialize(&self.route)?);
        }
        Ok(self.raw.as_ref().map(|raw| raw.layout as *const RouteLayout).unwrap_or(std::ptr::null()))
    }

    pub fn release(&mut self) {
        self.released = true;
        if let Some(raw) = self.raw.take() {
            unsafe { raw.dispose() };
        }
    }
}

impl Drop for RouteBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

struct RawRoute {
    layout: *mut RouteLayout,
    slot_key: *mut c_char,
    host: *mut c_char,
}

impl RawRoute {
    fn materialize(route: &Route) -> Result<Self> {
        let mut raw = RawRoute {
            layout: std::ptr::null_mut(),
            slot_key: std::ptr::null_mut(),
            host: std::ptr::null_mut(),
        };
        match raw.fill(route) {
            Ok(()) => Ok(raw),
            Err(err) => {
                unsafe { raw.dispose() };
                Err(err)
            }
        }
    }

    fn fill(&mut self, route: &Route) -> Result<()> {
        let slot_tag = |slot_type: &SlotType| match slot_type {
            SlotType::Primary => SlotTypeTag::Primary,
            SlotType::Replica => SlotTypeTag::Replica,
        };

        let mut layout = RouteLayout {
            route_type: RouteType::Random,
            slot_id: 0,
            slot_key: std::ptr::null(),
            slot_type: SlotTypeTag::Primary,
            host: std::ptr::null(),
            port: 0,
        };

        match route {
            Route::Random => layout.route_type = RouteType::Random,
            Route::AllNodes => layout.route_type = RouteType::AllNodes,
            Route::AllPrimaries => layout.route_type = RouteType::AllPrimaries,
            Route::SlotId { slot, slot_type } => {
                layout.route_type = RouteType::SlotId;
                layout.slot_id = i32::from(*slot);
                layout.slot_type = slot_tag(slot_type);
            }
            Route::SlotKey { key, slot_type } => {
                layout.route_type = RouteType::SlotKey;
                self.slot_key = leak_cstring(key, "slot key")?;
                layout.slot_key = self.slot_key;
                layout.slot_type = slot_tag(slot_type);
            }
            Route::ByAddress { host, port } => {
                layout.route_type = RouteType::ByAddress;
                self.host = leak_cstring(host, "route host")?;
                layout.host = self.host;
                layout.port = i32::from(*port);
            }
        }

        self.layout = leak_box(layout);
        Ok(())
    }

    /// # Safety
    /// Must run exactly once; tolerates partially-filled state.
    unsafe fn dispose(self) {
        unsafe {
            reclaim_cstring(self.slot_key);
            reclaim_cstring(self.host);
            if !self.layout.is_null() {
                reclaim_box(self.layout);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Batch options unit
// ---------------------------------------------------------------------------

/// Foreign-memory owner for [`BatchOptions`], including the optional nested
/// route unit.
pub struct BatchOptionsBuffer {
    options: BatchOptions,
    route: Option<RouteBuffer>,
    layout: *mut BatchOptionsLayout,
    released: bool,
}

impl BatchOptionsBuffer {
    pub fn new(options: BatchOptions) -> Self {
        let route = options.route.clone().map(RouteBuffer::new);
        Self {
            options,
            route,
            layout: std::ptr::null_mut(),
            released: false,
        }
    }

    pub fn as_ptr(&mut self) -> Result<*const BatchOptionsLayout> {
        if self.released {
            return Err(Error::marshal("batch options buffer already released"));
        }
        if self.layout.is_null() {
            let route_ptr = match self.route.as_mut() {
                Some(route) => route.as_ptr()?,
                None => std::ptr::null(),
            };
            self.layout = leak_box(BatchOptionsLayout {
                retry_server_error: self.options.retry_server_error,
                retry_connection_error: self.options.retry_connection_error,
                has_timeout: self.options.timeout_ms.is_some(),
                timeout_ms: self.options.timeout_ms.unwrap_or(0),
                route: route_ptr,
            });
        }
        Ok(self.layout)
    }

    pub fn release(&mut self) {
        self.released = true;
        if let Some(route) = self.route.as_mut() {
            route.release();
        }
        if !self.layout.is_null() {
            unsafe { reclaim_box(self.layout) };
            self.layout = std::ptr::null_mut();
        }
    }
}

impl Drop for BatchOptionsBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Connection config unit
// ---------------------------------------------------------------------------

/// Foreign-memory owner for a [`ConnectionConfig`]. The variable-length
/// collections (address list, subscription lists, root certificates) each
/// become an allocated array whose every nested allocation is recorded and
/// freed by address and count during release; the core provides no helper
/// that frees a config tree.
pub struct ConfigBuffer {
    config: ConnectionConfig,
    request_token: u64,
    raw: Option<RawConfig>,
    released: bool,
}

impl ConfigBuffer {
    pub fn new(config: ConnectionConfig, request_token: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            request_token,
            raw: None,
            released: false,
        })
    }

    pub fn as_ptr(&mut self) -> Result<*const ConnectionConfigLayout> {
        if self.released {
            return Err(Error::marshal("connection config buffer already released"));
        }
        if self.raw.is_none() {
            self.raw = Some(RawConfig::materialize(&self.config, self.request_token)?);
        }
        Ok(self
            .raw
            .as_ref()
            .map(|raw| raw.layout as *const ConnectionConfigLayout)
            .unwrap_or(std::ptr::null()))
    }

    pub fn release(&mut self) {
        self.released = true;
        if let Some(raw) = self.raw.take() {
            unsafe { raw.dispose() };
        }
    }
}

impl Drop for ConfigBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

struct RawConfig {
    layout: *mut ConnectionConfigLayout,
    addresses: RawParts<AddressLayout>,
    host_strings: Vec<*mut c_char>,
    az: *mut c_char,
    client_name: *mut c_char,
    username: *mut c_char,
    password: *mut c_char,
    channels: SpanList,
    patterns: SpanList,
    sharded: SpanList,
    root_certs: SpanList,
}

impl RawConfig {
    fn materialize(config: &ConnectionConfig, request_token: u64) -> Result<Self> {
        let mut raw = RawConfig {
            layout: std::ptr::null_mut(),
            addresses: RawParts::null(),
            host_strings: Vec::new(),
            az: std::ptr::null_mut(),
            client_name: std::ptr::null_mut(),
            username: std::ptr::null_mut(),
            password: std::ptr::null_mut(),
            channels: SpanList::empty(),
            patterns: SpanList::empty(),
            sharded: SpanList::empty(),
            root_certs: SpanList::empty(),
        };
        match raw.fill(config, request_token) {
            Ok(()) => Ok(raw),
            // Everything copied before the failure is reclaimed here, so an
            // exception mid-copy never strands native memory.
            Err(err) => {
                unsafe { raw.dispose() };
                Err(err)
            }
        }
    }

    fn fill(&mut self, config: &ConnectionConfig, request_token: u64) -> Result<()> {
        let mut address_entries = Vec::with_capacity(config.addresses.len());
        for address in &config.addresses {
            let host = leak_cstring(&address.host, "node host")?;
            self.host_strings.push(host);
            address_entries.push(AddressLayout {
                host,
                port: address.port,
            });
        }
        self.addresses = leak_vec(address_entries);

        if let Some(read_from) = &config.read_from {
            if let Some(az) = read_from.az() {
                self.az = leak_cstring(az, "availability zone")?;
            }
        }
        if let Some(name) = &config.client_name {
            self.client_name = leak_cstring(name, "client name")?;
        }
        if let Some(auth) = &config.authentication {
            if let Some(username) = &auth.username {
                self.username = leak_cstring(username, "username")?;
            }
            self.password = leak_cstring(&auth.password, "password")?;
        }

        if let Some(pubsub) = &config.pubsub {
            self.channels = SpanList::marshal(&pubsub.channels);
            self.patterns = SpanList::marshal(&pubsub.patterns);
            self.sharded = SpanList::marshal(&pubsub.sharded_channels);
        }
        self.root_certs = SpanList::marshal(&config.root_certs);

        let layout = ConnectionConfigLayout {
            request_token,
            address_count: config.addresses.len(),
            addresses: self.addresses.ptr,
            cluster_mode: config.cluster_mode,
            has_tls: config.tls.is_some(),
            tls_insecure: matches!(config.tls, Some(crate::config::TlsMode::Insecure)),
            has_request_timeout: config.request_timeout.is_some(),
            request_timeout_ms: config
                .request_timeout
                .map(ConnectionConfig::timeout_ms)
                .unwrap_or(0),
            has_connection_timeout: config.connection_timeout.is_some(),
            connection_timeout_ms: config
                .connection_timeout
                .map(ConnectionConfig::timeout_ms)
                .unwrap_or(0),
            has_read_from: config.read_from.is_some(),
            read_from: ReadFromLayout {
                strategy: config
                    .read_from
                    .as_ref()
                    .map(|r| r.strategy_tag())
                    .unwrap_or(0),
                az: self.az,
            },
            has_retry_strategy: config.retry_strategy.is_some(),
            retry_strategy: config
                .retry_strategy
                .map(|s| RetryStrategyLayout {
                    number_of_retries: s.number_of_retries,
                    factor: s.factor,
                    exponent_base: s.exponent_base,
                })
                .unwrap_or(RetryStrategyLayout {
                    number_of_retries: 0,
                    factor: 0,
                    exponent_base: 0,
                }),
            has_auth: config.authentication.is_some(),
            auth: AuthLayout {
                username: self.username,
                password: self.password,
            },
            database_id: config.database_id,
            has_protocol: config.protocol.is_some(),
            protocol: config.protocol.map(|p| p.tag()).unwrap_or(0),
            client_name: self.client_name,
            lazy_connect: config.lazy_connect,
            has_pubsub: config.pubsub.is_some(),
            pubsub: PubSubConfigLayout {
                channel_count: self.channels.count(),
                channels: self.channels.ptrs(),
                channel_lengths: self.channels.lens(),
                pattern_count: self.patterns.count(),
                patterns: self.patterns.ptrs(),
                pattern_lengths: self.patterns.lens(),
                sharded_count: self.sharded.count(),
                sharded: self.sharded.ptrs(),
                sharded_lengths: self.sharded.lens(),
            },
            root_cert_count: self.root_certs.count(),
            root_certs: self.root_certs.ptrs(),
            root_cert_lengths: self.root_certs.lens(),
        };
        self.layout = leak_box(layout);
        Ok(())
    }

    /// # Safety
    /// Must run exactly once; tolerates partially-filled state.
    unsafe fn dispose(mut self) {
        unsafe {
            for host in self.host_strings.drain(..) {
                reclaim_cstring(host);
            }
            reclaim_vec(self.addresses.take());
            reclaim_cstring(self.az);
            reclaim_cstring(self.client_name);
            reclaim_cstring(self.username);
            reclaim_cstring(self.password);
            self.channels.dispose();
            self.patterns.dispose();
            self.sharded.dispose();
            self.root_certs.dispose();
            if !self.layout.is_null() {
                reclaim_box(self.layout);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Script invocation unit
// ---------------------------------------------------------------------------

/// Pointer bundle handed to the script-invocation entry point. Only valid
/// while the owning [`ScriptArgsBuffer`] is alive and unreleased.
#[derive(Clone, Copy)]
pub struct ScriptParts {
    pub hash: *const c_char,
    pub key_count: usize,
    pub key_ptrs: *const *const u8,
    pub key_lens: *const usize,
    pub arg_count: usize,
    pub arg_ptrs: *const *const u8,
    pub arg_lens: *const usize,
}

/// Foreign-memory owner for a script invocation: the script hash plus the
/// two pointer+length array pairs for keys and arguments.
pub struct ScriptArgsBuffer {
    hash: String,
    keys: Vec<Vec<u8>>,
    args: Vec<Vec<u8>>,
    raw: Option<RawScript>,
    released: bool,
}

impl ScriptArgsBuffer {
    pub fn new(hash: &str, keys: Vec<Vec<u8>>, args: Vec<Vec<u8>>) -> Self {
        Self {
            hash: hash.to_string(),
            keys,
            args,
            raw: None,
            released: false,
        }
    }

    pub fn as_parts(&mut self) -> Result<ScriptParts> {
        if self.released {
            return Err(Error::marshal("script buffer already released"));
        }
        if self.raw.is_none() {
            let hash = leak_cstring(&self.hash, "script hash")?;
            self.raw = Some(RawScript {
                hash,
                keys: SpanList::marshal(&self.keys),
                args: SpanList::marshal(&self.args),
            });
        }
        let raw = self.raw.as_ref().ok_or_else(|| Error::marshal("script buffer empty"))?;
        Ok(ScriptParts {
            hash: raw.hash,
            key_count: raw.keys.count(),
            key_ptrs: raw.keys.ptrs(),
            key_lens: raw.keys.lens(),
            arg_count: raw.args.count(),
            arg_ptrs: raw.args.ptrs(),
            arg_lens: raw.args.lens(),
        })
    }

    pub fn release(&mut self) {
        self.released = true;
        if let Some(mut raw) = self.raw.take() {
            unsafe {
                reclaim_cstring(raw.hash);
                raw.keys.dispose();
                raw.args.dispose();
            }
        }
    }
}

impl Drop for ScriptArgsBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

struct RawScript {
    hash: *mut c_char,
    keys: SpanList,
    args: SpanList,
}

// ---------------------------------------------------------------------------
// Leak/reclaim primitives
// ---------------------------------------------------------------------------

/// Raw parts of a leaked `Vec<T>`; `null()` stands for "never allocated".
struct RawParts<T> {
    ptr: *mut T,
    len: usize,
    cap: usize,
}

impl<T> RawParts<T> {
    fn null() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }

    fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    fn take(&mut self) -> Self {
        std::mem::replace(self, Self::null())
    }
}

/// A marshalled list of byte spans: the copied buffers plus the leaked
/// pointer and length arrays the layout refers to.
struct SpanList {
    bufs: Vec<RawParts<u8>>,
    ptrs: RawParts<*const u8>,
    lens: RawParts<usize>,
}

impl SpanList {
    fn empty() -> Self {
        Self {
            bufs: Vec::new(),
            ptrs: RawParts::null(),
            lens: RawParts::null(),
        }
    }

    fn marshal(items: &[Vec<u8>]) -> Self {
        if items.is_empty() {
            return Self::empty();
        }
        let bufs: Vec<RawParts<u8>> = items.iter().map(|item| leak_bytes(item)).collect();
        let ptrs = leak_vec(bufs.iter().map(|b| b.ptr as *const u8).collect());
        let lens = leak_vec(bufs.iter().map(|b| b.len).collect());
        Self { bufs, ptrs, lens }
    }

    fn count(&self) -> usize {
        self.bufs.len()
    }

    fn ptrs(&self) -> *const *const u8 {
        self.ptrs.ptr as *const *const u8
    }

    fn lens(&self) -> *const usize {
        self.lens.ptr as *const usize
    }

    /// # Safety
    /// Must not run while the native core can still read the arrays.
    unsafe fn dispose(&mut self) {
        for buf in self.bufs.drain(..) {
            unsafe { reclaim_vec(buf) };
        }
        unsafe {
            reclaim_vec(self.ptrs.take());
            reclaim_vec(self.lens.take());
        }
    }
}

fn leak_bytes(src: &[u8]) -> RawParts<u8> {
    leak_vec(src.to_vec())
}

fn leak_vec<T>(mut vec: Vec<T>) -> RawParts<T> {
    if vec.is_empty() {
        return RawParts::null();
    }
    vec.shrink_to_fit();
    let parts = RawParts {
        ptr: vec.as_mut_ptr(),
        len: vec.len(),
        cap: vec.capacity(),
    };
    std::mem::forget(vec);
    LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    parts
}

/// # Safety
/// `parts` must come from [`leak_vec`] and not have been reclaimed before.
unsafe fn reclaim_vec<T>(parts: RawParts<T>) {
    if parts.is_null() {
        return;
    }
    LIVE_ALLOCATIONS.fetch_sub(1, Ordering::Relaxed);
    drop(unsafe { Vec::from_raw_parts(parts.ptr, parts.len, parts.cap) });
}

fn leak_box<T>(value: T) -> *mut T {
    LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    Box::into_raw(Box::new(value))
}

/// # Safety
/// `ptr` must come from [`leak_box`] and not have been reclaimed before.
unsafe fn reclaim_box<T>(ptr: *mut T) {
    LIVE_ALLOCATIONS.fetch_sub(1, Ordering::Relaxed);
    drop(unsafe { Box::from_raw(ptr) });
}

fn leak_cstring(text: &str, what: &str) -> Result<*mut c_char> {
    let cstring = CString::new(text)
        .map_err(|_| Error::invalid_parameter(format!("{what} contains a NUL byte")))?;
    LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    Ok(cstring.into_raw())
}

/// # Safety
/// `ptr` must be null or come from [`leak_cstring`], unreclaimed.
unsafe fn reclaim_cstring(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    LIVE_ALLOCATIONS.fetch_sub(1, Ordering::Relaxed);
    drop(unsafe { CString::from_raw(ptr) });
}
