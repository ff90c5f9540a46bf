//! # Native Core Entry Points
//!
//! The boundary with the native NovaKV core is carried as [`NativeApi`], a
//! table of `unsafe extern "C"` function pointers. Production builds fill it
//! from the linked `novakv_core` library (the `native` cargo feature);
//! embedders and the test suite substitute their own table, which keeps the
//! whole dispatch path exercisable without the real core.

use std::ffi::c_char;

use crate::ffi::layout::{
    BatchLayout, BatchOptionsLayout, CmdLayout, ConnectionConfigLayout, RouteLayout, WireReply,
};

/// Result callback invoked by the core when a call completes successfully.
///
/// The reply tree is owned by the core; the callback must copy what it
/// needs synchronously and arrange for exactly one matching
/// [`NativeApi::free_reply`] call. The core invokes this from its own
/// thread pool; the callback must return quickly and must never unwind.
pub type ResultCallback = unsafe extern "C" fn(call_index: u64, reply: *const WireReply);

/// Error callback invoked by the core when a call fails.
///
/// `message` is a UTF-8 C string owned by the core; it is only valid for
/// the duration of the callback. `kind` is an [`crate::ffi::layout::ErrorKind`]
/// discriminant. Same threading and no-unwind rules as [`ResultCallback`].
pub type ErrorCallback = unsafe extern "C" fn(call_index: u64, message: *const c_char, kind: u32);

/// Push-notification callback, registered process-wide at client creation.
///
/// `kind` is a [`crate::ffi::layout::PushKind`] discriminant. The message,
/// channel and pattern spans are owned by the core and valid only for the
/// duration of the callback; `pattern` is null (with length 0) for
/// non-pattern notifications. Same threading and no-unwind rules as
/// [`ResultCallback`].
pub type PushCallback = unsafe extern "C" fn(
    handle: u64,
    kind: u32,
    message: *const u8,
    message_len: u64,
    channel: *const u8,
    channel_len: u64,
    pattern: *const u8,
    pattern_len: u64,
);

/// The native core's entry points.
///
/// All request structures are read synchronously during the call; the core
/// never retains pointers into them, so the owning marshalling unit may be
/// released as soon as the call returns.
#[derive(Debug, Clone, Copy)]
pub struct NativeApi {
    /// Begin establishing a connection. Completion is delivered through
    /// `on_result`/`on_error` keyed by the config's `request_token`; the
    /// success reply is an `Int` wire value carrying the new client handle.
    /// Exactly one of the two callbacks fires, exactly once.
    pub create_client: unsafe extern "C" fn(
        config: *const ConnectionConfigLayout,
        on_result: ResultCallback,
        on_error: ErrorCallback,
        on_push: Option<PushCallback>,
    ),

    /// Tear down a client. Safe to call even if establishment never
    /// completed; the handle is invalid afterwards.
    pub close_client: unsafe extern "C" fn(handle: u64),

    /// Dispatch one command. `route` may be null. The result arrives later
    /// through the callbacks registered at creation, keyed by `call_index`.
    pub dispatch_command: unsafe extern "C" fn(
        handle: u64,
        call_index: u64,
        cmd: *const CmdLayout,
        route: *const RouteLayout,
    ),

    /// Dispatch a batch. `options` may be null.
    pub dispatch_batch: unsafe extern "C" fn(
        handle: u64,
        call_index: u64,
        batch: *const BatchLayout,
        raise_on_error: bool,
        options: *const BatchOptionsLayout,
    ),

    /// Replace the connection password; null clears it. `immediate_auth`
    /// re-authenticates the live connection instead of waiting for the next
    /// reconnect.
    pub update_connection_password: unsafe extern "C" fn(
        handle: u64,
        call_index: u64,
        password: *const c_char,
        immediate_auth: bool,
    ),

    /// Invoke a cached server-side script by hash with the given keys and
    /// arguments.
    pub invoke_script: unsafe extern "C" fn(
        handle: u64,
        call_index: u64,
        hash: *const c_char,
        key_count: usize,
        key_ptrs: *const *const u8,
        key_lens: *const usize,
        arg_count: usize,
        arg_ptrs: *const *const u8,
        arg_lens: *const usize,
    ),

    /// Free a reply tree received through [`ResultCallback`]. Must be
    /// called exactly once per received reply, on every path including
    /// decode failure.
    pub free_reply: unsafe extern "C" fn(reply: *mut WireReply),
}

#[cfg(feature = "native")]
mod sys {
    use super::*;

    #[link(name = "novakv_core")]
    extern "C" {
        pub fn novakv_create_client(
            config: *const ConnectionConfigLayout,
            on_result: ResultCallback,
            on_error: ErrorCallback,
            on_push: Option<PushCallback>,
        );
        pub fn novakv_close_client(handle: u64);
        pub fn novakv_dispatch_command(
            handle: u64,
            call_index: u64,
            cmd: *const CmdLayout,
            route: *const RouteLayout,
        );
        pub fn novakv_dispatch_batch(
            handle: u64,
            call_index: u64,
            batch: *const BatchLayout,
            raise_on_error: bool,
            options: *const BatchOptionsLayout,
        );
        pub fn novakv_update_connection_password(
            handle: u64,
            call_index: u64,
            password: *const c_char,
            immediate_auth: bool,
        );
        pub fn novakv_invoke_script(
            handle: u64,
            call_index: u64,
            hash: *const c_char,
            key_count: usize,
            key_ptrs: *const *const u8,
            key_lens: *const usize,
            arg_count: usize,
            arg_ptrs: *const *const u8,
            arg_lens: *const usize,
        );
        pub fn novakv_free_reply(reply: *mut WireReply);
    }
}

#[cfg(feature = "native")]
impl NativeApi {
    /// Entry points of the linked `novakv_core` library.
    pub fn native() -> NativeApi {
        NativeApi {
            create_client: sys::novakv_create_client,
            close_client: sys::novakv_close_client,
            dispatch_command: sys::novakv_dispatch_command,
            dispatch_batch: sys::novakv_dispatch_batch,
            update_connection_password: sys::novakv_update_connection_password,
            invoke_script: sys::novakv_invoke_script,
            free_reply: sys::novakv_free_reply,
        }
    }
}
