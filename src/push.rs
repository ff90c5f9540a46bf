//! # Push Notification Bridge
//!
//! The native core delivers pub/sub traffic by invoking one process-wide
//! callback on a thread pool it owns. Everything reachable from that
//! callback must be exception-opaque: a panic crossing the foreign boundary
//! is undefined behavior, so the entire body runs under `catch_unwind` and
//! every failure is logged and swallowed.
//!
//! The callback itself stays synchronous and fast. It resolves the handle,
//! classifies the notification, copies the byte spans into owned strings,
//! re-resolves the handle (client disposal races with delivery and there is
//! no locking discipline across the boundary), and hands the message to the
//! tokio runtime so the foreign thread returns in bounded time. Callback
//! occupancy is tracked and logged because a slow callback starves the
//! core's thread pool.
//!
//! No ordering is guaranteed between messages once they are re-dispatched;
//! a handler that needs per-channel ordering must enforce it itself.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice::from_raw_parts;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::ffi::layout::PushKind;
use crate::registry::ClientRegistry;

/// Callback-thread occupancy past this budget is logged as a warning.
const CALLBACK_BUDGET: Duration = Duration::from_millis(5);

/// A decoded pub/sub message delivered to the client's message handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub kind: PushKind,
    /// Channel the message arrived on
    pub channel: String,
    /// Message payload
    pub message: String,
    /// The subscription pattern that matched, for pattern messages
    pub pattern: Option<String>,
}

/// Handler invoked for every delivered message. Runs on the tokio runtime,
/// never on the core's callback thread; panics are caught and logged.
pub type MessageHandler = Arc<dyn Fn(PushMessage) + Send + Sync>;

/// The process-wide push callback registered with the native core.
///
/// # Safety
///
/// The span pointers must be valid for their stated lengths for the
/// duration of the call (the core owns them and reclaims them on return).
pub(crate) unsafe extern "C" fn push_bridge(
    handle: u64,
    kind: u32,
    message: *const u8,
    message_len: u64,
    channel: *const u8,
    channel_len: u64,
    pattern: *const u8,
    pattern_len: u64,
) {
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        unsafe {
            handle_push(
                handle,
                kind,
                message,
                message_len,
                channel,
                channel_len,
                pattern,
                pattern_len,
            )
        };
    }));
    if outcome.is_err() {
        error!("push callback panicked; notification for client {handle} dropped");
    }

    let elapsed = started.elapsed();
    if elapsed > CALLBACK_BUDGET {
        warn!("push callback held the core's thread for {elapsed:?} (budget {CALLBACK_BUDGET:?})");
    } else {
        trace!("push callback returned in {elapsed:?}");
    }
}

/// # Safety
/// See [`push_bridge`].
unsafe fn handle_push(
    handle: u64,
    kind: u32,
    message: *const u8,
    message_len: u64,
    channel: *const u8,
    channel_len: u64,
    pattern: *const u8,
    pattern_len: u64,
) {
    let kind = match PushKind::try_from(kind) {
        Ok(kind) => kind,
        Err(raw) => {
            warn!("push notification with unknown kind {raw} for client {handle}; dropped");
            return;
        }
    };

    // First resolve: cheap rejection of notifications for clients that are
    // already gone.
    let Some(_client) = ClientRegistry::global().resolve(handle) else {
        debug!("push notification for unknown client handle {handle}; dropped");
        return;
    };

    if kind == PushKind::Disconnection {
        info!("pub/sub disconnection notice for client {handle}");
        return;
    }
    if !kind.is_message() {
        trace!("pub/sub control notification {kind:?} for client {handle}");
        return;
    }

    let msg = match unsafe {
        decode_push(
            kind,
            message,
            message_len,
            channel,
            channel_len,
            pattern,
            pattern_len,
        )
    } {
        Ok(msg) => msg,
        Err(err) => {
            warn!("failed to decode push notification for client {handle}: {err}");
            return;
        }
    };

    // Second resolve at hand-off time: disposal may have raced the decode.
    // Best-effort only; a message that loses the race is dropped, not
    // queued.
    let Some(client) = ClientRegistry::global().resolve(handle) else {
        debug!("client {handle} closed during push delivery; message dropped");
        return;
    };
    let Some(handler) = client.message_handler() else {
        debug!("client {handle} has no message handler; push message dropped");
        return;
    };

    client.runtime().spawn(async move {
        if catch_unwind(AssertUnwindSafe(|| handler(msg))).is_err() {
            error!("message handler panicked; message dropped");
        }
    });
}

/// Copy the raw byte spans into an owned [`PushMessage`].
///
/// # Safety
/// Non-null span pointers must be valid for their stated lengths.
unsafe fn decode_push(
    kind: PushKind,
    message: *const u8,
    message_len: u64,
    channel: *const u8,
    channel_len: u64,
    pattern: *const u8,
    pattern_len: u64,
) -> Result<PushMessage> {
    if message.is_null() {
        return Err(Error::unexpected_return_type("message bytes", "null pointer"));
    }
    if channel.is_null() || channel_len == 0 {
        return Err(Error::unexpected_return_type(
            "non-empty channel name",
            "empty channel",
        ));
    }

    let message = unsafe { span_to_string(message, message_len) }?;
    let channel = unsafe { span_to_string(channel, channel_len) }?;

    let pattern = if kind.has_pattern() {
        if pattern.is_null() {
            return Err(Error::unexpected_return_type(
                "pattern bytes",
                "null pointer for a pattern notification",
            ));
        }
        Some(unsafe { span_to_string(pattern, pattern_len) }?)
    } else {
        None
    };

    Ok(PushMessage {
        kind,
        channel,
        message,
        pattern,
    })
}

/// # Safety
/// `ptr` must be valid for `len` bytes.
unsafe fn span_to_string(ptr: *const u8, len: u64) -> Result<String> {
    let bytes = if len == 0 {
        &[][..]
    } else {
        unsafe { from_raw_parts(ptr, len as usize) }
    };
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::unexpected_return_type("utf-8 text", "non-utf-8 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> (*const u8, u64) {
        (text.as_ptr(), text.len() as u64)
    }

    #[test]
    fn test_decode_channel_message_without_pattern() {
        let (msg, msg_len) = spans("payload");
        let (chan, chan_len) = spans("news");
        let decoded = unsafe {
            decode_push(
                PushKind::Message,
                msg,
                msg_len,
                chan,
                chan_len,
                std::ptr::null(),
                0,
            )
        }
        .unwrap();
        assert_eq!(decoded.kind, PushKind::Message);
        assert_eq!(decoded.channel, "news");
        assert_eq!(decoded.message, "payload");
        assert_eq!(decoded.pattern, None);
    }

    #[test]
    fn test_decode_pattern_message_carries_pattern() {
        let (msg, msg_len) = spans("payload");
        let (chan, chan_len) = spans("news.sports");
        let (pat, pat_len) = spans("news.*");
        let decoded = unsafe {
            decode_push(PushKind::PMessage, msg, msg_len, chan, chan_len, pat, pat_len)
        }
        .unwrap();
        assert_eq!(decoded.pattern.as_deref(), Some("news.*"));
    }

    #[test]
    fn test_decode_rejects_null_message_pointer() {
        let (chan, chan_len) = spans("news");
        let result = unsafe {
            decode_push(
                PushKind::Message,
                std::ptr::null(),
                0,
                chan,
                chan_len,
                std::ptr::null(),
                0,
            )
        };
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_empty_channel() {
        let (msg, msg_len) = spans("payload");
        let result = unsafe {
            decode_push(
                PushKind::Message,
                msg,
                msg_len,
                std::ptr::null(),
                0,
                std::ptr::null(),
                0,
            )
        };
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_missing_pattern_for_pattern_kind() {
        let (msg, msg_len) = spans("payload");
        let (chan, chan_len) = spans("news");
        let result = unsafe {
            decode_push(
                PushKind::PMessage,
                msg,
                msg_len,
                chan,
                chan_len,
                std::ptr::null(),
                0,
            )
        };
        assert!(result.is_err());
    }

    #[test]
    fn test_bridge_swallows_everything_for_unknown_handle() {
        // No client registered under this handle; the bridge must log and
        // return without panicking, for messages and garbage kinds alike.
        let (msg, msg_len) = spans("payload");
        let (chan, chan_len) = spans("news");
        unsafe {
            push_bridge(
                u64::MAX,
                PushKind::Message as u32,
                msg,
                msg_len,
                chan,
                chan_len,
                std::ptr::null(),
                0,
            );
            push_bridge(u64::MAX, 999, msg, msg_len, chan, chan_len, std::ptr::null(), 0);
        }
    }

    #[test]
    fn test_empty_message_payload_is_legal() {
        let (chan, chan_len) = spans("news");
        let empty = b"".as_ptr();
        let decoded = unsafe {
            decode_push(PushKind::Message, empty, 0, chan, chan_len, std::ptr::null(), 0)
        }
        .unwrap();
        assert_eq!(decoded.message, "");
    }
}
