//! # Batches
//!
//! A [`Batch`] collects commands for a single dispatch call. Atomic batches
//! execute as a transaction; non-atomic batches are a pipeline. Either way
//! the reply is one array with an entry per queued command, in queue order.

use crate::command::{Command, Prepared};
use crate::route::Route;

/// An ordered collection of commands dispatched in one foreign call.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    commands: Vec<Command>,
    atomic: bool,
}

impl Batch {
    /// Create an empty pipeline batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty transactional batch.
    pub fn atomic() -> Self {
        Self {
            commands: Vec::new(),
            atomic: true,
        }
    }

    /// Queue a raw command.
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Queue a built command, discarding its bound converter: batch replies
    /// are surfaced as raw [`crate::value::Value`]s per entry.
    pub fn add<T>(&mut self, prepared: Prepared<T>) -> &mut Self {
        self.commands.push(prepared.command);
        self
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub(crate) fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

/// Optional execution parameters for a batch dispatch.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Per-batch timeout in milliseconds; None uses the connection default
    pub timeout_ms: Option<u32>,
    /// Retry commands that failed with a server error
    pub retry_server_error: bool,
    /// Retry commands that failed with a connection error
    pub retry_connection_error: bool,
    /// Route the whole batch instead of letting the core pick per command
    pub route: Option<Route>,
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_retry_server_error(mut self, retry: bool) -> Self {
        self.retry_server_error = retry;
        self
    }

    pub fn with_retry_connection_error(mut self, retry: bool) -> Self {
        self.retry_connection_error = retry;
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders;
    use crate::command::RequestType;

    #[test]
    fn test_batch_preserves_queue_order() {
        let mut batch = Batch::new();
        batch.add(builders::set("k1", "v1").unwrap());
        batch.add(builders::get("k1").unwrap());
        batch.push(Command::new(RequestType::Ping));

        assert_eq!(batch.len(), 3);
        assert!(!batch.is_atomic());
        assert_eq!(batch.commands()[0].request(), RequestType::Set);
        assert_eq!(batch.commands()[1].request(), RequestType::Get);
        assert_eq!(batch.commands()[2].request(), RequestType::Ping);
    }

    #[test]
    fn test_atomic_flag() {
        let batch = Batch::atomic();
        assert!(batch.is_atomic());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_options_builder() {
        let options = BatchOptions::new()
            .with_timeout_ms(500)
            .with_retry_connection_error(true)
            .with_route(Route::AllPrimaries);
        assert_eq!(options.timeout_ms, Some(500));
        assert!(options.retry_connection_error);
        assert!(!options.retry_server_error);
        assert_eq!(options.route, Some(Route::AllPrimaries));
    }
}
