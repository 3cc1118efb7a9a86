//! Command Table & Dispatch
//!
//! The table maps lowercase command names to a [`Command`]: a handler plus a
//! declarative [`Arity`]. It is built once by [`CommandTable::builtin`],
//! wrapped in an `Arc`, and only read from then on.
//!
//! ```text
//!  name, args
//!      │
//!      ▼
//! ┌──────────────┐  miss   ┌──────────────────┐
//! │   lookup     │────────>│ UnknownCommand   │
//! └──────┬───────┘         └──────────────────┘
//!        │ hit
//!        ▼
//! ┌──────────────┐  reject ┌──────────────────┐
//! │ Arity check  │────────>│ WrongArity       │
//! └──────┬───────┘         └──────────────────┘
//!        │ accept
//!        ▼
//! ┌──────────────┐
//! │   handler    │──> Reply | Value error | Store error
//! └──────────────┘
//! ```

use crate::commands::args::lossy;
use crate::commands::{handler, scan, CommandError, CommandResult};
use crate::storage::Store;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Handler signature shared by every command.
///
/// The argument slice excludes the command name and has already passed the
/// command's [`Arity`] check.
pub type HandlerFn = fn(&[Bytes], &dyn Store) -> CommandResult;

/// How many arguments a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments
    Exact(usize),
    /// `n` or more arguments
    AtLeast(usize),
    /// Between 0 and `n` arguments; the handler parses the shape
    AtMost(usize),
    /// A non-empty, even number of arguments (key/value pairs)
    Pairs,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == expected,
            Arity::AtLeast(min) => n >= min,
            Arity::AtMost(max) => n <= max,
            Arity::Pairs => n >= 2 && n % 2 == 0,
        }
    }
}

/// One registered command.
#[derive(Clone, Copy)]
pub struct Command {
    name: &'static str,
    arity: Arity,
    handler: HandlerFn,
}

impl Command {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Checks the arity, then runs the handler.
    pub fn call(&self, args: &[Bytes], store: &dyn Store) -> CommandResult {
        if !self.arity.accepts(args.len()) {
            return Err(CommandError::wrong_arity(self.name));
        }
        (self.handler)(args, store)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Errors raised while building a table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("command '{0}' is already registered")]
    Duplicate(String),
}

/// The immutable name -> command mapping.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: HashMap<String, Command>,
}

impl CommandTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table with every supported command.
    pub fn builtin() -> Result<Self, TableError> {
        let mut table = Self::new();

        // Single-key reads and writes
        table.register("get", Arity::Exact(1), handler::get)?;
        table.register("set", Arity::Exact(2), handler::set)?;
        table.register("getset", Arity::Exact(2), handler::getset)?;
        table.register("setnx", Arity::Exact(2), handler::setnx)?;
        table.register("exists", Arity::Exact(1), handler::exists)?;
        table.register("persist", Arity::Exact(1), handler::persist)?;

        // Counters
        table.register("incr", Arity::Exact(1), handler::incr)?;
        table.register("decr", Arity::Exact(1), handler::decr)?;
        table.register("incrby", Arity::Exact(2), handler::incrby)?;
        table.register("decrby", Arity::Exact(2), handler::decrby)?;

        // Batches
        table.register("del", Arity::AtLeast(1), handler::del)?;
        table.register("mset", Arity::Pairs, handler::mset)?;
        table.register("mget", Arity::AtLeast(1), handler::mget)?;

        // Expiration
        table.register("expire", Arity::Exact(2), handler::expire)?;
        table.register("expireat", Arity::Exact(2), handler::expireat)?;
        table.register("ttl", Arity::Exact(1), handler::ttl)?;

        table.register("scan", scan::ARITY, scan::scan)?;

        debug!(commands = table.len(), "Command table built");
        Ok(table)
    }

    /// Adds a command. Registering a name twice is an error.
    pub fn register(
        &mut self,
        name: &'static str,
        arity: Arity,
        handler: HandlerFn,
    ) -> Result<(), TableError> {
        let key = name.to_ascii_lowercase();
        if self.commands.contains_key(&key) {
            return Err(TableError::Duplicate(key));
        }
        self.commands.insert(
            key,
            Command {
                name,
                arity,
                handler,
            },
        );
        Ok(())
    }

    /// Looks up a command by name, ignoring ASCII case.
    pub fn get(&self, name: &[u8]) -> Option<&Command> {
        let key = lossy(name).to_ascii_lowercase();
        self.commands.get(&key)
    }

    /// Runs `name` with `args` against `store`.
    ///
    /// The handler's result, success or failure, is returned unchanged.
    pub fn dispatch(&self, name: &[u8], args: &[Bytes], store: &dyn Store) -> CommandResult {
        let Some(command) = self.get(name) else {
            let name = lossy(name);
            debug!(command = %name, "Unknown command");
            return Err(CommandError::UnknownCommand(name));
        };

        trace!(command = command.name, args = args.len(), "Dispatching");
        let result = command.call(args, store);

        if let Err(CommandError::Store(e)) = &result {
            warn!(command = command.name, error = %e, "Store operation failed");
        }
        result
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.values().map(|c| c.name).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Reply;
    use crate::storage::testing::ScriptedStore;

    fn pong(_args: &[Bytes], _store: &dyn Store) -> CommandResult {
        Ok(Reply::Status("PONG".to_string()))
    }

    #[test]
    fn test_arity_rules() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(1));
        assert!(!Arity::Exact(2).accepts(3));

        assert!(Arity::AtLeast(1).accepts(5));
        assert!(!Arity::AtLeast(1).accepts(0));

        assert!(Arity::AtMost(6).accepts(0));
        assert!(!Arity::AtMost(6).accepts(7));

        assert!(Arity::Pairs.accepts(2));
        assert!(Arity::Pairs.accepts(4));
        assert!(!Arity::Pairs.accepts(0));
        assert!(!Arity::Pairs.accepts(3));
    }

    #[test]
    fn test_builtin_table() {
        let table = CommandTable::builtin().unwrap();
        assert_eq!(
            table.names(),
            vec![
                "decr", "decrby", "del", "exists", "expire", "expireat", "get", "getset",
                "incr", "incrby", "mget", "mset", "persist", "scan", "set", "setnx", "ttl",
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut table = CommandTable::new();
        table.register("ping", Arity::Exact(0), pong).unwrap();

        assert_eq!(
            table.register("PING", Arity::Exact(0), pong),
            Err(TableError::Duplicate("ping".to_string()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let mut table = CommandTable::new();
        table.register("ping", Arity::Exact(0), pong).unwrap();
        let store = ScriptedStore::new();

        let names: [&[u8]; 3] = [b"ping", b"PING", b"PiNg"];
        for name in names {
            assert_eq!(
                table.dispatch(name, &[], &store),
                Ok(Reply::Status("PONG".to_string()))
            );
        }
    }

    #[test]
    fn test_unknown_command() {
        let table = CommandTable::builtin().unwrap();
        let store = ScriptedStore::new();

        assert_eq!(
            table.dispatch(b"FLUSHALL", &[], &store),
            Err(CommandError::UnknownCommand("FLUSHALL".to_string()))
        );
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_arity_rejected_before_handler() {
        let mut table = CommandTable::new();
        table.register("ping", Arity::Exact(0), pong).unwrap();
        let store = ScriptedStore::new();

        assert_eq!(
            table.dispatch(b"ping", &[Bytes::from("extra")], &store),
            Err(CommandError::wrong_arity("ping"))
        );
    }
}
