use std::collections::HashMap;
use std::fmt;

use bytes::BytesMut;
use tracing::trace;

use crate::command::{Command, DecodeCommand};
use crate::error::{CommandError, Result};
use crate::id::CommandId;

type DecodeFn = fn(&mut &[u8]) -> Result<Box<dyn Command>>;

struct Entry {
    name: &'static str,
    decode: DecodeFn,
}

fn decode_boxed<T: DecodeCommand>(src: &mut &[u8]) -> Result<Box<dyn Command>> {
    Ok(Box::new(T::decode_data(src)?))
}

/// Lookup table from [`CommandId`] to decoder.
///
/// Commands are registered explicitly at startup; decoding an identifier
/// that was never registered fails with [`CommandError::UnknownCommand`].
#[derive(Default)]
pub struct CommandRegistry {
    entries: HashMap<CommandId, Entry>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every command in [`crate::catalog`].
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        crate::catalog::register_all(&mut registry);
        registry
    }

    /// Register command type `T`. Re-registering an identifier replaces the
    /// previous decoder.
    pub fn register<T: DecodeCommand>(&mut self) -> &mut Self {
        self.entries.insert(
            T::ID,
            Entry {
                name: T::NAME,
                decode: decode_boxed::<T>,
            },
        );
        self
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Protocol name of a registered command.
    pub fn name(&self, id: CommandId) -> Option<&'static str> {
        self.entries.get(&id).map(|e| e.name)
    }

    /// Registered identifiers in ascending order.
    pub fn ids(&self) -> Vec<CommandId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode one command from the front of `src`.
    ///
    /// On success `src` advances past the identifier and arguments. On any
    /// failure the size of the command cannot be known, so `src` is moved to
    /// the end of the buffer.
    pub fn decode(&self, src: &mut &[u8]) -> Result<Box<dyn Command>> {
        let result = self.decode_inner(src);
        if result.is_err() {
            *src = &src[src.len()..];
        }
        result
    }

    fn decode_inner(&self, src: &mut &[u8]) -> Result<Box<dyn Command>> {
        let id = CommandId::decode(src)?;
        let entry = self
            .entries
            .get(&id)
            .ok_or(CommandError::UnknownCommand(id))?;
        let command = (entry.decode)(src)?;
        trace!(command = entry.name, %id, "decoded command");
        Ok(command)
    }

    /// Write identifier and arguments of a registered command.
    pub fn encode(&self, command: &dyn Command, dst: &mut BytesMut) -> Result<()> {
        let id = command.id();
        if !self.contains(id) {
            return Err(CommandError::UnknownCommand(id));
        }
        dst.reserve(command.encoded_size());
        id.encode(dst);
        command.encode_data(dst);
        Ok(())
    }

    /// Encode into a freshly allocated buffer.
    pub fn encode_to_vec(&self, command: &dyn Command) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(command.encoded_size());
        self.encode(command, &mut buf)?;
        Ok(buf.to_vec())
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.entries.len())
            .finish()
    }
}
