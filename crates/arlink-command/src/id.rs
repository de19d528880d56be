use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{CommandError, Result};

/// Identifies a command: feature, class within the feature, and command
/// within the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId {
    pub feature: u8,
    pub class: u8,
    pub command: u16,
}

impl CommandId {
    /// Encoded size on the wire.
    pub const SIZE: usize = 4;

    pub const fn new(feature: u8, class: u8, command: u16) -> Self {
        Self {
            feature,
            class,
            command,
        }
    }

    /// Read an identifier from the front of `src`, advancing it by 4 bytes.
    pub fn decode(src: &mut &[u8]) -> Result<Self> {
        let Some((head, rest)) = src.split_first_chunk::<4>() else {
            return Err(CommandError::Truncated {
                needed: Self::SIZE,
                remaining: src.len(),
            });
        };
        let id = Self::new(head[0], head[1], u16::from_le_bytes([head[2], head[3]]));
        *src = rest;
        Ok(id)
    }

    /// Write the identifier as feature, class, then little-endian command.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.feature);
        dst.put_u8(self.class);
        dst.put_u16_le(self.command);
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.feature, self.class, self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn wire_layout() {
        let mut buf = BytesMut::new();
        CommandId::new(1, 4, 0x0201).encode(&mut buf);
        assert_eq!(&buf[..], &[1, 4, 0x01, 0x02]);

        let mut cursor = &[1u8, 4, 0x01, 0x02, 0xAA][..];
        let id = CommandId::decode(&mut cursor).unwrap();
        assert_eq!(id, CommandId::new(1, 4, 0x0201));
        assert_eq!(cursor, &[0xAA]);
    }

    #[test]
    fn short_input_is_truncated() {
        let mut cursor = &[0u8, 5][..];
        let err = CommandId::decode(&mut cursor).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Truncated {
                needed: 4,
                remaining: 2
            }
        ));
    }

    #[test]
    fn equality_and_display() {
        let mut set = HashSet::new();
        set.insert(CommandId::new(0, 5, 7));
        assert!(set.contains(&CommandId::new(0, 5, 7)));
        assert!(!set.contains(&CommandId::new(0, 5, 1)));
        assert_eq!(CommandId::new(1, 24, 5).to_string(), "1:24:5");
    }
}
