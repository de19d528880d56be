use std::any::Any;
use std::fmt;

use bytes::BytesMut;

use crate::error::Result;
use crate::id::CommandId;

/// A command that can be written to the wire.
pub trait Command: Any + fmt::Debug + Send + Sync {
    fn id(&self) -> CommandId;

    /// Dotted protocol name, e.g. `ardrone3.Piloting.TakeOff`.
    fn name(&self) -> &'static str;

    /// Size of the arguments, excluding the identifier.
    fn data_size(&self) -> usize;

    /// Write the arguments (not the identifier) to `dst`.
    fn encode_data(&self, dst: &mut BytesMut);

    fn as_any(&self) -> &dyn Any;

    /// Identifier plus arguments.
    fn encoded_size(&self) -> usize {
        CommandId::SIZE + self.data_size()
    }
}

impl dyn Command {
    /// Returns the concrete command if it is of type `T`.
    pub fn downcast_ref<T: Command>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Command>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A command type that can be constructed from its encoded arguments.
pub trait DecodeCommand: Command + Sized {
    const ID: CommandId;
    const NAME: &'static str;

    /// Read the arguments from the front of `src`, advancing past them.
    fn decode_data(src: &mut &[u8]) -> Result<Self>;
}

/// Declare a command struct with typed arguments.
///
/// ```
/// arlink_command::define_command! {
///     /// Sets the volume.
///     pub struct SetVolume = (9, 1, 3) as "demo.Audio.SetVolume" {
///         level: u8,
///         label: String,
///     }
/// }
///
/// use arlink_command::{Command, DecodeCommand};
/// let cmd = SetVolume { level: 3, label: "loud".into() };
/// assert_eq!(cmd.data_size(), 1 + 5);
/// assert_eq!(SetVolume::ID.to_string(), "9:1:3");
/// ```
#[macro_export]
macro_rules! define_command {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident = ($feature:expr, $class:expr, $command:expr) as $label:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::Command for $name {
            fn id(&self) -> $crate::CommandId {
                <Self as $crate::DecodeCommand>::ID
            }

            fn name(&self) -> &'static str {
                $label
            }

            fn data_size(&self) -> usize {
                0 $( + $crate::Arg::encoded_len(&self.$field) )*
            }

            #[allow(unused_variables)]
            fn encode_data(&self, dst: &mut $crate::__private::BytesMut) {
                $( $crate::Arg::pack(&self.$field, dst); )*
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::DecodeCommand for $name {
            const ID: $crate::CommandId = $crate::CommandId::new($feature, $class, $command);
            const NAME: &'static str = $label;

            #[allow(unused_variables)]
            fn decode_data(src: &mut &[u8]) -> $crate::Result<Self> {
                Ok(Self {
                    $( $field: <$ty as $crate::Arg>::unpack(src)?, )*
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_command! {
        struct Ping = (9, 0, 1) as "test.Ping" {}
    }

    crate::define_command! {
        struct Report = (9, 0, 2) as "test.Report" {
            level: i16,
            note: String,
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(Ping {}.data_size(), 0);
        assert_eq!(Ping {}.encoded_size(), 4);

        let report = Report {
            level: -3,
            note: "ok".into(),
        };
        assert_eq!(report.data_size(), 2 + 3);
        assert_eq!(report.encoded_size(), 9);
    }

    #[test]
    fn data_roundtrip() {
        let report = Report {
            level: 512,
            note: "warn".into(),
        };
        let mut buf = BytesMut::new();
        report.encode_data(&mut buf);
        assert_eq!(buf.len(), report.data_size());

        let mut cursor = &buf[..];
        assert_eq!(Report::decode_data(&mut cursor).unwrap(), report);
        assert!(cursor.is_empty());
    }

    #[test]
    fn downcast() {
        let boxed: Box<dyn Command> = Box::new(Ping {});
        assert!(boxed.is::<Ping>());
        assert!(boxed.downcast_ref::<Report>().is_none());
        assert_eq!(boxed.id(), CommandId::new(9, 0, 1));
        assert_eq!(boxed.name(), "test.Ping");
    }
}
