//! Argument encoding.
//!
//! Integers and floats are little-endian, enums travel as `i32`, strings are
//! UTF-8 bytes followed by a single NUL terminator.

use bytes::{BufMut, BytesMut};

use crate::error::{CommandError, Result};

/// A value that can appear as a command argument.
pub trait Arg: Sized {
    /// Number of bytes [`Arg::pack`] writes.
    fn encoded_len(&self) -> usize;

    fn pack(&self, dst: &mut BytesMut);

    /// Read a value from the front of `src`, advancing past it.
    fn unpack(src: &mut &[u8]) -> Result<Self>;
}

fn take<const N: usize>(src: &mut &[u8]) -> Result<[u8; N]> {
    let Some((head, rest)) = src.split_first_chunk::<N>() else {
        return Err(CommandError::Truncated {
            needed: N,
            remaining: src.len(),
        });
    };
    let out = *head;
    *src = rest;
    Ok(out)
}

macro_rules! impl_numeric_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Arg for $ty {
                fn encoded_len(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }

                fn pack(&self, dst: &mut BytesMut) {
                    dst.put_slice(&self.to_le_bytes());
                }

                fn unpack(src: &mut &[u8]) -> Result<Self> {
                    Ok(<$ty>::from_le_bytes(take(src)?))
                }
            }
        )*
    };
}

impl_numeric_arg!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Arg for String {
    fn encoded_len(&self) -> usize {
        self.len() + 1
    }

    fn pack(&self, dst: &mut BytesMut) {
        dst.reserve(self.len() + 1);
        dst.put_slice(self.as_bytes());
        dst.put_u8(0);
    }

    fn unpack(src: &mut &[u8]) -> Result<Self> {
        let Some(end) = src.iter().position(|&b| b == 0) else {
            return Err(CommandError::InvalidString(format!(
                "missing NUL terminator in {} bytes",
                src.len()
            )));
        };
        let value = std::str::from_utf8(&src[..end])
            .map_err(|e| CommandError::InvalidString(e.to_string()))?
            .to_owned();
        *src = &src[end + 1..];
        Ok(value)
    }
}

/// Declare an enum argument carried on the wire as an `i32`.
///
/// The generated type implements [`Arg`], `Display` and `Serialize` using
/// the protocol's own value names.
#[macro_export]
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal as $label:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value, )*
        }

        impl $name {
            /// Name used by the protocol for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::__private::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl $crate::Arg for $name {
            fn encoded_len(&self) -> usize {
                4
            }

            fn pack(&self, dst: &mut $crate::__private::BytesMut) {
                $crate::Arg::pack(&(*self as i32), dst)
            }

            fn unpack(src: &mut &[u8]) -> $crate::Result<Self> {
                match <i32 as $crate::Arg>::unpack(src)? {
                    $( $value => Ok(Self::$variant), )*
                    other => Err($crate::CommandError::InvalidEnum {
                        name: stringify!($name),
                        value: other,
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_enum! {
        enum Mode {
            Off = 0 as "off",
            On = 1 as "on",
        }
    }

    #[test]
    fn integers_are_little_endian() {
        let mut buf = BytesMut::new();
        0x1234u16.pack(&mut buf);
        (-2i32).pack(&mut buf);
        assert_eq!(&buf[..], &[0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF]);

        let mut cursor = &buf[..];
        assert_eq!(u16::unpack(&mut cursor).unwrap(), 0x1234);
        assert_eq!(i32::unpack(&mut cursor).unwrap(), -2);
        assert!(cursor.is_empty());
    }

    #[test]
    fn floats() {
        let mut buf = BytesMut::new();
        1.5f32.pack(&mut buf);
        (-48.8566f64).pack(&mut buf);
        assert_eq!(buf.len(), 12);

        let mut cursor = &buf[..];
        assert_eq!(f32::unpack(&mut cursor).unwrap(), 1.5);
        assert_eq!(f64::unpack(&mut cursor).unwrap(), -48.8566);
    }

    #[test]
    fn strings_are_nul_terminated() {
        let value = String::from("Bebop2");
        assert_eq!(value.encoded_len(), 7);

        let mut buf = BytesMut::new();
        value.pack(&mut buf);
        4u8.pack(&mut buf);
        assert_eq!(&buf[..], b"Bebop2\0\x04");

        let mut cursor = &buf[..];
        assert_eq!(String::unpack(&mut cursor).unwrap(), "Bebop2");
        assert_eq!(cursor, &[4]);
    }

    #[test]
    fn empty_string() {
        let mut cursor = &[0u8][..];
        assert_eq!(String::unpack(&mut cursor).unwrap(), "");
        assert!(cursor.is_empty());
    }

    #[test]
    fn unterminated_string_is_rejected() {
        let mut cursor = &b"abc"[..];
        assert!(matches!(
            String::unpack(&mut cursor),
            Err(CommandError::InvalidString(_))
        ));
    }

    #[test]
    fn truncated_number() {
        let mut cursor = &[1u8, 2][..];
        assert!(matches!(
            u32::unpack(&mut cursor),
            Err(CommandError::Truncated {
                needed: 4,
                remaining: 2
            })
        ));
    }

    #[test]
    fn enums_travel_as_i32() {
        let mut buf = BytesMut::new();
        Mode::On.pack(&mut buf);
        assert_eq!(&buf[..], &[1, 0, 0, 0]);
        assert_eq!(Mode::On.encoded_len(), 4);
        assert_eq!(Mode::Off.to_string(), "off");

        let mut cursor = &buf[..];
        assert_eq!(Mode::unpack(&mut cursor).unwrap(), Mode::On);

        let mut bad = &[9u8, 0, 0, 0][..];
        assert!(matches!(
            Mode::unpack(&mut bad),
            Err(CommandError::InvalidEnum { name: "Mode", value: 9 })
        ));
        assert_eq!(serde_json::to_string(&Mode::Off).unwrap(), "\"off\"");
    }
}
