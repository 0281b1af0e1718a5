//! Bounds-checked sequential reads and writes over caller-owned byte buffers.
//!
//! Multi-byte values are copied in the platform's native byte order. The JHS
//! protocol only ever puts single bytes on the wire, so this never matters for
//! the packets themselves.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    #[error("needed {needed} bytes but only {remaining} remain")]
    OutOfBounds { needed: usize, remaining: usize },

    #[error("unknown {kind} value: {value:#04x}")]
    UnknownValue { kind: &'static str, value: u8 },
}

/// A value with a fixed on-wire width.
///
/// Both conversions take a slice of exactly `SIZE` bytes and fail with
/// [`StreamError::OutOfBounds`] on any other length.
pub trait Wire: Sized {
    const SIZE: usize;

    fn from_wire(bytes: &[u8]) -> Result<Self, StreamError>;

    fn to_wire(&self, out: &mut [u8]) -> Result<(), StreamError>;
}

/// Checks that a [`Wire`] conversion was handed exactly `size` bytes.
pub fn expect_width(len: usize, size: usize) -> Result<(), StreamError> {
    if len != size {
        return Err(StreamError::OutOfBounds {
            needed: size,
            remaining: len,
        });
    }
    Ok(())
}

macro_rules! wire_int {
    ( $( $ty:ty ),* ) => {
        $(
            impl Wire for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                fn from_wire(bytes: &[u8]) -> Result<Self, StreamError> {
                    expect_width(bytes.len(), Self::SIZE)?;
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    Ok(<$ty>::from_ne_bytes(raw))
                }

                fn to_wire(&self, out: &mut [u8]) -> Result<(), StreamError> {
                    expect_width(out.len(), Self::SIZE)?;
                    out.copy_from_slice(&self.to_ne_bytes());
                    Ok(())
                }
            }
        )*
    };
}

wire_int!(u8, i8, u16, i16, u32, i32, u64, i64);

impl Wire for bool {
    const SIZE: usize = 1;

    fn from_wire(bytes: &[u8]) -> Result<Self, StreamError> {
        expect_width(bytes.len(), Self::SIZE)?;
        Ok(bytes[0] != 0)
    }

    fn to_wire(&self, out: &mut [u8]) -> Result<(), StreamError> {
        expect_width(out.len(), Self::SIZE)?;
        out[0] = u8::from(*self);
        Ok(())
    }
}

/// Implements [`Wire`] for one-byte `#[repr(u8)]` enums deriving `strum::FromRepr`.
///
/// A byte that matches no variant decodes to [`StreamError::UnknownValue`].
#[macro_export]
macro_rules! wire_enum {
    ( $( $enum:ty ),* ) => {
        $(
            impl $crate::stream::Wire for $enum {
                const SIZE: usize = 1;

                fn from_wire(bytes: &[u8]) -> Result<Self, $crate::stream::StreamError> {
                    $crate::stream::expect_width(bytes.len(), 1)?;
                    <$enum>::from_repr(bytes[0]).ok_or($crate::stream::StreamError::UnknownValue {
                        kind: stringify!($enum),
                        value: bytes[0],
                    })
                }

                fn to_wire(&self, out: &mut [u8]) -> Result<(), $crate::stream::StreamError> {
                    $crate::stream::expect_width(out.len(), 1)?;
                    out[0] = *self as u8;
                    Ok(())
                }
            }
        )*
    };
}

/// Sequential reader. A failed read or skip leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn read<T: Wire>(&mut self) -> Result<T, StreamError> {
        let value = T::from_wire(self.take(T::SIZE)?)?;
        self.offset += T::SIZE;
        Ok(value)
    }

    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), StreamError> {
        out.copy_from_slice(self.take(out.len())?);
        self.offset += out.len();
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), StreamError> {
        self.take(count)?;
        self.offset += count;
        Ok(())
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The whole underlying buffer, independent of the cursor position.
    pub fn buffer(&self) -> &'a [u8] {
        self.data
    }

    fn take(&self, count: usize) -> Result<&'a [u8], StreamError> {
        if count > self.remaining() {
            return Err(StreamError::OutOfBounds {
                needed: count,
                remaining: self.remaining(),
            });
        }
        Ok(&self.data[self.offset..self.offset + count])
    }
}

/// Sequential writer. A write that does not fit writes nothing.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    data: &'a mut [u8],
    offset: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn write<T: Wire>(&mut self, value: &T) -> Result<(), StreamError> {
        let end = self.reserve(T::SIZE)?;
        value.to_wire(&mut self.data[self.offset..end])?;
        self.offset = end;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let end = self.reserve(bytes.len())?;
        self.data[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// The bytes written so far, ready for transmission or re-parsing.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.offset]
    }

    pub fn into_written(self) -> &'a [u8] {
        &self.data[..self.offset]
    }

    fn reserve(&self, count: usize) -> Result<usize, StreamError> {
        if count > self.remaining() {
            return Err(StreamError::OutOfBounds {
                needed: count,
                remaining: self.remaining(),
            });
        }
        Ok(self.offset + count)
    }
}
