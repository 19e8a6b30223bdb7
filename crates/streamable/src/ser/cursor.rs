// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write/read cursors for packed record streams.
//!
//! All multi-byte values are little-endian. Records carry no alignment
//! padding: fields are laid out back to back in declaration order.

use super::{SerError, SerResult};

/// Generate write methods for fixed-width primitives.
///
/// Each generated method checks the sink limit first, so a failed write never
/// leaves a partial value behind.
macro_rules! impl_write_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, value: $type) -> SerResult<()> {
            self.reserve_checked($size)?;
            self.buffer.extend_from_slice(&value.to_le_bytes());
            Ok(())
        }
    };
}

/// Generate read methods for fixed-width primitives.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> SerResult<$type> {
            let bytes: [u8; $size] = self.read_array()?;
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Growable sink for outgoing record bytes.
///
/// A writer created with [`StreamWriter::bounded`] refuses to grow past its
/// limit, which mirrors a transport handing out a pre-sized message buffer.
#[derive(Debug, Default)]
pub struct StreamWriter {
    buffer: Vec<u8>,
    limit: Option<usize>,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate `capacity` bytes, typically from a `packed_size` query.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            limit: None,
        }
    }

    /// Writer that fails once `limit` bytes have been written.
    pub fn bounded(limit: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(limit),
            limit: Some(limit),
        }
    }

    impl_write_le!(write_u8, u8, 1);
    impl_write_le!(write_i32, i32, 4);
    impl_write_le!(write_f64, f64, 8);

    pub fn write_bytes(&mut self, data: &[u8]) -> SerResult<()> {
        self.reserve_checked(data.len())?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    /// Drop everything written after `len`; no-op if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        self.buffer.truncate(len);
    }

    fn reserve_checked(&mut self, size: usize) -> SerResult<()> {
        if let Some(limit) = self.limit {
            if self.buffer.len() + size > limit {
                return Err(SerError::WriteFailed {
                    offset: self.buffer.len(),
                    reason: format!("capacity limit {} reached", limit),
                });
            }
        }
        self.buffer.reserve(size);
        Ok(())
    }
}

/// Bounds-checked reader over a received byte stream.
///
/// Failed reads leave the position untouched.
#[derive(Debug, Clone)]
pub struct StreamReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_f64, f64, 8);

    pub fn read_bytes(&mut self, len: usize) -> SerResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> SerResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Fail early when fewer than `len` bytes remain, without consuming any.
    pub fn ensure_remaining(&self, len: usize) -> SerResult<()> {
        if len > self.remaining() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}
