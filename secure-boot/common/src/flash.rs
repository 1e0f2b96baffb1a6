// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Read-only views of the flash regions holding the metadata and the image
//!
//! The verifier never dereferences fixed addresses itself. Boards hand it a
//! [`MemoryMapped`] window, tests hand it a byte slice.

use crate::error::BootError;

/// A byte-addressable, read-only region
#[allow(clippy::len_without_is_empty)]
pub trait FlashSource {
    /// Length of the region in bytes
    fn len(&self) -> usize;

    /// Borrow `len` bytes starting at `offset`
    fn read(&self, offset: usize, len: usize) -> Result<&[u8], BootError>;

    /// Little-endian word at `offset`
    fn read_u32(&self, offset: usize) -> Result<u32, BootError> {
        let bytes = self.read(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

fn read_slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], BootError> {
    let end = offset.checked_add(len).ok_or(BootError::ImageOutOfBounds)?;
    bytes.get(offset..end).ok_or(BootError::ImageOutOfBounds)
}

impl FlashSource for &[u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn read(&self, offset: usize, len: usize) -> Result<&[u8], BootError> {
        read_slice(self, offset, len)
    }
}

impl<const N: usize> FlashSource for [u8; N] {
    fn len(&self) -> usize {
        N
    }

    fn read(&self, offset: usize, len: usize) -> Result<&[u8], BootError> {
        read_slice(self, offset, len)
    }
}

/// Memory-mapped flash window `[base .. base + len)`
#[derive(Copy, Clone, Debug)]
pub struct MemoryMapped {
    base: usize,
    len: usize,
}

impl MemoryMapped {
    /// # Safety
    ///
    /// `[base .. base + len)` must be readable memory that is not written for
    /// as long as the returned value is used.
    pub const unsafe fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }
}

impl FlashSource for MemoryMapped {
    fn len(&self) -> usize {
        self.len
    }

    fn read(&self, offset: usize, len: usize) -> Result<&[u8], BootError> {
        let end = offset.checked_add(len).ok_or(BootError::ImageOutOfBounds)?;
        if end > self.len {
            return Err(BootError::ImageOutOfBounds);
        }
        // SAFETY: bounds checked above, readability is the constructor's contract
        Ok(unsafe { core::slice::from_raw_parts((self.base + offset) as *const u8, len) })
    }
}
