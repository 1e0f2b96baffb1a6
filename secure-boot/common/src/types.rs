// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Common types used throughout the secure boot process
//!
//! Metadata record layout in flash (little-endian, packed):
//!
//! ```text
//! [0x00] magic              u32
//! [0x04] firmware_size      u32
//! [0x08] firmware_version   u32
//! [0x0C] firmware_tag       [u8; 32]   SHA-256 of the application image
//! [0x2C] metadata_tag       [u8; 32]   SHA-256 of bytes [0x00..0x2C)
//! [0x4C] metadata_signature [u8; 64]   ECDSA P-256 (r || s) over metadata_tag
//! ```

use crate::error::BootError;

/// SHA-256 digest length
pub const DIGEST_LEN: usize = 32;

/// ECDSA P-256 signature length (r || s)
pub const SIGNATURE_LEN: usize = 64;

/// Uncompressed P-256 point without the SEC1 tag (x || y)
pub const PUBLIC_KEY_LEN: usize = 64;

/// Default metadata magic ("FWMT" read as a little-endian word)
pub const DEFAULT_FW_MAGIC: u32 = 0x544D_5746;

pub type Digest = [u8; DIGEST_LEN];
pub type Signature = [u8; SIGNATURE_LEN];
pub type PublicKey = [u8; PUBLIC_KEY_LEN];

/// Firmware metadata record describing the application image
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FirmwareMetadata {
    pub magic: u32,
    pub firmware_size: u32,
    /// Read and reported, never enforced
    pub firmware_version: u32,
    pub firmware_tag: Digest,
    pub metadata_tag: Digest,
    pub metadata_signature: Signature,
}

impl FirmwareMetadata {
    /// Size of the record in bytes
    pub const SIZE: usize = 12 + DIGEST_LEN + DIGEST_LEN + SIGNATURE_LEN;

    /// Leading bytes covered by `metadata_tag`
    pub const SIGNED_LEN: usize = Self::SIZE - DIGEST_LEN - SIGNATURE_LEN;

    const FIRMWARE_TAG_OFFSET: usize = 12;
    const METADATA_TAG_OFFSET: usize = Self::FIRMWARE_TAG_OFFSET + DIGEST_LEN;
    const SIGNATURE_OFFSET: usize = Self::METADATA_TAG_OFFSET + DIGEST_LEN;

    /// Parses a record from the first [`Self::SIZE`] bytes of `data`
    pub fn parse(data: &[u8]) -> Result<Self, BootError> {
        if data.len() < Self::SIZE {
            return Err(BootError::MetadataTruncated);
        }

        let mut firmware_tag = [0u8; DIGEST_LEN];
        let mut metadata_tag = [0u8; DIGEST_LEN];
        let mut metadata_signature = [0u8; SIGNATURE_LEN];
        firmware_tag.copy_from_slice(
            &data[Self::FIRMWARE_TAG_OFFSET..Self::METADATA_TAG_OFFSET],
        );
        metadata_tag.copy_from_slice(&data[Self::METADATA_TAG_OFFSET..Self::SIGNATURE_OFFSET]);
        metadata_signature.copy_from_slice(&data[Self::SIGNATURE_OFFSET..Self::SIZE]);

        Ok(Self {
            magic: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            firmware_size: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            firmware_version: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            firmware_tag,
            metadata_tag,
            metadata_signature,
        })
    }

    /// Serializes the record in its flash layout
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..8].copy_from_slice(&self.firmware_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.firmware_version.to_le_bytes());
        out[Self::FIRMWARE_TAG_OFFSET..Self::METADATA_TAG_OFFSET]
            .copy_from_slice(&self.firmware_tag);
        out[Self::METADATA_TAG_OFFSET..Self::SIGNATURE_OFFSET].copy_from_slice(&self.metadata_tag);
        out[Self::SIGNATURE_OFFSET..Self::SIZE].copy_from_slice(&self.metadata_signature);
        out
    }

    /// The bytes `metadata_tag` is computed over
    pub fn signed_bytes(&self) -> [u8; Self::SIGNED_LEN] {
        let mut out = [0u8; Self::SIGNED_LEN];
        out.copy_from_slice(&self.to_bytes()[..Self::SIGNED_LEN]);
        out
    }
}

/// Result of a successful authentication, handed to the hand-off step
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VerifiedImage {
    pub firmware_size: u32,
    pub firmware_version: u32,
    pub firmware_tag: Digest,
}
