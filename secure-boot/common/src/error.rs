// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Error types for the secure boot flow

use thiserror::Error;

/// Status reported by a digest engine phase other than success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DigestError {
    /// Invalid argument (e.g. output buffer too small)
    #[error("bad parameter")]
    BadParameter,

    /// Context used without `init`, or already finished
    #[error("bad context")]
    BadContext,

    /// The engine refused the requested operation
    #[error("bad operation")]
    BadOperation,
}

/// Every way authentication or hand-off can fail.
///
/// None of these are recoverable: the boot flow converges on
/// [`crate::fatal`] for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootError {
    /// Metadata magic does not match the compiled-in value
    #[error("metadata magic mismatch (found {found:#010x})")]
    MagicMismatch { found: u32 },

    /// Metadata source is shorter than the fixed record
    #[error("metadata record truncated")]
    MetadataTruncated,

    /// A read (usually the image, sized by `firmware_size`) runs past its region
    #[error("read outside of flash region")]
    ImageOutOfBounds,

    /// The digest engine reported a non-success status
    #[error("digest computation failed: {0}")]
    DigestComputeFailure(DigestError),

    /// The digest engine produced a digest of the wrong length
    #[error("digest length mismatch ({len} bytes)")]
    DigestLengthMismatch { len: usize },

    /// Recomputed metadata digest differs from the stored metadata tag
    #[error("metadata digest mismatch")]
    MetadataDigestMismatch,

    /// Recomputed image digest differs from the stored firmware tag
    #[error("firmware digest mismatch")]
    FirmwareDigestMismatch,

    /// Signature rejected: primary result or fault check is not success
    #[error("metadata signature verification failed")]
    SignatureEngineFailure,

    /// Application stack pointer or reset vector is not plausible
    #[error("invalid application vector table")]
    InvalidVectorTable,

    /// Control came back from a transfer that must never return
    #[error("hand-off returned")]
    HandoffUnreachable,
}

impl BootError {
    /// Stable numeric code, used for blink counts and fatal traces
    pub const fn code(&self) -> u32 {
        match self {
            BootError::MagicMismatch { .. } => 1,
            BootError::MetadataTruncated => 2,
            BootError::ImageOutOfBounds => 3,
            BootError::DigestComputeFailure(_) => 4,
            BootError::DigestLengthMismatch { .. } => 5,
            BootError::MetadataDigestMismatch => 6,
            BootError::FirmwareDigestMismatch => 7,
            BootError::SignatureEngineFailure => 8,
            BootError::InvalidVectorTable => 9,
            BootError::HandoffUnreachable => 10,
        }
    }
}

impl From<DigestError> for BootError {
    fn from(err: DigestError) -> Self {
        BootError::DigestComputeFailure(err)
    }
}
