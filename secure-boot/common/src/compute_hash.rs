// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! SHA-256 digest computation for metadata and firmware verification
//!
//! The verifier talks to a [`DigestEngine`] through a three-phase
//! `init` / `append` / `finish` protocol so boards can swap in a hardware
//! hash block. [`Sha256Engine`] is the software engine built on `sha2`.

use crate::error::{BootError, DigestError};
use crate::types::{Digest, DIGEST_LEN};
use sha2::{Digest as _, Sha256};

/// Incremental hash primitive
pub trait DigestEngine {
    /// Resets the context. Must succeed before `append`.
    fn init(&mut self) -> Result<(), DigestError>;

    /// Feeds `data`; may be called any number of times.
    fn append(&mut self, data: &[u8]) -> Result<(), DigestError>;

    /// Finalizes into `out` and returns how many bytes were written.
    fn finish(&mut self, out: &mut [u8]) -> Result<usize, DigestError>;
}

/// Software SHA-256
#[derive(Default)]
pub struct Sha256Engine {
    ctx: Option<Sha256>,
}

impl Sha256Engine {
    pub const fn new() -> Self {
        Self { ctx: None }
    }
}

impl DigestEngine for Sha256Engine {
    fn init(&mut self) -> Result<(), DigestError> {
        self.ctx = Some(Sha256::new());
        Ok(())
    }

    fn append(&mut self, data: &[u8]) -> Result<(), DigestError> {
        let ctx = self.ctx.as_mut().ok_or(DigestError::BadContext)?;
        ctx.update(data);
        Ok(())
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, DigestError> {
        if out.len() < DIGEST_LEN {
            return Err(DigestError::BadParameter);
        }
        let ctx = self.ctx.take().ok_or(DigestError::BadContext)?;
        out[..DIGEST_LEN].copy_from_slice(&ctx.finalize());
        Ok(DIGEST_LEN)
    }
}

/// Runs one `init; append; finish` sequence over `data`.
///
/// The engine must report exactly [`DIGEST_LEN`] bytes, anything else is a
/// failure even if every phase returned success.
pub fn compute_digest<E: DigestEngine + ?Sized>(
    engine: &mut E,
    data: &[u8],
) -> Result<Digest, BootError> {
    let mut out = [0u8; DIGEST_LEN];

    engine.init()?;
    engine.append(data)?;
    let len = engine.finish(&mut out)?;

    if len != DIGEST_LEN {
        return Err(BootError::DigestLengthMismatch { len });
    }
    Ok(out)
}
