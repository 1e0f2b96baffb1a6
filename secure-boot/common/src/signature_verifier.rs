// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! ECDSA P-256 signature verification
//!
//! A [`SignatureEngine`] works inside a caller-supplied scratch buffer and
//! reports its verdict twice: the returned status and an independent fault
//! check. A signature is only accepted when both equal
//! [`AuthStatus::SUCCESS`], so a single glitched comparison or corrupted
//! register cannot turn a rejection into an acceptance.

use crate::error::BootError;
use crate::types::{Digest, PublicKey, Signature, DIGEST_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN};
use p256::ecdsa::{signature::hazmat::PrehashVerifier, Signature as EcdsaSignature, VerifyingKey};
use zeroize::Zeroize;

/// Minimum scratch memory an engine may require
pub const SCRATCH_LEN: usize = 2048;

/// Authentication status word
///
/// Success and failure are bitwise complements so that no single-bit or
/// stuck-at fault maps one onto the other.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AuthStatus(u32);

impl AuthStatus {
    pub const SUCCESS: AuthStatus = AuthStatus(0x5AA5_3CC3);
    pub const FAIL: AuthStatus = AuthStatus(0xA55A_C33C);

    pub const fn from_raw(raw: u32) -> Self {
        AuthStatus(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Public-key signature verifier over a single curve
pub trait SignatureEngine {
    /// Binds the engine to `scratch`. Must be called before `verify`.
    fn construct(&mut self, scratch: &mut [u8]) -> Result<(), BootError>;

    /// Verifies `signature` over the prehashed `digest`.
    ///
    /// Returns the primary status and writes the fault check separately.
    fn verify(
        &mut self,
        scratch: &mut [u8],
        public_key: &[u8],
        digest: &[u8],
        signature: &[u8],
        fault_check: &mut AuthStatus,
    ) -> AuthStatus;

    /// Releases everything `construct` set up.
    fn cleanup(&mut self, scratch: &mut [u8]);
}

/// Scoped ownership of an engine and its scratch buffer.
///
/// Dropping the session always runs `cleanup` and wipes the scratch, also
/// when `construct` itself failed.
struct EccSession<'a, E: SignatureEngine + ?Sized> {
    engine: &'a mut E,
    scratch: &'a mut [u8],
}

impl<'a, E: SignatureEngine + ?Sized> EccSession<'a, E> {
    fn open(engine: &'a mut E, scratch: &'a mut [u8]) -> Result<Self, BootError> {
        let session = Self { engine, scratch };
        session.engine.construct(session.scratch)?;
        Ok(session)
    }

    fn verify(
        &mut self,
        public_key: &[u8],
        digest: &[u8],
        signature: &[u8],
        fault_check: &mut AuthStatus,
    ) -> AuthStatus {
        self.engine
            .verify(self.scratch, public_key, digest, signature, fault_check)
    }
}

impl<E: SignatureEngine + ?Sized> Drop for EccSession<'_, E> {
    fn drop(&mut self) {
        self.engine.cleanup(self.scratch);
        self.scratch.zeroize();
    }
}

/// Verifies `signature` over `digest` under `public_key`.
///
/// The engine is constructed over `scratch` and released again before this
/// returns, whatever the outcome.
pub fn verify_signature<E: SignatureEngine + ?Sized>(
    engine: &mut E,
    scratch: &mut [u8],
    public_key: &PublicKey,
    digest: &Digest,
    signature: &Signature,
) -> Result<(), BootError> {
    let mut fault_check = AuthStatus::FAIL;
    let result = {
        let mut session = EccSession::open(engine, scratch)?;
        session.verify(public_key, digest, signature, &mut fault_check)
    };

    if result != AuthStatus::SUCCESS {
        log::error!("SignatureVerify failed. Err: {:#010x}", result.raw());
        return Err(BootError::SignatureEngineFailure);
    }
    if fault_check != AuthStatus::SUCCESS {
        log::error!("SignatureVerify fault check failed. Err: {:#010x}", fault_check.raw());
        return Err(BootError::SignatureEngineFailure);
    }
    Ok(())
}

/// Scratch layout used by [`P256Engine`]: SEC1 point, digest, signature
const KEY_AT: usize = 0;
const SEC1_LEN: usize = 1 + PUBLIC_KEY_LEN;
const DIGEST_AT: usize = KEY_AT + SEC1_LEN;
const SIG_AT: usize = DIGEST_AT + DIGEST_LEN;
const STAGED_LEN: usize = SIG_AT + SIGNATURE_LEN;

/// Software ECDSA P-256 engine using the `p256` crate.
///
/// Inputs are staged into the scratch buffer first so the values checked are
/// the ones copied out of flash, not whatever flash reads back later.
#[derive(Default)]
pub struct P256Engine {
    constructed: bool,
}

impl P256Engine {
    pub const fn new() -> Self {
        Self { constructed: false }
    }
}

impl SignatureEngine for P256Engine {
    fn construct(&mut self, scratch: &mut [u8]) -> Result<(), BootError> {
        if scratch.len() < SCRATCH_LEN {
            return Err(BootError::SignatureEngineFailure);
        }
        scratch.zeroize();
        self.constructed = true;
        Ok(())
    }

    fn verify(
        &mut self,
        scratch: &mut [u8],
        public_key: &[u8],
        digest: &[u8],
        signature: &[u8],
        fault_check: &mut AuthStatus,
    ) -> AuthStatus {
        *fault_check = AuthStatus::FAIL;

        if !self.constructed
            || scratch.len() < STAGED_LEN
            || public_key.len() != PUBLIC_KEY_LEN
            || digest.len() != DIGEST_LEN
            || signature.len() != SIGNATURE_LEN
        {
            return AuthStatus::FAIL;
        }

        // Untagged x || y becomes an uncompressed SEC1 point
        scratch[KEY_AT] = 0x04;
        scratch[KEY_AT + 1..DIGEST_AT].copy_from_slice(public_key);
        scratch[DIGEST_AT..SIG_AT].copy_from_slice(digest);
        scratch[SIG_AT..STAGED_LEN].copy_from_slice(signature);
        let staged = &scratch[..STAGED_LEN];

        let Ok(key) = VerifyingKey::from_sec1_bytes(&staged[KEY_AT..DIGEST_AT]) else {
            return AuthStatus::FAIL;
        };
        let Ok(sig) = EcdsaSignature::from_slice(&staged[SIG_AT..STAGED_LEN]) else {
            return AuthStatus::FAIL;
        };

        let result = match key.verify_prehash(&staged[DIGEST_AT..SIG_AT], &sig) {
            Ok(()) => AuthStatus::SUCCESS,
            Err(_) => AuthStatus::FAIL,
        };

        // Fault check: re-evaluate from the caller's buffers, not the scratch
        if recheck(public_key, digest, signature) {
            *fault_check = AuthStatus::SUCCESS;
        }
        result
    }

    fn cleanup(&mut self, scratch: &mut [u8]) {
        scratch.zeroize();
        self.constructed = false;
    }
}

fn recheck(public_key: &[u8], digest: &[u8], signature: &[u8]) -> bool {
    let mut point = [0u8; SEC1_LEN];
    point[0] = 0x04;
    point[1..].copy_from_slice(public_key);
    let Ok(key) = VerifyingKey::from_sec1_bytes(&point) else {
        return false;
    };
    let Ok(sig) = EcdsaSignature::from_slice(signature) else {
        return false;
    };
    key.verify_prehash(digest, &sig).is_ok()
}
