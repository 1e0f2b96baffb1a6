// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Fixtures and fakes shared by the unit tests

use core::cell::{Cell, RefCell};

use p256::ecdsa::{signature::hazmat::PrehashSigner, Signature as EcdsaSignature, SigningKey};

use crate::compute_hash::{compute_digest, DigestEngine, Sha256Engine};
use crate::error::{BootError, DigestError};
use crate::handoff::{ControlTransfer, HandoffTarget};
use crate::signature_verifier::{AuthStatus, SignatureEngine};
use crate::types::{
    Digest, FirmwareMetadata, PublicKey, Signature, DEFAULT_FW_MAGIC, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};
use crate::verifier::VerifyState;
use crate::BootloaderIO;

pub const TEST_MAGIC: u32 = DEFAULT_FW_MAGIC;

/// Public half of `signing_key(1)`
pub const TEST_PUBLIC_KEY: PublicKey = [
    0xa3, 0x30, 0x98, 0x17, 0x6b, 0xa2, 0x15, 0x4d, 0x6c, 0x75, 0xad, 0x05, 0xe0, 0xf3, 0xe1, 0x24,
    0x53, 0x7b, 0x76, 0x17, 0x24, 0x61, 0xdc, 0x48, 0xe1, 0x56, 0xbf, 0xad, 0x95, 0x28, 0x14, 0x70,
    0x80, 0xae, 0x05, 0xe5, 0x9b, 0xd6, 0xa7, 0x96, 0x0f, 0x2f, 0xc8, 0x98, 0x7f, 0xb7, 0x72, 0x88,
    0x6f, 0x64, 0xe8, 0x7b, 0xe3, 0x0d, 0x65, 0xb1, 0x0a, 0xfd, 0xaa, 0x07, 0x11, 0x4f, 0x78, 0x86,
];

pub fn signing_key(seed: u8) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[0] = 0x42;
    bytes[31] = seed;
    SigningKey::from_slice(&bytes).unwrap()
}

pub fn untagged_public_key(key: &SigningKey) -> PublicKey {
    let point = key.verifying_key().to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_LEN];
    out.copy_from_slice(&point.as_bytes()[1..]);
    out
}

pub fn sign(key: &SigningKey, digest: &Digest) -> Signature {
    let sig: EcdsaSignature = key.sign_prehash(digest).unwrap();
    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&sig.to_bytes());
    out
}

pub fn sha256(data: &[u8]) -> Digest {
    compute_digest(&mut Sha256Engine::new(), data).unwrap()
}

pub fn test_image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// Correctly tagged and signed record for the first `size` bytes of `image`
pub fn signed_metadata(key: &SigningKey, image: &[u8], size: u32, version: u32) -> FirmwareMetadata {
    let covered = (size as usize).min(image.len());
    let mut meta = FirmwareMetadata {
        magic: TEST_MAGIC,
        firmware_size: size,
        firmware_version: version,
        firmware_tag: sha256(&image[..covered]),
        metadata_tag: [0; 32],
        metadata_signature: [0; SIGNATURE_LEN],
    };
    meta.metadata_tag = sha256(&meta.signed_bytes());
    meta.metadata_signature = sign(key, &meta.metadata_tag);
    meta
}

#[derive(Default)]
pub struct RecordingIo {
    states: RefCell<Vec<VerifyState>>,
    successes: Cell<usize>,
}

impl RecordingIo {
    pub fn states(&self) -> Vec<VerifyState> {
        self.states.borrow().clone()
    }

    pub fn last(&self) -> Option<VerifyState> {
        self.states.borrow().last().copied()
    }

    pub fn successes(&self) -> usize {
        self.successes.get()
    }
}

impl BootloaderIO for RecordingIo {
    fn signal_success(&self) {
        self.successes.set(self.successes.get() + 1);
    }

    fn signal_failure(&self) {}

    fn checkpoint(&self, state: VerifyState) {
        self.states.borrow_mut().push(state);
    }
}

/// SHA-256 that counts phases and can fail the n-th `finish`
#[derive(Default)]
pub struct CountingDigest {
    inner: Sha256Engine,
    pub inits: usize,
    pub finishes: usize,
    pub fail_finish_on: Option<usize>,
}

impl CountingDigest {
    pub fn failing_on(finish: usize) -> Self {
        Self {
            fail_finish_on: Some(finish),
            ..Default::default()
        }
    }
}

impl DigestEngine for CountingDigest {
    fn init(&mut self) -> Result<(), DigestError> {
        self.inits += 1;
        self.inner.init()
    }

    fn append(&mut self, data: &[u8]) -> Result<(), DigestError> {
        self.inner.append(data)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<usize, DigestError> {
        self.finishes += 1;
        if self.fail_finish_on == Some(self.finishes) {
            return Err(DigestError::BadOperation);
        }
        self.inner.finish(out)
    }
}

/// Signature engine returning a fixed (result, fault_check) pair
pub struct ScriptedSignature {
    pub result: AuthStatus,
    pub fault_check: AuthStatus,
    pub construct_ok: bool,
    pub constructed: usize,
    pub cleaned_up: usize,
}

impl ScriptedSignature {
    pub fn new(result: AuthStatus, fault_check: AuthStatus) -> Self {
        Self {
            result,
            fault_check,
            construct_ok: true,
            constructed: 0,
            cleaned_up: 0,
        }
    }
}

impl SignatureEngine for ScriptedSignature {
    fn construct(&mut self, scratch: &mut [u8]) -> Result<(), BootError> {
        self.constructed += 1;
        scratch.fill(0xA5);
        if self.construct_ok {
            Ok(())
        } else {
            Err(BootError::SignatureEngineFailure)
        }
    }

    fn verify(
        &mut self,
        _scratch: &mut [u8],
        _public_key: &[u8],
        _digest: &[u8],
        _signature: &[u8],
        fault_check: &mut AuthStatus,
    ) -> AuthStatus {
        *fault_check = self.fault_check;
        self.result
    }

    fn cleanup(&mut self, _scratch: &mut [u8]) {
        self.cleaned_up += 1;
    }
}

#[derive(Default)]
pub struct RecordingTransfer {
    pub targets: Vec<HandoffTarget>,
}

impl ControlTransfer for RecordingTransfer {
    fn transfer(&mut self, target: &HandoffTarget) {
        self.targets.push(*target);
    }
}

#[test]
fn test_public_key_matches_seed_one() {
    assert_eq!(untagged_public_key(&signing_key(1)), TEST_PUBLIC_KEY);
}
