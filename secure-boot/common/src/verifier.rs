// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Firmware metadata and image verification
//!
//! Strictly linear, one shot per boot:
//!
//! ```text
//! Start -> MagicChecked -> MetaHashChecked -> MetaSignatureChecked -> FwHashChecked -> Success
//!   \_____________\________________\___________________\___________________\______ Fatal
//! ```
//!
//! `firmware_size` is never used before the record carrying it has passed
//! the hash and signature checks.

use subtle::ConstantTimeEq;

use crate::compute_hash::{compute_digest, DigestEngine};
use crate::error::BootError;
use crate::flash::FlashSource;
use crate::signature_verifier::{verify_signature, SignatureEngine, SCRATCH_LEN};
use crate::trace::HexDump;
use crate::types::{Digest, FirmwareMetadata, PublicKey, VerifiedImage};
use crate::BootloaderIO;

/// States of the verification pipeline
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerifyState {
    Start,
    MagicChecked,
    MetaHashChecked,
    MetaSignatureChecked,
    FwHashChecked,
    Success,
    Fatal,
}

/// Trust anchors compiled into the bootloader
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VerifierConfig {
    pub magic: u32,
    pub public_key: PublicKey,
}

/// Runs the pipeline with borrowed digest and signature engines.
///
/// Holds no state between runs: the signature scratch buffer lives on the
/// stack of [`Verifier::verify`] and is wiped before it returns.
pub struct Verifier<'e, D: DigestEngine + ?Sized, S: SignatureEngine + ?Sized> {
    config: VerifierConfig,
    digest: &'e mut D,
    signature: &'e mut S,
}

impl<'e, D: DigestEngine + ?Sized, S: SignatureEngine + ?Sized> Verifier<'e, D, S> {
    pub fn new(config: VerifierConfig, digest: &'e mut D, signature: &'e mut S) -> Self {
        Self {
            config,
            digest,
            signature,
        }
    }

    /// Authenticates the metadata record in `metadata` and the image in `image`.
    ///
    /// Every state reached is reported to `io.checkpoint`. The first failing
    /// check ends the run.
    pub fn verify<IO: BootloaderIO + ?Sized>(
        &mut self,
        io: &IO,
        metadata: &dyn FlashSource,
        image: &dyn FlashSource,
    ) -> Result<VerifiedImage, BootError> {
        io.checkpoint(VerifyState::Start);
        log::info!("Start APP FW Verification...");

        let raw = metadata
            .read(0, FirmwareMetadata::SIZE)
            .map_err(|_| BootError::MetadataTruncated)?;
        let meta = FirmwareMetadata::parse(raw)?;
        trace_metadata(&meta);

        self.check_magic(&meta)?;
        io.checkpoint(VerifyState::MagicChecked);

        self.check_metadata_digest(raw, &meta)?;
        io.checkpoint(VerifyState::MetaHashChecked);

        self.check_metadata_signature(&meta)?;
        io.checkpoint(VerifyState::MetaSignatureChecked);

        self.check_firmware_digest(image, &meta)?;
        io.checkpoint(VerifyState::FwHashChecked);

        io.checkpoint(VerifyState::Success);
        Ok(VerifiedImage {
            firmware_size: meta.firmware_size,
            firmware_version: meta.firmware_version,
            firmware_tag: meta.firmware_tag,
        })
    }

    fn check_magic(&self, meta: &FirmwareMetadata) -> Result<(), BootError> {
        log::info!("Check FW Magic");
        if meta.magic != self.config.magic {
            return Err(BootError::MagicMismatch { found: meta.magic });
        }
        log::info!("FW Meta data Magic check OK!");
        Ok(())
    }

    /// Digest of the leading bytes of the record, as read from flash
    fn check_metadata_digest(&mut self, raw: &[u8], meta: &FirmwareMetadata) -> Result<(), BootError> {
        log::info!("Check FW Meta data hash");
        let computed = compute_digest(self.digest, &raw[..FirmwareMetadata::SIGNED_LEN])?;
        log::debug!("*** Computed META DATA HASH ***\r\n{}", HexDump(&computed));

        if !digests_match(&computed, &meta.metadata_tag) {
            return Err(BootError::MetadataDigestMismatch);
        }
        log::debug!("*** Saved META HASH ***\r\n{}", HexDump(&meta.metadata_tag));
        log::info!("FW Meta data Hash check OK!");
        Ok(())
    }

    fn check_metadata_signature(&mut self, meta: &FirmwareMetadata) -> Result<(), BootError> {
        log::info!("Check FW Meta data signature");
        let mut scratch = [0u8; SCRATCH_LEN];
        let result = verify_signature(
            self.signature,
            &mut scratch,
            &self.config.public_key,
            &meta.metadata_tag,
            &meta.metadata_signature,
        );
        match result {
            Ok(()) => log::info!("FW Meta data Signature check OK!"),
            Err(_) => log::error!("FW Meta data Signature check FAIL!"),
        }
        result
    }

    /// `firmware_size` is trusted here: the record carrying it is signed
    fn check_firmware_digest(
        &mut self,
        image: &dyn FlashSource,
        meta: &FirmwareMetadata,
    ) -> Result<(), BootError> {
        log::info!("Check FW Hash");
        let bytes = image.read(0, meta.firmware_size as usize)?;
        let computed = compute_digest(self.digest, bytes)?;
        log::debug!("*** Computed FW HASH ***\r\n{}", HexDump(&computed));
        log::debug!("*** Saved FW HASH ***\r\n{}", HexDump(&meta.firmware_tag));

        if !digests_match(&computed, &meta.firmware_tag) {
            return Err(BootError::FirmwareDigestMismatch);
        }
        log::info!("FW Hash check OK!");
        Ok(())
    }
}

fn digests_match(a: &Digest, b: &Digest) -> bool {
    bool::from(a[..].ct_eq(&b[..]))
}

fn trace_metadata(meta: &FirmwareMetadata) {
    log::info!("FW Magic: {:#010x}", meta.magic);
    log::info!("FW Size: {:#010x}", meta.firmware_size);
    log::info!("FW Version: {:#010x}", meta.firmware_version);
    log::debug!("*** FW HASH ***\r\n{}", HexDump(&meta.firmware_tag));
    log::debug!("*** META DATA HASH ***\r\n{}", HexDump(&meta.metadata_tag));
    log::debug!("*** META DATA SIGNATURE ***\r\n{}", HexDump(&meta.metadata_signature));
}
