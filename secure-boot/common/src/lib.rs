// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Secure Boot Common Library
//!
//! Board-agnostic firmware authentication for the STM32L4 secure bootloader.
//! A fixed-layout metadata record is checked (magic, SHA-256 tag, ECDSA
//! P-256 signature), the application image is hashed against the tag the
//! record carries, and control is then handed to the application. Any
//! failure ends in [`fatal`], which never returns.

#![cfg_attr(not(test), no_std)]

pub mod compute_hash;
pub mod error;
pub mod flash;
pub mod handoff;
pub mod signature_verifier;
pub mod trace;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod test_util;

use core::ops::Range;

use crate::compute_hash::DigestEngine;
use crate::error::BootError;
use crate::flash::{FlashSource, MemoryMapped};
use crate::handoff::{hand_off, resolve_target, AppLayout, ControlTransfer, HandoffMode};
use crate::signature_verifier::SignatureEngine;
use crate::types::{FirmwareMetadata, PublicKey, VerifiedImage};
use crate::verifier::{Verifier, VerifierConfig, VerifyState};

/// Trait that boards must implement for bootloader I/O operations
pub trait BootloaderIO {
    /// Signal successful verification
    fn signal_success(&self);

    /// Signal verification failure
    fn signal_failure(&self);

    /// Optional: Write debug message to UART
    fn debug_write(&self, _msg: &str) {}

    /// Optional: Blink a board LED `count` times
    fn debug_blink(&self, _pin: u32, _count: usize) {}

    /// Optional: LED that [`fatal`] blinks the error code on
    fn error_led(&self) -> Option<u32> {
        None
    }

    /// Optional: Observe a verification state transition
    fn checkpoint(&self, _state: VerifyState) {}
}

/// Board-specific configuration that must be provided
pub trait BoardConfig {
    /// Address of the firmware metadata record
    const METADATA_ADDR: usize;

    /// Application vector table / image start address
    const APP_START: usize;

    /// End (exclusive) of the flash region the image may occupy
    const APP_FLASH_END: usize;

    /// SRAM the application's initial stack pointer must fall into
    const SRAM: Range<u32>;

    /// Expected metadata magic
    const FW_MAGIC: u32;

    /// ECDSA P-256 public key (64 bytes, x || y)
    const PUBLIC_KEY: PublicKey;

    /// How control is handed to the application
    const HANDOFF: HandoffMode;
}

impl VerifierConfig {
    pub fn from_board<C: BoardConfig>() -> Self {
        VerifierConfig {
            magic: C::FW_MAGIC,
            public_key: C::PUBLIC_KEY,
        }
    }
}

/// The memory the boot flow reads
#[derive(Copy, Clone)]
pub struct BootRegions<'a> {
    pub metadata: &'a dyn FlashSource,
    pub app: &'a dyn FlashSource,
    /// Window at the system-memory exit vector, trampoline mode only
    pub exit_vector: Option<&'a dyn FlashSource>,
}

/// Memory-mapped windows over the regions described by a [`BoardConfig`]
pub struct BoardWindows {
    metadata: MemoryMapped,
    app: MemoryMapped,
    exit_vector: Option<MemoryMapped>,
}

impl BoardWindows {
    /// # Safety
    ///
    /// The addresses in `C` must describe readable memory on the running part.
    pub unsafe fn new<C: BoardConfig>() -> Self {
        let exit_vector = match C::HANDOFF {
            HandoffMode::Direct => None,
            // SAFETY: system memory is always mapped, the window covers two words
            HandoffMode::ProtectedTrampoline { exit_vector, .. } => {
                Some(unsafe { MemoryMapped::new(exit_vector as usize, 8) })
            }
        };

        // SAFETY: forwarded to the caller
        unsafe {
            BoardWindows {
                metadata: MemoryMapped::new(C::METADATA_ADDR, FirmwareMetadata::SIZE),
                app: MemoryMapped::new(C::APP_START, C::APP_FLASH_END - C::APP_START),
                exit_vector,
            }
        }
    }

    pub fn regions(&self) -> BootRegions<'_> {
        BootRegions {
            metadata: &self.metadata,
            app: &self.app,
            exit_vector: self.exit_vector.as_ref().map(|w| w as &dyn FlashSource),
        }
    }
}

/// Secure bootloader verification flow
///
/// 1. Authenticates the metadata record and the application image
/// 2. Resolves the hand-off target for `C::HANDOFF`
/// 3. Transfers control exactly once
///
/// Only returns when something went wrong, including a transfer that came
/// back. The caller must treat the returned error as fatal.
pub fn authenticate_and_handoff<C, IO, D, S, T>(
    io: &IO,
    regions: &BootRegions<'_>,
    digest: &mut D,
    signature: &mut S,
    transfer: &mut T,
) -> BootError
where
    C: BoardConfig,
    IO: BootloaderIO + ?Sized,
    D: DigestEngine + ?Sized,
    S: SignatureEngine + ?Sized,
    T: ControlTransfer + ?Sized,
{
    let err = match authenticate::<C, _, _, _>(io, regions, digest, signature) {
        Ok((layout, image)) => {
            match resolve_target(&C::HANDOFF, &layout, &image, regions.app, regions.exit_vector) {
                Ok(target) => {
                    io.signal_success();
                    hand_off(transfer, &target)
                }
                Err(e) => e,
            }
        }
        Err(e) => e,
    };

    io.checkpoint(VerifyState::Fatal);
    err
}

fn authenticate<C, IO, D, S>(
    io: &IO,
    regions: &BootRegions<'_>,
    digest: &mut D,
    signature: &mut S,
) -> Result<(AppLayout, VerifiedImage), BootError>
where
    C: BoardConfig,
    IO: BootloaderIO + ?Sized,
    D: DigestEngine + ?Sized,
    S: SignatureEngine + ?Sized,
{
    let image = Verifier::new(VerifierConfig::from_board::<C>(), digest, signature).verify(
        io,
        regions.metadata,
        regions.app,
    )?;
    log::info!("APP FW Verification Success!");

    let layout = AppLayout {
        base: C::APP_START as u32,
        sram: C::SRAM,
    };
    Ok((layout, image))
}

/// Runs the boot flow and halts on any failure
pub fn boot<C, IO, D, S, T>(
    io: &IO,
    regions: &BootRegions<'_>,
    digest: &mut D,
    signature: &mut S,
    transfer: &mut T,
) -> !
where
    C: BoardConfig,
    IO: BootloaderIO + ?Sized,
    D: DigestEngine + ?Sized,
    S: SignatureEngine + ?Sized,
    T: ControlTransfer + ?Sized,
{
    let err = authenticate_and_handoff::<C, _, _, _, _>(io, regions, digest, signature, transfer);
    fatal(io, err)
}

/// Terminal failure: report, blink the error code, signal, and idle forever.
///
/// There is no reset and no retry.
pub fn fatal<IO: BootloaderIO + ?Sized>(io: &IO, err: BootError) -> ! {
    log::error!("{} (code {})", err, err.code());
    if let Some(pin) = io.error_led() {
        io.debug_blink(pin, err.code() as usize);
    }
    halt(io)
}

/// Fail-closed halt shared by [`fatal`] and board panic handlers
pub fn halt<IO: BootloaderIO + ?Sized>(io: &IO) -> ! {
    io.debug_write("Fatal error! Enter endless loop!\r\n");
    io.signal_failure();
    loop {
        core::hint::spin_loop();
    }
}
