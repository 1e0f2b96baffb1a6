// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Hand-off from the bootloader to the authenticated application
//!
//! Two mutually exclusive modes:
//!
//! - [`HandoffMode::Direct`]: load MSP from word 0 of the application vector
//!   table and branch to the reset handler in word 1.
//! - [`HandoffMode::ProtectedTrampoline`]: the part runs with secure user
//!   memory enabled, so the jump has to go through the system-memory exit
//!   routine. Its address is word 1 of the exit vector; it is called as
//!   `exit(exit_entry, magic, app_base)` and performs the jump itself after
//!   locking the protected area.
//!
//! Resolution only reads memory. The actual register writes and branch live
//! behind [`ControlTransfer`], which boards implement and tests fake.

use core::ops::Range;

use crate::error::BootError;
use crate::flash::FlashSource;
use crate::types::VerifiedImage;

/// Secure-exit vector of the STM32L4 system memory
pub const BL_EXIT_STICKY: u32 = 0x1FFF_6800;

/// Value the exit routine expects in its second argument
pub const EXIT_MAGIC: u32 = 0x0819_2A3C;

/// How control is handed to the application
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandoffMode {
    Direct,
    ProtectedTrampoline { exit_vector: u32, magic: u32 },
}

/// A fully resolved transfer, ready to execute
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandoffTarget {
    /// Set MSP to `stack_pointer`, branch to `entry_point`
    Direct { stack_pointer: u32, entry_point: u32 },

    /// Call `entry(entry, magic, app_base)`
    Trampoline { entry: u32, magic: u32, app_base: u32 },
}

/// Executes a [`HandoffTarget`].
///
/// On hardware this never returns. Returning at all means the jump did not
/// happen and the caller treats it as fatal.
pub trait ControlTransfer {
    fn transfer(&mut self, target: &HandoffTarget);
}

/// Where the application lives and what a sane vector table looks like
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppLayout {
    /// Address of the application vector table
    pub base: u32,
    /// RAM the initial stack pointer must point into (end is inclusive)
    pub sram: Range<u32>,
}

/// Reads the words needed for `mode` and checks them.
///
/// `app` is the application region starting at `layout.base`. `exit_vector`
/// is the system-memory window starting at the exit vector and is only
/// consulted in trampoline mode.
pub fn resolve_target(
    mode: &HandoffMode,
    layout: &AppLayout,
    image: &VerifiedImage,
    app: &dyn FlashSource,
    exit_vector: Option<&dyn FlashSource>,
) -> Result<HandoffTarget, BootError> {
    match *mode {
        HandoffMode::Direct => {
            let stack_pointer = app.read_u32(0)?;
            let entry_point = app.read_u32(4)?;
            log::debug!(
                "MSP: {:#010x} Reset vector: {:#010x}",
                stack_pointer,
                entry_point
            );

            if !stack_pointer_ok(stack_pointer, &layout.sram) {
                log::error!("initial stack pointer outside SRAM");
                return Err(BootError::InvalidVectorTable);
            }
            if !entry_point_ok(entry_point, layout.base, image.firmware_size) {
                log::error!("reset vector outside the verified image");
                return Err(BootError::InvalidVectorTable);
            }

            Ok(HandoffTarget::Direct {
                stack_pointer,
                entry_point,
            })
        }
        HandoffMode::ProtectedTrampoline { exit_vector: vector, magic } => {
            let window = exit_vector.ok_or(BootError::InvalidVectorTable)?;
            let entry = window.read_u32(4)?;
            log::debug!("exit vector {:#010x} -> {:#010x}", vector, entry);

            // The exit routine is Thumb code in system memory
            if entry & 1 == 0 {
                return Err(BootError::InvalidVectorTable);
            }

            Ok(HandoffTarget::Trampoline {
                entry,
                magic,
                app_base: layout.base,
            })
        }
    }
}

/// Runs the transfer. Only ever returns an error.
pub fn hand_off<T: ControlTransfer + ?Sized>(transfer: &mut T, target: &HandoffTarget) -> BootError {
    log::info!("jumping...");
    transfer.transfer(target);
    log::error!("jumped! not reachable!");
    BootError::HandoffUnreachable
}

fn stack_pointer_ok(sp: u32, sram: &Range<u32>) -> bool {
    sp % 4 == 0 && sp > sram.start && sp <= sram.end
}

fn entry_point_ok(entry: u32, base: u32, size: u32) -> bool {
    if entry & 1 == 0 {
        return false;
    }
    let pc = u64::from(entry & !1);
    let start = u64::from(base);
    pc >= start && pc < start + u64::from(size)
}
