// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Cortex-M4 control transfer to the application

use secure_boot_common::handoff::{ControlTransfer, HandoffTarget};

use crate::io::Stm32l4IO;

const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
const NVIC_ICER0: *mut u32 = 0xE000_E180 as *mut u32;
const NVIC_ICPR0: *mut u32 = 0xE000_E280 as *mut u32;
const NVIC_WORDS: usize = 8;
const SCB_ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
const PENDSVCLR: u32 = 1 << 27;
const PENDSTCLR: u32 = 1 << 25;

pub struct CortexMTransfer<'a> {
    io: &'a Stm32l4IO,
    vector_base: u32,
}

impl<'a> CortexMTransfer<'a> {
    pub fn new(io: &'a Stm32l4IO, vector_base: u32) -> Self {
        Self { io, vector_base }
    }
}

impl ControlTransfer for CortexMTransfer<'_> {
    fn transfer(&mut self, target: &HandoffTarget) {
        self.io.shutdown();
        match *target {
            HandoffTarget::Direct {
                stack_pointer,
                entry_point,
            } => {
                // SAFETY: the target was resolved from an authenticated image
                // and its vector table passed the SRAM/flash range checks
                unsafe { jump_direct(self.vector_base, stack_pointer, entry_point) }
            }
            HandoffTarget::Trampoline {
                entry,
                magic,
                app_base,
            } => {
                // SAFETY: `entry` is the secure-exit routine in system memory,
                // which locks the protected area and jumps to `app_base`
                unsafe { call_trampoline(entry, magic, app_base) }
            }
        }
    }
}

/// Quiesces the core, then loads MSP and branches to `entry_point`
unsafe fn jump_direct(vector_base: u32, stack_pointer: u32, entry_point: u32) -> ! {
    // SAFETY: core peripheral registers of the Cortex-M4, caller guarantees the target
    unsafe {
        core::ptr::write_volatile(SYST_CSR, 0);

        for i in 0..NVIC_WORDS {
            core::ptr::write_volatile(NVIC_ICER0.add(i), 0xFFFF_FFFF);
            core::ptr::write_volatile(NVIC_ICPR0.add(i), 0xFFFF_FFFF);
        }

        // Interrupts stay masked until the application enables them
        core::arch::asm!("cpsid i", options(nomem, nostack, preserves_flags));

        core::ptr::write_volatile(SCB_VTOR, vector_base);
        core::ptr::write_volatile(SCB_ICSR, PENDSVCLR | PENDSTCLR);
        core::arch::asm!("dsb; isb", options(nomem, nostack, preserves_flags));

        // Privileged thread mode on MSP
        core::arch::asm!("msr control, {0}", "isb", in(reg) 0u32, options(nostack, preserves_flags));

        // No stack use between the MSP write and the branch
        core::arch::asm!(
            "msr msp, {sp}",
            "isb",
            "bx {rst}",
            sp = in(reg) stack_pointer,
            rst = in(reg) entry_point | 1,
            options(noreturn, nostack)
        );
    }
}

/// Calls `exit(entry, magic, app_base)`. Returns only if the routine does.
unsafe fn call_trampoline(entry: u32, magic: u32, app_base: u32) {
    // SAFETY: caller guarantees `entry` is a Thumb function with this signature
    let exit: extern "C" fn(u32, u32, u32) =
        unsafe { core::mem::transmute::<usize, extern "C" fn(u32, u32, u32)>(entry as usize) };
    exit(entry, magic, app_base);
}
