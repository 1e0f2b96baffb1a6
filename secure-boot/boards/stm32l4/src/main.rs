// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Secure bootloader for STM32L4
//!
//! Authenticates the application metadata and image, then hands off to the
//! application. Never falls through to unauthenticated code.

#![no_std]
#![no_main]

mod config;
mod io;
mod jump;
mod logger;
mod panic;

use config::Stm32l4Config;
use io::Stm32l4IO;
use jump::CortexMTransfer;
use secure_boot_common::compute_hash::Sha256Engine;
use secure_boot_common::signature_verifier::P256Engine;
use secure_boot_common::{boot, BoardConfig, BoardWindows, BootloaderIO};

core::arch::global_asm!(include_str!("startup.s"));

/// Main entry point called by startup code
#[no_mangle]
pub extern "C" fn main() -> ! {
    let io = Stm32l4IO::init();
    logger::init();
    io.debug_write("\r\n\r\n");
    log::info!("Secure Boot for STM32L4");

    // SAFETY: metadata, application and system-memory windows are mapped flash on this part
    let windows = unsafe { BoardWindows::new::<Stm32l4Config>() };
    let mut transfer = CortexMTransfer::new(&io, Stm32l4Config::APP_START as u32);

    boot::<Stm32l4Config, _, _, _, _>(
        &io,
        &windows.regions(),
        &mut Sha256Engine::new(),
        &mut P256Engine::new(),
        &mut transfer,
    )
}

#[no_mangle]
pub extern "C" fn Default_Handler() -> ! {
    secure_boot_common::halt(&Stm32l4IO)
}

#[no_mangle]
pub extern "C" fn NMI_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn HardFault_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn MemManage_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn BusFault_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn UsageFault_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn SVC_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn DebugMon_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn PendSV_Handler() -> ! {
    Default_Handler()
}

#[no_mangle]
pub extern "C" fn SysTick_Handler() -> ! {
    Default_Handler()
}
