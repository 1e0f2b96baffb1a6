// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Board configuration for the STM32L476 secure bootloader

use core::ops::Range;

use secure_boot_common::handoff::HandoffMode;
#[cfg(feature = "secure-user-protect")]
use secure_boot_common::handoff::{BL_EXIT_STICKY, EXIT_MAGIC};
use secure_boot_common::types::{PublicKey, DEFAULT_FW_MAGIC};
use secure_boot_common::BoardConfig;

#[cfg(not(feature = "secure-user-protect"))]
const HANDOFF: HandoffMode = HandoffMode::Direct;

#[cfg(feature = "secure-user-protect")]
const HANDOFF: HandoffMode = HandoffMode::ProtectedTrampoline {
    exit_vector: BL_EXIT_STICKY,
    magic: EXIT_MAGIC,
};

pub struct Stm32l4Config;

impl BoardConfig for Stm32l4Config {
    const METADATA_ADDR: usize = 0x0801_0000;

    const APP_START: usize = 0x0801_1000;

    /// 1 MiB parts
    const APP_FLASH_END: usize = 0x0810_0000;

    /// SRAM1
    const SRAM: Range<u32> = 0x2000_0000..0x2001_8000;

    const FW_MAGIC: u32 = DEFAULT_FW_MAGIC;

    /// Demo key matching `sign-firmware`'s built-in private key
    const PUBLIC_KEY: PublicKey = [
        0xca, 0x53, 0x3e, 0xf4, 0xc6, 0x08, 0xe6, 0x83,
        0x11, 0xd1, 0xf9, 0xd4, 0xd5, 0x50, 0x1d, 0x7d,
        0xaf, 0xcb, 0xf0, 0x15, 0x16, 0x4e, 0x8d, 0x29,
        0x00, 0xcd, 0x1c, 0x63, 0x30, 0xa7, 0xfc, 0x22,
        0x1f, 0x9c, 0xeb, 0xd5, 0xd1, 0xe9, 0x1f, 0x6b,
        0x81, 0x03, 0xae, 0xe0, 0x32, 0x22, 0xff, 0xbc,
        0xd2, 0x76, 0x08, 0x5c, 0x01, 0x28, 0x6b, 0xff,
        0xca, 0x24, 0xc6, 0x16, 0x69, 0xd4, 0xd1, 0x1d,
    ];

    const HANDOFF: HandoffMode = HANDOFF;
}
