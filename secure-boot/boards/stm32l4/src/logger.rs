// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! `log` sink writing one line per record to USART2

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};
use secure_boot_common::trace::BufferWriter;
use secure_boot_common::BootloaderIO;

use crate::io::Stm32l4IO;

#[cfg(debug_assertions)]
const MAX_LEVEL: LevelFilter = LevelFilter::Debug;
#[cfg(not(debug_assertions))]
const MAX_LEVEL: LevelFilter = LevelFilter::Info;

struct UartLogger;

static LOGGER: UartLogger = UartLogger;

impl Log for UartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= MAX_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Long hex dumps are cut at the buffer size
        let mut buf = [0u8; 256];
        let mut w = BufferWriter::new(&mut buf);
        let _ = write!(w, "[{}] {}\r\n", record.level(), record.args());
        Stm32l4IO.debug_write(w.as_str());
    }

    fn flush(&self) {}
}

/// Must run after [`Stm32l4IO::init`]
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(MAX_LEVEL);
    }
}
