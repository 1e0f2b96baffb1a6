// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! I/O operations for the STM32L4 bootloader
//!
//! USART2 on PA2 (AF7, TX only) at 115200 baud from the 4 MHz MSI reset
//! clock, and the user LED on PA5. Registers are poked directly; nothing
//! else runs this early.

use secure_boot_common::verifier::VerifyState;
use secure_boot_common::BootloaderIO;

const RCC_BASE: usize = 0x4002_1000;
const RCC_AHB2ENR: usize = RCC_BASE + 0x4C;
const RCC_APB1ENR1: usize = RCC_BASE + 0x58;
const GPIOAEN: u32 = 1 << 0;
const USART2EN: u32 = 1 << 17;

const GPIOA_BASE: usize = 0x4800_0000;
const GPIO_MODER: usize = 0x00;
const GPIO_AFRL: usize = 0x20;
const GPIO_BSRR: usize = 0x18;

const USART2_BASE: usize = 0x4000_4400;
const USART_CR1: usize = 0x00;
const USART_BRR: usize = 0x0C;
const USART_ISR: usize = 0x1C;
const USART_TDR: usize = 0x28;
const CR1_UE: u32 = 1 << 0;
const CR1_TE: u32 = 1 << 3;
const ISR_TC: u32 = 1 << 6;
const ISR_TXE: u32 = 1 << 7;

const MSI_HZ: u32 = 4_000_000;
const BAUD: u32 = 115_200;

const UART_TX_PIN: u32 = 2; // PA2
pub const LED_PIN: u32 = 5; // PA5

fn read(addr: usize) -> u32 {
    // SAFETY: only called with peripheral register addresses of this part
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

fn write(addr: usize, val: u32) {
    // SAFETY: only called with peripheral register addresses of this part
    unsafe { core::ptr::write_volatile(addr as *mut u32, val) }
}

fn modify(addr: usize, clear: u32, set: u32) {
    write(addr, (read(addr) & !clear) | set);
}

/// STM32L4 I/O implementation
pub struct Stm32l4IO;

impl Stm32l4IO {
    /// Clocks GPIOA and USART2, configures PA2/PA5, enables the transmitter
    pub fn init() -> Self {
        modify(RCC_AHB2ENR, 0, GPIOAEN);
        modify(RCC_APB1ENR1, 0, USART2EN);
        // Enable-to-access delay after RCC write
        let _ = read(RCC_APB1ENR1);

        // PA2 alternate function 7, PA5 general purpose output
        let tx = UART_TX_PIN * 2;
        let led = LED_PIN * 2;
        modify(
            GPIOA_BASE + GPIO_MODER,
            (0b11 << tx) | (0b11 << led),
            (0b10 << tx) | (0b01 << led),
        );
        modify(GPIOA_BASE + GPIO_AFRL, 0xF << (UART_TX_PIN * 4), 7 << (UART_TX_PIN * 4));

        write(USART2_BASE + USART_CR1, 0);
        write(USART2_BASE + USART_BRR, (MSI_HZ + BAUD / 2) / BAUD);
        write(USART2_BASE + USART_CR1, CR1_UE | CR1_TE);

        let io = Self;
        io.led_off(LED_PIN);
        io
    }

    fn led_on(&self, pin: u32) {
        write(GPIOA_BASE + GPIO_BSRR, 1 << pin);
    }

    fn led_off(&self, pin: u32) {
        write(GPIOA_BASE + GPIO_BSRR, 1 << (pin + 16));
    }

    fn put_byte(&self, byte: u8) {
        while read(USART2_BASE + USART_ISR) & ISR_TXE == 0 {}
        write(USART2_BASE + USART_TDR, u32::from(byte));
    }

    /// Waits for the last byte to leave the shifter, then turns USART2 off
    pub fn shutdown(&self) {
        while read(USART2_BASE + USART_ISR) & ISR_TC == 0 {}
        write(USART2_BASE + USART_CR1, 0);
    }

    /// Delay loop
    pub fn delay(&self, cycles: u32) {
        for _ in 0..cycles {
            cortex_m::asm::nop();
        }
    }
}

impl BootloaderIO for Stm32l4IO {
    /// Signal success: LED on
    fn signal_success(&self) {
        self.led_on(LED_PIN);
    }

    /// Signal failure: blink the LED forever
    fn signal_failure(&self) {
        loop {
            self.led_on(LED_PIN);
            self.delay(200_000);
            self.led_off(LED_PIN);
            self.delay(200_000);
        }
    }

    fn debug_write(&self, msg: &str) {
        for byte in msg.bytes() {
            self.put_byte(byte);
        }
    }

    fn debug_blink(&self, pin: u32, count: usize) {
        for _ in 0..count {
            self.led_on(pin);
            self.delay(200_000);
            self.led_off(pin);
            self.delay(200_000);
        }
        self.delay(1_000_000);
    }

    fn error_led(&self) -> Option<u32> {
        Some(LED_PIN)
    }

    fn checkpoint(&self, state: VerifyState) {
        log::trace!("state: {:?}", state);
    }
}
