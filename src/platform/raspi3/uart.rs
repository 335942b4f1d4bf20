//! Transmit side of the auxiliary mini UART, used as a console for log output.
//!
//! GPIO 14 must already be switched to alternate function 5.

use core::fmt::{self, Arguments, Write};

use crate::{device::console::Console, volatile::Volatile};

#[repr(C)]
pub struct MiniUartRegisters {
    _interrupt_status: Volatile<u32>,
    enables: Volatile<u32>,
    _reserved: [u32; 14],
    io: Volatile<u32>,
    interrupt_enable: Volatile<u32>,
    interrupt_identify: Volatile<u32>,
    line_control: Volatile<u32>,
    modem_control: Volatile<u32>,
    line_status: Volatile<u32>,
    _modem_status: Volatile<u32>,
    _scratch: Volatile<u32>,
    control: Volatile<u32>,
    _status: Volatile<u32>,
    baud_rate: Volatile<u32>
}

const _: () = assert!(core::mem::size_of::<MiniUartRegisters>() == 0x6C);

unsafe impl Sync for MiniUartRegisters {}

pub struct MiniUart<'a> {
    registers: &'a MiniUartRegisters
}

impl MiniUart<'static> {
    const UART_BASE: usize = 0x3F21_5000;

    /// # Safety
    ///
    /// Only valid on a Raspberry Pi 3 with the peripherals identity mapped.
    pub unsafe fn get() -> Self {
        Self::new(&*(Self::UART_BASE as *const MiniUartRegisters))
    }
}

impl<'a> MiniUart<'a> {
    const TRANSMITTER_EMPTY: u32 = 0b10_0000;
    // 115200 baud with the 250 MHz core clock
    const BAUD_RATE_DIVISOR: u32 = 270;

    pub fn new(registers: &'a MiniUartRegisters) -> Self {
        Self { registers }
    }

    pub fn init(&self) {
        self.registers.enables.update(|enables| enables | 1);

        self.registers.control.set(0);
        // 8 bit data
        self.registers.line_control.set(0b11);
        self.registers.modem_control.set(0);
        self.registers.interrupt_enable.set(0);
        // clear both fifos
        self.registers.interrupt_identify.set(0b1100_0110);
        self.registers.baud_rate.set(Self::BAUD_RATE_DIVISOR);

        self.registers.control.set(0b10);
    }

    pub fn send_byte(&self, byte: u8) {
        while self.registers.line_status.get() & Self::TRANSMITTER_EMPTY == 0 {
            core::hint::spin_loop();
        }
        self.registers.io.set(byte as u32);
    }
}

impl<'a> Write for MiniUart<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.send_byte(b'\r');
            }
            self.send_byte(byte);
        }
        Ok(())
    }
}

impl<'a> Console for MiniUart<'a> {
    fn newline(&self) {
        self.writef(format_args!("\n"));
    }

    fn writef(&self, args: Arguments) {
        let _ = MiniUart::new(self.registers).write_fmt(args);
    }

    fn writefln(&self, args: Arguments) {
        self.writef(args);
        self.newline();
    }
}
