//! The BCM2837 free running system timer, counting microseconds since boot.

use crate::{device::timer::Timer, volatile::Volatile};

#[repr(C)]
pub struct SystemTimerRegisters {
    _control_status: Volatile<u32>,
    counter_low: Volatile<u32>,
    counter_high: Volatile<u32>
}

// the counter is read only
unsafe impl Sync for SystemTimerRegisters {}

#[derive(Copy, Clone)]
pub struct SystemTimer<'a> {
    registers: &'a SystemTimerRegisters
}

impl SystemTimer<'static> {
    const SYSTEM_TIMER_BASE: usize = 0x3F00_3000;

    /// # Safety
    ///
    /// Only valid on a Raspberry Pi 3 with the peripherals identity mapped.
    pub unsafe fn get() -> Self {
        Self::new(&*(Self::SYSTEM_TIMER_BASE as *const SystemTimerRegisters))
    }
}

impl<'a> SystemTimer<'a> {
    pub fn new(registers: &'a SystemTimerRegisters) -> Self {
        Self { registers }
    }
}

impl<'a> Timer for SystemTimer<'a> {
    fn delay_micros(&self, micros: u64) {
        let target = self.get_micros().saturating_add(micros);
        while self.get_micros() < target {
            core::hint::spin_loop();
        }
    }

    fn delay_millis(&self, millis: u64) {
        self.delay_micros(1000 * millis);
    }

    /// The two halves are separate 32 bit reads, so the high half is read again in case the
    /// low half wrapped in between.
    fn get_micros(&self) -> u64 {
        loop {
            let high = self.registers.counter_high.get();
            let low = self.registers.counter_low.get();

            if self.registers.counter_high.get() == high {
                return ((high as u64) << 32) | low as u64;
            }
        }
    }
}
