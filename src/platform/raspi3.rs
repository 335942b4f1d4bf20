//! Raspberry Pi 3 implementations of the SD bus, timer and console

pub mod emmc;
pub mod timer;
pub mod uart;

use crate::diskio::DiskIo;

use self::{emmc::{EMMCRegisters, EMMC}, timer::SystemTimer};

pub type SdCard = DiskIo<EMMC<'static, SystemTimer<'static>>, SystemTimer<'static>>;

/// Disk adapter over the on-board SD card slot.
///
/// # Safety
///
/// Must be called at most once, on a Raspberry Pi 3 with the peripherals identity mapped.
pub unsafe fn sd_card() -> SdCard {
    let timer = SystemTimer::get();
    DiskIo::new(EMMC::new(EMMCRegisters::get(), timer), timer)
}
