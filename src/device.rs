pub mod console;
pub mod sd_bus;
pub mod sector_device;
pub mod timer;
