//! Disk I/O layer between a FAT filesystem library and an SD card behind an SD bus controller.
//!
//! [`diskio::DiskIo`] turns sector requests into block transfers on any [`device::sd_bus::SdBus`],
//! waits for the card to return to the transfer state and reports results as the filesystem
//! library's status and result codes. With the `ffi` feature the adapter is reachable from C
//! through [`ffi`]; with `raspi3` the crate carries a driver for the BCM2837 EMMC controller.

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod utils;

pub mod device;
pub mod diskio;
#[cfg(feature = "ffi")]
pub mod ffi;
#[cfg(feature = "raspi3")]
pub mod platform;
pub mod sync;
pub mod volatile;

pub use diskio::{BlockDriver, DiskError, DiskIo, DiskResult, Drive, DriveStatus};
