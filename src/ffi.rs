//! C entry points for the filesystem library's disk layer.
//!
//! A kernel registers one [`BlockDriver`] at boot, after which the filesystem library can call
//! `disk_status`, `disk_initialize`, `disk_read`, `disk_write` and `disk_ioctl` directly.

use core::{ffi::c_void, slice};

use log::{debug, warn};

use crate::{
    diskio::{BlockDriver, DiskError, DiskResult, DriveStatus, SECTOR_SIZE},
    sync::SpinMutex
};

#[cfg(feature = "ioctl")]
use crate::diskio::{IoctlCommand, IoctlData};

type Registered = Option<&'static mut (dyn BlockDriver + Send)>;

static DRIVER: SpinMutex<Registered> = SpinMutex::new(None);

/// Installs the driver the C entry points dispatch to, returning the one it replaces.
pub fn register(driver: &'static mut (dyn BlockDriver + Send)) -> Registered {
    DRIVER.lock().replace(driver)
}

pub fn unregister() -> Registered {
    DRIVER.lock().take()
}

fn with_driver<R>(missing: R, f: impl FnOnce(&mut (dyn BlockDriver + Send + 'static)) -> R) -> R {
    DRIVER.execute(|slot| match slot.as_deref_mut() {
        Some(driver) => f(driver),
        None => missing
    })
}

fn result_code<T>(operation: &str, result: Result<T, DiskError>) -> u8 {
    if let Err(error) = &result {
        debug!("{} failed: {}", operation, error);
    }

    result_code("disk_read", result)
}

fn buffer_length(count: u32) -> Option<usize> {
    (count as usize).checked_mul(SECTOR_SIZE)
}

#[no_mangle]
pub extern "C" fn disk_status(pdrv: u8) -> u8 {
    with_driver(DriveStatus::NOT_INITIALIZED, |driver| driver.status(pdrv)).bits()
}

#[no_mangle]
pub extern "C" fn disk_initialize(pdrv: u8) -> u8 {
    with_driver(DriveStatus::NOT_INITIALIZED, |driver| driver.initialize(pdrv)).bits()
}

/// # Safety
///
/// `buff` must be valid for writes of `count * 512` bytes, or may be null when `count` is 0.
#[no_mangle]
pub unsafe extern "C" fn disk_read(pdrv: u8, buff: *mut u8, sector: u32, count: u32) -> u8 {
    let result = match buffer_length(count) {
        Some(0) => with_driver(Err(DiskError::NotReady), |driver| driver.read(pdrv, &mut [], sector, 0)),
        Some(_) if buff.is_null() => Err(DiskError::InvalidParameter),
        Some(length) => {
            let buffer = slice::from_raw_parts_mut(buff, length);
            with_driver(Err(DiskError::NotReady), |driver| driver.read(pdrv, buffer, sector, count))
        },
        None => Err(DiskError::InvalidParameter)
    };

    result_code("disk_read", result)
}

/// # Safety
///
/// `buff` must be valid for reads of `count * 512` bytes, or may be null when `count` is 0.
#[cfg(feature = "write")]
#[no_mangle]
pub unsafe extern "C" fn disk_write(pdrv: u8, buff: *const u8, sector: u32, count: u32) -> u8 {
    let result = match buffer_length(count) {
        Some(0) => with_driver(Err(DiskError::NotReady), |driver| driver.write(pdrv, &[], sector, 0)),
        Some(_) if buff.is_null() => Err(DiskError::InvalidParameter),
        Some(length) => {
            let buffer = slice::from_raw_parts(buff, length);
            with_driver(Err(DiskError::NotReady), |driver| driver.write(pdrv, buffer, sector, count))
        },
        None => Err(DiskError::InvalidParameter)
    };

    result_code("disk_write", result)
}

/// # Safety
///
/// For the sector count and erase block size commands `buff` must be valid for a 32-bit
/// write; for the sector size command, a 16-bit write. No alignment is required.
#[cfg(feature = "ioctl")]
#[no_mangle]
pub unsafe extern "C" fn disk_ioctl(pdrv: u8, cmd: u8, buff: *mut c_void) -> u8 {
    let result = with_driver(Err(DiskError::NotReady), |driver| driver.ioctl(pdrv, IoctlCommand::from(cmd)));

    let result = match result {
        Ok(IoctlData::Synced) | Ok(IoctlData::Unrecognized(_)) => Ok(()),
        Ok(_) if buff.is_null() => Err(DiskError::InvalidParameter),
        Ok(IoctlData::SectorCount(count)) => match u32::try_from(count) {
            Ok(count) => {
                (buff as *mut u32).write_unaligned(count);
                Ok(())
            },
            Err(_) => {
                warn!("card has {} sectors, more than a 32-bit count can describe", count);
                Err(DiskError::Error)
            }
        },
        Ok(IoctlData::SectorSize(size)) => {
            (buff as *mut u16).write_unaligned(size);
            Ok(())
        },
        Ok(IoctlData::BlockSize(size)) => {
            (buff as *mut u32).write_unaligned(size);
            Ok(())
        },
        Err(error) => Err(error)
    };

    result_code("disk_ioctl", result)
}

#[cfg(test)]
mod tests {
    use std::boxed::Box;

    use super::*;
    use crate::{
        device::{sd_bus::{CardInfo, mock::MockBus}, timer::fake::FakeTimer},
        diskio::DiskIo
    };

    #[repr(C, align(4))]
    struct Aligned([u8; 2 * SECTOR_SIZE + 4]);

    // the registration slot is shared, so everything touching it runs in this one test
    #[test]
    fn test_entry_points() {
        unregister();

        let mut buffer = Aligned([0; 2 * SECTOR_SIZE + 4]);

        assert_eq!(disk_status(0), DriveStatus::NOT_INITIALIZED.bits());
        assert_eq!(disk_initialize(0), DriveStatus::NOT_INITIALIZED.bits());
        assert_eq!(unsafe { disk_read(0, buffer.0.as_mut_ptr(), 0, 1) }, DiskResult::NotReady as u8);

        let mut bus = MockBus::new(CardInfo { capacity_bytes: 1 << 20, block_size: 512 });
        bus.fill_pattern();
        let expected = bus.card[3 * SECTOR_SIZE..5 * SECTOR_SIZE].to_vec();
        let disk: &'static mut DiskIo<MockBus, FakeTimer> = Box::leak(Box::new(DiskIo::new(bus, FakeTimer::new(1))));

        assert!(register(disk).is_none());

        assert_eq!(disk_status(0), 0);
        assert_eq!(disk_status(1), 1);
        assert_eq!(disk_initialize(0), 0);

        // misaligned destination goes through the scratch path
        let result = unsafe { disk_read(0, buffer.0.as_mut_ptr().add(1), 3, 2) };
        assert_eq!(result, DiskResult::Ok as u8);
        assert_eq!(&buffer.0[1..1 + 2 * SECTOR_SIZE], &expected[..]);

        assert_eq!(unsafe { disk_read(0, core::ptr::null_mut(), 0, 1) }, DiskResult::InvalidParameter as u8);
        assert_eq!(unsafe { disk_read(0, core::ptr::null_mut(), 0, 0) }, DiskResult::Ok as u8);
        assert_eq!(unsafe { disk_read(4, buffer.0.as_mut_ptr(), 0, 1) }, DiskResult::Error as u8);

        #[cfg(feature = "write")]
        {
            let source = [0x77u8; SECTOR_SIZE];
            assert_eq!(unsafe { disk_write(0, source.as_ptr(), 9, 1) }, DiskResult::Ok as u8);
            assert_eq!(unsafe { disk_write(0, source.as_ptr(), 9, 0) }, DiskResult::InvalidParameter as u8);
            assert_eq!(unsafe { disk_read(0, buffer.0.as_mut_ptr(), 9, 1) }, DiskResult::Ok as u8);
            assert!(buffer.0[..SECTOR_SIZE].iter().all(|&byte| byte == 0x77));
        }

        #[cfg(feature = "ioctl")]
        {
            let mut output = [0xAAu8; 8];

            assert_eq!(unsafe { disk_ioctl(0, 1, output.as_mut_ptr().add(1) as *mut c_void) }, 0);
            assert_eq!(u32::from_ne_bytes([output[1], output[2], output[3], output[4]]), 2048);

            output = [0xAA; 8];
            assert_eq!(unsafe { disk_ioctl(0, 2, output.as_mut_ptr() as *mut c_void) }, 0);
            assert_eq!(u16::from_ne_bytes([output[0], output[1]]), 512);
            assert_eq!(output[2], 0xAA);

            assert_eq!(unsafe { disk_ioctl(0, 3, output.as_mut_ptr() as *mut c_void) }, 0);
            assert_eq!(u32::from_ne_bytes([output[0], output[1], output[2], output[3]]), 1);

            output = [0xAA; 8];
            assert_eq!(unsafe { disk_ioctl(0, 0, core::ptr::null_mut()) }, 0);
            assert_eq!(unsafe { disk_ioctl(0, 0x42, output.as_mut_ptr() as *mut c_void) }, 0);
            assert!(output.iter().all(|&byte| byte == 0xAA));

            assert_eq!(unsafe { disk_ioctl(0, 1, core::ptr::null_mut()) }, DiskResult::InvalidParameter as u8);
            assert_eq!(unsafe { disk_ioctl(7, 1, output.as_mut_ptr() as *mut c_void) }, DiskResult::Error as u8);
        }

        assert!(unregister().is_some());
        assert_eq!(disk_status(0), DriveStatus::NOT_INITIALIZED.bits());
    }
}
