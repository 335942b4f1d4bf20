//! Sector level disk interface for a filesystem library, backed by a single SD card behind a
//! bus controller.
//!
//! The bus controller only accepts word aligned buffers while filesystems happily hand out
//! byte aligned ones. Aligned requests go to the controller as one multi-block transfer;
//! anything else is moved one sector at a time through an aligned scratch [`Sector`].

use core::{fmt, hint};

use log::{debug, error, trace, warn};

use crate::{
    device::{
        sd_bus::{BusError, SdBus, TransferState},
        sector_device::{Sector, SectorAddress, SectorDevice},
        timer::{Deadline, Timer}
    }
};

pub const SECTOR_SIZE: usize = Sector::SECTOR_SIZE;

const WORD_ALIGN: usize = 4;

/// Numeric result handed to the filesystem library.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiskResult {
    Ok = 0,
    Error = 1,
    WriteProtected = 2,
    NotReady = 3,
    InvalidParameter = 4
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiskError {
    /// The bus controller failed to issue or complete a transfer
    Error,
    NotReady,
    InvalidParameter,
    /// The card never returned to the transfer state
    Timeout
}

impl From<BusError> for DiskError {
    fn from(value: BusError) -> Self {
        match value {
            BusError::Timeout => DiskError::Timeout,
            BusError::NoCard => DiskError::NotReady,
            _ => DiskError::Error
        }
    }
}

impl From<DiskError> for DiskResult {
    fn from(value: DiskError) -> Self {
        match value {
            DiskError::Error | DiskError::Timeout => DiskResult::Error,
            DiskError::NotReady => DiskResult::NotReady,
            DiskError::InvalidParameter => DiskResult::InvalidParameter
        }
    }
}

impl<T> From<Result<T, DiskError>> for DiskResult {
    fn from(value: Result<T, DiskError>) -> Self {
        match value {
            Ok(_) => DiskResult::Ok,
            Err(error) => error.into()
        }
    }
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            DiskError::Error => "transfer error",
            DiskError::NotReady => "drive not ready",
            DiskError::InvalidParameter => "invalid parameter",
            DiskError::Timeout => "timed out waiting for the card"
        };

        write!(f, "{}", description)
    }
}

bitfield! {
    pub DriveStatus(u8) {
        not_initialized: 0-0,
        no_disk: 1-1,
        write_protected: 2-2
    } with {
        pub const READY: Self = Self::from_bits(0);
        pub const NOT_INITIALIZED: Self = Self::from_bits(0).set_not_initialized(1);

        pub fn is_initialized(&self) -> bool {
            self.get_not_initialized() == 0
        }
    }
}

/// Physical drives this adapter answers for.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Drive {
    SdCard = 0
}

impl Drive {
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            0 => Some(Drive::SdCard),
            _ => None
        }
    }
}

#[cfg(feature = "ioctl")]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoctlCommand {
    Sync,
    GetSectorCount,
    GetSectorSize,
    GetBlockSize,
    Unknown(u8)
}

#[cfg(feature = "ioctl")]
impl From<u8> for IoctlCommand {
    fn from(value: u8) -> Self {
        match value {
            0 => IoctlCommand::Sync,
            1 => IoctlCommand::GetSectorCount,
            2 => IoctlCommand::GetSectorSize,
            3 => IoctlCommand::GetBlockSize,
            code => IoctlCommand::Unknown(code)
        }
    }
}

#[cfg(feature = "ioctl")]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoctlData {
    Synced,
    SectorCount(u64),
    SectorSize(u16),
    /// Erase block size in sectors
    BlockSize(u32),
    /// The command was accepted without doing anything
    Unrecognized(u8)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AdapterConfig {
    /// How long to poll for the transfer state after a transfer, in microseconds.
    /// `None` polls forever.
    pub poll_timeout: Option<u64>
}

impl AdapterConfig {
    pub const DEFAULT_POLL_TIMEOUT: u64 = 1_000_000;
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Some(Self::DEFAULT_POLL_TIMEOUT)
        }
    }
}

/// The operations a filesystem library calls. Every operation takes the physical drive
/// number first and rejects drives the adapter does not know about.
pub trait BlockDriver {
    fn status(&self, drive: u8) -> DriveStatus;

    fn initialize(&mut self, drive: u8) -> DriveStatus;

    fn read(&mut self, drive: u8, buffer: &mut [u8], sector: SectorAddress, count: u32) -> Result<(), DiskError>;

    #[cfg(feature = "write")]
    fn write(&mut self, drive: u8, buffer: &[u8], sector: SectorAddress, count: u32) -> Result<(), DiskError>;

    #[cfg(feature = "ioctl")]
    fn ioctl(&mut self, drive: u8, command: IoctlCommand) -> Result<IoctlData, DiskError>;
}

pub struct DiskIo<B: SdBus, T: Timer> {
    bus: B,
    timer: T,
    config: AdapterConfig,
    status: DriveStatus
}

impl<B: SdBus, T: Timer> DiskIo<B, T> {
    pub fn new(bus: B, timer: T) -> Self {
        Self::with_config(bus, timer, AdapterConfig::default())
    }

    pub fn with_config(bus: B, timer: T, config: AdapterConfig) -> Self {
        Self {
            bus,
            timer,
            config,
            status: DriveStatus::NOT_INITIALIZED
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Flags left behind by the last call to `initialize`.
    pub fn initialized(&self) -> DriveStatus {
        self.status
    }

    fn read_aligned(&mut self, buffer: &mut [u8], sector: SectorAddress, count: u32) -> Result<(), DiskError> {
        let byte_offset = byte_offset(sector);
        trace!("reading {} sectors from {} (byte offset {:#x})", count, sector, byte_offset);

        if let Err(error) = self.bus.read_blocks(buffer, byte_offset, SECTOR_SIZE as u32, count) {
            warn!("failed to start read of {} sectors at {}: {:?}", count, sector, error);
            return Err(error.into());
        }

        let waited = self.bus.wait_read();
        self.wait_for_transfer()?;

        waited.map_err(|error| {
            warn!("read of {} sectors at {} did not complete: {:?}", count, sector, error);
            DiskError::from(error)
        })
    }

    fn read_through_scratch(&mut self, buffer: &mut [u8], sector: SectorAddress, count: u32) -> Result<(), DiskError> {
        debug!("buffer at {:p} is not word aligned, reading {} sectors one at a time", buffer.as_ptr(), count);

        let mut scratch = Sector::zeroed();

        for (index, destination) in buffer.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            self.read_aligned(&mut scratch.values, sector + index as u32, 1)?;
            destination.copy_from_slice(&scratch.values);
        }

        Ok(())
    }

    #[cfg(feature = "write")]
    fn write_aligned(&mut self, buffer: &[u8], sector: SectorAddress, count: u32) -> Result<(), DiskError> {
        let byte_offset = byte_offset(sector);
        trace!("writing {} sectors to {} (byte offset {:#x})", count, sector, byte_offset);

        if let Err(error) = self.bus.write_blocks(buffer, byte_offset, SECTOR_SIZE as u32, count) {
            warn!("failed to start write of {} sectors at {}: {:?}", count, sector, error);
            return Err(error.into());
        }

        let waited = self.bus.wait_write();
        self.wait_for_transfer()?;

        waited.map_err(|error| {
            warn!("write of {} sectors at {} did not complete: {:?}", count, sector, error);
            DiskError::from(error)
        })
    }

    #[cfg(feature = "write")]
    fn write_through_scratch(&mut self, buffer: &[u8], sector: SectorAddress, count: u32) -> Result<(), DiskError> {
        debug!("buffer at {:p} is not word aligned, writing {} sectors one at a time", buffer.as_ptr(), count);

        let mut scratch = Sector::zeroed();

        for (index, source) in buffer.chunks_exact(SECTOR_SIZE).enumerate() {
            scratch.values.copy_from_slice(source);
            self.write_aligned(&scratch.values, sector + index as u32, 1)?;
        }

        Ok(())
    }

    /// Spins until the card reports the transfer state again.
    fn wait_for_transfer(&mut self) -> Result<(), DiskError> {
        let deadline = Deadline::after(&self.timer, self.config.poll_timeout);

        while self.bus.get_status() != TransferState::Ready {
            if deadline.expired(&self.timer) {
                error!("card did not return to the transfer state within {:?}us", self.config.poll_timeout);
                return Err(DiskError::Timeout);
            }

            hint::spin_loop();
        }

        Ok(())
    }
}

impl<B: SdBus, T: Timer> BlockDriver for DiskIo<B, T> {
    fn status(&self, drive: u8) -> DriveStatus {
        match Drive::from_number(drive) {
            Some(Drive::SdCard) => DriveStatus::READY,
            None => DriveStatus::NOT_INITIALIZED
        }
    }

    fn initialize(&mut self, drive: u8) -> DriveStatus {
        match Drive::from_number(drive) {
            Some(Drive::SdCard) => {
                self.status = match self.bus.init() {
                    Ok(()) => {
                        debug!("sd card initialized: {:?}", self.bus.card_info());
                        DriveStatus::READY
                    },
                    Err(error) => {
                        warn!("sd card initialization failed: {:?}", error);
                        DriveStatus::NOT_INITIALIZED
                    }
                };

                self.status
            },
            None => DriveStatus::NOT_INITIALIZED
        }
    }

    fn read(&mut self, drive: u8, buffer: &mut [u8], sector: SectorAddress, count: u32) -> Result<(), DiskError> {
        if Drive::from_number(drive).is_none() {
            return Err(DiskError::Error);
        }

        let length = request_length(buffer.len(), sector, count)?;

        if count == 0 {
            return Ok(());
        }

        let buffer = &mut buffer[..length];

        if is_word_aligned(buffer.as_ptr()) {
            self.read_aligned(buffer, sector, count)
        } else {
            self.read_through_scratch(buffer, sector, count)
        }
    }

    #[cfg(feature = "write")]
    fn write(&mut self, drive: u8, buffer: &[u8], sector: SectorAddress, count: u32) -> Result<(), DiskError> {
        if count == 0 {
            return Err(DiskError::InvalidParameter);
        }

        if Drive::from_number(drive).is_none() {
            return Err(DiskError::Error);
        }

        let buffer = &buffer[..request_length(buffer.len(), sector, count)?];

        if is_word_aligned(buffer.as_ptr()) {
            self.write_aligned(buffer, sector, count)
        } else {
            self.write_through_scratch(buffer, sector, count)
        }
    }

    #[cfg(feature = "ioctl")]
    fn ioctl(&mut self, drive: u8, command: IoctlCommand) -> Result<IoctlData, DiskError> {
        if Drive::from_number(drive).is_none() {
            return Err(DiskError::Error);
        }

        let data = match command {
            // writes wait for completion before returning, nothing is ever pending
            IoctlCommand::Sync => IoctlData::Synced,
            IoctlCommand::GetSectorCount => {
                let info = self.bus.card_info();

                if info.block_size == 0 {
                    warn!("card reports a block size of zero");
                    return Err(DiskError::Error);
                }

                IoctlData::SectorCount(info.capacity_bytes / info.block_size as u64)
            },
            IoctlCommand::GetSectorSize => IoctlData::SectorSize(SECTOR_SIZE as u16),
            IoctlCommand::GetBlockSize => IoctlData::BlockSize(1),
            IoctlCommand::Unknown(code) => {
                debug!("ignoring unrecognized ioctl {:#x}", code);
                IoctlData::Unrecognized(code)
            }
        };

        Ok(data)
    }
}

impl<B: SdBus, T: Timer> SectorDevice for DiskIo<B, T> {
    fn read_sector(&mut self, address: SectorAddress) -> Result<Sector, DiskError> {
        let mut sector = Sector::zeroed();
        self.read(Drive::SdCard as u8, &mut sector.values, address, 1)?;
        Ok(sector)
    }

    #[cfg(feature = "write")]
    fn write_sector(&mut self, address: SectorAddress, sector: &Sector) -> Result<(), DiskError> {
        self.write(Drive::SdCard as u8, &sector.values, address, 1)
    }

    /// Number of 512 byte sectors on the card.
    fn sector_count(&self) -> Result<u64, DiskError> {
        Ok(self.bus.card_info().capacity_bytes / SECTOR_SIZE as u64)
    }
}

fn byte_offset(sector: SectorAddress) -> u64 {
    sector as u64 * SECTOR_SIZE as u64
}

fn is_word_aligned(pointer: *const u8) -> bool {
    pointer as usize % WORD_ALIGN == 0
}

/// Checks that `count` sectors starting at `sector` fit in both the buffer and the 32-bit
/// sector address space, and returns the number of bytes the request covers.
fn request_length(buffer_length: usize, sector: SectorAddress, count: u32) -> Result<usize, DiskError> {
    if sector as u64 + count as u64 > SectorAddress::MAX as u64 + 1 {
        return Err(DiskError::InvalidParameter);
    }

    match (count as usize).checked_mul(SECTOR_SIZE) {
        Some(length) if length <= buffer_length => Ok(length),
        _ => Err(DiskError::InvalidParameter)
    }
}
