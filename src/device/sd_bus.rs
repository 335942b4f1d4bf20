//! The contract the disk adapter needs from an SD bus controller driver.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusError {
    /// The card rejected or did not answer a command
    Command,
    /// A data phase failed (CRC, end bit, or the controller flagged an error)
    Data,
    Timeout,
    NoCard,
    Unsupported
}

/// What the transfer status register reports after a data phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferState {
    Ready,
    Busy,
    Error
}

/// Read-only facts about the inserted card, filled in by the controller during initialization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct CardInfo {
    pub capacity_bytes: u64,
    pub block_size: u32
}

/// A bus controller that moves whole blocks between memory and the card.
///
/// Buffers handed to `read_blocks` and `write_blocks` are always word aligned and exactly
/// `block_size * count` bytes long. Both calls only start a transfer; `wait_read` and
/// `wait_write` block until it has finished.
pub trait SdBus {
    fn init(&mut self) -> Result<(), BusError>;

    fn read_blocks(&mut self, buffer: &mut [u8], byte_offset: u64, block_size: u32, count: u32) -> Result<(), BusError>;

    fn write_blocks(&mut self, buffer: &[u8], byte_offset: u64, block_size: u32, count: u32) -> Result<(), BusError>;

    fn wait_read(&mut self) -> Result<(), BusError>;

    fn wait_write(&mut self) -> Result<(), BusError>;

    fn get_status(&mut self) -> TransferState;

    fn card_info(&self) -> CardInfo;
}

impl CardInfo {
    const CSD_V1: u64 = 0;
    const CSD_V2: u64 = 1;
    const CSD_V3: u64 = 2;

    const HIGH_CAPACITY_UNIT: u64 = 512 * 1024;
    const HIGH_CAPACITY_BLOCK_SIZE: u32 = 512;

    /// Decodes the card specific data register. `csd` holds bits 127..0 of the register
    /// at their natural positions (the CRC byte may be left as zero).
    pub fn from_csd(csd: u128) -> Result<Self, BusError> {
        match csd_bits(csd, 127, 126) {
            Self::CSD_V1 => {
                let read_block_length = csd_bits(csd, 83, 80);
                let device_size = csd_bits(csd, 73, 62);
                let size_multiplier = csd_bits(csd, 49, 47);

                let block_size = 1u32 << read_block_length;
                let block_count = (device_size + 1) << (size_multiplier + 2);

                Ok(Self {
                    capacity_bytes: block_count * block_size as u64,
                    block_size
                })
            },
            Self::CSD_V2 => Ok(Self::high_capacity(csd_bits(csd, 69, 48))),
            Self::CSD_V3 => Ok(Self::high_capacity(csd_bits(csd, 75, 48))),
            _ => Err(BusError::Unsupported)
        }
    }

    fn high_capacity(device_size: u64) -> Self {
        Self {
            capacity_bytes: (device_size + 1) * Self::HIGH_CAPACITY_UNIT,
            block_size: Self::HIGH_CAPACITY_BLOCK_SIZE
        }
    }
}

fn csd_bits(csd: u128, high: u32, low: u32) -> u64 {
    let width = high - low + 1;
    ((csd >> low) & ((1u128 << width) - 1)) as u64
}
