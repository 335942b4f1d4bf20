use crate::diskio::DiskError;

/// One sector of data. Word aligned so it can be handed straight to a bus controller.
#[repr(C, align(4))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sector {
    pub values: [u8; Self::SECTOR_SIZE]
}

pub type SectorAddress = u32;

pub trait SectorDevice {
    fn read_sector(&mut self, address: SectorAddress) -> Result<Sector, DiskError>;

    #[cfg(feature = "write")]
    fn write_sector(&mut self, address: SectorAddress, sector: &Sector) -> Result<(), DiskError>;

    fn sector_count(&self) -> Result<u64, DiskError>;
}

impl Sector {
    pub const SECTOR_SIZE: usize = 512;

    pub const fn zeroed() -> Self {
        Self { values: [0; Self::SECTOR_SIZE] }
    }
}

impl Default for Sector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<[u8; Self::SECTOR_SIZE]> for Sector {
    fn from(value: [u8; Self::SECTOR_SIZE]) -> Self {
        Self { values: value }
    }
}

impl AsRef<[u8]> for Sector {
    fn as_ref(&self) -> &[u8] {
        &self.values
    }
}

impl AsMut<[u8]> for Sector {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.values
    }
}
