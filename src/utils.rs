#[macro_use]
pub mod bitfield;
