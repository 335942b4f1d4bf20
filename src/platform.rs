//! module that abstracts platform specific implementations

#[cfg(feature = "raspi3")]
pub mod raspi3;
