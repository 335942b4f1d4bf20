//! Driver for the EMMC (SDHCI compatible) controller on the BCM2837.
//!
//! Data moves by programmed I/O through the data port; multi-block transfers are stopped by
//! the controller itself with an automatic CMD12. The GPIO pins 48-53 must already be routed
//! to the controller (the firmware does this on the Raspberry Pi 3).

use log::{debug, trace, warn};

use crate::{
    device::{
        sd_bus::{BusError, CardInfo, SdBus, TransferState},
        timer::{Deadline, Timer}
    },
    volatile::Volatile
};

#[repr(C)]
pub struct EMMCRegisters {
    _arg2: Volatile<u32>,
    block_size_and_count: Volatile<BlockSizeAndCount>,
    arg1: Volatile<u32>,
    command: Volatile<SDCommand>,
    response: [Volatile<u32>; 4],
    data: Volatile<u32>,
    status: Volatile<Status>,
    control0: Volatile<Control0>,
    control1: Volatile<Control1>,
    interrupt: Volatile<Interrupt>,
    interrupt_mask: Volatile<u32>,
    interrupt_enable: Volatile<u32>,
    _reserved: [u32; 48],
    slot_interrupt_version: Volatile<SlotInterruptVersion>
}

const _: () = assert!(core::mem::size_of::<EMMCRegisters>() == 0x100);

// registers are only touched by the driver that owns them
unsafe impl Sync for EMMCRegisters {}

impl EMMCRegisters {
    const EMMC_CONTROLLER_BASE: usize = 0x3F30_0000;

    /// # Safety
    ///
    /// Only valid on a Raspberry Pi 3 with the peripherals identity mapped, and the caller
    /// must make sure a single [`EMMC`] drives the controller.
    pub unsafe fn get() -> &'static Self {
        &*(Self::EMMC_CONTROLLER_BASE as *const Self)
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct Card {
    relative_address: u32,
    high_capacity: bool,
    info: CardInfo
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pending {
    Read,
    Write
}

pub struct EMMC<'a, T: Timer> {
    registers: &'a EMMCRegisters,
    timer: T,
    card: Option<Card>,
    pending: Option<Pending>
}

impl<'a, T: Timer> EMMC<'a, T> {
    const BASE_CLOCK: u32 = 41_666_666;
    const IDENTIFICATION_CLOCK: u32 = 400_000;
    const TRANSFER_CLOCK: u32 = 25_000_000;

    const TIMEOUT: u64 = 1_000_000;
    const OPERATING_CONDITION_TIMEOUT: u64 = 1_000_000;

    const BLOCK_SIZE: u32 = 512;

    const INTERFACE_CONDITION: u32 = 0x1AA;
    const INTERFACE_CONDITION_MASK: u32 = 0xFFF;

    const ACMD41_CMD_COMPLETE: u32 = 0x8000_0000;
    const ACMD41_CMD_CCS: u32 = 0x4000_0000;
    const ACMD41_ARG_HC: u32 = 0x51FF_8000;
    const ACMD41_VOLTAGE: u32 = 0x00FF_8000;

    const RCA_MASK: u32 = 0xFFFF_0000;

    const BUS_WIDTH_4: u32 = 2;

    pub fn new(registers: &'a EMMCRegisters, timer: T) -> Self {
        Self {
            registers,
            timer,
            card: None,
            pending: None
        }
    }

    fn card(&self) -> Result<Card, BusError> {
        self.card.ok_or(BusError::NoCard)
    }

    fn wait_until(&self, micros: u64, condition: impl Fn(&EMMCRegisters) -> bool) -> Result<(), BusError> {
        let deadline = Deadline::after(&self.timer, Some(micros));

        while !condition(self.registers) {
            if deadline.expired(&self.timer) {
                return Err(BusError::Timeout);
            }
            self.timer.delay_micros(1);
        }

        Ok(())
    }

    /// Waits for any of the interrupts in `mask` and acknowledges them.
    fn wait_interrupt(&self, mask: Interrupt) -> Result<(), BusError> {
        let deadline = Deadline::after(&self.timer, Some(Self::TIMEOUT));

        loop {
            let interrupt = self.registers.interrupt.get();

            if interrupt.is_err() {
                self.registers.interrupt.set(interrupt);

                return Err(if interrupt.is_command_timeout() || interrupt.is_data_timeout() {
                    BusError::Timeout
                } else if interrupt.is_data_error() {
                    BusError::Data
                } else {
                    BusError::Command
                });
            }

            if interrupt.bits() & mask.bits() != 0 {
                self.registers.interrupt.set(mask);
                return Ok(());
            }

            if deadline.expired(&self.timer) {
                return Err(BusError::Timeout);
            }
        }
    }

    fn reset_command_line(&self) -> Result<(), BusError> {
        self.registers.control1.update(|control| control.set_reset_command(1));
        self.wait_until(Self::TIMEOUT, |registers| registers.control1.get().get_reset_command() == 0)
    }

    fn reset_data_line(&self) -> Result<(), BusError> {
        self.registers.control1.update(|control| control.set_reset_data(1));
        self.wait_until(Self::TIMEOUT, |registers| registers.control1.get().get_reset_data() == 0)
    }

    /// Drops the pending transfer and clears the data line after a failed data phase, so the
    /// next transfer does not wait on a stuck data inhibit.
    fn abort_data<R>(&mut self, error: BusError) -> Result<R, BusError> {
        self.pending = None;

        if let Err(reset) = self.reset_data_line() {
            warn!("data line reset after {:?} failed: {:?}", error, reset);
        }

        Err(error)
    }

    fn send_command(&self, command: SDCommand, argument: u32) -> Result<u32, BusError> {
        if command.get_is_application_specific() == 1 {
            let relative_address = self.card.map(|card| card.relative_address).unwrap_or(0);
            self.send_command(SDCommand::APPLICATION_SPECIFIC_COMMAND, relative_address)?;
        }

        trace!("cmd{} arg {:#x}", command.get_command_index(), argument);

        self.wait_until(Self::TIMEOUT, |registers| registers.status.get().get_command_inhibit() == 0)?;

        self.registers.interrupt.set(self.registers.interrupt.get());
        self.registers.arg1.set(argument);
        self.registers.command.set(command.set_is_application_specific(0));

        if let Err(error) = self.wait_interrupt(Interrupt::COMMAND_DONE) {
            if error == BusError::Timeout {
                self.reset_command_line()?;
            }
            return Err(error);
        }

        Ok(self.registers.response[0].get())
    }

    fn send_command_long_response(&self, command: SDCommand, argument: u32) -> Result<u128, BusError> {
        self.send_command(command, argument)?;

        let response = [
            self.registers.response[0].get(),
            self.registers.response[1].get(),
            self.registers.response[2].get(),
            self.registers.response[3].get()
        ];

        Ok(long_response(response))
    }

    fn set_clock(&self, frequency: u32) -> Result<(), BusError> {
        self.wait_until(Self::TIMEOUT, |registers| {
            let status = registers.status.get();
            status.get_command_inhibit() == 0 && status.get_data_inhibit() == 0
        })?;

        self.registers.control1.update(|control| control.set_clock_enable(0));
        self.timer.delay_micros(10);

        let host_version = self.registers.slot_interrupt_version.get().get_sd_version();
        let divider = clock_divider(Self::BASE_CLOCK, frequency, host_version);
        debug!("sd clock {}Hz, divider {}", frequency, divider);

        self.registers.control1.update(|control| control
            .set_clock_frequency_low(divider & 0xFF)
            .set_clock_frequency_high(divider >> 8));
        self.timer.delay_micros(10);

        self.registers.control1.update(|control| control.set_clock_enable(1));

        self.wait_until(Self::TIMEOUT, |registers| registers.control1.get().get_clock_stable() == 1)
    }

    fn reset_host(&self) -> Result<(), BusError> {
        self.registers.control0.set(Control0::from_bits(0));
        self.registers.control1.update(|control| control.set_reset_host(1));

        self.wait_until(Self::TIMEOUT, |registers| registers.control1.get().get_reset_host() == 0)?;

        self.registers.control1.update(|control| control
            .set_clock_internal_enable(1)
            .set_data_timeout_unit(0xE));
        self.timer.delay_micros(10);

        Ok(())
    }

    fn read_configuration_register(&self) -> Result<u32, BusError> {
        self.wait_until(Self::TIMEOUT, |registers| registers.status.get().get_data_inhibit() == 0)?;

        self.registers.block_size_and_count.set(BlockSizeAndCount::from_bits(0)
            .set_block_size(8)
            .set_block_count(1));

        self.send_command(SDCommand::SEND_SD_CONFIGURATION_REGISTER, 0)?;
        self.wait_interrupt(Interrupt::READ_READY)?;

        let high = configuration_word(self.registers.data.get());
        let _low = self.registers.data.get();

        self.wait_interrupt(Interrupt::DATA_DONE)?;

        Ok(high)
    }

    fn identify(&mut self) -> Result<Card, BusError> {
        self.send_command(SDCommand::GO_IDLE, 0)?;

        let version2 = match self.send_command(SDCommand::SEND_INTERFACE_CONDITIONS, Self::INTERFACE_CONDITION) {
            Ok(response) if response & Self::INTERFACE_CONDITION_MASK == Self::INTERFACE_CONDITION => true,
            Ok(response) => {
                warn!("card echoed interface condition {:#x}", response);
                return Err(BusError::Unsupported);
            },
            Err(BusError::Timeout) => false,
            Err(error) => return Err(error)
        };

        let argument = if version2 { Self::ACMD41_ARG_HC } else { Self::ACMD41_VOLTAGE };
        let deadline = Deadline::after(&self.timer, Some(Self::OPERATING_CONDITION_TIMEOUT));

        let operating_conditions = loop {
            let response = self.send_command(SDCommand::SEND_OP_COND, argument)?;

            if response & Self::ACMD41_CMD_COMPLETE != 0 {
                break response;
            }

            if deadline.expired(&self.timer) {
                return Err(BusError::Timeout);
            }

            self.timer.delay_millis(10);
        };

        if operating_conditions & Self::ACMD41_VOLTAGE == 0 {
            return Err(BusError::Unsupported);
        }

        let high_capacity = operating_conditions & Self::ACMD41_CMD_CCS != 0;

        self.send_command(SDCommand::SEND_CARD_IDENTIFICATION, 0)?;
        let relative_address = self.send_command(SDCommand::SEND_RELATIVE_ADDRESS, 0)? & Self::RCA_MASK;

        let info = CardInfo::from_csd(self.send_command_long_response(SDCommand::SEND_CARD_SPECIFIC_DATA, relative_address)?)?;

        Ok(Card {
            relative_address,
            high_capacity,
            info
        })
    }

    fn start_transfer(&mut self, command: SDCommand, pending: Pending, byte_offset: u64, block_size: u32, count: u32) -> Result<(), BusError> {
        self.pending = None;
        let card = self.card()?;

        if block_size != Self::BLOCK_SIZE || count == 0 || count > MAX_BLOCKS_PER_COMMAND {
            return Err(BusError::Unsupported);
        }

        let address = if card.high_capacity { byte_offset / Self::BLOCK_SIZE as u64 } else { byte_offset };
        let address = u32::try_from(address).map_err(|_| BusError::Unsupported)?;

        self.wait_until(Self::TIMEOUT, |registers| registers.status.get().get_data_inhibit() == 0)?;

        self.registers.block_size_and_count.set(BlockSizeAndCount::from_bits(0)
            .set_block_size(block_size)
            .set_block_count(count));

        self.send_command(command, address)?;
        self.pending = Some(pending);

        Ok(())
    }

    fn finish_transfer(&mut self, expected: Pending) -> Result<(), BusError> {
        match self.pending.take() {
            Some(pending) if pending == expected => match self.wait_interrupt(Interrupt::DATA_DONE) {
                Ok(()) => Ok(()),
                Err(error) => self.abort_data(error)
            },
            Some(_) => Err(BusError::Data),
            None => Ok(())
        }
    }

    fn read_chunk(&mut self, buffer: &mut [u8], byte_offset: u64, count: u32) -> Result<(), BusError> {
        let command = if count == 1 { SDCommand::READ_SINGLE_BLOCK } else { SDCommand::READ_MULTIPLE_BLOCKS };
        self.start_transfer(command, Pending::Read, byte_offset, Self::BLOCK_SIZE, count)?;

        for block in buffer.chunks_exact_mut(Self::BLOCK_SIZE as usize).take(count as usize) {
            if let Err(error) = self.wait_interrupt(Interrupt::READ_READY) {
                return self.abort_data(error);
            }

            for word in block.chunks_exact_mut(4) {
                word.copy_from_slice(&self.registers.data.get().to_le_bytes());
            }
        }

        Ok(())
    }

    fn write_chunk(&mut self, buffer: &[u8], byte_offset: u64, count: u32) -> Result<(), BusError> {
        let command = if count == 1 { SDCommand::WRITE_SINGLE_BLOCK } else { SDCommand::WRITE_MULTIPLE_BLOCKS };
        self.start_transfer(command, Pending::Write, byte_offset, Self::BLOCK_SIZE, count)?;

        for block in buffer.chunks_exact(Self::BLOCK_SIZE as usize).take(count as usize) {
            if let Err(error) = self.wait_interrupt(Interrupt::WRITE_READY) {
                return self.abort_data(error);
            }

            for word in block.chunks_exact(4) {
                self.registers.data.set(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
            }
        }

        Ok(())
    }
}

impl<'a, T: Timer> SdBus for EMMC<'a, T> {
    fn init(&mut self) -> Result<(), BusError> {
        self.card = None;
        self.pending = None;

        self.reset_host()?;
        self.set_clock(Self::IDENTIFICATION_CLOCK)?;

        self.registers.interrupt_enable.set(0xFFFF_FFFF);
        self.registers.interrupt_mask.set(0xFFFF_FFFF);

        let card = self.identify()?;
        debug!("card identified: rca {:#x}, high capacity {}, {:?}", card.relative_address >> 16, card.high_capacity, card.info);

        self.set_clock(Self::TRANSFER_CLOCK)?;

        self.send_command(SDCommand::CARD_SELECT, card.relative_address)?;
        self.card = Some(card);

        let configuration = self.read_configuration_register()?;

        if supports_four_bit_bus(configuration) {
            self.send_command(SDCommand::SET_BUS_WIDTH, Self::BUS_WIDTH_4)?;
            self.registers.control0.update(|control| control.set_four_bit_data(1));
        }

        if !card.high_capacity {
            self.send_command(SDCommand::SET_BLOCK_LENGTH, Self::BLOCK_SIZE)?;
        }

        Ok(())
    }

    /// Requests longer than the block counter are split into back to back commands. Every
    /// chunk but the last is waited for here; the last one is left for `wait_read`.
    fn read_blocks(&mut self, buffer: &mut [u8], byte_offset: u64, block_size: u32, count: u32) -> Result<(), BusError> {
        if block_size != Self::BLOCK_SIZE || buffer.len() < count as usize * block_size as usize {
            return Err(BusError::Unsupported);
        }

        let chunks = transfer_chunks(byte_offset, block_size, count);
        let last = chunks.len().saturating_sub(1);
        let mut remaining = buffer;

        for (index, (offset, blocks)) in chunks.enumerate() {
            let (chunk, rest) = core::mem::take(&mut remaining).split_at_mut(blocks as usize * block_size as usize);
            remaining = rest;

            self.read_chunk(chunk, offset, blocks)?;

            if index != last {
                self.finish_transfer(Pending::Read)?;
            }
        }

        Ok(())
    }

    fn write_blocks(&mut self, buffer: &[u8], byte_offset: u64, block_size: u32, count: u32) -> Result<(), BusError> {
        if block_size != Self::BLOCK_SIZE || buffer.len() < count as usize * block_size as usize {
            return Err(BusError::Unsupported);
        }

        let chunks = transfer_chunks(byte_offset, block_size, count);
        let last = chunks.len().saturating_sub(1);
        let mut remaining = buffer;

        for (index, (offset, blocks)) in chunks.enumerate() {
            let (chunk, rest) = remaining.split_at(blocks as usize * block_size as usize);
            remaining = rest;

            self.write_chunk(chunk, offset, blocks)?;

            if index != last {
                self.finish_transfer(Pending::Write)?;
            }
        }

        Ok(())
    }

    fn wait_read(&mut self) -> Result<(), BusError> {
        self.finish_transfer(Pending::Read)
    }

    fn wait_write(&mut self) -> Result<(), BusError> {
        self.finish_transfer(Pending::Write)
    }

    fn get_status(&mut self) -> TransferState {
        let card = match self.card {
            Some(card) => card,
            None => return TransferState::Error
        };

        if self.registers.status.get().get_data_inhibit() != 0 {
            return TransferState::Busy;
        }

        match self.send_command(SDCommand::SEND_STATUS, card.relative_address) {
            Ok(status) => transfer_state(status),
            Err(_) => TransferState::Error
        }
    }

    fn card_info(&self) -> CardInfo {
        self.card.map(|card| card.info).unwrap_or_default()
    }
}

/// Largest block count the 16-bit block counter can hold.
const MAX_BLOCKS_PER_COMMAND: u32 = 0xFFFF;

/// Splits `count` blocks into `(byte_offset, blocks)` commands the block counter can carry.
fn transfer_chunks(byte_offset: u64, block_size: u32, count: u32) -> impl ExactSizeIterator<Item = (u64, u32)> {
    let chunk_count = count.div_ceil(MAX_BLOCKS_PER_COMMAND);

    (0..chunk_count).map(move |chunk| {
        let first = chunk * MAX_BLOCKS_PER_COMMAND;
        let blocks = (count - first).min(MAX_BLOCKS_PER_COMMAND);

        (byte_offset + first as u64 * block_size as u64, blocks)
    })
}

/// Reorders the first data word of the SD configuration register. The card sends the
/// register most significant byte first and the data port packs bytes little endian, so
/// the result holds SCR bits 63..32 at bit positions 31..0.
fn configuration_word(data: u32) -> u32 {
    u32::from_be_bytes(data.to_le_bytes())
}

/// SD_BUS_WIDTHS is SCR bits 51..48; bit 50 advertises the 4-bit bus.
fn supports_four_bit_bus(configuration: u32) -> bool {
    const SD_BUS_WIDTH_4: u32 = 1 << (50 - 32);

    configuration & SD_BUS_WIDTH_4 != 0
}

/// Divider for the SD clock, which runs at `base / (2 * divider)`. Hosts before version 3
/// only take powers of two up to 128.
fn clock_divider(base: u32, target: u32, host_version: u32) -> u32 {
    let divider = base.div_ceil(target.max(1)).div_ceil(2);

    if host_version >= SlotInterruptVersion::HOST_SPEC_V3 {
        divider.min(0x3FF)
    } else {
        divider.next_power_of_two().min(0x80)
    }
}

/// Rebuilds a 136-bit response. The controller drops the CRC byte and shifts the rest down
/// by eight bits.
fn long_response(response: [u32; 4]) -> u128 {
    let value = response
        .iter()
        .rev()
        .fold(0u128, |value, &word| (value << 32) | word as u128);

    value << 8
}

/// Maps an R1 card status to the transfer state the adapter polls for.
fn transfer_state(card_status: u32) -> TransferState {
    const TRANSFER: u32 = 4;

    const CARD_STATUS_ERRORS: u32 = 0xFFF9_C004;

    if card_status & CARD_STATUS_ERRORS != 0 {
        return TransferState::Error;
    }

    if (card_status >> 9) & 0xF == TRANSFER {
        TransferState::Ready
    } else {
        TransferState::Busy
    }
}

bitfield! {
    BlockSizeAndCount(u32) {
        block_size: 0-9,
        block_count: 16-31
    }
}

enum AutoCommand {
    CMD12 = 0b01
}

enum ResponseType {
    NoResponse = 0b00,
    Response136Bit = 0b01,
    Response48Bit = 0b10,
    Response48BitUsingBusy = 0b11
}

enum DataDirection {
    HostToCard = 0,
    CardToHost = 1
}

bitfield! {
    SDCommand(u32) {
        enable_block_counter: 1-1,
        auto_command: 2-3,
        data_direction: 4-4,
        multiple_blocks: 5-5,
        response_type: 16-17,
        check_response_crc: 19-19,
        check_response_index: 20-20,
        data_transfer: 21-21,
        command_type: 22-23,
        command_index: 24-29,

        // always write as 0. Useful to store metadata
        is_application_specific: 31-31
    } with {
        const GO_IDLE: Self = Self::with_command_index(0)
            .set_response_type(ResponseType::NoResponse as u32);

        const SEND_CARD_IDENTIFICATION: Self = Self::with_command_index(2)
            .set_response_type(ResponseType::Response136Bit as u32)
            .set_check_response_crc(1);

        const SEND_RELATIVE_ADDRESS: Self = Self::with_command_index(3)
            .set_response_type(ResponseType::Response48Bit as u32);

        const CARD_SELECT: Self = Self::with_command_index(7)
            .set_response_type(ResponseType::Response48BitUsingBusy as u32);

        const SEND_INTERFACE_CONDITIONS: Self = Self::with_command_index(8)
            .set_response_type(ResponseType::Response48Bit as u32);

        const SEND_CARD_SPECIFIC_DATA: Self = Self::with_command_index(9)
            .set_response_type(ResponseType::Response136Bit as u32)
            .set_check_response_crc(1);

        const SEND_STATUS: Self = Self::with_command_index(13)
            .set_response_type(ResponseType::Response48Bit as u32);

        const SET_BLOCK_LENGTH: Self = Self::with_command_index(16)
            .set_response_type(ResponseType::Response48Bit as u32);

        const READ_SINGLE_BLOCK: Self = Self::with_command_index(17)
            .set_response_type(ResponseType::Response48Bit as u32)
            .set_data_direction(DataDirection::CardToHost as u32)
            .set_data_transfer(1);

        const READ_MULTIPLE_BLOCKS: Self = Self::READ_SINGLE_BLOCK
            .set_command_index(18)
            .set_enable_block_counter(1)
            .set_auto_command(AutoCommand::CMD12 as u32)
            .set_multiple_blocks(1);

        const WRITE_SINGLE_BLOCK: Self = Self::with_command_index(24)
            .set_response_type(ResponseType::Response48Bit as u32)
            .set_data_direction(DataDirection::HostToCard as u32)
            .set_data_transfer(1);

        const WRITE_MULTIPLE_BLOCKS: Self = Self::WRITE_SINGLE_BLOCK
            .set_command_index(25)
            .set_enable_block_counter(1)
            .set_auto_command(AutoCommand::CMD12 as u32)
            .set_multiple_blocks(1);

        const APPLICATION_SPECIFIC_COMMAND: Self = Self::with_command_index(55)
            .set_response_type(ResponseType::Response48Bit as u32);

        const SET_BUS_WIDTH: Self = Self::with_command_index(6)
            .set_response_type(ResponseType::Response48Bit as u32)
            .set_is_application_specific(1);

        const SEND_OP_COND: Self = Self::with_command_index(41)
            .set_response_type(ResponseType::Response48Bit as u32)
            .set_is_application_specific(1);

        const SEND_SD_CONFIGURATION_REGISTER: Self = Self::with_command_index(51)
            .set_response_type(ResponseType::Response48Bit as u32)
            .set_data_direction(DataDirection::CardToHost as u32)
            .set_data_transfer(1)
            .set_is_application_specific(1);

        const fn with_command_index(index: u32) -> Self {
            Self::from_bits(0).set_command_index(index)
        }
    }
}

bitfield! {
    Status(u32) {
        command_inhibit: 0-0,
        data_inhibit: 1-1,
        data_active: 2-2,
        write_available: 10-10,
        read_available: 11-11
    }
}

bitfield! {
    Control0(u32) {
        four_bit_data: 1-1
    }
}

bitfield! {
    Control1(u32) {
        clock_internal_enable: 0-0,
        clock_stable: 1-1,
        clock_enable: 2-2,
        clock_frequency_high: 6-7,
        clock_frequency_low: 8-15,
        data_timeout_unit: 16-19,
        reset_host: 24-24,
        reset_command: 25-25,
        reset_data: 26-26
    }
}

bitfield! {
    Interrupt(u32) {
        command_done: 0-0,
        data_done: 1-1,
        write_ready: 4-4,
        read_ready: 5-5,
        error: 15-15,
        command_timeout_error: 16-16,
        command_crc_error: 17-17,
        command_end_error: 18-18,
        command_index_error: 19-19,
        data_timeout_error: 20-20,
        data_crc_error: 21-21,
        data_end_error: 22-22,
        auto_command_error: 24-24
    } with {
        const INTERRUPT_ERROR_MASK: u32 = 0x017F_8000;

        const COMMAND_DONE: Self = Self::from_bits(0).set_command_done(1);
        const DATA_DONE: Self = Self::from_bits(0).set_data_done(1);
        const WRITE_READY: Self = Self::from_bits(0).set_write_ready(1);
        const READ_READY: Self = Self::from_bits(0).set_read_ready(1);

        fn is_err(&self) -> bool {
            self.value & Self::INTERRUPT_ERROR_MASK != 0
        }

        fn is_command_timeout(&self) -> bool {
            self.get_command_timeout_error() != 0
        }

        fn is_data_timeout(&self) -> bool {
            self.get_data_timeout_error() != 0
        }

        fn is_data_error(&self) -> bool {
            self.get_data_crc_error() != 0 || self.get_data_end_error() != 0
        }
    }
}

bitfield! {
    SlotInterruptVersion(u32) {
        slot_status: 0-7,
        sd_version: 16-23,
        vendor: 24-30
    } with {
        const HOST_SPEC_V3: u32 = 2;
    }
}
