// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Sanity checks on loaded RP2040 images, run before anything is written.

use crc::{Crc, CRC_32_ISO_HDLC, CRC_32_MPEG_2};

use crate::error::MediumError;
use crate::layout::{RAM_BASE, RAM_END};

/// CRC used for transfers and the boot slot record.
pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// The RP2040 boot ROM checks the second stage bootloader with this CRC.
const BOOT2_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

pub const BOOT2_SIZE: usize = 256;
const BOOT2_CRC_OFFSET: usize = BOOT2_SIZE - 4;

pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Reject images that do not fit in `capacity` bytes.
pub fn check_fits(data: &[u8], capacity: u32) -> Result<(), MediumError> {
    if data.len() > capacity as usize {
        return Err(MediumError::TooLarge);
    }
    Ok(())
}

/// Check the boot2 stage at the start of a bootloader image.
///
/// The first 252 bytes are covered by a CRC-32/MPEG-2 stored little-endian
/// in the last 4 bytes of the 256-byte stage.
pub fn check_boot2(data: &[u8]) -> Result<(), MediumError> {
    let stage = data.get(..BOOT2_SIZE).ok_or(MediumError::Invalid)?;
    let stored = u32::from_le_bytes([
        stage[BOOT2_CRC_OFFSET],
        stage[BOOT2_CRC_OFFSET + 1],
        stage[BOOT2_CRC_OFFSET + 2],
        stage[BOOT2_CRC_OFFSET + 3],
    ]);

    if BOOT2_CRC.checksum(&stage[..BOOT2_CRC_OFFSET]) != stored {
        return Err(MediumError::Invalid);
    }
    Ok(())
}

/// First two words of a Cortex-M vector table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorTable {
    pub initial_sp: u32,
    pub reset_vector: u32,
}

impl VectorTable {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let head = data.get(..8)?;
        Some(Self {
            initial_sp: u32::from_le_bytes([head[0], head[1], head[2], head[3]]),
            reset_vector: u32::from_le_bytes([head[4], head[5], head[6], head[7]]),
        })
    }

    /// Firmware is copied to RAM before it runs, so both the stack top and
    /// the reset handler must point into SRAM.
    pub fn is_valid_for_ram_execution(&self) -> bool {
        let sp_ok = self.initial_sp > RAM_BASE && self.initial_sp <= RAM_END;
        let pc = self.reset_vector & !1; // strip the Thumb bit
        let pc_ok = (RAM_BASE..RAM_END).contains(&pc);
        sp_ok && pc_ok
    }
}

/// Check a firmware image for a bank of `capacity` bytes.
pub fn check_firmware(data: &[u8], capacity: u32) -> Result<(), MediumError> {
    check_fits(data, capacity)?;
    let table = VectorTable::parse(data).ok_or(MediumError::Invalid)?;
    if !table.is_valid_for_ram_execution() {
        return Err(MediumError::Invalid);
    }
    Ok(())
}
