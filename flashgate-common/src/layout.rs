// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash and RAM map of the reference RP2040 board, plus the persistent
//! boot slot record.

use crate::config::resolve_load_addr;

// --- Flash layout constants ---

pub const FLASH_BASE: u32 = 0x1000_0000;
pub const BOOTLOADER_SIZE: u32 = 64 * 1024;
pub const FW_A_ADDR: u32 = 0x1001_0000;
pub const FW_B_ADDR: u32 = 0x100D_0000;
pub const SLOTS_ADDR: u32 = 0x1019_0000;
pub const IMAGE_ADDR: u32 = 0x101A_0000;
/// A new bootloader is written here and installed on the next reset.
pub const STAGING_ADDR: u32 = 0x101E_0000;

pub const FW_BANK_SIZE: u32 = 768 * 1024; // 768KB per bank
pub const IMAGE_SIZE: u32 = 256 * 1024;

pub const FLASH_SECTOR_SIZE: u32 = 4096;
pub const FLASH_PAGE_SIZE: u32 = 256;

// --- RAM layout constants ---

pub const RAM_BASE: u32 = 0x2000_0000;
pub const RAM_END: u32 = 0x2004_2000;

/// Firmware is copied here before it runs.
pub const FW_RAM_BASE: u32 = 0x2000_0000;
pub const FW_COPY_SIZE: u32 = 192 * 1024;

/// The bootloader's own RAM (data, bss and stack).
pub const BOOTLOADER_RAM: u32 = 0x2003_0000;

/// Load address candidates, first one set wins.
pub const SYS_LOAD_ADDR: Option<u32> = Some(0x2000_0000);
pub const LOADADDR: Option<u32> = None;
pub const LOAD_ADDR: u32 = resolve_load_addr(SYS_LOAD_ADDR, LOADADDR);
pub const LOAD_SIZE: usize = 192 * 1024;

pub const RAM_CONSOLE_FLAG_ADDR: u32 = 0x2004_1FF0;
pub const RAM_CONSOLE_MAGIC: u32 = 0x0FDA_7E00;

pub const SLOTS_MAGIC: u32 = 0xB007_DA7A;

const _: () = assert!(LOAD_ADDR as usize + LOAD_SIZE <= BOOTLOADER_RAM as usize);
const _: () = assert!(FW_RAM_BASE + FW_COPY_SIZE <= BOOTLOADER_RAM);
const _: () = assert!(IMAGE_ADDR + IMAGE_SIZE <= STAGING_ADDR);
const _: () = assert!(STAGING_ADDR + BOOTLOADER_SIZE <= FLASH_BASE + 2 * 1024 * 1024);
const _: () = assert!(FW_A_ADDR == FLASH_BASE + BOOTLOADER_SIZE);
const _: () = assert!(FW_B_ADDR == FW_A_ADDR + FW_BANK_SIZE);
const _: () = assert!(SLOTS_ADDR == FW_B_ADDR + FW_BANK_SIZE);

/// Flash region written by one part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    /// The bootloader itself, boot2 included. Written to the staging area
    /// and installed by the next boot.
    Bootloader,
    /// Firmware bank 0 (A) or 1 (B). `activate` makes the bank the boot
    /// default once the write is committed.
    Bank { index: u8, activate: bool },
    /// Raw single image, not executed by the bootloader.
    Image,
}

impl Target {
    pub const fn base(self) -> u32 {
        match self {
            Target::Bootloader => STAGING_ADDR,
            Target::Bank { index, .. } => bank_address(index),
            Target::Image => IMAGE_ADDR,
        }
    }

    pub const fn capacity(self) -> u32 {
        match self {
            Target::Bootloader => BOOTLOADER_SIZE,
            Target::Bank { .. } => FW_BANK_SIZE,
            Target::Image => IMAGE_SIZE,
        }
    }

    /// Offset from the start of flash, as the ROM flash routines expect.
    pub const fn offset(self) -> u32 {
        self.base() - FLASH_BASE
    }
}

/// Get the flash address for a bank.
pub const fn bank_address(bank: u8) -> u32 {
    if bank == 0 {
        FW_A_ADDR
    } else {
        FW_B_ADDR
    }
}

// --- BootSlots (repr(C), 28 bytes) ---

/// Which bank boots, and what was last written to each.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootSlots {
    pub magic: u32, // 0xB007DA7A
    pub active: u8, // 0 = A, 1 = B
    pub _reserved: [u8; 3],
    pub size: [u32; 2], // image size per bank
    pub crc: [u32; 2],  // CRC32 of each bank's image
    pub staged: u32,    // size of a staged bootloader, 0 = none
}

// Compile-time size check
const _: () = assert!(core::mem::size_of::<BootSlots>() == BootSlots::SIZE);

impl BootSlots {
    pub const SIZE: usize = 28;

    pub const fn empty() -> Self {
        Self {
            magic: SLOTS_MAGIC,
            active: 0,
            _reserved: [0; 3],
            size: [0; 2],
            crc: [0; 2],
            staged: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == SLOTS_MAGIC && self.active <= 1
    }

    /// Record a freshly written image in `bank`.
    pub fn record(&mut self, bank: u8, size: u32, crc: u32) {
        let i = usize::from(bank.min(1));
        self.size[i] = size;
        self.crc[i] = crc;
    }

    /// Request installation of a staged bootloader of `size` bytes.
    pub fn stage_bootloader(&mut self, size: u32) {
        self.staged = size;
    }

    pub fn activate(&mut self, bank: u8) {
        self.active = bank.min(1);
    }

    /// Update the record for `data` just written to `target`.
    ///
    /// Returns `false` when the target keeps no record, so there is
    /// nothing to persist.
    pub fn commit(&mut self, target: &Target, data: &[u8]) -> bool {
        match *target {
            Target::Bootloader => self.stage_bootloader(data.len() as u32),
            Target::Bank { index, activate } => {
                self.record(index, data.len() as u32, crate::image::crc32(data));
                if activate {
                    self.activate(index);
                }
            }
            Target::Image => return false,
        }
        true
    }

    /// Sectors to copy for a pending bootloader install.
    ///
    /// `None` when nothing is staged or the recorded size exceeds the
    /// bootloader region.
    pub fn staged_sectors(&self) -> Option<u32> {
        if self.staged == 0 || self.staged > BOOTLOADER_SIZE {
            return None;
        }
        Some(self.staged.div_ceil(FLASH_SECTOR_SIZE))
    }

    /// Size and CRC recorded for `bank`.
    pub fn image(&self, bank: u8) -> (u32, u32) {
        let i = usize::from(bank.min(1));
        (self.size[i], self.crc[i])
    }

    /// Little-endian encoding, as stored in flash.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4] = self.active;
        out[5..8].copy_from_slice(&self._reserved);
        out[8..12].copy_from_slice(&self.size[0].to_le_bytes());
        out[12..16].copy_from_slice(&self.size[1].to_le_bytes());
        out[16..20].copy_from_slice(&self.crc[0].to_le_bytes());
        out[20..24].copy_from_slice(&self.crc[1].to_le_bytes());
        out[24..28].copy_from_slice(&self.staged.to_le_bytes());
        out
    }

    /// Decode a stored record. Erased or foreign content gives `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; Self::SIZE] = bytes.get(..Self::SIZE)?.try_into().ok()?;
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        let slots = Self {
            magic: word(0),
            active: bytes[4],
            _reserved: [bytes[5], bytes[6], bytes[7]],
            size: [word(8), word(12)],
            crc: [word(16), word(20)],
            staged: word(24),
        };
        slots.is_valid().then_some(slots)
    }
}
