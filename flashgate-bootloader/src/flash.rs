// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash read/write/erase wrappers using RP2040 ROM routines.
//!
//! On RP2040, flash operations (erase/program) require disabling XIP first.
//! The full sequence is:
//!   1. connect_internal_flash()
//!   2. flash_exit_xip()
//!   3. flash_range_erase() or flash_range_program()
//!   4. flash_flush_cache()
//!   5. flash_enter_cmd_xip()
//!
//! All code executing during steps 1-5 must run from RAM, not flash.
//! Critical functions live in `.data` and the ROM function pointers are
//! resolved once at init time.

use flashgate_common::image::CRC32;
use flashgate_common::layout::{
    BootSlots, FLASH_BASE, FLASH_PAGE_SIZE, FLASH_SECTOR_SIZE, SLOTS_ADDR, STAGING_ADDR,
};
use flashgate_common::MediumError;

// ROM function pointer types
type RomFnVoid = unsafe extern "C" fn();
type RomFnErase = unsafe extern "C" fn(u32, usize, u32, u8);
type RomFnProgram = unsafe extern "C" fn(u32, *const u8, usize);

/// ROM function pointers, resolved once at init from the ROM table.
/// Stored in static RAM so RAM-resident functions can call them without
/// accessing flash-based code.
static mut ROM_CONNECT_INTERNAL_FLASH: RomFnVoid = dummy_void;
static mut ROM_FLASH_EXIT_XIP: RomFnVoid = dummy_void;
static mut ROM_FLASH_RANGE_ERASE: RomFnErase = dummy_erase;
static mut ROM_FLASH_RANGE_PROGRAM: RomFnProgram = dummy_program;
static mut ROM_FLASH_FLUSH_CACHE: RomFnVoid = dummy_void;
static mut ROM_FLASH_ENTER_CMD_XIP: RomFnVoid = dummy_void;

unsafe extern "C" fn dummy_void() {}
unsafe extern "C" fn dummy_erase(_: u32, _: usize, _: u32, _: u8) {}
unsafe extern "C" fn dummy_program(_: u32, _: *const u8, _: usize) {}

/// Sector copy buffer for [`install_staged_bootloader`].
static mut SECTOR_BUF: [u8; FLASH_SECTOR_SIZE as usize] = [0; FLASH_SECTOR_SIZE as usize];

/// Look up a ROM function by its two-character tag.
/// ROM table pointer at 0x14 and lookup function at 0x18 are 16-bit halfword pointers.
unsafe fn rom_func_lookup(tag: &[u8; 2]) -> usize {
    let fn_table = *(0x14 as *const u16) as *const u16;
    let lookup: unsafe extern "C" fn(*const u16, u32) -> usize =
        core::mem::transmute::<usize, unsafe extern "C" fn(*const u16, u32) -> usize>(
            *(0x18 as *const u16) as usize,
        );
    let code = u16::from_le_bytes(*tag) as u32;
    lookup(fn_table, code)
}

/// Initialize ROM flash function pointers. Must be called once before any flash operations.
pub fn init() {
    unsafe {
        ROM_CONNECT_INTERNAL_FLASH =
            core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"IF"));
        ROM_FLASH_EXIT_XIP = core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"EX"));
        ROM_FLASH_RANGE_ERASE =
            core::mem::transmute::<usize, RomFnErase>(rom_func_lookup(b"RE"));
        ROM_FLASH_RANGE_PROGRAM =
            core::mem::transmute::<usize, RomFnProgram>(rom_func_lookup(b"RP"));
        ROM_FLASH_FLUSH_CACHE = core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"FC"));
        ROM_FLASH_ENTER_CMD_XIP =
            core::mem::transmute::<usize, RomFnVoid>(rom_func_lookup(b"CX"));
    }
}

/// Convert an absolute XIP flash address to a flash-relative offset.
pub fn addr_to_offset(abs_addr: u32) -> u32 {
    abs_addr - FLASH_BASE
}

/// Erase flash at the given flash-relative offset.
///
/// # Safety
/// The `init()` function must have been called first.
#[link_section = ".data"]
#[inline(never)]
pub unsafe fn flash_erase(offset: u32, size: u32) {
    cortex_m::interrupt::disable();
    ROM_CONNECT_INTERNAL_FLASH();
    ROM_FLASH_EXIT_XIP();
    ROM_FLASH_RANGE_ERASE(offset, size as usize, FLASH_SECTOR_SIZE, 0x20);
    ROM_FLASH_FLUSH_CACHE();
    ROM_FLASH_ENTER_CMD_XIP();
    cortex_m::interrupt::enable();
}

/// Program flash at the given flash-relative offset.
///
/// # Safety
/// The `init()` function must have been called first. `data` must not
/// point into flash.
#[link_section = ".data"]
#[inline(never)]
pub unsafe fn flash_program(offset: u32, data: *const u8, len: usize) {
    cortex_m::interrupt::disable();
    ROM_CONNECT_INTERNAL_FLASH();
    ROM_FLASH_EXIT_XIP();
    ROM_FLASH_RANGE_PROGRAM(offset, data, len);
    ROM_FLASH_FLUSH_CACHE();
    ROM_FLASH_ENTER_CMD_XIP();
    cortex_m::interrupt::enable();
}

/// Read bytes from an absolute XIP flash address via volatile reads.
pub fn flash_read(abs_addr: u32, buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = unsafe { ((abs_addr + i as u32) as *const u8).read_volatile() };
    }
}

/// Compute CRC-32 (ISO HDLC) over flash data at the given absolute address.
pub fn compute_crc32(abs_addr: u32, size: u32) -> u32 {
    let mut digest = CRC32.digest();
    let mut remaining = size as usize;
    let mut addr = abs_addr;
    let mut chunk = [0u8; 256];

    while remaining > 0 {
        let n = remaining.min(chunk.len());
        flash_read(addr, &mut chunk[..n]);
        digest.update(&chunk[..n]);
        addr += n as u32;
        remaining -= n;
    }

    digest.finalize()
}

/// Erase the sectors covering `data` at `offset`, program it and check the
/// result against a CRC of the source.
///
/// # Safety
/// The `init()` function must have been called first. `data` must live in RAM.
pub unsafe fn program_region(offset: u32, data: &[u8]) -> Result<(), MediumError> {
    let len = data.len() as u32;
    let erase_size = len.div_ceil(FLASH_SECTOR_SIZE) * FLASH_SECTOR_SIZE;
    flash_erase(offset, erase_size);

    let page = FLASH_PAGE_SIZE as usize;
    let whole = data.len() / page * page;
    if whole > 0 {
        flash_program(offset, data.as_ptr(), whole);
    }

    let tail = &data[whole..];
    if !tail.is_empty() {
        let mut last = [0xFFu8; FLASH_PAGE_SIZE as usize];
        last[..tail.len()].copy_from_slice(tail);
        flash_program(offset + whole as u32, last.as_ptr(), page);
    }

    let written = compute_crc32(FLASH_BASE + offset, len);
    if written != CRC32.checksum(data) {
        defmt::println!("Readback CRC mismatch at offset 0x{:08x}", offset);
        return Err(MediumError::Verify);
    }
    Ok(())
}

/// Read the slot record. Erased or corrupt flash reads as empty slots.
pub fn read_slots() -> BootSlots {
    let mut raw = [0u8; BootSlots::SIZE];
    flash_read(SLOTS_ADDR, &mut raw);
    BootSlots::from_bytes(&raw).unwrap_or(BootSlots::empty())
}

/// Write the slot record (erase sector, then program padded to a 256B page).
///
/// # Safety
/// The `init()` function must have been called first.
pub unsafe fn write_slots(slots: &BootSlots) -> Result<(), MediumError> {
    let offset = addr_to_offset(SLOTS_ADDR);
    flash_erase(offset, FLASH_SECTOR_SIZE);

    let mut page = [0xFFu8; FLASH_PAGE_SIZE as usize];
    page[..BootSlots::SIZE].copy_from_slice(&slots.to_bytes());
    flash_program(offset, page.as_ptr(), page.len());

    if read_slots() != *slots {
        return Err(MediumError::Verify);
    }
    Ok(())
}

/// Copy `sectors` sectors from the staging area over the start of flash,
/// then reset the chip.
///
/// Everything this touches after the first erase lives in RAM: the loop is
/// free of calls into flash, and the reset goes straight to AIRCR.
///
/// # Safety
/// The `init()` function must have been called first and the staging area
/// must hold a complete bootloader image.
#[link_section = ".data"]
#[inline(never)]
pub unsafe fn install_staged_bootloader(sectors: u32) -> ! {
    const SCB_AIRCR: *mut u32 = 0xE000_ED0C as *mut u32;
    const AIRCR_SYSRESETREQ: u32 = 0x05FA_0004;

    cortex_m::interrupt::disable();
    let buf = core::ptr::addr_of_mut!(SECTOR_BUF) as *mut u8;

    let mut sector = 0;
    while sector < sectors {
        let offset = sector * FLASH_SECTOR_SIZE;
        let src = (STAGING_ADDR + offset) as *const u8;

        let mut i = 0;
        while i < FLASH_SECTOR_SIZE as usize {
            buf.add(i).write_volatile(src.add(i).read_volatile());
            i += 1;
        }

        ROM_CONNECT_INTERNAL_FLASH();
        ROM_FLASH_EXIT_XIP();
        ROM_FLASH_RANGE_ERASE(offset, FLASH_SECTOR_SIZE as usize, FLASH_SECTOR_SIZE, 0x20);
        ROM_FLASH_RANGE_PROGRAM(offset, buf, FLASH_SECTOR_SIZE as usize);
        ROM_FLASH_FLUSH_CACHE();
        ROM_FLASH_ENTER_CMD_XIP();

        sector += 1;
    }

    SCB_AIRCR.write_volatile(AIRCR_SYSRESETREQ);
    loop {
        core::hint::spin_loop();
    }
}
