// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot management: console trigger, bank selection, staged bootloader
//! install, and the jump into RAM-resident firmware.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use flashgate_common::image::VectorTable;
use flashgate_common::layout::{
    bank_address, BootSlots, FW_COPY_SIZE, FW_RAM_BASE, RAM_CONSOLE_FLAG_ADDR, RAM_CONSOLE_MAGIC,
};
use flashgate_common::ActionError;

use crate::flash;

/// Read the first two vector table words at `addr`.
unsafe fn read_vector_table(addr: u32) -> VectorTable {
    VectorTable {
        initial_sp: (addr as *const u32).read_volatile(),
        reset_vector: (addr as *const u32).offset(1).read_volatile(),
    }
}

/// Check if the console is requested via GP2 pin (LOW) or RAM magic flag.
pub fn check_console_trigger(gp2_is_low: bool) -> bool {
    let ram_flag = unsafe { (RAM_CONSOLE_FLAG_ADDR as *const u32).read_volatile() };
    unsafe {
        (RAM_CONSOLE_FLAG_ADDR as *mut u32).write_volatile(0);
    }
    gp2_is_low || ram_flag == RAM_CONSOLE_MAGIC
}

/// Validate a firmware bank with full CRC check.
/// Returns false if size == 0 (nothing recorded for the bank).
pub fn validate_bank_with_crc(addr: u32, crc: u32, size: u32) -> bool {
    if size == 0 {
        return false;
    }

    let vt = unsafe { read_vector_table(addr) };
    if !vt.is_valid_for_ram_execution() {
        return false;
    }

    let actual_crc = flash::compute_crc32(addr, size);
    if actual_crc != crc {
        defmt::println!(
            "CRC mismatch at 0x{:08x}: expected 0x{:08x}, got 0x{:08x}",
            addr,
            crc,
            actual_crc
        );
        return false;
    }

    true
}

/// Pick the bank to boot: the active one if intact, otherwise the other.
pub fn select_boot_bank(slots: &BootSlots) -> Option<u8> {
    let primary = slots.active;
    let fallback = toggle_bank(primary);

    for bank in [primary, fallback] {
        let (size, crc) = slots.image(bank);
        if validate_bank_with_crc(bank_address(bank), crc, size) {
            if bank != primary {
                defmt::println!("Primary bank invalid, using fallback");
            }
            return Some(bank);
        }
    }
    None
}

fn toggle_bank(bank: u8) -> u8 {
    if bank == 0 { 1 } else { 0 }
}

/// Install a staged bootloader recorded in `slots`, if any.
///
/// Clears the request before copying so a bad image cannot loop forever.
pub fn install_staged(slots: &BootSlots) {
    if slots.staged == 0 {
        return;
    }

    let sectors = slots.staged_sectors();
    if sectors.is_none() {
        defmt::println!("Staged size {} exceeds the bootloader region, refusing", slots.staged);
    } else {
        defmt::println!("Installing staged bootloader ({} bytes)", slots.staged);
    }

    let mut cleared = *slots;
    cleared.staged = 0;
    unsafe {
        if flash::write_slots(&cleared).is_err() {
            defmt::println!("Could not clear the install request, skipping install");
            return;
        }
        if let Some(sectors) = sectors {
            flash::install_staged_bootloader(sectors)
        }
    }
}

/// Boot the selected bank. Returns only when nothing is bootable.
pub fn boot_active(timer: &mut impl DelayNs) -> Result<Infallible, ActionError> {
    let slots = flash::read_slots();

    defmt::println!(
        "BOOT_SLOTS: bank={}, size_a={}, size_b={}, staged={}",
        slots.active,
        slots.size[0],
        slots.size[1],
        slots.staged
    );

    let bank = select_boot_bank(&slots).ok_or(ActionError::NoImage)?;
    let flash_addr = bank_address(bank);

    defmt::println!(
        "Loading bank {} from 0x{:08x} to 0x{:08x} ({}KB)",
        if bank == 0 { "A" } else { "B" },
        flash_addr,
        FW_RAM_BASE,
        FW_COPY_SIZE / 1024
    );
    defmt::println!("Jumping to firmware...");
    timer.delay_ms(10u32);

    unsafe { load_and_jump(flash_addr) }
}

/// # Safety
/// `flash_addr` must hold a validated firmware image.
pub unsafe fn load_and_jump(flash_addr: u32) -> ! {
    copy_firmware_to_ram(flash_addr);

    // Reset peripherals before jumping so firmware SDK can reinitialize cleanly
    prepare_for_firmware_handoff();

    relocate_vector_table(FW_RAM_BASE);

    let vt = read_vector_table(FW_RAM_BASE);
    jump_to_firmware(vt.initial_sp, vt.reset_vector);
}

/// Prepare the system for firmware handoff.
/// Clocks are left configured; the SDK's runtime_init_clocks switches away
/// from the PLLs before reconfiguring them.
unsafe fn prepare_for_firmware_handoff() {
    cortex_m::interrupt::disable();

    // Clear all pending interrupts in NVIC
    const NVIC_ICPR: *mut u32 = 0xE000_E280 as *mut u32;
    NVIC_ICPR.write_volatile(0xFFFF_FFFF);

    // Disable all NVIC interrupts
    const NVIC_ICER: *mut u32 = 0xE000_E180 as *mut u32;
    NVIC_ICER.write_volatile(0xFFFF_FFFF);
}

unsafe fn copy_firmware_to_ram(flash_addr: u32) {
    core::ptr::copy_nonoverlapping(
        flash_addr as *const u32,
        FW_RAM_BASE as *mut u32,
        FW_COPY_SIZE as usize / 4,
    );
}

unsafe fn relocate_vector_table(ram_base: u32) {
    cortex_m::interrupt::disable();

    const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
    SCB_VTOR.write_volatile(ram_base);

    cortex_m::asm::dsb();
    cortex_m::asm::isb();
}

unsafe fn jump_to_firmware(initial_sp: u32, reset_vector: u32) -> ! {
    core::arch::asm!(
        "msr msp, {sp}",
        "cpsie i",  // Re-enable interrupts before jumping (SDK expects PRIMASK=0)
        "bx {reset}",
        sp = in(reg) initial_sp,
        reset = in(reg) reset_vector,
        options(noreturn)
    );
}

/// Run the normal boot sequence. Returns only when no bank is bootable.
pub fn run_normal_boot(timer: &mut impl DelayNs) {
    defmt::println!("Normal boot path");

    if let Err(e) = boot_active(timer) {
        defmt::println!("No valid firmware ({}), entering console", e);
    }
}
