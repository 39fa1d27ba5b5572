// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! flashgate bootloader for RP2040: A/B firmware banks, a USB CDC console,
//! and the `upgrade` command.

#![no_std]
#![no_main]

mod board;
mod boot;
mod flash;
mod loader;
mod media;
mod peripherals;
mod shell;
mod usb_transport;

use defmt_rtt as _;
use embedded_hal::digital::InputPin;
use panic_probe as _;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_GENERIC_03H;

#[entry]
fn main() -> ! {
    defmt::println!("Bootloader init");

    let mut p = peripherals::init();

    peripherals::blink(&mut p.led_pin, &mut p.timer, 3, 200);
    flash::init();

    boot::install_staged(&flash::read_slots());

    let gp2_low = p.gp2.is_low().unwrap_or(false);
    if !boot::check_console_trigger(gp2_low) {
        boot::run_normal_boot(&mut p.timer);
    }

    defmt::println!("Entering console");
    let mut board = board::Board::new(p);
    shell::run(&mut board)
}
