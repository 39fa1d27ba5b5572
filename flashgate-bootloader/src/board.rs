// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The RP2040 board: upgradeable parts, boot menu, and the console and
//! platform services the upgrade command runs against.

use core::fmt;

use embedded_hal::digital::OutputPin;
use flashgate_common::layout::Target;
use flashgate_common::{
    ActionError, AutoContinueTarget, BootMenuEntry, Console, ExternalAction, Part, Platform,
    PostAction, UpgradeConfig,
};
use heapless::String;
use rp2040_hal as hal;

use crate::media::InternalFlash;
use crate::peripherals::{self, LedPin, Peripherals};
use crate::usb_transport::UsbTransport;

/// Longest command a menu entry or a post-action may queue.
pub const MAX_COMMAND_LEN: usize = 32;

pub const BANK_B_PROMPT: &str = "Make bank B the active image?";

/// After an upgrade that stays in the bootloader, show the boot menu again.
pub const CONFIG: UpgradeConfig = UpgradeConfig {
    auto_continue: AutoContinueTarget::Command("menu"),
    ..UpgradeConfig::DEFAULT
};

pub const MENU: [BootMenuEntry; 6] = [
    BootMenuEntry::new("Startup system (Default)", "boot"),
    BootMenuEntry::new("Upgrade firmware (bank A)", "upgrade fw"),
    BootMenuEntry::new("Upgrade firmware (bank B)", "upgrade fwb"),
    BootMenuEntry::new("Upgrade bootloader", "upgrade bl"),
    BootMenuEntry::new("Upgrade single image", "upgrade simg"),
    BootMenuEntry::new("Reboot", "reset"),
];

/// The parts this board can upgrade, in menu order.
pub fn parts(flash: &InternalFlash) -> [Part<'_, Target>; 4] {
    [
        Part::new("Bootloader", "bl", "bootloader.bin", flash, Target::Bootloader)
            .validated()
            .then(PostAction::Reboot),
        Part::new(
            "Firmware",
            "fw",
            "firmware.bin",
            flash,
            Target::Bank {
                index: 0,
                activate: true,
            },
        )
        .validated()
        .then(PostAction::Boot),
        Part::new(
            "Firmware (bank B)",
            "fwb",
            "firmware.bin",
            flash,
            Target::Bank {
                index: 1,
                activate: false,
            },
        )
        .validated()
        .with_hook()
        .with_custom_action()
        .prompt(BANK_B_PROMPT)
        .then(PostAction::Custom),
        Part::new("Single image", "simg", "image.bin", flash, Target::Image)
            .then(PostAction::Reboot),
    ]
}

pub struct Board {
    pub(crate) usb: UsbTransport,
    pub(crate) timer: hal::Timer,
    pub(crate) led: LedPin,
    next: String<MAX_COMMAND_LEN>,
}

impl Board {
    pub fn new(p: Peripherals) -> Self {
        let Peripherals {
            mut led_pin,
            timer,
            usb,
            ..
        } = p;

        let usb_bus = peripherals::init_usb_bus(usb);
        led_pin.set_high().ok();

        Self {
            usb: UsbTransport::new(usb_bus),
            timer,
            led: led_pin,
            next: String::new(),
        }
    }

    /// Command queued by the last action, if any.
    pub fn take_next(&mut self) -> Option<String<MAX_COMMAND_LEN>> {
        if self.next.is_empty() {
            None
        } else {
            Some(core::mem::take(&mut self.next))
        }
    }

    pub fn queue(&mut self, command: &str) -> Result<(), ActionError> {
        self.next.clear();
        self.next.push_str(command).map_err(|_| ActionError::Failed)
    }

    /// Milliseconds since `start`.
    pub(crate) fn elapsed_ms(&self, start: hal::timer::Instant) -> u64 {
        (self.timer.get_counter() - start).to_millis()
    }
}

impl fmt::Write for Board {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.usb.write_all(s.as_bytes());
        Ok(())
    }
}

impl Console for Board {
    fn getc(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.usb.read_byte() {
                return byte;
            }
        }
    }

    fn tstc(&mut self) -> bool {
        self.usb.has_input()
    }

    fn peek(&mut self) -> Option<u8> {
        self.usb.peek_byte()
    }

    fn delay_ms(&mut self, ms: u32) {
        let start = self.timer.get_counter();
        while self.elapsed_ms(start) < u64::from(ms) {
            self.usb.poll();
        }
    }
}

impl Platform for Board {
    fn run_action(&mut self, action: ExternalAction<'_>) -> Result<(), ActionError> {
        defmt::info!("external action: {}", action);
        match action {
            ExternalAction::Reset => {
                // let queued output reach the host
                self.delay_ms(100);
                cortex_m::peripheral::SCB::sys_reset()
            }
            ExternalAction::BootDefault => {
                self.delay_ms(100);
                match crate::boot::boot_active(&mut self.timer)? {}
            }
            ExternalAction::Command(command) => self.queue(command),
            ExternalAction::EnterConsole => {
                self.next.clear();
                Ok(())
            }
        }
    }
}
