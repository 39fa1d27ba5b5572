// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot menu: entries, their consistency with the part registry, and the
//! one-key selection prompt.

use crate::command::{parse_invocation, UPGRADE_COMMAND};
use crate::console::{Console, Tone};
use crate::part::Registry;
use crate::select::digit_index;

/// Printed when the menu waits for a choice.
pub const MENU_PROMPT: &str = "Select an entry: ";

/// One line of the boot menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootMenuEntry {
    pub desc: &'static str,
    pub command: &'static str,
}

impl BootMenuEntry {
    pub const fn new(desc: &'static str, command: &'static str) -> Self {
        Self { desc, command }
    }
}

/// The abbreviation named by an `upgrade <abbr>` command, if it is one.
pub fn upgrade_target(command: &str) -> Option<&str> {
    let invocation = parse_invocation(command)?;
    if !invocation.is(UPGRADE_COMMAND) {
        return None;
    }
    invocation.args.first().copied()
}

/// Return the first entry whose `upgrade` command names a missing part.
pub fn check_entries<'e, C>(
    entries: &'e [BootMenuEntry],
    registry: &Registry<'_, C>,
) -> Result<(), &'e BootMenuEntry> {
    for entry in entries {
        if let Some(abbr) = upgrade_target(entry.command) {
            if registry.find(abbr).is_none() {
                return Err(entry);
            }
        }
    }
    Ok(())
}

/// Print the menu and read one choice. Enter picks the first entry.
pub fn choose<'e, IO: Console + ?Sized>(
    entries: &'e [BootMenuEntry],
    console: &mut IO,
) -> Option<&'e BootMenuEntry> {
    console.newline();
    for (i, entry) in entries.iter().enumerate() {
        crate::conprintln!(console, "  {}. {}", i, entry.desc);
    }
    console.newline();
    crate::cprint!(console, Tone::Prompt, "{}", MENU_PROMPT);

    let c = console.getc();
    let index = match c {
        b'\r' | b'\n' => Some(0),
        c => digit_index(c, entries.len()),
    };
    match index {
        Some(i) => {
            crate::conprintln!(console, "{}", i);
            entries.get(i)
        }
        None => {
            console.newline();
            crate::cprintln!(console, Tone::Error, "*** Invalid entry! ***");
            None
        }
    }
}
