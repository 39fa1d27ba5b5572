// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Part selection: interactive by index, or by abbreviation.

use crate::console::{Console, Tone};
use crate::error::UpgradeError;
use crate::part::{Part, Registry};

/// Map a typed character to a part index.
///
/// Only single digits are accepted, so at most ten parts can be picked
/// interactively.
pub fn digit_index(c: u8, count: usize) -> Option<usize> {
    if !c.is_ascii_digit() {
        return None;
    }
    let index = (c - b'0') as usize;
    (index < count).then_some(index)
}

/// Print `index - name` for every part.
pub fn list_parts<C, IO: Console + ?Sized>(registry: Registry<'_, C>, console: &mut IO) {
    console.newline();
    crate::cprintln!(console, Tone::Prompt, "Available parts for upgrading:");
    for (i, part) in registry.iter().enumerate() {
        crate::conprintln!(console, "    {} - {}", i, part.name);
    }
}

/// Ask the operator to pick a part by its index.
pub fn select_interactive<'a, C, IO: Console + ?Sized>(
    registry: Registry<'a, C>,
    console: &mut IO,
) -> Result<&'a Part<'a, C>, UpgradeError> {
    list_parts(registry, console);

    // Exits on the first character that is not a line ending.
    let c = loop {
        console.newline();
        crate::cprint!(console, Tone::Prompt, "Select a part:");
        crate::conprint!(console, " ");

        let c = console.getc();
        if c == b'\r' || c == b'\n' {
            continue;
        }

        crate::conprintln!(console, "{}", c as char);
        break c;
    };

    match digit_index(c, registry.len()).and_then(|i| registry.get(i)) {
        Some(part) => Ok(part),
        None => {
            crate::cprintln!(console, Tone::Error, "*** Invalid selection! ***");
            Err(UpgradeError::InvalidSelection)
        }
    }
}

/// Look a part up by abbreviation.
pub fn find_part<'a, C, IO: Console + ?Sized>(
    registry: Registry<'a, C>,
    abbr: &str,
    console: &mut IO,
) -> Result<&'a Part<'a, C>, UpgradeError> {
    if let Some(part) = registry.find(abbr) {
        return Ok(part);
    }

    crate::cprintln!(console, Tone::Error, "*** Invalid upgrade part '{}'! ***", abbr);
    crate::conprint!(console, "Valid parts:");
    for part in registry.iter() {
        crate::conprint!(console, " {}", part.abbr);
    }
    console.newline();

    Err(UpgradeError::PartNotFound)
}

/// Interactive selection without an argument, lookup otherwise.
pub fn resolve<'a, C, IO: Console + ?Sized>(
    registry: Registry<'a, C>,
    abbr: Option<&str>,
    console: &mut IO,
) -> Result<&'a Part<'a, C>, UpgradeError> {
    match abbr {
        Some(abbr) => find_part(registry, abbr, console),
        None => select_interactive(registry, console),
    }
}
