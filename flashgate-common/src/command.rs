// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The `upgrade [<part>]` console command.

use heapless::Vec;

use crate::config::UpgradeConfig;
use crate::console::{Console, Tone};
use crate::error::UpgradeError;
use crate::part::{Part, Registry};
use crate::pipeline::{LoadRegion, Loader};
use crate::platform::Platform;
use crate::upgrade::Upgrader;

pub const UPGRADE_COMMAND: &str = "upgrade";
pub const UPGRADE_USAGE: &str = "upgrade [<part>]\r\npart    - upgrade data part\r\n";

/// Maximum number of words on one command line, including the command.
pub const MAX_ARGS: usize = 4;

/// Command result as seen by the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CmdRet {
    Success,
    Failure,
    /// Wrong arguments; the usage text was printed.
    Usage,
}

impl CmdRet {
    pub const fn code(self) -> i32 {
        match self {
            CmdRet::Success => 0,
            CmdRet::Failure => 1,
            CmdRet::Usage => -1,
        }
    }
}

impl<T, E> From<Result<T, E>> for CmdRet {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => CmdRet::Success,
            Err(_) => CmdRet::Failure,
        }
    }
}

/// A tokenized command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str, MAX_ARGS>,
}

impl Invocation<'_> {
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Split a command line on whitespace.
///
/// Returns `None` for a blank line or more than [`MAX_ARGS`] words.
pub fn parse_invocation(line: &str) -> Option<Invocation<'_>> {
    let mut words = line.split_whitespace();
    let name = words.next()?;

    let mut args = Vec::new();
    for word in words {
        args.push(word).ok()?;
    }
    if args.len() >= MAX_ARGS {
        return None;
    }

    Some(Invocation { name, args })
}

/// Entry point of the `upgrade` command.
///
/// `args` are the words after the command name. `parts` is the board's
/// part list for this invocation.
pub fn do_upgrade<C, B>(
    args: &[&str],
    parts: &[Part<'_, C>],
    config: &UpgradeConfig,
    region: LoadRegion<'_>,
    board: &mut B,
) -> CmdRet
where
    B: Console + Loader + Platform + ?Sized,
{
    if args.len() > 1 {
        crate::conprint!(board, "Usage:{}{}", crate::console::NEWLINE, UPGRADE_USAGE);
        return CmdRet::Usage;
    }

    let registry = match Registry::new(parts) {
        Ok(registry) => registry,
        Err(UpgradeError::NotConfigured) => {
            crate::conprintln!(board, "upgrade is not configured!");
            return CmdRet::Failure;
        }
        Err(e) => {
            crate::cprintln!(board, Tone::Error, "*** Bad part table: {} ***", e);
            return CmdRet::Failure;
        }
    };

    let result = Upgrader::new(registry, config, region, board).run(args.first().copied());
    match &result {
        Err(e) if e.after_write() => {
            crate::log::warn!("upgrade failed after the write: {}", e)
        }
        Err(e) => crate::log::warn!("upgrade failed: {}", e),
        Ok(_) => {}
    }
    result.into()
}
