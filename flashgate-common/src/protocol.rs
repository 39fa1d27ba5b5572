// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Loader protocol between the bootloader and the host upload tool.
//!
//! The device announces itself on the text console with
//! [`LOAD_READY_MARKER`], then both sides switch to postcard frames with COBS
//! framing (`0x00` delimited) until the device answers `Loaded` or a final
//! error.
//!
//! This module provides types that work in both `no_std` (embedded) and `std` (host) environments.
//! Use the `std` feature for host tools.

use serde::{Deserialize, Serialize};

/// Maximum data block size for image uploads.
pub const MAX_DATA_BLOCK_SIZE: usize = 1024;

/// Upper bound of one COBS encoded frame, delimiter included.
pub const MAX_FRAME_SIZE: usize = MAX_DATA_BLOCK_SIZE + 32;

/// Start of the line the device prints when its loader is waiting.
pub const LOAD_READY_MARKER: &str = "## flashgate: ready to receive";

/// Prompt printed by the device shell when it waits for a command.
pub const SHELL_PROMPT: &str = "flashgate> ";

/// Parse a ready line into the source id and the maximum size.
///
/// Accepts `## flashgate: ready to receive <env_name> (<max> bytes max)`.
pub fn parse_ready_line(line: &str) -> Option<(&str, usize)> {
    let rest = line.trim().strip_prefix(LOAD_READY_MARKER)?.trim_start();
    let (env_name, rest) = rest.split_once(' ')?;
    let max = rest
        .strip_prefix('(')?
        .strip_suffix(" bytes max)")?
        .parse()
        .ok()?;
    Some((env_name, max))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)] // no_std, no allocator for Box
pub enum Command {
    /// Announce an image of `size` bytes with CRC-32/ISO-HDLC `crc32`.
    Begin { size: u32, crc32: u32 },
    #[cfg(not(feature = "std"))]
    DataBlock {
        offset: u32,
        data: heapless::Vec<u8, MAX_DATA_BLOCK_SIZE>,
    },
    #[cfg(feature = "std")]
    DataBlock {
        offset: u32,
        data: alloc::vec::Vec<u8>,
    },
    Finish,
    Abort,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ack(AckStatus),
    /// The image is complete and its CRC matched.
    Loaded { size: u32, crc32: u32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckStatus {
    Ok,
    CrcError,
    TooLarge,
    BadCommand,
    BadState,
}
