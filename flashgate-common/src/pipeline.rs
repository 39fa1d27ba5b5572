// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Load -> validate -> write.
//!
//! Validation is the only gate between loaded bytes and persistent storage,
//! so nothing is written unless every earlier step succeeded. A failing
//! write is reported as is; retrying or rolling back is left to the
//! operator and the medium.

use crate::console::{Console, Tone};
use crate::error::{LoadError, UpgradeError};
use crate::part::Part;

/// Memory the replacement data is loaded into.
pub struct LoadRegion<'a> {
    /// Address of `buf`, for diagnostics.
    pub addr: u32,
    pub buf: &'a mut [u8],
}

impl<'a> LoadRegion<'a> {
    pub fn new(addr: u32, buf: &'a mut [u8]) -> Self {
        Self { addr, buf }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

/// Source of replacement data (network, serial, ...).
pub trait Loader {
    /// Fill `region` with the data named by `env_name` and return its length.
    fn load(&mut self, region: &mut LoadRegion<'_>, env_name: &str) -> Result<usize, LoadError>;
}

/// Run the pipeline for `part` and return the number of bytes written.
///
/// The written bytes stay in `region.buf[..len]` for the post-action.
pub fn load_validate_write<C, B>(
    part: &Part<'_, C>,
    region: &mut LoadRegion<'_>,
    board: &mut B,
) -> Result<usize, UpgradeError>
where
    B: Console + Loader + ?Sized,
{
    let len = match board.load(region, part.env_name) {
        Ok(len) if len > region.capacity() => Err(LoadError::TooLarge),
        other => other,
    }
    .map_err(|e| {
        crate::cprintln!(board, Tone::Error, "*** Failed to load data: {} ***", e);
        UpgradeError::LoadFailed(e)
    })?;

    board.newline();
    crate::cprintln!(
        board,
        Tone::Prompt,
        "*** Loaded {} (0x{:x}) bytes at 0x{:08x} ***",
        len,
        len,
        region.addr
    );
    board.newline();
    crate::log::info!("loaded {} bytes for {}", len, part.abbr);

    let data = &region.buf[..len];

    if part.validate {
        part.medium
            .validate(&part.context, part, data)
            .map_err(|e| {
                crate::cprintln!(board, Tone::Error, "*** Validation failed: {} ***", e);
                UpgradeError::ValidationFailed(e)
            })?;
    }

    part.medium.write(&part.context, part, data).map_err(|e| {
        crate::cprintln!(board, Tone::Error, "*** Failed to write {}: {} ***", part.name, e);
        UpgradeError::WriteFailed(e)
    })?;

    board.newline();
    crate::cprintln!(board, Tone::Notice, "*** {} upgrade completed! ***", part.name);

    Ok(len)
}
