// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The on-chip QSPI flash as an upgrade medium.

use flashgate_common::image;
use flashgate_common::layout::{Target, FW_COPY_SIZE};
use flashgate_common::{Medium, MediumError, Part};

use crate::flash;

/// Every part of this board lives in the same flash chip; the [`Target`]
/// context picks the region.
pub struct InternalFlash;

impl Medium<Target> for InternalFlash {
    fn validate(
        &self,
        target: &Target,
        _part: &Part<'_, Target>,
        data: &[u8],
    ) -> Result<(), MediumError> {
        match *target {
            Target::Bootloader => {
                image::check_fits(data, target.capacity())?;
                image::check_boot2(data)
            }
            // Banks are copied to RAM before they run
            Target::Bank { .. } => {
                image::check_firmware(data, FW_COPY_SIZE.min(target.capacity()))
            }
            Target::Image => image::check_fits(data, target.capacity()),
        }
    }

    fn write(
        &self,
        target: &Target,
        part: &Part<'_, Target>,
        data: &[u8],
    ) -> Result<(), MediumError> {
        image::check_fits(data, target.capacity())?;
        defmt::info!(
            "writing {} ({} bytes) to 0x{:08x}",
            part.abbr,
            data.len(),
            target.base()
        );
        unsafe { flash::program_region(target.offset(), data)? };

        let mut slots = flash::read_slots();
        if !slots.commit(target, data) {
            return Ok(());
        }
        unsafe { flash::write_slots(&slots) }
    }

    /// Check that the slot record matches what was just written.
    fn post_write_hook(
        &self,
        target: &Target,
        _part: &Part<'_, Target>,
        data: &[u8],
    ) -> Result<(), MediumError> {
        let Target::Bank { index, .. } = *target else {
            return Ok(());
        };
        let recorded = flash::read_slots().image(index);
        if recorded != (data.len() as u32, image::crc32(data)) {
            defmt::warn!("bank {} record does not match the written image", index);
            return Err(MediumError::Verify);
        }
        Ok(())
    }

    fn custom_action(
        &self,
        target: &Target,
        _part: &Part<'_, Target>,
        _data: &[u8],
    ) -> Result<(), MediumError> {
        let Target::Bank { index, .. } = *target else {
            return Err(MediumError::Unsupported);
        };
        let mut slots = flash::read_slots();
        slots.activate(index);
        defmt::info!("bank {} is now active", index);
        unsafe { flash::write_slots(&slots) }
    }
}
