// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Post-action state machine: what happens once a part has been written.
//!
//! The action kind is fixed per part. Only the confirmation step is decided
//! at runtime, and a declined `Reboot` or `Boot` behaves like `None`.

use crate::config::UpgradeConfig;
use crate::console::{confirm, Console, Tone};
use crate::error::{PostActionFault, UpgradeError};
use crate::part::{Part, PostAction};
use crate::platform::{ExternalAction, Platform};

pub const REBOOT_PROMPT: &str = "Reboot after upgrading?";
pub const BOOT_PROMPT: &str = "Run image after upgrading?";

/// Control transferred away by a post-action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Redirect {
    Reset,
    Boot,
}

/// Result of executing the post-action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// Nothing took over; the continuation gate runs next.
    Continue,
    Redirected(Redirect),
}

/// The question to ask before the post-action, if any.
pub fn prompt_text<'a, C>(part: &Part<'a, C>, config: &UpgradeConfig) -> Option<&'a str> {
    match part.post_action {
        PostAction::None => None,
        PostAction::Reboot if config.confirm_post_action => Some(REBOOT_PROMPT),
        PostAction::Boot if config.confirm_post_action => Some(BOOT_PROMPT),
        PostAction::Reboot | PostAction::Boot => None,
        PostAction::Custom => part.custom_prompt,
    }
}

/// Ask for confirmation when the part calls for it. No prompt means yes.
pub fn decide<C, IO: Console + ?Sized>(
    part: &Part<'_, C>,
    config: &UpgradeConfig,
    console: &mut IO,
) -> bool {
    match prompt_text(part, config) {
        Some(text) => {
            console.newline();
            let confirmed = confirm(console, text);
            crate::log::debug!("{} confirmed: {}", text, confirmed);
            confirmed
        }
        None => true,
    }
}

/// Run the part's post-write hook, if it declares one.
///
/// For `Custom` parts the hook's result decides the command's result even
/// though the write already persisted. For other kinds a failing hook is
/// only reported.
pub fn run_hook<C, IO: Console + ?Sized>(
    part: &Part<'_, C>,
    data: &[u8],
    console: &mut IO,
) -> Result<(), UpgradeError> {
    if !part.post_write_hook {
        return Ok(());
    }

    match part.medium.post_write_hook(&part.context, part, data) {
        Ok(()) => Ok(()),
        Err(e) if part.post_action == PostAction::Custom => {
            crate::cprintln!(
                console,
                Tone::Error,
                "*** Post-write step for {} failed: {} ***",
                part.name,
                e
            );
            Err(UpgradeError::PostActionFailed(PostActionFault::Hook(e)))
        }
        Err(e) => {
            crate::cprintln!(
                console,
                Tone::Error,
                "*** Warning: post-write step for {} failed: {} ***",
                part.name,
                e
            );
            crate::log::warn!("ignoring hook failure for {}", part.abbr);
            Ok(())
        }
    }
}

/// Carry out the part's post-action given the confirmation result.
pub fn execute<C, B>(
    part: &Part<'_, C>,
    confirmed: bool,
    data: &[u8],
    board: &mut B,
) -> Result<Resolution, UpgradeError>
where
    B: Console + Platform + ?Sized,
{
    match part.post_action {
        PostAction::None => Ok(Resolution::Continue),
        PostAction::Reboot if confirmed => {
            crate::conprintln!(board, "Resetting ...");
            transfer(board, ExternalAction::Reset, Redirect::Reset)
        }
        PostAction::Boot if confirmed => {
            crate::conprintln!(board, "Starting image ...");
            transfer(board, ExternalAction::BootDefault, Redirect::Boot)
        }
        PostAction::Reboot | PostAction::Boot => Ok(Resolution::Continue),
        PostAction::Custom => {
            if part.custom_action && confirmed {
                part.medium
                    .custom_action(&part.context, part, data)
                    .map_err(|e| {
                        crate::cprintln!(board, Tone::Error, "*** Custom action failed: {} ***", e);
                        UpgradeError::PostActionFailed(PostActionFault::CustomAction(e))
                    })?;
            }
            Ok(Resolution::Continue)
        }
    }
}

fn transfer<B>(
    board: &mut B,
    action: ExternalAction<'_>,
    redirect: Redirect,
) -> Result<Resolution, UpgradeError>
where
    B: Console + Platform + ?Sized,
{
    match board.run_action(action) {
        Ok(()) => Ok(Resolution::Redirected(redirect)),
        Err(e) => {
            crate::cprintln!(board, Tone::Error, "*** {:?} failed: {} ***", redirect, e);
            Err(UpgradeError::PostActionFailed(PostActionFault::External(e)))
        }
    }
}
