// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board actions the upgrade flow can trigger.

use crate::error::ActionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExternalAction<'a> {
    /// Full system reset.
    Reset,
    /// The board's default boot flow.
    BootDefault,
    /// An arbitrary board command, e.g. the boot menu.
    Command(&'a str),
    /// Leave any menu and stay at the command console.
    EnterConsole,
}

pub trait Platform {
    /// Run `action`.
    ///
    /// `Reset` and `BootDefault` do not return when they succeed; getting
    /// `Ok(())` back from them only happens on boards that simulate the
    /// transfer of control.
    fn run_action(&mut self, action: ExternalAction<'_>) -> Result<(), ActionError>;
}
