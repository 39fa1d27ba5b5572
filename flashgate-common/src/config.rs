// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board policy for the `upgrade` command.

/// Seconds shown by the continuation countdown.
pub const DEFAULT_COUNTDOWN_SECS: u8 = 5;

/// Length of one countdown tick.
pub const DEFAULT_TICK_MS: u32 = 1000;

/// What happens when the continuation countdown expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutoContinueTarget {
    /// Return to whatever invoked the command (usually the boot menu).
    ReturnToCaller,
    /// Run a board command, e.g. the boot menu.
    Command(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpgradeConfig {
    /// Ask the post-action question before loading instead of after writing.
    pub prompt_before_load: bool,
    /// Ask before rebooting or booting; when false these run unconditionally.
    pub confirm_post_action: bool,
    pub auto_continue: AutoContinueTarget,
    pub countdown_secs: u8,
    pub tick_ms: u32,
}

impl UpgradeConfig {
    pub const DEFAULT: Self = Self {
        prompt_before_load: false,
        confirm_post_action: true,
        auto_continue: AutoContinueTarget::ReturnToCaller,
        countdown_secs: DEFAULT_COUNTDOWN_SECS,
        tick_ms: DEFAULT_TICK_MS,
    };
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pick the data load address: `SYS_LOAD_ADDR` first, then `LOADADDR`.
///
/// Meant for `const` items, where a board with neither set fails to build.
pub const fn resolve_load_addr(sys_load_addr: Option<u32>, loadaddr: Option<u32>) -> u32 {
    match (sys_load_addr, loadaddr) {
        (Some(addr), _) => addr,
        (None, Some(addr)) => addr,
        (None, None) => panic!("neither SYS_LOAD_ADDR nor LOADADDR is configured"),
    }
}
