// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Upgrade orchestration shared by the flashgate bootloader and host tools.
//!
//! The crate is `no_std` by default so boards can link it directly:
//! - Default: `no_std`, no logging
//! - `std` feature: host-side types (`Vec` payloads, `std::error::Error`)
//! - `defmt` feature: internal logging and `defmt::Format` on public types
//!
//! The `upgrade` command is assembled from small stages: [`select`] resolves
//! a [`part::Part`], [`pipeline`] loads, validates and writes it,
//! [`post_action`] decides what happens next and [`gate`] runs the final
//! countdown. [`upgrade::Upgrader`] ties them together.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate alloc;

mod log;

pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod gate;
pub mod image;
pub mod layout;
pub mod menu;
pub mod part;
pub mod pipeline;
pub mod platform;
pub mod post_action;
pub mod protocol;
pub mod select;
pub mod transfer;
pub mod upgrade;

// Re-export commonly used types
pub use command::{do_upgrade, CmdRet};
pub use config::{AutoContinueTarget, UpgradeConfig};
pub use console::{Console, Tone};
pub use error::{ActionError, LoadError, MediumError, PostActionFault, UpgradeError};
pub use gate::{GateOutcome, GateState};
pub use menu::BootMenuEntry;
pub use part::{Medium, Part, PostAction, Registry};
pub use pipeline::{LoadRegion, Loader};
pub use platform::{ExternalAction, Platform};
pub use upgrade::{Outcome, Redirect, Upgrader};
