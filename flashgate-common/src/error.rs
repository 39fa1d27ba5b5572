// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error types for the upgrade command and its collaborators.

use core::fmt;

/// Failure reported by a [`crate::Loader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// Nothing was received before the loader gave up.
    NoData,
    /// The transport failed mid-transfer.
    Transfer,
    /// The received data did not match its announced checksum.
    Checksum,
    /// The data does not fit into the load region.
    TooLarge,
    /// The sender cancelled the transfer.
    Aborted,
}

/// Failure reported by a [`crate::Medium`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediumError {
    /// Image rejected by validation (bad header, checksum, layout).
    Invalid,
    /// Image larger than the target region.
    TooLarge,
    Erase,
    Program,
    /// Read-back after programming did not match.
    Verify,
    /// The medium does not implement the requested capability.
    Unsupported,
}

/// Failure of an external platform action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionError {
    Unsupported,
    /// No bootable image was found.
    NoImage,
    Failed,
}

/// Which step after the write failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostActionFault {
    /// The part's post-write hook.
    Hook(MediumError),
    /// The confirmed secondary custom action.
    CustomAction(MediumError),
    /// Reset or boot returned instead of transferring control.
    External(ActionError),
}

/// Terminal failure of one `upgrade` invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpgradeError {
    /// The board supplied no upgradeable parts.
    NotConfigured,
    /// Two parts share an abbreviation.
    DuplicatePart,
    InvalidSelection,
    PartNotFound,
    LoadFailed(LoadError),
    ValidationFailed(MediumError),
    WriteFailed(MediumError),
    /// Raised after the write already persisted.
    PostActionFailed(PostActionFault),
}

impl UpgradeError {
    /// True when the target medium may already hold the new content.
    pub fn after_write(&self) -> bool {
        matches!(self, UpgradeError::PostActionFailed(_))
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            LoadError::NoData => "no data received",
            LoadError::Transfer => "transfer error",
            LoadError::Checksum => "checksum mismatch",
            LoadError::TooLarge => "data too large for load region",
            LoadError::Aborted => "transfer aborted",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for MediumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MediumError::Invalid => "invalid image",
            MediumError::TooLarge => "image too large for target",
            MediumError::Erase => "erase failed",
            MediumError::Program => "program failed",
            MediumError::Verify => "verification failed",
            MediumError::Unsupported => "operation not supported",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ActionError::Unsupported => "action not supported",
            ActionError::NoImage => "no bootable image",
            ActionError::Failed => "action failed",
        };
        f.write_str(msg)
    }
}

impl fmt::Display for PostActionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostActionFault::Hook(e) => write!(f, "post-write step: {}", e),
            PostActionFault::CustomAction(e) => write!(f, "custom action: {}", e),
            PostActionFault::External(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for UpgradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeError::NotConfigured => f.write_str("upgrade is not configured"),
            UpgradeError::DuplicatePart => f.write_str("duplicate part abbreviation"),
            UpgradeError::InvalidSelection => f.write_str("invalid selection"),
            UpgradeError::PartNotFound => f.write_str("part not found"),
            UpgradeError::LoadFailed(e) => write!(f, "load failed: {}", e),
            UpgradeError::ValidationFailed(e) => write!(f, "validation failed: {}", e),
            UpgradeError::WriteFailed(e) => write!(f, "write failed: {}", e),
            UpgradeError::PostActionFailed(e) => write!(f, "post-action failed: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UpgradeError {}

#[cfg(feature = "std")]
impl std::error::Error for LoadError {}

#[cfg(feature = "std")]
impl std::error::Error for MediumError {}

#[cfg(feature = "std")]
impl std::error::Error for ActionError {}

#[cfg(feature = "std")]
impl std::error::Error for PostActionFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PostActionFault::Hook(e) | PostActionFault::CustomAction(e) => Some(e),
            PostActionFault::External(e) => Some(e),
        }
    }
}
