// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Upgradeable part descriptors and the per-invocation registry.
//!
//! A board builds its parts once per invocation, pointing each at the
//! [`Medium`] that stores it. One medium can serve several parts; the
//! part's `context` tells it which region to touch.

use core::fmt;

use crate::error::{MediumError, UpgradeError};

/// What happens after a part was written successfully.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostAction {
    #[default]
    None,
    Reboot,
    Boot,
    Custom,
}

/// Storage backend for one or more parts.
///
/// Every method receives the part's context, the descriptor itself and the
/// loaded bytes. Which of the optional capabilities run is declared on the
/// [`Part`], not discovered here.
pub trait Medium<C> {
    /// Check `data` before anything is written.
    fn validate(&self, ctx: &C, part: &Part<'_, C>, data: &[u8]) -> Result<(), MediumError> {
        let _ = (ctx, part, data);
        Err(MediumError::Unsupported)
    }

    /// Commit `data` to the medium.
    fn write(&self, ctx: &C, part: &Part<'_, C>, data: &[u8]) -> Result<(), MediumError>;

    /// Follow-up work that must happen right after a successful write.
    fn post_write_hook(
        &self,
        ctx: &C,
        part: &Part<'_, C>,
        data: &[u8],
    ) -> Result<(), MediumError> {
        let _ = (ctx, part, data);
        Ok(())
    }

    /// Second operation of a [`PostAction::Custom`] part, run once confirmed.
    fn custom_action(&self, ctx: &C, part: &Part<'_, C>, data: &[u8]) -> Result<(), MediumError> {
        let _ = (ctx, part, data);
        Err(MediumError::Unsupported)
    }
}

/// Descriptor of one upgradeable part.
pub struct Part<'a, C> {
    /// Display name.
    pub name: &'a str,
    /// Token for non-interactive selection, unique within a registry.
    pub abbr: &'a str,
    /// Key handed to the loader to locate the replacement data.
    pub env_name: &'a str,
    pub medium: &'a dyn Medium<C>,
    /// Run [`Medium::validate`] before writing.
    pub validate: bool,
    pub post_action: PostAction,
    /// Run [`Medium::post_write_hook`] after writing.
    pub post_write_hook: bool,
    /// Run [`Medium::custom_action`] once a custom post-action is confirmed.
    pub custom_action: bool,
    /// Confirmation text for [`PostAction::Custom`]; `None` proceeds silently.
    pub custom_prompt: Option<&'a str>,
    pub context: C,
}

impl<'a, C> Part<'a, C> {
    /// A part that is written without validation and has no post-action.
    pub fn new(
        name: &'a str,
        abbr: &'a str,
        env_name: &'a str,
        medium: &'a dyn Medium<C>,
        context: C,
    ) -> Self {
        Self {
            name,
            abbr,
            env_name,
            medium,
            validate: false,
            post_action: PostAction::None,
            post_write_hook: false,
            custom_action: false,
            custom_prompt: None,
            context,
        }
    }

    #[must_use]
    pub fn validated(mut self) -> Self {
        self.validate = true;
        self
    }

    #[must_use]
    pub fn then(mut self, post_action: PostAction) -> Self {
        self.post_action = post_action;
        self
    }

    #[must_use]
    pub fn with_hook(mut self) -> Self {
        self.post_write_hook = true;
        self
    }

    #[must_use]
    pub fn with_custom_action(mut self) -> Self {
        self.custom_action = true;
        self
    }

    #[must_use]
    pub fn prompt(mut self, text: &'a str) -> Self {
        self.custom_prompt = Some(text);
        self
    }
}

impl<C> fmt::Debug for Part<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("name", &self.name)
            .field("abbr", &self.abbr)
            .field("env_name", &self.env_name)
            .field("validate", &self.validate)
            .field("post_action", &self.post_action)
            .field("post_write_hook", &self.post_write_hook)
            .field("custom_action", &self.custom_action)
            .field("custom_prompt", &self.custom_prompt)
            .finish_non_exhaustive()
    }
}

/// Ordered, read-only view of the board's parts for one invocation.
pub struct Registry<'a, C> {
    parts: &'a [Part<'a, C>],
}

impl<C> Clone for Registry<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Registry<'_, C> {}

impl<C> fmt::Debug for Registry<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("parts", &self.parts).finish()
    }
}

impl<'a, C> Registry<'a, C> {
    /// Wrap the board's part list.
    ///
    /// Fails with `NotConfigured` for an empty list and `DuplicatePart` when
    /// two parts share an abbreviation.
    pub fn new(parts: &'a [Part<'a, C>]) -> Result<Self, UpgradeError> {
        if parts.is_empty() {
            return Err(UpgradeError::NotConfigured);
        }

        for (i, part) in parts.iter().enumerate() {
            if parts[i + 1..].iter().any(|other| other.abbr == part.abbr) {
                crate::log::warn!("duplicate part abbreviation {}", part.abbr);
                return Err(UpgradeError::DuplicatePart);
            }
        }

        Ok(Self { parts })
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Part<'a, C>> {
        self.parts.get(index)
    }

    /// Exact match on the abbreviation.
    pub fn find(&self, abbr: &str) -> Option<&'a Part<'a, C>> {
        self.parts.iter().find(|part| part.abbr == abbr)
    }

    pub fn iter(&self) -> core::slice::Iter<'a, Part<'a, C>> {
        self.parts.iter()
    }
}
