// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use flashgate_common::{
    ActionError, Console, ExternalAction, LoadError, LoadRegion, Loader, Medium, MediumError,
    Outcome, Part, Platform, PostAction, Registry, UpgradeConfig, UpgradeError, Upgrader,
};

pub const TEST_LOAD_ADDR: u32 = 0x4600_0000;
pub const TEST_LOAD_SIZE: usize = 4096;

/// Owned copy of an [`ExternalAction`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Reset,
    BootDefault,
    Command(String),
    EnterConsole,
}

impl From<ExternalAction<'_>> for Action {
    fn from(action: ExternalAction<'_>) -> Self {
        match action {
            ExternalAction::Reset => Action::Reset,
            ExternalAction::BootDefault => Action::BootDefault,
            ExternalAction::Command(cmd) => Action::Command(cmd.to_string()),
            ExternalAction::EnterConsole => Action::EnterConsole,
        }
    }
}

// =============================================================================
// MockBoard: console + loader + platform
// =============================================================================

pub struct MockBoard {
    /// Characters returned by `getc`, in order.
    pub input: VecDeque<u8>,
    /// Key that becomes ready on the given `tstc` poll (1-based).
    pub key_at_poll: Option<(usize, u8)>,
    pub output: String,
    pub polls: usize,
    pub delays: Vec<u32>,

    /// Bytes the loader "receives".
    pub image: Result<Vec<u8>, LoadError>,
    /// Length reported instead of the image length.
    pub reported_len: Option<usize>,
    pub loads: Vec<String>,

    pub actions: Vec<Action>,
    pub action_result: Result<(), ActionError>,
}

impl MockBoard {
    pub fn new(image: &[u8]) -> Self {
        Self {
            input: VecDeque::new(),
            key_at_poll: None,
            output: String::new(),
            polls: 0,
            delays: Vec::new(),
            image: Ok(image.to_vec()),
            reported_len: None,
            loads: Vec::new(),
            actions: Vec::new(),
            action_result: Ok(()),
        }
    }

    /// Queue characters for `getc`.
    pub fn typed(mut self, keys: &[u8]) -> Self {
        self.input.extend(keys.iter().copied());
        self
    }

    pub fn failing_load(mut self, err: LoadError) -> Self {
        self.image = Err(err);
        self
    }

    /// Number of `getc` characters not consumed.
    pub fn unread(&self) -> usize {
        self.input.len()
    }
}

impl fmt::Write for MockBoard {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl Console for MockBoard {
    fn getc(&mut self) -> u8 {
        self.input.pop_front().expect("getc called with no input queued")
    }

    fn tstc(&mut self) -> bool {
        self.polls += 1;
        if let Some((poll, key)) = self.key_at_poll {
            if poll == self.polls {
                self.input.push_back(key);
            }
        }
        !self.input.is_empty()
    }

    fn peek(&mut self) -> Option<u8> {
        self.input.front().copied()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn colors(&self) -> bool {
        false
    }
}

impl Loader for MockBoard {
    fn load(&mut self, region: &mut LoadRegion<'_>, env_name: &str) -> Result<usize, LoadError> {
        self.loads.push(env_name.to_string());
        let image = self.image.clone()?;
        let n = image.len().min(region.capacity());
        region.buf[..n].copy_from_slice(&image[..n]);
        Ok(self.reported_len.unwrap_or(image.len()))
    }
}

impl Platform for MockBoard {
    fn run_action(&mut self, action: ExternalAction<'_>) -> Result<(), ActionError> {
        self.actions.push(action.into());
        self.action_result
    }
}

// =============================================================================
// MockMedium: records calls, keeps written bytes
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Validate(u32),
    Write(u32),
    Hook(u32),
    Custom(u32),
}

pub struct MockMedium {
    pub calls: RefCell<Vec<Call>>,
    pub stored: RefCell<Vec<u8>>,
    /// Buffers handed to `post_write_hook`, one per call.
    pub hook_data: RefCell<Vec<Vec<u8>>>,
    /// Buffers handed to `custom_action`, one per call.
    pub custom_data: RefCell<Vec<Vec<u8>>>,
    pub validate_result: Result<(), MediumError>,
    pub write_result: Result<(), MediumError>,
    pub hook_result: Result<(), MediumError>,
    pub custom_result: Result<(), MediumError>,
}

impl Default for MockMedium {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            stored: RefCell::new(Vec::new()),
            hook_data: RefCell::new(Vec::new()),
            custom_data: RefCell::new(Vec::new()),
            validate_result: Ok(()),
            write_result: Ok(()),
            hook_result: Ok(()),
            custom_result: Ok(()),
        }
    }
}

impl MockMedium {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn stored(&self) -> Vec<u8> {
        self.stored.borrow().clone()
    }

    pub fn hook_data(&self) -> Vec<Vec<u8>> {
        self.hook_data.borrow().clone()
    }

    pub fn custom_data(&self) -> Vec<Vec<u8>> {
        self.custom_data.borrow().clone()
    }
}

impl Medium<u32> for MockMedium {
    fn validate(&self, ctx: &u32, _part: &Part<'_, u32>, _data: &[u8]) -> Result<(), MediumError> {
        self.calls.borrow_mut().push(Call::Validate(*ctx));
        self.validate_result
    }

    fn write(&self, ctx: &u32, _part: &Part<'_, u32>, data: &[u8]) -> Result<(), MediumError> {
        self.calls.borrow_mut().push(Call::Write(*ctx));
        self.write_result?;
        *self.stored.borrow_mut() = data.to_vec();
        Ok(())
    }

    fn post_write_hook(
        &self,
        ctx: &u32,
        _part: &Part<'_, u32>,
        data: &[u8],
    ) -> Result<(), MediumError> {
        self.calls.borrow_mut().push(Call::Hook(*ctx));
        self.hook_data.borrow_mut().push(data.to_vec());
        self.hook_result
    }

    fn custom_action(
        &self,
        ctx: &u32,
        _part: &Part<'_, u32>,
        data: &[u8],
    ) -> Result<(), MediumError> {
        self.calls.borrow_mut().push(Call::Custom(*ctx));
        self.custom_data.borrow_mut().push(data.to_vec());
        self.custom_result
    }
}

/// A medium with only the required `write`.
#[derive(Default)]
pub struct WriteOnlyMedium {
    pub writes: RefCell<usize>,
}

impl Medium<u32> for WriteOnlyMedium {
    fn write(&self, _ctx: &u32, _part: &Part<'_, u32>, _data: &[u8]) -> Result<(), MediumError> {
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const FIP_PROMPT: &str = "Restore default boot configuration?";

/// Part table of a typical board: every post-action kind once.
///
/// Contexts: bl2 = 0, fip = 1, fw = 2, simg = 3.
pub fn board_parts(medium: &MockMedium) -> Vec<Part<'_, u32>> {
    vec![
        Part::new("BL2", "bl2", "bootfile.bl2", medium, 0u32)
            .validated()
            .then(PostAction::Reboot),
        Part::new("FIP", "fip", "bootfile.fip", medium, 1u32)
            .validated()
            .then(PostAction::Custom)
            .with_hook()
            .with_custom_action()
            .prompt(FIP_PROMPT),
        Part::new("Firmware", "fw", "bootfile", medium, 2u32)
            .validated()
            .then(PostAction::Boot),
        Part::new("Single image", "simg", "bootfile.simg", medium, 3u32),
    ]
}

pub fn config() -> UpgradeConfig {
    UpgradeConfig::DEFAULT
}

pub fn image(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Run one `upgrade` invocation over `parts` with a fresh load buffer.
pub fn run_upgrade(
    parts: &[Part<'_, u32>],
    config: &UpgradeConfig,
    board: &mut MockBoard,
    abbr: Option<&str>,
) -> Result<Outcome, UpgradeError> {
    let registry = Registry::new(parts)?;
    let mut buf = vec![0u8; TEST_LOAD_SIZE];
    let region = LoadRegion::new(TEST_LOAD_ADDR, &mut buf);
    Upgrader::new(registry, config, region, board).run(abbr)
}
