// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! One `upgrade` invocation, from part selection to the continuation gate.

use crate::config::{AutoContinueTarget, UpgradeConfig};
use crate::console::{Console, Tone};
use crate::error::UpgradeError;
use crate::gate::{self, GateOutcome};
use crate::part::Registry;
use crate::pipeline::{self, LoadRegion, Loader};
use crate::platform::{ExternalAction, Platform};
use crate::post_action::{self, Resolution};
use crate::select;

pub use crate::post_action::Redirect;

/// How a successful invocation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The continuation gate ran and ended this way.
    Continued(GateOutcome),
    /// A reset or boot took over.
    Redirected(Redirect),
}

/// Everything one invocation needs, passed in by the board.
pub struct Upgrader<'a, C, B: ?Sized> {
    registry: Registry<'a, C>,
    config: &'a UpgradeConfig,
    region: LoadRegion<'a>,
    board: &'a mut B,
}

impl<'a, C, B> Upgrader<'a, C, B>
where
    B: Console + Loader + Platform + ?Sized,
{
    pub fn new(
        registry: Registry<'a, C>,
        config: &'a UpgradeConfig,
        region: LoadRegion<'a>,
        board: &'a mut B,
    ) -> Self {
        Self {
            registry,
            config,
            region,
            board,
        }
    }

    /// Upgrade the part named `abbr`, or ask for one when `None`.
    pub fn run(&mut self, abbr: Option<&str>) -> Result<Outcome, UpgradeError> {
        let part = select::resolve(self.registry, abbr, &mut *self.board)?;

        self.board.newline();
        crate::cprintln!(self.board, Tone::Prompt, "*** Upgrading {} ***", part.name);
        self.board.newline();
        crate::log::info!("upgrading {}", part.abbr);

        let early_decision = if self.config.prompt_before_load {
            Some(post_action::decide(part, self.config, &mut *self.board))
        } else {
            None
        };

        let len = pipeline::load_validate_write(part, &mut self.region, &mut *self.board)?;
        let data = &self.region.buf[..len];

        post_action::run_hook(part, data, &mut *self.board)?;

        let confirmed = match early_decision {
            Some(confirmed) => confirmed,
            None => post_action::decide(part, self.config, &mut *self.board),
        };

        match post_action::execute(part, confirmed, data, &mut *self.board)? {
            Resolution::Redirected(redirect) => Ok(Outcome::Redirected(redirect)),
            Resolution::Continue => {
                let outcome =
                    gate::run_gate(&mut *self.board, self.config.countdown_secs, self.config.tick_ms);
                self.continue_after(outcome);
                Ok(Outcome::Continued(outcome))
            }
        }
    }

    fn continue_after(&mut self, outcome: GateOutcome) {
        let action = match (outcome, self.config.auto_continue) {
            (GateOutcome::Interactive, _) => ExternalAction::EnterConsole,
            (GateOutcome::AutoContinue, AutoContinueTarget::Command(cmd)) => {
                ExternalAction::Command(cmd)
            }
            (GateOutcome::AutoContinue, AutoContinueTarget::ReturnToCaller) => return,
        };

        if let Err(e) = self.board.run_action(action) {
            crate::cprintln!(self.board, Tone::Error, "*** Warning: {} ***", e);
            crate::log::warn!("continuation action failed: {}", e);
        }
    }
}
