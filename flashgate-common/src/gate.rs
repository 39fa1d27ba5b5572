// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Continuation gate: a countdown after a successful upgrade that any key
//! interrupts.
//!
//! The console only offers a "character ready" poll, so the gate polls once
//! per tick and sleeps in between. A key press is noticed at most one tick
//! late.

use crate::console::{Console, Tone};

/// Countdown state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    /// Seconds left, always at least 1.
    Counting(u8),
    Interactive,
    AutoContinue,
}

/// Terminal state of the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateOutcome {
    /// A key was pressed; hand over to the operator console.
    Interactive,
    /// The countdown expired; resume the normal flow.
    AutoContinue,
}

impl GateState {
    /// Initial state for a countdown of `secs` ticks.
    pub const fn start(secs: u8) -> Self {
        if secs == 0 {
            GateState::AutoContinue
        } else {
            GateState::Counting(secs)
        }
    }

    /// Transition after one tick, given whether input was seen.
    pub const fn advance(self, input_ready: bool) -> Self {
        match self {
            GateState::Counting(_) if input_ready => GateState::Interactive,
            GateState::Counting(n) if n > 1 => GateState::Counting(n - 1),
            GateState::Counting(_) => GateState::AutoContinue,
            done => done,
        }
    }

    pub const fn outcome(self) -> Option<GateOutcome> {
        match self {
            GateState::Counting(_) => None,
            GateState::Interactive => Some(GateOutcome::Interactive),
            GateState::AutoContinue => Some(GateOutcome::AutoContinue),
        }
    }
}

/// Run the countdown on `console`.
///
/// On a key press exactly one character is consumed.
pub fn run_gate<IO: Console + ?Sized>(console: &mut IO, secs: u8, tick_ms: u32) -> GateOutcome {
    console.newline();
    crate::cprintln!(console, Tone::Notice, "*** Upgrade successful! ***");
    crate::conprintln!(console, "Continuing automatically in {} seconds.", secs);
    crate::conprintln!(console, "Press any key to enter the command console.");
    console.newline();

    let mut state = GateState::start(secs);
    loop {
        if let GateState::Counting(left) = state {
            crate::conprint!(console, "\rCountdown: {:2} s ", left);

            let input_ready = console.tstc();
            if input_ready {
                let _ = console.getc();
            } else {
                console.delay_ms(tick_ms);
            }
            state = state.advance(input_ready);
            continue;
        }

        match state.outcome() {
            Some(GateOutcome::Interactive) => {
                console.newline();
                console.newline();
                crate::conprintln!(console, "Interrupted. Entering command console ...");
                console.newline();
                return GateOutcome::Interactive;
            }
            _ => {
                crate::conprintln!(console, "\rCountdown:  0 s ");
                console.newline();
                crate::conprintln!(console, "Continuing ...");
                console.newline();
                return GateOutcome::AutoContinue;
            }
        }
    }
}
