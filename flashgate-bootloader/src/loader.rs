// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Receives replacement data from the host over USB CDC.

use embedded_hal::digital::StatefulOutputPin;
use flashgate_common::protocol::{AckStatus, Response, LOAD_READY_MARKER};
use flashgate_common::transfer::{LoadSession, Step};
use flashgate_common::{LoadError, LoadRegion, Loader};

use crate::board::Board;

/// Give up when the host stays silent this long.
const IDLE_TIMEOUT_MS: u64 = 10_000;

impl Loader for Board {
    fn load(&mut self, region: &mut LoadRegion<'_>, env_name: &str) -> Result<usize, LoadError> {
        self.usb.discard_input();
        flashgate_common::conprintln!(
            self,
            "{} {} ({} bytes max)",
            LOAD_READY_MARKER,
            env_name,
            region.capacity()
        );

        let mut session = LoadSession::new();
        let mut last_activity = self.timer.get_counter();

        loop {
            match self.usb.try_receive() {
                Some(Ok(cmd)) => {
                    last_activity = self.timer.get_counter();
                    self.led.toggle().ok();

                    match session.handle(&cmd, region.buf) {
                        Step::Continue(resp) => self.usb.send(&resp),
                        Step::Done(resp, result) => {
                            self.usb.send(&resp);
                            self.led.set_high().ok();
                            if let Err(e) = result {
                                defmt::warn!("load of {} ended: {}", env_name, e);
                            }
                            return result;
                        }
                    }
                }
                Some(Err(_)) => {
                    defmt::warn!("undecodable frame");
                    self.usb.send(&Response::Ack(AckStatus::BadCommand));
                }
                None => {
                    if self.elapsed_ms(last_activity) > IDLE_TIMEOUT_MS {
                        defmt::warn!("load timed out after {} bytes", session.received());
                        self.led.set_high().ok();
                        return Err(if session.is_receiving() {
                            LoadError::Transfer
                        } else {
                            LoadError::NoData
                        });
                    }
                }
            }
        }
    }
}
