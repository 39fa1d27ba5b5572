// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Receive side of the loader protocol, without any I/O.
//!
//! The board decodes frames and feeds them to [`LoadSession::handle`]
//! together with the load buffer, then sends back the returned response.

use crate::error::LoadError;
use crate::image::crc32;
use crate::protocol::{AckStatus, Command, Response};

/// What to do after handling one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Send the response and keep receiving.
    Continue(Response),
    /// Send the response; the transfer is over.
    Done(Response, Result<usize, LoadError>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Receiving {
        size: usize,
        crc32: u32,
        received: usize,
    },
}

#[derive(Debug)]
pub struct LoadSession {
    state: State,
}

impl Default for LoadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSession {
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Bytes stored so far.
    pub fn received(&self) -> usize {
        match self.state {
            State::Idle => 0,
            State::Receiving { received, .. } => received,
        }
    }

    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::Receiving { .. })
    }

    /// Process one command, storing data blocks into `buf`.
    pub fn handle(&mut self, cmd: &Command, buf: &mut [u8]) -> Step {
        match (cmd, self.state) {
            (Command::Abort, _) => {
                self.state = State::Idle;
                Step::Done(Response::Ack(AckStatus::Ok), Err(LoadError::Aborted))
            }
            (Command::Begin { size, crc32 }, State::Idle) => self.begin(*size, *crc32, buf.len()),
            (Command::DataBlock { offset, data }, State::Receiving { .. }) => {
                self.data_block(*offset as usize, data, buf)
            }
            (Command::Finish, State::Receiving { .. }) => self.finish(buf),
            _ => Step::Continue(Response::Ack(AckStatus::BadState)),
        }
    }

    fn begin(&mut self, size: u32, crc32: u32, capacity: usize) -> Step {
        let size = size as usize;
        if size == 0 {
            return Step::Done(Response::Ack(AckStatus::BadCommand), Err(LoadError::NoData));
        }
        if size > capacity {
            return Step::Done(Response::Ack(AckStatus::TooLarge), Err(LoadError::TooLarge));
        }

        self.state = State::Receiving {
            size,
            crc32,
            received: 0,
        };
        Step::Continue(Response::Ack(AckStatus::Ok))
    }

    fn data_block(&mut self, offset: usize, data: &[u8], buf: &mut [u8]) -> Step {
        let State::Receiving {
            size,
            crc32,
            received,
        } = self.state
        else {
            return Step::Continue(Response::Ack(AckStatus::BadState));
        };

        // Blocks must arrive in order; a resent block is refused, not merged.
        if offset != received {
            return Step::Continue(Response::Ack(AckStatus::BadCommand));
        }
        let end = received + data.len();
        if end > size {
            self.state = State::Idle;
            return Step::Done(Response::Ack(AckStatus::TooLarge), Err(LoadError::TooLarge));
        }

        buf[received..end].copy_from_slice(data);
        self.state = State::Receiving {
            size,
            crc32,
            received: end,
        };
        Step::Continue(Response::Ack(AckStatus::Ok))
    }

    fn finish(&mut self, buf: &[u8]) -> Step {
        let State::Receiving {
            size,
            crc32: expected,
            received,
        } = self.state
        else {
            return Step::Continue(Response::Ack(AckStatus::BadState));
        };
        self.state = State::Idle;

        if received != size {
            return Step::Done(Response::Ack(AckStatus::BadState), Err(LoadError::Transfer));
        }

        let actual = crc32(&buf[..size]);
        if actual != expected {
            return Step::Done(Response::Ack(AckStatus::CrcError), Err(LoadError::Checksum));
        }

        Step::Done(
            Response::Loaded {
                size: size as u32,
                crc32: actual,
            },
            Ok(size),
        )
    }
}
