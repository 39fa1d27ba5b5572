// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport layer: console text from the device, and COBS-framed
//! postcard messages while an image is being loaded.

use anyhow::{bail, Context, Result};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

use flashgate_common::menu::MENU_PROMPT;
use flashgate_common::protocol::{Command, Response, MAX_FRAME_SIZE, SHELL_PROMPT};

/// Ending of a yes/no question.
const CONFIRM_SUFFIX: &str = "(Y/n) ";
const COUNTDOWN_PREFIX: &str = "Countdown:";

/// Unterminated console output that waits for the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prompt {
    Confirm,
    Countdown,
    Shell,
    Menu,
}

impl Prompt {
    /// Classify the visible text of an unterminated line.
    pub fn detect(text: &str) -> Option<Self> {
        if text.ends_with(CONFIRM_SUFFIX) {
            Some(Prompt::Confirm)
        } else if text.starts_with(COUNTDOWN_PREFIX) && text.ends_with(" s ") {
            Some(Prompt::Countdown)
        } else if text.ends_with(SHELL_PROMPT) {
            Some(Prompt::Shell)
        } else if text.ends_with(MENU_PROMPT) {
            Some(Prompt::Menu)
        } else {
            None
        }
    }
}

/// One piece of console output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Line(String),
    Prompt(Prompt, String),
}

/// Drop ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            // parameters run until the final byte
            for c in chars.by_ref() {
                if ('\x40'..='\x7e').contains(&c) {
                    break;
                }
            }
        }
    }
    out
}

/// What a terminal shows for `raw`: escapes removed and text before the
/// last carriage return overwritten.
pub fn visible(raw: &[u8]) -> String {
    let text = strip_ansi(&String::from_utf8_lossy(raw));
    let text = text.trim_end_matches(['\r', '\n']);
    text.rsplit('\r').next().unwrap_or_default().to_string()
}

/// USB CDC transport for communicating with the bootloader.
pub struct Transport {
    port: Box<dyn SerialPort>,
    rx_buf: Vec<u8>,
    text: Vec<u8>,
}

impl Transport {
    /// Create a new transport connection with a custom timeout.
    pub fn with_timeout(port_name: &str, timeout_ms: u64) -> Result<Self> {
        let port = serialport::new(port_name, 115200)
            .timeout(Duration::from_millis(timeout_ms))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self {
            port,
            rx_buf: Vec::with_capacity(64),
            text: Vec::with_capacity(256),
        })
    }

    /// Type `line` at the device console.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\r")?;
        self.port.flush()?;
        Ok(())
    }

    /// Press a single key.
    pub fn send_key(&mut self, key: u8) -> Result<()> {
        self.port.write_all(&[key])?;
        self.port.flush()?;
        Ok(())
    }

    /// Read console output up to the next line break or prompt.
    pub fn next_event(&mut self) -> Result<Event> {
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {}
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    bail!("Timeout waiting for console output");
                }
                Err(e) => bail!("Serial read error: {}", e),
            }

            self.text.push(byte[0]);
            if byte[0] == b'\n' {
                let line = visible(&self.text);
                self.text.clear();
                return Ok(Event::Line(line));
            }

            let shown = visible(&self.text);
            if let Some(prompt) = Prompt::detect(&shown) {
                self.text.clear();
                return Ok(Event::Prompt(prompt, shown));
            }
        }
    }

    /// Send a command to the bootloader.
    pub fn send(&mut self, cmd: &Command) -> Result<()> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = postcard::to_slice_cobs(cmd, &mut buf)
            .map_err(|e| anyhow::anyhow!("Failed to serialize command: {}", e))?;
        self.port
            .write_all(encoded)
            .map_err(|e| anyhow::anyhow!("Failed to write to serial port: {}", e))?;
        self.port.flush()?;
        Ok(())
    }

    /// Receive a response from the bootloader.
    pub fn receive(&mut self) -> Result<Response> {
        self.rx_buf.clear();
        let mut byte = [0u8; 1];

        // Read until we get delimiter (0x00)
        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    self.rx_buf.push(byte[0]);
                    if byte[0] == 0 {
                        break;
                    }
                }
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    bail!("Timeout waiting for response");
                }
                Err(e) => bail!("Serial read error: {}", e),
            }
        }

        postcard::from_bytes_cobs(&mut self.rx_buf).map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize response: {} (raw {} bytes: {:02x?})",
                e,
                self.rx_buf.len(),
                &self.rx_buf[..self.rx_buf.len().min(32)]
            )
        })
    }

    /// Throw away anything the device sent that was not read yet.
    pub fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
        self.text.clear();
    }

    /// Send a command and wait for the response.
    pub fn send_recv(&mut self, cmd: &Command) -> Result<Response> {
        self.send(cmd)?;
        self.receive()
    }
}
