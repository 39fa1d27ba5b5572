// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations: scripted `upgrade` sessions and raw loads.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use flashgate_common::image::crc32;
use flashgate_common::protocol::{
    parse_ready_line, AckStatus, Command, Response, MAX_DATA_BLOCK_SIZE,
};

use crate::transport::{Event, Prompt, Transport};

const CHUNK_SIZE: usize = MAX_DATA_BLOCK_SIZE;

/// Printed by the device once it hands control away.
const HANDOFF_MARKERS: [&str; 2] = ["Resetting ...", "Starting image ..."];
const COMPLETED_MARKER: &str = "upgrade completed!";
/// Error banners with this prefix do not fail the command.
const WARNING_PREFIX: &str = "*** Warning:";

/// How to answer the device during an upgrade.
#[derive(Clone, Copy, Debug)]
pub struct UpgradeOptions {
    /// Key sent at every yes/no question.
    pub answer: u8,
    /// Interrupt the countdown.
    pub console: bool,
}

/// Where a scripted session stands.
#[derive(Debug, Default)]
struct Session {
    loaded: bool,
    completed: bool,
    /// An error banner was printed after the write.
    failed: bool,
    interrupted: bool,
}

/// What to do with one piece of console output.
#[derive(Debug, PartialEq, Eq)]
enum Reaction {
    Wait,
    SendImage { max: usize },
    Press(u8),
    /// The device left the bootloader or returned to a prompt.
    Finished,
}

impl Session {
    fn react(&mut self, event: &Event, opts: &UpgradeOptions) -> Reaction {
        match event {
            Event::Line(line) => {
                if let Some((_, max)) = parse_ready_line(line) {
                    return Reaction::SendImage { max };
                }
                if line.contains(COMPLETED_MARKER) {
                    self.completed = true;
                } else if self.completed
                    && line.starts_with("***")
                    && !line.starts_with(WARNING_PREFIX)
                    && line.contains("failed")
                {
                    self.failed = true;
                }
                if HANDOFF_MARKERS.iter().any(|m| line.contains(m)) {
                    return Reaction::Finished;
                }
                Reaction::Wait
            }
            Event::Prompt(Prompt::Confirm, _) => Reaction::Press(opts.answer),
            Event::Prompt(Prompt::Countdown, _) => {
                if opts.console && !self.interrupted {
                    self.interrupted = true;
                    Reaction::Press(b'\r')
                } else {
                    Reaction::Wait
                }
            }
            Event::Prompt(Prompt::Shell | Prompt::Menu, _) => Reaction::Finished,
        }
    }
}

fn read_image(file: &Path) -> Result<Vec<u8>> {
    let image = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    if image.is_empty() {
        bail!("{} is empty", file.display());
    }

    println!(
        "Image: {} ({} bytes, CRC32: 0x{:08x})",
        file.display(),
        image.len(),
        crc32(&image)
    );
    Ok(image)
}

/// Run `upgrade <part>` on the device console and follow it to the end.
pub fn upgrade(
    transport: &mut Transport,
    part: &str,
    file: &Path,
    opts: UpgradeOptions,
) -> Result<()> {
    let image = read_image(file)?;
    let mut session = Session::default();

    transport.drain_rx();
    transport.write_line(&format!("upgrade {}", part))?;

    loop {
        let event = transport.next_event()?;
        match &event {
            Event::Line(line) => println!("{}", line),
            Event::Prompt(_, text) => {
                print!("{}", text);
                std::io::stdout().flush()?;
            }
        }

        match session.react(&event, &opts) {
            Reaction::Wait => {}
            Reaction::SendImage { max } => {
                if image.len() > max {
                    let _ = transport.send(&Command::Abort);
                    bail!("Image is {} bytes, the device accepts {}", image.len(), max);
                }
                send_image(transport, &image)?;
                session.loaded = true;
            }
            Reaction::Press(key) => {
                if key.is_ascii_graphic() {
                    println!("[{}]", key as char);
                }
                transport.send_key(key)?;
            }
            Reaction::Finished => break,
        }
    }

    println!();
    if !session.loaded {
        bail!("The device never asked for the image");
    }
    if !session.completed {
        bail!("Upgrade of '{}' did not complete, see the device output above", part);
    }
    if session.failed {
        bail!("'{}' was written but the follow-up step failed", part);
    }
    println!("Upgrade of '{}' finished.", part);
    Ok(())
}

/// Wait for the device's ready marker and send the image.
pub fn load(transport: &mut Transport, file: &Path) -> Result<()> {
    let image = read_image(file)?;

    loop {
        if let Event::Line(line) = transport.next_event()? {
            if let Some((env, max)) = parse_ready_line(&line) {
                println!("Device wants '{}' ({} bytes max)", env, max);
                if image.len() > max {
                    let _ = transport.send(&Command::Abort);
                    bail!("Image is {} bytes, the device accepts {}", image.len(), max);
                }
                break;
            }
        }
    }

    send_image(transport, &image)?;
    println!("Image loaded.");
    Ok(())
}

/// Reboot the device from its console.
pub fn reset(transport: &mut Transport) -> Result<()> {
    print!("Rebooting device... ");
    std::io::stdout().flush()?;

    transport.drain_rx();
    transport.write_line("reset")?;

    loop {
        if let Event::Line(line) = transport.next_event()? {
            if line.contains(HANDOFF_MARKERS[0]) {
                println!("OK");
                return Ok(());
            }
        }
    }
}

/// Stream `image` with Begin, DataBlock... and Finish.
fn send_image(transport: &mut Transport, image: &[u8]) -> Result<()> {
    let size = image.len() as u32;
    let crc = crc32(image);

    let response = transport.send_recv(&Command::Begin { size, crc32: crc })?;
    expect_ok(response, "Begin")?;

    let pb = ProgressBar::new(size as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut offset = 0u32;
    for chunk in image.chunks(CHUNK_SIZE) {
        let response = transport.send_recv(&Command::DataBlock {
            offset,
            data: chunk.to_vec(),
        });

        if let Err(e) = response.and_then(|r| expect_ok(r, "DataBlock")) {
            pb.abandon();
            let _ = transport.send(&Command::Abort);
            return Err(e.context(format!("at offset {}", offset)));
        }

        offset += chunk.len() as u32;
        pb.set_position(offset as u64);
    }
    pb.finish_with_message("Transfer complete");

    match transport.send_recv(&Command::Finish)? {
        Response::Loaded { size: got, crc32 } if got == size && crc32 == crc => Ok(()),
        Response::Ack(AckStatus::CrcError) => bail!("CRC verification failed!"),
        response => bail!("Finish failed: {:?}", response),
    }
}

fn expect_ok(response: Response, what: &str) -> Result<()> {
    match response {
        Response::Ack(AckStatus::Ok) => Ok(()),
        Response::Ack(AckStatus::TooLarge) => bail!("{}: image too large for the device", what),
        Response::Ack(status) => bail!("{} failed: {:?}", what, status),
        _ => bail!("Unexpected response to {}: {:?}", what, response),
    }
}
