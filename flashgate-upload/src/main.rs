// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host tool for the flashgate bootloader console over USB CDC.
//!
//! Usage:
//!   flashgate-upload --port /dev/ttyACM0 upgrade fw firmware.bin
//!   flashgate-upload --port /dev/ttyACM0 upgrade fwb firmware.bin --answer no --console
//!   flashgate-upload --port /dev/ttyACM0 load image.bin
//!   flashgate-upload --port /dev/ttyACM0 reset

mod cli;
mod commands;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
