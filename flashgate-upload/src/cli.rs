// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{self, UpgradeOptions};
use crate::transport::Transport;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "flashgate-upload")]
#[command(about = "Drive the flashgate bootloader console over USB CDC")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyACM0)
    #[arg(short, long)]
    pub port: String,

    /// Seconds to wait for console output before giving up
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Reply to the device's yes/no questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn key(self) -> u8 {
        match self {
            Answer::Yes => b'y',
            Answer::No => b'n',
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run `upgrade <part>` on the device and send the image
    Upgrade {
        /// Part abbreviation (e.g., fw, fwb, bl, simg)
        #[arg(value_name = "PART")]
        part: String,

        /// Image file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Answer to confirmation prompts
        #[arg(short, long, value_enum, default_value = "yes")]
        answer: Answer,

        /// Interrupt the countdown and stay at the command console
        #[arg(short, long)]
        console: bool,
    },

    /// Send an image to a device that is already waiting for one
    Load {
        /// Image file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Reboot the device
    Reset,
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let mut transport = Transport::with_timeout(&cli.port, cli.timeout * 1000)?;

    match cli.command {
        Commands::Upgrade {
            part,
            file,
            answer,
            console,
        } => commands::upgrade(
            &mut transport,
            &part,
            &file,
            UpgradeOptions {
                answer: answer.key(),
                console,
            },
        ),
        Commands::Load { file } => commands::load(&mut transport, &file),
        Commands::Reset => commands::reset(&mut transport),
    }
}
