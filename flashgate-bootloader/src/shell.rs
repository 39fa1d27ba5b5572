// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Interactive command console.

use flashgate_common::command::{parse_invocation, MAX_ARGS, UPGRADE_COMMAND, UPGRADE_USAGE};
use flashgate_common::layout::{Target, LOAD_ADDR, LOAD_SIZE};
use flashgate_common::menu::{self, BootMenuEntry};
use flashgate_common::protocol::SHELL_PROMPT;
use flashgate_common::{
    conprint, conprintln, cprintln, do_upgrade, CmdRet, Console, ExternalAction, LoadRegion,
    Part, Platform, Registry, Tone,
};
use heapless::String;

use crate::board::{self, Board};
use crate::media::InternalFlash;

const MAX_LINE_LEN: usize = 64;

const HELP: &str = "\
upgrade [<part>] - load a new image and write it
boot             - start the active firmware
reset            - reboot the board
menu             - show the boot menu
help             - this text
";

/// The load buffer.
///
/// # Safety
/// Call once. Nothing else may use the region, which lies below the
/// bootloader's own RAM.
unsafe fn load_buffer() -> &'static mut [u8] {
    core::slice::from_raw_parts_mut(LOAD_ADDR as *mut u8, LOAD_SIZE)
}

pub fn run(board: &mut Board) -> ! {
    let flash = InternalFlash;
    let parts = board::parts(&flash);
    let buf = unsafe { load_buffer() };

    match Registry::new(&parts) {
        Ok(registry) => {
            if let Err(entry) = menu::check_entries(&board::MENU, &registry) {
                defmt::warn!("menu entry '{}' names no part", entry.command);
            }
        }
        Err(e) => defmt::warn!("bad part table: {}", e),
    }

    conprintln!(board);
    conprintln!(board, "flashgate {}", env!("CARGO_PKG_VERSION"));
    if board.queue("menu").is_err() {
        defmt::warn!("could not queue the boot menu");
    }

    loop {
        let line = match board.take_next() {
            Some(queued) => {
                let mut line = String::<MAX_LINE_LEN>::new();
                // MAX_COMMAND_LEN < MAX_LINE_LEN
                let _ = line.push_str(&queued);
                line
            }
            None => read_line(board),
        };
        execute(board, &line, &parts, buf);
    }
}

/// Read one line with echo and backspace handling.
fn read_line(board: &mut Board) -> String<MAX_LINE_LEN> {
    let mut line = String::new();
    conprint!(board, "{}", SHELL_PROMPT);

    loop {
        match board.getc() {
            b'\r' | b'\n' => {
                board.newline();
                return line;
            }
            0x08 | 0x7F => {
                if line.pop().is_some() {
                    conprint!(board, "\x08 \x08");
                }
            }
            c @ 0x20..=0x7E => {
                if line.push(c as char).is_ok() {
                    conprint!(board, "{}", c as char);
                }
            }
            // Stray frame delimiters and control bytes
            _ => {}
        }
    }
}

fn execute(board: &mut Board, line: &str, parts: &[Part<'_, Target>], buf: &mut [u8]) {
    let Some(invocation) = parse_invocation(line) else {
        if line.split_whitespace().count() >= MAX_ARGS {
            cprintln!(board, Tone::Error, "Too many arguments");
        }
        return;
    };

    match invocation.name {
        UPGRADE_COMMAND => {
            let region = LoadRegion::new(LOAD_ADDR, buf);
            let ret = do_upgrade(&invocation.args, parts, &board::CONFIG, region, board);
            if ret != CmdRet::Success {
                defmt::info!("upgrade returned {}", ret.code());
            }
        }
        "boot" => run_action(board, ExternalAction::BootDefault),
        "reset" => {
            conprintln!(board, "Resetting ...");
            run_action(board, ExternalAction::Reset);
        }
        "menu" => {
            if let Some(entry) = menu::choose(&board::MENU, board) {
                queue_entry(board, entry);
            }
        }
        "help" => {
            for help_line in HELP.lines() {
                conprintln!(board, "{}", help_line);
            }
            conprintln!(board);
            conprint!(board, "{}", UPGRADE_USAGE);
        }
        other => {
            cprintln!(board, Tone::Error, "Unknown command '{}' - try 'help'", other);
        }
    }
}

fn queue_entry(board: &mut Board, entry: &BootMenuEntry) {
    if board.queue(entry.command).is_err() {
        cprintln!(board, Tone::Error, "*** Command too long: {} ***", entry.command);
    }
}

fn run_action(board: &mut Board, action: ExternalAction<'_>) {
    if let Err(e) = board.run_action(action) {
        cprintln!(board, Tone::Error, "*** {} ***", e);
    }
}
