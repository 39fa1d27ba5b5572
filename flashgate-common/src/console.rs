// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial console primitives and the yes/no confirmation prompt.

use core::fmt;

/// Line terminator used for all console output.
pub const NEWLINE: &str = "\r\n";

const ANSI_RESET: &str = "\x1b[0m";

/// Blocking character console provided by the board.
///
/// Output goes through [`fmt::Write`]. Write errors are not recoverable on a
/// serial console and are dropped by the helpers below.
pub trait Console: fmt::Write {
    /// Block until a character is available and return it.
    fn getc(&mut self) -> u8;

    /// Return true if [`Console::getc`] would not block.
    fn tstc(&mut self) -> bool;

    /// The character [`Console::getc`] would return next, if one is ready.
    fn peek(&mut self) -> Option<u8>;

    /// Busy-wait for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Whether ANSI colors may be emitted.
    fn colors(&self) -> bool {
        true
    }

    fn print(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.write_fmt(args);
    }

    fn newline(&mut self) {
        let _ = self.write_str(NEWLINE);
    }

    /// Print `args` in `tone`, without a line break.
    fn tone(&mut self, tone: Tone, args: fmt::Arguments<'_>) {
        if self.colors() {
            let _ = self.write_str(tone.ansi());
            let _ = self.write_fmt(args);
            let _ = self.write_str(ANSI_RESET);
        } else {
            let _ = self.write_fmt(args);
        }
    }
}

/// Color class of a console message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tone {
    Prompt,
    Error,
    Notice,
}

impl Tone {
    pub const fn ansi(self) -> &'static str {
        match self {
            Tone::Prompt => "\x1b[1;36m",
            Tone::Error => "\x1b[1;31m",
            Tone::Notice => "\x1b[1;32m",
        }
    }
}

/// `print!` onto a [`Console`].
#[macro_export]
macro_rules! conprint {
    ($con:expr, $($arg:tt)*) => {{
        use $crate::console::Console as _;
        $con.print(format_args!($($arg)*))
    }};
}

/// `println!` onto a [`Console`], using `\r\n`.
#[macro_export]
macro_rules! conprintln {
    ($con:expr) => {{
        use $crate::console::Console as _;
        $con.newline()
    }};
    ($con:expr, $($arg:tt)*) => {{
        use $crate::console::Console as _;
        $con.print(format_args!($($arg)*));
        $con.newline()
    }};
}

/// Colored line: `cprintln!(console, Tone::Error, "...")`.
#[macro_export]
macro_rules! cprintln {
    ($con:expr, $tone:expr, $($arg:tt)*) => {{
        use $crate::console::Console as _;
        $con.tone($tone, format_args!($($arg)*));
        $con.newline()
    }};
}

/// Colored text without a line break.
#[macro_export]
macro_rules! cprint {
    ($con:expr, $tone:expr, $($arg:tt)*) => {{
        use $crate::console::Console as _;
        $con.tone($tone, format_args!($($arg)*))
    }};
}

/// True for `y`, `Y` and a bare Enter (the default answer).
pub fn is_affirmative(c: u8) -> bool {
    matches!(c, b'y' | b'Y' | b'\r' | b'\n')
}

/// Ask a yes/no question.
///
/// Reads one character, plus the LF of a CRLF Enter so it is not taken as
/// the next key press.
pub fn confirm<IO: Console + ?Sized>(console: &mut IO, prompt: &str) -> bool {
    conprint!(console, "{} (Y/n) ", prompt);

    let c = console.getc();
    if c == b'\r' && console.peek() == Some(b'\n') {
        console.getc();
    }
    if c.is_ascii_graphic() {
        conprint!(console, "{}", c as char);
    }
    console.newline();

    is_affirmative(c)
}
