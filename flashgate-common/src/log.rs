// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Internal logging: `defmt` when enabled, otherwise macros that only
//! borrow their arguments.

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, info, warn};

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ( $fmt:literal $(, $x:expr )* $(,)? ) => {{
        $( let _ = &$x; )*
    }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ( $fmt:literal $(, $x:expr )* $(,)? ) => {{
        $( let _ = &$x; )*
    }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warner {
    ( $fmt:literal $(, $x:expr )* $(,)? ) => {{
        $( let _ = &$x; )*
    }};
}

#[cfg(not(feature = "defmt"))]
pub(crate) use {debug, info, warner as warn};
