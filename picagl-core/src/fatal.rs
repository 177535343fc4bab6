//! Unrecoverable errors.
//!
//! Contract violations (queue overflow, barrier over-release, software tiling
//! on VRAM) and desynchronized hardware state cannot be continued from. They
//! are logged at `error` level and then unwind; release builds are compiled
//! with `panic = "abort"`, so the process terminates there.

use std::fmt;

/// Log `args` and terminate the current operation.
#[cold]
#[inline(never)]
#[track_caller]
pub fn fatal_error(args: fmt::Arguments<'_>) -> ! {
    log::error!("fatal: {}", args);
    panic!("fatal: {}", args);
}

/// `fatal!("...")` formats like `format!` and never returns.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::fatal::fatal_error(format_args!($($arg)*))
    };
}
