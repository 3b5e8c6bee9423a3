// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Logging facade for the test plan toolkit.
//!
//! Events are only emitted when the `log` feature is enabled. Without it the macros below expand
//! to nothing, which keeps the solver and IR builder free of any tracing overhead.

#![allow(unused_imports, unused_macros, reason = "Not all events may be used")]

#[cfg(feature = "log")]
mod implementation {
    // Usage of [`__tracing_do_not_use_directly`] is allowed here

    pub(crate) use __tracing_do_not_use_directly::debug;
    pub(crate) use __tracing_do_not_use_directly::error;
    pub(crate) use __tracing_do_not_use_directly::info;
    pub(crate) use __tracing_do_not_use_directly::trace;
    // Rename `warn` to avoid conflict with a Rust attribute of the same name
    pub(crate) use __tracing_do_not_use_directly::warn as warning;
}

#[cfg(not(feature = "log"))]
mod implementation {
    macro_rules! error {
        ($($ignore:tt)*) => {};
    }

    macro_rules! warning {
        ($($ignore:tt)*) => {};
    }

    macro_rules! info {
        ($($ignore:tt)*) => {};
    }

    macro_rules! debug {
        ($($ignore:tt)*) => {};
    }

    macro_rules! trace {
        ($($ignore:tt)*) => {};
    }

    pub(crate) use debug;
    pub(crate) use error;
    pub(crate) use info;
    pub(crate) use trace;
    pub(crate) use warning;
}

#[cfg(feature = "log")]
#[doc(hidden)]
// The sandbox installs its subscriber through this re-export so that both crates agree on a
// single `tracing` version.
pub use __tracing_do_not_use_directly as tracing_internal;
pub(crate) use implementation::*;
