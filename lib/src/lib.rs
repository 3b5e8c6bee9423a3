// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Declarative test plans for RISC-V core compliance testing.
//!
//! - [`env`] and [`solver`] expand environment configurations into the concrete environments a
//!   test runs under.
//! - [`step`] and [`ir`] describe what a test does and how its steps depend on each other.
//! - [`scenario`], [`registry`] and [`plans`] group steps into scenarios and named plans.

pub mod env;
pub mod ir;
pub mod log;
pub mod plans;
pub mod registry;
pub mod scenario;
pub mod solver;
pub mod step;
