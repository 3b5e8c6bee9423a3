// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

pub mod plans;
pub mod solve;

pub use plans::plans;
pub use solve::solve;
