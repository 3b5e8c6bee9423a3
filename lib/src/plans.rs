// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Test plans shipped with the toolkit

pub mod csr;
pub mod paging;

use crate::registry::RegistryError;
use crate::registry::TestPlanRegistry;

/// Register the scenarios of every bundled plan.
pub fn register_all(registry: &mut TestPlanRegistry) -> Result<(), RegistryError> {
    paging::register(registry)?;
    csr::register(registry)?;
    Ok(())
}

/// A registry populated with every bundled plan, not yet built.
pub fn bundled_registry() -> Result<TestPlanRegistry, RegistryError> {
    let mut registry = TestPlanRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
