// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Architectural legality rules for test environments

use super::PagingMode;
use super::PrivilegeMode;
use super::TestEnv;
use crate::solver::Predicate;

/// Machine mode has no address translation, so paging must be disabled.
pub fn machine_mode_without_paging() -> Predicate {
    Predicate::new("machine_mode_without_paging", |env: &TestEnv| {
        env.priv_mode() != PrivilegeMode::Machine || env.paging_mode() == PagingMode::Disabled
    })
}

/// `Sv39`, `Sv48` and `Sv57` are only defined for RV64.
pub fn paging_requires_rv64() -> Predicate {
    Predicate::new("paging_requires_rv64", |env: &TestEnv| {
        !env.paging_mode().is_enabled() || env.reg_width() == 64
    })
}

/// The hypervisor extension only adds virtualised modes below machine mode.
pub fn hypervisor_requires_supervisor() -> Predicate {
    Predicate::new("hypervisor_requires_supervisor", |env: &TestEnv| {
        !env.hypervisor() || env.priv_mode() != PrivilegeMode::Machine
    })
}

/// Predicates installed by a solver when none are given explicitly.
pub fn default_predicates() -> Vec<Predicate> {
    vec![machine_mode_without_paging()]
}

/// Every built-in predicate.
pub fn all_predicates() -> Vec<Predicate> {
    vec![
        machine_mode_without_paging(),
        paging_requires_rv64(),
        hypervisor_requires_supervisor(),
    ]
}
