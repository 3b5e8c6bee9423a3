// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Control and status register access scenarios

use crate::env::EnvCfgError;
use crate::env::PagingMode;
use crate::env::PrivilegeMode;
use crate::env::TestEnvCfg;
use crate::registry::RegistryError;
use crate::registry::ScenarioFactory;
use crate::registry::TestPlanRegistry;
use crate::scenario::ScenarioError;
use crate::scenario::ScenarioInfo;
use crate::scenario::TestScenario;
use crate::step::AssertEqual;
use crate::step::AssertException;
use crate::step::Csr;
use crate::step::CsrRead;
use crate::step::CsrWrite;
use crate::step::ExceptionCause;
use crate::step::Hart;
use crate::step::HartExit;
use crate::step::LoadImmediate;
use crate::step::Steps;

pub const PLAN_NAME: &str = "csr";

const PLAN_DESCRIPTION: &str = "CSR read/write semantics and privilege checks";

const SCENARIOS: [ScenarioFactory; 4] = [
    sscratch_write_read,
    mscratch_from_supervisor_faults,
    mhartid_per_hart,
    read_only_write_faults,
];

pub fn register(registry: &mut TestPlanRegistry) -> Result<(), RegistryError> {
    for factory in SCENARIOS {
        registry.register(PLAN_NAME, PLAN_DESCRIPTION, factory)?;
    }
    Ok(())
}

fn bare_env(priv_mode: PrivilegeMode, harts: u32) -> Result<TestEnvCfg, EnvCfgError> {
    TestEnvCfg::builder()
        .priv_modes([priv_mode])
        .hypervisor([false])
        .paging_modes([PagingMode::Disabled])
        .min_num_harts(harts)
        .build()
}

fn sscratch_write_read() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let value = steps.push(LoadImmediate { imm: 0x5a5a_a5a5 });
    steps.push(CsrWrite {
        csr: Csr::sscratch,
        value: value.into(),
    });
    let read = steps.push(CsrRead { csr: Csr::sscratch });
    steps.push(AssertEqual::new(read, value));

    let info = ScenarioInfo::new("CSR-001", "sscratch_write_read")
        .with_description("A value written to sscratch reads back unchanged")
        .with_env(bare_env(PrivilegeMode::Supervisor, 1)?);
    Ok(TestScenario::from_steps(info, steps)?)
}

fn mscratch_from_supervisor_faults() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let read = steps.alloc(CsrRead { csr: Csr::mscratch });
    steps.push(AssertException {
        cause: ExceptionCause::IllegalInstruction,
        code: vec![read],
    });

    let info = ScenarioInfo::new("CSR-002", "mscratch_from_supervisor_faults")
        .with_description("Supervisor mode may not access machine level CSRs")
        .with_env(bare_env(PrivilegeMode::Supervisor, 1)?);
    Ok(TestScenario::from_steps(info, steps)?)
}

fn mhartid_per_hart() -> Result<TestScenario, ScenarioError> {
    const HARTS: u32 = 2;

    let mut steps = Steps::new();
    for hart_id in 0..HARTS {
        steps.push(Hart { hart_id });
        let read = steps.push(CsrRead { csr: Csr::mhartid });
        steps.push(AssertEqual::new(read, i64::from(hart_id)));
        steps.push(HartExit);
    }

    let info = ScenarioInfo::new("CSR-003", "mhartid_per_hart")
        .with_description("Every hart reads its own index from mhartid")
        .with_env(bare_env(PrivilegeMode::Machine, HARTS)?);
    Ok(TestScenario::from_steps(info, steps)?)
}

fn read_only_write_faults() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let write = steps.alloc(CsrWrite {
        csr: Csr::mhartid,
        value: 1_i64.into(),
    });
    steps.push(AssertException {
        cause: ExceptionCause::IllegalInstruction,
        code: vec![write],
    });

    let info = ScenarioInfo::new("CSR-004", "read_only_write_faults")
        .with_description("Writing a read-only CSR raises an illegal instruction exception")
        .with_env(bare_env(PrivilegeMode::Machine, 1)?);
    Ok(TestScenario::from_steps(info, steps)?)
}

#[cfg(test)]
mod tests {
    use super::SCENARIOS;
    use crate::env::PrivilegeMode;
    use crate::ir::IrInput;
    use crate::solver::TestEnvSolver;

    #[test]
    fn test_scenarios_build() {
        for factory in SCENARIOS {
            let scenario = factory().unwrap();
            let envs = scenario.solve_envs(&TestEnvSolver::default());
            assert_eq!(envs.len(), 1, "{}", scenario.id());
        }
    }

    #[test]
    fn test_mhartid_scenario() {
        let scenario = super::mhartid_per_hart().unwrap();
        let envs = scenario.solve_envs(&TestEnvSolver::default());
        assert_eq!(envs[0].hart_count(), 2);
        assert_eq!(envs[0].priv_mode(), PrivilegeMode::Machine);

        let ids = scenario
            .steps()
            .iter()
            .map(|ir| ir.id())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["v0", "v1", "v2", "v3", "v4", "v5", "v6", "v7"]);
        assert_eq!(scenario.steps()[6].inputs(), [
            IrInput::from("v5"),
            IrInput::Imm(1)
        ]);
    }
}
