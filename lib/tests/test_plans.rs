// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use riscv_testplan::env::PagingMode;
use riscv_testplan::env::PrivilegeMode;
use riscv_testplan::env::TestEnvCfg;
use riscv_testplan::ir::IrInput;
use riscv_testplan::ir::build_step_ir;
use riscv_testplan::ir::flatten;
use riscv_testplan::plans;
use riscv_testplan::registry::RegistryError;
use riscv_testplan::solver::TestEnvSolver;
use riscv_testplan::step::Load;
use riscv_testplan::step::CodePage;
use riscv_testplan::step::Memory;
use riscv_testplan::step::PteFlags;
use riscv_testplan::step::Steps;
use riscv_testplan::step::TestStep;

#[test]
fn test_generate_solve_and_build() {
    let cfg = TestEnvCfg::builder()
        .reg_widths([64])
        .priv_modes([PrivilegeMode::Machine, PrivilegeMode::Supervisor])
        .hypervisor([false])
        .paging_modes([PagingMode::Disabled, PagingMode::Sv39])
        .min_num_harts(1)
        .build()
        .unwrap();
    assert_eq!(cfg.generate_all_cfgs().len(), 4);

    let solved = TestEnvSolver::default().solve(&[cfg]);
    assert_eq!(solved.len(), 3);
    assert!(!solved.iter().any(|env| {
        env.priv_mode() == PrivilegeMode::Machine && env.paging_mode() == PagingMode::Sv39
    }));

    let mut steps = Steps::new();
    let page = steps.push(Memory::new(0x1000));
    steps.push(Load::new(page));
    let ir = build_step_ir(&steps).unwrap();

    assert_eq!(ir.len(), 2);
    assert_eq!(ir[0].id(), "m0");
    assert!(ir[0].inputs().is_empty());
    assert_eq!(ir[1].id(), "v0");
    assert_eq!(ir[1].inputs(), [IrInput::from("m0")]);
}

#[test]
fn test_bundled_plans() {
    let mut registry = plans::bundled_registry().unwrap();
    let built = registry.build().unwrap();

    let names = built.iter().map(|plan| plan.name()).collect::<Vec<_>>();
    assert_eq!(names, [plans::paging::PLAN_NAME, plans::csr::PLAN_NAME]);

    let solver = TestEnvSolver::default();
    let mut scenario_ids = HashSet::new();

    for plan in built {
        assert!(!plan.scenarios().is_empty());
        assert!(!plan.description().is_empty());

        for scenario in plan.scenarios() {
            assert!(scenario_ids.insert(scenario.id().to_string()));
            assert!(!scenario.solve_envs(&solver).is_empty());

            // Identifiers are unique across nested code and every handle resolves
            let mut ids = HashSet::new();
            for ir in flatten(scenario.steps()) {
                assert!(ids.insert(ir.id().to_string()), "{}", ir.id());
                assert!(scenario.step(ir.step()).is_some());
            }

            // Every identifier input refers to a step of the same scenario
            for ir in flatten(scenario.steps()) {
                for input in ir.inputs() {
                    if let IrInput::Id(id) = input {
                        assert!(ids.contains(id), "{} refers to unknown {id}", ir.id());
                    }
                }
            }
        }
    }
}

#[test]
fn test_user_mode_pages_are_user_accessible() {
    let mut registry = plans::bundled_registry().unwrap();
    let built = registry.build().unwrap();
    let solver = TestEnvSolver::default();

    for scenario in built.iter().flat_map(|plan| plan.scenarios()) {
        let runs_in_user = scenario
            .solve_envs(&solver)
            .iter()
            .any(|env| env.priv_mode() == PrivilegeMode::User);
        if !runs_in_user {
            continue;
        }

        for ir in flatten(scenario.steps()) {
            let flags = match scenario.step(ir.step()) {
                Some(TestStep::Memory(Memory { flags, .. }))
                | Some(TestStep::CodePage(CodePage { flags, .. })) => *flags,
                _ => continue,
            };
            assert!(
                flags.contains(PteFlags::U),
                "{} maps {} without U",
                scenario.id(),
                ir.id()
            );
        }
    }
}

#[test]
fn test_bundled_registry_is_frozen() {
    let mut registry = plans::bundled_registry().unwrap();
    registry.build().unwrap();

    assert_eq!(
        plans::register_all(&mut registry),
        Err(RegistryError::AlreadyBuilt)
    );
}

#[test]
fn test_expected_exceptions_carry_code() {
    let mut registry = plans::bundled_registry().unwrap();
    registry.build().unwrap();
    let plan = registry.plan(plans::paging::PLAN_NAME).unwrap().unwrap();

    let scenario = plan.scenario("PG-PF-001").unwrap();
    let assertion = scenario
        .steps()
        .iter()
        .find(|ir| matches!(scenario.step(ir.step()), Some(TestStep::AssertException(_))))
        .unwrap();

    assert_eq!(assertion.inputs(), [IrInput::Imm(13)]);
    assert_eq!(assertion.code().len(), 1);
    assert_eq!(assertion.code()[0].inputs(), [IrInput::from("m0")]);
}

#[test]
fn test_plan_json() {
    let mut registry = plans::bundled_registry().unwrap();
    let built = registry.build().unwrap();

    let json = serde_json::to_value(&built[1]).unwrap();
    assert_eq!(json["name"], "csr");
    assert_eq!(json["scenarios"][0]["id"], "CSR-001");
    assert_eq!(json["scenarios"][0]["env"]["priv_modes"][0], "supervisor");
    assert_eq!(json["scenarios"][0]["steps"][1]["inputs"][0], "v0");
}
