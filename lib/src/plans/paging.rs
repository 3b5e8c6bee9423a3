// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Address translation scenarios: accessed/dirty bit updates and page faults.

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
use crate::step::AccessKind;
use crate::step::Arithmetic;
use crate::step::ArithmeticOp;
use crate::step::AssertEqual;
use crate::step::AssertException;
use crate::step::AssertNotEqual;
use crate::step::Call;
use crate::step::CodePage;
use crate::step::Directive;
use crate::step::ExceptionCause;
use crate::step::Load;
use crate::step::LoadAddress;
use crate::step::LoadImmediate;
use crate::step::MemAccess;
use crate::step::Memory;
use crate::step::ModifyPte;
use crate::step::PteFlags;
use crate::step::ReadLeafPte;
use crate::step::StepHandle;
use crate::step::Steps;
use crate::step::Store;

pub const PLAN_NAME: &str = "paging";

const PLAN_DESCRIPTION: &str =
    "Hardware updates of the accessed and dirty bits, and faults raised by leaf PTE permissions";

const SCENARIOS: [ScenarioFactory; 7] = [
    load_sets_accessed,
    load_leaves_dirty_clear,
    store_sets_accessed_and_dirty,
    call_sets_accessed_on_code_page,
    invalid_leaf_load_faults,
    read_only_store_faults,
    non_executable_fetch_faults,
];

pub fn register(registry: &mut TestPlanRegistry) -> Result<(), RegistryError> {
    for factory in SCENARIOS {
        registry.register(PLAN_NAME, PLAN_DESCRIPTION, factory)?;
    }
    Ok(())
}

/// Supervisor mode with every translation scheme enabled. Pages are mapped without `U`, so user
/// mode would fault on every access.
fn paging_env() -> Result<TestEnvCfg, EnvCfgError> {
    TestEnvCfg::builder()
        .priv_modes([PrivilegeMode::Supervisor])
        .hypervisor([false])
        .paging_modes([PagingMode::Sv39, PagingMode::Sv48, PagingMode::Sv57])
        .build()
}

fn info(id: &str, name: &str, description: &str) -> Result<ScenarioInfo, EnvCfgError> {
    Ok(ScenarioInfo::new(id, name)
        .with_description(description)
        .with_env(paging_env()?))
}

/// Data page whose leaf PTE starts with the accessed and dirty bits cleared.
fn fresh_page(steps: &mut Steps, flags: PteFlags) -> StepHandle {
    let page = steps.push(Memory::new(0x1000).with_flags(flags));
    steps.push(ModifyPte {
        memory: page,
        set: PteFlags::empty(),
        clear: PteFlags::A | PteFlags::D,
    });
    page
}

/// Mask the leaf PTE of `memory` with `bits`.
fn pte_bits(steps: &mut Steps, memory: StepHandle, bits: PteFlags) -> (StepHandle, StepHandle) {
    let pte = steps.push(ReadLeafPte { memory });
    let mask = steps.push(LoadImmediate {
        imm: i64::from(bits.bits()),
    });
    let masked = steps.push(Arithmetic::new(ArithmeticOp::And, pte, mask));
    (masked, mask)
}

fn assert_pte_bits_set(steps: &mut Steps, memory: StepHandle, bits: PteFlags) {
    let (masked, mask) = pte_bits(steps, memory, bits);
    steps.push(AssertEqual::new(masked, mask));
}

fn load_sets_accessed() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let page = fresh_page(&mut steps, PteFlags::V | PteFlags::R | PteFlags::W);
    steps.push(Load::new(page));
    assert_pte_bits_set(&mut steps, page, PteFlags::A);

    Ok(TestScenario::from_steps(
        info(
            "PG-AD-001",
            "load_sets_accessed",
            "A load through a leaf PTE with A clear sets A",
        )?,
        steps,
    )?)
}

fn load_leaves_dirty_clear() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let page = fresh_page(&mut steps, PteFlags::V | PteFlags::R | PteFlags::W);
    steps.push(Load::new(page));
    let (dirty, mask) = pte_bits(&mut steps, page, PteFlags::D);
    steps.push(AssertNotEqual::new(dirty, mask));

    Ok(TestScenario::from_steps(
        info(
            "PG-AD-002",
            "load_leaves_dirty_clear",
            "A load never sets the dirty bit",
        )?,
        steps,
    )?)
}

fn store_sets_accessed_and_dirty() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let page = fresh_page(&mut steps, PteFlags::V | PteFlags::R | PteFlags::W);
    let address = steps.push(LoadAddress { target: page });
    steps.push(Store::new(page, address).with_offset(8_i64));
    assert_pte_bits_set(&mut steps, page, PteFlags::A | PteFlags::D);

    let stored = steps.push(Load::new(page).with_offset(8_i64));
    steps.push(AssertEqual::new(stored, address));

    Ok(TestScenario::from_steps(
        info(
            "PG-AD-003",
            "store_sets_accessed_and_dirty",
            "A store through a leaf PTE with A and D clear sets both",
        )?,
        steps,
    )?)
}

fn call_sets_accessed_on_code_page() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let marker = steps.alloc(LoadImmediate { imm: 0x600d });
    let ret = steps.alloc(Directive {
        text: "ret".to_string(),
    });
    let code = steps.push(CodePage::new(vec![marker, ret]));
    steps.push(ModifyPte {
        memory: code,
        set: PteFlags::empty(),
        clear: PteFlags::A,
    });
    steps.push(Call { target: code });
    assert_pte_bits_set(&mut steps, code, PteFlags::A);

    Ok(TestScenario::from_steps(
        info(
            "PG-AD-004",
            "call_sets_accessed_on_code_page",
            "Fetching from a code page whose leaf PTE has A clear sets A",
        )?,
        steps,
    )?)
}

fn invalid_leaf_load_faults() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let page = steps.push(Memory::new(0x1000));
    steps.push(ModifyPte {
        memory: page,
        set: PteFlags::empty(),
        clear: PteFlags::V,
    });
    let load = steps.alloc(Load::new(page));
    steps.push(AssertException {
        cause: ExceptionCause::LoadPageFault,
        code: vec![load],
    });

    Ok(TestScenario::from_steps(
        info(
            "PG-PF-001",
            "invalid_leaf_load_faults",
            "Loading through a leaf PTE with V clear raises a load page fault",
        )?,
        steps,
    )?)
}

fn read_only_store_faults() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let page = steps.push(Memory::new(0x1000));
    steps.push(ModifyPte {
        memory: page,
        set: PteFlags::empty(),
        clear: PteFlags::W,
    });
    let value = steps.push(LoadImmediate { imm: -1 });
    let store = steps.alloc(Store::new(page, value));
    steps.push(AssertException {
        cause: ExceptionCause::StorePageFault,
        code: vec![store],
    });

    Ok(TestScenario::from_steps(
        info(
            "PG-PF-002",
            "read_only_store_faults",
            "Storing through a leaf PTE with W clear raises a store page fault",
        )?,
        steps,
    )?)
}

fn non_executable_fetch_faults() -> Result<TestScenario, ScenarioError> {
    let mut steps = Steps::new();
    let page = steps.push(Memory::new(0x1000));
    let fetch = steps.alloc(MemAccess {
        memory: page,
        offset: None,
        kind: AccessKind::Execute,
    });
    steps.push(AssertException {
        cause: ExceptionCause::InstructionPageFault,
        code: vec![fetch],
    });

    Ok(TestScenario::from_steps(
        info(
            "PG-PF-003",
            "non_executable_fetch_faults",
            "Fetching from a leaf PTE with X clear raises an instruction page fault",
        )?,
        steps,
    )?)
}
