// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use comfy_table::Attribute;
use comfy_table::Cell;
use comfy_table::CellAlignment;
use comfy_table::Color;
use comfy_table::ContentArrangement;
use comfy_table::Table;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use itertools::Itertools;
use riscv_testplan::env::TestEnv;
use riscv_testplan::ir::StepIr;
use riscv_testplan::scenario::TestPlan;
use riscv_testplan::scenario::TestScenario;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| {
            Cell::new(name)
                .add_attribute(Attribute::Bold)
                .fg(Color::DarkCyan)
                .set_alignment(CellAlignment::Center)
        })
        .collect()
}

pub fn envs_table(envs: &[TestEnv]) -> Table {
    let mut table = new_table();
    table.set_header(header_cells(&[
        "XLEN",
        "Mode",
        "Hypervisor",
        "Paging",
        "Page sizes",
        "Harts",
    ]));

    for env in envs {
        table.add_row(vec![
            Cell::new(env.reg_width()).set_alignment(CellAlignment::Right),
            Cell::new(env.priv_mode()),
            Cell::new(env.hypervisor()),
            Cell::new(env.paging_mode()),
            Cell::new(env.page_size()),
            Cell::new(env.hart_count()).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Add the rows of `ir`, indenting nested code by `depth`.
fn add_step_rows(table: &mut Table, scenario: &TestScenario, ir: &[StepIr], depth: usize) {
    for step in ir {
        let kind = scenario
            .step(step.step())
            .map_or_else(|| "?".to_string(), |s| format!("{:?}", s.kind()));
        let indent = "  ".repeat(depth);

        table.add_row(vec![
            Cell::new(""),
            Cell::new(format!("{indent}{}", step.id())),
            Cell::new(format!("{indent}{kind}")),
            Cell::new(step.inputs().iter().join(", ")),
        ]);

        add_step_rows(table, scenario, step.code(), depth + 1);
    }
}

/// One section per scenario, listing its steps in IR order.
pub fn plan_table(plan: &TestPlan) -> Table {
    let mut table = new_table();
    table.set_header(header_cells(&["Scenario", "Step", "Kind", "Inputs"]));

    for scenario in plan.scenarios() {
        table.add_row(vec![
            Cell::new(scenario.id())
                .fg(Color::DarkGreen)
                .add_attribute(Attribute::Bold),
            Cell::new(scenario.name()),
            Cell::new(""),
            Cell::new(scenario.description()),
        ]);
        add_step_rows(&mut table, scenario, scenario.steps(), 0);
    }

    table
}

#[cfg(test)]
mod tests {
    use riscv_testplan::env::TestEnvCfg;
    use riscv_testplan::plans::bundled_registry;
    use riscv_testplan::plans::paging;
    use riscv_testplan::solver::TestEnvSolver;

    use super::envs_table;
    use super::plan_table;

    #[test]
    fn test_envs_table() {
        let envs = TestEnvSolver::default().solve(&[TestEnvCfg::default()]);
        let table = envs_table(&envs);

        assert_eq!(table.row_iter().count(), envs.len());
        let rendered = table.to_string();
        assert!(rendered.contains("sv57"));
        assert!(rendered.contains("[4K,2M,1G]"));
    }

    #[test]
    fn test_plan_table() {
        let mut registry = bundled_registry().unwrap();
        registry.build().unwrap();
        let plan = registry.plan(paging::PLAN_NAME).unwrap().unwrap();

        let rendered = plan_table(plan).to_string();
        for scenario in plan.scenarios() {
            assert!(rendered.contains(scenario.id()));
        }
        assert!(rendered.contains("AssertException"));
    }
}
