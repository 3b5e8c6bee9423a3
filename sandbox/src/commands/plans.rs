// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::error::Error;

use riscv_testplan::plans::bundled_registry;
use riscv_testplan::scenario::TestPlan;
use riscv_testplan::solver::TestEnvSolver;

use crate::cli::PlansOptions;
use crate::table;

/// Select the plans named by `filter`, or every plan.
fn select<'a>(plans: &'a [TestPlan], filter: Option<&str>) -> Result<Vec<&'a TestPlan>, String> {
    match filter {
        None => Ok(plans.iter().collect()),
        Some(name) => plans
            .iter()
            .find(|plan| plan.name() == name)
            .map(|plan| vec![plan])
            .ok_or_else(|| format!("Unknown test plan {name:?}")),
    }
}

pub fn plans(opts: PlansOptions) -> Result<(), Box<dyn Error>> {
    let mut registry = bundled_registry()?;
    let built = registry.build()?;
    let selected = select(built, opts.plan.as_deref())?;

    if opts.output.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    let solver = TestEnvSolver::default();
    for plan in selected {
        println!("{}: {}", plan.name(), plan.description());
        println!("{}", table::plan_table(plan));

        if opts.envs {
            for scenario in plan.scenarios() {
                let envs = scenario.solve_envs(&solver);
                println!("{} runs under {} environments", scenario.id(), envs.len());
                println!("{}", table::envs_table(&envs));
            }
        }
    }

    Ok(())
}
