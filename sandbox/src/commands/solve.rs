// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::Path;

use riscv_testplan::env::TestEnvCfg;
use riscv_testplan::env::predicates::all_predicates;
use riscv_testplan::env::predicates::default_predicates;
use riscv_testplan::solver::Predicate;
use riscv_testplan::solver::TestEnvSolver;

use crate::cli::PredicateSet;
use crate::cli::SolveOptions;
use crate::table;

/// Read a JSON array of environment configurations.
pub fn load_configs(path: &Path) -> Result<Vec<TestEnvCfg>, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    let cfgs = serde_json::from_str(&contents)
        .map_err(|err| format!("Invalid configuration in {}: {err}", path.display()))?;
    Ok(cfgs)
}

fn predicates(set: PredicateSet) -> Vec<Predicate> {
    match set {
        PredicateSet::None => Vec::new(),
        PredicateSet::Default => default_predicates(),
        PredicateSet::All => all_predicates(),
    }
}

pub fn solve(opts: SolveOptions) -> Result<(), Box<dyn Error>> {
    let cfgs = match &opts.config {
        Some(path) => load_configs(path)?,
        None => vec![TestEnvCfg::default()],
    };

    let solver = TestEnvSolver::new(Some(predicates(opts.predicates)), opts.debug);
    let envs = solver.solve(&cfgs);

    if opts.output.json {
        println!("{}", serde_json::to_string_pretty(&envs)?);
    } else {
        println!("{}", table::envs_table(&envs));
        println!(
            "{} environments from {} configurations",
            envs.len(),
            cfgs.len()
        );
    }

    Ok(())
}
