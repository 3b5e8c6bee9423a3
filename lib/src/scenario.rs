// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use crate::env::EnvCfgError;
use crate::env::TestEnv;
use crate::env::TestEnvCfg;
use crate::ir::IrError;
use crate::ir::StepIr;
use crate::ir::build_step_ir;
use crate::log::debug;
use crate::solver::TestEnvSolver;
use crate::step::StepHandle;
use crate::step::Steps;
use crate::step::TestStep;

/// Errors raised while authoring a scenario
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid environment configuration: {0}")]
    Env(#[from] EnvCfgError),

    #[error("Malformed step list: {0}")]
    Ir(#[from] IrError),
}

/// Errors raised when assembling a [`TestPlan`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Test plan {plan:?} has no scenarios")]
    NoScenarios { plan: String },
}

/// Descriptive metadata of a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioInfo {
    pub name: String,
    pub description: String,
    pub id: String,
    pub env: TestEnvCfg,
}

impl ScenarioInfo {
    /// Scenario with an empty description, running under the default configuration.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            id: id.into(),
            env: TestEnvCfg::default(),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    pub fn with_env(self, env: TestEnvCfg) -> Self {
        Self { env, ..self }
    }
}

/// One named test case: an environment configuration plus the IR of its steps
#[derive(Debug, Clone, serde::Serialize)]
pub struct TestScenario {
    name: String,
    description: String,
    id: String,
    env: TestEnvCfg,
    steps: Vec<StepIr>,
    #[serde(skip)]
    arena: Steps,
}

impl TestScenario {
    /// Build the IR of `steps` and wrap it into a scenario.
    pub fn from_steps(info: ScenarioInfo, steps: Steps) -> Result<Self, IrError> {
        let ir = build_step_ir(&steps)?;
        debug!(
            scenario = info.id.as_str(),
            steps = ir.len(),
            "Built scenario IR"
        );

        Ok(Self {
            name: info.name,
            description: info.description,
            id: info.id,
            env: info.env,
            steps: ir,
            arena: steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Environment configuration, not yet solved into concrete environments
    pub fn env(&self) -> &TestEnvCfg {
        &self.env
    }

    pub fn steps(&self) -> &[StepIr] {
        &self.steps
    }

    /// Resolve the step an IR entry was built from.
    pub fn step(&self, handle: StepHandle) -> Option<&TestStep> {
        self.arena.get(handle)
    }

    /// Concrete environments this scenario runs under.
    pub fn solve_envs(&self, solver: &TestEnvSolver) -> Vec<TestEnv> {
        solver.solve(std::slice::from_ref(&self.env))
    }
}

/// Named, non-empty collection of scenarios
#[derive(Debug, Clone, serde::Serialize)]
pub struct TestPlan {
    name: String,
    description: String,
    scenarios: Vec<TestScenario>,
}

impl TestPlan {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        scenarios: Vec<TestScenario>,
    ) -> Result<Self, PlanError> {
        let name = name.into();

        if scenarios.is_empty() {
            return Err(PlanError::NoScenarios { plan: name });
        }

        Ok(Self {
            name,
            description: description.into(),
            scenarios,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scenarios(&self) -> &[TestScenario] {
        &self.scenarios
    }

    pub fn scenario(&self, id: &str) -> Option<&TestScenario> {
        self.scenarios.iter().find(|scenario| scenario.id == id)
    }
}
