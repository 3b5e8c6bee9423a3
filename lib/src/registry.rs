// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Registry of test plans.
//!
//! Scenario factories are registered under a plan name while the registry is being populated.
//! The first [`TestPlanRegistry::build`] runs every factory and freezes the registry: after that
//! the plans are available and no more factories can be registered.

use crate::log::debug;
use crate::log::info;
use crate::scenario::PlanError;
use crate::scenario::ScenarioError;
use crate::scenario::TestPlan;
use crate::scenario::TestScenario;

/// Zero-argument function producing one scenario of a plan
pub type ScenarioFactory = fn() -> Result<TestScenario, ScenarioError>;

/// Errors raised by the [`TestPlanRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("The registry has already been built")]
    AlreadyBuilt,

    #[error("The registry has not been built yet")]
    NotBuilt,

    #[error("Failed to build a scenario of plan {plan:?}: {source}")]
    Scenario {
        plan: String,
        source: ScenarioError,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

struct PendingPlan {
    name: String,
    description: String,
    factories: Vec<ScenarioFactory>,
}

impl PendingPlan {
    fn build(&self) -> Result<TestPlan, RegistryError> {
        let scenarios = self
            .factories
            .iter()
            .map(|factory| {
                factory().map_err(|source| RegistryError::Scenario {
                    plan: self.name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            plan = self.name.as_str(),
            scenarios = scenarios.len(),
            "Built test plan"
        );

        Ok(TestPlan::new(
            self.name.as_str(),
            self.description.as_str(),
            scenarios,
        )?)
    }
}

enum RegistryState {
    Building(Vec<PendingPlan>),
    Built(Vec<TestPlan>),
}

/// Collects scenario factories per plan and builds the plans lazily, once
pub struct TestPlanRegistry {
    state: RegistryState,
}

impl TestPlanRegistry {
    pub fn new() -> Self {
        Self {
            state: RegistryState::Building(Vec::new()),
        }
    }

    /// Associate `factory` with the plan `plan_name`.
    ///
    /// Plans are created on first registration; the description given then is kept.
    pub fn register(
        &mut self,
        plan_name: &str,
        description: &str,
        factory: ScenarioFactory,
    ) -> Result<(), RegistryError> {
        let RegistryState::Building(pending) = &mut self.state else {
            return Err(RegistryError::AlreadyBuilt);
        };

        match pending.iter_mut().find(|plan| plan.name == plan_name) {
            Some(plan) => plan.factories.push(factory),
            None => pending.push(PendingPlan {
                name: plan_name.to_string(),
                description: description.to_string(),
                factories: vec![factory],
            }),
        }

        Ok(())
    }

    /// Run every registered factory and freeze the registry.
    ///
    /// Later calls return the plans built by the first successful call. If a factory fails the
    /// registry stays open.
    pub fn build(&mut self) -> Result<&[TestPlan], RegistryError> {
        if let RegistryState::Building(pending) = &self.state {
            let plans = pending
                .iter()
                .map(PendingPlan::build)
                .collect::<Result<Vec<_>, _>>()?;

            info!(plans = plans.len(), "Test plan registry built");
            self.state = RegistryState::Built(plans);
        }

        self.plans()
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, RegistryState::Built(_))
    }

    /// Plans of a built registry
    pub fn plans(&self) -> Result<&[TestPlan], RegistryError> {
        match &self.state {
            RegistryState::Built(plans) => Ok(plans),
            RegistryState::Building(_) => Err(RegistryError::NotBuilt),
        }
    }

    /// Look up a plan of a built registry by name.
    pub fn plan(&self, name: &str) -> Result<Option<&TestPlan>, RegistryError> {
        Ok(self.plans()?.iter().find(|plan| plan.name() == name))
    }
}

impl Default for TestPlanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::RegistryError;
    use super::TestPlanRegistry;
    use crate::env::EnvCfgError;
    use crate::env::TestEnvCfg;
    use crate::scenario::ScenarioError;
    use crate::scenario::ScenarioInfo;
    use crate::scenario::TestScenario;
    use crate::step::LoadImmediate;
    use crate::step::Steps;

    fn first() -> Result<TestScenario, ScenarioError> {
        let mut steps = Steps::new();
        steps.push(LoadImmediate { imm: 1 });
        Ok(TestScenario::from_steps(
            ScenarioInfo::new("T-1", "first"),
            steps,
        )?)
    }

    fn second() -> Result<TestScenario, ScenarioError> {
        let mut steps = Steps::new();
        steps.push(LoadImmediate { imm: 2 });
        Ok(TestScenario::from_steps(
            ScenarioInfo::new("T-2", "second"),
            steps,
        )?)
    }

    fn broken() -> Result<TestScenario, ScenarioError> {
        let env = TestEnvCfg::builder().min_num_harts(0).build()?;
        Ok(TestScenario::from_steps(
            ScenarioInfo::new("T-3", "broken").with_env(env),
            Steps::new(),
        )?)
    }

    #[test]
    fn test_build_groups_by_plan() {
        let mut registry = TestPlanRegistry::new();
        registry.register("alpha", "first plan", first).unwrap();
        registry.register("beta", "second plan", second).unwrap();
        registry.register("alpha", "ignored", second).unwrap();

        assert_eq!(registry.plans().unwrap_err(), RegistryError::NotBuilt);

        let plans = registry.build().unwrap();
        let shape = plans
            .iter()
            .map(|plan| {
                let ids = plan
                    .scenarios()
                    .iter()
                    .map(|scenario| scenario.id())
                    .collect::<Vec<_>>();
                (plan.name(), plan.description(), ids)
            })
            .collect::<Vec<_>>();

        assert_eq!(shape, [
            ("alpha", "first plan", vec!["T-1", "T-2"]),
            ("beta", "second plan", vec!["T-2"]),
        ]);
        assert!(registry.is_built());
    }

    #[test]
    fn test_built_registry_is_frozen() {
        let mut registry = TestPlanRegistry::default();
        registry.register("alpha", "", first).unwrap();
        registry.build().unwrap();

        assert_eq!(
            registry.register("alpha", "", second),
            Err(RegistryError::AlreadyBuilt)
        );

        // Building again returns the same plans
        assert_eq!(registry.build().unwrap().len(), 1);
        assert_eq!(registry.plan("alpha").unwrap().unwrap().scenarios().len(), 1);
        assert!(registry.plan("gamma").unwrap().is_none());
    }

    #[test]
    fn test_failing_factory_keeps_registry_open() {
        let mut registry = TestPlanRegistry::new();
        registry.register("alpha", "", first).unwrap();
        registry.register("alpha", "", broken).unwrap();

        assert_eq!(
            registry.build().unwrap_err(),
            RegistryError::Scenario {
                plan: "alpha".to_string(),
                source: ScenarioError::Env(EnvCfgError::InvalidHartCount(0)),
            }
        );
        assert!(!registry.is_built());
        assert!(registry.register("beta", "", second).is_ok());
    }

    #[test]
    fn test_empty_registry_builds() {
        let mut registry = TestPlanRegistry::new();
        assert!(registry.build().unwrap().is_empty());
    }
}
