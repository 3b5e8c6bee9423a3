// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Turn environment configurations into the concrete environments a scenario runs under.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::env::TestEnv;
use crate::env::TestEnvCfg;
use crate::env::predicates;
use crate::log::debug;
use crate::log::info;
use crate::log::trace;

type Check = dyn Fn(&TestEnv) -> bool + Send + Sync;

/// Named legality rule over [`TestEnv`].
///
/// Predicates must be pure. A predicate that panics is not caught by the solver.
#[derive(Clone)]
pub struct Predicate {
    name: Cow<'static, str>,
    check: Arc<Check>,
}

impl Predicate {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        check: impl Fn(&TestEnv) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Does the environment satisfy this rule?
    pub fn holds(&self, env: &TestEnv) -> bool {
        (self.check)(env)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.name).finish()
    }
}

/// Stable deduplication which keeps the first occurrence of every environment.
pub fn remove_duplicates(envs: impl IntoIterator<Item = TestEnv>) -> Vec<TestEnv> {
    envs.into_iter().unique().collect()
}

/// Expands, deduplicates and filters [`TestEnvCfg`]s.
#[derive(Debug, Clone)]
pub struct TestEnvSolver {
    predicates: Vec<Predicate>,
    debug: bool,
}

impl TestEnvSolver {
    /// Create a solver. `None` installs [`predicates::default_predicates`].
    ///
    /// With `debug` enabled, every generated environment and every predicate evaluation is
    /// traced. The solver output is the same either way.
    pub fn new(predicates: Option<Vec<Predicate>>, debug: bool) -> Self {
        Self {
            predicates: predicates.unwrap_or_else(predicates::default_predicates),
            debug,
        }
    }

    /// Register another predicate. Duplicates are evaluated again.
    pub fn add_predicate(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Produce the de-duplicated environments of `cfgs` which satisfy every predicate.
    pub fn solve(&self, cfgs: &[TestEnvCfg]) -> Vec<TestEnv> {
        let generated = cfgs
            .iter()
            .flat_map(TestEnvCfg::generate_all_cfgs)
            .collect::<Vec<_>>();
        if self.debug {
            for env in &generated {
                debug!(%env, "Generated environment");
            }
            debug!(
                configs = cfgs.len(),
                generated = generated.len(),
                "Generated test environments"
            );
        }

        let unique = remove_duplicates(generated);
        if self.debug {
            debug!(unique = unique.len(), "Removed duplicate environments");
        }

        let solved = unique
            .into_iter()
            .filter(|env| self.accepts(env))
            .collect::<Vec<_>>();
        if self.debug {
            info!(valid = solved.len(), "Solved test environments");
        }

        solved
    }

    fn accepts(&self, env: &TestEnv) -> bool {
        if self.debug {
            debug!(%env, "Checking environment");
        }

        self.predicates.iter().all(|predicate| {
            let holds = predicate.holds(env);
            if self.debug {
                trace!(%env, predicate = predicate.name(), holds, "Evaluated predicate");
            }
            holds
        })
    }
}

impl Default for TestEnvSolver {
    fn default() -> Self {
        Self::new(None, false)
    }
}
