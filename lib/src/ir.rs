// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Dependency annotated form of a step list, consumed by code generators.
//!
//! Every step is given an identifier: memory allocating steps are numbered `m0`, `m1`, ... and
//! all other steps `v0`, `v1`, ..., each with its own counter. The inputs of a step refer to the
//! identifiers of the steps it depends on.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;

use crate::log::trace;
use crate::step::Operand;
use crate::step::StepHandle;
use crate::step::Steps;

/// Input of a [`StepIr`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(untagged)]
pub enum IrInput {
    /// Identifier of a step visited earlier
    Id(String),
    Imm(i64),
}

impl fmt::Display for IrInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Imm(imm) => write!(f, "{imm}"),
        }
    }
}

impl From<&str> for IrInput {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<i64> for IrInput {
    fn from(imm: i64) -> Self {
        Self::Imm(imm)
    }
}

/// A step together with its identifier and resolved inputs
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StepIr {
    id: String,
    inputs: Vec<IrInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    code: Vec<StepIr>,
    step: StepHandle,
}

impl StepIr {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn inputs(&self) -> &[IrInput] {
        &self.inputs
    }

    /// IR of the steps embedded in this step
    pub fn code(&self) -> &[StepIr] {
        &self.code
    }

    /// Handle of the step this IR was built from
    pub fn step(&self) -> StepHandle {
        self.step
    }
}

/// Errors raised while building the IR of a step list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IrError {
    #[error("Step {step} depends on step {dependency} which has not been visited yet")]
    UnresolvedDependency {
        step: StepHandle,
        dependency: StepHandle,
    },

    #[error("Step {0} is not part of the step arena")]
    UnknownStep(StepHandle),

    #[error("Step {0} appears more than once")]
    StepRevisited(StepHandle),
}

/// Build the IR for the top-level order of `steps`.
///
/// Steps must be ordered such that every step comes after the steps it depends on. The exception
/// are memory allocating steps, which may be referenced before they are visited.
pub fn build_step_ir(steps: &Steps) -> Result<Vec<StepIr>, IrError> {
    let mut builder = IrBuilder::new(steps);
    steps
        .order()
        .iter()
        .map(|&handle| builder.build_step(handle))
        .collect()
}

struct IrBuilder<'a> {
    steps: &'a Steps,
    next_value: usize,
    next_memory: usize,
    ids: HashMap<StepHandle, String>,
    visited: HashSet<StepHandle>,
}

impl<'a> IrBuilder<'a> {
    fn new(steps: &'a Steps) -> Self {
        Self {
            steps,
            next_value: 0,
            next_memory: 0,
            ids: HashMap::new(),
            visited: HashSet::new(),
        }
    }

    fn build_step(&mut self, handle: StepHandle) -> Result<StepIr, IrError> {
        let steps = self.steps;
        let step = steps.get(handle).ok_or(IrError::UnknownStep(handle))?;

        if !self.visited.insert(handle) {
            return Err(IrError::StepRevisited(handle));
        }

        // Memory may already have an identifier if it was referenced before being visited
        let id = match self.ids.get(&handle) {
            Some(id) => id.clone(),
            None => {
                let id = if step.is_memory() {
                    self.fresh_memory_id()
                } else {
                    self.fresh_value_id()
                };
                self.ids.insert(handle, id.clone());
                id
            }
        };

        trace!(%handle, %id, kind = ?step.kind(), "Assigned IR identifier");

        let inputs = step
            .dependencies()
            .into_iter()
            .map(|operand| self.resolve(handle, operand))
            .collect::<Result<Vec<_>, _>>()?;

        let code = step
            .code()
            .iter()
            .map(|&nested| self.build_step(nested))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StepIr {
            id,
            inputs,
            code,
            step: handle,
        })
    }

    fn resolve(&mut self, step: StepHandle, operand: Operand) -> Result<IrInput, IrError> {
        let dependency = match operand {
            Operand::Imm(imm) => return Ok(IrInput::Imm(imm)),
            Operand::Step(dependency) => dependency,
        };

        if let Some(id) = self.ids.get(&dependency) {
            return Ok(IrInput::Id(id.clone()));
        }

        let target = self
            .steps
            .get(dependency)
            .ok_or(IrError::UnknownStep(dependency))?;

        if !target.is_memory() {
            return Err(IrError::UnresolvedDependency { step, dependency });
        }

        let id = self.fresh_memory_id();
        trace!(handle = %dependency, %id, "Assigned IR identifier to referenced memory");
        self.ids.insert(dependency, id.clone());
        Ok(IrInput::Id(id))
    }

    fn fresh_value_id(&mut self) -> String {
        let id = format!("v{}", self.next_value);
        self.next_value += 1;
        id
    }

    fn fresh_memory_id(&mut self) -> String {
        let id = format!("m{}", self.next_memory);
        self.next_memory += 1;
        id
    }
}

/// Pre-order iterator over a list of [`StepIr`] and their embedded code
pub struct Flatten<'a> {
    stack: Vec<&'a StepIr>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a StepIr;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.code.iter().rev());
        Some(next)
    }
}

/// Walk `ir` depth-first, yielding every step before the steps embedded in it.
pub fn flatten(ir: &[StepIr]) -> Flatten<'_> {
    Flatten {
        stack: ir.iter().rev().collect(),
    }
}
