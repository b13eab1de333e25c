//! Kernel definitions.
//!
//! A [`Kernel`] maps a boundary-extended source to an output image. Its value
//! is given by an optional pure definition plus an ordered list of update
//! rules. When several rules match a coordinate the last one wins; when none
//! match and the pure definition is undefined, the destination byte is left
//! as it was.

use crate::core::boundary::{BoundaryPolicy, BoundedInput, ExtendedSource, ResolvedRange};
use crate::core::buffer::RgbaBuffer;
use crate::core::error::{ExecutionError, ExecutionResult, ScheduleError};
use crate::core::expr::{Expr, Sampler};
use crate::core::types::{ScalarType, ScalarValue};
use crate::schedule::Schedule;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which output coordinates an update rule writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Every coordinate.
    All,
    /// Only coordinates on the given channel.
    Channel(i32),
}

impl Predicate {
    /// Whether the rule applies at `(x, y, ch)`.
    pub fn matches(&self, coord: [i32; 3]) -> bool {
        match *self {
            Predicate::All => true,
            Predicate::Channel(ch) => coord[2] == ch,
        }
    }
}

/// One update stage of a kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRule {
    pub predicate: Predicate,
    pub value: Expr,
}

/// A named pure function from a boundary-extended source to an RGBA image.
#[derive(Debug, Clone)]
pub struct Kernel {
    name: String,
    input: BoundedInput,
    pure: Option<Expr>,
    updates: Vec<UpdateRule>,
    schedule: Option<Schedule>,
}

impl Kernel {
    /// Create a kernel with an undefined pure definition and no updates.
    pub fn new(name: impl Into<String>, input: BoundedInput) -> Self {
        Self {
            name: name.into(),
            input,
            pure: None,
            updates: Vec::new(),
            schedule: None,
        }
    }

    /// Set the pure definition.
    pub fn define(mut self, value: impl Into<Expr>) -> Self {
        self.pure = Some(value.into());
        self
    }

    /// Append an update rule.
    pub fn update(mut self, predicate: Predicate, value: impl Into<Expr>) -> Self {
        self.updates.push(UpdateRule {
            predicate,
            value: value.into(),
        });
        self
    }

    /// Append an update writing a single channel.
    pub fn update_channel(self, ch: i32, value: impl Into<Expr>) -> Self {
        self.update(Predicate::Channel(ch), value)
    }

    /// Attach a schedule. The schedule is checked against this kernel's loop
    /// nest and update stages.
    pub fn with_schedule(mut self, schedule: Schedule) -> Result<Self, ScheduleError> {
        schedule.validate(&self)?;
        self.schedule = Some(schedule);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &BoundedInput {
        &self.input
    }

    /// The pure definition; `None` when undefined.
    pub fn pure(&self) -> Option<&Expr> {
        self.pure.as_ref()
    }

    pub fn updates(&self) -> &[UpdateRule] {
        &self.updates
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Every runtime parameter the kernel references, in first-use order:
    /// the source region first, then the pure definition, then the updates.
    pub fn params(&self) -> IndexMap<String, ScalarType> {
        let mut found = self.input.params();
        let exprs = self.pure.iter().chain(self.updates.iter().map(|u| &u.value));
        for expr in exprs {
            for (name, ty) in expr.params() {
                found.entry(name).or_insert(ty);
            }
        }
        found
    }

    /// Substitute concrete parameter values.
    pub fn bind(&self, values: &IndexMap<String, ScalarValue>) -> ExecutionResult<BoundKernel> {
        let unbound = |name: String| ExecutionError::UnboundParameter {
            kernel: self.name.clone(),
            name,
        };

        let region = self.input.resolve(values).map_err(unbound)?;
        let pure = self
            .pure
            .as_ref()
            .map(|e| e.bind_params(values))
            .transpose()
            .map_err(unbound)?;
        let updates = self
            .updates
            .iter()
            .map(|u| {
                Ok(UpdateRule {
                    predicate: u.predicate,
                    value: u.value.bind_params(values).map_err(unbound)?,
                })
            })
            .collect::<ExecutionResult<Vec<_>>>()?;

        Ok(BoundKernel {
            name: self.name.clone(),
            policy: self.input.policy,
            region,
            pure,
            updates,
        })
    }
}

/// A kernel with every parameter replaced by a constant.
#[derive(Debug, Clone)]
pub struct BoundKernel {
    name: String,
    policy: BoundaryPolicy,
    region: [ResolvedRange; 3],
    pure: Option<Expr>,
    updates: Vec<UpdateRule>,
}

impl BoundKernel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved source region.
    pub fn region(&self) -> &[ResolvedRange; 3] {
        &self.region
    }

    /// View `buffer` through this kernel's boundary policy.
    pub fn source<'a>(&self, buffer: &'a RgbaBuffer) -> ExtendedSource<'a> {
        ExtendedSource::new(buffer, self.policy, self.region)
    }

    /// Output sample at `coord`, or `None` where nothing defines it.
    pub fn value_at<S: Sampler + ?Sized>(&self, coord: [i32; 3], source: &S) -> Option<u8> {
        let expr = self
            .updates
            .iter()
            .rev()
            .find(|rule| rule.predicate.matches(coord))
            .map(|rule| &rule.value)
            .or(self.pure.as_ref())?;
        Some(to_sample(expr.eval(coord, source)))
    }
}

fn to_sample(value: ScalarValue) -> u8 {
    match value.cast(ScalarType::UInt8) {
        ScalarValue::UInt8(v) => v,
        _ => 0,
    }
}

/// Several kernels over the same source, realized together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    outputs: Vec<Kernel>,
}

impl Pipeline {
    /// Create a new pipeline.
    pub fn new(name: impl Into<String>, outputs: Vec<Kernel>) -> Self {
        Self {
            name: name.into(),
            outputs,
        }
    }

    /// Wrap a single kernel.
    pub fn single(kernel: Kernel) -> Self {
        Self {
            name: kernel.name.clone(),
            outputs: vec![kernel],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output kernels in declaration order.
    pub fn outputs(&self) -> &[Kernel] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Union of the outputs' parameters, in first-use order.
    pub fn params(&self) -> IndexMap<String, ScalarType> {
        let mut found = IndexMap::new();
        for kernel in &self.outputs {
            for (name, ty) in kernel.params() {
                found.entry(name).or_insert(ty);
            }
        }
        found
    }
}
