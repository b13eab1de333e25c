//! Schedule directives and their validation.
//!
//! A schedule is an annotation on a kernel: it controls how the output domain
//! is split into loops and which loops run in parallel or as vectors. It never
//! changes the value computed at any coordinate.

use crate::core::error::ScheduleError;
use crate::core::kernel::Kernel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A loop variable of a kernel's loop nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopVar {
    X,
    Y,
    Ch,
    /// Outer x after tiling.
    Xo,
    /// Outer y after tiling.
    Yo,
    /// Inner x after tiling.
    Xi,
    /// Inner y after tiling.
    Yi,
    /// Fused tile index.
    Ti,
}

impl fmt::Display for LoopVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopVar::X => "x",
            LoopVar::Y => "y",
            LoopVar::Ch => "ch",
            LoopVar::Xo => "xo",
            LoopVar::Yo => "yo",
            LoopVar::Xi => "xi",
            LoopVar::Yi => "yi",
            LoopVar::Ti => "ti",
        };
        write!(f, "{}", name)
    }
}

/// One scheduling directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// Compute this kernel inside `producer`'s loop over `var`.
    ComputeAt { producer: String, var: LoopVar },
    /// Split x and y into `width x height` tiles: `(x, y)` becomes
    /// `(xi, yi, xo, yo)`, innermost first.
    Tile { width: u32, height: u32 },
    /// Merge two adjacent loops into one.
    Fuse {
        inner: LoopVar,
        outer: LoopVar,
        fused: LoopVar,
    },
    /// Run a loop's iterations in parallel, `task_size` iterations per task.
    Parallel { var: LoopVar, task_size: Option<u32> },
    /// Evaluate a loop in vectors of `width` lanes.
    Vectorize { var: LoopVar, width: u32 },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::ComputeAt { producer, var } => write!(f, "compute_at({}, {})", producer, var),
            Directive::Tile { width, height } => {
                write!(f, "tile(x, y, xo, yo, xi, yi, {}, {})", width, height)
            }
            Directive::Fuse {
                inner,
                outer,
                fused,
            } => write!(f, "fuse({}, {}, {})", inner, outer, fused),
            Directive::Parallel {
                var,
                task_size: Some(size),
            } => write!(f, "parallel({}, {})", var, size),
            Directive::Parallel { var, task_size: None } => write!(f, "parallel({})", var),
            Directive::Vectorize { var, width } => write!(f, "vectorize({}, {})", var, width),
        }
    }
}

/// Ordered directives plus the set of update stages marked unscheduled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    directives: Vec<Directive>,
    unscheduled: BTreeSet<usize>,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_at(mut self, producer: impl Into<String>, var: LoopVar) -> Self {
        self.directives.push(Directive::ComputeAt {
            producer: producer.into(),
            var,
        });
        self
    }

    pub fn tile(mut self, width: u32, height: u32) -> Self {
        self.directives.push(Directive::Tile { width, height });
        self
    }

    pub fn fuse(mut self, inner: LoopVar, outer: LoopVar, fused: LoopVar) -> Self {
        self.directives.push(Directive::Fuse {
            inner,
            outer,
            fused,
        });
        self
    }

    pub fn parallel(mut self, var: LoopVar) -> Self {
        self.directives.push(Directive::Parallel {
            var,
            task_size: None,
        });
        self
    }

    /// Parallel loop with `task_size` iterations per task.
    pub fn parallel_tasks(mut self, var: LoopVar, task_size: u32) -> Self {
        self.directives.push(Directive::Parallel {
            var,
            task_size: Some(task_size),
        });
        self
    }

    pub fn vectorize(mut self, var: LoopVar, width: u32) -> Self {
        self.directives.push(Directive::Vectorize { var, width });
        self
    }

    /// Mark update stage `index` as deliberately left unscheduled.
    pub fn unscheduled(mut self, index: usize) -> Self {
        self.unscheduled.insert(index);
        self
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Update stages marked unscheduled, ascending.
    pub fn unscheduled_updates(&self) -> impl Iterator<Item = usize> + '_ {
        self.unscheduled.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.unscheduled.is_empty()
    }

    /// Check the schedule against `kernel` and return the resulting loop nest,
    /// innermost first.
    ///
    /// Directives are replayed in order over the nest `[x, y, ch]`. Every
    /// update stage of the kernel must be marked unscheduled, and no
    /// unscheduled index may name a stage that does not exist.
    pub fn validate(&self, kernel: &Kernel) -> Result<Vec<LoopVar>, ScheduleError> {
        let name = kernel.name();
        let mut nest = vec![LoopVar::X, LoopVar::Y, LoopVar::Ch];
        let mut placements = Vec::new();

        for directive in &self.directives {
            match directive {
                Directive::ComputeAt { producer, var } => {
                    if producer != &kernel.input().source {
                        return Err(ScheduleError::UnknownProducer {
                            kernel: name.to_string(),
                            producer: producer.clone(),
                        });
                    }
                    placements.push(*var);
                }
                Directive::Tile { width, height } => {
                    check_factor(name, "tile", *width)?;
                    check_factor(name, "tile", *height)?;
                    let at = position(name, &nest, LoopVar::X)?;
                    if nest.get(at + 1) != Some(&LoopVar::Y) {
                        return Err(unknown_var(name, LoopVar::Y));
                    }
                    for var in [LoopVar::Xi, LoopVar::Yi, LoopVar::Xo, LoopVar::Yo] {
                        ensure_absent(name, &nest, var)?;
                    }
                    nest.splice(
                        at..at + 2,
                        [LoopVar::Xi, LoopVar::Yi, LoopVar::Xo, LoopVar::Yo],
                    );
                }
                Directive::Fuse {
                    inner,
                    outer,
                    fused,
                } => {
                    let at = position(name, &nest, *inner)?;
                    if nest.get(at + 1) != Some(outer) {
                        return Err(unknown_var(name, *outer));
                    }
                    ensure_absent(name, &nest, *fused)?;
                    nest.splice(at..at + 2, [*fused]);
                }
                Directive::Parallel { var, task_size } => {
                    position(name, &nest, *var)?;
                    if let Some(size) = task_size {
                        check_factor(name, "parallel", *size)?;
                    }
                }
                Directive::Vectorize { var, width } => {
                    position(name, &nest, *var)?;
                    check_factor(name, "vectorize", *width)?;
                }
            }
        }

        // compute_at may name a loop created by a later directive.
        for var in placements {
            position(name, &nest, var)?;
        }

        let count = kernel.updates().len();
        if let Some(&index) = self.unscheduled.iter().find(|&&i| i >= count) {
            return Err(ScheduleError::UnknownUpdate {
                kernel: name.to_string(),
                index,
                count,
            });
        }
        if let Some(index) = (0..count).find(|i| !self.unscheduled.contains(i)) {
            return Err(ScheduleError::UpdateNotScheduled {
                kernel: name.to_string(),
                index,
            });
        }

        Ok(nest)
    }
}

fn unknown_var(kernel: &str, var: LoopVar) -> ScheduleError {
    ScheduleError::UnknownLoopVar {
        kernel: kernel.to_string(),
        var: var.to_string(),
    }
}

fn position(kernel: &str, nest: &[LoopVar], var: LoopVar) -> Result<usize, ScheduleError> {
    nest.iter()
        .position(|v| *v == var)
        .ok_or_else(|| unknown_var(kernel, var))
}

fn ensure_absent(kernel: &str, nest: &[LoopVar], var: LoopVar) -> Result<(), ScheduleError> {
    if nest.contains(&var) {
        return Err(ScheduleError::DuplicateLoopVar {
            kernel: kernel.to_string(),
            var: var.to_string(),
        });
    }
    Ok(())
}

fn check_factor(kernel: &str, directive: &str, factor: u32) -> Result<(), ScheduleError> {
    if factor == 0 {
        return Err(ScheduleError::InvalidFactor {
            kernel: kernel.to_string(),
            directive: directive.to_string(),
            factor,
        });
    }
    Ok(())
}
