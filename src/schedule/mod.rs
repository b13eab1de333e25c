//! Scheduling layer.
//!
//! Schedules describe execution strategy only. Any schedule is
//! result-equivalent to evaluating the kernel sequentially.

pub mod directive;
pub mod plan;
pub mod tiling;

pub use directive::{Directive, LoopVar, Schedule};
pub use plan::{ExecutionPlan, WorkUnit};
pub use tiling::{TileIterator, TileRegion};
