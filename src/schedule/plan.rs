//! Lowering a schedule into concrete units of work.

use crate::schedule::directive::{Directive, LoopVar, Schedule};
use crate::schedule::tiling::{TileIterator, TileRegion};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How the evaluator walks an output domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Tile shape, if the spatial loops are tiled.
    pub tile: Option<(u32, u32)>,
    /// Spatial units (tiles, or rows when untiled) per parallel task.
    /// `None` runs the spatial loops serially.
    pub spatial_tasks: Option<u32>,
    /// Whether channels are separate parallel units.
    pub parallel_channels: bool,
    /// Lanes per step of the innermost x loop.
    pub vector_width: u32,
}

/// One independent piece of an output domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    pub region: TileRegion,
    pub channels: Range<i32>,
}

impl WorkUnit {
    /// Number of samples the unit covers.
    pub fn samples(&self) -> u64 {
        self.region.area() * (self.channels.end - self.channels.start).max(0) as u64
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::sequential()
    }
}

impl ExecutionPlan {
    /// A single serial unit covering the whole domain.
    pub fn sequential() -> Self {
        Self {
            tile: None,
            spatial_tasks: None,
            parallel_channels: false,
            vector_width: 1,
        }
    }

    /// Lower a validated schedule.
    ///
    /// `compute_at` only places the source relative to this kernel's loops
    /// and leaves the plan unchanged.
    pub fn lower(schedule: &Schedule) -> Self {
        let mut plan = Self::sequential();
        for directive in schedule.directives() {
            match directive {
                Directive::Tile { width, height } => plan.tile = Some((*width, *height)),
                Directive::Parallel { var: LoopVar::Ch, .. } => plan.parallel_channels = true,
                Directive::Parallel { task_size, .. } => {
                    plan.spatial_tasks = Some(task_size.unwrap_or(1));
                }
                Directive::Vectorize { var, width } => {
                    if matches!(var, LoopVar::X | LoopVar::Xi) {
                        plan.vector_width = *width;
                    }
                }
                Directive::ComputeAt { .. } | Directive::Fuse { .. } => {}
            }
        }
        plan
    }

    /// Whether any loop runs in parallel.
    pub fn is_parallel(&self) -> bool {
        self.spatial_tasks.is_some() || self.parallel_channels
    }

    /// Work units per parallel task.
    pub fn task_size(&self) -> usize {
        self.spatial_tasks.unwrap_or(1).max(1) as usize
    }

    /// Split `domain` into units, channel-major.
    pub fn work_units(&self, domain: TileRegion) -> Vec<WorkUnit> {
        let spatial: Vec<TileRegion> = match (self.tile, self.spatial_tasks) {
            (Some((w, h)), _) => TileIterator::new(domain, w, h).collect(),
            (None, Some(_)) => domain.rows().collect(),
            (None, None) => vec![domain],
        };
        let channels: Vec<Range<i32>> = if self.parallel_channels {
            (0..4).map(|c| c..c + 1).collect()
        } else {
            vec![0..4]
        };

        channels
            .into_iter()
            .flat_map(|channels| {
                spatial.iter().map(move |region| WorkUnit {
                    region: *region,
                    channels: channels.clone(),
                })
            })
            .filter(|unit| unit.samples() > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_tiled_schedule() {
        let schedule = Schedule::new()
            .compute_at("src", LoopVar::Ti)
            .tile(32, 32)
            .fuse(LoopVar::Xo, LoopVar::Yo, LoopVar::Ti)
            .parallel(LoopVar::Ch)
            .parallel_tasks(LoopVar::Ti, 8)
            .vectorize(LoopVar::Xi, 32);
        let plan = ExecutionPlan::lower(&schedule);
        assert_eq!(plan.tile, Some((32, 32)));
        assert_eq!(plan.spatial_tasks, Some(8));
        assert!(plan.parallel_channels);
        assert_eq!(plan.vector_width, 32);
        assert_eq!(plan.task_size(), 8);

        let units = plan.work_units(TileRegion::new(0, 0, 64, 40));
        assert_eq!(units.len(), 4 * 4);
        assert_eq!(units[0].channels, 0..1);
        assert_eq!(units[4].channels, 1..2);
    }

    #[test]
    fn test_lower_channel_parallel_schedule() {
        let schedule = Schedule::new()
            .compute_at("src", LoopVar::X)
            .parallel(LoopVar::Ch)
            .vectorize(LoopVar::X, 16);
        let plan = ExecutionPlan::lower(&schedule);
        assert_eq!(plan.tile, None);
        assert_eq!(plan.spatial_tasks, None);
        assert_eq!(plan.work_units(TileRegion::new(0, 0, 5, 5)).len(), 4);
    }

    #[test]
    fn test_row_parallel_units() {
        let plan = ExecutionPlan::lower(&Schedule::new().parallel(LoopVar::Y));
        let units = plan.work_units(TileRegion::new(0, 0, 7, 3));
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.channels == (0..4)));
    }

    #[test]
    fn test_units_cover_every_sample() {
        let plan = ExecutionPlan::lower(&Schedule::new().tile(3, 2).parallel(LoopVar::Ch));
        let domain = TileRegion::new(0, 0, 10, 7);
        let total: u64 = plan.work_units(domain).iter().map(|u| u.samples()).sum();
        assert_eq!(total, domain.area() * 4);
    }

    #[test]
    fn test_sequential_plan() {
        let plan = ExecutionPlan::sequential();
        assert!(!plan.is_parallel());
        assert_eq!(plan.work_units(TileRegion::new(0, 0, 0, 4)), vec![]);
    }
}
