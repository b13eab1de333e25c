//! Execution engine implementation.
//!
//! The engine is the reference evaluator for entry points. It validates an
//! invocation at the host boundary, binds runtime parameters into each
//! output kernel, lowers the kernel's schedule into work units and evaluates
//! them, in parallel where the schedule allows. Each unit is evaluated into a
//! dense buffer that is then copied into the destination, so a parallel run
//! writes exactly what a sequential one does.

use crate::core::buffer::RgbaBuffer;
use crate::core::error::{ExecutionError, ExecutionResult};
use crate::core::expr::Sampler;
use crate::core::kernel::BoundKernel;
use crate::export::argument::ParamSet;
use crate::export::entry::EntryPoint;
use crate::schedule::plan::{ExecutionPlan, WorkUnit};
use crate::schedule::tiling::TileRegion;
use crate::validation::pipeline::ValidationPipeline;
use crate::validation::stages::Invocation;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Execution options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Whether parallel loops of a schedule run on the thread pool.
    pub parallel: bool,
    /// Maximum number of parallel threads (0 = use all available).
    pub max_threads: usize,
    /// Whether to follow each kernel's schedule. When false every kernel is
    /// evaluated as one sequential unit.
    pub honor_schedule: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_threads: 0, // Use all available
            honor_schedule: true,
        }
    }
}

impl ExecutionOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that ignore schedules and run on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            max_threads: 0,
            honor_schedule: false,
        }
    }

    /// Enable/disable parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set maximum threads.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Follow or ignore kernel schedules.
    pub fn with_honor_schedule(mut self, honor: bool) -> Self {
        self.honor_schedule = honor;
        self
    }
}

/// Execution statistics.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    /// Total execution time, validation included.
    pub total_duration: Duration,
    /// Number of output buffers realized.
    pub outputs: usize,
    /// Number of work units evaluated.
    pub units: usize,
    /// Number of destination bytes written.
    pub samples_written: u64,
    /// Number of destination bytes left untouched because no definition
    /// covered them.
    pub samples_skipped: u64,
}

/// Dense result of one work unit, channel-major then row-major, with `None`
/// where no definition covers the sample.
struct UnitBuffer<'u> {
    unit: &'u WorkUnit,
    values: Vec<Option<u8>>,
}

impl UnitBuffer<'_> {
    /// Copy the defined samples into `output`. Returns `(written, skipped)`.
    fn write_unit(&self, output: &mut RgbaBuffer) -> (u64, u64) {
        let region = self.unit.region;
        let mut values = self.values.iter();
        let (mut written, mut skipped) = (0, 0);

        for ch in self.unit.channels.clone() {
            for y in region.y..region.bottom() {
                for x in region.x..region.right() {
                    match values.next().copied().flatten() {
                        Some(value) if output.set(x, y, ch, value) => written += 1,
                        Some(_) => {}
                        None => skipped += 1,
                    }
                }
            }
        }
        (written, skipped)
    }
}

/// The execution engine.
pub struct ExecutionEngine {
    /// Host-boundary checks run before every invocation.
    validator: ValidationPipeline,
    /// Default execution options.
    default_options: ExecutionOptions,
}

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new() -> Self {
        Self {
            validator: ValidationPipeline::default_pipeline(),
            default_options: ExecutionOptions::default(),
        }
    }

    /// Set default options.
    pub fn with_default_options(mut self, options: ExecutionOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Replace the validation pipeline.
    pub fn with_validator(mut self, validator: ValidationPipeline) -> Self {
        self.validator = validator;
        self
    }

    pub fn default_options(&self) -> &ExecutionOptions {
        &self.default_options
    }

    /// Invoke an entry point with the default options.
    ///
    /// `outputs` holds one destination per output kernel, in order. Bytes no
    /// definition covers keep their previous value.
    pub fn invoke(
        &self,
        entry: &EntryPoint,
        source: &RgbaBuffer,
        params: &ParamSet,
        outputs: &mut [RgbaBuffer],
    ) -> ExecutionResult<ExecutionStats> {
        self.invoke_with(entry, source, params, outputs, &self.default_options)
    }

    /// Invoke an entry point ignoring every schedule, on the calling thread.
    pub fn realize_sequential(
        &self,
        entry: &EntryPoint,
        source: &RgbaBuffer,
        params: &ParamSet,
        outputs: &mut [RgbaBuffer],
    ) -> ExecutionResult<ExecutionStats> {
        self.invoke_with(entry, source, params, outputs, &ExecutionOptions::sequential())
    }

    /// Invoke an entry point with explicit options.
    pub fn invoke_with(
        &self,
        entry: &EntryPoint,
        source: &RgbaBuffer,
        params: &ParamSet,
        outputs: &mut [RgbaBuffer],
        options: &ExecutionOptions,
    ) -> ExecutionResult<ExecutionStats> {
        let start_time = Instant::now();

        let report = self
            .validator
            .validate(&Invocation::new(entry, source, params, outputs));
        for warning in &report.warnings {
            log::warn!("{}: {}", entry.name(), warning.message);
        }
        if !report.can_execute() {
            log::warn!("Rejected invocation of '{}': {}", entry.name(), report.summary());
            return Err(ExecutionError::InvalidInvocation {
                entry: entry.name().to_string(),
                summary: report.summary(),
                errors: report.errors,
            });
        }

        let mut stats = if options.parallel && options.max_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.max_threads)
                .build()?;
            pool.install(|| self.realize(entry, source, params, outputs, options))?
        } else {
            self.realize(entry, source, params, outputs, options)?
        };

        stats.total_duration = start_time.elapsed();
        log::debug!(
            "Invoked '{}': {} unit(s), {} sample(s) written in {:?}",
            entry.name(),
            stats.units,
            stats.samples_written,
            stats.total_duration
        );
        Ok(stats)
    }

    fn realize(
        &self,
        entry: &EntryPoint,
        source: &RgbaBuffer,
        params: &ParamSet,
        outputs: &mut [RgbaBuffer],
        options: &ExecutionOptions,
    ) -> ExecutionResult<ExecutionStats> {
        let mut stats = ExecutionStats::default();

        for (kernel, output) in entry.outputs().iter().zip(outputs.iter_mut()) {
            let bound = kernel.bind(params.values())?;
            let plan = match kernel.schedule() {
                Some(schedule) if options.honor_schedule => ExecutionPlan::lower(schedule),
                _ => ExecutionPlan::sequential(),
            };
            let parallel = options.parallel && plan.is_parallel();

            let dims = output.dims();
            let domain = TileRegion::new(dims[0].min, dims[1].min, dims[0].extent, dims[1].extent);
            let units = plan.work_units(domain);
            log::debug!(
                "Realizing '{}' over {}x{}: {} unit(s), tile {:?}, vector width {}, parallel {}",
                kernel.name(),
                domain.width,
                domain.height,
                units.len(),
                plan.tile,
                plan.vector_width,
                parallel
            );

            let view = bound.source(source);
            let results: Vec<UnitBuffer> = if parallel {
                units
                    .par_chunks(plan.task_size())
                    .flat_map_iter(|chunk| {
                        chunk.iter().map(|unit| evaluate_unit(&bound, &view, unit))
                    })
                    .collect()
            } else {
                units
                    .iter()
                    .map(|unit| evaluate_unit(&bound, &view, unit))
                    .collect()
            };

            for result in &results {
                let (written, skipped) = result.write_unit(output);
                stats.samples_written += written;
                stats.samples_skipped += skipped;
            }
            stats.units += units.len();
            stats.outputs += 1;
        }

        Ok(stats)
    }
}

/// Evaluate one unit: channels outermost, then rows, then x.
///
/// The plan's vector width is only recorded for logging; the reference
/// evaluator visits x one sample at a time.
fn evaluate_unit<'u, S: Sampler + ?Sized>(
    kernel: &BoundKernel,
    source: &S,
    unit: &'u WorkUnit,
) -> UnitBuffer<'u> {
    let region = unit.region;
    let mut values = Vec::with_capacity(unit.samples() as usize);

    for ch in unit.channels.clone() {
        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                values.push(kernel.value_at([x, y, ch], source));
            }
        }
    }

    UnitBuffer { unit, values }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}
