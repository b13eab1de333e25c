//! Validation pipeline implementation.

use crate::core::error::ValidationReport;
use crate::validation::stages::{
    ArityValidation, ExtentValidation, Invocation, LayoutValidation, ParameterValidation,
    ValidationStage,
};
use std::time::Instant;

/// Multi-stage validation pipeline.
///
/// Runs a series of validation stages on an invocation to reject contract
/// violations before any kernel is evaluated.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self { stages }
    }

    /// Create the default validation pipeline with all standard stages.
    pub fn default_pipeline() -> Self {
        Self {
            stages: vec![
                Box::new(ArityValidation),
                Box::new(ParameterValidation),
                Box::new(LayoutValidation),
                Box::new(ExtentValidation),
            ],
        }
    }

    /// Create a minimal pipeline (just arity and layout checks).
    pub fn minimal_pipeline() -> Self {
        Self {
            stages: vec![Box::new(ArityValidation), Box::new(LayoutValidation)],
        }
    }

    /// Add a custom validation stage.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// Names of the stages in run order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Validate an invocation through all stages.
    pub fn validate(&self, invocation: &Invocation<'_>) -> ValidationReport {
        let start = Instant::now();
        let mut report = ValidationReport::new();

        for stage in &self.stages {
            match stage.validate(invocation) {
                Ok(warnings) => {
                    for warning in warnings {
                        report.add_warning(warning);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        let is_fatal = error.is_fatal();
                        report.add_error(error);

                        // Stop on fatal errors
                        if is_fatal {
                            report.duration_us = start.elapsed().as_micros() as u64;
                            return report;
                        }
                    }
                }
            }
        }

        report.duration_us = start.elapsed().as_micros() as u64;
        report
    }

    /// Quick validation - just check if the invocation can run.
    pub fn can_execute(&self, invocation: &Invocation<'_>) -> bool {
        self.validate(invocation).can_execute()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::BoundedInput;
    use crate::core::buffer::RgbaBuffer;
    use crate::core::error::ValidationError;
    use crate::core::expr::{param, sample, x, y};
    use crate::core::kernel::{Kernel, Pipeline};
    use crate::core::types::ScalarType;
    use crate::export::argument::{Argument, ParamSet};
    use crate::export::entry::EntryPoint;

    fn entry() -> EntryPoint {
        let input = || {
            BoundedInput::repeat_edge(
                "src",
                param("width", ScalarType::Int32),
                param("height", ScalarType::Int32),
            )
        };
        let a = Kernel::new("a", input()).define(sample(x(), y(), 0));
        let b = Kernel::new("b", input()).define(sample(x(), y(), 1));
        EntryPoint::builder("ab", Pipeline::new("ab", vec![a, b]))
            .with_argument(Argument::buffer("src"))
            .with_argument(Argument::scalar("width", 1920))
            .with_argument(Argument::scalar("height", 1080))
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_invocation() {
        let entry = entry();
        let source = RgbaBuffer::new(4, 3);
        let outputs = [RgbaBuffer::new(4, 3), RgbaBuffer::new(4, 3)];
        let params = ParamSet::new().with("width", 4).with("height", 3);
        let report = ValidationPipeline::default_pipeline()
            .validate(&Invocation::new(&entry, &source, &params, &outputs));
        assert!(report.can_execute(), "{:?}", report.detailed_errors());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_fatal_error_stops_pipeline() {
        let entry = entry();
        let source = RgbaBuffer::new(4, 3);
        let outputs = [RgbaBuffer::new(4, 3)];
        // Missing parameters would also be reported if the pipeline kept going.
        let params = ParamSet::new();
        let report = ValidationPipeline::default_pipeline()
            .validate(&Invocation::new(&entry, &source, &params, &outputs));
        assert_eq!(
            report.errors,
            vec![ValidationError::OutputCount { expected: 2, got: 1 }]
        );
    }

    #[test]
    fn test_minimal_pipeline_skips_parameters() {
        let entry = entry();
        let source = RgbaBuffer::new(4, 3);
        let outputs = [RgbaBuffer::new(4, 3), RgbaBuffer::new(4, 3)];
        let params = ParamSet::new();
        let pipeline = ValidationPipeline::minimal_pipeline();
        assert_eq!(pipeline.stage_names(), vec!["Arity Validation", "Layout Validation"]);
        assert!(pipeline.can_execute(&Invocation::new(&entry, &source, &params, &outputs)));
    }
}
