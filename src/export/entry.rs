//! Exported entry points.
//!
//! An [`EntryPoint`] freezes a pipeline together with its ordered argument
//! list and the layout contract its buffers must satisfy. All checks happen
//! in [`EntryPointBuilder::build`]; a built entry point is immutable.

use crate::core::error::{ExportError, ExportResult, LayoutError};
use crate::core::kernel::{Kernel, Pipeline};
use crate::core::types::ScalarType;
use crate::export::argument::{Argument, ParamSet};
use crate::export::layout::LayoutContract;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Shape of the exported function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// One output buffer.
    Func,
    /// Several output buffers realized together.
    Pipeline,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Func => write!(f, "func"),
            ExportKind::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Extent of every output relative to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputExtent {
    /// Outputs are `width x height`.
    Same,
    /// Outputs are `height x width`.
    Transposed,
}

impl OutputExtent {
    /// Output `(width, height)` for a source of `width x height`.
    pub fn apply(self, width: i32, height: i32) -> (i32, i32) {
        match self {
            OutputExtent::Same => (width, height),
            OutputExtent::Transposed => (height, width),
        }
    }
}

/// A frozen, callable kernel export.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    name: String,
    kind: ExportKind,
    pipeline: Pipeline,
    arguments: Vec<Argument>,
    input_layout: LayoutContract,
    output_layout: LayoutContract,
    output_extent: OutputExtent,
}

impl EntryPoint {
    /// Start building an entry point for `pipeline`.
    pub fn builder(name: impl Into<String>, pipeline: Pipeline) -> EntryPointBuilder {
        EntryPointBuilder {
            name: name.into(),
            pipeline,
            arguments: Vec::new(),
            input_layout: LayoutContract::rgba_interleaved(),
            output_layout: LayoutContract::rgba_interleaved(),
            output_extent: OutputExtent::Same,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Output kernels in the order their buffers are passed.
    pub fn outputs(&self) -> &[Kernel] {
        self.pipeline.outputs()
    }

    /// Ordered arguments, source first. Outputs are not listed.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Name of the source buffer argument.
    pub fn source_name(&self) -> &str {
        self.arguments
            .first()
            .map(|a| a.name.as_str())
            .unwrap_or("src")
    }

    /// Scalar arguments in order.
    pub fn scalar_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| !a.is_buffer())
    }

    pub fn input_layout(&self) -> &LayoutContract {
        &self.input_layout
    }

    pub fn output_layout(&self) -> &LayoutContract {
        &self.output_layout
    }

    pub fn output_extent(&self) -> OutputExtent {
        self.output_extent
    }

    /// Every scalar at its default.
    pub fn default_params(&self) -> ParamSet {
        ParamSet::defaults(&self.arguments)
    }
}

/// Builder for [`EntryPoint`].
#[derive(Debug, Clone)]
pub struct EntryPointBuilder {
    name: String,
    pipeline: Pipeline,
    arguments: Vec<Argument>,
    input_layout: LayoutContract,
    output_layout: LayoutContract,
    output_extent: OutputExtent,
}

impl EntryPointBuilder {
    /// Append an argument.
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Set the contract for the source buffer.
    pub fn with_input_layout(mut self, layout: LayoutContract) -> Self {
        self.input_layout = layout;
        self
    }

    /// Set the contract for every output buffer.
    pub fn with_output_layout(mut self, layout: LayoutContract) -> Self {
        self.output_layout = layout;
        self
    }

    pub fn with_output_extent(mut self, extent: OutputExtent) -> Self {
        self.output_extent = extent;
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> ExportResult<EntryPoint> {
        if self.pipeline.is_empty() {
            return Err(ExportError::NoOutputs(self.name));
        }

        self.check_argument_names()?;
        self.check_leading_arguments()?;
        self.check_kernels()?;

        self.input_layout.validate()?;
        self.output_layout.validate()?;
        if self.input_layout != self.output_layout {
            return Err(LayoutError::ContractMismatch.into());
        }

        let kind = if self.pipeline.len() == 1 {
            ExportKind::Func
        } else {
            ExportKind::Pipeline
        };

        log::info!(
            "Exported {} '{}' with {} argument(s) and {} output(s)",
            kind,
            self.name,
            self.arguments.len(),
            self.pipeline.len()
        );

        Ok(EntryPoint {
            name: self.name,
            kind,
            pipeline: self.pipeline,
            arguments: self.arguments,
            input_layout: self.input_layout,
            output_layout: self.output_layout,
            output_extent: self.output_extent,
        })
    }

    fn check_argument_names(&self) -> ExportResult<()> {
        let mut seen = HashSet::new();
        for arg in &self.arguments {
            if !seen.insert(arg.name.as_str()) {
                return Err(ExportError::DuplicateArgument(arg.name.clone()));
            }
        }
        Ok(())
    }

    /// Arguments must read `(source, width, height, [scalars...])`.
    fn check_leading_arguments(&self) -> ExportResult<()> {
        let expected = [
            (0, "<source buffer>", None),
            (1, "width", Some(ScalarType::Int32)),
            (2, "height", Some(ScalarType::Int32)),
        ];
        for (position, name, ty) in expected {
            let found = self.arguments.get(position);
            let ok = match (found, ty) {
                (Some(arg), None) => arg.is_buffer(),
                (Some(arg), Some(ty)) => arg.name == name && arg.scalar_type() == Some(ty),
                (None, _) => false,
            };
            if !ok {
                return Err(ExportError::ArgumentOrder {
                    position,
                    expected: name.to_string(),
                    found: found.map(|a| a.name.clone()).unwrap_or_else(|| "nothing".to_string()),
                });
            }
        }

        if let Some((position, arg)) = self
            .arguments
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, a)| a.is_buffer())
        {
            return Err(ExportError::ArgumentOrder {
                position,
                expected: "<scalar>".to_string(),
                found: arg.name.clone(),
            });
        }
        Ok(())
    }

    fn check_kernels(&self) -> ExportResult<()> {
        let source = &self.arguments[0].name;
        for kernel in self.pipeline.outputs() {
            if &kernel.input().source != source {
                return Err(ExportError::UnknownSource {
                    kernel: kernel.name().to_string(),
                    source_name: kernel.input().source.clone(),
                });
            }

            for (name, used) in kernel.params() {
                let declared = self
                    .arguments
                    .iter()
                    .find(|a| a.name == name)
                    .and_then(|a| a.scalar_type());
                match declared {
                    None => {
                        return Err(ExportError::UndeclaredParameter {
                            kernel: kernel.name().to_string(),
                            name,
                        })
                    }
                    Some(declared) if declared != used => {
                        return Err(ExportError::ParameterTypeConflict {
                            name,
                            declared,
                            used,
                        })
                    }
                    Some(_) => {}
                }
            }

            if let Some(schedule) = kernel.schedule() {
                schedule.validate(kernel)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::BoundedInput;
    use crate::core::expr::{param, sample, x, y};

    fn kernel() -> Kernel {
        Kernel::new(
            "k",
            BoundedInput::repeat_edge(
                "src",
                param("width", ScalarType::Int32),
                param("height", ScalarType::Int32),
            ),
        )
        .define(sample(x(), y(), 0))
    }

    fn builder(kernel: Kernel) -> EntryPointBuilder {
        EntryPoint::builder("k", Pipeline::single(kernel))
            .with_argument(Argument::buffer("src"))
            .with_argument(Argument::scalar("width", 1920))
            .with_argument(Argument::scalar("height", 1080))
    }

    #[test]
    fn test_build_func() {
        let entry = builder(kernel()).build().unwrap();
        assert_eq!(entry.kind(), ExportKind::Func);
        assert_eq!(entry.source_name(), "src");
        assert_eq!(entry.scalar_arguments().count(), 2);
        assert_eq!(
            entry.default_params().get("width"),
            Some(crate::core::types::ScalarValue::Int32(1920))
        );
    }

    #[test]
    fn test_undeclared_parameter() {
        let k = kernel().update_channel(0, param("gain", ScalarType::Float32));
        assert_eq!(
            builder(k).build().unwrap_err(),
            ExportError::UndeclaredParameter {
                kernel: "k".to_string(),
                name: "gain".to_string(),
            }
        );
    }

    #[test]
    fn test_parameter_type_conflict() {
        let k = kernel().update_channel(0, param("gain", ScalarType::Float32));
        let err = builder(k)
            .with_argument(Argument::scalar("gain", 2))
            .build()
            .unwrap_err();
        assert!(matches!(err, ExportError::ParameterTypeConflict { .. }));
    }

    #[test]
    fn test_duplicate_argument() {
        let err = builder(kernel())
            .with_argument(Argument::scalar("width", 1))
            .build()
            .unwrap_err();
        assert_eq!(err, ExportError::DuplicateArgument("width".to_string()));
    }

    #[test]
    fn test_argument_order() {
        let err = EntryPoint::builder("k", Pipeline::single(kernel()))
            .with_argument(Argument::buffer("src"))
            .with_argument(Argument::scalar("height", 1080))
            .with_argument(Argument::scalar("width", 1920))
            .build()
            .unwrap_err();
        assert!(matches!(err, ExportError::ArgumentOrder { position: 1, .. }));

        let err = builder(kernel())
            .with_argument(Argument::buffer("other"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ExportError::ArgumentOrder { position: 3, .. }));
    }

    #[test]
    fn test_layout_contracts_must_agree() {
        let mut planar = LayoutContract::rgba_interleaved();
        planar.dims[0].stride = Some(1);
        let err = builder(kernel()).with_output_layout(planar).build().unwrap_err();
        assert_eq!(err, ExportError::Layout(LayoutError::ContractMismatch));
    }

    #[test]
    fn test_empty_pipeline() {
        let err = EntryPoint::builder("none", Pipeline::new("none", vec![]))
            .build()
            .unwrap_err();
        assert_eq!(err, ExportError::NoOutputs("none".to_string()));
    }

    #[test]
    fn test_output_extent() {
        assert_eq!(OutputExtent::Transposed.apply(4, 3), (3, 4));
        assert_eq!(OutputExtent::Same.apply(4, 3), (4, 3));
    }
}
