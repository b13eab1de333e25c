//! Individual validation stages.
//!
//! Each stage checks one category of host-boundary contract.

use crate::core::buffer::RgbaBuffer;
use crate::core::error::{ValidationError, ValidationWarning};
use crate::core::types::ScalarValue;
use crate::export::argument::ParamSet;
use crate::export::entry::EntryPoint;

/// Everything a host hands an entry point for one call.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub entry: &'a EntryPoint,
    pub source: &'a RgbaBuffer,
    pub params: &'a ParamSet,
    pub outputs: &'a [RgbaBuffer],
}

impl<'a> Invocation<'a> {
    /// Create a new invocation view.
    pub fn new(
        entry: &'a EntryPoint,
        source: &'a RgbaBuffer,
        params: &'a ParamSet,
        outputs: &'a [RgbaBuffer],
    ) -> Self {
        Self {
            entry,
            source,
            params,
            outputs,
        }
    }

    /// Value of an Int32 parameter, if given with the right type.
    fn int_param(&self, name: &str) -> Option<i32> {
        match self.params.get(name) {
            Some(ScalarValue::Int32(v)) => Some(v),
            _ => None,
        }
    }
}

/// Trait for validation stages.
pub trait ValidationStage: Send + Sync {
    /// Name of this validation stage.
    fn name(&self) -> &str;

    /// Validate an invocation.
    ///
    /// Returns Ok with warnings, or Err with errors.
    fn validate(
        &self,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>>;
}

/// Arity validation - one destination buffer per output kernel.
pub struct ArityValidation;

impl ValidationStage for ArityValidation {
    fn name(&self) -> &str {
        "Arity Validation"
    }

    fn validate(
        &self,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let expected = invocation.entry.outputs().len();
        let got = invocation.outputs.len();
        if expected != got {
            return Err(vec![ValidationError::OutputCount { expected, got }]);
        }
        Ok(Vec::new())
    }
}

/// Parameter validation - checks runtime scalars.
///
/// Verifies:
/// - Every declared scalar is present, with its declared type
/// - No undeclared names are given
/// - Values are given in declaration order
/// - Width and height are positive
pub struct ParameterValidation;

impl ValidationStage for ParameterValidation {
    fn name(&self) -> &str {
        "Parameter Validation"
    }

    fn validate(
        &self,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let declared: Vec<_> = invocation.entry.scalar_arguments().collect();

        for name in invocation.params.names() {
            if !declared.iter().any(|a| a.name == name) {
                errors.push(ValidationError::UnknownParameter {
                    name: name.to_string(),
                });
            }
        }

        for arg in &declared {
            let Some(expected) = arg.scalar_type() else {
                continue;
            };
            match invocation.params.get(&arg.name) {
                None => errors.push(ValidationError::MissingParameter {
                    name: arg.name.clone(),
                }),
                Some(value) if value.scalar_type() != expected => {
                    errors.push(ValidationError::ParameterType {
                        name: arg.name.clone(),
                        expected,
                        got: value.scalar_type(),
                    })
                }
                Some(_) => {}
            }
        }

        // Order of the declared names that were given.
        let given: Vec<&str> = invocation
            .params
            .names()
            .filter(|n| declared.iter().any(|a| a.name == *n))
            .collect();
        let expected_order: Vec<&str> = declared
            .iter()
            .map(|a| a.name.as_str())
            .filter(|n| given.contains(n))
            .collect();
        if let Some(position) = given.iter().zip(&expected_order).position(|(g, e)| g != e) {
            errors.push(ValidationError::ParameterOrder {
                position,
                expected: expected_order[position].to_string(),
                got: given[position].to_string(),
            });
        }

        for name in ["width", "height"] {
            if let Some(value) = invocation.int_param(name) {
                if value <= 0 {
                    errors.push(ValidationError::NonPositiveDimension {
                        name: name.to_string(),
                        value: value as i64,
                    });
                }
            }
        }

        if let Some(ScalarValue::Float32(factor)) = invocation.params.get("factor") {
            if !(0.0..=1.0).contains(&factor) {
                warnings.push(ValidationWarning {
                    message: format!("factor {} is outside [0, 1] and will be clamped", factor),
                    parameter: Some("factor".to_string()),
                    suggestion: Some("Use a factor between 0.0 and 1.0".to_string()),
                });
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}

/// Layout validation - checks every buffer against the entry point's
/// layout contract.
pub struct LayoutValidation;

impl ValidationStage for LayoutValidation {
    fn name(&self) -> &str {
        "Layout Validation"
    }

    fn validate(
        &self,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let entry = invocation.entry;
        let mut errors = Vec::new();

        if let Err(e) = entry
            .input_layout()
            .check(entry.source_name(), invocation.source)
        {
            errors.push(e.into());
        }
        for (kernel, output) in entry.outputs().iter().zip(invocation.outputs) {
            if let Err(e) = entry.output_layout().check(kernel.name(), output) {
                errors.push(e.into());
            }
        }

        if errors.is_empty() {
            Ok(Vec::new())
        } else {
            Err(errors)
        }
    }
}

/// Extent validation - checks destination extents against `width` and
/// `height`, swapped for transposing entry points.
pub struct ExtentValidation;

impl ValidationStage for ExtentValidation {
    fn name(&self) -> &str {
        "Extent Validation"
    }

    fn validate(
        &self,
        invocation: &Invocation<'_>,
    ) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        let (Some(width), Some(height)) =
            (invocation.int_param("width"), invocation.int_param("height"))
        else {
            // Missing or mistyped dimensions are reported by ParameterValidation.
            return Ok(Vec::new());
        };

        let entry = invocation.entry;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let (expected_width, expected_height) = entry.output_extent().apply(width, height);
        for (kernel, output) in entry.outputs().iter().zip(invocation.outputs) {
            if output.width() != expected_width || output.height() != expected_height {
                errors.push(ValidationError::ExtentMismatch {
                    buffer: kernel.name().to_string(),
                    expected_width,
                    expected_height,
                    got_width: output.width(),
                    got_height: output.height(),
                });
            }
        }

        let source = invocation.source;
        if source.width() != width || source.height() != height {
            warnings.push(ValidationWarning {
                message: format!(
                    "source is {}x{} but width/height are {}x{}",
                    source.width(),
                    source.height(),
                    width,
                    height
                ),
                parameter: Some("width".to_string()),
                suggestion: Some("Samples outside the source buffer read as 0".to_string()),
            });
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}
