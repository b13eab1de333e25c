//! Error types for pixkern.
//!
//! Kernels themselves never fail: boundary policies are total and arithmetic
//! saturates or wraps. Errors come from building things wrongly (schedules,
//! layouts, exports) or from a host handing an entry point buffers and
//! parameters that break its contract.

use crate::core::types::ScalarType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for pixkern.
#[derive(Error, Debug)]
pub enum PixkernError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors in a schedule attached to a kernel.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleError {
    #[error("Kernel '{kernel}': loop variable '{var}' is not in the loop nest")]
    UnknownLoopVar { kernel: String, var: String },

    #[error("Kernel '{kernel}': loop variable '{var}' already exists")]
    DuplicateLoopVar { kernel: String, var: String },

    #[error("Kernel '{kernel}': {directive} factor must be positive, got {factor}")]
    InvalidFactor {
        kernel: String,
        directive: String,
        factor: u32,
    },

    #[error("Kernel '{kernel}': update {index} has no schedule decision")]
    UpdateNotScheduled { kernel: String, index: usize },

    #[error("Kernel '{kernel}' has {count} update(s); update {index} does not exist")]
    UnknownUpdate {
        kernel: String,
        index: usize,
        count: usize,
    },

    #[error("Kernel '{kernel}': compute_at names unknown producer '{producer}'")]
    UnknownProducer { kernel: String, producer: String },
}

/// A buffer or contract that disagrees with the fixed layout.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutError {
    #[error("Buffer '{buffer}': dimension {dim} stride is {got}, expected {expected}")]
    StrideMismatch {
        buffer: String,
        dim: usize,
        expected: i32,
        got: i32,
    },

    #[error("Buffer '{buffer}': dimension {dim} bounds are ({got_min}, {got_extent}), expected ({expected_min}, {expected_extent})")]
    BoundsMismatch {
        buffer: String,
        dim: usize,
        expected_min: i32,
        expected_extent: i32,
        got_min: i32,
        got_extent: i32,
    },

    #[error("Buffer '{buffer}' holds {actual} bytes but its dimensions need {required}")]
    BufferTooSmall {
        buffer: String,
        required: usize,
        actual: usize,
    },

    #[error("Layout contract is malformed: {reason}")]
    MalformedContract { reason: String },

    #[error("Input and output layout contracts differ")]
    ContractMismatch,
}

/// Errors while freezing kernels into an entry point.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportError {
    #[error("Kernel '{kernel}' references parameter '{name}' that is not declared")]
    UndeclaredParameter { kernel: String, name: String },

    #[error("Parameter '{name}' is declared as {declared} but used as {used}")]
    ParameterTypeConflict {
        name: String,
        declared: ScalarType,
        used: ScalarType,
    },

    #[error("Argument '{0}' is declared more than once")]
    DuplicateArgument(String),

    #[error("Argument {position} must be '{expected}', found '{found}'")]
    ArgumentOrder {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Entry point '{0}' has no outputs")]
    NoOutputs(String),

    #[error("Kernel '{kernel}' reads source '{source_name}' which is not the input buffer")]
    UnknownSource { kernel: String, source_name: String },

    #[error("No kernel named '{0}' is registered")]
    KernelNotFound(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Contract violations found at the host boundary, before invocation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Buffer '{buffer}' is {got_width}x{got_height}, expected {expected_width}x{expected_height}")]
    ExtentMismatch {
        buffer: String,
        expected_width: i32,
        expected_height: i32,
        got_width: i32,
        got_height: i32,
    },

    #[error("Expected {expected} output buffer(s), got {got}")]
    OutputCount { expected: usize, got: usize },

    #[error("Missing parameter '{name}'")]
    MissingParameter { name: String },

    #[error("Unknown parameter '{name}'")]
    UnknownParameter { name: String },

    #[error("Parameter '{name}' must be {expected}, got {got}")]
    ParameterType {
        name: String,
        expected: ScalarType,
        got: ScalarType,
    },

    #[error("Parameter {position} must be '{expected}', got '{got}'")]
    ParameterOrder {
        position: usize,
        expected: String,
        got: String,
    },

    #[error("Parameter '{name}' must be positive, got {value}")]
    NonPositiveDimension { name: String, value: i64 },

    #[error("{0}")]
    Other(String),
}

/// Errors while running an entry point.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Kernel '{kernel}' has no value for parameter '{name}'")]
    UnboundParameter { kernel: String, name: String },

    #[error("Invocation of '{entry}' rejected: {summary}")]
    InvalidInvocation {
        entry: String,
        summary: String,
        errors: Vec<ValidationError>,
    },

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl ValidationError {
    /// Check if this is a fatal error that should stop validation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationError::OutputCount { .. })
    }

    /// Get suggestion for fixing this error.
    pub fn suggested_fix(&self) -> Option<String> {
        match self {
            ValidationError::Layout(LayoutError::StrideMismatch { buffer, .. }) => Some(format!(
                "Repack '{}' as channel-interleaved RGBA (x stride 4, channel stride 1)",
                buffer
            )),
            ValidationError::Layout(LayoutError::BoundsMismatch { buffer, .. }) => {
                Some(format!("Give '{}' exactly 4 channels starting at 0", buffer))
            }
            ValidationError::ExtentMismatch {
                buffer,
                expected_width,
                expected_height,
                ..
            } => Some(format!(
                "Allocate '{}' as {}x{}",
                buffer, expected_width, expected_height
            )),
            ValidationError::MissingParameter { name } => {
                Some(format!("Provide a value for '{}'", name))
            }
            ValidationError::ParameterOrder { expected, .. } => {
                Some(format!("Bind parameters in declaration order, starting with '{}'", expected))
            }
            _ => None,
        }
    }
}

/// Result type alias for pixkern operations.
pub type PixkernResult<T> = Result<T, PixkernError>;

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type alias for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type alias for execution operations.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

// ============================================================================
// Validation Report
// ============================================================================

/// Comprehensive validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether validation passed without errors.
    pub success: bool,
    /// List of errors found.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<ValidationWarning>,
    /// Time taken for validation in microseconds.
    pub duration_us: u64,
}

/// Non-fatal validation warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Warning message.
    pub message: String,
    /// Parameter that triggered the warning, if applicable.
    pub parameter: Option<String>,
    /// Suggestion for addressing the warning.
    pub suggestion: Option<String>,
}

impl ValidationReport {
    /// Create a new empty report (success).
    pub fn new() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            duration_us: 0,
        }
    }

    /// Add an error to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        self.success = false;
        self.errors.push(error);
    }

    /// Add a warning to the report.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Check if the invocation can run.
    pub fn can_execute(&self) -> bool {
        self.success
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.success {
            if self.warnings.is_empty() {
                "invocation is valid".to_string()
            } else {
                format!("invocation is valid with {} warning(s)", self.warnings.len())
            }
        } else {
            let first = self
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_default();
            format!("{} error(s), first: {}", self.errors.len(), first)
        }
    }

    /// Get detailed error messages with suggestions.
    pub fn detailed_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .enumerate()
            .map(|(i, error)| {
                let mut msg = format!("{}. {}", i + 1, error);
                if let Some(fix) = error.suggested_fix() {
                    msg.push_str(&format!("\n   -> Suggestion: {}", fix));
                }
                msg
            })
            .collect()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_suggestions() {
        let error = ValidationError::ExtentMismatch {
            buffer: "rotate90".to_string(),
            expected_width: 3,
            expected_height: 4,
            got_width: 4,
            got_height: 3,
        };
        let fix = error.suggested_fix().unwrap();
        assert!(fix.contains("3x4"));
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new();
        assert!(report.can_execute());

        report.add_error(ValidationError::MissingParameter {
            name: "width".to_string(),
        });
        assert!(!report.can_execute());
        assert_eq!(report.errors.len(), 1);
        assert!(report.summary().contains("width"));
        assert!(report.detailed_errors()[0].contains("Suggestion"));
    }

    #[test]
    fn test_layout_error_converts_into_top_level() {
        let err: PixkernError = ExportError::from(LayoutError::ContractMismatch).into();
        assert!(err.to_string().contains("layout contracts differ"));
    }
}
