//! Buffer layout contracts.
//!
//! A contract pins strides and bounds on some axes of a buffer and leaves the
//! rest free. Entry points apply one contract to every input and output.

use crate::core::buffer::{RgbaBuffer, CHANNELS};
use crate::core::error::LayoutError;
use serde::{Deserialize, Serialize};

/// Constraint on one buffer axis. `None` leaves that property free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimConstraint {
    pub stride: Option<i32>,
    /// Required `(min, extent)`.
    pub bounds: Option<(i32, i32)>,
}

/// Per-axis constraints for x, y and channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutContract {
    pub dims: [DimConstraint; 3],
}

impl LayoutContract {
    /// Channel-interleaved RGBA: x stride 4, channel stride 1, channels
    /// `(0, 4)`.
    pub fn rgba_interleaved() -> Self {
        Self {
            dims: [
                DimConstraint {
                    stride: Some(CHANNELS),
                    bounds: None,
                },
                DimConstraint::default(),
                DimConstraint {
                    stride: Some(1),
                    bounds: Some((0, CHANNELS)),
                },
            ],
        }
    }

    /// Check that the contract itself can be satisfied.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (dim, constraint) in self.dims.iter().enumerate() {
            if let Some(stride) = constraint.stride {
                if stride <= 0 {
                    return Err(LayoutError::MalformedContract {
                        reason: format!("dimension {} stride must be positive, got {}", dim, stride),
                    });
                }
            }
            if let Some((_, extent)) = constraint.bounds {
                if extent <= 0 {
                    return Err(LayoutError::MalformedContract {
                        reason: format!("dimension {} extent must be positive, got {}", dim, extent),
                    });
                }
            }
        }
        Ok(())
    }

    /// Check a buffer against the contract.
    pub fn check(&self, name: &str, buffer: &RgbaBuffer) -> Result<(), LayoutError> {
        for (dim, (constraint, actual)) in self.dims.iter().zip(buffer.dims()).enumerate() {
            if let Some(expected) = constraint.stride {
                if actual.stride != expected {
                    return Err(LayoutError::StrideMismatch {
                        buffer: name.to_string(),
                        dim,
                        expected,
                        got: actual.stride,
                    });
                }
            }
            if let Some((min, extent)) = constraint.bounds {
                if actual.min != min || actual.extent != extent {
                    return Err(LayoutError::BoundsMismatch {
                        buffer: name.to_string(),
                        dim,
                        expected_min: min,
                        expected_extent: extent,
                        got_min: actual.min,
                        got_extent: actual.extent,
                    });
                }
            }
        }

        let required = buffer.required_len();
        let actual = buffer.as_raw().len();
        if actual < required {
            return Err(LayoutError::BufferTooSmall {
                buffer: name.to_string(),
                required,
                actual,
            });
        }
        Ok(())
    }
}

impl Default for LayoutContract {
    fn default() -> Self {
        Self::rgba_interleaved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::BufferDim;

    #[test]
    fn test_interleaved_buffer_passes() {
        let contract = LayoutContract::rgba_interleaved();
        assert!(contract.validate().is_ok());
        assert!(contract.check("src", &RgbaBuffer::new(5, 3)).is_ok());
    }

    #[test]
    fn test_planar_buffer_rejected() {
        let dims = [
            BufferDim::new(0, 2, 1),
            BufferDim::new(0, 2, 2),
            BufferDim::new(0, 4, 4),
        ];
        let buffer = RgbaBuffer::with_dims(vec![0; 16], dims);
        let err = LayoutContract::rgba_interleaved().check("src", &buffer).unwrap_err();
        assert_eq!(
            err,
            LayoutError::StrideMismatch {
                buffer: "src".to_string(),
                dim: 0,
                expected: 4,
                got: 1,
            }
        );
    }

    #[test]
    fn test_three_channel_buffer_rejected() {
        let dims = [
            BufferDim::new(0, 2, 4),
            BufferDim::new(0, 2, 8),
            BufferDim::new(0, 3, 1),
        ];
        let buffer = RgbaBuffer::with_dims(vec![0; 16], dims);
        assert!(matches!(
            LayoutContract::rgba_interleaved().check("out", &buffer),
            Err(LayoutError::BoundsMismatch { dim: 2, got_extent: 3, .. })
        ));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let dims = [
            BufferDim::new(0, 4, 4),
            BufferDim::new(0, 4, 16),
            BufferDim::new(0, 4, 1),
        ];
        let buffer = RgbaBuffer::with_dims(vec![0; 40], dims);
        assert!(matches!(
            LayoutContract::rgba_interleaved().check("src", &buffer),
            Err(LayoutError::BufferTooSmall { required: 64, actual: 40, .. })
        ));
    }

    #[test]
    fn test_malformed_contract() {
        let mut contract = LayoutContract::rgba_interleaved();
        contract.dims[0].stride = Some(0);
        assert!(contract.validate().is_err());
    }
}
