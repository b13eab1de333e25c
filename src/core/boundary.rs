//! Boundary-extended views of a source buffer.
//!
//! Kernels sample their source through a [`BoundedInput`]: a named source
//! plus a region (min, extent per axis, possibly in terms of runtime
//! parameters) and a [`BoundaryPolicy`] saying what coordinates outside the
//! region read as. Both policies are total functions of the coordinate.

use crate::core::buffer::{RgbaBuffer, CHANNELS};
use crate::core::expr::{Expr, Sampler};
use crate::core::types::{ScalarType, ScalarValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule for coordinates outside the region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Clamp each coordinate to the nearest edge of the region.
    RepeatEdge,
    /// Return `fill` outside the region.
    ConstantExterior { fill: u8 },
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::RepeatEdge => write!(f, "repeat_edge"),
            BoundaryPolicy::ConstantExterior { fill } => write!(f, "constant_exterior({})", fill),
        }
    }
}

/// Symbolic `(min, extent)` of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub min: Expr,
    pub extent: Expr,
}

impl Range {
    /// Create a new range.
    pub fn new(min: impl Into<Expr>, extent: impl Into<Expr>) -> Self {
        Self {
            min: min.into(),
            extent: extent.into(),
        }
    }
}

/// Concrete `(min, extent)` of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub min: i32,
    pub extent: i32,
}

impl ResolvedRange {
    /// Whether `coord` is inside the range.
    pub fn contains(&self, coord: i32) -> bool {
        coord >= self.min && coord < self.min + self.extent
    }

    /// Clamp `coord` to `[min, min + extent - 1]`.
    pub fn clamp(&self, coord: i32) -> i32 {
        let max = self.min + self.extent - 1;
        coord.min(max).max(self.min)
    }
}

/// The declared boundary-extended source of a kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedInput {
    /// Name of the source buffer argument.
    pub source: String,
    pub policy: BoundaryPolicy,
    /// Region for x, y and channel.
    pub region: [Range; 3],
}

impl BoundedInput {
    /// Repeat-edge over `(0, width) x (0, height) x (0, 4)`.
    pub fn repeat_edge(source: impl Into<String>, width: impl Into<Expr>, height: impl Into<Expr>) -> Self {
        Self {
            source: source.into(),
            policy: BoundaryPolicy::RepeatEdge,
            region: rgba_region(width.into(), height.into()),
        }
    }

    /// Constant fill over `(0, width) x (0, height) x (0, 4)`.
    pub fn constant_exterior(
        source: impl Into<String>,
        fill: u8,
        width: impl Into<Expr>,
        height: impl Into<Expr>,
    ) -> Self {
        Self {
            source: source.into(),
            policy: BoundaryPolicy::ConstantExterior { fill },
            region: rgba_region(width.into(), height.into()),
        }
    }

    /// Runtime parameters referenced by the region.
    pub fn params(&self) -> IndexMap<String, ScalarType> {
        let mut found = IndexMap::new();
        for range in &self.region {
            for (name, ty) in range.min.params().into_iter().chain(range.extent.params()) {
                found.entry(name).or_insert(ty);
            }
        }
        found
    }

    /// Resolve the region with concrete parameter values.
    ///
    /// Returns the name of the first unbound parameter on failure.
    pub fn resolve(&self, values: &IndexMap<String, ScalarValue>) -> Result<[ResolvedRange; 3], String> {
        let mut resolved = [ResolvedRange { min: 0, extent: 0 }; 3];
        for (slot, range) in resolved.iter_mut().zip(&self.region) {
            let min = range.min.bind_params(values)?;
            let extent = range.extent.bind_params(values)?;
            *slot = ResolvedRange {
                min: constant_i32(&min),
                extent: constant_i32(&extent),
            };
        }
        Ok(resolved)
    }
}

fn rgba_region(width: Expr, height: Expr) -> [Range; 3] {
    [
        Range::new(0, width),
        Range::new(0, height),
        Range::new(0, CHANNELS),
    ]
}

fn constant_i32(expr: &Expr) -> i32 {
    expr.constant_value()
        .map(|v| v.cast(ScalarType::Int32).as_i64() as i32)
        .unwrap_or(0)
}

/// A source buffer seen through a resolved boundary policy.
#[derive(Debug, Clone, Copy)]
pub struct ExtendedSource<'a> {
    buffer: &'a RgbaBuffer,
    policy: BoundaryPolicy,
    region: [ResolvedRange; 3],
}

impl<'a> ExtendedSource<'a> {
    /// Create a new view.
    pub fn new(buffer: &'a RgbaBuffer, policy: BoundaryPolicy, region: [ResolvedRange; 3]) -> Self {
        Self {
            buffer,
            policy,
            region,
        }
    }

    /// The resolved region.
    pub fn region(&self) -> &[ResolvedRange; 3] {
        &self.region
    }

    /// Sample as a plain byte.
    ///
    /// Coordinates that the policy maps outside the memory the buffer holds
    /// read as 0, as does every read through an empty repeat-edge region.
    pub fn read(&self, x: i32, y: i32, ch: i32) -> u8 {
        match self.policy {
            BoundaryPolicy::RepeatEdge => {
                if self.region.iter().any(|r| r.extent <= 0) {
                    return 0;
                }
                let cx = self.region[0].clamp(x);
                let cy = self.region[1].clamp(y);
                let cc = self.region[2].clamp(ch);
                self.buffer.get(cx, cy, cc).unwrap_or(0)
            }
            BoundaryPolicy::ConstantExterior { fill } => {
                let inside = self.region[0].contains(x)
                    && self.region[1].contains(y)
                    && self.region[2].contains(ch);
                if inside {
                    self.buffer.get(x, y, ch).unwrap_or(0)
                } else {
                    fill
                }
            }
        }
    }
}

impl Sampler for ExtendedSource<'_> {
    fn sample(&self, x: i32, y: i32, ch: i32) -> ScalarValue {
        ScalarValue::UInt8(self.read(x, y, ch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::param;

    fn gradient(width: u32, height: u32) -> RgbaBuffer {
        RgbaBuffer::from_fn(width, height, |x, y| [x as u8, y as u8, (x + y) as u8, 255])
    }

    fn region(width: i32, height: i32) -> [ResolvedRange; 3] {
        [
            ResolvedRange { min: 0, extent: width },
            ResolvedRange { min: 0, extent: height },
            ResolvedRange { min: 0, extent: 4 },
        ]
    }

    #[test]
    fn test_repeat_edge_clamps() {
        let buffer = gradient(3, 2);
        let view = ExtendedSource::new(&buffer, BoundaryPolicy::RepeatEdge, region(3, 2));
        assert_eq!(view.read(-5, 0, 0), 0);
        assert_eq!(view.read(10, 0, 0), 2);
        assert_eq!(view.read(1, 9, 1), 1);
        assert_eq!(view.read(1, 1, 7), 255);
    }

    #[test]
    fn test_constant_exterior_fills() {
        let buffer = gradient(3, 2);
        let view = ExtendedSource::new(
            &buffer,
            BoundaryPolicy::ConstantExterior { fill: 9 },
            region(2, 1),
        );
        assert_eq!(view.read(1, 0, 0), 1);
        // Inside the buffer but outside the declared region.
        assert_eq!(view.read(2, 0, 0), 9);
        assert_eq!(view.read(0, 1, 1), 9);
        assert_eq!(view.read(0, 0, 4), 9);
        assert_eq!(view.read(-1, 0, 0), 9);
    }

    #[test]
    fn test_region_beyond_buffer_reads_zero() {
        let buffer = gradient(2, 2);
        let view = ExtendedSource::new(&buffer, BoundaryPolicy::RepeatEdge, region(8, 8));
        assert_eq!(view.read(5, 0, 0), 0);
        let empty = ExtendedSource::new(&buffer, BoundaryPolicy::RepeatEdge, region(0, 0));
        assert_eq!(empty.read(3, 3, 3), 0);
    }

    #[test]
    fn test_resolve_symbolic_region() {
        let input = BoundedInput::constant_exterior(
            "src",
            0,
            param("width", ScalarType::Int32) - 1,
            param("height", ScalarType::Int32) - 1,
        );
        let names: Vec<_> = input.params().keys().cloned().collect();
        assert_eq!(names, vec!["width", "height"]);

        let mut values = IndexMap::new();
        values.insert("width".to_string(), ScalarValue::Int32(4));
        values.insert("height".to_string(), ScalarValue::Int32(3));
        let resolved = input.resolve(&values).unwrap();
        assert_eq!(resolved, region(3, 2));

        values.shift_remove("height");
        assert_eq!(input.resolve(&values), Err("height".to_string()));
    }
}
