//! Rotation by 90, 180 and 270 degrees.
//!
//! The source is read through a constant-exterior view (fill 0) whose region
//! is `(0, width - 1) x (0, height - 1) x (0, 4)`. With `W = width - 1` and
//! `H = height - 1`:
//!
//! - rotate90: `out(x, y) = in(y, H - x)`
//! - rotate180: `out(x, y) = in(W - x, H - y)`
//! - rotate270: `out(x, y) = in(W - y, x)`
//!
//! The region extent is the last valid index, so the last source column and
//! row read as 0. Rotations carry no schedule.

use crate::core::boundary::BoundedInput;
use crate::core::error::ExportResult;
use crate::core::expr::{ch, sample, x, y, Expr};
use crate::core::kernel::{Kernel, Pipeline};
use crate::export::entry::{EntryPoint, OutputExtent};
use crate::kernels::{height, image_entry, width, SOURCE};

fn constant_exterior(w: &Expr, h: &Expr) -> BoundedInput {
    BoundedInput::constant_exterior(SOURCE, 0, w, h)
}

/// Quarter turn clockwise. The output is `height x width`.
pub fn rotate90(width: Expr, height: Expr) -> Kernel {
    let w = width - 1;
    let h = height - 1;
    Kernel::new("rotate90", constant_exterior(&w, &h)).define(sample(y(), h - x(), ch()))
}

/// Half turn. The output is `width x height`.
pub fn rotate180(width: Expr, height: Expr) -> Kernel {
    let w = width - 1;
    let h = height - 1;
    Kernel::new("rotate180", constant_exterior(&w, &h)).define(sample(&w - x(), &h - y(), ch()))
}

/// Quarter turn counter-clockwise. The output is `height x width`.
pub fn rotate270(width: Expr, height: Expr) -> Kernel {
    let w = width - 1;
    let h = height - 1;
    Kernel::new("rotate270", constant_exterior(&w, &h)).define(sample(w - y(), x(), ch()))
}

fn export_rotation(kernel: Kernel, extent: OutputExtent) -> ExportResult<EntryPoint> {
    let name = kernel.name().to_string();
    image_entry(&name, Pipeline::single(kernel))
        .with_output_extent(extent)
        .build()
}

/// `rotate90(src, width, height)`; the destination is transposed.
pub fn export_rotate90() -> ExportResult<EntryPoint> {
    export_rotation(rotate90(width(), height()), OutputExtent::Transposed)
}

/// `rotate180(src, width, height)`.
pub fn export_rotate180() -> ExportResult<EntryPoint> {
    export_rotation(rotate180(width(), height()), OutputExtent::Same)
}

/// `rotate270(src, width, height)`; the destination is transposed.
pub fn export_rotate270() -> ExportResult<EntryPoint> {
    export_rotation(rotate270(width(), height()), OutputExtent::Transposed)
}
