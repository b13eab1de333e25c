//! Built-in kernels and their exported entry points.
//!
//! Every entry point takes `(src, width, height, [scalars...])` followed by
//! its output buffers, and applies the channel-interleaved RGBA layout
//! contract to all of them.

pub mod color;
pub mod registry;
pub mod rotate;

use crate::core::expr::{param, Expr};
use crate::core::kernel::Pipeline;
use crate::core::types::ScalarType;
use crate::export::argument::Argument;
use crate::export::entry::{EntryPoint, EntryPointBuilder};
use crate::export::layout::LayoutContract;

pub use color::{contrast, export_contrast, export_grayscale, export_split, grayscale, split};
pub use registry::{Category, KernelRegistry, RegistryEntry};
pub use rotate::{export_rotate180, export_rotate270, export_rotate90, rotate180, rotate270, rotate90};

/// Name of the source buffer argument.
pub const SOURCE: &str = "src";

/// Default `width` argument.
pub const DEFAULT_WIDTH: i32 = 1920;

/// Default `height` argument.
pub const DEFAULT_HEIGHT: i32 = 1080;

/// Default contrast `factor` argument.
pub const DEFAULT_FACTOR: f32 = 0.525;

/// The `width` runtime parameter.
pub fn width() -> Expr {
    param("width", ScalarType::Int32)
}

/// The `height` runtime parameter.
pub fn height() -> Expr {
    param("height", ScalarType::Int32)
}

/// Builder with the leading `(src, width, height)` arguments and the RGBA
/// layout contract on both sides.
fn image_entry(name: &str, pipeline: Pipeline) -> EntryPointBuilder {
    EntryPoint::builder(name, pipeline)
        .with_argument(Argument::buffer(SOURCE))
        .with_argument(Argument::scalar("width", DEFAULT_WIDTH))
        .with_argument(Argument::scalar("height", DEFAULT_HEIGHT))
        .with_input_layout(LayoutContract::rgba_interleaved())
        .with_output_layout(LayoutContract::rgba_interleaved())
}
