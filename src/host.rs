//! Host wrappers over the built-in entry points.
//!
//! Each wrapper takes an [`RgbaImage`], allocates destinations oriented per
//! the entry point's output extent, describes every buffer as
//! channel-interleaved RGBA (x stride 4, y stride `width * 4`, channel
//! stride 1) and invokes the entry point through an [`ExecutionEngine`].

use crate::core::buffer::RgbaBuffer;
use crate::core::error::{PixkernError, PixkernResult};
use crate::core::types::ScalarValue;
use crate::execution::ExecutionEngine;
use crate::export::argument::ParamSet;
use crate::export::entry::EntryPoint;
use crate::kernels;
use image::RgbaImage;

/// Invoke `entry` on `image`.
///
/// Parameters start from the entry point's defaults, take `width` and
/// `height` from the image, then apply `overrides` in order. Returns one
/// image per output.
pub fn apply(
    engine: &ExecutionEngine,
    entry: &EntryPoint,
    image: &RgbaImage,
    overrides: &[(&str, ScalarValue)],
) -> PixkernResult<Vec<RgbaImage>> {
    let source = RgbaBuffer::from(image);

    let mut params: ParamSet = entry.default_params();
    params.set("width", source.width());
    params.set("height", source.height());
    for (name, value) in overrides {
        params.set(*name, *value);
    }

    let (width, height) = entry
        .output_extent()
        .apply(source.width(), source.height());
    let mut outputs: Vec<RgbaBuffer> = entry
        .outputs()
        .iter()
        .map(|_| RgbaBuffer::new(width.max(0) as u32, height.max(0) as u32))
        .collect();

    let stats = engine.invoke(entry, &source, &params, &mut outputs)?;
    log::debug!(
        "{}: {}x{} -> {} output(s) of {}x{} in {:?}",
        entry.name(),
        source.width(),
        source.height(),
        stats.outputs,
        width,
        height,
        stats.total_duration
    );

    outputs
        .into_iter()
        .map(|buffer| {
            buffer.into_rgba_image().ok_or_else(|| {
                PixkernError::Other(format!("{}: output is not interleaved RGBA", entry.name()))
            })
        })
        .collect()
}

fn apply_single(
    entry: PixkernResult<EntryPoint>,
    image: &RgbaImage,
    overrides: &[(&str, ScalarValue)],
) -> PixkernResult<RgbaImage> {
    let entry = entry?;
    let mut outputs = apply(&ExecutionEngine::new(), &entry, image, overrides)?;
    outputs
        .pop()
        .ok_or_else(|| PixkernError::Other(format!("{} produced no output", entry.name())))
}

/// Convert to luma, keeping alpha.
pub fn grayscale(image: &RgbaImage) -> PixkernResult<RgbaImage> {
    apply_single(kernels::export_grayscale().map_err(Into::into), image, &[])
}

/// Adjust contrast; `factor` is clamped to `[0, 1]`.
pub fn contrast(image: &RgbaImage, factor: f32) -> PixkernResult<RgbaImage> {
    apply_single(
        kernels::export_contrast().map_err(Into::into),
        image,
        &[("factor", ScalarValue::Float32(factor))],
    )
}

/// Split into red, green and blue images.
pub fn split(image: &RgbaImage) -> PixkernResult<(RgbaImage, RgbaImage, RgbaImage)> {
    let entry = kernels::export_split()?;
    let mut outputs = apply(&ExecutionEngine::new(), &entry, image, &[])?.into_iter();
    match (outputs.next(), outputs.next(), outputs.next()) {
        (Some(red), Some(green), Some(blue)) => Ok((red, green, blue)),
        _ => Err(PixkernError::Other("split produced fewer than three outputs".to_string())),
    }
}

/// Quarter turn clockwise; the result is `height x width`.
pub fn rotate90(image: &RgbaImage) -> PixkernResult<RgbaImage> {
    apply_single(kernels::export_rotate90().map_err(Into::into), image, &[])
}

/// Half turn.
pub fn rotate180(image: &RgbaImage) -> PixkernResult<RgbaImage> {
    apply_single(kernels::export_rotate180().map_err(Into::into), image, &[])
}

/// Quarter turn counter-clockwise; the result is `height x width`.
pub fn rotate270(image: &RgbaImage) -> PixkernResult<RgbaImage> {
    apply_single(kernels::export_rotate270().map_err(Into::into), image, &[])
}
