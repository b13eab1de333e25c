//! Pixel kernels: luma conversion, contrast and channel isolation.
//!
//! All three read the source through a repeat-edge view over
//! `(0, width) x (0, height) x (0, 4)`.

use crate::core::boundary::BoundedInput;
use crate::core::error::{ExportResult, ScheduleError};
use crate::core::expr::{cast, ch, max, min, param, sample, x, y, Expr};
use crate::core::kernel::{Kernel, Pipeline};
use crate::core::types::ScalarType;
use crate::export::argument::Argument;
use crate::export::entry::EntryPoint;
use crate::kernels::{height, image_entry, width, DEFAULT_FACTOR, SOURCE};
use crate::schedule::{LoopVar, Schedule};

/// Fixed-point luma weights, scaled by 256.
pub const GRAY_R: i32 = 76;
pub const GRAY_G: i32 = 152;
pub const GRAY_B: i32 = 28;

fn repeat_edge(width: Expr, height: Expr) -> BoundedInput {
    BoundedInput::repeat_edge(SOURCE, width, height)
}

/// Luma conversion.
///
/// Red, green and blue are promoted to 32-bit integers so the weighted sum
/// is exact; `luma = (76 R + 152 G + 28 B) >> 8`. The pure definition is 255
/// everywhere, then channels 0 to 2 are overwritten with the luma and
/// channel 3 with the source alpha.
pub fn grayscale(width: Expr, height: Expr) -> Result<Kernel, ScheduleError> {
    let channel = |c: i32| cast(ScalarType::Int32, sample(x(), y(), c));
    let luma = cast(
        ScalarType::UInt8,
        (channel(0) * GRAY_R + channel(1) * GRAY_G + channel(2) * GRAY_B) >> 8,
    );

    let schedule = Schedule::new()
        .compute_at(SOURCE, LoopVar::Ti)
        .tile(32, 32)
        .fuse(LoopVar::Xo, LoopVar::Yo, LoopVar::Ti)
        .parallel(LoopVar::Ch)
        .parallel_tasks(LoopVar::Ti, 8)
        .vectorize(LoopVar::Xi, 32)
        .unscheduled(0)
        .unscheduled(1)
        .unscheduled(2)
        .unscheduled(3);

    Kernel::new("grayscale", repeat_edge(width, height))
        .define(255u8)
        .update_channel(0, &luma)
        .update_channel(1, &luma)
        .update_channel(2, &luma)
        .update_channel(3, cast(ScalarType::UInt8, sample(x(), y(), 3)))
        .with_schedule(schedule)
}

/// Contrast adjustment around mid-grey.
///
/// `factor` is clamped to `[0, 1]`. Every channel, alpha included, goes
/// through `((v / 255 - 0.5) * factor + 0.5) * 255` in f32 and is truncated
/// back to u8.
pub fn contrast(width: Expr, height: Expr, factor: Expr) -> Result<Kernel, ScheduleError> {
    let e = max(min(1.0f32, factor), 0.0f32);

    let mut value = cast(ScalarType::Float32, sample(x(), y(), ch()));
    value = value / 255.0f32 - 0.5f32;
    value = value * e + 0.5f32;
    value = value * 255.0f32;

    let schedule = Schedule::new()
        .compute_at(SOURCE, LoopVar::X)
        .parallel(LoopVar::Ch)
        .vectorize(LoopVar::X, 16);

    Kernel::new("contrast", repeat_edge(width, height))
        .define(cast(ScalarType::UInt8, value))
        .with_schedule(schedule)
}

/// Channel isolation into three outputs.
///
/// Each output has an undefined pure definition and writes channels 0 to 3
/// in order: the kept channel's value or 0, then alpha 255.
pub fn split(width: Expr, height: Expr) -> Pipeline {
    let input = repeat_edge(width, height);
    let isolate = |name: &str, keep: i32| {
        let mut kernel = Kernel::new(name, input.clone());
        for c in 0..3 {
            let value = if c == keep {
                cast(ScalarType::UInt8, sample(x(), y(), c))
            } else {
                Expr::from(0u8)
            };
            kernel = kernel.update_channel(c, value);
        }
        kernel.update_channel(3, 255u8)
    };

    Pipeline::new(
        "split",
        vec![
            isolate("split_red", 0),
            isolate("split_green", 1),
            isolate("split_blue", 2),
        ],
    )
}

/// `grayscale(src, width, height)`.
pub fn export_grayscale() -> ExportResult<EntryPoint> {
    let kernel = grayscale(width(), height())?;
    image_entry("grayscale", Pipeline::single(kernel)).build()
}

/// `contrast(src, width, height, factor)`.
pub fn export_contrast() -> ExportResult<EntryPoint> {
    let kernel = contrast(width(), height(), param("factor", ScalarType::Float32))?;
    image_entry("contrast", Pipeline::single(kernel))
        .with_argument(Argument::scalar("factor", DEFAULT_FACTOR))
        .build()
}

/// `split(src, width, height)` with outputs red, green, blue.
pub fn export_split() -> ExportResult<EntryPoint> {
    image_entry("split", split(width(), height())).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::RgbaBuffer;
    use crate::export::entry::ExportKind;
    use crate::kernels::testing::{params_for, realize};

    fn gradient(width: u32, height: u32) -> RgbaBuffer {
        RgbaBuffer::from_fn(width, height, |x, y| {
            [
                (x * 37 + y * 11) as u8,
                (x * 5 + y * 71) as u8,
                (x * y * 3) as u8,
                (100 + x + y) as u8,
            ]
        })
    }

    fn contrast_with(source: &RgbaBuffer, factor: f32) -> RgbaBuffer {
        let entry = export_contrast().unwrap();
        let mut params = params_for(&entry, source);
        params.set("factor", factor);
        realize(&entry, source, &params).remove(0)
    }

    #[test]
    fn test_grayscale_red_pixel() {
        let entry = export_grayscale().unwrap();
        let source = RgbaBuffer::from_fn(2, 2, |_, _| [255, 0, 0, 255]);
        let out = realize(&entry, &source, &params_for(&entry, &source)).remove(0);
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(out.pixel(x, y), [75, 75, 75, 255]);
        }
    }

    #[test]
    fn test_grayscale_luma_formula() {
        let entry = export_grayscale().unwrap();
        let source = gradient(40, 35);
        let out = realize(&entry, &source, &params_for(&entry, &source)).remove(0);
        for y in 0..35 {
            for x in 0..40 {
                let [r, g, b, a] = source.pixel(x, y);
                let luma = ((r as i32 * 76 + g as i32 * 152 + b as i32 * 28) >> 8) as u8;
                assert_eq!(out.pixel(x, y), [luma, luma, luma, a], "at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_grayscale_white_stays_white() {
        let entry = export_grayscale().unwrap();
        let source = RgbaBuffer::from_fn(3, 1, |_, _| [255, 255, 255, 7]);
        let out = realize(&entry, &source, &params_for(&entry, &source)).remove(0);
        assert_eq!(out.pixel(2, 0), [255, 255, 255, 7]);
    }

    #[test]
    fn test_grayscale_schedule_shape() {
        let kernel = grayscale(width(), height()).unwrap();
        let schedule = kernel.schedule().unwrap();
        assert_eq!(schedule.directives().len(), 6);
        assert_eq!(schedule.unscheduled_updates().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_contrast_identity_within_one() {
        let source = gradient(17, 9);
        let out = contrast_with(&source, 1.0);
        for (a, b) in source.as_raw().iter().zip(out.as_raw()) {
            assert!((*a as i32 - *b as i32).abs() <= 1, "{} -> {}", a, b);
        }
    }

    #[test]
    fn test_contrast_zero_is_mid_grey() {
        let out = contrast_with(&gradient(9, 4), 0.0);
        assert!(out.as_raw().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_contrast_default_factor() {
        let entry = export_contrast().unwrap();
        let source = RgbaBuffer::from_fn(1, 1, |_, _| [0, 128, 200, 255]);
        let out = realize(&entry, &source, &params_for(&entry, &source)).remove(0);
        assert_eq!(out.pixel(0, 0), [60, 127, 165, 194]);
    }

    #[test]
    fn test_contrast_factor_clamped() {
        let source = gradient(6, 5);
        assert_eq!(contrast_with(&source, -1.0), contrast_with(&source, 0.0));
        assert_eq!(contrast_with(&source, 2.0), contrast_with(&source, 1.0));
    }

    #[test]
    fn test_split_isolates_channels() {
        let entry = export_split().unwrap();
        assert_eq!(entry.kind(), ExportKind::Pipeline);
        let names: Vec<_> = entry.arguments().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["src", "width", "height"]);

        let source = RgbaBuffer::from_fn(2, 2, |_, _| [10, 20, 30, 255]);
        let outs = realize(&entry, &source, &params_for(&entry, &source));
        assert_eq!(outs.len(), 3);
        assert_eq!(outs[0].pixel(1, 1), [10, 0, 0, 255]);
        assert_eq!(outs[1].pixel(1, 1), [0, 20, 0, 255]);
        assert_eq!(outs[2].pixel(1, 1), [0, 0, 30, 255]);
    }

    #[test]
    fn test_split_single_pixel() {
        let entry = export_split().unwrap();
        let source = RgbaBuffer::from_fn(1, 1, |_, _| [10, 20, 30, 255]);
        let outs = realize(&entry, &source, &params_for(&entry, &source));
        let pixels: Vec<_> = outs.iter().map(|out| out.pixel(0, 0)).collect();
        assert_eq!(
            pixels,
            vec![[10, 0, 0, 255], [0, 20, 0, 255], [0, 0, 30, 255]]
        );
    }

    #[test]
    fn test_contrast_arguments() {
        let entry = export_contrast().unwrap();
        let factor = entry.arguments().last().unwrap();
        assert_eq!(factor.name, "factor");
        assert_eq!(factor.scalar_type(), Some(ScalarType::Float32));
    }
}
