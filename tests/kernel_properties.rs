//! Property tests for the built-in kernels, run through the public API.

use pixkern::prelude::*;
use proptest::collection::vec;
use proptest::prelude::*;

fn image_strategy(max: u32) -> impl Strategy<Value = RgbaBuffer> {
    (1..=max, 1..=max).prop_flat_map(|(w, h)| {
        vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |data| RgbaBuffer::from_raw(w, h, data).unwrap())
    })
}

fn params(entry: &EntryPoint, source: &RgbaBuffer) -> ParamSet {
    let mut params = entry.default_params();
    params.set("width", source.width());
    params.set("height", source.height());
    params
}

fn outputs_for(entry: &EntryPoint, source: &RgbaBuffer) -> Vec<RgbaBuffer> {
    let (w, h) = entry
        .output_extent()
        .apply(source.width(), source.height());
    entry
        .outputs()
        .iter()
        .map(|_| RgbaBuffer::new(w as u32, h as u32))
        .collect()
}

fn run(entry: &EntryPoint, source: &RgbaBuffer, params: &ParamSet) -> Vec<RgbaBuffer> {
    let mut outputs = outputs_for(entry, source);
    ExecutionEngine::new()
        .invoke(entry, source, params, &mut outputs)
        .unwrap();
    outputs
}

fn contrast(source: &RgbaBuffer, factor: f32) -> RgbaBuffer {
    let entry = pixkern::kernels::export_contrast().unwrap();
    let params = params(&entry, source).with("factor", factor);
    run(&entry, source, &params).remove(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_grayscale_is_luma(source in image_strategy(40)) {
        let entry = pixkern::kernels::export_grayscale().unwrap();
        let out = run(&entry, &source, &params(&entry, &source)).remove(0);
        for y in 0..source.height() {
            for x in 0..source.width() {
                let [r, g, b, a] = source.pixel(x, y);
                let luma = ((r as i32 * 76 + g as i32 * 152 + b as i32 * 28) >> 8) as u8;
                prop_assert_eq!(out.pixel(x, y), [luma, luma, luma, a]);
            }
        }
    }

    #[test]
    fn test_contrast_identity_within_one(source in image_strategy(24)) {
        let out = contrast(&source, 1.0);
        for (a, b) in source.as_raw().iter().zip(out.as_raw()) {
            prop_assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_contrast_factor_is_clamped(source in image_strategy(12), factor in -4.0f32..4.0) {
        let clamped = factor.clamp(0.0, 1.0);
        prop_assert_eq!(contrast(&source, factor), contrast(&source, clamped));
    }

    #[test]
    fn test_split_recombines(source in image_strategy(24)) {
        let entry = pixkern::kernels::export_split().unwrap();
        let outs = run(&entry, &source, &params(&entry, &source));
        for y in 0..source.height() {
            for x in 0..source.width() {
                let [r, g, b, _] = source.pixel(x, y);
                prop_assert_eq!(outs[0].pixel(x, y), [r, 0, 0, 255]);
                prop_assert_eq!(outs[1].pixel(x, y), [0, g, 0, 255]);
                prop_assert_eq!(outs[2].pixel(x, y), [0, 0, b, 255]);
            }
        }
    }

    #[test]
    fn test_rotate90_transposes(source in image_strategy(24)) {
        let entry = pixkern::kernels::export_rotate90().unwrap();
        let out = run(&entry, &source, &params(&entry, &source)).remove(0);
        let (w, h) = (source.width(), source.height());
        prop_assert_eq!((out.width(), out.height()), (h, w));
        for y in 0..out.height() {
            for x in 0..out.width() {
                let (sx, sy) = (y, h - 1 - x);
                let expected = if sx < w - 1 && sy >= 0 && sy < h - 1 {
                    source.pixel(sx, sy)
                } else {
                    [0; 4]
                };
                prop_assert_eq!(out.pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn test_rotate180_twice_restores_interior(source in image_strategy(24)) {
        let entry = pixkern::kernels::export_rotate180().unwrap();
        let once = run(&entry, &source, &params(&entry, &source)).remove(0);
        let twice = run(&entry, &once, &params(&entry, &once)).remove(0);
        let (w, h) = (source.width(), source.height());
        for y in 0..h {
            for x in 0..w {
                let interior = x >= 1 && x <= w - 2 && y >= 1 && y <= h - 2;
                let expected = if interior { source.pixel(x, y) } else { [0; 4] };
                prop_assert_eq!(twice.pixel(x, y), expected);
            }
        }
    }

    #[test]
    fn test_schedule_matches_sequential(source in image_strategy(70), threads in 1usize..4) {
        let engine = ExecutionEngine::new();
        let options = ExecutionOptions::new().with_max_threads(threads);
        for name in ["grayscale", "contrast", "split"] {
            let entry = KernelRegistry::with_builtins().create(name).unwrap();
            let params = params(&entry, &source);

            let mut scheduled = outputs_for(&entry, &source);
            engine.invoke_with(&entry, &source, &params, &mut scheduled, &options).unwrap();

            let mut sequential = outputs_for(&entry, &source);
            engine.realize_sequential(&entry, &source, &params, &mut sequential).unwrap();

            prop_assert_eq!(scheduled, sequential);
        }
    }
}
