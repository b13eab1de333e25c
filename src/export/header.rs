//! C header generation for exported entry points.

use crate::export::argument::{Argument, ArgumentKind};
use crate::export::entry::EntryPoint;
use std::fmt::Write;

/// Emit the C declaration of `entry`.
///
/// Buffers are `struct halide_buffer_t *`, scalars use their C type, and
/// output buffers follow every argument in output order.
pub fn emit_header(entry: &EntryPoint) -> String {
    let name = entry.name();
    let guard = format!("HALIDE__{}_h", sanitize(name));

    let mut params: Vec<String> = entry.arguments().iter().map(c_parameter).collect();
    params.extend(
        entry
            .outputs()
            .iter()
            .map(|k| format!("struct halide_buffer_t *_{}_buffer", sanitize(k.name()))),
    );

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "#ifndef {}", guard);
    let _ = writeln!(out, "#define {}", guard);
    out.push_str("#include <stdint.h>\n\n");
    out.push_str("struct halide_buffer_t;\n");
    out.push_str("struct halide_filter_metadata_t;\n\n");
    out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");
    let _ = writeln!(out, "int {}({});\n", name, params.join(", "));
    let _ = writeln!(out, "int {}_argv(void **args);\n", name);
    let _ = writeln!(
        out,
        "const struct halide_filter_metadata_t *{}_metadata();\n",
        name
    );
    out.push_str("#ifdef __cplusplus\n}  // extern \"C\"\n#endif\n\n");
    out.push_str("#endif\n");
    out
}

fn c_parameter(arg: &Argument) -> String {
    match &arg.kind {
        ArgumentKind::Buffer => {
            format!("struct halide_buffer_t *_{}_buffer", sanitize(&arg.name))
        }
        ArgumentKind::Scalar { ty, .. } => format!("{} _{}", ty.c_name(), sanitize(&arg.name)),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::BoundedInput;
    use crate::core::expr::{param, sample, x, y};
    use crate::core::kernel::{Kernel, Pipeline};
    use crate::core::types::ScalarType;

    fn entry() -> EntryPoint {
        let kernel = Kernel::new(
            "scale",
            BoundedInput::repeat_edge(
                "src",
                param("width", ScalarType::Int32),
                param("height", ScalarType::Int32),
            ),
        )
        .define(sample(x(), y(), 0) * param("gain", ScalarType::Float32));
        EntryPoint::builder("scale", Pipeline::single(kernel))
            .with_argument(Argument::buffer("src"))
            .with_argument(Argument::scalar("width", 1920))
            .with_argument(Argument::scalar("height", 1080))
            .with_argument(Argument::scalar("gain", 1.0f32))
            .build()
            .unwrap()
    }

    #[test]
    fn test_header_declaration() {
        let header = emit_header(&entry());
        assert!(header.contains(
            "int scale(struct halide_buffer_t *_src_buffer, int32_t _width, int32_t _height, \
             float _gain, struct halide_buffer_t *_scale_buffer);"
        ));
        assert!(header.contains("int scale_argv(void **args);"));
    }

    #[test]
    fn test_header_guard() {
        let header = emit_header(&entry());
        assert!(header.starts_with("#ifndef HALIDE__scale_h\n#define HALIDE__scale_h\n"));
        assert!(header.trim_end().ends_with("#endif"));
    }
}
