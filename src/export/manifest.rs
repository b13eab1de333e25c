//! JSON description of an exported entry point.

use crate::core::error::PixkernResult;
use crate::export::argument::{Argument, ArgumentKind, ParamSet};
use crate::export::entry::{EntryPoint, ExportKind, OutputExtent};
use crate::export::layout::LayoutContract;
use crate::export::target::{ArtifactPaths, Target};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Schedule summary of one output kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub name: String,
    pub boundary: String,
    /// Directives in application order, empty when unscheduled.
    pub schedule: Vec<String>,
    pub unscheduled_updates: Vec<usize>,
}

/// Everything a host needs to call an entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryManifest {
    pub name: String,
    pub kind: ExportKind,
    pub arguments: Vec<Argument>,
    pub layout: LayoutContract,
    pub output_extent: OutputExtent,
    pub outputs: Vec<OutputManifest>,
    pub target: String,
    pub artifacts: ArtifactPaths,
}

impl EntryManifest {
    /// Describe `entry` compiled for `target`.
    pub fn from_entry(entry: &EntryPoint, target: &Target) -> Self {
        let outputs = entry
            .outputs()
            .iter()
            .map(|kernel| OutputManifest {
                name: kernel.name().to_string(),
                boundary: kernel.input().policy.to_string(),
                schedule: kernel
                    .schedule()
                    .map(|s| s.directives().iter().map(|d| d.to_string()).collect())
                    .unwrap_or_default(),
                unscheduled_updates: kernel
                    .schedule()
                    .map(|s| s.unscheduled_updates().collect())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            name: entry.name().to_string(),
            kind: entry.kind(),
            arguments: entry.arguments().to_vec(),
            layout: *entry.output_layout(),
            output_extent: entry.output_extent(),
            outputs,
            target: target.to_string(),
            artifacts: ArtifactPaths::for_entry(entry.name(), target.os),
        }
    }

    /// Replace scalar defaults with the values in `params`. Values of another
    /// type than the argument's are ignored.
    pub fn with_defaults(mut self, params: &ParamSet) -> Self {
        for arg in &mut self.arguments {
            if let ArgumentKind::Scalar { ty, default } = &mut arg.kind {
                match params.get(&arg.name) {
                    Some(value) if value.scalar_type() == *ty => *default = value,
                    _ => {}
                }
            }
        }
        self
    }

    pub fn to_json(&self) -> PixkernResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> PixkernResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> PixkernResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::BoundedInput;
    use crate::core::expr::{param, sample, x, y};
    use crate::core::kernel::{Kernel, Pipeline};
    use crate::core::types::{ScalarType, ScalarValue};
    use crate::schedule::{LoopVar, Schedule};

    fn entry() -> EntryPoint {
        let kernel = Kernel::new(
            "copy",
            BoundedInput::repeat_edge(
                "src",
                param("width", ScalarType::Int32),
                param("height", ScalarType::Int32),
            ),
        )
        .define(sample(x(), y(), 0))
        .with_schedule(Schedule::new().parallel(LoopVar::Y).vectorize(LoopVar::X, 8))
        .unwrap();
        EntryPoint::builder("copy", Pipeline::single(kernel))
            .with_argument(Argument::buffer("src"))
            .with_argument(Argument::scalar("width", 1920))
            .with_argument(Argument::scalar("height", 1080))
            .build()
            .unwrap()
    }

    #[test]
    fn test_manifest_contents() {
        let manifest = EntryManifest::from_entry(&entry(), &Target::default());
        assert_eq!(manifest.kind, ExportKind::Func);
        assert_eq!(manifest.outputs[0].schedule, vec!["parallel(y)", "vectorize(x, 8)"]);
        assert_eq!(manifest.outputs[0].boundary, "repeat_edge");
        assert_eq!(manifest.target, "x86-64-linux-avx-avx2-f16c-fma-no_runtime-sse41");
    }

    #[test]
    fn test_manifest_with_defaults() {
        let params = ParamSet::new().with("width", 640).with("height", 2.5f32);
        let manifest =
            EntryManifest::from_entry(&entry(), &Target::default()).with_defaults(&params);
        assert_eq!(manifest.arguments[1].default_value(), Some(ScalarValue::Int32(640)));
        // Mistyped values keep the declared default
        assert_eq!(manifest.arguments[2].default_value(), Some(ScalarValue::Int32(1080)));
    }

    #[test]
    fn test_manifest_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy.json");
        let manifest = EntryManifest::from_entry(&entry(), &Target::default());
        manifest.save(&path).unwrap();
        let loaded = EntryManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }
}
