//! Export/ABI layer.
//!
//! Freezes kernels, their runtime parameters and a buffer layout contract
//! into entry points, and describes them for hosts (C headers, manifests,
//! compile targets).

pub mod argument;
pub mod entry;
pub mod header;
pub mod layout;
pub mod manifest;
pub mod target;

pub use argument::{Argument, ArgumentKind, ParamSet};
pub use entry::{EntryPoint, EntryPointBuilder, ExportKind, OutputExtent};
pub use header::emit_header;
pub use layout::{DimConstraint, LayoutContract};
pub use manifest::{EntryManifest, OutputManifest};
pub use target::{ArtifactPaths, Feature, Os, Target};
