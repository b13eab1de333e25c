//! Configuration loaded from TOML.
//!
//! ```toml
//! width = 1920
//! height = 1080
//! factor = 0.525
//! os = "linux"
//!
//! [execution]
//! parallel = true
//! max_threads = 4
//! ```
//!
//! Every key is optional and falls back to its default.

use crate::core::error::PixkernResult;
use crate::execution::ExecutionOptions;
use crate::export::argument::ParamSet;
use crate::export::entry::EntryPoint;
use crate::export::target::{Os, Target};
use crate::kernels::{DEFAULT_FACTOR, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Library and CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixkernConfig {
    /// Default `width` argument reported by manifests. Invocations take the
    /// width from the source image.
    pub width: i32,
    /// Default `height` argument reported by manifests.
    pub height: i32,
    /// Default contrast `factor`.
    pub factor: f32,
    /// Compile target operating system.
    pub os: Os,
    /// Whether kernel objects are built without the embedded runtime.
    pub no_runtime: bool,
    /// Reference evaluator options.
    pub execution: ExecutionOptions,
}

impl Default for PixkernConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            factor: DEFAULT_FACTOR,
            os: Os::Linux,
            no_runtime: true,
            execution: ExecutionOptions::default(),
        }
    }
}

impl PixkernConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> PixkernResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> PixkernResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> PixkernResult<Self> {
        let path = path.as_ref();
        let config = Self::from_toml(&fs::read_to_string(path)?)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PixkernResult<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// The compile target this configuration selects.
    pub fn target(&self) -> Target {
        if self.no_runtime {
            Target::kernel(self.os)
        } else {
            Target::x86_64(self.os)
        }
    }

    /// Default parameters of `entry` with the configured `width`, `height`
    /// and `factor` substituted where the entry point declares them.
    pub fn params_for(&self, entry: &EntryPoint) -> ParamSet {
        let mut params = entry.default_params();
        if params.get("width").is_some() {
            params.set("width", self.width);
        }
        if params.get("height").is_some() {
            params.set("height", self.height);
        }
        if params.get("factor").is_some() {
            params.set("factor", self.factor);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ScalarValue;
    use crate::export::manifest::EntryManifest;
    use crate::export::target::Feature;
    use crate::kernels::{export_contrast, export_grayscale};

    #[test]
    fn test_defaults() {
        let config = PixkernConfig::default();
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.factor, 0.525);
        assert_eq!(
            config.target().to_string(),
            "x86-64-linux-avx-avx2-f16c-fma-no_runtime-sse41"
        );
    }

    #[test]
    fn test_partial_toml() {
        let config = PixkernConfig::from_toml(
            r#"
            factor = 0.8
            os = "osx"
            no_runtime = false

            [execution]
            max_threads = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.factor, 0.8);
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.execution.max_threads, 2);
        assert!(config.execution.parallel);
        assert!(!config.target().has_feature(Feature::NoRuntime));
        assert_eq!(config.target().to_string(), "x86-64-osx-avx-avx2-f16c-fma-sse41");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(PixkernConfig::from_toml("width = \"wide\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixkern.toml");

        let config = PixkernConfig {
            width: 640,
            height: 480,
            execution: ExecutionOptions::sequential(),
            ..PixkernConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PixkernConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_params_for_entry() {
        let config = PixkernConfig {
            width: 64,
            factor: 0.25,
            ..PixkernConfig::default()
        };

        let params = config.params_for(&export_contrast().unwrap());
        let names: Vec<_> = params.names().collect();
        assert_eq!(names, vec!["width", "height", "factor"]);
        assert_eq!(params.get("width"), Some(ScalarValue::Int32(64)));
        assert_eq!(params.get("factor"), Some(ScalarValue::Float32(0.25)));

        let params = config.params_for(&export_grayscale().unwrap());
        assert!(params.get("factor").is_none());
    }

    #[test]
    fn test_manifest_uses_configured_defaults() {
        let config = PixkernConfig::from_toml("width = 800\nfactor = 0.9\nos = \"osx\"").unwrap();
        let entry = export_contrast().unwrap();
        let manifest = EntryManifest::from_entry(&entry, &config.target())
            .with_defaults(&config.params_for(&entry));

        let defaults: Vec<_> = manifest
            .arguments
            .iter()
            .filter_map(|a| a.default_value())
            .collect();
        assert_eq!(
            defaults,
            vec![
                ScalarValue::Int32(800),
                ScalarValue::Int32(DEFAULT_HEIGHT),
                ScalarValue::Float32(0.9),
            ]
        );
        assert_eq!(
            manifest.artifacts.object,
            std::path::PathBuf::from("lib/libcontrast_darwin.dylib")
        );
    }
}
