//! Compile targets and artifact naming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    #[serde(rename = "osx")]
    OSX,
}

impl Os {
    /// Suffix used in artifact file names.
    pub fn artifact_suffix(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::OSX => "darwin",
        }
    }

    /// Extension of the compiled object for this OS.
    pub fn object_extension(self) -> &'static str {
        match self {
            Os::Linux => "o",
            Os::OSX => "dylib",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Linux => write!(f, "linux"),
            Os::OSX => write!(f, "osx"),
        }
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "osx" | "darwin" | "macos" => Ok(Os::OSX),
            other => Err(format!("unsupported os: {}", other)),
        }
    }
}

/// Instruction set architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
}

/// Optional target feature. Variant order is the canonical string order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Avx,
    Avx2,
    F16c,
    Fma,
    /// Leave the runtime out of the object; it is linked separately.
    NoRuntime,
    Sse41,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Avx => "avx",
            Feature::Avx2 => "avx2",
            Feature::F16c => "f16c",
            Feature::Fma => "fma",
            Feature::NoRuntime => "no_runtime",
            Feature::Sse41 => "sse41",
        };
        write!(f, "{}", name)
    }
}

/// A compile target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub os: Os,
    pub arch: Arch,
    pub bits: u32,
    pub features: BTreeSet<Feature>,
}

impl Target {
    /// 64-bit x86 with AVX, AVX2, FMA, F16C and SSE4.1.
    pub fn x86_64(os: Os) -> Self {
        Self {
            os,
            arch: Arch::X86,
            bits: 64,
            features: [
                Feature::Avx,
                Feature::Avx2,
                Feature::Fma,
                Feature::F16c,
                Feature::Sse41,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Target for kernel objects, which link against a shared runtime.
    pub fn kernel(os: Os) -> Self {
        Self::x86_64(os).with_feature(Feature::NoRuntime)
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::kernel(Os::Linux)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arch = match self.arch {
            Arch::X86 => "x86",
        };
        write!(f, "{}-{}-{}", arch, self.bits, self.os)?;
        for feature in &self.features {
            write!(f, "-{}", feature)?;
        }
        Ok(())
    }
}

/// Where the artifacts of one entry point are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub object: PathBuf,
    pub header: PathBuf,
}

impl ArtifactPaths {
    /// `lib/lib<name>_<os>.<ext>` and `include/<name>.h`.
    pub fn for_entry(name: &str, os: Os) -> Self {
        Self {
            object: PathBuf::from("lib").join(format!(
                "lib{}_{}.{}",
                name,
                os.artifact_suffix(),
                os.object_extension()
            )),
            header: PathBuf::from("include").join(format!("{}.h", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string() {
        assert_eq!(
            Target::x86_64(Os::Linux).to_string(),
            "x86-64-linux-avx-avx2-f16c-fma-sse41"
        );
        assert_eq!(
            Target::kernel(Os::OSX).to_string(),
            "x86-64-osx-avx-avx2-f16c-fma-no_runtime-sse41"
        );
    }

    #[test]
    fn test_artifact_paths() {
        let linux = ArtifactPaths::for_entry("grayscale", Os::Linux);
        assert_eq!(linux.object, PathBuf::from("lib/libgrayscale_linux.o"));
        assert_eq!(linux.header, PathBuf::from("include/grayscale.h"));
        let osx = ArtifactPaths::for_entry("rotate90", Os::OSX);
        assert_eq!(osx.object, PathBuf::from("lib/librotate90_darwin.dylib"));
    }

    #[test]
    fn test_os_from_str() {
        assert_eq!("darwin".parse::<Os>(), Ok(Os::OSX));
        assert_eq!("Linux".parse::<Os>(), Ok(Os::Linux));
        assert!("windows".parse::<Os>().is_err());
    }
}
