//! TOML configuration for the `plait` tool.
//!
//! Looked up at `-c <path>` when given, otherwise at `~/.plait/plait.toml`
//! if that file exists. Every field has a default, so an empty or absent
//! file is valid. Command-line flags override file values.

use std::path::{Path, PathBuf};

use anyhow::Context;
use plait_types::{CodeParams, CodecParams, Technique};
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Code parameters used by `encode`.
    pub coding: CodingSection,
    /// Where fragments are written and read.
    pub storage: StorageSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[coding]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CodingSection {
    /// Number of data fragments.
    pub k: usize,
    /// Number of coding fragments.
    pub m: usize,
    /// Word size in bits.
    pub w: u32,
    pub technique: Technique,
    /// Packet size for bitmatrix techniques; ignored by the others.
    pub packetsize: usize,
    /// Buffer size hint; 0 picks one automatically.
    pub buffersize: usize,
    /// Number of layers per stripe. Derived from `k + m` if omitted.
    pub layers: Option<usize>,
}

impl Default for CodingSection {
    fn default() -> Self {
        let code = CodeParams::default();
        Self {
            k: code.k,
            m: code.m,
            w: code.w,
            technique: code.technique,
            packetsize: code.packetsize,
            buffersize: 0,
            layers: None,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory holding fragments and metadata.
    pub coding_dir: PathBuf,
    /// Hash every fragment before decoding or repairing.
    pub verify_digests: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            coding_dir: PathBuf::from("Coding"),
            verify_digests: true,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from `path`, or from the default location if it exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Codec parameters described by the `[coding]` section.
    pub fn codec_params(&self) -> CodecParams {
        let mut params = CodecParams::new(CodeParams {
            k: self.coding.k,
            m: self.coding.m,
            w: self.coding.w,
            technique: self.coding.technique,
            packetsize: self.coding.packetsize,
        });
        params.buffersize = self.coding.buffersize;
        if let Some(layers) = self.coding.layers {
            params.layers = layers;
        }
        params
    }
}

/// `~/.plait/plait.toml`, when a home directory is known.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".plait").join("plait.toml"))
}
