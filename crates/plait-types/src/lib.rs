//! Shared types and identifiers for Plait.
//!
//! This crate defines the types that cross crate boundaries in the Plait
//! workspace: content digests ([`FragmentId`], [`ObjectId`]), the coding
//! technique selector ([`Technique`]), codec parameters ([`CodeParams`],
//! [`CodecParams`]) and the persisted per-object record ([`ObjectMeta`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Digest types
// ---------------------------------------------------------------------------

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name([u8; 32]);

        impl $name {
            /// Create an ID by hashing arbitrary data with BLAKE3.
            pub fn from_data(data: &[u8]) -> Self {
                Self(blake3::hash(data).into())
            }

            /// Return the raw 32-byte representation.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseIdError(s.to_string()))?;
                Ok(Self(bytes))
            }
        }

        // Digests are persisted as hex strings so metadata files stay readable.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Content digest of one fragment stream: `blake3(fragment_bytes)`.
    FragmentId
);

define_id!(
    /// Content digest of the original object: `blake3(object_bytes)`.
    ObjectId
);

/// Error returned when a digest string is not 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid digest: expected 64 hex characters, got {0:?}")]
pub struct ParseIdError(String);

// ---------------------------------------------------------------------------
// Coding technique
// ---------------------------------------------------------------------------

/// Base erasure-coding technique applied independently to every layer.
///
/// The numeric ids follow the historical ordering of the technique table and
/// are recorded in object metadata next to the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Systematic Vandermonde Reed-Solomon over GF(2^w), w ∈ {8, 16, 32}.
    ReedSolVan,
    /// RAID-6 optimised Reed-Solomon (m = 2).
    ReedSolR6Op,
    /// Original Cauchy Reed-Solomon, expanded to a bitmatrix.
    CauchyOrig,
    /// Cauchy Reed-Solomon with a density-reduced matrix.
    CauchyGood,
    /// Liberation RAID-6 bitmatrix code (w prime).
    Liberation,
    /// Blaum-Roth RAID-6 bitmatrix code (w + 1 prime).
    BlaumRoth,
    /// Liber8tion RAID-6 code (w = 8).
    Liber8tion,
}

impl Technique {
    /// All techniques, in id order.
    pub const ALL: [Technique; 7] = [
        Technique::ReedSolVan,
        Technique::ReedSolR6Op,
        Technique::CauchyOrig,
        Technique::CauchyGood,
        Technique::Liberation,
        Technique::BlaumRoth,
        Technique::Liber8tion,
    ];

    /// Canonical lowercase name (`"reed_sol_van"`, `"cauchy_good"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Technique::ReedSolVan => "reed_sol_van",
            Technique::ReedSolR6Op => "reed_sol_r6_op",
            Technique::CauchyOrig => "cauchy_orig",
            Technique::CauchyGood => "cauchy_good",
            Technique::Liberation => "liberation",
            Technique::BlaumRoth => "blaum_roth",
            Technique::Liber8tion => "liber8tion",
        }
    }

    /// Numeric technique id.
    pub fn id(self) -> u8 {
        match self {
            Technique::ReedSolVan => 0,
            Technique::ReedSolR6Op => 1,
            Technique::CauchyOrig => 2,
            Technique::CauchyGood => 3,
            Technique::Liberation => 4,
            Technique::BlaumRoth => 5,
            Technique::Liber8tion => 6,
        }
    }

    /// Whether the technique works on a bitmatrix of packets rather than
    /// on w-bit words.
    pub fn is_bitmatrix(self) -> bool {
        !matches!(self, Technique::ReedSolVan | Technique::ReedSolR6Op)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a technique name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "unknown coding technique {0:?}: choose one of reed_sol_van, reed_sol_r6_op, \
     cauchy_orig, cauchy_good, liberation, blaum_roth, liber8tion"
)]
pub struct ParseTechniqueError(String);

impl FromStr for Technique {
    type Err = ParseTechniqueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Technique::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ParseTechniqueError(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters of the base (k, m) code applied to each layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeParams {
    /// Number of data fragments.
    pub k: usize,
    /// Number of coding fragments.
    pub m: usize,
    /// Word size in bits.
    pub w: u32,
    /// Base technique.
    pub technique: Technique,
    /// Packet size in bytes for bitmatrix techniques (ignored otherwise).
    pub packetsize: usize,
}

impl CodeParams {
    /// Total number of fragments, `k + m`.
    pub fn fragments(&self) -> usize {
        self.k + self.m
    }
}

impl Default for CodeParams {
    fn default() -> Self {
        Self {
            k: 4,
            m: 2,
            w: 8,
            technique: Technique::ReedSolVan,
            packetsize: 0,
        }
    }
}

/// Full parameter set of the coupled-layer codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecParams {
    /// Base code parameters.
    pub code: CodeParams,
    /// Number of layers M (a power of two).
    pub layers: usize,
    /// Requested read-in buffer size in bytes; 0 encodes the whole object as
    /// a single stripe.
    pub buffersize: usize,
}

impl CodecParams {
    /// Parameters with the default layer count for `code`.
    pub fn new(code: CodeParams) -> Self {
        Self {
            code,
            layers: default_layers(code.fragments()),
            buffersize: 0,
        }
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        Self::new(CodeParams::default())
    }
}

/// Upper bound on the layer count accepted by [`default_layers`].
pub const MAX_DEFAULT_LAYERS: usize = 1 << 12;

/// Suggest a layer count for `n = k + m` fragments.
///
/// Every column pair gets its own coupling pass when `M = 2^floor(n/2)`,
/// which is what gives every fragment a bandwidth-efficient repair path.
///
/// | n      | M     |
/// |--------|-------|
/// | 2-3    | 2     |
/// | 6      | 8     |
/// | 14     | 128   |
/// | ≥ 24   | 4096  |
pub fn default_layers(n: usize) -> usize {
    let pairs = (n / 2).max(1) as u32;
    (1usize << pairs.min(12)).min(MAX_DEFAULT_LAYERS)
}

// ---------------------------------------------------------------------------
// Object metadata
// ---------------------------------------------------------------------------

/// Everything needed to decode or repair an encoded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Name of the encoded object (usually the input file name).
    pub name: String,
    /// Size of the object before padding.
    pub original_size: u64,
    /// Digest of the original object bytes.
    pub object_id: ObjectId,
    /// Number of data fragments.
    pub k: usize,
    /// Number of coding fragments.
    pub m: usize,
    /// Word size in bits.
    pub w: u32,
    /// Packet size for bitmatrix techniques.
    pub packetsize: usize,
    /// Effective stripe (read-in buffer) size in bytes.
    pub buffersize: usize,
    /// Base technique.
    pub technique: Technique,
    /// Numeric id of `technique`, kept for readers of older tooling.
    pub technique_id: u8,
    /// Number of stripes the object was encoded in.
    pub readins: usize,
    /// Number of layers M.
    pub layers: usize,
    /// Size of one block in bytes.
    pub blocksize: usize,
    /// Digest of each fragment stream, index 0..k+m.
    pub fragments: Vec<FragmentId>,
}

impl ObjectMeta {
    /// The base code parameters recorded in this metadata.
    pub fn code_params(&self) -> CodeParams {
        CodeParams {
            k: self.k,
            m: self.m,
            w: self.w,
            technique: self.technique,
            packetsize: self.packetsize,
        }
    }

    /// Size of one fragment stream in bytes.
    pub fn fragment_size(&self) -> u64 {
        (self.readins * self.layers * self.blocksize) as u64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
