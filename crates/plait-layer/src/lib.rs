//! Coupled-layer erasure codec.
//!
//! An object is cut into stripes; each stripe is spread over `M` layers,
//! every layer an independent instance of a systematic `(k, m)` base code
//! from [`plait_code`]. After base encoding, the layer-coupling transform
//! ([`coupling`]) mixes pairs of layers along a power-of-two schedule
//! ([`CouplingSchedule`]) so that one lost fragment can be rebuilt by
//! reading only half of every other fragment.
//!
//! Entry point is [`LayeredCodec`]:
//! - [`LayeredCodec::encode`] produces the `k + m` fragments and an
//!   [`ObjectMeta`](plait_types::ObjectMeta).
//! - [`LayeredCodec::decode`] reconstructs the object from any `k`
//!   fragments read through a [`FragmentSource`].
//! - [`LayeredCodec::repair`] rebuilds a single fragment.

mod arena;
pub mod coupling;
mod decoder;
mod encoder;
mod erasure;
mod error;
mod layout;
mod progress;
mod repair;
mod schedule;
mod source;

pub use arena::BlockArena;
pub use decoder::{DecodedObject, decode_all_layers};
pub use encoder::{EncodedObject, LayeredCodec};
pub use erasure::{ErasureList, assemble_layers, mark_erasures};
pub use error::CodecError;
pub use layout::StripeLayout;
pub use progress::{CodecStats, ProgressContext, ProgressSnapshot};
pub use repair::{RepairStrategy, RepairedFragment};
pub use schedule::{CouplingSchedule, PassCoefficients, coupling_width};
pub use source::{FragmentSource, MemoryFragments, MeteredSource};
