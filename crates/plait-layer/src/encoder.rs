//! The layered codec and whole-object encoding.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use plait_code::{CodingDescriptor, StripeCoder, build_descriptor};
use plait_types::{CodecParams, FragmentId, ObjectId, ObjectMeta};
use tracing::{debug, info};

use crate::arena::BlockArena;
use crate::coupling::forward;
use crate::error::CodecError;
use crate::layout::StripeLayout;
use crate::progress::{CodecStats, ProgressContext};
use crate::schedule::CouplingSchedule;

/// An encoded object: its metadata and the `k + m` fragment streams.
#[derive(Debug, Clone)]
pub struct EncodedObject {
    pub meta: ObjectMeta,
    pub fragments: Vec<Bytes>,
    pub stats: CodecStats,
}

/// Coupled-layer erasure codec for one parameter set.
///
/// Each stripe is split into `layers` independent instances of the base
/// `(k, m)` code; after base encoding the coupling transform mixes pairs of
/// layers so that a single lost fragment can be rebuilt from half of every
/// helper fragment.
#[derive(Debug)]
pub struct LayeredCodec {
    params: CodecParams,
    coder: CodingDescriptor,
    schedule: CouplingSchedule,
    progress: Option<Arc<ProgressContext>>,
}

impl LayeredCodec {
    /// Validate `params` and build the base code and coupling schedule.
    pub fn new(params: CodecParams) -> Result<Self, CodecError> {
        let coder = build_descriptor(&params.code)?;
        let schedule = CouplingSchedule::new(params.code.fragments(), params.layers, params.code.w)?;
        debug!(
            k = params.code.k,
            m = params.code.m,
            layers = params.layers,
            passes = schedule.passes(),
            backend = coder.backend_name(),
            "built layered codec"
        );
        Ok(Self {
            params,
            coder,
            schedule,
            progress: None,
        })
    }

    /// The codec an object was encoded with.
    pub fn from_meta(meta: &ObjectMeta) -> Result<Self, CodecError> {
        Self::new(CodecParams {
            code: meta.code_params(),
            layers: meta.layers,
            buffersize: meta.buffersize,
        })
    }

    /// Report per-read-in progress to `progress`.
    pub fn with_progress(mut self, progress: Arc<ProgressContext>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn params(&self) -> &CodecParams {
        &self.params
    }

    pub fn schedule(&self) -> &CouplingSchedule {
        &self.schedule
    }

    pub(crate) fn coder(&self) -> &dyn StripeCoder {
        &self.coder
    }

    /// Block alignment required by the base code.
    pub fn alignment(&self) -> usize {
        self.coder.alignment()
    }

    /// Geometry for an object of `size` bytes.
    pub fn plan(&self, size: u64) -> Result<StripeLayout, CodecError> {
        let code = &self.params.code;
        StripeLayout::plan(
            code.k,
            code.m,
            self.params.layers,
            self.alignment(),
            self.params.buffersize,
            size,
        )
    }

    pub(crate) fn progress_start(&self, total: usize) {
        if let Some(progress) = &self.progress {
            progress.start(total);
        }
    }

    pub(crate) fn progress_advance(&self) {
        if let Some(progress) = &self.progress {
            progress.advance();
        }
    }

    /// Check that `meta` was produced with this codec's parameters.
    pub(crate) fn check_meta(&self, meta: &ObjectMeta) -> Result<StripeLayout, CodecError> {
        if meta.code_params() != self.params.code || meta.layers != self.params.layers {
            return Err(CodecError::Config(format!(
                "object {:?} was encoded with different parameters",
                meta.name
            )));
        }
        StripeLayout::from_meta(meta)
    }

    /// Base-encode every layer, then apply the forward coupling transform.
    pub fn encode_arena(&self, arena: &mut BlockArena) -> Result<(), CodecError> {
        let k = self.params.code.k;
        for layer in 0..arena.layers() {
            let mut blocks = arena.layer_mut(layer);
            let (data, coding) = blocks.split_at_mut(k);
            let data: Vec<&[u8]> = data.iter().map(|b| &**b).collect();
            self.coder.encode_stripe(&data, coding)?;
        }
        let mut scratch = vec![0u8; arena.blocksize()];
        forward(arena, &self.schedule, &mut scratch)
    }

    /// Encode `data` into `k + m` fragments.
    pub fn encode(&self, name: &str, data: &[u8]) -> Result<EncodedObject, CodecError> {
        let started = Instant::now();
        let layout = self.plan(data.len() as u64)?;
        let n = layout.n();
        let segment_len = layout.segment_len();
        let mut fragments = vec![Vec::with_capacity(layout.fragment_len() as usize); n];
        let mut segment = vec![0u8; segment_len];
        let mut coding_time = Duration::ZERO;

        self.progress_start(layout.readins);
        for stripe in 0..layout.readins {
            let mut arena = BlockArena::new(layout.layers, n, layout.blocksize);
            arena.load_data(layout.k, &data[layout.object_range(stripe)]);

            let t = Instant::now();
            self.encode_arena(&mut arena)?;
            coding_time += t.elapsed();

            for (column, fragment) in fragments.iter_mut().enumerate() {
                arena.column_into(column, &mut segment);
                fragment.extend_from_slice(&segment);
            }
            debug!(stripe, readins = layout.readins, "encoded stripe");
            self.progress_advance();
        }

        let fragments: Vec<Bytes> = fragments.into_iter().map(Bytes::from).collect();
        let code = &self.params.code;
        let meta = ObjectMeta {
            name: name.to_string(),
            original_size: data.len() as u64,
            object_id: ObjectId::from_data(data),
            k: code.k,
            m: code.m,
            w: code.w,
            packetsize: code.packetsize,
            buffersize: layout.stripe_bytes(),
            technique: code.technique,
            technique_id: code.technique.id(),
            readins: layout.readins,
            layers: layout.layers,
            blocksize: layout.blocksize,
            fragments: fragments.iter().map(|f| FragmentId::from_data(f)).collect(),
        };
        let stats = CodecStats {
            bytes: meta.original_size,
            coding: coding_time,
            total: started.elapsed(),
        };
        info!(
            name,
            size = meta.original_size,
            technique = %code.technique,
            k = code.k,
            m = code.m,
            layers = layout.layers,
            blocksize = layout.blocksize,
            readins = layout.readins,
            elapsed_ms = stats.total.as_millis() as u64,
            "encoded object"
        );
        Ok(EncodedObject {
            meta,
            fragments,
            stats,
        })
    }
}
