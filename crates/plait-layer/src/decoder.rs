//! Erasure-aware decoding of layers and whole objects.

use std::time::{Duration, Instant};

use plait_code::StripeCoder;
use plait_types::{ObjectId, ObjectMeta};
use tracing::{debug, info, trace, warn};

use crate::arena::BlockArena;
use crate::coupling::{decouple_pass, resolve_cell};
use crate::encoder::LayeredCodec;
use crate::erasure::{ErasureList, assemble_layers, mark_erasures};
use crate::error::CodecError;
use crate::progress::CodecStats;
use crate::schedule::CouplingSchedule;
use crate::source::FragmentSource;

/// A decoded object.
#[derive(Debug, Clone)]
pub struct DecodedObject {
    pub data: Vec<u8>,
    pub stats: CodecStats,
}

/// Restore every cell of `arena` to its uncoupled value.
///
/// Pairs whose two columns survive are decoupled directly. Layers are then
/// base-decoded in ascending dependency score: the number of passes with a
/// single erased column whose cell in that layer is unpaired. Such a layer
/// holds a coupled surviving cell whose partner lives in a layer with a
/// strictly lower score, so partners are always decoded first.
pub fn decode_all_layers(
    arena: &mut BlockArena,
    schedule: &CouplingSchedule,
    coder: &dyn StripeCoder,
    erasures: &ErasureList,
) -> Result<(), CodecError> {
    erasures.check(coder.params().m)?;

    // (pass, erased column, surviving column)
    let mut single = Vec::new();
    for pass in 0..schedule.passes() {
        let (even, odd) = (2 * pass, 2 * pass + 1);
        match (erasures.contains(even), erasures.contains(odd)) {
            (false, false) => decouple_pass(arena, schedule, pass, |_| true)?,
            (true, false) => single.push((pass, even, odd)),
            (false, true) => single.push((pass, odd, even)),
            (true, true) => {}
        }
    }

    if erasures.is_empty() {
        return Ok(());
    }

    let score = |layer: usize| {
        single
            .iter()
            .filter(|&&(_, erased, _)| schedule.is_dot(layer, erased))
            .count()
    };
    let mut order: Vec<usize> = (0..arena.layers()).collect();
    order.sort_by_key(|&layer| (score(layer), layer));

    let mut decoded = vec![false; arena.layers()];
    for layer in order {
        for &(_, erased, surviving) in &single {
            if !schedule.is_dot(layer, erased) {
                continue;
            }
            let Some((partner, _)) = schedule.partner(layer, surviving) else {
                continue;
            };
            if !decoded[partner] {
                return Err(CodecError::CouplingUnresolvable {
                    layer,
                    column: surviving,
                });
            }
            resolve_cell(arena, schedule, layer, surviving)?;
        }

        let mut blocks = arena.layer_mut(layer);
        coder
            .decode_stripe(&mut blocks, erasures.as_slice())
            .map_err(|source| CodecError::BaseDecodeFailure { layer, source })?;
        decoded[layer] = true;
        trace!(layer, score = score(layer), "decoded layer");
    }
    Ok(())
}

impl LayeredCodec {
    /// Decode the object described by `meta` from whatever fragments
    /// `source` still has.
    pub fn decode<S: FragmentSource + ?Sized>(
        &self,
        meta: &ObjectMeta,
        source: &S,
    ) -> Result<DecodedObject, CodecError> {
        let started = Instant::now();
        let layout = self.check_meta(meta)?;
        let presence: Vec<bool> = (0..layout.n()).map(|i| source.is_present(i)).collect();
        for (fragment, _) in presence.iter().enumerate().filter(|(_, p)| !**p) {
            warn!(fragment, name = %meta.name, "fragment missing, treating as erased");
        }
        let mut erasures = mark_erasures(&presence, layout.m)?;

        let mut data = Vec::with_capacity(layout.original_size as usize);
        let mut coding_time = Duration::ZERO;
        self.progress_start(layout.readins);

        for stripe in 0..layout.readins {
            let mut arena = assemble_layers(source, &layout, stripe, &mut erasures)?;
            let t = Instant::now();
            decode_all_layers(&mut arena, self.schedule(), self.coder(), &erasures)?;
            coding_time += t.elapsed();
            arena.extract_data(layout.k, layout.object_range(stripe).len(), &mut data);
            debug!(stripe, erased = ?erasures.as_slice(), "decoded stripe");
            self.progress_advance();
        }

        let actual = ObjectId::from_data(&data);
        if actual != meta.object_id {
            return Err(CodecError::Integrity {
                expected: meta.object_id,
                actual,
            });
        }

        let stats = CodecStats {
            bytes: meta.original_size,
            coding: coding_time,
            total: started.elapsed(),
        };
        info!(
            name = %meta.name,
            size = meta.original_size,
            erased = erasures.len(),
            elapsed_ms = stats.total.as_millis() as u64,
            "decoded object"
        );
        Ok(DecodedObject { data, stats })
    }
}
