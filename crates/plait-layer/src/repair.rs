//! Single-fragment repair.
//!
//! A lost fragment `e` in coupled pass `p` is unpaired in half of the
//! layers, its repair planes. Planes are closed under the pairings of every
//! other pass, so reading only the planes of the `n - 1` helpers is enough
//! to decouple them, base-decode each plane with erasures `{e, e ^ 1}` and
//! derive `e`'s stored cell in the sibling layer of every plane.

use std::time::{Duration, Instant};

use bytes::Bytes;
use plait_gf::xor_region;
use plait_types::{FragmentId, ObjectMeta};
use tracing::{debug, info, warn};

use crate::arena::BlockArena;
use crate::coupling::{decouple_pass, forward};
use crate::decoder::decode_all_layers;
use crate::encoder::LayeredCodec;
use crate::erasure::{assemble_layers, mark_erasures};
use crate::error::CodecError;
use crate::layout::StripeLayout;
use crate::progress::CodecStats;
use crate::source::FragmentSource;

/// How a fragment was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Read only the repair planes of every helper.
    RepairPlanes,
    /// Decoded every layer and re-encoded the lost column.
    FullDecode,
}

/// A rebuilt fragment stream.
#[derive(Debug, Clone)]
pub struct RepairedFragment {
    pub index: usize,
    pub data: Bytes,
    pub id: FragmentId,
    pub strategy: RepairStrategy,
    pub stats: CodecStats,
}

impl LayeredCodec {
    /// Rebuild the stored content of fragment `lost`.
    ///
    /// Uses the repair planes when `lost` is coupled, `m >= 2` and every
    /// other fragment is present; otherwise decodes the whole object and
    /// re-applies the forward transform. The result is checked against the
    /// fragment digest recorded in `meta`.
    pub fn repair<S: FragmentSource + ?Sized>(
        &self,
        meta: &ObjectMeta,
        source: &S,
        lost: usize,
    ) -> Result<RepairedFragment, CodecError> {
        let started = Instant::now();
        let layout = self.check_meta(meta)?;
        if lost >= layout.n() {
            return Err(CodecError::Config(format!(
                "fragment {lost} out of range for {} fragments",
                layout.n()
            )));
        }

        let helpers_present = (0..layout.n())
            .filter(|&i| i != lost)
            .all(|i| source.is_present(i));
        let planes_usable =
            self.schedule().pass_of(lost).is_some() && layout.m >= 2 && helpers_present;

        let mut coding_time = Duration::ZERO;
        let planes = if planes_usable {
            match self.repair_planes(&layout, source, lost, &mut coding_time) {
                Ok(data) => Some(data),
                Err(CodecError::Io(e)) => {
                    warn!(fragment = lost, error = %e, "helper read failed, falling back to full decode");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        let (data, strategy) = match planes {
            Some(data) => (data, RepairStrategy::RepairPlanes),
            None => (
                self.repair_full(&layout, source, lost, &mut coding_time)?,
                RepairStrategy::FullDecode,
            ),
        };

        let id = FragmentId::from_data(&data);
        if id != meta.fragments[lost] {
            return Err(CodecError::RepairMismatch { index: lost });
        }
        let stats = CodecStats {
            bytes: data.len() as u64,
            coding: coding_time,
            total: started.elapsed(),
        };
        info!(
            name = %meta.name,
            fragment = lost,
            ?strategy,
            elapsed_ms = stats.total.as_millis() as u64,
            "repaired fragment"
        );
        Ok(RepairedFragment {
            index: lost,
            data: Bytes::from(data),
            id,
            strategy,
            stats,
        })
    }

    fn repair_planes<S: FragmentSource + ?Sized>(
        &self,
        layout: &StripeLayout,
        source: &S,
        lost: usize,
        coding_time: &mut Duration,
    ) -> Result<Vec<u8>, CodecError> {
        let schedule = self.schedule();
        let field = schedule.field();
        let n = layout.n();
        let bs = layout.blocksize;
        let pass = lost / 2;
        let stride = schedule.stride(pass);
        let coef = schedule.coefficients(pass);
        let partner = lost ^ 1;
        let planes = schedule.repair_planes(lost);
        let is_plane = |layer: usize| schedule.is_dot(layer, lost);
        let erasures = [lost.min(partner), lost.max(partner)];

        let mut out = vec![0u8; layout.fragment_len() as usize];
        let mut stored = vec![0u8; bs];
        self.progress_start(layout.readins);

        for stripe in 0..layout.readins {
            let mut arena = BlockArena::new(layout.layers, n, bs);
            for &layer in &planes {
                let offset = layout.block_offset(stripe, layer);
                for column in (0..n).filter(|&c| c != lost) {
                    source.read_at(column, offset, arena.cell_mut(layer, column))?;
                }
            }

            let t = Instant::now();
            for other in (0..schedule.passes()).filter(|&q| q != pass) {
                decouple_pass(&mut arena, schedule, other, is_plane)?;
            }

            for &layer in &planes {
                stored.copy_from_slice(arena.cell(layer, partner));
                let mut blocks = arena.layer_mut(layer);
                self.coder()
                    .decode_stripe(&mut blocks, &erasures)
                    .map_err(|source| CodecError::BaseDecodeFailure { layer, source })?;

                // Stored cell of the lost column in the sibling layer.
                let known = arena.cell(layer, partner);
                xor_region(&mut stored, known)?;
                if lost % 2 == 1 {
                    // known = y, stored = theta x + y + y
                    field.mul_region_in_place(coef.inv_theta, &mut stored)?;
                    xor_region(&mut stored, known)?;
                } else {
                    // known = x, stored = x + y + x
                    field.mul_region_xor(coef.theta, known, &mut stored)?;
                }

                let sibling = layer ^ stride;
                let at = layout.block_offset(stripe, layer) as usize;
                out[at..at + bs].copy_from_slice(arena.cell(layer, lost));
                let at = layout.block_offset(stripe, sibling) as usize;
                out[at..at + bs].copy_from_slice(&stored);
            }
            *coding_time += t.elapsed();
            debug!(stripe, fragment = lost, planes = planes.len(), "repaired stripe from planes");
            self.progress_advance();
        }
        Ok(out)
    }

    fn repair_full<S: FragmentSource + ?Sized>(
        &self,
        layout: &StripeLayout,
        source: &S,
        lost: usize,
        coding_time: &mut Duration,
    ) -> Result<Vec<u8>, CodecError> {
        let presence: Vec<bool> = (0..layout.n())
            .map(|i| i != lost && source.is_present(i))
            .collect();
        let mut erasures = mark_erasures(&presence, layout.m)?;
        let mut out = vec![0u8; layout.fragment_len() as usize];
        let mut scratch = vec![0u8; layout.blocksize];
        let segment = layout.segment_len();
        self.progress_start(layout.readins);

        for stripe in 0..layout.readins {
            let mut arena = assemble_layers(source, layout, stripe, &mut erasures)?;
            let t = Instant::now();
            decode_all_layers(&mut arena, self.schedule(), self.coder(), &erasures)?;
            forward(&mut arena, self.schedule(), &mut scratch)?;
            *coding_time += t.elapsed();
            arena.column_into(lost, &mut out[stripe * segment..(stripe + 1) * segment]);
            debug!(stripe, fragment = lost, "repaired stripe by full decode");
            self.progress_advance();
        }
        Ok(out)
    }
}
