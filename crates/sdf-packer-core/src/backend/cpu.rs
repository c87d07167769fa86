use super::{Generation, SdfBackend};
use crate::config::BackendKind;
use crate::error::SdfPackerError;
use crate::region::WorkingRegion;
use crate::sdf::{self, DistanceField, EdgeMap, SolidityMask};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Data-parallel CPU backend.
///
/// Each pass is one sweep over a flat pixel index where every pixel writes only its own slot of
/// the output buffer and reads only the previous buffer. A sweep returns after all of its writes
/// have landed, which is the barrier between passes. Output is identical with and without
/// parallelism.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    parallel: bool,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    /// Parallel when the `parallel` feature is enabled.
    pub fn new() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Runs every pass on the calling thread.
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    fn fill<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                out.par_iter_mut()
                    .enumerate()
                    .for_each(|(i, slot)| *slot = f(i));
                return;
            }
        }
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = f(i);
        }
    }

    pub fn edge_map(&self, mask: &SolidityMask) -> EdgeMap {
        let mut seeds = vec![None; mask.len()];
        self.fill(&mut seeds, |i| {
            let (x, y) = mask.coords(i);
            sdf::edge_at(mask, x, y)
        });
        EdgeMap {
            width: mask.width,
            height: mask.height,
            seeds,
        }
    }

    /// Runs one jump pass per offset, swapping the two buffers after each.
    pub fn propagate(&self, edges: EdgeMap, offsets: &[u32]) -> EdgeMap {
        let EdgeMap {
            width,
            height,
            seeds,
        } = edges;
        let mut front = seeds;
        let mut back = vec![None; front.len()];
        for &offset in offsets {
            let prev = &front;
            self.fill(&mut back, |i| {
                let x = (i % width as usize) as u32;
                let y = (i / width as usize) as u32;
                sdf::jump_at(prev, width, height, x, y, offset)
            });
            std::mem::swap(&mut front, &mut back);
        }
        EdgeMap {
            width,
            height,
            seeds: front,
        }
    }

    pub fn finalize(
        &self,
        mask: &SolidityMask,
        seeds: &EdgeMap,
        gradient_px: f32,
    ) -> DistanceField {
        let mut values = vec![0.0f32; mask.len()];
        self.fill(&mut values, |i| {
            let (x, y) = mask.coords(i);
            sdf::distance_value(mask.is_solid(x, y), x, y, seeds.seeds[i], gradient_px)
        });
        DistanceField {
            width: mask.width,
            height: mask.height,
            values,
        }
    }

    /// Full pipeline on a solidity mask.
    pub fn distance_field(&self, mask: &SolidityMask, gradient_px: f32) -> DistanceField {
        let offsets = sdf::jump_offsets(mask.width, mask.height);
        let edges = self.edge_map(mask);
        debug!(seeds = edges.seeded(), passes = offsets.len(), "edges detected");
        let seeds = self.propagate(edges, &offsets);
        self.finalize(mask, &seeds, gradient_px)
    }
}

impl SdfBackend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    #[instrument(skip_all, fields(width = region.width(), height = region.height()))]
    fn generate(&self, region: &WorkingRegion, gradient_px: f32) -> Generation<DistanceField> {
        if !gradient_px.is_finite() || gradient_px <= 0.0 {
            return Generation::Failed(SdfPackerError::InvalidInput(format!(
                "gradient must be a positive number of pixels (got {gradient_px})"
            )));
        }
        let mask = SolidityMask::from_rgba(&region.image);
        Generation::Ready(self.distance_field(&mask, gradient_px))
    }
}
