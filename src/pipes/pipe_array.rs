// src/pipes/pipe_array.rs

use log::warn;
use rayon::prelude::*;

use crate::particles::PredictedParticle;
use crate::pipes::{evaluate_pipe, IParticle, NeighbourTable, PipeResult};
use crate::utils::G6Error;

/// One dispatched phase-1 batch awaiting its phase-2 call.
///
/// The hardware ABI's first-half call returns void, so a batch that failed
/// validation carries the error here and surfaces it when the matching
/// second-half call arrives.
#[derive(Debug, Clone)]
struct EvalBatch {
    nj: usize,
    eps2: f64,
    i_particles: Vec<IParticle>,
    deferred: Option<G6Error>,
}

/// The device's array of parallel force pipelines and its two-phase call
/// state.
///
/// Phase 1 ([`PipeArray::begin`]) captures a batch; phase 2
/// ([`PipeArray::finish`]) consumes it and runs every pipe's interaction sum.
/// Pipes within a batch are independent, so the sweep runs them in parallel.
/// Interleaving two batches on one device is rejected by construction: a
/// second `begin` before `finish` replaces the in-flight batch, and `finish`
/// without a batch is a stale-call-order error.
#[derive(Debug)]
pub struct PipeArray {
    pipe_count: usize,
    in_flight: Option<EvalBatch>,
    neighbours: Option<NeighbourTable>,
}

impl PipeArray {
    pub fn new(pipe_count: usize) -> Self {
        Self {
            pipe_count,
            in_flight: None,
            neighbours: None,
        }
    }

    pub fn pipe_count(&self) -> usize {
        self.pipe_count
    }

    /// Phase 1: stage a batch of i-particles against `nj` sources.
    ///
    /// `deferred` carries a validation or prediction failure detected by the
    /// device; it is logged here (the ABI cannot return it from this phase)
    /// and raised by the matching [`PipeArray::finish`].
    pub fn begin(
        &mut self,
        nj: usize,
        i_particles: Vec<IParticle>,
        eps2: f64,
        deferred: Option<G6Error>,
    ) {
        let deferred = deferred.or_else(|| {
            if i_particles.len() > self.pipe_count {
                Some(G6Error::CapacityExceeded {
                    requested: i_particles.len(),
                    pipes: self.pipe_count,
                })
            } else {
                None
            }
        });
        if let Some(err) = &deferred {
            warn!("first-half call staged a failing batch: {}", err);
        }
        if self.in_flight.is_some() {
            warn!("first-half call replaced an unconsumed batch");
        }
        self.in_flight = Some(EvalBatch { nj, eps2, i_particles, deferred });
    }

    /// Phase 2: consume the in-flight batch and sum every pipe's interaction
    /// against the predicted sources.
    ///
    /// `sources` must be the prediction produced for this batch; `nj` and
    /// `ni` are the caller's repeated sizes and must match the staged batch.
    /// On success the per-pipe neighbour lists replace the device's table.
    ///
    /// # Errors
    ///
    /// - [`G6Error::StaleCallOrder`] if no batch is staged or the sizes do
    ///   not match the staged batch.
    /// - Any error deferred from phase 1 (capacity, j-range, prediction).
    ///
    /// The neighbour table of a previously completed evaluation is kept
    /// intact on error.
    pub fn finish(
        &mut self,
        nj: usize,
        ni: usize,
        sources: &[PredictedParticle],
    ) -> Result<Vec<PipeResult>, G6Error> {
        let batch = self.in_flight.take().ok_or(G6Error::StaleCallOrder)?;
        if let Some(err) = batch.deferred {
            return Err(err);
        }
        if nj != batch.nj || ni != batch.i_particles.len() {
            return Err(G6Error::StaleCallOrder);
        }
        if sources.len() != batch.nj {
            return Err(G6Error::CalculationError(format!(
                "prediction covers {} j-particles, batch expects {}",
                sources.len(),
                batch.nj
            )));
        }

        let eps2 = batch.eps2;
        let results: Vec<PipeResult> = batch
            .i_particles
            .par_iter()
            .map(|ip| evaluate_pipe(ip, sources, eps2))
            .collect();

        self.neighbours = Some(NeighbourTable::new(
            results.iter().map(|r| r.neighbours.clone()).collect(),
        ));
        Ok(results)
    }

    /// Neighbour lists of the last completed evaluation, if any.
    pub fn neighbour_table(&self) -> Option<&NeighbourTable> {
        self.neighbours.as_ref()
    }

    pub fn reset(&mut self) {
        self.in_flight = None;
        self.neighbours = None;
    }
}
