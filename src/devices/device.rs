// src/devices/device.rs

use crate::devices::Capabilities;
use crate::particles::{JParticle, ParticleStore, PredictedParticle};
use crate::pipes::{IParticle, PipeArray, PipeResult};
use crate::utils::{DeviceConfig, G6Error};

/// Force, jerk and potential sums for one pipe, as handed back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct PipeForce {
    pub acc: [f64; 3],
    pub jerk: [f64; 3],
    pub potential: f64,
}

/// One emulated GRAPE-6 device: a j-particle store, an array of force
/// pipelines, and the neighbour state of the last evaluation.
///
/// A device is driven through the two-phase protocol: load j-particles, set
/// the device time, stage a batch with [`Device::calc_firsthalf`], then
/// collect results with [`Device::calc_lasthalf`] or
/// [`Device::calc_lasthalf2`]. The store is read-only while a batch is in
/// flight as far as the evaluation is concerned: prediction happens entirely
/// in the first half, so a `set_j_particle` between the two halves does not
/// affect the staged batch.
///
/// # Example
///
/// ```
/// use g6_emu::devices::Device;
/// use g6_emu::particles::JParticle;
/// use g6_emu::pipes::IParticle;
/// use g6_emu::utils::DeviceConfig;
///
/// let mut dev = Device::new(DeviceConfig::default());
/// dev.set_j_particle(0, JParticle {
///     index: 0,
///     tj: 0.0,
///     dtj: 0.125,
///     mass: 1.0,
///     k18: [0.0; 3],
///     j6: [0.0; 3],
///     a2: [0.0; 3],
///     velocity: [0.0; 3],
///     position: [0.0; 3],
/// }).expect("Failed to load j-particle");
///
/// dev.set_ti(0.0);
/// dev.calc_firsthalf(1, vec![IParticle {
///     index: 1,
///     position: [2.0, 0.0, 0.0],
///     velocity: [0.0; 3],
///     h2: 0.0,
/// }], 0.0);
/// let forces = dev.calc_lasthalf(1, 1).expect("Evaluation failed");
/// assert!((forces[0].acc[0] + 0.25).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Device {
    config: DeviceConfig,
    store: ParticleStore,
    pipes: PipeArray,
    ti: f64,
    predicted: Vec<PredictedParticle>,
    capabilities: Capabilities,
}

impl Device {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            store: ParticleStore::new(config.store_capacity),
            pipes: PipeArray::new(config.pipe_count),
            ti: 0.0,
            predicted: Vec::new(),
            capabilities: Capabilities::default(),
        }
    }

    pub fn config(&self) -> DeviceConfig {
        self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Sets the device-wide reference time that the next first-half call
    /// predicts to.
    pub fn set_ti(&mut self, ti: f64) {
        self.ti = ti;
    }

    pub fn ti(&self) -> f64 {
        self.ti
    }

    /// Stores or replaces the j-particle at `address`.
    pub fn set_j_particle(&mut self, address: i32, particle: JParticle) -> Result<(), G6Error> {
        self.store.set(address, particle)
    }

    /// Phase 1: predict the first `nj` j-particles to the device time and
    /// stage the i-particle batch.
    ///
    /// This call never fails directly; the hardware ABI declares it void.
    /// Validation and prediction errors are recorded on the batch and
    /// surfaced by the matching [`Device::calc_lasthalf`] call.
    pub fn calc_firsthalf(&mut self, nj: usize, i_particles: Vec<IParticle>, eps2: f64) {
        let deferred = match self.store.predict_range(nj, self.ti) {
            Ok(predicted) => {
                self.predicted = predicted;
                None
            }
            Err(err) => Some(err),
        };
        self.pipes.begin(nj, i_particles, eps2, deferred);
    }

    /// Phase 2: run every staged pipe against the predicted j-set.
    ///
    /// `nj` and `ni` must repeat the sizes of the matching first-half call.
    /// Results overwrite the full output for pipes `0..ni`; nothing is
    /// accumulated into caller state.
    ///
    /// # Errors
    ///
    /// [`G6Error::StaleCallOrder`] without a staged batch or on a size
    /// mismatch, plus any error the first half deferred (pipe capacity,
    /// j-range, unset address).
    pub fn calc_lasthalf(&mut self, nj: usize, ni: usize) -> Result<Vec<PipeForce>, G6Error> {
        let results = self.run_lasthalf(nj, ni)?;
        Ok(results.iter().map(Self::force_of).collect())
    }

    /// Phase 2, nearest-neighbour variant: as [`Device::calc_lasthalf`], and
    /// per pipe the global index of the j-particle minimizing the softened
    /// distance (self excluded), or -1 when the j-set held no other particle.
    pub fn calc_lasthalf2(&mut self, nj: usize, ni: usize) -> Result<Vec<(PipeForce, i32)>, G6Error> {
        let results = self.run_lasthalf(nj, ni)?;
        Ok(results
            .iter()
            .map(|r| (Self::force_of(r), r.nearest.unwrap_or(-1)))
            .collect())
    }

    /// Stages a batch that already failed validation before reaching the
    /// engine (the ABI layer uses this for malformed sizes, since the
    /// first-half call cannot return a status).
    pub fn stage_invalid(&mut self, err: G6Error) {
        self.pipes.begin(0, Vec::new(), 0.0, Some(err));
    }

    fn run_lasthalf(&mut self, nj: usize, ni: usize) -> Result<Vec<PipeResult>, G6Error> {
        self.pipes.finish(nj, ni, &self.predicted)
    }

    fn force_of(result: &PipeResult) -> PipeForce {
        PipeForce {
            acc: result.acc,
            jerk: result.jerk,
            potential: result.potential,
        }
    }

    /// Confirms that a completed evaluation left neighbour lists to retrieve.
    ///
    /// # Errors
    ///
    /// [`G6Error::StaleCallOrder`] if no phase-2 call has completed on this
    /// device yet.
    pub fn read_neighbour_list(&self) -> Result<(), G6Error> {
        if self.pipes.neighbour_table().is_some() {
            Ok(())
        } else {
            Err(G6Error::StaleCallOrder)
        }
    }

    /// Retrieves up to `maxlength` neighbour indices for pipe `ipipe` of the
    /// last completed evaluation, together with the list's true length.
    pub fn get_neighbour_list(
        &self,
        ipipe: usize,
        maxlength: usize,
    ) -> Result<(&[i32], usize), G6Error> {
        self.pipes
            .neighbour_table()
            .ok_or(G6Error::StaleCallOrder)?
            .retrieve(ipipe, maxlength)
    }

    /// Raw stored fields plus the last predicted state for one address.
    /// Debug introspection only; performs no computation.
    pub fn j_part_data(&self, address: usize) -> Option<(&JParticle, Option<&PredictedParticle>)> {
        let stored = self.store.get(address)?;
        Some((stored, self.predicted.get(address)))
    }

    /// Full device reset: clears the store, any staged batch, neighbour
    /// lists and the prediction cache. Reached through open/close, never
    /// through the legacy `reset` stubs.
    pub fn reset(&mut self) {
        self.store.reset();
        self.pipes.reset();
        self.predicted.clear();
        self.ti = 0.0;
    }
}
