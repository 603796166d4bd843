use log::debug;

use crate::particles::{JParticle, PredictedParticle};
use crate::utils::G6Error;

/// Fixed-capacity j-particle memory of one emulated device.
///
/// Slots are keyed by a caller-assigned address. Setting an occupied address
/// replaces the particle in place; individual deletion does not exist, only
/// [`ParticleStore::reset`], which the device applies on open/close.
///
/// Callers fill addresses contiguously from zero (the GRAPE-6 convention),
/// so the populated length is tracked as highest set address + 1. A gap
/// inside an evaluated range is a caller error and surfaces during
/// prediction.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    slots: Vec<Option<JParticle>>,
    populated: usize,
}

impl ParticleStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            populated: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Highest set address + 1, the number of j-particles an evaluation may
    /// legally request.
    pub fn populated(&self) -> usize {
        self.populated
    }

    /// Stores or replaces the j-particle at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`G6Error::InvalidAddress`] if `address` is negative or beyond
    /// the allocated capacity. The store is left unchanged on error.
    pub fn set(&mut self, address: i32, particle: JParticle) -> Result<(), G6Error> {
        let slot = usize::try_from(address)
            .ok()
            .filter(|a| *a < self.slots.len())
            .ok_or(G6Error::InvalidAddress { address, capacity: self.slots.len() })?;

        self.slots[slot] = Some(particle);
        if slot + 1 > self.populated {
            self.populated = slot + 1;
        }
        Ok(())
    }

    pub fn get(&self, address: usize) -> Option<&JParticle> {
        self.slots.get(address).and_then(|s| s.as_ref())
    }

    /// Predicts the first `nj` particles to `t_eval`, in address order.
    ///
    /// # Errors
    ///
    /// Returns [`G6Error::OutOfRange`] if `nj` exceeds the populated length,
    /// or [`G6Error::CalculationError`] if an address below `nj` was never
    /// set.
    pub fn predict_range(&self, nj: usize, t_eval: f64) -> Result<Vec<PredictedParticle>, G6Error> {
        if nj > self.populated {
            return Err(G6Error::OutOfRange { requested: nj, populated: self.populated });
        }
        debug!("predicting {} j-particles to t = {}", nj, t_eval);
        self.slots[..nj]
            .iter()
            .enumerate()
            .map(|(addr, slot)| {
                slot.as_ref()
                    .map(|jp| jp.predict(t_eval))
                    .ok_or_else(|| {
                        G6Error::CalculationError(format!("unset j-particle at address {}", addr))
                    })
            })
            .collect()
    }

    /// Clears every slot. Only a full device reset reaches this; there is no
    /// per-particle removal.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.populated = 0;
    }
}
