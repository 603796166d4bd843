/// A j-particle: one gravitational source loaded into device memory.
///
/// Field naming follows the GRAPE-6 host convention, where the derivative
/// stack arrives pre-scaled by the integrator:
/// - `a2` is acceleration over 2,
/// - `j6` is jerk (da/dt) over 6,
/// - `k18` is snap (d²a/dt²) over 18.
///
/// `position` and `velocity` are the particle state at the reference time
/// `tj`; `dtj` is the validity interval the caller's block-timestep scheme
/// assigned to the particle. The store never mutates a particle after it is
/// set; prediction reads it and produces a separate [`PredictedParticle`].
#[derive(Debug, Clone, Copy)]
pub struct JParticle {
    /// Caller-assigned global index, used for self-interaction exclusion
    /// and reported in neighbour lists.
    pub index: i32,
    pub tj: f64,
    pub dtj: f64,
    pub mass: f64,
    pub k18: [f64; 3],
    pub j6: [f64; 3],
    pub a2: [f64; 3],
    pub velocity: [f64; 3],
    pub position: [f64; 3],
}

/// State of a j-particle extrapolated to an evaluation time.
///
/// This is the only representation the force pipelines ever see.
#[derive(Debug, Clone, Copy)]
pub struct PredictedParticle {
    pub index: i32,
    pub mass: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl JParticle {
    /// Extrapolates the particle to `t_eval` with the GRAPE-6 predictor.
    ///
    /// With `dt = t_eval - tj` and the stored scalings (`a2 = a/2`,
    /// `j6 = da/dt / 6`, `k18 = d²a/dt² / 18`):
    ///
    /// ```text
    /// x_pred = x + v·dt + a2·dt² + j6·dt³ + (3/4)·k18·dt⁴
    /// v_pred = v + 2·a2·dt + 3·j6·dt² + 3·k18·dt³
    /// ```
    ///
    /// which is the Taylor series of position through the dt⁴/4! term and of
    /// velocity through dt³/3!. Terms are summed lowest order first; the
    /// ordering is part of the contract because host Hermite integrators
    /// correct against exactly this polynomial. `dt = 0` reproduces the
    /// stored state bit-for-bit.
    ///
    /// # Example
    ///
    /// ```
    /// use g6_emu::particles::JParticle;
    ///
    /// let jp = JParticle {
    ///     index: 0,
    ///     tj: 2.0,
    ///     dtj: 0.125,
    ///     mass: 1.0,
    ///     k18: [0.0; 3],
    ///     j6: [0.0; 3],
    ///     a2: [0.0; 3],
    ///     velocity: [1.0, 0.0, 0.0],
    ///     position: [0.0, 0.0, 0.0],
    /// };
    /// let pred = jp.predict(2.5);
    /// assert_eq!(pred.position, [0.5, 0.0, 0.0]);
    /// assert_eq!(pred.velocity, [1.0, 0.0, 0.0]);
    /// ```
    pub fn predict(&self, t_eval: f64) -> PredictedParticle {
        let dt = t_eval - self.tj;
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        let mut position = [0.0; 3];
        let mut velocity = [0.0; 3];
        for k in 0..3 {
            position[k] = self.position[k]
                + self.velocity[k] * dt
                + self.a2[k] * dt2
                + self.j6[k] * dt3
                + 0.75 * self.k18[k] * dt4;
            velocity[k] = self.velocity[k]
                + 2.0 * self.a2[k] * dt
                + 3.0 * self.j6[k] * dt2
                + 3.0 * self.k18[k] * dt3;
        }

        PredictedParticle {
            index: self.index,
            mass: self.mass,
            position,
            velocity,
        }
    }
}
