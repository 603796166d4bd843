// src/pipes/force_kernel.rs

use crate::particles::PredictedParticle;

/// Query point evaluated by one pipe: position, velocity, the caller's
/// global index (for self-interaction exclusion), and the squared neighbour
/// radius for this particle.
#[derive(Debug, Clone, Copy)]
pub struct IParticle {
    pub index: i32,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub h2: f64,
}

/// Everything one pipe produces from a sweep over the predicted j-set.
#[derive(Debug, Clone)]
pub struct PipeResult {
    pub acc: [f64; 3],
    pub jerk: [f64; 3],
    pub potential: f64,
    /// Global index of the j-particle minimizing the softened r², self
    /// excluded; `None` when the j-set contained no other particle.
    pub nearest: Option<i32>,
    /// Global indices of j-particles with unsoftened r² below `h2`, in
    /// store-address order.
    pub neighbours: Vec<i32>,
}

/// Sums the pairwise softened-gravity interaction of one i-particle against
/// the full predicted j-set.
///
/// Per pair: `r = x_j − x_i`, `r² = |r|² + eps2`, `invr = 1/√r²`, then
///
/// ```text
/// acc  += m_j · r · invr³
/// jerk += m_j · (v · invr³ − 3(r·v) · r · invr³ · invr²)    with v = v_j − v_i
/// pot  −= m_j · invr
/// ```
///
/// The acceleration points from the i-particle toward each source
/// (attractive sign convention). A j-particle whose global index equals the
/// i-particle's contributes nothing at all: no force, no potential, no
/// neighbour entry, no nearest-neighbour candidacy. Softening keeps the
/// kernel finite at small separations; with `eps2 = 0` a coincident non-self
/// pair produces infinities, which mirrors the hardware and is the caller's
/// responsibility to avoid.
pub fn evaluate_pipe(ip: &IParticle, sources: &[PredictedParticle], eps2: f64) -> PipeResult {
    let mut acc = [0.0f64; 3];
    let mut jerk = [0.0f64; 3];
    let mut potential = 0.0f64;
    let mut nearest: Option<(i32, f64)> = None;
    let mut neighbours = Vec::new();

    for jp in sources {
        if jp.index == ip.index {
            continue;
        }

        let r = [
            jp.position[0] - ip.position[0],
            jp.position[1] - ip.position[1],
            jp.position[2] - ip.position[2],
        ];
        let v = [
            jp.velocity[0] - ip.velocity[0],
            jp.velocity[1] - ip.velocity[1],
            jp.velocity[2] - ip.velocity[2],
        ];

        let r2 = r[0] * r[0] + r[1] * r[1] + r[2] * r[2] + eps2;
        let invr = 1.0 / r2.sqrt();
        let invr2 = invr * invr;
        let invr3 = invr2 * invr;
        let rv = r[0] * v[0] + r[1] * v[1] + r[2] * v[2];

        for k in 0..3 {
            acc[k] += jp.mass * r[k] * invr3;
            jerk[k] += jp.mass * (v[k] * invr3 - 3.0 * rv * r[k] * invr3 * invr2);
        }
        potential -= jp.mass * invr;

        if r2 - eps2 < ip.h2 {
            neighbours.push(jp.index);
        }
        match nearest {
            Some((_, best)) if r2 >= best => {}
            _ => nearest = Some((jp.index, r2)),
        }
    }

    PipeResult {
        acc,
        jerk,
        potential,
        nearest: nearest.map(|(index, _)| index),
        neighbours,
    }
}
