// demos/two_body.rs
//
// Drives the emulated device through a few Hermite predictor steps of a
// circular two-body orbit, the way a client integrator would: load the
// j-particles, advance the device time, run both halves of the evaluation,
// and feed the returned acceleration and jerk back into the particle state.

use g6_emu::devices::{Device, PipeForce};
use g6_emu::particles::JParticle;
use g6_emu::pipes::IParticle;
use g6_emu::utils::DeviceConfig;

fn j_particle(index: i32, tj: f64, mass: f64, position: [f64; 3], velocity: [f64; 3]) -> JParticle {
    JParticle {
        index,
        tj,
        dtj: 0.0,
        mass,
        k18: [0.0; 3],
        j6: [0.0; 3],
        a2: [0.0; 3],
        velocity,
        position,
    }
}

fn evaluate(dev: &mut Device, t: f64, bodies: &[JParticle]) -> Vec<PipeForce> {
    dev.set_ti(t);
    let probes: Vec<IParticle> = bodies
        .iter()
        .map(|b| IParticle {
            index: b.index,
            position: b.position,
            velocity: b.velocity,
            h2: 0.0,
        })
        .collect();
    dev.calc_firsthalf(bodies.len(), probes, 0.0);
    dev.calc_lasthalf(bodies.len(), bodies.len())
        .expect("Force evaluation failed")
}

fn main() {
    env_logger::init();

    let mut dev = Device::new(DeviceConfig::default());

    // Equal unit masses on a circular orbit of separation 2: each body
    // orbits the barycentre at radius 1 with v² = m/(2·d) = 0.25.
    let v = 0.25f64.sqrt();
    let mut bodies = vec![
        j_particle(0, 0.0, 1.0, [1.0, 0.0, 0.0], [0.0, v, 0.0]),
        j_particle(1, 0.0, 1.0, [-1.0, 0.0, 0.0], [0.0, -v, 0.0]),
    ];

    let dt = 1.0 / 256.0;
    let mut t = 0.0;
    for step in 0..=1024 {
        for body in &bodies {
            dev.set_j_particle(body.index, *body).expect("Failed to load j-particle");
        }
        let forces = evaluate(&mut dev, t, &bodies);

        if step % 256 == 0 {
            let r = ((bodies[0].position[0] - bodies[1].position[0]).powi(2)
                + (bodies[0].position[1] - bodies[1].position[1]).powi(2))
            .sqrt();
            println!(
                "t = {:6.3}  separation = {:.6}  pot(0) = {:+.6}  |acc(0)| = {:.6}",
                t,
                r,
                forces[0].potential,
                (forces[0].acc[0].powi(2) + forces[0].acc[1].powi(2)).sqrt()
            );
        }

        // Simple predictor step from the returned acceleration and jerk.
        for (body, force) in bodies.iter_mut().zip(&forces) {
            for k in 0..3 {
                body.position[k] += body.velocity[k] * dt
                    + 0.5 * force.acc[k] * dt * dt
                    + force.jerk[k] * dt * dt * dt / 6.0;
                body.velocity[k] += force.acc[k] * dt + 0.5 * force.jerk[k] * dt * dt;
            }
            body.tj = t + dt;
        }
        t += dt;
    }
}
