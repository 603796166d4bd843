//! The exported GRAPE-6 ABI.
//!
//! Client N-body integrators link against these symbols exactly as they
//! would against the hardware library: the Fortran spellings (`g6_open_`,
//! trailing underscore, every scalar passed by pointer) and the C spellings
//! (`g6_open`, scalars by value) are both exported from the cdylib. All
//! entry points are backed by one process-wide [`DeviceRegistry`] behind a
//! mutex; per-handle state is fully independent, the lock only serializes
//! access to the registry map.
//!
//! Status values follow the hardware convention: 0 success, negative fatal
//! (see [`G6Error::status_code`]), positive non-fatal saturation.
//!
//! # Safety
//!
//! Every function here trusts the caller's pointers the way the hardware
//! library did: scalar pointers must be valid reads, array pointers must
//! cover the lengths implied by `ni`/`nj`/`maxlength`, and output arrays
//! must be writable for `ni` entries. None of the pointers are retained
//! beyond the call.

use std::os::raw::{c_double, c_int};
use std::sync::{Mutex, MutexGuard, OnceLock};

use log::{error, warn};

use crate::devices::{DeviceRegistry, PipeForce};
use crate::particles::JParticle;
use crate::pipes::IParticle;
use crate::utils::{G6Error, STATUS_OK};

static REGISTRY: OnceLock<Mutex<DeviceRegistry>> = OnceLock::new();

/// The process-wide registry every exported symbol operates on.
fn registry() -> MutexGuard<'static, DeviceRegistry> {
    REGISTRY
        .get_or_init(|| Mutex::new(DeviceRegistry::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Degrades a result into an ABI status, logging the failure at the
/// boundary before it crosses into caller code that may discard it.
fn status(op: &str, result: Result<(), G6Error>) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(err) => {
            error!("{}: {}", op, err);
            err.status_code()
        }
    }
}

fn checked_size(value: c_int, what: &str) -> Result<usize, G6Error> {
    usize::try_from(value)
        .map_err(|_| G6Error::CalculationError(format!("negative {}: {}", what, value)))
}

unsafe fn read_vec3(p: *const c_double) -> [f64; 3] {
    [*p, *p.add(1), *p.add(2)]
}

/// Gathers one i-particle batch from the caller's parallel arrays.
unsafe fn read_batch(
    ni: usize,
    index: *const c_int,
    xi: *const [c_double; 3],
    vi: *const [c_double; 3],
    h2: *const c_double,
) -> Vec<IParticle> {
    let mut batch = Vec::with_capacity(ni);
    for k in 0..ni {
        batch.push(IParticle {
            index: *index.add(k),
            position: *xi.add(k),
            velocity: *vi.add(k),
            h2: *h2.add(k),
        });
    }
    batch
}

unsafe fn write_forces(
    forces: &[PipeForce],
    acc: *mut [c_double; 3],
    jerk: *mut [c_double; 3],
    pot: *mut c_double,
) {
    for (k, f) in forces.iter().enumerate() {
        *acc.add(k) = f.acc;
        *jerk.add(k) = f.jerk;
        *pot.add(k) = f.potential;
    }
}

unsafe fn write_vec3(dst: *mut c_double, src: &[f64; 3]) {
    *dst = src[0];
    *dst.add(1) = src[1];
    *dst.add(2) = src[2];
}

// ---------------------------------------------------------------------------
// Fortran ABI
// ---------------------------------------------------------------------------

/// Opens device `*id`. Re-opening an open handle resets it.
#[no_mangle]
pub unsafe extern "C" fn g6_open_(id: *const c_int) -> c_int {
    registry().open(*id);
    STATUS_OK
}

/// Closes device `*id`, releasing all of its state.
#[no_mangle]
pub unsafe extern "C" fn g6_close_(id: *const c_int) -> c_int {
    let result = registry().close(*id);
    status("g6_close_", result)
}

/// The fixed pipe count per device. A hardware-model constant.
#[no_mangle]
pub unsafe extern "C" fn g6_npipes_() -> c_int {
    registry().npipes() as c_int
}

/// Records the caller's time-unit scale. Stored process-wide, never
/// interpreted by the engine.
#[no_mangle]
pub unsafe extern "C" fn g6_set_tunit_(tunit: *const c_double) -> c_int {
    registry().set_tunit(*tunit);
    STATUS_OK
}

/// Records the caller's length-unit scale. Stored process-wide, never
/// interpreted by the engine.
#[no_mangle]
pub unsafe extern "C" fn g6_set_xunit_(xunit: *const c_double) -> c_int {
    registry().set_xunit(*xunit);
    STATUS_OK
}

/// Sets the device-wide time the next first-half call predicts to.
#[no_mangle]
pub unsafe extern "C" fn g6_set_ti_(id: *const c_int, ti: *const c_double) -> c_int {
    let ti = *ti;
    let result = registry().device_mut(*id).map(|dev| dev.set_ti(ti));
    status("g6_set_ti_", result)
}

/// Loads or replaces one j-particle.
///
/// The coefficient arrays follow the GRAPE-6 host convention: `k18` is
/// snap/18, `j6` is jerk/6, `a2` is acceleration/2, each three doubles.
///
/// # Safety
///
/// `k18`, `j6`, `a2`, `v` and `x` must each be valid for three reads.
#[no_mangle]
pub unsafe extern "C" fn g6_set_j_particle_(
    cluster_id: *const c_int,
    address: *const c_int,
    index: *const c_int,
    tj: *const c_double,
    dtj: *const c_double,
    mass: *const c_double,
    k18: *const c_double,
    j6: *const c_double,
    a2: *const c_double,
    v: *const c_double,
    x: *const c_double,
) -> c_int {
    let particle = JParticle {
        index: *index,
        tj: *tj,
        dtj: *dtj,
        mass: *mass,
        k18: read_vec3(k18),
        j6: read_vec3(j6),
        a2: read_vec3(a2),
        velocity: read_vec3(v),
        position: read_vec3(x),
    };
    let address = *address;
    let result = registry()
        .device_mut(*cluster_id)
        .and_then(|dev| dev.set_j_particle(address, particle));
    status("g6_set_j_particle_", result)
}

/// Phase 1 of an evaluation: predicts the first `*nj` j-particles to the
/// device time and stages the `*ni` i-particles.
///
/// The hardware ABI declares this void, so failures (bad handle aside,
/// which is only logged) are recorded on the staged batch and surface from
/// the matching `g6calc_lasthalf_`/`g6calc_lasthalf2_` call. `aold`,
/// `j6old` and `phiold` fed the hardware's fixed-point error correction and
/// are accepted and ignored; the emulation computes in f64 throughout.
///
/// # Safety
///
/// `index`, `xi`, `vi` and `h2` must cover `*ni` entries.
#[no_mangle]
pub unsafe extern "C" fn g6calc_firsthalf_(
    cluster_id: *const c_int,
    nj: *const c_int,
    ni: *const c_int,
    index: *const c_int,
    xi: *const [c_double; 3],
    vi: *const [c_double; 3],
    _aold: *const [c_double; 3],
    _j6old: *const [c_double; 3],
    _phiold: *const c_double,
    eps2: *const c_double,
    h2: *const c_double,
) {
    let mut registry = registry();
    let dev = match registry.device_mut(*cluster_id) {
        Ok(dev) => dev,
        Err(err) => {
            error!("g6calc_firsthalf_: {}", err);
            return;
        }
    };
    match (checked_size(*nj, "nj"), checked_size(*ni, "ni")) {
        (Ok(nj), Ok(ni)) => {
            let batch = read_batch(ni, index, xi, vi, h2);
            dev.calc_firsthalf(nj, batch, *eps2);
        }
        (Err(err), _) | (_, Err(err)) => dev.stage_invalid(err),
    }
}

/// Phase 2 of an evaluation: sums every pipe and writes acceleration, jerk
/// and potential for pipes `0..*ni`.
///
/// On a non-zero status the output arrays are left untouched. The repeated
/// `index`/`xi`/`vi`/`eps2`/`h2` arguments of the hardware ABI are accepted
/// and ignored; the staged phase-1 batch is authoritative.
///
/// # Safety
///
/// `acc`, `jerk` and `pot` must be writable for `*ni` entries.
#[no_mangle]
pub unsafe extern "C" fn g6calc_lasthalf_(
    cluster_id: *const c_int,
    nj: *const c_int,
    ni: *const c_int,
    _index: *const c_int,
    _xi: *const [c_double; 3],
    _vi: *const [c_double; 3],
    _eps2: *const c_double,
    _h2: *const c_double,
    acc: *mut [c_double; 3],
    jerk: *mut [c_double; 3],
    pot: *mut c_double,
) -> c_int {
    let result = match (checked_size(*nj, "nj"), checked_size(*ni, "ni")) {
        (Ok(nj), Ok(ni)) => registry()
            .device_mut(*cluster_id)
            .and_then(|dev| dev.calc_lasthalf(nj, ni)),
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    match result {
        Ok(forces) => {
            write_forces(&forces, acc, jerk, pot);
            STATUS_OK
        }
        Err(err) => {
            error!("g6calc_lasthalf_: {}", err);
            err.status_code()
        }
    }
}

/// Phase 2, nearest-neighbour variant: as `g6calc_lasthalf_`, and writes
/// per pipe the global index of the nearest j-particle (self excluded, -1
/// when the j-set held no other particle) into `inn`.
///
/// # Safety
///
/// `acc`, `jerk`, `pot` and `inn` must be writable for `*ni` entries.
#[no_mangle]
pub unsafe extern "C" fn g6calc_lasthalf2_(
    cluster_id: *const c_int,
    nj: *const c_int,
    ni: *const c_int,
    _index: *const c_int,
    _xi: *const [c_double; 3],
    _vi: *const [c_double; 3],
    _eps2: *const c_double,
    _h2: *const c_double,
    acc: *mut [c_double; 3],
    jerk: *mut [c_double; 3],
    pot: *mut c_double,
    inn: *mut c_int,
) -> c_int {
    let result = match (checked_size(*nj, "nj"), checked_size(*ni, "ni")) {
        (Ok(nj), Ok(ni)) => registry()
            .device_mut(*cluster_id)
            .and_then(|dev| dev.calc_lasthalf2(nj, ni)),
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    match result {
        Ok(results) => {
            for (k, (force, nearest)) in results.iter().enumerate() {
                *acc.add(k) = force.acc;
                *jerk.add(k) = force.jerk;
                *pot.add(k) = force.potential;
                *inn.add(k) = *nearest;
            }
            STATUS_OK
        }
        Err(err) => {
            error!("g6calc_lasthalf2_: {}", err);
            err.status_code()
        }
    }
}

/// Legacy j-particle buffer setup. The emulation has no on-board buffer
/// (see [`crate::devices::Capabilities`]); trivial success, per the
/// hardware header.
#[no_mangle]
pub unsafe extern "C" fn g6_initialize_jp_buffer_(
    _cluster_id: *const c_int,
    _buf_size: *const c_int,
) -> c_int {
    STATUS_OK
}

/// Legacy j-particle buffer flush. No buffer exists; trivial success.
#[no_mangle]
pub unsafe extern "C" fn g6_flush_jp_buffer_(_cluster_id: *const c_int) -> c_int {
    STATUS_OK
}

/// Legacy hardware reset. The emulated device resets through close/open;
/// this entry point keeps its no-op contract.
#[no_mangle]
pub unsafe extern "C" fn g6_reset_(_cluster_id: *const c_int) -> c_int {
    STATUS_OK
}

/// Legacy FPGA reset. No FPGA layer exists; trivial success.
#[no_mangle]
pub unsafe extern "C" fn g6_reset_fofpga_(_cluster_id: *const c_int) -> c_int {
    STATUS_OK
}

/// Confirms neighbour lists from a completed evaluation are retrievable.
#[no_mangle]
pub unsafe extern "C" fn g6_read_neighbour_list_(cluster_id: *const c_int) -> c_int {
    let result = registry()
        .device(*cluster_id)
        .and_then(|dev| dev.read_neighbour_list());
    status("g6_read_neighbour_list_", result)
}

/// Copies up to `*maxlength` neighbour indices of pipe `*ipipe` into
/// `neighbour_list` and stores the copied count in `*n_neighbours`.
///
/// A list longer than the caller's buffer is truncated and reported with
/// the positive list-overflow status; the copied prefix is valid data.
///
/// # Safety
///
/// `neighbour_list` must be writable for `*maxlength` entries and
/// `n_neighbours` for one.
#[no_mangle]
pub unsafe extern "C" fn g6_get_neighbour_list_(
    cluster_id: *const c_int,
    ipipe: *const c_int,
    maxlength: *const c_int,
    n_neighbours: *mut c_int,
    neighbour_list: *mut c_int,
) -> c_int {
    let registry = registry();
    let outcome = match (checked_size(*ipipe, "ipipe"), checked_size(*maxlength, "maxlength")) {
        (Ok(ipipe), Ok(maxlength)) => registry
            .device(*cluster_id)
            .and_then(|dev| dev.get_neighbour_list(ipipe, maxlength)),
        (Err(err), _) | (_, Err(err)) => Err(err),
    };
    match outcome {
        Ok((list, found)) => {
            for (k, idx) in list.iter().enumerate() {
                *neighbour_list.add(k) = *idx;
            }
            *n_neighbours = list.len() as c_int;
            if found > list.len() {
                let saturation = G6Error::ListOverflow { found, copied: list.len() };
                warn!("g6_get_neighbour_list_: {}", saturation);
                saturation.status_code()
            } else {
                STATUS_OK
            }
        }
        Err(err) => {
            error!("g6_get_neighbour_list_: {}", err);
            err.status_code()
        }
    }
}

/// Debug introspection of one j-particle slot on the lowest open device:
/// raw stored fields plus the last predicted state. `acc` and `jrk` receive
/// the stored coefficient stacks exactly as loaded (`a2`, `j6`); `eps2`
/// receives 0 since the emulation stores no per-particle softening. Not
/// part of the stable contract.
///
/// # Safety
///
/// `pos`, `vel`, `acc`, `jrk`, `ppos` and `pvel` must each be writable for
/// three doubles; `mass`, `eps2` and `id` for one value.
#[no_mangle]
pub unsafe extern "C" fn get_j_part_data(
    addr: c_int,
    _nj: c_int,
    pos: *mut c_double,
    vel: *mut c_double,
    acc: *mut c_double,
    jrk: *mut c_double,
    ppos: *mut c_double,
    pvel: *mut c_double,
    mass: *mut c_double,
    eps2: *mut c_double,
    id: *mut c_int,
) {
    let registry = registry();
    let Some((_, dev)) = registry.first_open() else {
        error!("get_j_part_data: no device is open");
        return;
    };
    let Ok(address) = usize::try_from(addr) else {
        error!("get_j_part_data: negative address {}", addr);
        return;
    };
    let Some((stored, predicted)) = dev.j_part_data(address) else {
        error!("get_j_part_data: address {} is unset", addr);
        return;
    };

    write_vec3(pos, &stored.position);
    write_vec3(vel, &stored.velocity);
    write_vec3(acc, &stored.a2);
    write_vec3(jrk, &stored.j6);
    let (ppos_src, pvel_src) = match predicted {
        Some(p) => (p.position, p.velocity),
        None => (stored.position, stored.velocity),
    };
    write_vec3(ppos, &ppos_src);
    write_vec3(pvel, &pvel_src);
    *mass = stored.mass;
    *eps2 = 0.0;
    *id = stored.index;
}

// ---------------------------------------------------------------------------
// C ABI: value-argument wrappers forwarding to the Fortran spellings.
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn g6_open(id: c_int) -> c_int {
    g6_open_(&id)
}

#[no_mangle]
pub unsafe extern "C" fn g6_close(id: c_int) -> c_int {
    g6_close_(&id)
}

#[no_mangle]
pub unsafe extern "C" fn g6_npipes() -> c_int {
    g6_npipes_()
}

#[no_mangle]
pub unsafe extern "C" fn g6_set_tunit(tunit: c_double) -> c_int {
    g6_set_tunit_(&tunit)
}

#[no_mangle]
pub unsafe extern "C" fn g6_set_xunit(xunit: c_double) -> c_int {
    g6_set_xunit_(&xunit)
}

#[no_mangle]
pub unsafe extern "C" fn g6_set_ti(id: c_int, ti: c_double) -> c_int {
    g6_set_ti_(&id, &ti)
}

#[no_mangle]
pub unsafe extern "C" fn g6_set_j_particle(
    cluster_id: c_int,
    address: c_int,
    index: c_int,
    tj: c_double,
    dtj: c_double,
    mass: c_double,
    k18: *const c_double,
    j6: *const c_double,
    a2: *const c_double,
    v: *const c_double,
    x: *const c_double,
) -> c_int {
    g6_set_j_particle_(&cluster_id, &address, &index, &tj, &dtj, &mass, k18, j6, a2, v, x)
}

#[no_mangle]
pub unsafe extern "C" fn g6calc_firsthalf(
    cluster_id: c_int,
    nj: c_int,
    ni: c_int,
    index: *const c_int,
    xi: *const [c_double; 3],
    vi: *const [c_double; 3],
    aold: *const [c_double; 3],
    j6old: *const [c_double; 3],
    phiold: *const c_double,
    eps2: c_double,
    h2: *const c_double,
) {
    g6calc_firsthalf_(&cluster_id, &nj, &ni, index, xi, vi, aold, j6old, phiold, &eps2, h2)
}

#[no_mangle]
pub unsafe extern "C" fn g6calc_lasthalf(
    cluster_id: c_int,
    nj: c_int,
    ni: c_int,
    index: *const c_int,
    xi: *const [c_double; 3],
    vi: *const [c_double; 3],
    eps2: c_double,
    h2: *const c_double,
    acc: *mut [c_double; 3],
    jerk: *mut [c_double; 3],
    pot: *mut c_double,
) -> c_int {
    g6calc_lasthalf_(&cluster_id, &nj, &ni, index, xi, vi, &eps2, h2, acc, jerk, pot)
}

#[no_mangle]
pub unsafe extern "C" fn g6calc_lasthalf2(
    cluster_id: c_int,
    nj: c_int,
    ni: c_int,
    index: *const c_int,
    xi: *const [c_double; 3],
    vi: *const [c_double; 3],
    eps2: c_double,
    h2: *const c_double,
    acc: *mut [c_double; 3],
    jerk: *mut [c_double; 3],
    pot: *mut c_double,
    inn: *mut c_int,
) -> c_int {
    g6calc_lasthalf2_(&cluster_id, &nj, &ni, index, xi, vi, &eps2, h2, acc, jerk, pot, inn)
}

#[no_mangle]
pub unsafe extern "C" fn g6_initialize_jp_buffer(cluster_id: c_int, buf_size: c_int) -> c_int {
    g6_initialize_jp_buffer_(&cluster_id, &buf_size)
}

#[no_mangle]
pub unsafe extern "C" fn g6_flush_jp_buffer(cluster_id: c_int) -> c_int {
    g6_flush_jp_buffer_(&cluster_id)
}

#[no_mangle]
pub unsafe extern "C" fn g6_reset(cluster_id: c_int) -> c_int {
    g6_reset_(&cluster_id)
}

#[no_mangle]
pub unsafe extern "C" fn g6_reset_fofpga(cluster_id: c_int) -> c_int {
    g6_reset_fofpga_(&cluster_id)
}

#[no_mangle]
pub unsafe extern "C" fn g6_read_neighbour_list(cluster_id: c_int) -> c_int {
    g6_read_neighbour_list_(&cluster_id)
}

#[no_mangle]
pub unsafe extern "C" fn g6_get_neighbour_list(
    cluster_id: c_int,
    ipipe: c_int,
    maxlength: c_int,
    n_neighbours: *mut c_int,
    neighbour_list: *mut c_int,
) -> c_int {
    g6_get_neighbour_list_(&cluster_id, &ipipe, &maxlength, n_neighbours, neighbour_list)
}
