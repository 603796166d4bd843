//! End-to-end tests against the exported ABI.
//!
//! Every test drives a distinct cluster id: the exported symbols share one
//! process-wide registry and the test harness runs in parallel.

use std::os::raw::c_int;

use crate::apis::g6::*;
use crate::utils::STATUS_OK;

fn open(id: c_int) {
    assert_eq!(unsafe { g6_open_(&id) }, STATUS_OK, "Open failed for cluster {}", id);
}

fn close(id: c_int) {
    assert_eq!(unsafe { g6_close_(&id) }, STATUS_OK, "Close failed for cluster {}", id);
}

fn set_point_mass(id: c_int, address: c_int, index: c_int, mass: f64, pos: [f64; 3]) {
    let zero = [0.0f64; 3];
    let status = unsafe {
        g6_set_j_particle_(
            &id, &address, &index, &0.0, &0.0625, &mass,
            zero.as_ptr(), zero.as_ptr(), zero.as_ptr(), zero.as_ptr(), pos.as_ptr(),
        )
    };
    assert_eq!(status, STATUS_OK, "set_j_particle failed at address {}", address);
}

fn run_both_phases(
    id: c_int,
    nj: c_int,
    indices: &[c_int],
    xi: &[[f64; 3]],
    vi: &[[f64; 3]],
    eps2: f64,
    h2: &[f64],
    acc: &mut [[f64; 3]],
    jerk: &mut [[f64; 3]],
    pot: &mut [f64],
) -> c_int {
    let ni = indices.len() as c_int;
    let aold = vec![[0.0f64; 3]; indices.len()];
    let j6old = vec![[0.0f64; 3]; indices.len()];
    let phiold = vec![0.0f64; indices.len()];
    unsafe {
        g6calc_firsthalf_(
            &id, &nj, &ni, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(),
            aold.as_ptr(), j6old.as_ptr(), phiold.as_ptr(), &eps2, h2.as_ptr(),
        );
        g6calc_lasthalf_(
            &id, &nj, &ni, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(), &eps2, h2.as_ptr(),
            acc.as_mut_ptr(), jerk.as_mut_ptr(), pot.as_mut_ptr(),
        )
    }
}

#[test]
fn test_full_evaluation_cycle() {
    let id = 901;
    open(id);
    set_point_mass(id, 0, 0, 2.0, [0.0; 3]);
    assert_eq!(unsafe { g6_set_ti_(&id, &0.0) }, STATUS_OK);

    let mut acc = [[0.0f64; 3]; 1];
    let mut jerk = [[0.0f64; 3]; 1];
    let mut pot = [0.0f64; 1];
    let status = run_both_phases(
        id, 1, &[1], &[[4.0, 0.0, 0.0]], &[[0.0; 3]], 0.0, &[0.0],
        &mut acc, &mut jerk, &mut pot,
    );
    assert_eq!(status, STATUS_OK);
    assert!((acc[0][0] + 2.0 / 16.0).abs() < 1e-12, "Expected -m/d², got {}", acc[0][0]);
    assert!((pot[0] + 2.0 / 4.0).abs() < 1e-12, "Expected -m/d, got {}", pot[0]);
    close(id);
}

#[test]
fn test_npipes_reports_the_hardware_constant() {
    assert_eq!(unsafe { g6_npipes_() }, 48);
    assert_eq!(unsafe { g6_npipes() }, 48);
}

#[test]
fn test_operations_on_unopened_handle_fail() {
    let id = 903;
    assert_eq!(unsafe { g6_set_ti_(&id, &1.0) }, -1);
    assert_eq!(unsafe { g6_close_(&id) }, -1);
    assert_eq!(unsafe { g6_read_neighbour_list_(&id) }, -1);
}

#[test]
fn test_capacity_rejection_leaves_outputs_untouched() {
    let id = 904;
    open(id);
    set_point_mass(id, 0, 0, 1.0, [1.0, 0.0, 0.0]);

    let ni = 49; // one past the pipe count
    let indices: Vec<c_int> = (0..ni).collect();
    let xi = vec![[0.0f64; 3]; ni as usize];
    let vi = vec![[0.0f64; 3]; ni as usize];
    let h2 = vec![0.0f64; ni as usize];
    let sentinel = -777.0;
    let mut acc = vec![[sentinel; 3]; ni as usize];
    let mut jerk = vec![[sentinel; 3]; ni as usize];
    let mut pot = vec![sentinel; ni as usize];

    let status = run_both_phases(
        id, 1, &indices, &xi, &vi, 0.0, &h2, &mut acc, &mut jerk, &mut pot,
    );
    assert_eq!(status, -3, "ni beyond the pipe count must report capacity-exceeded");
    assert!(
        acc.iter().all(|a| *a == [sentinel; 3]) && pot.iter().all(|p| *p == sentinel),
        "A failed second half must not write into caller buffers"
    );
    close(id);
}

#[test]
fn test_lasthalf_without_firsthalf_is_stale() {
    let id = 908;
    open(id);
    let indices = [0];
    let xi = [[0.0f64; 3]];
    let vi = [[0.0f64; 3]];
    let h2 = [0.0f64];
    let mut acc = [[0.0f64; 3]; 1];
    let mut jerk = [[0.0f64; 3]; 1];
    let mut pot = [0.0f64; 1];
    let status = unsafe {
        g6calc_lasthalf_(
            &id, &1, &1, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(), &0.0, h2.as_ptr(),
            acc.as_mut_ptr(), jerk.as_mut_ptr(), pot.as_mut_ptr(),
        )
    };
    assert_eq!(status, -5);
    close(id);
}

#[test]
fn test_set_j_particle_rejects_bad_address() {
    let id = 907;
    open(id);
    let zero = [0.0f64; 3];
    let status = unsafe {
        g6_set_j_particle_(
            &id, &16_384, &0, &0.0, &0.0, &1.0,
            zero.as_ptr(), zero.as_ptr(), zero.as_ptr(), zero.as_ptr(), zero.as_ptr(),
        )
    };
    assert_eq!(status, -2);
    close(id);
}

#[test]
fn test_lasthalf2_reports_nearest_neighbour() {
    let id = 902;
    open(id);
    set_point_mass(id, 0, 10, 1.0, [3.0, 0.0, 0.0]);
    set_point_mass(id, 1, 20, 1.0, [1.0, 0.0, 0.0]);
    assert_eq!(unsafe { g6_set_ti_(&id, &0.0) }, STATUS_OK);

    let indices = [99];
    let xi = [[0.0f64; 3]];
    let vi = [[0.0f64; 3]];
    let h2 = [0.0f64];
    let aold = [[0.0f64; 3]];
    let j6old = [[0.0f64; 3]];
    let phiold = [0.0f64];
    let mut acc = [[0.0f64; 3]; 1];
    let mut jerk = [[0.0f64; 3]; 1];
    let mut pot = [0.0f64; 1];
    let mut inn = [0 as c_int; 1];
    let status = unsafe {
        g6calc_firsthalf_(
            &id, &2, &1, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(),
            aold.as_ptr(), j6old.as_ptr(), phiold.as_ptr(), &0.0, h2.as_ptr(),
        );
        g6calc_lasthalf2_(
            &id, &2, &1, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(), &0.0, h2.as_ptr(),
            acc.as_mut_ptr(), jerk.as_mut_ptr(), pot.as_mut_ptr(), inn.as_mut_ptr(),
        )
    };
    assert_eq!(status, STATUS_OK);
    assert_eq!(inn[0], 20);
    close(id);
}

#[test]
fn test_neighbour_list_retrieval_and_saturation() {
    let id = 905;
    open(id);
    set_point_mass(id, 0, 1, 1.0, [0.1, 0.0, 0.0]);
    set_point_mass(id, 1, 2, 1.0, [0.2, 0.0, 0.0]);
    set_point_mass(id, 2, 3, 1.0, [0.3, 0.0, 0.0]);
    assert_eq!(unsafe { g6_set_ti_(&id, &0.0) }, STATUS_OK);

    let mut acc = [[0.0f64; 3]; 1];
    let mut jerk = [[0.0f64; 3]; 1];
    let mut pot = [0.0f64; 1];
    let status = run_both_phases(
        id, 3, &[99], &[[0.0; 3]], &[[0.0; 3]], 0.0, &[1.0],
        &mut acc, &mut jerk, &mut pot,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(unsafe { g6_read_neighbour_list_(&id) }, STATUS_OK);

    // A big enough buffer retrieves the whole list.
    let mut list = [0 as c_int; 8];
    let mut count = 0 as c_int;
    let status = unsafe { g6_get_neighbour_list_(&id, &0, &8, &mut count, list.as_mut_ptr()) };
    assert_eq!(status, STATUS_OK);
    assert_eq!(count, 3);
    assert_eq!(&list[..3], &[1, 2, 3]);

    // A short buffer truncates and reports saturation as a positive status.
    let mut short = [0 as c_int; 2];
    let status = unsafe { g6_get_neighbour_list_(&id, &0, &2, &mut count, short.as_mut_ptr()) };
    assert_eq!(status, 1, "Truncation must be reported, not hidden");
    assert_eq!(count, 2);
    assert_eq!(&short, &[1, 2]);
    close(id);
}

#[test]
fn test_legacy_stubs_trivially_succeed() {
    let id = 906;
    assert_eq!(unsafe { g6_initialize_jp_buffer_(&id, &1024) }, STATUS_OK);
    assert_eq!(unsafe { g6_flush_jp_buffer_(&id) }, STATUS_OK);
    assert_eq!(unsafe { g6_reset_(&id) }, STATUS_OK);
    assert_eq!(unsafe { g6_reset_fofpga_(&id) }, STATUS_OK);
}

#[test]
fn test_c_value_wrappers_match_fortran_spellings() {
    let id = 909;
    assert_eq!(unsafe { g6_open(id) }, STATUS_OK);
    assert_eq!(unsafe { g6_set_tunit(512.0) }, STATUS_OK);
    assert_eq!(unsafe { g6_set_xunit(64.0) }, STATUS_OK);

    let zero = [0.0f64; 3];
    let pos = [0.0f64; 3];
    let status = unsafe {
        g6_set_j_particle(
            id, 0, 0, 0.0, 0.0, 1.0,
            zero.as_ptr(), zero.as_ptr(), zero.as_ptr(), zero.as_ptr(), pos.as_ptr(),
        )
    };
    assert_eq!(status, STATUS_OK);
    assert_eq!(unsafe { g6_set_ti(id, 0.0) }, STATUS_OK);

    let indices = [5];
    let xi = [[2.0f64, 0.0, 0.0]];
    let vi = [[0.0f64; 3]];
    let aold = [[0.0f64; 3]];
    let j6old = [[0.0f64; 3]];
    let phiold = [0.0f64];
    let h2 = [0.0f64];
    let mut acc = [[0.0f64; 3]; 1];
    let mut jerk = [[0.0f64; 3]; 1];
    let mut pot = [0.0f64; 1];
    let status = unsafe {
        g6calc_firsthalf(
            id, 1, 1, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(),
            aold.as_ptr(), j6old.as_ptr(), phiold.as_ptr(), 0.0, h2.as_ptr(),
        );
        g6calc_lasthalf(
            id, 1, 1, indices.as_ptr(), xi.as_ptr(), vi.as_ptr(), 0.0, h2.as_ptr(),
            acc.as_mut_ptr(), jerk.as_mut_ptr(), pot.as_mut_ptr(),
        )
    };
    assert_eq!(status, STATUS_OK);
    assert!((acc[0][0] + 0.25).abs() < 1e-12);
    assert_eq!(unsafe { g6_close(id) }, STATUS_OK);
}
