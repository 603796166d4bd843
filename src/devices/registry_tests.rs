use crate::devices::DeviceRegistry;
use crate::particles::JParticle;
use crate::pipes::IParticle;
use crate::utils::{DeviceConfig, G6Error};

fn j_particle(index: i32, position: [f64; 3]) -> JParticle {
    JParticle {
        index,
        tj: 0.0,
        dtj: 0.0,
        mass: 1.0,
        k18: [0.0; 3],
        j6: [0.0; 3],
        a2: [0.0; 3],
        velocity: [0.0; 3],
        position,
    }
}

#[test]
fn test_open_close_lifecycle() {
    let mut registry = DeviceRegistry::new();
    registry.open(3);
    assert!(registry.device(3).is_ok());

    registry.close(3).expect("Failed to close open handle");
    match registry.device(3) {
        Err(G6Error::InvalidHandle(id)) => assert_eq!(id, 3),
        _ => panic!("A closed handle must be invalid"),
    }
    assert!(matches!(registry.close(3), Err(G6Error::InvalidHandle(_))));
}

#[test]
fn test_operations_require_open_handle() {
    let mut registry = DeviceRegistry::new();
    assert!(matches!(registry.device_mut(0), Err(G6Error::InvalidHandle(0))));
}

#[test]
fn test_handles_are_isolated() {
    let mut registry = DeviceRegistry::new();
    registry.open(0);
    registry.open(1);

    registry
        .device_mut(0)
        .expect("Handle 0 should be open")
        .set_j_particle(0, j_particle(7, [1.0, 0.0, 0.0]))
        .expect("Failed to load j-particle");

    assert_eq!(registry.device(0).expect("open").store().populated(), 1);
    assert_eq!(
        registry.device(1).expect("open").store().populated(),
        0,
        "A j-particle on handle 0 must never be visible on handle 1"
    );

    // Evaluation on handle 1 sees an empty store, not handle 0's particle.
    let dev1 = registry.device_mut(1).expect("Handle 1 should be open");
    dev1.calc_firsthalf(1, vec![IParticle {
        index: 9,
        position: [0.0; 3],
        velocity: [0.0; 3],
        h2: 0.0,
    }], 0.0);
    assert!(matches!(dev1.calc_lasthalf(1, 1), Err(G6Error::OutOfRange { .. })));
}

#[test]
fn test_reopen_resets_device_state() {
    let mut registry = DeviceRegistry::new();
    registry.open(5);
    registry
        .device_mut(5)
        .expect("open")
        .set_j_particle(0, j_particle(1, [0.0; 3]))
        .expect("Failed to load j-particle");

    registry.open(5);
    assert_eq!(
        registry.device(5).expect("open").store().populated(),
        0,
        "Re-opening a handle must present a fresh store"
    );
}

#[test]
fn test_npipes_is_a_config_constant() {
    let registry = DeviceRegistry::new();
    assert_eq!(registry.npipes(), 48);

    let registry = DeviceRegistry::with_config(DeviceConfig::new(Some(6), None));
    assert_eq!(registry.npipes(), 6);
}

#[test]
fn test_unit_scales_are_stored_process_wide() {
    let mut registry = DeviceRegistry::new();
    assert_eq!(registry.scale().tunit, 1.0);
    assert_eq!(registry.scale().xunit, 1.0);

    registry.set_tunit(0.25);
    registry.set_xunit(2048.0);
    registry.open(0);
    registry.close(0).expect("close");
    assert_eq!(registry.scale().tunit, 0.25, "Scales persist across open/close");
    assert_eq!(registry.scale().xunit, 2048.0);
}

#[test]
fn test_first_open_returns_lowest_handle() {
    let mut registry = DeviceRegistry::new();
    assert!(registry.first_open().is_none());
    registry.open(7);
    registry.open(2);
    let (id, _) = registry.first_open().expect("A device is open");
    assert_eq!(id, 2);
}
