use matrixcompare::assert_matrix_eq;
use nalgebra::{vector, Vector3};

use skoll::wake::{
    gather_element_potentials, gather_kutta_potentials, gather_lower_potentials, gather_upper_potentials,
    NodalState, WakeElementClass, WakeFlags,
};

fn state(potential: f64, auxiliary_potential: f64, trailing_edge: bool) -> NodalState<f64> {
    NodalState {
        potential,
        auxiliary_potential,
        trailing_edge,
    }
}

#[test]
fn classification_from_flags() {
    let classify = |wake, kutta, is_structure| {
        WakeElementClass::classify(&WakeFlags {
            wake,
            kutta,
            is_structure,
        })
    };

    assert_eq!(classify(0, 0, false), WakeElementClass::Normal);
    assert_eq!(classify(0, 1, false), WakeElementClass::Kutta);
    assert_eq!(classify(1, 0, false), WakeElementClass::Wake);
    assert_eq!(classify(1, 0, true), WakeElementClass::WakeSubdivided);
    // The wake flag wins over kutta, and is_structure is ignored on non-wake elements
    assert_eq!(classify(1, 1, false), WakeElementClass::Wake);
    assert_eq!(classify(0, 0, true), WakeElementClass::Normal);
}

#[test]
fn local_system_dimension_doubles_for_wake_elements() {
    assert_eq!(WakeElementClass::Normal.local_system_dim(3), 3);
    assert_eq!(WakeElementClass::Kutta.local_system_dim(3), 3);
    assert_eq!(WakeElementClass::Wake.local_system_dim(3), 6);
    assert_eq!(WakeElementClass::WakeSubdivided.local_system_dim(3), 6);

    assert!(!WakeElementClass::Kutta.is_wake());
    assert!(WakeElementClass::WakeSubdivided.is_wake());
}

#[test]
fn gather_primary_and_kutta_potentials() {
    let states = [state(1.0, 10.0, false), state(2.0, 20.0, true), state(3.0, 30.0, false)];

    let primary: Vector3<f64> = gather_element_potentials(&states);
    assert_matrix_eq!(primary, vector![1.0, 2.0, 3.0]);

    // Trailing-edge nodes contribute their auxiliary potential
    let kutta: Vector3<f64> = gather_kutta_potentials(&states);
    assert_matrix_eq!(kutta, vector![1.0, 20.0, 3.0]);
}

#[test]
fn gather_sided_potentials() {
    let states = [state(1.0, 10.0, false), state(2.0, 20.0, false), state(3.0, 30.0, false)];
    let distances = vector![1.0, -1.0, 0.0];

    let upper = gather_upper_potentials(&states, &distances);
    let lower = gather_lower_potentials(&states, &distances);

    assert_matrix_eq!(upper, vector![1.0, 20.0, 30.0]);
    assert_matrix_eq!(lower, vector![10.0, 2.0, 30.0]);
}
