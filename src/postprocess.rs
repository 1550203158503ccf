//! Derived per-element quantities: velocities, pressure coefficients, potential jumps
//! and internal energies computed from a solved nodal state.

use eyre::{ensure, Result};
use nalgebra::{DefaultAllocator, OMatrix, OVector, Vector2, Vector3};
use numeric_literals::replace_float_literals;

use crate::allocators::BiDimAllocator;
use crate::model::PotentialFlowModel;
use crate::wake::{
    gather_element_potentials, gather_kutta_potentials, gather_lower_potentials, gather_upper_potentials,
    WakeElementClass,
};
use crate::{Real, SmallDim};

/// The constant element velocity `Gᵀ phis`, where `G` stores one nodal gradient per row.
pub fn compute_velocity<T, GeometryDim, NodalDim>(
    gradients: &OMatrix<T, NodalDim, GeometryDim>,
    phis: &OVector<T, NodalDim>,
) -> OVector<T, GeometryDim>
where
    T: Real,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    gradients.transpose() * phis
}

/// The velocity of the given element: the primary-potential velocity for normal and
/// kutta elements, the upper-side velocity for wake elements.
pub fn compute_element_velocity<T: Real>(model: &PotentialFlowModel<T>, element_index: usize) -> Result<Vector2<T>> {
    if model.element_class(element_index).is_wake() {
        compute_velocity_upper(model, element_index)
    } else {
        let data = model.elemental_data(element_index)?;
        let phis = gather_element_potentials(&model.element_states(element_index));
        Ok(compute_velocity(&data.gradients, &phis))
    }
}

/// The upper-side velocity of the given element. Falls back to the kutta gathering rule
/// for kutta elements and to the primary potentials for normal elements.
pub fn compute_velocity_upper<T: Real>(model: &PotentialFlowModel<T>, element_index: usize) -> Result<Vector2<T>> {
    let data = model.elemental_data(element_index)?;
    let states = model.element_states(element_index);
    let phis = match model.element_class(element_index) {
        WakeElementClass::Normal => gather_element_potentials(&states),
        WakeElementClass::Kutta => gather_kutta_potentials(&states),
        WakeElementClass::Wake | WakeElementClass::WakeSubdivided => gather_upper_potentials(&states, &data.distances),
    };
    Ok(compute_velocity(&data.gradients, &phis))
}

/// The lower-side velocity of the given element; the mirror of
/// [`compute_velocity_upper`] on wake elements.
pub fn compute_velocity_lower<T: Real>(model: &PotentialFlowModel<T>, element_index: usize) -> Result<Vector2<T>> {
    let data = model.elemental_data(element_index)?;
    let states = model.element_states(element_index);
    let phis = match model.element_class(element_index) {
        WakeElementClass::Normal => gather_element_potentials(&states),
        WakeElementClass::Kutta => gather_kutta_potentials(&states),
        WakeElementClass::Wake | WakeElementClass::WakeSubdivided => gather_lower_potentials(&states, &data.distances),
    };
    Ok(compute_velocity(&data.gradients, &phis))
}

/// The pressure coefficient on the upper side of the given element,
/// `(v_inf^2 - |v|^2) / v_inf^2`.
pub fn compute_pressure_coefficient_upper<T: Real>(
    model: &PotentialFlowModel<T>,
    element_index: usize,
) -> Result<T> {
    let velocity = compute_velocity_upper(model, element_index)?;
    pressure_coefficient(model, element_index, &velocity)
}

/// The pressure coefficient on the lower side of the given element.
pub fn compute_pressure_coefficient_lower<T: Real>(
    model: &PotentialFlowModel<T>,
    element_index: usize,
) -> Result<T> {
    let velocity = compute_velocity_lower(model, element_index)?;
    pressure_coefficient(model, element_index, &velocity)
}

fn pressure_coefficient<T: Real>(
    model: &PotentialFlowModel<T>,
    element_index: usize,
    velocity: &Vector2<T>,
) -> Result<T> {
    let vinf_norm2 = model.freestream().speed_squared();
    ensure!(
        vinf_norm2 > T::default_epsilon(),
        "cannot compute pressure on element {}: free-stream velocity norm must be larger than zero",
        element_index
    );
    Ok((vinf_norm2 - velocity.norm_squared()) / vinf_norm2)
}

/// The potential jump at each node of a wake element, normalized by the free-stream
/// speed.
///
/// At nodes above the wake surface the jump is `2 (aux - phi) / |v_inf|`; below it the
/// sign is flipped, so the jump field is continuous across the cut.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn compute_potential_jump<T: Real>(model: &PotentialFlowModel<T>, element_index: usize) -> Result<Vector3<T>> {
    ensure!(
        model.element_class(element_index).is_wake(),
        "element {} is not a wake element and carries no potential jump",
        element_index
    );
    let vinf_norm = model.freestream().speed_squared().sqrt();
    let states = model.element_states(element_index);
    let distances = model.element_distances(element_index);

    Ok(Vector3::from_fn(|i, _| {
        let state = &states[i];
        if distances[i] > T::zero() {
            2.0 / vinf_norm * (state.auxiliary_potential - state.potential)
        } else {
            2.0 / vinf_norm * (state.potential - state.auxiliary_potential)
        }
    }))
}

/// Evaluates the wake condition residual `| |v_upper|^2 - |v_lower|^2 |` of a wake
/// element and warns when it exceeds the acceptance tolerance of `0.1`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn check_wake_condition<T: Real>(model: &PotentialFlowModel<T>, element_index: usize) -> Result<T> {
    let upper = compute_velocity_upper(model, element_index)?;
    let lower = compute_velocity_lower(model, element_index)?;
    let residual = (upper.norm_squared() - lower.norm_squared()).abs();
    if residual > 0.1 {
        log::warn!("wake condition not fulfilled in element {}", element_index);
    }
    Ok(residual)
}

/// The internal energy of the given element, `0.5 |v|^2` with the upper-side velocity.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn compute_internal_energy<T: Real>(model: &PotentialFlowModel<T>, element_index: usize) -> Result<T> {
    let velocity = compute_velocity_upper(model, element_index)?;
    Ok(0.5 * velocity.norm_squared())
}

/// Derived fields produced by [`finalize_solution_step`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedFields<T> {
    /// Potential jump per node; zero on nodes not touched by any wake element. Nodes
    /// shared by several wake elements keep the value of the last element visited.
    pub nodal_potential_jumps: Vec<T>,
    /// Internal energy per element.
    pub element_internal_energies: Vec<T>,
}

/// Runs the end-of-step diagnostics over the whole model: the wake condition check and
/// potential jump on every wake element, and the internal energy of every element.
pub fn finalize_solution_step<T: Real>(model: &PotentialFlowModel<T>) -> Result<FinalizedFields<T>> {
    let mut nodal_potential_jumps = vec![T::zero(); model.num_nodes()];
    let mut element_internal_energies = Vec::with_capacity(model.num_elements());

    for element_index in 0..model.num_elements() {
        if model.element_class(element_index).is_wake() {
            check_wake_condition(model, element_index)?;
            let jumps = compute_potential_jump(model, element_index)?;
            let indices = model.connectivity()[element_index].vertex_indices();
            for (local, &node) in indices.iter().enumerate() {
                nodal_potential_jumps[node] = jumps[local];
            }
        }
        element_internal_energies.push(compute_internal_energy(model, element_index)?);
    }

    Ok(FinalizedFields {
        nodal_potential_jumps,
        element_internal_energies,
    })
}
