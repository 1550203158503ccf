//! Classification of wake-cut elements and gathering of sided potentials.
//!
//! A wake element carries two copies of the velocity potential per node: a primary
//! unknown and an auxiliary unknown. Which copy is "upper" or "lower" at a given node
//! is decided by the sign of the node's distance to the wake surface. The functions in
//! this module encode those selection rules; the local system builder and the
//! equation-id mapper both rely on them so that matrix rows and global ids stay aligned.

use nalgebra::{DefaultAllocator, OVector, Scalar};
use serde::{Deserialize, Serialize};

use crate::allocators::DimAllocator;
use crate::{Real, SmallDim};

/// Raw per-element flags assigned by the (external) wake-definition process.
///
/// `wake` marks elements cut by the wake surface. `kutta` is only meaningful for
/// non-wake elements and marks elements adjacent to the trailing edge. `is_structure`
/// is only meaningful for wake elements and marks the element containing the trailing
/// edge node, which must be geometrically subdivided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WakeFlags {
    pub wake: i32,
    pub kutta: i32,
    pub is_structure: bool,
}

/// The closed set of construction paths for a potential flow element.
///
/// Computed once per element by [`WakeElementClass::classify`] and threaded through
/// builder and mapper calls, instead of re-interpreting raw flags at every branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WakeElementClass {
    Normal,
    Kutta,
    Wake,
    WakeSubdivided,
}

impl WakeElementClass {
    /// Determines the construction path from raw element flags.
    ///
    /// `wake` is matched first; an element carrying both `wake` and `kutta` flags is
    /// therefore treated as a wake element, and the flag combination is not validated.
    pub fn classify(flags: &WakeFlags) -> Self {
        if flags.wake == 0 {
            if flags.kutta == 0 {
                Self::Normal
            } else {
                Self::Kutta
            }
        } else if flags.is_structure {
            Self::WakeSubdivided
        } else {
            Self::Wake
        }
    }

    pub fn is_wake(&self) -> bool {
        matches!(self, Self::Wake | Self::WakeSubdivided)
    }

    /// The dimension of the element's local system: `num_nodes` for normal and kutta
    /// elements, `2 * num_nodes` for wake elements with their doubled unknowns.
    pub fn local_system_dim(&self, num_nodes: usize) -> usize {
        if self.is_wake() {
            2 * num_nodes
        } else {
            num_nodes
        }
    }
}

/// Read-only snapshot of one node's solution state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodalState<T: Scalar> {
    pub potential: T,
    pub auxiliary_potential: T,
    pub trailing_edge: bool,
}

impl<T: Real> Default for NodalState<T> {
    fn default() -> Self {
        Self {
            potential: T::zero(),
            auxiliary_potential: T::zero(),
            trailing_edge: false,
        }
    }
}

/// Global equation ids of one node's two potential unknowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodalDofIds {
    pub potential: usize,
    pub auxiliary_potential: usize,
}

/// Gathers the primary potential of every node.
pub fn gather_element_potentials<T, N>(states: &[NodalState<T>]) -> OVector<T, N>
where
    T: Real,
    N: SmallDim,
    DefaultAllocator: DimAllocator<T, N>,
{
    assert_eq!(states.len(), N::dim());
    OVector::<T, N>::from_fn(|i, _| states[i].potential)
}

/// Gathers potentials for a kutta element: trailing-edge nodes contribute their
/// auxiliary potential, all other nodes their primary potential.
pub fn gather_kutta_potentials<T, N>(states: &[NodalState<T>]) -> OVector<T, N>
where
    T: Real,
    N: SmallDim,
    DefaultAllocator: DimAllocator<T, N>,
{
    assert_eq!(states.len(), N::dim());
    OVector::<T, N>::from_fn(|i, _| {
        if states[i].trailing_edge {
            states[i].auxiliary_potential
        } else {
            states[i].potential
        }
    })
}

/// Gathers the upper-side potentials of a wake element: the primary potential where the
/// node lies above the wake surface, the auxiliary potential otherwise.
pub fn gather_upper_potentials<T, N>(states: &[NodalState<T>], distances: &OVector<T, N>) -> OVector<T, N>
where
    T: Real,
    N: SmallDim,
    DefaultAllocator: DimAllocator<T, N>,
{
    assert_eq!(states.len(), N::dim());
    OVector::<T, N>::from_fn(|i, _| {
        if distances[i] > T::zero() {
            states[i].potential
        } else {
            states[i].auxiliary_potential
        }
    })
}

/// Gathers the lower-side potentials of a wake element. The selection is the mirror
/// image of [`gather_upper_potentials`].
pub fn gather_lower_potentials<T, N>(states: &[NodalState<T>], distances: &OVector<T, N>) -> OVector<T, N>
where
    T: Real,
    N: SmallDim,
    DefaultAllocator: DimAllocator<T, N>,
{
    assert_eq!(states.len(), N::dim());
    OVector::<T, N>::from_fn(|i, _| {
        if distances[i] < T::zero() {
            states[i].potential
        } else {
            states[i].auxiliary_potential
        }
    })
}
