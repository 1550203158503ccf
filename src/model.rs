//! Read-only per-solve snapshots of the mesh data the assembly kernels consume.
//!
//! The mesh itself is owned by an external collaborator; a [`PotentialFlowModel`] only
//! holds plain value arrays (vertices, connectivity, flags, distances, nodal states and
//! equation ids) for one assembly pass. Callers must not mutate flags or distances
//! between building a local matrix and mapping its equation ids within one pass, since
//! both derive their row/column semantics from the same snapshot.

use eyre::{ensure, eyre};
use nalgebra::{DefaultAllocator, OMatrix, OVector, Point2, Scalar, Vector3, U2, U3};
use serde::{Deserialize, Serialize};

use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::element::{ConstantGradientElement, GeometryData, Tri3d2Element};
use crate::wake::{
    gather_element_potentials, gather_kutta_potentials, NodalDofIds, NodalState, WakeElementClass, WakeFlags,
};
use crate::{Real, SmallDim};

/// Connectivity for a linear triangle element in two dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tri3d2Connectivity(pub [usize; 3]);

impl Tri3d2Connectivity {
    pub fn vertex_indices(&self) -> &[usize; 3] {
        &self.0
    }
}

/// Free-stream conditions of the surrounding flow, used for pressure and
/// potential-jump normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FreestreamConditions<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub velocity_infinity: OVector<T, D>,
}

impl<T, D> FreestreamConditions<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(velocity_infinity: OVector<T, D>) -> Self {
        Self { velocity_infinity }
    }

    pub fn speed_squared(&self) -> T {
        self.velocity_infinity.norm_squared()
    }
}

/// Ephemeral element-scoped data bundle, rebuilt for every assembly call.
///
/// Owned exclusively by the local-system invocation that created it; never persisted
/// or shared across elements.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementalData<T, GeometryDim, NodalDim>
where
    T: Scalar,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    /// Shape function gradients with respect to physical coordinates, one row per node.
    pub gradients: OMatrix<T, NodalDim, GeometryDim>,
    /// Shape function values at the single integration point.
    pub shape_values: OVector<T, NodalDim>,
    pub volume: T,
    /// Signed nodal distances to the wake surface.
    pub distances: OVector<T, NodalDim>,
    /// Nodal potentials gathered according to the element's classification.
    pub phis: OVector<T, NodalDim>,
}

/// The per-pass snapshot of a potential flow problem on a triangle mesh.
#[derive(Debug, Clone)]
pub struct PotentialFlowModel<T: Real> {
    vertices: Vec<Point2<T>>,
    connectivity: Vec<Tri3d2Connectivity>,
    flags: Vec<WakeFlags>,
    distances: Vec<Vector3<T>>,
    node_states: Vec<NodalState<T>>,
    node_dofs: Vec<Option<NodalDofIds>>,
    freestream: FreestreamConditions<T, U2>,
}

impl<T: Real> PotentialFlowModel<T> {
    /// Creates a model with all elements classified as normal, zero distances and zero
    /// nodal potentials. Flags, distances and states are filled in by the setters below;
    /// equation ids by [`Self::set_node_dofs`] or [`Self::assign_default_dof_layout`].
    pub fn new(
        vertices: Vec<Point2<T>>,
        connectivity: Vec<Tri3d2Connectivity>,
        freestream: FreestreamConditions<T, U2>,
    ) -> Self {
        let num_nodes = vertices.len();
        let num_elements = connectivity.len();
        Self {
            vertices,
            connectivity,
            flags: vec![WakeFlags::default(); num_elements],
            distances: vec![Vector3::zeros(); num_elements],
            node_states: vec![NodalState::default(); num_nodes],
            node_dofs: vec![None; num_nodes],
            freestream,
        }
    }

    /// Assigns the standard equation-id layout: primary potentials occupy ids
    /// `[0, num_nodes)`, auxiliary potentials `[num_nodes, 2 * num_nodes)`.
    pub fn assign_default_dof_layout(&mut self) {
        let n = self.vertices.len();
        for (i, dofs) in self.node_dofs.iter_mut().enumerate() {
            *dofs = Some(NodalDofIds {
                potential: i,
                auxiliary_potential: n + i,
            });
        }
    }

    pub fn set_element_flags(&mut self, element_index: usize, flags: WakeFlags) {
        self.flags[element_index] = flags;
    }

    pub fn set_element_distances(&mut self, element_index: usize, distances: Vector3<T>) {
        self.distances[element_index] = distances;
    }

    pub fn set_node_state(&mut self, node_index: usize, state: NodalState<T>) {
        self.node_states[node_index] = state;
    }

    pub fn set_node_dofs(&mut self, node_index: usize, dofs: NodalDofIds) {
        self.node_dofs[node_index] = Some(dofs);
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    /// The number of global equations spanned by the assigned equation ids.
    pub fn num_equations(&self) -> usize {
        self.node_dofs
            .iter()
            .flatten()
            .map(|dofs| dofs.potential.max(dofs.auxiliary_potential))
            .max()
            .map_or(0, |max_id| max_id + 1)
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Tri3d2Connectivity] {
        &self.connectivity
    }

    pub fn freestream(&self) -> &FreestreamConditions<T, U2> {
        &self.freestream
    }

    pub fn element(&self, element_index: usize) -> Tri3d2Element<T> {
        let indices = self.connectivity[element_index].vertex_indices();
        Tri3d2Element::from_vertices([
            self.vertices[indices[0]],
            self.vertices[indices[1]],
            self.vertices[indices[2]],
        ])
    }

    pub fn element_class(&self, element_index: usize) -> WakeElementClass {
        WakeElementClass::classify(&self.flags[element_index])
    }

    pub fn element_distances(&self, element_index: usize) -> &Vector3<T> {
        &self.distances[element_index]
    }

    pub fn element_states(&self, element_index: usize) -> [NodalState<T>; 3] {
        self.connectivity[element_index]
            .vertex_indices()
            .map(|v| self.node_states[v])
    }

    /// The equation ids of the element's nodes.
    ///
    /// # Panics
    ///
    /// Panics if any node of the element has no assigned equation ids; [`Self::check`]
    /// reports this as an error beforehand.
    pub fn element_dofs(&self, element_index: usize) -> [NodalDofIds; 3] {
        self.connectivity[element_index]
            .vertex_indices()
            .map(|v| self.node_dofs[v].expect("node has no assigned equation ids"))
    }

    /// Builds the ephemeral data bundle for one element.
    ///
    /// The nodal potentials are gathered according to the element's classification:
    /// primary potentials for normal elements, the trailing-edge swap for kutta
    /// elements, and zeros for wake elements (whose right-hand side does not project
    /// the current state).
    pub fn elemental_data(&self, element_index: usize) -> eyre::Result<ElementalData<T, U2, U3>> {
        let GeometryData {
            gradients,
            shape_values,
            volume,
        } = self.element(element_index).geometry_data()?;
        let states = self.element_states(element_index);
        let phis = match self.element_class(element_index) {
            WakeElementClass::Normal => gather_element_potentials(&states),
            WakeElementClass::Kutta => gather_kutta_potentials(&states),
            WakeElementClass::Wake | WakeElementClass::WakeSubdivided => OVector::<T, U3>::zeros(),
        };
        Ok(ElementalData {
            gradients,
            shape_values,
            volume,
            distances: self.distances[element_index],
            phis,
        })
    }

    /// Validates the model once, before assembly begins.
    ///
    /// Reports elements referencing nonexistent nodes, nodes without assigned equation
    /// ids and elements of non-positive measure. A single malformed element invalidates
    /// the whole assembly pass, so callers should abort on error.
    pub fn check(&self) -> eyre::Result<()> {
        for (element_index, connectivity) in self.connectivity.iter().enumerate() {
            for &node in connectivity.vertex_indices() {
                ensure!(
                    node < self.vertices.len(),
                    "element {} references nonexistent node {}",
                    element_index,
                    node
                );
                ensure!(
                    self.node_dofs[node].is_some(),
                    "missing potential equation ids on node {} (element {})",
                    node,
                    element_index
                );
            }
            let geometry = self
                .element(element_index)
                .geometry_data()
                .map_err(|error| eyre!("element {}: {}", element_index, error))?;
            ensure!(
                geometry.volume > T::zero(),
                "element {} has non-positive volume",
                element_index
            );
        }
        Ok(())
    }
}
