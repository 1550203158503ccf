//! Local system construction for wake-enriched potential flow elements.
//!
//! The local matrix of a normal element is the usual gradient-gradient (Laplacian)
//! operator. A wake element doubles every degree of freedom: the matrix consists of two
//! diagonal blocks carrying the whole-element operator, plus one off-diagonal block per
//! row that enforces the wake condition against the unknowns on the opposite side of
//! the cut. On the element containing the trailing edge, the diagonal blocks of
//! trailing-edge rows are instead integrated separately over the positive and negative
//! sub-volumes of the geometric partition.

use nalgebra::{DMatrixViewMut, DVectorViewMut, DefaultAllocator, Matrix3, OMatrix, OVector};

use crate::allocators::{BiDimAllocator, DimAllocator};
use crate::assembly::local::{
    ElementDofAssembler, ElementMatrixAssembler, ElementScalarAssembler, ElementVectorAssembler,
};
use crate::element::Tri3d2Element;
use crate::enrichment::{Sign, SubVolumePartition, SubVolumePartitioner, TriangleLevelSetSplitter};
use crate::model::{ElementalData, PotentialFlowModel};
use crate::postprocess;
use crate::wake::WakeElementClass;
use crate::{Real, SmallDim};

/// Adds the single-point Laplacian contribution `weight * G Gᵀ` to `output`, where `G`
/// stores one nodal gradient per row.
pub fn add_laplace_contribution<T, GeometryDim, NodalDim>(
    output: &mut OMatrix<T, NodalDim, NodalDim>,
    weight: T,
    gradients: &OMatrix<T, NodalDim, GeometryDim>,
) where
    T: Real,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    output.gemm(weight, gradients, &gradients.transpose(), T::one());
}

/// Assembles the local system of a normal or kutta element.
///
/// `K = volume * G Gᵀ` and `F = -K * phis`: the system is linear and has no independent
/// source term, so the right-hand side is the plain residual of the gathered nodal
/// state.
///
/// # Panics
///
/// Panics if `k` is not `n x n` or `f` does not have length `n`, where `n` is the
/// element's node count.
pub fn assemble_normal_local_system<T, GeometryDim, NodalDim>(
    data: &ElementalData<T, GeometryDim, NodalDim>,
    mut k: DMatrixViewMut<T>,
    mut f: DVectorViewMut<T>,
) where
    T: Real,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    let n = NodalDim::dim();
    assert_eq!(k.nrows(), n, "Output matrix dimension mismatch");
    assert_eq!(k.ncols(), n, "Output matrix dimension mismatch");
    assert_eq!(f.nrows(), n, "Output vector dimension mismatch");

    let mut k_local = OMatrix::<T, NodalDim, NodalDim>::zeros();
    add_laplace_contribution(&mut k_local, data.volume, &data.gradients);

    let f_local = -(&k_local * &data.phis);

    k.copy_from(&k_local);
    f.copy_from(&f_local);
}

/// Assembles the local system of a wake element without geometric subdivision.
///
/// The system has dimension `2n`. Every row receives the whole-element operator in both
/// diagonal blocks, decoupling the two copies of the unknowns; the off-diagonal block
/// selected by the sign of the row node's distance then couples that row to the
/// opposite side, enforcing the wake condition. Rows whose distance is exactly zero
/// receive no coupling. The right-hand side stays zero on this path.
///
/// # Panics
///
/// Panics if `k` is not `2n x 2n` or `f` does not have length `2n`.
pub fn assemble_wake_local_system<T, GeometryDim, NodalDim>(
    data: &ElementalData<T, GeometryDim, NodalDim>,
    mut k: DMatrixViewMut<T>,
    mut f: DVectorViewMut<T>,
) where
    T: Real,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    let n = NodalDim::dim();
    assert_eq!(k.nrows(), 2 * n, "Output matrix dimension mismatch");
    assert_eq!(k.ncols(), 2 * n, "Output matrix dimension mismatch");
    assert_eq!(f.nrows(), 2 * n, "Output vector dimension mismatch");

    k.fill(T::zero());
    f.fill(T::zero());

    let mut k_total = OMatrix::<T, NodalDim, NodalDim>::zeros();
    add_laplace_contribution(&mut k_total, data.volume, &data.gradients);

    for row in 0..n {
        assign_wake_row(&mut k, &k_total, &data.distances, row);
    }
}

/// Assembles the local system of the wake element containing the trailing edge.
///
/// The element is partitioned into signed sub-volumes; `Kpos` and `Kneg` accumulate the
/// operator over the positive and negative pieces (the gradients are constant, so only
/// the integration weight varies per sub-volume). Trailing-edge rows take the split
/// contributions directly in their diagonal blocks and are exempt from the wake
/// condition; all other rows follow the plain wake routing with the whole-element
/// operator.
///
/// # Panics
///
/// Panics if `trailing_edge` does not have length `n`, or if `k`/`f` are not sized
/// `2n x 2n` / `2n`.
pub fn assemble_subdivided_wake_local_system<T, GeometryDim, NodalDim>(
    data: &ElementalData<T, GeometryDim, NodalDim>,
    trailing_edge: &[bool],
    partition: &SubVolumePartition<T>,
    mut k: DMatrixViewMut<T>,
    mut f: DVectorViewMut<T>,
) where
    T: Real,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    let n = NodalDim::dim();
    assert_eq!(trailing_edge.len(), n);
    assert_eq!(k.nrows(), 2 * n, "Output matrix dimension mismatch");
    assert_eq!(k.ncols(), 2 * n, "Output matrix dimension mismatch");
    assert_eq!(f.nrows(), 2 * n, "Output vector dimension mismatch");

    k.fill(T::zero());
    f.fill(T::zero());

    let mut k_total = OMatrix::<T, NodalDim, NodalDim>::zeros();
    add_laplace_contribution(&mut k_total, data.volume, &data.gradients);

    let mut k_positive = OMatrix::<T, NodalDim, NodalDim>::zeros();
    let mut k_negative = OMatrix::<T, NodalDim, NodalDim>::zeros();
    for sub_volume in partition.iter() {
        match sub_volume.sign {
            Sign::Positive => add_laplace_contribution(&mut k_positive, sub_volume.volume, &data.gradients),
            Sign::Negative => add_laplace_contribution(&mut k_negative, sub_volume.volume, &data.gradients),
        }
    }

    for row in 0..n {
        if trailing_edge[row] {
            // The trailing edge node is shared by both sides of the wake and takes the
            // exact split contribution instead of the wake condition
            for column in 0..n {
                k[(row, column)] = k_positive[(row, column)];
                k[(row + n, column + n)] = k_negative[(row, column)];
            }
        } else {
            assign_wake_row(&mut k, &k_total, &data.distances, row);
        }
    }
}

/// Writes one row of a wake element's local matrix: the diagonal blocks, then the
/// off-diagonal block selected by the sign of the row node's distance.
fn assign_wake_row<T, NodalDim>(
    k: &mut DMatrixViewMut<T>,
    k_total: &OMatrix<T, NodalDim, NodalDim>,
    distances: &OVector<T, NodalDim>,
    row: usize,
) where
    T: Real,
    NodalDim: SmallDim,
    DefaultAllocator: DimAllocator<T, NodalDim>,
{
    let n = NodalDim::dim();

    // Diagonal blocks: decouple the two copies of the unknowns
    for column in 0..n {
        k[(row, column)] = k_total[(row, column)];
        k[(row + n, column + n)] = k_total[(row, column)];
    }

    // Wake condition on the auxiliary unknowns. A row node exactly on the cut
    // (distance zero) is coupled to neither side.
    if distances[row] < T::zero() {
        for column in 0..n {
            k[(row, column + n)] = -k_total[(row, column)];
        }
    } else if distances[row] > T::zero() {
        for column in 0..n {
            k[(row + n, column)] = -k_total[(row, column)];
        }
    }
}

/// Produces local matrices, right-hand sides, equation ids and per-element scalars for
/// every element of a [`PotentialFlowModel`].
///
/// Each element is classified once per call; the builder and the equation-id mapper
/// derive their row/column semantics from that shared classification, so the two stay
/// aligned as long as the model is not mutated between calls.
#[derive(Debug, Clone)]
pub struct PotentialFlowAssembler<'a, T: Real, Partitioner = TriangleLevelSetSplitter> {
    model: &'a PotentialFlowModel<T>,
    partitioner: Partitioner,
}

impl<'a, T: Real> PotentialFlowAssembler<'a, T> {
    pub fn from_model(model: &'a PotentialFlowModel<T>) -> Self {
        Self {
            model,
            partitioner: TriangleLevelSetSplitter,
        }
    }
}

impl<'a, T: Real, Partitioner> PotentialFlowAssembler<'a, T, Partitioner> {
    pub fn with_partitioner(model: &'a PotentialFlowModel<T>, partitioner: Partitioner) -> Self {
        Self { model, partitioner }
    }

    pub fn model(&self) -> &'a PotentialFlowModel<T> {
        self.model
    }
}

impl<'a, T: Real, Partitioner> ElementDofAssembler for PotentialFlowAssembler<'a, T, Partitioner> {
    fn num_elements(&self) -> usize {
        self.model.num_elements()
    }

    fn num_equations(&self) -> usize {
        self.model.num_equations()
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.model.element_class(element_index).local_system_dim(3)
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        let class = self.model.element_class(element_index);
        assert_eq!(output.len(), class.local_system_dim(3), "Output dof list dimension mismatch");

        let dofs = self.model.element_dofs(element_index);
        match class {
            WakeElementClass::Normal => {
                for (slot, node_dofs) in output.iter_mut().zip(&dofs) {
                    *slot = node_dofs.potential;
                }
            }
            WakeElementClass::Kutta => {
                let states = self.model.element_states(element_index);
                for i in 0..3 {
                    output[i] = if states[i].trailing_edge {
                        dofs[i].auxiliary_potential
                    } else {
                        dofs[i].potential
                    };
                }
            }
            WakeElementClass::Wake | WakeElementClass::WakeSubdivided => {
                let distances = self.model.element_distances(element_index);
                // Positive block: nodes below the wake surface fall back to their
                // auxiliary unknown
                for i in 0..3 {
                    output[i] = if distances[i] > T::zero() {
                        dofs[i].potential
                    } else {
                        dofs[i].auxiliary_potential
                    };
                }
                // Negative block: the selection criterion is inverted
                for i in 0..3 {
                    output[3 + i] = if distances[i] < T::zero() {
                        dofs[i].potential
                    } else {
                        dofs[i].auxiliary_potential
                    };
                }
            }
        }
    }
}

impl<'a, T, Partitioner> ElementMatrixAssembler<T> for PotentialFlowAssembler<'a, T, Partitioner>
where
    T: Real,
    Partitioner: SubVolumePartitioner<T, Tri3d2Element<T>>,
{
    fn assemble_element_matrix_into(&self, element_index: usize, output: DMatrixViewMut<T>) -> eyre::Result<()> {
        let class = self.model.element_class(element_index);
        let data = self.model.elemental_data(element_index)?;
        let mut f_scratch = OVector::<T, nalgebra::Dyn>::zeros(class.local_system_dim(3));

        match class {
            WakeElementClass::Normal | WakeElementClass::Kutta => {
                assemble_normal_local_system(&data, output, DVectorViewMut::from(&mut f_scratch));
            }
            WakeElementClass::Wake => {
                assemble_wake_local_system(&data, output, DVectorViewMut::from(&mut f_scratch));
            }
            WakeElementClass::WakeSubdivided => {
                let element = self.model.element(element_index);
                let partition = self.partitioner.partition(&element, &data.distances)?;
                let trailing_edge = self
                    .model
                    .element_states(element_index)
                    .map(|state| state.trailing_edge);
                assemble_subdivided_wake_local_system(
                    &data,
                    &trailing_edge,
                    &partition,
                    output,
                    DVectorViewMut::from(&mut f_scratch),
                );
            }
        }
        Ok(())
    }
}

impl<'a, T, Partitioner> ElementVectorAssembler<T> for PotentialFlowAssembler<'a, T, Partitioner>
where
    T: Real,
    Partitioner: SubVolumePartitioner<T, Tri3d2Element<T>>,
{
    fn assemble_element_vector_into(&self, element_index: usize, mut output: DVectorViewMut<T>) -> eyre::Result<()> {
        let class = self.model.element_class(element_index);
        match class {
            WakeElementClass::Normal | WakeElementClass::Kutta => {
                let data = self.model.elemental_data(element_index)?;
                let mut k_scratch = Matrix3::<T>::zeros();
                assemble_normal_local_system(&data, DMatrixViewMut::from(&mut k_scratch), output);
            }
            WakeElementClass::Wake | WakeElementClass::WakeSubdivided => {
                // The wake paths leave the right-hand side at zero; the current nodal
                // state is not projected
                assert_eq!(output.nrows(), class.local_system_dim(3), "Output vector dimension mismatch");
                output.fill(T::zero());
            }
        }
        Ok(())
    }
}

impl<'a, T, Partitioner> ElementScalarAssembler<T> for PotentialFlowAssembler<'a, T, Partitioner>
where
    T: Real,
    Partitioner: SubVolumePartitioner<T, Tri3d2Element<T>>,
{
    /// The element's internal energy, `0.5 |v|^2` with the upper-side velocity.
    fn assemble_element_scalar(&self, element_index: usize) -> eyre::Result<T> {
        postprocess::compute_internal_energy(self.model, element_index)
    }
}

/// Gathers the local system of one element into freshly allocated storage.
///
/// Convenience wrapper over the `_into` trait methods, sized by the element's
/// classification.
pub fn assemble_element_local_system<T, A>(
    assembler: &A,
    element_index: usize,
) -> eyre::Result<(nalgebra::DMatrix<T>, nalgebra::DVector<T>)>
where
    T: Real,
    A: ElementMatrixAssembler<T> + ElementVectorAssembler<T>,
{
    let m = assembler.element_dof_count(element_index);
    let mut k = nalgebra::DMatrix::zeros(m, m);
    let mut f = nalgebra::DVector::zeros(m);
    assembler.assemble_element_matrix_into(element_index, DMatrixViewMut::from(&mut k))?;
    assembler.assemble_element_vector_into(element_index, DVectorViewMut::from(&mut f))?;
    Ok((k, f))
}
