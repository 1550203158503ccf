//! Local assembler traits and the potential flow element kernels.

use nalgebra::{DMatrixViewMut, DVectorViewMut, Scalar};

mod potential_flow;

pub use potential_flow::*;

/// Maps a local element system to global equation ids.
///
/// For a wake element the local system is twice the size of the element's node count:
/// slots `[0, n)` carry the positive-biased unknowns and slots `[n, 2n)` the
/// negative-biased unknowns. Implementations must use the same ordering rule when
/// building local matrices and when populating equation ids, or global assembly
/// corrupts the system.
pub trait ElementDofAssembler {
    fn num_elements(&self) -> usize;

    /// The number of equations in the global system.
    fn num_equations(&self) -> usize;

    /// The number of local degrees of freedom of the given element.
    fn element_dof_count(&self, element_index: usize) -> usize;

    /// Populates the global equation id of every local degree of freedom.
    ///
    /// `output` must have length [`Self::element_dof_count`] for the element.
    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize);
}

pub trait ElementMatrixAssembler<T: Scalar>: ElementDofAssembler {
    /// Assembles the local matrix of the given element into `output`, which must be
    /// square with dimension [`ElementDofAssembler::element_dof_count`].
    fn assemble_element_matrix_into(&self, element_index: usize, output: DMatrixViewMut<T>) -> eyre::Result<()>;
}

pub trait ElementVectorAssembler<T: Scalar>: ElementDofAssembler {
    /// Assembles the local right-hand-side vector of the given element into `output`,
    /// which must have length [`ElementDofAssembler::element_dof_count`].
    fn assemble_element_vector_into(&self, element_index: usize, output: DVectorViewMut<T>) -> eyre::Result<()>;
}

pub trait ElementScalarAssembler<T: Scalar>: ElementDofAssembler {
    /// Computes a scalar quantity associated with the given element.
    fn assemble_element_scalar(&self, element_index: usize) -> eyre::Result<T>;
}
