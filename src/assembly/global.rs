//! Scatter of element-local systems into global matrices and vectors.

use eyre::Result;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

use crate::assembly::local::{ElementMatrixAssembler, ElementVectorAssembler};
use crate::Real;

/// The local system of one element together with its global equation ids.
struct ElementSystem<T> {
    dofs: Vec<usize>,
    matrix: DMatrix<T>,
    vector: DVector<T>,
}

/// Builds the local systems of all elements in parallel. Local matrix construction
/// dominates the cost of global assembly, so the scatter stays serial.
fn build_element_systems<T, A>(assembler: &A) -> Result<Vec<ElementSystem<T>>>
where
    T: Real + Send + Sync,
    A: ElementMatrixAssembler<T> + ElementVectorAssembler<T> + Sync,
{
    (0..assembler.num_elements())
        .into_par_iter()
        .map(|element_index| {
            let m = assembler.element_dof_count(element_index);
            let mut dofs = vec![0; m];
            assembler.populate_element_dofs(&mut dofs, element_index);

            let mut matrix = DMatrix::zeros(m, m);
            let mut vector = DVector::zeros(m);
            assembler.assemble_element_matrix_into(element_index, DMatrixViewMut::from(&mut matrix))?;
            assembler.assemble_element_vector_into(element_index, DVectorViewMut::from(&mut vector))?;
            Ok(ElementSystem { dofs, matrix, vector })
        })
        .collect()
}

/// Assembles the dense global matrix and right-hand side of the whole model.
///
/// Intended for small systems and for verifying that local matrices and equation ids
/// agree; production solves should prefer [`assemble_csr_system`].
pub fn assemble_dense_system<T, A>(assembler: &A) -> Result<(DMatrix<T>, DVector<T>)>
where
    T: Real + Send + Sync,
    A: ElementMatrixAssembler<T> + ElementVectorAssembler<T> + Sync,
{
    let n = assembler.num_equations();
    let mut matrix = DMatrix::zeros(n, n);
    let mut vector = DVector::zeros(n);

    for system in build_element_systems(assembler)? {
        for (local_i, &global_i) in system.dofs.iter().enumerate() {
            vector[global_i] += system.vector[local_i];
            for (local_j, &global_j) in system.dofs.iter().enumerate() {
                matrix[(global_i, global_j)] += system.matrix[(local_i, local_j)];
            }
        }
    }
    Ok((matrix, vector))
}

/// Assembles the global matrix in CSR form along with the dense right-hand side.
pub fn assemble_csr_system<T, A>(assembler: &A) -> Result<(CsrMatrix<T>, DVector<T>)>
where
    T: Real + Send + Sync,
    A: ElementMatrixAssembler<T> + ElementVectorAssembler<T> + Sync,
{
    let n = assembler.num_equations();
    let mut coo = CooMatrix::new(n, n);
    let mut vector = DVector::zeros(n);

    for system in build_element_systems(assembler)? {
        for (local_i, &global_i) in system.dofs.iter().enumerate() {
            vector[global_i] += system.vector[local_i];
            for (local_j, &global_j) in system.dofs.iter().enumerate() {
                coo.push(global_i, global_j, system.matrix[(local_i, local_j)]);
            }
        }
    }
    Ok((CsrMatrix::from(&coo), vector))
}
