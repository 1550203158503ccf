use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{dmatrix, dvector, vector, DMatrix, DVector};

use skoll::assembly::global::{assemble_csr_system, assemble_dense_system};
use skoll::assembly::local::{
    assemble_element_local_system, ElementDofAssembler, ElementScalarAssembler, PotentialFlowAssembler,
};
use skoll::wake::{NodalState, WakeFlags};

use super::{set_nodal_potentials, unit_triangle_model, unit_triangle_stiffness};

fn wake_flags() -> WakeFlags {
    WakeFlags {
        wake: 1,
        kutta: 0,
        is_structure: false,
    }
}

fn subdivided_wake_flags() -> WakeFlags {
    WakeFlags {
        wake: 1,
        kutta: 0,
        is_structure: true,
    }
}

fn element_dofs(assembler: &impl ElementDofAssembler, element_index: usize) -> Vec<usize> {
    let mut dofs = vec![0; assembler.element_dof_count(element_index)];
    assembler.populate_element_dofs(&mut dofs, element_index);
    dofs
}

#[test]
fn normal_element_local_system() {
    let mut model = unit_triangle_model();
    set_nodal_potentials(&mut model, [1.0, 2.0, 3.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    assert_eq!(assembler.element_dof_count(0), 3);
    let (k, f) = assemble_element_local_system(&assembler, 0).unwrap();

    assert_matrix_eq!(k, unit_triangle_stiffness(), comp = abs, tol = 1e-12);
    // The right-hand side is the residual -K phi of the gathered state
    assert_matrix_eq!(f, dvector![1.5, -0.5, -1.0], comp = abs, tol = 1e-12);

    assert_matrix_eq!(k, k.transpose(), comp = abs, tol = 1e-14);
    let row_sums = &k * DVector::from_element(3, 1.0);
    assert_matrix_eq!(row_sums, DVector::zeros(3), comp = abs, tol = 1e-12);
}

#[test]
fn kutta_element_gathers_auxiliary_potential_on_trailing_edge_nodes() {
    let mut model = unit_triangle_model();
    model.set_element_flags(
        0,
        WakeFlags {
            wake: 0,
            kutta: 1,
            is_structure: false,
        },
    );
    set_nodal_potentials(&mut model, [1.0, 2.0, 3.0]);
    // The trailing-edge node stores its meaningful value in the auxiliary slot
    model.set_node_state(
        1,
        NodalState {
            potential: 999.0,
            auxiliary_potential: 2.0,
            trailing_edge: true,
        },
    );
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k, f) = assemble_element_local_system(&assembler, 0).unwrap();
    assert_matrix_eq!(k, unit_triangle_stiffness(), comp = abs, tol = 1e-12);
    assert_matrix_eq!(f, dvector![1.5, -0.5, -1.0], comp = abs, tol = 1e-12);
}

#[test]
fn wake_element_local_system() {
    let mut model = unit_triangle_model();
    model.set_element_flags(0, wake_flags());
    model.set_element_distances(0, vector![1.0, -1.0, 1.0]);
    // Nodal potentials must not leak into the wake right-hand side
    set_nodal_potentials(&mut model, [1.0, 2.0, 3.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    assert_eq!(assembler.element_dof_count(0), 6);
    let (k, f) = assemble_element_local_system(&assembler, 0).unwrap();

    let expected = dmatrix![
        1.0, -0.5, -0.5, 0.0, 0.0, 0.0;
        -0.5, 0.5, 0.0, 0.5, -0.5, 0.0;
        -0.5, 0.0, 0.5, 0.0, 0.0, 0.0;
        -1.0, 0.5, 0.5, 1.0, -0.5, -0.5;
        0.0, 0.0, 0.0, -0.5, 0.5, 0.0;
        0.5, 0.0, -0.5, -0.5, 0.0, 0.5
    ];
    assert_matrix_eq!(k, expected, comp = abs, tol = 1e-12);
    assert_matrix_eq!(f, DVector::zeros(6), comp = abs, tol = 1e-14);
}

#[test]
fn wake_row_on_the_cut_receives_no_coupling() {
    let mut model = unit_triangle_model();
    model.set_element_flags(0, wake_flags());
    model.set_element_distances(0, vector![1.0, 0.0, -1.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k, _) = assemble_element_local_system(&assembler, 0).unwrap();
    let expected = dmatrix![
        1.0, -0.5, -0.5, 0.0, 0.0, 0.0;
        -0.5, 0.5, 0.0, 0.0, 0.0, 0.0;
        -0.5, 0.0, 0.5, 0.5, 0.0, -0.5;
        -1.0, 0.5, 0.5, 1.0, -0.5, -0.5;
        0.0, 0.0, 0.0, -0.5, 0.5, 0.0;
        0.0, 0.0, 0.0, -0.5, 0.0, 0.5
    ];
    assert_matrix_eq!(k, expected, comp = abs, tol = 1e-12);
}

#[test]
fn subdivided_element_with_all_trailing_edge_nodes_splits_the_operator() {
    let mut model = unit_triangle_model();
    model.set_element_flags(0, subdivided_wake_flags());
    model.set_element_distances(0, vector![1.0, -1.0, 1.0]);
    for node in 0..3 {
        model.set_node_state(
            node,
            NodalState {
                potential: 0.0,
                auxiliary_potential: 0.0,
                trailing_edge: true,
            },
        );
    }
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k, f) = assemble_element_local_system(&assembler, 0).unwrap();
    let k_total = unit_triangle_stiffness();

    // The cut leaves 3/4 of the element on the positive side
    let upper_block = k.view((0, 0), (3, 3));
    let lower_block = k.view((3, 3), (3, 3));
    assert_matrix_eq!(upper_block, 0.75 * k_total, comp = abs, tol = 1e-12);
    assert_matrix_eq!(lower_block, 0.25 * k_total, comp = abs, tol = 1e-12);
    assert_matrix_eq!(k.view((0, 3), (3, 3)), DMatrix::zeros(3, 3), comp = abs, tol = 1e-14);
    assert_matrix_eq!(k.view((3, 0), (3, 3)), DMatrix::zeros(3, 3), comp = abs, tol = 1e-14);

    // The split blocks reassemble the whole-element operator
    let block_sum = upper_block + lower_block;
    assert_matrix_eq!(block_sum, k_total, comp = abs, tol = 1e-10);

    assert_matrix_eq!(f, DVector::zeros(6), comp = abs, tol = 1e-14);
}

#[test]
fn subdivided_element_mixes_split_and_wake_rows() {
    let mut model = unit_triangle_model();
    model.set_element_flags(0, subdivided_wake_flags());
    model.set_element_distances(0, vector![1.0, -1.0, 1.0]);
    model.set_node_state(
        1,
        NodalState {
            potential: 0.0,
            auxiliary_potential: 0.0,
            trailing_edge: true,
        },
    );
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k, _) = assemble_element_local_system(&assembler, 0).unwrap();
    let expected = dmatrix![
        1.0, -0.5, -0.5, 0.0, 0.0, 0.0;
        -0.375, 0.375, 0.0, 0.0, 0.0, 0.0;
        -0.5, 0.0, 0.5, 0.0, 0.0, 0.0;
        -1.0, 0.5, 0.5, 1.0, -0.5, -0.5;
        0.0, 0.0, 0.0, -0.125, 0.125, 0.0;
        0.5, 0.0, -0.5, -0.5, 0.0, 0.5
    ];
    assert_matrix_eq!(k, expected, comp = abs, tol = 1e-12);
}

#[test]
fn equation_id_mapping_follows_the_element_class() {
    let mut model = unit_triangle_model();
    let assembler = PotentialFlowAssembler::from_model(&model);
    assert_eq!(element_dofs(&assembler, 0), vec![0, 1, 2]);

    model.set_element_flags(
        0,
        WakeFlags {
            wake: 0,
            kutta: 1,
            is_structure: false,
        },
    );
    model.set_node_state(
        1,
        NodalState {
            potential: 0.0,
            auxiliary_potential: 0.0,
            trailing_edge: true,
        },
    );
    let assembler = PotentialFlowAssembler::from_model(&model);
    assert_eq!(element_dofs(&assembler, 0), vec![0, 4, 2]);

    model.set_element_flags(0, wake_flags());
    model.set_element_distances(0, vector![1.0, -1.0, 1.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);
    assert_eq!(element_dofs(&assembler, 0), vec![0, 4, 2, 3, 1, 5]);
}

#[test]
fn dense_global_system_scatters_the_normal_element() {
    let mut model = unit_triangle_model();
    set_nodal_potentials(&mut model, [1.0, 2.0, 3.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k, f) = assemble_dense_system(&assembler).unwrap();
    assert_eq!(k.nrows(), 6);

    let mut expected_k = DMatrix::zeros(6, 6);
    expected_k.view_mut((0, 0), (3, 3)).copy_from(&unit_triangle_stiffness());
    assert_matrix_eq!(k, expected_k, comp = abs, tol = 1e-12);
    assert_matrix_eq!(f, dvector![1.5, -0.5, -1.0, 0.0, 0.0, 0.0], comp = abs, tol = 1e-12);
}

#[test]
fn global_scatter_of_a_wake_element_follows_its_equation_ids() {
    let mut model = unit_triangle_model();
    model.set_element_flags(0, wake_flags());
    model.set_element_distances(0, vector![1.0, -1.0, 1.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k_local, _) = assemble_element_local_system(&assembler, 0).unwrap();
    let dofs = element_dofs(&assembler, 0);

    let mut expected = DMatrix::zeros(6, 6);
    for i in 0..6 {
        for j in 0..6 {
            expected[(dofs[i], dofs[j])] += k_local[(i, j)];
        }
    }

    let (k_global, _) = assemble_dense_system(&assembler).unwrap();
    assert_matrix_eq!(k_global, expected, comp = abs, tol = 1e-12);
}

#[test]
fn csr_assembly_matches_dense_assembly() {
    let mut model = unit_triangle_model();
    model.set_element_flags(0, wake_flags());
    model.set_element_distances(0, vector![1.0, -1.0, 1.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    let (k_dense, f_dense) = assemble_dense_system(&assembler).unwrap();
    let (k_csr, f_csr) = assemble_csr_system(&assembler).unwrap();

    assert_matrix_eq!(k_csr, k_dense, comp = abs, tol = 1e-14);
    assert_matrix_eq!(f_csr, f_dense, comp = abs, tol = 1e-14);
}

#[test]
fn element_scalar_is_the_internal_energy() {
    let mut model = unit_triangle_model();
    set_nodal_potentials(&mut model, [1.0, 2.0, 3.0]);
    let assembler = PotentialFlowAssembler::from_model(&model);

    // Element velocity is (1, 2), so the energy is |v|^2 / 2
    assert_scalar_eq!(assembler.assemble_element_scalar(0).unwrap(), 2.5, comp = abs, tol = 1e-12);
}
