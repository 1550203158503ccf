//! `skoll` is a library for thin lifting-surface potential flow finite element
//! computations.
//!
//! The library is centered on a single hard kernel: constructing the local
//! linear system of a finite element whose domain is cut by a wake surface,
//! the internal discontinuity sheet trailing a lifting body. Such an element
//! carries two independent copies of the velocity potential, one per side of
//! the cut, and the local stiffness matrix must be sign-routed (and on
//! trailing-edge elements, geometrically subdivided) so that the potential
//! jump across the wake is represented correctly.
//!
//! The main entry points are:
//!
//! - [`assembly::local::PotentialFlowAssembler`], which produces local
//!   matrices, right-hand-side vectors and global equation-id lists for each
//!   element of a [`model::PotentialFlowModel`],
//! - [`assembly::global`], which scatter-adds local contributions into a
//!   global (dense or CSR) system,
//! - [`postprocess`], which evaluates velocities, pressure coefficients,
//!   potential jumps and internal energies from a (partially) converged
//!   solution.
//!
//! Mesh generation, the wake-definition process that flags elements and
//! assigns signed distances, and the global linear solver are external
//! collaborators; this crate only borrows read-only snapshots of their data.

use nalgebra::{DimMin, DimName, RealField};

pub mod allocators;
pub mod assembly;
pub mod element;
pub mod enrichment;
pub mod model;
pub mod postprocess;
pub mod wake;

pub extern crate nalgebra;

/// The scalar type used throughout the library.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic `skoll` routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
