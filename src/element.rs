use nalgebra::{DefaultAllocator, OMatrix, OPoint, OVector, Scalar, U1};

use crate::allocators::BiDimAllocator;
use crate::SmallDim;

mod triangle;

pub use triangle::*;

/// A finite element defined on a reference domain, with a number of nodes fixed
/// at compile-time.
pub trait ReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: BiDimAllocator<T, Self::ReferenceDim, Self::NodalDim>,
{
    type ReferenceDim: SmallDim;
    type NodalDim: SmallDim;

    /// Evaluates each basis function at the given reference coordinates. The result is given
    /// in a row vector where each entry is the value of the corresponding basis function.
    fn evaluate_basis(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OMatrix<T, U1, Self::NodalDim>;

    /// Constructs a matrix whose columns are the gradients of each basis function with
    /// respect to the reference coordinates.
    fn gradients(&self, reference_coords: &OPoint<T, Self::ReferenceDim>)
        -> OMatrix<T, Self::ReferenceDim, Self::NodalDim>;
}

/// A volumetric finite element, i.e. an element whose reference dimension coincides with
/// the dimension of the physical domain.
pub trait VolumetricFiniteElement<T>: ReferenceFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: BiDimAllocator<T, Self::ReferenceDim, Self::NodalDim>,
{
    /// Computes the Jacobian of the map from the reference element to the element
    /// at the given reference coordinates.
    fn reference_jacobian(
        &self,
        reference_coords: &OPoint<T, Self::ReferenceDim>,
    ) -> OMatrix<T, Self::ReferenceDim, Self::ReferenceDim>;

    /// Maps reference coordinates to physical coordinates in the element.
    fn map_reference_coords(&self, reference_coords: &OPoint<T, Self::ReferenceDim>)
        -> OPoint<T, Self::ReferenceDim>;

    /// The diameter of the finite element, defined as the largest distance between any
    /// pair of vertices.
    fn diameter(&self) -> T;
}

/// Single-point shape function data for a constant-gradient element.
///
/// `gradients` stores one row per node, holding that node's basis gradient with respect
/// to physical coordinates. `shape_values` holds the basis function values at the single
/// integration point, and `volume` is the measure of the element.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryData<T, GeometryDim, NodalDim>
where
    T: Scalar,
    GeometryDim: SmallDim,
    NodalDim: SmallDim,
    DefaultAllocator: BiDimAllocator<T, GeometryDim, NodalDim>,
{
    pub gradients: OMatrix<T, NodalDim, GeometryDim>,
    pub shape_values: OVector<T, NodalDim>,
    pub volume: T,
}

/// An element whose basis gradients are constant throughout the element, so that a single
/// integration point integrates its Laplacian weak form exactly.
pub trait ConstantGradientElement<T>: VolumetricFiniteElement<T>
where
    T: Scalar,
    DefaultAllocator: BiDimAllocator<T, Self::ReferenceDim, Self::NodalDim>,
{
    /// Computes shape function gradients, shape function values and the element volume.
    ///
    /// Returns an error if the element geometry is degenerate (singular Jacobian).
    fn geometry_data(&self) -> eyre::Result<GeometryData<T, Self::ReferenceDim, Self::NodalDim>>;
}
