use itertools::Itertools;
use numeric_literals::replace_float_literals;

use eyre::eyre;
use nalgebra::{distance, Matrix1x3, Matrix2, Matrix2x3, OPoint, Point2, Scalar, Vector2, U2, U3};

use crate::element::{ConstantGradientElement, GeometryData, ReferenceFiniteElement, VolumetricFiniteElement};
use crate::Real;

/// A finite element representing linear basis functions on a triangle, in two dimensions.
///
/// The reference element is the triangle with corners (-1, -1), (1, -1), (-1, 1),
/// which has measure 2.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri3d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 3],
}

impl<T> Tri3d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 3] {
        &self.vertices
    }
}

impl<T> Tri3d2Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn reference() -> Self {
        Self::from_vertices([Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)])
    }
}

impl<T> ReferenceFiniteElement<T> for Tri3d2Element<T>
where
    T: Real,
{
    type ReferenceDim = U2;
    type NodalDim = U3;

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_basis(&self, xi: &OPoint<T, U2>) -> Matrix1x3<T> {
        Matrix1x3::from_row_slice(&[
            -0.5 * xi.x - 0.5 * xi.y,
            0.5 * xi.x + 0.5,
            0.5 * xi.y + 0.5
        ])
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradients(&self, _: &OPoint<T, U2>) -> Matrix2x3<T> {
        Matrix2x3::from_columns(&[
            Vector2::new(-0.5, -0.5),
            Vector2::new(0.5, 0.0),
            Vector2::new(0.0, 0.5)
        ])
    }
}

impl<T> VolumetricFiniteElement<T> for Tri3d2Element<T>
where
    T: Real,
{
    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &OPoint<T, U2>) -> Matrix2<T> {
        let X: Matrix2x3<T> = Matrix2x3::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &OPoint<T, U2>) -> Point2<T> {
        let X: Matrix2x3<T> = Matrix2x3::from_fn(|i, j| self.vertices[j][i]);
        let N = self.evaluate_basis(xi);
        OPoint::from(&X * &N.transpose())
    }

    fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }
}

impl<T> ConstantGradientElement<T> for Tri3d2Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn geometry_data(&self) -> eyre::Result<GeometryData<T, U2, U3>> {
        // The basis gradients of a linear triangle are constant, so any reference point
        // will do. The centroid doubles as the single integration point for the
        // shape function values.
        let centroid = Point2::new(-1.0 / 3.0, -1.0 / 3.0);
        let g_ref = self.gradients(&centroid);
        let j = self.reference_jacobian(&centroid);
        let j_det = j.determinant();
        let j_inv_t = j
            .try_inverse()
            .ok_or_else(|| eyre!("Singular element Jacobian encountered"))?
            .transpose();

        // One row per node: transform reference gradients to physical coordinates
        let gradients = (j_inv_t * g_ref).transpose();
        // The reference triangle has measure 2
        let volume = j_det.abs() * 2.0;
        let shape_values = self.evaluate_basis(&centroid).transpose();

        Ok(GeometryData {
            gradients,
            shape_values,
            volume,
        })
    }
}
