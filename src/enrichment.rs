//! Geometric partitioning of a cut element into sign-homogeneous sub-volumes.
//!
//! A wake-subdivided element must be integrated separately on the two sides of the wake
//! surface. The [`SubVolumePartitioner`] trait is the boundary to that service: given an
//! element and its nodal level-set values, it returns sub-volumes tagged with the side
//! they lie on. [`TriangleLevelSetSplitter`] provides the exact partition for linear
//! triangles.

use eyre::ensure;
use nalgebra::{DefaultAllocator, OVector, Point2, Scalar, Vector3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

use crate::allocators::BiDimAllocator;
use crate::element::{ReferenceFiniteElement, Tri3d2Element};
use crate::Real;

/// The side of the wake surface a sub-volume lies on. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Positive,
    Negative,
}

/// One sign-homogeneous piece of a partitioned element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubVolume<T: Scalar> {
    pub sign: Sign,
    pub volume: T,
}

/// The result of partitioning an element along the wake surface.
///
/// The sub-volume measures sum to the measure of the whole element, within floating
/// point tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct SubVolumePartition<T: Scalar> {
    sub_volumes: Vec<SubVolume<T>>,
}

impl<T: Real> SubVolumePartition<T> {
    pub fn len(&self) -> usize {
        self.sub_volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_volumes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubVolume<T>> {
        self.sub_volumes.iter()
    }

    pub fn total_volume(&self) -> T {
        self.sub_volumes
            .iter()
            .fold(T::zero(), |sum, sub| sum + sub.volume)
    }

    /// The combined measure of the sub-volumes on the given side.
    pub fn volume_on_side(&self, sign: Sign) -> T {
        self.sub_volumes
            .iter()
            .filter(|sub| sub.sign == sign)
            .fold(T::zero(), |sum, sub| sum + sub.volume)
    }
}

/// Splits an element into sign-homogeneous sub-volumes along the zero level set of the
/// distance field interpolated from the element's nodes.
pub trait SubVolumePartitioner<T, Element>
where
    T: Real,
    Element: ReferenceFiniteElement<T>,
    DefaultAllocator: BiDimAllocator<T, Element::ReferenceDim, Element::NodalDim>,
{
    fn partition(
        &self,
        element: &Element,
        distances: &OVector<T, Element::NodalDim>,
    ) -> eyre::Result<SubVolumePartition<T>>;
}

/// Exact level-set partitioner for linear triangles.
///
/// The zero level set of a linear interpolant is a straight line, so the cut produces
/// one sub-triangle on the lone-sign side and a quadrilateral (split into two
/// sub-triangles) on the other. A node lying exactly on the cut contributes its vertex
/// to both sides; a sign-homogeneous element yields a single sub-volume covering the
/// whole element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleLevelSetSplitter;

impl<T> SubVolumePartitioner<T, Tri3d2Element<T>> for TriangleLevelSetSplitter
where
    T: Real,
{
    fn partition(&self, element: &Tri3d2Element<T>, distances: &Vector3<T>) -> eyre::Result<SubVolumePartition<T>> {
        let vertices = element.vertices();
        let mut positive: Vec<Point2<T>> = Vec::with_capacity(4);
        let mut negative: Vec<Point2<T>> = Vec::with_capacity(4);

        for i in 0..3 {
            let j = (i + 1) % 3;
            let d_i = distances[i];
            let d_j = distances[j];

            if d_i >= T::zero() {
                positive.push(vertices[i]);
            }
            if d_i <= T::zero() {
                negative.push(vertices[i]);
            }

            let edge_is_cut = (d_i > T::zero() && d_j < T::zero()) || (d_i < T::zero() && d_j > T::zero());
            if edge_is_cut {
                // The interpolated distance vanishes at parameter t along the edge
                let t = d_i / (d_i - d_j);
                let cut_point = vertices[i] + (vertices[j] - vertices[i]) * t;
                positive.push(cut_point);
                negative.push(cut_point);
            }
        }

        let mut sub_volumes = Vec::with_capacity(3);
        triangulate_into(&mut sub_volumes, Sign::Positive, &positive);
        triangulate_into(&mut sub_volumes, Sign::Negative, &negative);

        ensure!(
            !sub_volumes.is_empty(),
            "level-set split produced no sub-volumes; element has zero measure"
        );
        Ok(SubVolumePartition { sub_volumes })
    }
}

/// Fan-triangulates a convex clipped polygon and records one sub-volume per triangle
/// of nonzero measure.
fn triangulate_into<T: Real>(sub_volumes: &mut Vec<SubVolume<T>>, sign: Sign, polygon: &[Point2<T>]) {
    for k in 1..polygon.len().saturating_sub(1) {
        let volume = triangle_area(&polygon[0], &polygon[k], &polygon[k + 1]);
        if volume > T::zero() {
            sub_volumes.push(SubVolume { sign, volume });
        }
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn triangle_area<T: Real>(a: &Point2<T>, b: &Point2<T>, c: &Point2<T>) -> T {
    let ab = b - a;
    let ac = c - a;
    0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
}
