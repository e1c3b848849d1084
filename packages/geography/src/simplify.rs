//! Polygon simplification for the offline boundaries build.
//!
//! Boundaries are simplified once, ahead of time, so the map view does not
//! have to push full-resolution GAUL polygons to the renderer. The
//! topology-preserving Visvalingam-Whyatt variant is used so rings never
//! self-intersect after simplification. Tolerances are in degrees; `0.1`
//! is roughly 11 km at the equator.

use geo::{MultiPolygon, Polygon, SimplifyVwPreserve};

/// Default simplification tolerance in degrees.
pub const DEFAULT_TOLERANCE_DEGREES: f64 = 0.1;

/// Smallest number of coordinates a closed ring can have.
const MIN_RING_COORDS: usize = 4;

/// Simplifies every polygon of `polygon` with the given tolerance.
///
/// Visvalingam-Whyatt thresholds on triangle area, so a vertex is dropped
/// when its triangle is smaller than `tolerance` squared.
///
/// Polygons whose exterior collapses below a valid ring are dropped, and
/// interior rings that collapse are removed. If every polygon would
/// collapse (a region smaller than the tolerance) the input is returned
/// unchanged so the region stays drawable.
#[must_use]
pub fn simplify_multipolygon(polygon: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    let min_area = tolerance * tolerance;
    let simplified: Vec<Polygon<f64>> = polygon
        .0
        .iter()
        .map(|p| p.simplify_vw_preserve(min_area))
        .filter(|p| p.exterior().0.len() >= MIN_RING_COORDS)
        .map(|p| {
            let (exterior, interiors) = p.into_inner();
            let interiors = interiors
                .into_iter()
                .filter(|ring| ring.0.len() >= MIN_RING_COORDS)
                .collect();
            Polygon::new(exterior, interiors)
        })
        .collect();

    if simplified.is_empty() {
        polygon.clone()
    } else {
        MultiPolygon(simplified)
    }
}

/// Total number of coordinates across all rings.
#[must_use]
pub fn coordinate_count(polygon: &MultiPolygon<f64>) -> usize {
    polygon
        .0
        .iter()
        .map(|p| p.exterior().0.len() + p.interiors().iter().map(|r| r.0.len()).sum::<usize>())
        .sum()
}
