//! Geometry kernel glue over `geo` types.
//!
//! Arc-length measurement and interpolation along rings, bounding-box
//! helpers, self-intersection repair, and ordered multi-geometry
//! construction/decomposition.

use geo::{
    BooleanOps, BoundingRect, Coord, Euclidean, Geometry, GeometryCollection, Length,
    LineInterpolatePoint, LineString, MultiPoint, MultiPolygon, Polygon, Rect,
    RemoveRepeatedPoints,
};

/// Total length of a ring or line.
pub fn ring_length(ring: &LineString<f64>) -> f64 {
    ring.length::<Euclidean>()
}

/// Point at `distance` along the ring, measured from its first vertex.
///
/// Distances wrap around the ring's length. Returns `None` for an empty ring.
pub fn interpolate_ring(ring: &LineString<f64>, distance: f64) -> Option<Coord<f64>> {
    let first = *ring.0.first()?;
    // Zero-length segments make the interpolation divide by zero
    let ring = ring.remove_repeated_points();
    let total = ring_length(&ring);
    if total <= 0.0 {
        return Some(first);
    }

    ring.line_interpolate_point(distance.rem_euclid(total) / total)
        .map(|p| p.0)
}

/// `n` points at equal arc-length spacing along the ring, starting at its
/// first vertex. The closing point is not repeated.
pub fn resample_ring(ring: &LineString<f64>, n: usize) -> Option<Vec<Coord<f64>>> {
    let first = *ring.0.first()?;
    let ring = ring.remove_repeated_points();
    if ring_length(&ring) <= 0.0 {
        return Some(vec![first; n]);
    }
    (0..n)
        .map(|i| ring.line_interpolate_point(i as f64 / n as f64).map(|p| p.0))
        .collect()
}

/// Axis-aligned bounds of a point sequence.
pub fn points_bounds(points: &[Coord<f64>]) -> Option<Rect<f64>> {
    points
        .iter()
        .copied()
        .collect::<MultiPoint<f64>>()
        .bounding_rect()
}

/// Diagonal length of the bounding box of a point sequence (0 when empty).
pub fn bbox_diagonal(points: &[Coord<f64>]) -> f64 {
    points_bounds(points)
        .map(|r| r.width().hypot(r.height()))
        .unwrap_or(0.0)
}

/// Resolve self-intersections with a zero-width buffer (self-union).
///
/// Overlapping boundary segments are merged into valid simple polygons.
/// Returns `None` when nothing with area survives.
pub fn repair(polygon: Polygon<f64>) -> Option<Geometry<f64>> {
    let subject = MultiPolygon::new(vec![polygon]);
    let repaired = subject.union(&MultiPolygon::new(Vec::new()));

    let mut parts: Vec<Polygon<f64>> = repaired
        .into_iter()
        .filter(|p| p.exterior().0.len() >= 4)
        .collect();

    match parts.len() {
        0 => None,
        1 => parts.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(parts))),
    }
}

/// Combine geometries into one collection, preserving their order.
pub fn combine<I>(geometries: I) -> GeometryCollection<f64>
where
    I: IntoIterator<Item = Geometry<f64>>,
{
    GeometryCollection::new_from(geometries.into_iter().collect())
}

/// Split a geometry back into its elements.
///
/// A collection yields its members in order; anything else is a single
/// element.
pub fn decompose(geometry: Geometry<f64>) -> Vec<Geometry<f64>> {
    match geometry {
        Geometry::GeometryCollection(gc) => gc.0,
        other => vec![other],
    }
}
