//! Affine transforms and the fixed augmentation family.
//!
//! `Affine2` is a 2-D affine map stored as the top two rows of a 3x3
//! homogeneous matrix:
//!
//! ```text
//! | a  b  xoff |
//! | d  e  yoff |
//! | 0  0  1    |
//! ```
//!
//! Lists of transforms are multiplied left to right, so in
//! `[rotate, scale, mirror]` the mirror touches a point first and the
//! rotation last.

use std::f64::consts::PI;

use geo::{BoundingRect, Centroid, Coord, Geometry, MapCoords, Rect};

use crate::error::TransformError;

/// A 2-D affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub a: f64,
    pub b: f64,
    pub xoff: f64,
    pub d: f64,
    pub e: f64,
    pub yoff: f64,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            xoff: 0.0,
            d: 0.0,
            e: 1.0,
            yoff: 0.0,
        }
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self {
            xoff: dx,
            yoff: dy,
            ..Self::identity()
        }
    }

    /// Counter-clockwise rotation about the origin, in radians.
    pub fn rotate(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            a: cos,
            b: -sin,
            d: sin,
            e: cos,
            ..Self::identity()
        }
    }

    /// Anisotropic scale about the origin.
    pub fn scale(kx: f64, ky: f64) -> Self {
        Self {
            a: kx,
            e: ky,
            ..Self::identity()
        }
    }

    /// Axis mirror. Only the sign of each factor matters: negative flips
    /// that axis, anything else leaves it alone.
    pub fn mirror(kx: f64, ky: f64) -> Self {
        let sign = |k: f64| if k < 0.0 { -1.0 } else { 1.0 };
        Self::scale(sign(kx), sign(ky))
    }

    /// Matrix product `self * other`: `other` is applied to a point first.
    pub fn compose(&self, other: &Affine2) -> Affine2 {
        Affine2 {
            a: self.a * other.a + self.b * other.d,
            b: self.a * other.b + self.b * other.e,
            xoff: self.a * other.xoff + self.b * other.yoff + self.xoff,
            d: self.d * other.a + self.e * other.d,
            e: self.d * other.b + self.e * other.e,
            yoff: self.d * other.xoff + self.e * other.yoff + self.yoff,
        }
    }

    /// Product of a list, taken left to right.
    pub fn compose_all<'a, I>(transforms: I) -> Affine2
    where
        I: IntoIterator<Item = &'a Affine2>,
    {
        transforms
            .into_iter()
            .fold(Affine2::identity(), |acc, t| acc.compose(t))
    }

    #[inline]
    pub fn apply_coord(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.a * c.x + self.b * c.y + self.xoff,
            y: self.d * c.x + self.e * c.y + self.yoff,
        }
    }

    /// Transform every coordinate of a geometry. Structure and element
    /// order are untouched.
    pub fn apply(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        let t = *self;
        geometry.map_coords(move |c| t.apply_coord(c))
    }

    /// Conjugate by a translation so the transform acts about `pivot`
    /// instead of the origin: `T(pivot) * self * T(-pivot)`.
    pub fn about(&self, pivot: Coord<f64>) -> Affine2 {
        Affine2::translate(pivot.x, pivot.y)
            .compose(self)
            .compose(&Affine2::translate(-pivot.x, -pivot.y))
    }
}

// =============================================================================
// GEOMETRY OPERATIONS
// =============================================================================

/// Apply a list of transforms about the geometry's own centroid.
///
/// The geometry is recentred on its centroid, the composed list is applied,
/// and the result is translated back. An empty list, or a geometry without a
/// centroid (empty), comes back unchanged.
pub fn apply_about_centroid(geometry: &Geometry<f64>, transforms: &[Affine2]) -> Geometry<f64> {
    if transforms.is_empty() {
        return geometry.clone();
    }
    let Some(center) = geometry.centroid() else {
        return geometry.clone();
    };

    Affine2::compose_all(transforms)
        .about(center.0)
        .apply(geometry)
}

/// Stretch a geometry so its bounding box lands exactly on `target`.
///
/// Translate to the origin, scale each axis independently, translate to the
/// target corner. No rotation.
pub fn fit(geometry: &Geometry<f64>, target: &Rect<f64>) -> Result<Geometry<f64>, TransformError> {
    let source = geometry
        .bounding_rect()
        .ok_or(TransformError::EmptyGeometry)?;

    if source.width() <= 0.0 || source.height() <= 0.0 {
        return Err(TransformError::DegenerateBounds {
            width: source.width(),
            height: source.height(),
        });
    }

    let transform = Affine2::translate(target.min().x, target.min().y)
        .compose(&Affine2::scale(
            target.width() / source.width(),
            target.height() / source.height(),
        ))
        .compose(&Affine2::translate(-source.min().x, -source.min().y));

    Ok(transform.apply(geometry))
}

// =============================================================================
// AUGMENTATION FAMILY
// =============================================================================

/// Rotation angles, innermost loop of the enumeration
pub const VARIANT_ANGLES: [f64; 5] = [PI / 20.0, PI / 10.0, -PI / 10.0, PI / 2.0, -PI / 2.0];

/// Anisotropic scale pairs, middle loop
pub const VARIANT_SCALES: [(f64, f64); 5] =
    [(0.75, 0.75), (0.75, 1.0), (1.0, 0.75), (1.25, 1.0), (1.0, 1.25)];

/// Mirror pairs, outermost loop
pub const VARIANT_MIRRORS: [(f64, f64); 3] = [(-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)];

/// Size of the augmentation family
pub const VARIANT_COUNT: usize =
    VARIANT_ANGLES.len() * VARIANT_SCALES.len() * VARIANT_MIRRORS.len();

/// Parameters of one member of the augmentation family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariantSpec {
    /// Position in the enumeration
    pub index: usize,
    pub angle: f64,
    pub scale: (f64, f64),
    pub mirror: (f64, f64),
}

impl VariantSpec {
    /// Transform list in composition order: rotate, scale, mirror.
    pub fn transforms(&self) -> [Affine2; 3] {
        [
            Affine2::rotate(self.angle),
            Affine2::scale(self.scale.0, self.scale.1),
            Affine2::mirror(self.mirror.0, self.mirror.1),
        ]
    }
}

/// All members of the family in their fixed order: mirror outer, scale
/// middle, rotation inner. Consumers index into this sequence positionally.
pub fn variant_specs() -> impl Iterator<Item = VariantSpec> {
    VARIANT_MIRRORS
        .into_iter()
        .flat_map(|mirror| {
            VARIANT_SCALES.into_iter().flat_map(move |scale| {
                VARIANT_ANGLES
                    .into_iter()
                    .map(move |angle| (mirror, scale, angle))
            })
        })
        .enumerate()
        .map(|(index, (mirror, scale, angle))| VariantSpec {
            index,
            angle,
            scale,
            mirror,
        })
}

/// The 75 augmented copies of a geometry, each transformed about its
/// centroid, in `variant_specs` order.
pub fn variants(geometry: &Geometry<f64>) -> Vec<Geometry<f64>> {
    variant_specs()
        .map(|spec| apply_about_centroid(geometry, &spec.transforms()))
        .collect()
}
