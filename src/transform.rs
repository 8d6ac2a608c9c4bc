//! Builders for the affine transforms placed on shapes, and the camera's
//! up-vector helper.
//!
//! Matrices act on column vectors (`m * p`), so `a * b` applies `b` first.
//! Scene readers right-multiply new transforms onto the current one, which
//! means the transform written last in a scene file is applied to a shape
//! first.

use glam::{ DMat3, DMat4, DVec3 };

/// Instantiates a 4x4 translation matrix, offsetting points by `x`, `y` and
/// `z`. Vectors are unaffected.
pub fn translation(x: f64, y: f64, z: f64) -> DMat4 {
    DMat4::from_translation(DVec3::new(x, y, z))
}

/// Instantiates a 4x4 scaling matrix along the X, Y and Z axes.
pub fn scaling(x: f64, y: f64, z: f64) -> DMat4 {
    DMat4::from_scale(DVec3::new(x, y, z))
}

/// Instantiates a rotation of `degrees` about an arbitrary `axis`.
///
/// The axis need not be normalized. Rotation is counter-clockwise when looking
/// down the axis toward the origin (right-handed), built with Rodrigues'
/// formula:
///
/// ```text
/// R = cos(θ)·I + (1 - cos(θ))·a·aᵀ + sin(θ)·[a]ₓ
/// ```
///
/// # Examples
///
/// ```
/// # use glam::DVec3;
/// # use phong_tracer::transform::rotation;
/// let m = rotation(DVec3::Z, 90.0);
/// let p = m.transform_point3(DVec3::X);
/// assert!((p - DVec3::Y).length() < 1e-9);
/// ```
pub fn rotation(axis: DVec3, degrees: f64) -> DMat4 {
    let a = axis.normalize();
    let (sin, cos) = degrees.to_radians().sin_cos();

    let identity = DMat3::IDENTITY * cos;
    let outer = DMat3::from_cols(a * a.x, a * a.y, a * a.z) * (1.0 - cos);
    let cross = DMat3::from_cols(
        DVec3::new(0.0, a.z, -a.y),
        DVec3::new(-a.z, 0.0, a.x),
        DVec3::new(a.y, -a.x, 0.0),
    ) * sin;

    DMat4::from_mat3(identity + outer + cross)
}

/// Orthogonalizes an up vector against a viewing direction.
///
/// Computes `normalize((up × dir) × dir)`. The result is perpendicular to
/// `dir` and unit length, and points *opposite* to the component of `up`
/// orthogonal to `dir`. Together with the camera basis this makes row `0` of
/// the frame buffer the bottom of the picture (see `canvas`).
pub fn up_vector(up: DVec3, dir: DVec3) -> DVec3 {
    let x = up.cross(dir);
    let y = x.cross(dir);

    y.normalize()
}

/// Computes the inverse and the inverse-transpose of a transform.
///
/// Returns `None` if the matrix is singular (or not finite), since no ray can
/// be mapped into the object space of such a shape.
pub fn inverse_pair(m: &DMat4) -> Option<(DMat4, DMat4)> {
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }

    let inverse = m.inverse();
    Some((inverse, inverse.transpose()))
}

#[cfg(test)]
fn close(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-9
}

#[test]
fn translation_moves_points_not_vectors() {
    let m = translation(5.0, -3.0, 2.0);
    let p = DVec3::new(-3.0, 4.0, 5.0);

    assert!(close(m.transform_point3(p), DVec3::new(2.0, 1.0, 7.0)));
    assert!(close(m.transform_vector3(p), p));
}

#[test]
fn scaling_applies_per_axis() {
    let m = scaling(2.0, 3.0, 4.0);

    assert!(close(m.transform_point3(DVec3::new(-4.0, 6.0, 8.0)),
        DVec3::new(-8.0, 18.0, 32.0)));
}

#[test]
fn rotation_about_principal_axes() {
    assert!(close(rotation(DVec3::X, 90.0).transform_point3(DVec3::Y), DVec3::Z));
    assert!(close(rotation(DVec3::Y, 90.0).transform_point3(DVec3::Z), DVec3::X));
    assert!(close(rotation(DVec3::Z, 90.0).transform_point3(DVec3::X), DVec3::Y));
}

#[test]
fn rotation_matches_glam_axis_angle() {
    let axis = DVec3::new(1.0, 2.0, -0.5);
    let ours = rotation(axis * 3.0, 37.0);
    let glams = DMat4::from_axis_angle(axis.normalize(), 37.0f64.to_radians());

    let p = DVec3::new(0.3, -1.2, 4.0);
    assert!(close(ours.transform_point3(p), glams.transform_point3(p)));
}

#[test]
fn up_vector_is_orthogonal_and_unit() {
    let dir = DVec3::new(1.0, -2.0, -3.0);
    let up = up_vector(DVec3::new(0.0, 1.0, 0.0), dir);

    assert!(up.dot(dir).abs() < 1e-9);
    assert!((up.length() - 1.0).abs() < 1e-9);
}

#[test]
fn up_vector_flips_the_world_up() {
    let up = up_vector(DVec3::Y, DVec3::new(0.0, 0.0, -1.0));

    assert!(close(up, DVec3::new(0.0, -1.0, 0.0)));
}

#[test]
fn singular_transform_has_no_inverse() {
    assert!(inverse_pair(&scaling(1.0, 0.0, 1.0)).is_none());

    let (inv, inv_t) = inverse_pair(&scaling(2.0, 4.0, 8.0)).unwrap();
    assert!(close(inv.transform_point3(DVec3::new(2.0, 4.0, 8.0)), DVec3::ONE));
    assert_eq!(inv_t, inv.transpose());
}
