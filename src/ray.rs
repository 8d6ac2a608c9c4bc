use glam::{ DMat4, DVec3 };

/// A ray: an origin point and a direction vector.
///
/// The direction is not required to be unit length; object-space rays are
/// usually not, and distances along them are still valid in world space since
/// the parameter `t` is shared.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3) -> Ray {
        Ray { origin, direction }
    }

    /// Creates a ray whose origin is nudged `epsilon` along its direction.
    ///
    /// Secondary rays start on a surface; the offset keeps them from hitting
    /// that same surface at `t ≈ 0`.
    pub fn offset(origin: DVec3, direction: DVec3, epsilon: f64) -> Ray {
        Ray { origin: origin + direction * epsilon, direction }
    }

    pub fn position(&self, t: f64) -> DVec3 {
        self.origin + t * self.direction
    }

    /// Maps the ray through `m`, treating the origin as a point and the
    /// direction as a vector.
    pub fn transform(&self, m: &DMat4) -> Ray {
        Ray {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }
}

#[test]
fn ray_position() {
    let r = Ray::new(DVec3::new(2.0, 3.0, 4.0), DVec3::new(1.0, 0.0, 0.0));

    assert_eq!(r.position(0.0), DVec3::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), DVec3::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), DVec3::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), DVec3::new(4.5, 3.0, 4.0));
}

#[test]
fn ray_translation() {
    let r = Ray::new(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 1.0, 0.0));
    let t = r.transform(&DMat4::from_translation(DVec3::new(3.0, 4.0, 5.0)));

    assert_eq!(t.origin, DVec3::new(4.0, 6.0, 8.0));
    assert_eq!(t.direction, DVec3::new(0.0, 1.0, 0.0));
}

#[test]
fn ray_scaling() {
    let r = Ray::new(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 1.0, 0.0));
    let t = r.transform(&DMat4::from_scale(DVec3::new(2.0, 3.0, 4.0)));

    assert_eq!(t.origin, DVec3::new(2.0, 6.0, 12.0));
    assert_eq!(t.direction, DVec3::new(0.0, 3.0, 0.0));
}

#[test]
fn offset_ray_starts_past_the_surface() {
    let r = Ray::offset(DVec3::ZERO, DVec3::new(0.0, 0.0, 2.0), 0.5);

    assert_eq!(r.origin, DVec3::new(0.0, 0.0, 1.0));
    assert_eq!(r.direction, DVec3::new(0.0, 0.0, 2.0));
}
