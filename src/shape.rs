use glam::{ DMat4, DVec3 };

use crate::ray::Ray;
use crate::light::Material;
use crate::transform::inverse_pair;

/// The geometry of a triangle, in object space.
///
/// The face normal follows the counter-clockwise winding `p1`, `p2`, `p3`.
/// `area2` is twice the triangle's area (the length of the unnormalized
/// normal); it is zero for degenerate triangles.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleInfo {
    pub p1: DVec3,
    pub p2: DVec3,
    pub p3: DVec3,
    pub normal: DVec3,
    pub area2: f64,
}

impl TriangleInfo {
    pub fn new(p1: DVec3, p2: DVec3, p3: DVec3) -> TriangleInfo {
        let cross = (p2 - p1).cross(p3 - p1);

        TriangleInfo {
            p1, p2, p3,
            normal: cross.normalize_or_zero(),
            area2: cross.length(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.area2 == 0.0 || !self.area2.is_finite()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeType {
    /// A sphere with its own center and radius in object space.
    Sphere { center: DVec3, radius: f64 },

    /// A triangle. See TriangleInfo.
    Triangle(TriangleInfo),
}

/// A renderable primitive: geometry, material and an object-to-world
/// transform.
///
/// The inverse and inverse-transpose of `transform` are computed whenever the
/// transform is set, so that queries during rendering do no matrix inversion.
/// A shape with a singular transform is kept but can never be hit.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub ty: ShapeType,
    pub material: Material,

    transform: DMat4,
    inverse: Option<(DMat4, DMat4)>,
}

impl Shape {
    fn new(ty: ShapeType) -> Shape {
        Shape {
            ty,
            material: Default::default(),
            transform: DMat4::IDENTITY,
            inverse: Some((DMat4::IDENTITY, DMat4::IDENTITY)),
        }
    }

    /// Creates a sphere with identity transform and default material.
    pub fn sphere(center: DVec3, radius: f64) -> Shape {
        Shape::new(ShapeType::Sphere { center, radius })
    }

    /// Creates a unit sphere at the object-space origin.
    pub fn unit_sphere() -> Shape {
        Shape::sphere(DVec3::ZERO, 1.0)
    }

    /// Creates a triangle, defined by three object-space points.
    pub fn triangle(p1: DVec3, p2: DVec3, p3: DVec3) -> Shape {
        Shape::new(ShapeType::Triangle(TriangleInfo::new(p1, p2, p3)))
    }

    pub fn with_transform(mut self, transform: DMat4) -> Shape {
        self.set_transform(transform);
        self
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    /// Returns a reference to the object-to-world transform.
    pub fn transform(&self) -> &DMat4 {
        &self.transform
    }

    /// Sets the object-to-world transform and caches its inverses.
    pub fn set_transform(&mut self, transform: DMat4) {
        self.transform = transform;
        self.inverse = inverse_pair(&transform);
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Returns the triangle geometry, if this shape is a triangle.
    pub fn triangle_info(&self) -> Option<&TriangleInfo> {
        match self.ty {
            ShapeType::Triangle(ref ti) => Some(ti),
            _ => None,
        }
    }

    /// Intersects a world-space ray with this shape.
    ///
    /// The ray is brought into object space with the inverse transform. The
    /// parameter `t` is the same in both spaces, so the returned distance can
    /// be used with the world ray directly. Only strictly positive, finite
    /// distances are hits.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let (inverse, _) = self.inverse.as_ref()?;
        let local_ray = ray.transform(inverse);

        let t = match self.ty {
            ShapeType::Sphere { center, radius }
                => Self::intersect_sphere(&local_ray, center, radius),
            ShapeType::Triangle(ref ti) => Self::intersect_triangle(&local_ray, ti),
        }?;

        if t > 0.0 && t.is_finite() { Some(t) } else { None }
    }

    /// Obtains the unit world-space normal at a world-space point on the
    /// surface.
    ///
    /// The object-space normal is carried back with the inverse-transpose of
    /// the transform, which keeps it perpendicular under non-uniform scaling.
    pub fn normal_at(&self, world_point: DVec3) -> DVec3 {
        let (inverse, inverse_transpose) = match self.inverse {
            Some(ref pair) => pair,
            None => return DVec3::ZERO,
        };

        let local_normal = match self.ty {
            ShapeType::Sphere { center, .. } => {
                let local_point = inverse.transform_point3(world_point);
                (local_point - center).normalize()
            },
            ShapeType::Triangle(ref ti) => ti.normal,
        };

        inverse_transpose.transform_vector3(local_normal).normalize()
    }

    /// Solves `a·t² + b·t + c = 0` for the ray against the sphere and returns
    /// the smallest strictly positive root.
    fn intersect_sphere(ray: &Ray, center: DVec3, radius: f64) -> Option<f64> {
        let sphere_to_ray = ray.origin - center;

        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * ray.direction.dot(sphere_to_ray);
        let c = sphere_to_ray.dot(sphere_to_ray) - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        match (t1 > 0.0, t2 > 0.0) {
            (true, true) => Some(t1.min(t2)),
            (true, false) => Some(t1),
            (false, true) => Some(t2),
            (false, false) => None,
        }
    }

    /// Intersects the ray with the triangle's plane, then tests the hit point
    /// with barycentric coordinates computed from sub-triangle areas.
    fn intersect_triangle(ray: &Ray, ti: &TriangleInfo) -> Option<f64> {
        if ti.is_degenerate() {
            return None;
        }

        // If the ray is parallel to the triangle, there is no intersection.
        let n = ti.normal;
        let d_dot_n = ray.direction.dot(n);
        if d_dot_n == 0.0 {
            return None;
        }

        let t = (ti.p1.dot(n) - ray.origin.dot(n)) / d_dot_n;
        if t <= 0.0 {
            return None;
        }

        let p = ray.position(t);
        let alpha = n.dot((ti.p2 - p).cross(ti.p3 - p)) / ti.area2;
        let beta = n.dot((ti.p3 - p).cross(ti.p1 - p)) / ti.area2;

        let inside = (0.0..=1.0).contains(&alpha)
            && (0.0..=1.0).contains(&beta)
            && alpha + beta <= 1.0;

        if inside { Some(t) } else { None }
    }
}

#[cfg(test)]
use crate::transform::{ scaling, translation, rotation };

#[cfg(test)]
fn close(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-4
}

#[test]
fn ray_pierces_sphere() {
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere();

    assert_eq!(s.intersect(&r), Some(4.0));
}

#[test]
fn ray_toward_sphere_hits_at_distance_minus_radius() {
    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));

    for &radius in &[0.5, 1.0, 2.5] {
        let s = Shape::sphere(DVec3::ZERO, radius);
        let t = s.intersect(&r).unwrap();
        assert!((t - (5.0 - radius)).abs() < 1e-9);
    }
}

#[test]
fn ray_is_tangent_to_sphere() {
    let r = Ray::new(DVec3::new(0.0, 1.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere();

    assert_eq!(s.intersect(&r), Some(5.0));
}

#[test]
fn ray_misses_sphere() {
    let r = Ray::new(DVec3::new(0.0, 2.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere();

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn ray_is_inside_sphere() {
    let r = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere();

    assert_eq!(s.intersect(&r), Some(1.0));
}

#[test]
fn sphere_is_behind_ray() {
    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere();

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn sphere_with_offset_center() {
    let r = Ray::new(DVec3::new(3.0, 0.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::sphere(DVec3::new(3.0, 0.0, 1.0), 2.0);

    assert_eq!(s.intersect(&r), Some(4.0));
    assert!(close(s.normal_at(DVec3::new(3.0, 0.0, -1.0)), DVec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn ray_hits_scaled_sphere() {
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere().with_transform(scaling(2.0, 2.0, 2.0));

    assert_eq!(s.intersect(&r), Some(3.0));
}

#[test]
fn ray_misses_translated_sphere() {
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere().with_transform(translation(5.0, 0.0, 0.0));

    assert_eq!(s.intersect(&r), None);
}

#[test]
fn singular_transform_is_never_hit() {
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::new(0.0, 0.0, 1.0));
    let s = Shape::unit_sphere().with_transform(scaling(0.0, 1.0, 1.0));

    assert_eq!(s.intersect(&r), None);
    assert_eq!(s.normal_at(DVec3::ZERO), DVec3::ZERO);
}

#[test]
fn normal_on_sphere_axes() {
    let s = Shape::unit_sphere();

    assert!(close(s.normal_at(DVec3::X), DVec3::X));
    assert!(close(s.normal_at(DVec3::Y), DVec3::Y));
    assert!(close(s.normal_at(DVec3::Z), DVec3::Z));
}

#[test]
fn normal_on_sphere_nonaxial() {
    let s = Shape::unit_sphere();
    let k = 3.0f64.sqrt() / 3.0;
    let n = s.normal_at(DVec3::new(k, k, k));

    assert!(close(n, DVec3::new(k, k, k)));
    assert!((n.length() - 1.0).abs() < 1e-9);
}

#[test]
fn normal_on_sphere_translated() {
    let s = Shape::unit_sphere().with_transform(translation(0.0, 1.0, 0.0));
    let n = s.normal_at(DVec3::new(0.0, 1.70711, -0.70711));

    assert!(close(n, DVec3::new(0.0, 0.70711, -0.70711)));
}

#[test]
fn normal_on_sphere_transformed() {
    let s = Shape::unit_sphere().with_transform(
        scaling(1.0, 0.5, 1.0) * rotation(DVec3::Z, 36.0)
    );
    let k = 2.0f64.sqrt() / 2.0;
    let n = s.normal_at(DVec3::new(0.0, k, -k));

    assert!(close(n, DVec3::new(0.0, 0.97014, -0.24254)));
}

#[cfg(test)]
fn test_triangle() -> Shape {
    Shape::triangle(
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
    )
}

#[test]
fn constructing_a_triangle() {
    let t = test_triangle();
    let ti = t.triangle_info().unwrap();

    assert_eq!(ti.normal, DVec3::new(0.0, 0.0, 1.0));
    assert_eq!(ti.area2, 2.0);
    assert!(!ti.is_degenerate());
}

#[test]
fn normal_on_a_triangle_ignores_the_point() {
    let t = test_triangle();

    assert!(close(t.normal_at(DVec3::new(0.0, 0.5, 0.0)), DVec3::Z));
    assert!(close(t.normal_at(DVec3::new(-0.5, 0.75, 0.0)), DVec3::Z));
    assert!(close(t.normal_at(DVec3::new(0.5, 0.25, 0.0)), DVec3::Z));
}

#[test]
fn normal_on_a_transformed_triangle() {
    let t = test_triangle().with_transform(rotation(DVec3::X, 90.0));

    assert!(close(t.normal_at(DVec3::ZERO), DVec3::new(0.0, -1.0, 0.0)));
}

#[test]
fn intersecting_a_ray_parallel_to_a_triangle() {
    let r = Ray::new(DVec3::new(0.0, -1.0, -2.0), DVec3::new(0.0, 1.0, 0.0));

    assert_eq!(test_triangle().intersect(&r), None);
}

#[test]
fn a_ray_misses_the_p1_p3_edge() {
    let r = Ray::new(DVec3::new(1.0, 1.0, -2.0), DVec3::new(0.0, 0.0, 1.0));

    assert_eq!(test_triangle().intersect(&r), None);
}

#[test]
fn a_ray_misses_the_p1_p2_edge() {
    let r = Ray::new(DVec3::new(-1.0, 1.0, -2.0), DVec3::new(0.0, 0.0, 1.0));

    assert_eq!(test_triangle().intersect(&r), None);
}

#[test]
fn a_ray_misses_the_p2_p3_edge() {
    let r = Ray::new(DVec3::new(0.0, -1.0, -2.0), DVec3::new(0.0, 0.0, 1.0));

    assert_eq!(test_triangle().intersect(&r), None);
}

#[test]
fn a_ray_strikes_a_triangle() {
    let r = Ray::new(DVec3::new(0.0, 0.5, -2.0), DVec3::new(0.0, 0.0, 1.0));

    assert_eq!(test_triangle().intersect(&r), Some(2.0));
}

#[test]
fn a_ray_strikes_the_back_of_a_triangle() {
    let r = Ray::new(DVec3::new(0.0, 0.5, 2.0), DVec3::new(0.0, 0.0, -1.0));

    assert_eq!(test_triangle().intersect(&r), Some(2.0));
}

#[test]
fn triangle_behind_the_ray() {
    let r = Ray::new(DVec3::new(0.0, 0.5, 2.0), DVec3::new(0.0, 0.0, 1.0));

    assert_eq!(test_triangle().intersect(&r), None);
}

#[test]
fn a_ray_strikes_a_translated_triangle() {
    let t = test_triangle().with_transform(translation(0.0, 0.0, 3.0));
    let r = Ray::new(DVec3::new(0.0, 0.5, -2.0), DVec3::new(0.0, 0.0, 1.0));

    assert_eq!(t.intersect(&r), Some(5.0));
}

#[test]
fn degenerate_triangle_is_never_hit() {
    let t = Shape::triangle(
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(2.0, 2.0, 0.0),
    );
    let r = Ray::new(DVec3::new(1.0, 1.0, -2.0), DVec3::new(0.0, 0.0, 1.0));

    assert!(t.triangle_info().unwrap().is_degenerate());
    assert_eq!(t.intersect(&r), None);
}
