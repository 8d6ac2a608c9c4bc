use glam::DVec3;

use crate::ray::Ray;
use crate::color::Color;
use crate::shape::Shape;
use crate::consts::{ DEFAULT_MAX_DEPTH, SHADOW_EPSILON, REFLECTION_EPSILON };
use crate::intersect::{ self, Hit };
use crate::light::{ Light, Attenuation, lighting };

/// Offsets applied to secondary rays so they do not strike the surface they
/// leave.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Distance a shadow ray's origin is moved toward the light.
    pub shadow_epsilon: f64,

    /// Distance a reflection ray's origin is moved along the mirror direction.
    pub reflection_epsilon: f64,
}

impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings {
            shadow_epsilon: SHADOW_EPSILON,
            reflection_epsilon: REFLECTION_EPSILON,
        }
    }
}

/// A world with shapes and lights.
///
/// Worlds collect everything that is rendered, and own the shading logic of
/// the ray tracer. A world is never modified while a frame is being rendered,
/// so it can be shared between threads behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub shapes: Vec<Shape>,
    pub lights: Vec<Light>,
    pub attenuation: Attenuation,

    /// How many times a ray may bounce off mirror-like surfaces.
    pub max_depth: u32,

    pub settings: RenderSettings,
}

impl Default for World {
    fn default() -> World {
        World {
            shapes: Vec::new(),
            lights: Vec::new(),
            attenuation: Default::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            settings: Default::default(),
        }
    }
}

impl World {
    /// Creates an empty world with default attenuation, depth and epsilons.
    pub fn new() -> World {
        Default::default()
    }

    /// Intersects a ray against all shapes in a world, returning the closest
    /// hit in front of the ray origin.
    pub fn nearest_hit(&self, r: &Ray) -> Option<Hit<'_>> {
        intersect::nearest_hit(&self.shapes, r)
    }

    /// Determines whether a light illuminates a point, i.e. whether nothing
    /// stands between the two.
    ///
    /// The shadow ray starts slightly off the surface, toward the light. For
    /// a point light only shapes nearer than the light itself occlude it.
    pub fn is_visible(&self, p: DVec3, light: &Light) -> bool {
        let direction = light.direction_from(p);
        let r = Ray::offset(p, direction, self.settings.shadow_epsilon);

        match (self.nearest_hit(&r), light.distance_from(p)) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(hit), Some(distance)) => hit.t >= distance,
        }
    }

    /// Calculates the color seen from `eye` at `point`, a point on the
    /// surface of `shape`.
    ///
    /// The result is the shape's ambient and emission terms, plus the
    /// contribution of every light that can see the point, plus (while
    /// `depth` is positive) the specular-filtered color seen along the mirror
    /// direction. Every channel is capped at `1.0`, at every bounce.
    ///
    /// The mirror chain is followed iteratively; each bounce is recorded and
    /// the colors are folded back from the last surface to the first.
    pub fn shade(&self, eye: DVec3, point: DVec3, shape: &Shape, depth: u32)
        -> Color {
        // (local color, specular filter) of every surface along the chain.
        let mut bounces: Vec<(Color, Color)> = Vec::new();

        let (mut eye, mut point, mut shape) = (eye, point, shape);
        let mut depth = depth;

        loop {
            let m = shape.material();
            let normalv = shape.normal_at(point);
            let eyev = (eye - point).normalize();

            let mut local = m.ambient + m.emission;
            for light in self.lights.iter() {
                if self.is_visible(point, light) {
                    local += lighting(m, light, point, eyev, normalv,
                        &self.attenuation);
                }
            }
            bounces.push((local, m.specular));

            // A black specular coefficient reflects nothing.
            if depth == 0 || m.specular == Color::black() {
                break;
            }

            let reflectv = (2.0 * normalv.dot(eyev) * normalv - eyev)
                .normalize();
            let r = Ray::offset(point, reflectv,
                self.settings.reflection_epsilon);

            match self.nearest_hit(&r) {
                Some(hit) => {
                    eye = point;
                    point += reflectv * hit.t;
                    shape = hit.what;
                    depth -= 1;
                },
                None => break,
            }
        }

        bounces.iter().rev().fold(Color::black(), |behind, &(local, specular)| {
            (local + specular * behind).clamped()
        })
    }

    /// Determines the color along a primary ray: black on a miss, otherwise
    /// the shaded color of the nearest hit with the world's full bounce depth.
    pub fn color_at(&self, r: &Ray) -> Color {
        match self.nearest_hit(r) {
            None => Color::black(),
            Some(hit) => self.shade(r.origin, r.position(hit.t), hit.what,
                self.max_depth),
        }
    }
}

#[cfg(test)]
use crate::light::Material;

#[cfg(test)]
use crate::transform::translation;

#[cfg(test)]
use crate::camera::Camera;

#[cfg(test)]
use crate::parallel::parallel_render;

#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
fn matte(diffuse: Color) -> Material {
    Material { diffuse, ..Default::default() }
}

#[test]
fn empty_world_is_black() {
    let w = World::new();
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z);

    assert_eq!(w.nearest_hit(&r), None);
    assert_eq!(w.color_at(&r), Color::black());
}

#[test]
fn color_ray_miss() {
    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere());
    w.lights.push(Light::directional(DVec3::Z, Color::white()));

    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Y);
    assert_eq!(w.color_at(&r), Color::black());
}

#[test]
fn color_ray_hit_is_ambient_plus_diffuse() {
    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere().with_material(matte(Color::gray(0.5))));
    w.lights.push(Light::directional(DVec3::Z, Color::white()));

    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);
    assert_eq!(w.color_at(&r), Color::gray(0.7));
}

#[test]
fn shadow_nothing_between_point_and_light() {
    let w = World::new();
    let light = Light::point(DVec3::new(0.0, 0.0, -10.0), Color::white());

    assert!(w.is_visible(DVec3::new(0.0, 0.0, 5.0), &light));
}

#[test]
fn shadow_occluder_between_point_and_light() {
    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere());
    let light = Light::point(DVec3::new(0.0, 0.0, -10.0), Color::white());

    assert!(!w.is_visible(DVec3::new(0.0, 0.0, 5.0), &light));
}

#[test]
fn shadow_occluder_behind_light() {
    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere().with_transform(
        translation(0.0, 0.0, -20.0)));
    let light = Light::point(DVec3::new(0.0, 0.0, -10.0), Color::white());

    assert!(w.is_visible(DVec3::new(0.0, 0.0, 5.0), &light));
}

#[test]
fn shadow_directional_light_has_no_distance() {
    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere().with_transform(
        translation(0.0, 0.0, -1000.0)));
    let light = Light::directional(DVec3::new(0.0, 0.0, -1.0), Color::white());

    assert!(!w.is_visible(DVec3::new(0.0, 0.0, 5.0), &light));
    assert!(w.is_visible(DVec3::new(0.0, 5.0, 5.0), &light));
}

#[test]
fn shade_intersection_in_shadow() {
    let mut w = World::new();
    w.lights.push(Light::point(DVec3::new(0.0, 0.0, -10.0), Color::white()));
    w.shapes.push(Shape::unit_sphere());
    w.shapes.push(Shape::unit_sphere()
        .with_transform(translation(0.0, 0.0, 10.0))
        .with_material(matte(Color::white())));

    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::Z);
    let hit = w.nearest_hit(&r).unwrap();
    assert_eq!(hit.t, 4.0);

    let c = w.shade(r.origin, r.position(hit.t), hit.what, w.max_depth);
    assert_eq!(c, Color::gray(0.2));
}

#[test]
fn bright_lights_are_clamped() {
    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere().with_material(matte(Color::white())));
    w.lights.push(Light::directional(DVec3::Z, Color::gray(100.0)));

    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);
    let c = w.color_at(&r);
    assert_eq!(c, Color::white());
    assert!(c.r <= 1.0 && c.g <= 1.0 && c.b <= 1.0);
}

#[cfg(test)]
fn mirror_world(max_depth: u32) -> World {
    let mirror = Material {
        ambient: Color::black(),
        specular: Color::gray(0.5),
        ..Default::default()
    };
    let glowing = Material {
        ambient: Color::black(),
        emission: Color::rgb(0.0, 1.0, 0.0),
        ..Default::default()
    };

    let mut w = World::new();
    w.max_depth = max_depth;
    w.shapes.push(Shape::unit_sphere().with_material(mirror));
    w.shapes.push(Shape::unit_sphere()
        .with_transform(translation(0.0, 0.0, 10.0))
        .with_material(glowing));
    w
}

#[test]
fn reflection_picks_up_the_mirrored_shape() {
    let w = mirror_world(1);
    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);

    assert_eq!(w.color_at(&r), Color::rgb(0.0, 0.5, 0.0));
}

#[test]
fn zero_depth_has_no_reflection() {
    let w = mirror_world(0);
    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);

    assert_eq!(w.color_at(&r), Color::black());
}

#[test]
fn reflection_ray_that_escapes_adds_nothing() {
    let mut w = mirror_world(5);
    w.shapes.truncate(1);
    let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), -DVec3::Z);

    assert_eq!(w.color_at(&r), Color::black());
}

/// Two large triangles at `z = -1` and `z = 1` facing each other. Both are
/// half mirrors with an ambient term of 0.1 and there are no lights, so a
/// ray bouncing between them sees `c(d) = 0.1 + 0.5 * c(d - 1)`, `c(0) = 0.1`.
#[cfg(test)]
fn facing_mirrors(max_depth: u32) -> World {
    let mirror = Material {
        ambient: Color::gray(0.1),
        diffuse: Color::black(),
        specular: Color::gray(0.5),
        ..Default::default()
    };
    let plane = |z: f64| Shape::triangle(
        DVec3::new(-100.0, -100.0, z),
        DVec3::new(100.0, -100.0, z),
        DVec3::new(0.0, 100.0, z),
    ).with_material(mirror);

    let mut w = World::new();
    w.max_depth = max_depth;
    w.shapes.push(plane(-1.0));
    w.shapes.push(plane(1.0));
    w
}

#[test]
fn reflection_stops_after_max_depth_bounces() {
    let r = Ray::new(DVec3::ZERO, -DVec3::Z);

    assert_eq!(facing_mirrors(0).color_at(&r), Color::gray(0.1));
    assert_eq!(facing_mirrors(1).color_at(&r), Color::gray(0.15));
    assert_eq!(facing_mirrors(2).color_at(&r), Color::gray(0.175));
    assert_eq!(facing_mirrors(3).color_at(&r), Color::gray(0.1875));
}

#[test]
fn reflected_hit_point_is_measured_from_the_surface() {
    let mut w = facing_mirrors(2);
    w.settings.reflection_epsilon = 1.5;
    let r = Ray::new(DVec3::ZERO, -DVec3::Z);

    // The far mirror is struck 0.5 past the offset origin, so the second
    // surface point sits at z = -0.5 and its own offset ray starts behind
    // the near mirror and escapes.
    assert_eq!(w.color_at(&r), Color::gray(0.15));
}

#[test]
fn deep_reflection_does_not_exhaust_the_stack() {
    let w = Arc::new(facing_mirrors(100_000));
    let r = Ray::new(DVec3::ZERO, -DVec3::Z);
    assert_eq!(w.color_at(&r), Color::gray(0.2));

    let w = Arc::new(facing_mirrors(5000));
    let camera = Arc::new(Camera::new(3, 3, DVec3::ZERO, -DVec3::Z, DVec3::Y,
        std::f64::consts::FRAC_PI_2));

    let canvas = parallel_render(&w, &camera, 2);
    assert_eq!(canvas, camera.render(&w));
    assert_eq!(canvas.read_pixel(1, 1), Some(Color::gray(0.2)));
}
