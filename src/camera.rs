use glam::DVec3;

use crate::ray::Ray;
use crate::color::Color;
use crate::world::World;
use crate::canvas::Canvas;

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world: a pinhole at `eye` looking at
/// `center`, with `fov_y` (radians) as the vertical field of view. The
/// horizontal field of view follows from the aspect ratio.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub width: usize,

    /// The vertical size of the resultant canvas.
    pub height: usize,

    pub eye: DVec3,
    pub center: DVec3,

    /// The up vector, already orthogonalized against the viewing direction
    /// (see `transform::up_vector`).
    pub up: DVec3,

    /// The vertical angle describing "how much" the camera can see.
    pub fov_y: f64,

    u: DVec3,
    v: DVec3,
    w: DVec3,
    tan_half_x: f64,
    tan_half_y: f64,
}

impl Camera {
    pub fn new(width: usize, height: usize, eye: DVec3, center: DVec3,
        up: DVec3, fov_y: f64) -> Camera {
        let w = (center - eye).normalize();
        let u = up.cross(w).normalize();
        let v = w.cross(u);

        let tan_half_y = (fov_y / 2.0).tan();
        let fov_x = 2.0 * (tan_half_y * (width as f64) / (height as f64)).atan();
        let tan_half_x = (fov_x / 2.0).tan();

        Camera {
            width, height,
            eye, center, up, fov_y,
            u, v, w,
            tan_half_x, tan_half_y,
        }
    }

    /// Builds the primary ray through the center of pixel `(px, py)`.
    ///
    /// `px` counts columns from the left. With an up vector produced by
    /// `transform::up_vector`, `py = 0` is the bottom row of the picture.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;

        // Offsets from the middle of the canvas to the pixel's center
        let x = px as f64 + 0.5;
        let y = py as f64 + 0.5;

        let alpha = self.tan_half_x * (x - half_w) / half_w;
        let beta = self.tan_half_y * -(y - half_h) / half_h;

        let direction = (self.u * alpha + self.v * beta + self.w).normalize();
        Ray::new(self.eye, direction)
    }

    /// Traces every pixel of column `px`, from row 0 upward.
    pub fn render_column(&self, w: &World, px: usize) -> Vec<Color> {
        (0..self.height)
            .map(|py| w.color_at(&self.ray_for_pixel(px, py)))
            .collect()
    }

    /// Renders the world on the calling thread.
    ///
    /// See `parallel::parallel_render` for the multi-threaded equivalent; both
    /// produce the same canvas.
    pub fn render(&self, w: &World) -> Canvas {
        let mut image = Canvas::new(self.width, self.height);

        for x in 0..self.width {
            let column = self.render_column(w, x);
            image.write_column(x, &column);
        }

        image
    }
}

#[cfg(test)]
use crate::transform::up_vector;

#[cfg(test)]
fn close(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-5
}

#[cfg(test)]
fn looking_down_z(width: usize, height: usize, fov_y: f64) -> Camera {
    let eye = DVec3::ZERO;
    let center = DVec3::new(0.0, 0.0, -1.0);
    let up = up_vector(DVec3::Y, center - eye);

    Camera::new(width, height, eye, center, up, fov_y)
}

#[test]
fn ray_through_center() {
    let c = looking_down_z(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, DVec3::ZERO);
    assert!(close(r.direction, DVec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn ray_through_first_pixel_is_bottom_left() {
    let c = looking_down_z(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(0, 0);

    assert!(close(r.direction, DVec3::new(-0.81513, -0.40757, -0.41164)));
}

#[test]
fn ray_when_camera_moved() {
    let eye = DVec3::new(0.0, 2.0, -5.0);
    let center = DVec3::new(1.0, 2.0, -6.0);
    let up = up_vector(DVec3::Y, center - eye);
    let c = Camera::new(201, 101, eye, center, up, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(100, 50);

    let k = 2.0f64.sqrt() / 2.0;
    assert_eq!(r.origin, eye);
    assert!(close(r.direction, DVec3::new(k, 0.0, -k)));
}

#[test]
fn render_one_sphere_with_directional_light() {
    use crate::shape::Shape;
    use crate::light::{ Light, Material };

    let mut w = World::new();
    w.shapes.push(Shape::unit_sphere().with_material(Material {
        diffuse: Color::gray(0.5),
        ..Default::default()
    }));
    w.lights.push(Light::directional(DVec3::Z, Color::white()));

    let eye = DVec3::new(0.0, 0.0, 5.0);
    let up = up_vector(DVec3::Y, -eye);
    let c = Camera::new(11, 11, eye, DVec3::ZERO, up, 45.0f64.to_radians());

    let image = c.render(&w);
    assert_eq!(image.read_pixel(5, 5).unwrap(), Color::gray(0.7));
    assert_eq!(image.read_pixel(0, 0).unwrap(), Color::black());
    assert_eq!(image.read_pixel(10, 10).unwrap(), Color::black());
}

#[test]
fn render_empty_world_is_black() {
    let c = looking_down_z(4, 3, std::f64::consts::PI / 3.0);
    let image = c.render(&World::new());

    for y in 0..3 {
        for x in 0..4 {
            assert_eq!(image.read_pixel(x, y).unwrap(), Color::black());
        }
    }
}
