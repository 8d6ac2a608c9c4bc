use glam::DVec3;

use crate::color::Color;
use crate::consts::{ DEFAULT_AMBIENT, DEFAULT_ATTENUATION };

/// A light source.
///
/// Directional lights are infinitely far away: `direction` points from the
/// scene *toward* the light and is the same for every surface point. Point
/// lights sit at `position` and fall off with distance (see `Attenuation`).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Light {
    Directional { direction: DVec3, color: Color },
    Point { position: DVec3, color: Color },
}

impl Light {
    /// Creates a directional light. `direction` is normalized here.
    pub fn directional(direction: DVec3, color: Color) -> Light {
        Light::Directional { direction: direction.normalize(), color }
    }

    pub fn point(position: DVec3, color: Color) -> Light {
        Light::Point { position, color }
    }

    pub fn color(&self) -> Color {
        match *self {
            Light::Directional { color, .. } | Light::Point { color, .. } => color,
        }
    }

    /// The unit vector from `point` toward the light.
    pub fn direction_from(&self, point: DVec3) -> DVec3 {
        match *self {
            Light::Directional { direction, .. } => direction,
            Light::Point { position, .. } => (position - point).normalize(),
        }
    }

    /// The distance from `point` to the light, or `None` for a light at
    /// infinity.
    pub fn distance_from(&self, point: DVec3) -> Option<f64> {
        match *self {
            Light::Directional { .. } => None,
            Light::Point { position, .. } => Some((position - point).length()),
        }
    }
}

/// Point-light falloff coefficients: constant, linear and quadratic.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl Default for Attenuation {
    fn default() -> Attenuation {
        let [constant, linear, quadratic] = DEFAULT_ATTENUATION;
        Attenuation { constant, linear, quadratic }
    }
}

impl Attenuation {
    pub fn new(constant: f64, linear: f64, quadratic: f64) -> Attenuation {
        Attenuation { constant, linear, quadratic }
    }

    /// The divisor applied to a point light seen from distance `d`.
    pub fn factor(&self, d: f64) -> f64 {
        self.constant + self.linear * d + self.quadratic * d * d
    }
}

/// A material record.
///
/// Every coefficient is an RGB color, filtered against the light color
/// channel by channel. `specular` doubles as the mirror reflectance of the
/// surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub emission: Color,
    pub shininess: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            ambient: Color::gray(DEFAULT_AMBIENT),
            diffuse: Color::black(),
            specular: Color::black(),
            emission: Color::black(),
            shininess: 0.0,
        }
    }
}

/// Calculates the light a single source contributes to a surface point.
///
/// This is the Lambert term plus the Blinn-Phong specular term, using the
/// half vector between the light and eye directions. Point lights are
/// divided by the attenuation factor; directional lights are not.
///
/// Ambient, emission, shadowing and reflection are handled by the caller
/// (see `World::shade`). `eyev` and `normalv` must be unit vectors.
pub fn lighting(m: &Material, light: &Light, point: DVec3, eyev: DVec3,
    normalv: DVec3, attenuation: &Attenuation) -> Color {
    let lightv = light.direction_from(point);

    // The half vector degenerates when the eye looks straight at the light
    // through the surface; there is no highlight then.
    let halfv = (lightv + eyev).normalize_or_zero();

    let intensity = light.color();
    let lambert = m.diffuse * intensity * normalv.dot(lightv).max(0.0);
    let phong = m.specular * intensity
        * normalv.dot(halfv).max(0.0).powf(m.shininess);

    match light.distance_from(point) {
        Some(d) => (lambert + phong) / attenuation.factor(d),
        None => lambert + phong,
    }
}

#[cfg(test)]
fn shiny() -> Material {
    Material {
        diffuse: Color::gray(0.9),
        specular: Color::gray(0.9),
        shininess: 200.0,
        ..Default::default()
    }
}

#[test]
fn eye_between_light_and_surface() {
    let light = Light::point(DVec3::new(0.0, 0.0, -10.0), Color::white());
    let eyev = DVec3::new(0.0, 0.0, -1.0);
    let normalv = DVec3::new(0.0, 0.0, -1.0);

    let res = lighting(&shiny(), &light, DVec3::ZERO, eyev, normalv,
        &Attenuation::default());
    assert_eq!(res, Color::gray(1.8));
}

#[test]
fn eye_offset_45_loses_the_highlight() {
    let light = Light::point(DVec3::new(0.0, 0.0, -10.0), Color::white());
    let eyev = DVec3::new(0.0, 2.0f64.sqrt() / 2.0, -(2.0f64.sqrt() / 2.0));
    let normalv = DVec3::new(0.0, 0.0, -1.0);

    let res = lighting(&shiny(), &light, DVec3::ZERO, eyev, normalv,
        &Attenuation::default());
    assert_eq!(res, Color::gray(0.9));
}

#[test]
fn light_behind_surface() {
    let light = Light::point(DVec3::new(0.0, 0.0, 10.0), Color::white());
    let eyev = DVec3::new(0.0, 0.0, -1.0);
    let normalv = DVec3::new(0.0, 0.0, -1.0);

    let res = lighting(&shiny(), &light, DVec3::ZERO, eyev, normalv,
        &Attenuation::default());
    assert_eq!(res, Color::black());
}

#[test]
fn point_light_is_attenuated() {
    let m = Material { diffuse: Color::white(), ..Default::default() };
    let light = Light::point(DVec3::new(0.0, 0.0, 2.0), Color::white());
    let normalv = DVec3::Z;

    let res = lighting(&m, &light, DVec3::ZERO, normalv, normalv,
        &Attenuation::new(0.0, 0.0, 1.0));
    assert_eq!(res, Color::gray(0.25));
}

#[test]
fn directional_light_is_not_attenuated() {
    let m = Material { diffuse: Color::white(), ..Default::default() };
    let light = Light::directional(DVec3::new(0.0, 0.0, 5.0), Color::white());
    let normalv = DVec3::Z;

    let res = lighting(&m, &light, DVec3::ZERO, normalv, normalv,
        &Attenuation::new(0.0, 0.0, 1.0));
    assert_eq!(res, Color::white());
}

#[test]
fn light_color_filters_material() {
    let m = Material { diffuse: Color::rgb(1.0, 0.5, 0.0), ..Default::default() };
    let light = Light::directional(DVec3::Z, Color::rgb(0.5, 1.0, 1.0));
    let normalv = DVec3::Z;

    let res = lighting(&m, &light, DVec3::ZERO, normalv, normalv,
        &Attenuation::default());
    assert_eq!(res, Color::rgb(0.5, 0.5, 0.0));
}
