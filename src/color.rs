use std::ops::{ Add, AddAssign, Div, Mul };

use glam::DVec3;

use crate::feq;

/// A color.
///
/// Represented with red-green-blue (RGB) values. Intermediate shading results
/// may exceed 1.0; a finished pixel always lies in 0.0 to 1.0 inclusive (see
/// `Color::clamped`).
///
/// # Examples
///
/// Filter white light through a reddish surface:
///
/// ```
/// # use phong_tracer::color::Color;
/// let surface = Color::rgb(0.8, 0.2, 0.2);
/// let light = Color::white();
/// assert_eq!(surface * light, Color::rgb(0.8, 0.2, 0.2));
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Partial equality on two colors.
///
/// Colors are compared component-wise, accounting for possible floating point
/// error in comparisons.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

/// Conversion from a vector to a `Color`.
///
/// Takes the first three elements of a vector as `r`, `g` and `b`. Missing
/// elements default to `0.0`; extra elements are ignored.
impl From<&Vec<f64>> for Color {
    fn from(v: &Vec<f64>) -> Color {
        match v.len() {
            0 => Default::default(),
            1 => Color { r: v[0], ..Default::default() },
            2 => Color { r: v[0], g: v[1], ..Default::default() },
            _ => Color { r: v[0], g: v[1], b: v[2] }
        }
    }
}

impl From<DVec3> for Color {
    fn from(v: DVec3) -> Color {
        Color { r: v.x, g: v.y, b: v.z }
    }
}

impl Color {
    /// Creates a color with red, green and blue values.
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// Creates a gray with all three channels set to `v`.
    pub fn gray(v: f64) -> Color {
        Color { r: v, g: v, b: v }
    }

    /// The color black. Also the background of every render.
    pub fn black() -> Color {
        Color {
            r: 0.0,
            g: 0.0,
            b: 0.0
        }
    }

    /// The color white.
    pub fn white() -> Color {
        Color {
            r: 1.0,
            g: 1.0,
            b: 1.0
        }
    }

    /// Computes the Hadamard (component-wise) product of two colors.
    ///
    /// This is how a surface coefficient filters the color of a light: each
    /// channel of `c1` scales the same channel of `c2`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use phong_tracer::color::Color;
    /// let yellow = Color::rgb(1.0, 1.0, 0.0);
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// assert_eq!(Color::hadamard(&yellow, &purple), Color::rgb(1.0, 0.0, 0.0));
    /// ```
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        let r = c1.r * c2.r;
        let g = c1.g * c2.g;
        let b = c1.b * c2.b;

        Color { r, g, b }
    }

    /// Caps every channel at `1.0`.
    ///
    /// Shading terms are never negative, so only the upper bound is enforced.
    pub fn clamped(&self) -> Color {
        Color {
            r: self.r.min(1.0),
            g: self.g.min(1.0),
            b: self.b.min(1.0),
        }
    }

    /// Converts the color to 8-bit channels, scaling by 255.
    pub fn to_rgb8(&self) -> [u8; 3] {
        let scale = |c: f64| (c * 255.0).clamp(0.0, 255.0) as u8;
        [scale(self.r), scale(self.g), scale(self.b)]
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl AddAssign<Color> for Color {
    fn add_assign(&mut self, other: Color) {
        self.r += other.r;
        self.g += other.g;
        self.b += other.b;
    }
}

/// Multiplies a color by a scalar.
impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Self::Output {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

/// Divides every channel by a scalar. Used for light attenuation.
impl Div<f64> for Color {
    type Output = Color;

    fn div(self, other: f64) -> Self::Output {
        Color {
            r: self.r / other,
            g: self.g / other,
            b: self.b / other,
        }
    }
}

/// Multiplies a color by a color.
///
/// For colors `c1` and `c2`, `c1 * c2` is shorthand for
/// `Color::hadamard(&c1, &c2)`.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color::hadamard(&self, &other)
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn multiply_color_by_scalar() {
    let c = Color::rgb(0.2, 0.3, 0.4);

    assert_eq!(c * 2.0, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(c / 2.0, Color::rgb(0.1, 0.15, 0.2));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
}

#[test]
fn clamp_caps_each_channel_independently() {
    let c = Color::rgb(3.5, 0.25, 1.0);

    assert_eq!(c.clamped(), Color::rgb(1.0, 0.25, 1.0));
}

#[test]
fn eight_bit_conversion_saturates() {
    assert_eq!(Color::rgb(1.0, 0.5, 0.0).to_rgb8(), [255, 127, 0]);
    assert_eq!(Color::rgb(2.0, -1.0, 0.0).to_rgb8(), [255, 0, 0]);
}

#[test]
fn color_from_short_vector() {
    let v = vec![0.5, 0.25];

    assert_eq!(Color::from(&v), Color::rgb(0.5, 0.25, 0.0));
}
