pub mod consts;
pub mod error;

pub mod transform;
pub mod ray;
pub mod light;

pub mod shape;
pub mod intersect;
pub mod world;
pub mod camera;
pub mod parallel;

pub mod color;
pub mod canvas;

pub mod parser;
pub mod scene;

use crate::consts::FEQ_EPSILON;

pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
