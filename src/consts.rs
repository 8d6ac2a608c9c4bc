// Scene defaults, used when a scene description leaves a value out
pub const DEFAULT_MAX_DEPTH: u32 = 5;
pub const DEFAULT_OUT_FILE: &'static str = "output.png";
pub const DEFAULT_AMBIENT: f64 = 0.2;
pub const DEFAULT_ATTENUATION: [f64; 3] = [1.0, 0.0, 0.0];

// Offsets applied to secondary ray origins to avoid self-intersection
pub const SHADOW_EPSILON: f64 = 0.01;
pub const REFLECTION_EPSILON: f64 = 0.001;

// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// PPM lines are wrapped before this column
pub const PPM_LINE_WIDTH: usize = 70;
