use std::fs;
use std::convert::TryFrom;
use std::path::{ Path, PathBuf };

use glam::{ DMat4, DVec3 };
use log::info;
use serde::Deserialize;

use crate::parser;
use crate::color::Color;
use crate::shape::Shape;
use crate::world::World;
use crate::camera::Camera;
use crate::light::{ Attenuation, Light, Material };
use crate::consts::{ DEFAULT_MAX_DEPTH, DEFAULT_OUT_FILE };
use crate::error::{ Error, Result };
use crate::transform::{ rotation, scaling, translation, up_vector };

/// Everything needed to render one picture: what to draw, where to look from,
/// and where the result goes.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub world: World,
    pub camera: Camera,
    pub output: PathBuf,
}

impl Scene {
    /// Loads a scene file.
    ///
    /// Files ending in `.json` are read as JSON scenes (see `SceneJson`); any
    /// other file is read as a command-format scene (see
    /// `parser::SceneParser`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
        let path = path.as_ref();
        let is_json = path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("json"));

        let scene = if is_json {
            Scene::from_json_str(&fs::read_to_string(path)?)?
        } else {
            parser::parse_file(path)?
        };

        info!("Loaded {}: {}x{}, {} shapes, {} lights", path.display(),
            scene.camera.width, scene.camera.height,
            scene.world.shapes.len(), scene.world.lights.len());

        Ok(scene)
    }

    /// Reads a JSON scene from a string.
    pub fn from_json_str(s: &str) -> Result<Scene> {
        let scene_json: SceneJson = serde_json::from_str(s)?;
        Scene::try_from(scene_json)
    }
}

impl TryFrom<SceneJson> for Scene {
    type Error = Error;

    fn try_from(scene_json: SceneJson) -> Result<Scene> {
        let cam = scene_json.camera;
        if cam.fov_y <= 0.0 || cam.fov_y >= 180.0 {
            return Err(Error::Invalid(
                format!("field of view {} is not between 0 and 180 degrees",
                    cam.fov_y)));
        }

        if scene_json.width == 0 || scene_json.height == 0 {
            return Err(Error::Invalid("image size must be positive".into()));
        }

        // Create the camera from the view parameters.
        let eye = DVec3::from(cam.eye);
        let center = DVec3::from(cam.center);
        let camera = Camera::new(
            scene_json.width,
            scene_json.height,
            eye,
            center,
            up_vector(DVec3::from(cam.up), center - eye),
            cam.fov_y.to_radians(),
        );

        // Create the world.
        let mut world = World::new();
        world.max_depth = scene_json.max_depth;
        if let Some([c0, c1, c2]) = scene_json.attenuation {
            world.attenuation = Attenuation::new(c0, c1, c2);
        }

        world.lights = scene_json.lights.into_iter()
            .map(Light::try_from)
            .collect::<Result<_>>()?;
        world.shapes = scene_json.shapes.into_iter()
            .map(Shape::try_from)
            .collect::<Result<_>>()?;

        let output = scene_json.output
            .unwrap_or_else(|| DEFAULT_OUT_FILE.into())
            .into();

        Ok(Scene { world, camera, output })
    }
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

/// The JSON form of a scene.
///
/// Angles are in degrees. Colors and vectors are `[x, y, z]` arrays.
#[derive(Clone, Debug, Deserialize)]
pub struct SceneJson {
    width: usize,
    height: usize,

    #[serde(default = "default_max_depth")]
    max_depth: u32,
    #[serde(default)]
    output: Option<String>,

    camera: CameraJson,
    #[serde(default)]
    attenuation: Option<[f64; 3]>,

    #[serde(default)]
    lights: Vec<LightJson>,
    #[serde(default)]
    shapes: Vec<ShapeJson>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CameraJson {
    eye: [f64; 3],
    center: [f64; 3],
    up: [f64; 3],
    fov_y: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LightJson {
    #[serde(rename = "type")]
    ty: String,
    position: [f64; 3],
    color: [f64; 3],
}

impl TryFrom<LightJson> for Light {
    type Error = Error;

    fn try_from(light_json: LightJson) -> Result<Light> {
        let position = DVec3::from(light_json.position);
        let color = Color::from(DVec3::from(light_json.color));

        match light_json.ty.as_str() {
            "directional" if position == DVec3::ZERO => Err(Error::Invalid(
                "directional light has a zero direction".into())),
            "directional" => Ok(Light::directional(position, color)),
            "point" => Ok(Light::point(position, color)),
            _ => Err(Error::UnknownLight(light_json.ty)),
        }
    }
}

/// One step of a shape's transform list.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformJson {
    Translate([f64; 3]),
    Scale([f64; 3]),
    Rotate { axis: [f64; 3], degrees: f64 },
}

impl From<&TransformJson> for DMat4 {
    fn from(t: &TransformJson) -> DMat4 {
        match *t {
            TransformJson::Translate([x, y, z]) => translation(x, y, z),
            TransformJson::Scale([x, y, z]) => scaling(x, y, z),
            TransformJson::Rotate { axis, degrees }
                => rotation(DVec3::from(axis), degrees),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ShapeJson {
    #[serde(rename = "type")]
    ty: String,

    // Sphere
    center: Option<[f64; 3]>,
    radius: Option<f64>,

    // Triangle
    vertices: Option<[[f64; 3]; 3]>,

    ambient: Option<[f64; 3]>,
    diffuse: Option<[f64; 3]>,
    specular: Option<[f64; 3]>,
    emission: Option<[f64; 3]>,
    shininess: Option<f64>,

    /// Composed the way the command format composes them: each entry is
    /// right-multiplied, so the last entry is applied to the shape first.
    #[serde(default)]
    transforms: Vec<TransformJson>,
}

impl ShapeJson {
    fn material(&self) -> Material {
        let color = |c: Option<[f64; 3]>, default: Color| {
            c.map_or(default, |c| Color::from(DVec3::from(c)))
        };
        let defaults = Material::default();

        Material {
            ambient: color(self.ambient, defaults.ambient),
            diffuse: color(self.diffuse, defaults.diffuse),
            specular: color(self.specular, defaults.specular),
            emission: color(self.emission, defaults.emission),
            shininess: self.shininess.unwrap_or(defaults.shininess),
        }
    }

    fn missing(&self, field: &str) -> Error {
        Error::Invalid(format!("{} shape is missing `{}`", self.ty, field))
    }
}

impl TryFrom<ShapeJson> for Shape {
    type Error = Error;

    fn try_from(shape_json: ShapeJson) -> Result<Shape> {
        let shape = match shape_json.ty.as_str() {
            "sphere" => {
                let center = shape_json.center
                    .ok_or_else(|| shape_json.missing("center"))?;
                let radius = shape_json.radius
                    .ok_or_else(|| shape_json.missing("radius"))?;

                Shape::sphere(DVec3::from(center), radius)
            },
            "triangle" => {
                let [p1, p2, p3] = shape_json.vertices
                    .ok_or_else(|| shape_json.missing("vertices"))?;

                Shape::triangle(DVec3::from(p1), DVec3::from(p2), DVec3::from(p3))
            },
            _ => return Err(Error::UnknownShape(shape_json.ty)),
        };

        let transform = shape_json.transforms.iter()
            .fold(DMat4::IDENTITY, |acc, t| acc * DMat4::from(t));

        Ok(shape
            .with_transform(transform)
            .with_material(shape_json.material()))
    }
}

#[test]
fn json_and_command_formats_agree() {
    let json = Scene::load("./scenes/one-sphere.json").unwrap();
    let commands = Scene::load("./scenes/one-sphere.test").unwrap();

    assert_eq!(json, commands);
}

#[test]
fn json_transforms_compose_like_commands() {
    let json = Scene::from_json_str(r#"{
        "width": 2, "height": 2,
        "camera": { "eye": [0, 0, 5], "center": [0, 0, 0], "up": [0, 1, 0], "fov_y": 60 },
        "shapes": [{
            "type": "triangle",
            "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
            "transforms": [
                { "translate": [0, 0, -5] },
                { "rotate": { "axis": [0, 1, 0], "degrees": 90 } },
                { "scale": [2, 1, 1] }
            ]
        }]
    }"#).unwrap();

    let commands = parser::parse_str("\
        size 2 2
        camera 0 0 5 0 0 0 0 1 0 60
        vertex 0 0 0
        vertex 1 0 0
        vertex 0 1 0
        translate 0 0 -5
        rotate 0 1 0 90
        scale 2 1 1
        tri 0 1 2
    ").unwrap();

    assert_eq!(json, commands);
    assert_eq!(json.world.max_depth, 5);
    assert_eq!(json.output, PathBuf::from("output.png"));
}

#[test]
fn unknown_types_are_rejected() {
    let base = |shape: &str, light: &str| format!(r#"{{
        "width": 2, "height": 2,
        "camera": {{ "eye": [0, 0, 5], "center": [0, 0, 0], "up": [0, 1, 0], "fov_y": 60 }},
        "lights": [{{ "type": "{}", "position": [0, 0, 1], "color": [1, 1, 1] }}],
        "shapes": [{{ "type": "{}", "center": [0, 0, 0], "radius": 1 }}]
    }}"#, light, shape);

    assert!(Scene::from_json_str(&base("sphere", "point")).is_ok());
    assert!(matches!(Scene::from_json_str(&base("cube", "point")),
        Err(Error::UnknownShape(ref s)) if s == "cube"));
    assert!(matches!(Scene::from_json_str(&base("sphere", "spot")),
        Err(Error::UnknownLight(ref s)) if s == "spot"));
}

#[test]
fn incomplete_sphere_is_invalid() {
    let result = Scene::from_json_str(r#"{
        "width": 2, "height": 2,
        "camera": { "eye": [0, 0, 5], "center": [0, 0, 0], "up": [0, 1, 0], "fov_y": 60 },
        "shapes": [{ "type": "sphere", "center": [0, 0, 0] }]
    }"#);

    assert!(matches!(result, Err(Error::Invalid(_))));
}

#[test]
fn zero_light_direction_is_invalid() {
    let result = Scene::from_json_str(r#"{
        "width": 2, "height": 2,
        "camera": { "eye": [0, 0, 5], "center": [0, 0, 0], "up": [0, 1, 0], "fov_y": 60 },
        "lights": [{ "type": "directional", "position": [0, 0, 0], "color": [1, 1, 1] }]
    }"#);

    assert!(matches!(result, Err(Error::Invalid(_))));
}

#[test]
fn malformed_json_is_an_error() {
    assert!(matches!(Scene::from_json_str("{ \"width\": "), Err(Error::Json(_))));
}

#[test]
fn demo_scene_loads() {
    let scene = Scene::load("./scenes/mirrors.test").unwrap();

    assert_eq!(scene.world.shapes.len(), 5);
    assert_eq!(scene.world.lights.len(), 2);
    assert_eq!(scene.world.max_depth, 4);
    assert_eq!(scene.output, PathBuf::from("mirrors.png"));
}
