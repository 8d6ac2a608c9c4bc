use std::fs;
use std::path::{ Path, PathBuf };

use glam::{ DMat4, DVec3 };
use log::{ debug, warn };

use crate::color::Color;
use crate::shape::Shape;
use crate::world::World;
use crate::camera::Camera;
use crate::scene::Scene;
use crate::light::{ Attenuation, Light, Material };
use crate::consts::DEFAULT_OUT_FILE;
use crate::error::{ Error, Result };
use crate::transform::{ rotation, scaling, translation, up_vector };

/// The viewing parameters of a `camera` command, held until the image size
/// is known.
#[derive(Copy, Clone, Debug, PartialEq)]
struct View {
    eye: DVec3,
    center: DVec3,
    up: DVec3,
    fov_y: f64,
}

/// A parser for command-format scene files.
///
/// A scene file holds one command per line:
///
/// ```text
/// # A red sphere, lit from the upper left
/// size 640 480
/// camera 0 0 5  0 0 0  0 1 0  45
/// directional -1 1 1  1 1 1
///
/// diffuse 0.8 0.1 0.1
/// pushTransform
/// translate 0 0.5 0
/// sphere 0 0 0 1
/// popTransform
/// ```
///
/// The first word of each line names a command, and the words after it are
/// its arguments. Blank lines and lines starting with `#` are skipped.
///
/// Material commands (`ambient`, `diffuse`, `specular`, `emission`,
/// `shininess`) and transform commands (`translate`, `scale`, `rotate`) change
/// state that every *later* shape picks up. Transforms are right-multiplied
/// onto the top of a stack, so within one block the transform written last is
/// applied to a shape first. `pushTransform` saves the top of the stack and
/// `popTransform` restores it.
///
/// Unknown commands are logged and skipped. Each skipped command increments
/// `ignored_lines` by 1.
#[derive(Clone, Debug)]
pub struct SceneParser {
    pub ignored_lines: usize,
    pub vertices: Vec<DVec3>,
    pub world: World,
    pub output: Option<PathBuf>,

    size: Option<(usize, usize)>,
    view: Option<View>,
    material: Material,
    stack: Vec<DMat4>,
    line: usize,
}

impl Default for SceneParser {
    fn default() -> SceneParser {
        SceneParser {
            ignored_lines: 0,
            vertices: Vec::new(),
            world: World::new(),
            output: None,

            size: None,
            view: None,
            material: Default::default(),
            stack: vec![DMat4::IDENTITY],
            line: 0,
        }
    }
}

impl SceneParser {
    pub fn new() -> SceneParser {
        Default::default()
    }

    /// Parses the scene file at `path`.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.parse_str(&text)
    }

    /// Parses scene commands from a string. Line numbers in errors count from
    /// the first line of `text`.
    pub fn parse_str(&mut self, text: &str) -> Result<()> {
        for (i, line) in text.lines().enumerate() {
            self.line = i + 1;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let params: Vec<&str> = line.split_whitespace().collect();
            self.handle_command(params[0], &params[1..])?;
        }

        debug!("Parsed {} shapes, {} lights and {} vertices ({} lines ignored)",
            self.world.shapes.len(), self.world.lights.len(),
            self.vertices.len(), self.ignored_lines);

        Ok(())
    }

    /// Builds the scene from everything parsed so far.
    ///
    /// Fails if no `size` or `camera` command was seen.
    pub fn finish(self) -> Result<Scene> {
        let (width, height) = self.size.ok_or(Error::MissingCommand("size"))?;
        let view = self.view.ok_or(Error::MissingCommand("camera"))?;

        let camera = Camera::new(width, height, view.eye, view.center, view.up,
            view.fov_y);
        let output = self.output.unwrap_or_else(|| DEFAULT_OUT_FILE.into());

        Ok(Scene { world: self.world, camera, output })
    }

    fn handle_command(&mut self, command: &str, args: &[&str]) -> Result<()> {
        match command {
            "size" => {
                let a = self.numbers(command, args, 2)?;
                if a[0] < 1.0 || a[1] < 1.0 {
                    return Err(self.error("image size must be positive"));
                }

                self.size = Some((a[0] as usize, a[1] as usize));
            },

            "maxdepth" => {
                let a = self.numbers(command, args, 1)?;
                if a[0] < 0.0 {
                    return Err(self.error("maxdepth must not be negative"));
                }

                self.world.max_depth = a[0] as u32;
            },

            "output" => {
                let path = args.first().ok_or_else(|| self.missing(command, 1, 0))?;
                self.output = Some(PathBuf::from(*path));
            },

            "camera" => {
                let a = self.numbers(command, args, 10)?;
                let eye = DVec3::new(a[0], a[1], a[2]);
                let center = DVec3::new(a[3], a[4], a[5]);
                let up = DVec3::new(a[6], a[7], a[8]);

                if a[9] <= 0.0 || a[9] >= 180.0 {
                    return Err(self.error("field of view must lie between 0 and 180 degrees"));
                }

                self.view = Some(View {
                    eye, center,
                    up: up_vector(up, center - eye),
                    fov_y: a[9].to_radians(),
                });
            },

            "attenuation" => {
                let a = self.numbers(command, args, 3)?;
                self.world.attenuation = Attenuation::new(a[0], a[1], a[2]);
            },

            // Vertex buffers grow as needed.
            "maxverts" => {},

            "vertex" => {
                let a = self.numbers(command, args, 3)?;
                self.vertices.push(DVec3::new(a[0], a[1], a[2]));
            },

            "tri" => {
                let a = self.numbers(command, args, 3)?;
                let p1 = self.vertex(a[0])?;
                let p2 = self.vertex(a[1])?;
                let p3 = self.vertex(a[2])?;

                let shape = Shape::triangle(p1, p2, p3);
                self.add_shape(shape);
            },

            "sphere" => {
                let a = self.numbers(command, args, 4)?;
                let shape = Shape::sphere(DVec3::new(a[0], a[1], a[2]), a[3]);
                self.add_shape(shape);
            },

            "translate" => {
                let a = self.numbers(command, args, 3)?;
                self.right_multiply(translation(a[0], a[1], a[2]));
            },

            "scale" => {
                let a = self.numbers(command, args, 3)?;
                self.right_multiply(scaling(a[0], a[1], a[2]));
            },

            "rotate" => {
                let a = self.numbers(command, args, 4)?;
                self.right_multiply(rotation(DVec3::new(a[0], a[1], a[2]), a[3]));
            },

            "pushTransform" => {
                let top = self.top();
                self.stack.push(top);
            },

            "popTransform" => {
                // The base matrix is never popped.
                if self.stack.len() < 2 {
                    return Err(Error::EmptyTransformStack { line: self.line });
                }

                self.stack.pop();
            },

            "directional" => {
                let a = self.numbers(command, args, 6)?;
                let direction = DVec3::new(a[0], a[1], a[2]);
                if direction == DVec3::ZERO {
                    return Err(self.error("directional light needs a nonzero direction"));
                }

                self.world.lights.push(Light::directional(
                    direction,
                    Color::rgb(a[3], a[4], a[5]),
                ));
            },

            "point" => {
                let a = self.numbers(command, args, 6)?;
                self.world.lights.push(Light::point(
                    DVec3::new(a[0], a[1], a[2]),
                    Color::rgb(a[3], a[4], a[5]),
                ));
            },

            "ambient" => self.material.ambient = self.color(command, args)?,
            "diffuse" => self.material.diffuse = self.color(command, args)?,
            "specular" => self.material.specular = self.color(command, args)?,
            "emission" => self.material.emission = self.color(command, args)?,

            "shininess" => {
                let a = self.numbers(command, args, 1)?;
                self.material.shininess = a[0];
            },

            // If this line has an unrecognized command, ignore it.
            _ => {
                warn!("line {}: unknown command `{}` ignored", self.line, command);
                self.ignored_lines += 1;
            },
        }

        Ok(())
    }

    fn add_shape(&mut self, shape: Shape) {
        let shape = shape
            .with_transform(self.top())
            .with_material(self.material);

        self.world.shapes.push(shape);
    }

    fn top(&self) -> DMat4 {
        self.stack.last().copied().unwrap_or(DMat4::IDENTITY)
    }

    fn right_multiply(&mut self, m: DMat4) {
        if let Some(top) = self.stack.last_mut() {
            *top = *top * m;
        }
    }

    /// Looks up a vertex by its 0-based index, given as a parsed number.
    fn vertex(&self, index: f64) -> Result<DVec3> {
        let count = self.vertices.len();
        let out_of_range = Error::VertexIndex {
            line: self.line,
            index: index as i64,
            count,
        };

        if index < 0.0 || index.fract() != 0.0 {
            return Err(out_of_range);
        }

        self.vertices.get(index as usize).copied().ok_or(out_of_range)
    }

    /// Parses the first `expected` arguments of a command as numbers.
    fn numbers(&self, command: &str, args: &[&str], expected: usize)
        -> Result<Vec<f64>> {
        if args.len() < expected {
            return Err(self.missing(command, expected, args.len()));
        }

        args[..expected].iter()
            .map(|arg| arg.parse::<f64>().map_err(|_| self.error(&format!(
                "`{}` is not a valid number for `{}`", arg, command))))
            .collect()
    }

    fn color(&self, command: &str, args: &[&str]) -> Result<Color> {
        let a = self.numbers(command, args, 3)?;
        Ok(Color::from(&a))
    }

    fn missing(&self, command: &str, expected: usize, found: usize) -> Error {
        Error::MissingArgument {
            line: self.line,
            command: command.into(),
            expected,
            found,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse { line: self.line, message: message.into() }
    }
}

/// Parses a command-format scene from a string.
pub fn parse_str(text: &str) -> Result<Scene> {
    let mut parser = SceneParser::new();
    parser.parse_str(text)?;
    parser.finish()
}

/// Parses a command-format scene file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let mut parser = SceneParser::new();
    parser.parse_file(path)?;
    parser.finish()
}

#[cfg(test)]
fn close(a: DVec3, b: DVec3) -> bool {
    (a - b).length() < 1e-9
}

#[test]
fn ignoring_unrecognized_lines() {
    let mut parser = SceneParser::new();
    parser.parse_file("./scenes/gibberish.test").unwrap();

    assert_eq!(parser.ignored_lines, 3);
    assert_eq!(parser.world.shapes.len(), 1);
}

#[test]
fn parsing_a_scene_file() {
    let scene = parse_file("./scenes/one-sphere.test").unwrap();

    assert_eq!(scene.camera.width, 64);
    assert_eq!(scene.camera.height, 48);
    assert_eq!(scene.output, PathBuf::from("one-sphere.png"));
    assert_eq!(scene.world.max_depth, 3);
    assert_eq!(scene.world.shapes.len(), 1);
    assert_eq!(scene.world.lights.len(), 1);
    assert_eq!(scene.world.shapes[0].material.diffuse, Color::rgb(0.8, 0.1, 0.1));
}

#[test]
fn defaults_when_unspecified() {
    let scene = parse_str("size 4 3\ncamera 0 0 5 0 0 0 0 1 0 45\n").unwrap();

    assert_eq!(scene.output, PathBuf::from("output.png"));
    assert_eq!(scene.world.max_depth, 5);
    assert_eq!(scene.world.attenuation, Attenuation::new(1.0, 0.0, 0.0));
    assert!((scene.camera.fov_y - std::f64::consts::PI / 4.0).abs() < 1e-12);
    assert!(close(scene.camera.up, DVec3::new(0.0, -1.0, 0.0)));
}

#[test]
fn material_state_applies_to_later_shapes() {
    let mut parser = SceneParser::new();
    parser.parse_str("\
        sphere 0 0 0 1
        ambient 0 0 0
        diffuse 1 0.5 0
        specular 0.3 0.3 0.3
        emission 0 0 1
        shininess 20
        sphere 0 0 0 1
    ").unwrap();

    let first = parser.world.shapes[0].material;
    let second = parser.world.shapes[1].material;

    assert_eq!(first, Material::default());
    assert_eq!(second.ambient, Color::black());
    assert_eq!(second.diffuse, Color::rgb(1.0, 0.5, 0.0));
    assert_eq!(second.specular, Color::gray(0.3));
    assert_eq!(second.emission, Color::rgb(0.0, 0.0, 1.0));
    assert_eq!(second.shininess, 20.0);
}

#[test]
fn triangles_keep_file_winding() {
    let mut parser = SceneParser::new();
    parser.parse_str("\
        maxverts 3
        vertex -1 -1 0
        vertex 1 -1 0
        vertex 0 1 0
        tri 0 1 2
    ").unwrap();

    let ti = *parser.world.shapes[0].triangle_info().unwrap();
    assert_eq!(ti.p1, parser.vertices[0]);
    assert_eq!(ti.p2, parser.vertices[1]);
    assert_eq!(ti.p3, parser.vertices[2]);
    assert!(close(ti.normal, DVec3::Z));
}

#[test]
fn push_and_pop_transforms() {
    let mut parser = SceneParser::new();
    parser.parse_str("\
        translate 1 0 0
        pushTransform
        scale 2 2 2
        sphere 0 0 0 1
        popTransform
        sphere 0 0 0 1
    ").unwrap();

    let scaled = parser.world.shapes[0].transform()
        .transform_point3(DVec3::new(1.0, 0.0, 0.0));
    let unscaled = parser.world.shapes[1].transform()
        .transform_point3(DVec3::new(1.0, 0.0, 0.0));

    assert!(close(scaled, DVec3::new(3.0, 0.0, 0.0)));
    assert!(close(unscaled, DVec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn last_transform_applies_first() {
    let mut parser = SceneParser::new();
    parser.parse_str("\
        translate 0 0 -5
        rotate 0 1 0 90
        scale 2 1 1
        sphere 0 0 0 1
    ").unwrap();

    // Scale (2, 0, 0), rotate about Y onto (0, 0, -2), then translate.
    let p = parser.world.shapes[0].transform()
        .transform_point3(DVec3::new(1.0, 0.0, 0.0));
    assert!(close(p, DVec3::new(0.0, 0.0, -7.0)));
}

#[test]
fn lights_are_recorded_in_order() {
    let mut parser = SceneParser::new();
    parser.parse_str("\
        attenuation 0 0 1
        point 0 4 0 1 1 1
        directional 0 0 2 0.5 0.5 0.5
    ").unwrap();

    assert_eq!(parser.world.attenuation, Attenuation::new(0.0, 0.0, 1.0));
    assert_eq!(parser.world.lights[0],
        Light::point(DVec3::new(0.0, 4.0, 0.0), Color::white()));
    assert_eq!(parser.world.lights[1],
        Light::directional(DVec3::Z, Color::gray(0.5)));
}

#[test]
fn bad_number_reports_line() {
    let mut parser = SceneParser::new();
    let err = parser.parse_str("size 4 3\n\nsphere 0 zero 0 1\n").unwrap_err();

    match err {
        Error::Parse { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("zero"));
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn too_few_arguments() {
    let mut parser = SceneParser::new();
    let err = parser.parse_str("vertex 1 2\n").unwrap_err();

    match err {
        Error::MissingArgument { line, command, expected, found } => {
            assert_eq!((line, command.as_str(), expected, found), (1, "vertex", 3, 2));
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn vertex_index_out_of_range() {
    let mut parser = SceneParser::new();
    let err = parser.parse_str("vertex 0 0 0\nvertex 1 0 0\ntri 0 1 2\n")
        .unwrap_err();

    match err {
        Error::VertexIndex { line, index, count } => {
            assert_eq!((line, index, count), (3, 2, 2));
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn popping_the_base_transform() {
    let mut parser = SceneParser::new();
    let err = parser.parse_str("pushTransform\npopTransform\npopTransform\n")
        .unwrap_err();

    assert!(matches!(err, Error::EmptyTransformStack { line: 3 }));
}

#[test]
fn zero_light_direction() {
    let mut parser = SceneParser::new();
    let err = parser.parse_str("point 0 0 0 1 1 1\ndirectional 0 0 0 1 1 1\n")
        .unwrap_err();

    assert!(matches!(err, Error::Parse { line: 2, .. }));
    assert_eq!(parser.world.lights.len(), 1);
}

#[test]
fn missing_size_or_camera() {
    let err = parse_str("camera 0 0 5 0 0 0 0 1 0 45\n").unwrap_err();
    assert!(matches!(err, Error::MissingCommand("size")));

    let err = parse_str("size 10 10\n").unwrap_err();
    assert!(matches!(err, Error::MissingCommand("camera")));
}
