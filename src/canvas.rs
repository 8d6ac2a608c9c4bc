use std::io;
use std::io::{ BufWriter, Write };
use std::fs::File;
use std::path::Path;

use image::{ Rgb, RgbImage };
use log::info;

use crate::color::Color;
use crate::consts::PPM_LINE_WIDTH;
use crate::error::{ Error, Result };

/// A canvas for drawing pixels.
///
/// This structure stores the results of the ray tracer. Once the user
/// specifies the desired image width and height, the `Camera` generates rays
/// which are cast onto a `World`'s shapes, and every pixel is written exactly
/// once.
///
/// Row `0` of the canvas is the *bottom* of the picture, the way the camera
/// produces it. The encoders flip rows so files come out top row first.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened vector.
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a new, black canvas with specified width and height.
    ///
    /// This function allocates a `Vec<Color>` of size `width * height`, which
    /// may take up a decent amount of memory, depending on image size.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `y` is the row of the pixel, and `x`
    /// is the column. Rows and columns are zero-indexed.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use phong_tracer::color::Color;
    /// # use phong_tracer::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        // Silently ignore out-of-bounds pixels
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Writes a whole column, starting at row 0. Colors past the bottom of
    /// the canvas are ignored.
    pub fn write_column(&mut self, x: usize, column: &[Color]) {
        for (y, pixel) in column.iter().enumerate() {
            self.write_pixel(x, y, pixel);
        }
    }

    /// Reads a color from a location on the `Canvas`.
    ///
    /// If the specified pixel location is out-of-bounds, `None` is returned
    /// by this function.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        // Return nothing if pixel is out-of-bounds
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Iterates over the rows in file order: top of the picture first.
    fn file_rows(&self) -> impl Iterator<Item = &[Color]> + '_ {
        self.pixels.chunks(self.width.max(1)).rev()
    }

    /// Writes the canvas as a plain (P3) PPM image.
    ///
    /// Lines are kept under 70 columns. If a value would cross the 70 column
    /// mark, it is moved to the next line. Every picture row starts on a new
    /// line.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        // Write PPM header, as well as metadata
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?; // Maximum color value

        for row in self.file_rows() {
            let mut col = 0;

            for value in row.iter().flat_map(|p| p.to_rgb8()) {
                let s = value.to_string();

                if col == 0 {
                    write!(out, "{}", s)?;
                    col = s.len();
                } else if col + 1 + s.len() > PPM_LINE_WIDTH {
                    write!(out, "\n{}", s)?;
                    col = s.len();
                } else {
                    write!(out, " {}", s)?;
                    col += 1 + s.len();
                }
            }

            writeln!(out)?;
        }

        Ok(())
    }

    /// Converts the canvas into an 8-bit RGB image, top row first.
    pub fn to_image(&self) -> RgbImage {
        let height = self.height as u32;

        RgbImage::from_fn(self.width as u32, height, |x, y| {
            let pixel = self.read_pixel(x as usize, (height - 1 - y) as usize)
                .unwrap_or_default();
            Rgb(pixel.to_rgb8())
        })
    }

    /// Saves a canvas to an image file.
    ///
    /// The format is picked from the extension: `.png` or `.ppm`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let extension = path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("png") => self.to_image().save(path)?,
            Some("ppm") => {
                let mut out = BufWriter::new(File::create(path)?);
                self.write_ppm(&mut out)?;
                out.flush()?;
            },
            _ => return Err(Error::UnsupportedFormat(path.display().to_string())),
        }

        info!("Saved {}x{} render to {}", self.width, self.height,
            path.display());
        Ok(())
    }
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.width, 10);
    assert_eq!(c.height, 20);
    assert_eq!(c.read_pixel(9, 19), Some(Color::black()));
    assert_eq!(c.read_pixel(10, 0), None);
}

#[test]
fn write_column_fills_rows_from_zero() {
    let mut c = Canvas::new(3, 2);
    c.write_column(1, &[Color::white(), Color::gray(0.5), Color::white()]);

    assert_eq!(c.read_pixel(1, 0), Some(Color::white()));
    assert_eq!(c.read_pixel(1, 1), Some(Color::gray(0.5)));
    assert_eq!(c.read_pixel(0, 0), Some(Color::black()));
}

#[test]
fn ppm_header_and_flipped_rows() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(0, 0, &Color::rgb(1.0, 0.0, 0.0));
    c.write_pixel(1, 1, &Color::rgb(0.0, 0.0, 1.0));

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let expected = "P3\n2 2\n255\n0 0 0 0 0 255\n255 0 0 0 0 0\n";
    assert_eq!(text, expected);
}

#[test]
fn ppm_lines_wrap_before_70_columns() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[3],
        "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204");
    assert_eq!(lines[4], "153 255 204 153 255 204 153 255 204 153 255 204 153");
    assert!(lines.iter().all(|l| l.len() <= 70));
    assert!(text.ends_with('\n'));
}

#[test]
fn image_rows_are_flipped() {
    let mut c = Canvas::new(1, 2);
    c.write_pixel(0, 0, &Color::white());

    let img = c.to_image();
    assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    assert_eq!(img.get_pixel(0, 1), &Rgb([255, 255, 255]));
}

#[test]
fn unknown_extension_is_rejected() {
    let c = Canvas::new(1, 1);

    match c.save("render.bmpx") {
        Err(Error::UnsupportedFormat(name)) => assert_eq!(name, "render.bmpx"),
        other => panic!("unexpected result: {:?}", other),
    }
}
