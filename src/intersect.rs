use crate::ray::Ray;
use crate::shape::Shape;

/// An intersection.
///
/// This structure assumes that some ray produced an intersection. Parameter `t`
/// is analogous to `t` for a ray (the offset from the ray origin), and `what`
/// borrows the shape that was struck.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
}

/// Implements partial equality on an Intersection.
///
/// Two Intersection structures are equal if the offsets `t` of the
/// intersections are equivalent, and if the underlying *pointers* of the
/// intersections are equivalent. Two identical shapes at different places in
/// a scene are different hits.
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

/// The nearest intersection along a ray.
pub type Hit<'a> = Intersection<'a>;

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what }
    }
}

/// Finds the closest shape struck by a ray.
///
/// Every shape is tested (there is no acceleration structure). The hit with
/// the smallest strictly positive `t` wins; on a tie the shape that comes
/// first in `shapes` is kept.
pub fn nearest_hit<'a, I>(shapes: I, r: &Ray) -> Option<Hit<'a>>
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut nearest: Option<Intersection<'a>> = None;

    for shape in shapes {
        if let Some(t) = shape.intersect(r) {
            match nearest {
                Some(ref hit) if hit.t <= t => {},
                _ => nearest = Some(Intersection::new(t, shape)),
            }
        }
    }

    nearest
}

#[cfg(test)]
use glam::DVec3;

#[cfg(test)]
use crate::transform::translation;

#[test]
fn nothing_to_hit() {
    let r = Ray::new(DVec3::ZERO, DVec3::Z);
    let shapes: Vec<Shape> = Vec::new();

    assert_eq!(nearest_hit(&shapes, &r), None);
}

#[test]
fn closest_shape_wins_regardless_of_order() {
    let shapes = vec![
        Shape::unit_sphere().with_transform(translation(0.0, 0.0, 10.0)),
        Shape::unit_sphere(),
    ];
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z);

    let hit = nearest_hit(&shapes, &r).unwrap();
    assert_eq!(hit, Intersection::new(4.0, &shapes[1]));
}

#[test]
fn ties_go_to_the_first_shape() {
    let shapes = vec![Shape::unit_sphere(), Shape::unit_sphere()];
    let r = Ray::new(DVec3::new(0.0, 0.0, -5.0), DVec3::Z);

    let hit = nearest_hit(&shapes, &r).unwrap();
    assert!(std::ptr::eq(hit.what, &shapes[0]));
    assert_ne!(hit, Intersection::new(4.0, &shapes[1]));
}

#[test]
fn shapes_behind_the_origin_are_ignored() {
    let shapes = vec![
        Shape::unit_sphere().with_transform(translation(0.0, 0.0, -10.0)),
        Shape::unit_sphere().with_transform(translation(0.0, 0.0, 10.0)),
    ];
    let r = Ray::new(DVec3::ZERO, DVec3::Z);

    let hit = nearest_hit(&shapes, &r).unwrap();
    assert_eq!(hit.t, 9.0);
    assert!(std::ptr::eq(hit.what, &shapes[1]));
}
