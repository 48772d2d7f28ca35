//! Glyph outline building
//!
//! A decoded [`GlyphOutline`] holds TrueType's compressed contour form:
//! on-curve points, off-curve quadratic control points, and implied
//! on-curve points between consecutive controls. [`GlyphOutline::walk`]
//! expands that into move/line/quad commands, and [`Polylines`] flattens
//! the commands into closed line strips ready for scan conversion.

use super::arena::FixedArena;
use super::BoundingBox;
use crate::{Result, TrueTypeError};

/// Line segments per quadratic curve.
///
/// Eight segments keep the chord error under half a pixel for curves that
/// span up to roughly 200 pixels.
pub const CURVE_SEGMENTS: usize = 8;

/// A point in font units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Arithmetic mean of two points
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Evaluate the quadratic Bezier `self -> ctrl -> to` at `t`
    pub fn quad_at(self, ctrl: Point, to: Point, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * mt * t;
        let c = t * t;
        Point::new(
            a * self.x + b * ctrl.x + c * to.x,
            a * self.y + b * ctrl.y + c * to.y,
        )
    }
}

/// A contour point with its curve flag
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutlinePoint {
    pub x: f32,
    pub y: f32,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub const fn on(x: f32, y: f32) -> Self {
        Self { x, y, on_curve: true }
    }

    pub const fn off(x: f32, y: f32) -> Self {
        Self { x, y, on_curve: false }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Glyph outline builder trait
pub trait OutlineBuilder {
    /// Move to point
    fn move_to(&mut self, x: f32, y: f32);
    /// Line to point
    fn line_to(&mut self, x: f32, y: f32);
    /// Quadratic bezier curve
    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32);
    /// Close path
    fn close(&mut self);
}

/// A decoded glyph: contour points in font units plus contour boundaries.
///
/// Storage is fixed when the outline is created; decoding more points or
/// contours than that fails with `Malformed`.
#[derive(Debug, Clone)]
pub struct GlyphOutline {
    points: FixedArena<OutlinePoint>,
    /// Exclusive end index of each contour in `points`
    contour_ends: FixedArena<usize>,
    bounds: Option<BoundingBox>,
}

impl GlyphOutline {
    pub fn with_capacity(max_points: usize, max_contours: usize) -> Self {
        Self {
            points: FixedArena::with_capacity(max_points),
            contour_ends: FixedArena::with_capacity(max_contours),
            bounds: None,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.contour_ends.clear();
        self.bounds = None;
    }

    pub fn push_point(&mut self, point: OutlinePoint) -> Result<usize> {
        self.points
            .alloc(point)
            .map_err(|_| TrueTypeError::Malformed("too many points in glyph"))
    }

    /// Close the current contour at the last pushed point
    pub fn end_contour(&mut self) -> Result<()> {
        let end = self.points.len();
        self.push_contour_end(end)
    }

    pub(crate) fn push_contour_end(&mut self, end: usize) -> Result<()> {
        self.contour_ends
            .alloc(end)
            .map(|_| ())
            .map_err(|_| TrueTypeError::Malformed("too many contours in glyph"))
    }

    /// Restore the outline to an earlier size
    pub fn points(&self) -> &[OutlinePoint] {
        self.points.as_slice()
    }

    pub(crate) fn points_mut(&mut self) -> &mut [OutlinePoint] {
        self.points.as_mut_slice()
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_contours(&self) -> usize {
        self.contour_ends.len()
    }

    pub fn point_capacity(&self) -> usize {
        self.points.capacity()
    }

    pub fn contour_capacity(&self) -> usize {
        self.contour_ends.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box from the glyph header
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub(crate) fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds = Some(bounds);
    }

    /// Iterate contours as point slices
    pub fn contours(&self) -> impl Iterator<Item = &[OutlinePoint]> + '_ {
        let points = self.points.as_slice();
        let mut start = 0;
        self.contour_ends.iter().map(move |&end| {
            let contour = &points[start.min(end)..end];
            start = end;
            contour
        })
    }

    /// Emit every contour as move/line/quad commands.
    ///
    /// Two consecutive off-curve points imply an on-curve point at their
    /// midpoint. A contour with no on-curve point at all starts at the
    /// midpoint of its last and first points.
    pub fn walk<B: OutlineBuilder>(&self, builder: &mut B) {
        for contour in self.contours() {
            walk_contour(contour, builder);
        }
    }
}

fn walk_contour<B: OutlineBuilder>(contour: &[OutlinePoint], builder: &mut B) {
    let Some((first, rest)) = contour.split_first() else {
        return;
    };
    let last = contour[contour.len() - 1];

    let (start, sequence) = if first.on_curve {
        (first.point(), rest)
    } else if last.on_curve {
        (last.point(), &contour[..contour.len() - 1])
    } else {
        (last.point().midpoint(first.point()), contour)
    };

    builder.move_to(start.x, start.y);
    let mut control: Option<Point> = None;
    for p in sequence {
        let pt = p.point();
        match (p.on_curve, control) {
            (true, Some(c)) => {
                builder.quad_to(c.x, c.y, pt.x, pt.y);
                control = None;
            }
            (true, None) => builder.line_to(pt.x, pt.y),
            (false, Some(c)) => {
                let mid = c.midpoint(pt);
                builder.quad_to(c.x, c.y, mid.x, mid.y);
                control = Some(pt);
            }
            (false, None) => control = Some(pt),
        }
    }
    match control {
        Some(c) => builder.quad_to(c.x, c.y, start.x, start.y),
        None => builder.line_to(start.x, start.y),
    }
    builder.close();
}

/// Flattened outline: closed polylines in font units
#[derive(Debug, Clone)]
pub struct Polylines {
    points: FixedArena<Point>,
    contour_ends: FixedArena<usize>,
    contour_start: usize,
    open: bool,
    overflowed: bool,
}

impl Polylines {
    pub fn with_capacity(max_points: usize, max_contours: usize) -> Self {
        Self {
            points: FixedArena::with_capacity(max_points),
            contour_ends: FixedArena::with_capacity(max_contours),
            contour_start: 0,
            open: false,
            overflowed: false,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.contour_ends.clear();
        self.contour_start = 0;
        self.open = false;
        self.overflowed = false;
    }

    /// Replace the contents with the flattened form of `outline`
    pub fn build_contours(&mut self, outline: &GlyphOutline) -> Result<()> {
        self.clear();
        outline.walk(self);
        if self.open {
            self.close();
        }
        if self.overflowed {
            self.clear();
            return Err(TrueTypeError::Malformed("too many outline segments"));
        }
        Ok(())
    }

    /// Iterate closed contours; each ends on its own first point
    pub fn contours(&self) -> impl Iterator<Item = &[Point]> + '_ {
        let points = self.points.as_slice();
        let mut start = 0;
        self.contour_ends.iter().map(move |&end| {
            let contour = &points[start..end];
            start = end;
            contour
        })
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_contours(&self) -> usize {
        self.contour_ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn push(&mut self, p: Point) {
        if self.points.alloc(p).is_err() {
            self.overflowed = true;
        }
    }
}

impl OutlineBuilder for Polylines {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.open {
            self.close();
        }
        self.contour_start = self.points.len();
        self.open = true;
        self.push(Point::new(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = Point::new(x, y);
        if self.points.last() != Some(&p) {
            self.push(p);
        }
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let Some(&from) = self.points.last() else {
            return;
        };
        let ctrl = Point::new(x1, y1);
        let to = Point::new(x, y);
        for i in 1..CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            self.push(from.quad_at(ctrl, to, t));
        }
        // End exactly on the target point
        self.push(to);
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let Some(&first) = self.points.get(self.contour_start) else {
            return;
        };
        if self.points.last() != Some(&first) {
            self.push(first);
        }
        if self.contour_ends.alloc(self.points.len()).is_err() {
            self.overflowed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Cmd {
        Move(f32, f32),
        Line(f32, f32),
        Quad(f32, f32, f32, f32),
        Close,
    }

    #[derive(Default)]
    struct Recorder(Vec<Cmd>);

    impl OutlineBuilder for Recorder {
        fn move_to(&mut self, x: f32, y: f32) {
            self.0.push(Cmd::Move(x, y));
        }
        fn line_to(&mut self, x: f32, y: f32) {
            self.0.push(Cmd::Line(x, y));
        }
        fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
            self.0.push(Cmd::Quad(x1, y1, x, y));
        }
        fn close(&mut self) {
            self.0.push(Cmd::Close);
        }
    }

    fn outline(points: &[OutlinePoint]) -> GlyphOutline {
        let mut o = GlyphOutline::with_capacity(32, 4);
        for &p in points {
            o.push_point(p).unwrap();
        }
        o.end_contour().unwrap();
        o
    }

    #[test]
    fn test_walk_lines() {
        let o = outline(&[OutlinePoint::on(0.0, 0.0), OutlinePoint::on(10.0, 0.0), OutlinePoint::on(10.0, 10.0)]);
        let mut rec = Recorder::default();
        o.walk(&mut rec);
        assert_eq!(
            rec.0,
            vec![
                Cmd::Move(0.0, 0.0),
                Cmd::Line(10.0, 0.0),
                Cmd::Line(10.0, 10.0),
                Cmd::Line(0.0, 0.0),
                Cmd::Close
            ]
        );
    }

    #[test]
    fn test_implied_midpoint_between_off_points() {
        let o = outline(&[
            OutlinePoint::on(0.0, 0.0),
            OutlinePoint::off(10.0, 20.0),
            OutlinePoint::off(30.0, 20.0),
            OutlinePoint::on(40.0, 0.0),
        ]);
        let mut rec = Recorder::default();
        o.walk(&mut rec);
        assert_eq!(rec.0[1], Cmd::Quad(10.0, 20.0, 20.0, 20.0));
        assert_eq!(rec.0[2], Cmd::Quad(30.0, 20.0, 40.0, 0.0));
    }

    #[test]
    fn test_all_off_curve_contour() {
        let p = OutlinePoint::off(0.0, 0.0);
        let q = OutlinePoint::off(10.0, 4.0);
        let o = outline(&[p, q]);
        let mut rec = Recorder::default();
        o.walk(&mut rec);
        // Synthesized start at midpoint(Q, P), then midpoint(P, Q)
        assert_eq!(
            rec.0,
            vec![
                Cmd::Move(5.0, 2.0),
                Cmd::Quad(0.0, 0.0, 5.0, 2.0),
                Cmd::Quad(10.0, 4.0, 5.0, 2.0),
                Cmd::Close
            ]
        );
    }

    #[test]
    fn test_starts_from_last_on_curve() {
        let o = outline(&[OutlinePoint::off(5.0, 10.0), OutlinePoint::on(10.0, 0.0), OutlinePoint::on(0.0, 0.0)]);
        let mut rec = Recorder::default();
        o.walk(&mut rec);
        assert_eq!(rec.0[0], Cmd::Move(0.0, 0.0));
        assert_eq!(rec.0[1], Cmd::Quad(5.0, 10.0, 10.0, 0.0));
    }

    #[test]
    fn test_flatten_quad_endpoints_and_tolerance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(50.0, 100.0);
        let c = Point::new(100.0, 0.0);
        let o = outline(&[
            OutlinePoint::on(a.x, a.y),
            OutlinePoint::off(b.x, b.y),
            OutlinePoint::on(c.x, c.y),
        ]);
        let mut lines = Polylines::with_capacity(64, 4);
        lines.build_contours(&o).unwrap();
        let contour = lines.contours().next().unwrap();

        assert_eq!(contour[0], a);
        assert_eq!(contour[CURVE_SEGMENTS], c);
        // Closed back to A
        assert_eq!(*contour.last().unwrap(), a);

        for (i, p) in contour[..=CURVE_SEGMENTS].iter().enumerate() {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let exact = a.quad_at(b, c, t);
            assert!((p.x - exact.x).abs() < 1e-3 && (p.y - exact.y).abs() < 1e-3);
            // Curve peaks at y = 50 for this control point
            assert!(p.y <= 50.0 + 1e-3);
        }
    }

    #[test]
    fn test_polylines_overflow_is_malformed() {
        let o = outline(&[
            OutlinePoint::on(0.0, 0.0),
            OutlinePoint::off(5.0, 5.0),
            OutlinePoint::on(10.0, 0.0),
        ]);
        let mut lines = Polylines::with_capacity(4, 4);
        assert!(matches!(lines.build_contours(&o), Err(TrueTypeError::Malformed(_))));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_outline_point_capacity() {
        let mut o = GlyphOutline::with_capacity(2, 1);
        o.push_point(OutlinePoint::on(0.0, 0.0)).unwrap();
        o.push_point(OutlinePoint::on(1.0, 0.0)).unwrap();
        assert!(o.push_point(OutlinePoint::on(2.0, 0.0)).is_err());
        o.end_contour().unwrap();
        assert!(o.end_contour().is_err());
    }

    #[test]
    fn test_multiple_contours() {
        let mut o = GlyphOutline::with_capacity(16, 4);
        for &(x, y) in &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)] {
            o.push_point(OutlinePoint::on(x, y)).unwrap();
        }
        o.end_contour().unwrap();
        for &(x, y) in &[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)] {
            o.push_point(OutlinePoint::on(x, y)).unwrap();
        }
        o.end_contour().unwrap();
        let sizes: Vec<usize> = o.contours().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 4]);

        let mut lines = Polylines::with_capacity(64, 4);
        lines.build_contours(&o).unwrap();
        let sizes: Vec<usize> = lines.contours().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 5]);
    }
}
