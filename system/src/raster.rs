//! Aliased fill primitives over a [`Canvas`].
//!
//! A pixel `(px, py)` is covered when its center `(px + 0.5, py + 0.5)` lies in
//! the shape. Boxes are half-open, so a box with integer corners covers exactly
//! the pixels it spans. Everything outside the canvas is clipped.

use crate::canvas::Canvas;
use euclid::default::{Box2D, Point2D, Vector2D};

fn fill_where<F>(canvas: &mut Canvas, bounds: &Box2D<f32>, rgba: [u8; 4], inside: F)
where
    F: Fn(Point2D<f32>) -> bool,
{
    let x0 = ((bounds.min.x - 0.5).ceil() as i64).max(0);
    let y0 = ((bounds.min.y - 0.5).ceil() as i64).max(0);
    let x1 = ((bounds.max.x - 0.5).floor() as i64).min(canvas.width() as i64 - 1);
    let y1 = ((bounds.max.y - 0.5).floor() as i64).min(canvas.height() as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return;
    }

    for py in y0..=y1 {
        for px in x0..=x1 {
            let center = Point2D::new(px as f32 + 0.5, py as f32 + 0.5);
            if inside(center) {
                canvas.put(px as u32, py as u32, rgba);
            }
        }
    }
}

/// Box of `width × height` centered at `center`.
pub fn centered_box(center: Point2D<f32>, width: f32, height: f32) -> Box2D<f32> {
    let half = Vector2D::new(width / 2.0, height / 2.0);
    Box2D::new(center - half, center + half)
}

pub fn fill_rect(canvas: &mut Canvas, rect: &Box2D<f32>, rgba: [u8; 4]) {
    fill_where(canvas, rect, rgba, |p| rect.contains(p));
}

pub fn fill_disc(canvas: &mut Canvas, center: Point2D<f32>, radius: f32, rgba: [u8; 4]) {
    fill_ellipse(canvas, center, radius, radius, rgba);
}

pub fn fill_ellipse(
    canvas: &mut Canvas,
    center: Point2D<f32>,
    radius_h: f32,
    radius_v: f32,
    rgba: [u8; 4],
) {
    if radius_h <= 0.0 || radius_v <= 0.0 {
        return;
    }
    let bounds = centered_box(center, radius_h * 2.0, radius_v * 2.0);
    fill_where(canvas, &bounds, rgba, |p| {
        let d = p - center;
        let nx = d.x / radius_h;
        let ny = d.y / radius_v;
        nx * nx + ny * ny <= 1.0
    });
}

pub fn fill_triangle(canvas: &mut Canvas, vertices: [Point2D<f32>; 3], rgba: [u8; 4]) {
    let [a, b, c] = vertices;
    let bounds = Box2D::from_points(&vertices);
    fill_where(canvas, &bounds, rgba, |p| {
        let d1 = edge(a, b, p);
        let d2 = edge(b, c, p);
        let d3 = edge(c, a, p);
        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_neg && has_pos)
    });
}

/// Stroke from `from` to `to`. Both ends are rounded, so consecutive segments of
/// a polyline join without gaps.
pub fn stroke_segment(
    canvas: &mut Canvas,
    from: Point2D<f32>,
    to: Point2D<f32>,
    width: f32,
    rgba: [u8; 4],
) {
    let half_width = width / 2.0;
    if half_width <= 0.0 {
        return;
    }
    let outset = Vector2D::new(half_width, half_width);
    let bounds = Box2D::new(from.min(to) - outset, from.max(to) + outset);
    let limit = half_width * half_width;
    fill_where(canvas, &bounds, rgba, |p| {
        distance_to_segment_squared(p, from, to) <= limit
    });
}

fn edge(a: Point2D<f32>, b: Point2D<f32>, p: Point2D<f32>) -> f32 {
    (b - a).cross(p - a)
}

fn distance_to_segment_squared(p: Point2D<f32>, a: Point2D<f32>, b: Point2D<f32>) -> f32 {
    let ab = b - a;
    let length_squared = ab.square_length();
    if length_squared == 0.0 {
        return (p - a).square_length();
    }
    let t = ((p - a).dot(ab) / length_squared).max(0.0).min(1.0);
    (p - (a + ab * t)).square_length()
}
