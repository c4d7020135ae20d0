use crate::canvas::{Canvas, BLANK};
use crate::message::{DrawOperation, Shape, StrokeId};
use crate::raster;
use euclid::default::Point2D;
use std::collections::HashMap;

/// Most strokes kept at once. Pointer-up is never relayed, so strokes that
/// finished on other peers are only released by eviction.
pub const MAX_ACTIVE_STROKES: usize = 256;

/// Pen positions of the strokes currently being drawn, keyed by stroke so that
/// interleaved strokes from different participants never join.
///
/// Past [`MAX_ACTIVE_STROKES`] the least recently advanced stroke is dropped.
/// A stroke still being drawn is advanced on each of its operations, so only
/// one interrupted by that many other strokes loses a segment.
#[derive(Debug, Default)]
pub struct StrokeState {
    last_points: HashMap<StrokeId, (Point2D<f32>, u64)>,
    clock: u64,
}

impl StrokeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_point(&self, stroke: &StrokeId) -> Option<Point2D<f32>> {
        self.last_points.get(stroke).map(|(point, _)| *point)
    }

    /// Records `point` as the pen position and returns the previous one.
    fn advance(&mut self, stroke: StrokeId, point: Point2D<f32>) -> Option<Point2D<f32>> {
        self.clock += 1;
        let previous = self
            .last_points
            .insert(stroke, (point, self.clock))
            .map(|(point, _)| point);
        if previous.is_none() && self.last_points.len() > MAX_ACTIVE_STROKES {
            self.evict_oldest();
        }
        previous
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .last_points
            .iter()
            .min_by_key(|(_, (_, touched))| *touched)
            .map(|(stroke, _)| *stroke);
        if let Some(stroke) = oldest {
            log::trace!("Releasing stroke {}", stroke);
            self.last_points.remove(&stroke);
        }
    }

    pub fn end(&mut self, stroke: &StrokeId) {
        self.last_points.remove(stroke);
    }

    pub fn reset(&mut self) {
        self.last_points.clear();
    }

    pub fn active_strokes(&self) -> usize {
        self.last_points.len()
    }
}

/// Applies one operation to the canvas. Local, remote and replayed operations
/// all go through here.
///
/// Returns `false` when the operation was ignored.
pub fn apply_operation(canvas: &mut Canvas, strokes: &mut StrokeState, op: &DrawOperation) -> bool {
    let size = op.brush_size;
    if !(size.is_finite() && size > 0.0) || !op.position.x.is_finite() || !op.position.y.is_finite()
    {
        log::debug!("Ignoring operation {} with invalid geometry", op.id);
        return false;
    }

    let pos = op.position;
    if op.eraser_mode {
        raster::fill_rect(canvas, &raster::centered_box(pos, size, size), BLANK);
        return true;
    }

    let rgba = op.brush_color.to_rgba();
    match &op.shape {
        Shape::Line => {
            if let Some(from) = strokes.advance(op.stroke, pos) {
                raster::stroke_segment(canvas, from, pos, size, rgba);
            }
        }
        Shape::Circle => raster::fill_disc(canvas, pos, size / 2.0, rgba),
        Shape::Square => raster::fill_rect(canvas, &raster::centered_box(pos, size, size), rgba),
        Shape::Rectangle => {
            raster::fill_rect(canvas, &raster::centered_box(pos, size, size / 2.0), rgba)
        }
        Shape::Triangle => {
            let half = size / 2.0;
            raster::fill_triangle(
                canvas,
                [
                    Point2D::new(pos.x, pos.y - half),
                    Point2D::new(pos.x - half, pos.y + half),
                    Point2D::new(pos.x + half, pos.y + half),
                ],
                rgba,
            )
        }
        Shape::Ellipse => raster::fill_ellipse(canvas, pos, size / 2.0, size / 4.0, rgba),
        Shape::Unrecognized(name) => {
            log::debug!("Ignoring operation {} with unknown shape {:?}", op.id, name);
            return false;
        }
    }
    true
}
