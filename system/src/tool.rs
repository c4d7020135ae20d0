use crate::message::{Color, DrawOperation, Shape, StrokeId};
use euclid::default::Point2D;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BRUSH_SIZE: f32 = 5.0;

/// Local tool selection. Read when an operation is created, never synchronized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolContext {
    pub brush_size: f32,
    pub brush_color: Color,
    pub shape: Shape,
    pub eraser_mode: bool,
    pub fill_mode: bool,
}

impl std::default::Default for ToolContext {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: Color::default(),
            shape: Shape::Line,
            eraser_mode: false,
            fill_mode: false,
        }
    }
}

impl ToolContext {
    /// Picking a color leaves eraser mode.
    pub fn set_color(&mut self, color: Color) {
        self.brush_color = color;
        self.eraser_mode = false;
    }

    pub fn set_brush_size(&mut self, size: f32) {
        if size.is_finite() && size > 0.0 {
            self.brush_size = size;
        } else {
            log::warn!("Ignoring brush size {}", size);
        }
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn toggle_eraser(&mut self) {
        self.eraser_mode = !self.eraser_mode;
    }

    pub fn toggle_fill_mode(&mut self) {
        self.fill_mode = !self.fill_mode;
    }

    pub fn create_operation(&self, stroke: StrokeId, position: Point2D<f32>) -> DrawOperation {
        DrawOperation::new(
            stroke,
            position,
            self.brush_size,
            self.brush_color,
            self.shape.clone(),
            self.eraser_mode,
        )
    }
}
