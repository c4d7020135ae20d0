use euclid::default::Point2D;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

pub type ConnectionId = u16;
pub type SessionId = u32;
pub type OperationId = uuid::Uuid;
pub type StrokeId = uuid::Uuid;

/// Opaque RGB brush color. Serialized as `#RRGGBB`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Opaque RGBA bytes as written into the pixel buffer.
    pub fn to_rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl std::default::Default for Color {
    fn default() -> Self {
        Self { r: 0, g: 0, b: 0 }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ColorParseError {
    pub input: String,
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?}, expected #RRGGBB", self.input)
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError { input: s.into() };
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| err())?;
        Ok(Color {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        })
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Footprint of a draw operation.
///
/// Names outside the known set survive decoding as `Unrecognized` so that a
/// message from a newer peer is dropped at render time instead of failing the
/// whole frame.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shape {
    Line,
    Circle,
    Square,
    Triangle,
    Rectangle,
    Ellipse,
    Unrecognized(String),
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Line,
        Shape::Circle,
        Shape::Square,
        Shape::Triangle,
        Shape::Rectangle,
        Shape::Ellipse,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Shape::Line => "line",
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Rectangle => "rectangle",
            Shape::Ellipse => "ellipse",
            Shape::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Shape::Unrecognized(_))
    }
}

impl std::default::Default for Shape {
    fn default() -> Self {
        Shape::Line
    }
}

impl From<String> for Shape {
    fn from(name: String) -> Self {
        match name.as_str() {
            "line" => Shape::Line,
            "circle" => Shape::Circle,
            "square" => Shape::Square,
            "triangle" => Shape::Triangle,
            "rectangle" => Shape::Rectangle,
            "ellipse" => Shape::Ellipse,
            _ => Shape::Unrecognized(name),
        }
    }
}

impl From<&str> for Shape {
    fn from(name: &str) -> Self {
        Shape::from(name.to_owned())
    }
}

impl From<Shape> for String {
    fn from(shape: Shape) -> Self {
        match shape {
            Shape::Unrecognized(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

/// The atomic unit of synchronized canvas state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOperation {
    pub id: OperationId,
    pub stroke: StrokeId,
    pub position: Point2D<f32>,
    pub brush_size: f32,
    pub brush_color: Color,
    pub shape: Shape,
    pub eraser_mode: bool,
}

impl DrawOperation {
    pub fn new(
        stroke: StrokeId,
        position: Point2D<f32>,
        brush_size: f32,
        brush_color: Color,
        shape: Shape,
        eraser_mode: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            stroke,
            position,
            brush_size,
            brush_color,
            shape,
            eraser_mode,
        }
    }
}

/// Client to relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Draw(DrawOperation),
    ClearCanvas,
}

/// Relay to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelayMessage {
    Draw(DrawOperation),
    DrawingHistory(Vec<DrawOperation>),
    ClearCanvas,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_parse_hex_colors() {
        assert_eq!("#112233".parse::<Color>(), Ok(Color::new(0x11, 0x22, 0x33)));
        assert_eq!("#ffFFff".parse::<Color>(), Ok(Color::new(255, 255, 255)));
        assert_eq!(Color::new(0xab, 0x01, 0x0c).to_hex(), "#AB010C");
    }

    #[test]
    fn it_should_reject_malformed_colors() {
        for input in &["112233", "#12345", "#1234567", "#GG0000", "", "#"] {
            assert!(input.parse::<Color>().is_err(), "{} should be rejected", input);
        }
    }

    #[test]
    fn it_should_keep_unknown_shape_names() {
        assert_eq!(Shape::from("ellipse"), Shape::Ellipse);
        let hexagon = Shape::from("hexagon");
        assert_eq!(hexagon, Shape::Unrecognized("hexagon".into()));
        assert!(!hexagon.is_recognized());
        assert_eq!(String::from(hexagon), "hexagon");
    }
}
