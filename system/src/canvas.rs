use image::{ImageError, Rgba, RgbaImage};
use std::fmt;
use std::path::Path;

/// Fully transparent pixel. Blank canvases and erased regions hold this.
pub const BLANK: [u8; 4] = [0, 0, 0, 0];

/// A client's RGBA pixel buffer. Fixed size for the lifetime of a session.
#[derive(Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(BLANK)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    /// Caller must check bounds with [`Canvas::contains`] first.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn get(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        if self.contains(x, y) {
            Some(self.pixel(x as u32, y as u32))
        } else {
            None
        }
    }

    pub fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        self.image.put_pixel(x, y, Rgba(rgba));
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba(BLANK);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|pixel| pixel.0 == BLANK)
    }

    /// Number of pixels equal to `rgba`.
    pub fn count(&self, rgba: [u8; 4]) -> usize {
        self.image.pixels().filter(|pixel| pixel.0 == rgba).count()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(ExportError)?;
        log::info!(
            "Canvas {}x{} exported to {}",
            self.width(),
            self.height(),
            path.display()
        );
        Ok(())
    }
}

#[derive(Debug)]
pub struct ExportError(pub ImageError);

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot export canvas: {}", self.0)
    }
}

impl std::error::Error for ExportError {}
