use crate::canvas::Canvas;
use crate::message::{Color, DrawOperation, Shape, StrokeId};
use euclid::default::Point2D;

/// Pixels recolored by one [`flood_fill`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledRegion {
    pub color: Color,
    pixels: Vec<(u32, u32)>,
}

/// A square of `side` pixels whose top-left pixel is `(x, y)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PixelSquare {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

fn same_rgb(pixel: [u8; 4], rgb: [u8; 3]) -> bool {
    pixel[0] == rgb[0] && pixel[1] == rgb[1] && pixel[2] == rgb[2]
}

/// Recolors the 4-connected region around `seed` whose pixels share the seed's
/// RGB. Alpha is neither compared nor preserved: converted pixels become opaque.
pub fn flood_fill(canvas: &mut Canvas, seed: Point2D<i64>, new_color: Color) -> FilledRegion {
    let mut region = FilledRegion {
        color: new_color,
        pixels: Vec::new(),
    };

    let target = match canvas.get(seed.x, seed.y) {
        Some(pixel) => [pixel[0], pixel[1], pixel[2]],
        None => {
            log::debug!("Fill seed ({}, {}) is outside the canvas", seed.x, seed.y);
            return region;
        }
    };
    if target == [new_color.r, new_color.g, new_color.b] {
        return region;
    }

    let replacement = new_color.to_rgba();
    let mut stack = vec![(seed.x, seed.y)];
    while let Some((x, y)) = stack.pop() {
        let pixel = match canvas.get(x, y) {
            Some(pixel) => pixel,
            None => continue,
        };
        if same_rgb(pixel, target) {
            canvas.put(x as u32, y as u32, replacement);
            region.pixels.push((x as u32, y as u32));

            stack.push((x + 1, y));
            stack.push((x - 1, y));
            stack.push((x, y + 1));
            stack.push((x, y - 1));
        }
    }

    log::debug!(
        "Filled {} pixels from ({}, {}) with {}",
        region.pixels.len(),
        seed.x,
        seed.y,
        new_color
    );
    region
}

impl FilledRegion {
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[(u32, u32)] {
        &self.pixels
    }

    /// Greedy cover of the region by disjoint squares, scanning rows top to
    /// bottom and growing each square as far as the region allows.
    pub fn squares(&self) -> Vec<PixelSquare> {
        let (min_x, min_y, max_x, max_y) = match self.bounds() {
            Some(bounds) => bounds,
            None => return Vec::new(),
        };
        let width = (max_x - min_x + 1) as usize;
        let height = (max_y - min_y + 1) as usize;

        // filled and not yet covered
        let mut open = vec![false; width * height];
        for &(x, y) in &self.pixels {
            open[(y - min_y) as usize * width + (x - min_x) as usize] = true;
        }
        let is_open =
            |open: &[bool], x: usize, y: usize| x < width && y < height && open[y * width + x];

        let mut result = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if !open[y * width + x] {
                    continue;
                }
                let mut side = 1;
                loop {
                    let column_open = (y..=y + side).all(|yy| is_open(&open, x + side, yy));
                    let row_open = (x..x + side).all(|xx| is_open(&open, xx, y + side));
                    if column_open && row_open {
                        side += 1;
                    } else {
                        break;
                    }
                }
                for yy in y..y + side {
                    for xx in x..x + side {
                        open[yy * width + xx] = false;
                    }
                }
                result.push(PixelSquare {
                    x: min_x + x as u32,
                    y: min_y + y as u32,
                    side: side as u32,
                });
            }
        }
        result
    }

    /// `square` operations that reproduce this fill on a peer whose canvas
    /// matched ours before the fill.
    pub fn to_operations(&self, stroke: StrokeId) -> Vec<DrawOperation> {
        self.squares()
            .into_iter()
            .map(|square| {
                let half = square.side as f32 / 2.0;
                DrawOperation::new(
                    stroke,
                    Point2D::new(square.x as f32 + half, square.y as f32 + half),
                    square.side as f32,
                    self.color,
                    Shape::Square,
                    false,
                )
            })
            .collect()
    }

    fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut iter = self.pixels.iter();
        let &(x, y) = iter.next()?;
        Some(iter.fold((x, y, x, y), |(x0, y0, x1, y1), &(x, y)| {
            (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
        }))
    }
}
