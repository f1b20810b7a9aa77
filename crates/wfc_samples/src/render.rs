//! PNG and text output for solved grids.

use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};

/// Background for cells whose state has no color.
const BACKGROUND: [u8; 4] = [34, 34, 34, 255];

/// Render a solved grid, one `pixel_size` square per cell.
///
/// # Arguments
/// * `observed` - State per cell, indexed `x + y * width`
/// * `colors` - Color per state
/// * `pixel_size` - Side of each cell in pixels
pub fn render_2d(
    observed: &[usize],
    width: usize,
    height: usize,
    colors: &[[u8; 4]],
    pixel_size: u32,
) -> RgbaImage {
    let mut img: RgbaImage = ImageBuffer::from_pixel(
        width as u32 * pixel_size,
        height as u32 * pixel_size,
        Rgba(BACKGROUND),
    );

    for y in 0..height {
        for x in 0..width {
            let Some(&color) = observed.get(x + y * width).and_then(|&s| colors.get(s)) else {
                continue;
            };
            for dy in 0..pixel_size {
                for dx in 0..pixel_size {
                    let px = x as u32 * pixel_size + dx;
                    let py = y as u32 * pixel_size + dy;
                    img.put_pixel(px, py, Rgba(color));
                }
            }
        }
    }

    img
}

/// Save an RGBA image to a PNG file.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), image::ImageError> {
    img.save(path)
}

/// Tile names row by row, separated by spaces.
pub fn text_output(observed: &[usize], width: usize, names: &[String]) -> String {
    let mut out = String::new();
    for row in observed.chunks(width.max(1)) {
        let line: Vec<&str> = row
            .iter()
            .map(|&s| names.get(s).map_or("?", String::as_str))
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}
