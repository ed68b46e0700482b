//! Shaping of still images before they are encoded.

use super::codec::Framing;
use crate::compliance::limits::STICKER_DIMENSION;
use crate::prelude::*;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Radius of the corners cut off by [`Shape::Rounded`].
pub const ROUNDED_CORNER_RADIUS: u32 = 64;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, clap::ValueEnum,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Shape {
    /// Fit the whole image into the canvas, the rest is filled with the background
    #[default]
    Default,

    /// Cover the canvas and cut off the overflow around the center
    Crop,

    /// Stretch to the canvas ignoring the aspect ratio
    Full,

    /// Crop and cut out the circle inscribed into the canvas
    Circle,

    /// Crop and round off the corners
    Rounded,
}

impl Shape {
    /// How ffmpeg must frame animated input. Masks can't be applied to
    /// animations, so [`Shape::Circle`] and [`Shape::Rounded`] have no framing.
    pub(crate) fn framing(self) -> Option<Framing> {
        match self {
            Self::Default => Some(Framing::Letterbox),
            Self::Crop => Some(Framing::Crop),
            Self::Full => Some(Framing::Stretch),
            Self::Circle | Self::Rounded => None,
        }
    }
}

/// Parses `RRGGBB` or `RRGGBBAA` hex colors with an optional `#` prefix,
/// or the word `transparent`.
pub fn parse_background(input: &str) -> Result<Rgba<u8>> {
    if input.eq_ignore_ascii_case("transparent") {
        return Ok(TRANSPARENT);
    }

    let hex = input.strip_prefix('#').unwrap_or(input);

    ensure!(
        matches!(hex.len(), 6 | 8) && hex.chars().all(|char| char.is_ascii_hexdigit()),
        "Expected a color in the format `#RRGGBB` or `#RRGGBBAA`, but got `{input}`"
    );

    let channel = |i: usize| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16);

    let alpha = if hex.len() == 8 { channel(3)? } else { u8::MAX };

    Ok(Rgba([channel(0)?, channel(1)?, channel(2)?, alpha]))
}

/// Decodes a still image, shapes it and encodes the result as PNG.
pub(crate) fn render(input: &[u8], shape: Shape, background: Rgba<u8>) -> Result<Vec<u8>> {
    let image = image::load_from_memory(input).context("Failed to decode the input image")?;

    debug!(
        width = image.width(),
        height = image.height(),
        %shape,
        "Compositing the still image"
    );

    let composite = composite(&image, shape, background);

    let mut png = Vec::new();
    composite
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Failed to encode the composited image")?;

    Ok(png)
}

pub fn composite(image: &DynamicImage, shape: Shape, background: Rgba<u8>) -> RgbaImage {
    let side = STICKER_DIMENSION;

    let shaped = match shape {
        Shape::Default => image.resize(side, side, FilterType::Lanczos3),
        Shape::Crop | Shape::Circle | Shape::Rounded => {
            image.resize_to_fill(side, side, FilterType::Lanczos3)
        }
        Shape::Full => image.resize_exact(side, side, FilterType::Lanczos3),
    };

    let mut canvas = RgbaImage::from_pixel(side, side, background);

    let x = (side - shaped.width()) / 2;
    let y = (side - shaped.height()) / 2;

    imageops::overlay(&mut canvas, &shaped.to_rgba8(), x.into(), y.into());

    match shape {
        Shape::Circle => mask_corners(&mut canvas, side / 2),
        Shape::Rounded => mask_corners(&mut canvas, ROUNDED_CORNER_RADIUS),
        Shape::Default | Shape::Crop | Shape::Full => {}
    }

    canvas
}

/// Makes pixels outside of the rounded rectangle with the given corner
/// radius transparent. The radius of half the side yields a circle.
fn mask_corners(image: &mut RgbaImage, radius: u32) {
    let (width, height) = image.dimensions();
    let radius = radius as f32;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);

        let nearest_x = px.clamp(radius, width as f32 - radius);
        let nearest_y = py.clamp(radius, height as f32 - radius);

        if (px - nearest_x).powi(2) + (py - nearest_y).powi(2) > radius.powi(2) {
            *pixel = TRANSPARENT;
        }
    }
}
