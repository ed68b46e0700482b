use crate::prelude::*;
use expect_test::{expect_file, ExpectFile};
use image::codecs::webp::WebPEncoder;
use image::{Rgba, RgbaImage};

/// Version of [`expect_test::expect_file!`] macro that organizes the snapshots under
/// `tests/snapshots` folder. It automatically creates the folder if it doesn't exist.
pub(crate) async fn expect_file(file_path: &str) -> ExpectFile {
    let mut path = Utf8PathBuf::from_iter([
        &std::env::var("CARGO_MANIFEST_DIR").unwrap(),
        "tests",
        "snapshots",
    ]);

    path.push(file_path);

    let parent = path.parent().unwrap();

    fs::create_dir_all(parent)
        .await
        .expect("Failed to create a directory for test snapshots");

    expect_file![path]
}

const ORANGE: Rgba<u8> = Rgba([255, 128, 0, 255]);
const TEAL: Rgba<u8> = Rgba([0, 128, 128, 255]);

/// Lossless single-frame WebP filled with a solid colour.
pub(crate) fn still_webp(width: u32, height: u32) -> Vec<u8> {
    encode_lossless(&RgbaImage::from_pixel(width, height, ORANGE))
}

pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    RgbaImage::from_pixel(width, height, TEAL)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Animated WebP with `frames` frames alternating between two colours.
///
/// `image` can only encode still lossless WebP, so every frame is encoded
/// on its own and its `VP8L` chunk is wrapped into an `ANMF` chunk of an
/// extended (`VP8X`) container.
pub(crate) fn animated_webp(width: u32, height: u32, frames: usize, frame_ms: u32) -> Vec<u8> {
    let mut frame_data = Vec::new();

    for i in 0..frames {
        let color = if i % 2 == 0 { ORANGE } else { TEAL };
        let still = encode_lossless(&RgbaImage::from_pixel(width, height, color));
        let bitstream = chunk(&still, b"VP8L");

        frame_data.extend_from_slice(b"ANMF");
        frame_data.extend_from_slice(&((bitstream.len() + 16) as u32).to_le_bytes());
        frame_data.extend_from_slice(&u24(0));
        frame_data.extend_from_slice(&u24(0));
        frame_data.extend_from_slice(&u24(width - 1));
        frame_data.extend_from_slice(&u24(height - 1));
        frame_data.extend_from_slice(&u24(frame_ms));
        frame_data.push(0);
        frame_data.extend_from_slice(bitstream);
    }

    const VP8X_LEN: usize = 8 + 10;
    const ANIM_LEN: usize = 8 + 6;

    let mut webp = Vec::with_capacity(12 + VP8X_LEN + ANIM_LEN + frame_data.len());

    webp.extend_from_slice(b"RIFF");
    webp.extend_from_slice(&((4 + VP8X_LEN + ANIM_LEN + frame_data.len()) as u32).to_le_bytes());
    webp.extend_from_slice(b"WEBPVP8X");
    webp.extend_from_slice(&10u32.to_le_bytes());
    // Animation and alpha flags
    webp.extend_from_slice(&[0x02 | 0x10, 0, 0, 0]);
    webp.extend_from_slice(&u24(width - 1));
    webp.extend_from_slice(&u24(height - 1));
    webp.extend_from_slice(b"ANIM");
    webp.extend_from_slice(&6u32.to_le_bytes());
    // Transparent background, infinite loop
    webp.extend_from_slice(&[0; 4]);
    webp.extend_from_slice(&0u16.to_le_bytes());
    webp.extend_from_slice(&frame_data);

    webp
}

fn encode_lossless(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image
        .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        .unwrap();
    buf
}

/// Returns the whole RIFF chunk (header and padding included) with the given id.
fn chunk<'a>(webp: &'a [u8], id: &[u8; 4]) -> &'a [u8] {
    let mut offset = 12;

    while offset + 8 <= webp.len() {
        let size = u32::from_le_bytes(webp[offset + 4..offset + 8].try_into().unwrap()) as usize;
        let end = offset + 8 + size + size % 2;

        if &webp[offset..offset + 4] == id {
            return &webp[offset..end.min(webp.len())];
        }

        offset = end;
    }

    panic!("No {:?} chunk in the encoded WebP", std::str::from_utf8(id));
}

fn u24(val: u32) -> [u8; 3] {
    assert!(val >> 24 == 0, "{val} doesn't fit into 24 bits");
    let [a, b, c, _] = val.to_le_bytes();
    [a, b, c]
}
