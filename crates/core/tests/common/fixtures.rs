//! Test fixtures: base directories, image bytes and test roles.

use image::{DynamicImage, ImageBuffer, ImageFormat, ImageReader, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Encode `img` in memory.
fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode fixture image");
    out.into_inner()
}

/// Opaque RGB PNG with a simple gradient.
#[allow(dead_code)]
pub fn rgb_png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// Half-transparent RGBA PNG.
#[allow(dead_code)]
pub fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([220, 40, 40, 128]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Small palette GIF.
#[allow(dead_code)]
pub fn gif(width: u32, height: u32) -> Vec<u8> {
    let img: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([0, 90, 200, 255]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Gif)
}

/// Decode a stored file by content, ignoring its extension.
#[allow(dead_code)]
pub fn decode_file(path: &Path) -> (DynamicImage, Option<ImageFormat>) {
    let reader = ImageReader::open(path)
        .expect("open stored photo")
        .with_guessed_format()
        .expect("sniff stored photo");
    let format = reader.format();
    (reader.decode().expect("decode stored photo"), format)
}

/// A base directory whose server role is a `sh` process tagged with a
/// unique marker, and whose slideshow role keeps its defaults.
///
/// Returns the directory and the marker.
#[allow(dead_code)]
pub fn create_marker_base(graceful_stop: bool) -> std::io::Result<(TempDir, String)> {
    let dir = tempfile::tempdir()?;
    let marker = format!("pf-test-{}", uuid::Uuid::new_v4().simple());
    let pf_dir = dir.path().join(".photo-frame");
    std::fs::create_dir_all(&pf_dir)?;

    let mut config = format!(
        r#"
settle_ms = 1500

[roles.server]
pattern = "{marker}"

[roles.server.start]
program = "sh"
args = ["-c", "echo $$ > {{base}}/role.pid; trap 'kill $! 2>/dev/null; exit 0' TERM; sleep 30 & wait", "{marker}"]
"#
    );

    if graceful_stop {
        config.push_str(
            r#"
[roles.server.stop]
program = "sh"
args = ["-c", "kill $(cat {base}/role.pid)"]
"#,
        );
    }

    std::fs::write(pf_dir.join("config.toml"), config)?;
    Ok((dir, marker))
}

/// Poll `condition` every 50 ms until it holds or `timeout` passes.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
