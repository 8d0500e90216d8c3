//! Shared helpers for the `photo-frame` binary tests.

use assert_cmd::Command;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

/// `photo-frame --base-dir <base>` ready for more arguments.
pub fn photo_frame(base: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photo-frame").expect("binary is built");
    cmd.arg("--base-dir").arg(base).env("RUST_LOG", "warn");
    cmd
}

/// A base directory whose role patterns match nothing else on the machine.
///
/// The server has no start command and the slideshow script is absent.
pub fn isolated_base() -> TempDir {
    let dir = tempfile::tempdir().expect("create base dir");
    let marker = dir
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .expect("tempdir has a name");

    let config = format!(
        r#"
[roles.server]
pattern = "{marker}-server"

[roles.slideshow]
pattern = "{marker}-slideshow"

[roles.slideshow.start]
program = "{{base}}/pi_photo_frame.sh"
args = ["-run", "-dir", "{{store}}"]
"#
    );
    let pf_dir = dir.path().join(".photo-frame");
    std::fs::create_dir_all(&pf_dir).expect("create config dir");
    std::fs::write(pf_dir.join("config.toml"), config).expect("write config");
    dir
}

/// Opaque RGB PNG.
#[allow(dead_code)]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture");
    out.into_inner()
}
