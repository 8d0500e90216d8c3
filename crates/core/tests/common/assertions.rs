//! Custom assertion helpers for integration tests.

use image::GenericImageView;
use std::path::Path;

/// Assert that the store directory holds exactly `expected` files.
#[allow(dead_code)]
pub fn assert_store_file_count(root: &Path, expected: usize) {
    let count = std::fs::read_dir(root)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0);
    assert_eq!(
        count, expected,
        "Store {} should hold {expected} file(s), found {count}",
        root.display()
    );
}

/// Assert that an image fits the bounds and kept the source aspect ratio.
#[allow(dead_code)]
pub fn assert_fits_with_aspect(
    img: &impl GenericImageView,
    source: (u32, u32),
    bounds: (u32, u32),
) {
    let (w, h) = img.dimensions();
    assert!(
        w <= bounds.0 && h <= bounds.1,
        "{w}x{h} exceeds {}x{}",
        bounds.0,
        bounds.1
    );

    let before = source.0 as f64 / source.1 as f64;
    let after = w as f64 / h as f64;
    // One pixel of rounding on the short side
    let tolerance = before / h.min(w) as f64 + 1e-9;
    assert!(
        (before - after).abs() <= tolerance,
        "aspect ratio drifted from {before:.4} to {after:.4}"
    );
}
