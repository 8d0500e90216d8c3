//! Integration tests for the upload ingestion pipeline and the photo store.
//!
//! These tests drive `IngestionPipeline` with synthesized images and check
//! what ends up on disk:
//! - Mixed batches with valid and invalid files
//! - Downscaling and flattening of stored photos
//! - Listing and deleting what was stored

mod common;

use common::assertions::*;
use common::fixtures::*;
use image::{GenericImageView, ImageFormat};
use pf_core::ingest::{IngestionPipeline, RejectionKind, UploadItem};
use pf_core::store::{PhotoStore, StoreError};
use pf_protocol::config_models::NormalizeConfig;
use pf_protocol::photo_models::BatchOutcome;

fn default_pipeline(root: &std::path::Path) -> IngestionPipeline {
    IngestionPipeline::new(PhotoStore::new(root), NormalizeConfig::default())
}

#[test]
fn test_mixed_batch_stores_valid_photo_and_rejects_text() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path());

    let report = pipeline.ingest_batch(vec![
        UploadItem::new("photo1.jpg", rgba_png(3000, 2000)),
        UploadItem::new("photo2.txt", b"not a photo".to_vec()),
    ]);

    assert_eq!(report.outcome(), BatchOutcome::Partial);
    assert_eq!(report.message(), "Successfully uploaded 1 photo(s)!");
    assert_eq!(report.stored.len(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].kind(), RejectionKind::InvalidExtension);
    assert_eq!(report.rejected[0].filename(), "photo2.txt");

    let stored = &report.stored[0];
    assert!(stored.identity.ends_with(".jpg"));
    assert_store_file_count(dir.path(), 1);

    let (img, format) = decode_file(&stored.path);
    assert_eq!(format, Some(ImageFormat::Jpeg));
    assert!(!img.color().has_alpha());
    assert_fits_with_aspect(&img, (3000, 2000), (1920, 1080));
    assert_eq!(img.dimensions(), (1620, 1080));
}

#[test]
fn test_extension_is_lowercased_and_names_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path());

    let report = pipeline.ingest_batch(vec![
        UploadItem::new("IMG_0001.JPEG", rgb_png(40, 30)),
        UploadItem::new("IMG_0001.JPEG", rgb_png(40, 30)),
        UploadItem::new("Scan.Bmp", rgb_png(10, 10)),
    ]);

    assert_eq!(report.outcome(), BatchOutcome::AllStored);
    let names: Vec<&str> = report.stored.iter().map(|e| e.identity.as_str()).collect();
    assert!(names[0].ends_with(".jpeg"));
    assert!(names[1].ends_with(".jpeg"));
    assert!(names[2].ends_with(".bmp"));
    assert_ne!(names[0], names[1]);
    assert!(names.iter().all(|n| !n.contains("IMG_0001") && !n.contains("Scan")));
}

#[test]
fn test_within_bounds_rgb_is_stored_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = rgb_png(320, 200);

    let entry = default_pipeline(dir.path()).ingest(&bytes, "small.png").unwrap();

    assert_eq!(std::fs::read(&entry.path).unwrap(), bytes);
    assert_eq!(entry.size_bytes, bytes.len() as u64);
}

#[test]
fn test_gif_is_flattened_to_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let entry = default_pipeline(dir.path())
        .ingest(&gif(24, 16), "anim.GIF")
        .unwrap();

    assert!(entry.identity.ends_with(".gif"));
    let (img, format) = decode_file(&entry.path);
    assert_eq!(format, Some(ImageFormat::Jpeg));
    assert_eq!(img.dimensions(), (24, 16));
    assert!(!img.color().has_alpha());
}

#[test]
fn test_corrupt_and_empty_uploads_leave_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path());

    let report = pipeline.ingest_batch(vec![
        UploadItem::new("empty.jpg", Vec::new()),
        UploadItem::new("garbage.png", b"\x89PNG but not really".to_vec()),
    ]);

    assert_eq!(report.outcome(), BatchOutcome::NoneStored);
    assert_eq!(report.message(), "No valid photos were uploaded");
    assert!(report
        .rejected
        .iter()
        .all(|err| err.kind() == RejectionKind::Decode));
    assert_store_file_count(dir.path(), 0);
}

#[test]
fn test_stored_photos_can_be_listed_and_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = default_pipeline(dir.path());
    let a = pipeline.ingest(&rgb_png(8, 8), "a.png").unwrap();
    let b = pipeline.ingest(&rgb_png(8, 8), "b.webp").unwrap();

    let store = pipeline.store();
    let mut listed: Vec<String> = store.list().into_iter().map(|e| e.identity).collect();
    listed.sort();
    let mut expected = vec![a.identity.clone(), b.identity.clone()];
    expected.sort();
    assert_eq!(listed, expected);

    store.delete(&a.identity).unwrap();
    assert!(matches!(store.delete(&a.identity), Err(StoreError::NotFound(_))));
    assert!(matches!(
        store.delete(&format!("../{}", b.identity)),
        Err(StoreError::InvalidTarget(_))
    ));
    assert_eq!(store.list().len(), 1);
}
