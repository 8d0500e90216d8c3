//! Common helpers for router tests: app construction, multipart bodies,
//! response decoding and image fixtures.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use pf_core::store::PhotoStore;
use pf_protocol::config_models::NormalizeConfig;
use pf_web::{router, AppState};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "pf-test-boundary";

/// Router over a fresh temporary store.
///
/// Returns the TempDir, which must be kept alive for the test duration.
pub fn test_app(max_file_bytes: u64) -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let state = AppState::new(
        PhotoStore::new(dir.path()),
        NormalizeConfig::default(),
        max_file_bytes,
    );
    (dir, router(Arc::new(state)))
}

/// Encode a multipart body with one part per `(field, filename, bytes)`.
pub fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload_photo")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("build upload request")
}

pub fn delete_request(json: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/delete_photo")
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .expect("build delete request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build get request")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("read response body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response is JSON")
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([30, 60, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([90, 60, 30]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}
