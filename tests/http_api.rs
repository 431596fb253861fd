// HTTP surface tests: spins the router on an ephemeral port and drives it with reqwest
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use image2webp::converter::Converter;
use image2webp::server::{self, AppState};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tokio::net::TcpListener;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

fn temp_static_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("image2webp-front-{}", nanos));
    std::fs::create_dir_all(&dir).expect("create static dir");
    dir
}

async fn spawn_app(static_dir: &Path) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let state = Arc::new(AppState {
        converter: Converter::default(),
    });
    let app = server::router(state, static_dir, 8 * 1024 * 1024);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    addr
}

fn image_form(bytes: Vec<u8>, filename: &str) -> Form {
    Form::new().part("image", Part::bytes(bytes).file_name(filename.to_string()))
}

#[tokio::test]
async fn health_returns_fixed_payload() {
    let addr = spawn_app(&temp_static_dir()).await;

    let resp = reqwest::get(format!("http://{addr}/v1/health"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.expect("json body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "webp-converter");
}

#[tokio::test]
async fn upload_streams_webp_with_derived_filename() {
    let addr = spawn_app(&temp_static_dir()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload?quality=65"))
        .multipart(image_form(png_bytes(64, 48), "photo.PNG"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers().clone();
    assert_eq!(headers["content-type"], "image/webp");
    assert_eq!(headers["x-converted-filename"], "photo.webp");
    assert_eq!(headers["content-disposition"], "attachment; filename=\"photo.webp\"");

    let body = resp.bytes().await.expect("body");
    assert_eq!(&body[0..4], b"RIFF");
    assert_eq!(&body[8..12], b"WEBP");

    let decoded = image::load_from_memory(&body).expect("decode response");
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[tokio::test]
async fn lossless_query_produces_exact_pixels() {
    let addr = spawn_app(&temp_static_dir()).await;
    let png = png_bytes(16, 16);
    let expected = image::load_from_memory(&png).expect("decode fixture").to_rgb8();

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload?lossless=1&quality=not-a-number"))
        .multipart(image_form(png, "exact.png"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.bytes().await.expect("body");
    let decoded = image::load_from_memory(&body).expect("decode response").to_rgb8();
    assert_eq!(decoded, expected);
}

#[tokio::test]
async fn repeated_query_keys_use_first_value() {
    let addr = spawn_app(&temp_static_dir()).await;
    let png = png_bytes(16, 16);
    let expected = image::load_from_memory(&png).expect("decode fixture").to_rgb8();

    // 第一个 lossless 生效：输出必须逐像素一致。
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload?quality=50&quality=60&lossless=1&lossless=0"))
        .multipart(image_form(png, "dup.png"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.bytes().await.expect("body");
    let decoded = image::load_from_memory(&body).expect("decode response").to_rgb8();
    assert_eq!(decoded, expected);
}

#[tokio::test]
async fn image_too_wide_for_webp_is_an_internal_error() {
    let addr = spawn_app(&temp_static_dir()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload"))
        .multipart(image_form(png_bytes(17_000, 2), "wide.png"))
        .send()
        .await
        .expect("request should get a complete response");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = resp.text().await.expect("body");
    assert!(text.starts_with("Conversion failed"), "body was {text:?}");
    assert!(text.contains("16383"), "body was {text:?}");
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_decode() {
    let addr = spawn_app(&temp_static_dir()).await;

    // 内容是合法 PNG，但扩展名不在允许列表中。
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload"))
        .multipart(image_form(png_bytes(8, 8), "animation.gif"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let text = resp.text().await.expect("body");
    assert!(text.starts_with("Unsupported image format"), "body was {text:?}");
}

#[tokio::test]
async fn corrupt_upload_is_a_client_error() {
    let addr = spawn_app(&temp_static_dir()).await;
    let mut png = png_bytes(32, 32);
    png.truncate(50);

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload"))
        .multipart(image_form(png, "broken.png"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let text = resp.text().await.expect("body");
    assert!(text.starts_with("Conversion failed"), "body was {text:?}");
    assert!(text.contains("image/png"), "body was {text:?}");
}

#[tokio::test]
async fn missing_image_field_is_a_client_error() {
    let addr = spawn_app(&temp_static_dir()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/v1/upload"))
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await
        .expect("request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let text = resp.text().await.expect("body");
    assert!(text.starts_with("Failed to get file"), "body was {text:?}");
}

#[tokio::test]
async fn upload_rejects_other_methods() {
    let addr = spawn_app(&temp_static_dir()).await;

    let resp = reqwest::get(format!("http://{addr}/v1/upload"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn static_files_are_served_from_front_dir() {
    let dir = temp_static_dir();
    std::fs::write(dir.join("index.html"), "<h1>upload</h1>").expect("write index");
    let addr = spawn_app(&dir).await;

    let resp = reqwest::get(format!("http://{addr}/index.html"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "<h1>upload</h1>");

    let _ = std::fs::remove_dir_all(&dir);
}
