//! # HTTP 处理层
//!
//! 处理函数仅做参数接收与响应组装，不承载业务逻辑。
//! 所有实际处理交由 `Converter`，保持处理函数薄、稳定、易测试。

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio_util::io::ReaderStream;

use super::AppState;
use super::params::ConversionQuery;
use crate::converter::{ConversionRequest, ConvertError, PIPE_CHUNK_SIZE, is_supported_filename};
use crate::error::AppError;

/// 上传表单中的文件字段名。
pub const IMAGE_FIELD: &str = "image";
pub const CONVERTED_FILENAME_HEADER: &str = "X-Converted-Filename";
const WEBP_CONTENT_TYPE: &str = "image/webp";

/// `POST /v1/upload`：上传图片并以流的形式返回 WebP。
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let options = ConversionQuery::from_pairs(pairs).options();
    let (filename, data) = read_image_field(&mut multipart).await?;

    if !is_supported_filename(&filename) {
        return Err(ConvertError::UnsupportedFormat(filename).into());
    }

    log::info!(
        "📥 收到上传 - {} ({} bytes) quality={} lossless={}",
        filename,
        data.len(),
        options.quality(),
        options.lossless()
    );

    let converter = state.converter.clone();
    let result = tokio::task::spawn_blocking(move || {
        converter.convert(ConversionRequest::new(data, filename, options))
    })
    .await
    .map_err(|e| ConvertError::Encode(format!("转换任务执行失败：{}", e)))??;

    let header_filename = sanitize_header_filename(&result.filename);
    let body = Body::from_stream(ReaderStream::with_capacity(result.stream, PIPE_CHUNK_SIZE));

    Response::builder()
        .header(CONTENT_TYPE, WEBP_CONTENT_TYPE)
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", header_filename),
        )
        .header(CONVERTED_FILENAME_HEADER, header_filename)
        .body(body)
        .map_err(|e| AppError::from(ConvertError::Encode(format!("构建响应失败：{}", e))))
}

/// `GET /v1/health`：固定的健康检查响应。
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "webp-converter",
    }))
}

/// 读取 `image` 字段的文件名与内容，忽略其余字段。
async fn read_image_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;
        return Ok((filename, data));
    }

    Err(AppError::MissingField(IMAGE_FIELD))
}

/// 替换会破坏响应头的字符（引号、反斜杠、控制字符）。
fn sanitize_header_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}
