//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级统一的 `AppError` 枚举，HTTP 处理函数统一返回 `Result<T, AppError>`。
//! 客户端收到的状态码由错误种类决定：输入问题 → 4xx，内部故障 → 5xx，
//! 响应体为纯文本错误描述。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ConvertError` 提供 `From` 转换，无需手动 map。
//! - 实现 axum 的 `IntoResponse`，替代各处理函数中分散的状态码拼装。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::converter::ConvertError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片转换流水线错误（校验 / 加载 / 解码 / 编码）
    #[error("{0}")]
    Convert(#[from] ConvertError),

    /// multipart 表单解析失败
    #[error("表单解析失败: {0}")]
    Upload(String),

    /// 缺少上传字段
    #[error("缺少上传字段: {0}")]
    MissingField(&'static str),

    /// 服务配置无效
    #[error("配置错误: {0}")]
    Settings(String),

    /// 文件系统 / 网络 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Convert(ConvertError::ResourceLimit(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Convert(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Convert(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upload(_) | Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::Settings(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 响应体文案前缀。
    fn response_prefix(&self) -> &'static str {
        match self {
            Self::Convert(ConvertError::UnsupportedFormat(_)) => "Unsupported image format",
            Self::Convert(_) => "Conversion failed",
            Self::Upload(_) => "Failed to parse form",
            Self::MissingField(_) => "Failed to get file",
            Self::Settings(_) | Self::Io(_) => "Internal error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("❌ 请求处理失败: {}", self);
        } else {
            log::warn!("⚠️ 请求被拒绝: {}", self);
        }

        (status, format!("{}: {}", self.response_prefix(), self)).into_response()
    }
}
