//! # HTTP 服务模块
//!
//! ## 设计思路
//!
//! HTTP 层只是转换流水线外侧的薄封装：
//! - `POST /v1/upload`：multipart 上传 → 扩展名预检 → 转换 → 流式响应
//! - `GET /v1/health`：固定 JSON
//! - 其余路径：静态文件（测试页面）
//!
//! 共享状态 `AppState` 构造后只读，请求之间没有可变共享数据。

pub mod handlers;
pub mod params;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::converter::Converter;
use crate::error::AppError;
use crate::settings::ServerSettings;

/// 服务共享状态。
#[derive(Debug, Clone)]
pub struct AppState {
    pub converter: Converter,
}

impl AppState {
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            converter: Converter::new(settings.limits.clone()).with_pipe_capacity(settings.pipe_capacity),
        }
    }
}

/// 构建路由。
pub fn router(state: Arc<AppState>, static_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/v1/upload", post(handlers::upload))
        .route("/v1/health", get(handlers::health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// 在已绑定的监听器上运行服务，直到收到 Ctrl+C。
pub async fn serve(listener: TcpListener, settings: &ServerSettings) -> Result<(), AppError> {
    let state = Arc::new(AppState::from_settings(settings));
    let app = router(state, &settings.static_dir, settings.max_upload_bytes);

    log::info!("🚀 WebP 转换服务启动：{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("监听退出信号失败: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("收到退出信号，正在停止服务");
}
