//! # 图片转 WebP 服务：应用入口
//!
//! 本文件仅负责日志初始化、配置加载与服务启动。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use image2webp::error::AppError;
use image2webp::server;
use image2webp::settings::ServerSettings;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = ServerSettings::load()?;
    match serde_json::to_string(&settings) {
        Ok(json) => log::info!("setup: {}", json),
        Err(e) => log::warn!("无法序列化当前配置: {}", e),
    }

    let listener = TcpListener::bind(settings.bind_addr).await?;
    server::serve(listener, &settings).await
}
