//! # 图片转 WebP 服务：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 客户端（浏览器 / curl）                   │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ HTTP（multipart 上传 / 流式 WebP 响应）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ server ────── 路由 / 上传处理 / 健康检查 / 静态文件   │
//! │  │                                                       │
//! │  ├─ converter ─── 嗅探 · 解码调度 · 流式编码              │
//! │  │   ├─ pipeline       专用解码 + 通用回退               │
//! │  │   └─ bridge         生产者 ⇢ 消费者字节管道           │
//! │  │                                                       │
//! │  ├─ settings      配置文件 + 环境变量                     │
//! │  └─ error ─────── AppError (统一错误类型)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，映射为 HTTP 状态码与响应体 |
//! | [`converter`] | 单张图片：加载、嗅探、解码、WebP 流式编码 |
//! | [`server`] | HTTP 路由与处理函数 |
//! | [`settings`] | 服务配置加载 |

pub mod converter;
pub mod error;
pub mod server;
pub mod settings;
