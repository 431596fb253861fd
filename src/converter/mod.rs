//! # 图片转换模块（converter）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 内容嗅探 → 解码调度 → 流式编码”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线
//! - `loader`：负责内存 / 文件 / 流的加载、体积校验与回退
//! - `sniff`：magic bytes 内容类型嗅探
//! - `pipeline`：负责解码调度、通用回退与像素限制
//! - `encoder`：WebP 编码与生产者任务
//! - `bridge`：生产者与消费者之间的进程内字节管道
//! - `naming`：输出文件名派生与扩展名预检
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! HTTP 上传处理（server）
//!    ↓  naming::is_supported_filename（扩展名预检）
//! handler.rs（Converter::convert，统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（加载 + 体积校验 + 回到起点）
//!    │    └─ sniff.rs（头部 512 字节嗅探）
//!    ├─ pipeline.rs（专用解码 → 通用回退 → 像素限制）
//!    └─ encoder.rs（spawn_blocking 生产者）
//!         └─ bridge.rs（PipeWriter ⇢ PipeReader）
//!    ↓
//! 返回 ConversionResult（惰性字节流 + 派生文件名）
//! ```
//!
//! ## 分层职责建议
//!
//! - 编码参数与资源上限变更优先改 `config.rs`
//! - 业务流程顺序变更优先改 `handler.rs`
//! - 新增输入格式优先改 `sniff.rs` 与 `pipeline.rs` 的回退表

mod bridge;
mod config;
mod encoder;
mod error;
mod handler;
mod loader;
mod naming;
mod pipeline;
mod sniff;
mod source;

pub use bridge::{DEFAULT_PIPE_CAPACITY, PIPE_CHUNK_SIZE, PipeReader, PipeWriter, pipe};
pub use config::{ConversionOptions, DEFAULT_QUALITY, DecodeLimits, MAX_QUALITY, MIN_QUALITY};
pub use encoder::{WEBP_MAX_DIMENSION, check_encodable, encode_webp, spawn_encoder};
pub use error::ConvertError;
pub use handler::Converter;
pub use naming::{
    OUTPUT_EXTENSION, SUPPORTED_EXTENSIONS, derive_output_filename, extension, is_supported_filename,
};
pub use sniff::{SNIFF_LEN, SniffedType};
pub use source::{ConversionRequest, ConversionResult, ImageSource, ReadSeek, SourceImage};
