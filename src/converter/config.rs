//! # 配置模块
//!
//! ## 设计思路
//!
//! 转换链路只有两类可调参数：
//! - `ConversionOptions`：单次请求的编码参数（质量 / 无损），每个请求构造一次，不可变。
//! - `DecodeLimits`：解码阶段的资源上限，由服务启动时确定，所有请求共享同一份只读值。
//!
//! 不再保留进程级“默认转换器”实例，调用方按请求构造值即可。
//!
//! ## 实现思路
//!
//! - 质量在构造时钳制到 `[0, 100]`，超出范围不报错；`NaN` 视为默认值。
//! - `Default` 提供生产可用的参数组合。

use serde::{Deserialize, Serialize};

/// 默认 WebP 质量。
pub const DEFAULT_QUALITY: f32 = 80.0;
/// 质量下限。
pub const MIN_QUALITY: f32 = 0.0;
/// 质量上限。
pub const MAX_QUALITY: f32 = 100.0;

/// 单次转换的编码参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionOptions {
    quality: f32,
    lossless: bool,
}

impl ConversionOptions {
    /// 构造编码参数，质量超出 `[0, 100]` 时静默钳制。
    ///
    /// # 示例
    /// ```rust
    /// use image2webp::converter::ConversionOptions;
    ///
    /// assert_eq!(ConversionOptions::new(150.0, false).quality(), 100.0);
    /// assert_eq!(ConversionOptions::new(-10.0, false).quality(), 0.0);
    /// ```
    pub fn new(quality: f32, lossless: bool) -> Self {
        let quality = if quality.is_nan() {
            DEFAULT_QUALITY
        } else {
            quality.clamp(MIN_QUALITY, MAX_QUALITY)
        };

        Self { quality, lossless }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn lossless(&self) -> bool {
        self.lossless
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY, false)
    }
}

/// 解码阶段资源上限。
///
/// 字段覆盖读取原始字节与解码像素两个阶段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_input_bytes: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码器允许分配的内存上限（字节）。
    pub max_decoded_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 32 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    /// 转换为 `image` 解码器使用的限制。
    pub(crate) fn to_image_limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_alloc = Some(self.max_decoded_bytes);
        limits
    }
}
