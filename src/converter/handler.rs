//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `Converter` 只负责流程编排，不与 HTTP 层绑定。
//! 处理链路固定为：
//! 1. 加载原始字节并嗅探内容类型
//! 2. 按嗅探结果调度解码器（失败回退通用解码）
//! 3. 启动生产者任务，把 WebP 编码结果写入管道
//! 4. 立即返回管道读端与派生文件名
//!
//! ## 实现思路
//!
//! - `Converter` 只持有不可变的资源上限，可在请求间自由共享，没有可变全局状态。
//! - 每次请求独占自己的字节、像素图与管道，至多一次解码、一次编码。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。

use std::fs;
use std::path::Path;
use std::time::Instant;

use super::bridge::DEFAULT_PIPE_CAPACITY;
use super::encoder::{check_encodable, encode_webp, spawn_encoder};
use super::naming::derive_output_filename;
use super::{ConversionOptions, ConversionRequest, ConversionResult, ConvertError, DecodeLimits, ImageSource, SourceImage};

/// 图片转换器。
#[derive(Debug, Clone)]
pub struct Converter {
    pub(super) limits: DecodeLimits,
    pipe_capacity: usize,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DecodeLimits::default())
    }
}

impl Converter {
    /// 根据资源上限创建转换器。
    ///
    /// # 示例
    /// ```rust
    /// use image2webp::converter::{Converter, DecodeLimits};
    ///
    /// let converter = Converter::new(DecodeLimits::default());
    /// assert_eq!(converter.limits().max_decoded_pixels, 40_000_000);
    /// ```
    pub fn new(limits: DecodeLimits) -> Self {
        Self {
            limits,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    /// 设置管道容量（分块数）。
    pub fn with_pipe_capacity(mut self, pipe_capacity: usize) -> Self {
        self.pipe_capacity = pipe_capacity.max(1);
        self
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// 仅执行加载与解码。
    pub fn decode(&self, source: ImageSource) -> Result<SourceImage, ConvertError> {
        let loaded = self.load_source(source)?;
        self.decode_source(loaded)
    }

    /// 处理主入口：解码输入并返回惰性 WebP 字节流。
    ///
    /// 解码在当前线程同步完成；编码在后台任务中与读取并行进行。
    /// 必须在 Tokio 运行时中调用（HTTP 层在 `spawn_blocking` 中调用）。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image2webp::converter::{ConversionOptions, ConversionRequest, Converter};
    ///
    /// # async fn demo(bytes: Vec<u8>) -> Result<(), image2webp::converter::ConvertError> {
    /// let converter = Converter::default();
    /// let result = converter.convert(ConversionRequest::new(bytes, "photo.png", ConversionOptions::default()))?;
    /// assert_eq!(result.filename, "photo.webp");
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert(&self, request: ConversionRequest) -> Result<ConversionResult, ConvertError> {
        let ConversionRequest {
            source,
            filename,
            options,
        } = request;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let loaded = self.load_source(source)?;
        let detected_type = loaded.sniffed.content_type();
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let image = self.decode_source(loaded)?;
        let source_format = image.format_name();
        let decode_elapsed = decode_start.elapsed();

        // 超出 WebP 尺寸上限的图在返回字节流之前拒绝。
        check_encodable(image.width(), image.height())?;

        let (stream, _producer) = spawn_encoder(image, options, self.pipe_capacity)?;
        let filename = derive_output_filename(&filename);

        log::info!(
            "✅ 转换已启动 - {} ({}) -> {} load={}ms decode={}ms total={}ms",
            detected_type,
            source_format,
            filename,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ConversionResult {
            stream,
            filename,
            detected_type,
            source_format,
        })
    }

    /// 本地文件转换：同步解码、编码并写入目标文件，返回写入字节数。
    pub fn convert_file(
        &self,
        input: &Path,
        output: &Path,
        options: ConversionOptions,
    ) -> Result<u64, ConvertError> {
        let start = Instant::now();
        let image = self.decode(ImageSource::File(input.to_path_buf()))?;
        let encoded = encode_webp(&image, options)?;

        fs::write(output, &*encoded).map_err(|e| {
            ConvertError::Encode(format!("写入输出文件 {} 失败：{}", output.display(), e))
        })?;

        log::info!(
            "✅ 本地文件转换完成 - {} -> {} ({} bytes, {}ms)",
            input.display(),
            output.display(),
            encoded.len(),
            start.elapsed().as_millis()
        );

        Ok(encoded.len() as u64)
    }
}
