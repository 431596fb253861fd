//! # 解码调度模块
//!
//! ## 设计思路
//!
//! 将“可回退字节 → 像素图”的过程集中管理：
//! 嗅探结果决定优先使用哪个专用解码器，但嗅探只是建议，解码成功才是最终准入条件。
//!
//! ## 实现思路
//!
//! 1. 按嗅探结果调用专用解码器（未知类型跳过此步）
//! 2. 失败后回退：先让 `image` 按自身 magic 表猜测，再逐个试探已注册解码器
//! 3. 全部失败时返回 `Decode { detected, cause }`，`cause` 取专用解码器的错误（没有则取最后一次）
//! 4. 成功后校验像素上限

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use super::loader::LoadedSource;
use super::source::{SourceImage, SourceReader};
use super::{ConvertError, Converter, DecodeLimits};

/// 通用回退时逐个试探的解码器。
///
/// 只包含具有 magic number 的格式，避免无签名格式（如 TGA）把损坏数据误解码成功。
const FALLBACK_FORMATS: [ImageFormat; 6] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

impl Converter {
    /// 将已加载的字节解码为像素图。
    pub(crate) fn decode_source(&self, loaded: LoadedSource) -> Result<SourceImage, ConvertError> {
        let LoadedSource {
            mut reader,
            sniffed,
            source_hint,
            ..
        } = loaded;
        let detected = sniffed.content_type();

        let mut attempted = Vec::with_capacity(FALLBACK_FORMATS.len() + 1);
        let mut first_error = None;

        if let Some(format) = sniffed.decoder_format() {
            attempted.push(format);
            match Self::decode_as(&mut reader, format, &self.limits) {
                Ok(pixels) => return self.finish_decode(pixels, format, source_hint),
                Err(e) => {
                    log::warn!(
                        "⚠️ 专用解码器失败（{}），回退通用解码：{}",
                        format_name(format),
                        e
                    );
                    first_error = Some(e);
                }
            }
        }

        let (pixels, format) = self
            .decode_with_fallback(&mut reader, &mut attempted)
            .map_err(|last_error| ConvertError::Decode {
                detected: detected.to_string(),
                cause: first_error.unwrap_or(last_error),
            })?;

        self.finish_decode(pixels, format, source_hint)
    }

    /// 通用回退：先按 magic 猜测，再逐个试探。
    ///
    /// 返回最后一次失败的原因。
    fn decode_with_fallback(
        &self,
        reader: &mut SourceReader,
        attempted: &mut Vec<ImageFormat>,
    ) -> Result<(DynamicImage, ImageFormat), String> {
        let mut last_error = "没有可用的解码器".to_string();

        if let Some(guessed) = Self::guess_format(reader)? {
            if !attempted.contains(&guessed) {
                attempted.push(guessed);
                match Self::decode_as(reader, guessed, &self.limits) {
                    Ok(pixels) => return Ok((pixels, guessed)),
                    Err(e) => last_error = e,
                }
            }
        }

        for format in FALLBACK_FORMATS {
            if attempted.contains(&format) {
                continue;
            }
            attempted.push(format);

            match Self::decode_as(reader, format, &self.limits) {
                Ok(pixels) => {
                    log::info!("🧩 试探解码命中：{}", format_name(format));
                    return Ok((pixels, format));
                }
                Err(e) => {
                    log::debug!("试探解码 {} 失败：{}", format_name(format), e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn guess_format(reader: &mut SourceReader) -> Result<Option<ImageFormat>, String> {
        reader.rewind_to_start().map_err(|e| e.to_string())?;
        let guessed = ImageReader::new(&mut *reader)
            .with_guessed_format()
            .map_err(|e| e.to_string())?
            .format();
        Ok(guessed)
    }

    /// 以指定格式从起点完整解码一次。
    fn decode_as(
        reader: &mut SourceReader,
        format: ImageFormat,
        limits: &DecodeLimits,
    ) -> Result<DynamicImage, String> {
        reader.rewind_to_start().map_err(|e| e.to_string())?;

        let mut image_reader = ImageReader::with_format(&mut *reader, format);
        image_reader.limits(limits.to_image_limits());
        image_reader.decode().map_err(|e| e.to_string())
    }

    fn finish_decode(
        &self,
        pixels: DynamicImage,
        format: ImageFormat,
        source_hint: &'static str,
    ) -> Result<SourceImage, ConvertError> {
        let (width, height) = pixels.dimensions();
        Self::validate_pixel_limits(&self.limits, width, height)?;

        let name = format_name(format);
        log::info!(
            "✅ 图片解码成功 - 来源: {} 格式: {} 尺寸: {}x{}",
            source_hint,
            name,
            width,
            height
        );

        Ok(SourceImage::new(pixels, name))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(limits: &DecodeLimits, width: u32, height: u32) -> Result<(), ConvertError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ConvertError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > limits.max_decoded_pixels {
            return Err(ConvertError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, limits.max_decoded_pixels
            )));
        }

        Ok(())
    }
}

/// 解码器格式名称。
pub(crate) fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("unknown")
}
