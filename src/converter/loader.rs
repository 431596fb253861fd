//! # 加载与嗅探模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（内存 / 文件 / 可 seek 读取器 / 单次流）的原始字节加载，
//! 并在“尽可能早”的阶段执行体积校验与内容类型嗅探。
//!
//! ## 实现思路
//!
//! - 内存：体积校验 + 直接嗅探头部。
//! - 文件 / 可 seek 读取器：回到起点 → 通过 seek 求长度 → 读取头部嗅探 → 再次回到起点。
//!   不做整体缓冲，解码器直接随机访问底层读取器（BMP / TIFF 需要随机访问）。
//! - 单次流：按上限 +1 字节读取到内存，超限即拒绝，保证只解码一次。

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;

use super::sniff::{SNIFF_LEN, SniffedType};
use super::source::{ReadSeek, SourceReader};
use super::{ConvertError, Converter, DecodeLimits, ImageSource};

/// 加载阶段输出：可回退读取器与嗅探结果。
pub(crate) struct LoadedSource {
    pub(crate) reader: SourceReader,
    pub(crate) sniffed: SniffedType,
    pub(crate) len: u64,
    pub(crate) source_hint: &'static str,
}

impl Converter {
    /// 从任意来源加载原始字节并嗅探内容类型。
    pub(crate) fn load_source(&self, source: ImageSource) -> Result<LoadedSource, ConvertError> {
        let source_hint = source.hint();
        let limits = &self.limits;

        let (reader, sniffed, len) = match source {
            ImageSource::Bytes(bytes) => Self::load_from_bytes(bytes, limits)?,
            ImageSource::File(path) => Self::load_from_file(&path, limits)?,
            ImageSource::Seekable(reader) => Self::load_from_seekable(reader, limits)?,
            ImageSource::Stream(reader) => Self::load_from_stream(reader, limits)?,
        };

        log::info!(
            "🔍 检测到内容类型：{}，来源：{}，大小：{} bytes",
            sniffed.content_type(),
            source_hint,
            len
        );

        Ok(LoadedSource {
            reader,
            sniffed,
            len,
            source_hint,
        })
    }

    fn load_from_bytes(
        bytes: Bytes,
        limits: &DecodeLimits,
    ) -> Result<(SourceReader, SniffedType, u64), ConvertError> {
        let len = bytes.len() as u64;
        Self::validate_input_size(len, limits)?;
        Self::ensure_not_empty(len)?;

        let sniffed = SniffedType::detect(&bytes[..bytes.len().min(SNIFF_LEN)]);
        Ok((SourceReader::Memory(Cursor::new(bytes)), sniffed, len))
    }

    fn load_from_file(
        path: &Path,
        limits: &DecodeLimits,
    ) -> Result<(SourceReader, SniffedType, u64), ConvertError> {
        let file = File::open(path).map_err(|e| {
            ConvertError::Read(format!("无法打开文件 {}：{}", path.display(), e))
        })?;
        Self::load_from_seekable(Box::new(file), limits)
    }

    fn load_from_seekable(
        reader: Box<dyn ReadSeek>,
        limits: &DecodeLimits,
    ) -> Result<(SourceReader, SniffedType, u64), ConvertError> {
        let mut reader = SourceReader::Seekable(io::BufReader::new(reader));

        let len = reader
            .seek(SeekFrom::End(0))
            .map_err(|e| ConvertError::Read(format!("无法定位输入末尾：{}", e)))?;
        Self::validate_input_size(len, limits)?;
        Self::ensure_not_empty(len)?;

        reader
            .rewind_to_start()
            .map_err(|e| ConvertError::Read(format!("无法回到输入起点：{}", e)))?;

        let mut header = Vec::with_capacity(SNIFF_LEN);
        (&mut reader)
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut header)
            .map_err(|e| ConvertError::Read(format!("读取文件头失败：{}", e)))?;
        let sniffed = SniffedType::detect(&header);

        reader
            .rewind_to_start()
            .map_err(|e| ConvertError::Read(format!("无法回到输入起点：{}", e)))?;

        Ok((reader, sniffed, len))
    }

    fn load_from_stream(
        reader: Box<dyn Read + Send>,
        limits: &DecodeLimits,
    ) -> Result<(SourceReader, SniffedType, u64), ConvertError> {
        let mut buffer = Vec::new();
        reader
            .take(limits.max_input_bytes.saturating_add(1))
            .read_to_end(&mut buffer)
            .map_err(|e| ConvertError::Read(e.to_string()))?;

        Self::load_from_bytes(Bytes::from(buffer), limits)
    }

    /// 校验原始字节体积是否超过配置上限。
    fn validate_input_size(len: u64, limits: &DecodeLimits) -> Result<(), ConvertError> {
        if len > limits.max_input_bytes {
            return Err(ConvertError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                limits.max_input_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn ensure_not_empty(len: u64) -> Result<(), ConvertError> {
        if len == 0 {
            return Err(ConvertError::Decode {
                detected: SniffedType::Unknown.content_type().to_string(),
                cause: "图片内容为空".to_string(),
            });
        }

        Ok(())
    }
}
