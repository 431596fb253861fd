//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义（内存 / 本地文件 / 可随机访问的读取器 / 只读一次的流）
//! - `SourceReader` 表示已就绪、可回退到起点的字节读取器
//! - `SourceImage` 表示已完成解码、与原格式无关的像素图
//! - `ConversionResult` 表示惰性的 WebP 字节流与派生文件名

use std::io::{self, BufRead, Cursor, Read, Seek, SeekFrom};
use std::path::PathBuf;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

use super::bridge::PipeReader;
use super::ConversionOptions;

/// 可随机访问的字节读取器。
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// 图片输入来源。
pub enum ImageSource {
    /// 已在内存中的完整内容（如 multipart 上传字段）。
    Bytes(Bytes),
    /// 本地文件路径。
    File(PathBuf),
    /// 支持 seek 的读取器，解码前会回退到起点。
    Seekable(Box<dyn ReadSeek>),
    /// 只能读取一次的流，解码前会先完整缓冲到内存。
    Stream(Box<dyn Read + Send>),
}

impl ImageSource {
    /// 来源提示（用于日志与诊断）。
    pub(crate) fn hint(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "memory",
            Self::File(_) => "file",
            Self::Seekable(_) => "seekable",
            Self::Stream(_) => "stream",
        }
    }
}

impl From<Bytes> for ImageSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

/// 单次转换请求。
pub struct ConversionRequest {
    pub source: ImageSource,
    /// 原始文件名，仅用于派生输出文件名。
    pub filename: String,
    pub options: ConversionOptions,
}

impl ConversionRequest {
    pub fn new(source: impl Into<ImageSource>, filename: impl Into<String>, options: ConversionOptions) -> Self {
        Self {
            source: source.into(),
            filename: filename.into(),
            options,
        }
    }
}

/// 加载阶段输出：可回退的字节读取器。
///
/// 内存内容与可 seek 读取器统一成同一类型，解码器无需关心来源。
pub(crate) enum SourceReader {
    Memory(Cursor<Bytes>),
    Seekable(io::BufReader<Box<dyn ReadSeek>>),
}

impl SourceReader {
    pub(crate) fn rewind_to_start(&mut self) -> io::Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Memory(cursor) => cursor.read(buf),
            Self::Seekable(reader) => reader.read(buf),
        }
    }
}

impl BufRead for SourceReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            Self::Memory(cursor) => cursor.fill_buf(),
            Self::Seekable(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            Self::Memory(cursor) => cursor.consume(amt),
            Self::Seekable(reader) => reader.consume(amt),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Memory(cursor) => cursor.seek(pos),
            Self::Seekable(reader) => reader.seek(pos),
        }
    }
}

/// 解码阶段输出：与来源格式无关的像素图。
///
/// 构造后只读，只会被一个编码任务持有。
#[derive(Debug)]
pub struct SourceImage {
    pixels: DynamicImage,
    format: &'static str,
}

impl SourceImage {
    pub(crate) fn new(pixels: DynamicImage, format: &'static str) -> Self {
        Self { pixels, format }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// 解码器报告的格式名称，仅用于诊断。
    pub fn format_name(&self) -> &'static str {
        self.format
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

/// 转换结果：惰性 WebP 字节流与派生文件名。
///
/// 字节流只能读取一次；读完或丢弃后编码任务随之结束。
pub struct ConversionResult {
    pub stream: PipeReader,
    pub filename: String,
    /// 嗅探得到的输入内容类型。
    pub detected_type: &'static str,
    /// 解码器报告的输入格式。
    pub source_format: &'static str,
}
