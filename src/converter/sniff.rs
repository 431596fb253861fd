//! # 内容类型嗅探
//!
//! 仅依据文件头 magic bytes 分类，不看扩展名（上传文件名不可信）。
//! 嗅探结果只是建议：真正的准入条件是解码是否成功。

use image::ImageFormat;

/// 嗅探时读取的头部字节数。
pub const SNIFF_LEN: usize = 512;

/// 嗅探得到的内容类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedType {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    /// 可识别但不在调度表中的类型（MIME）。
    Other(&'static str),
    /// 无法识别。
    Unknown,
}

impl SniffedType {
    /// 对头部字节做嗅探。
    ///
    /// 调用方应传入至少 [`SNIFF_LEN`] 字节（不足时传入全部内容）。
    pub fn detect(header: &[u8]) -> Self {
        let Some(kind) = infer::get(header) else {
            return Self::Unknown;
        };

        match kind.mime_type() {
            "image/png" => Self::Png,
            "image/jpeg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/bmp" => Self::Bmp,
            "image/tiff" => Self::Tiff,
            other => Self::Other(other),
        }
    }

    /// 内容类型字符串，用于日志与错误上下文。
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Other(mime) => mime,
            Self::Unknown => "application/octet-stream",
        }
    }

    /// 对应的专用解码器；不在调度表中时返回 `None`，直接走通用回退。
    pub fn decoder_format(&self) -> Option<ImageFormat> {
        match self {
            Self::Png => Some(ImageFormat::Png),
            Self::Jpeg => Some(ImageFormat::Jpeg),
            Self::Gif => Some(ImageFormat::Gif),
            Self::Bmp => Some(ImageFormat::Bmp),
            Self::Tiff => Some(ImageFormat::Tiff),
            Self::Other(_) | Self::Unknown => None,
        }
    }
}
