//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载转换链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 错误分两类：
//! - 输入问题（扩展名不支持、解码失败、读取失败、超出资源限制）：调用方应视为客户端错误。
//! - 编码问题：意味着流水线缺陷或资源耗尽，调用方应视为服务端错误。

use std::io;

/// 转换链路统一错误类型。
///
/// 所有变体只携带字符串上下文，因此可以 `Clone`，
/// 编码失败时同一个错误既返回给生产者，也通过管道交给读取端。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("不支持的图片格式：{0}（支持：jpg, jpeg, png, bmp, tiff）")]
    UnsupportedFormat(String),

    #[error("图片解码失败（检测类型：{detected}）：{cause}")]
    Decode { detected: String, cause: String },

    #[error("读取上传内容失败：{0}")]
    Read(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("WebP 编码失败：{0}")]
    Encode(String),
}

impl ConvertError {
    /// 稳定的机器可读错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Decode { .. } => "decode_failed",
            Self::Read(_) => "read_failed",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Encode(_) => "encode_failed",
        }
    }

    /// 出错时所处的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "validate",
            Self::Read(_) | Self::ResourceLimit(_) => "load",
            Self::Decode { .. } => "decode",
            Self::Encode(_) => "encode",
        }
    }

    /// 是否由输入本身导致（而非服务内部故障）。
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Encode(_))
    }

    /// 包装为管道读取端可见的 I/O 错误。
    ///
    /// 读取端可通过 `io::Error::get_ref` + `downcast_ref::<ConvertError>` 取回原始错误。
    pub fn into_io_error(self) -> io::Error {
        io::Error::other(self)
    }
}
