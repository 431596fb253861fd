//! # WebP 编码与生产者任务
//!
//! ## 设计思路
//!
//! 编码是 CPU 密集的同步操作，放进阻塞线程池执行；编码结果分块写入管道，
//! 调用方立即拿到读端，无需等待整张图编码并缓冲完毕。
//!
//! ## 实现思路
//!
//! - `encode_webp`：同步编码，供管道生产者与本地文件转换共用。
//! - `spawn_encoder`：每次转换一个生产者任务，成功 / 失败路径都恰好关闭写端一次；
//!   失败时错误通过管道送达读端，而不是只写日志。
//! - 像素图在编码完成后立即释放，写管道阶段只持有编码结果。

use std::borrow::Cow;
use std::io::Write;

use image::{DynamicImage, GenericImageView};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use webp::{WebPConfig, WebPMemory};

use super::bridge::{PipeReader, PipeWriter, pipe};
use super::{ConversionOptions, ConvertError, SourceImage};

/// libwebp 单边尺寸上限（像素）。
pub const WEBP_MAX_DIMENSION: u32 = 16383;

/// 编码前的尺寸检查：空图与超出 WebP 单边上限的图都无法编码。
pub fn check_encodable(width: u32, height: u32) -> Result<(), ConvertError> {
    if width == 0 || height == 0 {
        return Err(ConvertError::Encode(format!("图像尺寸无效：{}x{}", width, height)));
    }
    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(ConvertError::Encode(format!(
            "图像尺寸 {}x{} 超出 WebP 单边上限 {}",
            width, height, WEBP_MAX_DIMENSION
        )));
    }
    Ok(())
}

/// 将像素图编码为 WebP。
///
/// 带 alpha 通道的图保留透明度，其余按 RGB 编码以减小体积。
pub fn encode_webp(image: &SourceImage, options: ConversionOptions) -> Result<WebPMemory, ConvertError> {
    let pixels = image.pixels();
    let (width, height) = pixels.dimensions();
    check_encodable(width, height)?;

    let mut config =
        WebPConfig::new().map_err(|_| ConvertError::Encode("无法创建 WebPConfig".to_string()))?;
    config.lossless = i32::from(options.lossless());
    config.quality = options.quality();
    config.alpha_compression = i32::from(!options.lossless());

    let encoded = if pixels.color().has_alpha() {
        let rgba: Cow<'_, image::RgbaImage> = match pixels {
            DynamicImage::ImageRgba8(rgba) => Cow::Borrowed(rgba),
            _ => Cow::Owned(pixels.to_rgba8()),
        };
        webp::Encoder::from_rgba(&rgba, width, height).encode_advanced(&config)
    } else {
        let rgb: Cow<'_, image::RgbImage> = match pixels {
            DynamicImage::ImageRgb8(rgb) => Cow::Borrowed(rgb),
            _ => Cow::Owned(pixels.to_rgb8()),
        };
        webp::Encoder::from_rgb(&rgb, width, height).encode_advanced(&config)
    };

    encoded.map_err(|e| ConvertError::Encode(format!("{e:?}")))
}

/// 启动生产者任务，返回管道读端与任务句柄。
///
/// 任务句柄返回成功写入管道的字节数；调用方可以直接丢弃句柄，任务在读端关闭后自行结束。
/// 必须在 Tokio 运行时中调用。
pub fn spawn_encoder(
    image: SourceImage,
    options: ConversionOptions,
    pipe_capacity: usize,
) -> Result<(PipeReader, JoinHandle<Result<u64, ConvertError>>), ConvertError> {
    let runtime = Handle::try_current()
        .map_err(|e| ConvertError::Encode(format!("没有可用的异步运行时：{}", e)))?;

    let (writer, reader) = pipe(pipe_capacity);
    let producer = runtime.spawn_blocking(move || produce(image, options, writer));

    Ok((reader, producer))
}

fn produce(image: SourceImage, options: ConversionOptions, mut writer: PipeWriter) -> Result<u64, ConvertError> {
    let (width, height) = image.dimensions();
    let encoded = encode_webp(&image, options);
    drop(image);

    let result = encoded.and_then(|memory| {
        writer
            .write_all(&memory)
            .map_err(|e| ConvertError::Encode(format!("写入输出流失败：{}", e)))
    });

    match result {
        Ok(()) => {
            let written = writer.bytes_written();
            writer.close();
            log::debug!(
                "📦 WebP 编码完成 - {}x{} quality={} lossless={} output={} bytes",
                width,
                height,
                options.quality(),
                options.lossless(),
                written
            );
            Ok(written)
        }
        Err(e) => {
            log::warn!("⚠️ WebP 生产者终止：{}", e);
            writer.close_with_error(e.clone().into_io_error());
            Err(e)
        }
    }
}
