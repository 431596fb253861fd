//! 文件名相关的纯函数：输出文件名派生与扩展名预检。
//!
//! 扩展名预检只是体验优化（提前拒绝明显不支持的上传），不是安全边界；
//! 真正的准入条件仍然是解码成功。

/// 输出文件扩展名（含点）。
pub const OUTPUT_EXTENSION: &str = ".webp";

/// 预检允许的输入扩展名（小写，含点）。
pub const SUPPORTED_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".tif"];

/// 取文件名最后一个路径分量中的扩展名（含点）；没有扩展名时返回空串。
///
/// - `"photo.JPG"` → `".JPG"`
/// - `"a.b.png"` → `".png"`
/// - `"noext"` → `""`
/// - `"dir.d/noext"` → `""`
pub fn extension(filename: &str) -> &str {
    let component_start = filename.rfind(|c: char| c == '/' || c == '\\').map_or(0, |i| i + 1);
    match filename[component_start..].rfind('.') {
        Some(dot) => &filename[component_start + dot..],
        None => "",
    }
}

/// 派生输出文件名：去掉原扩展名并追加 `.webp`。
///
/// # 示例
/// ```rust
/// use image2webp::converter::derive_output_filename;
///
/// assert_eq!(derive_output_filename("photo.JPG"), "photo.webp");
/// assert_eq!(derive_output_filename("noext"), "noext.webp");
/// assert_eq!(derive_output_filename("a.b.png"), "a.b.webp");
/// ```
pub fn derive_output_filename(original: &str) -> String {
    let ext = extension(original);
    let base = &original[..original.len() - ext.len()];
    format!("{base}{OUTPUT_EXTENSION}")
}

/// 按扩展名（不区分大小写）判断是否允许上传。
pub fn is_supported_filename(filename: &str) -> bool {
    let ext = extension(filename).to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}
