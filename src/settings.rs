//! 服务配置：可选 JSON 配置文件 + 环境变量覆盖。
//!
//! 读取顺序：
//! 1. 默认值
//! 2. `IMAGE2WEBP_CONFIG` 指向的 JSON 文件（文件不存在时回退默认值；解析失败视为致命错误）
//! 3. `IMAGE2WEBP_BIND` / `IMAGE2WEBP_STATIC_DIR` 环境变量

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::converter::{DEFAULT_PIPE_CAPACITY, DecodeLimits};
use crate::error::AppError;

pub const CONFIG_PATH_ENV: &str = "IMAGE2WEBP_CONFIG";
pub const BIND_ADDR_ENV: &str = "IMAGE2WEBP_BIND";
pub const STATIC_DIR_ENV: &str = "IMAGE2WEBP_STATIC_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// 监听地址。
    pub bind_addr: SocketAddr,
    /// 静态文件目录（测试页面）。
    pub static_dir: PathBuf,
    /// 单次上传请求体上限（字节）。
    pub max_upload_bytes: usize,
    /// 编码管道容量（分块数）。
    pub pipe_capacity: usize,
    pub limits: DecodeLimits,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 10080)),
            static_dir: PathBuf::from("./front"),
            max_upload_bytes: 32 * 1024 * 1024,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            limits: DecodeLimits::default(),
        }
    }
}

impl ServerSettings {
    /// 按“默认值 → 配置文件 → 环境变量”顺序加载。
    pub fn load() -> Result<Self, AppError> {
        let mut settings = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from_path(Path::new(&path))?,
            None => Self::default(),
        };

        settings.apply_overrides(
            std::env::var(BIND_ADDR_ENV).ok().as_deref(),
            std::env::var(STATIC_DIR_ENV).ok().as_deref(),
        )?;

        Ok(settings)
    }

    /// 从 JSON 文件读取；文件不存在时使用默认值。
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::warn!("配置文件不存在，使用默认配置：{}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Settings(format!("读取配置文件失败 {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("解析配置文件失败 {}: {}", path.display(), e)))
    }

    fn apply_overrides(&mut self, bind_addr: Option<&str>, static_dir: Option<&str>) -> Result<(), AppError> {
        if let Some(addr) = bind_addr.filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr
                .trim()
                .parse()
                .map_err(|e| AppError::Settings(format!("{} 无效（{}）: {}", BIND_ADDR_ENV, addr, e)))?;
        }

        if let Some(dir) = static_dir.filter(|s| !s.trim().is_empty()) {
            self.static_dir = PathBuf::from(dir);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_file(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("image2webp-settings-{}-{}", nanos, name))
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = ServerSettings::load_from_path(&unique_temp_file("missing.json"))
            .expect("missing file should not fail");
        assert_eq!(settings, ServerSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = unique_temp_file("partial.json");
        fs::write(&path, r#"{"bind_addr": "127.0.0.1:9000", "limits": {"max_decoded_pixels": 5000}}"#)
            .expect("write config");

        let settings = ServerSettings::load_from_path(&path).expect("load config");
        assert_eq!(settings.bind_addr, "127.0.0.1:9000".parse().expect("addr"));
        assert_eq!(settings.limits.max_decoded_pixels, 5000);
        assert_eq!(settings.max_upload_bytes, 32 * 1024 * 1024);
        assert_eq!(settings.static_dir, PathBuf::from("./front"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn dumped_settings_load_back_unchanged() {
        let path = unique_temp_file("dumped.json");
        let mut settings = ServerSettings::default();
        settings.pipe_capacity = 3;
        settings.limits.max_input_bytes = 1024;
        fs::write(&path, serde_json::to_string_pretty(&settings).expect("serialize")).expect("write config");

        let loaded = ServerSettings::load_from_path(&path).expect("load config");
        assert_eq!(loaded, settings);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = unique_temp_file("broken.json");
        fs::write(&path, "{ not json").expect("write config");

        let result = ServerSettings::load_from_path(&path);
        assert!(matches!(result, Err(AppError::Settings(_))));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut settings = ServerSettings::default();
        settings
            .apply_overrides(Some("127.0.0.1:8081"), Some("/srv/www"))
            .expect("apply overrides");

        assert_eq!(settings.bind_addr, "127.0.0.1:8081".parse().expect("addr"));
        assert_eq!(settings.static_dir, PathBuf::from("/srv/www"));
    }

    #[test]
    fn invalid_bind_override_is_rejected() {
        let mut settings = ServerSettings::default();
        let result = settings.apply_overrides(Some("not-an-address"), None);
        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut settings = ServerSettings::default();
        settings.apply_overrides(Some("  "), Some("")).expect("blank overrides");
        assert_eq!(settings, ServerSettings::default());
    }
}
