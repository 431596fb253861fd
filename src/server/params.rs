//! 查询参数解析。
//!
//! 非法值不报错，一律回退默认值（对外约定的宽松策略）。
//! 同名参数重复出现时取第一个值，其余参数忽略。

use crate::converter::{ConversionOptions, DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY};

/// `/v1/upload` 的可选查询参数。
#[derive(Debug, Default, Clone)]
pub struct ConversionQuery {
    pub quality: Option<String>,
    pub lossless: Option<String>,
}

impl ConversionQuery {
    /// 从已解码的键值对构建，每个键只保留第一次出现的值。
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "quality" => &mut query.quality,
                "lossless" => &mut query.lossless,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// 质量：缺省、无法解析或超出 `[0, 100]` 时使用默认值 80。
    pub fn quality(&self) -> f32 {
        let Some(raw) = self.quality.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return DEFAULT_QUALITY;
        };

        match raw.parse::<f32>() {
            Ok(quality) if (MIN_QUALITY..=MAX_QUALITY).contains(&quality) => quality,
            _ => DEFAULT_QUALITY,
        }
    }

    /// 无损：仅 `"true"` / `"1"` 视为开启。
    pub fn lossless(&self) -> bool {
        matches!(self.lossless.as_deref(), Some("true" | "1"))
    }

    pub fn options(&self) -> ConversionOptions {
        ConversionOptions::new(self.quality(), self.lossless())
    }
}
