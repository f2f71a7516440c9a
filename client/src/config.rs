use url::Url;

use crate::error::{ClientError, ClientResult};

// =========================================================
// 默认配置 (Defaults)
// =========================================================

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_COOKIE_PATH: &str = "/";
/// 注册确认回调写入的一次性会话标记
pub const DEFAULT_CONFIRMATION_MARKER: &str = "unet360.signup_confirmation";

/// 客户端运行配置
///
/// 默认值为常量，构建时可通过 `UNET360_API_BASE_URL` 覆盖 API 地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub auth_cookie: String,
    pub cookie_path: String,
    pub confirmation_marker: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_cookie: unet360_shared::AUTH_COOKIE.to_string(),
            cookie_path: DEFAULT_COOKIE_PATH.to_string(),
            confirmation_marker: DEFAULT_CONFIRMATION_MARKER.to_string(),
        }
    }
}

impl ClientConfig {
    /// 读取构建时环境变量，缺失时使用默认值
    pub fn from_env() -> Self {
        let config = Self::default();
        match option_env!("UNET360_API_BASE_URL") {
            Some(url) if !url.trim().is_empty() => config.with_base_url(url),
            _ => config,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.api_base_url = normalize_base(url);
        self
    }

    /// 解析后的 API 基础地址
    pub fn base_url(&self) -> ClientResult<Url> {
        Url::parse(&normalize_base(&self.api_base_url)).map_err(|e| {
            ClientError::invalid_input(format!("Invalid API base URL: {}", self.api_base_url))
                .with_source(e)
                .in_op("config.base_url")
        })
    }
}

/// 统一以 `/` 结尾，保证相对路径拼接不会吞掉最后一段
fn normalize_base(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000/");
        assert_eq!(config.auth_cookie, "auth");
        assert_eq!(config.cookie_path, "/");
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = ClientConfig::default().with_base_url(" https://api.unet360.test/v1 ");
        assert_eq!(config.api_base_url, "https://api.unet360.test/v1/");
        assert_eq!(
            config.base_url().unwrap().join("nodes/").unwrap().as_str(),
            "https://api.unet360.test/v1/nodes/"
        );
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let err = ClientConfig::default()
            .with_base_url("not a url")
            .base_url()
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidInput);
    }
}
