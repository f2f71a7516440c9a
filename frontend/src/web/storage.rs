//! 浏览器持久化适配
//!
//! - `BrowserCookies`: `document.cookie`，保存 Bearer 令牌
//! - `SessionMarkers`: `sessionStorage`，保存一次性的注册确认标记

use gloo_storage::errors::StorageError;
use gloo_storage::{SessionStorage, Storage};
use unet360_client::storage::parse_cookie;
use unet360_client::{ClientError, ClientResult, Cookie, CookieJar, MarkerStore};
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

fn html_document() -> Option<HtmlDocument> {
    web_sys::window()?.document()?.dyn_into::<HtmlDocument>().ok()
}

/// `document.cookie` 封装
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserCookies;

impl CookieJar for BrowserCookies {
    fn read(&self, name: &str) -> Option<String> {
        let header = html_document()?.cookie().ok()?;
        parse_cookie(&header, name)
    }

    fn write(&self, cookie: &Cookie) -> ClientResult<()> {
        let document = html_document().ok_or_else(|| ClientError::storage("document unavailable"))?;
        document
            .set_cookie(&cookie.to_string())
            .map_err(|e| ClientError::storage(format!("{:?}", e)).in_op_with("cookie.write", cookie.name.clone()))
    }
}

/// `sessionStorage` 中的布尔标记
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionMarkers;

impl MarkerStore for SessionMarkers {
    fn mark(&self, key: &str) -> ClientResult<()> {
        SessionStorage::set(key, true)
            .map_err(|e| ClientError::storage(e.to_string()).in_op_with("marker.mark", key.to_string()))
    }

    fn take(&self, key: &str) -> ClientResult<bool> {
        match SessionStorage::get::<bool>(key) {
            Ok(marked) => {
                SessionStorage::delete(key);
                Ok(marked)
            }
            Err(StorageError::KeyNotFound(_)) => Ok(false),
            Err(e) => Err(ClientError::storage(e.to_string()).in_op_with("marker.take", key.to_string())),
        }
    }
}
