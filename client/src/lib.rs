//! UNet360 客户端核心
//!
//! 与平台无关的客户端状态层，浏览器与原生环境共用：
//! - `api`: 强类型后端 API 客户端
//! - `http`: HTTP 传输抽象（浏览器 fetch / reqwest / 测试 Mock）
//! - `storage`: Cookie 与会话级标记的持久化抽象
//! - `session`: 认证状态
//! - `cache`: 节点、标签、地点的资源缓存
//! - `guard`: 路由守卫
//!
//! 所有状态都通过显式的上下文对象传递，没有全局单例。

#[macro_use]
pub mod logging;

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod session;
pub mod storage;

pub use api::UnetApi;
pub use cache::{CacheState, LocationCache, NodeCache, TagCache};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use guard::{GuardDecision, Navigation, SessionGuard};
pub use http::{HttpBody, HttpClient, HttpRequest, HttpResponse};
pub use session::{AuthOutcome, AuthStore, AuthSuccess, SessionHandle, SessionState};
pub use storage::{Cookie, CookieJar, MarkerStore, MemoryCookieJar, MemoryMarkerStore};

#[cfg(not(target_arch = "wasm32"))]
pub use http::ReqwestHttpClient;
