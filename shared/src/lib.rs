//! UNet360 共享领域模型
//!
//! 纯数据层，不做任何 I/O：
//! - `node`: 导航图节点、方向邻接槽与节点状态
//! - `catalog`: 标签与地点
//! - `account`: 账户、令牌与用户资料
//! - `protocol`: 后端响应信封与强类型请求定义
//! - `route`: 路由表与路由元数据
//! - `callback`: 身份提供方回调片段解析
//! - `menu`: 侧边栏与首页静态内容

pub mod account;
pub mod callback;
pub mod catalog;
pub mod menu;
pub mod node;
pub mod protocol;
pub mod route;

pub use account::{
    AuthStatus, AuthToken, Credentials, PasswordReset, RecoveryRequest, Tenant, UserProfile,
    UserRole,
};
pub use callback::AuthCallback;
pub use catalog::{Location, Tag};
pub use menu::{MenuAction, MenuEntry, MenuTarget, sidebar_options};
pub use node::{
    Adjacency, Direction, Minimap, Neighbor, Node, NodeError, NodeList, NodeStatus, NodeTags,
    RejectedNode, StatusLevel,
};
pub use protocol::{ApiPath, ApiRequest, AuthMode, Envelope, HttpMethod, MessageBody, Payload};
pub use route::{AdminEntity, AppRoute, NavigationTarget, RouteMeta};

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 持久化 Bearer 令牌的 Cookie 名称
pub const AUTH_COOKIE: &str = "auth";
/// 路由守卫在登录重定向时携带原始路径的查询参数
pub const REDIRECT_QUERY_KEY: &str = "redirect";
