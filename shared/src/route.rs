//! 路由定义模块 - 领域模型
//!
//! 纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其静态元数据（是否需要认证、是否需要管理员）。

use std::fmt::Display;
use url::form_urlencoded;

use crate::REDIRECT_QUERY_KEY;

/// 管理界面共用视图的实体区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminEntity {
    Node,
    Tag,
    Location,
}

impl AdminEntity {
    pub fn label(self) -> &'static str {
        match self {
            AdminEntity::Node => "Nodos",
            AdminEntity::Tag => "Etiquetas",
            AdminEntity::Location => "Ubicaciones",
        }
    }
}

/// 路由元数据，静态配置而非运行时状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
    /// 仅供未登录用户访问（登录、注册、找回密码）
    pub auth_only: bool,
    pub entity: Option<AdminEntity>,
}

impl RouteMeta {
    const PUBLIC: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_admin: false,
        auth_only: false,
        entity: None,
    };

    const AUTH_ONLY: RouteMeta = RouteMeta {
        auth_only: true,
        ..RouteMeta::PUBLIC
    };

    const fn admin(entity: AdminEntity) -> RouteMeta {
        RouteMeta {
            requires_auth: true,
            requires_admin: true,
            auth_only: false,
            entity: Some(entity),
        }
    }
}

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppRoute {
    /// 首页 (默认路由)
    #[default]
    Home,
    Showcase,
    About,
    /// 新建节点 (管理员)
    NodeCreate,
    /// 管理列表 (管理员)
    NodeAdmin,
    TagAdmin,
    LocationAdmin,
    Login,
    Signup,
    Recovery,
    /// 恢复邮件回调后的重设密码页
    NewPassword,
    SuccessRegister,
    SuccessNewPassword,
    SuccessPrePassword,
    SuccessConfirmation,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    pub const ALL: [AppRoute; 16] = [
        AppRoute::Home,
        AppRoute::Showcase,
        AppRoute::About,
        AppRoute::NodeCreate,
        AppRoute::NodeAdmin,
        AppRoute::TagAdmin,
        AppRoute::LocationAdmin,
        AppRoute::Login,
        AppRoute::Signup,
        AppRoute::Recovery,
        AppRoute::NewPassword,
        AppRoute::SuccessRegister,
        AppRoute::SuccessNewPassword,
        AppRoute::SuccessPrePassword,
        AppRoute::SuccessConfirmation,
        AppRoute::NotFound,
    ];

    /// 将 URL path 解析为路由枚举
    ///
    /// 忽略查询串、片段、末尾斜杠与大小写（兼容旧的 `/Home`）。
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/').to_ascii_lowercase();

        match path.as_str() {
            "" | "/home" => Self::Home,
            "/showcase" => Self::Showcase,
            "/about" => Self::About,
            "/nodes/create" => Self::NodeCreate,
            "/admin/nodes" => Self::NodeAdmin,
            "/admin/tags" => Self::TagAdmin,
            "/admin/locations" => Self::LocationAdmin,
            "/user/login" => Self::Login,
            "/user/signup" => Self::Signup,
            "/user/recovery" => Self::Recovery,
            "/user/new-password" => Self::NewPassword,
            "/user/success-register" => Self::SuccessRegister,
            "/user/success-newpassword" => Self::SuccessNewPassword,
            "/user/success-prepassword" => Self::SuccessPrePassword,
            "/user/success-confirmation" => Self::SuccessConfirmation,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Showcase => "/showcase",
            Self::About => "/about",
            Self::NodeCreate => "/nodes/create",
            Self::NodeAdmin => "/admin/nodes",
            Self::TagAdmin => "/admin/tags",
            Self::LocationAdmin => "/admin/locations",
            Self::Login => "/user/login",
            Self::Signup => "/user/signup",
            Self::Recovery => "/user/recovery",
            Self::NewPassword => "/user/new-password",
            Self::SuccessRegister => "/user/success-register",
            Self::SuccessNewPassword => "/user/success-newpassword",
            Self::SuccessPrePassword => "/user/success-prepassword",
            Self::SuccessConfirmation => "/user/success-confirmation",
            Self::NotFound => "/404",
        }
    }

    pub fn meta(&self) -> RouteMeta {
        match self {
            Self::NodeCreate | Self::NodeAdmin => RouteMeta::admin(AdminEntity::Node),
            Self::TagAdmin => RouteMeta::admin(AdminEntity::Tag),
            Self::LocationAdmin => RouteMeta::admin(AdminEntity::Location),
            Self::Login | Self::Signup | Self::Recovery => RouteMeta::AUTH_ONLY,
            _ => RouteMeta::PUBLIC,
        }
    }

    /// **核心守卫逻辑：定义该路由是否需要认证**
    pub fn requires_auth(&self) -> bool {
        self.meta().requires_auth
    }

    pub fn requires_admin(&self) -> bool {
        self.meta().requires_admin
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        self.meta().auth_only
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时（或权限不足时）的重定向目标
    pub fn auth_success_redirect() -> Self {
        Self::Home
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

// =========================================================
// 导航目标
// =========================================================

/// 重定向目标：路由 + 查询参数 + 可选片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub route: AppRoute,
    pub query: Vec<(String, String)>,
    pub fragment: Option<String>,
}

impl NavigationTarget {
    pub fn new(route: AppRoute) -> Self {
        Self {
            route,
            query: Vec::new(),
            fragment: None,
        }
    }

    /// 登录页，并携带原始请求路径供登录后返回
    pub fn login_with_redirect(full_path: &str) -> Self {
        Self::new(AppRoute::auth_failure_redirect()).with_query(REDIRECT_QUERY_KEY, full_path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// 片段为空时不设置
    pub fn with_fragment(mut self, fragment: &str) -> Self {
        let fragment = fragment.trim_start_matches('#');
        self.fragment = (!fragment.is_empty()).then(|| fragment.to_string());
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 可直接写入 History 的地址
    pub fn to_href(&self) -> String {
        let mut href = self.route.to_path().to_string();
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            href.push('?');
            href.push_str(&query);
        }
        if let Some(fragment) = &self.fragment {
            href.push('#');
            href.push_str(fragment);
        }
        href
    }
}

impl From<AppRoute> for NavigationTarget {
    fn from(route: AppRoute) -> Self {
        Self::new(route)
    }
}

/// 从登录页的查询串中取出登录后返回的路径
///
/// 只接受站内绝对路径，避免开放重定向。
pub fn redirect_target(query: &str) -> Option<String> {
    query_param(query, REDIRECT_QUERY_KEY).filter(|path| path.starts_with('/') && !path.starts_with("//"))
}

/// 查询串中第一个同名参数（已解码）
pub fn query_param(query: &str, key: &str) -> Option<String> {
    let query = query.trim_start_matches('?');
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
