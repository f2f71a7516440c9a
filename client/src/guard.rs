//! 路由守卫
//!
//! 每次导航前运行，决定放行还是重定向：
//! 1. 从 Cookie 同步令牌
//! 2. 处理身份提供方的回调片段（注册确认 / 密码恢复）
//! 3. 向后端验证令牌
//! 4. 已登录用户离开仅限游客的页面
//! 5. 未登录用户访问受保护页面 → 登录页，并带上原始路径
//! 6. 管理页面再检查角色
//! 7. 内部失败一律回到登录页

use std::rc::Rc;

use unet360_shared::route::redirect_target;
use unet360_shared::{AppRoute, AuthCallback, NavigationTarget};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::session::AuthStore;
use crate::storage::{CookieJar, MarkerStore};

/// 一次导航请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: AppRoute,
    /// 含查询串的完整路径，用于登录后返回
    pub full_path: String,
    /// `location.hash`，可为空
    pub fragment: String,
}

impl Navigation {
    pub fn new(full_path: &str, fragment: &str) -> Self {
        Self {
            route: AppRoute::from_path(full_path),
            full_path: full_path.to_string(),
            fragment: fragment.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(NavigationTarget),
}

impl GuardDecision {
    fn to(route: AppRoute) -> Self {
        GuardDecision::Redirect(NavigationTarget::new(route))
    }
}

/// 登录成功后的去向：查询串中的站内路径，否则首页
pub fn post_login_target(query: &str) -> String {
    redirect_target(query).unwrap_or_else(|| AppRoute::auth_success_redirect().to_path().to_string())
}

pub struct SessionGuard<C, K, M> {
    auth: Rc<AuthStore<C, K>>,
    markers: M,
    marker_key: String,
}

impl<C: HttpClient, K: CookieJar, M: MarkerStore> SessionGuard<C, K, M> {
    pub fn new(auth: Rc<AuthStore<C, K>>, markers: M, marker_key: impl Into<String>) -> Self {
        Self {
            auth,
            markers,
            marker_key: marker_key.into(),
        }
    }

    pub fn auth(&self) -> &Rc<AuthStore<C, K>> {
        &self.auth
    }

    pub async fn before_each(&self, nav: &Navigation) -> GuardDecision {
        match self.evaluate(nav).await {
            Ok(decision) => {
                if let GuardDecision::Redirect(target) = &decision {
                    log_info!("[Guard] {} -> {}", nav.full_path, target.to_href());
                }
                decision
            }
            Err(e) => {
                log_error!("[Guard] navigation to {} failed: {}", nav.full_path, e);
                GuardDecision::to(AppRoute::auth_failure_redirect())
            }
        }
    }

    async fn evaluate(&self, nav: &Navigation) -> ClientResult<GuardDecision> {
        self.auth.check_auth_cookie();

        let callback = AuthCallback::parse(&nav.fragment);
        match &callback {
            AuthCallback::PasswordRecovery { .. } if nav.route != AppRoute::NewPassword => {
                let target = NavigationTarget::new(AppRoute::NewPassword).with_fragment(&nav.fragment);
                return Ok(GuardDecision::Redirect(target));
            }
            AuthCallback::SignupConfirmation { .. } if nav.route != AppRoute::SuccessConfirmation => {
                self.markers
                    .mark(&self.marker_key)
                    .map_err(|e| e.in_op("guard.signup_callback"))?;
                return Ok(GuardDecision::to(AppRoute::SuccessConfirmation));
            }
            _ => {}
        }

        // 确认页只能通过回调到达，标记用过即清
        if nav.route == AppRoute::SuccessConfirmation {
            let marked = self
                .markers
                .take(&self.marker_key)
                .map_err(|e| e.in_op("guard.confirmation_marker"))?;
            if !marked && callback.is_none() {
                return Ok(GuardDecision::to(AppRoute::auth_success_redirect()));
            }
        }

        let authenticated = self.auth.validate_token().await;

        if nav.route.should_redirect_when_authenticated() && authenticated {
            return Ok(GuardDecision::to(AppRoute::auth_success_redirect()));
        }

        if nav.route.requires_auth() && !authenticated {
            return Ok(GuardDecision::Redirect(NavigationTarget::login_with_redirect(
                &nav.full_path,
            )));
        }

        if nav.route.requires_admin() {
            if !self.auth.is_authenticated() {
                return Ok(GuardDecision::Redirect(NavigationTarget::login_with_redirect(
                    &nav.full_path,
                )));
            }
            if !self.auth.is_admin() {
                return Ok(GuardDecision::to(AppRoute::auth_success_redirect()));
            }
        }

        Ok(GuardDecision::Proceed)
    }
}

#[cfg(test)]
mod tests;
