//! 认证状态
//!
//! 令牌、用户资料与登录状态的唯一来源。所有操作都返回普通值：
//! 失败被记录为面向用户的消息，路由守卫只关心布尔结果。

use std::cell::RefCell;
use std::rc::Rc;

use unet360_shared::{Credentials, PasswordReset, UserProfile};

use crate::api::UnetApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, ErrorKind};
use crate::http::HttpClient;
use crate::storage::{Cookie, CookieJar};

const LOGIN_FAILED: &str = "Login failed.";
const NETWORK_ERROR: &str = "Error de red";
/// 恢复邮件失败时不透露账户是否存在
const RECOVERY_GENERIC: &str =
    "Si el correo está registrado, recibirás un enlace para restablecer tu contraseña.";

// =========================================================
// 状态
// =========================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn is_admin(&self) -> bool {
        self.is_authenticated && self.user.as_ref().is_some_and(UserProfile::is_admin)
    }
}

/// 共享的会话状态句柄
///
/// 外部只读，写入只发生在 `AuthStore` 内部。
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Rc<RefCell<SessionState>>);

impl SessionHandle {
    pub fn snapshot(&self) -> SessionState {
        self.0.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.0.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.borrow().is_authenticated
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

/// 注册、恢复、改密这类一次性操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl AuthOutcome {
    fn ok(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// 成功页展示用的邮箱与访问许可
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSuccess {
    pub email: String,
    pub can_access_success: bool,
}

impl AuthSuccess {
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn clear_email(&mut self) {
        self.email.clear();
    }

    pub fn allow(&mut self) {
        self.can_access_success = true;
    }

    pub fn block(&mut self) {
        self.can_access_success = false;
    }
}

fn user_message(err: &ClientError, fallback: &str) -> String {
    match err.kind {
        ErrorKind::Transport => NETWORK_ERROR.to_string(),
        ErrorKind::Backend | ErrorKind::Unauthorized | ErrorKind::Forbidden
            if !err.message().is_empty() =>
        {
            err.message().to_string()
        }
        _ => fallback.to_string(),
    }
}

// =========================================================
// AuthStore
// =========================================================

pub struct AuthStore<C, K> {
    api: Rc<UnetApi<C>>,
    cookies: K,
    config: ClientConfig,
    session: SessionHandle,
}

impl<C: HttpClient, K: CookieJar> AuthStore<C, K> {
    pub fn new(api: Rc<UnetApi<C>>, cookies: K, config: ClientConfig) -> Self {
        Self {
            api,
            cookies,
            config,
            session: SessionHandle::default(),
        }
    }

    pub fn api(&self) -> &Rc<UnetApi<C>> {
        &self.api
    }

    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    pub fn snapshot(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session.snapshot().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.snapshot().is_admin()
    }

    /// 从 Cookie 恢复令牌，并同步为 API 的默认 Bearer
    pub fn check_auth_cookie(&self) {
        let token = self.cookies.read(&self.config.auth_cookie);
        self.api.set_bearer(token.clone());
        self.session.update(|s| {
            s.is_authenticated = token.is_some();
            s.token = token;
        });
    }

    /// 向后端确认令牌有效
    ///
    /// 无令牌时直接返回 `false`，不发请求。
    pub async fn validate_token(&self) -> bool {
        let Some(token) = self.token() else {
            self.session.update(|s| s.is_authenticated = false);
            return false;
        };

        self.session.update(|s| s.is_loading = true);
        let result = self.resolve_profile(&token).await;

        // 等待期间会话已被登出或替换，结果作废
        if self.token().as_deref() != Some(token.as_str()) {
            self.session.update(|s| s.is_loading = false);
            return self.is_authenticated();
        }

        match result {
            Ok(profile) => {
                self.session.update(|s| {
                    s.user = Some(profile);
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                true
            }
            Err(e) => {
                log_warn!("[Auth] token validation failed: {}", e);
                if e.is_auth_failure() {
                    self.expire_cookie();
                }
                self.api.set_bearer(None);
                self.session.update(|s| {
                    s.token = None;
                    s.user = None;
                    s.is_authenticated = false;
                    s.is_loading = false;
                });
                false
            }
        }
    }

    async fn resolve_profile(&self, token: &str) -> ClientResult<UserProfile> {
        let status = self
            .api
            .auth_status(Some(token))
            .await
            .map_err(|e| e.in_op("auth.validate_token"))?;

        if !status.is_authenticated {
            let message = status.message.unwrap_or_else(|| "Session expired".to_string());
            return Err(ClientError::unauthorized(message).in_op("auth.validate_token"));
        }

        let previous = self.user();
        let id = status
            .user_id
            .clone()
            .or_else(|| previous.as_ref().map(|u| u.id.clone()))
            .unwrap_or_default();
        let role = status
            .user_role
            .or_else(|| previous.as_ref().map(|u| u.role))
            .unwrap_or_default();
        let profile = UserProfile {
            id: id.clone(),
            name: previous.and_then(|u| u.name),
            role,
        };

        if id.is_empty() {
            return Ok(profile);
        }

        match self.api.get_tenant(&id, Some(token)).await {
            Ok(tenant) => Ok(profile.with_tenant(tenant)),
            Err(e) => {
                log_warn!("[Auth] tenant lookup failed, keeping status profile: {}", e);
                Ok(profile)
            }
        }
    }

    /// 登录；成功时写入 `auth` Cookie
    pub async fn login(&self, email: &str, password: &str) -> bool {
        self.session.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = self.api.login(Credentials::new(email, password)).await;
        match result {
            Ok(token) if !token.access_token.is_empty() => {
                let cookie = Cookie::session(
                    &self.config.auth_cookie,
                    &token.access_token,
                    &self.config.cookie_path,
                );
                if let Err(e) = self.cookies.write(&cookie) {
                    log_error!("[Auth] failed to persist session cookie: {}", e);
                }
                self.api.set_bearer(Some(token.access_token.clone()));
                let profile = UserProfile::from_token(&token);
                self.session.update(|s| {
                    s.token = Some(token.access_token);
                    s.user = Some(profile);
                    s.is_authenticated = true;
                    s.is_loading = false;
                    s.error = None;
                });
                log_info!("[Auth] login succeeded");
                true
            }
            Ok(_) => {
                self.fail_login(LOGIN_FAILED.to_string());
                false
            }
            Err(e) => {
                log_warn!("[Auth] login failed: {}", e);
                self.fail_login(user_message(&e, LOGIN_FAILED));
                false
            }
        }
    }

    fn fail_login(&self, message: String) {
        self.session.update(|s| {
            s.is_authenticated = false;
            s.is_loading = false;
            s.error = Some(message);
        });
    }

    /// 本地登出：清空状态并让 Cookie 立即过期
    pub fn logout(&self) {
        self.api.set_bearer(None);
        self.session.update(|s| {
            s.token = None;
            s.user = None;
            s.is_authenticated = false;
            s.error = None;
        });
        self.expire_cookie();
        log_info!("[Auth] logged out");
    }

    fn expire_cookie(&self) {
        let cookie = Cookie::expired(&self.config.auth_cookie, &self.config.cookie_path);
        if let Err(e) = self.cookies.write(&cookie) {
            log_error!("[Auth] failed to clear session cookie: {}", e);
        }
    }

    pub async fn signup(&self, email: &str, password: &str) -> AuthOutcome {
        self.session.update(|s| s.is_loading = true);
        let result = self.api.signup(Credentials::new(email, password)).await;
        self.session.update(|s| s.is_loading = false);

        match result {
            Ok(body) => AuthOutcome::ok(body.and_then(|b| b.message)),
            Err(e) => {
                log_warn!("[Auth] signup failed: {}", e);
                AuthOutcome::failed(user_message(&e, "No se pudo completar el registro."))
            }
        }
    }

    pub async fn send_recovery_email(&self, email: &str) -> AuthOutcome {
        self.session.update(|s| s.is_loading = true);
        let result = self.api.forgot_password(email).await;
        self.session.update(|s| s.is_loading = false);

        match result {
            Ok(body) => AuthOutcome::ok(body.and_then(|b| b.message)),
            Err(e) if e.kind == ErrorKind::Transport => {
                log_warn!("[Auth] recovery email failed: {}", e);
                AuthOutcome::failed(NETWORK_ERROR)
            }
            Err(e) => {
                log_warn!("[Auth] recovery email failed: {}", e);
                AuthOutcome::failed(RECOVERY_GENERIC)
            }
        }
    }

    /// 使用恢复回调中的令牌重设密码
    pub async fn change_password(&self, reset: PasswordReset) -> AuthOutcome {
        if reset.new_password.is_empty() {
            return AuthOutcome::failed("La contraseña no puede estar vacía.");
        }

        self.session.update(|s| s.is_loading = true);
        let result = self.api.reset_password(reset).await;
        self.session.update(|s| s.is_loading = false);

        match result {
            Ok(body) => AuthOutcome::ok(body.and_then(|b| b.message)),
            Err(e) => {
                log_warn!("[Auth] password change failed: {}", e);
                AuthOutcome::failed(user_message(&e, "No se pudo cambiar la contraseña."))
            }
        }
    }
}
