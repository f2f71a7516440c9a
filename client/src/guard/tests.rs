use super::*;
use crate::config::{ClientConfig, DEFAULT_CONFIRMATION_MARKER};
use crate::error::ClientError;
use crate::http::mock::{MOCK_BASE, MockHttpClient};
use crate::storage::{MemoryCookieJar, MemoryMarkerStore};
use crate::UnetApi;
use pretty_assertions::assert_eq;
use serde_json::json;
use unet360_shared::HttpMethod;
use url::Url;

// =========================================================
// 辅助函数
// =========================================================

type TestGuard<M> = SessionGuard<MockHttpClient, MemoryCookieJar, M>;

fn create_guard_with<M: MarkerStore>(cookie: Option<&str>, markers: M) -> TestGuard<M> {
    let api = Rc::new(UnetApi::new(
        MockHttpClient::new(),
        Url::parse(MOCK_BASE).unwrap(),
    ));
    let jar = match cookie {
        Some(token) => MemoryCookieJar::with_cookie("auth", token),
        None => MemoryCookieJar::new(),
    };
    let auth = Rc::new(AuthStore::new(api, jar, ClientConfig::default()));
    SessionGuard::new(auth, markers, DEFAULT_CONFIRMATION_MARKER)
}

fn anonymous() -> TestGuard<Rc<MemoryMarkerStore>> {
    create_guard_with(None, Rc::new(MemoryMarkerStore::new()))
}

/// 带有效令牌的守卫，角色由 `auth/status` 决定
fn signed_in(role: &str) -> TestGuard<Rc<MemoryMarkerStore>> {
    let guard = create_guard_with(Some("tok"), Rc::new(MemoryMarkerStore::new()));
    let http = guard.auth().api().http();
    http.ok(
        HttpMethod::Get,
        "auth/status",
        json!({"is_authenticated": true, "user_id": "u1", "user_role": role}),
    );
    http.ok(HttpMethod::Get, "tenants/u1", json!({"name": "Ana", "role": role}));
    guard
}

fn nav(path: &str) -> Navigation {
    Navigation::new(path, "")
}

fn redirect_route(decision: &GuardDecision) -> Option<AppRoute> {
    match decision {
        GuardDecision::Redirect(target) => Some(target.route),
        GuardDecision::Proceed => None,
    }
}

struct BrokenMarkers;

impl MarkerStore for BrokenMarkers {
    fn mark(&self, _key: &str) -> ClientResult<()> {
        Err(ClientError::storage("sessionStorage unavailable"))
    }

    fn take(&self, _key: &str) -> ClientResult<bool> {
        Err(ClientError::storage("sessionStorage unavailable"))
    }
}

// =========================================================
// 认证要求
// =========================================================

#[tokio::test]
async fn test_protected_routes_redirect_anonymous_to_login() {
    for route in AppRoute::ALL.into_iter().filter(AppRoute::requires_auth) {
        let guard = anonymous();
        let path = format!("{}?tab=2", route.to_path());

        let decision = guard.before_each(&nav(&path)).await;

        let GuardDecision::Redirect(target) = decision else {
            panic!("{route:?} should redirect");
        };
        assert_eq!(target.route, AppRoute::Login);
        // 原始路径保留在查询参数中
        assert_eq!(target.query_value("redirect"), Some(path.as_str()));
        // 无令牌不发请求
        assert_eq!(guard.auth().api().http().calls(), 0);
    }
}

#[tokio::test]
async fn test_admin_routes_send_viewers_home() {
    for route in AppRoute::ALL.into_iter().filter(AppRoute::requires_admin) {
        let guard = signed_in("viewer");
        let decision = guard.before_each(&nav(route.to_path())).await;
        assert_eq!(redirect_route(&decision), Some(AppRoute::Home), "{route:?}");
    }
}

#[tokio::test]
async fn test_admin_routes_admit_admins() {
    for route in AppRoute::ALL.into_iter().filter(AppRoute::requires_admin) {
        let guard = signed_in("admin");
        let decision = guard.before_each(&nav(route.to_path())).await;
        assert_eq!(decision, GuardDecision::Proceed, "{route:?}");
    }
}

#[tokio::test]
async fn test_auth_only_routes_send_signed_in_users_home() {
    for route in [AppRoute::Login, AppRoute::Signup, AppRoute::Recovery] {
        let guard = signed_in("viewer");
        let decision = guard.before_each(&nav(route.to_path())).await;
        assert_eq!(redirect_route(&decision), Some(AppRoute::Home), "{route:?}");
    }
}

#[tokio::test]
async fn test_auth_only_routes_open_for_anonymous() {
    let guard = anonymous();
    let decision = guard.before_each(&nav("/user/login")).await;
    assert_eq!(decision, GuardDecision::Proceed);
}

#[tokio::test]
async fn test_invalid_token_is_treated_as_anonymous() {
    let guard = create_guard_with(Some("expired"), Rc::new(MemoryMarkerStore::new()));
    guard.auth().api().http().on(
        HttpMethod::Get,
        "auth/status",
        401,
        r#"{"detail":"Invalid token"}"#,
    );

    let decision = guard.before_each(&nav("/nodes/create")).await;

    assert_eq!(redirect_route(&decision), Some(AppRoute::Login));
    assert!(!guard.auth().is_authenticated());
}

#[tokio::test]
async fn test_public_routes_proceed() {
    let guard = anonymous();
    for path in ["/", "/showcase", "/about", "/404"] {
        assert_eq!(guard.before_each(&nav(path)).await, GuardDecision::Proceed, "{path}");
    }
}

// =========================================================
// 回调片段
// =========================================================

#[tokio::test]
async fn test_recovery_fragment_redirects_with_fragment() {
    let guard = anonymous();
    let fragment = "#access_token=abc&refresh_token=r&type=recovery";

    let decision = guard.before_each(&Navigation::new("/", fragment)).await;

    let GuardDecision::Redirect(target) = decision else {
        panic!("expected redirect");
    };
    assert_eq!(target.route, AppRoute::NewPassword);
    assert_eq!(
        target.to_href(),
        "/user/new-password#access_token=abc&refresh_token=r&type=recovery"
    );
}

#[tokio::test]
async fn test_recovery_fragment_on_reset_page_proceeds() {
    let guard = anonymous();
    let decision = guard
        .before_each(&Navigation::new(
            "/user/new-password",
            "#access_token=abc&type=recovery",
        ))
        .await;
    assert_eq!(decision, GuardDecision::Proceed);
}

#[tokio::test]
async fn test_signup_confirmation_marker_is_one_shot() {
    let markers = Rc::new(MemoryMarkerStore::new());
    let guard = create_guard_with(None, markers.clone());

    // 回调到达首页 → 写入标记并跳转确认页
    let decision = guard
        .before_each(&Navigation::new("/", "#access_token=abc&type=signup"))
        .await;
    assert_eq!(redirect_route(&decision), Some(AppRoute::SuccessConfirmation));
    assert!(markers.contains(DEFAULT_CONFIRMATION_MARKER));

    // 第一次访问确认页消耗标记
    let decision = guard.before_each(&nav("/user/success-confirmation")).await;
    assert_eq!(decision, GuardDecision::Proceed);
    assert!(!markers.contains(DEFAULT_CONFIRMATION_MARKER));

    // 再次访问被送回首页
    let decision = guard.before_each(&nav("/user/success-confirmation")).await;
    assert_eq!(redirect_route(&decision), Some(AppRoute::Home));
}

#[tokio::test]
async fn test_confirmation_page_accepts_direct_callback() {
    let guard = anonymous();
    let decision = guard
        .before_each(&Navigation::new(
            "/user/success-confirmation",
            "#access_token=abc&type=signup",
        ))
        .await;
    assert_eq!(decision, GuardDecision::Proceed);
}

#[tokio::test]
async fn test_marker_failure_fails_safe_to_login() {
    let guard = create_guard_with(None, BrokenMarkers);
    let decision = guard
        .before_each(&Navigation::new("/", "#access_token=abc&type=signup"))
        .await;
    assert_eq!(redirect_route(&decision), Some(AppRoute::Login));
}

// =========================================================
// 其它
// =========================================================

#[tokio::test]
async fn test_logout_then_validate_makes_no_request() {
    let guard = signed_in("viewer");
    let auth = guard.auth();
    auth.check_auth_cookie();
    assert!(auth.validate_token().await);
    let calls = auth.api().http().calls();

    auth.logout();

    assert!(!auth.validate_token().await);
    assert_eq!(auth.api().http().calls(), calls);
}

#[test]
fn test_post_login_target() {
    assert_eq!(post_login_target("?redirect=%2Fadmin%2Ftags"), "/admin/tags");
    assert_eq!(post_login_target("redirect=https%3A%2F%2Fevil.test"), "/");
    assert_eq!(post_login_target(""), "/");
}
