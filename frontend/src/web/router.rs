//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 导航流程："请求 -> 守卫 -> (重定向 -> 守卫)* -> 写入地址栏 -> 加载"。
//! 每次导航领取一个序号，守卫返回时序号已不是最新的结果直接丢弃。

use leptos::prelude::*;
use leptos::task::spawn_local;
use unet360_client::{GuardDecision, Navigation, log_error, log_info};
use unet360_shared::AppRoute;
use wasm_bindgen::prelude::*;

use crate::state::AppState;

/// 单次导航允许的连续重定向次数
const MAX_REDIRECTS: usize = 8;

/// 获取当前浏览器地址（路径 + 查询串 + 片段）
fn current_href() -> String {
    web_sys::window()
        .and_then(|w| {
            let location = w.location();
            let path = location.pathname().ok()?;
            let search = location.search().unwrap_or_default();
            let hash = location.hash().unwrap_or_default();
            Some(format!("{path}{search}{hash}"))
        })
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态（内部工具函数）
fn push_history_state(href: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(href));
        }
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(href: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(href));
        }
    }
}

/// 拆分为 (路径含查询串, 片段含 `#`)
pub fn split_href(href: &str) -> (&str, &str) {
    match href.find('#') {
        Some(index) => href.split_at(index),
        None => (href, ""),
    }
}

/// 取出查询串（含 `?`），没有时为空
pub fn query_of(href: &str) -> &str {
    let (path, _) = split_href(href);
    path.find('?').map(|index| &path[index..]).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Push,
    Replace,
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前路由（只读信号）
    current_route: ReadSignal<AppRoute>,
    /// 设置当前路由（写入信号）
    set_route: WriteSignal<AppRoute>,
    /// 当前已放行的完整地址
    href: RwSignal<String>,
    /// 首次守卫完成前不渲染页面
    ready: RwSignal<bool>,
    /// 最近一次导航的序号
    sequence: StoredValue<u64>,
    state: AppState,
}

impl RouterService {
    fn new(state: AppState) -> Self {
        let href = current_href();
        let (path, _) = split_href(&href);
        let (current_route, set_route) = signal(AppRoute::from_path(path));

        Self {
            current_route,
            set_route,
            href: RwSignal::new(href),
            ready: RwSignal::new(false),
            sequence: StoredValue::new(0),
            state,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 当前查询串（响应式）
    pub fn query(&self) -> String {
        self.href.with(|href| query_of(href).to_string())
    }

    /// 当前片段（响应式）
    pub fn fragment(&self) -> String {
        self.href.with(|href| split_href(href).1.to_string())
    }

    /// **核心方法：导航与守卫**
    pub fn navigate(&self, href: &str) {
        self.run(href.to_string(), HistoryMode::Push);
    }

    pub fn navigate_to_route(&self, route: AppRoute) {
        self.navigate(route.to_path());
    }

    fn run(&self, href: String, mode: HistoryMode) {
        let seq = self.sequence.get_value() + 1;
        self.sequence.set_value(seq);
        let router = *self;

        spawn_local(async move {
            let mut href = href;
            for _ in 0..MAX_REDIRECTS {
                let (path, fragment) = split_href(&href);
                let nav = Navigation::new(path, fragment);
                let decision = router.state.services().guard.before_each(&nav).await;

                if router.sequence.get_value() != seq {
                    log_info!("[Router] navigation #{} superseded, dropping {}", seq, href);
                    return;
                }
                router.state.sync_session();

                match decision {
                    GuardDecision::Proceed => {
                        router.commit(&href, nav.route, mode);
                        return;
                    }
                    GuardDecision::Redirect(target) => href = target.to_href(),
                }
            }

            log_error!("[Router] redirect loop detected at {}", href);
            router.commit(AppRoute::NotFound.to_path(), AppRoute::NotFound, HistoryMode::Replace);
        });
    }

    /// 守卫放行后写入地址栏并切换页面
    fn commit(&self, href: &str, route: AppRoute, mode: HistoryMode) {
        match mode {
            HistoryMode::Push => push_history_state(href),
            HistoryMode::Replace => replace_history_state(href),
        }
        self.href.set(href.to_string());
        self.set_route.set(route);
        self.ready.set(true);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let router = *self;

        // popstate 时地址栏已经变化，守卫结果只需 replace
        let closure = Closure::<dyn Fn()>::new(move || {
            router.run(current_href(), HistoryMode::Replace);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 登出后若停留在受保护页面，重新走一遍守卫
    ///
    /// 登录后的跳转由登录页自己决定（携带 `redirect`），这里不处理。
    fn setup_auth_redirect(&self) {
        let router = *self;
        let is_authenticated = self.state.is_authenticated();

        Effect::new(move |previous: Option<bool>| {
            let is_auth = is_authenticated.get();
            let route = router.current_route.get_untracked();

            if previous == Some(true) && !is_auth && route.requires_auth() {
                log_info!("[Router] Auth state changed: logged out, re-running guard.");
                router.run(router.href.get_untracked(), HistoryMode::Replace);
            }
            is_auth
        });
    }
}

/// 提供路由服务到 Context 并执行首次导航
fn provide_router(state: AppState) -> RouterService {
    let router = RouterService::new(state);

    router.init_popstate_listener();
    router.setup_auth_redirect();
    router.run(current_href(), HistoryMode::Replace);

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 应用状态，守卫与会话镜像都从这里取
    state: AppState,
    /// 子组件
    children: Children,
) -> impl IntoView {
    provide_router(state);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        if !router.ready.get() {
            return view! {
                <div class="flex items-center justify-center min-h-[50vh]">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                </div>
            }
            .into_any();
        }
        matcher(router.current_route().get())
    }
}

/// 站内链接：拦截点击，交给路由服务
#[component]
pub fn Link(
    /// 目标地址
    #[prop(into)]
    to: String,
    #[prop(optional, into)] class: String,
    /// 子内容
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}
