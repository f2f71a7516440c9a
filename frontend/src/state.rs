//! 应用状态上下文
//!
//! `AppServices` 持有客户端核心（API、认证、守卫、三个缓存），
//! 它们基于 `Rc<RefCell<_>>`，只能放进本地存储的 `StoredValue`。
//! `AppState` 把核心状态镜像到信号里驱动界面；每次异步操作结束后调用 `sync_*`。

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use unet360_client::{
    AuthStore, AuthSuccess, CacheState, ClientConfig, ClientResult, LocationCache, NodeCache,
    SessionGuard, SessionState, TagCache, UnetApi,
};
use unet360_shared::{Location, Node, Tag};

use crate::web::{BrowserCookies, FetchHttpClient, SessionMarkers};

pub type Api = UnetApi<FetchHttpClient>;
pub type Auth = AuthStore<FetchHttpClient, BrowserCookies>;
pub type Guard = SessionGuard<FetchHttpClient, BrowserCookies, SessionMarkers>;

pub struct AppServices {
    pub api: Rc<Api>,
    pub auth: Rc<Auth>,
    pub guard: Guard,
    pub nodes: NodeCache<FetchHttpClient>,
    pub tags: TagCache<FetchHttpClient>,
    pub locations: LocationCache<FetchHttpClient>,
}

impl AppServices {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let api = Rc::new(UnetApi::from_config(FetchHttpClient, &config)?);
        let marker_key = config.confirmation_marker.clone();
        let auth = Rc::new(AuthStore::new(api.clone(), BrowserCookies, config));
        let session = auth.session();

        Ok(Self {
            guard: SessionGuard::new(auth.clone(), SessionMarkers, marker_key),
            nodes: NodeCache::new(api.clone(), session.clone()),
            tags: TagCache::new(api.clone(), session.clone()),
            locations: LocationCache::new(api.clone(), session),
            api,
            auth,
        })
    }
}

/// 界面可见的全部状态
///
/// 全部字段都是 `Copy` 句柄，可以直接移入闭包。
#[derive(Clone, Copy)]
pub struct AppState {
    pub session: RwSignal<SessionState>,
    pub nodes: RwSignal<CacheState<Node>>,
    pub tags: RwSignal<CacheState<Tag>>,
    pub locations: RwSignal<CacheState<Location>>,
    pub auth_success: RwSignal<AuthSuccess>,
    services: StoredValue<Rc<AppServices>, LocalStorage>,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        Self {
            session: RwSignal::new(services.auth.snapshot()),
            nodes: RwSignal::new(services.nodes.snapshot()),
            tags: RwSignal::new(services.tags.snapshot()),
            locations: RwSignal::new(services.locations.snapshot()),
            auth_success: RwSignal::new(AuthSuccess::default()),
            services: StoredValue::new_local(Rc::new(services)),
        }
    }

    pub fn services(&self) -> Rc<AppServices> {
        self.services.get_value()
    }

    pub fn is_authenticated(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(|s| s.is_authenticated))
    }

    pub fn is_admin(&self) -> Signal<bool> {
        let session = self.session;
        Signal::derive(move || session.with(SessionState::is_admin))
    }

    pub fn sync_session(&self) {
        self.session.set(self.services().auth.snapshot());
    }

    pub fn sync_nodes(&self) {
        self.nodes.set(self.services().nodes.snapshot());
    }

    pub fn sync_tags(&self) {
        self.tags.set(self.services().tags.snapshot());
    }

    pub fn sync_locations(&self) {
        self.locations.set(self.services().locations.snapshot());
    }

    // =========================================================
    // 异步动作
    // =========================================================

    pub fn ensure_nodes(&self) {
        let state = *self;
        spawn_local(async move {
            state.services().nodes.ensure_loaded().await;
            state.sync_nodes();
        });
    }

    pub fn refresh_nodes(&self) {
        let state = *self;
        self.nodes.update(|s| s.is_loading = true);
        spawn_local(async move {
            state.services().nodes.fetch_nodes().await;
            state.sync_nodes();
        });
    }

    pub fn ensure_tags(&self) {
        let state = *self;
        spawn_local(async move {
            state.services().tags.ensure_loaded().await;
            state.sync_tags();
        });
    }

    pub fn refresh_tags(&self) {
        let state = *self;
        self.tags.update(|s| s.is_loading = true);
        spawn_local(async move {
            state.services().tags.fetch_tags().await;
            state.sync_tags();
        });
    }

    pub fn ensure_locations(&self) {
        let state = *self;
        spawn_local(async move {
            state.services().locations.ensure_loaded().await;
            state.sync_locations();
        });
    }

    pub fn refresh_locations(&self) {
        let state = *self;
        self.locations.update(|s| s.is_loading = true);
        spawn_local(async move {
            state.services().locations.fetch_locations().await;
            state.sync_locations();
        });
    }

    /// 本地登出，远端会话随令牌过期
    pub fn logout(&self) {
        self.services().auth.logout();
        self.sync_session();
    }
}

/// 从 Context 获取应用状态
pub fn use_app_state() -> AppState {
    use_context::<AppState>().expect("AppState not found in context. Ensure App provides it.")
}
