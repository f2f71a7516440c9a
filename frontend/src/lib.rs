//! UNet360 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `state`: 客户端核心与界面信号（认证、缓存）
//! - `web::router`: 路由服务（守卫驱动的核心引擎）
//! - `web`: 浏览器适配（fetch、Cookie、sessionStorage）
//! - `components`: UI 组件层

mod components {
    pub mod admin;
    pub mod auth_pages;
    pub mod home;
    mod icons;
    pub mod layout;
    pub mod node_form;
    mod notice;
    pub mod showcase;
}
mod state;

use crate::components::admin::AdminPage;
use crate::components::auth_pages::{AuthMode, AuthPage, NewPasswordPage, SuccessPage};
use crate::components::home::HomePage;
use crate::components::layout::Shell;
use crate::components::node_form::NodeCreatePage;
use crate::components::showcase::ShowcasePage;
use crate::state::{AppServices, AppState};

use leptos::prelude::*;
use unet360_client::{ClientConfig, log_error};
use unet360_shared::{AdminEntity, AppRoute};

// 浏览器 API 适配模块
// 客户端核心只认识 `HttpClient` / `CookieJar` / `MarkerStore` 三个接口，
// 这里给出浏览器实现。
pub(crate) mod web {
    mod http;
    pub mod router;
    mod storage;

    pub use http::FetchHttpClient;
    pub use storage::{BrowserCookies, SessionMarkers};
}

use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home | AppRoute::About => view! { <HomePage /> }.into_any(),
        AppRoute::Showcase => view! { <ShowcasePage /> }.into_any(),
        AppRoute::NodeCreate => view! { <NodeCreatePage /> }.into_any(),
        AppRoute::NodeAdmin => view! { <AdminPage entity=AdminEntity::Node /> }.into_any(),
        AppRoute::TagAdmin => view! { <AdminPage entity=AdminEntity::Tag /> }.into_any(),
        AppRoute::LocationAdmin => {
            view! { <AdminPage entity=AdminEntity::Location /> }.into_any()
        }
        AppRoute::Login => view! { <AuthPage mode=AuthMode::Login /> }.into_any(),
        AppRoute::Signup => view! { <AuthPage mode=AuthMode::Signup /> }.into_any(),
        AppRoute::Recovery => view! { <AuthPage mode=AuthMode::Recovery /> }.into_any(),
        AppRoute::NewPassword => view! { <NewPasswordPage /> }.into_any(),
        AppRoute::SuccessRegister
        | AppRoute::SuccessNewPassword
        | AppRoute::SuccessPrePassword
        | AppRoute::SuccessConfirmation => view! { <SuccessPage route=route /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-[60vh]">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Página no encontrada"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 读取构建期配置并组装客户端核心
    let services = match AppServices::new(ClientConfig::from_env()) {
        Ok(services) => services,
        Err(e) => {
            log_error!("[App] invalid client configuration: {}", e);
            return view! {
                <div class="alert alert-error m-8">
                    <span>"Configuración inválida: " {e.to_string()}</span>
                </div>
            }
            .into_any();
        }
    };

    // 2. 提供应用状态
    let state = AppState::new(services);
    provide_context(state);

    view! {
        // 3. 路由器组件：守卫在其中运行
        <Router state=state>
            <Shell>
                <RouterOutlet matcher=route_matcher />
            </Shell>
        </Router>
    }
    .into_any()
}
