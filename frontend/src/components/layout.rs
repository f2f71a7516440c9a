//! 页面外壳：顶栏 + 侧边栏抽屉

use leptos::prelude::*;
use unet360_shared::{AppRoute, MenuAction, MenuTarget, sidebar_options};

use crate::components::icons::{Compass, LogOut};
use crate::state::use_app_state;
use crate::web::router::{Link, use_router};

#[component]
pub fn Shell(children: Children) -> impl IntoView {
    let state = use_app_state();
    let router = use_router();
    let is_authenticated = state.is_authenticated();
    let is_admin = state.is_admin();

    let user_name = move || {
        state.session.with(|s| {
            s.user
                .as_ref()
                .and_then(|u| u.name.clone())
                .unwrap_or_default()
        })
    };

    let on_action = move |action: MenuAction| match action {
        MenuAction::Logout => {
            state.logout();
            router.navigate_to_route(AppRoute::auth_success_redirect());
        }
    };

    let menu = move || {
        sidebar_options(is_authenticated.get(), is_admin.get())
            .into_iter()
            .map(|entry| match entry.target {
                MenuTarget::Route(route) => view! {
                    <li>
                        <Link to=route.to_path()>{entry.label}</Link>
                    </li>
                }
                .into_any(),
                MenuTarget::Action(action) => view! {
                    <li>
                        <button class="text-error" on:click=move |_| on_action(action)>
                            <LogOut attr:class="h-4 w-4" />
                            {entry.label}
                        </button>
                    </li>
                }
                .into_any(),
            })
            .collect_view()
    };

    view! {
        <div class="drawer lg:drawer-open min-h-screen bg-base-200 font-sans">
            <input id="unet-drawer" type="checkbox" class="drawer-toggle" />
            <div class="drawer-content flex flex-col">
                <div class="navbar bg-base-100 shadow-md">
                    <div class="flex-none lg:hidden">
                        <label for="unet-drawer" class="btn btn-square btn-ghost">"☰"</label>
                    </div>
                    <div class="flex-1 gap-2">
                        <Compass attr:class="text-primary h-6 w-6" />
                        <Link to="/" class="btn btn-ghost text-xl">"UNet360"</Link>
                    </div>
                    <div class="flex-none">
                        <span class="badge badge-neutral">{user_name}</span>
                    </div>
                </div>
                <main class="p-4 md:p-8">{children()}</main>
            </div>
            <div class="drawer-side">
                <label for="unet-drawer" class="drawer-overlay"></label>
                <ul class="menu bg-base-100 min-h-full w-64 p-4 gap-1">{menu}</ul>
            </div>
        </div>
    }
}
