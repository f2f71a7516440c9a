use leptos::prelude::*;
use unet360_shared::menu::{general_info, home_cards};
use unet360_shared::{AppRoute, NavigationTarget, Node};

use crate::components::icons::NamedIcon;
use crate::state::use_app_state;
use crate::web::router::Link;

/// 全景页地址，节点名放在 `node` 参数里
pub(crate) fn showcase_href(node: &str) -> String {
    NavigationTarget::new(AppRoute::Showcase)
        .with_query("node", node)
        .to_href()
}

#[component]
pub fn HomePage() -> impl IntoView {
    let state = use_app_state();
    let is_authenticated = state.is_authenticated();
    let (query, set_query) = signal(String::new());

    // 登录后才有节点可看
    Effect::new(move |_| {
        if is_authenticated.get() {
            state.ensure_nodes();
        }
    });

    let results = move || {
        let query = query.get();
        state.nodes.with(|cache| {
            cache
                .items()
                .iter()
                .filter(|node| node.matches(&query))
                .cloned()
                .collect::<Vec<Node>>()
        })
    };

    let cards = home_cards()
        .into_iter()
        .map(|card| {
            view! {
                <div class="card bg-base-100 shadow-md">
                    <div class="card-body items-center text-center">
                        <NamedIcon name=card.icon />
                        <p>{card.text}</p>
                    </div>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="max-w-6xl mx-auto space-y-8">
            <div class="hero bg-base-100 rounded-box shadow-xl">
                <div class="hero-content text-center py-12">
                    <div class="max-w-2xl">
                        <h1 class="text-4xl font-bold">"UNet360"</h1>
                        <p class="py-6 text-base-content/70">{general_info()}</p>
                    </div>
                </div>
            </div>

            <div class="grid grid-cols-1 md:grid-cols-3 gap-4">{cards}</div>

            <Show
                when=move || is_authenticated.get()
                fallback=|| view! {
                    <div class="alert">
                        <span>"Inicia sesión para explorar los nodos del campus."</span>
                    </div>
                }
            >
                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body">
                        <input
                            type="search"
                            class="input input-bordered w-full"
                            placeholder="Buscar aulas, baños, servicios..."
                            prop:value=move || query.get()
                            on:input=move |ev| set_query.set(event_target_value(&ev))
                        />
                        <Show when=move || state.nodes.with(|c| c.error.is_some())>
                            <div class="alert alert-error">
                                <span>{move || state.nodes.with(|c| c.error.clone().unwrap_or_default())}</span>
                            </div>
                        </Show>
                        <Show when=move || state.nodes.with(|c| c.is_loading)>
                            <span class="loading loading-dots loading-md"></span>
                        </Show>
                        <ul class="menu w-full">
                            <For
                                each=results
                                key=|node| node.name.clone()
                                children=move |node| {
                                    let href = showcase_href(&node.name);
                                    let location = node.location.clone().unwrap_or_default();
                                    view! {
                                        <li>
                                            <Link to=href>
                                                <span class="font-semibold">{node.name.clone()}</span>
                                                <span class="text-base-content/60">{location}</span>
                                            </Link>
                                        </li>
                                    }
                                }
                            />
                        </ul>
                    </div>
                </div>
            </Show>
        </div>
    }
}
