//! 全景浏览页：当前节点图片、四向邻居、小地图与最短路径

use leptos::prelude::*;
use leptos::task::spawn_local;
use unet360_shared::protocol::ShortestPath;
use unet360_shared::route::query_param;
use unet360_shared::{Direction, Node, StatusLevel};

use crate::components::home::showcase_href;
use crate::components::icons::RouteIcon;
use crate::state::use_app_state;
use crate::web::router::{Link, use_router};

fn status_badge(status: Option<StatusLevel>) -> (&'static str, &'static str) {
    match status {
        Some(StatusLevel::Ok) => ("badge badge-success", "OK"),
        Some(StatusLevel::Warning) => ("badge badge-warning", "WARNING"),
        Some(StatusLevel::Error) => ("badge badge-error", "ERROR"),
        None => ("badge badge-ghost", "—"),
    }
}

#[component]
pub fn ShowcasePage() -> impl IntoView {
    let state = use_app_state();
    let router = use_router();

    Effect::new(move |_| {
        if state.session.with(|s| s.is_authenticated) {
            state.ensure_nodes();
        }
    });

    // `?node=` 缺省时展示第一个节点
    let current_name = Memo::new(move |_| {
        query_param(&router.query(), "node").or_else(|| {
            state
                .nodes
                .with(|c| c.items().first().map(|n| n.name.clone()))
        })
    });

    let current = move || {
        let name = current_name.get()?;
        state
            .nodes
            .with(|c| c.items().iter().find(|n| n.name == name).cloned())
    };

    view! {
        <div class="max-w-6xl mx-auto space-y-6">
            <Show
                when=move || current().is_some()
                fallback=move || view! {
                    <div class="alert">
                        {move || if state.nodes.with(|c| c.is_loading) {
                            "Cargando nodos...".to_string()
                        } else {
                            match current_name.get() {
                                Some(name) => format!("El nodo {} no existe.", name),
                                None => "No hay nodos disponibles.".to_string(),
                            }
                        }}
                    </div>
                }
            >
                {move || current().map(|node| view! { <NodeView node=node /> })}
            </Show>
            <ShortestPathPanel source=Signal::derive(move || current_name.get()) />
        </div>
    }
}

#[component]
fn NodeView(node: Node) -> impl IntoView {
    let state = use_app_state();
    let (badge_class, badge_text) = status_badge(node.status);
    let reasons = node.reasons.clone().unwrap_or_default();

    let name = node.name.clone();
    let neighbors = move || {
        state.nodes.track();
        state.services().nodes.neighbors(&name)
    };

    let tags = node
        .tags
        .iter()
        .map(|(category, labels)| {
            view! {
                <div class="badge badge-outline gap-1">
                    <span class="font-semibold">{category.to_string()}</span>
                    {labels.join(", ")}
                </div>
            }
        })
        .collect_view();

    let minimap = node.minimap.clone().map(|minimap| {
        let marker = format!("left: {}px; top: {}px;", minimap.x, minimap.y);
        view! {
            <div class="relative inline-block">
                <img src=minimap.url_image class="rounded-box max-w-xs" alt="minimap" />
                <span class="absolute w-3 h-3 -m-1.5 rounded-full bg-error" style=marker></span>
            </div>
        }
    });

    view! {
        <div class="card bg-base-100 shadow-xl">
            <figure class="bg-base-300">
                <img src=node.url_image.clone() alt=node.name.clone() class="w-full max-h-[60vh] object-cover" />
            </figure>
            <div class="card-body">
                <div class="flex items-center gap-2">
                    <h2 class="card-title">{node.name.clone()}</h2>
                    <span class=badge_class>{badge_text}</span>
                    <span class="text-base-content/60">{node.location.clone().unwrap_or_default()}</span>
                </div>
                <ul class="text-sm text-warning list-disc ml-4">
                    {reasons.into_iter().map(|r| view! { <li>{r}</li> }).collect_view()}
                </ul>
                <div class="flex flex-wrap gap-2">{tags}</div>

                <div class="grid grid-cols-2 md:grid-cols-4 gap-2 mt-4">
                    {move || {
                        let found = neighbors();
                        Direction::ALL
                            .into_iter()
                            .map(|direction| {
                                match found.iter().find(|(d, _, _)| *d == direction) {
                                    Some((_, neighbor, known)) => {
                                        let href = showcase_href(&neighbor.name);
                                        let neighbor_name = neighbor.name.clone();
                                        let class = if known.is_some() {
                                            "btn btn-primary btn-outline"
                                        } else {
                                            "btn btn-disabled"
                                        };
                                        view! {
                                            <Link to=href class=class>
                                                {direction.label()} ": " {neighbor_name}
                                            </Link>
                                        }
                                        .into_any()
                                    }
                                    None => view! {
                                        <span class="btn btn-ghost btn-disabled">{direction.label()}</span>
                                    }
                                    .into_any(),
                                }
                            })
                            .collect_view()
                    }}
                </div>
                {minimap}
            </div>
        </div>
    }
}

/// 最短路径查询由后端计算
#[component]
fn ShortestPathPanel(source: Signal<Option<String>>) -> impl IntoView {
    let state = use_app_state();
    let target = RwSignal::new(String::new());
    let loading = RwSignal::new(false);
    let result = RwSignal::new(Option::<Result<ShortestPath, String>>::None);

    let on_search = move |_| {
        let (Some(from), to) = (source.get_untracked(), target.get_untracked()) else {
            return;
        };
        if to.is_empty() {
            return;
        }
        loading.set(true);
        let services = state.services();
        spawn_local(async move {
            let token = services.auth.token();
            let outcome = services
                .api
                .fetch_shortest_path(&from, &to, token.as_deref())
                .await
                .map_err(|e| e.message().to_string());
            result.set(Some(outcome));
            loading.set(false);
        });
    };

    let options = move || {
        state.nodes.with(|c| {
            c.items()
                .iter()
                .map(|n| view! { <option value=n.name.clone()>{n.name.clone()}</option> })
                .collect_view()
        })
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <h3 class="card-title">
                    <RouteIcon attr:class="h-5 w-5" /> "Cómo llegar"
                </h3>
                <div class="join w-full">
                    <select
                        class="select select-bordered join-item flex-1"
                        on:change=move |ev| target.set(event_target_value(&ev))
                    >
                        <option value="" selected>"Destino"</option>
                        {options}
                    </select>
                    <button
                        class="btn btn-primary join-item"
                        disabled=move || loading.get() || source.get().is_none()
                        on:click=on_search
                    >
                        "Buscar ruta"
                    </button>
                </div>
                {move || match result.get() {
                    None => ().into_any(),
                    Some(Ok(path)) => view! {
                        <ul class="steps steps-vertical">
                            {path
                                .path
                                .into_iter()
                                .map(|step| {
                                    let href = showcase_href(&step);
                                    view! {
                                        <li class="step step-primary">
                                            <Link to=href>{step}</Link>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                        <p class="text-sm text-base-content/70">
                            "Distancia total: " {format!("{:.1}", path.total_weight)}
                        </p>
                    }
                    .into_any(),
                    Some(Err(message)) => view! {
                        <div class="alert alert-error"><span>{message}</span></div>
                    }
                    .into_any(),
                }}
            </div>
        </div>
    }
}
