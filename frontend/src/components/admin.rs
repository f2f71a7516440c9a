//! 管理列表页：节点、标签、地点共用一个视图，按路由元数据中的实体区分

use leptos::prelude::*;
use leptos::task::spawn_local;
use unet360_shared::{AdminEntity, AppRoute, Location, Tag};

use crate::components::home::showcase_href;
use crate::components::icons::{Plus, RefreshCw, Trash};
use crate::components::notice::{Notice, Toast};
use crate::state::{AppState, use_app_state};
use crate::web::router::Link;

/// 列表中的一行
#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: String,
    detail: String,
    href: Option<String>,
}

fn rows(state: &AppState, entity: AdminEntity) -> Vec<Row> {
    match entity {
        AdminEntity::Node => state.nodes.with(|c| {
            c.items()
                .iter()
                .map(|n| Row {
                    name: n.name.clone(),
                    detail: n.location.clone().unwrap_or_default(),
                    href: Some(showcase_href(&n.name)),
                })
                .collect()
        }),
        AdminEntity::Tag => state.tags.with(|c| {
            c.items()
                .iter()
                .map(|t| Row {
                    name: t.name.clone(),
                    detail: t.labels.join(", "),
                    href: None,
                })
                .collect()
        }),
        AdminEntity::Location => state.locations.with(|c| {
            c.items()
                .iter()
                .map(|l| Row {
                    name: l.name.clone(),
                    detail: String::new(),
                    href: None,
                })
                .collect()
        }),
    }
}

fn loading(state: &AppState, entity: AdminEntity) -> bool {
    match entity {
        AdminEntity::Node => state.nodes.with(|c| c.is_loading),
        AdminEntity::Tag => state.tags.with(|c| c.is_loading),
        AdminEntity::Location => state.locations.with(|c| c.is_loading),
    }
}

fn fetch_error(state: &AppState, entity: AdminEntity) -> Option<String> {
    match entity {
        AdminEntity::Node => state.nodes.with(|c| c.error.clone()),
        AdminEntity::Tag => state.tags.with(|c| c.error.clone()),
        AdminEntity::Location => state.locations.with(|c| c.error.clone()),
    }
}

fn refresh(state: &AppState, entity: AdminEntity) {
    match entity {
        AdminEntity::Node => state.refresh_nodes(),
        AdminEntity::Tag => state.refresh_tags(),
        AdminEntity::Location => state.refresh_locations(),
    }
}

/// 删除并同步缓存镜像
fn delete(state: AppState, entity: AdminEntity, name: String, notice: Notice) {
    let services = state.services();
    spawn_local(async move {
        let result = match entity {
            AdminEntity::Node => services.nodes.delete_node(&name).await,
            AdminEntity::Tag => services.tags.delete_tag(&name).await,
            AdminEntity::Location => services.locations.delete_location(&name).await,
        };
        match result {
            Ok(()) => notice.success(format!("{} eliminado", name)),
            Err(e) => notice.error(format!("No se pudo eliminar {}: {}", name, e.message())),
        }
        match entity {
            AdminEntity::Node => state.sync_nodes(),
            AdminEntity::Tag => state.sync_tags(),
            AdminEntity::Location => state.sync_locations(),
        }
    });
}

#[component]
pub fn AdminPage(entity: AdminEntity) -> impl IntoView {
    let state = use_app_state();
    let notice = Notice::new();
    let pending_delete = RwSignal::new(None::<String>);

    match entity {
        AdminEntity::Node => state.ensure_nodes(),
        AdminEntity::Tag => state.ensure_tags(),
        AdminEntity::Location => state.ensure_locations(),
    }

    let on_confirm = move |name: String| delete(state, entity, name, notice);

    view! {
        <div class="max-w-5xl mx-auto space-y-6">
            <Toast notice=notice />
            <ConfirmDialog pending=pending_delete on_confirm=on_confirm />

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body p-0">
                    <div class="flex items-center justify-between p-6 pb-2">
                        <h3 class="card-title">{entity.label()}</h3>
                        <div class="flex gap-2">
                            {(entity == AdminEntity::Node).then(|| view! {
                                <Link to=AppRoute::NodeCreate.to_path() class="btn btn-primary btn-sm gap-2">
                                    <Plus attr:class="h-4 w-4" /> "Nuevo nodo"
                                </Link>
                            })}
                            <button
                                class="btn btn-ghost btn-circle"
                                disabled=move || loading(&state, entity)
                                on:click=move |_| refresh(&state, entity)
                            >
                                <RefreshCw attr:class=move || if loading(&state, entity) { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                            </button>
                        </div>
                    </div>

                    <Show when=move || fetch_error(&state, entity).is_some()>
                        <div class="alert alert-error mx-6">
                            <span>{move || fetch_error(&state, entity).unwrap_or_default()}</span>
                        </div>
                    </Show>

                    <div class="overflow-x-auto w-full">
                        <table class="table table-zebra w-full">
                            <tbody>
                                <Show when=move || rows(&state, entity).is_empty() && !loading(&state, entity)>
                                    <tr>
                                        <td colspan="3" class="text-center py-8 text-base-content/50">
                                            "No hay registros."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=move || rows(&state, entity)
                                    key=|row| row.name.clone()
                                    children=move |row| {
                                        let name = row.name.clone();
                                        let title = match row.href {
                                            Some(href) => view! { <Link to=href class="link">{row.name}</Link> }.into_any(),
                                            None => view! { <span>{row.name}</span> }.into_any(),
                                        };
                                        view! {
                                            <tr>
                                                <td class="font-semibold">{title}</td>
                                                <td class="text-base-content/70">{row.detail}</td>
                                                <td class="text-right">
                                                    <button
                                                        class="btn btn-ghost btn-sm text-error"
                                                        on:click=move |_| pending_delete.set(Some(name.clone()))
                                                    >
                                                        <Trash attr:class="h-4 w-4" />
                                                    </button>
                                                </td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>

            {match entity {
                AdminEntity::Tag => view! { <TagCreateForm notice=notice /> }.into_any(),
                AdminEntity::Location => view! { <LocationCreateForm notice=notice /> }.into_any(),
                AdminEntity::Node => ().into_any(),
            }}
        </div>
    }
}

/// 删除确认对话框，`pending` 有值时打开
#[component]
fn ConfirmDialog(
    pending: RwSignal<Option<String>>,
    #[prop(into)] on_confirm: Callback<String>,
) -> impl IntoView {
    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();

    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            let open = pending.with(Option::is_some);
            if open && !dialog.open() {
                let _ = dialog.show_modal();
            } else if !open && dialog.open() {
                dialog.close();
            }
        }
    });

    let confirm = move |_| {
        if let Some(name) = pending.get_untracked() {
            on_confirm.run(name);
        }
        pending.set(None);
    };

    view! {
        <dialog node_ref=dialog_ref class="modal" on:close=move |_| pending.set(None)>
            <div class="modal-box">
                <h3 class="font-bold text-lg">"Confirmar eliminación"</h3>
                <p class="py-4">
                    "¿Eliminar " <span class="font-semibold">{move || pending.get().unwrap_or_default()}</span> "?"
                </p>
                <div class="modal-action">
                    <button class="btn" on:click=move |_| pending.set(None)>"Cancelar"</button>
                    <button class="btn btn-error" on:click=confirm>"Eliminar"</button>
                </div>
            </div>
        </dialog>
    }
}

#[component]
fn TagCreateForm(notice: Notice) -> impl IntoView {
    let state = use_app_state();
    let name = RwSignal::new(String::new());
    let icon = RwSignal::new(String::new());
    let labels = RwSignal::new(String::new());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let mut tag = Tag::new(name.get_untracked().trim());
        let icon_name = icon.get_untracked().trim().to_string();
        tag.icon_name = (!icon_name.is_empty()).then_some(icon_name);
        tag.labels = labels
            .get_untracked()
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let services = state.services();
        spawn_local(async move {
            match services.tags.create_tag(tag).await {
                Ok(created) => {
                    state.sync_tags();
                    notice.success(format!("Etiqueta {} creada", created.name));
                    name.set(String::new());
                    icon.set(String::new());
                    labels.set(String::new());
                }
                Err(e) => notice.error(e.message().to_string()),
            }
        });
    };

    view! {
        <form class="card bg-base-100 shadow-xl" on:submit=on_submit>
            <div class="card-body grid grid-cols-1 md:grid-cols-4 gap-2 items-end">
                <input class="input input-bordered" placeholder="Nombre" prop:value=move || name.get() on:input=move |ev| name.set(event_target_value(&ev)) />
                <input class="input input-bordered" placeholder="Icono" prop:value=move || icon.get() on:input=move |ev| icon.set(event_target_value(&ev)) />
                <input class="input input-bordered" placeholder="Subetiquetas, separadas por comas" prop:value=move || labels.get() on:input=move |ev| labels.set(event_target_value(&ev)) />
                <button type="submit" class="btn btn-primary gap-2"><Plus attr:class="h-4 w-4" /> "Agregar"</button>
            </div>
        </form>
    }
}

#[component]
fn LocationCreateForm(notice: Notice) -> impl IntoView {
    let state = use_app_state();
    let name = RwSignal::new(String::new());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let location = Location::new(name.get_untracked().trim());
        let services = state.services();
        spawn_local(async move {
            match services.locations.create_location(location).await {
                Ok(created) => {
                    state.sync_locations();
                    notice.success(format!("Ubicación {} creada", created.name));
                    name.set(String::new());
                }
                Err(e) => notice.error(e.message().to_string()),
            }
        });
    };

    view! {
        <form class="card bg-base-100 shadow-xl" on:submit=on_submit>
            <div class="card-body flex-row gap-2">
                <input class="input input-bordered flex-1" placeholder="Nombre de la ubicación" prop:value=move || name.get() on:input=move |ev| name.set(event_target_value(&ev)) />
                <button type="submit" class="btn btn-primary gap-2"><Plus attr:class="h-4 w-4" /> "Agregar"</button>
            </div>
        </form>
    }
}
