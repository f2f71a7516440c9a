//! 新建节点页

mod adjacency_section;
mod form_state;
mod tags_section;

use leptos::prelude::*;
use leptos::task::spawn_local;
use unet360_client::{ClientError, ClientResult, log_warn};
use unet360_shared::{AppRoute, Location};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::components::icons::Plus;
use crate::components::notice::{Notice, Toast};
use crate::state::{AppServices, use_app_state};
use crate::web::router::use_router;

use adjacency_section::AdjacencySection;
use form_state::NodeFormState;
use tags_section::TagsSection;

/// 读出 `<input type="file">` 选中的第一个文件
async fn read_file(file: web_sys::File) -> ClientResult<(String, String, Vec<u8>)> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| ClientError::invalid_input(format!("{:?}", e)).in_op("file.read"))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    let content_type = match file.type_() {
        t if t.is_empty() => "application/octet-stream".to_string(),
        t => t,
    };
    Ok((file.name(), content_type, bytes))
}

/// 上传新图片；之前上传过的图片随后删除
async fn replace_image(services: &AppServices, form: NodeFormState, file: web_sys::File) -> ClientResult<()> {
    let token = services.auth.token();
    let (name, content_type, bytes) = read_file(file).await?;
    let uploaded = services
        .api
        .upload_image(&name, &content_type, bytes, token.as_deref())
        .await?;

    let previous = form.uploaded_path.get_untracked();
    form.url_image.set(uploaded.asset_url().to_string());
    form.uploaded_path.set(Some(uploaded.file_path.clone()));

    if let Some(previous) = previous {
        if let Err(e) = services.api.delete_image(&previous, token.as_deref()).await {
            log_warn!("[NodeForm] stale image {} not deleted: {}", previous, e);
        }
    }
    Ok(())
}

#[component]
pub fn NodeCreatePage() -> impl IntoView {
    let state = use_app_state();
    let router = use_router();
    let form = NodeFormState::new();
    let notice = Notice::new();
    let (saving, set_saving) = signal(false);
    let (uploading, set_uploading) = signal(false);

    // 邻居候选、标签、地点都来自缓存
    state.ensure_nodes();
    state.ensure_tags();
    state.ensure_locations();

    let on_file = move |ev: leptos::ev::Event| {
        let Some(file) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0))
        else {
            return;
        };
        set_uploading.set(true);
        let services = state.services();
        spawn_local(async move {
            match replace_image(&services, form, file).await {
                Ok(()) => notice.success("Imagen subida"),
                Err(e) => notice.error(format!("Error al subir la imagen: {}", e.message())),
            }
            set_uploading.set(false);
        });
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let node = match form.draft().into_node() {
            Ok(node) => node,
            Err(e) => {
                notice.error(e.to_string());
                return;
            }
        };
        set_saving.set(true);
        let services = state.services();
        spawn_local(async move {
            match services.nodes.create_node(node).await {
                Ok(created) => {
                    state.sync_nodes();
                    // 图缓存由后端重建，失败不影响节点本身
                    let token = services.auth.token();
                    if let Err(e) = services.api.refresh_graph(token.as_deref()).await {
                        log_warn!("[NodeForm] graph refresh failed: {}", e);
                    }
                    notice.success(format!("Nodo {} creado", created.name));
                    form.reset();
                    router.navigate_to_route(AppRoute::NodeAdmin);
                }
                Err(e) => notice.error(e.message().to_string()),
            }
            set_saving.set(false);
        });
    };

    let location_options = move || {
        state.locations.with(|c| {
            c.items()
                .iter()
                .map(|Location { name }| view! { <option value=name.clone()>{name.clone()}</option> })
                .collect_view()
        })
    };

    view! {
        <div class="max-w-3xl mx-auto">
            <Toast notice=notice />
            <form class="card bg-base-100 shadow-xl" on:submit=on_submit>
                <div class="card-body space-y-4">
                    <h2 class="card-title">"Nuevo nodo"</h2>

                    <input
                        type="text"
                        class="input input-bordered w-full"
                        placeholder="Nombre del nodo"
                        prop:value=move || form.name.get()
                        on:input=move |ev| form.name.set(event_target_value(&ev))
                    />

                    <select
                        class="select select-bordered w-full"
                        prop:value=move || form.location.get()
                        on:change=move |ev| form.location.set(event_target_value(&ev))
                    >
                        <option value="">"Sin ubicación"</option>
                        {location_options}
                    </select>

                    <div class="flex items-center gap-4">
                        <input
                            type="file"
                            accept="image/*"
                            class="file-input file-input-bordered w-full"
                            on:change=on_file
                        />
                        <Show when=move || uploading.get()>
                            <span class="loading loading-spinner"></span>
                        </Show>
                    </div>
                    <Show when=move || !form.url_image.with(String::is_empty)>
                        <img src=move || form.url_image.get() class="rounded-box max-h-48 object-cover" alt="preview" />
                    </Show>

                    <AdjacencySection form=form />
                    <TagsSection form=form />

                    <div class="card-actions justify-end">
                        <button
                            type="submit"
                            class="btn btn-primary gap-2"
                            disabled=move || saving.get() || uploading.get()
                        >
                            <Plus attr:class="h-4 w-4" />
                            "Crear nodo"
                        </button>
                    </div>
                </div>
            </form>
        </div>
    }
}
