use leptos::prelude::*;

use super::form_state::NodeFormState;
use crate::state::use_app_state;

/// 按分类勾选子标签
#[component]
pub fn TagsSection(form: NodeFormState) -> impl IntoView {
    let state = use_app_state();

    let groups = move || {
        state.tags.with(|c| {
            c.items()
                .iter()
                .map(|tag| {
                    let category = tag.name.clone();
                    let labels = if tag.labels.is_empty() {
                        vec![tag.name.clone()]
                    } else {
                        tag.labels.clone()
                    };
                    let boxes = labels
                        .into_iter()
                        .map(|label| {
                            let key = (category.clone(), label.clone());
                            let checked = move || form.tags.with(|t| t.contains(&key));
                            let toggle = {
                                let (category, label) = (category.clone(), label.clone());
                                move |_| form.toggle_tag(&category, &label)
                            };
                            view! {
                                <label class="label cursor-pointer gap-2">
                                    <input type="checkbox" class="checkbox checkbox-sm" prop:checked=checked on:change=toggle />
                                    <span class="label-text">{label}</span>
                                </label>
                            }
                        })
                        .collect_view();
                    view! {
                        <fieldset class="border border-base-300 rounded-box p-2">
                            <legend class="px-1 text-sm font-semibold">{category.clone()}</legend>
                            <div class="flex flex-wrap gap-2">{boxes}</div>
                        </fieldset>
                    }
                })
                .collect_view()
        })
    };

    view! {
        <div class="space-y-2">
            <h4 class="font-semibold">"Etiquetas"</h4>
            <Show
                when=move || !state.tags.with(|c| c.is_empty())
                fallback=|| view! { <p class="text-sm text-base-content/60">"No hay etiquetas registradas."</p> }
            >
                {groups}
            </Show>
        </div>
    }
}
