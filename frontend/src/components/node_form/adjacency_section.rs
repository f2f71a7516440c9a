use leptos::prelude::*;
use unet360_shared::Direction;

use super::form_state::NodeFormState;
use crate::state::use_app_state;

/// 四个方向的邻居与权重
#[component]
pub fn AdjacencySection(form: NodeFormState) -> impl IntoView {
    let state = use_app_state();

    // 候选邻居：已有节点，排除自己
    let candidates = move || {
        let own = form.name.get();
        state.nodes.with(|c| {
            c.items()
                .iter()
                .map(|n| n.name.clone())
                .filter(|name| *name != own)
                .collect::<Vec<_>>()
        })
    };

    let rows = Direction::ALL
        .into_iter()
        .map(|direction| {
            let neighbor = form.neighbors[direction.index()];
            let weight = form.weights[direction.index()];
            view! {
                <div class="grid grid-cols-3 gap-2 items-center">
                    <span class="label-text">{direction.label()}</span>
                    <select
                        class="select select-bordered select-sm"
                        prop:value=move || neighbor.get()
                        on:change=move |ev| neighbor.set(event_target_value(&ev))
                    >
                        <option value="">"—"</option>
                        {move || {
                            candidates()
                                .into_iter()
                                .map(|name| view! { <option value=name.clone()>{name.clone()}</option> })
                                .collect_view()
                        }}
                    </select>
                    <input
                        type="number"
                        min="0.1"
                        step="0.1"
                        class="input input-bordered input-sm"
                        disabled=move || neighbor.with(String::is_empty)
                        prop:value=move || weight.get().to_string()
                        on:input=move |ev| {
                            if let Ok(value) = event_target_value(&ev).parse::<f64>() {
                                weight.set(value);
                            }
                        }
                    />
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="space-y-2">
            <h4 class="font-semibold">"Nodos adyacentes"</h4>
            {rows}
        </div>
    }
}
