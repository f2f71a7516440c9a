//! 页面右上角的短暂通知

use std::time::Duration;

use leptos::prelude::*;

/// 通知内容与是否出错
#[derive(Clone, Copy)]
pub struct Notice(RwSignal<Option<(String, bool)>>);

impl Notice {
    pub fn new() -> Self {
        let message = RwSignal::new(None::<(String, bool)>);

        // 3秒后清除通知
        Effect::new(move |_| {
            if message.with(Option::is_some) {
                set_timeout(move || message.set(None), Duration::from_secs(3));
            }
        });

        Self(message)
    }

    pub fn success(&self, text: impl Into<String>) {
        self.0.set(Some((text.into(), false)));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.0.set(Some((text.into(), true)));
    }
}

#[component]
pub fn Toast(notice: Notice) -> impl IntoView {
    let message = notice.0;
    move || {
        message.get().map(|(text, is_err)| {
            let class = if is_err {
                "alert alert-error shadow-lg"
            } else {
                "alert alert-success shadow-lg"
            };
            view! {
                <div class="toast toast-top toast-end z-50">
                    <div class=class>
                        <span>{text}</span>
                    </div>
                </div>
            }
        })
    }
}
