//! 全局通知
//!
//! 应用级的瞬时提示：任何页面都可以写入一条消息，
//! `ToastHost` 渲染并在 3 秒后自动清除。

use leptos::prelude::*;

/// 通知上下文 (消息内容, 是否出错)
#[derive(Clone, Copy)]
pub struct NotifyContext {
    message: RwSignal<Option<(String, bool)>>,
}

impl NotifyContext {
    pub fn success(&self, text: impl Into<String>) {
        self.message.set(Some((text.into(), false)));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.message.set(Some((text.into(), true)));
    }
}

pub fn provide_notify() -> NotifyContext {
    let ctx = NotifyContext { message: RwSignal::new(None) };
    provide_context(ctx);
    ctx
}

pub fn use_notify() -> NotifyContext {
    use_context::<NotifyContext>().expect("NotifyContext should be provided")
}

/// 通知提示框，挂在 App 根部
#[component]
pub fn ToastHost() -> impl IntoView {
    let notify = use_notify();
    let message = notify.message;

    // 3秒后清除通知
    Effect::new(move |_| {
        if message.get().is_some() {
            set_timeout(
                move || message.set(None),
                std::time::Duration::from_secs(3),
            );
        }
    });

    view! {
        <Show when=move || message.get().is_some()>
            <div class="toast toast-top toast-end z-50">
                <div class=move || {
                    let (_, is_err) = message.get().unwrap();
                    if is_err {
                        "alert alert-error shadow-lg"
                    } else {
                        "alert alert-success shadow-lg"
                    }
                }>
                    <span>{move || message.get().unwrap().0}</span>
                </div>
            </div>
        </Show>
    }
}
