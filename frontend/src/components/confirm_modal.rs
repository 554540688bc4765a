//! 共享确认弹窗
//!
//! 审批/驳回等变更在提交前统一经过这里确认。
//! 带 `reason_label` 时要求填写理由（驳回场景），否则纯确认。

use crate::components::icons::AlertTriangle;
use leptos::prelude::*;

#[component]
pub fn ConfirmDialog(
    /// 弹窗开关
    #[prop(into)]
    open: Signal<bool>,
    #[prop(into)] title: Signal<String>,
    #[prop(into)] message: Signal<String>,
    /// Some 时展示必填的理由输入框
    #[prop(optional)]
    reason_label: Option<&'static str>,
    #[prop(into)] confirm_label: Signal<String>,
    /// 确认按钮是否使用警示配色
    #[prop(optional, into)]
    destructive: Signal<bool>,
    /// 变更在途：禁用按钮
    #[prop(into)]
    pending: Signal<bool>,
    /// 最近一次失败的提示文案
    #[prop(into)]
    error: Signal<Option<String>>,
    /// 确认回调，参数为理由（无理由输入时为空串）
    on_confirm: UnsyncCallback<String>,
    on_cancel: UnsyncCallback<()>,
) -> impl IntoView {
    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();
    let (reason, set_reason) = signal(String::new());

    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            if open.get() {
                set_reason.set(String::new());
                if !dialog.open() {
                    let _ = dialog.show_modal();
                }
            } else if dialog.open() {
                dialog.close();
            }
        }
    });

    let reason_missing = move || reason_label.is_some() && reason.get().trim().is_empty();

    view! {
        <dialog node_ref=dialog_ref class="modal">
            <div class="modal-box">
                <h3 class="font-bold text-lg flex items-center gap-2">
                    <Show when=move || destructive.get()>
                        <AlertTriangle attr:class="h-5 w-5 text-error" />
                    </Show>
                    {move || title.get()}
                </h3>
                <p class="py-3 text-base-content/80">{move || message.get()}</p>

                {reason_label.map(|label| view! {
                    <div class="form-control">
                        <label class="label">
                            <span class="label-text">{label}</span>
                        </label>
                        <textarea
                            class="textarea textarea-bordered"
                            rows="3"
                            prop:value=reason
                            on:input=move |ev| set_reason.set(event_target_value(&ev))
                        ></textarea>
                    </div>
                })}

                <Show when=move || error.get().is_some()>
                    <div role="alert" class="alert alert-error text-sm py-2 mt-3">
                        <span>{move || error.get().unwrap()}</span>
                    </div>
                </Show>

                <div class="modal-action">
                    <button
                        class="btn btn-ghost"
                        disabled=move || pending.get()
                        on:click=move |_| on_cancel.run(())
                    >
                        "Cancel"
                    </button>
                    <button
                        class=move || if destructive.get() { "btn btn-error" } else { "btn btn-primary" }
                        disabled=move || pending.get() || reason_missing()
                        on:click=move |_| on_confirm.run(reason.get())
                    >
                        <Show when=move || pending.get()>
                            <span class="loading loading-spinner loading-sm"></span>
                        </Show>
                        {move || confirm_label.get()}
                    </button>
                </div>
            </div>
        </dialog>
    }
}
