//! 笔记审阅页
//!
//! 预览查询不挂 tag：审阅中的页面不因他处的审核动作被暗中刷新。
//! 审批/驳回成功后回到待审列表。

use crate::api::{MutationState, use_api, use_query};
use crate::components::confirm_modal::ConfirmDialog;
use crate::components::icons::ChevronLeft;
use crate::components::notify::use_notify;
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::NoteStatus;
use topnotes_shared::protocol::{ApproveNoteRequest, PreviewNoteRequest, RejectNoteRequest};

#[component]
pub fn NoteReviewPage(id: String) -> impl IntoView {
    let client = use_api();
    let notify = use_notify();
    let navigate = use_navigate();

    let query = {
        let id = id.clone();
        use_query(move || PreviewNoteRequest { id: id.clone() })
    };

    let preview = move || query.view().with(|v| v.data().map(|e| e.data.clone()));
    let error_text = move || query.view().with(|v| v.error().map(|e| e.user_message()));

    let (confirming, set_confirming) = signal(Option::<bool>::None); // Some(true)=approve
    let state = MutationState::new();

    let back_to_list = {
        let navigate = navigate.clone();
        move || navigate(AppRoute::Admin(AdminRoute::Notes(NoteStatus::UnderReview)))
    };

    let on_confirm = {
        let client = client.clone();
        let id = id.clone();
        let back = back_to_list.clone();
        UnsyncCallback::new(move |reason: String| {
            let Some(approve) = confirming.get_untracked() else {
                return;
            };
            let back = back.clone();
            if approve {
                state.run(client.clone(), ApproveNoteRequest { id: id.clone() }, move || {
                    notify.success("Note approved");
                    back();
                });
            } else {
                let request =
                    RejectNoteRequest { id: id.clone(), reason: reason.trim().to_string() };
                state.run(client.clone(), request, move || {
                    notify.success("Note rejected");
                    back();
                });
            }
        })
    };

    let on_cancel = UnsyncCallback::new(move |_: ()| {
        set_confirming.set(None);
        state.error.set(None);
    });

    let dialog_error = Signal::derive(move || state.error.get().map(|e| e.user_message()));
    let is_reject = move || confirming.get() == Some(false);

    view! {
        <div class="max-w-4xl mx-auto space-y-4">
            <button
                class="btn btn-ghost btn-sm gap-1"
                on:click={
                    let back = back_to_list.clone();
                    move |_| back()
                }
            >
                <ChevronLeft attr:class="h-4 w-4" /> "Back to notes"
            </button>

            <Show when=move || error_text().is_some()>
                <div role="alert" class="alert alert-error">
                    <span>{move || error_text().unwrap()}</span>
                </div>
            </Show>

            <Show
                when=move || preview().is_some()
                fallback=move || view! {
                    <div class="flex justify-center py-16">
                        <span class="loading loading-spinner loading-lg"></span>
                    </div>
                }
            >
                {move || {
                    let note = preview().unwrap();
                    let under_review = note.status == NoteStatus::UnderReview;
                    view! {
                        <div class="card bg-base-100 shadow">
                            <div class="card-body space-y-3">
                                <div class="flex items-start justify-between">
                                    <div>
                                        <h2 class="card-title">{note.title.clone()}</h2>
                                        <p class="text-sm opacity-70">{note.subject.clone().unwrap_or_default()}</p>
                                    </div>
                                    <span class="badge badge-warning badge-outline">{note.status.as_str()}</span>
                                </div>

                                <p class="text-base-content/80">
                                    {note.description.clone().unwrap_or_else(|| "No description provided.".to_string())}
                                </p>

                                {note.preview_url.clone().map(|url| view! {
                                    <iframe
                                        src=url
                                        class="w-full h-96 border border-base-300 rounded-lg"
                                        title="Note preview"
                                    ></iframe>
                                })}

                                <Show when=move || under_review>
                                    <div class="card-actions justify-end">
                                        <button class="btn btn-error btn-outline" on:click=move |_| set_confirming.set(Some(false))>
                                            "Reject"
                                        </button>
                                        <button class="btn btn-success" on:click=move |_| set_confirming.set(Some(true))>
                                            "Approve"
                                        </button>
                                    </div>
                                </Show>
                            </div>
                        </div>
                    }
                }}
            </Show>

            <ConfirmDialog
                open=Signal::derive(move || confirming.get() == Some(true))
                title="Approve note"
                message="Publish this note to the store?"
                confirm_label="Approve"
                pending=state.pending
                error=dialog_error
                on_confirm=on_confirm
                on_cancel=on_cancel
            />

            <ConfirmDialog
                open=Signal::derive(is_reject)
                title="Reject note"
                message="Reject this note? The uploader sees the reason."
                reason_label="Reason for rejection"
                confirm_label="Reject"
                destructive=true
                pending=state.pending
                error=dialog_error
                on_confirm=on_confirm
                on_cancel=on_cancel
            />
        </div>
    }
}
