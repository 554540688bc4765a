//! 笔记审核列表页

use crate::api::{MutationState, use_api, use_query};
use crate::components::confirm_modal::ConfirmDialog;
use crate::components::icons::{Check, Eye, Search, XMark};
use crate::components::notify::use_notify;
use crate::web::Debounce;
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::protocol::{ApproveNoteRequest, ListNotesRequest, RejectNoteRequest};
use topnotes_shared::{Note, NoteStatus};

const SEARCH_DEBOUNCE_MS: u32 = 400;

fn status_badge(status: NoteStatus) -> &'static str {
    match status {
        NoteStatus::UnderReview => "badge badge-warning badge-outline",
        NoteStatus::Approved => "badge badge-success badge-outline",
        NoteStatus::Rejected => "badge badge-error badge-outline",
    }
}

#[component]
pub fn NoteListPage(status: NoteStatus) -> impl IntoView {
    let client = use_api();
    let notify = use_notify();
    let navigate = use_navigate();

    let (input, set_input) = signal(String::new());
    let (search, set_search) = signal(String::new());

    let debounce = StoredValue::new_local(Debounce::new());
    let on_search_input = move |ev: leptos::web_sys::Event| {
        let value = event_target_value(&ev);
        set_input.set(value.clone());
        debounce.update_value(|d| {
            let value = value.clone();
            d.schedule(SEARCH_DEBOUNCE_MS, move || set_search.set(value.clone()));
        });
    };

    let query = use_query(move || {
        let mut op = ListNotesRequest::with_status(status);
        let term = search.get();
        if !term.trim().is_empty() {
            op.search = Some(term.trim().to_string());
        }
        op
    });

    let rows = move || {
        query
            .view()
            .with(|v| v.data().map(|e| e.data.clone()).unwrap_or_default())
    };
    let error_text = move || query.view().with(|v| v.error().map(|e| e.user_message()));

    let approve_target = RwSignal::new(Option::<(String, String)>::None);
    let reject_target = RwSignal::new(Option::<(String, String)>::None);
    let state = MutationState::new();

    let on_approve = {
        let client = client.clone();
        UnsyncCallback::new(move |_: String| {
            let Some((id, _)) = approve_target.get_untracked() else {
                return;
            };
            state.run(client.clone(), ApproveNoteRequest { id }, move || {
                approve_target.set(None);
                notify.success("Note approved");
            });
        })
    };

    let on_reject = {
        let client = client.clone();
        UnsyncCallback::new(move |reason: String| {
            let Some((id, _)) = reject_target.get_untracked() else {
                return;
            };
            state.run(
                client.clone(),
                RejectNoteRequest { id, reason: reason.trim().to_string() },
                move || {
                    reject_target.set(None);
                    notify.success("Note rejected");
                },
            );
        })
    };

    let close_dialogs = UnsyncCallback::new(move |_: ()| {
        approve_target.set(None);
        reject_target.set(None);
        state.error.set(None);
    });

    let dialog_error = Signal::derive(move || state.error.get().map(|e| e.user_message()));

    let tab = {
        let navigate = navigate.clone();
        move |to: NoteStatus| {
            let navigate = navigate.clone();
            move |_| navigate(AppRoute::Admin(AdminRoute::Notes(to)))
        }
    };
    let tab_class = move |s: NoteStatus| if s == status { "tab tab-active" } else { "tab" };

    view! {
        <div class="max-w-7xl mx-auto space-y-4">
            <div role="tablist" class="tabs tabs-boxed w-fit">
                <a role="tab" class=tab_class(NoteStatus::UnderReview) on:click=tab(NoteStatus::UnderReview)>"Under review"</a>
                <a role="tab" class=tab_class(NoteStatus::Approved) on:click=tab(NoteStatus::Approved)>"Approved"</a>
                <a role="tab" class=tab_class(NoteStatus::Rejected) on:click=tab(NoteStatus::Rejected)>"Rejected"</a>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body space-y-3">
                    <label class="input input-bordered flex items-center gap-2 md:max-w-sm">
                        <Search attr:class="h-4 w-4 opacity-50" />
                        <input
                            type="text"
                            class="grow"
                            placeholder="Search by title or subject"
                            on:input=on_search_input
                            prop:value=input
                        />
                    </label>

                    <Show when=move || error_text().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error_text().unwrap()}</span>
                        </div>
                    </Show>

                    <div class="overflow-x-auto">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Title"</th>
                                    <th class="hidden md:table-cell">"Subject"</th>
                                    <th class="hidden md:table-cell">"Uploader"</th>
                                    <th>"Price"</th>
                                    <th>"Status"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || rows().is_empty() && !query.fetching().get()>
                                    <tr>
                                        <td colspan="6" class="text-center py-8 text-base-content/50">
                                            "No notes in this state."
                                        </td>
                                    </tr>
                                </Show>
                                <Show when=move || query.fetching().get() && rows().is_empty()>
                                    <tr>
                                        <td colspan="6" class="text-center py-8 text-base-content/50">
                                            <span class="loading loading-spinner loading-md"></span>
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=rows
                                    key=|n: &Note| n.id.clone()
                                    children={
                                        let navigate = navigate.clone();
                                        move |note| {
                                            let review_id = note.id.clone();
                                            let approve_id = note.id.clone();
                                            let approve_title = note.title.clone();
                                            let reject_id = note.id.clone();
                                            let reject_title = note.title.clone();
                                            let navigate = navigate.clone();
                                            view! {
                                                <tr>
                                                    <td class="font-medium">{note.title.clone()}</td>
                                                    <td class="hidden md:table-cell">{note.subject.clone().unwrap_or_default()}</td>
                                                    <td class="hidden md:table-cell opacity-70">{note.uploader.clone().unwrap_or_default()}</td>
                                                    <td>{note.price.map(|p| format!("₹{p:.0}")).unwrap_or_else(|| "Free".to_string())}</td>
                                                    <td>
                                                        <span class=status_badge(note.status)>{note.status.as_str()}</span>
                                                    </td>
                                                    <td>
                                                        <div class="flex gap-1">
                                                            <button
                                                                class="btn btn-ghost btn-sm btn-square"
                                                                title="Review"
                                                                on:click=move |_| navigate(AppRoute::Admin(AdminRoute::NoteReview(review_id.clone())))
                                                            >
                                                                <Eye attr:class="h-4 w-4" />
                                                            </button>
                                                            <Show when=move || status == NoteStatus::UnderReview>
                                                                {
                                                                    let id = approve_id.clone();
                                                                    let title = approve_title.clone();
                                                                    view! {
                                                                        <button
                                                                            class="btn btn-success btn-sm btn-square"
                                                                            title="Approve"
                                                                            on:click=move |_| approve_target.set(Some((id.clone(), title.clone())))
                                                                        >
                                                                            <Check attr:class="h-4 w-4" />
                                                                        </button>
                                                                    }
                                                                }
                                                                {
                                                                    let id = reject_id.clone();
                                                                    let title = reject_title.clone();
                                                                    view! {
                                                                        <button
                                                                            class="btn btn-error btn-sm btn-square"
                                                                            title="Reject"
                                                                            on:click=move |_| reject_target.set(Some((id.clone(), title.clone())))
                                                                        >
                                                                            <XMark attr:class="h-4 w-4" />
                                                                        </button>
                                                                    }
                                                                }
                                                            </Show>
                                                        </div>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>

            <ConfirmDialog
                open=Signal::derive(move || approve_target.get().is_some())
                title="Approve note"
                message=Signal::derive(move || {
                    approve_target
                        .get()
                        .map(|(_, title)| format!("Publish \"{title}\" to the store?"))
                        .unwrap_or_default()
                })
                confirm_label="Approve"
                pending=state.pending
                error=dialog_error
                on_confirm=on_approve
                on_cancel=close_dialogs
            />

            <ConfirmDialog
                open=Signal::derive(move || reject_target.get().is_some())
                title="Reject note"
                message=Signal::derive(move || {
                    reject_target
                        .get()
                        .map(|(_, title)| format!("Reject \"{title}\"? The uploader sees the reason."))
                        .unwrap_or_default()
                })
                reason_label="Reason for rejection"
                confirm_label="Reject"
                destructive=true
                pending=state.pending
                error=dialog_error
                on_confirm=on_reject
                on_cancel=close_dialogs
            />
        </div>
    }
}
