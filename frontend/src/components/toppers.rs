//! 状元榜审核页
//!
//! 状态 tab 映射到路由；搜索走防抖，翻页/筛选直接改查询参数。
//! 审批/驳回过确认弹窗，成功后 Toppers tag 失效，列表自动重取。

use crate::api::{MutationState, use_api, use_query};
use crate::components::confirm_modal::ConfirmDialog;
use crate::components::icons::{Check, Search, XMark};
use crate::components::notify::use_notify;
use crate::web::Debounce;
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::protocol::{ApproveTopperRequest, ListToppersRequest, RejectTopperRequest};
use topnotes_shared::{Topper, TopperStatus};

const PAGE_SIZE: u32 = 10;
const SEARCH_DEBOUNCE_MS: u32 = 400;

fn opt(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn status_badge(status: TopperStatus) -> &'static str {
    match status {
        TopperStatus::Pending => "badge badge-warning badge-outline",
        TopperStatus::Approved => "badge badge-success badge-outline",
        TopperStatus::Rejected => "badge badge-error badge-outline",
    }
}

#[component]
pub fn TopperListPage(status: TopperStatus) -> impl IntoView {
    let client = use_api();
    let notify = use_notify();
    let navigate = use_navigate();

    let (input, set_input) = signal(String::new());
    let (search, set_search) = signal(String::new());
    let (class_filter, set_class_filter) = signal(String::new());
    let (stream_filter, set_stream_filter) = signal(String::new());
    let (board_filter, set_board_filter) = signal(String::new());
    let (page, set_page) = signal(1u32);

    let debounce = StoredValue::new_local(Debounce::new());
    let on_search_input = move |ev: leptos::web_sys::Event| {
        let value = event_target_value(&ev);
        set_input.set(value.clone());
        debounce.update_value(|d| {
            let value = value.clone();
            d.schedule(SEARCH_DEBOUNCE_MS, move || {
                set_search.set(value.clone());
                set_page.set(1);
            });
        });
    };

    let query = use_query(move || ListToppersRequest {
        status,
        page: Some(page.get()),
        limit: Some(PAGE_SIZE),
        search: opt(search.get()),
        expertise_class: opt(class_filter.get()),
        stream: opt(stream_filter.get()),
        board: opt(board_filter.get()),
    });

    let rows = move || {
        query
            .view()
            .with(|v| v.data().map(|e| e.data.clone()).unwrap_or_default())
    };
    let pagination = move || query.view().with(|v| v.data().and_then(|e| e.pagination));
    let error_text = move || query.view().with(|v| v.error().map(|e| e.user_message()));

    // 审批 / 驳回目标 (id, 姓名)
    let approve_target = RwSignal::new(Option::<(String, String)>::None);
    let reject_target = RwSignal::new(Option::<(String, String)>::None);
    let state = MutationState::new();

    let on_approve = {
        let client = client.clone();
        UnsyncCallback::new(move |_: String| {
            let Some((id, _)) = approve_target.get_untracked() else {
                return;
            };
            state.run(client.clone(), ApproveTopperRequest { id }, move || {
                approve_target.set(None);
                notify.success("Topper approved");
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
                RejectTopperRequest { id, reason: reason.trim().to_string() },
                move || {
                    reject_target.set(None);
                    notify.success("Topper rejected");
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
        move |to: TopperStatus| {
            let navigate = navigate.clone();
            move |_| navigate(AppRoute::Admin(AdminRoute::Toppers(to)))
        }
    };
    let tab_class =
        move |s: TopperStatus| if s == status { "tab tab-active" } else { "tab" };

    view! {
        <div class="max-w-7xl mx-auto space-y-4">
            <div role="tablist" class="tabs tabs-boxed w-fit">
                <a role="tab" class=tab_class(TopperStatus::Pending) on:click=tab(TopperStatus::Pending)>"Pending"</a>
                <a role="tab" class=tab_class(TopperStatus::Approved) on:click=tab(TopperStatus::Approved)>"Approved"</a>
                <a role="tab" class=tab_class(TopperStatus::Rejected) on:click=tab(TopperStatus::Rejected)>"Rejected"</a>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body space-y-3">
                    <div class="flex flex-col md:flex-row gap-2">
                        <label class="input input-bordered flex items-center gap-2 flex-1">
                            <Search attr:class="h-4 w-4 opacity-50" />
                            <input
                                type="text"
                                class="grow"
                                placeholder="Search by name"
                                on:input=on_search_input
                                prop:value=input
                            />
                        </label>
                        <input
                            type="text"
                            class="input input-bordered md:w-36"
                            placeholder="Class"
                            on:change=move |ev| { set_class_filter.set(event_target_value(&ev)); set_page.set(1); }
                            prop:value=class_filter
                        />
                        <input
                            type="text"
                            class="input input-bordered md:w-36"
                            placeholder="Stream"
                            on:change=move |ev| { set_stream_filter.set(event_target_value(&ev)); set_page.set(1); }
                            prop:value=stream_filter
                        />
                        <input
                            type="text"
                            class="input input-bordered md:w-36"
                            placeholder="Board"
                            on:change=move |ev| { set_board_filter.set(event_target_value(&ev)); set_page.set(1); }
                            prop:value=board_filter
                        />
                    </div>

                    <Show when=move || error_text().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error_text().unwrap()}</span>
                        </div>
                    </Show>

                    <div class="overflow-x-auto">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Name"</th>
                                    <th class="hidden md:table-cell">"Class"</th>
                                    <th class="hidden md:table-cell">"Stream"</th>
                                    <th class="hidden md:table-cell">"Board"</th>
                                    <th>"Status"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || rows().is_empty() && !query.fetching().get()>
                                    <tr>
                                        <td colspan="6" class="text-center py-8 text-base-content/50">
                                            "No applications here."
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
                                    key=|t: &Topper| t.id.clone()
                                    children=move |topper| {
                                        let approve_id = topper.id.clone();
                                        let approve_name = topper.name.clone();
                                        let reject_id = topper.id.clone();
                                        let reject_name = topper.name.clone();
                                        view! {
                                            <tr>
                                                <td class="font-medium">{topper.name.clone()}</td>
                                                <td class="hidden md:table-cell">{topper.expertise_class.clone().unwrap_or_default()}</td>
                                                <td class="hidden md:table-cell">{topper.stream.clone().unwrap_or_default()}</td>
                                                <td class="hidden md:table-cell">{topper.board.clone().unwrap_or_default()}</td>
                                                <td>
                                                    <span class=status_badge(topper.status)>
                                                        {topper.status.as_str()}
                                                    </span>
                                                </td>
                                                <td>
                                                    <Show when=move || status == TopperStatus::Pending>
                                                        <div class="flex gap-1">
                                                            {
                                                                let id = approve_id.clone();
                                                                let name = approve_name.clone();
                                                                view! {
                                                                    <button
                                                                        class="btn btn-success btn-sm btn-square"
                                                                        title="Approve"
                                                                        on:click=move |_| approve_target.set(Some((id.clone(), name.clone())))
                                                                    >
                                                                        <Check attr:class="h-4 w-4" />
                                                                    </button>
                                                                }
                                                            }
                                                            {
                                                                let id = reject_id.clone();
                                                                let name = reject_name.clone();
                                                                view! {
                                                                    <button
                                                                        class="btn btn-error btn-sm btn-square"
                                                                        title="Reject"
                                                                        on:click=move |_| reject_target.set(Some((id.clone(), name.clone())))
                                                                    >
                                                                        <XMark attr:class="h-4 w-4" />
                                                                    </button>
                                                                }
                                                            }
                                                        </div>
                                                    </Show>
                                                </td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>

                    <div class="flex items-center justify-end gap-2">
                        <button
                            class="btn btn-sm"
                            disabled=move || page.get() <= 1
                            on:click=move |_| set_page.update(|p| *p = p.saturating_sub(1).max(1))
                        >
                            "Prev"
                        </button>
                        <span class="text-sm opacity-70">
                            {move || {
                                let total = pagination().and_then(|p| p.total_pages).unwrap_or(1);
                                format!("Page {} of {}", page.get(), total.max(1))
                            }}
                        </span>
                        <button
                            class="btn btn-sm"
                            disabled=move || {
                                pagination()
                                    .and_then(|p| p.total_pages)
                                    .is_some_and(|total| page.get() >= total)
                            }
                            on:click=move |_| set_page.update(|p| *p += 1)
                        >
                            "Next"
                        </button>
                    </div>
                </div>
            </div>

            <ConfirmDialog
                open=Signal::derive(move || approve_target.get().is_some())
                title="Approve topper"
                message=Signal::derive(move || {
                    approve_target
                        .get()
                        .map(|(_, name)| format!("Publish {name} on the toppers board?"))
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
                title="Reject topper"
                message=Signal::derive(move || {
                    reject_target
                        .get()
                        .map(|(_, name)| format!("Reject the application from {name}?"))
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
