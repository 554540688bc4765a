//! 提现处理页
//!
//! 状态筛选 + 翻页；处理弹窗里标记打款（交易号必填）
//! 或驳回（备注选填）。成功后 Payouts tag 失效，列表重取。

use crate::api::{MutationState, use_api, use_query};
use crate::components::notify::use_notify;
use leptos::prelude::*;
use topnotes_shared::protocol::{ListPayoutsRequest, UpdatePayoutStatusRequest};
use topnotes_shared::{PayoutRequest, PayoutStatus};

const PAGE_SIZE: u32 = 10;

fn status_badge(status: PayoutStatus) -> &'static str {
    match status {
        PayoutStatus::Pending => "badge badge-warning badge-outline",
        PayoutStatus::Paid => "badge badge-success badge-outline",
        PayoutStatus::Rejected => "badge badge-error badge-outline",
    }
}

fn account_summary(payout: &PayoutRequest) -> String {
    payout
        .payout_details
        .as_ref()
        .and_then(|d| {
            d.upi_id
                .clone()
                .or_else(|| d.account_number.as_ref().map(|a| format!("A/C {a}")))
        })
        .unwrap_or_else(|| "—".to_string())
}

#[component]
pub fn PayoutListPage() -> impl IntoView {
    let client = use_api();
    let notify = use_notify();

    let (filter, set_filter) = signal(PayoutStatus::Pending);
    let (page, set_page) = signal(1u32);

    let query = use_query(move || ListPayoutsRequest {
        status: filter.get(),
        page: Some(page.get()),
        limit: Some(PAGE_SIZE),
    });

    let rows = move || {
        query
            .view()
            .with(|v| v.data().map(|e| e.data.clone()).unwrap_or_default())
    };
    let pagination = move || query.view().with(|v| v.data().and_then(|e| e.pagination));
    let error_text = move || query.view().with(|v| v.error().map(|e| e.user_message()));

    // 处理弹窗
    let target = RwSignal::new(Option::<PayoutRequest>::None);
    let (transaction_id, set_transaction_id) = signal(String::new());
    let (remarks, set_remarks) = signal(String::new());
    let state = MutationState::new();

    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();
    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            if target.get().is_some() {
                set_transaction_id.set(String::new());
                set_remarks.set(String::new());
                state.error.set(None);
                if !dialog.open() {
                    let _ = dialog.show_modal();
                }
            } else if dialog.open() {
                dialog.close();
            }
        }
    });

    let submit = {
        let client = client.clone();
        move |to_status: PayoutStatus| {
            let Some(payout) = target.get_untracked() else {
                return;
            };
            let request = UpdatePayoutStatusRequest {
                id: payout.id,
                status: to_status,
                transaction_id: match to_status {
                    PayoutStatus::Paid => Some(transaction_id.get_untracked().trim().to_string()),
                    _ => None,
                },
                admin_remarks: {
                    let text = remarks.get_untracked().trim().to_string();
                    if text.is_empty() { None } else { Some(text) }
                },
            };
            state.run(client.clone(), request, move || {
                target.set(None);
                notify.success(match to_status {
                    PayoutStatus::Paid => "Payout marked as paid",
                    _ => "Payout rejected",
                });
            });
        }
    };

    let mark_paid = {
        let submit = submit.clone();
        move |_| {
            if transaction_id.get().trim().is_empty() {
                notify.error("Transaction ID is required to mark as paid");
                return;
            }
            submit(PayoutStatus::Paid);
        }
    };
    let reject = {
        let submit = submit.clone();
        move |_| submit(PayoutStatus::Rejected)
    };

    let on_filter = move |to: PayoutStatus| {
        move |_| {
            set_filter.set(to);
            set_page.set(1);
        }
    };
    let filter_class = move |s: PayoutStatus| {
        move || if filter.get() == s { "tab tab-active" } else { "tab" }
    };

    view! {
        <div class="max-w-7xl mx-auto space-y-4">
            <div role="tablist" class="tabs tabs-boxed w-fit">
                <a role="tab" class=filter_class(PayoutStatus::Pending) on:click=on_filter(PayoutStatus::Pending)>"Pending"</a>
                <a role="tab" class=filter_class(PayoutStatus::Paid) on:click=on_filter(PayoutStatus::Paid)>"Paid"</a>
                <a role="tab" class=filter_class(PayoutStatus::Rejected) on:click=on_filter(PayoutStatus::Rejected)>"Rejected"</a>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body space-y-3">
                    <Show when=move || error_text().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2">
                            <span>{move || error_text().unwrap()}</span>
                        </div>
                    </Show>

                    <div class="overflow-x-auto">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Requested by"</th>
                                    <th>"Amount"</th>
                                    <th class="hidden md:table-cell">"Account"</th>
                                    <th class="hidden md:table-cell">"Requested at"</th>
                                    <th>"Status"</th>
                                    <th></th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || rows().is_empty() && !query.fetching().get()>
                                    <tr>
                                        <td colspan="6" class="text-center py-8 text-base-content/50">
                                            "No payout requests here."
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
                                    key=|p: &PayoutRequest| p.id.clone()
                                    children=move |payout| {
                                        let summary = account_summary(&payout);
                                        let row_status = payout.status;
                                        let row = payout.clone();
                                        view! {
                                            <tr>
                                                <td class="font-medium">{payout.requested_by.clone().unwrap_or_default()}</td>
                                                <td>{format!("₹{:.2}", payout.amount)}</td>
                                                <td class="hidden md:table-cell font-mono text-xs">{summary}</td>
                                                <td class="hidden md:table-cell opacity-70">{payout.created_at.clone().unwrap_or_default()}</td>
                                                <td>
                                                    <span class=status_badge(payout.status)>{payout.status.as_str()}</span>
                                                </td>
                                                <td>
                                                    <Show when=move || row_status == PayoutStatus::Pending>
                                                        {
                                                            let row = row.clone();
                                                            view! {
                                                                <button
                                                                    class="btn btn-primary btn-sm"
                                                                    on:click=move |_| target.set(Some(row.clone()))
                                                                >
                                                                    "Process"
                                                                </button>
                                                            }
                                                        }
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
                        <span class="text-sm opacity-70">{move || format!("Page {}", page.get())}</span>
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

            <dialog node_ref=dialog_ref class="modal">
                <div class="modal-box">
                    <h3 class="font-bold text-lg">"Process payout"</h3>
                    <p class="py-2 text-base-content/80">
                        {move || {
                            target
                                .get()
                                .map(|p| format!(
                                    "₹{:.2} requested by {}",
                                    p.amount,
                                    p.requested_by.unwrap_or_default()
                                ))
                                .unwrap_or_default()
                        }}
                    </p>

                    <div class="form-control">
                        <label class="label">
                            <span class="label-text">"Transaction ID (required to mark as paid)"</span>
                        </label>
                        <input
                            type="text"
                            class="input input-bordered font-mono"
                            on:input=move |ev| set_transaction_id.set(event_target_value(&ev))
                            prop:value=transaction_id
                        />
                    </div>
                    <div class="form-control">
                        <label class="label">
                            <span class="label-text">"Remarks (optional)"</span>
                        </label>
                        <textarea
                            class="textarea textarea-bordered"
                            rows="2"
                            on:input=move |ev| set_remarks.set(event_target_value(&ev))
                            prop:value=remarks
                        ></textarea>
                    </div>

                    <Show when=move || state.error.get().is_some()>
                        <div role="alert" class="alert alert-error text-sm py-2 mt-3">
                            <span>{move || state.error.get().unwrap().user_message()}</span>
                        </div>
                    </Show>

                    <div class="modal-action">
                        <button
                            class="btn btn-ghost"
                            disabled=move || state.pending.get()
                            on:click=move |_| target.set(None)
                        >
                            "Cancel"
                        </button>
                        <button
                            class="btn btn-error btn-outline"
                            disabled=move || state.pending.get()
                            on:click=reject
                        >
                            "Reject"
                        </button>
                        <button
                            class="btn btn-success"
                            disabled=move || state.pending.get()
                            on:click=mark_paid
                        >
                            <Show when=move || state.pending.get()>
                                <span class="loading loading-spinner loading-sm"></span>
                            </Show>
                            "Mark as paid"
                        </button>
                    </div>
                </div>
            </dialog>
        </div>
    }
}
