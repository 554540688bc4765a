//! 后台仪表盘
//!
//! 聚合统计 + 待办入口。列表数据与审核页共享同一批
//! 带 tag 的查询，审核动作完成后这里自动刷新。

use crate::api::use_query;
use crate::components::icons::{FileText, RefreshCw, Trophy};
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::protocol::{
    GetDashboardStats, GetPublicTenders, ListNotesRequest, ListToppersRequest,
};
use topnotes_shared::{Note, NoteStatus, Tender, TopperStatus};

#[component]
pub fn DashboardPage() -> impl IntoView {
    let navigate = use_navigate();

    let stats = use_query(|| GetDashboardStats);
    let pending_notes = use_query(|| ListNotesRequest::with_status(NoteStatus::UnderReview));
    let pending_toppers = use_query(|| ListToppersRequest::with_status(TopperStatus::Pending));
    let tenders = use_query(|| GetPublicTenders);

    let total_users =
        move || stats.view().with(|v| v.data().map(|e| e.data.total_users).unwrap_or(0));
    let total_notes =
        move || stats.view().with(|v| v.data().map(|e| e.data.total_notes).unwrap_or(0));
    let total_revenue =
        move || stats.view().with(|v| v.data().map(|e| e.data.total_revenue).unwrap_or(0.0));
    let pending_note_count =
        move || pending_notes.view().with(|v| v.data().map(|e| e.data.len()).unwrap_or(0));
    let pending_topper_count =
        move || pending_toppers.view().with(|v| v.data().map(|e| e.data.len()).unwrap_or(0));

    let recent_uploads = move || {
        pending_notes.view().with(|v| {
            v.data()
                .map(|e| e.data.iter().take(5).cloned().collect::<Vec<Note>>())
                .unwrap_or_default()
        })
    };
    let tender_rows = move || {
        tenders.view().with(|v| {
            v.data()
                .map(|e| e.data.iter().take(5).cloned().collect::<Vec<Tender>>())
                .unwrap_or_default()
        })
    };

    let refreshing = move || stats.fetching().get() || pending_notes.fetching().get();
    let on_refresh = move |_| {
        stats.refetch();
        pending_notes.refetch();
        pending_toppers.refetch();
        tenders.refetch();
    };

    view! {
        <div class="max-w-7xl mx-auto space-y-6">
            <div class="flex items-center justify-between">
                <h2 class="text-2xl font-bold">"Overview"</h2>
                <button on:click=on_refresh disabled=refreshing class="btn btn-ghost btn-circle">
                    <RefreshCw attr:class=move || if refreshing() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                </button>
            </div>

            <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                <div class="stat">
                    <div class="stat-title">"Total users"</div>
                    <div class="stat-value text-primary">{total_users}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Total notes"</div>
                    <div class="stat-value">{total_notes}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"Revenue"</div>
                    <div class="stat-value text-secondary">
                        {move || format!("₹{:.2}", total_revenue())}
                    </div>
                </div>
            </div>

            <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                <div
                    class="card bg-base-100 shadow cursor-pointer hover:shadow-lg transition-shadow"
                    on:click={
                        let navigate = navigate.clone();
                        move |_| navigate(AppRoute::Admin(AdminRoute::Notes(NoteStatus::UnderReview)))
                    }
                >
                    <div class="card-body flex-row items-center justify-between">
                        <div>
                            <h3 class="card-title text-base">"Notes awaiting review"</h3>
                            <p class="text-3xl font-bold text-warning">{pending_note_count}</p>
                        </div>
                        <FileText attr:class="h-10 w-10 text-warning/60" />
                    </div>
                </div>
                <div
                    class="card bg-base-100 shadow cursor-pointer hover:shadow-lg transition-shadow"
                    on:click={
                        let navigate = navigate.clone();
                        move |_| navigate(AppRoute::Admin(AdminRoute::Toppers(TopperStatus::Pending)))
                    }
                >
                    <div class="card-body flex-row items-center justify-between">
                        <div>
                            <h3 class="card-title text-base">"Topper applications"</h3>
                            <p class="text-3xl font-bold text-info">{pending_topper_count}</p>
                        </div>
                        <Trophy attr:class="h-10 w-10 text-info/60" />
                    </div>
                </div>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body p-0">
                    <div class="p-6 pb-2">
                        <h3 class="card-title">"Recent uploads"</h3>
                    </div>
                    <div class="overflow-x-auto">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Title"</th>
                                    <th class="hidden md:table-cell">"Subject"</th>
                                    <th class="hidden md:table-cell">"Uploader"</th>
                                    <th>"Price"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || recent_uploads().is_empty() && !pending_notes.fetching().get()>
                                    <tr>
                                        <td colspan="4" class="text-center py-6 text-base-content/50">
                                            "Nothing waiting for review."
                                        </td>
                                    </tr>
                                </Show>
                                <For
                                    each=recent_uploads
                                    key=|note| note.id.clone()
                                    children=move |note| {
                                        view! {
                                            <tr>
                                                <td class="font-medium">{note.title}</td>
                                                <td class="hidden md:table-cell">{note.subject.unwrap_or_default()}</td>
                                                <td class="hidden md:table-cell opacity-70">{note.uploader.unwrap_or_default()}</td>
                                                <td>{note.price.map(|p| format!("₹{p:.0}")).unwrap_or_else(|| "Free".to_string())}</td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>

            <div class="card bg-base-100 shadow">
                <div class="card-body">
                    <h3 class="card-title">"Open tenders"</h3>
                    <Show
                        when=move || !tender_rows().is_empty()
                        fallback=|| view! { <p class="text-base-content/50">"No open tenders."</p> }
                    >
                        <ul class="space-y-2">
                            <For
                                each=tender_rows
                                key=|t| t.id.clone()
                                children=move |tender| {
                                    view! {
                                        <li class="flex items-center justify-between border-b border-base-200 pb-2">
                                            <span>{tender.title}</span>
                                            <span class="text-sm opacity-60">
                                                {tender.deadline.unwrap_or_default()}
                                            </span>
                                        </li>
                                    }
                                }
                            />
                        </ul>
                    </Show>
                </div>
            </div>
        </div>
    }
}
