//! 管理后台外壳
//!
//! 侧边栏 + 顶栏 + 子页出口。登出只清本地凭据，
//! 回到登录页由路由服务的认证状态监听完成。

use crate::components::dashboard::DashboardPage;
use crate::components::icons::{FileText, LayoutDashboard, LogOut, Trophy, Wallet};
use crate::components::note_review::NoteReviewPage;
use crate::components::notes::NoteListPage;
use crate::components::payouts::PayoutListPage;
use crate::components::toppers::TopperListPage;
use crate::session::use_session;
use crate::web::route::{AdminRoute, AppRoute};
use crate::web::router::use_navigate;
use leptos::prelude::*;
use topnotes_shared::{NoteStatus, TopperStatus};

fn section_label(child: &AdminRoute) -> &'static str {
    match child {
        AdminRoute::Dashboard => "Dashboard",
        AdminRoute::Toppers(_) => "Toppers",
        AdminRoute::Notes(_) | AdminRoute::NoteReview(_) => "Notes",
        AdminRoute::Payouts => "Payouts",
    }
}

#[component]
pub fn AdminShell(child: AdminRoute) -> impl IntoView {
    let session = use_session();
    let navigate = use_navigate();

    let display_name = session
        .current()
        .user()
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| "Admin".to_string());

    let on_logout = {
        let session = session.clone();
        move |_| session.logout()
    };

    let section = section_label(&child);
    let is_dashboard = matches!(child, AdminRoute::Dashboard);
    let is_toppers = matches!(child, AdminRoute::Toppers(_));
    let is_notes = matches!(child, AdminRoute::Notes(_) | AdminRoute::NoteReview(_));
    let is_payouts = matches!(child, AdminRoute::Payouts);

    let content = match child {
        AdminRoute::Dashboard => view! { <DashboardPage /> }.into_any(),
        AdminRoute::Toppers(status) => view! { <TopperListPage status=status /> }.into_any(),
        AdminRoute::Notes(status) => view! { <NoteListPage status=status /> }.into_any(),
        AdminRoute::NoteReview(id) => view! { <NoteReviewPage id=id /> }.into_any(),
        AdminRoute::Payouts => view! { <PayoutListPage /> }.into_any(),
    };

    let nav = {
        let navigate = navigate.clone();
        move |route: AppRoute| {
            let navigate = navigate.clone();
            move |_| navigate(route.clone())
        }
    };

    view! {
        <div class="drawer lg:drawer-open min-h-screen bg-base-200">
            <input id="admin-drawer" type="checkbox" class="drawer-toggle" />

            <div class="drawer-content flex flex-col">
                <header class="navbar bg-base-100 shadow-sm px-4">
                    <div class="flex-none lg:hidden">
                        <label for="admin-drawer" class="btn btn-square btn-ghost drawer-button">
                            <svg xmlns="http://www.w3.org/2000/svg" fill="none" viewBox="0 0 24 24" class="inline-block w-6 h-6 stroke-current"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M4 6h16M4 12h16M4 18h16"></path></svg>
                        </label>
                    </div>
                    <div class="flex-1">
                        <span class="text-lg font-semibold">{section}</span>
                    </div>
                    <div class="flex-none gap-3">
                        <span class="text-sm text-base-content/70 hidden md:inline">
                            {display_name}
                        </span>
                        <button on:click=on_logout class="btn btn-outline btn-error btn-sm gap-2">
                            <LogOut attr:class="h-4 w-4" /> "Logout"
                        </button>
                    </div>
                </header>

                <main class="p-4 md:p-6 flex-1">{content}</main>
            </div>

            <div class="drawer-side">
                <label for="admin-drawer" class="drawer-overlay"></label>
                <aside class="w-64 min-h-full bg-base-100 border-r border-base-300">
                    <div class="p-4 text-xl font-bold">"TopNotes Admin"</div>
                    <ul class="menu px-2 gap-1">
                        <li>
                            <a class:active=is_dashboard on:click=nav(AppRoute::Admin(AdminRoute::Dashboard))>
                                <LayoutDashboard attr:class="h-5 w-5" /> "Dashboard"
                            </a>
                        </li>
                        <li>
                            <a
                                class:active=is_toppers
                                on:click=nav(AppRoute::Admin(AdminRoute::Toppers(TopperStatus::Pending)))
                            >
                                <Trophy attr:class="h-5 w-5" /> "Toppers"
                            </a>
                        </li>
                        <li>
                            <a
                                class:active=is_notes
                                on:click=nav(AppRoute::Admin(AdminRoute::Notes(NoteStatus::UnderReview)))
                            >
                                <FileText attr:class="h-5 w-5" /> "Notes"
                            </a>
                        </li>
                        <li>
                            <a class:active=is_payouts on:click=nav(AppRoute::Admin(AdminRoute::Payouts))>
                                <Wallet attr:class="h-5 w-5" /> "Payouts"
                            </a>
                        </li>
                    </ul>
                </aside>
            </div>
        </div>
    }
}
