//! TopNotes 管理端前端
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `session`: 凭据与认证状态管理
//! - `api`: 声明式查询/变更客户端（缓存 + tag 失效）
//! - `components`: UI 组件层

mod api;
mod components {
    pub mod confirm_modal;
    pub mod dashboard;
    mod icons;
    pub mod landing;
    pub mod login;
    pub mod note_review;
    pub mod notes;
    pub mod notify;
    pub mod payouts;
    pub mod profile_setup;
    pub mod send_otp;
    pub mod shell;
    pub mod toppers;
    pub mod verify_otp;
}
mod session;

use leptos::prelude::*;
use std::rc::Rc;

use crate::api::{FetchTransport, QueryClient, api_base, provide_api};
use crate::components::landing::LandingPage;
use crate::components::login::LoginPage;
use crate::components::notify::{ToastHost, provide_notify};
use crate::components::profile_setup::ProfileSetupPage;
use crate::components::send_otp::SendOtpPage;
use crate::components::shell::AdminShell;
use crate::components::verify_otp::VerifyOtpPage;
use crate::session::{BrowserCredentials, SessionContext, provide_session};

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，
// 以减小 WASM 二进制体积。
pub(crate) mod web;

use web::route::AppRoute;
use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
/// 守卫拒绝的导航不会走到这里，受保护页面的查询因此不会发出。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Landing => view! { <LandingPage /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::SendOtp => view! { <SendOtpPage /> }.into_any(),
        AppRoute::VerifyOtp => view! { <VerifyOtpPage /> }.into_any(),
        AppRoute::SetupProfile => view! { <ProfileSetupPage /> }.into_any(),
        AppRoute::Admin(child) => view! { <AdminShell child=child /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"Page not found"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 会话上下文：凭据存储 + 认证状态信号
    let session = SessionContext::new(Rc::new(BrowserCredentials));
    provide_session(session.clone());

    // 2. API 客户端：浏览器 fetch 传输 + 进程级查询缓存
    let client = QueryClient::new(api_base(), Rc::new(FetchTransport), session.clone());
    provide_api(client);

    // 3. 全局通知
    provide_notify();

    // 4. 认证状态信号注入路由服务（解耦！）
    let auth_status = session.status_signal();

    view! {
        <Router auth_status=auth_status>
            <ToastHost />
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}
