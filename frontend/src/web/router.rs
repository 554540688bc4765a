//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 实现了"监听 -> 验证 -> 处理 -> 加载"的导航流程。
//!
//! 守卫只在导航时判定：被拒绝的导航不会挂载目标页面，
//! 因此页面声明的查询也绝不会发出。

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::route::{AppRoute, GuardVerdict, guard_verdict};
use crate::session::AuthStatus;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态（内部工具函数）
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
/// 通过注入的认证状态信号实现与会话系统的解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前路由（只读信号）
    current_route: ReadSignal<AppRoute>,
    /// 设置当前路由（写入信号）
    set_route: WriteSignal<AppRoute>,
    /// 认证状态（注入的信号，实现解耦）
    auth_status: Signal<AuthStatus>,
}

impl RouterService {
    /// 创建新的路由服务
    fn new(auth_status: Signal<AuthStatus>) -> Self {
        let path = current_path();
        let initial_route = AppRoute::from_path(&path);
        let (current_route, set_route) = signal(initial_route);

        Self {
            current_route,
            set_route,
            auth_status,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 按路径导航（内部解析为路由后走守卫流程）
    pub fn navigate(&self, path: &str) {
        self.navigate_to(AppRoute::from_path(path));
    }

    /// **核心方法：导航与守卫**
    ///
    /// 流程：请求 -> 验证(Guard) -> 处理 -> 加载
    pub fn navigate_to(&self, target_route: AppRoute) {
        self.navigate_to_route(target_route, true);
    }

    /// 导航到指定路由
    ///
    /// # Arguments
    /// * `use_push` - true 使用 pushState, false 使用 replaceState
    fn navigate_to_route(&self, target_route: AppRoute, use_push: bool) {
        let status = self.auth_status.get_untracked();

        let resolved = match guard_verdict(&target_route, &status) {
            GuardVerdict::Allow => target_route,
            GuardVerdict::RedirectLogin => {
                web_sys::console::log_1(&"[Router] Access denied. Redirecting to login.".into());
                AppRoute::auth_failure_redirect()
            }
            GuardVerdict::RedirectAdmin => {
                web_sys::console::log_1(
                    &"[Router] Already signed in. Redirecting to admin home.".into(),
                );
                AppRoute::auth_success_redirect()
            }
        };

        if use_push {
            push_history_state(&resolved.to_path());
        } else {
            replace_history_state(&resolved.to_path());
        }
        self.set_route.set(resolved);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;
        let auth_status = self.auth_status;

        let closure = Closure::<dyn Fn()>::new(move || {
            let target_route = AppRoute::from_path(&current_path());
            let status = auth_status.get_untracked();

            // popstate 时也执行守卫逻辑
            match guard_verdict(&target_route, &status) {
                GuardVerdict::Allow => set_route.set(target_route),
                GuardVerdict::RedirectLogin => {
                    let redirect = AppRoute::auth_failure_redirect();
                    replace_history_state(&redirect.to_path());
                    set_route.set(redirect);
                }
                GuardVerdict::RedirectAdmin => {
                    let redirect = AppRoute::auth_success_redirect();
                    replace_history_state(&redirect.to_path());
                    set_route.set(redirect);
                }
            }
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 设置认证状态变化时的自动重定向
    ///
    /// 守卫自身绝不修改认证状态，这里只对外部迁移
    /// （登录成功 / 登出）做出反应。
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let auth_status = self.auth_status;

        Effect::new(move |_| {
            let status = auth_status.get();
            let route = current_route.get_untracked();

            match guard_verdict(&route, &status) {
                GuardVerdict::Allow => {}
                GuardVerdict::RedirectLogin => {
                    // 登出（或降权）发生在受保护页面上
                    let redirect = AppRoute::auth_failure_redirect();
                    push_history_state(&redirect.to_path());
                    set_route.set(redirect);
                    web_sys::console::log_1(
                        &"[Router] Auth state changed: signed out, redirecting to login.".into(),
                    );
                }
                GuardVerdict::RedirectAdmin => {
                    // 登录成功时仍停留在 guest 页面
                    let redirect = AppRoute::auth_success_redirect();
                    push_history_state(&redirect.to_path());
                    set_route.set(redirect);
                    web_sys::console::log_1(
                        &"[Router] Auth state changed: signed in, redirecting to admin home."
                            .into(),
                    );
                }
            }
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(auth_status: Signal<AuthStatus>) -> RouterService {
    let router = RouterService::new(auth_status);

    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

/// 导航函数（返回一个可调用的闭包）
pub fn use_navigate() -> impl Fn(AppRoute) + Clone {
    let router = use_router();
    move |to: AppRoute| {
        router.navigate_to(to);
    }
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 认证状态信号
    auth_status: Signal<AuthStatus>,
    /// 子组件
    children: Children,
) -> impl IntoView {
    provide_router(auth_status);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}
