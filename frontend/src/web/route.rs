//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由、访问级别与守卫判定。

use crate::session::AuthStatus;
use std::fmt::Display;
use topnotes_shared::{NoteStatus, TopperStatus};

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 公开落地页 (默认路由)
    #[default]
    Landing,
    /// 登录入口（手机号）
    Login,
    /// 发送 OTP
    SendOtp,
    /// 校验 OTP
    VerifyOtp,
    /// 首次登录的档案补全（需要认证）
    SetupProfile,
    /// 管理后台子树（需要认证，渲染在持久化外壳内）
    Admin(AdminRoute),
    /// 页面未找到
    NotFound,
}

/// `/superAdmin` 外壳下的子路由
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdminRoute {
    #[default]
    Dashboard,
    Toppers(TopperStatus),
    Notes(NoteStatus),
    NoteReview(String),
    Payouts,
}

/// 路由的访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// 任何人可见
    Public,
    /// 仅未登录管理员可见（已登录管理员会被请离）
    GuestOnly,
    /// 仅管理员可见
    AdminOnly,
}

/// 守卫判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// 放行，挂载目标页面
    Allow,
    /// 重定向到登录页
    RedirectLogin,
    /// 重定向到管理后台首页
    RedirectAdmin,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/" => Self::Landing,
            "/login" => Self::Login,
            "/send-otp" => Self::SendOtp,
            "/verify-otp" => Self::VerifyOtp,
            "/setup-profile" => Self::SetupProfile,
            "/superAdmin" => Self::Admin(AdminRoute::Dashboard),
            _ => match trimmed.strip_prefix("/superAdmin/") {
                Some(rest) => Self::parse_admin_child(rest),
                None => Self::NotFound,
            },
        }
    }

    fn parse_admin_child(rest: &str) -> Self {
        match rest {
            "toppers/pending" => Self::Admin(AdminRoute::Toppers(TopperStatus::Pending)),
            "toppers/approved" => Self::Admin(AdminRoute::Toppers(TopperStatus::Approved)),
            "toppers/rejected" => Self::Admin(AdminRoute::Toppers(TopperStatus::Rejected)),
            // 待审笔记在服务端的状态是 UNDER_REVIEW
            "notes/pending" => Self::Admin(AdminRoute::Notes(NoteStatus::UnderReview)),
            "notes/approved" => Self::Admin(AdminRoute::Notes(NoteStatus::Approved)),
            "notes/rejected" => Self::Admin(AdminRoute::Notes(NoteStatus::Rejected)),
            "payouts" => Self::Admin(AdminRoute::Payouts),
            _ => match rest.strip_prefix("notes/review/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Self::Admin(AdminRoute::NoteReview(id.to_string()))
                }
                _ => Self::NotFound,
            },
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Landing => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::SendOtp => "/send-otp".to_string(),
            Self::VerifyOtp => "/verify-otp".to_string(),
            Self::SetupProfile => "/setup-profile".to_string(),
            Self::Admin(child) => match child {
                AdminRoute::Dashboard => "/superAdmin".to_string(),
                AdminRoute::Toppers(status) => {
                    format!("/superAdmin/toppers/{}", status_segment_topper(*status))
                }
                AdminRoute::Notes(status) => {
                    format!("/superAdmin/notes/{}", status_segment_note(*status))
                }
                AdminRoute::NoteReview(id) => format!("/superAdmin/notes/review/{id}"),
                AdminRoute::Payouts => "/superAdmin/payouts".to_string(),
            },
            Self::NotFound => "/404".to_string(),
        }
    }

    /// 路由的访问级别
    pub fn access(&self) -> RouteAccess {
        match self {
            Self::Landing | Self::NotFound => RouteAccess::Public,
            Self::Login | Self::SendOtp | Self::VerifyOtp => RouteAccess::GuestOnly,
            Self::SetupProfile | Self::Admin(_) => RouteAccess::AdminOnly,
        }
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从 guest-only 页面）
    pub fn auth_success_redirect() -> Self {
        Self::Admin(AdminRoute::Dashboard)
    }
}

fn status_segment_topper(status: TopperStatus) -> &'static str {
    match status {
        TopperStatus::Pending => "pending",
        TopperStatus::Approved => "approved",
        TopperStatus::Rejected => "rejected",
    }
}

fn status_segment_note(status: NoteStatus) -> &'static str {
    match status {
        NoteStatus::UnderReview => "pending",
        NoteStatus::Approved => "approved",
        NoteStatus::Rejected => "rejected",
    }
}

/// **核心守卫逻辑**
///
/// 仅观察凭据状态并给出判定，绝不修改状态。
///
/// 注意不对称性：持 token 的非管理员访问 AdminOnly 路由与未登录
/// 一视同仁（请去登录页），但访问 GuestOnly 路由时并不会被请离 ——
/// 只有完整的管理员会话才触发 guest 页的重定向。该行为刻意保持。
pub fn guard_verdict(target: &AppRoute, status: &AuthStatus) -> GuardVerdict {
    match target.access() {
        RouteAccess::Public => GuardVerdict::Allow,
        RouteAccess::AdminOnly => {
            if status.is_admin() {
                GuardVerdict::Allow
            } else {
                GuardVerdict::RedirectLogin
            }
        }
        RouteAccess::GuestOnly => {
            if status.is_admin() {
                GuardVerdict::RedirectAdmin
            } else {
                GuardVerdict::Allow
            }
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topnotes_shared::UserRecord;

    fn admin_user() -> UserRecord {
        UserRecord { role: "ADMIN".to_string(), ..Default::default() }
    }

    fn plain_user() -> UserRecord {
        UserRecord { role: "USER".to_string(), ..Default::default() }
    }

    #[test]
    fn path_round_trip_for_every_route() {
        let routes = [
            AppRoute::Landing,
            AppRoute::Login,
            AppRoute::SendOtp,
            AppRoute::VerifyOtp,
            AppRoute::SetupProfile,
            AppRoute::Admin(AdminRoute::Dashboard),
            AppRoute::Admin(AdminRoute::Toppers(TopperStatus::Pending)),
            AppRoute::Admin(AdminRoute::Toppers(TopperStatus::Approved)),
            AppRoute::Admin(AdminRoute::Toppers(TopperStatus::Rejected)),
            AppRoute::Admin(AdminRoute::Notes(NoteStatus::UnderReview)),
            AppRoute::Admin(AdminRoute::Notes(NoteStatus::Approved)),
            AppRoute::Admin(AdminRoute::Notes(NoteStatus::Rejected)),
            AppRoute::Admin(AdminRoute::NoteReview("abc123".to_string())),
            AppRoute::Admin(AdminRoute::Payouts),
        ];

        for route in routes {
            assert_eq!(AppRoute::from_path(&route.to_path()), route);
        }
    }

    #[test]
    fn unknown_paths_fall_through_to_not_found() {
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/superAdmin/unknown"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/superAdmin/notes/review/"), AppRoute::NotFound);
        assert_eq!(AppRoute::from_path("/superAdmin/notes/review/a/b"), AppRoute::NotFound);
    }

    #[test]
    fn admin_routes_require_admin_session() {
        let targets = [
            AppRoute::SetupProfile,
            AppRoute::Admin(AdminRoute::Dashboard),
            AppRoute::Admin(AdminRoute::Payouts),
            AppRoute::Admin(AdminRoute::NoteReview("n1".to_string())),
        ];

        for target in &targets {
            assert_eq!(
                guard_verdict(target, &AuthStatus::Guest),
                GuardVerdict::RedirectLogin
            );
            assert_eq!(
                guard_verdict(target, &AuthStatus::NonAdmin(plain_user())),
                GuardVerdict::RedirectLogin
            );
            assert_eq!(
                guard_verdict(target, &AuthStatus::Admin(admin_user())),
                GuardVerdict::Allow
            );
        }
    }

    #[test]
    fn guest_routes_redirect_admin_sessions() {
        for target in [AppRoute::Login, AppRoute::SendOtp, AppRoute::VerifyOtp] {
            assert_eq!(
                guard_verdict(&target, &AuthStatus::Admin(admin_user())),
                GuardVerdict::RedirectAdmin
            );
            assert_eq!(guard_verdict(&target, &AuthStatus::Guest), GuardVerdict::Allow);
        }
    }

    #[test]
    fn non_admin_session_satisfies_neither_guard() {
        // token 在手但角色不是 ADMIN：后台拒之门外，guest 页照常可见
        let status = AuthStatus::NonAdmin(plain_user());
        assert_eq!(
            guard_verdict(&AppRoute::Admin(AdminRoute::Dashboard), &status),
            GuardVerdict::RedirectLogin
        );
        assert_eq!(guard_verdict(&AppRoute::Login, &status), GuardVerdict::Allow);
    }

    #[test]
    fn public_routes_never_redirect() {
        for status in [
            AuthStatus::Guest,
            AuthStatus::NonAdmin(plain_user()),
            AuthStatus::Admin(admin_user()),
        ] {
            assert_eq!(guard_verdict(&AppRoute::Landing, &status), GuardVerdict::Allow);
            assert_eq!(guard_verdict(&AppRoute::NotFound, &status), GuardVerdict::Allow);
        }
    }
}
