//! 会话模块
//!
//! 管理凭据的持久化与认证状态派生，与路由系统解耦：
//! 路由服务只消费这里导出的认证状态信号。
//!
//! 写入纪律：`authToken` / `userDetails` 两个键只允许本模块写入，
//! 其余代码一律只读。

use crate::web::LocalStorage;
use leptos::prelude::*;
use std::rc::Rc;
use topnotes_shared::UserRecord;

/// 承载会话令牌的存储键
pub const STORAGE_TOKEN_KEY: &str = "authToken";
/// 承载用户档案 JSON 的存储键
pub const STORAGE_USER_KEY: &str = "userDetails";
/// 等待 OTP 校验的手机号（刷新页面后的兜底）
pub const STORAGE_OTP_PHONE_KEY: &str = "otp_phone";

// =========================================================
// 凭据存储抽象
// =========================================================

/// 键值凭据存储
///
/// 抽象出接口以便守卫和会话逻辑在测试中换用内存实现。
/// 无过期、无加密、不保证跨标签页同步。
pub trait CredentialStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    /// 删除不存在的键是空操作，永不失败
    fn remove(&self, key: &str);
}

/// 浏览器 LocalStorage 实现
pub struct BrowserCredentials;

impl CredentialStore for BrowserCredentials {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::get(key)
    }

    fn set(&self, key: &str, value: &str) {
        LocalStorage::set(key, value);
    }

    fn remove(&self, key: &str) {
        LocalStorage::remove(key);
    }
}

/// 内存实现，测试专用
#[cfg(test)]
pub struct MemoryCredentials {
    map: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryCredentials {
    pub fn new() -> Self {
        Self {
            map: std::cell::RefCell::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
impl CredentialStore for MemoryCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}

// =========================================================
// 认证状态
// =========================================================

/// 每次导航从凭据存储新鲜派生的认证状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthStatus {
    /// 无令牌
    #[default]
    Guest,
    /// 持有令牌但角色不是 ADMIN（或档案无法解析，一律不升权）
    NonAdmin(UserRecord),
    /// 完整的管理员会话
    Admin(UserRecord),
}

impl AuthStatus {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::Guest => None,
            Self::NonAdmin(user) | Self::Admin(user) => Some(user),
        }
    }
}

/// 从存储派生认证状态
///
/// 损坏的 `userDetails` JSON 按"档案缺失"处理（fail closed）：
/// 绝不因为解析失败而给出 Admin。
pub fn derive_status(store: &dyn CredentialStore) -> AuthStatus {
    if store.get(STORAGE_TOKEN_KEY).is_none() {
        return AuthStatus::Guest;
    }

    let parsed = store
        .get(STORAGE_USER_KEY)
        .and_then(|json| serde_json::from_str::<UserRecord>(&json).ok());

    match parsed {
        Some(user) if user.is_admin() => AuthStatus::Admin(user),
        Some(user) => AuthStatus::NonAdmin(user),
        None => AuthStatus::NonAdmin(UserRecord::default()),
    }
}

/// 写入会话凭据（OTP 校验成功时）
pub fn persist_session(store: &dyn CredentialStore, token: &str, user: &UserRecord) {
    store.set(STORAGE_TOKEN_KEY, token);
    if let Ok(json) = serde_json::to_string(user) {
        store.set(STORAGE_USER_KEY, &json);
    }
}

/// 清除会话凭据（登出）
///
/// 纯本地操作，不向服务端发起注销请求。
pub fn clear_session(store: &dyn CredentialStore) {
    store.remove(STORAGE_TOKEN_KEY);
    store.remove(STORAGE_USER_KEY);
    store.remove(STORAGE_OTP_PHONE_KEY);
}

// =========================================================
// 会话上下文
// =========================================================

/// 会话上下文
///
/// 持有存储句柄与认证状态信号，通过 Context 在组件间共享。
/// 信号与存储由本模块在写入时同步更新。
#[derive(Clone)]
pub struct SessionContext {
    store: Rc<dyn CredentialStore>,
    status: RwSignal<AuthStatus>,
}

impl SessionContext {
    /// 创建新的会话上下文，初始状态从存储派生
    pub fn new(store: Rc<dyn CredentialStore>) -> Self {
        let initial = derive_status(store.as_ref());
        Self {
            store,
            status: RwSignal::new(initial),
        }
    }

    /// 从存储新鲜派生当前状态（导航守卫用）
    pub fn current(&self) -> AuthStatus {
        derive_status(self.store.as_ref())
    }

    /// 认证状态信号（用于路由服务注入）
    pub fn status_signal(&self) -> Signal<AuthStatus> {
        self.status.into()
    }

    /// 读取会话令牌（API 客户端在发请求时调用）
    pub fn token(&self) -> Option<String> {
        self.store.get(STORAGE_TOKEN_KEY)
    }

    /// 登录成功：持久化凭据并推进状态信号
    pub fn establish(&self, token: &str, user: &UserRecord) {
        persist_session(self.store.as_ref(), token, user);
        self.status.set(derive_status(self.store.as_ref()));
    }

    /// 登出：清空存储并推进状态信号
    ///
    /// 导航将由路由服务的认证状态监听自动处理。
    pub fn logout(&self) {
        clear_session(self.store.as_ref());
        self.status.set(AuthStatus::Guest);
    }

    /// 暂存等待校验的手机号
    pub fn stash_otp_phone(&self, phone: &str) {
        self.store.set(STORAGE_OTP_PHONE_KEY, phone);
    }

    /// 读取等待校验的手机号
    pub fn otp_phone(&self) -> Option<String> {
        self.store.get(STORAGE_OTP_PHONE_KEY)
    }

    /// OTP 流程结束后清掉暂存的手机号
    pub fn clear_otp_phone(&self) {
        self.store.remove(STORAGE_OTP_PHONE_KEY);
    }
}

/// Context 中实际存放的会话句柄
///
/// `SessionContext` 持有 Rc，放不进要求线程安全的 Context。
/// LocalStorage 槽位的句柄本身 Send，取值只发生在当前线程。
#[derive(Clone, Copy)]
struct SessionHandle(StoredValue<SessionContext, leptos::prelude::LocalStorage>);

/// 将会话上下文装入 Context（App 根部调用一次）
pub fn provide_session(session: SessionContext) {
    provide_context(SessionHandle(StoredValue::new_local(session)));
}

/// 从 Context 获取会话上下文
pub fn use_session() -> SessionContext {
    use_context::<SessionHandle>()
        .expect("SessionContext should be provided")
        .0
        .get_value()
}

// =========================================================
// 单元测试
// =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_user() -> UserRecord {
        UserRecord {
            role: "ADMIN".to_string(),
            full_name: Some("Asha Verma".to_string()),
            profile_completed: true,
            ..Default::default()
        }
    }

    #[test]
    fn no_token_means_guest() {
        let store = MemoryCredentials::new();
        assert_eq!(derive_status(&store), AuthStatus::Guest);

        // userDetails 残留而 token 缺失时仍是 Guest
        store.set(STORAGE_USER_KEY, r#"{"role":"ADMIN"}"#);
        assert_eq!(derive_status(&store), AuthStatus::Guest);
    }

    #[test]
    fn persist_then_derive_is_admin() {
        let store = MemoryCredentials::new();
        let user = admin_user();
        persist_session(&store, "abc", &user);

        assert_eq!(store.get(STORAGE_TOKEN_KEY).as_deref(), Some("abc"));
        let stored: UserRecord =
            serde_json::from_str(&store.get(STORAGE_USER_KEY).unwrap()).unwrap();
        assert_eq!(stored, user);

        match derive_status(&store) {
            AuthStatus::Admin(u) => assert_eq!(u, user),
            other => panic!("expected admin, got {other:?}"),
        }
    }

    #[test]
    fn non_admin_role_is_never_admin() {
        let store = MemoryCredentials::new();
        let user = UserRecord { role: "USER".to_string(), ..Default::default() };
        persist_session(&store, "abc", &user);

        match derive_status(&store) {
            AuthStatus::NonAdmin(u) => assert_eq!(u.role, "USER"),
            other => panic!("expected non-admin, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_user_json_fails_closed() {
        let store = MemoryCredentials::new();
        store.set(STORAGE_TOKEN_KEY, "abc");
        store.set(STORAGE_USER_KEY, "{not json");

        let status = derive_status(&store);
        assert!(!status.is_admin());
        assert!(matches!(status, AuthStatus::NonAdmin(_)));
    }

    #[test]
    fn missing_user_record_fails_closed() {
        let store = MemoryCredentials::new();
        store.set(STORAGE_TOKEN_KEY, "abc");
        assert!(!derive_status(&store).is_admin());
    }

    #[test]
    fn clear_session_removes_every_key() {
        let store = MemoryCredentials::new();
        persist_session(&store, "abc", &admin_user());
        store.set(STORAGE_OTP_PHONE_KEY, "9876543210");

        clear_session(&store);

        assert!(store.get(STORAGE_TOKEN_KEY).is_none());
        assert!(store.get(STORAGE_USER_KEY).is_none());
        assert!(store.get(STORAGE_OTP_PHONE_KEY).is_none());
        assert_eq!(derive_status(&store), AuthStatus::Guest);
    }

    #[test]
    fn context_handle_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync + Copy>() {}
        assert_send_sync::<SessionHandle>();
    }

    #[test]
    fn remove_on_absent_key_is_noop() {
        let store = MemoryCredentials::new();
        store.remove(STORAGE_TOKEN_KEY);
        store.remove(STORAGE_TOKEN_KEY);
        assert!(store.get(STORAGE_TOKEN_KEY).is_none());
    }
}
