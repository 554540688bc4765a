//! API 客户端
//!
//! 把声明式的操作描述符翻译成 HTTP 请求，并执行缓存/失效契约：
//! - 查询按 (操作名, 参数) 去重与缓存
//! - 变更成功时同步失效相交 tag 的缓存条目，已订阅者立即重取
//! - 需要鉴权的操作在发请求的瞬间从凭据存储读取令牌
//!
//! 客户端自身绝不重试、绝不跳转路由；错误以结构化结果返回调用方。

use super::cache::{EntryStatus, FetchDecision, QueryCache, QueryKey};
use super::error::ApiError;
use super::transport::{Transport, TransportRequest};
use crate::session::SessionContext;
use leptos::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use topnotes_shared::API_PREFIX;
use topnotes_shared::protocol::{ApiOperation, OperationKind};

/// 部署时注入的服务端基址
pub fn api_base() -> String {
    option_env!("TOPNOTES_API_BASE")
        .unwrap_or("http://localhost:5000")
        .to_string()
}

/// `run_query` 的结果
#[derive(Debug)]
pub enum QueryOutcome<T> {
    /// 本次调用得到了结果（缓存命中或真实请求完成）
    Resolved(Result<T, ApiError>),
    /// 同键请求已在途，结果将通过缓存广播给订阅者
    Deduped,
}

impl<T> QueryOutcome<T> {
    pub fn resolved(self) -> Option<Result<T, ApiError>> {
        match self {
            Self::Resolved(result) => Some(result),
            Self::Deduped => None,
        }
    }
}

/// 缓存条目在组件视角下的快照
#[derive(Debug, Clone)]
pub enum CacheView<T> {
    /// 尚无数据，需要发起请求
    Miss,
    /// 请求在途（或数据已失效等待重取），附带可展示的旧值
    Fetching { previous: Option<T> },
    Ready(T),
    Failed(ApiError),
}

/// 进程级共享的查询/变更客户端
#[derive(Clone)]
pub struct QueryClient {
    base_url: String,
    transport: Rc<dyn Transport>,
    session: SessionContext,
    cache: Rc<RefCell<QueryCache>>,
    /// 订阅者注册的重取回调：tag 失效命中时调用
    refetchers: Rc<RefCell<HashMap<QueryKey, Rc<dyn Fn()>>>>,
    /// 每个键的版本信号：缓存写入后递增，驱动订阅组件重读
    versions: Rc<RefCell<HashMap<QueryKey, RwSignal<u64>>>>,
}

impl QueryClient {
    pub fn new(base_url: String, transport: Rc<dyn Transport>, session: SessionContext) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
            cache: Rc::new(RefCell::new(QueryCache::new())),
            refetchers: Rc::new(RefCell::new(HashMap::new())),
            versions: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// 组装并发出一次请求，完成状态码与响应体的判读
    async fn execute<Op: ApiOperation>(&self, op: &Op) -> Result<Op::Response, ApiError> {
        let mut headers = Vec::new();
        if Op::AUTH {
            // 发请求的瞬间才读令牌；没有令牌就不带头，由服务端拒绝
            if let Some(token) = self.session.token() {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        let payload = op.payload().map_err(|e| ApiError::Build(e.to_string()))?;
        let request = TransportRequest {
            method: Op::METHOD,
            url: self.endpoint(&op.path()),
            headers,
            payload,
        };

        let response = self.transport.send(request).await?;
        if !response.ok() {
            return Err(ApiError::from_response(response.status, &response.body));
        }

        serde_json::from_str::<Op::Response>(&response.body)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// 执行查询：缓存命中直接返回，在途去重，未命中则请求并写缓存
    pub async fn run_query<Op>(&self, op: &Op) -> QueryOutcome<Op::Response>
    where
        Op: ApiOperation,
    {
        debug_assert!(matches!(Op::KIND, OperationKind::Query));

        let key = match QueryKey::of(op) {
            Ok(key) => key,
            Err(e) => return QueryOutcome::Resolved(Err(ApiError::Build(e.to_string()))),
        };

        loop {
            let decision = self.cache.borrow_mut().begin_fetch(&key, op.provides());
            match decision {
                FetchDecision::Cached(value) => {
                    return QueryOutcome::Resolved(
                        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string())),
                    );
                }
                FetchDecision::InFlight => return QueryOutcome::Deduped,
                FetchDecision::Fetch(generation) => {
                    let result = self.execute(op).await;
                    let mut superseded = false;
                    match &result {
                        Ok(response) => match serde_json::to_value(response) {
                            Ok(value) => {
                                superseded =
                                    !self.cache.borrow_mut().complete_ok(&key, value, generation);
                            }
                            Err(e) => self
                                .cache
                                .borrow_mut()
                                .complete_err(&key, ApiError::Decode(e.to_string())),
                        },
                        Err(e) => self.cache.borrow_mut().complete_err(&key, e.clone()),
                    }
                    self.bump_version(&key);
                    if superseded {
                        // 响应在途期间条目被变更失效：丢弃本轮结果，再取一次
                        continue;
                    }
                    return QueryOutcome::Resolved(result);
                }
            }
        }
    }

    /// 执行变更
    ///
    /// 成功时**同步**失效相交 tag 的缓存条目（先于返回调用方），
    /// 仍被订阅的键立即触发重取回调。
    pub async fn mutate<Op>(&self, op: &Op) -> Result<Op::Response, ApiError>
    where
        Op: ApiOperation,
    {
        debug_assert!(matches!(Op::KIND, OperationKind::Mutation));

        let result = self.execute(op).await;

        if result.is_ok() {
            let refetch_now = self.cache.borrow_mut().invalidate(op.invalidates());
            for key in refetch_now {
                let callback = self.refetchers.borrow().get(&key).cloned();
                if let Some(callback) = callback {
                    (*callback)();
                }
            }
        }

        result
    }

    /// 读取某键的缓存快照（按目标类型解码）
    pub fn cache_view<Op: ApiOperation>(&self, key: &QueryKey) -> CacheView<Op::Response> {
        let cache = self.cache.borrow();
        let Some(entry) = cache.get(key) else {
            return CacheView::Miss;
        };

        let decode = |value: &serde_json::Value| {
            serde_json::from_value::<Op::Response>(value.clone())
                .map_err(|e| ApiError::Decode(e.to_string()))
        };

        match entry.status {
            EntryStatus::Idle => CacheView::Miss,
            EntryStatus::Pending => CacheView::Fetching {
                previous: entry.data.as_ref().and_then(|v| decode(v).ok()),
            },
            EntryStatus::Ready if entry.stale => CacheView::Fetching {
                previous: entry.data.as_ref().and_then(|v| decode(v).ok()),
            },
            EntryStatus::Ready => match entry.data.as_ref().map(decode) {
                Some(Ok(value)) => CacheView::Ready(value),
                Some(Err(e)) => CacheView::Failed(e),
                None => CacheView::Miss,
            },
            EntryStatus::Failed => match &entry.error {
                Some(error) => CacheView::Failed(error.clone()),
                None => CacheView::Miss,
            },
        }
    }

    /// 订阅某键（组件挂载）
    pub fn acquire(&self, key: &QueryKey, tags: &'static [topnotes_shared::protocol::Tag]) {
        self.cache.borrow_mut().subscribe(key, tags);
    }

    /// 退订某键（组件卸载）；订阅数归零时条目与版本信号一并回收
    pub fn release(&self, key: &QueryKey) {
        let mut cache = self.cache.borrow_mut();
        cache.unsubscribe(key);
        if cache.get(key).is_none() {
            self.versions.borrow_mut().remove(key);
        }
    }

    /// 注册 tag 失效后的重取回调
    pub fn register_refetch(&self, key: QueryKey, callback: Rc<dyn Fn()>) {
        self.refetchers.borrow_mut().insert(key, callback);
    }

    pub fn unregister_refetch(&self, key: &QueryKey) {
        self.refetchers.borrow_mut().remove(key);
    }

    /// 某键的版本信号（不存在则创建）
    pub fn version_signal(&self, key: &QueryKey) -> RwSignal<u64> {
        *self
            .versions
            .borrow_mut()
            .entry(key.clone())
            .or_insert_with(|| RwSignal::new(0))
    }

    fn bump_version(&self, key: &QueryKey) {
        let signal = self.versions.borrow().get(key).copied();
        if let Some(signal) = signal {
            signal.update(|v| *v += 1);
        }
    }
}

/// Context 中实际存放的客户端句柄，做法同 session：
/// Rc 状态装进 LocalStorage 槽位，句柄自身线程安全。
#[derive(Clone, Copy)]
struct ApiHandle(StoredValue<QueryClient, LocalStorage>);

/// 将 API 客户端装入 Context（App 根部调用一次）
pub fn provide_api(client: QueryClient) {
    provide_context(ApiHandle(StoredValue::new_local(client)));
}

/// 从 Context 获取 API 客户端
pub fn use_api() -> QueryClient {
    use_context::<ApiHandle>()
        .expect("QueryClient should be provided")
        .0
        .get_value()
}

// =========================================================
// 单元测试
// =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::MockTransport;
    use crate::session::{
        AuthStatus, MemoryCredentials, STORAGE_TOKEN_KEY, STORAGE_USER_KEY, SessionContext,
    };
    use crate::web::route::{AdminRoute, AppRoute, GuardVerdict, guard_verdict};
    use serde_json::json;
    use std::rc::Rc;
    use topnotes_shared::protocol::{
        ApproveNoteRequest, GetDashboardStats, ListNotesRequest, Payload, SendOtpRequest,
        VerifyOtpRequest,
    };
    use topnotes_shared::{NoteStatus, UserRecord};

    const BASE: &str = "http://api.test";

    fn setup() -> (QueryClient, Rc<MockTransport>, SessionContext) {
        let transport = Rc::new(MockTransport::new());
        let session = SessionContext::new(Rc::new(MemoryCredentials::new()));
        let client = QueryClient::new(BASE.to_string(), transport.clone(), session.clone());
        (client, transport, session)
    }

    fn notes_url() -> String {
        format!("{BASE}/api/v1/admin/notes/pending?status=UNDER_REVIEW&search=")
    }

    fn notes_body(ids: &[&str]) -> serde_json::Value {
        let data: Vec<_> = ids
            .iter()
            .map(|id| json!({ "_id": id, "title": "t", "status": "UNDER_REVIEW" }))
            .collect();
        json!({ "data": data })
    }

    #[tokio::test]
    async fn authorized_query_carries_bearer_header() {
        let (client, transport, session) = setup();
        session.establish("abc", &UserRecord { role: "ADMIN".into(), ..Default::default() });
        transport.mock_response(
            &format!("{BASE}/api/v1/dashboard/dashboard"),
            200,
            json!({ "data": { "totalUsers": 3 } }),
        );

        let outcome = client.run_query(&GetDashboardStats).await;
        let stats = outcome.resolved().unwrap().unwrap();
        assert_eq!(stats.data.total_users, 3);

        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert!(
            requests[0]
                .headers
                .iter()
                .any(|(k, v)| k == "Authorization" && v == "Bearer abc")
        );
    }

    #[tokio::test]
    async fn otp_mutation_is_unauthenticated_by_design() {
        let (client, transport, session) = setup();
        // 即使已有会话，OTP 端点也不带鉴权头
        session.establish("abc", &UserRecord { role: "ADMIN".into(), ..Default::default() });
        transport.mock_response(&format!("{BASE}/api/v1/auth/send-otp"), 200, json!({ "message": "sent" }));

        let ack = client.mutate(&SendOtpRequest::new("9876543210")).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("sent"));

        let requests = transport.requests.borrow();
        assert!(!requests[0].headers.iter().any(|(k, _)| k == "Authorization"));
        match &requests[0].payload {
            Payload::Json(body) => {
                assert_eq!(body, &json!({ "phone": "9876543210", "role": "ADMIN" }));
            }
            other => panic!("expected json payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_token_sends_no_header() {
        let (client, transport, _session) = setup();
        transport.mock_response(
            &format!("{BASE}/api/v1/dashboard/dashboard"),
            200,
            json!({ "data": {} }),
        );

        let _ = client.run_query(&GetDashboardStats).await;
        let requests = transport.requests.borrow();
        assert!(!requests[0].headers.iter().any(|(k, _)| k == "Authorization"));
    }

    #[tokio::test]
    async fn identical_queries_share_one_transport_request() {
        let (client, transport, _session) = setup();
        transport.mock_response(&notes_url(), 200, notes_body(&["n1"]));

        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        let (first, second) = tokio::join!(client.run_query(&op), client.run_query(&op));

        assert_eq!(transport.hits(&notes_url()), 1);
        // 至少一个调用拿到结果，另一个要么命中缓存要么被去重
        let resolved = [first.resolved(), second.resolved()];
        assert!(resolved.iter().flatten().any(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn second_query_is_served_from_cache() {
        let (client, transport, _session) = setup();
        transport.mock_response(&notes_url(), 200, notes_body(&["n1"]));

        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        let first = client.run_query(&op).await.resolved().unwrap().unwrap();
        let second = client.run_query(&op).await.resolved().unwrap().unwrap();

        assert_eq!(first.data[0].id, "n1");
        assert_eq!(second.data[0].id, "n1");
        assert_eq!(transport.hits(&notes_url()), 1);
    }

    #[tokio::test]
    async fn notes_mutation_refetches_subscribed_notes_query() {
        let (client, transport, session) = setup();
        session.establish("abc", &UserRecord { role: "ADMIN".into(), ..Default::default() });
        transport.mock_response(&notes_url(), 200, notes_body(&["n1", "n2"]));
        transport.mock_response(
            &format!("{BASE}/api/v1/admin/notes/n1/approve"),
            200,
            json!({ "message": "approved" }),
        );

        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        let key = QueryKey::of(&op).unwrap();
        client.acquire(&key, op.provides());

        let fired = Rc::new(std::cell::Cell::new(0u32));
        let fired_clone = fired.clone();
        client.register_refetch(key.clone(), Rc::new(move || fired_clone.set(fired_clone.get() + 1)));

        let list = client.run_query(&op).await.resolved().unwrap().unwrap();
        assert_eq!(list.data.len(), 2);

        // 审批通过后服务端少了一条
        transport.mock_response(&notes_url(), 200, notes_body(&["n2"]));
        client.mutate(&ApproveNoteRequest { id: "n1".into() }).await.unwrap();

        // 失效与回调同步于变更成功
        assert_eq!(fired.get(), 1);
        match client.cache_view::<ListNotesRequest>(&key) {
            CacheView::Fetching { previous } => {
                assert_eq!(previous.unwrap().data.len(), 2);
            }
            other => panic!("expected stale entry pending refetch, got {other:?}"),
        }

        // 重取后的数据反映变更结果
        let refreshed = client.run_query(&op).await.resolved().unwrap().unwrap();
        assert_eq!(refreshed.data.len(), 1);
        assert_eq!(refreshed.data[0].id, "n2");
        assert_eq!(transport.hits(&notes_url()), 2);
    }

    #[tokio::test]
    async fn query_overlapping_a_mutation_returns_post_mutation_data() {
        let (client, transport, session) = setup();
        session.establish("abc", &UserRecord { role: "ADMIN".into(), ..Default::default() });
        transport.mock_response(&notes_url(), 200, notes_body(&["n1", "n2"]));
        transport.mock_response(
            &format!("{BASE}/api/v1/admin/notes/n1/approve"),
            200,
            json!({ "message": "approved" }),
        );

        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        let key = QueryKey::of(&op).unwrap();
        client.acquire(&key, op.provides());

        // 列表请求悬在途中时审批先一步完成
        transport.stall_once(&notes_url());
        let (listed, _) = tokio::join!(client.run_query(&op), async {
            client.mutate(&ApproveNoteRequest { id: "n1".into() }).await.unwrap();
            transport.mock_response(&notes_url(), 200, notes_body(&["n2"]));
        });

        // 变更前发出的响应被丢弃，换成一轮新请求的结果
        let listed = listed.resolved().unwrap().unwrap();
        assert_eq!(listed.data.len(), 1);
        assert_eq!(listed.data[0].id, "n2");
        assert_eq!(transport.hits(&notes_url()), 2);

        match client.cache_view::<ListNotesRequest>(&key) {
            CacheView::Ready(env) => assert_eq!(env.data.len(), 1),
            other => panic!("expected fresh entry, got {other:?}"),
        }
    }

    #[test]
    fn context_handle_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync + Copy>() {}
        assert_send_sync::<ApiHandle>();
    }

    #[tokio::test]
    async fn server_error_surfaces_message_without_retry() {
        let (client, transport, _session) = setup();
        transport.mock_response(&notes_url(), 500, json!({ "message": "database down" }));

        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        let err = client.run_query(&op).await.resolved().unwrap().unwrap_err();

        assert_eq!(err, ApiError::Status { code: 500, message: "database down".into() });
        assert_eq!(transport.hits(&notes_url()), 1);

        let key = QueryKey::of(&op).unwrap();
        match client.cache_view::<ListNotesRequest>(&key) {
            CacheView::Failed(e) => assert_eq!(e.user_message(), "database down"),
            other => panic!("expected failed entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_scenario_lands_on_admin_home() {
        let (client, transport, session) = setup();
        transport.mock_response(&format!("{BASE}/api/v1/auth/send-otp"), 200, json!({ "message": "sent" }));
        transport.mock_response(
            &format!("{BASE}/api/v1/auth/verify-otp"),
            200,
            json!({
                "message": "verified",
                "data": {
                    "token": "abc",
                    "user": { "role": "ADMIN", "profileCompleted": true }
                }
            }),
        );

        client.mutate(&SendOtpRequest::new("9876543210")).await.unwrap();
        session.stash_otp_phone("9876543210");
        assert_eq!(session.otp_phone().as_deref(), Some("9876543210"));

        let phone = session.otp_phone().unwrap();
        let verified = client.mutate(&VerifyOtpRequest::new(phone, "123456")).await.unwrap();
        session.establish(&verified.data.token, &verified.data.user);
        session.clear_otp_phone();

        let status = session.current();
        assert!(status.is_admin());
        assert_eq!(
            guard_verdict(&AppRoute::Admin(AdminRoute::Dashboard), &status),
            GuardVerdict::Allow
        );
        // 档案已完成 -> 落地后台首页
        assert!(verified.data.user.profile_completed);
        assert_eq!(
            guard_verdict(&AppRoute::Login, &status),
            GuardVerdict::RedirectAdmin
        );
    }

    #[tokio::test]
    async fn incomplete_profile_routes_to_setup() {
        let (client, transport, session) = setup();
        transport.mock_response(
            &format!("{BASE}/api/v1/auth/verify-otp"),
            200,
            json!({
                "data": {
                    "token": "abc",
                    "user": { "role": "ADMIN", "profileCompleted": false }
                }
            }),
        );

        let verified = client
            .mutate(&VerifyOtpRequest::new("9876543210", "123456"))
            .await
            .unwrap();
        session.establish(&verified.data.token, &verified.data.user);

        assert!(!verified.data.user.profile_completed);
        // 档案未完成 -> 落地 /setup-profile，守卫依然放行（已是 Admin）
        assert_eq!(
            guard_verdict(&AppRoute::SetupProfile, &session.current()),
            GuardVerdict::Allow
        );
    }

    #[tokio::test]
    async fn logout_revokes_admin_access() {
        let (_client, _transport, session) = setup();
        session.establish("abc", &UserRecord { role: "ADMIN".into(), ..Default::default() });
        assert!(session.current().is_admin());

        session.logout();

        assert!(session.token().is_none());
        match session.current() {
            AuthStatus::Guest => {}
            other => panic!("expected guest after logout, got {other:?}"),
        }
        assert_eq!(
            guard_verdict(&AppRoute::Admin(AdminRoute::Dashboard), &session.current()),
            GuardVerdict::RedirectLogin
        );
    }

    #[tokio::test]
    async fn decode_failure_is_reported_not_cached_as_ready() {
        let (client, transport, _session) = setup();
        transport.mock_response(&notes_url(), 200, json!("not an envelope"));

        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        let err = client.run_query(&op).await.resolved().unwrap().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn session_round_trip_matches_storage_layout() {
        let store = MemoryCredentials::new();
        let session = SessionContext::new(Rc::new(store));
        let user = UserRecord {
            role: "ADMIN".into(),
            full_name: Some("Asha Verma".into()),
            profile_completed: true,
            ..Default::default()
        };

        session.establish("abc", &user);

        // 存储布局与键名固定：authToken / userDetails
        assert_eq!(session.token().as_deref(), Some("abc"));
        let _ = (STORAGE_TOKEN_KEY, STORAGE_USER_KEY);
        match session.current() {
            AuthStatus::Admin(stored) => assert_eq!(stored, user),
            other => panic!("expected admin, got {other:?}"),
        }
    }
}
