//! 响应式查询钩子
//!
//! `use_query` 把缓存条目接到组件的信号上：参数变化自动换键，
//! tag 失效自动重取，卸载时退订。组件只消费 `QueryView`，
//! 不直接接触缓存。

use super::cache::QueryKey;
use super::client::{CacheView, QueryClient, use_api};
use super::error::ApiError;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;
use topnotes_shared::protocol::ApiOperation;

/// 组件视角下的查询状态
#[derive(Debug, Clone, PartialEq)]
pub enum QueryView<T> {
    /// 首次加载中，尚无可展示的数据
    Loading,
    Ready(T),
    Failed(ApiError),
}

impl<T> QueryView<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// `use_query` 返回的句柄，可随意复制进闭包
pub struct QueryHandle<T: 'static> {
    view: ReadSignal<QueryView<T>>,
    /// 重取在途（含展示旧值的后台刷新）
    fetching: ReadSignal<bool>,
    refetch: StoredValue<Rc<dyn Fn()>, LocalStorage>,
}

impl<T: 'static> QueryHandle<T> {
    pub fn view(&self) -> ReadSignal<QueryView<T>> {
        self.view
    }

    pub fn fetching(&self) -> ReadSignal<bool> {
        self.fetching
    }

    /// 手动重取（如失败后的 Retry 按钮）
    pub fn refetch(&self) {
        (*self.refetch.get_value())();
    }
}

impl<T: 'static> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for QueryHandle<T> {}

/// 声明式查询订阅
///
/// `source` 在响应式作用域内求值：其中读到的信号变化时，
/// 钩子释放旧键、订阅新键并按缓存状态决定是否发请求。
pub fn use_query<Op>(source: impl Fn() -> Op + 'static) -> QueryHandle<Op::Response>
where
    Op: ApiOperation + Clone + 'static,
    Op::Response: Clone + Send + Sync + 'static,
{
    let client = use_api();
    // LocalStorage 句柄本身 Send，卸载回调经由它触达 !Send 的客户端
    let client_handle = StoredValue::new_local(client.clone());
    let (view, set_view) = signal(QueryView::Loading);
    let (fetching, set_fetching) = signal(false);
    let refetch_holder: StoredValue<Rc<dyn Fn()>, LocalStorage> =
        StoredValue::new_local(Rc::new(|| {}) as Rc<dyn Fn()>);
    let active_key: StoredValue<Option<QueryKey>, LocalStorage> = StoredValue::new_local(None);

    Effect::new({
        let client = client.clone();
        move |_| {
            let op = source();
            let key = match QueryKey::of(&op) {
                Ok(key) => key,
                Err(e) => {
                    set_view.set(QueryView::Failed(ApiError::Build(e.to_string())));
                    return;
                }
            };

            // 参数变化：退订旧键，订阅新键，换上新的重取闭包
            if active_key.get_value().as_ref() != Some(&key) {
                if let Some(previous) = active_key.get_value() {
                    client.unregister_refetch(&previous);
                    client.release(&previous);
                }
                client.acquire(&key, op.provides());
                active_key.set_value(Some(key.clone()));

                let refetch: Rc<dyn Fn()> = {
                    let client = client.clone();
                    let op = op.clone();
                    Rc::new(move || {
                        let client = client.clone();
                        let op = op.clone();
                        spawn_local(async move {
                            // 完成状态经由版本信号广播，这里无需再碰组件信号
                            let _ = client.run_query(&op).await;
                        });
                    })
                };
                client.register_refetch(key.clone(), refetch.clone());
                refetch_holder.set_value(refetch);
            }

            // 订阅版本信号：缓存写入后本效果重跑，重新读取快照
            client.version_signal(&key).get();

            match client.cache_view::<Op>(&key) {
                CacheView::Ready(value) => {
                    set_fetching.set(false);
                    set_view.set(QueryView::Ready(value));
                }
                CacheView::Failed(error) => {
                    set_fetching.set(false);
                    set_view.set(QueryView::Failed(error));
                }
                CacheView::Fetching { previous } => {
                    set_fetching.set(true);
                    // 失效重取期间继续展示旧数据
                    if let Some(previous) = previous {
                        set_view.set(QueryView::Ready(previous));
                    }
                }
                CacheView::Miss => {
                    set_fetching.set(true);
                    (*refetch_holder.get_value())();
                }
            }
        }
    });

    on_cleanup(move || {
        if let Some(key) = active_key.get_value() {
            let client = client_handle.get_value();
            client.unregister_refetch(&key);
            client.release(&key);
        }
    });

    QueryHandle { view, fetching, refetch: refetch_holder }
}

/// 变更辅助句柄：跟踪在途状态与最近一次错误
///
/// 页面在确认弹窗里发起审批/驳回时用它禁用按钮并展示服务端消息。
#[derive(Clone, Copy)]
pub struct MutationState {
    pub pending: RwSignal<bool>,
    pub error: RwSignal<Option<ApiError>>,
}

impl MutationState {
    pub fn new() -> Self {
        Self {
            pending: RwSignal::new(false),
            error: RwSignal::new(None),
        }
    }

    /// 执行一次变更；`on_done` 仅在成功时调用
    pub fn run<Op>(&self, client: QueryClient, op: Op, on_done: impl Fn() + 'static)
    where
        Op: ApiOperation + 'static,
    {
        if self.pending.get_untracked() {
            return;
        }
        self.pending.set(true);
        self.error.set(None);

        let state = *self;
        spawn_local(async move {
            let result = client.mutate(&op).await;
            state.pending.set(false);
            match result {
                Ok(_) => on_done(),
                Err(e) => state.error.set(Some(e)),
            }
        });
    }
}

impl Default for MutationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_view_accessors() {
        let ready: QueryView<u32> = QueryView::Ready(7);
        assert_eq!(ready.data(), Some(&7));
        assert!(ready.error().is_none());

        let failed: QueryView<u32> = QueryView::Failed(ApiError::Network("down".into()));
        assert!(failed.data().is_none());
        assert!(failed.error().is_some());

        let loading: QueryView<u32> = QueryView::Loading;
        assert!(loading.data().is_none());
        assert!(loading.error().is_none());
    }
}
