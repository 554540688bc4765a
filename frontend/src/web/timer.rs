//! 定时器封装模块
//!
//! 使用 `web_sys` 的原生 `setTimeout` API。
//! 搜索框防抖依赖 `Debounce`：新输入到来时取消上一次的延时回调。

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// 一次性延时回调
///
/// 封装 `setTimeout` API。当 `Timeout` 被 drop 时，自动取消尚未触发的回调。
pub struct Timeout {
    handle: i32,
    #[allow(dead_code)]
    closure: Closure<dyn Fn()>,
}

impl Timeout {
    /// 创建新的延时回调
    ///
    /// # Panics
    /// 如果无法获取 window 对象或设置定时器失败
    pub fn new<F>(millis: u32, callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        let closure = Closure::new(callback);
        let window = web_sys::window().expect("no window object");

        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                millis as i32,
            )
            .expect("setTimeout failed");

        Self { handle, closure }
    }

    /// 取消回调
    ///
    /// 通常不需要手动调用，drop 时会自动取消。
    pub fn cancel(&self) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(self.handle);
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 防抖器：保存最近一次 `Timeout`，新一次调度会替换（并取消）旧的
#[derive(Default)]
pub struct Debounce {
    pending: Option<Timeout>,
}

impl Debounce {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// 延迟 `millis` 毫秒执行 `callback`；若上一次尚未触发则作废
    pub fn schedule<F>(&mut self, millis: u32, callback: F)
    where
        F: Fn() + 'static,
    {
        self.pending = Some(Timeout::new(millis, callback));
    }
}
