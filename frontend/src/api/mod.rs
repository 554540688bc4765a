//! API 层
//!
//! 自底向上：错误类型 -> 传输抽象 -> 纯缓存 -> 客户端 -> 响应式钩子。
//! 组件只依赖 `use_api` / `use_query` 与共享协议里的操作描述符。

mod cache;
mod client;
mod error;
mod hooks;
mod transport;

pub use client::{QueryClient, api_base, provide_api, use_api};
pub use error::ApiError;
pub use hooks::{MutationState, use_query};
pub use transport::FetchTransport;
