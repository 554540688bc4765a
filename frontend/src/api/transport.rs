//! 传输层抽象
//!
//! 把"发一个 HTTP 请求"收敛为一个 `?Send` 的异步 trait，
//! 客户端逻辑与浏览器 fetch 解耦，测试换用 `MockTransport`。

use super::error::ApiError;
use topnotes_shared::protocol::{HttpMethod, Part, Payload};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::{HashMap, HashSet};

/// 已经组装完成、等待发出的请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub payload: Payload,
}

/// 原始响应：状态码 + 响应体文本
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait(?Send)]
pub trait Transport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, ApiError>;
}

// =========================================================
// 实现层: 浏览器 fetch
// =========================================================

pub struct FetchTransport;

#[async_trait::async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, ApiError> {
        use crate::web::HttpClient;

        let mut builder = match req.method {
            HttpMethod::Get => HttpClient::get(&req.url),
            HttpMethod::Post => HttpClient::post(&req.url),
            HttpMethod::Put => HttpClient::put(&req.url),
            HttpMethod::Patch => HttpClient::patch(&req.url),
            HttpMethod::Delete => HttpClient::delete(&req.url),
        };

        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        builder = match &req.payload {
            Payload::None => builder,
            Payload::Json(value) => builder
                .header("Content-Type", "application/json")
                .body(value.to_string()),
            // multipart 的 Content-Type 由浏览器生成（含 boundary）
            Payload::Multipart(parts) => builder.body_form(build_form_data(parts)?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

/// 把平台无关的 `Part` 列表转为浏览器 `FormData`
fn build_form_data(parts: &[Part]) -> Result<web_sys::FormData, ApiError> {
    let form = web_sys::FormData::new()
        .map_err(|e| ApiError::Build(format!("create FormData: {e:?}")))?;

    for part in parts {
        match part {
            Part::Text { name, value } => {
                form.append_with_str(name, value)
                    .map_err(|e| ApiError::Build(format!("append field: {e:?}")))?;
            }
            Part::File { name, file_name, mime, bytes } => {
                let array = js_sys::Uint8Array::from(bytes.as_slice());
                let sequence = js_sys::Array::of1(&array.buffer());
                let options = web_sys::BlobPropertyBag::new();
                options.set_type(mime);
                let blob =
                    web_sys::Blob::new_with_u8_array_sequence_and_options(&sequence, &options)
                        .map_err(|e| ApiError::Build(format!("create Blob: {e:?}")))?;
                form.append_with_blob_and_filename(name, &blob, file_name)
                    .map_err(|e| ApiError::Build(format!("append file: {e:?}")))?;
            }
        }
    }

    Ok(form)
}

// =========================================================
// 测试工具: MockTransport
// =========================================================

/// 按 URL 预置响应、记录所有发出的请求
#[cfg(test)]
pub struct MockTransport {
    // (URL, (Status, Response Body))
    responses: RefCell<HashMap<String, (u16, String)>>,
    /// 记录发出的请求，供断言调用次数、鉴权头与请求体
    pub requests: RefCell<Vec<TransportRequest>>,
    /// 下一次命中这些 URL 的请求先让出一次调度，模拟响应悬在途中
    stalled: RefCell<HashSet<String>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
            stalled: RefCell::new(HashSet::new()),
        }
    }

    /// 让下一次发往该 URL 的请求在响应前让出一次调度
    pub fn stall_once(&self, url: &str) {
        self.stalled.borrow_mut().insert(url.to_string());
    }

    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), (status, body.to_string()));
    }

    /// 发往某 URL 的请求次数
    pub fn hits(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url == url).count()
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, ApiError> {
        self.requests.borrow_mut().push(req.clone());

        // 让出前先快照响应：悬停期间换上的新响应不影响本次结果
        let resolved = self.responses.borrow().get(&req.url).cloned();
        let stalled = self.stalled.borrow_mut().remove(&req.url);
        if stalled {
            tokio::task::yield_now().await;
        }

        match resolved {
            Some((status, body)) => Ok(TransportResponse { status, body }),
            None => Ok(TransportResponse { status: 404, body: "Not Found".to_string() }),
        }
    }
}
