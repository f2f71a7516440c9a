use std::collections::HashMap;

use unet360_shared::HttpMethod;
use unet360_shared::protocol::MultipartForm;

use crate::error::ClientResult;
#[cfg(not(target_arch = "wasm32"))]
use crate::error::ClientError;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub enum HttpBody {
    #[default]
    Empty,
    /// 已序列化的 JSON 文本
    Json(String),
    Multipart(MultipartForm),
}

/// 通用 HTTP 请求结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: HttpBody,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: HttpBody::Empty,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: HttpBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP 客户端特性 (Trait)
/// 浏览器 fetch 的 Future 不是 Send 的，因此使用 (?Send)
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse>;
}

// =========================================================
// 实现层: reqwest 客户端 (原生环境)
// =========================================================

#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait::async_trait(?Send)]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &req.url);

        for (k, v) in req.headers {
            builder = builder.header(k, v);
        }

        builder = match req.body {
            HttpBody::Empty => builder,
            HttpBody::Json(body) => builder.body(body),
            HttpBody::Multipart(form) => {
                let mut multipart = reqwest::multipart::Form::new();
                for part in form.parts {
                    let file = reqwest::multipart::Part::bytes(part.bytes)
                        .file_name(part.file_name)
                        .mime_str(&part.content_type)
                        .map_err(|e| {
                            ClientError::invalid_input(format!("Invalid content type: {}", e))
                                .with_source(e)
                        })?;
                    multipart = multipart.part(part.field, file);
                }
                builder.multipart(multipart)
            }
        };

        let resp = builder.send().await.map_err(|e| {
            ClientError::transport(format!("Reqwest Error: {}", e))
                .with_source(e)
                .in_op_with("http.send", req.url.clone())
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            ClientError::transport(format!("Reqwest Body Error: {}", e))
                .with_source(e)
                .in_op_with("http.read_body", req.url.clone())
        })?;

        Ok(HttpResponse { status, body })
    }
}

// =========================================================
// 测试替身 (Mock)
// =========================================================

#[cfg(test)]
pub mod mock {
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    use futures::channel::oneshot;
    use unet360_shared::{Envelope, HttpMethod};

    use super::{HttpClient, HttpRequest, HttpResponse};
    use crate::error::{ClientError, ClientResult};

    pub const MOCK_BASE: &str = "http://api.test/";

    #[derive(Debug, Clone)]
    enum MockReply {
        Respond(u16, String),
        Fail(String),
    }

    /// 按 "METHOD url" 返回预设响应并记录所有请求
    ///
    /// 同一键注册多个响应时依次返回，最后一个会被重复使用。
    /// 响应在请求到达时选定；若该键设置了闸门，则等闸门打开后才返回。
    #[derive(Default)]
    pub struct MockHttpClient {
        replies: RefCell<HashMap<String, VecDeque<MockReply>>>,
        gates: RefCell<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    fn key(method: HttpMethod, url: &str) -> String {
        format!("{} {}", method, url)
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        fn push(&self, method: HttpMethod, path: &str, reply: MockReply) {
            self.replies
                .borrow_mut()
                .entry(key(method, &format!("{}{}", MOCK_BASE, path)))
                .or_default()
                .push_back(reply);
        }

        pub fn on(&self, method: HttpMethod, path: &str, status: u16, body: impl Into<String>) {
            self.push(method, path, MockReply::Respond(status, body.into()));
        }

        pub fn on_envelope(&self, method: HttpMethod, path: &str, envelope: &Envelope) {
            let status = envelope.http_code.unwrap_or(200);
            let body = serde_json::to_string(envelope).unwrap();
            self.on(method, path, status, body);
        }

        pub fn ok(&self, method: HttpMethod, path: &str, payload: serde_json::Value) {
            self.on_envelope(method, path, &Envelope::success(200, payload));
        }

        pub fn fail(&self, method: HttpMethod, path: &str, message: &str) {
            self.push(method, path, MockReply::Fail(message.to_string()));
        }

        /// 下一次对该键的请求会挂起，直到返回的 Sender 被触发或丢弃
        pub fn gate(&self, method: HttpMethod, path: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates
                .borrow_mut()
                .entry(key(method, &format!("{}{}", MOCK_BASE, path)))
                .or_default()
                .push_back(rx);
            tx
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }

        pub fn calls(&self) -> usize {
            self.requests.borrow().len()
        }

        pub fn calls_to(&self, method: HttpMethod, path: &str) -> usize {
            let url = format!("{}{}", MOCK_BASE, path);
            self.requests
                .borrow()
                .iter()
                .filter(|r| r.method == method && r.url == url)
                .count()
        }

        pub fn last_request(&self) -> Option<HttpRequest> {
            self.requests.borrow().last().cloned()
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpClient for MockHttpClient {
        async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
            let k = key(req.method, &req.url);
            self.requests.borrow_mut().push(req);

            let reply = {
                let mut replies = self.replies.borrow_mut();
                match replies.get_mut(&k) {
                    Some(queue) if queue.len() > 1 => queue.pop_front(),
                    Some(queue) => queue.front().cloned(),
                    None => None,
                }
            };

            let gate = self
                .gates
                .borrow_mut()
                .get_mut(&k)
                .and_then(|queue| queue.pop_front());
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            match reply {
                Some(MockReply::Respond(status, body)) => Ok(HttpResponse { status, body }),
                Some(MockReply::Fail(message)) => Err(ClientError::transport(message)),
                None => Err(ClientError::transport(format!("No mock registered for {}", k))),
            }
        }
    }
}
