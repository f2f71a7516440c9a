use std::fmt;

use unet360_shared::NodeError;

// =========================================================
// 错误类别枚举
// =========================================================

/// 错误类别
/// 决定上层（状态存储、路由守卫）如何呈现错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 网络层失败，请求未得到任何响应
    Transport,
    /// 后端返回 `status: false` 或非 2xx 状态
    Backend,
    /// 响应无法解析为预期结构
    Malformed,
    /// 401: 缺少或失效的令牌
    Unauthorized,
    /// 403: 权限不足
    Forbidden,
    /// 客户端侧校验失败，请求未发出
    InvalidInput,
    /// Cookie / sessionStorage 读写失败
    Storage,
}

impl ErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "NETWORK_ERROR",
            ErrorKind::Backend => "BACKEND_ERROR",
            ErrorKind::Malformed => "MALFORMED_RESPONSE",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Storage => "STORAGE_ERROR",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// 操作名称，如 "api.send", "auth.validate_token"
    pub operation: String,
    /// 额外的细节信息，如请求路径、节点名
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// - kind: 错误类别
/// - message: 面向用户的消息（后端消息优先）
/// - http_code: 后端给出的状态码
/// - source: 原始错误（可选，用于错误链）
/// - spans: 结构化的调用追踪栈
#[derive(Debug)]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
    pub http_code: Option<u16>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_code: None,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// 按后端状态码归类：401 / 403 单独区分，其余为 Backend
    pub fn from_status(http_code: u16, message: impl Into<String>) -> Self {
        let kind = match http_code {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            _ => ErrorKind::Backend,
        };
        let mut err = Self::new(kind, message);
        err.http_code = Some(http_code);
        err
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    // --- Context builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// 令牌缺失或被后端拒绝
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized | ErrorKind::Forbidden)
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;
        if let Some(code) = self.http_code {
            write!(f, " (http {})", code)?;
        }

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::malformed(e.to_string()).with_source(e)
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::invalid_input(e.to_string()).with_source(e)
    }
}

impl From<NodeError> for ClientError {
    fn from(e: NodeError) -> Self {
        ClientError::invalid_input(e.to_string()).with_source(e)
    }
}
