use crate::account::{AuthStatus, AuthToken, Credentials, PasswordReset, RecoveryRequest, Tenant};
use crate::catalog::{Location, Tag};
use crate::node::{Node, NodeList, NodeStatus};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求对 Bearer 令牌的要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// 从不附带会话令牌（登录、注册、恢复流程）
    Never,
    /// 有令牌时附带
    Optional,
    /// 必须附带，缺失时不发请求
    Required,
}

// =========================================================
// 路径
// =========================================================

/// 相对于 API 基础地址的路径
///
/// 段在拼接 URL 时逐段做百分号编码，节点名等用户数据可以直接放进来。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
    trailing_slash: bool,
    query: Vec<(String, String)>,
}

impl ApiPath {
    pub fn new(first: impl Into<String>) -> Self {
        Self {
            segments: vec![first.into()],
            trailing_slash: false,
            query: Vec::new(),
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// 以 `/` 结尾（后端集合路由如 `nodes/`）
    pub fn slash(mut self) -> Self {
        self.trailing_slash = true;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))?;
        if self.trailing_slash {
            f.write_str("/")?;
        }
        for (i, (k, v)) in self.query.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { '?' } else { '&' }, k, v)?;
        }
        Ok(())
    }
}

// =========================================================
// 请求体
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultipartForm {
    pub parts: Vec<FilePart>,
}

impl MultipartForm {
    pub fn file(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            parts: vec![FilePart {
                field: field.into(),
                file_name: file_name.into(),
                content_type: content_type.into(),
                bytes,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest {
    /// The payload type carried in `response_obj` on success.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Bearer token requirement.
    const AUTH: AuthMode;

    /// The URL path relative to the API base.
    fn path(&self) -> ApiPath;

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::None)
    }
}

// =========================================================
// 响应信封
// =========================================================

/// 后端统一响应格式 `{ status, response_obj, http_code? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub response_obj: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
}

impl Envelope {
    pub fn success(http_code: u16, payload: serde_json::Value) -> Self {
        Self {
            status: true,
            response_obj: payload,
            http_code: Some(http_code),
        }
    }

    pub fn failure(http_code: u16, message: impl Into<String>) -> Self {
        Self {
            status: false,
            response_obj: serde_json::json!({ "message": message.into() }),
            http_code: Some(http_code),
        }
    }

    /// `response_obj.message`，失败响应和部分成功响应都会带
    pub fn message(&self) -> Option<&str> {
        self.response_obj.get("message")?.as_str()
    }

    /// 载荷明确声明 `is_authenticated: false`
    pub fn denies_authentication(&self) -> bool {
        self.response_obj.get("is_authenticated") == Some(&serde_json::Value::Bool(false))
    }

    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.response_obj)
    }
}

/// 只携带提示信息的载荷
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// 后端计算的最短路径
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortestPath {
    pub path: Vec<String>,
    pub total_weight: f64,
}

/// 图片上传结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedImage {
    #[serde(default)]
    pub message: Option<String>,
    pub file_path: String,
    #[serde(default)]
    pub signed_url: Option<String>,
}

impl UploadedImage {
    /// 可直接引用的资源地址，没有签名地址时退回存储路径
    pub fn asset_url(&self) -> &str {
        self.signed_url.as_deref().unwrap_or(&self.file_path)
    }
}

fn json<T: Serialize>(value: &T) -> Result<Payload, serde_json::Error> {
    serde_json::to_value(value).map(Payload::Json)
}

// =========================================================
// Request Definitions: Nodes
// =========================================================

/// List all navigation nodes
#[derive(Debug, Clone, Default)]
pub struct ListNodes;

impl ApiRequest for ListNodes {
    type Response = NodeList;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("nodes").slash()
    }
}

#[derive(Debug, Clone)]
pub struct CreateNode(pub Node);

impl ApiRequest for CreateNode {
    type Response = Node;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("nodes").slash()
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteNode {
    pub name: String,
}

impl ApiRequest for DeleteNode {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Delete;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("nodes").segment(&self.name)
    }
}

/// Per-node operational status
#[derive(Debug, Clone, Default)]
pub struct ListNodeStatuses;

impl ApiRequest for ListNodeStatuses {
    type Response = Vec<NodeStatus>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("nodes").segment("statuses")
    }
}

// =========================================================
// Request Definitions: Tags & Locations
// =========================================================

#[derive(Debug, Clone, Default)]
pub struct ListTags;

impl ApiRequest for ListTags {
    type Response = Vec<Tag>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("tags").slash()
    }
}

#[derive(Debug, Clone)]
pub struct CreateTag(pub Tag);

impl ApiRequest for CreateTag {
    type Response = Tag;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("tags").slash()
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteTag {
    pub name: String,
}

impl ApiRequest for DeleteTag {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Delete;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("tags").segment(&self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListLocations;

impl ApiRequest for ListLocations {
    type Response = Vec<Location>;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("locations").slash()
    }
}

#[derive(Debug, Clone)]
pub struct CreateLocation(pub Location);

impl ApiRequest for CreateLocation {
    type Response = Location;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("locations").slash()
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteLocation {
    pub name: String,
}

impl ApiRequest for DeleteLocation {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Delete;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("locations").segment(&self.name)
    }
}

// =========================================================
// Request Definitions: Auth & Tenants
// =========================================================

/// Validate the bearer token
#[derive(Debug, Clone, Default)]
pub struct CheckAuthStatus;

impl ApiRequest for CheckAuthStatus {
    type Response = AuthStatus;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("auth").segment("status")
    }
}

#[derive(Debug, Clone)]
pub struct Login(pub Credentials);

impl ApiRequest for Login {
    type Response = AuthToken;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Never;

    fn path(&self) -> ApiPath {
        ApiPath::new("auth").segment("login")
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Signup(pub Credentials);

impl ApiRequest for Signup {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Never;

    fn path(&self) -> ApiPath {
        ApiPath::new("auth").segment("signup")
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ForgotPassword(pub RecoveryRequest);

impl ApiRequest for ForgotPassword {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Never;

    fn path(&self) -> ApiPath {
        ApiPath::new("auth").segment("forgot-password")
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ResetPassword(pub PasswordReset);

impl ApiRequest for ResetPassword {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Never;

    fn path(&self) -> ApiPath {
        ApiPath::new("auth").segment("reset-password")
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        json(&self.0)
    }
}

/// Server-side session revocation
#[derive(Debug, Clone, Default)]
pub struct Logout;

impl ApiRequest for Logout {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("auth").segment("logout")
    }
}

#[derive(Debug, Clone)]
pub struct GetTenant {
    pub id: String,
}

impl ApiRequest for GetTenant {
    type Response = Tenant;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("tenants").segment(&self.id)
    }
}

// =========================================================
// Request Definitions: Uploads & Graph
// =========================================================

/// Multipart image upload (field `file`)
#[derive(Debug, Clone)]
pub struct UploadImage(pub MultipartForm);

impl UploadImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self(MultipartForm::file("file", file_name, content_type, bytes))
    }
}

impl ApiRequest for UploadImage {
    type Response = UploadedImage;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("upload").segment("image")
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::Multipart(self.0.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct DeleteImage {
    pub file_url: String,
}

impl ApiRequest for DeleteImage {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Delete;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("upload")
            .segment("image")
            .query("file_url", &self.file_url)
    }
}

#[derive(Debug, Clone)]
pub struct ShortestPathQuery {
    pub source: String,
    pub target: String,
}

impl ApiRequest for ShortestPathQuery {
    type Response = ShortestPath;
    const METHOD: HttpMethod = HttpMethod::Get;
    const AUTH: AuthMode = AuthMode::Optional;

    fn path(&self) -> ApiPath {
        ApiPath::new("graph")
            .segment("shortest-path")
            .segment(&self.source)
            .segment(&self.target)
    }
}

/// Rebuild the backend graph after node edits
#[derive(Debug, Clone, Default)]
pub struct RefreshGraph;

impl ApiRequest for RefreshGraph {
    type Response = Option<MessageBody>;
    const METHOD: HttpMethod = HttpMethod::Post;
    const AUTH: AuthMode = AuthMode::Required;

    fn path(&self) -> ApiPath {
        ApiPath::new("graph").segment("refresh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_display_matches_backend_routes() {
        assert_eq!(ListNodes.path().to_string(), "nodes/");
        assert_eq!(ListNodeStatuses.path().to_string(), "nodes/statuses");
        assert_eq!(
            DeleteImage { file_url: "a/b.png".into() }.path().to_string(),
            "upload/image?file_url=a/b.png"
        );
        assert_eq!(
            ShortestPathQuery { source: "001".into(), target: "009".into() }
                .path()
                .to_string(),
            "graph/shortest-path/001/009"
        );
    }

    #[test]
    fn envelope_message_comes_from_response_obj() {
        let env: Envelope = serde_json::from_value(json!({
            "status": false,
            "http_code": 404,
            "response_obj": {"message": "OBJECT_NOT_FOUND"}
        }))
        .unwrap();
        assert_eq!(env.message(), Some("OBJECT_NOT_FOUND"));
        assert_eq!(env.http_code, Some(404));
    }

    #[test]
    fn envelope_without_payload_decodes_as_null() {
        let env: Envelope = serde_json::from_value(json!({"status": true})).unwrap();
        let body: Option<MessageBody> = env.into_payload().unwrap();
        assert!(body.is_none());
    }

    #[test]
    fn upload_payload_is_multipart_file_field() {
        let req = UploadImage::new("01.jpg", "image/jpeg", vec![1, 2, 3]);
        match req.payload().unwrap() {
            Payload::Multipart(form) => {
                assert_eq!(form.parts.len(), 1);
                assert_eq!(form.parts[0].field, "file");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn asset_url_prefers_signed_url() {
        let mut img = UploadedImage {
            message: None,
            file_path: "u1/01.jpg".into(),
            signed_url: None,
        };
        assert_eq!(img.asset_url(), "u1/01.jpg");
        img.signed_url = Some("https://cdn/x".into());
        assert_eq!(img.asset_url(), "https://cdn/x");
    }
}
