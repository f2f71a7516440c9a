//! 强类型后端 API 客户端
//!
//! 每个端点对应 `unet360_shared::protocol` 中的一个 `ApiRequest`，
//! 这里只负责拼 URL、附加令牌、发送请求并拆开响应信封。

use std::cell::RefCell;

use serde::de::DeserializeOwned;
use unet360_shared::protocol::{
    CheckAuthStatus, CreateLocation, CreateNode, CreateTag, DeleteImage, DeleteLocation,
    DeleteNode, DeleteTag, ForgotPassword, GetTenant, ListLocations, ListNodeStatuses, ListNodes,
    ListTags, Login, Logout, RefreshGraph, ResetPassword, ShortestPath, ShortestPathQuery, Signup,
    UploadImage, UploadedImage,
};
use unet360_shared::{
    ApiPath, ApiRequest, AuthMode, AuthStatus, AuthToken, Credentials, Envelope, Location,
    MessageBody, Node, NodeStatus, PasswordReset, Payload, RecoveryRequest, Tag, Tenant,
};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{HttpBody, HttpClient, HttpRequest, HttpResponse};

pub struct UnetApi<C> {
    http: C,
    base: Url,
    /// 默认 Bearer 令牌，由 `check_auth_cookie` 同步
    bearer: RefCell<Option<String>>,
}

impl<C: HttpClient> UnetApi<C> {
    pub fn new(http: C, base: Url) -> Self {
        Self {
            http,
            base,
            bearer: RefCell::new(None),
        }
    }

    pub fn from_config(http: C, config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(http, config.base_url()?))
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn set_bearer(&self, token: Option<String>) {
        *self.bearer.borrow_mut() = token;
    }

    pub fn bearer(&self) -> Option<String> {
        self.bearer.borrow().clone()
    }

    /// 逐段编码拼接路径，节点名中的 `/`、空格等不会破坏路由
    pub fn url_for(&self, path: &ApiPath) -> ClientResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::invalid_input("API base URL cannot carry a path"))?;
            segments.pop_if_empty();
            for segment in path.segments() {
                segments.push(segment);
            }
            if path.has_trailing_slash() {
                segments.push("");
            }
        }
        if !path.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(path.query_pairs());
        }
        Ok(url)
    }

    /// 显式令牌优先，其次默认 Bearer
    fn resolve_token<R: ApiRequest>(&self, token: Option<&str>) -> ClientResult<Option<String>> {
        let token = token
            .map(str::to_string)
            .or_else(|| self.bearer())
            .filter(|t| !t.is_empty());
        match R::AUTH {
            AuthMode::Never => Ok(None),
            AuthMode::Optional => Ok(token),
            AuthMode::Required => token
                .map(Some)
                .ok_or_else(|| ClientError::unauthorized("No session token")),
        }
    }

    /// 发送一个强类型请求并返回信封中的载荷
    pub async fn send<R: ApiRequest>(&self, req: &R, token: Option<&str>) -> ClientResult<R::Response> {
        let path = req.path();
        let op = format!("{} {}", R::METHOD, path);

        let token = self
            .resolve_token::<R>(token)
            .map_err(|e| e.in_op_with("api.send", op.clone()))?;
        let url = self
            .url_for(&path)
            .map_err(|e| e.in_op_with("api.send", op.clone()))?;

        let mut http_req =
            HttpRequest::new(url.as_str(), R::METHOD).with_header("Accept", "application/json");
        if let Some(token) = token {
            http_req = http_req.with_header("Authorization", &format!("Bearer {}", token));
        }
        http_req = match req.payload()? {
            Payload::None => http_req,
            Payload::Json(value) => http_req
                .with_header("Content-Type", "application/json")
                .with_body(HttpBody::Json(value.to_string())),
            Payload::Multipart(form) => http_req.with_body(HttpBody::Multipart(form)),
        };

        let resp = self
            .http
            .send(http_req)
            .await
            .map_err(|e| e.in_op_with("api.send", op.clone()))?;

        decode_envelope(resp).map_err(|e| e.in_op_with("api.send", op))
    }

    // =========================================================
    // 节点
    // =========================================================

    /// 格式错误的节点被跳过并记录，不影响其余节点
    pub async fn get_nodes(&self, token: Option<&str>) -> ClientResult<Vec<Node>> {
        let list = self.send(&ListNodes, token).await?;
        for rejected in &list.rejected {
            log_warn!(
                "[Api] skipped node {}: {}",
                rejected.name.as_deref().unwrap_or("<unnamed>"),
                rejected.reason
            );
        }
        Ok(list.nodes)
    }

    pub async fn create_node(&self, node: Node, token: Option<&str>) -> ClientResult<Node> {
        node.validate()?;
        self.send(&CreateNode(node), token).await
    }

    pub async fn delete_node(&self, name: &str, token: Option<&str>) -> ClientResult<Option<MessageBody>> {
        self.send(&DeleteNode { name: name.to_string() }, token).await
    }

    pub async fn get_node_statuses(&self, token: Option<&str>) -> ClientResult<Vec<NodeStatus>> {
        self.send(&ListNodeStatuses, token).await
    }

    // =========================================================
    // 标签与地点
    // =========================================================

    pub async fn get_tags(&self, token: Option<&str>) -> ClientResult<Vec<Tag>> {
        self.send(&ListTags, token).await
    }

    pub async fn create_tag(&self, tag: Tag, token: Option<&str>) -> ClientResult<Tag> {
        self.send(&CreateTag(tag), token).await
    }

    pub async fn delete_tag(&self, name: &str, token: Option<&str>) -> ClientResult<Option<MessageBody>> {
        self.send(&DeleteTag { name: name.to_string() }, token).await
    }

    pub async fn get_locations(&self, token: Option<&str>) -> ClientResult<Vec<Location>> {
        self.send(&ListLocations, token).await
    }

    pub async fn create_location(&self, location: Location, token: Option<&str>) -> ClientResult<Location> {
        self.send(&CreateLocation(location), token).await
    }

    pub async fn delete_location(&self, name: &str, token: Option<&str>) -> ClientResult<Option<MessageBody>> {
        self.send(&DeleteLocation { name: name.to_string() }, token).await
    }

    // =========================================================
    // 图片与图
    // =========================================================

    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        token: Option<&str>,
    ) -> ClientResult<UploadedImage> {
        self.send(&UploadImage::new(file_name, content_type, bytes), token)
            .await
    }

    pub async fn delete_image(&self, file_url: &str, token: Option<&str>) -> ClientResult<Option<MessageBody>> {
        self.send(&DeleteImage { file_url: file_url.to_string() }, token)
            .await
    }

    pub async fn fetch_shortest_path(
        &self,
        source: &str,
        target: &str,
        token: Option<&str>,
    ) -> ClientResult<ShortestPath> {
        let query = ShortestPathQuery {
            source: source.to_string(),
            target: target.to_string(),
        };
        self.send(&query, token).await
    }

    pub async fn refresh_graph(&self, token: Option<&str>) -> ClientResult<Option<MessageBody>> {
        self.send(&RefreshGraph, token).await
    }

    // =========================================================
    // 认证
    // =========================================================

    pub async fn auth_status(&self, token: Option<&str>) -> ClientResult<AuthStatus> {
        self.send(&CheckAuthStatus, token).await
    }

    pub async fn login(&self, credentials: Credentials) -> ClientResult<AuthToken> {
        self.send(&Login(credentials), None).await
    }

    pub async fn signup(&self, credentials: Credentials) -> ClientResult<Option<MessageBody>> {
        self.send(&Signup(credentials), None).await
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<Option<MessageBody>> {
        let req = ForgotPassword(RecoveryRequest {
            email: email.to_string(),
        });
        self.send(&req, None).await
    }

    pub async fn reset_password(&self, reset: PasswordReset) -> ClientResult<Option<MessageBody>> {
        self.send(&ResetPassword(reset), None).await
    }

    /// 服务端注销；本地登出不依赖它
    pub async fn logout_remote(&self, token: Option<&str>) -> ClientResult<Option<MessageBody>> {
        self.send(&Logout, token).await
    }

    pub async fn get_tenant(&self, id: &str, token: Option<&str>) -> ClientResult<Tenant> {
        self.send(&GetTenant { id: id.to_string() }, token).await
    }
}

/// 拆开响应信封
///
/// 后端在框架层报错时可能返回非信封的 `{"detail": ...}`，按 HTTP 状态归类。
fn decode_envelope<T: DeserializeOwned>(resp: HttpResponse) -> ClientResult<T> {
    let envelope: Envelope = match serde_json::from_str(&resp.body) {
        Ok(envelope) => envelope,
        Err(e) if !resp.is_success() => {
            let message = detail_message(&resp.body)
                .unwrap_or_else(|| format!("Invalid server response: status code {}", resp.status));
            return Err(ClientError::from_status(resp.status, message).with_source(e));
        }
        Err(e) => {
            return Err(ClientError::malformed(format!("Invalid server response: {}", e)).with_source(e));
        }
    };

    if !envelope.status {
        let code = envelope.http_code.unwrap_or(resp.status);
        let message = envelope
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Invalid server response: status code {}", code));
        // 认证状态接口以 200 + `is_authenticated: false` 表示令牌被拒
        if envelope.denies_authentication() {
            return Err(ClientError::unauthorized(message));
        }
        return Err(ClientError::from_status(code, message));
    }

    envelope.into_payload().map_err(|e| {
        ClientError::malformed(format!("Unexpected payload shape: {}", e)).with_source(e)
    })
}

fn detail_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::mock::{MOCK_BASE, MockHttpClient};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use unet360_shared::HttpMethod;

    fn api() -> UnetApi<MockHttpClient> {
        UnetApi::new(MockHttpClient::new(), Url::parse(MOCK_BASE).unwrap())
    }

    #[test]
    fn url_for_encodes_segments_and_queries() {
        let api = api();
        let url = api
            .url_for(&ApiPath::new("graph").segment("shortest-path").segment("Aula 1/B").segment("009"))
            .unwrap();
        assert_eq!(url.as_str(), "http://api.test/graph/shortest-path/Aula%201%2FB/009");

        let url = api
            .url_for(&ApiPath::new("upload").segment("image").query("file_url", "nodes/01 a.jpg"))
            .unwrap();
        assert_eq!(url.as_str(), "http://api.test/upload/image?file_url=nodes%2F01+a.jpg");

        let url = api.url_for(&ApiPath::new("nodes").slash()).unwrap();
        assert_eq!(url.as_str(), "http://api.test/nodes/");
    }

    #[test]
    fn url_for_keeps_base_path_prefix() {
        let api = UnetApi::new(
            MockHttpClient::new(),
            Url::parse("http://api.test/v1/").unwrap(),
        );
        let url = api.url_for(&ApiPath::new("tags").slash()).unwrap();
        assert_eq!(url.as_str(), "http://api.test/v1/tags/");
    }

    #[tokio::test]
    async fn required_auth_without_token_sends_nothing() {
        let api = api();
        let err = api.get_nodes(None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(api.http().calls(), 0);
    }

    #[tokio::test]
    async fn default_bearer_is_attached() {
        let api = api();
        api.http().ok(HttpMethod::Get, "tags/", json!([{"name": "Baños"}]));
        api.set_bearer(Some("tok".into()));

        let tags = api.get_tags(None).await.unwrap();
        assert_eq!(tags, vec![Tag::new("Baños")]);
        let req = api.http().last_request().unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn explicit_token_overrides_default() {
        let api = api();
        api.http().ok(HttpMethod::Get, "locations/", json!([]));
        api.set_bearer(Some("stale".into()));

        api.get_locations(Some("fresh")).await.unwrap();
        let req = api.http().last_request().unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn login_never_sends_bearer_and_posts_json() {
        let api = api();
        api.set_bearer(Some("old".into()));
        api.http().ok(
            HttpMethod::Post,
            "auth/login",
            json!({"access_token": "new", "user_id": "u1", "user_role": "admin"}),
        );

        let token = api.login(Credentials::new("a@b.c", "pw")).await.unwrap();
        assert_eq!(token.access_token, "new");

        let req = api.http().last_request().unwrap();
        assert_eq!(req.header("Authorization"), None);
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        match req.body {
            HttpBody::Json(body) => {
                let value: serde_json::Value = serde_json::from_str(&body).unwrap();
                assert_eq!(value, json!({"email": "a@b.c", "password": "pw"}));
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_envelope_becomes_backend_error() {
        let api = api();
        api.http().on_envelope(
            HttpMethod::Delete,
            "nodes/009",
            &Envelope::failure(404, "OBJECT_NOT_FOUND"),
        );

        let err = api.delete_node("009", Some("t")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Backend);
        assert_eq!(err.http_code, Some(404));
        assert_eq!(err.message(), "OBJECT_NOT_FOUND");
    }

    #[tokio::test]
    async fn non_envelope_error_uses_detail() {
        let api = api();
        api.http()
            .on(HttpMethod::Get, "auth/status", 401, r#"{"detail":"Not authenticated"}"#);

        let err = api.auth_status(Some("t")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message(), "Not authenticated");
    }

    #[tokio::test]
    async fn failed_status_envelope_is_unauthorized() {
        let api = api();
        api.http().on(
            HttpMethod::Get,
            "auth/status",
            200,
            r#"{"status":false,"http_code":200,"response_obj":{"is_authenticated":false,"message":"Invalid token"}}"#,
        );

        let err = api.auth_status(Some("t")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message(), "Invalid token");
    }

    #[tokio::test]
    async fn garbage_success_body_is_malformed() {
        let api = api();
        api.http().on(HttpMethod::Get, "nodes/", 200, "<html>");

        let err = api.get_nodes(Some("t")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn create_node_validates_before_sending() {
        let api = api();
        let err = api.create_node(Node::new("  ", "a.jpg"), Some("t")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert_eq!(api.http().calls(), 0);
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_field() {
        let api = api();
        api.http().ok(
            HttpMethod::Post,
            "upload/image",
            json!({"file_path": "nodes/01.jpg", "signed_url": "https://cdn.test/01.jpg"}),
        );

        let uploaded = api
            .upload_image("01.jpg", "image/jpeg", vec![0xff, 0xd8], Some("t"))
            .await
            .unwrap();
        assert_eq!(uploaded.asset_url(), "https://cdn.test/01.jpg");

        match api.http().last_request().unwrap().body {
            HttpBody::Multipart(form) => {
                assert_eq!(form.parts.len(), 1);
                assert_eq!(form.parts[0].field, "file");
                assert_eq!(form.parts[0].file_name, "01.jpg");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn shortest_path_is_public_but_uses_token_when_present() {
        let api = api();
        api.http().ok(
            HttpMethod::Get,
            "graph/shortest-path/001/009",
            json!({"path": ["001", "004", "009"], "total_weight": 2.5}),
        );

        let path = api.fetch_shortest_path("001", "009", None).await.unwrap();
        assert_eq!(path.path, vec!["001", "004", "009"]);
        assert_eq!(api.http().last_request().unwrap().header("Authorization"), None);

        api.fetch_shortest_path("001", "009", Some("t")).await.unwrap();
        assert_eq!(
            api.http().last_request().unwrap().header("Authorization"),
            Some("Bearer t")
        );
    }
}
