//! 通过真实 HTTP 往返验证 API 客户端与认证状态

use std::rc::Rc;

use serde_json::json;
use unet360_client::{
    AuthStore, ClientConfig, ErrorKind, MemoryCookieJar, NodeCache, ReqwestHttpClient, UnetApi,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(payload: serde_json::Value) -> serde_json::Value {
    json!({"status": true, "response_obj": payload, "http_code": 200})
}

fn api_for(server: &MockServer) -> UnetApi<ReqwestHttpClient> {
    let config = ClientConfig::default().with_base_url(&server.uri());
    UnetApi::from_config(ReqwestHttpClient::new(), &config).unwrap()
}

#[tokio::test]
async fn test_get_nodes_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nodes/"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            {"name": "001", "url_image": "a.jpg", "adyacent_nodes": [null, {"002": 1.0}]}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let nodes = api_for(&server).get_nodes(Some("tok")).await.unwrap();

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].adjacent_nodes.direction_of("002").map(|d| d.index()), Some(1));
}

#[tokio::test]
async fn test_delete_image_encodes_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/upload/image"))
        .and(query_param("file_url", "nodes/01 a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"message": "ok"}))))
        .expect(1)
        .mount(&server)
        .await;

    let body = api_for(&server)
        .delete_image("nodes/01 a.jpg", Some("tok"))
        .await
        .unwrap();
    assert_eq!(body.and_then(|b| b.message).as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_upload_image_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "file_path": "nodes/01.jpg",
            "signed_url": "https://cdn.test/nodes/01.jpg"
        }))))
        .mount(&server)
        .await;

    let uploaded = api_for(&server)
        .upload_image("01.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff], Some("tok"))
        .await
        .unwrap();
    assert_eq!(uploaded.asset_url(), "https://cdn.test/nodes/01.jpg");

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"01.jpg\""));
}

#[tokio::test]
async fn test_backend_failure_surfaces_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/graph/shortest-path/001/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": false,
            "http_code": 404,
            "response_obj": {"message": "Node 999 not found"}
        })))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .fetch_shortest_path("001", "999", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
    assert_eq!(err.http_code, Some(404));
    assert_eq!(err.message(), "Node 999 not found");
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = ClientConfig::default().with_base_url("http://127.0.0.1:9");
    let api = UnetApi::from_config(ReqwestHttpClient::new(), &config).unwrap();

    let err = api.get_tags(Some("tok")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transport);
}

#[tokio::test]
async fn test_login_then_fetch_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ana@unet.test", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "access_token": "live-token",
            "token_type": "bearer",
            "user_id": "u1",
            "user_role": "admin"
        }))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nodes/"))
        .and(header("Authorization", "Bearer live-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nodes/statuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_base_url(&server.uri());
    let api = Rc::new(UnetApi::from_config(ReqwestHttpClient::new(), &config).unwrap());
    let jar = Rc::new(MemoryCookieJar::new());
    let auth = AuthStore::new(api.clone(), jar.clone(), config);
    let nodes = NodeCache::new(api, auth.session());

    assert!(auth.login("ana@unet.test", "pw").await);
    assert!(auth.is_admin());
    assert_eq!(jar.writes(), vec!["auth=live-token; path=/".to_string()]);

    nodes.fetch_nodes().await;
    assert_eq!(nodes.snapshot().items, Some(Vec::new()));
}
