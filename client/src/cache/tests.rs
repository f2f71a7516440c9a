use super::*;
use crate::config::ClientConfig;
use crate::http::mock::{MOCK_BASE, MockHttpClient};
use crate::session::AuthStore;
use crate::storage::MemoryCookieJar;
use pretty_assertions::assert_eq;
use serde_json::json;
use unet360_shared::{Envelope, HttpMethod, StatusLevel};
use url::Url;

// =========================================================
// 辅助函数
// =========================================================

struct Fixture {
    api: Rc<UnetApi<MockHttpClient>>,
    auth: AuthStore<MockHttpClient, MemoryCookieJar>,
}

impl Fixture {
    fn new(token: Option<&str>) -> Self {
        let api = Rc::new(UnetApi::new(
            MockHttpClient::new(),
            Url::parse(MOCK_BASE).unwrap(),
        ));
        let jar = match token {
            Some(token) => MemoryCookieJar::with_cookie("auth", token),
            None => MemoryCookieJar::new(),
        };
        let auth = AuthStore::new(api.clone(), jar, ClientConfig::default());
        auth.check_auth_cookie();
        Self { api, auth }
    }

    fn http(&self) -> &MockHttpClient {
        self.api.http()
    }

    fn nodes(&self) -> NodeCache<MockHttpClient> {
        NodeCache::new(self.api.clone(), self.auth.session())
    }

    fn tags(&self) -> TagCache<MockHttpClient> {
        TagCache::new(self.api.clone(), self.auth.session())
    }

    fn locations(&self) -> LocationCache<MockHttpClient> {
        LocationCache::new(self.api.clone(), self.auth.session())
    }
}

fn node_json(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "url_image": format!("nodes/{}.jpg", name),
        "adyacent_nodes": [],
        "tags": []
    })
}

// =========================================================
// fetch_nodes 测试
// =========================================================

#[tokio::test]
async fn test_fetch_without_token_is_noop() {
    let fx = Fixture::new(None);
    let cache = fx.nodes();

    cache.fetch_nodes().await;

    assert_eq!(fx.http().calls(), 0);
    assert_eq!(cache.snapshot(), CacheState::default());
}

#[tokio::test]
async fn test_fetch_replaces_items_and_merges_statuses() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(
        HttpMethod::Get,
        "nodes/",
        json!([
            {
                "name": "001",
                "url_image": "nodes/001.jpg",
                "adyacent_nodes": [{"002": 1.5}, null, null, null]
            },
            node_json("002")
        ]),
    );
    fx.http().ok(
        HttpMethod::Get,
        "nodes/statuses",
        json!([{"name": "002", "status": "WARNING", "reasons": ["no minimap"]}]),
    );
    let cache = fx.nodes();

    cache.fetch_nodes().await;

    let state = cache.snapshot();
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
    assert_eq!(state.items().len(), 2);
    let second = cache.find("002").unwrap();
    assert_eq!(second.status, Some(StatusLevel::Warning));
    assert_eq!(second.reasons, Some(vec!["no minimap".to_string()]));
    // 没有状态记录的节点保持原样
    assert_eq!(cache.find("001").unwrap().status, None);

    let req = fx.http().requests().remove(0);
    assert_eq!(req.header("Authorization"), Some("Bearer tok"));
}

#[tokio::test]
async fn test_broken_node_does_not_hide_the_rest() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(
        HttpMethod::Get,
        "nodes/",
        json!([
            node_json("001"),
            {"name": "002", "url_image": "nodes/002.jpg", "adyacent_nodes": [{"001": 0}]},
            {
                "name": "003",
                "url_image": "nodes/003.jpg",
                "minimap": {"url_image": "map.png", "x": 10.5, "y": 42.25}
            }
        ]),
    );
    fx.http().ok(HttpMethod::Get, "nodes/statuses", json!([]));
    let cache = fx.nodes();

    cache.fetch_nodes().await;

    let state = cache.snapshot();
    assert_eq!(state.error, None);
    let names: Vec<_> = state.items().iter().map(|n| n.name.clone()).collect();
    assert_eq!(names, ["001", "003"]);
    assert!(cache.find("002").is_none());
}

#[tokio::test]
async fn test_statuses_merge_only_matching_nodes() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(
        HttpMethod::Get,
        "nodes/",
        json!([node_json("a"), node_json("b"), node_json("c")]),
    );
    fx.http().ok(
        HttpMethod::Get,
        "nodes/statuses",
        json!([
            {"name": "a", "status": "OK"},
            {"name": "c", "status": "ERROR", "reasons": ["missing image"]},
            {"name": "zzz", "status": "OK"}
        ]),
    );
    let cache = fx.nodes();

    cache.fetch_nodes().await;

    let state = cache.snapshot();
    let with_status: Vec<&str> = state
        .items()
        .iter()
        .filter(|n| n.status.is_some() && n.reasons.is_some())
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(with_status, vec!["a", "c"]);
    let untouched = cache.find("b").unwrap();
    assert_eq!(untouched.status, None);
    assert_eq!(untouched.reasons, None);
}

#[tokio::test]
async fn test_status_failure_is_swallowed() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(HttpMethod::Get, "nodes/", json!([node_json("001")]));
    fx.http().fail(HttpMethod::Get, "nodes/statuses", "timeout");
    let cache = fx.nodes();

    cache.fetch_nodes().await;

    let state = cache.snapshot();
    assert_eq!(state.error, None);
    assert_eq!(state.items().len(), 1);
}

#[tokio::test]
async fn test_failed_envelope_sets_error_and_keeps_items() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(HttpMethod::Get, "nodes/", json!([node_json("001")]));
    fx.http()
        .on_envelope(HttpMethod::Get, "nodes/", &Envelope::failure(500, "db down"));
    fx.http().ok(HttpMethod::Get, "nodes/statuses", json!([]));
    let cache = fx.nodes();

    cache.fetch_nodes().await;
    cache.fetch_nodes().await;

    let state = cache.snapshot();
    assert!(!state.is_loading);
    assert_eq!(
        state.error.as_deref(),
        Some("Invalid server response: status code 500")
    );
    // 之前成功加载的数据仍然可用
    assert_eq!(state.items().len(), 1);
}

#[tokio::test]
async fn test_network_failure_sets_error() {
    let fx = Fixture::new(Some("tok"));
    fx.http().fail(HttpMethod::Get, "nodes/", "connection refused");
    let cache = fx.nodes();

    cache.fetch_nodes().await;

    let state = cache.snapshot();
    assert_eq!(state.items, None);
    assert_eq!(state.error.as_deref(), Some("connection refused"));
}

#[tokio::test]
async fn test_stale_response_is_dropped() {
    let fx = Fixture::new(Some("tok"));
    // 第一个请求拿到旧数据但被挂起，第二个请求拿到新数据
    fx.http().ok(HttpMethod::Get, "nodes/", json!([node_json("old")]));
    fx.http().ok(HttpMethod::Get, "nodes/", json!([node_json("new")]));
    fx.http().ok(HttpMethod::Get, "nodes/statuses", json!([]));
    let gate = fx.http().gate(HttpMethod::Get, "nodes/");
    let cache = fx.nodes();

    futures::join!(cache.fetch_nodes(), async {
        cache.fetch_nodes().await;
        // 新数据已经写回，再放行旧请求
        let _ = gate.send(());
    });

    let names: Vec<String> = cache
        .snapshot()
        .items()
        .iter()
        .map(|n| n.name.clone())
        .collect();
    assert_eq!(names, vec!["new".to_string()]);
    assert!(!cache.snapshot().is_loading);
}

#[tokio::test]
async fn test_fetch_tags_twice_is_stable() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(
        HttpMethod::Get,
        "tags/",
        json!([{"name": "Aulas", "labels": ["A-101"]}, {"name": "Baños"}]),
    );
    let cache = fx.tags();

    cache.fetch_tags().await;
    let first = cache.snapshot();
    cache.fetch_tags().await;

    assert_eq!(cache.snapshot(), first);
    assert_eq!(first.items().len(), 2);
    assert_eq!(fx.http().calls_to(HttpMethod::Get, "tags/"), 2);
}

// =========================================================
// ensure_loaded 测试
// =========================================================

#[tokio::test]
async fn test_ensure_loaded_fetches_once() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(HttpMethod::Get, "nodes/", json!([]));
    fx.http().ok(HttpMethod::Get, "nodes/statuses", json!([]));
    let cache = fx.nodes();

    cache.ensure_loaded().await;
    cache.ensure_loaded().await;

    assert_eq!(fx.http().calls_to(HttpMethod::Get, "nodes/"), 1);
}

#[tokio::test]
async fn test_ensure_loaded_waits_for_token() {
    let fx = Fixture::new(None);
    fx.http().ok(HttpMethod::Get, "tags/", json!([{"name": "Baños"}]));
    let cache = fx.tags();

    cache.ensure_loaded().await;
    assert_eq!(fx.http().calls(), 0);

    fx.http().ok(
        HttpMethod::Post,
        "auth/login",
        json!({"access_token": "tok", "user_id": "u1"}),
    );
    assert!(fx.auth.login("a@b.c", "pw").await);
    cache.ensure_loaded().await;

    assert_eq!(cache.snapshot().items(), &[Tag::new("Baños")]);
}

// =========================================================
// 查询辅助
// =========================================================

#[tokio::test]
async fn test_search_and_neighbors() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(
        HttpMethod::Get,
        "nodes/",
        json!([
            {
                "name": "001",
                "location": "Edificio A",
                "url_image": "a.jpg",
                "adyacent_nodes": [{"002": 1.0}, null, {"999": 2.0}, null],
                "tags": [{"Servicios": ["Baños"]}]
            },
            node_json("002")
        ]),
    );
    fx.http().ok(HttpMethod::Get, "nodes/statuses", json!([]));
    let cache = fx.nodes();
    cache.fetch_nodes().await;

    let hits: Vec<String> = cache.search("baños").into_iter().map(|n| n.name).collect();
    assert_eq!(hits, vec!["001".to_string()]);
    assert_eq!(cache.search("edificio a").len(), 1);
    assert_eq!(cache.search("").len(), 2);

    let neighbors = cache.neighbors("001");
    assert_eq!(neighbors.len(), 2);
    assert_eq!(neighbors[0].0, Direction::Front);
    assert_eq!(neighbors[0].2.as_ref().map(|n| n.name.as_str()), Some("002"));
    // 缓存中不存在的邻居仍列出，但没有节点数据
    assert_eq!(neighbors[1].0, Direction::Back);
    assert!(neighbors[1].2.is_none());
    assert!(cache.neighbors("missing").is_empty());
}

// =========================================================
// 管理操作
// =========================================================

#[tokio::test]
async fn test_create_and_delete_node_update_collection() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(HttpMethod::Post, "nodes/", node_json("010"));
    fx.http().ok(HttpMethod::Delete, "nodes/010", json!({"message": "deleted"}));
    let cache = fx.nodes();

    let created = cache.create_node(Node::new("010", "nodes/010.jpg")).await.unwrap();
    assert_eq!(created.name, "010");
    assert!(cache.find("010").is_some());

    cache.delete_node("010").await.unwrap();
    assert!(cache.find("010").is_none());
}

#[tokio::test]
async fn test_failed_delete_keeps_item() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(HttpMethod::Post, "tags/", json!({"name": "Aulas"}));
    fx.http()
        .on_envelope(HttpMethod::Delete, "tags/Aulas", &Envelope::failure(409, "in use"));
    let cache = fx.tags();

    cache.create_tag(Tag::new("Aulas")).await.unwrap();
    let err = cache.delete_tag("Aulas").await.unwrap_err();

    assert_eq!(err.message(), "in use");
    assert!(cache.find("Aulas").is_some());
}

#[tokio::test]
async fn test_mutations_require_session() {
    let fx = Fixture::new(None);
    let cache = fx.locations();

    let err = cache
        .create_location(Location::new("Edificio B"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let err = cache.create_location(Location::new(" ")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_eq!(fx.http().calls(), 0);
}

#[tokio::test]
async fn test_fetch_locations() {
    let fx = Fixture::new(Some("tok"));
    fx.http().ok(
        HttpMethod::Get,
        "locations/",
        json!([{"name": "Edificio A"}, {"name": "Biblioteca"}]),
    );
    let cache = fx.locations();

    cache.fetch_locations().await;

    assert_eq!(
        cache.snapshot().items(),
        &[Location::new("Edificio A"), Location::new("Biblioteca")]
    );
}
