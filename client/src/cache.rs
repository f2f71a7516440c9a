//! 资源缓存
//!
//! 节点、标签、地点各自维护 `{ items, is_loading, error }`。
//! 每次拉取都领取一个递增的代号，响应只在代号仍是最新时才写回，
//! 先发后至的旧响应会被丢弃。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use unet360_shared::{Direction, Location, Neighbor, Node, NodeStatus, Tag};

use crate::api::UnetApi;
use crate::error::{ClientError, ClientResult, ErrorKind};
use crate::http::HttpClient;
use crate::session::SessionHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheState<T> {
    /// `None` 表示从未成功加载
    pub items: Option<Vec<T>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            items: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> CacheState<T> {
    pub fn items(&self) -> &[T] {
        self.items.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.as_ref().is_none_or(Vec::is_empty)
    }
}

/// 以名称为身份的资源
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Node {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Tag {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Location {
    fn key(&self) -> &str {
        &self.name
    }
}

// =========================================================
// 代号槽
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket(u64);

struct Slot<T> {
    label: &'static str,
    state: RefCell<CacheState<T>>,
    generation: Cell<u64>,
    initialized: Cell<bool>,
}

impl<T: Clone + Keyed> Slot<T> {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            state: RefCell::new(CacheState::default()),
            generation: Cell::new(0),
            initialized: Cell::new(false),
        }
    }

    fn begin(&self) -> Ticket {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        self.state.borrow_mut().is_loading = true;
        log_info!("[{}] fetch #{} started", self.label, next);
        Ticket(next)
    }

    /// 写回结果；代号已过期时丢弃并返回 `false`
    ///
    /// 失败时保留已有数据，只记录错误。
    fn finish(&self, ticket: Ticket, result: Result<Vec<T>, String>) -> bool {
        if ticket.0 != self.generation.get() {
            log_info!(
                "[{}] dropping stale response #{} (latest #{})",
                self.label,
                ticket.0,
                self.generation.get()
            );
            return false;
        }

        let mut state = self.state.borrow_mut();
        state.is_loading = false;
        match result {
            Ok(items) => {
                state.items = Some(items);
                state.error = None;
            }
            Err(message) => {
                log_error!("[{}] fetch #{} failed: {}", self.label, ticket.0, message);
                state.error = Some(message);
            }
        }
        true
    }

    /// 首次加载：只在尚未初始化且集合为空时返回 `true`
    fn claim_initial_load(&self) -> bool {
        if self.initialized.get() {
            return false;
        }
        self.initialized.set(true);
        self.state.borrow().is_empty()
    }

    fn snapshot(&self) -> CacheState<T> {
        self.state.borrow().clone()
    }

    fn find(&self, key: &str) -> Option<T> {
        self.state
            .borrow()
            .items()
            .iter()
            .find(|item| item.key() == key)
            .cloned()
    }

    fn upsert(&self, item: T) {
        let mut state = self.state.borrow_mut();
        let items = state.items.get_or_insert_with(Vec::new);
        match items.iter_mut().find(|existing| existing.key() == item.key()) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }

    fn remove(&self, key: &str) {
        if let Some(items) = self.state.borrow_mut().items.as_mut() {
            items.retain(|item| item.key() != key);
        }
    }
}

/// 缓存里保存的错误文本
fn describe(err: &ClientError) -> String {
    match (err.kind, err.http_code) {
        (ErrorKind::Transport, _) | (ErrorKind::Malformed, _) => err.message().to_string(),
        (_, Some(code)) => format!("Invalid server response: status code {}", code),
        _ => err.message().to_string(),
    }
}

fn require_token(session: &SessionHandle, op: &str) -> ClientResult<String> {
    session
        .token()
        .ok_or_else(|| ClientError::unauthorized("No session token").in_op(op.to_string()))
}

// =========================================================
// 节点
// =========================================================

pub struct NodeCache<C> {
    api: Rc<UnetApi<C>>,
    session: SessionHandle,
    slot: Slot<Node>,
}

impl<C: HttpClient> NodeCache<C> {
    pub fn new(api: Rc<UnetApi<C>>, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            slot: Slot::new("Nodes"),
        }
    }

    pub fn snapshot(&self) -> CacheState<Node> {
        self.slot.snapshot()
    }

    /// 拉取全部节点并合并状态；没有令牌时什么也不做
    pub async fn fetch_nodes(&self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let ticket = self.slot.begin();

        let result = match self.api.get_nodes(Some(&token)).await {
            Ok(mut nodes) => {
                match self.api.get_node_statuses(Some(&token)).await {
                    Ok(statuses) => merge_statuses(&mut nodes, &statuses),
                    Err(e) => log_warn!("[Nodes] status enrichment skipped: {}", e),
                }
                Ok(nodes)
            }
            Err(e) => Err(describe(&e)),
        };

        self.slot.finish(ticket, result);
    }

    /// 首次使用时加载一次
    pub async fn ensure_loaded(&self) {
        if self.session.token().is_none() {
            return;
        }
        if self.slot.claim_initial_load() {
            self.fetch_nodes().await;
        }
    }

    pub fn find(&self, name: &str) -> Option<Node> {
        self.slot.find(name)
    }

    /// 按名称、地点、标签搜索
    pub fn search(&self, query: &str) -> Vec<Node> {
        self.slot
            .state
            .borrow()
            .items()
            .iter()
            .filter(|node| node.matches(query))
            .cloned()
            .collect()
    }

    /// 节点四个方向上的邻居（仅返回缓存中存在的）
    pub fn neighbors(&self, name: &str) -> Vec<(Direction, Neighbor, Option<Node>)> {
        let Some(node) = self.find(name) else {
            return Vec::new();
        };
        node.adjacent_nodes
            .iter()
            .map(|(direction, neighbor)| (direction, neighbor.clone(), self.find(&neighbor.name)))
            .collect()
    }

    pub async fn create_node(&self, node: Node) -> ClientResult<Node> {
        let token = require_token(&self.session, "nodes.create")?;
        let created = self
            .api
            .create_node(node, Some(&token))
            .await
            .map_err(|e| e.in_op("nodes.create"))?;
        self.slot.upsert(created.clone());
        log_info!("[Nodes] created {}", created.name);
        Ok(created)
    }

    pub async fn delete_node(&self, name: &str) -> ClientResult<()> {
        let token = require_token(&self.session, "nodes.delete")?;
        self.api
            .delete_node(name, Some(&token))
            .await
            .map_err(|e| e.in_op_with("nodes.delete", name.to_string()))?;
        self.slot.remove(name);
        log_info!("[Nodes] deleted {}", name);
        Ok(())
    }
}

fn merge_statuses(nodes: &mut [Node], statuses: &[NodeStatus]) {
    let by_name: HashMap<&str, &NodeStatus> =
        statuses.iter().map(|s| (s.name.as_str(), s)).collect();
    for node in nodes.iter_mut() {
        if let Some(status) = by_name.get(node.name.as_str()) {
            node.apply_status(status);
        }
    }
}

// =========================================================
// 标签
// =========================================================

pub struct TagCache<C> {
    api: Rc<UnetApi<C>>,
    session: SessionHandle,
    slot: Slot<Tag>,
}

impl<C: HttpClient> TagCache<C> {
    pub fn new(api: Rc<UnetApi<C>>, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            slot: Slot::new("Tags"),
        }
    }

    pub fn snapshot(&self) -> CacheState<Tag> {
        self.slot.snapshot()
    }

    pub async fn fetch_tags(&self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let ticket = self.slot.begin();
        let result = self
            .api
            .get_tags(Some(&token))
            .await
            .map_err(|e| describe(&e));
        self.slot.finish(ticket, result);
    }

    pub async fn ensure_loaded(&self) {
        if self.session.token().is_none() {
            return;
        }
        if self.slot.claim_initial_load() {
            self.fetch_tags().await;
        }
    }

    pub fn find(&self, name: &str) -> Option<Tag> {
        self.slot.find(name)
    }

    pub async fn create_tag(&self, tag: Tag) -> ClientResult<Tag> {
        if tag.name.trim().is_empty() {
            return Err(ClientError::invalid_input("Tag name must not be empty"));
        }
        let token = require_token(&self.session, "tags.create")?;
        let created = self
            .api
            .create_tag(tag, Some(&token))
            .await
            .map_err(|e| e.in_op("tags.create"))?;
        self.slot.upsert(created.clone());
        Ok(created)
    }

    pub async fn delete_tag(&self, name: &str) -> ClientResult<()> {
        let token = require_token(&self.session, "tags.delete")?;
        self.api
            .delete_tag(name, Some(&token))
            .await
            .map_err(|e| e.in_op_with("tags.delete", name.to_string()))?;
        self.slot.remove(name);
        Ok(())
    }
}

// =========================================================
// 地点
// =========================================================

pub struct LocationCache<C> {
    api: Rc<UnetApi<C>>,
    session: SessionHandle,
    slot: Slot<Location>,
}

impl<C: HttpClient> LocationCache<C> {
    pub fn new(api: Rc<UnetApi<C>>, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            slot: Slot::new("Locations"),
        }
    }

    pub fn snapshot(&self) -> CacheState<Location> {
        self.slot.snapshot()
    }

    pub async fn fetch_locations(&self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let ticket = self.slot.begin();
        let result = self
            .api
            .get_locations(Some(&token))
            .await
            .map_err(|e| describe(&e));
        self.slot.finish(ticket, result);
    }

    pub async fn ensure_loaded(&self) {
        if self.session.token().is_none() {
            return;
        }
        if self.slot.claim_initial_load() {
            self.fetch_locations().await;
        }
    }

    pub async fn create_location(&self, location: Location) -> ClientResult<Location> {
        if location.name.trim().is_empty() {
            return Err(ClientError::invalid_input("Location name must not be empty"));
        }
        let token = require_token(&self.session, "locations.create")?;
        let created = self
            .api
            .create_location(location, Some(&token))
            .await
            .map_err(|e| e.in_op("locations.create"))?;
        self.slot.upsert(created.clone());
        Ok(created)
    }

    pub async fn delete_location(&self, name: &str) -> ClientResult<()> {
        let token = require_token(&self.session, "locations.delete")?;
        self.api
            .delete_location(name, Some(&token))
            .await
            .map_err(|e| e.in_op_with("locations.delete", name.to_string()))?;
        self.slot.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
