//! 导航图节点模型
//!
//! 每个节点是一张 360° 全景图，通过四个固定方向的邻接槽
//! (前/右/后/左) 链接到相邻节点，每条边带一个正权重。
//! 最短路径由后端计算，这里只描述数据形状。

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 每个节点的邻接槽数量
pub const SLOT_COUNT: usize = 4;

/// 未显式给出权重时（后端只返回邻居名）使用的默认权重
pub const DEFAULT_WEIGHT: f64 = 1.0;

// =========================================================
// 错误类型
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum NodeError {
    /// 节点名为空
    EmptyName,
    /// 没有全景图
    EmptyImage,
    /// 邻接列表超过四个槽
    TooManySlots(usize),
    /// 单个槽内出现多个邻居
    AmbiguousSlot { index: usize, entries: usize },
    /// 权重必须为有限正数
    InvalidWeight { neighbor: String, weight: f64 },
    /// 节点不能把自己作为邻居
    SelfReference(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::EmptyName => write!(f, "node name must not be empty"),
            NodeError::EmptyImage => write!(f, "node panorama image must not be empty"),
            NodeError::TooManySlots(n) => {
                write!(f, "expected at most {} adjacency slots, got {}", SLOT_COUNT, n)
            }
            NodeError::AmbiguousSlot { index, entries } => write!(
                f,
                "adjacency slot {} holds {} neighbors, expected at most one",
                index, entries
            ),
            NodeError::InvalidWeight { neighbor, weight } => write!(
                f,
                "edge weight to '{}' must be positive and finite, got {}",
                neighbor, weight
            ),
            NodeError::SelfReference(name) => {
                write!(f, "node '{}' cannot be its own neighbor", name)
            }
        }
    }
}

impl std::error::Error for NodeError {}

// =========================================================
// 方向
// =========================================================

/// 邻接槽方向，顺序即槽位下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Front = 0,
    Right = 1,
    Back = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; SLOT_COUNT] = [
        Direction::Front,
        Direction::Right,
        Direction::Back,
        Direction::Left,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Front => Direction::Back,
            Direction::Right => Direction::Left,
            Direction::Back => Direction::Front,
            Direction::Left => Direction::Right,
        }
    }

    /// 界面显示用的标签
    pub fn label(self) -> &'static str {
        match self {
            Direction::Front => "Frente",
            Direction::Right => "Derecha",
            Direction::Back => "Atrás",
            Direction::Left => "Izquierda",
        }
    }
}

// =========================================================
// 邻接槽
// =========================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub name: String,
    pub weight: f64,
}

impl Neighbor {
    pub fn new(name: impl Into<String>, weight: f64) -> Result<Self, NodeError> {
        let name = name.into();
        if !(weight.is_finite() && weight > 0.0) {
            return Err(NodeError::InvalidWeight {
                neighbor: name,
                weight,
            });
        }
        Ok(Self { name, weight })
    }
}

/// 四个按方向定位的邻接槽
///
/// 线上格式为单键对象的列表：`[{"002": 3}, {}, {}, {}]`。
/// 读取时兼容 `null` 槽和只有邻居名的字符串槽，不足四个时补空槽。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Adjacency([Option<Neighbor>; SLOT_COUNT]);

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, direction: Direction) -> Option<&Neighbor> {
        self.0[direction.index()].as_ref()
    }

    pub fn set(&mut self, direction: Direction, neighbor: Neighbor) {
        self.0[direction.index()] = Some(neighbor);
    }

    pub fn clear(&mut self, direction: Direction) -> Option<Neighbor> {
        self.0[direction.index()].take()
    }

    /// 已占用的槽，按方向顺序
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &Neighbor)> {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|n| (d, n)))
    }

    /// 指向某个邻居的方向
    pub fn direction_of(&self, name: &str) -> Option<Direction> {
        self.iter().find(|(_, n)| n.name == name).map(|(d, _)| d)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    fn from_raw(slots: Vec<Option<RawSlot>>) -> Result<Self, NodeError> {
        if slots.len() > SLOT_COUNT {
            return Err(NodeError::TooManySlots(slots.len()));
        }

        let mut adjacency = Adjacency::default();
        for (index, slot) in slots.into_iter().enumerate() {
            let neighbor = match slot {
                None => None,
                Some(RawSlot::Name(name)) if name.is_empty() => None,
                Some(RawSlot::Name(name)) => Some(Neighbor::new(name, DEFAULT_WEIGHT)?),
                Some(RawSlot::Weighted(map)) => {
                    if map.len() > 1 {
                        return Err(NodeError::AmbiguousSlot {
                            index,
                            entries: map.len(),
                        });
                    }
                    match map.into_iter().next() {
                        Some((name, weight)) => Some(Neighbor::new(name, weight)?),
                        None => None,
                    }
                }
            };
            adjacency.0[index] = neighbor;
        }
        Ok(adjacency)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSlot {
    Name(String),
    Weighted(BTreeMap<String, f64>),
}

impl Serialize for Adjacency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let slots: Vec<BTreeMap<&str, f64>> = self
            .0
            .iter()
            .map(|slot| match slot {
                Some(n) => BTreeMap::from([(n.name.as_str(), n.weight)]),
                None => BTreeMap::new(),
            })
            .collect();
        slots.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Adjacency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Option<RawSlot>>::deserialize(deserializer)?;
        Adjacency::from_raw(raw).map_err(de::Error::custom)
    }
}

// =========================================================
// 节点标签
// =========================================================

/// 分类 -> 标签列表
///
/// 线上格式是对象列表（`[{"Aula": ["15A", "14A"]}]`），读取时合并，
/// 写回时输出为单个对象。只有分类名的字符串条目视为空标签列表。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeTags(BTreeMap<String, Vec<String>>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTagEntry {
    Category(String),
    Groups(BTreeMap<String, Vec<String>>),
}

impl Serialize for NodeTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            Vec::<()>::new().serialize(serializer)
        } else {
            [&self.0].serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for NodeTags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<RawTagEntry>::deserialize(deserializer)?;
        let mut tags = NodeTags::default();
        for entry in entries {
            match entry {
                RawTagEntry::Category(category) => {
                    tags.0.entry(category).or_default();
                }
                RawTagEntry::Groups(groups) => {
                    for (category, labels) in groups {
                        tags.insert(category, labels);
                    }
                }
            }
        }
        Ok(tags)
    }
}

impl NodeTags {
    /// 合并标签，重复项忽略
    pub fn insert(&mut self, category: impl Into<String>, labels: Vec<String>) {
        let entry = self.0.entry(category.into()).or_default();
        for label in labels {
            if !entry.contains(&label) {
                entry.push(label);
            }
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn labels(&self, category: &str) -> &[String] {
        self.0.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =========================================================
// 小地图与状态
// =========================================================

/// 小地图图片以及节点在其上的坐标（像素，可为小数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minimap {
    pub url_image: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusLevel {
    Ok,
    Warning,
    Error,
}

/// `nodes/statuses` 返回的单个节点运行状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    pub status: StatusLevel,
    #[serde(default)]
    pub reasons: Vec<String>,
}

// =========================================================
// 节点
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub url_image: String,
    #[serde(default, alias = "adyacent_nodes")]
    pub adjacent_nodes: Adjacency,
    #[serde(default)]
    pub tags: NodeTags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimap: Option<Minimap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Vec<String>>,
}

impl Node {
    pub fn new(name: impl Into<String>, url_image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            url_image: url_image.into(),
            adjacent_nodes: Adjacency::default(),
            tags: NodeTags::default(),
            minimap: None,
            status: None,
            reasons: None,
        }
    }

    /// 校验节点不变量：名称与全景图非空、不自引用、权重为正
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.name.trim().is_empty() {
            return Err(NodeError::EmptyName);
        }
        if self.url_image.trim().is_empty() {
            return Err(NodeError::EmptyImage);
        }
        for (_, neighbor) in self.adjacent_nodes.iter() {
            if neighbor.name == self.name {
                return Err(NodeError::SelfReference(self.name.clone()));
            }
            if !(neighbor.weight.is_finite() && neighbor.weight > 0.0) {
                return Err(NodeError::InvalidWeight {
                    neighbor: neighbor.name.clone(),
                    weight: neighbor.weight,
                });
            }
        }
        Ok(())
    }

    pub fn neighbor(&self, direction: Direction) -> Option<&Neighbor> {
        self.adjacent_nodes.get(direction)
    }

    pub fn apply_status(&mut self, status: &NodeStatus) {
        self.status = Some(status.status);
        self.reasons = Some(status.reasons.clone());
    }

    /// 不区分大小写地匹配名称、地点与标签
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let hit = |s: &str| s.to_lowercase().contains(&query);

        hit(&self.name)
            || self.location.as_deref().is_some_and(hit)
            || self
                .tags
                .iter()
                .any(|(category, labels)| hit(category) || labels.iter().any(|l| hit(l)))
    }
}

// =========================================================
// 节点列表
// =========================================================

/// 无法解码的节点条目
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedNode {
    /// 条目中的 `name`，缺失或非字符串时为空
    pub name: Option<String>,
    pub reason: String,
}

/// `nodes/` 的返回值
///
/// 逐条解码：单个节点格式错误只进入 `rejected`，其余节点照常可用。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeList {
    pub nodes: Vec<Node>,
    pub rejected: Vec<RejectedNode>,
}

impl<'de> Deserialize<'de> for NodeList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let mut list = NodeList::default();
        for entry in entries {
            let name = entry.get("name").and_then(|v| v.as_str()).map(str::to_string);
            match serde_json::from_value::<Node>(entry) {
                Ok(node) => list.nodes.push(node),
                Err(e) => list.rejected.push(RejectedNode {
                    name,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mock_node() -> serde_json::Value {
        json!({
            "name": "001",
            "location": null,
            "url_image": "https://cdn.example/01.PHOTOSPHERE.jpg",
            "adyacent_nodes": [{"002": 3}, {"003": 4}, {}, {}],
            "tags": [{"Aula": ["15A", "14A"], "Baño de damas": ["Baño oeste del A"]}]
        })
    }

    #[test]
    fn decodes_legacy_node_shape() {
        let node: Node = serde_json::from_value(mock_node()).unwrap();

        assert_eq!(node.name, "001");
        assert_eq!(node.neighbor(Direction::Front), Some(&Neighbor::new("002", 3.0).unwrap()));
        assert_eq!(node.neighbor(Direction::Right).map(|n| n.name.as_str()), Some("003"));
        assert!(node.neighbor(Direction::Back).is_none());
        assert_eq!(node.adjacent_nodes.direction_of("003"), Some(Direction::Right));
        assert_eq!(node.tags.labels("Aula"), ["15A".to_string(), "14A".to_string()]);
        assert!(node.validate().is_ok());
    }

    #[test]
    fn writes_adjacency_with_four_positional_slots() {
        let node: Node = serde_json::from_value(mock_node()).unwrap();
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["adjacent_nodes"], json!([{"002": 3.0}, {"003": 4.0}, {}, {}]));
        assert!(value.get("status").is_none());
    }

    #[test]
    fn accepts_plain_names_and_short_lists() {
        let adjacency: Adjacency = serde_json::from_value(json!(["002", null])).unwrap();

        assert_eq!(adjacency.get(Direction::Front).unwrap().weight, DEFAULT_WEIGHT);
        assert!(adjacency.get(Direction::Right).is_none());
        assert!(adjacency.get(Direction::Left).is_none());
    }

    #[test]
    fn rejects_slot_with_two_neighbors() {
        let err = serde_json::from_value::<Adjacency>(json!([{"002": 1, "003": 2}]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("slot 0"), "{err}");
    }

    #[test]
    fn rejects_more_than_four_slots() {
        let result = serde_json::from_value::<Adjacency>(json!([{}, {}, {}, {}, {}]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_positive_weight() {
        assert!(serde_json::from_value::<Adjacency>(json!([{"002": 0}])).is_err());
        assert!(Neighbor::new("002", -1.0).is_err());
    }

    #[test]
    fn validate_catches_self_reference() {
        let mut node = Node::new("004", "img");
        node.adjacent_nodes
            .set(Direction::Left, Neighbor::new("004", 2.0).unwrap());

        assert_eq!(node.validate(), Err(NodeError::SelfReference("004".into())));
    }

    #[test]
    fn tags_merge_list_entries() {
        let tags: NodeTags =
            serde_json::from_value(json!([{"Aula": ["15A"]}, {"Aula": ["15A", "16A"]}, "Cafetín"]))
                .unwrap();

        assert_eq!(tags.labels("Aula"), ["15A".to_string(), "16A".to_string()]);
        assert!(tags.labels("Cafetín").is_empty());
        assert_eq!(tags.categories().count(), 2);
    }

    #[test]
    fn search_matches_tags_and_location() {
        let mut node: Node = serde_json::from_value(mock_node()).unwrap();
        node.location = Some("Edificio A".into());

        assert!(node.matches("15a"));
        assert!(node.matches("edificio"));
        assert!(node.matches(""));
        assert!(!node.matches("biblioteca"));
    }

    #[test]
    fn status_levels_use_uppercase_wire_names() {
        let status: NodeStatus =
            serde_json::from_value(json!({"name": "001", "status": "WARNING"})).unwrap();
        assert_eq!(status.status, StatusLevel::Warning);
        assert!(status.reasons.is_empty());
    }

    #[test]
    fn direction_opposites() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_eq!(Direction::from_index(d.index()), Some(d));
        }
    }

    #[test]
    fn minimap_accepts_fractional_coordinates() {
        let mut value = mock_node();
        value["minimap"] = json!({"url_image": "map.png", "x": 120.5, "y": 33});

        let node: Node = serde_json::from_value(value).unwrap();

        let minimap = node.minimap.unwrap();
        assert_eq!((minimap.x, minimap.y), (120.5, 33.0));
    }

    #[test]
    fn node_list_skips_broken_entries() {
        let list: NodeList = serde_json::from_value(json!([
            mock_node(),
            {"name": "bad", "url_image": "b.jpg", "adyacent_nodes": [{"001": 0}]},
            {"url_image": "c.jpg"},
            {"name": "004", "url_image": "d.jpg"}
        ]))
        .unwrap();

        let names: Vec<_> = list.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["001", "004"]);
        assert_eq!(list.rejected.len(), 2);
        assert_eq!(list.rejected[0].name.as_deref(), Some("bad"));
        assert_eq!(list.rejected[1].name, None);
    }

    #[test]
    fn validate_requires_panorama() {
        assert_eq!(Node::new("001", " ").validate(), Err(NodeError::EmptyImage));
        assert_eq!(Node::new("001", "a.jpg").validate(), Ok(()));
    }
}
