//! 表单状态管理模块
//!
//! 将零散的 signal 整合为 `NodeFormState`，负责：
//! - 数据的持有
//! - 数据的重置
//! - 数据到 `Node` 的转换（经由纯数据的 `NodeDraft`）

use std::collections::BTreeSet;

use leptos::prelude::*;
use unet360_shared::node::{DEFAULT_WEIGHT, SLOT_COUNT};
use unet360_shared::{Direction, Neighbor, Node, NodeError};

/// 表单某一时刻的快照
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeDraft {
    pub name: String,
    pub location: String,
    pub url_image: String,
    /// 每个方向的邻居名与权重，名称为空表示该槽为空
    pub slots: [(String, f64); SLOT_COUNT],
    /// (分类, 子标签)
    pub tags: BTreeSet<(String, String)>,
}

impl NodeDraft {
    pub fn into_node(self) -> Result<Node, NodeError> {
        let mut node = Node::new(self.name.trim(), self.url_image.trim());
        let location = self.location.trim();
        node.location = (!location.is_empty()).then(|| location.to_string());

        for (direction, (neighbor, weight)) in Direction::ALL.into_iter().zip(self.slots) {
            let neighbor = neighbor.trim();
            if neighbor.is_empty() {
                continue;
            }
            node.adjacent_nodes
                .set(direction, Neighbor::new(neighbor, weight)?);
        }

        for (category, label) in self.tags {
            node.tags.insert(category, vec![label]);
        }

        node.validate()?;
        Ok(node)
    }
}

/// 表单状态结构体
///
/// 使用 `RwSignal` 因为它实现了 `Copy` trait，非常适合作为 Props 在组件间传递。
#[derive(Clone, Copy)]
pub struct NodeFormState {
    pub name: RwSignal<String>,
    pub location: RwSignal<String>,
    pub url_image: RwSignal<String>,
    /// 上传后服务端返回的存储路径，替换或放弃时用于删除
    pub uploaded_path: RwSignal<Option<String>>,
    pub neighbors: [RwSignal<String>; SLOT_COUNT],
    pub weights: [RwSignal<f64>; SLOT_COUNT],
    pub tags: RwSignal<BTreeSet<(String, String)>>,
}

impl NodeFormState {
    /// 创建新的表单状态，所有字段使用默认值
    pub fn new() -> Self {
        Self {
            name: RwSignal::new(String::new()),
            location: RwSignal::new(String::new()),
            url_image: RwSignal::new(String::new()),
            uploaded_path: RwSignal::new(None),
            neighbors: std::array::from_fn(|_| RwSignal::new(String::new())),
            weights: std::array::from_fn(|_| RwSignal::new(DEFAULT_WEIGHT)),
            tags: RwSignal::new(BTreeSet::new()),
        }
    }

    /// 重置表单到初始状态
    pub fn reset(&self) {
        self.name.set(String::new());
        self.location.set(String::new());
        self.url_image.set(String::new());
        self.uploaded_path.set(None);
        for slot in self.neighbors {
            slot.set(String::new());
        }
        for weight in self.weights {
            weight.set(DEFAULT_WEIGHT);
        }
        self.tags.set(BTreeSet::new());
    }

    pub fn toggle_tag(&self, category: &str, label: &str) {
        let key = (category.to_string(), label.to_string());
        self.tags.update(|tags| {
            if !tags.remove(&key) {
                tags.insert(key);
            }
        });
    }

    pub fn draft(&self) -> NodeDraft {
        NodeDraft {
            name: self.name.get_untracked(),
            location: self.location.get_untracked(),
            url_image: self.url_image.get_untracked(),
            slots: std::array::from_fn(|i| {
                (self.neighbors[i].get_untracked(), self.weights[i].get_untracked())
            }),
            tags: self.tags.get_untracked(),
        }
    }
}

impl Default for NodeFormState {
    fn default() -> Self {
        Self::new()
    }
}
