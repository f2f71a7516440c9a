use serde::{Deserialize, Serialize};

/// 描述性的分类标签，键即身份
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub icon_name: Option<String>,
    /// 子标签
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon_name: None,
            labels: Vec::new(),
        }
    }
}

/// 节点所属的地点（楼宇、区域）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
