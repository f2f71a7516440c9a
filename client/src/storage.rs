use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ClientResult;

// =========================================================
// Cookie
// =========================================================

/// 要写入 `document.cookie` 的单个 Cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// `Some(0)` 表示删除
    pub max_age: Option<u32>,
}

impl Cookie {
    pub fn session(name: &str, value: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: path.to_string(),
            max_age: None,
        }
    }

    pub fn expired(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            path: path.to_string(),
            max_age: Some(0),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.max_age == Some(0)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age)?;
        }
        write!(f, "; path={}", self.path)
    }
}

/// 从 `document.cookie` 形式的字符串中取出指定 Cookie，空值视为不存在
pub fn parse_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// =========================================================
// 持久化抽象
// =========================================================

/// Cookie 读写
pub trait CookieJar {
    fn read(&self, name: &str) -> Option<String>;
    fn write(&self, cookie: &Cookie) -> ClientResult<()>;
}

/// 会话级的一次性标记（浏览器中为 sessionStorage）
pub trait MarkerStore {
    fn mark(&self, key: &str) -> ClientResult<()>;
    /// 读取并清除，返回标记此前是否存在
    fn take(&self, key: &str) -> ClientResult<bool>;
}

// =========================================================
// 内存实现 (测试与原生环境)
// =========================================================

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: RefCell<HashMap<String, String>>,
    /// 写入历史，按 `Display` 格式记录
    writes: RefCell<Vec<String>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(name: &str, value: &str) -> Self {
        let jar = Self::default();
        jar.cookies
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        jar
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }
}

impl CookieJar for MemoryCookieJar {
    fn read(&self, name: &str) -> Option<String> {
        self.cookies
            .borrow()
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn write(&self, cookie: &Cookie) -> ClientResult<()> {
        self.writes.borrow_mut().push(cookie.to_string());
        let mut cookies = self.cookies.borrow_mut();
        if cookie.is_expired() {
            cookies.remove(&cookie.name);
        } else {
            cookies.insert(cookie.name.clone(), cookie.value.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    marks: RefCell<HashSet<String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.marks.borrow().contains(key)
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn mark(&self, key: &str) -> ClientResult<()> {
        self.marks.borrow_mut().insert(key.to_string());
        Ok(())
    }

    fn take(&self, key: &str) -> ClientResult<bool> {
        Ok(self.marks.borrow_mut().remove(key))
    }
}

impl<T: CookieJar + ?Sized> CookieJar for std::rc::Rc<T> {
    fn read(&self, name: &str) -> Option<String> {
        (**self).read(name)
    }

    fn write(&self, cookie: &Cookie) -> ClientResult<()> {
        (**self).write(cookie)
    }
}

impl<T: MarkerStore + ?Sized> MarkerStore for std::rc::Rc<T> {
    fn mark(&self, key: &str) -> ClientResult<()> {
        (**self).mark(key)
    }

    fn take(&self, key: &str) -> ClientResult<bool> {
        (**self).take(key)
    }
}
