// src/client/dict.rs

//! qserv 应答字典。
//!
//! 状态行之后的每一行是一条 `key value` 记录（也接受 `key=value` 与 `key: value`），
//! 键可以是 `games/0/name` 这样的层级路径。记录按插入顺序保存，键允许重复，
//! 查找大小写不敏感并返回第一条匹配。

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::trace;

// 键与值之间的分隔符
const SEPARATORS: &[char] = &[' ', '\t', '=', ':'];

/// 有序的键值字典
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDict {
    entries: Vec<(String, String)>,
}

impl ResponseDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析并保存一行；空行被忽略
    pub fn insert_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        let (key, value) = match line.find(SEPARATORS) {
            Some(idx) => {
                let value = line[idx + 1..].trim_start_matches(&[' ', '\t'][..]);
                (&line[..idx], value)
            }
            None => (line, ""),
        };

        trace!(key = key, value = value, "Reply entry added");
        self.insert(key, value);
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    /// 查找第一条匹配的值
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 查找所有匹配的值
    pub fn lookup_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 取出 `prefix/` 下的所有记录，键去掉前缀
    pub fn sub(&self, prefix: &str) -> ResponseDict {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        let entries = self
            .entries
            .iter()
            .filter_map(|(k, v)| {
                let head = k.get(..prefix.len())?;
                if head.eq_ignore_ascii_case(&prefix) {
                    Some((k[prefix.len()..].to_string(), v.clone()))
                } else {
                    None
                }
            })
            .collect();

        ResponseDict { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// 序列化为 JSON 对象；重复的键保留第一条
impl Serialize for ResponseDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.entries.len());
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.entries {
            if seen.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                continue;
            }
            seen.push(key.as_str());
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
