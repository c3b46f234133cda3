// src/client/lines.rs

//! 把响应缓冲区按行拆分。
//!
//! 以 `\n` 分隔，每行去掉一个结尾的 `\r`，按 UTF-8 宽松解码。
//! 最后一个换行符之后不会产生额外的空行，因此空行只可能是真正的分隔行。

#[derive(Debug, Clone, Default)]
pub struct LineSplitter {
    lines: Vec<String>,
}

impl LineSplitter {
    pub fn new(buffer: &[u8]) -> Self {
        let mut lines: Vec<String> = buffer
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();

        if buffer.ends_with(b"\n") || buffer.is_empty() {
            lines.pop();
        }

        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}
