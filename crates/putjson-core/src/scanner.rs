//! 分隔符扫描（单次前向扫描 + 显式状态机）
//!
//! - 起止两个字面量构建一个 leftmost-longest 的 Aho-Corasick 自动机；
//!   同一位置两者都能匹配时取更长者，结果确定。
//! - 非法序列（嵌套 Start、孤立 End、未闭合 Start）只计数并继续扫描，不中止。
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use thiserror::Error;

use crate::error::{ConvertError, ConvertResult};

/// 错误上下文截取半径（字节，按字符边界修正）
const CONTEXT_RADIUS: usize = 10;

/// 分隔符角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Start,
    End,
}

/// 起止分隔符表（模式 0 = Start，模式 1 = End）
#[derive(Debug, Clone)]
pub struct TokenTable {
    start: String,
    end: String,
    ac: AhoCorasick,
}

impl TokenTable {
    pub fn new(start: &str, end: &str) -> ConvertResult<Self> {
        if start.is_empty() {
            return Err(ConvertError::EmptyToken("start"));
        }
        if end.is_empty() {
            return Err(ConvertError::EmptyToken("end"));
        }
        if start == end {
            return Err(ConvertError::SameTokens(start.to_string()));
        }
        let ac = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build([start, end])?;
        Ok(Self { start: start.to_string(), end: end.to_string(), ac })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    fn role(&self, pattern: usize) -> TokenRole {
        if pattern == 0 { TokenRole::Start } else { TokenRole::End }
    }

    /// 扫描整段文本，按出现顺序返回块与协议错误
    pub fn scan<'a>(&self, content: &'a str) -> ScanResult<'a> {
        let mut blocks: Vec<Block<'a>> = Vec::new();
        let mut errors: Vec<ProtocolError> = Vec::new();
        let mut state = ScanState::Idle;

        for m in self.ac.find_iter(content) {
            state = match (state, self.role(m.pattern().as_usize())) {
                (ScanState::Idle, TokenRole::Start) => ScanState::InBlock(m.end()),
                (ScanState::InBlock(_), TokenRole::Start) => {
                    // 之前未闭合的块整体丢弃，从新的 Start 重新开始
                    errors.push(ProtocolError::at(ProtocolErrorKind::NestedStart, m.start(), content));
                    ScanState::InBlock(m.end())
                }
                (ScanState::InBlock(open), TokenRole::End) => {
                    blocks.push(Block { index: blocks.len(), text: &content[open..m.start()] });
                    ScanState::Idle
                }
                (ScanState::Idle, TokenRole::End) => {
                    errors.push(ProtocolError::at(ProtocolErrorKind::UnmatchedEnd, m.start(), content));
                    ScanState::Idle
                }
            };
        }

        if let ScanState::InBlock(open) = state {
            let token_at = open - self.start.len();
            errors.push(ProtocolError::at(ProtocolErrorKind::Unterminated, token_at, content));
        }

        ScanResult { blocks, errors }
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Idle,
    /// 块内容起始偏移（紧随 Start 字面量之后）
    InBlock(usize),
}

/// 单个块：零基序号 + 起止分隔符之间的原始文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub index: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolErrorKind {
    #[error("detected start block but previous start is not closed")]
    NestedStart,
    #[error("detected end block but without preceding start")]
    UnmatchedEnd,
    #[error("start block is never closed")]
    Unterminated,
}

/// 协议错误（只用于诊断输出，不会中止扫描）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}, position {offset} in '{context}'")]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    pub offset: usize,
    pub context: String,
}

impl ProtocolError {
    fn at(kind: ProtocolErrorKind, offset: usize, content: &str) -> Self {
        Self { kind, offset, context: excerpt(content, offset) }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult<'a> {
    pub blocks: Vec<Block<'a>>,
    pub errors: Vec<ProtocolError>,
}

impl ScanResult<'_> {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// 截取 `position` 附近约 20 字节的片段；靠近开头时窗口整体右移
fn excerpt(content: &str, position: usize) -> String {
    let mut from = position.saturating_sub(CONTEXT_RADIUS);
    let mut to = (from + 2 * CONTEXT_RADIUS).min(content.len());
    while !content.is_char_boundary(from) {
        from -= 1;
    }
    while !content.is_char_boundary(to) {
        to += 1;
    }
    content[from..to].to_string()
}
