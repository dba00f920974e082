//! 输出 JSON 对象文本（固定格式，手工拼接，不经过序列化器）
//!
//! ```text
//! {
//!   "block_00": "...",
//!   "block_01": "..."
//! }
//! ```
use crate::escape::escape_json;
use crate::markup::transform;
use crate::scanner::Block;

const INDENT: &str = "  ";
/// 键名序号最少两位
const MIN_KEY_WIDTH: usize = 2;

/// 键名零填充宽度：能容纳最大序号的位数，且不少于两位
pub fn key_width(block_count: usize) -> usize {
    let mut largest = block_count.saturating_sub(1);
    let mut digits = 1;
    while largest >= 10 {
        largest /= 10;
        digits += 1;
    }
    digits.max(MIN_KEY_WIDTH)
}

pub fn block_name(index: usize, width: usize) -> String {
    format!("block_{index:0width$}")
}

/// 渲染整个文件的 JSON 文本（含结尾换行）
pub fn render_document(blocks: &[Block<'_>]) -> String {
    let width = key_width(blocks.len());
    let mut out = String::from("{\n");
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        let name = block_name(block.index, width);
        let value = escape_json(&transform(&name, block.text));
        out.push_str(&format!("{INDENT}\"{name}\": \"{value}\""));
    }
    out.push_str("\n}\n");
    out
}
