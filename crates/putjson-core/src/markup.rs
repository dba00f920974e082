//! 块内行内标记改写：`@@text@@` → `<b class="block_00_0">text</b>`
//!
//! 序号按块独立从 0 计数；最后一个完整配对之后残留的单个标记原样保留。

/// 行内强调标记
pub const INLINE_TAG: &str = "@@";

/// 改写块内的成对标记（尚未做 JSON 转义）
pub fn transform(block_name: &str, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut index = 0usize;

    while let Some(open) = rest.find(INLINE_TAG) {
        let inner = &rest[open + INLINE_TAG.len()..];
        let Some(close) = inner.find(INLINE_TAG) else { break };
        out.push_str(&rest[..open]);
        out.push_str(&format!("<b class=\"{block_name}_{index}\">{}</b>", &inner[..close]));
        rest = &inner[close + INLINE_TAG.len()..];
        index += 1;
    }
    out.push_str(rest);
    out
}
