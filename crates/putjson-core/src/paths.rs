//! 输出路径推导
//!
//! 规则（相对输入根目录的路径 → 相对输出根目录的路径）：
//! - 只对文件名做正则匹配，取第一个匹配中的命名捕获组，再查替换表；
//! - 文件位于根目录：`<code>/<去扩展名的文件名>.json`；
//! - 文件位于子目录 `dir`：`<dir><suffix>/<code>/<dir>.json`；
//! - 没有捕获：原相对路径，扩展名换成 `.json`。
use regex::Regex;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const JSON_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct PathResolver {
    matcher: Regex,
    group: String,
    replacements: BTreeMap<String, String>,
    suffix: String,
}

impl PathResolver {
    pub fn new(matcher: Regex, group: impl Into<String>, replacements: BTreeMap<String, String>, suffix: impl Into<String>) -> Self {
        Self { matcher, group: group.into(), replacements, suffix: suffix.into() }
    }

    /// 从文件名中提取代码段（已应用替换表）；无匹配或该命名组未参与匹配时返回 None。
    /// 空捕获仍算捕获：代码段为空，但子目录后缀规则照常生效。
    pub fn capture(&self, file_name: &str) -> Option<String> {
        let caps = self.matcher.captures(file_name)?;
        let raw = caps.name(&self.group)?.as_str();
        match self.replacements.get(raw) {
            Some(replacer) => {
                debug!(code = raw, replacer = replacer.as_str(), "replace language code");
                Some(replacer.clone())
            }
            None => Some(raw.to_string()),
        }
    }

    pub fn resolve(&self, relative: &Path) -> PathBuf {
        let code = relative
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.capture(n));
        let Some(code) = code else {
            return relative.with_extension(JSON_EXT);
        };

        let (mut out, name) = match relative.parent().filter(|d| !d.as_os_str().is_empty()) {
            None => {
                let stem = relative.file_stem().unwrap_or(relative.as_os_str());
                (PathBuf::new(), stem.to_os_string())
            }
            Some(dir) => {
                let mut out_dir = dir.as_os_str().to_os_string();
                out_dir.push(&self.suffix);
                (PathBuf::from(out_dir), dir.as_os_str().to_os_string())
            }
        };
        if !code.is_empty() {
            out.push(code);
        }
        out.push(with_json_ext(name));
        out
    }
}

/// 直接追加 `.json`（不能用 `with_extension`，名字里可能本来就有点号）
fn with_json_ext(mut name: OsString) -> OsString {
    name.push(".");
    name.push(JSON_EXT);
    name
}
