//! 转换选项、编译后的设置与统计信息
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};
use crate::paths::PathResolver;
use crate::scanner::TokenTable;
use crate::tracker::Discrepancy;

pub const DEFAULT_FILE_MATCHER: &str = r"\d+_(?P<language>[A-Za-z]{2})_[A-Za-z]{2}_.+.txt";
pub const DEFAULT_CAPTURE_GROUP: &str = "language";
pub const DEFAULT_LANG_REPLACE: &str = "zh=ch,sv=se";

/// 转换选项（可来自 TOML 配置文件，命令行参数覆盖）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// 块起始分隔符
    pub start_token: String,
    /// 块结束分隔符（必须与起始不同）
    pub end_token: String,
    /// 文件名匹配正则
    pub file_matcher: String,
    /// 提取语言代码的命名捕获组
    pub capture_group: String,
    /// 语言代码替换表
    pub lang_replace: BTreeMap<String, String>,
    /// 子目录输出后缀
    pub out_suffix: String,
    /// 只处理这些扩展名（不含点）；为空则处理全部文件
    pub extensions: Vec<String>,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            start_token: "{{".to_string(),
            end_token: "}}".to_string(),
            file_matcher: DEFAULT_FILE_MATCHER.to_string(),
            capture_group: DEFAULT_CAPTURE_GROUP.to_string(),
            lang_replace: parse_replacements(DEFAULT_LANG_REPLACE),
            out_suffix: "-out".to_string(),
            extensions: Vec::new(),
            max_file_size: None,
            threads: None,
        }
    }
}

impl ConvertOptions {
    /// 校验并编译为运行期设置；任何错误在处理文件之前即为致命
    pub fn compile(&self) -> ConvertResult<Settings> {
        let tokens = TokenTable::new(&self.start_token, &self.end_token)?;
        let matcher = Regex::new(&self.file_matcher).map_err(|source| ConvertError::InvalidPattern {
            pattern: self.file_matcher.clone(),
            source,
        })?;
        let resolver = PathResolver::new(matcher, self.capture_group.clone(), self.lang_replace.clone(), self.out_suffix.clone());
        let extensions = self
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        let threads = self.threads.filter(|&n| n >= 1).unwrap_or_else(num_cpus::get);
        Ok(Settings { tokens, resolver, extensions, max_file_size: self.max_file_size, threads })
    }
}

/// 解析 `src1=dst1,src2=dst2` 形式的替换对；缺少 `=` 或键为空的条目忽略
pub fn parse_replacements(s: &str) -> BTreeMap<String, String> {
    s.split(',')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 编译后的运行期设置（只读，可跨线程共享）
#[derive(Debug, Clone)]
pub struct Settings {
    pub tokens: TokenTable,
    pub resolver: PathResolver,
    pub extensions: Vec<String>,
    pub max_file_size: Option<u64>,
    pub threads: usize,
}

impl Settings {
    /// 扩展名过滤（不含大小限制）
    pub fn is_included(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// 单个输出文件的报告
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub blocks: usize,
    pub errors: usize,
}

/// 运行统计信息（便于 CLI 打印或写出摘要）
#[derive(Debug, Default, Clone, Serialize)]
pub struct ConvertStats {
    pub files_seen: usize,
    pub files_skipped: usize,
    pub files_written: usize,
    pub files_failed: usize,
    pub blocks_total: usize,
    pub errors_total: usize,
    pub discrepancies: Vec<Discrepancy>,
    pub files: Vec<FileReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_pairs() {
        let map = parse_replacements("zh=ch,sv=se,bad,=x,a=b=c");
        assert_eq!(map.get("zh").map(String::as_str), Some("ch"));
        assert_eq!(map.get("sv").map(String::as_str), Some("se"));
        assert_eq!(map.get("a").map(String::as_str), Some("b=c"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn defaults_compile() {
        let settings = ConvertOptions::default().compile().unwrap();
        assert_eq!(settings.tokens.start(), "{{");
        assert_eq!(settings.tokens.end(), "}}");
        assert!(settings.threads >= 1);
    }

    #[test]
    fn identical_tokens_are_rejected() {
        let opts = ConvertOptions { end_token: "{{".into(), ..Default::default() };
        assert!(matches!(opts.compile(), Err(ConvertError::SameTokens(_))));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let opts = ConvertOptions { file_matcher: "(unclosed".into(), ..Default::default() };
        assert!(matches!(opts.compile(), Err(ConvertError::InvalidPattern { .. })));
    }

    #[test]
    fn extension_filter() {
        let opts = ConvertOptions { extensions: vec![".txt".into(), "TPL".into()], ..Default::default() };
        let settings = opts.compile().unwrap();
        assert!(settings.is_included(Path::new("a/b.txt")));
        assert!(settings.is_included(Path::new("a/b.tpl")));
        assert!(!settings.is_included(Path::new("a/b.md")));
        assert!(!settings.is_included(Path::new("a/Makefile")));
        assert!(ConvertOptions::default().compile().unwrap().is_included(Path::new("any")));
    }
}
