//! 配置文件加载（TOML）
//!
//! 键名与 `ConvertOptions` 字段一致，缺省键取默认值：
//!
//! ```toml
//! start_token = "[["
//! end_token = "]]"
//! out_suffix = "-gen"
//! extensions = ["txt"]
//!
//! [lang_replace]
//! zh = "ch"
//! ```
use std::path::Path;

use crate::error::{ConvertError, ConvertResult};
use crate::options::ConvertOptions;

pub fn load_options(path: &Path) -> ConvertResult<ConvertOptions> {
    let txt = std::fs::read_to_string(path).map_err(|source| ConvertError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&txt).map_err(|source| ConvertError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "start_token = \"[[\"\nend_token = \"]]\"\nthreads = 1\n\n[lang_replace]\nen = \"eng\"").unwrap();
        let opts = load_options(file.path()).unwrap();
        assert_eq!(opts.start_token, "[[");
        assert_eq!(opts.end_token, "]]");
        assert_eq!(opts.threads, Some(1));
        assert_eq!(opts.lang_replace.get("en").map(String::as_str), Some("eng"));
        assert_eq!(opts.out_suffix, "-out");
        assert_eq!(opts.capture_group, "language");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_options(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConvertError::ConfigRead { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "start_token = ").unwrap();
        let err = load_options(file.path()).unwrap_err();
        assert!(matches!(err, ConvertError::ConfigParse { .. }));
    }
}
