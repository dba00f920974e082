//! 错误类型（配置错误在启动期即为致命；单文件 I/O 错误只跳过该文件）
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("start token `{0}` must be different from end token")]
    SameTokens(String),

    #[error("{0} token must not be empty")]
    EmptyToken(&'static str),

    #[error("build token automaton: {0}")]
    TokenAutomaton(#[from] aho_corasick::BuildError),

    #[error("invalid file matcher `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("input directory {0} does not exist or is not a directory")]
    InputRoot(PathBuf),

    #[error("create output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("read file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("create output dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write output file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ConvertResult<T> = Result<T, ConvertError>;
