//! 文本模板 → JSON 转换核心库
//!
//! 设计要点：
//! - 每个文件按起止分隔符切分为有序的块，非法分隔符序列只计数、不中止。
//! - 块内 `@@...@@` 改写为带唯一 class 的片段，再做 JSON 字符串转义。
//! - 输出路径由相对路径推导，可按文件名中的语言代码重新归类目录。
//! - 同一源目录内各文件的块数互相校验，不一致时报告但不视为失败。

mod config;
mod convert;
mod error;
mod escape;
mod markup;
mod options;
mod paths;
mod render;
mod scanner;
mod tracker;

pub use config::load_options;
pub use convert::{convert_dir, Converter};
pub use error::{ConvertError, ConvertResult};
pub use escape::escape_json;
pub use markup::{transform, INLINE_TAG};
pub use options::{parse_replacements, ConvertOptions, ConvertStats, FileReport, Settings, DEFAULT_FILE_MATCHER};
pub use paths::PathResolver;
pub use render::{block_name, key_width, render_document};
pub use scanner::{Block, ProtocolError, ProtocolErrorKind, ScanResult, TokenRole, TokenTable};
pub use tracker::{ConsistencyTracker, DirectoryStats, Discrepancy};
