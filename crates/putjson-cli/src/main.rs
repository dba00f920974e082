use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use putjson_core::{load_options, parse_replacements, ConvertOptions, ConvertStats, Converter, ConsistencyTracker};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "putjson", version, about = "Extract delimited blocks from text templates into JSON files")]
struct Cli {
    /// 输出调试日志（等价于 RUST_LOG=debug）
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 转换输入目录下的全部文件
    Convert {
        /// 输入目录
        #[arg(long)]
        input: PathBuf,

        /// 输出目录（不存在则创建）
        #[arg(long)]
        output: PathBuf,

        /// 配置文件（TOML）；命令行参数优先
        #[arg(long)]
        config: Option<PathBuf>,

        /// 块起始分隔符（默认 "{{"）
        #[arg(long)]
        start_token: Option<String>,

        /// 块结束分隔符（默认 "}}"）
        #[arg(long)]
        end_token: Option<String>,

        /// 文件名匹配正则（含命名捕获组）
        #[arg(long)]
        file_matcher: Option<String>,

        /// 语言代码所在的命名捕获组（默认 language）
        #[arg(long)]
        capture_group: Option<String>,

        /// 语言代码替换对，逗号分隔：source1=replacer1,source2=replacer2
        #[arg(long)]
        lang_replace: Option<String>,

        /// 子目录输出后缀（默认 "-out"）
        #[arg(long)]
        out_suffix: Option<String>,

        /// 只处理这些扩展名（可重复）
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// 最大文件大小（字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        /// 线程数（"auto"=CPU 核心数；1=串行）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 运行摘要输出文件（JSON）
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            start_token,
            end_token,
            file_matcher,
            capture_group,
            lang_replace,
            out_suffix,
            extensions,
            max_file_size,
            threads,
            summary,
        } => {
            info!(?input, ?output, "starting conversion");

            let mut opts = match &config {
                Some(path) => load_options(path).context("load config file")?,
                None => ConvertOptions::default(),
            };
            // 命令行参数覆盖配置文件
            if let Some(v) = start_token { opts.start_token = v; }
            if let Some(v) = end_token { opts.end_token = v; }
            if let Some(v) = file_matcher { opts.file_matcher = v; }
            if let Some(v) = capture_group { opts.capture_group = v; }
            if let Some(v) = lang_replace { opts.lang_replace = parse_replacements(&v); }
            if let Some(v) = out_suffix { opts.out_suffix = v; }
            if !extensions.is_empty() { opts.extensions = extensions; }
            if max_file_size.is_some() { opts.max_file_size = max_file_size; }
            if let Some(n) = parse_threads(&threads) { opts.threads = Some(n); }

            let settings = opts.compile().context("invalid configuration")?;
            let mut converter = Converter::new(settings, ConsistencyTracker::new());
            let stats = converter.run(&input, &output).context("conversion failed")?;

            if let Some(path) = summary {
                write_summary(&path, &stats)?;
            }

            info!(
                files_written = stats.files_written,
                blocks = stats.blocks_total,
                errors = stats.errors_total,
                discrepancies = stats.discrepancies.len(),
                "done"
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // RUST_LOG 优先；否则 -v 为 debug，默认 info
    let fallback = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数："auto" 或非法值返回 None（交由配置或 CPU 核数决定）
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

fn write_summary(path: &Path, stats: &ConvertStats) -> Result<()> {
    let mut out = BufWriter::new(File::create(path).context("create summary file")?);
    serde_json::to_writer_pretty(&mut out, stats).context("write summary")?;
    writeln!(out)?;
    out.flush().context("flush summary")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_argument() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("AUTO"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("many"), None);
    }

    #[test]
    fn cli_parses_convert_flags() {
        let cli = Cli::try_parse_from([
            "putjson", "-v", "convert", "--input", "in", "--output", "out",
            "--lang-replace", "en=eng", "--ext", "txt", "--ext", "tpl", "--threads", "2",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Convert { input, extensions, lang_replace, threads, .. } => {
                assert_eq!(input, PathBuf::from("in"));
                assert_eq!(extensions, vec!["txt", "tpl"]);
                assert_eq!(lang_replace.as_deref(), Some("en=eng"));
                assert_eq!(threads, "2");
            }
        }
    }
}
