//! 转换主流程与并行调度
//!
//! 每个文件：读取 → 扫描 → 改写/转义/渲染 → 推导输出路径 → 写出 → 一致性统计。
//! 前半段（读取到渲染）无共享状态，可在 Rayon 线程池中并行；
//! 写出与一致性统计始终在调用线程上按遍历顺序串行执行。
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{ConvertError, ConvertResult};
use crate::options::{ConvertOptions, ConvertStats, FileReport, Settings};
use crate::render::render_document;
use crate::scanner::ProtocolError;
use crate::tracker::ConsistencyTracker;

/// 转换目录树：`input_root` 下的每个文件转换为 `output_root` 下的 JSON 文件
pub fn convert_dir(input_root: &Path, output_root: &Path, opts: &ConvertOptions) -> Result<ConvertStats> {
    let settings = opts.compile().context("invalid configuration")?;
    let mut converter = Converter::new(settings, ConsistencyTracker::new());
    converter.run(input_root, output_root)
}

/// 单文件预处理结果（工作线程 → 写出线程）
#[derive(Debug)]
enum Outcome {
    /// 被扩展名或大小过滤
    Skipped,
    /// 没有任何块：不写文件，也不建目录
    Empty { input: PathBuf, errors: Vec<ProtocolError> },
    Rendered(Rendered),
    Failed(ConvertError),
}

#[derive(Debug)]
struct Rendered {
    input: PathBuf,
    relative: PathBuf,
    output: PathBuf,
    document: String,
    blocks: usize,
    errors: Vec<ProtocolError>,
}

pub struct Converter {
    settings: Arc<Settings>,
    tracker: ConsistencyTracker,
}

impl Converter {
    pub fn new(settings: Settings, tracker: ConsistencyTracker) -> Self {
        Self { settings: Arc::new(settings), tracker }
    }

    pub fn tracker(&self) -> &ConsistencyTracker {
        &self.tracker
    }

    /// 遍历并转换整棵目录树。根目录问题为致命错误，单文件错误只记录并跳过。
    pub fn run(&mut self, input_root: &Path, output_root: &Path) -> Result<ConvertStats> {
        if !input_root.is_dir() {
            return Err(ConvertError::InputRoot(input_root.to_path_buf()).into());
        }
        std::fs::create_dir_all(output_root).map_err(|source| ConvertError::OutputRoot {
            path: output_root.to_path_buf(),
            source,
        })?;

        let mut stats = ConvertStats::default();
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(input_root).sort_by_file_name() {
            match entry {
                Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
                Ok(_) => {}
                Err(err) => {
                    error!(root = %input_root.display(), "walk input dir: {err}");
                    stats.files_failed += 1;
                }
            }
        }
        stats.files_seen = files.len();

        let threads = self.settings.threads;
        if threads > 1 && files.len() > 1 {
            self.run_parallel(input_root, output_root, files, threads, &mut stats)?;
        } else {
            for path in &files {
                let outcome = prepare(&self.settings, input_root, path);
                self.commit(output_root, outcome, &mut stats);
            }
        }

        info!(
            files = stats.files_seen,
            written = stats.files_written,
            skipped = stats.files_skipped,
            failed = stats.files_failed,
            discrepancies = stats.discrepancies.len(),
            "conversion finished"
        );
        Ok(stats)
    }

    /// 并行调度：
    /// - Rayon 线程池并行完成读取、扫描与渲染
    /// - 当前线程按 idx 重排后串行写出，保证输出与一致性统计顺序稳定
    fn run_parallel(
        &mut self,
        input_root: &Path,
        output_root: &Path,
        files: Vec<PathBuf>,
        threads: usize,
        stats: &mut ConvertStats,
    ) -> Result<()> {
        use crossbeam_channel as channel;
        use rayon::prelude::*;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("build rayon pool")?;

        let (tx, rx) = channel::bounded::<(usize, Outcome)>(256);
        let settings = Arc::clone(&self.settings);
        let root = input_root.to_path_buf();

        let scan_thread = std::thread::spawn(move || {
            pool.install(|| {
                files.par_iter().enumerate().for_each(|(idx, path)| {
                    let _ = tx.send((idx, prepare(&settings, &root, path)));
                });
            });
            // 所有 Sender 在此丢弃，Receiver 随之收到关闭信号
        });

        let mut next_idx: usize = 0;
        let mut buffer: BTreeMap<usize, Outcome> = BTreeMap::new();
        while let Ok((idx, outcome)) = rx.recv() {
            buffer.insert(idx, outcome);
            while let Some(outcome) = buffer.remove(&next_idx) {
                self.commit(output_root, outcome, stats);
                next_idx += 1;
            }
        }

        if scan_thread.join().is_err() {
            anyhow::bail!("conversion worker panicked");
        }
        Ok(())
    }

    /// 写出渲染结果并更新一致性统计（只在调用线程执行）
    fn commit(&mut self, output_root: &Path, outcome: Outcome, stats: &mut ConvertStats) {
        let rendered = match outcome {
            Outcome::Skipped => {
                stats.files_skipped += 1;
                return;
            }
            Outcome::Empty { input, errors } => {
                log_protocol_errors(&input, &errors);
                debug!(input = %input.display(), "no blocks found, skipped");
                stats.files_skipped += 1;
                stats.errors_total += errors.len();
                return;
            }
            Outcome::Failed(err) => {
                error!("{err}");
                stats.files_failed += 1;
                return;
            }
            Outcome::Rendered(r) => r,
        };

        log_protocol_errors(&rendered.input, &rendered.errors);

        let out_path = output_root.join(&rendered.output);
        if let Err(err) = write_output(&out_path, &rendered.document) {
            error!("{err}");
            stats.files_failed += 1;
            return;
        }

        let errors = rendered.errors.len();
        info!(
            input = %rendered.input.display(),
            output = %out_path.display(),
            blocks = rendered.blocks,
            errors,
            "converted"
        );

        let dir = rendered.relative.parent().unwrap_or(Path::new(""));
        if let Some(d) = self.tracker.record(dir, rendered.blocks) {
            error!(
                input = %rendered.input.display(),
                expected = d.expected,
                actual = d.actual,
                "blocks mismatched in {}",
                d.dir.display()
            );
            stats.discrepancies.push(d);
        }

        stats.files_written += 1;
        stats.blocks_total += rendered.blocks;
        stats.errors_total += errors;
        stats.files.push(FileReport { input: rendered.input, output: out_path, blocks: rendered.blocks, errors });
    }
}

/// 读取、扫描并渲染单个文件（无共享可变状态，可在任意线程执行）
fn prepare(settings: &Settings, input_root: &Path, path: &Path) -> Outcome {
    if !settings.is_included(path) {
        debug!(path = %path.display(), "ignored");
        return Outcome::Skipped;
    }
    if let Some(max) = settings.max_file_size {
        if let Ok(md) = std::fs::metadata(path) {
            if md.len() > max {
                debug!(path = %path.display(), size = md.len(), "larger than max file size, ignored");
                return Outcome::Skipped;
            }
        }
    }

    let relative = match path.strip_prefix(input_root) {
        Ok(r) => r.to_path_buf(),
        Err(_) => {
            return Outcome::Failed(ConvertError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path is outside input root"),
            })
        }
    };

    let content = match read_content(path) {
        Ok(c) => c,
        Err(err) => return Outcome::Failed(err),
    };

    let scan = settings.tokens.scan(&content);
    if scan.blocks.is_empty() {
        return Outcome::Empty { input: path.to_path_buf(), errors: scan.errors };
    }

    let output = settings.resolver.resolve(&relative);
    let document = render_document(&scan.blocks);
    Outcome::Rendered(Rendered {
        input: path.to_path_buf(),
        relative,
        output,
        document,
        blocks: scan.blocks.len(),
        errors: scan.errors,
    })
}

/// 读取文件文本；非 UTF-8 内容做有损转换并告警
fn read_content(path: &Path) -> ConvertResult<String> {
    let raw = std::fs::read(path).map_err(|source| ConvertError::Read { path: path.to_path_buf(), source })?;
    match String::from_utf8(raw) {
        Ok(s) => Ok(s),
        Err(e) => {
            warn!(path = %path.display(), "file is not valid UTF-8, converted lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// 创建父目录并写出文件
fn write_output(path: &Path, document: &str) -> ConvertResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConvertError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let write_err = |source: std::io::Error| ConvertError::Write { path: path.to_path_buf(), source };
    let mut out = BufWriter::new(File::create(path).map_err(write_err)?);
    out.write_all(document.as_bytes()).map_err(write_err)?;
    let file = out.into_inner().map_err(|e| write_err(e.into_error()))?;
    file.sync_all().map_err(write_err)?;
    Ok(())
}

fn log_protocol_errors(input: &Path, errors: &[ProtocolError]) {
    for e in errors {
        warn!(input = %input.display(), offset = e.offset, "{e}");
    }
}
