//! 同目录文件块数一致性跟踪（单次运行内有效，不持久化）
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 某目录内文件块数与期望值不一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub dir: PathBuf,
    pub expected: usize,
    pub actual: usize,
}

/// 单个源目录的统计：期望块数（目前见过的最大值）与是否出现过不一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryStats {
    pub expected: usize,
    pub mismatched: bool,
}

#[derive(Debug, Default)]
pub struct ConsistencyTracker {
    dirs: HashMap<PathBuf, DirectoryStats>,
}

impl ConsistencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个已写出的文件；块数为 0 的文件不参与统计
    pub fn record(&mut self, dir: &Path, actual: usize) -> Option<Discrepancy> {
        if actual == 0 {
            return None;
        }
        let stats = self
            .dirs
            .entry(dir.to_path_buf())
            .or_insert(DirectoryStats { expected: actual, mismatched: false });
        if stats.expected == actual {
            return None;
        }
        let discrepancy = Discrepancy { dir: dir.to_path_buf(), expected: stats.expected, actual };
        stats.mismatched = true;
        stats.expected = stats.expected.max(actual);
        Some(discrepancy)
    }

    pub fn expected(&self, dir: &Path) -> Option<usize> {
        self.dirs.get(dir).map(|s| s.expected)
    }

    pub fn stats(&self, dir: &Path) -> Option<DirectoryStats> {
        self.dirs.get(dir).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_and_keeps_the_maximum() {
        let mut t = ConsistencyTracker::new();
        let dir = Path::new("en");
        assert_eq!(t.record(dir, 3), None);
        assert_eq!(t.record(dir, 3), None);
        let d = t.record(dir, 5).expect("discrepancy");
        assert_eq!((d.expected, d.actual), (3, 5));
        assert_eq!(t.stats(dir), Some(DirectoryStats { expected: 5, mismatched: true }));
    }

    #[test]
    fn agreeing_directory_is_not_flagged() {
        let mut t = ConsistencyTracker::new();
        let dir = Path::new("fr");
        t.record(dir, 4);
        t.record(dir, 4);
        assert_eq!(t.stats(dir), Some(DirectoryStats { expected: 4, mismatched: false }));
    }

    #[test]
    fn smaller_count_is_reported_but_does_not_lower_expectation() {
        let mut t = ConsistencyTracker::new();
        let dir = Path::new("de");
        t.record(dir, 5);
        let d = t.record(dir, 2).expect("discrepancy");
        assert_eq!((d.expected, d.actual), (5, 2));
        assert_eq!(t.expected(dir), Some(5));
        // 之后与最大值一致的文件不再报告
        assert_eq!(t.record(dir, 5), None);
    }

    #[test]
    fn directories_are_independent() {
        let mut t = ConsistencyTracker::new();
        t.record(Path::new("a"), 2);
        assert_eq!(t.record(Path::new("b"), 7), None);
        assert_eq!(t.expected(Path::new("a")), Some(2));
    }

    #[test]
    fn zero_blocks_are_ignored() {
        let mut t = ConsistencyTracker::new();
        assert_eq!(t.record(Path::new("x"), 0), None);
        assert_eq!(t.expected(Path::new("x")), None);
    }
}
