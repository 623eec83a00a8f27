use crate::rules::PatchRule;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Outcome of one substitution pass over one file's content.
#[derive(Debug, Clone, PartialEq)]
pub struct PassResult {
    pub rule: &'static str,
    /// Number of non-overlapping occurrences replaced
    pub replacements: usize,
    /// True when the pass was skipped because its guard text was present
    pub guard_hit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    /// At least one pass replaced something
    Updated,
    /// File was read but no pass changed it
    Unchanged,
    /// Target file does not exist (warn and skip)
    Missing,
    /// Read/patch/write failed; carries the rendered error chain
    Failed(String),
}

/// Everything known about one target after a preview pass. `patched` holds the
/// would-be content; nothing is written until `apply` is called.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub passes: Vec<PassResult>,
    pub original: String,
    pub patched: String,
}

impl FileReport {
    pub fn missing(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Missing,
            passes: Vec::new(),
            original: String::new(),
            patched: String::new(),
        }
    }

    pub fn failed(path: &Path, err: &anyhow::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Failed(format!("{:#}", err)),
            passes: Vec::new(),
            original: String::new(),
            patched: String::new(),
        }
    }

    pub fn total_replacements(&self) -> usize {
        self.passes.iter().map(|p| p.replacements).sum()
    }
}

pub struct Patcher {
    rules: Vec<PatchRule>,
}

impl Patcher {
    pub fn new(rules: Vec<PatchRule>) -> Self {
        Self { rules }
    }

    /// Apply a single pass to content. Guarded passes are a no-op when the
    /// guard text is already present, which is what makes re-runs idempotent.
    pub fn apply_rule(content: &str, rule: &PatchRule) -> Result<(String, PassResult)> {
        if let Some(marker) = rule.skip_if {
            if content.contains(marker) {
                return Ok((
                    content.to_string(),
                    PassResult {
                        rule: rule.name,
                        replacements: 0,
                        guard_hit: true,
                    },
                ));
            }
        }

        let re = rule.compile()?;
        let replacements = re.find_iter(content).count();
        let patched = if replacements == 0 {
            content.to_string()
        } else {
            re.replace_all(content, rule.replacement).into_owned()
        };

        Ok((
            patched,
            PassResult {
                rule: rule.name,
                replacements,
                guard_hit: false,
            },
        ))
    }

    /// Run every pass in order, threading the content through.
    pub fn apply_rules(&self, content: &str) -> Result<(String, Vec<PassResult>)> {
        let mut current = content.to_string();
        let mut passes = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let (next, result) = Self::apply_rule(&current, rule)?;
            current = next;
            passes.push(result);
        }

        Ok((current, passes))
    }

    /// Read a target, run the passes, classify the outcome. Never writes.
    pub fn process_file(&self, path: &Path) -> Result<FileReport> {
        if !path.exists() {
            return Ok(FileReport::missing(path));
        }

        let original = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let (patched, passes) = self.apply_rules(&original)?;

        let status = if patched != original {
            FileStatus::Updated
        } else {
            FileStatus::Unchanged
        };

        Ok(FileReport {
            path: path.to_path_buf(),
            status,
            passes,
            original,
            patched,
        })
    }

    /// Write patched content via a temp file in the target's directory so the
    /// replacement is an atomic rename.
    pub fn write_patched(path: &Path, content: &str) -> Result<()> {
        let parent_dir = path.parent().unwrap_or(Path::new("."));

        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .with_context(|| format!("Failed to create temp file in {}", parent_dir.display()))?;

        temp_file
            .write_all(content.as_bytes())
            .with_context(|| format!("Failed to write patched content for {}", path.display()))?;
        temp_file
            .flush()
            .with_context(|| format!("Failed to flush patched content for {}", path.display()))?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist patched file: {}", path.display()))?;

        Ok(())
    }

    /// Preview then write in one step. Returns the report so callers can log
    /// what happened; files that did not change are not rewritten.
    pub fn apply_to_file(&self, path: &Path) -> Result<FileReport> {
        let report = self.process_file(path)?;

        if report.status == FileStatus::Updated {
            Self::write_patched(path, &report.patched)?;
        }

        Ok(report)
    }
}
