use crate::backup_manager::BackupMetadata;
use crate::patcher::{FileReport, FileStatus};
use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::IsTerminal;

pub struct ReportFormatter;

impl ReportFormatter {
    /// Auto-detect if we should use colors
    fn should_use_color() -> bool {
        // Check NO_COLOR env var (https://no-color.org/)
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        std::io::stdout().is_terminal()
    }

    pub fn format_dry_run_header() -> String {
        let use_color = Self::should_use_color();
        if use_color {
            format!("{}\n", "DRY RUN - no files will be modified".bold().yellow())
        } else {
            "DRY RUN - no files will be modified\n".to_string()
        }
    }

    /// Unified diff of one file's preview, with `context` unchanged lines
    /// around each change group.
    pub fn format_diff(report: &FileReport, context: usize) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        let path = report.path.display().to_string();
        if use_color {
            output.push_str(&format!("{}\n", path.bold().cyan()));
        } else {
            output.push_str(&format!("{}\n", path));
        }

        let diff = TextDiff::from_lines(report.original.as_str(), report.patched.as_str());

        for (group_idx, group) in diff.grouped_ops(context).iter().enumerate() {
            if group_idx > 0 {
                if use_color {
                    output.push_str(&format!("{}\n", "...".dimmed()));
                } else {
                    output.push_str("...\n");
                }
            }

            for op in group {
                for change in diff.iter_changes(op) {
                    let line_num = change
                        .old_index()
                        .or(change.new_index())
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    let content = change.value().trim_end_matches('\n');

                    let formatted = match (change.tag(), use_color) {
                        (ChangeTag::Delete, true) => {
                            format!("L{}: {} {}\n", line_num, "-".red().bold(), content.red())
                        }
                        (ChangeTag::Insert, true) => {
                            format!("L{}: {} {}\n", line_num, "+".green().bold(), content.green().bold())
                        }
                        (ChangeTag::Equal, true) => {
                            format!("L{}: {} {}\n", line_num, "=".dimmed(), content.dimmed())
                        }
                        (ChangeTag::Delete, false) => format!("L{}: - {}\n", line_num, content),
                        (ChangeTag::Insert, false) => format!("L{}: + {}\n", line_num, content),
                        (ChangeTag::Equal, false) => format!("L{}: = {}\n", line_num, content),
                    };
                    output.push_str(&formatted);
                }
            }
        }

        // Per-pass accounting below the diff
        for pass in &report.passes {
            let note = if pass.guard_hit {
                format!("  {}: already applied, skipped\n", pass.rule)
            } else if pass.replacements > 0 {
                format!(
                    "  {}: {} replacement{}\n",
                    pass.rule,
                    pass.replacements,
                    if pass.replacements == 1 { "" } else { "s" }
                )
            } else {
                continue;
            };

            if use_color {
                output.push_str(&note.dimmed().to_string());
            } else {
                output.push_str(&note);
            }
        }

        output
    }

    /// Run summary in the shape of the apply loop's outcome lists.
    pub fn format_summary(reports: &[FileReport]) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        let updated: Vec<&FileReport> = reports
            .iter()
            .filter(|r| r.status == FileStatus::Updated)
            .collect();
        let unchanged: Vec<&FileReport> = reports
            .iter()
            .filter(|r| r.status == FileStatus::Unchanged)
            .collect();
        let missing: Vec<&FileReport> = reports
            .iter()
            .filter(|r| r.status == FileStatus::Missing)
            .collect();
        let failed: Vec<&FileReport> = reports
            .iter()
            .filter(|r| matches!(r.status, FileStatus::Failed(_)))
            .collect();

        output.push_str("\nSummary:\n");

        if !updated.is_empty() {
            let header = format!("  Updated ({}):\n", updated.len());
            if use_color {
                output.push_str(&header.green().bold().to_string());
            } else {
                output.push_str(&header);
            }
            for report in &updated {
                output.push_str(&format!(
                    "    {} ({} replacement{})\n",
                    report.path.display(),
                    report.total_replacements(),
                    if report.total_replacements() == 1 { "" } else { "s" }
                ));
            }
        }

        if !unchanged.is_empty() {
            let header = format!("  Unchanged ({}):\n", unchanged.len());
            if use_color {
                output.push_str(&header.dimmed().to_string());
            } else {
                output.push_str(&header);
            }
            for report in &unchanged {
                output.push_str(&format!("    {}\n", report.path.display()));
            }
        }

        if !missing.is_empty() {
            let header = format!("  Missing ({}):\n", missing.len());
            if use_color {
                output.push_str(&header.yellow().to_string());
            } else {
                output.push_str(&header);
            }
            for report in &missing {
                output.push_str(&format!("    {}\n", report.path.display()));
            }
        }

        if !failed.is_empty() {
            let header = format!("  Failed ({}):\n", failed.len());
            if use_color {
                output.push_str(&header.red().bold().to_string());
            } else {
                output.push_str(&header);
            }
            for report in &failed {
                if let FileStatus::Failed(err) = &report.status {
                    output.push_str(&format!("    {}: {}\n", report.path.display(), err));
                }
            }
        }

        output
    }

    /// Short reminder of the manual follow-up the patch does not cover.
    pub fn format_next_steps() -> String {
        let mut output = String::new();
        output.push_str("\nNext steps:\n");
        output.push_str("  1. Restart the API server so the patched views are reloaded\n");
        output.push_str("  2. Verify unauthenticated requests now return 401\n");
        output
    }

    pub fn format_history(backups: Vec<BackupMetadata>) -> String {
        if backups.is_empty() {
            return "No backups found.\n".to_string();
        }

        let mut output = String::new();

        for backup in backups.iter().rev() {
            output.push_str(&format!(
                "{}  {}  {} ({} file{})\n",
                backup.id,
                backup.timestamp.format("%Y-%m-%d %H:%M:%S"),
                backup.label,
                backup.files.len(),
                if backup.files.len() == 1 { "" } else { "s" }
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::PassResult;
    use std::path::PathBuf;

    fn report(status: FileStatus, replacements: usize) -> FileReport {
        FileReport {
            path: PathBuf::from("views.py"),
            status,
            passes: vec![PassResult {
                rule: "allow-any-swap",
                replacements,
                guard_hit: false,
            }],
            original: "permission_classes = [AllowAny]\n".to_string(),
            patched: "permission_classes = [IsAuthenticated]\n".to_string(),
        }
    }

    #[test]
    fn test_summary_buckets_by_status() {
        let reports = vec![
            report(FileStatus::Updated, 2),
            report(FileStatus::Unchanged, 0),
            report(FileStatus::Missing, 0),
            report(FileStatus::Failed("boom".to_string()), 0),
        ];

        let summary = ReportFormatter::format_summary(&reports);
        assert!(summary.contains("Updated (1)"));
        assert!(summary.contains("Unchanged (1)"));
        assert!(summary.contains("Missing (1)"));
        assert!(summary.contains("Failed (1)"));
        assert!(summary.contains("boom"));
    }

    #[test]
    fn test_diff_shows_both_sides_of_change() {
        let r = report(FileStatus::Updated, 1);
        let diff = ReportFormatter::format_diff(&r, 2);

        assert!(diff.contains("views.py"));
        assert!(diff.contains("permission_classes = [AllowAny]"));
        assert!(diff.contains("permission_classes = [IsAuthenticated]"));
        assert!(diff.contains("1 replacement"));
    }

    #[test]
    fn test_history_empty() {
        let output = ReportFormatter::format_history(Vec::new());
        assert_eq!(output, "No backups found.\n");
    }
}
