use anyhow::Result;
use authpatch::backup_manager::BackupManager;
use authpatch::cli::{self, Args};
use authpatch::config::Config;
use authpatch::logger;
use authpatch::patcher::{FileReport, FileStatus, Patcher};
use authpatch::report::ReportFormatter;
use authpatch::rules;
use std::path::PathBuf;

fn main() -> Result<()> {
    match cli::parse_args() {
        Args::Apply {
            files,
            base_dir,
            dry_run,
            context,
            legacy_class_rule,
            no_backup,
            backup_dir,
        } => run_apply(
            files,
            base_dir,
            dry_run,
            context,
            legacy_class_rule,
            no_backup,
            backup_dir,
        ),
        Args::Rollback { id } => rollback(id),
        Args::History => show_history(),
        Args::Status => show_status(),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_apply(
    files: Vec<String>,
    base_dir: Option<String>,
    dry_run: bool,
    context: Option<usize>,
    legacy_class_rule: bool,
    no_backup: bool,
    backup_dir: Option<String>,
) -> Result<()> {
    let config = Config::load()?;
    let _log_guard = logger::init_debug_logging(config.debug_logging())?;

    let targets = resolve_targets(&files, base_dir.as_deref(), &config);

    let mut rule_set = rules::builtin_rules();
    if legacy_class_rule {
        rule_set.push(rules::legacy_class_rule());
    }
    let patcher = Patcher::new(rule_set);

    tracing::info!(targets = targets.len(), dry_run, "starting patch run");

    // Preview every target first; nothing is written until all previews are in
    let mut reports = Vec::new();
    for path in &targets {
        match patcher.process_file(path) {
            Ok(report) => {
                if report.status == FileStatus::Missing {
                    eprintln!("⚠️  File not found, skipping: {}", path.display());
                }
                reports.push(report);
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                reports.push(FileReport::failed(path, &e));
            }
        }
    }

    let changed: Vec<PathBuf> = reports
        .iter()
        .filter(|r| r.status == FileStatus::Updated)
        .map(|r| r.path.clone())
        .collect();

    if changed.is_empty() {
        print!("{}", ReportFormatter::format_summary(&reports));
        println!("\nNo changes needed.");
        return Ok(());
    }

    let context = context.unwrap_or_else(|| config.context_lines());

    if dry_run {
        print!("{}", ReportFormatter::format_dry_run_header());
    }
    for report in reports.iter().filter(|r| r.status == FileStatus::Updated) {
        print!("{}", ReportFormatter::format_diff(report, context));
    }

    if dry_run {
        print!("{}", ReportFormatter::format_summary(&reports));
        return Ok(());
    }

    // Execute mode: apply with backup
    let backup_id = if no_backup {
        None
    } else {
        let mut backup_manager = open_backup_manager(backup_dir.as_deref(), &config)?;
        Some(backup_manager.create_backup("enable-authentication", &changed)?)
    };

    for report in reports.iter_mut().filter(|r| r.status == FileStatus::Updated) {
        match Patcher::write_patched(&report.path, &report.patched) {
            Ok(()) => {
                tracing::info!(
                    file = %report.path.display(),
                    replacements = report.total_replacements(),
                    "patched"
                );
            }
            Err(e) => {
                eprintln!("Error applying to {}: {:#}", report.path.display(), e);
                report.status = FileStatus::Failed(format!("{:#}", e));
            }
        }
    }

    print!("{}", ReportFormatter::format_summary(&reports));

    if let Some(id) = backup_id {
        println!("\nBackup ID: {}", id);
        println!("Rollback with: authpatch rollback {}", id);
    }

    print!("{}", ReportFormatter::format_next_steps());

    Ok(())
}

/// Explicit FILE arguments win; otherwise the configured (or built-in) target
/// list is resolved against the base directory.
fn resolve_targets(files: &[String], base_dir_flag: Option<&str>, config: &Config) -> Vec<PathBuf> {
    if !files.is_empty() {
        return files.iter().map(PathBuf::from).collect();
    }

    let base_dir = base_dir_flag
        .map(PathBuf::from)
        .or_else(|| config.targets.base_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let relative: Vec<PathBuf> = match &config.targets.files {
        Some(files) => files.iter().map(PathBuf::from).collect(),
        None => rules::default_targets(),
    };

    relative.iter().map(|rel| base_dir.join(rel)).collect()
}

fn open_backup_manager(backup_dir_flag: Option<&str>, config: &Config) -> Result<BackupManager> {
    match backup_dir_flag.or(config.backup.backup_dir.as_deref()) {
        Some(dir) => BackupManager::with_directory(dir),
        None => BackupManager::new(),
    }
}

fn rollback(id: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let backup_manager = open_backup_manager(None, &config)?;

    let backup_id = match id {
        Some(id) => id,
        None => match backup_manager.get_last_backup_id()? {
            Some(id) => {
                println!("Rolling back last run: {}\n", id);
                id
            }
            None => {
                anyhow::bail!("No backups found to rollback");
            }
        },
    };

    backup_manager.restore_backup(&backup_id)?;
    println!("\n✅ Rollback complete");

    Ok(())
}

fn show_history() -> Result<()> {
    let config = Config::load()?;
    let backup_manager = open_backup_manager(None, &config)?;
    let backups = backup_manager.list_backups()?;

    print!("{}", ReportFormatter::format_history(backups));

    Ok(())
}

fn show_status() -> Result<()> {
    let config = Config::load()?;
    let backup_manager = open_backup_manager(None, &config)?;
    let backups = backup_manager.list_backups()?;

    println!("Backup directory: {}", backup_manager.backups_dir().display());
    println!("Total backups: {}\n", backups.len());

    if let Some(last) = backups.last() {
        println!("Last run:");
        println!("  ID: {}", last.id);
        println!("  Time: {}", last.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("  Label: {}", last.label);
        println!("  Files: {}", last.files.len());
    }

    Ok(())
}
