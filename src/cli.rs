use clap::{Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2025 InkyQuill
License: MIT
Source: https://github.com/InkyQuill/authpatch
Rust Edition: 2024"
);

#[derive(Parser)]
#[command(name = "authpatch")]
#[command(about = "Enable authentication on API view sources, safely")]
#[command(long_about = "authpatch rewrites REST API view sources that still allow anonymous
access: it injects the SessionAuthentication import and replaces every
'permission_classes = [AllowAny]' declaration with session-backed
authentication.

The substitutions are fixed; what you control is where they run and how.
Every modification is previewed as a diff, backed up first, and can be
rolled back with one command. Re-running on an already patched file is a
no-op.

FEATURES:
  • Automatic backups before every modification
  • Dry-run mode to preview changes
  • Easy rollback with one command
  • Colored diff output
  • Idempotent: already patched files are left alone

EXAMPLES:
  authpatch                                Patch the default view files in .
  authpatch --base-dir /srv/hrms           Patch the default files under /srv/hrms
  authpatch api/views.py                   Patch an explicit file instead
  authpatch --dry-run                      Preview without modifying anything
  authpatch --legacy-class-rule old.py     Use the broader class-body pattern
  authpatch rollback                       Undo the last run
  authpatch history                        List previous runs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
#[command(propagate_version = true)]
struct Cli {
    /// Files to patch (defaults to the built-in requisition view list)
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Base directory the default target paths are resolved against
    #[arg(long, value_name = "DIR")]
    #[arg(help = "Resolve the default target list against this directory\nDefault: current directory (or targets.base_dir from config)")]
    base_dir: Option<String>,

    /// Dry run mode (preview changes without applying)
    #[arg(short = 'd', long)]
    #[arg(help = "Preview changes without modifying files")]
    dry_run: bool,

    /// Number of context lines to show (default: 2)
    #[arg(short = 'n', long, value_name = "NUM")]
    #[arg(help = "Number of context lines to show around changes\nUse 0 to show only changed lines")]
    context: Option<usize>,

    /// Also apply the broader class-body substitution
    #[arg(long = "legacy-class-rule")]
    #[arg(help = "Additionally match 'permission_classes = [AllowAny]' through an\nAPIView class header and docstring (older, broader pattern)")]
    legacy_class_rule: bool,

    /// Skip backup creation (requires --force)
    #[arg(long = "no-backup", requires = "force")]
    #[arg(help = "Skip creating a backup (requires --force)\n⚠️  USE WITH CAUTION: Changes cannot be undone!\nRecommended only for files under version control")]
    no_backup: bool,

    /// Force dangerous operations (use with --no-backup)
    #[arg(long = "force", requires = "no_backup")]
    #[arg(help = "Force dangerous operations (required for --no-backup)\nConfirms you understand the risks")]
    force: bool,

    /// Custom backup directory
    #[arg(long, value_name = "DIR")]
    #[arg(help = "Use custom directory for backups\nDefault: ~/.authpatch/backups/")]
    backup_dir: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rollback a previous run
    #[command(long_about = "Restore files from a backup.

If no backup ID is specified, rolls back the most recent run.
Use 'authpatch history' to see all available backups.

EXAMPLES:
  authpatch rollback                       Rollback last run
  authpatch rollback 20250110-120000123-ab Rollback specific backup")]
    Rollback {
        /// Backup ID to rollback (optional, defaults to last run)
        #[arg(value_name = "ID")]
        id: Option<String>,
    },

    /// Show run history
    #[command(long_about = "Display a log of all authpatch runs.

Shows timestamp, rule-set label, files affected, and backup ID for each run.
The most recent runs appear first.

EXAMPLES:
  authpatch history                        Show all runs
  authpatch history | head -10             Show last 10 runs")]
    History,

    /// Show current backup status
    #[command(long_about = "Display backup directory location and the latest run.

EXAMPLES:
  authpatch status                         Show backup status")]
    Status,
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Rollback { id }) => Args::Rollback { id },
        Some(Commands::History) => Args::History,
        Some(Commands::Status) => Args::Status,
        None => Args::Apply {
            files: cli.files,
            base_dir: cli.base_dir,
            dry_run: cli.dry_run,
            context: cli.context,
            legacy_class_rule: cli.legacy_class_rule,
            no_backup: cli.no_backup,
            backup_dir: cli.backup_dir,
        },
    }
}

#[derive(Debug)]
pub enum Args {
    Apply {
        files: Vec<String>,
        base_dir: Option<String>,
        dry_run: bool,
        context: Option<usize>,
        legacy_class_rule: bool,
        no_backup: bool,
        backup_dir: Option<String>,
    },
    Rollback {
        id: Option<String>,
    },
    History,
    Status,
}
