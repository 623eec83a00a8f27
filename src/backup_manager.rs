use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MAX_BACKUPS: usize = 50;

/// Metadata for one patch run, stored as operation.json inside the backup
/// directory so rollback does not depend on anything but the backup itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Which rule set produced this backup (e.g. "enable-authentication")
    pub label: String,
    pub files: Vec<FileBackup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackup {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
}

pub struct BackupManager {
    backups_dir: PathBuf,
}

impl BackupManager {
    pub fn new() -> Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        let backups_dir = home_dir.join(".authpatch").join("backups");

        Self::with_directory(backups_dir)
    }

    /// Create a BackupManager with a custom backup directory
    pub fn with_directory(dir: impl Into<PathBuf>) -> Result<Self> {
        let backups_dir = dir.into();

        fs::create_dir_all(&backups_dir).with_context(|| {
            format!(
                "Failed to create backups directory: {}",
                backups_dir.display()
            )
        })?;

        Ok(Self { backups_dir })
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Snapshot the given files before they are rewritten. Files that do not
    /// exist are skipped; the caller already reported them as missing.
    pub fn create_backup(&mut self, label: &str, files: &[PathBuf]) -> Result<String> {
        // Millisecond precision keeps IDs sortable even for back-to-back runs
        let id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%d-%H%M%S%3f"),
            Uuid::new_v4().to_string().split_at(8).0
        );
        let backup_dir = self.backups_dir.join(&id);

        fs::create_dir_all(&backup_dir).with_context(|| {
            format!(
                "Failed to create backup directory: {}",
                backup_dir.display()
            )
        })?;

        let mut file_backups = Vec::new();

        for file_path in files {
            if !file_path.exists() {
                continue;
            }

            let file_name = file_path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file_path.display()))?;

            // Disambiguate identically-named files from different directories
            let backup_path = backup_dir.join(format!(
                "{}-{}",
                file_backups.len(),
                file_name.to_string_lossy()
            ));

            fs::copy(file_path, &backup_path)
                .with_context(|| format!("Failed to backup file: {}", file_path.display()))?;

            file_backups.push(FileBackup {
                original_path: file_path.clone(),
                backup_path,
            });
        }

        let metadata = BackupMetadata {
            id: id.clone(),
            timestamp: Utc::now(),
            label: label.to_string(),
            files: file_backups,
        };

        let metadata_path = backup_dir.join("operation.json");
        let metadata_json =
            serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;

        fs::write(&metadata_path, metadata_json)
            .with_context(|| format!("Failed to write metadata: {}", metadata_path.display()))?;

        self.cleanup_old_backups()?;

        Ok(id)
    }

    pub fn restore_backup(&self, id: &str) -> Result<()> {
        let backup_dir = self.backups_dir.join(id);
        let metadata_path = backup_dir.join("operation.json");

        if !backup_dir.exists() {
            anyhow::bail!("Backup not found: {}", id);
        }

        let metadata_json = fs::read_to_string(&metadata_path)
            .with_context(|| format!("Failed to read metadata: {}", metadata_path.display()))?;

        let metadata: BackupMetadata =
            serde_json::from_str(&metadata_json).context("Failed to parse metadata")?;

        for file_backup in &metadata.files {
            if !file_backup.backup_path.exists() {
                eprintln!(
                    "Warning: Backup file missing: {}",
                    file_backup.backup_path.display()
                );
                continue;
            }

            fs::copy(&file_backup.backup_path, &file_backup.original_path).with_context(|| {
                format!(
                    "Failed to restore file: {}",
                    file_backup.original_path.display()
                )
            })?;

            println!("Restored: {}", file_backup.original_path.display());
        }

        // Remove backup after successful restore
        fs::remove_dir_all(&backup_dir).with_context(|| {
            format!(
                "Failed to remove backup directory: {}",
                backup_dir.display()
            )
        })?;

        println!("Backup {} removed after restore", id);

        Ok(())
    }

    pub fn get_last_backup_id(&self) -> Result<Option<String>> {
        let mut backups = self.list_backups()?;
        backups.sort_by_key(|b| b.timestamp);
        Ok(backups.last().map(|b| b.id.clone()))
    }

    pub fn list_backups(&self) -> Result<Vec<BackupMetadata>> {
        let mut backups = Vec::new();

        let entries = fs::read_dir(&self.backups_dir).with_context(|| {
            format!(
                "Failed to read backups directory: {}",
                self.backups_dir.display()
            )
        })?;

        for entry in entries {
            let entry = entry.context("Failed to read backup directory entry")?;
            let metadata_path = entry.path().join("operation.json");

            if !metadata_path.exists() {
                continue;
            }

            let metadata_json = fs::read_to_string(&metadata_path)
                .with_context(|| format!("Failed to read metadata: {}", metadata_path.display()))?;

            match serde_json::from_str::<BackupMetadata>(&metadata_json) {
                Ok(metadata) => backups.push(metadata),
                Err(e) => {
                    eprintln!(
                        "Warning: Skipping corrupt backup metadata {}: {}",
                        metadata_path.display(),
                        e
                    );
                }
            }
        }

        backups.sort_by_key(|b| b.timestamp);
        Ok(backups)
    }

    fn cleanup_old_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;

        if backups.len() <= MAX_BACKUPS {
            return Ok(());
        }

        let excess = backups.len() - MAX_BACKUPS;
        for backup in backups.iter().take(excess) {
            let backup_dir = self.backups_dir.join(&backup.id);
            fs::remove_dir_all(&backup_dir)
                .with_context(|| format!("Failed to remove old backup: {}", backup_dir.display()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_backup_restore_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backups_dir = temp_dir.path().join("backups");

        let target = temp_dir.path().join("views.py");
        fs::write(&target, "permission_classes = [AllowAny]\n").unwrap();

        let mut manager = BackupManager::with_directory(&backups_dir).unwrap();
        let id = manager
            .create_backup("enable-authentication", &[target.clone()])
            .unwrap();

        // Simulate the patch run
        fs::write(&target, "permission_classes = [IsAuthenticated]\n").unwrap();

        manager.restore_backup(&id).unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "permission_classes = [AllowAny]\n"
        );

        // Backup is consumed by the restore
        assert!(manager.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let backups_dir = temp_dir.path().join("backups");

        let mut manager = BackupManager::with_directory(&backups_dir).unwrap();
        let id = manager
            .create_backup(
                "enable-authentication",
                &[temp_dir.path().join("not_there.py")],
            )
            .unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].id, id);
        assert!(backups[0].files.is_empty());
    }

    #[test]
    fn test_last_backup_id_is_most_recent() {
        let temp_dir = TempDir::new().unwrap();
        let backups_dir = temp_dir.path().join("backups");

        let target = temp_dir.path().join("views.py");
        fs::write(&target, "x\n").unwrap();

        let mut manager = BackupManager::with_directory(&backups_dir).unwrap();
        manager.create_backup("first", &[target.clone()]).unwrap();
        // Timestamps have millisecond precision; keep the two runs distinct
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = manager.create_backup("second", &[target.clone()]).unwrap();

        assert_eq!(manager.get_last_backup_id().unwrap(), Some(second));
    }

    #[test]
    fn test_restore_unknown_id_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::with_directory(temp_dir.path().join("backups")).unwrap();

        let result = manager.restore_backup("no-such-backup");
        assert!(result.is_err());
    }
}
