use super::registry::{RegistryKey, RegistryValue, RegistryValueKind};
use crate::DomainError;

/// バックアップファイルの形式バージョン
pub const BACKUP_FORMAT_VERSION: u32 = 3;

/// 1キー分の変更前の値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub key: RegistryKey,
    /// カタログが書き込む型
    pub kind: RegistryValueKind,
    /// 変更前の値（存在しなければNone）
    pub original: Option<RegistryValue>,
    /// ISO 8601タイムスタンプ
    pub captured_at: String,
}

/// バックアップファイル全体
///
/// 同じキーは一度しか記録しない。二度目の記録は最初の値を上書きしない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSnapshot {
    created_at: String,
    records: Vec<BackupRecord>,
}

impl BackupSnapshot {
    pub fn new(created_at: impl Into<String>) -> Self {
        Self {
            created_at: created_at.into(),
            records: Vec::new(),
        }
    }

    /// 永続化データから復元（重複キーは拒否）
    pub fn from_records(
        created_at: impl Into<String>,
        records: Vec<BackupRecord>,
    ) -> Result<Self, DomainError> {
        let mut snapshot = Self::new(created_at);
        for record in records {
            let key = record.key.to_string();
            if !snapshot.insert(record) {
                return Err(DomainError::ValidationError(format!(
                    "duplicate backup record: {key}"
                )));
            }
        }
        Ok(snapshot)
    }

    /// 未記録のキーのみ追加する。追加した場合true。
    pub fn insert(&mut self, record: BackupRecord) -> bool {
        if self.contains(&record.key) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn contains(&self, key: &RegistryKey) -> bool {
        self.records.iter().any(|r| &r.key == key)
    }

    pub fn get(&self, key: &RegistryKey) -> Option<&BackupRecord> {
        self.records.iter().find(|r| &r.key == key)
    }

    pub fn records(&self) -> &[BackupRecord] {
        &self.records
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// バックアップファイルの状態（表示用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStatus {
    pub exists: bool,
    pub location: String,
    /// 読み込めた場合のレコード数
    pub records: Option<usize>,
}

/// createBackupの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub records: usize,
    /// 取得時点で値が存在しなかったキー数
    pub absent: usize,
    pub location: String,
    /// 読めずに記録から外したキーとエラー
    pub skipped: Vec<(String, String)>,
}

/// restoreFromBackupの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// 値を書き戻したキー
    pub restored: Vec<String>,
    /// 値を削除したキー（元々存在しなかったもの）
    pub deleted: Vec<String>,
    /// 失敗したキーとエラー
    pub failed: Vec<(String, String)>,
}

impl RestoreReport {
    pub fn restored_count(&self) -> usize {
        self.restored.len() + self.deleted.len()
    }
}
