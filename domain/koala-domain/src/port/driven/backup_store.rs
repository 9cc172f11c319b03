//! バックアップストアポート

use crate::error::DomainError;
use crate::model::BackupSnapshot;

/// バックアップファイル用ストアポート
///
/// 既存のスナップショットは上書きしない。作り直す場合は `remove` してから `create` する。
pub trait BackupStore {
    /// バックアップファイルの存在確認
    fn exists(&self) -> Result<bool, DomainError>;

    /// 全体を読込（ファイルがなければ `BackupMissing`）
    fn load(&self) -> Result<BackupSnapshot, DomainError>;

    /// 新規作成（既に存在すれば `BackupAlreadyExists`）
    fn create(&self, snapshot: &BackupSnapshot) -> Result<(), DomainError>;

    /// 削除（存在しなければ何もしない）
    fn remove(&self) -> Result<(), DomainError>;

    /// 表示用の保存先
    fn location(&self) -> String;
}
