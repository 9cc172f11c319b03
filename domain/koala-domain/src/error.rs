//! ドメインエラー型
//!
//! 失敗はすべてこの型に集約し、呼び出し側で項目単位・キー単位に捕捉する。

use thiserror::Error;

/// ドメイン層のエラー型
/// 各バリアントは特定の失敗シナリオを表現
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// アクセス拒否（管理者権限不足）
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// レジストリ値が存在しない
    #[error("Registry value not found: {0}")]
    KeyNotFound(String),

    /// ファイル／レジストリI/Oエラー
    #[error("IO error: {0}")]
    IoError(String),

    /// 外部ツールの非ゼロ終了
    #[error("External tool failed: {0}")]
    ExternalToolFailed(String),

    /// タイムアウト
    #[error("Timeout: {0}")]
    Timeout(String),

    /// バリデーションエラー
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 設定値が無効
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// バックアップが既に存在する（上書き禁止）
    #[error("Backup already exists: {0}")]
    BackupAlreadyExists(String),

    /// バックアップが存在しない
    #[error("Backup not found: {0}")]
    BackupMissing(String),

    /// 復元できた値が一つもない
    #[error("Nothing restored: {0}")]
    NothingRestored(String),

    /// 他の操作が実行中
    #[error("Operation in progress: {0}")]
    Busy(String),

    /// このプラットフォームでは未対応
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// 不明なエラー
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// ユーザーに提示する粗い分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AccessDenied,
    KeyNotFound,
    IoFailure,
    ExternalToolFailure,
    ValidationAdvisory,
    Other,
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::KeyNotFound(_) => ErrorKind::KeyNotFound,
            Self::IoError(_) | Self::BackupAlreadyExists(_) | Self::BackupMissing(_) => {
                ErrorKind::IoFailure
            }
            Self::ExternalToolFailed(_) | Self::Timeout(_) => ErrorKind::ExternalToolFailure,
            Self::ValidationError(_) | Self::InvalidConfig(_) => ErrorKind::ValidationAdvisory,
            Self::NothingRestored(_) | Self::Busy(_) | Self::Unsupported(_) | Self::Unknown(_) => {
                ErrorKind::Other
            }
        }
    }
}
