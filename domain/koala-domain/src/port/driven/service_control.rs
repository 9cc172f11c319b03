//! サービス制御ポート

use crate::error::DomainError;
use crate::model::ServiceStartMode;

/// Windowsサービスの停止・スタートアップ変更
pub trait ServiceControl {
    /// 停止（既に停止済み・存在しない場合も成功扱い）
    fn stop(&self, service: &str) -> Result<(), DomainError>;

    /// スタートアップ種別を変更
    fn set_start_mode(&self, service: &str, mode: ServiceStartMode) -> Result<(), DomainError>;

    /// 実行中か
    fn is_running(&self, service: &str) -> Result<bool, DomainError>;
}
