//! 最適化ユースケースポート

use crate::error::DomainError;
use crate::model::{
    AppliedResult, BackupReport, BackupStatus, OptimizationCategory, OptimizationItem,
    RestoreReport, SafetyVerdict, SelectedItem, ValidationReport,
};

/// UIから呼ばれる操作の一覧
///
/// 検証系は失敗せず、チェックできなかった項目はレポートの `skipped` に入る。
pub trait OptimizationUseCase {
    /// カタログの全項目（定義順）
    fn list_items(&self) -> Vec<OptimizationItem>;

    /// 適用前の準備チェック
    fn validate_readiness(&self) -> ValidationReport;

    /// カテゴリ単位の安全性（`assess_optimization_safety` の `safe`）
    fn validate_optimization_safety(&self, category: OptimizationCategory) -> bool {
        self.assess_optimization_safety(category).safe
    }

    /// カテゴリ単位の安全性判定（指摘付き）
    fn assess_optimization_safety(&self, category: OptimizationCategory) -> SafetyVerdict;

    /// バックアップファイルがあるか（読めなければfalse）
    fn backup_exists(&self) -> bool;

    fn backup_status(&self) -> BackupStatus;

    /// カタログの全キーを記録する（既存のバックアップは上書きしない）
    fn create_backup(&self) -> Result<BackupReport, DomainError>;

    /// バックアップから書き戻す。1件も戻せなければ `NothingRestored`。
    fn restore_from_backup(&self) -> Result<RestoreReport, DomainError>;

    /// バックアップを破棄する（作り直す前の明示的な手順）
    fn discard_backup(&self) -> Result<(), DomainError>;

    /// 選択項目を適用（項目単位で失敗を許容）
    fn apply_optimizations(&self, selected: &[SelectedItem]) -> AppliedResult;

    /// 適用後のチェック
    fn validate_post_optimization(&self) -> ValidationReport;
}
