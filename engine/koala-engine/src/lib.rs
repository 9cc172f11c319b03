//! koala-engine: バックアップ／復元／適用／検証のワークフローを実装する層。
//! ドメイン（koala-domain）のポートにのみ依存する。
//!
//! 失敗はキー単位・項目単位・チェック単位で捕捉し、レポートに畳み込む。

mod apply;
mod backup;
mod validate;

pub use apply::{ApplyContext, apply_optimizations};
pub use backup::{backup_status, create_backup, restore_from_backup};
pub use validate::{
    assess_optimization_safety, is_virtual_machine, validate_post_optimization,
    validate_readiness,
};

#[cfg(test)]
mod testing;
