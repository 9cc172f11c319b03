//! 操作ロックポート

use crate::error::DomainError;

/// 保持中のロック（dropで解放）
pub trait LockLease {}

/// バックアップ・復元・適用を直列化するロック
pub trait OperationLock {
    /// 取得を試みる。他プロセス／スレッドが保持中なら `Busy`。
    fn acquire(&self) -> Result<Box<dyn LockLease + '_>, DomainError>;
}
