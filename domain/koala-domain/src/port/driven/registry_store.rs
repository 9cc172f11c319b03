//! レジストリストアポート

use crate::error::DomainError;
use crate::model::{RegistryHive, RegistryKey, RegistryValue};

/// 最適化対象キーの読み書きに必要な最小ポート。
///
/// 値が存在しないことはエラーではなく `Ok(None)` で表す。
pub trait RegistryStore {
    /// 値を読込（キーまたは値がなければNone）
    ///
    /// DWORD/QWORD/SZ以外の型は `Unsupported`。
    fn read_value(&self, key: &RegistryKey) -> Result<Option<RegistryValue>, DomainError>;

    /// 値を書込（キーがなければ作成）
    fn write_value(&self, key: &RegistryKey, value: &RegistryValue) -> Result<(), DomainError>;

    /// 値を削除（既に存在しなければ何もしない）
    fn delete_value(&self, key: &RegistryKey) -> Result<(), DomainError>;

    /// キーを開けるか
    fn key_exists(&self, hive: RegistryHive, subkey: &str) -> Result<bool, DomainError>;

    /// 直下のサブキー名を列挙（キーがなければ空）
    fn subkeys(&self, hive: RegistryHive, subkey: &str) -> Result<Vec<String>, DomainError>;
}
