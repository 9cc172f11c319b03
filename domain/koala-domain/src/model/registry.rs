use crate::DomainError;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 対象ハイブ（最適化が触れるのはHKLM/HKCUのみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistryHive {
    LocalMachine,
    CurrentUser,
}

impl RegistryHive {
    /// 正式名（`HKEY_LOCAL_MACHINE` など）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalMachine => "HKEY_LOCAL_MACHINE",
            Self::CurrentUser => "HKEY_CURRENT_USER",
        }
    }

    /// 正式名と短縮名（HKLM/HKCU）の両方を受け付ける
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "HKEY_LOCAL_MACHINE" | "HKLM" => Some(Self::LocalMachine),
            "HKEY_CURRENT_USER" | "HKCU" => Some(Self::CurrentUser),
            _ => None,
        }
    }
}

/// レジストリ値の型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryValueKind {
    DWord,
    QWord,
    String,
}

impl RegistryValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DWord => "DWord",
            Self::QWord => "QWord",
            Self::String => "String",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "DWord" => Some(Self::DWord),
            "QWord" => Some(Self::QWord),
            "String" => Some(Self::String),
            _ => None,
        }
    }
}

/// レジストリ値（REG_DWORD / REG_QWORD / REG_SZ）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryValue {
    DWord(u32),
    QWord(u64),
    String(String),
}

impl RegistryValue {
    pub fn kind(&self) -> RegistryValueKind {
        match self {
            Self::DWord(_) => RegistryValueKind::DWord,
            Self::QWord(_) => RegistryValueKind::QWord,
            Self::String(_) => RegistryValueKind::String,
        }
    }
}

impl fmt::Display for RegistryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DWord(v) => write!(f, "{v} (0x{v:08x})"),
            Self::QWord(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// バックアップ／書き込みの単位となる (ハイブパス, 値名) の組
///
/// レジストリと同じく大文字小文字を区別せずに比較する。
#[derive(Debug, Clone)]
pub struct RegistryKey {
    hive: RegistryHive,
    subkey: String,
    value_name: String,
}

impl RegistryKey {
    /// `HKEY_LOCAL_MACHINE\SYSTEM\...` 形式のパスから作成
    pub fn new(hive_path: &str, value_name: impl Into<String>) -> Result<Self, DomainError> {
        let (hive, subkey) = split_hive_path(hive_path)?;
        let value_name = value_name.into();
        if value_name.contains('\0') {
            return Err(DomainError::ValidationError(format!(
                "value name contains NUL: {hive_path}"
            )));
        }
        Ok(Self {
            hive,
            subkey,
            value_name,
        })
    }

    pub fn hive(&self) -> RegistryHive {
        self.hive
    }

    /// ハイブを除いたサブキー
    pub fn subkey(&self) -> &str {
        &self.subkey
    }

    pub fn value_name(&self) -> &str {
        &self.value_name
    }

    /// ハイブ名を含む完全パス（永続化形式）
    pub fn hive_path(&self) -> String {
        format!("{}\\{}", self.hive.as_str(), self.subkey)
    }
}

impl PartialEq for RegistryKey {
    fn eq(&self, other: &Self) -> bool {
        self.hive == other.hive
            && self.subkey.eq_ignore_ascii_case(&other.subkey)
            && self.value_name.eq_ignore_ascii_case(&other.value_name)
    }
}

impl Eq for RegistryKey {}

impl Hash for RegistryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hive.hash(state);
        self.subkey.to_ascii_lowercase().hash(state);
        self.value_name.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\\{}", self.hive_path(), self.value_name)
    }
}

/// 1つのレジストリ書き込み
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryMutation {
    pub key: RegistryKey,
    pub value: RegistryValue,
}

impl RegistryMutation {
    pub fn kind(&self) -> RegistryValueKind {
        self.value.kind()
    }
}

/// 親キー直下の全サブキーに同じ値を書き込む変更
///
/// ネットワークインターフェース（`Tcpip\Parameters\Interfaces\{GUID}`）のように
/// 対象キーがマシンごとに異なる場合に使う。適用時とバックアップ時に展開する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubkeyMutation {
    hive: RegistryHive,
    parent: String,
    pub value_name: String,
    pub value: RegistryValue,
}

impl SubkeyMutation {
    pub fn new(
        parent_path: &str,
        value_name: impl Into<String>,
        value: RegistryValue,
    ) -> Result<Self, DomainError> {
        let (hive, parent) = split_hive_path(parent_path)?;
        let value_name = value_name.into();
        if value_name.contains('\0') {
            return Err(DomainError::ValidationError(format!(
                "value name contains NUL: {parent_path}"
            )));
        }
        Ok(Self {
            hive,
            parent,
            value_name,
            value,
        })
    }

    pub fn hive(&self) -> RegistryHive {
        self.hive
    }

    /// ハイブを除いた親キー
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn parent_path(&self) -> String {
        format!("{}\\{}", self.hive.as_str(), self.parent)
    }

    pub fn kind(&self) -> RegistryValueKind {
        self.value.kind()
    }

    /// 子キー名から書き込み先を作る
    pub fn key_for(&self, child: &str) -> Result<RegistryKey, DomainError> {
        RegistryKey::new(
            &format!("{}\\{}", self.parent_path(), child),
            self.value_name.clone(),
        )
    }

    /// 親キーと値名が同じか（値は問わない）
    pub fn same_target(&self, other: &SubkeyMutation) -> bool {
        self.hive == other.hive
            && self.parent.eq_ignore_ascii_case(&other.parent)
            && self.value_name.eq_ignore_ascii_case(&other.value_name)
    }
}

fn split_hive_path(hive_path: &str) -> Result<(RegistryHive, String), DomainError> {
    let trimmed = hive_path.trim().trim_end_matches('\\');
    let (hive_name, rest) = trimmed.split_once('\\').unwrap_or((trimmed, ""));
    let hive = RegistryHive::parse(hive_name).ok_or_else(|| {
        DomainError::ValidationError(format!("unsupported registry hive: {hive_path}"))
    })?;
    if rest.is_empty() || rest.contains('\0') {
        return Err(DomainError::ValidationError(format!(
            "invalid registry path: {hive_path}"
        )));
    }
    Ok((hive, rest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_accepts_long_and_short_hive_names() {
        let long = RegistryKey::new(
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\PriorityControl",
            "Win32PrioritySeparation",
        )
        .unwrap();
        let short = RegistryKey::new(
            r"HKLM\SYSTEM\CurrentControlSet\Control\PriorityControl\",
            "Win32PrioritySeparation",
        )
        .unwrap();
        assert_eq!(long, short);
        assert_eq!(long.hive(), RegistryHive::LocalMachine);
        assert_eq!(long.subkey(), r"SYSTEM\CurrentControlSet\Control\PriorityControl");
        assert_eq!(
            long.hive_path(),
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\PriorityControl"
        );
    }

    #[test]
    fn key_comparison_ignores_case() {
        let a = RegistryKey::new(r"HKLM\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters", "TcpNoDelay")
            .unwrap();
        let b = RegistryKey::new(r"HKEY_LOCAL_MACHINE\system\currentcontrolset\services\tcpip\parameters", "TCPNoDelay")
            .unwrap();
        assert_eq!(a, b);
        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn key_rejects_unknown_hive_and_bare_hive() {
        assert!(RegistryKey::new(r"HKEY_USERS\.DEFAULT\Foo", "x").is_err());
        assert!(RegistryKey::new("HKEY_CURRENT_USER", "x").is_err());
    }

    #[test]
    fn subkey_mutation_expands_under_parent() {
        let m = SubkeyMutation::new(
            r"HKLM\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces",
            "TCPNoDelay",
            RegistryValue::DWord(1),
        )
        .unwrap();
        let key = m.key_for("{4f0c1a2b-0000-0000-0000-000000000001}").unwrap();
        assert_eq!(
            key.hive_path(),
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces\{4f0c1a2b-0000-0000-0000-000000000001}"
        );
        assert_eq!(key.value_name(), "TCPNoDelay");

        let other = SubkeyMutation::new(
            r"HKEY_LOCAL_MACHINE\system\currentcontrolset\services\tcpip\parameters\interfaces",
            "tcpnodelay",
            RegistryValue::DWord(0),
        )
        .unwrap();
        assert!(m.same_target(&other));
        assert!(SubkeyMutation::new("HKEY_USERS\\x", "y", RegistryValue::DWord(1)).is_err());
    }

    #[test]
    fn value_kind_matches_variant() {
        assert_eq!(RegistryValue::DWord(1).kind(), RegistryValueKind::DWord);
        assert_eq!(RegistryValue::QWord(1).kind(), RegistryValueKind::QWord);
        assert_eq!(
            RegistryValue::String("High".into()).kind(),
            RegistryValueKind::String
        );
        assert_eq!(RegistryValueKind::parse("QWord"), Some(RegistryValueKind::QWord));
        assert_eq!(RegistryValueKind::parse("Binary"), None);
    }
}
