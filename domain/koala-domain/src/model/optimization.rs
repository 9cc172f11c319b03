use super::registry::{RegistryKey, RegistryMutation, RegistryValueKind, SubkeyMutation};
use crate::DomainError;
use std::fmt;

/// サービスのスタートアップ値を保持するキー
pub const SERVICES_ROOT: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services";

/// 最適化カテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptimizationCategory {
    Network,
    Gaming,
    Gpu,
    Memory,
    Cpu,
    Kernel,
    Visual,
    Input,
    Audio,
    Storage,
    Power,
    Services,
    Boot,
    Security,
}

impl OptimizationCategory {
    pub fn all() -> &'static [OptimizationCategory] {
        &[
            Self::Network,
            Self::Gaming,
            Self::Gpu,
            Self::Memory,
            Self::Cpu,
            Self::Kernel,
            Self::Visual,
            Self::Input,
            Self::Audio,
            Self::Storage,
            Self::Power,
            Self::Services,
            Self::Boot,
            Self::Security,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Gaming => "gaming",
            Self::Gpu => "gpu",
            Self::Memory => "memory",
            Self::Cpu => "cpu",
            Self::Kernel => "kernel",
            Self::Visual => "visual",
            Self::Input => "input",
            Self::Audio => "audio",
            Self::Storage => "storage",
            Self::Power => "power",
            Self::Services => "services",
            Self::Boot => "boot",
            Self::Security => "security",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        Self::all().iter().copied().find(|c| c.as_str() == lower)
    }
}

impl fmt::Display for OptimizationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 項目の主な変更手段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationKind {
    Registry,
    Command,
    Service,
}

/// 外部コマンドの呼び出し（bcdedit, powercfg など）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub executable: String,
    pub arguments: Vec<String>,
    pub requires_elevation: bool,
}

impl CommandInvocation {
    pub fn new(executable: &str, arguments: &[&str]) -> Self {
        Self {
            executable: executable.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
            requires_elevation: true,
        }
    }

    /// ログ表示用のコマンドライン
    pub fn display_line(&self) -> String {
        let mut line = self.executable.clone();
        for arg in &self.arguments {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// サービスのスタートアップ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStartMode {
    Automatic,
    Manual,
    Disabled,
}

impl ServiceStartMode {
    /// `Start` 値（2=自動, 3=手動, 4=無効）
    pub fn start_value(&self) -> u32 {
        match self {
            Self::Automatic => 2,
            Self::Manual => 3,
            Self::Disabled => 4,
        }
    }
}

/// サービスの停止＋スタートアップ変更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChange {
    pub service_name: String,
    pub start_mode: ServiceStartMode,
}

impl ServiceChange {
    /// 復元対象となる `Start` 値のキー
    pub fn start_key(&self) -> Result<RegistryKey, DomainError> {
        RegistryKey::new(
            &format!("{}\\{}", SERVICES_ROOT, self.service_name),
            "Start",
        )
    }
}

/// 項目が引き起こす単一の変更
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Registry(RegistryMutation),
    /// 親キー直下の各サブキーへの書き込み
    EachSubkey(SubkeyMutation),
    Command(CommandInvocation),
    Service(ServiceChange),
}

impl Mutation {
    /// 固定のバックアップ対象キー
    ///
    /// コマンドはなし。サブキー展開はマシンごとに異なるためここでは返さない。
    pub fn backup_key(&self) -> Result<Option<(RegistryKey, RegistryValueKind)>, DomainError> {
        match self {
            Self::Registry(m) => Ok(Some((m.key.clone(), m.kind()))),
            Self::Service(s) => Ok(Some((s.start_key()?, RegistryValueKind::DWord))),
            Self::EachSubkey(_) | Self::Command(_) => Ok(None),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Registry(m) => format!("{} = {}", m.key, m.value),
            Self::EachSubkey(m) => {
                format!("{}\\*\\{} = {}", m.parent_path(), m.value_name, m.value)
            }
            Self::Command(c) => c.display_line(),
            Self::Service(s) => format!("service {} -> {:?}", s.service_name, s.start_mode),
        }
    }
}

/// カタログ項目の定義（不変）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationItem {
    pub name: String,
    pub description: String,
    pub category: OptimizationCategory,
    pub requires_admin: bool,
    pub kind: OptimizationKind,
}

/// UI側が保持する選択状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    pub name: String,
    pub enabled: bool,
}

impl SelectedItem {
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_change_backs_up_start_value() {
        let change = Mutation::Service(ServiceChange {
            service_name: "SysMain".into(),
            start_mode: ServiceStartMode::Disabled,
        });
        let (key, kind) = change.backup_key().unwrap().unwrap();
        assert_eq!(
            key.hive_path(),
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\SysMain"
        );
        assert_eq!(key.value_name(), "Start");
        assert_eq!(kind, RegistryValueKind::DWord);
    }

    #[test]
    fn command_has_no_backup_key() {
        let cmd = Mutation::Command(CommandInvocation::new(
            "bcdedit",
            &["/set", "disabledynamictick", "yes"],
        ));
        assert!(cmd.backup_key().unwrap().is_none());
        assert_eq!(cmd.describe(), "bcdedit /set disabledynamictick yes");
    }

    #[test]
    fn subkey_mutation_has_no_fixed_backup_key() {
        let m = Mutation::EachSubkey(
            SubkeyMutation::new(
                r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces",
                "TcpAckFrequency",
                crate::model::RegistryValue::DWord(1),
            )
            .unwrap(),
        );
        assert!(m.backup_key().unwrap().is_none());
        assert_eq!(
            m.describe(),
            r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces\*\TcpAckFrequency = 1 (0x00000001)"
        );
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(
            OptimizationCategory::parse("Kernel"),
            Some(OptimizationCategory::Kernel)
        );
        assert_eq!(OptimizationCategory::parse("overlay"), None);
    }
}
