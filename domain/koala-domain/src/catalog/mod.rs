//! 最適化カタログ
//!
//! 名前付きの最適化項目と、それぞれが引き起こす変更の一覧。
//! 副作用はなく、参照のみ。

mod standard;

use crate::DomainError;
use crate::model::{
    Mutation, OptimizationCategory, OptimizationItem, OptimizationKind, RegistryKey,
    RegistryValueKind, SubkeyMutation,
};
use std::collections::HashMap;

/// 項目定義と変更一覧の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    item: OptimizationItem,
    mutations: Vec<Mutation>,
}

impl CatalogEntry {
    /// 種別は変更内容から導出する（サービス > コマンド > レジストリ）
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: OptimizationCategory,
        requires_admin: bool,
        mutations: Vec<Mutation>,
    ) -> Self {
        let kind = derive_kind(&mutations);
        Self {
            item: OptimizationItem {
                name: name.into(),
                description: description.into(),
                category,
                requires_admin,
                kind,
            },
            mutations,
        }
    }

    pub fn item(&self) -> &OptimizationItem {
        &self.item
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }
}

/// 静的な最適化カタログ（順序は定義順で固定）
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    backup_keys: Vec<(RegistryKey, RegistryValueKind)>,
    subkey_targets: Vec<SubkeyMutation>,
}

impl Catalog {
    /// 名前の一意性・変更の有無・キーの型一貫性を検証して構築
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, DomainError> {
        let mut names: Vec<String> = Vec::with_capacity(entries.len());
        let mut kinds: HashMap<RegistryKey, RegistryValueKind> = HashMap::new();
        let mut backup_keys = Vec::new();
        let mut subkey_targets: Vec<SubkeyMutation> = Vec::new();

        for entry in &entries {
            let name = entry.item.name.trim();
            if name.is_empty() {
                return Err(DomainError::ValidationError(
                    "catalog item name must not be empty".into(),
                ));
            }
            let lower = name.to_ascii_lowercase();
            if names.contains(&lower) {
                return Err(DomainError::ValidationError(format!(
                    "duplicate catalog item: {name}"
                )));
            }
            names.push(lower);

            if entry.mutations.is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "catalog item has no mutations: {name}"
                )));
            }

            for mutation in &entry.mutations {
                if let Mutation::EachSubkey(template) = mutation {
                    match subkey_targets.iter().find(|t| t.same_target(template)) {
                        Some(existing) if existing.kind() != template.kind() => {
                            return Err(DomainError::ValidationError(format!(
                                "{}\\*\\{} is written as both {} and {}",
                                template.parent_path(),
                                template.value_name,
                                existing.kind().as_str(),
                                template.kind().as_str()
                            )));
                        }
                        Some(_) => {}
                        None => subkey_targets.push(template.clone()),
                    }
                    continue;
                }
                let Some((key, kind)) = mutation.backup_key()? else {
                    continue;
                };
                match kinds.get(&key) {
                    Some(existing) if *existing != kind => {
                        return Err(DomainError::ValidationError(format!(
                            "{key} is written as both {} and {}",
                            existing.as_str(),
                            kind.as_str()
                        )));
                    }
                    Some(_) => {}
                    None => {
                        kinds.insert(key.clone(), kind);
                        backup_keys.push((key, kind));
                    }
                }
            }
        }

        Ok(Self {
            entries,
            backup_keys,
            subkey_targets,
        })
    }

    /// 既定の全項目
    pub fn standard() -> Result<Self, DomainError> {
        Self::new(standard::entries()?)
    }

    /// 全項目の定義（定義順）
    pub fn list_items(&self) -> Vec<OptimizationItem> {
        self.entries.iter().map(|e| e.item.clone()).collect()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// 名前で項目を解決（大文字小文字は区別しない）
    pub fn resolve(&self, name: &str) -> Option<&CatalogEntry> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|e| e.item.name.eq_ignore_ascii_case(name))
    }

    pub fn items_in(&self, category: OptimizationCategory) -> Vec<&OptimizationItem> {
        self.entries
            .iter()
            .map(|e| &e.item)
            .filter(|i| i.category == category)
            .collect()
    }

    /// カタログが触れうる全キー（重複なし、初出順）
    pub fn backup_keys(&self) -> &[(RegistryKey, RegistryValueKind)] {
        &self.backup_keys
    }

    /// サブキーごとに展開してバックアップする対象（重複なし、初出順）
    pub fn subkey_targets(&self) -> &[SubkeyMutation] {
        &self.subkey_targets
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn derive_kind(mutations: &[Mutation]) -> OptimizationKind {
    if mutations.iter().any(|m| matches!(m, Mutation::Service(_))) {
        OptimizationKind::Service
    } else if mutations.iter().any(|m| matches!(m, Mutation::Command(_))) {
        OptimizationKind::Command
    } else {
        OptimizationKind::Registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CommandInvocation, RegistryMutation, RegistryValue, ServiceChange, ServiceStartMode,
    };

    fn reg(path: &str, name: &str, value: RegistryValue) -> Mutation {
        Mutation::Registry(RegistryMutation {
            key: RegistryKey::new(path, name).unwrap(),
            value,
        })
    }

    const PRIORITY: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\PriorityControl";

    #[test]
    fn backup_keys_are_distinct_and_ordered() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(
                "A",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![
                    reg(PRIORITY, "Win32PrioritySeparation", RegistryValue::DWord(38)),
                    reg(PRIORITY, "IRQ8Priority", RegistryValue::DWord(1)),
                ],
            ),
            CatalogEntry::new(
                "B",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![reg(PRIORITY, "irq8priority", RegistryValue::DWord(2))],
            ),
        ])
        .unwrap();
        let keys: Vec<&str> = catalog
            .backup_keys()
            .iter()
            .map(|(k, _)| k.value_name())
            .collect();
        assert_eq!(keys, vec!["Win32PrioritySeparation", "IRQ8Priority"]);
    }

    #[test]
    fn rejects_duplicate_names_and_conflicting_kinds() {
        let dup = Catalog::new(vec![
            CatalogEntry::new(
                "Same",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![reg(PRIORITY, "X", RegistryValue::DWord(1))],
            ),
            CatalogEntry::new(
                "same",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![reg(PRIORITY, "Y", RegistryValue::DWord(1))],
            ),
        ]);
        assert!(dup.is_err());

        let conflict = Catalog::new(vec![
            CatalogEntry::new(
                "A",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![reg(PRIORITY, "X", RegistryValue::DWord(1))],
            ),
            CatalogEntry::new(
                "B",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![reg(PRIORITY, "X", RegistryValue::String("1".into()))],
            ),
        ]);
        assert!(conflict.is_err());

        let empty = Catalog::new(vec![CatalogEntry::new(
            "Empty",
            "",
            OptimizationCategory::Cpu,
            true,
            vec![],
        )]);
        assert!(empty.is_err());
    }

    #[test]
    fn kind_is_derived_from_mutations() {
        let svc = CatalogEntry::new(
            "Svc",
            "",
            OptimizationCategory::Services,
            true,
            vec![Mutation::Service(ServiceChange {
                service_name: "Spooler".into(),
                start_mode: ServiceStartMode::Disabled,
            })],
        );
        let cmd = CatalogEntry::new(
            "Cmd",
            "",
            OptimizationCategory::Boot,
            true,
            vec![
                Mutation::Command(CommandInvocation::new("bcdedit", &["/set", "debug", "no"])),
                reg(PRIORITY, "X", RegistryValue::DWord(1)),
            ],
        );
        assert_eq!(svc.item().kind, OptimizationKind::Service);
        assert_eq!(cmd.item().kind, OptimizationKind::Command);
    }

    #[test]
    fn standard_catalog_is_valid() {
        let catalog = Catalog::standard().unwrap();
        assert!(catalog.len() > 40);
        assert!(catalog.resolve("disablegamedvr").is_some());
        assert!(catalog.resolve("DisableNagleAlgorithm").is_some());
        assert!(!catalog.items_in(OptimizationCategory::Boot).is_empty());

        // Nagle無効化はインターフェースごと
        let nagle: Vec<&str> = catalog
            .subkey_targets()
            .iter()
            .map(|t| t.value_name.as_str())
            .collect();
        assert_eq!(nagle, vec!["TcpAckFrequency", "TCPNoDelay"]);
        assert!(catalog.subkey_targets()[0]
            .parent()
            .ends_with(r"Tcpip\Parameters\Interfaces"));

        // サービスのStart値もバックアップ対象
        assert!(catalog.backup_keys().iter().any(|(k, _)| {
            k.hive_path().ends_with(r"Services\SysMain") && k.value_name() == "Start"
        }));

        let throttling = catalog
            .resolve("OptimizeNetworkSettings")
            .unwrap()
            .mutations()
            .iter()
            .find_map(|m| match m {
                Mutation::Registry(r) if r.key.value_name() == "NetworkThrottlingIndex" => {
                    Some(r.value.clone())
                }
                _ => None,
            });
        assert_eq!(throttling, Some(RegistryValue::DWord(0xFFFF_FFFF)));
    }

    #[test]
    fn standard_catalog_lists_items_in_definition_order() {
        let catalog = Catalog::standard().unwrap();
        let first = catalog.list_items();
        let second = catalog.list_items();
        assert_eq!(first, second);
        assert_eq!(first[0].name, catalog.entries()[0].item().name);
    }
}
