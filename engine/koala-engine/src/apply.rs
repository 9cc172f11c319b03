//! 最適化の適用

use koala_domain::catalog::CatalogEntry;
use koala_domain::model::{AppliedResult, ItemOutcome, ItemStatus, Mutation, SelectedItem};
use koala_domain::port::driven::{CommandRunner, RegistryStore, ServiceControl};
use koala_domain::{Catalog, DomainError, ErrorKind};
use tracing::{debug, info, warn};

/// 適用時の実行環境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyContext {
    /// 管理者として実行中か
    pub elevated: bool,
    /// 外部コマンドの待機上限
    pub helper_timeout_ms: u64,
}

/// 選択された項目を順に適用する
///
/// 項目ごとに全変更を1回ずつ試行し、失敗しても次の変更・次の項目へ進む。
/// ロールバックもリトライもしない。バックアップの有無は呼び出し側の責務。
pub fn apply_optimizations(
    catalog: &Catalog,
    selected: &[SelectedItem],
    registry: &(impl RegistryStore + ?Sized),
    commands: &(impl CommandRunner + ?Sized),
    services: &(impl ServiceControl + ?Sized),
    ctx: ApplyContext,
) -> AppliedResult {
    let mut result = AppliedResult::default();

    for selection in selected {
        if !selection.enabled {
            result
                .items
                .push(ItemOutcome::skipped(&selection.name, "not selected"));
            continue;
        }
        let Some(entry) = catalog.resolve(&selection.name) else {
            warn!(item = %selection.name, "カタログにない項目");
            result
                .items
                .push(ItemOutcome::skipped(&selection.name, "unknown optimization"));
            continue;
        };
        let outcome = apply_entry(entry, registry, commands, services, ctx);
        match &outcome.status {
            ItemStatus::Applied => info!(item = %outcome.name, "適用しました"),
            ItemStatus::Failed { kind } => warn!(
                item = %outcome.name,
                kind = ?kind,
                errors = ?outcome.errors,
                "適用に失敗"
            ),
            ItemStatus::Skipped { .. } => {}
        }
        result.items.push(outcome);
    }

    info!(
        applied = result.applied_count(),
        failed = result.failed_count(),
        skipped = result.skipped_count(),
        "最適化の適用完了"
    );
    result
}

fn apply_entry(
    entry: &CatalogEntry,
    registry: &(impl RegistryStore + ?Sized),
    commands: &(impl CommandRunner + ?Sized),
    services: &(impl ServiceControl + ?Sized),
    ctx: ApplyContext,
) -> ItemOutcome {
    let item = entry.item();
    if item.requires_admin && !ctx.elevated {
        return ItemOutcome {
            name: item.name.clone(),
            status: ItemStatus::Failed {
                kind: ErrorKind::AccessDenied,
            },
            applied_mutations: 0,
            errors: vec!["administrator privileges required".into()],
        };
    }

    let mut applied_mutations = 0;
    let mut errors = Vec::new();
    let mut first_kind: Option<ErrorKind> = None;

    for mutation in entry.mutations() {
        debug!(item = %item.name, mutation = %mutation.describe(), "変更を適用");
        match apply_mutation(mutation, registry, commands, services, ctx.helper_timeout_ms) {
            Ok(()) => applied_mutations += 1,
            Err(e) => {
                first_kind.get_or_insert(e.kind());
                errors.push(format!("{}: {e}", mutation.describe()));
            }
        }
    }

    let status = match first_kind {
        None => ItemStatus::Applied,
        Some(kind) => ItemStatus::Failed { kind },
    };
    ItemOutcome {
        name: item.name.clone(),
        status,
        applied_mutations,
        errors,
    }
}

fn apply_mutation(
    mutation: &Mutation,
    registry: &(impl RegistryStore + ?Sized),
    commands: &(impl CommandRunner + ?Sized),
    services: &(impl ServiceControl + ?Sized),
    timeout_ms: u64,
) -> Result<(), DomainError> {
    match mutation {
        Mutation::Registry(m) => registry.write_value(&m.key, &m.value),
        Mutation::EachSubkey(template) => {
            // サブキー単位の失敗は記録して残りを続け、最初のエラーを返す
            let children = registry.subkeys(template.hive(), template.parent())?;
            if children.is_empty() {
                debug!(parent = %template.parent_path(), "対象のサブキーなし");
            }
            let mut first_error = None;
            for child in &children {
                let written = template
                    .key_for(child)
                    .and_then(|key| registry.write_value(&key, &template.value));
                if let Err(e) = written {
                    warn!(
                        parent = %template.parent_path(),
                        child = %child,
                        error = %e,
                        "サブキーへの書き込みに失敗"
                    );
                    first_error.get_or_insert(e);
                }
            }
            first_error.map_or(Ok(()), Err)
        }
        Mutation::Command(cmd) => {
            let output = commands.run(cmd, timeout_ms)?;
            if output.success() {
                Ok(())
            } else {
                let detail = if output.stderr.trim().is_empty() {
                    output.stdout.trim()
                } else {
                    output.stderr.trim()
                };
                Err(DomainError::ExternalToolFailed(format!(
                    "{} exited with {}: {detail}",
                    cmd.executable, output.exit_code
                )))
            }
        }
        Mutation::Service(change) => {
            // スタートアップ変更を優先し、停止の失敗はその後に報告
            let stopped = services.stop(&change.service_name);
            services.set_start_mode(&change.service_name, change.start_mode)?;
            stopped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCommands, MockRegistry, MockServices, key};
    use koala_domain::model::{
        CommandInvocation, OptimizationCategory, RegistryHive, RegistryMutation, RegistryValue,
        ServiceChange, ServiceStartMode, SubkeyMutation,
    };

    const INTERFACES: &str =
        r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces";
    const PRIORITY: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\PriorityControl";
    const MOUSE: &str = r"HKEY_CURRENT_USER\Control Panel\Mouse";

    const ELEVATED: ApplyContext = ApplyContext {
        elevated: true,
        helper_timeout_ms: 5_000,
    };

    fn reg(path: &str, name: &str, value: RegistryValue) -> Mutation {
        Mutation::Registry(RegistryMutation {
            key: key(path, name),
            value,
        })
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new(
                "Cpu",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![
                    reg(PRIORITY, "Win32PrioritySeparation", RegistryValue::DWord(38)),
                    reg(PRIORITY, "IRQ8Priority", RegistryValue::DWord(1)),
                ],
            ),
            CatalogEntry::new(
                "Mouse",
                "",
                OptimizationCategory::Input,
                false,
                vec![reg(MOUSE, "MouseSpeed", RegistryValue::String("0".into()))],
            ),
            CatalogEntry::new(
                "Tick",
                "",
                OptimizationCategory::Boot,
                true,
                vec![Mutation::Command(CommandInvocation::new(
                    "bcdedit",
                    &["/set", "disabledynamictick", "yes"],
                ))],
            ),
            CatalogEntry::new(
                "Spooler",
                "",
                OptimizationCategory::Services,
                true,
                vec![Mutation::Service(ServiceChange {
                    service_name: "Spooler".into(),
                    start_mode: ServiceStartMode::Disabled,
                })],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn failed_key_does_not_stop_other_keys_or_items() {
        let registry = MockRegistry::default();
        registry.deny(&key(PRIORITY, "Win32PrioritySeparation"));
        let selected = vec![SelectedItem::enabled("Cpu"), SelectedItem::enabled("Mouse")];

        let result = apply_optimizations(
            &catalog(),
            &selected,
            &registry,
            &MockCommands::default(),
            &MockServices::default(),
            ELEVATED,
        );

        let cpu = result.outcome("Cpu").unwrap();
        assert_eq!(
            cpu.status,
            ItemStatus::Failed {
                kind: ErrorKind::AccessDenied
            }
        );
        assert_eq!(cpu.applied_mutations, 1);
        assert_eq!(cpu.errors.len(), 1);
        assert_eq!(
            registry.get(&key(PRIORITY, "IRQ8Priority")),
            Some(RegistryValue::DWord(1))
        );
        assert!(result.outcome("Mouse").unwrap().is_applied());
        assert!(result.succeeded());
        assert_eq!((result.applied_count(), result.failed_count()), (1, 1));
    }

    #[test]
    fn admin_items_are_not_attempted_without_elevation() {
        let registry = MockRegistry::default();
        let selected = vec![SelectedItem::enabled("Cpu"), SelectedItem::enabled("Mouse")];
        let ctx = ApplyContext {
            elevated: false,
            ..ELEVATED
        };

        let result = apply_optimizations(
            &catalog(),
            &selected,
            &registry,
            &MockCommands::default(),
            &MockServices::default(),
            ctx,
        );

        assert_eq!(
            result.outcome("Cpu").unwrap().status,
            ItemStatus::Failed {
                kind: ErrorKind::AccessDenied
            }
        );
        assert_eq!(registry.get(&key(PRIORITY, "IRQ8Priority")), None);
        assert!(result.outcome("Mouse").unwrap().is_applied());
    }

    #[test]
    fn disabled_and_unknown_selections_are_skipped() {
        let selected = vec![
            SelectedItem::disabled("Cpu"),
            SelectedItem::enabled("NoSuchTweak"),
        ];
        let result = apply_optimizations(
            &catalog(),
            &selected,
            &MockRegistry::default(),
            &MockCommands::default(),
            &MockServices::default(),
            ELEVATED,
        );
        assert_eq!(result.skipped_count(), 2);
        assert!(!result.succeeded());
    }

    #[test]
    fn nonzero_exit_is_external_tool_failure() {
        let commands = MockCommands::default();
        commands.failing.borrow_mut().insert("bcdedit".into());
        let result = apply_optimizations(
            &catalog(),
            &[SelectedItem::enabled("tick")],
            &MockRegistry::default(),
            &commands,
            &MockServices::default(),
            ELEVATED,
        );
        let tick = result.outcome("Tick").unwrap();
        assert_eq!(
            tick.status,
            ItemStatus::Failed {
                kind: ErrorKind::ExternalToolFailure
            }
        );
        assert!(tick.errors[0].contains("exited with 1"));
        assert_eq!(
            commands.calls.borrow().as_slice(),
            ["bcdedit /set disabledynamictick yes"]
        );
    }

    #[test]
    fn service_change_stops_and_disables() {
        let services = MockServices::default();
        let result = apply_optimizations(
            &catalog(),
            &[SelectedItem::enabled("Spooler")],
            &MockRegistry::default(),
            &MockCommands::default(),
            &services,
            ELEVATED,
        );
        assert!(result.outcome("Spooler").unwrap().is_applied());
        assert_eq!(services.stopped.borrow().as_slice(), ["Spooler"]);
        assert_eq!(
            services.modes.borrow().get("Spooler"),
            Some(&ServiceStartMode::Disabled)
        );
    }

    fn nagle_catalog() -> Catalog {
        let each = |name: &str| {
            Mutation::EachSubkey(
                SubkeyMutation::new(INTERFACES, name, RegistryValue::DWord(1)).unwrap(),
            )
        };
        Catalog::new(vec![CatalogEntry::new(
            "Nagle",
            "",
            OptimizationCategory::Network,
            true,
            vec![each("TcpAckFrequency"), each("TCPNoDelay")],
        )])
        .unwrap()
    }

    #[test]
    fn subkey_mutation_is_written_to_every_interface() {
        let registry = MockRegistry::default();
        let parent = r"SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces";
        registry.add_key(RegistryHive::LocalMachine, &format!("{parent}\\{{aaaa}}"));
        registry.add_key(RegistryHive::LocalMachine, &format!("{parent}\\{{bbbb}}"));
        let blocked = key(&format!("{INTERFACES}\\{{bbbb}}"), "TCPNoDelay");
        registry.deny(&blocked);

        let result = apply_optimizations(
            &nagle_catalog(),
            &[SelectedItem::enabled("Nagle")],
            &registry,
            &MockCommands::default(),
            &MockServices::default(),
            ELEVATED,
        );

        for (child, name) in [
            ("{aaaa}", "TcpAckFrequency"),
            ("{aaaa}", "TCPNoDelay"),
            ("{bbbb}", "TcpAckFrequency"),
        ] {
            assert_eq!(
                registry.get(&key(&format!("{INTERFACES}\\{child}"), name)),
                Some(RegistryValue::DWord(1)),
                "{child} {name}"
            );
        }
        assert_eq!(registry.get(&blocked), None);
        let nagle = result.outcome("Nagle").unwrap();
        assert_eq!(
            nagle.status,
            ItemStatus::Failed {
                kind: ErrorKind::AccessDenied
            }
        );
        assert_eq!(nagle.applied_mutations, 1);
    }

    #[test]
    fn subkey_mutation_without_interfaces_is_a_no_op() {
        let registry = MockRegistry::default();
        let result = apply_optimizations(
            &nagle_catalog(),
            &[SelectedItem::enabled("Nagle")],
            &registry,
            &MockCommands::default(),
            &MockServices::default(),
            ELEVATED,
        );
        assert!(result.outcome("Nagle").unwrap().is_applied());
        assert!(registry.values.borrow().is_empty());
    }
}
