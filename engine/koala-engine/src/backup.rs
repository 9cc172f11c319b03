//! バックアップ作成と復元

use koala_domain::model::{
    BackupRecord, BackupReport, BackupSnapshot, BackupStatus, RegistryKey, RegistryValueKind,
    RestoreReport,
};
use koala_domain::port::driven::{BackupStore, Clock, RegistryStore};
use koala_domain::{Catalog, DomainError};
use tracing::{info, warn};

/// カタログが触れうる全キーの現在値を記録する
///
/// - 既にバックアップがあれば `BackupAlreadyExists`（最初のスナップショットを守る）
/// - 値が存在しないキーは `original = None` として記録
/// - サブキー展開の対象は現在のサブキーごとに記録
/// - 読めないキーはログに残して記録から外し、続行する
/// - 1件も記録できなければ最初の読み取りエラーを返し、何も書かない
pub fn create_backup(
    catalog: &Catalog,
    registry: &(impl RegistryStore + ?Sized),
    store: &(impl BackupStore + ?Sized),
    clock: &(impl Clock + ?Sized),
) -> Result<BackupReport, DomainError> {
    if store.exists()? {
        return Err(DomainError::BackupAlreadyExists(store.location()));
    }

    let created_at = clock.now_iso8601();
    let mut snapshot = BackupSnapshot::new(created_at.clone());
    let mut absent = 0;
    let mut skipped: Vec<(String, String)> = Vec::new();
    let mut first_error: Option<DomainError> = None;
    let mut skip = |label: String, e: DomainError| {
        warn!(key = %label, error = %e, "バックアップ対象を読めないため除外");
        skipped.push((label, e.to_string()));
        first_error.get_or_insert(e);
    };

    let mut targets: Vec<(RegistryKey, RegistryValueKind)> = catalog.backup_keys().to_vec();
    for template in catalog.subkey_targets() {
        let children = match registry.subkeys(template.hive(), template.parent()) {
            Ok(children) => children,
            Err(e) => {
                skip(format!("{}\\*\\{}", template.parent_path(), template.value_name), e);
                continue;
            }
        };
        for child in children {
            match template.key_for(&child) {
                Ok(key) => targets.push((key, template.kind())),
                Err(e) => skip(format!("{}\\{child}", template.parent_path()), e),
            }
        }
    }

    for (key, kind) in targets {
        let original = match registry.read_value(&key) {
            Ok(value) => value,
            Err(DomainError::KeyNotFound(_)) => None,
            Err(e) => {
                skip(key.to_string(), e);
                continue;
            }
        };
        if original.is_none() {
            absent += 1;
        }
        snapshot.insert(BackupRecord {
            key,
            kind,
            original,
            captured_at: created_at.clone(),
        });
    }

    if snapshot.is_empty() {
        return Err(first_error.unwrap_or_else(|| {
            DomainError::ValidationError("catalog has no registry values to back up".into())
        }));
    }

    store.create(&snapshot)?;
    info!(
        records = snapshot.len(),
        absent,
        skipped = skipped.len(),
        location = %store.location(),
        "バックアップを作成"
    );

    Ok(BackupReport {
        records: snapshot.len(),
        absent,
        location: store.location(),
        skipped,
    })
}

/// バックアップから書き戻す（ベストエフォート）
///
/// 記録された値があれば書き込み、なければ値を削除する。
/// キー単位の失敗はログに残して続行し、1件も戻せなければ `NothingRestored`。
pub fn restore_from_backup(
    store: &(impl BackupStore + ?Sized),
    registry: &(impl RegistryStore + ?Sized),
) -> Result<RestoreReport, DomainError> {
    let snapshot = store.load()?;
    let mut report = RestoreReport::default();

    for record in snapshot.records() {
        let label = record.key.to_string();
        let result = match &record.original {
            Some(value) => registry.write_value(&record.key, value),
            None => registry.delete_value(&record.key),
        };
        match result {
            Ok(()) if record.original.is_some() => report.restored.push(label),
            Ok(()) => report.deleted.push(label),
            Err(e) => {
                warn!(key = %label, error = %e, "復元に失敗");
                report.failed.push((label, e.to_string()));
            }
        }
    }

    if report.restored_count() == 0 {
        return Err(DomainError::NothingRestored(format!(
            "{} records, {} failed",
            snapshot.len(),
            report.failed.len()
        )));
    }

    info!(
        restored = report.restored.len(),
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "バックアップから復元"
    );
    Ok(report)
}

/// 表示用の状態（読めない場合は `records: None`）
pub fn backup_status(store: &(impl BackupStore + ?Sized)) -> BackupStatus {
    let location = store.location();
    let exists = match store.exists() {
        Ok(exists) => exists,
        Err(e) => {
            warn!(error = %e, "バックアップの存在確認に失敗");
            false
        }
    };
    let records = if exists {
        match store.load() {
            Ok(snapshot) => Some(snapshot.len()),
            Err(e) => {
                warn!(error = %e, "バックアップの読み込みに失敗");
                None
            }
        }
    } else {
        None
    };
    BackupStatus {
        exists,
        location,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackupStore, MockClock, MockRegistry, key};
    use koala_domain::catalog::CatalogEntry;
    use koala_domain::model::{
        Mutation, OptimizationCategory, RegistryHive, RegistryMutation, RegistryValue,
        SubkeyMutation,
    };

    const PRIORITY: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\PriorityControl";
    const GAME: &str = r"HKEY_CURRENT_USER\System\GameConfigStore";
    const INTERFACES: &str =
        r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces";
    const PROFILE: &str =
        r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows NT\CurrentVersion\Multimedia\SystemProfile";

    fn write(k: &RegistryKey, value: RegistryValue) -> Mutation {
        Mutation::Registry(RegistryMutation {
            key: k.clone(),
            value,
        })
    }

    fn five_keys() -> Vec<RegistryKey> {
        vec![
            key(PRIORITY, "Win32PrioritySeparation"),
            key(PRIORITY, "IRQ8Priority"),
            key(GAME, "GameDVR_Enabled"),
            key(PROFILE, "NetworkThrottlingIndex"),
            key(PROFILE, "Tag"),
        ]
    }

    /// 3項目・5キーのカタログ（QWORDと文字列を含む）
    fn small_catalog() -> Catalog {
        let k = five_keys();
        Catalog::new(vec![
            CatalogEntry::new(
                "Cpu",
                "",
                OptimizationCategory::Cpu,
                true,
                vec![
                    write(&k[0], RegistryValue::DWord(38)),
                    write(&k[1], RegistryValue::DWord(1)),
                ],
            ),
            CatalogEntry::new(
                "Dvr",
                "",
                OptimizationCategory::Gaming,
                false,
                vec![write(&k[2], RegistryValue::DWord(0))],
            ),
            CatalogEntry::new(
                "Profile",
                "",
                OptimizationCategory::Network,
                true,
                vec![
                    write(&k[3], RegistryValue::QWord(u64::MAX)),
                    write(&k[4], RegistryValue::String("High".into())),
                    write(&k[0], RegistryValue::DWord(2)),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn scenario_backup_mutate_restore() {
        let catalog = small_catalog();
        let registry = MockRegistry::default();
        let store = MockBackupStore::default();
        let clock = MockClock::default();
        let k = five_keys();
        registry.set(&k[0], RegistryValue::DWord(2));
        registry.set(&k[1], RegistryValue::DWord(0));
        registry.set(&k[3], RegistryValue::QWord(10));
        registry.set(&k[4], RegistryValue::String("Medium".into()));

        let report = create_backup(&catalog, &registry, &store, &clock).unwrap();
        assert_eq!(report.records, 5);
        assert_eq!(report.absent, 1);

        // サブシステム外での変更
        registry.set(&k[0], RegistryValue::DWord(38));
        registry.set(&k[2], RegistryValue::DWord(0));

        let restored = restore_from_backup(&store, &registry).unwrap();
        assert_eq!(restored.restored_count(), 5);
        assert!(restored.failed.is_empty());
        assert_eq!(registry.get(&k[0]), Some(RegistryValue::DWord(2)));
        assert_eq!(registry.get(&k[1]), Some(RegistryValue::DWord(0)));
        assert_eq!(registry.get(&k[2]), None);
        assert_eq!(registry.get(&k[3]), Some(RegistryValue::QWord(10)));
        assert_eq!(registry.get(&k[4]), Some(RegistryValue::String("Medium".into())));
    }

    #[test]
    fn immediate_restore_leaves_every_kind_unchanged() {
        let catalog = small_catalog();
        let registry = MockRegistry::default();
        let store = MockBackupStore::default();
        let k = five_keys();
        registry.set(&k[0], RegistryValue::DWord(u32::MAX));
        registry.set(&k[1], RegistryValue::DWord(0));
        registry.set(&k[2], RegistryValue::DWord(1));
        registry.set(&k[3], RegistryValue::QWord(u64::MAX - 1));
        registry.set(&k[4], RegistryValue::String("日本語 value".into()));
        let before = registry.values.borrow().clone();

        create_backup(&catalog, &registry, &store, &MockClock::default()).unwrap();
        restore_from_backup(&store, &registry).unwrap();

        assert_eq!(*registry.values.borrow(), before);
    }

    #[test]
    fn second_backup_is_rejected_and_first_snapshot_kept() {
        let catalog = small_catalog();
        let registry = MockRegistry::default();
        let store = MockBackupStore::default();
        let clock = MockClock::default();
        let k = five_keys();
        registry.set(&k[0], RegistryValue::DWord(2));

        create_backup(&catalog, &registry, &store, &clock).unwrap();
        registry.set(&k[0], RegistryValue::DWord(38));
        let second = create_backup(&catalog, &registry, &store, &clock);

        assert!(matches!(second, Err(DomainError::BackupAlreadyExists(_))));
        assert_eq!(store.creates.get(), 1);
        let snapshot = store.load().unwrap();
        assert_eq!(
            snapshot.get(&k[0]).unwrap().original,
            Some(RegistryValue::DWord(2))
        );
    }

    #[test]
    fn absent_key_is_deleted_on_restore() {
        let k = key(GAME, "GameDVR_Enabled");
        let catalog = Catalog::new(vec![CatalogEntry::new(
            "Dvr",
            "",
            OptimizationCategory::Gaming,
            false,
            vec![write(&k, RegistryValue::DWord(0))],
        )])
        .unwrap();
        let registry = MockRegistry::default();
        let store = MockBackupStore::default();

        create_backup(&catalog, &registry, &store, &MockClock::default()).unwrap();
        assert_eq!(store.load().unwrap().records()[0].original, None);

        registry.set(&k, RegistryValue::DWord(0));
        let report = restore_from_backup(&store, &registry).unwrap();
        assert_eq!(report.deleted, vec![k.to_string()]);
        assert_eq!(registry.get(&k), None);
    }

    #[test]
    fn unreadable_key_is_skipped_and_others_captured() {
        let catalog = small_catalog();
        let registry = MockRegistry::default();
        let k = five_keys();
        registry.set(&k[2], RegistryValue::DWord(1));
        registry.broken_reads.borrow_mut().insert(k[4].clone());
        let store = MockBackupStore::default();

        let report = create_backup(&catalog, &registry, &store, &MockClock::default()).unwrap();

        assert_eq!(report.records, 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, k[4].to_string());
        let snapshot = store.load().unwrap();
        assert!(!snapshot.contains(&k[4]));
        assert_eq!(
            snapshot.get(&k[2]).unwrap().original,
            Some(RegistryValue::DWord(1))
        );
    }

    #[test]
    fn nothing_readable_writes_nothing() {
        let catalog = small_catalog();
        let registry = MockRegistry::default();
        for k in five_keys() {
            registry.broken_reads.borrow_mut().insert(k);
        }
        let store = MockBackupStore::default();

        let result = create_backup(&catalog, &registry, &store, &MockClock::default());
        assert!(matches!(result, Err(DomainError::IoError(_))));
        assert!(!store.exists().unwrap());
    }

    #[test]
    fn interface_values_are_captured_per_subkey_and_restored() {
        let each = |name: &str| {
            Mutation::EachSubkey(
                SubkeyMutation::new(INTERFACES, name, RegistryValue::DWord(1)).unwrap(),
            )
        };
        let catalog = Catalog::new(vec![CatalogEntry::new(
            "Nagle",
            "",
            OptimizationCategory::Network,
            true,
            vec![each("TcpAckFrequency"), each("TCPNoDelay")],
        )])
        .unwrap();
        let registry = MockRegistry::default();
        let first = format!("{INTERFACES}\\{{aaaa}}");
        let second = format!("{INTERFACES}\\{{bbbb}}");
        registry.set(&key(&first, "TcpAckFrequency"), RegistryValue::DWord(2));
        registry.add_key(
            RegistryHive::LocalMachine,
            r"SYSTEM\CurrentControlSet\Services\Tcpip\Parameters\Interfaces\{bbbb}",
        );
        let store = MockBackupStore::default();

        let report = create_backup(&catalog, &registry, &store, &MockClock::default()).unwrap();
        assert_eq!(report.records, 4);
        assert_eq!(report.absent, 3);

        for path in [&first, &second] {
            registry.set(&key(path, "TcpAckFrequency"), RegistryValue::DWord(1));
            registry.set(&key(path, "TCPNoDelay"), RegistryValue::DWord(1));
        }
        let restored = restore_from_backup(&store, &registry).unwrap();
        assert_eq!(restored.restored.len(), 1);
        assert_eq!(restored.deleted.len(), 3);
        assert_eq!(
            registry.get(&key(&first, "TcpAckFrequency")),
            Some(RegistryValue::DWord(2))
        );
        assert_eq!(registry.get(&key(&first, "TCPNoDelay")), None);
        assert_eq!(registry.get(&key(&second, "TcpAckFrequency")), None);
        assert_eq!(registry.get(&key(&second, "TCPNoDelay")), None);
    }

    #[test]
    fn failed_subkey_enumeration_is_skipped() {
        let template =
            SubkeyMutation::new(INTERFACES, "TCPNoDelay", RegistryValue::DWord(1)).unwrap();
        let k = key(GAME, "GameDVR_Enabled");
        let catalog = Catalog::new(vec![CatalogEntry::new(
            "Mixed",
            "",
            OptimizationCategory::Network,
            true,
            vec![Mutation::EachSubkey(template), write(&k, RegistryValue::DWord(0))],
        )])
        .unwrap();
        let registry = MockRegistry {
            unavailable: true,
            ..MockRegistry::default()
        };
        let store = MockBackupStore::default();

        let report = create_backup(&catalog, &registry, &store, &MockClock::default()).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].0.ends_with(r"Interfaces\*\TCPNoDelay"));
    }

    #[test]
    fn restore_continues_past_failed_keys() {
        let catalog = small_catalog();
        let registry = MockRegistry::default();
        let store = MockBackupStore::default();
        let k = five_keys();
        registry.set(&k[0], RegistryValue::DWord(2));
        create_backup(&catalog, &registry, &store, &MockClock::default()).unwrap();

        registry.deny(&k[0]);
        let report = restore_from_backup(&store, &registry).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.restored_count(), 4);
    }

    #[test]
    fn restore_without_backup_or_successes_fails() {
        let registry = MockRegistry::default();
        let store = MockBackupStore::default();
        assert!(matches!(
            restore_from_backup(&store, &registry),
            Err(DomainError::BackupMissing(_))
        ));

        let k = key(GAME, "GameDVR_Enabled");
        *store.snapshot.borrow_mut() = Some(
            BackupSnapshot::from_records(
                "t0",
                vec![BackupRecord {
                    key: k.clone(),
                    kind: koala_domain::model::RegistryValueKind::DWord,
                    original: Some(RegistryValue::DWord(1)),
                    captured_at: "t0".into(),
                }],
            )
            .unwrap(),
        );
        registry.deny(&k);
        assert!(matches!(
            restore_from_backup(&store, &registry),
            Err(DomainError::NothingRestored(_))
        ));
    }

    #[test]
    fn status_reports_record_count() {
        let store = MockBackupStore::default();
        assert_eq!(backup_status(&store).records, None);

        create_backup(
            &small_catalog(),
            &MockRegistry::default(),
            &store,
            &MockClock::default(),
        )
        .unwrap();
        let status = backup_status(&store);
        assert!(status.exists);
        assert_eq!(status.records, Some(5));
    }
}
