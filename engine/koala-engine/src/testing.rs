//! テスト用のポート実装

use koala_domain::DomainError;
use koala_domain::model::{
    BackupSnapshot, CommandInvocation, RegistryHive, RegistryKey, RegistryValue,
    ServiceStartMode,
};
use koala_domain::port::driven::{
    AntivirusProduct, BackupStore, Clock, CommandOutput, CommandRunner, DriveSpace, GpuAdapter,
    NetworkAdapter, RegistryStore, ServiceControl, SystemProbe,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub fn key(path: &str, name: &str) -> RegistryKey {
    RegistryKey::new(path, name).unwrap()
}

#[derive(Default)]
pub struct MockRegistry {
    pub values: RefCell<HashMap<RegistryKey, RegistryValue>>,
    /// 書き込み・削除を拒否するキー
    pub deny_writes: RefCell<HashSet<RegistryKey>>,
    /// 読み取りがI/Oエラーになるキー
    pub broken_reads: RefCell<HashSet<RegistryKey>>,
    pub missing_subkeys: RefCell<HashSet<String>>,
    /// 値を持たないキー（ハイブを除いたパス）
    pub empty_keys: RefCell<Vec<(RegistryHive, String)>>,
    /// キーの存在確認・列挙を失敗させる
    pub unavailable: bool,
}

impl MockRegistry {
    pub fn set(&self, key: &RegistryKey, value: RegistryValue) {
        self.values.borrow_mut().insert(key.clone(), value);
    }

    pub fn get(&self, key: &RegistryKey) -> Option<RegistryValue> {
        self.values.borrow().get(key).cloned()
    }

    pub fn deny(&self, key: &RegistryKey) {
        self.deny_writes.borrow_mut().insert(key.clone());
    }

    pub fn add_key(&self, hive: RegistryHive, subkey: &str) {
        self.empty_keys
            .borrow_mut()
            .push((hive, subkey.to_string()));
    }
}

impl RegistryStore for MockRegistry {
    fn read_value(&self, key: &RegistryKey) -> Result<Option<RegistryValue>, DomainError> {
        if self.broken_reads.borrow().contains(key) {
            return Err(DomainError::IoError(format!("read failed: {key}")));
        }
        Ok(self.get(key))
    }

    fn write_value(&self, key: &RegistryKey, value: &RegistryValue) -> Result<(), DomainError> {
        if self.deny_writes.borrow().contains(key) {
            return Err(DomainError::AccessDenied(key.to_string()));
        }
        self.set(key, value.clone());
        Ok(())
    }

    fn delete_value(&self, key: &RegistryKey) -> Result<(), DomainError> {
        if self.deny_writes.borrow().contains(key) {
            return Err(DomainError::AccessDenied(key.to_string()));
        }
        self.values.borrow_mut().remove(key);
        Ok(())
    }

    fn key_exists(&self, _hive: RegistryHive, subkey: &str) -> Result<bool, DomainError> {
        if self.unavailable {
            return Err(DomainError::IoError(format!("cannot open {subkey}")));
        }
        Ok(!self.missing_subkeys.borrow().contains(subkey))
    }

    /// 値のあるキーと `empty_keys` から直下の子を拾う
    fn subkeys(&self, hive: RegistryHive, subkey: &str) -> Result<Vec<String>, DomainError> {
        if self.unavailable {
            return Err(DomainError::IoError(format!("cannot enumerate {subkey}")));
        }
        let prefix = format!("{}\\", subkey.to_ascii_lowercase());
        let mut paths: Vec<(RegistryHive, String)> = self
            .values
            .borrow()
            .keys()
            .map(|k| (k.hive(), k.subkey().to_string()))
            .collect();
        paths.extend(self.empty_keys.borrow().iter().cloned());

        let mut children: Vec<String> = Vec::new();
        for (key_hive, path) in &paths {
            if *key_hive != hive {
                continue;
            }
            if !path.to_ascii_lowercase().starts_with(&prefix) {
                continue;
            }
            let child = path[prefix.len()..].split('\\').next().unwrap_or_default();
            if !child.is_empty() && !children.iter().any(|c| c.eq_ignore_ascii_case(child)) {
                children.push(child.to_string());
            }
        }
        children.sort();
        Ok(children)
    }
}

#[derive(Default)]
pub struct MockBackupStore {
    pub snapshot: RefCell<Option<BackupSnapshot>>,
    pub creates: Cell<usize>,
}

impl BackupStore for MockBackupStore {
    fn exists(&self) -> Result<bool, DomainError> {
        Ok(self.snapshot.borrow().is_some())
    }

    fn load(&self) -> Result<BackupSnapshot, DomainError> {
        self.snapshot
            .borrow()
            .clone()
            .ok_or_else(|| DomainError::BackupMissing("mock".into()))
    }

    fn create(&self, snapshot: &BackupSnapshot) -> Result<(), DomainError> {
        if self.snapshot.borrow().is_some() {
            return Err(DomainError::BackupAlreadyExists("mock".into()));
        }
        self.creates.set(self.creates.get() + 1);
        *self.snapshot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), DomainError> {
        *self.snapshot.borrow_mut() = None;
        Ok(())
    }

    fn location(&self) -> String {
        "mock".into()
    }
}

/// 呼ばれるたびに `step_ms` ずつ進む時計
#[derive(Default)]
pub struct MockClock {
    pub now: Cell<u64>,
    pub step_ms: u64,
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step_ms);
        now
    }

    fn now_iso8601(&self) -> String {
        "2025-01-01T00:00:00.000Z".into()
    }
}

#[derive(Default)]
pub struct MockCommands {
    pub calls: RefCell<Vec<String>>,
    /// 非ゼロ終了させる実行ファイル名
    pub failing: RefCell<HashSet<String>>,
}

impl CommandRunner for MockCommands {
    fn run(
        &self,
        command: &CommandInvocation,
        _timeout_ms: u64,
    ) -> Result<CommandOutput, DomainError> {
        self.calls.borrow_mut().push(command.display_line());
        let exit_code = if self.failing.borrow().contains(&command.executable) {
            1
        } else {
            0
        };
        Ok(CommandOutput {
            exit_code,
            stdout: String::new(),
            stderr: if exit_code == 0 {
                String::new()
            } else {
                "The parameter is incorrect.".into()
            },
        })
    }
}

#[derive(Default)]
pub struct MockServices {
    pub modes: RefCell<HashMap<String, ServiceStartMode>>,
    pub stopped: RefCell<Vec<String>>,
    pub not_running: RefCell<HashSet<String>>,
}

impl ServiceControl for MockServices {
    fn stop(&self, service: &str) -> Result<(), DomainError> {
        self.stopped.borrow_mut().push(service.to_string());
        Ok(())
    }

    fn set_start_mode(&self, service: &str, mode: ServiceStartMode) -> Result<(), DomainError> {
        self.modes.borrow_mut().insert(service.to_string(), mode);
        Ok(())
    }

    fn is_running(&self, service: &str) -> Result<bool, DomainError> {
        Ok(!self.not_running.borrow().contains(service))
    }
}

/// 既定では健全なマシンを返す。`failing` で全問い合わせを失敗させる。
pub struct MockProbe {
    pub failing: bool,
    pub elevated: bool,
    pub drives: Vec<DriveSpace>,
    pub processes: Vec<String>,
    pub antivirus: Vec<AntivirusProduct>,
    pub crashes: u32,
    pub missing_files: Vec<String>,
    pub manufacturer: String,
    pub domain_joined: bool,
    pub gpus: Vec<GpuAdapter>,
    pub adapters: Vec<NetworkAdapter>,
    pub ping_ok: bool,
    pub displays: u32,
}

impl Default for MockProbe {
    fn default() -> Self {
        Self {
            failing: false,
            elevated: true,
            drives: vec![DriveSpace {
                name: "C:\\".into(),
                total_bytes: 500,
                available_bytes: 250,
                is_system: true,
            }],
            processes: ["winlogon", "csrss", "wininit", "services", "lsass", "explorer"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            antivirus: vec![AntivirusProduct {
                name: "Windows Defender".into(),
                product_state: 0x61100,
            }],
            crashes: 0,
            missing_files: Vec::new(),
            manufacturer: "ASUSTeK COMPUTER INC.".into(),
            domain_joined: false,
            gpus: vec![GpuAdapter {
                name: "NVIDIA GeForce RTX 4070".into(),
                discrete: true,
            }],
            adapters: vec![NetworkAdapter {
                name: "Ethernet".into(),
                description: "Realtek PCIe 2.5GbE Family Controller".into(),
            }],
            ping_ok: true,
            displays: 1,
        }
    }
}

impl MockProbe {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn answer<T>(&self, value: T) -> Result<T, DomainError> {
        if self.failing {
            Err(DomainError::Unsupported("probe unavailable".into()))
        } else {
            Ok(value)
        }
    }
}

impl SystemProbe for MockProbe {
    fn is_elevated(&self) -> Result<bool, DomainError> {
        self.answer(self.elevated)
    }

    fn fixed_drives(&self) -> Result<Vec<DriveSpace>, DomainError> {
        self.answer(self.drives.clone())
    }

    fn running_processes(&self) -> Result<Vec<String>, DomainError> {
        self.answer(self.processes.clone())
    }

    fn antivirus_products(&self) -> Result<Vec<AntivirusProduct>, DomainError> {
        self.answer(self.antivirus.clone())
    }

    fn recent_crash_count(&self, _days: u32) -> Result<u32, DomainError> {
        self.answer(self.crashes)
    }

    fn missing_system_files(&self, _files: &[String]) -> Result<Vec<String>, DomainError> {
        self.answer(self.missing_files.clone())
    }

    fn system_manufacturer(&self) -> Result<String, DomainError> {
        self.answer(self.manufacturer.clone())
    }

    fn is_domain_joined(&self) -> Result<bool, DomainError> {
        self.answer(self.domain_joined)
    }

    fn gpu_adapters(&self) -> Result<Vec<GpuAdapter>, DomainError> {
        self.answer(self.gpus.clone())
    }

    fn network_adapters(&self) -> Result<Vec<NetworkAdapter>, DomainError> {
        self.answer(self.adapters.clone())
    }

    fn ping(&self, _host: &str, _timeout_ms: u64) -> Result<bool, DomainError> {
        self.answer(self.ping_ok)
    }

    fn display_count(&self) -> Result<u32, DomainError> {
        self.answer(self.displays)
    }
}
