use crate::DomainError;

pub const DEFAULT_BACKUP_FILE_NAME: &str = "Koala-Backup-V3.json";
const DEFAULT_HELPER_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_PING_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_RESPONSIVENESS_LIMIT_MS: u64 = 1_000;
const MAX_TIMEOUT_MS: u64 = 120_000;

/// 検証関連のしきい値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSettings {
    pub ping_target: String,
    pub ping_timeout_ms: u64,
    pub responsiveness_limit_ms: u64,
    /// 直近何日のクラッシュを数えるか
    pub crash_window_days: u32,
    /// この件数以上で致命的扱い
    pub crash_threshold: u32,
    /// 一般ドライブの空き容量警告（%）
    pub low_disk_percent: u8,
    /// システムドライブの空き容量警告（%）
    pub low_system_disk_percent: u8,
    pub critical_processes: Vec<String>,
    pub critical_services: Vec<String>,
    pub system_files: Vec<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            ping_target: "8.8.8.8".into(),
            ping_timeout_ms: DEFAULT_PING_TIMEOUT_MS,
            responsiveness_limit_ms: DEFAULT_RESPONSIVENESS_LIMIT_MS,
            crash_window_days: 7,
            crash_threshold: 3,
            low_disk_percent: 10,
            low_system_disk_percent: 20,
            critical_processes: to_strings(&["winlogon", "csrss", "wininit", "services", "lsass"]),
            critical_services: to_strings(&["Winmgmt", "RpcSs", "Dhcp", "Dnscache", "EventLog"]),
            system_files: to_strings(&["kernel32.dll", "ntdll.dll", "user32.dll", "advapi32.dll"]),
        }
    }
}

/// オプティマイザ全体の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    pub backup_file_name: String,
    /// 外部ヘルパープロセスの待機上限
    pub helper_timeout_ms: u64,
    pub validation: ValidationSettings,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            backup_file_name: DEFAULT_BACKUP_FILE_NAME.into(),
            helper_timeout_ms: DEFAULT_HELPER_TIMEOUT_MS,
            validation: ValidationSettings::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        let name = self.backup_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\', '\0']) {
            return Err(DomainError::InvalidConfig(format!(
                "backup_file_name must be a plain file name: {:?}",
                self.backup_file_name
            )));
        }
        check_timeout("helper_timeout_ms", self.helper_timeout_ms)?;
        let v = &self.validation;
        check_timeout("ping_timeout_ms", v.ping_timeout_ms)?;
        check_timeout("responsiveness_limit_ms", v.responsiveness_limit_ms)?;
        if v.ping_target.trim().is_empty() {
            return Err(DomainError::InvalidConfig("ping_target is empty".into()));
        }
        if v.crash_window_days == 0 || v.crash_threshold == 0 {
            return Err(DomainError::InvalidConfig(
                "crash_window_days and crash_threshold must be positive".into(),
            ));
        }
        for (field, value) in [
            ("low_disk_percent", v.low_disk_percent),
            ("low_system_disk_percent", v.low_system_disk_percent),
        ] {
            if value == 0 || value > 100 {
                return Err(DomainError::InvalidConfig(format!(
                    "{field} must be within 1-100 (got {value})"
                )));
            }
        }
        Ok(())
    }
}

fn check_timeout(field: &str, value: u64) -> Result<(), DomainError> {
    if value == 0 || value > MAX_TIMEOUT_MS {
        return Err(DomainError::InvalidConfig(format!(
            "{field} must be within 1-{MAX_TIMEOUT_MS} (got {value})"
        )));
    }
    Ok(())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = OptimizerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.backup_file_name, "Koala-Backup-V3.json");
        assert_eq!(cfg.validation.ping_timeout_ms, 5_000);
        assert_eq!(cfg.validation.critical_services.len(), 5);
    }

    #[test]
    fn rejects_path_in_backup_name() {
        let mut cfg = OptimizerConfig::default();
        cfg.backup_file_name = r"..\evil.json".into();
        assert!(matches!(cfg.validate(), Err(DomainError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_timeout_and_bad_percent() {
        let mut cfg = OptimizerConfig::default();
        cfg.helper_timeout_ms = 0;
        assert_eq!(
            cfg.validate(),
            Err(DomainError::InvalidConfig(format!(
                "helper_timeout_ms must be within 1-{MAX_TIMEOUT_MS} (got 0)"
            )))
        );

        let mut cfg = OptimizerConfig::default();
        cfg.validation.low_disk_percent = 101;
        assert_eq!(
            cfg.validate(),
            Err(DomainError::InvalidConfig(
                "low_disk_percent must be within 1-100 (got 101)".into()
            ))
        );
    }
}
