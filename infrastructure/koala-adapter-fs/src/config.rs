//! 設定ファイル（JSON）

use super::write_atomic;
use koala_domain::DomainError;
use koala_domain::model::{OptimizerConfig, ValidationSettings};
use koala_domain::port::driven::ConfigRepository;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = "koala-config.json";

/// `<root>/config/koala-config.json` に保存する設定リポジトリ
#[derive(Debug, Clone)]
pub struct FsConfigRepository {
    path: PathBuf,
}

impl FsConfigRepository {
    /// 指定ディレクトリ配下に設定ファイルを置く。ファイルは遅延作成。
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            path: config_dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigRepository for FsConfigRepository {
    /// 未作成・破損・不正値のいずれも既定値で続行する
    fn load(&self) -> Result<OptimizerConfig, DomainError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(OptimizerConfig::default());
            }
            Err(e) => return Err(DomainError::IoError(format!("read config: {e}"))),
        };
        let dto: ConfigDto = match serde_json::from_str(&data) {
            Ok(dto) => dto,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "設定ファイルが壊れているため既定値を使用");
                return Ok(OptimizerConfig::default());
            }
        };
        let config = OptimizerConfig::from(dto);
        if let Err(e) = config.validate() {
            warn!(path = %self.path.display(), error = %e, "設定値が不正なため既定値を使用");
            return Ok(OptimizerConfig::default());
        }
        Ok(config)
    }

    fn save(&self, config: &OptimizerConfig) -> Result<(), DomainError> {
        config.validate()?;
        let dto = ConfigDto::from(config);
        let data = serde_json::to_string_pretty(&dto)
            .map_err(|e| DomainError::IoError(format!("serialize config: {e}")))?;
        write_atomic(&self.path, data.as_bytes())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

// ---------- DTO 定義 ----------

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ConfigDto {
    backup_file_name: String,
    helper_timeout_ms: u64,
    validation: ValidationDto,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ValidationDto {
    ping_target: String,
    ping_timeout_ms: u64,
    responsiveness_limit_ms: u64,
    crash_window_days: u32,
    crash_threshold: u32,
    low_disk_percent: u8,
    low_system_disk_percent: u8,
    critical_processes: Vec<String>,
    critical_services: Vec<String>,
    system_files: Vec<String>,
}

impl Default for ConfigDto {
    fn default() -> Self {
        Self::from(&OptimizerConfig::default())
    }
}

impl Default for ValidationDto {
    fn default() -> Self {
        Self::from(&ValidationSettings::default())
    }
}

impl From<&OptimizerConfig> for ConfigDto {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            backup_file_name: config.backup_file_name.clone(),
            helper_timeout_ms: config.helper_timeout_ms,
            validation: ValidationDto::from(&config.validation),
        }
    }
}

impl From<&ValidationSettings> for ValidationDto {
    fn from(v: &ValidationSettings) -> Self {
        Self {
            ping_target: v.ping_target.clone(),
            ping_timeout_ms: v.ping_timeout_ms,
            responsiveness_limit_ms: v.responsiveness_limit_ms,
            crash_window_days: v.crash_window_days,
            crash_threshold: v.crash_threshold,
            low_disk_percent: v.low_disk_percent,
            low_system_disk_percent: v.low_system_disk_percent,
            critical_processes: v.critical_processes.clone(),
            critical_services: v.critical_services.clone(),
            system_files: v.system_files.clone(),
        }
    }
}

impl From<ConfigDto> for OptimizerConfig {
    fn from(dto: ConfigDto) -> Self {
        let v = dto.validation;
        Self {
            backup_file_name: dto.backup_file_name,
            helper_timeout_ms: dto.helper_timeout_ms,
            validation: ValidationSettings {
                ping_target: v.ping_target,
                ping_timeout_ms: v.ping_timeout_ms,
                responsiveness_limit_ms: v.responsiveness_limit_ms,
                crash_window_days: v.crash_window_days,
                crash_threshold: v.crash_threshold,
                low_disk_percent: v.low_disk_percent,
                low_system_disk_percent: v.low_system_disk_percent,
                critical_processes: v.critical_processes,
                critical_services: v.critical_services,
                system_files: v.system_files,
            },
        }
    }
}
