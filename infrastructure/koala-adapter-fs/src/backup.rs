//! バックアップファイル（JSON）

use super::{NewFileError, write_new_atomic};
use koala_domain::DomainError;
use koala_domain::model::{
    BACKUP_FORMAT_VERSION, BackupRecord, BackupSnapshot, RegistryKey, RegistryValue,
    RegistryValueKind,
};
use koala_domain::port::driven::BackupStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// 固定パスのバックアップファイル
#[derive(Debug, Clone)]
pub struct FsBackupStore {
    path: PathBuf,
}

impl FsBackupStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupStore for FsBackupStore {
    fn exists(&self) -> Result<bool, DomainError> {
        self.path
            .try_exists()
            .map_err(|e| DomainError::IoError(format!("stat backup: {e}")))
    }

    fn load(&self) -> Result<BackupSnapshot, DomainError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DomainError::BackupMissing(self.location()));
            }
            Err(e) => return Err(DomainError::IoError(format!("read backup: {e}"))),
        };
        let dto: BackupFileDto = serde_json::from_str(&data)
            .map_err(|e| DomainError::IoError(format!("parse backup: {e}")))?;
        BackupSnapshot::try_from(dto)
    }

    fn create(&self, snapshot: &BackupSnapshot) -> Result<(), DomainError> {
        let dto = BackupFileDto::from(snapshot);
        let data = serde_json::to_string_pretty(&dto)
            .map_err(|e| DomainError::IoError(format!("serialize backup: {e}")))?;
        match write_new_atomic(&self.path, data.as_bytes()) {
            Ok(()) => Ok(()),
            Err(NewFileError::AlreadyExists) => {
                Err(DomainError::BackupAlreadyExists(self.location()))
            }
            Err(NewFileError::Io(e)) => Err(e),
        }
    }

    fn remove(&self) -> Result<(), DomainError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::IoError(format!("remove backup: {e}"))),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------- DTO 定義 ----------

#[derive(Serialize, Deserialize)]
struct BackupFileDto {
    version: u32,
    created_at: String,
    records: Vec<RecordDto>,
}

/// `value_kind` は保存した値の型（値がなければカタログ上の型）
#[derive(Serialize, Deserialize)]
struct RecordDto {
    hive_path: String,
    value_name: String,
    value_kind: String,
    original_value: Value,
    captured_at: String,
}

impl From<&BackupSnapshot> for BackupFileDto {
    fn from(snapshot: &BackupSnapshot) -> Self {
        Self {
            version: BACKUP_FORMAT_VERSION,
            created_at: snapshot.created_at().to_string(),
            records: snapshot.records().iter().map(RecordDto::from).collect(),
        }
    }
}

impl From<&BackupRecord> for RecordDto {
    fn from(record: &BackupRecord) -> Self {
        let kind = record
            .original
            .as_ref()
            .map(RegistryValue::kind)
            .unwrap_or(record.kind);
        Self {
            hive_path: record.key.hive_path(),
            value_name: record.key.value_name().to_string(),
            value_kind: kind.as_str().to_string(),
            original_value: encode_value(record.original.as_ref()),
            captured_at: record.captured_at.clone(),
        }
    }
}

impl TryFrom<BackupFileDto> for BackupSnapshot {
    type Error = DomainError;

    fn try_from(dto: BackupFileDto) -> Result<Self, Self::Error> {
        if dto.version != BACKUP_FORMAT_VERSION {
            return Err(DomainError::IoError(format!(
                "unsupported backup version {} (expected {BACKUP_FORMAT_VERSION})",
                dto.version
            )));
        }
        let records = dto
            .records
            .into_iter()
            .map(BackupRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        BackupSnapshot::from_records(dto.created_at, records)
    }
}

impl TryFrom<RecordDto> for BackupRecord {
    type Error = DomainError;

    fn try_from(dto: RecordDto) -> Result<Self, Self::Error> {
        let key = RegistryKey::new(&dto.hive_path, dto.value_name)?;
        let kind = RegistryValueKind::parse(&dto.value_kind).ok_or_else(|| {
            DomainError::IoError(format!("unknown value kind {:?} for {key}", dto.value_kind))
        })?;
        let original = decode_value(kind, &dto.original_value)
            .ok_or_else(|| DomainError::IoError(format!("malformed original value for {key}")))?;
        Ok(Self {
            key,
            kind,
            original,
            captured_at: dto.captured_at,
        })
    }
}

/// QWORDはJSON数値の精度を超えうるため10進文字列で保存
fn encode_value(value: Option<&RegistryValue>) -> Value {
    match value {
        None => Value::Null,
        Some(RegistryValue::DWord(v)) => Value::from(*v),
        Some(RegistryValue::QWord(v)) => Value::String(v.to_string()),
        Some(RegistryValue::String(s)) => Value::String(s.clone()),
    }
}

/// 外側のNoneは形式不正、内側のNoneは「元々存在しない」
fn decode_value(kind: RegistryValueKind, value: &Value) -> Option<Option<RegistryValue>> {
    if value.is_null() {
        return Some(None);
    }
    let decoded = match kind {
        RegistryValueKind::DWord => {
            RegistryValue::DWord(u32::try_from(value.as_u64()?).ok()?)
        }
        RegistryValueKind::QWord => match value {
            Value::String(s) => RegistryValue::QWord(s.parse().ok()?),
            other => RegistryValue::QWord(other.as_u64()?),
        },
        RegistryValueKind::String => RegistryValue::String(value.as_str()?.to_string()),
    };
    Some(Some(decoded))
}
