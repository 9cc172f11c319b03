//! ファイルシステムアダプター（バックアップ/設定の永続化と操作ロック）
//! JSONファイルで実装。書き込みは一時ファイル経由で原子的に行う。

mod backup;
mod config;
mod lock;

pub use backup::FsBackupStore;
pub use config::{CONFIG_FILE_NAME, FsConfigRepository};
pub use lock::FsOperationLock;

use koala_domain::DomainError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn ensure_parent_dir(path: &Path) -> Result<(), DomainError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).map_err(|e| DomainError::IoError(format!("create_dir_all: {e}")))
}

/// 同じディレクトリに一時ファイルを書き出す
fn write_temp(path: &Path, data: &[u8]) -> Result<PathBuf, DomainError> {
    ensure_parent_dir(path)?;
    let suffix = unique_suffix();
    let tmp_path = path.with_extension(format!("tmp.{suffix}"));
    let mut f = fs::File::create(&tmp_path)
        .map_err(|e| DomainError::IoError(format!("create temp file: {e}")))?;
    if let Err(e) = f.write_all(data) {
        drop(f);
        let _ = fs::remove_file(&tmp_path);
        return Err(DomainError::IoError(format!("write temp file: {e}")));
    }
    let _ = f.sync_all();
    Ok(tmp_path)
}

/// 一時ファイル＋置換で上書き保存
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), DomainError> {
    let tmp_path = write_temp(path, data)?;
    if path.exists() {
        #[cfg(windows)]
        {
            if let Err(e) = replace_file(&tmp_path, path) {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
            return Ok(());
        }
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DomainError::IoError(format!("rename temp file: {e}"))
    })
}

/// 新規作成のみ（既存ファイルがあれば `AlreadyExists`）
///
/// 一時ファイルをハードリンクで公開するため、途中状態のファイルは見えない。
fn write_new_atomic(path: &Path, data: &[u8]) -> Result<(), NewFileError> {
    if path.exists() {
        return Err(NewFileError::AlreadyExists);
    }
    let tmp_path = write_temp(path, data)?;
    let published = match fs::hard_link(&tmp_path, path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(NewFileError::AlreadyExists),
        // ハードリンク非対応のボリューム（FAT等）
        Err(_) if !path.exists() => fs::rename(&tmp_path, path)
            .map_err(|e| NewFileError::Io(DomainError::IoError(format!("rename temp file: {e}")))),
        Err(_) => Err(NewFileError::AlreadyExists),
    };
    let _ = fs::remove_file(&tmp_path);
    published
}

enum NewFileError {
    AlreadyExists,
    Io(DomainError),
}

impl From<DomainError> for NewFileError {
    fn from(e: DomainError) -> Self {
        Self::Io(e)
    }
}

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}.{}", std::process::id(), nanos)
}

#[cfg(windows)]
fn replace_file(src: &Path, dst: &Path) -> Result<(), DomainError> {
    use std::os::windows::ffi::OsStrExt;
    use windows::Win32::Storage::FileSystem::{REPLACE_FILE_FLAGS, ReplaceFileW};
    use windows::core::PCWSTR;

    fn to_wide(path: &Path) -> Vec<u16> {
        let mut wide: Vec<u16> = path.as_os_str().encode_wide().collect();
        wide.push(0);
        wide
    }

    let src_w = to_wide(src);
    let dst_w = to_wide(dst);
    unsafe {
        ReplaceFileW(
            PCWSTR(dst_w.as_ptr()),
            PCWSTR(src_w.as_ptr()),
            PCWSTR::null(),
            REPLACE_FILE_FLAGS(0),
            None,
            None,
        )
        .map_err(|e| DomainError::IoError(format!("ReplaceFileW failed: {}", e.message())))?;
    }
    Ok(())
}
