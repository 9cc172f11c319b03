//! 操作ロック
//!
//! Windowsでは名前付きMutex（Global → Local の順に試行）、それ以外はロックファイル。
//! どちらも同一プロセス内の再入はフラグで拒否する。
//! ロックファイルに書かれたPIDのプロセスが既にいなければ、残骸として取り除く。

use koala_domain::DomainError;
use koala_domain::port::driven::{LockLease, OperationLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
#[cfg(not(windows))]
use tracing::warn;

#[cfg(windows)]
const MUTEX_NAME: &str = r"Global\KoalaOptimizerOperation";
#[cfg(windows)]
const MUTEX_NAME_LOCAL: &str = r"Local\KoalaOptimizerOperation";

const LOCK_FILE_NAME: &str = "koala.lock";

pub struct FsOperationLock {
    #[cfg_attr(windows, allow(dead_code))]
    lock_path: PathBuf,
    held: AtomicBool,
}

impl FsOperationLock {
    /// `lock_dir` はロックファイル方式でのみ使用する
    pub fn new(lock_dir: impl AsRef<Path>) -> Self {
        Self {
            lock_path: lock_dir.as_ref().join(LOCK_FILE_NAME),
            held: AtomicBool::new(false),
        }
    }
}

impl OperationLock for FsOperationLock {
    fn acquire(&self) -> Result<Box<dyn LockLease + '_>, DomainError> {
        if self
            .held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DomainError::Busy("operation already running in this process".into()));
        }
        match self.acquire_system_lock() {
            Ok(inner) => {
                debug!("操作ロックを取得");
                Ok(Box::new(Lease { owner: self, _inner: inner }))
            }
            Err(e) => {
                self.held.store(false, Ordering::Release);
                Err(e)
            }
        }
    }
}

struct Lease<'a> {
    owner: &'a FsOperationLock,
    _inner: SystemLock,
}

impl LockLease for Lease<'_> {}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // _inner はこの後にdropされる
        self.owner.held.store(false, Ordering::Release);
        debug!("操作ロックを解放");
    }
}

#[cfg(windows)]
struct SystemLock {
    handle: windows::Win32::Foundation::HANDLE,
}

#[cfg(windows)]
impl Drop for SystemLock {
    fn drop(&mut self) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::ReleaseMutex;
        unsafe {
            let _ = ReleaseMutex(self.handle);
            let _ = CloseHandle(self.handle);
        }
    }
}

#[cfg(windows)]
impl FsOperationLock {
    fn acquire_system_lock(&self) -> Result<SystemLock, DomainError> {
        use windows::Win32::Foundation::{
            CloseHandle, GetLastError, WAIT_ABANDONED, WAIT_OBJECT_0, WAIT_TIMEOUT,
        };
        use windows::Win32::System::Threading::{CreateMutexW, WaitForSingleObject};
        use windows::core::PCWSTR;

        fn to_wide(s: &str) -> Vec<u16> {
            let mut wide: Vec<u16> = s.encode_utf16().collect();
            wide.push(0);
            wide
        }

        let create = |name: &str| {
            let name = to_wide(name);
            unsafe { CreateMutexW(None, false, PCWSTR(name.as_ptr())) }
        };
        // Global\ は権限不足で作成できない場合がある
        let handle = create(MUTEX_NAME)
            .or_else(|_| create(MUTEX_NAME_LOCAL))
            .map_err(|e| DomainError::Unknown(format!("CreateMutexW failed: {}", e.message())))?;

        let wait = unsafe { WaitForSingleObject(handle, 0) };
        match wait {
            WAIT_OBJECT_0 | WAIT_ABANDONED => Ok(SystemLock { handle }),
            WAIT_TIMEOUT => {
                unsafe {
                    let _ = CloseHandle(handle);
                }
                Err(DomainError::Busy("another KOALA operation is running".into()))
            }
            _ => {
                unsafe {
                    let _ = CloseHandle(handle);
                }
                Err(DomainError::Unknown(format!(
                    "WaitForSingleObject failed: {}",
                    unsafe { GetLastError().0 }
                )))
            }
        }
    }
}

#[cfg(not(windows))]
struct SystemLock {
    path: PathBuf,
}

#[cfg(not(windows))]
impl Drop for SystemLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(not(windows))]
impl FsOperationLock {
    fn acquire_system_lock(&self) -> Result<SystemLock, DomainError> {
        super::ensure_parent_dir(&self.lock_path)?;
        match self.create_lock_file()? {
            Some(lock) => Ok(lock),
            None if self.remove_if_stale() => self.create_lock_file()?.ok_or_else(|| self.busy()),
            None => Err(self.busy()),
        }
    }

    /// 既に存在すればNone
    fn create_lock_file(&self) -> Result<Option<SystemLock>, DomainError> {
        use std::io::Write;

        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(DomainError::IoError(format!("create lock file: {e}"))),
        };
        let _ = writeln!(file, "{}", std::process::id());
        Ok(Some(SystemLock {
            path: self.lock_path.clone(),
        }))
    }

    /// 所有プロセスが終了済みのロックファイルを削除する
    ///
    /// PIDが読めない（書き込み途中など）場合は保持中とみなす。
    fn remove_if_stale(&self) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.lock_path) else {
            return false;
        };
        let Ok(pid) = content.trim().parse::<u32>() else {
            return false;
        };
        if process_alive(pid) {
            return false;
        }
        warn!(
            pid,
            path = %self.lock_path.display(),
            "終了済みプロセスのロックファイルを削除"
        );
        std::fs::remove_file(&self.lock_path).is_ok()
    }

    fn busy(&self) -> DomainError {
        DomainError::Busy(format!("lock file exists: {}", self.lock_path.display()))
    }
}

#[cfg(not(windows))]
fn process_alive(pid: u32) -> bool {
    let mut system = sysinfo::System::new();
    system.refresh_process(sysinfo::Pid::from_u32(pid))
}
