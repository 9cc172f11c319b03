//! システム情報プローブアダプター
//!
//! ディスク・プロセスは sysinfo、昇格状態とモニター数は Win32 API、
//! それ以外（セキュリティセンター、WMI、イベントログ）は PowerShell 経由で取得する。

mod native;
mod powershell;

use koala_adapter_process::ProcessCommandRunner;
use koala_domain::DomainError;
use koala_domain::model::CommandInvocation;
use koala_domain::port::driven::{
    AntivirusProduct, CommandRunner, DriveSpace, GpuAdapter, NetworkAdapter, SystemProbe,
};
use powershell::{
    ANTIVIRUS_QUERY, AntivirusRow, COMPUTER_SYSTEM_QUERY, ComputerSystemRow,
    NETWORK_ADAPTER_QUERY, NetworkAdapterRow, VIDEO_CONTROLLER_QUERY, VideoControllerRow,
    crash_count_query, parse_count, parse_rows, run_script,
};
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};
use tracing::debug;

/// ping プロセス自体の待機に上乗せする猶予
const PING_GRACE_MS: u64 = 2_000;

pub struct SystemProbeAdapter<R = ProcessCommandRunner> {
    runner: R,
    timeout_ms: u64,
    system_dir: Option<PathBuf>,
}

impl SystemProbeAdapter<ProcessCommandRunner> {
    /// `timeout_ms` は PowerShell 1回あたりの待機上限
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_runner(ProcessCommandRunner, timeout_ms)
    }
}

impl<R: CommandRunner> SystemProbeAdapter<R> {
    pub fn with_runner(runner: R, timeout_ms: u64) -> Self {
        Self {
            runner,
            timeout_ms,
            system_dir: default_system_dir(),
        }
    }

    /// システムファイル確認の対象ディレクトリを差し替える
    pub fn with_system_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.system_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn query<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<Vec<T>, DomainError> {
        let stdout = run_script(&self.runner, script, self.timeout_ms)?;
        parse_rows(&stdout)
    }

    fn computer_system(&self) -> Result<ComputerSystemRow, DomainError> {
        self.query::<ComputerSystemRow>(COMPUTER_SYSTEM_QUERY)?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::ExternalToolFailed("Win32_ComputerSystem returned nothing".into()))
    }
}

impl<R: CommandRunner> SystemProbe for SystemProbeAdapter<R> {
    fn is_elevated(&self) -> Result<bool, DomainError> {
        native::is_elevated()
    }

    fn fixed_drives(&self) -> Result<Vec<DriveSpace>, DomainError> {
        let disks = Disks::new_with_refreshed_list();
        let system_root = system_drive_root();
        let drives: Vec<DriveSpace> = disks
            .list()
            .iter()
            .filter(|disk| !disk.is_removable())
            .map(|disk| {
                let name = disk.mount_point().display().to_string();
                DriveSpace {
                    is_system: name.eq_ignore_ascii_case(&system_root),
                    name,
                    total_bytes: disk.total_space(),
                    available_bytes: disk.available_space(),
                }
            })
            .collect();
        if drives.is_empty() {
            return Err(DomainError::Unsupported("no fixed drives reported".into()));
        }
        Ok(drives)
    }

    fn running_processes(&self) -> Result<Vec<String>, DomainError> {
        let mut system = System::new();
        system.refresh_processes();
        let mut names: Vec<String> = system
            .processes()
            .values()
            .map(|p| strip_exe(p.name()).to_string())
            .collect();
        names.sort_unstable_by_key(|n| n.to_ascii_lowercase());
        names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        debug!(count = names.len(), "プロセス一覧を取得");
        Ok(names)
    }

    fn antivirus_products(&self) -> Result<Vec<AntivirusProduct>, DomainError> {
        Ok(self
            .query::<AntivirusRow>(ANTIVIRUS_QUERY)?
            .into_iter()
            .map(AntivirusProduct::from)
            .collect())
    }

    fn recent_crash_count(&self, days: u32) -> Result<u32, DomainError> {
        let stdout = run_script(&self.runner, &crash_count_query(days), self.timeout_ms)?;
        parse_count(&stdout)
    }

    fn missing_system_files(&self, files: &[String]) -> Result<Vec<String>, DomainError> {
        let Some(dir) = &self.system_dir else {
            return Err(DomainError::Unsupported("System32 is not available".into()));
        };
        Ok(files
            .iter()
            .filter(|file| !dir.join(file.as_str()).is_file())
            .cloned()
            .collect())
    }

    fn system_manufacturer(&self) -> Result<String, DomainError> {
        Ok(self.computer_system()?.manufacturer.unwrap_or_default())
    }

    fn is_domain_joined(&self) -> Result<bool, DomainError> {
        self.computer_system()?
            .part_of_domain
            .ok_or_else(|| DomainError::ExternalToolFailed("PartOfDomain missing".into()))
    }

    fn gpu_adapters(&self) -> Result<Vec<GpuAdapter>, DomainError> {
        Ok(self
            .query::<VideoControllerRow>(VIDEO_CONTROLLER_QUERY)?
            .into_iter()
            .filter_map(VideoControllerRow::into_adapter)
            .collect())
    }

    fn network_adapters(&self) -> Result<Vec<NetworkAdapter>, DomainError> {
        Ok(self
            .query::<NetworkAdapterRow>(NETWORK_ADAPTER_QUERY)?
            .into_iter()
            .map(NetworkAdapter::from)
            .collect())
    }

    fn ping(&self, host: &str, timeout_ms: u64) -> Result<bool, DomainError> {
        let mut invocation = ping_invocation(host, timeout_ms);
        invocation.requires_elevation = false;
        match self.runner.run(&invocation, timeout_ms + PING_GRACE_MS) {
            Ok(out) => Ok(out.success()),
            // 応答なしと同じ扱い
            Err(DomainError::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn display_count(&self) -> Result<u32, DomainError> {
        native::display_count()
    }
}

#[cfg(windows)]
fn ping_invocation(host: &str, timeout_ms: u64) -> CommandInvocation {
    let wait = timeout_ms.to_string();
    CommandInvocation::new("ping.exe", &["-n", "1", "-w", &wait, host])
}

#[cfg(not(windows))]
fn ping_invocation(host: &str, timeout_ms: u64) -> CommandInvocation {
    let wait = timeout_ms.div_ceil(1_000).max(1).to_string();
    CommandInvocation::new("ping", &["-c", "1", "-W", &wait, host])
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

#[cfg(windows)]
fn default_system_dir() -> Option<PathBuf> {
    let root = std::env::var_os("SystemRoot").unwrap_or_else(|| r"C:\Windows".into());
    Some(PathBuf::from(root).join("System32"))
}

#[cfg(not(windows))]
fn default_system_dir() -> Option<PathBuf> {
    None
}

#[cfg(windows)]
fn system_drive_root() -> String {
    let drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".into());
    format!("{}\\", drive.trim_end_matches('\\'))
}

#[cfg(not(windows))]
fn system_drive_root() -> String {
    "/".into()
}
