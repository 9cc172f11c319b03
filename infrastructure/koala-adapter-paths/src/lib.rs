//! KOALA Optimizerの既定パス解決

use std::path::PathBuf;

const PRODUCT_DIR: &str = "KOALAOptimizer";

#[cfg(windows)]
fn known_folder_path(id: &windows::core::GUID) -> Option<PathBuf> {
    use windows::Win32::System::Com::CoTaskMemFree;
    use windows::Win32::UI::Shell::{KF_FLAG_DEFAULT, SHGetKnownFolderPath};
    use windows::core::PWSTR;

    unsafe {
        let raw: PWSTR = SHGetKnownFolderPath(id, KF_FLAG_DEFAULT, None).ok()?;
        let s = raw.to_string().unwrap_or_default();
        CoTaskMemFree(Some(raw.0 as _));
        if s.is_empty() {
            None
        } else {
            Some(PathBuf::from(s))
        }
    }
}

/// 既定のデータディレクトリ（ユーザー単位）
///
/// - Windows: `%APPDATA%\KOALAOptimizer`（既知フォルダ）
/// - その他: `./var`（開発/テスト用）
pub fn default_data_dir() -> PathBuf {
    #[cfg(windows)]
    {
        use windows::Win32::UI::Shell::FOLDERID_RoamingAppData;

        known_folder_path(&FOLDERID_RoamingAppData)
            .or_else(|| std::env::var_os("APPDATA").map(PathBuf::from))
            .unwrap_or_else(std::env::temp_dir)
            .join(PRODUCT_DIR)
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("./var")
    }
}

/// 設定ファイル用ディレクトリ
pub fn default_config_dir() -> PathBuf {
    default_data_dir().join("config")
}

/// バックアップ用ディレクトリ
pub fn default_backup_dir() -> PathBuf {
    default_data_dir().join("backups")
}

/// ログファイル用ディレクトリ
pub fn default_log_dir() -> PathBuf {
    default_data_dir().join("logs")
}

/// 一時ディレクトリ（ログの退避先）
pub fn fallback_log_dir() -> PathBuf {
    std::env::temp_dir()
}
