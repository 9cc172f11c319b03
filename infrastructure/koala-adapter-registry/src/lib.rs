//! Windowsレジストリアダプター
//!
//! 最適化対象の値（REG_DWORD / REG_QWORD / REG_SZ）を HKLM・HKCU に読み書きする。
//! 常に64bitビュー（KEY_WOW64_64KEY）を使う。

use koala_domain::DomainError;
use koala_domain::model::{RegistryHive, RegistryKey, RegistryValue};
use koala_domain::port::driven::RegistryStore;

// winnt.h の値型
const REG_SZ: u32 = 1;
const REG_EXPAND_SZ: u32 = 2;
const REG_DWORD: u32 = 4;
const REG_QWORD: u32 = 11;

/// プラットフォーム中立のハンドル
#[cfg(windows)]
pub type RegistryAdapter = WindowsRegistryAdapter;
#[cfg(not(windows))]
pub type RegistryAdapter = NonWindowsRegistryAdapter;

#[cfg(windows)]
#[derive(Debug, Default, Clone)]
pub struct WindowsRegistryAdapter;

#[cfg(windows)]
impl WindowsRegistryAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(windows))]
#[derive(Debug, Default, Clone)]
pub struct NonWindowsRegistryAdapter;

#[cfg(not(windows))]
impl NonWindowsRegistryAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(windows))]
impl RegistryStore for NonWindowsRegistryAdapter {
    fn read_value(&self, _key: &RegistryKey) -> Result<Option<RegistryValue>, DomainError> {
        Err(DomainError::Unsupported("registry is only available on Windows".into()))
    }

    fn write_value(&self, _key: &RegistryKey, _value: &RegistryValue) -> Result<(), DomainError> {
        Err(DomainError::Unsupported("registry is only available on Windows".into()))
    }

    fn delete_value(&self, _key: &RegistryKey) -> Result<(), DomainError> {
        Err(DomainError::Unsupported("registry is only available on Windows".into()))
    }

    fn key_exists(&self, _hive: RegistryHive, _subkey: &str) -> Result<bool, DomainError> {
        Err(DomainError::Unsupported("registry is only available on Windows".into()))
    }

    fn subkeys(&self, _hive: RegistryHive, _subkey: &str) -> Result<Vec<String>, DomainError> {
        Err(DomainError::Unsupported("registry is only available on Windows".into()))
    }
}

/// 生データをドメインの値に変換
#[cfg_attr(not(windows), allow(dead_code))]
fn decode_value(key: &RegistryKey, value_type: u32, bytes: &[u8]) -> Result<RegistryValue, DomainError> {
    match value_type {
        REG_DWORD => {
            let raw: [u8; 4] = bytes
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| DomainError::IoError(format!("truncated REG_DWORD: {key}")))?;
            Ok(RegistryValue::DWord(u32::from_le_bytes(raw)))
        }
        REG_QWORD => {
            let raw: [u8; 8] = bytes
                .get(..8)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| DomainError::IoError(format!("truncated REG_QWORD: {key}")))?;
            Ok(RegistryValue::QWord(u64::from_le_bytes(raw)))
        }
        REG_SZ => decode_utf16(bytes)
            .map(RegistryValue::String)
            .ok_or_else(|| {
                DomainError::Unsupported(format!("REG_SZ cannot be restored exactly: {key}"))
            }),
        REG_EXPAND_SZ => Err(DomainError::Unsupported(format!(
            "REG_EXPAND_SZ is not restorable: {key}"
        ))),
        other => Err(DomainError::Unsupported(format!(
            "registry type {other} is not restorable: {key}"
        ))),
    }
}

/// ドメインの値を (型, バイト列) に変換。文字列は終端NULを含む。
#[cfg_attr(not(windows), allow(dead_code))]
fn encode_value(value: &RegistryValue) -> (u32, Vec<u8>) {
    match value {
        RegistryValue::DWord(v) => (REG_DWORD, v.to_le_bytes().to_vec()),
        RegistryValue::QWord(v) => (REG_QWORD, v.to_le_bytes().to_vec()),
        RegistryValue::String(s) => {
            let bytes = s
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(|u| u.to_le_bytes())
                .collect();
            (REG_SZ, bytes)
        }
    }
}

/// UTF-16文字列を読む（終端NULは1つだけ取り除く）
///
/// 書き戻したときに同じバイト列にならないもの（奇数長、途中のNUL、
/// 対になっていないサロゲート）はNone。
#[cfg_attr(not(windows), allow(dead_code))]
fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    if units.last() == Some(&0) {
        units.pop();
    }
    if units.contains(&0) {
        return None;
    }
    String::from_utf16(&units).ok()
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use tracing::debug;
    use windows::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR,
    };
    use windows::Win32::System::Registry::{
        HKEY, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_QUERY_VALUE, KEY_READ, KEY_SET_VALUE,
        KEY_WOW64_64KEY, REG_OPTION_NON_VOLATILE, REG_SAM_FLAGS, REG_VALUE_TYPE, RRF_NOEXPAND,
        RRF_RT_ANY, RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegEnumKeyExW, RegGetValueW,
        RegOpenKeyExW, RegSetValueExW,
    };
    use windows::core::{PCWSTR, PWSTR};

    const ERROR_FILE_NOT_FOUND: u32 = 2;
    const ERROR_PATH_NOT_FOUND: u32 = 3;
    // キー名の最大長（終端NULを除く）
    const MAX_KEY_NAME: usize = 255;

    impl RegistryStore for WindowsRegistryAdapter {
        fn read_value(&self, key: &RegistryKey) -> Result<Option<RegistryValue>, DomainError> {
            let hkey = match open_existing(key.hive(), key.subkey(), KEY_QUERY_VALUE) {
                Ok(Some(k)) => k,
                Ok(None) => return Ok(None),
                Err(e) => return Err(e),
            };
            let name = to_wide(key.value_name()); // API呼び出し中にVecを生存させる
            let mut value_type = REG_VALUE_TYPE(0);
            let mut size_bytes: u32 = 0;
            let status = unsafe {
                RegGetValueW(
                    hkey,
                    PCWSTR::null(),
                    PCWSTR(name.as_ptr()),
                    RRF_RT_ANY | RRF_NOEXPAND,
                    Some(&mut value_type),
                    None,
                    Some(&mut size_bytes),
                )
            };
            if status != ERROR_SUCCESS {
                let _ = unsafe { RegCloseKey(hkey) };
                return match status.0 {
                    ERROR_FILE_NOT_FOUND => Ok(None),
                    _ => Err(map_status(status, "read", key)),
                };
            }

            let mut buffer = vec![0u8; (size_bytes as usize).max(1)];
            let status = unsafe {
                RegGetValueW(
                    hkey,
                    PCWSTR::null(),
                    PCWSTR(name.as_ptr()),
                    RRF_RT_ANY | RRF_NOEXPAND,
                    Some(&mut value_type),
                    Some(buffer.as_mut_ptr() as *mut _),
                    Some(&mut size_bytes),
                )
            };
            let _ = unsafe { RegCloseKey(hkey) };
            if status != ERROR_SUCCESS {
                return match status.0 {
                    ERROR_FILE_NOT_FOUND => Ok(None),
                    _ => Err(map_status(status, "read", key)),
                };
            }
            buffer.truncate(size_bytes as usize);
            decode_value(key, value_type.0, &buffer).map(Some)
        }

        fn write_value(&self, key: &RegistryKey, value: &RegistryValue) -> Result<(), DomainError> {
            let hkey = open_or_create(key)?;
            let (value_type, data) = encode_value(value);
            let name = to_wide(key.value_name()); // API呼び出し中にVecを生存させる
            let status = unsafe {
                RegSetValueExW(
                    hkey,
                    PCWSTR(name.as_ptr()),
                    Some(0),
                    REG_VALUE_TYPE(value_type),
                    Some(&data),
                )
            };
            let _ = unsafe { RegCloseKey(hkey) };
            if status != ERROR_SUCCESS {
                return Err(map_status(status, "write", key));
            }
            debug!(key = %key, value = %value, "レジストリ値を書き込み");
            Ok(())
        }

        fn delete_value(&self, key: &RegistryKey) -> Result<(), DomainError> {
            let hkey = match open_existing(key.hive(), key.subkey(), KEY_SET_VALUE) {
                Ok(Some(k)) => k,
                Ok(None) => return Ok(()),
                Err(e) => return Err(e),
            };
            let name = to_wide(key.value_name()); // API呼び出し中にVecを生存させる
            let status = unsafe { RegDeleteValueW(hkey, PCWSTR(name.as_ptr())) };
            let _ = unsafe { RegCloseKey(hkey) };
            if status != ERROR_SUCCESS {
                return match status.0 {
                    ERROR_FILE_NOT_FOUND => Ok(()), // 値が見つからない
                    _ => Err(map_status(status, "delete", key)),
                };
            }
            debug!(key = %key, "レジストリ値を削除");
            Ok(())
        }

        fn key_exists(&self, hive: RegistryHive, subkey: &str) -> Result<bool, DomainError> {
            match open_existing(hive, subkey, KEY_READ)? {
                Some(hkey) => {
                    let _ = unsafe { RegCloseKey(hkey) };
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn subkeys(&self, hive: RegistryHive, subkey: &str) -> Result<Vec<String>, DomainError> {
            let Some(hkey) = open_existing(hive, subkey, KEY_READ)? else {
                return Ok(Vec::new());
            };
            let result = enum_subkeys(hkey, hive, subkey);
            let _ = unsafe { RegCloseKey(hkey) };
            result
        }
    }

    fn enum_subkeys(
        hkey: HKEY,
        hive: RegistryHive,
        subkey: &str,
    ) -> Result<Vec<String>, DomainError> {
        let mut names = Vec::new();
        let mut buf = [0u16; MAX_KEY_NAME + 1];
        for index in 0u32.. {
            let mut len = buf.len() as u32;
            let status = unsafe {
                RegEnumKeyExW(
                    hkey,
                    index,
                    Some(PWSTR(buf.as_mut_ptr())),
                    &mut len,
                    None,
                    None,
                    None,
                    None,
                )
            };
            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            if status != ERROR_SUCCESS {
                return Err(DomainError::IoError(format!(
                    "RegEnumKeyExW failed for {}\\{subkey}: status={}",
                    hive.as_str(),
                    status.0
                )));
            }
            let name = String::from_utf16(&buf[..len as usize]).map_err(|_| {
                DomainError::IoError(format!("invalid subkey name under {}\\{subkey}", hive.as_str()))
            })?;
            names.push(name);
        }
        debug!(hive = hive.as_str(), subkey, count = names.len(), "サブキーを列挙");
        Ok(names)
    }

    fn root(hive: RegistryHive) -> HKEY {
        match hive {
            RegistryHive::LocalMachine => HKEY_LOCAL_MACHINE,
            RegistryHive::CurrentUser => HKEY_CURRENT_USER,
        }
    }

    /// 既存キーを開く（存在しなければNone）
    fn open_existing(
        hive: RegistryHive,
        subkey: &str,
        access: REG_SAM_FLAGS,
    ) -> Result<Option<HKEY>, DomainError> {
        let wide_path = to_wide(subkey); // API呼び出し中にVecを生存させる
        let mut hkey = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(
                root(hive),
                PCWSTR(wide_path.as_ptr()),
                Some(0),
                access | KEY_WOW64_64KEY,
                &mut hkey,
            )
        };
        if status != ERROR_SUCCESS {
            return match status.0 {
                ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => Ok(None),
                code if code == ERROR_ACCESS_DENIED.0 => Err(DomainError::AccessDenied(format!(
                    "{}\\{subkey}",
                    hive.as_str()
                ))),
                _ => Err(DomainError::IoError(format!(
                    "RegOpenKeyExW failed for {}\\{subkey}: status={}",
                    hive.as_str(),
                    status.0
                ))),
            };
        }
        Ok(Some(hkey))
    }

    fn open_or_create(key: &RegistryKey) -> Result<HKEY, DomainError> {
        let wide_path = to_wide(key.subkey()); // API呼び出し中にVecを生存させる
        let mut hkey = HKEY::default();
        let status = unsafe {
            RegCreateKeyExW(
                root(key.hive()),
                PCWSTR(wide_path.as_ptr()),
                Some(0),
                None,
                REG_OPTION_NON_VOLATILE,
                KEY_SET_VALUE | KEY_QUERY_VALUE | KEY_WOW64_64KEY,
                None,
                &mut hkey,
                None,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(map_status(status, "create key", key));
        }
        Ok(hkey)
    }

    fn map_status(status: WIN32_ERROR, op: &str, key: &RegistryKey) -> DomainError {
        if status == ERROR_ACCESS_DENIED {
            DomainError::AccessDenied(format!("{op} {key}"))
        } else {
            DomainError::IoError(format!("{op} {key}: status={}", status.0))
        }
    }

    fn to_wide(s: &str) -> Vec<u16> {
        let mut wide: Vec<u16> = s.encode_utf16().collect();
        wide.push(0);
        wide
    }
}
