//! Win32 API で直接取れる情報

use koala_domain::DomainError;

#[cfg(windows)]
pub(crate) fn is_elevated() -> Result<bool, DomainError> {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token = HANDLE::default();
        OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token)
            .map_err(|e| DomainError::Unknown(format!("OpenProcessToken failed: {}", e.message())))?;

        let mut elevation = TOKEN_ELEVATION::default();
        let mut return_length = 0u32;
        let result = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut return_length,
        );
        let _ = CloseHandle(token);
        result.map_err(|e| {
            DomainError::Unknown(format!("GetTokenInformation failed: {}", e.message()))
        })?;
        Ok(elevation.TokenIsElevated != 0)
    }
}

#[cfg(not(windows))]
pub(crate) fn is_elevated() -> Result<bool, DomainError> {
    Err(DomainError::Unsupported("elevation check requires Windows".into()))
}

#[cfg(windows)]
pub(crate) fn display_count() -> Result<u32, DomainError> {
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CMONITORS};

    let count = unsafe { GetSystemMetrics(SM_CMONITORS) };
    Ok(u32::try_from(count).unwrap_or(0))
}

#[cfg(not(windows))]
pub(crate) fn display_count() -> Result<u32, DomainError> {
    Err(DomainError::Unsupported("display enumeration requires Windows".into()))
}
