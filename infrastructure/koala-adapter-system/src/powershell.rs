//! PowerShell (CIM / イベントログ) 問い合わせ
//!
//! 出力は `ConvertTo-Json -Compress`。1件ならオブジェクト、複数なら配列、0件なら空文字になる。

use koala_domain::DomainError;
use koala_domain::model::CommandInvocation;
use koala_domain::port::driven::{
    AntivirusProduct, CommandOutput, CommandRunner, GpuAdapter, NetworkAdapter,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const POWERSHELL_EXE: &str = "powershell.exe";

pub(crate) const ANTIVIRUS_QUERY: &str = "Get-CimInstance -Namespace root/SecurityCenter2 -ClassName AntiVirusProduct | Select-Object displayName,productState | ConvertTo-Json -Compress";
pub(crate) const COMPUTER_SYSTEM_QUERY: &str =
    "Get-CimInstance -ClassName Win32_ComputerSystem | Select-Object Manufacturer,PartOfDomain | ConvertTo-Json -Compress";
pub(crate) const VIDEO_CONTROLLER_QUERY: &str =
    "Get-CimInstance -ClassName Win32_VideoController | Select-Object Name | ConvertTo-Json -Compress";
pub(crate) const NETWORK_ADAPTER_QUERY: &str = "Get-CimInstance -ClassName Win32_NetworkAdapterConfiguration -Filter 'IPEnabled = true' | Select-Object ServiceName,Description | ConvertTo-Json -Compress";

/// System ログのエラーのうち、Kernel系プロバイダまたはID 1001 の件数
pub(crate) fn crash_count_query(days: u32) -> String {
    format!(
        "@(Get-WinEvent -FilterHashtable @{{LogName='System'; Level=2; StartTime=(Get-Date).AddDays(-{days})}} -ErrorAction SilentlyContinue | Where-Object {{ $_.ProviderName -like '*Kernel*' -or $_.Id -eq 1001 }}).Count"
    )
}

/// PowerShellスクリプトを実行し、標準出力を返す
pub(crate) fn run_script(
    runner: &dyn CommandRunner,
    script: &str,
    timeout_ms: u64,
) -> Result<String, DomainError> {
    let mut invocation = CommandInvocation::new(
        POWERSHELL_EXE,
        &["-NoProfile", "-NonInteractive", "-Command", script],
    );
    invocation.requires_elevation = false;
    let CommandOutput {
        exit_code,
        stdout,
        stderr,
    } = runner.run(&invocation, timeout_ms)?;
    if exit_code != 0 {
        return Err(DomainError::ExternalToolFailed(format!(
            "powershell exited with {exit_code}: {}",
            stderr.trim()
        )));
    }
    Ok(stdout)
}

/// 0件・1件・複数件のいずれの形でも Vec にそろえる
pub(crate) fn parse_rows<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>, DomainError> {
    let text = stdout.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| DomainError::ExternalToolFailed(format!("unexpected powershell output: {e}")))?;
    let rows = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        single => vec![single],
    };
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                DomainError::ExternalToolFailed(format!("unexpected powershell output: {e}"))
            })
        })
        .collect()
}

pub(crate) fn parse_count(stdout: &str) -> Result<u32, DomainError> {
    stdout.trim().parse().map_err(|_| {
        DomainError::ExternalToolFailed(format!("expected a count, got {:?}", stdout.trim()))
    })
}

// ---------- 行定義 ----------

#[derive(Deserialize)]
pub(crate) struct AntivirusRow {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "productState", default)]
    product_state: Option<u32>,
}

impl From<AntivirusRow> for AntivirusProduct {
    fn from(row: AntivirusRow) -> Self {
        Self {
            name: row.display_name.unwrap_or_default(),
            product_state: row.product_state.unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ComputerSystemRow {
    #[serde(rename = "Manufacturer", default)]
    pub manufacturer: Option<String>,
    #[serde(rename = "PartOfDomain", default)]
    pub part_of_domain: Option<bool>,
}

#[derive(Deserialize)]
pub(crate) struct VideoControllerRow {
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

impl VideoControllerRow {
    /// 名前のない行は捨てる
    pub(crate) fn into_adapter(self) -> Option<GpuAdapter> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        // 基本ディスプレイアダプタ・VGA互換は専用GPUに数えない
        let discrete = !name.contains("Basic") && !name.contains("VGA");
        Some(GpuAdapter { name, discrete })
    }
}

#[derive(Deserialize)]
pub(crate) struct NetworkAdapterRow {
    #[serde(rename = "ServiceName", default)]
    service_name: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

impl From<NetworkAdapterRow> for NetworkAdapter {
    fn from(row: NetworkAdapterRow) -> Self {
        Self {
            name: row.service_name.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
        }
    }
}
