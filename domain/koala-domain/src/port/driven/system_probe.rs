//! システム情報プローブポート
//!
//! 検証で使う読み取り専用の問い合わせ。どのメソッドも失敗しうる。
//! 失敗は「問題なし」ではなく「チェックできなかった」として扱うこと。

use crate::error::DomainError;

/// 固定ドライブの容量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSpace {
    /// 表示名（`C:\` など）
    pub name: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    /// システムドライブか
    pub is_system: bool,
}

impl DriveSpace {
    /// 空き容量の割合（%）。容量0なら100扱い。
    pub fn free_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        self.available_bytes as f64 * 100.0 / self.total_bytes as f64
    }
}

/// セキュリティセンターに登録されたウイルス対策製品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntivirusProduct {
    pub name: String,
    /// `productState` のビットフィールド
    pub product_state: u32,
}

/// 0x1000: リアルタイム保護が有効
pub const AV_STATE_ENABLED: u32 = 0x1000;
/// 0x10: 定義ファイルが古い
pub const AV_STATE_OUTDATED: u32 = 0x10;

impl AntivirusProduct {
    pub fn is_enabled(&self) -> bool {
        self.product_state & AV_STATE_ENABLED != 0
    }

    pub fn is_outdated(&self) -> bool {
        self.product_state & AV_STATE_OUTDATED != 0
    }
}

/// ビデオアダプタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuAdapter {
    pub name: String,
    /// 専用GPUか（内蔵・仮想アダプタはfalse）
    pub discrete: bool,
}

/// ネットワークアダプタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAdapter {
    pub name: String,
    pub description: String,
}

impl NetworkAdapter {
    /// VPN・仮想・トンネルアダプタらしいか
    pub fn is_virtual(&self) -> bool {
        let text = format!("{} {}", self.name, self.description).to_ascii_lowercase();
        ["vpn", "virtual", "tunnel", "tap-", "wireguard"]
            .iter()
            .any(|needle| text.contains(needle))
    }
}

/// システム情報プローブ
pub trait SystemProbe {
    /// 管理者として実行中か
    fn is_elevated(&self) -> Result<bool, DomainError>;

    /// 固定ドライブ一覧
    fn fixed_drives(&self) -> Result<Vec<DriveSpace>, DomainError>;

    /// 実行中プロセス名（拡張子なし）
    fn running_processes(&self) -> Result<Vec<String>, DomainError>;

    /// 登録済みウイルス対策製品
    fn antivirus_products(&self) -> Result<Vec<AntivirusProduct>, DomainError>;

    /// 直近 `days` 日のクラッシュ・予期しない停止の件数
    fn recent_crash_count(&self, days: u32) -> Result<u32, DomainError>;

    /// System32に見つからないファイル名
    fn missing_system_files(&self, files: &[String]) -> Result<Vec<String>, DomainError>;

    /// 製造元文字列（仮想マシン判定用）
    fn system_manufacturer(&self) -> Result<String, DomainError>;

    /// ドメイン参加しているか
    fn is_domain_joined(&self) -> Result<bool, DomainError>;

    fn gpu_adapters(&self) -> Result<Vec<GpuAdapter>, DomainError>;

    /// 接続中のネットワークアダプタ
    fn network_adapters(&self) -> Result<Vec<NetworkAdapter>, DomainError>;

    /// 1回だけpingを送り、応答があればtrue
    fn ping(&self, host: &str, timeout_ms: u64) -> Result<bool, DomainError>;

    /// 接続中のディスプレイ数
    fn display_count(&self) -> Result<u32, DomainError>;
}
