//! 準備・安全性・適用後の検証
//!
//! どの関数もエラーを返さない。問い合わせが失敗したチェックは
//! `skipped` に理由付きで記録し、指摘は出さない。

use koala_domain::DomainError;
use koala_domain::model::{
    OptimizationCategory, RegistryHive, RegistryKey, RegistryValue, SafetyVerdict,
    ValidationIssue, ValidationReport, ValidationSettings,
};
use koala_domain::port::driven::{BackupStore, Clock, RegistryStore, ServiceControl, SystemProbe};
use tracing::{info, warn};

const WINDOWS_CURRENT_VERSION: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion";
const SECURE_BOOT_STATE: &str =
    r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Control\SecureBoot\State";
const VM_MANUFACTURERS: &[&str] = &["vmware", "xen", "microsoft corporation", "qemu", "innotek"];
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// 製造元文字列が仮想化ホストのものか
pub fn is_virtual_machine(manufacturer: &str) -> bool {
    let lower = manufacturer.to_ascii_lowercase();
    VM_MANUFACTURERS.iter().any(|vm| lower.contains(vm))
}

/// 問い合わせ結果を取り出す。失敗はスキップとして記録。
fn probe<T>(
    skipped: &mut ValidationReport,
    check: &str,
    result: Result<T, DomainError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(check, error = %e, "チェックをスキップ");
            skipped.skip(check, e.to_string());
            None
        }
    }
}

/// 適用前の準備チェック
pub fn validate_readiness(
    probe_port: &(impl SystemProbe + ?Sized),
    registry: &(impl RegistryStore + ?Sized),
    settings: &ValidationSettings,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Some(false) = probe(&mut report, "administrator", probe_port.is_elevated()) {
        report.push(ValidationIssue::error(
            "Administrator privileges required for full optimization",
        ));
    }

    if let Some(drives) = probe(&mut report, "disk_space", probe_port.fixed_drives()) {
        for drive in drives {
            let threshold = if drive.is_system {
                settings.low_system_disk_percent
            } else {
                settings.low_disk_percent
            };
            let free = drive.free_percent();
            if free < f64::from(threshold) {
                let label = if drive.is_system { "System drive" } else { "Drive" };
                report.push(ValidationIssue::warning(format!(
                    "{label} {} has only {:.1} GB ({free:.1}%) free space",
                    drive.name,
                    drive.available_bytes as f64 / GIB
                )));
            }
        }
    }

    if let Some(missing) = probe(
        &mut report,
        "system_files",
        probe_port.missing_system_files(&settings.system_files),
    ) {
        if !missing.is_empty() {
            report.push(ValidationIssue::warning(format!(
                "System file integrity issues detected ({}) - run 'sfc /scannow'",
                missing.join(", ")
            )));
        }
    }

    let mut registry_healthy = Some(true);
    for hive in [RegistryHive::LocalMachine, RegistryHive::CurrentUser] {
        match probe(
            &mut report,
            "registry_health",
            registry.key_exists(hive, WINDOWS_CURRENT_VERSION),
        ) {
            Some(true) => {}
            Some(false) => registry_healthy = registry_healthy.map(|_| false),
            None => {
                registry_healthy = None;
                break;
            }
        }
    }
    if registry_healthy == Some(false) {
        report.push(ValidationIssue::warning("Registry health issues detected"));
    }

    if let Some(products) = probe(&mut report, "antivirus", probe_port.antivirus_products()) {
        if products.is_empty() {
            report.push(ValidationIssue::warning("No antivirus software detected"));
        }
        for product in &products {
            if !product.is_enabled() {
                report.push(ValidationIssue::warning(format!(
                    "Antivirus is disabled: {}",
                    product.name
                )));
            } else if product.is_outdated() {
                report.push(ValidationIssue::info(format!(
                    "Antivirus definitions are outdated: {}",
                    product.name
                )));
            }
        }
    }

    if let Some(running) = probe(
        &mut report,
        "critical_processes",
        probe_port.running_processes(),
    ) {
        let running: Vec<String> = running.iter().map(|p| normalize_process(p)).collect();
        for process in &settings.critical_processes {
            if !running.contains(&normalize_process(process)) {
                report.push(ValidationIssue::error(format!(
                    "Critical process '{process}' not running"
                )));
            }
        }
    }

    if let Some(crashes) = probe(
        &mut report,
        "system_stability",
        probe_port.recent_crash_count(settings.crash_window_days),
    ) {
        if crashes >= settings.crash_threshold {
            report.push(ValidationIssue::warning(format!(
                "Recent system crashes detected ({crashes} in the last {} days) - check Event Viewer",
                settings.crash_window_days
            )));
        }
    }

    info!(
        issues = report.issues.len(),
        skipped = report.skipped.len(),
        "準備チェック完了"
    );
    report
}

fn normalize_process(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    lower.strip_suffix(".exe").unwrap_or(&lower).to_string()
}

/// カテゴリ単位の安全性判定
///
/// 仮想マシン上のカーネル／ブート系だけが `safe = false`。他は警告のみ。
pub fn assess_optimization_safety(
    category: OptimizationCategory,
    probe_port: &(impl SystemProbe + ?Sized),
    registry: &(impl RegistryStore + ?Sized),
    store: &(impl BackupStore + ?Sized),
) -> SafetyVerdict {
    let mut verdict = SafetyVerdict::default();
    let mut report = ValidationReport::default();

    match category {
        OptimizationCategory::Kernel | OptimizationCategory::Boot => {
            if let Some(manufacturer) = probe(
                &mut report,
                "virtualization",
                probe_port.system_manufacturer(),
            ) {
                if is_virtual_machine(&manufacturer) {
                    verdict.safe = false;
                    report.push(ValidationIssue::warning(
                        "Virtual machine detected - kernel optimizations may be limited",
                    ));
                }
            }
            let secure_boot = RegistryKey::new(SECURE_BOOT_STATE, "UEFISecureBootEnabled")
                .and_then(|key| registry.read_value(&key));
            if let Some(Some(RegistryValue::DWord(1))) =
                probe(&mut report, "secure_boot", secure_boot)
            {
                report.push(ValidationIssue::warning(
                    "Secure Boot enabled - some kernel optimizations may fail",
                ));
            }
        }
        OptimizationCategory::Network => {
            if let Some(adapters) =
                probe(&mut report, "network_adapters", probe_port.network_adapters())
            {
                if adapters.iter().any(|a| a.is_virtual()) {
                    report.push(ValidationIssue::warning(
                        "VPN/Virtual network adapter detected - network optimizations may affect VPN functionality",
                    ));
                }
            }
        }
        OptimizationCategory::Gpu => {
            if let Some(gpus) = probe(&mut report, "gpu_adapters", probe_port.gpu_adapters()) {
                if gpus.iter().filter(|g| g.discrete).count() > 1 {
                    report.push(ValidationIssue::warning(
                        "Multiple GPUs detected - verify optimization compatibility",
                    ));
                }
            }
        }
        OptimizationCategory::Services => {
            if let Some(true) =
                probe(&mut report, "domain_membership", probe_port.is_domain_joined())
            {
                report.push(ValidationIssue::warning(
                    "Domain-joined computer detected - some service optimizations may affect domain functionality",
                ));
            }
        }
        _ => {}
    }

    if let Some(false) = probe(&mut report, "backup", store.exists()) {
        report.push(ValidationIssue::warning(
            "No registry backup found - creating backup recommended",
        ));
    }

    info!(category = %category, safe = verdict.safe, "安全性チェック完了");
    verdict.issues = report.issues;
    verdict.skipped = report.skipped;
    verdict
}

/// 適用後のチェック（応答性・重要サービス・ネットワーク・ディスプレイ）
pub fn validate_post_optimization(
    probe_port: &(impl SystemProbe + ?Sized),
    registry: &(impl RegistryStore + ?Sized),
    services: &(impl ServiceControl + ?Sized),
    clock: &(impl Clock + ?Sized),
    settings: &ValidationSettings,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let started = clock.now_ms();
    let opened = registry.key_exists(RegistryHive::LocalMachine, WINDOWS_CURRENT_VERSION);
    let elapsed = clock.now_ms().saturating_sub(started);
    if probe(&mut report, "responsiveness", opened).is_some()
        && elapsed > settings.responsiveness_limit_ms
    {
        report.push(ValidationIssue::warning(format!(
            "System responsiveness degraded after optimization ({elapsed} ms registry access)"
        )));
    }

    for service in &settings.critical_services {
        let check = format!("service:{service}");
        if let Some(false) = probe(&mut report, &check, services.is_running(service)) {
            report.push(ValidationIssue::warning(format!(
                "Critical service '{service}' is not running"
            )));
        }
    }

    if let Some(false) = probe(
        &mut report,
        "network",
        probe_port.ping(&settings.ping_target, settings.ping_timeout_ms),
    ) {
        report.push(ValidationIssue::warning("Network connectivity issues detected"));
    }

    if let Some(0) = probe(&mut report, "display", probe_port.display_count()) {
        report.push(ValidationIssue::warning("Display functionality issues detected"));
    }

    info!(
        issues = report.issues.len(),
        skipped = report.skipped.len(),
        "適用後チェック完了"
    );
    report
}
