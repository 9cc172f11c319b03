//! 出力整形（CLIプレゼンテーション層専用）

use koala_composition::ActionOutcome;
use koala_composition::domain::model::{
    AppliedResult, ItemStatus, OptimizationItem, OptimizerConfig, SkippedCheck, ValidationIssue,
    ValidationReport,
};
use serde::Serialize;

pub fn print_text(outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Items(items) => {
            println!("Optimizations ({} items):", items.len());
            for item in items {
                let admin = if item.requires_admin { " [admin]" } else { "" };
                println!(
                    "  {:<38} {:<9}{} {}",
                    item.name,
                    item.category.as_str(),
                    admin,
                    item.description
                );
            }
        }
        ActionOutcome::Validation(report) => print_validation(report),
        ActionOutcome::Safety { category, verdict } => {
            let label = if verdict.safe { "safe" } else { "NOT safe" };
            println!("Category '{category}' is {label} to optimize.");
            print_issues(&verdict.issues, &verdict.skipped);
        }
        ActionOutcome::BackupStatus(status) => {
            if status.exists {
                match status.records {
                    Some(n) => println!("Backup present: {} ({n} records)", status.location),
                    None => println!("Backup present but unreadable: {}", status.location),
                }
            } else {
                println!("No backup at {}", status.location);
            }
        }
        ActionOutcome::BackupCreated(report) => {
            println!(
                "Backup created: {} ({} records, {} absent before optimization)",
                report.location, report.records, report.absent
            );
            for (key, error) in &report.skipped {
                println!("  SKIPPED {key}: {error}");
            }
        }
        ActionOutcome::Restored(report) => {
            println!(
                "Restored {} values ({} written, {} deleted, {} failed)",
                report.restored_count(),
                report.restored.len(),
                report.deleted.len(),
                report.failed.len()
            );
            for (key, error) in &report.failed {
                println!("  FAILED {key}: {error}");
            }
        }
        ActionOutcome::BackupDiscarded => println!("Backup discarded."),
        ActionOutcome::Applied(result) => print_applied(result),
        ActionOutcome::Failed { action, error } => {
            eprintln!("{action} failed: {error}");
        }
    }
}

fn print_validation(report: &ValidationReport) {
    if report.issues.is_empty() {
        println!("No issues found.");
    }
    print_issues(&report.issues, &report.skipped);
}

fn print_issues(issues: &[ValidationIssue], skipped: &[SkippedCheck]) {
    for issue in issues {
        println!("  [{}] {}", issue.severity.as_str(), issue.message);
    }
    for check in skipped {
        println!("  [skipped] {}: {}", check.check, check.reason);
    }
}

fn print_applied(result: &AppliedResult) {
    for item in &result.items {
        match &item.status {
            ItemStatus::Applied => println!("  OK      {}", item.name),
            ItemStatus::Failed { kind } => {
                println!("  FAILED  {} ({kind:?})", item.name);
                for error in &item.errors {
                    println!("          {error}");
                }
            }
            ItemStatus::Skipped { reason } => println!("  SKIPPED {} ({reason})", item.name),
        }
    }
    println!(
        "Applied {}, failed {}, skipped {}",
        result.applied_count(),
        result.failed_count(),
        result.skipped_count()
    );
}

pub fn print_config(location: &str, created: bool, config: &OptimizerConfig) {
    let note = if created { " (created)" } else { "" };
    println!("Config file: {location}{note}");
    let v = &config.validation;
    println!("  backup_file_name         {}", config.backup_file_name);
    println!("  helper_timeout_ms        {}", config.helper_timeout_ms);
    println!("  ping_target              {}", v.ping_target);
    println!("  ping_timeout_ms          {}", v.ping_timeout_ms);
    println!("  responsiveness_limit_ms  {}", v.responsiveness_limit_ms);
    println!(
        "  crash_threshold          {} in {} days",
        v.crash_threshold, v.crash_window_days
    );
    println!(
        "  low_disk_percent         {} (system drive {})",
        v.low_disk_percent, v.low_system_disk_percent
    );
    println!("  critical_processes       {}", v.critical_processes.join(", "));
    println!("  critical_services        {}", v.critical_services.join(", "));
    println!("  system_files             {}", v.system_files.join(", "));
}

pub fn config_json(location: &str, created: bool, config: &OptimizerConfig) -> JsonConfig {
    let v = &config.validation;
    JsonConfig {
        location: location.to_string(),
        created,
        backup_file_name: config.backup_file_name.clone(),
        helper_timeout_ms: config.helper_timeout_ms,
        validation: JsonValidationSettings {
            ping_target: v.ping_target.clone(),
            ping_timeout_ms: v.ping_timeout_ms,
            responsiveness_limit_ms: v.responsiveness_limit_ms,
            crash_window_days: v.crash_window_days,
            crash_threshold: v.crash_threshold,
            low_disk_percent: v.low_disk_percent,
            low_system_disk_percent: v.low_system_disk_percent,
            critical_processes: v.critical_processes.clone(),
            critical_services: v.critical_services.clone(),
            system_files: v.system_files.clone(),
        },
    }
}

pub fn to_json(outcome: &ActionOutcome) -> JsonOutcome {
    match outcome {
        ActionOutcome::Items(items) => JsonOutcome::Items {
            items: items.iter().map(JsonItem::from).collect(),
        },
        ActionOutcome::Validation(report) => JsonOutcome::Validation {
            has_errors: report.has_errors(),
            issues: report.issues.iter().map(JsonIssue::from).collect(),
            skipped: report.skipped.iter().map(JsonSkipped::from).collect(),
        },
        ActionOutcome::Safety { category, verdict } => JsonOutcome::Safety {
            category: category.as_str(),
            safe: verdict.safe,
            issues: verdict.issues.iter().map(JsonIssue::from).collect(),
            skipped: verdict.skipped.iter().map(JsonSkipped::from).collect(),
        },
        ActionOutcome::BackupStatus(status) => JsonOutcome::BackupStatus {
            exists: status.exists,
            location: status.location.clone(),
            records: status.records,
        },
        ActionOutcome::BackupCreated(report) => JsonOutcome::BackupCreated {
            location: report.location.clone(),
            records: report.records,
            absent: report.absent,
            skipped: report.skipped.iter().map(JsonFailure::from).collect(),
        },
        ActionOutcome::Restored(report) => JsonOutcome::Restored {
            restored: report.restored.clone(),
            deleted: report.deleted.clone(),
            failed: report.failed.iter().map(JsonFailure::from).collect(),
        },
        ActionOutcome::BackupDiscarded => JsonOutcome::BackupDiscarded,
        ActionOutcome::Applied(result) => JsonOutcome::Applied {
            applied: result.applied_count(),
            failed: result.failed_count(),
            skipped: result.skipped_count(),
            items: result
                .items
                .iter()
                .map(|item| {
                    let (status, detail) = match &item.status {
                        ItemStatus::Applied => ("applied", None),
                        ItemStatus::Failed { kind } => ("failed", Some(format!("{kind:?}"))),
                        ItemStatus::Skipped { reason } => ("skipped", Some(reason.clone())),
                    };
                    JsonApplied {
                        name: item.name.clone(),
                        status,
                        detail,
                        errors: item.errors.clone(),
                    }
                })
                .collect(),
        },
        ActionOutcome::Failed { action, error } => JsonOutcome::Failed {
            action: *action,
            kind: format!("{:?}", error.kind()),
            error: error.to_string(),
        },
    }
}

// JSON出力用構造体

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JsonOutcome {
    Items {
        items: Vec<JsonItem>,
    },
    Validation {
        has_errors: bool,
        issues: Vec<JsonIssue>,
        skipped: Vec<JsonSkipped>,
    },
    Safety {
        category: &'static str,
        safe: bool,
        issues: Vec<JsonIssue>,
        skipped: Vec<JsonSkipped>,
    },
    BackupStatus {
        exists: bool,
        location: String,
        records: Option<usize>,
    },
    BackupCreated {
        location: String,
        records: usize,
        absent: usize,
        skipped: Vec<JsonFailure>,
    },
    Restored {
        restored: Vec<String>,
        deleted: Vec<String>,
        failed: Vec<JsonFailure>,
    },
    BackupDiscarded,
    Applied {
        applied: usize,
        failed: usize,
        skipped: usize,
        items: Vec<JsonApplied>,
    },
    Failed {
        action: &'static str,
        kind: String,
        error: String,
    },
}

#[derive(Serialize)]
pub struct JsonItem {
    name: String,
    description: String,
    category: &'static str,
    requires_admin: bool,
    kind: String,
}

impl From<&OptimizationItem> for JsonItem {
    fn from(item: &OptimizationItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.as_str(),
            requires_admin: item.requires_admin,
            kind: format!("{:?}", item.kind).to_ascii_lowercase(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonIssue {
    severity: &'static str,
    message: String,
}

impl From<&ValidationIssue> for JsonIssue {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            severity: issue.severity.as_str(),
            message: issue.message.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonSkipped {
    check: String,
    reason: String,
}

impl From<&SkippedCheck> for JsonSkipped {
    fn from(check: &SkippedCheck) -> Self {
        Self {
            check: check.check.clone(),
            reason: check.reason.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonFailure {
    key: String,
    error: String,
}

impl From<&(String, String)> for JsonFailure {
    fn from((key, error): &(String, String)) -> Self {
        Self {
            key: key.clone(),
            error: error.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonConfig {
    location: String,
    created: bool,
    backup_file_name: String,
    helper_timeout_ms: u64,
    validation: JsonValidationSettings,
}

#[derive(Serialize)]
pub struct JsonValidationSettings {
    ping_target: String,
    ping_timeout_ms: u64,
    responsiveness_limit_ms: u64,
    crash_window_days: u32,
    crash_threshold: u32,
    low_disk_percent: u8,
    low_system_disk_percent: u8,
    critical_processes: Vec<String>,
    critical_services: Vec<String>,
    system_files: Vec<String>,
}

#[derive(Serialize)]
pub struct JsonApplied {
    name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    errors: Vec<String>,
}
