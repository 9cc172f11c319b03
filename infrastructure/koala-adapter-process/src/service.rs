//! sc.exe によるサービス制御

use super::ProcessCommandRunner;
use koala_domain::DomainError;
use koala_domain::model::{CommandInvocation, ServiceStartMode};
use koala_domain::port::driven::{CommandOutput, CommandRunner, ServiceControl};
use tracing::{debug, info};

const SC_EXE: &str = "sc.exe";

// sc.exe の終了コード（Win32エラーコード）
const ERROR_ACCESS_DENIED: i32 = 5;
const ERROR_SERVICE_NOT_ACTIVE: i32 = 1062;
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;

/// sc.exe query/stop/config を呼ぶサービス制御
pub struct ScServiceControl<R = ProcessCommandRunner> {
    runner: R,
    timeout_ms: u64,
}

impl ScServiceControl<ProcessCommandRunner> {
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_runner(ProcessCommandRunner, timeout_ms)
    }
}

impl<R: CommandRunner> ScServiceControl<R> {
    pub fn with_runner(runner: R, timeout_ms: u64) -> Self {
        Self { runner, timeout_ms }
    }

    fn sc(&self, args: &[&str]) -> Result<CommandOutput, DomainError> {
        self.runner
            .run(&CommandInvocation::new(SC_EXE, args), self.timeout_ms)
    }
}

impl<R: CommandRunner> ServiceControl for ScServiceControl<R> {
    fn stop(&self, service: &str) -> Result<(), DomainError> {
        let out = self.sc(&["stop", service])?;
        match out.exit_code {
            0 => {
                info!(service, "サービスを停止");
                Ok(())
            }
            ERROR_SERVICE_NOT_ACTIVE | ERROR_SERVICE_DOES_NOT_EXIST => {
                debug!(service, code = out.exit_code, "停止不要");
                Ok(())
            }
            _ => Err(sc_error(service, &out)),
        }
    }

    fn set_start_mode(&self, service: &str, mode: ServiceStartMode) -> Result<(), DomainError> {
        let out = self.sc(&["config", service, "start=", start_arg(mode)])?;
        if out.success() {
            info!(service, mode = ?mode, "スタートアップ種別を変更");
            return Ok(());
        }
        Err(sc_error(service, &out))
    }

    fn is_running(&self, service: &str) -> Result<bool, DomainError> {
        let out = self.sc(&["query", service])?;
        if !out.success() {
            return Err(sc_error(service, &out));
        }
        parse_state(&out.stdout).map(|state| state == "RUNNING").ok_or_else(|| {
            DomainError::ExternalToolFailed(format!("unexpected sc query output for {service}"))
        })
    }
}

fn start_arg(mode: ServiceStartMode) -> &'static str {
    match mode {
        ServiceStartMode::Automatic => "auto",
        ServiceStartMode::Manual => "demand",
        ServiceStartMode::Disabled => "disabled",
    }
}

fn sc_error(service: &str, out: &CommandOutput) -> DomainError {
    let detail = if out.stdout.is_empty() {
        out.stderr.trim()
    } else {
        out.stdout.trim()
    };
    match out.exit_code {
        ERROR_ACCESS_DENIED => DomainError::AccessDenied(format!("sc.exe {service}")),
        ERROR_SERVICE_DOES_NOT_EXIST => DomainError::KeyNotFound(format!("service {service}")),
        code => DomainError::ExternalToolFailed(format!(
            "sc.exe exited with {code} for {service}: {detail}"
        )),
    }
}

/// `STATE              : 4  RUNNING` から状態名を取り出す
fn parse_state(stdout: &str) -> Option<&str> {
    stdout.lines().find_map(|line| {
        let (label, rest) = line.split_once(':')?;
        if label.trim() != "STATE" {
            return None;
        }
        rest.split_whitespace().nth(1)
    })
}
