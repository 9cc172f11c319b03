//! 外部プロセスアダプター
//!
//! - `ProcessCommandRunner`: タイムアウト付きのコマンド実行
//! - `ScServiceControl`: sc.exe 経由のサービス制御

mod service;

pub use service::ScServiceControl;

use koala_domain::DomainError;
use koala_domain::model::CommandInvocation;
use koala_domain::port::driven::{CommandOutput, CommandRunner};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// std::process によるコマンド実行
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessCommandRunner {
    fn run(
        &self,
        command: &CommandInvocation,
        timeout_ms: u64,
    ) -> Result<CommandOutput, DomainError> {
        let line = command.display_line();
        debug!(command = %line, timeout_ms, "外部コマンドを実行");

        let mut cmd = Command::new(&command.executable);
        cmd.args(&command.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                DomainError::AccessDenied(format!("{}: {e}", command.executable))
            }
            _ => DomainError::IoError(format!("failed to launch {}: {e}", command.executable)),
        })?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let exit_code = match wait_with_deadline(&mut child, Duration::from_millis(timeout_ms)) {
            Ok(code) => code,
            Err(e) => {
                // 孫プロセスがパイプを保持している場合があるためjoinしない
                drop(stdout);
                drop(stderr);
                warn!(command = %line, timeout_ms, "外部コマンドがタイムアウト");
                return Err(e);
            }
        };

        let output = CommandOutput {
            exit_code,
            stdout: collect(stdout),
            stderr: collect(stderr),
        };
        debug!(command = %line, exit_code, "外部コマンドが終了");
        Ok(output)
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(handle: JoinHandle<Vec<u8>>) -> String {
    let bytes = handle.join().unwrap_or_default();
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

/// 終了コードを返す。期限を過ぎたらkillして `Timeout`。
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<i32, DomainError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            // シグナル終了などコードなしは -1
            Ok(Some(status)) => return Ok(status.code().unwrap_or(-1)),
            Ok(None) => {}
            Err(e) => return Err(DomainError::IoError(format!("wait failed: {e}"))),
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DomainError::Timeout(format!(
                "process did not exit within {} ms",
                timeout.as_millis()
            )));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
