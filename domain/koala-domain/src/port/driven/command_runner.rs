//! 外部コマンド実行ポート

use crate::error::DomainError;
use crate::model::CommandInvocation;

/// 終了したプロセスの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// 外部コマンド実行ポート
pub trait CommandRunner {
    /// 実行して終了を待つ
    ///
    /// 起動失敗は `IoError`、`timeout_ms` 超過は `Timeout`。
    /// 非ゼロ終了はエラーにせず `exit_code` で返す。
    fn run(
        &self,
        command: &CommandInvocation,
        timeout_ms: u64,
    ) -> Result<CommandOutput, DomainError>;
}
