//! ログ初期化ユーティリティ
//!
//! `KOALA_LOG` でフィルタを指定（未指定時は `info`）。
//! 出力先は書き込み可能な最初のファイル、どれも不可なら標準エラー。

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_ENV: &str = "KOALA_LOG";
pub const LOG_FILE_NAME: &str = "koala.log";
const DEFAULT_FILTER: &str = "info";

/// ログファイルの候補（優先順）
pub fn log_paths(log_dir: &Path) -> Vec<PathBuf> {
    vec![
        log_dir.join(LOG_FILE_NAME),
        std::env::temp_dir().join(LOG_FILE_NAME),
    ]
}

/// 追記モードで開ける最初のファイル
pub fn open_first_writable(paths: &[PathBuf]) -> Option<(PathBuf, File)> {
    for path in paths {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(path) {
            return Some((path.clone(), file));
        }
    }
    None
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// グローバルsubscriberを設定する。2回目以降は何もしない。
///
/// 使用中のログファイルを返す（標準エラーならNone）。
pub fn init_logging(component: &str, log_dir: &Path) -> Option<PathBuf> {
    let (path, writer) = match open_first_writable(&log_paths(log_dir)) {
        Some((path, file)) => (Some(path), BoxMakeWriter::new(Mutex::new(file))),
        None => (None, BoxMakeWriter::new(std::io::stderr)),
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(
            component,
            version = env!("CARGO_PKG_VERSION"),
            log_file = ?path,
            "ログを初期化"
        );
    }
    path
}
