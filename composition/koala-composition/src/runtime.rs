//! オプティマイザのランタイム配線。
//! アダプタを一度だけ生成して所有し、アプリケーション層には参照を渡す。

use crate::error::{Result, err};
use koala_adapter_clock::ClockAdapter;
use koala_adapter_fs::{FsBackupStore, FsConfigRepository, FsOperationLock};
use koala_adapter_paths as paths;
use koala_adapter_process::{ProcessCommandRunner, ScServiceControl};
use koala_adapter_registry::RegistryAdapter;
use koala_adapter_system::SystemProbeAdapter;
use koala_app::{OptimizerDeps, OptimizerService};
use koala_domain::Catalog;
use koala_domain::model::OptimizerConfig;
use koala_domain::port::driven::{BackupStore, ConfigRepository};
use std::path::{Path, PathBuf};
use tracing::info;

/// 既定のログ出力先でログを初期化
pub fn init_logging(component: &str) -> Option<PathBuf> {
    koala_log_utils::init_logging(component, &paths::default_log_dir())
}

/// オプティマイザ実行に必要な依存関係一式
pub struct OptimizerRuntime {
    catalog: Catalog,
    config: OptimizerConfig,
    config_repo: FsConfigRepository,
    registry: RegistryAdapter,
    backups: FsBackupStore,
    commands: ProcessCommandRunner,
    services: ScServiceControl,
    probe: SystemProbeAdapter,
    clock: ClockAdapter,
    lock: FsOperationLock,
}

impl OptimizerRuntime {
    /// 既定のデータディレクトリで作成
    pub fn new() -> Result<Self> {
        Self::with_data_dir(paths::default_data_dir())
    }

    /// 指定データディレクトリで作成（設定は `<dir>/config`、バックアップは `<dir>/backups`）
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let config_repo = FsConfigRepository::new(data_dir.join("config"));
        let config = config_repo
            .load()
            .map_err(|e| err(format!("設定の読込に失敗: {e}")))?;
        let catalog = Catalog::standard().map_err(|e| err(format!("カタログが不正: {e}")))?;
        let backups = FsBackupStore::new(data_dir.join("backups").join(&config.backup_file_name));
        info!(
            data_dir = %data_dir.display(),
            backup = %backups.location(),
            items = catalog.len(),
            "ランタイムを初期化"
        );
        Ok(Self {
            services: ScServiceControl::new(config.helper_timeout_ms),
            probe: SystemProbeAdapter::new(config.helper_timeout_ms),
            lock: FsOperationLock::new(data_dir),
            catalog,
            config,
            config_repo,
            registry: RegistryAdapter::new(),
            backups,
            commands: ProcessCommandRunner::new(),
            clock: ClockAdapter::new(),
        })
    }

    /// ユースケース実装を取得
    pub fn service(&self) -> OptimizerService<'_> {
        OptimizerService::new(OptimizerDeps {
            catalog: &self.catalog,
            config: &self.config,
            registry: &self.registry,
            backups: &self.backups,
            commands: &self.commands,
            services: &self.services,
            probe: &self.probe,
            clock: &self.clock,
            lock: &self.lock,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// 設定ファイルの場所
    pub fn config_location(&self) -> String {
        self.config_repo.path().display().to_string()
    }

    /// 設定ファイルがなければ現在の設定で作成する。作成した場合true。
    pub fn init_config_file(&self) -> Result<bool> {
        if self.config_repo.exists() {
            return Ok(false);
        }
        self.config_repo
            .save(&self.config)
            .map_err(|e| err(format!("設定の保存に失敗: {e}")))?;
        info!(path = %self.config_location(), "設定ファイルを作成");
        Ok(true)
    }

    /// バックアップファイルの場所
    pub fn backup_location(&self) -> String {
        self.backups.location()
    }
}
