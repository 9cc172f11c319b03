//! 最適化ユースケース（アプリ層）。

use koala_domain::model::{
    AppliedResult, BackupReport, BackupStatus, ItemOutcome, OptimizationCategory,
    OptimizationItem, OptimizerConfig, RestoreReport, SafetyVerdict, SelectedItem,
    ValidationReport,
};
use koala_domain::port::driven::{
    BackupStore, Clock, CommandRunner, OperationLock, RegistryStore, ServiceControl, SystemProbe,
};
use koala_domain::port::driving::OptimizationUseCase;
use koala_domain::{Catalog, DomainError};
use koala_engine::ApplyContext;
use tracing::{info, warn};

pub struct OptimizerDeps<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a OptimizerConfig,
    pub registry: &'a dyn RegistryStore,
    pub backups: &'a dyn BackupStore,
    pub commands: &'a dyn CommandRunner,
    pub services: &'a dyn ServiceControl,
    pub probe: &'a dyn SystemProbe,
    pub clock: &'a dyn Clock,
    pub lock: &'a dyn OperationLock,
}

pub struct OptimizerService<'a> {
    deps: OptimizerDeps<'a>,
}

impl<'a> OptimizerService<'a> {
    pub fn new(deps: OptimizerDeps<'a>) -> Self {
        Self { deps }
    }

    /// 昇格状態。確認できない場合は実行させ、OS側の拒否に任せる。
    fn elevated(&self) -> bool {
        match self.deps.probe.is_elevated() {
            Ok(elevated) => elevated,
            Err(e) => {
                warn!(error = %e, "権限を確認できません");
                true
            }
        }
    }
}

impl OptimizationUseCase for OptimizerService<'_> {
    fn list_items(&self) -> Vec<OptimizationItem> {
        self.deps.catalog.list_items()
    }

    fn validate_readiness(&self) -> ValidationReport {
        koala_engine::validate_readiness(
            self.deps.probe,
            self.deps.registry,
            &self.deps.config.validation,
        )
    }

    fn assess_optimization_safety(&self, category: OptimizationCategory) -> SafetyVerdict {
        koala_engine::assess_optimization_safety(
            category,
            self.deps.probe,
            self.deps.registry,
            self.deps.backups,
        )
    }

    fn backup_exists(&self) -> bool {
        self.deps.backups.exists().unwrap_or(false)
    }

    fn backup_status(&self) -> BackupStatus {
        koala_engine::backup_status(self.deps.backups)
    }

    fn create_backup(&self) -> Result<BackupReport, DomainError> {
        let _lease = self.deps.lock.acquire()?;
        koala_engine::create_backup(
            self.deps.catalog,
            self.deps.registry,
            self.deps.backups,
            self.deps.clock,
        )
    }

    fn restore_from_backup(&self) -> Result<RestoreReport, DomainError> {
        let _lease = self.deps.lock.acquire()?;
        koala_engine::restore_from_backup(self.deps.backups, self.deps.registry)
    }

    fn discard_backup(&self) -> Result<(), DomainError> {
        let _lease = self.deps.lock.acquire()?;
        self.deps.backups.remove()?;
        info!(location = %self.deps.backups.location(), "バックアップを破棄");
        Ok(())
    }

    fn apply_optimizations(&self, selected: &[SelectedItem]) -> AppliedResult {
        let _lease = match self.deps.lock.acquire() {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "適用を開始できません");
                return AppliedResult {
                    items: selected
                        .iter()
                        .map(|s| ItemOutcome::skipped(&s.name, e.to_string()))
                        .collect(),
                };
            }
        };
        if !self.backup_exists() {
            warn!("バックアップなしで適用します");
        }
        let ctx = ApplyContext {
            elevated: self.elevated(),
            helper_timeout_ms: self.deps.config.helper_timeout_ms,
        };
        koala_engine::apply_optimizations(
            self.deps.catalog,
            selected,
            self.deps.registry,
            self.deps.commands,
            self.deps.services,
            ctx,
        )
    }

    fn validate_post_optimization(&self) -> ValidationReport {
        koala_engine::validate_post_optimization(
            self.deps.probe,
            self.deps.registry,
            self.deps.services,
            self.deps.clock,
            &self.deps.config.validation,
        )
    }
}
