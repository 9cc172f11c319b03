//! UI操作 → ユースケース呼び出しの対応表

use koala_domain::DomainError;
use koala_domain::model::{
    AppliedResult, BackupReport, BackupStatus, OptimizationCategory, OptimizationItem,
    RestoreReport, SafetyVerdict, SelectedItem, ValidationReport,
};
use koala_domain::port::driving::OptimizationUseCase;
use tracing::{info, warn};

/// UIから発行される操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    ListItems,
    ValidateReadiness,
    CheckSafety(OptimizationCategory),
    BackupStatus,
    CreateBackup,
    RestoreBackup,
    DiscardBackup,
    Apply(Vec<SelectedItem>),
    ValidatePost,
}

impl UiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListItems => "list-items",
            Self::ValidateReadiness => "validate-readiness",
            Self::CheckSafety(_) => "check-safety",
            Self::BackupStatus => "backup-status",
            Self::CreateBackup => "create-backup",
            Self::RestoreBackup => "restore-backup",
            Self::DiscardBackup => "discard-backup",
            Self::Apply(_) => "apply",
            Self::ValidatePost => "validate-post",
        }
    }
}

/// 操作結果（表示はプレゼン層の責務）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Items(Vec<OptimizationItem>),
    Validation(ValidationReport),
    Safety {
        category: OptimizationCategory,
        verdict: SafetyVerdict,
    },
    BackupStatus(BackupStatus),
    BackupCreated(BackupReport),
    Restored(RestoreReport),
    BackupDiscarded,
    Applied(AppliedResult),
    Failed {
        action: &'static str,
        error: DomainError,
    },
}

impl ActionOutcome {
    /// 終了コード判定用
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Items(_)
            | Self::BackupStatus(_)
            | Self::BackupCreated(_)
            | Self::Restored(_)
            | Self::BackupDiscarded => true,
            Self::Validation(report) => !report.has_errors(),
            Self::Safety { verdict, .. } => verdict.safe,
            Self::Applied(result) => result.succeeded(),
            Self::Failed { .. } => false,
        }
    }
}

/// 操作を対応するユースケースへ振り分ける
pub fn dispatch(use_case: &dyn OptimizationUseCase, action: UiAction) -> ActionOutcome {
    let name = action.as_str();
    info!(action = name, "操作を実行");
    let outcome = match action {
        UiAction::ListItems => ActionOutcome::Items(use_case.list_items()),
        UiAction::ValidateReadiness => ActionOutcome::Validation(use_case.validate_readiness()),
        UiAction::CheckSafety(category) => ActionOutcome::Safety {
            category,
            verdict: use_case.assess_optimization_safety(category),
        },
        UiAction::BackupStatus => ActionOutcome::BackupStatus(use_case.backup_status()),
        UiAction::CreateBackup => match use_case.create_backup() {
            Ok(report) => ActionOutcome::BackupCreated(report),
            Err(error) => ActionOutcome::Failed { action: name, error },
        },
        UiAction::RestoreBackup => match use_case.restore_from_backup() {
            Ok(report) => ActionOutcome::Restored(report),
            Err(error) => ActionOutcome::Failed { action: name, error },
        },
        UiAction::DiscardBackup => match use_case.discard_backup() {
            Ok(()) => ActionOutcome::BackupDiscarded,
            Err(error) => ActionOutcome::Failed { action: name, error },
        },
        UiAction::Apply(selected) => {
            ActionOutcome::Applied(use_case.apply_optimizations(&selected))
        }
        UiAction::ValidatePost => ActionOutcome::Validation(use_case.validate_post_optimization()),
    };
    if let ActionOutcome::Failed { error, .. } = &outcome {
        warn!(action = name, error = %error, "操作に失敗");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::tests::Fixture;

    #[test]
    fn backup_actions_map_to_outcomes() {
        let fx = Fixture::new(true);
        let svc = fx.service();

        let created = dispatch(&svc, UiAction::CreateBackup);
        assert!(matches!(created, ActionOutcome::BackupCreated(_)));
        assert!(created.succeeded());

        let again = dispatch(&svc, UiAction::CreateBackup);
        assert!(matches!(
            again,
            ActionOutcome::Failed {
                action: "create-backup",
                error: DomainError::BackupAlreadyExists(_)
            }
        ));
        assert!(!again.succeeded());

        match dispatch(&svc, UiAction::BackupStatus) {
            ActionOutcome::BackupStatus(status) => assert_eq!(status.records, Some(1)),
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(dispatch(&svc, UiAction::DiscardBackup).succeeded());
        // 破棄後は復元できない
        assert!(!dispatch(&svc, UiAction::RestoreBackup).succeeded());
    }

    #[test]
    fn apply_success_depends_on_applied_items() {
        let fx = Fixture::new(true);
        let svc = fx.service();
        let applied = dispatch(
            &svc,
            UiAction::Apply(vec![SelectedItem::enabled("DisableGameDVR")]),
        );
        assert!(applied.succeeded());

        let nothing = dispatch(
            &svc,
            UiAction::Apply(vec![SelectedItem::disabled("DisableGameDVR")]),
        );
        assert!(!nothing.succeeded());
    }

    #[test]
    fn list_and_safety() {
        let fx = Fixture::new(true);
        let svc = fx.service();
        match dispatch(&svc, UiAction::ListItems) {
            ActionOutcome::Items(items) => {
                assert_eq!(items[0].name, "DisableGameDVR");
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let safety = dispatch(&svc, UiAction::CheckSafety(OptimizationCategory::Network));
        assert!(safety.succeeded());
    }
}
