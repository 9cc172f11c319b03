use crate::ErrorKind;

/// 項目単位の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// 全変更が成功
    Applied,
    /// 1つ以上の変更が失敗（残りは試行済み）
    Failed { kind: ErrorKind },
    /// 実行しなかった
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub name: String,
    pub status: ItemStatus,
    /// 成功した変更数
    pub applied_mutations: usize,
    /// 失敗した変更の説明
    pub errors: Vec<String>,
}

impl ItemOutcome {
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Skipped {
                reason: reason.into(),
            },
            applied_mutations: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == ItemStatus::Applied
    }
}

/// applyOptimizationsの結果（部分成功を許容）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedResult {
    pub items: Vec<ItemOutcome>,
}

impl AppliedResult {
    pub fn applied_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_applied()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.status, ItemStatus::Skipped { .. }))
            .count()
    }

    /// 1項目以上適用できたか
    pub fn succeeded(&self) -> bool {
        self.applied_count() > 0
    }

    pub fn outcome(&self, name: &str) -> Option<&ItemOutcome> {
        self.items.iter().find(|i| i.name == name)
    }
}
