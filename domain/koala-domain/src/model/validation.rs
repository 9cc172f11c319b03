/// 指摘の重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// 検証で見つかった指摘（永続化しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// 実行できなかったチェック
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCheck {
    pub check: String,
    pub reason: String,
}

/// 検証結果
///
/// `skipped` は「問題なし」とは区別して保持する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub skipped: Vec<SkippedCheck>,
}

impl ValidationReport {
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn skip(&mut self, check: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedCheck {
            check: check.into(),
            reason: reason.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// カテゴリ単位の安全性判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub safe: bool,
    pub issues: Vec<ValidationIssue>,
    pub skipped: Vec<SkippedCheck>,
}

impl Default for SafetyVerdict {
    fn default() -> Self {
        Self {
            safe: true,
            issues: Vec::new(),
            skipped: Vec::new(),
        }
    }
}
