//! 駆動ポート（外部から呼び出されるユースケースの入口）
//!
//! 外部システムが呼び出すユースケースを定義する。
//! アプリケーション層のサービスが実装する。

mod optimization_use_case;

pub use optimization_use_case::*;
