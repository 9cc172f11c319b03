//! ドメインモデル
//!
//! 値オブジェクト、エンティティ、設定型を定義

mod apply;        // 適用結果
mod backup;       // バックアップ記録
mod config;       // オプティマイザ設定
mod optimization; // 最適化項目と変更内容
mod registry;     // レジストリキー／値
mod validation;   // 検証結果

pub use apply::*;
pub use backup::*;
pub use config::*;
pub use optimization::*;
pub use registry::*;
pub use validation::*;
