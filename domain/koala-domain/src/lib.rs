//! KOALA Optimizer ドメイン層
//!
//! 最適化カタログ、バックアップ記録、検証結果などの中核モデルとポートを定義する。
//! ヘキサゴナルアーキテクチャの最内層。OSには一切触れない。

pub mod catalog; // 最適化カタログ（静的データ）
pub mod error;   // ドメインエラー定義
pub mod model;   // ドメインモデル（値オブジェクト、エンティティ）
pub mod port;    // ポート（driving/driven）

pub use catalog::Catalog;
pub use error::{DomainError, ErrorKind}; // エラー型を再エクスポート
