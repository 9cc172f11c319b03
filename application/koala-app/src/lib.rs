//! koala-app: アプリケーション層のファサード。
//! Engine 層とドメインポートを組み合わせて、バックアップ・復元・適用・検証の
//! ユースケースを実装する。UI操作はディスパッチテーブル経由で呼び出す。

pub mod dispatch;
pub mod optimizer;

pub use dispatch::{ActionOutcome, UiAction, dispatch};
pub use optimizer::{OptimizerDeps, OptimizerService};
