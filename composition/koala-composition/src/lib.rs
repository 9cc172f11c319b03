//! koala-composition: 実行ファイル向けのランタイムを組み立てるコンポジションルート。
//! ドメイン／アプリケーション／各種アダプタをここで配線し、apps/* はこのクレートだけに依存する。

pub mod error;
pub mod runtime;

// apps/* が内側レイヤーの型に触れる必要がある場合は、ここから辿れるようにする。
pub use koala_app as app;
pub use koala_domain as domain;

pub use koala_app::{ActionOutcome, OptimizerService, UiAction, dispatch};
pub use runtime::{OptimizerRuntime, init_logging};
